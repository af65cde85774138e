use log::{error, info};
use rouille::{Request, Response};
use serde_json::json;
use std::{fs::File, path::Path};

use crate::{
    config::{Config, HttpConfig, LibraryConfig, ManifestConfig, OrderConfig},
    domain::order::apply_preferred_order,
    http::{error::ApiError, range},
    storage::{
        error::StorageError,
        fs::{is_audio_file, is_plain_filename},
        source::{ARTWORK_ENDPOINT, Artwork, TrackSource},
    },
};

const ARTWORK_CACHE_CONTROL: &str = "public, max-age=31536000";
const AUDIO_CONTENT_TYPE: &str = "audio/mpeg";
const DEFAULT_ARTWORK_SVG: &str = include_str!("../../assets/default-artwork.svg");

pub struct HttpServer {
    source: Box<dyn TrackSource>,
    pub config: HttpConfig,
    library: LibraryConfig,
    manifest: ManifestConfig,
    order: OrderConfig,
}

impl HttpServer {
    pub fn new(source: Box<dyn TrackSource>, config: Config) -> Self {
        Self {
            source,
            config: config.http,
            library: config.library,
            manifest: config.manifest,
            order: config.order,
        }
    }

    pub fn run(self) {
        let addr = format!("{}:{}", self.config.bind_addr, self.config.port);
        rouille::start_server(addr, move |request| self.handle_request(request));
    }

    fn handle_request(&self, request: &Request) -> Response {
        Self::log_request(request);

        let url = request.url();
        let audio_name = static_name(&url, &self.library.audio_url_prefix);
        let response = match (request.method(), audio_name) {
            // players probe with HEAD before seeking; the transport drops the body
            ("HEAD", Some(name)) => self.handle_audio_stream(request, name),
            ("GET", _) => self.route_get(request, &url, audio_name),
            _ => Response::empty_404(),
        };

        info!("Response: {} {} {}", request.method(), url, response.status_code);
        response
    }

    fn route_get(&self, request: &Request, url: &str, audio_name: Option<&str>) -> Response {
        if url == self.config.default_artwork_url {
            self.handle_default_artwork_file()
        } else if let Some(name) = static_name(url, &self.manifest.artwork_url_prefix) {
            self.handle_artwork_file(name)
        } else if let Some(name) = audio_name {
            self.handle_audio_stream(request, name)
        } else if url == ARTWORK_ENDPOINT {
            self.handle_get_artwork(request)
        } else {
            rouille::router!(request,
                (GET) (/api/audio) => {
                    self.handle_list_tracks(request)
                },
                _ => Response::empty_404()
            )
        }
    }

    fn log_request(request: &Request) {
        info!("{} {}", request.method(), request.raw_url());
    }

    /// Lists tracks as JSON. `?ordered=true` applies the configured preferred order.
    fn handle_list_tracks(&self, request: &Request) -> Response {
        match self.source.list_tracks() {
            Ok(tracks) => {
                let ordered = request
                    .get_param("ordered")
                    .is_some_and(|v| v == "true" || v == "1");
                if ordered {
                    Response::json(&apply_preferred_order(tracks, &self.order.preferred))
                } else {
                    Response::json(&tracks)
                }
            }
            Err(err) => {
                error!("Error fetching audio files: {err}");
                Response::json(&json!({ "error": "Failed to fetch audio files" }))
                    .with_status_code(500)
            }
        }
    }

    fn handle_get_artwork(&self, request: &Request) -> Response {
        let Some(file) = request.get_param("file").filter(|f| !f.is_empty()) else {
            return ApiError::BadRequest("Missing file parameter".into()).into_response();
        };

        match self.source.artwork(&file) {
            Ok(Artwork::Embedded { content_type, data }) => Response::from_data(content_type, data)
                .with_additional_header("Cache-Control", ARTWORK_CACHE_CONTROL),
            Ok(Artwork::Missing) => self.default_artwork(),
            Err(err @ StorageError::TrackNotFound(_)) => ApiError::from(err).into_response(),
            Err(err) => {
                error!("Error extracting artwork for {file}: {err}");
                ApiError::Internal("Error extracting artwork".into()).into_response()
            }
        }
    }

    /// Redirects to the configured default image when it exists, otherwise
    /// answers with the built-in placeholder.
    fn default_artwork(&self) -> Response {
        if self.config.default_artwork_path.is_file() {
            Response::redirect_302(self.config.default_artwork_url.clone())
        } else {
            Response::from_data("image/svg+xml", DEFAULT_ARTWORK_SVG)
                .with_additional_header("Cache-Control", ARTWORK_CACHE_CONTROL)
        }
    }

    fn handle_default_artwork_file(&self) -> Response {
        Self::static_file(&self.config.default_artwork_path)
    }

    fn handle_artwork_file(&self, name: &str) -> Response {
        if !is_plain_filename(name) {
            return Response::empty_404();
        }
        Self::static_file(&self.manifest.artwork_dir.join(name))
    }

    fn static_file(path: &Path) -> Response {
        match File::open(path) {
            Ok(file) => {
                let mime = mime_guess::from_path(path).first_or_octet_stream();
                Response::from_file(mime.to_string(), file)
                    .with_additional_header("Cache-Control", ARTWORK_CACHE_CONTROL)
            }
            Err(_) => Response::empty_404(),
        }
    }

    fn handle_audio_stream(&self, request: &Request, name: &str) -> Response {
        match self.audio_stream(request, name) {
            Ok(response) => response,
            Err(e) => e.into_response(),
        }
    }

    /// returns a full or partial audio response, or ApiError
    fn audio_stream(&self, request: &Request, name: &str) -> Result<Response, ApiError> {
        let not_found = || ApiError::NotFound("File not found".into());
        if !is_plain_filename(name) || !is_audio_file(Path::new(name)) {
            return Err(not_found());
        }

        let path = self.library.audio_dir.join(name);
        let file = File::open(&path).map_err(|_| not_found())?;
        log::debug!(
            "STREAM {} range: {:?}",
            path.to_string_lossy(),
            request.header("Range")
        );

        range::serve(file, request.header("Range"), AUDIO_CONTENT_TYPE).map_err(|e| {
            error!("Error streaming {name}: {e}");
            ApiError::Internal("internal server error".into())
        })
    }
}

/// The single path segment following `prefix`, if `url` is directly under it.
fn static_name<'a>(url: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = url
        .strip_prefix(prefix.trim_end_matches('/'))?
        .strip_prefix('/')?;
    (!rest.is_empty() && !rest.contains('/')).then_some(rest)
}

#[cfg(test)]
pub fn parse_json_response<T: serde::de::DeserializeOwned>(
    response: rouille::Response,
) -> anyhow::Result<T> {
    Ok(serde_json::from_reader(
        response.data.into_reader_and_size().0,
    )?)
}

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct Config {
    pub version: u32,
    pub library: LibraryConfig,
    #[serde(default)]
    pub manifest: ManifestConfig,
    #[serde(default)]
    pub source: SourceConfig,
    pub http: HttpConfig,
    #[serde(default)]
    pub order: OrderConfig,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.to_string_lossy()))?;
        toml::from_str(&contents).with_context(|| "Failed to parse config TOML")
    }
}

/// Where the audio files live and how clients address them.
#[derive(Debug, Deserialize, Clone)]
pub struct LibraryConfig {
    pub audio_dir: PathBuf,
    #[serde(default = "default_audio_url_prefix")]
    pub audio_url_prefix: String,
}

/// Build-time artifacts: the manifest JSON and the extracted artwork files.
#[derive(Debug, Deserialize, Clone)]
pub struct ManifestConfig {
    #[serde(default = "default_manifest_path")]
    pub path: PathBuf,
    #[serde(default = "default_artwork_dir")]
    pub artwork_dir: PathBuf,
    #[serde(default = "default_artwork_url_prefix")]
    pub artwork_url_prefix: String,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            path: default_manifest_path(),
            artwork_dir: default_artwork_dir(),
            artwork_url_prefix: default_artwork_url_prefix(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Parse tags from the audio directory on every request
    #[default]
    Live,
    /// Serve the precomputed manifest
    Manifest,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub bind_addr: String,
    pub port: u16,
    #[serde(default = "default_artwork_path")]
    pub default_artwork_path: PathBuf,
    #[serde(default = "default_artwork_url")]
    pub default_artwork_url: String,
}

/// Preferred playback order, by audio filename.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct OrderConfig {
    #[serde(default)]
    pub preferred: Vec<String>,
}

fn default_audio_url_prefix() -> String {
    "/audio".to_string()
}

fn default_manifest_path() -> PathBuf {
    PathBuf::from("public/audio/manifest.json")
}

fn default_artwork_dir() -> PathBuf {
    PathBuf::from("public/audio/artwork")
}

fn default_artwork_url_prefix() -> String {
    "/audio/artwork".to_string()
}

fn default_artwork_path() -> PathBuf {
    PathBuf::from("public/images/default-album-art.jpg")
}

fn default_artwork_url() -> String {
    "/images/default-album-art.jpg".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_minimal_config_toml() -> anyhow::Result<()> {
        let toml_str = r#"
version = 1

[library]
audio_dir = "public/audio"

[http]
bind_addr = "127.0.0.1"
port = 8080
"#;

        let cfg: Config = toml::from_str(toml_str)?;

        assert_eq!(cfg.version, 1);
        assert_eq!(cfg.library.audio_dir, PathBuf::from("public/audio"));
        assert_eq!(cfg.library.audio_url_prefix, "/audio");

        // defaults follow the site layout
        assert_eq!(cfg.source.kind, SourceKind::Live);
        assert_eq!(cfg.manifest.artwork_url_prefix, "/audio/artwork");
        assert_eq!(
            cfg.http.default_artwork_url,
            "/images/default-album-art.jpg"
        );
        assert!(cfg.order.preferred.is_empty());

        Ok(())
    }

    #[test]
    fn test_parse_full_config_toml() -> anyhow::Result<()> {
        let toml_str = r#"
version = 1

[library]
audio_dir = "/srv/site/audio"
audio_url_prefix = "/media"

[manifest]
path = "/srv/site/audio/manifest.json"
artwork_dir = "/srv/site/audio/art"
artwork_url_prefix = "/media/art"

[source]
kind = "manifest"

[http]
bind_addr = "0.0.0.0"
port = 3000
default_artwork_path = "/srv/site/images/none.jpg"
default_artwork_url = "/img/none.jpg"

[order]
preferred = ["dublon - debris.mp3", "home alone. - fling.mp3"]
"#;

        let cfg: Config = toml::from_str(toml_str)?;

        assert_eq!(cfg.source.kind, SourceKind::Manifest);
        assert_eq!(cfg.library.audio_url_prefix, "/media");
        assert_eq!(
            cfg.manifest.artwork_dir,
            PathBuf::from("/srv/site/audio/art")
        );
        assert_eq!(cfg.http.port, 3000);
        assert_eq!(cfg.http.default_artwork_url, "/img/none.jpg");
        assert_eq!(
            cfg.order.preferred,
            vec!["dublon - debris.mp3", "home alone. - fling.mp3"]
        );

        Ok(())
    }

    #[test]
    fn test_unknown_source_kind_is_rejected() {
        let toml_str = r#"
version = 1

[library]
audio_dir = "audio"

[source]
kind = "s3"

[http]
bind_addr = "127.0.0.1"
port = 8080
"#;

        assert!(toml::from_str::<Config>(toml_str).is_err());
    }
}

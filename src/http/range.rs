//! Byte-range support for streaming audio, so players can seek.
//!
//! Only single `bytes=` ranges are honoured. A header that cannot be parsed is
//! ignored and the full resource is served; a well-formed range that does not
//! fit the resource is answered with 416.

use std::{
    fs::File,
    io::{Read, Seek, SeekFrom},
};

use rouille::{Response, ResponseBody};

pub const STREAM_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeRequest {
    Full,
    /// Inclusive byte span
    Partial { start: u64, end: u64 },
    Unsatisfiable,
}

/// Interprets a `Range` header against a resource of `total` bytes.
pub fn parse(header: Option<&str>, total: u64) -> RangeRequest {
    let Some((unit, spec)) = header.and_then(|h| h.trim().split_once('=')) else {
        return RangeRequest::Full;
    };
    // range units are case-insensitive
    if !unit.trim().eq_ignore_ascii_case("bytes") {
        return RangeRequest::Full;
    }
    // multi-range is not supported
    if spec.contains(',') {
        return RangeRequest::Full;
    }
    let Some((start, end)) = spec.split_once('-') else {
        return RangeRequest::Full;
    };
    let (start, end) = (start.trim(), end.trim());

    match (start.is_empty(), end.is_empty()) {
        (true, true) => RangeRequest::Full,

        // suffix range: the last `end` bytes
        (true, false) => {
            let Ok(len) = end.parse::<u64>() else {
                return RangeRequest::Full;
            };
            if len == 0 || total == 0 {
                return RangeRequest::Unsatisfiable;
            }
            RangeRequest::Partial {
                start: total.saturating_sub(len),
                end: total - 1,
            }
        }

        (false, open_ended) => {
            let Ok(start) = start.parse::<u64>() else {
                return RangeRequest::Full;
            };
            let requested_end = if open_ended {
                None
            } else {
                match end.parse::<u64>() {
                    Ok(end) => Some(end),
                    Err(_) => return RangeRequest::Full,
                }
            };

            if start >= total || requested_end.is_some_and(|end| start > end) {
                return RangeRequest::Unsatisfiable;
            }
            let last = total - 1;
            RangeRequest::Partial {
                start,
                end: requested_end.map_or(last, |end| end.min(last)),
            }
        }
    }
}

/// Serves `file` honouring the client's `Range` header.
///
/// Every response advertises `Accept-Ranges: bytes` so clients can seek later.
pub fn serve(
    mut file: File,
    range_header: Option<&str>,
    content_type: &str,
) -> std::io::Result<Response> {
    let total = file.metadata()?.len();

    match parse(range_header, total) {
        RangeRequest::Full => Ok(Response::from_file(content_type.to_string(), file)
            .with_additional_header("Accept-Ranges", "bytes")
            .with_additional_header("Cache-Control", STREAM_CACHE_CONTROL)),

        RangeRequest::Partial { start, end } => {
            let len = end - start + 1;
            file.seek(SeekFrom::Start(start))?;

            // body size becomes the Content-Length header
            let data = ResponseBody::from_reader_and_size(file.take(len), len as usize);
            Ok(Response {
                status_code: 206,
                headers: vec![("Content-Type".into(), content_type.to_string().into())],
                data,
                upgrade: None,
            }
            .with_additional_header("Content-Range", format!("bytes {start}-{end}/{total}"))
            .with_additional_header("Accept-Ranges", "bytes")
            .with_additional_header("Cache-Control", STREAM_CACHE_CONTROL))
        }

        RangeRequest::Unsatisfiable => Ok(Response::text("Range Not Satisfiable")
            .with_status_code(416)
            .with_additional_header("Content-Range", format!("bytes */{total}"))
            .with_additional_header("Accept-Ranges", "bytes")),
    }
}

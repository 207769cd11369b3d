//! HTTP response handlers.

use crate::core::FrameError;
use crate::utils::mime::types::{JSON, PLAIN};
use anyhow::{Context, Result};
use serde::Serialize;
use std::{fs, path::Path};
use tiny_http::{Header, Method, Request, Response, StatusCode};

const ALLOW_METHODS: &str = "GET, HEAD, POST, DELETE, OPTIONS";
const ALLOW_HEADERS: &str = "Authorization, Content-Type";

/// Respond with a JSON body and CORS headers.
pub fn respond_json<T: Serialize + ?Sized>(request: Request, status: u16, value: &T) -> Result<()> {
    let body = serde_json::to_vec(value).context("Failed to serialize response")?;
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", JSON))
        .with_header(make_header("Access-Control-Allow-Origin", "*"));
    request.respond(response)?;
    Ok(())
}

/// Respond with `{success: false, error}` using the error's status code.
pub fn respond_error(request: Request, err: &FrameError) -> Result<()> {
    let body = serde_json::json!({
        "success": false,
        "error": err.public_message(),
    });
    respond_json(request, err.status(), &body)
}

/// Answer a CORS preflight.
pub fn respond_preflight(request: Request) -> Result<()> {
    let response = Response::empty(StatusCode(204))
        .with_header(make_header("Access-Control-Allow-Origin", "*"))
        .with_header(make_header("Access-Control-Allow-Methods", ALLOW_METHODS))
        .with_header(make_header("Access-Control-Allow-Headers", ALLOW_HEADERS))
        .with_header(make_header("Access-Control-Max-Age", "86400"));
    request.respond(response)?;
    Ok(())
}

/// Respond with a static file, honoring `HEAD` and `Range`.
pub fn respond_file(request: Request, path: &Path) -> Result<()> {
    let content_type = crate::utils::mime::from_path(path);
    let file_size = fs::metadata(path)
        .with_context(|| format!("Failed to stat {}", path.display()))?
        .len();

    if is_head_request(&request) {
        let response = Response::empty(StatusCode(200))
            .with_header(make_header("Content-Type", content_type))
            .with_header(make_header("Accept-Ranges", "bytes"))
            .with_header(dynamic_header("Content-Length", &file_size.to_string()));
        request.respond(response)?;
        return Ok(());
    }

    if let Some(range) = get_header(&request, "range") {
        return match parse_range(&range, file_size) {
            Some((start, end)) => respond_range(request, path, content_type, start, end, file_size),
            None => {
                let response = Response::empty(StatusCode(416))
                    .with_header(dynamic_header("Content-Range", &format!("bytes */{file_size}")));
                request.respond(response)?;
                Ok(())
            }
        };
    }

    let file = fs::File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let response = Response::from_file(file)
        .with_header(make_header("Content-Type", content_type))
        .with_header(make_header("Accept-Ranges", "bytes"));
    request.respond(response)?;
    Ok(())
}

/// Stream the requested byte range as 206 Partial Content.
fn respond_range(
    request: Request,
    path: &Path,
    content_type: &'static str,
    start: u64,
    end: u64,
    file_size: u64,
) -> Result<()> {
    use std::io::{Read, Seek, SeekFrom};

    let length = end - start + 1;

    let mut file = fs::File::open(path)?;
    file.seek(SeekFrom::Start(start))?;
    let reader = file.take(length);

    let content_range = format!("bytes {start}-{end}/{file_size}");
    let response = Response::new(
        StatusCode(206),
        vec![
            make_header("Content-Type", content_type),
            dynamic_header("Content-Range", &content_range),
            make_header("Accept-Ranges", "bytes"),
        ],
        reader,
        Some(length as usize),
        None,
    );

    request.respond(response)?;
    Ok(())
}

/// Parse a `Range` header into an inclusive `(start, end)` byte span.
///
/// Only single ranges are supported. `None` means unsatisfiable.
fn parse_range(header: &str, file_size: u64) -> Option<(u64, u64)> {
    let spec = header.trim().strip_prefix("bytes=")?;
    if spec.contains(',') || file_size == 0 {
        return None;
    }
    let (start, end) = spec.split_once('-')?;
    let (start, end) = (start.trim(), end.trim());
    let last = file_size - 1;

    match (start.is_empty(), end.is_empty()) {
        // "-500": last 500 bytes
        (true, false) => {
            let suffix: u64 = end.parse().ok()?;
            (suffix > 0).then(|| (file_size.saturating_sub(suffix), last))
        }
        // "100-": from offset to end
        (false, true) => {
            let start: u64 = start.parse().ok()?;
            (start <= last).then_some((start, last))
        }
        (false, false) => {
            let start: u64 = start.parse().ok()?;
            let end: u64 = end.parse().ok()?;
            (start <= end && start <= last).then(|| (start, end.min(last)))
        }
        (true, true) => None,
    }
}

/// Respond with plain 404.
pub fn respond_not_found(request: Request) -> Result<()> {
    send_text(request, 404, "404 Not Found")
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    send_text(request, 503, "503 Service Unavailable")
}

pub fn respond_method_not_allowed(request: Request) -> Result<()> {
    send_text(request, 405, "405 Method Not Allowed")
}

fn send_text(request: Request, status: u16, body: &str) -> Result<()> {
    let response = Response::from_string(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", PLAIN));
    request.respond(response)?;
    Ok(())
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

/// Case-insensitive header lookup.
pub fn get_header(request: &Request, name: &str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|h| h.field.as_str().as_str().eq_ignore_ascii_case(name))
        .map(|h| h.value.to_string())
}

fn make_header(key: &'static str, value: &'static str) -> Header {
    dynamic_header(key, value)
}

fn dynamic_header(key: &'static str, value: &str) -> Header {
    // Keys are static ASCII and values are ASCII we formatted ourselves.
    Header::from_bytes(key.as_bytes(), value.as_bytes()).expect("valid header")
}

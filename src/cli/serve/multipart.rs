//! Minimal `multipart/form-data` reader for photo uploads.
//!
//! The whole body is buffered (bounded by `serve.max_body_mb`) and split on
//! the boundary. Only what browsers send for `<input type=file multiple>`
//! is handled: one `Content-Disposition` per part, no nested multiparts.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MultipartError {
    #[error("missing multipart boundary")]
    MissingBoundary,

    #[error("malformed multipart body")]
    Malformed,
}

/// One form field.
#[derive(Debug, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub filename: Option<String>,
    pub data: Vec<u8>,
}

/// Extract the boundary from a `Content-Type` header value.
pub fn boundary(content_type: &str) -> Result<String, MultipartError> {
    let mut params = content_type.split(';');
    let mime = params.next().unwrap_or_default().trim();
    if !mime.eq_ignore_ascii_case("multipart/form-data") {
        return Err(MultipartError::MissingBoundary);
    }

    params
        .filter_map(|p| p.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("boundary"))
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|b| !b.is_empty())
        .ok_or(MultipartError::MissingBoundary)
}

/// Split `body` into parts.
pub fn parse(body: &[u8], boundary: &str) -> Result<Vec<Part>, MultipartError> {
    let delimiter = format!("--{boundary}");
    let delimiter = delimiter.as_bytes();
    let next_delimiter = format!("\r\n--{boundary}");
    let next_delimiter = next_delimiter.as_bytes();

    let start = find(body, delimiter).ok_or(MultipartError::Malformed)?;
    let mut rest = &body[start + delimiter.len()..];
    let mut parts = Vec::new();

    loop {
        if rest.starts_with(b"--") {
            return Ok(parts);
        }
        rest = rest.strip_prefix(b"\r\n").ok_or(MultipartError::Malformed)?;

        let header_end = find(rest, b"\r\n\r\n").ok_or(MultipartError::Malformed)?;
        let headers =
            std::str::from_utf8(&rest[..header_end]).map_err(|_| MultipartError::Malformed)?;
        rest = &rest[header_end + 4..];

        let data_end = find(rest, next_delimiter).ok_or(MultipartError::Malformed)?;
        let data = rest[..data_end].to_vec();
        rest = &rest[data_end + next_delimiter.len()..];

        if let Some((name, filename)) = disposition(headers) {
            parts.push(Part {
                name,
                filename,
                data,
            });
        }
    }
}

/// `(name, filename)` from a part's `Content-Disposition` header.
fn disposition(headers: &str) -> Option<(String, Option<String>)> {
    let value = headers.split("\r\n").find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case("content-disposition")
            .then_some(value)
    })?;

    let mut name = None;
    let mut filename = None;
    for param in value.split(';').skip(1) {
        let Some((key, raw)) = param.split_once('=') else {
            continue;
        };
        let raw = raw.trim();
        let unquoted = raw
            .strip_prefix('"')
            .and_then(|r| r.strip_suffix('"'))
            .unwrap_or(raw)
            .replace("\\\"", "\"");
        match key.trim().to_ascii_lowercase().as_str() {
            "name" => name = Some(unquoted),
            "filename" => filename = Some(unquoted),
            _ => {}
        }
    }

    Some((name?, filename))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDARY: &str = "----frame7MA4YWxk";

    fn body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
        let mut out = Vec::new();
        for (name, filename, data) in parts {
            out.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            let disposition = match filename {
                Some(f) => format!("form-data; name=\"{name}\"; filename=\"{f}\""),
                None => format!("form-data; name=\"{name}\""),
            };
            out.extend_from_slice(format!("Content-Disposition: {disposition}\r\n").as_bytes());
            out.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
            out.extend_from_slice(data);
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        out
    }

    #[test]
    fn test_boundary() {
        assert_eq!(
            boundary("multipart/form-data; boundary=abc").unwrap(),
            "abc"
        );
        assert_eq!(
            boundary("Multipart/Form-Data; charset=utf-8; boundary=\"x y\"").unwrap(),
            "x y"
        );
        assert_eq!(
            boundary("application/json"),
            Err(MultipartError::MissingBoundary)
        );
        assert_eq!(
            boundary("multipart/form-data"),
            Err(MultipartError::MissingBoundary)
        );
    }

    #[test]
    fn test_parse_files_and_fields() {
        let data = body(&[
            ("photos", Some("a.png"), &b"\x89PNG\r\n--not-a-boundary"[..]),
            ("caption", None, &b"hello"[..]),
            ("photos", Some("b#.png"), &b""[..]),
        ]);

        let parts = parse(&data, BOUNDARY).unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].name, "photos");
        assert_eq!(parts[0].filename.as_deref(), Some("a.png"));
        assert_eq!(parts[0].data, b"\x89PNG\r\n--not-a-boundary");
        assert_eq!(parts[1].filename, None);
        assert_eq!(parts[1].data, b"hello");
        assert_eq!(parts[2].filename.as_deref(), Some("b#.png"));
        assert!(parts[2].data.is_empty());
    }

    #[test]
    fn test_parse_empty_form() {
        let data = format!("--{BOUNDARY}--\r\n");
        assert!(parse(data.as_bytes(), BOUNDARY).unwrap().is_empty());
    }

    #[test]
    fn test_parse_truncated() {
        let mut data = body(&[("photos", Some("a.png"), &b"abc"[..])]);
        data.truncate(data.len() - 20);
        assert_eq!(parse(&data, BOUNDARY), Err(MultipartError::Malformed));
        assert_eq!(parse(b"garbage", BOUNDARY), Err(MultipartError::Malformed));
    }
}

//! `multipart/form-data` upload bodies.
//!
//! Browser clients upload through a form whose `file` field carries the object.
//! [`upload_payload`] picks the bytes to store: the `file` part of a multipart
//! body, or the raw body for any other content type.
//!
//! Parts are sliced out of the collected body without copying.

use std::ops::Range;

use bytes::Bytes;
use http::HeaderMap;

/// Form field holding the uploaded object.
pub const FILE_FIELD: &str = "file";

/// Errors raised while reading a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MultipartError {
    /// The `Content-Type` names no boundary.
    #[error("Missing boundary in multipart Content-Type")]
    MissingBoundary,

    /// The body does not follow the multipart framing.
    #[error("Malformed multipart body")]
    Malformed,

    /// No part is named `file`.
    #[error("Missing 'file' part in multipart body")]
    MissingFilePart,
}

/// The `file` part of a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    /// Client-side file name, if sent.
    pub filename: Option<String>,
    /// The part's own `Content-Type`, if sent.
    pub content_type: Option<String>,
    /// Part payload.
    pub data: Bytes,
}

/// Whether `content_type` is `multipart/form-data`, ignoring parameters and case.
#[must_use]
pub fn is_multipart(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case("multipart/form-data"))
}

/// Extract the `boundary` parameter from a multipart `Content-Type`.
///
/// # Errors
///
/// Returns [`MultipartError::MissingBoundary`] when the parameter is absent or empty.
pub fn extract_boundary(content_type: &str) -> Result<String, MultipartError> {
    header_params(content_type)
        .find(|(key, _)| key.eq_ignore_ascii_case("boundary"))
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .ok_or(MultipartError::MissingBoundary)
}

/// Find the part named [`FILE_FIELD`] in a multipart body.
///
/// # Errors
///
/// Returns [`MultipartError::Malformed`] when the framing is broken before the
/// file part is reached, and [`MultipartError::MissingFilePart`] when the body
/// closes without one.
pub fn extract_file_part(body: &Bytes, boundary: &str) -> Result<FilePart, MultipartError> {
    let opening = format!("--{boundary}");
    let separator = format!("\r\n--{boundary}");

    let first = find_bytes(body, opening.as_bytes()).ok_or(MultipartError::Malformed)?;
    let mut cursor = first + opening.len();

    loop {
        let rest = &body[cursor..];
        if rest.starts_with(b"--") {
            return Err(MultipartError::MissingFilePart);
        }
        if !rest.starts_with(b"\r\n") {
            return Err(MultipartError::Malformed);
        }

        let start = cursor + 2;
        let len =
            find_bytes(&body[start..], separator.as_bytes()).ok_or(MultipartError::Malformed)?;
        let end = start + len;

        if let Some(part) = read_part(body, start..end)? {
            return Ok(part);
        }
        cursor = end + separator.len();
    }
}

/// The bytes to store for an upload with the given request headers.
///
/// # Errors
///
/// Propagates [`extract_boundary`] and [`extract_file_part`] failures for
/// multipart bodies. Other bodies are returned unchanged.
pub fn upload_payload(headers: &HeaderMap, body: Bytes) -> Result<Bytes, MultipartError> {
    let Some(content_type) = headers
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .filter(|ct| is_multipart(ct))
    else {
        return Ok(body);
    };

    let boundary = extract_boundary(content_type)?;
    extract_file_part(&body, &boundary).map(|part| part.data)
}

/// Read one part. Returns `None` unless it is the file part.
fn read_part(body: &Bytes, range: Range<usize>) -> Result<Option<FilePart>, MultipartError> {
    let part = &body[range.clone()];

    // A part with no headers starts directly with the blank line.
    let (headers, data_start) = if part.starts_with(b"\r\n") {
        (&part[..0], 2)
    } else {
        let pos = find_bytes(part, b"\r\n\r\n").ok_or(MultipartError::Malformed)?;
        (&part[..pos], pos + 4)
    };

    let headers = String::from_utf8_lossy(headers);
    let mut name = None;
    let mut filename = None;
    let mut content_type = None;

    for line in headers.split("\r\n") {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.eq_ignore_ascii_case("content-disposition") {
            for (param, value) in header_params(value) {
                if param.eq_ignore_ascii_case("name") {
                    name = Some(value.to_owned());
                } else if param.eq_ignore_ascii_case("filename") {
                    filename = Some(value.to_owned());
                }
            }
        } else if key.eq_ignore_ascii_case("content-type") {
            content_type = Some(value.trim().to_owned());
        }
    }

    if name.as_deref() != Some(FILE_FIELD) {
        return Ok(None);
    }

    Ok(Some(FilePart {
        filename,
        content_type,
        data: body.slice(range.start + data_start..range.end),
    }))
}

/// `key=value` parameters after the first `;` of a header value, unquoted.
fn header_params(value: &str) -> impl Iterator<Item = (&str, &str)> {
    value.split(';').skip(1).filter_map(|param| {
        let (key, value) = param.split_once('=')?;
        Some((key.trim(), value.trim().trim_matches('"')))
    })
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

//! `multipart/form-data` body splitting.
//!
//! The boundary is read from the first line of the body and every later
//! delimiter is located by byte offset, always preceded by CRLF. Part content
//! is therefore copied byte-for-byte, including binary payloads that happen to
//! contain the boundary text without a leading line break.

use super::params::{insert_form_value, Params};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::{debug, warn};

/// Prefix of every upload temp file.
pub const UPLOAD_PREFIX: &str = "frontgate_upload_";

const DEFAULT_UPLOAD_CONTENT_TYPE: &str = "application/octet-stream";

/// Outcome of storing one uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadError {
    Ok,
    /// The file input was submitted without a file (empty filename)
    NoFile,
    /// The temp file could not be created or written
    CantWrite,
}

impl UploadError {
    /// Numeric code in the usual upload error numbering
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            UploadError::Ok => 0,
            UploadError::NoFile => 4,
            UploadError::CantWrite => 7,
        }
    }
}

/// Metadata and storage for one uploaded file.
///
/// The descriptor owns its temp file: dropping it deletes the file. An
/// application takes it with
/// [`HttpContext::take_upload`](crate::dispatcher::HttpContext::take_upload) and
/// calls [`UploadDescriptor::persist`] to keep the content beyond the request.
pub struct UploadDescriptor {
    pub field: String,
    pub filename: String,
    pub content_type: String,
    pub size: u64,
    pub error: UploadError,
    tmp: Option<TempPath>,
}

impl fmt::Debug for UploadDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadDescriptor")
            .field("field", &self.field)
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("size", &self.size)
            .field("error", &self.error)
            .field("tmp_name", &self.tmp_name())
            .finish()
    }
}

impl UploadDescriptor {
    /// Location of the stored content, absent when nothing was written
    #[must_use]
    pub fn tmp_name(&self) -> Option<&Path> {
        self.tmp.as_deref()
    }

    /// Read the stored content back.
    ///
    /// # Errors
    ///
    /// Fails when no file was stored or it can no longer be read.
    pub fn contents(&self) -> io::Result<Vec<u8>> {
        match self.tmp_name() {
            Some(path) => std::fs::read(path),
            None => Err(io::Error::new(io::ErrorKind::NotFound, "no stored upload")),
        }
    }

    /// Move the upload to `target` so it outlives the request.
    ///
    /// # Errors
    ///
    /// Fails when no file was stored or the rename fails.
    pub fn persist<P: AsRef<Path>>(mut self, target: P) -> io::Result<PathBuf> {
        let tmp = self
            .tmp
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no stored upload"))?;
        tmp.persist(target.as_ref()).map_err(|e| e.error)?;
        Ok(target.as_ref().to_path_buf())
    }

    /// JSON view in the shape applications usually expect for an upload entry
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "name": self.filename,
            "type": self.content_type,
            "tmp_name": self.tmp_name().map(|p| p.display().to_string()).unwrap_or_default(),
            "error": self.error.code(),
            "size": self.size,
        })
    }
}

/// Result of parsing a multipart body
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: Params,
    pub files: Vec<UploadDescriptor>,
}

/// Splits `multipart/form-data` bodies into fields and stored uploads.
#[derive(Debug, Clone, Default)]
pub struct MultipartParser {
    temp_dir: Option<PathBuf>,
}

impl MultipartParser {
    /// Parser storing uploads in the system temp directory
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parser storing uploads under `dir`
    #[must_use]
    pub fn with_temp_dir<P: Into<PathBuf>>(dir: P) -> Self {
        Self {
            temp_dir: Some(dir.into()),
        }
    }

    /// Parse a complete body.
    ///
    /// Never fails: unusable parts are skipped and failed writes are recorded
    /// on the descriptor as [`UploadError::CantWrite`].
    #[must_use]
    pub fn parse(&self, body: &[u8]) -> MultipartForm {
        let mut form = MultipartForm::default();
        for part in split_parts(body) {
            self.parse_part(part, &mut form);
        }
        debug!(
            field_count = form.fields.len(),
            file_count = form.files.len(),
            body_size_bytes = body.len(),
            "Multipart body parsed"
        );
        form
    }

    fn parse_part(&self, part: &[u8], form: &mut MultipartForm) {
        let Some(split) = find(part, b"\r\n\r\n") else {
            return;
        };
        let raw_headers = String::from_utf8_lossy(&part[..split]);
        let content = &part[split + 4..];

        let headers: HashMap<String, String> = raw_headers
            .split("\r\n")
            .filter_map(|line| {
                let (name, value) = line.split_once(':')?;
                Some((name.trim().to_ascii_lowercase(), value.trim().to_string()))
            })
            .collect();

        let Some(disposition) = headers.get("content-disposition") else {
            return;
        };
        let params = disposition_params(disposition);
        let Some(name) = params.get("name").filter(|n| !n.is_empty()) else {
            return;
        };

        match params.get("filename") {
            Some(filename) => {
                let content_type = headers
                    .get("content-type")
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_UPLOAD_CONTENT_TYPE.to_string());
                form.files
                    .push(self.store(name, filename, content_type, content));
            }
            None => {
                let value = String::from_utf8_lossy(content).into_owned();
                insert_form_value(&mut form.fields, name, Value::String(value));
            }
        }
    }

    fn store(
        &self,
        field: &str,
        filename: &str,
        content_type: String,
        content: &[u8],
    ) -> UploadDescriptor {
        let mut descriptor = UploadDescriptor {
            field: field.to_string(),
            filename: filename.to_string(),
            content_type,
            size: 0,
            error: UploadError::NoFile,
            tmp: None,
        };
        if filename.is_empty() {
            return descriptor;
        }

        match self.write_temp(content) {
            Ok(tmp) => {
                descriptor.size = content.len() as u64;
                descriptor.error = UploadError::Ok;
                debug!(
                    field = %field,
                    filename = %filename,
                    size = descriptor.size,
                    tmp_name = %tmp.display(),
                    "Upload stored"
                );
                descriptor.tmp = Some(tmp);
            }
            Err(err) => {
                warn!(field = %field, filename = %filename, error = %err, "Upload could not be stored");
                descriptor.error = UploadError::CantWrite;
            }
        }
        descriptor
    }

    fn write_temp(&self, content: &[u8]) -> io::Result<TempPath> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(UPLOAD_PREFIX);
        let mut file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(content)?;
        file.flush()?;
        Ok(file.into_temp_path())
    }
}

/// Split a body into the raw bytes of each part (headers + content).
fn split_parts(body: &[u8]) -> Vec<&[u8]> {
    let mut parts = Vec::new();
    let Some(line_end) = find(body, b"\r\n") else {
        return parts;
    };
    let boundary = &body[..line_end];
    if boundary.is_empty() {
        return parts;
    }
    let mut delimiter = Vec::with_capacity(boundary.len() + 2);
    delimiter.extend_from_slice(b"\r\n");
    delimiter.extend_from_slice(boundary);

    let mut pos = line_end + 2;
    while pos < body.len() {
        let rest = &body[pos..];
        let Some(found) = find(rest, &delimiter) else {
            // unterminated body: keep what is left as the last part
            push_part(&mut parts, rest);
            break;
        };
        push_part(&mut parts, &rest[..found]);

        let after = pos + found + delimiter.len();
        if body[after..].starts_with(b"--") {
            break;
        }
        match find(&body[after..], b"\r\n") {
            Some(eol) => pos = after + eol + 2,
            None => break,
        }
    }
    parts
}

fn push_part<'a>(parts: &mut Vec<&'a [u8]>, part: &'a [u8]) {
    if !part.is_empty() {
        parts.push(part);
    }
}

/// Parameters of a `Content-Disposition` value, names lower-cased.
fn disposition_params(value: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    let mut chars = value.chars().peekable();

    // disposition type
    for c in chars.by_ref() {
        if c == ';' {
            break;
        }
    }

    loop {
        let mut key = String::new();
        while let Some(&c) = chars.peek() {
            chars.next();
            if c == '=' || c == ';' {
                if c == ';' {
                    key.clear();
                    continue;
                }
                break;
            }
            key.push(c);
        }
        let key = key.trim().to_ascii_lowercase();
        if key.is_empty() {
            break;
        }

        while chars.peek() == Some(&' ') {
            chars.next();
        }
        let mut val = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            val.push(escaped);
                        }
                    }
                    '"' => break,
                    other => val.push(other),
                }
            }
            for c in chars.by_ref() {
                if c == ';' {
                    break;
                }
            }
        } else {
            for c in chars.by_ref() {
                if c == ';' {
                    break;
                }
                val.push(c);
            }
        }
        params.insert(key, val.trim_end().to_string());
    }
    params
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

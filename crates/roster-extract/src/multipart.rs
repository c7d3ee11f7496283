//! `multipart/form-data` reading over a buffered body.
//!
//! [`FormReader`] hands out one [`FormPart`] at a time. Parts must be
//! consumed in order; a part that is skipped without being read is drained
//! by [`multer`] when the next one is requested.

use std::fmt;
use std::io;

use bytes::Bytes;
use http::{header, HeaderMap};

use crate::{ExtractionError, ExtractionSource};

/// Size and count limits for one form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormLimits {
    /// Whole body, in bytes.
    pub body_bytes: usize,
    /// Any single part, in bytes.
    pub part_bytes: usize,
    /// Number of parts.
    pub parts: usize,
}

impl FormLimits {
    /// 50 MiB bodies, 10 MiB parts, 100 parts.
    pub const DEFAULT: Self = Self {
        body_bytes: 50 * 1024 * 1024,
        part_bytes: 10 * 1024 * 1024,
        parts: 100,
    };

    /// Replaces the body limit.
    #[must_use]
    pub fn body_bytes(self, body_bytes: usize) -> Self {
        Self { body_bytes, ..self }
    }

    /// Replaces the per-part limit.
    #[must_use]
    pub fn part_bytes(self, part_bytes: usize) -> Self {
        Self { part_bytes, ..self }
    }

    /// Replaces the part count limit.
    #[must_use]
    pub fn parts(self, parts: usize) -> Self {
        Self { parts, ..self }
    }
}

impl Default for FormLimits {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Sequential reader over the parts of a form.
pub struct FormReader {
    parts: multer::Multipart<'static>,
    limits: FormLimits,
    seen: usize,
}

impl FormReader {
    /// Opens a form from the request headers and its buffered body.
    ///
    /// The Content-Type must carry a boundary and the body must fit
    /// `limits.body_bytes`.
    pub fn open(
        headers: &HeaderMap,
        body: Bytes,
        limits: FormLimits,
    ) -> Result<Self, ExtractionError> {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ExtractionError::unsupported_media_type(None))?;

        let boundary = multer::parse_boundary(content_type).map_err(|_| {
            ExtractionError::invalid_type(
                ExtractionSource::ContentType,
                "boundary",
                "multipart boundary missing",
            )
        })?;

        if body.len() > limits.body_bytes {
            return Err(ExtractionError::payload_too_large(limits.body_bytes, body.len()));
        }

        let chunks = futures_util::stream::once(async move { Ok::<_, io::Error>(body) });
        Ok(Self {
            parts: multer::Multipart::new(chunks, boundary),
            limits,
            seen: 0,
        })
    }

    /// Advances to the next part. `Ok(None)` marks the closing boundary.
    pub async fn next_part(&mut self) -> Result<Option<FormPart>, ExtractionError> {
        let part = self.parts.next_field().await.map_err(|e| {
            ExtractionError::deserialization_failed(ExtractionSource::Body, format!("multipart: {e}"))
        })?;
        let Some(part) = part else {
            return Ok(None);
        };

        self.seen += 1;
        if self.seen > self.limits.parts {
            return Err(ExtractionError::validation_failed(
                ExtractionSource::Body,
                "multipart",
                format!("more than {} parts", self.limits.parts),
            ));
        }
        Ok(Some(FormPart {
            inner: part,
            limit: self.limits.part_bytes,
        }))
    }
}

impl fmt::Debug for FormReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormReader")
            .field("limits", &self.limits)
            .field("seen", &self.seen)
            .finish_non_exhaustive()
    }
}

/// One part of a form. Reading it consumes it.
pub struct FormPart {
    inner: multer::Field<'static>,
    limit: usize,
}

impl FormPart {
    /// The `name` disposition parameter.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.inner.name()
    }

    /// The client's file name; `filename=""` reads as `None`.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.inner.file_name().filter(|name| !name.is_empty())
    }

    /// Whether the disposition has a `filename` parameter at all, even an
    /// empty one.
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.inner.file_name().is_some()
    }

    /// The part's own Content-Type.
    #[must_use]
    pub fn content_type(&self) -> Option<&mime::Mime> {
        self.inner.content_type()
    }

    /// Reads the part body, failing past the per-part limit.
    pub async fn bytes(self) -> Result<Bytes, ExtractionError> {
        let data = self.inner.bytes().await.map_err(|e| {
            ExtractionError::deserialization_failed(ExtractionSource::Body, format!("multipart: {e}"))
        })?;
        if data.len() > self.limit {
            return Err(ExtractionError::payload_too_large(self.limit, data.len()));
        }
        Ok(data)
    }

    /// Reads the part body as UTF-8 text.
    pub async fn text(self) -> Result<String, ExtractionError> {
        let name = self.name().unwrap_or("multipart").to_owned();
        let data = self.bytes().await?;
        String::from_utf8(data.to_vec()).map_err(|_| {
            ExtractionError::invalid_type(ExtractionSource::Body, name, "text part is not UTF-8")
        })
    }

    /// Buffers a file part into an [`UploadedFile`].
    pub async fn into_upload(self) -> Result<UploadedFile, ExtractionError> {
        let field = self.name().map(str::to_owned);
        let file_name = self.file_name().map(str::to_owned);
        let content_type = self.content_type().map(|m| m.essence_str().to_owned());
        let data = self.bytes().await?;
        Ok(UploadedFile {
            field,
            file_name,
            content_type,
            data,
        })
    }
}

impl fmt::Debug for FormPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormPart")
            .field("name", &self.inner.name())
            .field("file_name", &self.inner.file_name())
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}

/// A received file, held in memory until the attachment store takes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Form field it arrived under.
    pub field: Option<String>,
    /// Client-side file name, used only for its extension.
    pub file_name: Option<String>,
    /// Declared media type without parameters.
    pub content_type: Option<String>,
    /// File content.
    pub data: Bytes,
}

impl UploadedFile {
    /// Client-side file name.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the file has no content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Encodes `(name, content type, file name, data)` parts as a form body.
#[doc(hidden)]
pub fn encode_form(boundary: &str, parts: &[(&str, &str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut out = Vec::new();
    for &(name, content_type, file_name, data) in parts {
        let disposition = match file_name {
            Some(file_name) => format!("form-data; name=\"{name}\"; filename=\"{file_name}\""),
            None => format!("form-data; name=\"{name}\""),
        };
        out.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: {disposition}\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        out.extend_from_slice(data);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDARY: &str = "roster-form";

    fn form_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}")
                .parse()
                .unwrap(),
        );
        headers
    }

    fn open(parts: &[(&str, &str, Option<&str>, &[u8])], limits: FormLimits) -> FormReader {
        FormReader::open(&form_headers(), encode_form(BOUNDARY, parts).into(), limits).unwrap()
    }

    #[tokio::test]
    async fn test_reads_text_then_file() {
        let mut form = open(
            &[
                ("department", "text/plain", None, b"eng"),
                ("profileImage", "image/png; charset=binary", Some("me.png"), b"PNG_DATA"),
            ],
            FormLimits::DEFAULT,
        );

        let text = form.next_part().await.unwrap().unwrap();
        assert_eq!(text.name(), Some("department"));
        assert!(!text.is_file());
        assert_eq!(text.text().await.unwrap(), "eng");

        let upload = form.next_part().await.unwrap().unwrap().into_upload().await.unwrap();
        assert_eq!(upload.field.as_deref(), Some("profileImage"));
        assert_eq!(upload.file_name(), Some("me.png"));
        assert_eq!(upload.content_type.as_deref(), Some("image/png"));
        assert_eq!(upload.len(), 8);

        assert!(form.next_part().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_blank_file_input() {
        let mut form = open(
            &[("profileImage", "application/octet-stream", Some(""), b"")],
            FormLimits::DEFAULT,
        );
        let part = form.next_part().await.unwrap().unwrap();
        assert!(part.is_file());
        assert_eq!(part.file_name(), None);
        assert!(part.into_upload().await.unwrap().is_empty());
    }

    #[test]
    fn test_boundary_required() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, "multipart/form-data".parse().unwrap());
        let err = FormReader::open(&headers, Bytes::new(), FormLimits::DEFAULT).unwrap_err();
        assert_eq!(err.field(), Some("boundary"));
    }

    #[test]
    fn test_body_limit() {
        let limits = FormLimits::DEFAULT.body_bytes(10);
        let err = FormReader::open(&form_headers(), Bytes::from(vec![0u8; 11]), limits).unwrap_err();
        assert!(err.is_payload_too_large());
    }

    #[tokio::test]
    async fn test_part_limit() {
        let mut form = open(
            &[("profileImage", "image/png", Some("big.png"), &[7u8; 64])],
            FormLimits::DEFAULT.part_bytes(16),
        );
        let part = form.next_part().await.unwrap().unwrap();
        assert!(part.into_upload().await.unwrap_err().is_payload_too_large());
    }

    #[tokio::test]
    async fn test_part_count_limit() {
        let mut form = open(
            &[
                ("a", "text/plain", None, b"1"),
                ("b", "text/plain", None, b"2"),
                ("c", "text/plain", None, b"3"),
            ],
            FormLimits::DEFAULT.parts(2),
        );
        assert!(form.next_part().await.unwrap().is_some());
        assert!(form.next_part().await.unwrap().is_some());
        let err = form.next_part().await.unwrap_err();
        assert_eq!(err.field(), Some("multipart"));
    }
}

//! Mutation payload extraction for create and update requests.
//!
//! A payload is the client-supplied [`Fields`] plus at most one attachment
//! from the `profileImage` file field. Three body encodings are accepted:
//!
//! | Content-Type | Fields | Attachment |
//! |---|---|---|
//! | `application/json` | top-level object members | never |
//! | `application/x-www-form-urlencoded` | string values | never |
//! | `multipart/form-data` | text parts, as strings | the `profileImage` file part |
//!
//! An empty body with no Content-Type is an empty payload. The reserved keys
//! `_id` and `profileImage` are always dropped from the fields.

use crate::multipart::{FormLimits, FormReader, UploadedFile};
use crate::{ExtractionContext, ExtractionError, ExtractionSource};
use roster_core::{Fields, PROFILE_IMAGE_FIELD};
use serde_json::Value;

/// Limits applied while reading a payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PayloadConfig {
    /// Form limits; `part_bytes` bounds the attachment.
    pub form: FormLimits,
}

impl PayloadConfig {
    /// Creates a config from explicit limits.
    #[must_use]
    pub fn new(max_body_size: usize, max_file_size: usize, max_fields: usize) -> Self {
        Self {
            form: FormLimits {
                body_bytes: max_body_size,
                part_bytes: max_file_size,
                parts: max_fields,
            },
        }
    }
}

/// Client input for a create or update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutationPayload {
    /// Client fields with reserved keys removed.
    pub fields: Fields,
    /// The single `profileImage` file, when one was sent.
    pub attachment: Option<UploadedFile>,
}

impl MutationPayload {
    /// Reads the payload from a buffered request.
    pub async fn extract(
        ctx: &ExtractionContext,
        config: &PayloadConfig,
    ) -> Result<Self, ExtractionError> {
        let Some(mime) = ctx.mime() else {
            if ctx.body().is_empty() {
                return Ok(Self::default());
            }
            return Err(ExtractionError::unsupported_media_type(ctx.content_type()));
        };

        match (mime.type_(), mime.subtype()) {
            (mime::APPLICATION, mime::JSON) => Self::from_json(ctx),
            (mime::APPLICATION, mime::WWW_FORM_URLENCODED) => Self::from_urlencoded(ctx),
            (mime::MULTIPART, mime::FORM_DATA) => Self::from_multipart(ctx, config).await,
            _ if ctx.body().is_empty() => Ok(Self::default()),
            _ => Err(ExtractionError::unsupported_media_type(ctx.content_type())),
        }
    }

    fn from_json(ctx: &ExtractionContext) -> Result<Self, ExtractionError> {
        if ctx.body().is_empty() {
            return Ok(Self::default());
        }

        let value: Value = serde_json::from_slice(ctx.body())
            .map_err(|e| ExtractionError::deserialization_failed(ExtractionSource::Body, e.to_string()))?;

        match value {
            Value::Object(map) => Ok(Self {
                fields: Fields::from(map).strip_reserved(),
                attachment: None,
            }),
            _ => Err(ExtractionError::invalid_type(
                ExtractionSource::Body,
                "body",
                "expected a JSON object",
            )),
        }
    }

    fn from_urlencoded(ctx: &ExtractionContext) -> Result<Self, ExtractionError> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(ctx.body())
            .map_err(|e| ExtractionError::deserialization_failed(ExtractionSource::Body, e.to_string()))?;

        let fields: Fields = pairs
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();

        Ok(Self {
            fields: fields.strip_reserved(),
            attachment: None,
        })
    }

    async fn from_multipart(
        ctx: &ExtractionContext,
        config: &PayloadConfig,
    ) -> Result<Self, ExtractionError> {
        let mut form = FormReader::open(ctx.headers(), ctx.body().clone(), config.form)?;
        let mut fields = Fields::new();
        let mut attachment: Option<UploadedFile> = None;

        while let Some(field) = form.next_part().await? {
            let name = field.name().unwrap_or_default().to_string();

            if field.is_file() {
                if name != PROFILE_IMAGE_FIELD {
                    return Err(ExtractionError::validation_failed(
                        ExtractionSource::Body,
                        name,
                        "unexpected file field",
                    ));
                }
                if field.file_name().is_none() {
                    // An empty file input submits a nameless, empty part.
                    field.bytes().await?;
                    continue;
                }
                if attachment.is_some() {
                    return Err(ExtractionError::validation_failed(
                        ExtractionSource::Body,
                        PROFILE_IMAGE_FIELD,
                        "only one file is allowed",
                    ));
                }
                attachment = Some(field.into_upload().await?);
            } else {
                let value = field.text().await?;
                fields.insert(name, Value::String(value));
            }
        }

        Ok(Self {
            fields: fields.strip_reserved(),
            attachment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multipart::encode_form;
    use bytes::Bytes;
    use http::{header, HeaderMap, Method, Uri};
    use serde_json::json;

    const BOUNDARY: &str = "XyZ";

    fn ctx(content_type: Option<&str>, body: impl Into<Bytes>) -> ExtractionContext {
        let mut headers = HeaderMap::new();
        if let Some(ct) = content_type {
            headers.insert(header::CONTENT_TYPE, ct.parse().unwrap());
        }
        ExtractionContext::new(
            Method::POST,
            Uri::from_static("/api/employees"),
            headers,
            body.into(),
        )
    }

    fn multipart(parts: &[(&str, &str, Option<&str>, &[u8])]) -> ExtractionContext {
        ctx(
            Some(&format!("multipart/form-data; boundary={BOUNDARY}")),
            encode_form(BOUNDARY, parts),
        )
    }

    async fn extract(ctx: &ExtractionContext) -> Result<MutationPayload, ExtractionError> {
        MutationPayload::extract(ctx, &PayloadConfig::default()).await
    }

    #[tokio::test]
    async fn test_json_object() {
        let payload = extract(&ctx(
            Some("application/json"),
            r#"{"department":"eng","age":31,"_id":"forged","profileImage":"x.png"}"#,
        ))
        .await
        .unwrap();

        assert_eq!(payload.fields.get("department"), Some(&json!("eng")));
        assert_eq!(payload.fields.get("age"), Some(&json!(31)));
        assert!(!payload.fields.contains("_id"));
        assert!(payload.fields.profile_image().is_none());
        assert!(payload.attachment.is_none());
    }

    #[tokio::test]
    async fn test_json_must_be_object() {
        let err = extract(&ctx(Some("application/json"), "[1,2]")).await.unwrap_err();
        assert_eq!(err.status_code(), http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_json() {
        let err = extract(&ctx(Some("application/json"), "{nope")).await.unwrap_err();
        assert!(err.to_string().starts_with("malformed body"));
    }

    #[tokio::test]
    async fn test_urlencoded() {
        let payload = extract(&ctx(
            Some("application/x-www-form-urlencoded"),
            "department=eng&position=lead%20dev",
        ))
        .await
        .unwrap();
        assert_eq!(payload.fields.get("position"), Some(&json!("lead dev")));
    }

    #[tokio::test]
    async fn test_empty_body_without_content_type() {
        let payload = extract(&ctx(None, Bytes::new())).await.unwrap();
        assert!(payload.fields.is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_content_type() {
        let err = extract(&ctx(Some("text/csv"), "a,b")).await.unwrap_err();
        assert!(err.to_string().contains("text/csv"));
    }

    #[tokio::test]
    async fn test_multipart_with_profile_image() {
        let payload = extract(&multipart(&[
            ("department", "text/plain", None, b"eng"),
            ("profileImage", "image/png", Some("me.png"), b"PNG"),
        ]))
        .await
        .unwrap();

        assert_eq!(payload.fields.get("department"), Some(&json!("eng")));
        let file = payload.attachment.unwrap();
        assert_eq!(file.file_name(), Some("me.png"));
        assert_eq!(file.data.as_ref(), b"PNG");
    }

    #[tokio::test]
    async fn test_multipart_text_profile_image_is_dropped() {
        let payload = extract(&multipart(&[(
            "profileImage",
            "text/plain",
            None,
            b"../../etc/passwd",
        )]))
        .await
        .unwrap();

        assert!(payload.fields.profile_image().is_none());
        assert!(payload.attachment.is_none());
    }

    #[tokio::test]
    async fn test_two_profile_images_rejected() {
        let err = extract(&multipart(&[
            ("profileImage", "image/png", Some("a.png"), b"A"),
            ("profileImage", "image/png", Some("b.png"), b"B"),
        ]))
        .await
        .unwrap_err();

        assert_eq!(err.field(), Some("profileImage"));
        assert_eq!(err.status_code(), http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unexpected_file_field_rejected() {
        let err = extract(&multipart(&[("resume", "application/pdf", Some("cv.pdf"), b"%PDF")]))
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("resume"));
    }

    #[tokio::test]
    async fn test_empty_file_input_is_no_attachment() {
        let payload = extract(&multipart(&[
            ("position", "text/plain", None, b"lead"),
            ("profileImage", "application/octet-stream", Some(""), b""),
        ]))
        .await
        .unwrap();

        assert!(payload.attachment.is_none());
        assert_eq!(payload.fields.len(), 1);
    }

    #[tokio::test]
    async fn test_oversized_attachment() {
        let config = PayloadConfig::new(1024 * 1024, 4, 10);
        let ctx = multipart(&[("profileImage", "image/png", Some("a.png"), b"123456789")]);
        let err = MutationPayload::extract(&ctx, &config).await.unwrap_err();
        assert!(err.is_payload_too_large());
    }
}

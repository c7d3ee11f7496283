//! Test request building.

use crate::error::TestError;
use bytes::{BufMut, Bytes, BytesMut};
use http::{header, HeaderMap, HeaderName, HeaderValue, Method, Uri};
use http_body_util::Full;
use roster_middleware::Request;
use serde::Serialize;

/// Builder for requests sent through a [`TestClient`](crate::TestClient).
///
/// Invalid headers or bodies are remembered and reported by
/// [`build`](Self::build), so chains never panic halfway.
#[must_use]
#[derive(Debug)]
pub struct TestRequestBuilder {
    method: Method,
    uri: String,
    headers: HeaderMap,
    body: Bytes,
    error: Option<TestError>,
}

impl TestRequestBuilder {
    /// Creates a builder for `method` on `uri`.
    pub fn new(method: Method, uri: impl AsRef<str>) -> Self {
        Self {
            method,
            uri: uri.as_ref().to_string(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            error: None,
        }
    }

    /// Sets a header, replacing any previous value.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = HeaderName::try_from(name.as_ref());
        let value = HeaderValue::try_from(value.as_ref());
        match (name, value) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            (Err(e), _) => self.remember(TestError::InvalidHeader(e.to_string())),
            (_, Err(e)) => self.remember(TestError::InvalidHeader(e.to_string())),
        }
        self
    }

    /// Sets the `Content-Type` header.
    pub fn content_type(self, content_type: impl AsRef<str>) -> Self {
        self.header(header::CONTENT_TYPE.as_str(), content_type)
    }

    /// Sets `Authorization: Bearer <token>`.
    pub fn bearer_token(self, token: impl AsRef<str>) -> Self {
        self.header(
            header::AUTHORIZATION.as_str(),
            format!("Bearer {}", token.as_ref()),
        )
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets a JSON body and its content type.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => {
                self.body = Bytes::from(body);
                self.content_type("application/json")
            }
            Err(e) => {
                self.remember(TestError::Json(e));
                self
            }
        }
    }

    /// Sets a `multipart/form-data` body and its content type.
    pub fn multipart(mut self, form: MultipartForm) -> Self {
        let content_type = form.content_type();
        self.body = form.into_body();
        self.content_type(content_type)
    }

    /// Builds the buffered request.
    pub fn build(self) -> Result<Request, TestError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let uri: Uri = self
            .uri
            .parse()
            .map_err(|e: http::uri::InvalidUri| TestError::RequestBuild(e.to_string()))?;

        let mut request = http::Request::builder()
            .method(self.method)
            .uri(uri)
            .body(Full::new(self.body))
            .map_err(|e| TestError::RequestBuild(e.to_string()))?;
        *request.headers_mut() = self.headers;
        Ok(request)
    }

    fn remember(&mut self, error: TestError) {
        self.error.get_or_insert(error);
    }
}

/// One part of a [`MultipartForm`].
#[derive(Debug, Clone)]
struct FormPart {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    data: Bytes,
}

/// A `multipart/form-data` body under construction.
///
/// ```rust
/// use roster_test::MultipartForm;
///
/// let form = MultipartForm::new()
///     .text("department", "engineering")
///     .file("profileImage", "me.png", "image/png", &b"PNG"[..]);
///
/// assert!(form.content_type().starts_with("multipart/form-data; boundary="));
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct MultipartForm {
    boundary: String,
    parts: Vec<FormPart>,
}

impl MultipartForm {
    /// Boundary used unless one is chosen explicitly.
    pub const DEFAULT_BOUNDARY: &'static str = "roster-test-boundary-7MA4YWxk";

    /// Creates an empty form.
    pub fn new() -> Self {
        Self::with_boundary(Self::DEFAULT_BOUNDARY)
    }

    /// Creates an empty form with a specific boundary.
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            parts: Vec::new(),
        }
    }

    /// Adds a text field.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart {
            name: name.into(),
            file_name: None,
            content_type: None,
            data: Bytes::from(value.into()),
        });
        self
    }

    /// Adds a file part.
    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        self.parts.push(FormPart {
            name: name.into(),
            file_name: Some(file_name.into()),
            content_type: Some(content_type.into()),
            data: data.into(),
        });
        self
    }

    /// Returns the `Content-Type` header value for this form.
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Encodes the form.
    #[must_use]
    pub fn into_body(self) -> Bytes {
        let mut body = BytesMut::new();

        for part in &self.parts {
            body.put_slice(format!("--{}\r\n", self.boundary).as_bytes());
            match &part.file_name {
                Some(file_name) => body.put_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{file_name}\"\r\n",
                        part.name
                    )
                    .as_bytes(),
                ),
                None => body.put_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n", part.name)
                        .as_bytes(),
                ),
            }
            if let Some(content_type) = &part.content_type {
                body.put_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
            }
            body.put_slice(b"\r\n");
            body.put_slice(&part.data);
            body.put_slice(b"\r\n");
        }

        body.put_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        body.freeze()
    }
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

//! Serving stored attachments under `/uploads/{file}`.
//!
//! Only names that address a file directly inside the storage root are
//! served. Anything else, including a missing file or a directory, is a 404.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use bytes::Bytes;
use http::{header, HeaderMap, Method, StatusCode};
use http_body_util::Full;
use roster_middleware::{Response, ResponseExt};
use roster_store::is_plain_file_name;

const NOT_FOUND: &str = "Not found";

/// Read-only view of the storage root.
#[derive(Debug, Clone)]
pub struct UploadFiles {
    root: PathBuf,
}

impl UploadFiles {
    /// Serves files from `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Answers a `GET` or `HEAD` for `file_name`.
    pub async fn serve(&self, file_name: &str, method: &Method, headers: &HeaderMap) -> Response {
        if !is_plain_file_name(file_name) || file_name.starts_with('.') {
            return Response::message(StatusCode::NOT_FOUND, NOT_FOUND);
        }

        let path = self.root.join(file_name);
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => return Response::message(StatusCode::NOT_FOUND, NOT_FOUND),
            Err(e) => return io_failure(&path, &e),
        };
        let modified = metadata.modified().ok();

        if let (Some(modified), Some(since)) = (modified, if_modified_since(headers)) {
            if whole_secs(modified) <= whole_secs(since) {
                return build(StatusCode::NOT_MODIFIED, None, Some(modified), Bytes::new());
            }
        }

        let content_type = content_type_for(&path);
        if method == Method::HEAD {
            let mut response = build(StatusCode::OK, Some(content_type), modified, Bytes::new());
            response
                .headers_mut()
                .insert(header::CONTENT_LENGTH, metadata.len().into());
            return response;
        }

        match tokio::fs::read(&path).await {
            Ok(content) => build(StatusCode::OK, Some(content_type), modified, Bytes::from(content)),
            Err(e) => io_failure(&path, &e),
        }
    }
}

fn io_failure(path: &Path, error: &std::io::Error) -> Response {
    if error.kind() == ErrorKind::NotFound {
        return Response::message(StatusCode::NOT_FOUND, NOT_FOUND);
    }
    tracing::error!(path = %path.display(), error = %error, "failed to read attachment");
    Response::message(StatusCode::INTERNAL_SERVER_ERROR, roster_core::SERVER_ERROR_MESSAGE)
}

fn if_modified_since(headers: &HeaderMap) -> Option<SystemTime> {
    let value = headers.get(header::IF_MODIFIED_SINCE)?.to_str().ok()?;
    httpdate::parse_http_date(value).ok()
}

fn whole_secs(time: SystemTime) -> u64 {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

fn build(
    status: StatusCode,
    content_type: Option<&'static str>,
    modified: Option<SystemTime>,
    body: Bytes,
) -> Response {
    let mut builder = http::Response::builder()
        .status(status)
        .header(header::X_CONTENT_TYPE_OPTIONS, "nosniff");

    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    if let Some(modified) = modified {
        builder = builder.header(header::LAST_MODIFIED, httpdate::fmt_http_date(modified));
    }

    builder.body(Full::new(body)).unwrap_or_else(|_| {
        let mut response = http::Response::new(Full::new(Bytes::new()));
        *response.status_mut() = status;
        response
    })
}

/// Maps a file extension to a content type.
pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "heic" => "image/heic",
        "pdf" => "application/pdf",
        "json" => "application/json",
        "txt" => "text/plain; charset=utf-8",
        "csv" => "text/csv; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    fn setup() -> (tempfile::TempDir, UploadFiles) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("1700000000000-me.png"), b"PNGDATA").unwrap();
        std::fs::write(dir.path().join(".hidden"), b"secret").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        let files = UploadFiles::new(dir.path());
        (dir, files)
    }

    async fn body(response: Response) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_serves_stored_file() {
        let (_dir, files) = setup();
        let response = files
            .serve("1700000000000-me.png", &Method::GET, &HeaderMap::new())
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        assert!(response.headers().contains_key(header::LAST_MODIFIED));
        assert_eq!(body(response).await.as_ref(), b"PNGDATA");
    }

    #[tokio::test]
    async fn test_head_has_no_body() {
        let (_dir, files) = setup();
        let response = files
            .serve("1700000000000-me.png", &Method::HEAD, &HeaderMap::new())
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "7");
        assert!(body(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_not_modified() {
        let (_dir, files) = setup();
        let mut headers = HeaderMap::new();
        let later = SystemTime::now() + std::time::Duration::from_secs(3600);
        headers.insert(
            header::IF_MODIFIED_SINCE,
            httpdate::fmt_http_date(later).parse().unwrap(),
        );

        let response = files
            .serve("1700000000000-me.png", &Method::GET, &headers)
            .await;
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    }

    #[tokio::test]
    async fn test_not_found_cases() {
        let (_dir, files) = setup();
        for name in ["missing.png", "../secret", "nested", ".hidden", ".."] {
            let response = files.serve(name, &Method::GET, &HeaderMap::new()).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{name}");
        }
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("a.pdf")), "application/pdf");
        assert_eq!(content_type_for(Path::new("noext")), "application/octet-stream");
    }
}

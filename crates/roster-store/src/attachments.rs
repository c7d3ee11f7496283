//! Attachment storage.
//!
//! Uploaded files are written under a storage root with a generated name of
//! the form `<millis>-<original-name>`. The millisecond prefix comes from a
//! process-wide clock that never repeats a value, and files are created
//! exclusively, so concurrent uploads of the same name never overwrite each
//! other. Only the generated file name is handed back; records store that
//! name, never a path.

use crate::{StoreError, StoreResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::io::AsyncWriteExt;

const FALLBACK_NAME: &str = "file";
const MAX_ATTEMPTS: u32 = 16;

/// A file that was durably written to the storage root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAttachment {
    /// The generated name, relative to the storage root.
    pub file_name: String,
    /// Number of bytes written.
    pub size: usize,
}

/// Where accepted attachments are persisted.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Persists `data` under a fresh name derived from `original_name`.
    async fn put(&self, original_name: &str, data: Bytes) -> StoreResult<StoredAttachment>;

    /// Removes a previously stored file.
    async fn remove(&self, file_name: &str) -> StoreResult<()>;
}

/// Stores attachments as plain files in one directory.
#[derive(Debug)]
pub struct DiskAttachmentStore {
    root: PathBuf,
    clock: MillisClock,
}

impl DiskAttachmentStore {
    /// Creates a store writing under `root`. The directory must exist.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            clock: MillisClock::default(),
        }
    }

    /// Creates `root` (and parents) if missing, then the store.
    pub async fn create(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| StoreError::io(&root, e))?;
        Ok(Self::new(root))
    }

    /// Returns the storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn write_new(&self, path: &Path, data: &[u8]) -> std::io::Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await?;

        let written = async {
            file.write_all(data).await?;
            file.sync_all().await
        }
        .await;

        if written.is_err() {
            drop(file);
            let _ = tokio::fs::remove_file(path).await;
        }
        written
    }
}

#[async_trait]
impl AttachmentStore for DiskAttachmentStore {
    async fn put(&self, original_name: &str, data: Bytes) -> StoreResult<StoredAttachment> {
        let base = sanitize_file_name(original_name);

        for _ in 0..MAX_ATTEMPTS {
            let file_name = format!("{}-{}", self.clock.tick(), base);
            let path = self.root.join(&file_name);

            match self.write_new(&path, &data).await {
                Ok(()) => {
                    tracing::debug!(file_name = %file_name, size = data.len(), "attachment stored");
                    return Ok(StoredAttachment {
                        file_name,
                        size: data.len(),
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
                Err(e) => return Err(StoreError::io(path, e)),
            }
        }

        Err(StoreError::NameExhausted {
            file_name: base,
            attempts: MAX_ATTEMPTS,
        })
    }

    async fn remove(&self, file_name: &str) -> StoreResult<()> {
        if !is_plain_file_name(file_name) {
            return Err(StoreError::io(
                file_name,
                std::io::Error::new(ErrorKind::InvalidInput, "not a plain file name"),
            ));
        }
        let path = self.root.join(file_name);
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| StoreError::io(path, e))
    }
}

/// Reduces a client-supplied file name to a safe single path component.
///
/// Keeps the last component after `/` or `\`, drops control characters and
/// falls back to `file` when nothing usable is left.
///
/// ```rust
/// use roster_store::sanitize_file_name;
///
/// assert_eq!(sanitize_file_name("C:\\photos\\me.png"), "me.png");
/// assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
/// assert_eq!(sanitize_file_name(".."), "file");
/// ```
pub fn sanitize_file_name(original: &str) -> String {
    let last = original.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = last.chars().filter(|c| !c.is_control()).collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        FALLBACK_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Returns `true` for a name that addresses a file directly inside a
/// directory: no separators, not `.` or `..`, no NUL.
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

/// Millisecond clock that hands out strictly increasing values.
#[derive(Debug, Default)]
struct MillisClock {
    last: AtomicI64,
}

impl MillisClock {
    fn tick(&self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        let previous = self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        now.max(previous + 1)
    }
}

//! Process assembly shared by the binary and the integration tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use roster_config::{ConfigError, ConfigLoader, RosterConfig};
use roster_server::{App, ReadinessCheck};
use roster_store::{DiskAttachmentStore, InMemoryEmployeeStore};

/// Variable naming an explicit configuration file.
pub const CONFIG_PATH_VAR: &str = "ROSTER_CONFIG";

/// File read from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "roster.toml";

/// Prefix of `ROSTER__SECTION__KEY` overrides.
pub const ENV_PREFIX: &str = "ROSTER";

/// Loads the layered configuration.
///
/// A path in `ROSTER_CONFIG` must exist; otherwise `roster.toml` is read
/// only if present.
pub fn load_config() -> Result<RosterConfig, ConfigError> {
    let loader = match std::env::var_os(CONFIG_PATH_VAR) {
        Some(path) => ConfigLoader::new().with_file(PathBuf::from(path))?,
        None => ConfigLoader::new().with_optional_file(DEFAULT_CONFIG_FILE)?,
    };

    loader
        .with_dotenv()?
        .with_conventional_env()
        .with_env_prefix(ENV_PREFIX)
        .load()
}

/// Creates the upload directory and assembles the app for `config`.
pub async fn build_app(config: &RosterConfig) -> anyhow::Result<App> {
    let attachments = DiskAttachmentStore::create(&config.storage.upload_dir)
        .await
        .with_context(|| {
            format!(
                "failed to prepare upload directory {}",
                config.storage.upload_dir.display()
            )
        })?;

    let root = attachments.root().to_path_buf();
    let readiness = ReadinessCheck::new().add_check("storage", storage_check(root.clone()));

    let app = App::builder()
        .config(config)
        .employee_store(Arc::new(InMemoryEmployeeStore::new()))
        .attachment_store(Arc::new(attachments))
        .upload_root(root)
        .readiness(readiness)
        .build()?;

    Ok(app)
}

fn storage_check(root: PathBuf) -> impl Fn() -> bool + Send + Sync + 'static {
    move || is_writable_dir(&root)
}

fn is_writable_dir(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|meta| meta.is_dir() && !meta.permissions().readonly())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_build_app_creates_upload_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = RosterConfig::development();
        config.auth.jwt_secret = "bootstrap-secret".to_string();
        config.storage.upload_dir = dir.path().join("nested/uploads");

        let app = build_app(&config).await.unwrap();

        assert!(config.storage.upload_dir.is_dir());
        assert!(app.readiness().is_ready());
    }

    #[tokio::test]
    async fn test_readiness_follows_upload_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = RosterConfig::development();
        config.auth.jwt_secret = "bootstrap-secret".to_string();
        config.storage.upload_dir = dir.path().join("uploads");

        let app = build_app(&config).await.unwrap();
        std::fs::remove_dir(&config.storage.upload_dir).unwrap();

        assert!(!app.readiness().is_ready());
        assert_eq!(app.readiness().status().check("storage"), Some(false));
    }
}

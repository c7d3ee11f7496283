//! A ready-made app over temporary storage.

use std::path::Path;
use std::sync::Arc;

use roster_middleware::TokenValidator;
use roster_server::App;
use roster_store::{AttachmentStore, DiskAttachmentStore, EmployeeStore, InMemoryEmployeeStore};
use tempfile::TempDir;

use crate::client::TestClient;
use crate::error::TestError;
use crate::token::TokenFactory;

/// Secret shared by the harness validator and its [`TokenFactory`].
pub const TEST_SECRET: &str = "roster-test-secret";

/// An [`App`] backed by an in-memory store and a temporary upload directory.
///
/// The directory is removed when the harness is dropped.
///
/// ```rust
/// use roster_test::TestApp;
///
/// # tokio_test::block_on(async {
/// let app = TestApp::new().unwrap();
/// let token = app.token("u-1").unwrap();
///
/// let response = app.client().get("/api/employees").bearer_token(&token).send().await;
/// assert_eq!(response.status_code(), 200);
/// # });
/// ```
pub struct TestApp {
    client: TestClient,
    tokens: TokenFactory,
    employees: Arc<dyn EmployeeStore>,
    uploads: TempDir,
}

impl TestApp {
    /// Builds the default harness.
    pub fn new() -> Result<Self, TestError> {
        Self::builder().build()
    }

    /// Starts a harness builder for swapping stores.
    #[must_use]
    pub fn builder() -> TestAppBuilder {
        TestAppBuilder::default()
    }

    /// Returns the client.
    #[must_use]
    pub fn client(&self) -> &TestClient {
        &self.client
    }

    /// Returns the token factory.
    #[must_use]
    pub fn tokens(&self) -> &TokenFactory {
        &self.tokens
    }

    /// Issues a valid token for `id`.
    pub fn token(&self, id: &str) -> Result<String, TestError> {
        self.tokens.issue(id, &format!("{id}@example.com"))
    }

    /// Returns the employee store behind the app.
    #[must_use]
    pub fn employees(&self) -> &Arc<dyn EmployeeStore> {
        &self.employees
    }

    /// Returns the upload directory.
    #[must_use]
    pub fn upload_dir(&self) -> &Path {
        self.uploads.path()
    }

    /// Lists the file names currently in the upload directory.
    pub fn uploaded_files(&self) -> Result<Vec<String>, TestError> {
        let entries = std::fs::read_dir(self.uploads.path())
            .map_err(|e| TestError::Setup(e.to_string()))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| TestError::Setup(e.to_string()))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
}

impl std::fmt::Debug for TestApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestApp")
            .field("client", &self.client)
            .field("upload_dir", &self.uploads.path())
            .finish_non_exhaustive()
    }
}

/// Builder for [`TestApp`].
#[must_use]
#[derive(Default)]
pub struct TestAppBuilder {
    employees: Option<Arc<dyn EmployeeStore>>,
    attachments: Option<Arc<dyn AttachmentStore>>,
}

impl TestAppBuilder {
    /// Replaces the in-memory employee store.
    pub fn employee_store(mut self, store: Arc<dyn EmployeeStore>) -> Self {
        self.employees = Some(store);
        self
    }

    /// Replaces the disk attachment store.
    pub fn attachment_store(mut self, store: Arc<dyn AttachmentStore>) -> Self {
        self.attachments = Some(store);
        self
    }

    /// Builds the harness.
    pub fn build(self) -> Result<TestApp, TestError> {
        let uploads = tempfile::tempdir().map_err(|e| TestError::Setup(e.to_string()))?;
        let employees = self
            .employees
            .unwrap_or_else(|| Arc::new(InMemoryEmployeeStore::new()));
        let attachments = self
            .attachments
            .unwrap_or_else(|| Arc::new(DiskAttachmentStore::new(uploads.path())));

        let app = App::builder()
            .employee_store(Arc::clone(&employees))
            .attachment_store(attachments)
            .upload_root(uploads.path())
            .validator(TokenValidator::new(TEST_SECRET))
            .build()
            .map_err(|e| TestError::Setup(e.to_string()))?;

        Ok(TestApp {
            client: TestClient::new(app),
            tokens: TokenFactory::new(TEST_SECRET),
            employees,
            uploads,
        })
    }
}

impl std::fmt::Debug for TestAppBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestAppBuilder")
            .field("custom_employees", &self.employees.is_some())
            .field("custom_attachments", &self.attachments.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_harness_round_trip() {
        let app = TestApp::new().unwrap();
        let token = app.token("u-1").unwrap();

        let created = app
            .client()
            .post("/api/employees")
            .bearer_token(&token)
            .json(&json!({"firstName": "Ada", "department": "eng"}))
            .send()
            .await;
        created.assert_status(StatusCode::CREATED);

        let id = created.json_value().unwrap()["_id"].as_str().unwrap().to_string();
        let fetched = app
            .client()
            .get(format!("/api/employees/{id}"))
            .bearer_token(&token)
            .send()
            .await;
        fetched.assert_status(StatusCode::OK);
        assert_eq!(fetched.json_value().unwrap()["firstName"], "Ada");
    }

    #[tokio::test]
    async fn test_upload_dir_starts_empty() {
        let app = TestApp::new().unwrap();
        assert!(app.uploaded_files().unwrap().is_empty());
    }
}

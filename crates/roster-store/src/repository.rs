//! Existence-checked access to the employee collection.
//!
//! [`EmployeeRepository`] is what request handlers talk to. It parses path
//! ids, turns misses into [`RosterError::NotFound`] and store faults into
//! [`RosterError::Store`], so handlers only ever see the service taxonomy.

use crate::{EmployeeStore, StoreError};
use roster_core::{EmployeeId, EmployeeRecord, Fields, Filter, RosterError, RosterResult};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Confirmation returned by a successful delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Deleted {
    #[serde(skip)]
    id: EmployeeId,
    message: &'static str,
}

impl Deleted {
    /// The confirmation text sent to clients.
    pub const MESSAGE: &'static str = "Employee deleted";

    fn new(id: EmployeeId) -> Self {
        Self {
            id,
            message: Self::MESSAGE,
        }
    }

    /// Returns the id of the removed record.
    pub const fn id(&self) -> EmployeeId {
        self.id
    }
}

/// Handler-facing adapter over an [`EmployeeStore`].
#[derive(Clone)]
pub struct EmployeeRepository {
    store: Arc<dyn EmployeeStore>,
}

impl fmt::Debug for EmployeeRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmployeeRepository").finish_non_exhaustive()
    }
}

impl EmployeeRepository {
    /// Wraps a store.
    pub fn new(store: Arc<dyn EmployeeStore>) -> Self {
        Self { store }
    }

    /// Returns the records matching `filter`.
    pub async fn list(&self, filter: &Filter) -> RosterResult<Vec<EmployeeRecord>> {
        Ok(self.store.find(filter).await?)
    }

    /// Returns one record or `NotFound`.
    pub async fn get(&self, raw_id: &str) -> RosterResult<EmployeeRecord> {
        let id = parse_id(raw_id)?;
        self.store
            .find_by_id(&id)
            .await?
            .ok_or_else(|| RosterError::not_found(raw_id))
    }

    /// Creates a record from client fields.
    pub async fn create(&self, fields: Fields) -> RosterResult<EmployeeRecord> {
        let record = self.store.insert(fields).await?;
        tracing::debug!(employee_id = %record.id, "employee created");
        Ok(record)
    }

    /// Merges `patch` into an existing record.
    pub async fn update(&self, raw_id: &str, patch: Fields) -> RosterResult<EmployeeRecord> {
        let id = parse_id(raw_id)?;
        self.store
            .update_by_id(&id, patch)
            .await?
            .ok_or_else(|| RosterError::not_found(raw_id))
    }

    /// Deletes a record.
    pub async fn delete(&self, raw_id: &str) -> RosterResult<Deleted> {
        let id = parse_id(raw_id)?;
        if self.store.delete_by_id(&id).await? {
            tracing::debug!(employee_id = %id, "employee deleted");
            Ok(Deleted::new(id))
        } else {
            Err(RosterError::not_found(raw_id))
        }
    }
}

fn parse_id(raw: &str) -> Result<EmployeeId, StoreError> {
    raw.parse().map_err(|_| StoreError::invalid_id(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InMemoryEmployeeStore, StoreResult};
    use async_trait::async_trait;
    use roster_core::ErrorCategory;
    use serde_json::json;

    fn repo() -> EmployeeRepository {
        EmployeeRepository::new(Arc::new(InMemoryEmployeeStore::new()))
    }

    struct BrokenStore;

    #[async_trait]
    impl EmployeeStore for BrokenStore {
        async fn find(&self, _: &Filter) -> StoreResult<Vec<EmployeeRecord>> {
            Err(StoreError::backend("find", anyhow::anyhow!("connection reset")))
        }
        async fn find_by_id(&self, _: &EmployeeId) -> StoreResult<Option<EmployeeRecord>> {
            Err(StoreError::backend("find_by_id", anyhow::anyhow!("connection reset")))
        }
        async fn insert(&self, _: Fields) -> StoreResult<EmployeeRecord> {
            Err(StoreError::backend("insert", anyhow::anyhow!("connection reset")))
        }
        async fn update_by_id(
            &self,
            _: &EmployeeId,
            _: Fields,
        ) -> StoreResult<Option<EmployeeRecord>> {
            Err(StoreError::backend("update_by_id", anyhow::anyhow!("connection reset")))
        }
        async fn delete_by_id(&self, _: &EmployeeId) -> StoreResult<bool> {
            Err(StoreError::backend("delete_by_id", anyhow::anyhow!("connection reset")))
        }
    }

    #[tokio::test]
    async fn test_get_unknown_id_is_not_found() {
        let err = repo().get(&EmployeeId::generate().to_string()).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert_eq!(err.client_message(), "Employee not found");
    }

    #[tokio::test]
    async fn test_malformed_id_is_store_fault() {
        let err = repo().get("123").await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Store);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let repo = repo();
        let mut patch = Fields::new();
        patch.insert("position", "lead");
        let err = repo
            .update(&EmployeeId::generate().to_string(), patch)
            .await
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert!(repo.list(&Filter::all()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_then_get() {
        let repo = repo();
        let created = repo.create(Fields::new()).await.unwrap();
        let id = created.id.to_string();

        let deleted = repo.delete(&id).await.unwrap();
        assert_eq!(deleted.id(), created.id);
        assert_eq!(
            serde_json::to_value(deleted).unwrap(),
            json!({"message": "Employee deleted"})
        );

        assert_eq!(
            repo.get(&id).await.unwrap_err().category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            repo.delete(&id).await.unwrap_err().category(),
            ErrorCategory::NotFound
        );
    }

    #[tokio::test]
    async fn test_backend_faults_surface_as_store_errors() {
        let repo = EmployeeRepository::new(Arc::new(BrokenStore));
        let err = repo.list(&Filter::all()).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Store);
        assert_eq!(err.client_message(), "Server error");

        let err = repo.create(Fields::new()).await.unwrap_err();
        assert!(err.to_string().contains("insert"));
    }
}

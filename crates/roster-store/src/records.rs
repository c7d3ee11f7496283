//! The employee collection interface and its in-memory implementation.

use crate::StoreResult;
use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::RwLock;
use roster_core::{EmployeeId, EmployeeRecord, Fields, Filter};

/// A collection of employee records.
///
/// Implementations must be safe to share across requests. Each call is
/// atomic on its own; callers get no ordering guarantee between calls.
#[async_trait]
pub trait EmployeeStore: Send + Sync {
    /// Returns every record matching `filter`, in store-defined order.
    async fn find(&self, filter: &Filter) -> StoreResult<Vec<EmployeeRecord>>;

    /// Looks up one record.
    async fn find_by_id(&self, id: &EmployeeId) -> StoreResult<Option<EmployeeRecord>>;

    /// Inserts a new record under a freshly assigned id.
    async fn insert(&self, fields: Fields) -> StoreResult<EmployeeRecord>;

    /// Replaces the fields present in `patch`, returning the merged record.
    ///
    /// Returns `None` when no record has `id`; never inserts.
    async fn update_by_id(
        &self,
        id: &EmployeeId,
        patch: Fields,
    ) -> StoreResult<Option<EmployeeRecord>>;

    /// Removes a record, returning whether it existed.
    async fn delete_by_id(&self, id: &EmployeeId) -> StoreResult<bool>;
}

/// Process-local store keeping records in insertion order.
///
/// # Example
///
/// ```rust
/// use roster_store::{EmployeeStore, InMemoryEmployeeStore};
/// use roster_core::{Fields, Filter};
///
/// # tokio_test::block_on(async {
/// let store = InMemoryEmployeeStore::new();
/// let mut fields = Fields::new();
/// fields.insert("department", "eng");
///
/// let created = store.insert(fields).await.unwrap();
/// let found = store.find(&Filter::all().department("eng")).await.unwrap();
/// assert_eq!(found, vec![created]);
/// # });
/// ```
#[derive(Debug, Default)]
pub struct InMemoryEmployeeStore {
    records: RwLock<IndexMap<EmployeeId, Fields>>,
}

impl InMemoryEmployeeStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns `true` when the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl EmployeeStore for InMemoryEmployeeStore {
    async fn find(&self, filter: &Filter) -> StoreResult<Vec<EmployeeRecord>> {
        let records = self.records.read();
        Ok(records
            .iter()
            .map(|(id, fields)| EmployeeRecord::new(*id, fields.clone()))
            .filter(|record| filter.matches(record))
            .collect())
    }

    async fn find_by_id(&self, id: &EmployeeId) -> StoreResult<Option<EmployeeRecord>> {
        Ok(self
            .records
            .read()
            .get(id)
            .map(|fields| EmployeeRecord::new(*id, fields.clone())))
    }

    async fn insert(&self, fields: Fields) -> StoreResult<EmployeeRecord> {
        let id = EmployeeId::generate();
        self.records.write().insert(id, fields.clone());
        Ok(EmployeeRecord::new(id, fields))
    }

    async fn update_by_id(
        &self,
        id: &EmployeeId,
        patch: Fields,
    ) -> StoreResult<Option<EmployeeRecord>> {
        let mut records = self.records.write();
        let Some(fields) = records.get_mut(id) else {
            return Ok(None);
        };
        fields.merge(patch);
        Ok(Some(EmployeeRecord::new(*id, fields.clone())))
    }

    async fn delete_by_id(&self, id: &EmployeeId) -> StoreResult<bool> {
        Ok(self.records.write().shift_remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn fields(pairs: &[(&str, serde_json::Value)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_find_keeps_insertion_order() {
        let store = InMemoryEmployeeStore::new();
        let a = store.insert(fields(&[("name", json!("a"))])).await.unwrap();
        let b = store.insert(fields(&[("name", json!("b"))])).await.unwrap();
        let c = store.insert(fields(&[("name", json!("c"))])).await.unwrap();

        store.delete_by_id(&b.id).await.unwrap();
        let all = store.find(&Filter::all()).await.unwrap();
        assert_eq!(all, vec![a, c]);
    }

    #[tokio::test]
    async fn test_find_filters_exactly() {
        let store = InMemoryEmployeeStore::new();
        store
            .insert(fields(&[("department", json!("eng")), ("position", json!("lead"))]))
            .await
            .unwrap();
        store
            .insert(fields(&[("department", json!("engineering"))]))
            .await
            .unwrap();

        let eng = store.find(&Filter::all().department("eng")).await.unwrap();
        assert_eq!(eng.len(), 1);

        let none = store
            .find(&Filter::all().department("eng").position("junior"))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_update_merges_and_never_inserts() {
        let store = InMemoryEmployeeStore::new();
        let created = store
            .insert(fields(&[("department", json!("eng")), ("profileImage", json!("1-a.png"))]))
            .await
            .unwrap();

        let updated = store
            .update_by_id(&created.id, fields(&[("position", json!("lead"))]))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.fields.get("department"), Some(&json!("eng")));
        assert_eq!(updated.fields.get("position"), Some(&json!("lead")));
        assert_eq!(updated.fields.profile_image(), Some("1-a.png"));

        let missing = EmployeeId::generate();
        assert!(store
            .update_by_id(&missing, fields(&[("x", json!(1))]))
            .await
            .unwrap()
            .is_none());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_reports_existence() {
        let store = InMemoryEmployeeStore::new();
        let created = store.insert(Fields::new()).await.unwrap();
        assert!(store.delete_by_id(&created.id).await.unwrap());
        assert!(!store.delete_by_id(&created.id).await.unwrap());
        assert!(store.find_by_id(&created.id).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts_get_distinct_ids() {
        let store = Arc::new(InMemoryEmployeeStore::new());
        let mut handles = Vec::new();
        for i in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.insert(fields(&[("n", json!(i))])).await.unwrap()
            }));
        }

        let mut ids = std::collections::HashSet::new();
        for handle in handles {
            let record = handle.await.unwrap();
            let n = record.fields.get("n").cloned().unwrap();
            let stored = store.find_by_id(&record.id).await.unwrap().unwrap();
            assert_eq!(stored.fields.get("n"), Some(&n));
            assert!(ids.insert(record.id));
        }
        assert_eq!(store.len(), 32);
    }
}

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::store::{matches_all, CapacityGuard, Document, DocumentStore, Filter, StoreError};

type Collection = BTreeMap<String, Document>;

/// Process-local store. Guarded writes hold the write lock across the count and
/// the mutation, so they are serializable.
#[derive(Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn new_id() -> String {
        Uuid::new_v4().simple().to_string()
    }

    fn count_matching(collection: Option<&Collection>, guard: &CapacityGuard, skip_id: Option<&str>) -> usize {
        collection
            .map(|docs| {
                docs.iter()
                    .filter(|(id, _)| Some(id.as_str()) != skip_id)
                    .filter(|(_, doc)| matches_all(&guard.filters, doc))
                    .count()
            })
            .unwrap_or(0)
    }

    fn check_guards(collection: Option<&Collection>, guards: &[CapacityGuard], skip_id: Option<&str>) -> Result<(), StoreError> {
        match guards
            .iter()
            .find(|guard| Self::count_matching(collection, guard, skip_id) >= guard.limit)
        {
            Some(full) => Err(full.exceeded()),
            None => Ok(()),
        }
    }

    fn insert(collections: &mut HashMap<String, Collection>, collection: &str, mut fields: Document) -> String {
        let id = Self::new_id();
        fields.insert("id".to_string(), Value::String(id.clone()));
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);
        id
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn find(&self, collection: &str, filters: &[Filter]) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let docs = collections
            .get(collection)
            .map(|docs| {
                docs.values()
                    .filter(|doc| matches_all(filters, doc))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(docs)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|docs| docs.get(id)).cloned())
    }

    async fn create(&self, collection: &str, fields: Document) -> Result<String, StoreError> {
        let mut collections = self.collections.write().await;
        let id = Self::insert(&mut collections, collection, fields);
        debug!("Created {}/{}", collection, id);
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, partial: Document) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

        for (key, value) in partial {
            if key != "id" {
                doc.insert(key, value);
            }
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })
    }

    async fn create_guarded(
        &self,
        collection: &str,
        fields: Document,
        guards: &[CapacityGuard],
    ) -> Result<String, StoreError> {
        let mut collections = self.collections.write().await;
        Self::check_guards(collections.get(collection), guards, None)?;
        Ok(Self::insert(&mut collections, collection, fields))
    }

    async fn update_guarded(
        &self,
        collection: &str,
        id: &str,
        expected: &[Filter],
        partial: Document,
        guards: &[CapacityGuard],
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;

        let current = collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

        if !matches_all(expected, current) {
            return Err(StoreError::PreconditionFailed { id: id.to_string() });
        }

        Self::check_guards(collections.get(collection), guards, Some(id))?;

        if let Some(doc) = collections.get_mut(collection).and_then(|docs| docs.get_mut(id)) {
            for (key, value) in partial {
                if key != "id" {
                    doc.insert(key, value);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn create_assigns_id_and_find_filters() {
        let store = InMemoryStore::new();
        let a = store.create("holidays", doc(json!({"date": "2025-12-25"}))).await.unwrap();
        store.create("holidays", doc(json!({"date": "2025-12-30"}))).await.unwrap();

        let found = store
            .find("holidays", &[Filter::eq("date", "2025-12-25")])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["id"], json!(a));
    }

    #[tokio::test]
    async fn update_merges_and_keeps_id() {
        let store = InMemoryStore::new();
        let id = store.create("offices", doc(json!({"phone": "1"}))).await.unwrap();
        store
            .update("offices", &id, doc(json!({"phone": "2", "id": "hijack"})))
            .await
            .unwrap();

        let stored = store.get("offices", &id).await.unwrap().unwrap();
        assert_eq!(stored["phone"], json!("2"));
        assert_eq!(stored["id"], json!(id));
    }

    #[tokio::test]
    async fn missing_documents_report_not_found() {
        let store = InMemoryStore::new();
        assert_matches!(
            store.update("offices", "nope", Document::new()).await,
            Err(StoreError::NotFound { .. })
        );
        assert_matches!(store.delete("offices", "nope").await, Err(StoreError::NotFound { .. }));
        assert!(store.get("offices", "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn guarded_update_checks_expected_state() {
        let store = InMemoryStore::new();
        let id = store.create("items", doc(json!({"status": "pending"}))).await.unwrap();

        store
            .update_guarded("items", &id, &[Filter::eq("status", "pending")],
                doc(json!({"status": "approved"})), &[])
            .await
            .unwrap();

        let second = store
            .update_guarded("items", &id, &[Filter::eq("status", "pending")],
                doc(json!({"status": "approved"})), &[])
            .await;
        assert_matches!(second, Err(StoreError::PreconditionFailed { .. }));
    }

    #[tokio::test]
    async fn concurrent_guarded_creates_respect_limit() {
        let store = Arc::new(InMemoryStore::new());
        let guard = CapacityGuard::new("slot", vec![Filter::eq("slot", "a")], 4);

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            let guard = guard.clone();
            handles.push(tokio::spawn(async move {
                store.create_guarded("items", doc(json!({"slot": "a"})), &[guard]).await
            }));
        }

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                created += 1;
            }
        }

        assert_eq!(created, 4);
        assert_eq!(store.find("items", &[]).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn first_full_guard_is_reported() {
        let store = InMemoryStore::new();
        store
            .create("items", doc(json!({"slot": "a", "owner": "x", "status": "approved"})))
            .await
            .unwrap();
        let pending = store
            .create("items", doc(json!({"slot": "b", "owner": "x", "status": "pending"})))
            .await
            .unwrap();

        let guards = [
            CapacityGuard::new("slot", vec![Filter::eq("slot", "b"), Filter::eq("status", "approved")], 4),
            CapacityGuard::new("owner", vec![Filter::eq("owner", "x"), Filter::eq("status", "approved")], 1),
        ];
        let result = store
            .update_guarded("items", &pending, &[Filter::eq("status", "pending")],
                doc(json!({"status": "approved"})), &guards)
            .await;
        assert_matches!(result, Err(StoreError::CapacityExceeded { guard, limit: 1 }) if guard == "owner");

        let created = store
            .create_guarded("items", doc(json!({"slot": "c", "owner": "x", "status": "approved"})), &guards[1..])
            .await;
        assert_matches!(created, Err(StoreError::CapacityExceeded { guard, .. }) if guard == "owner");
    }
}

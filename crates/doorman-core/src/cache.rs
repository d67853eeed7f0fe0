//! Per-entity selection cache.
//!
//! Selecting a row in a list view stores the full record so the detail view
//! can open without another round trip. One slot per entity type, last writer
//! wins. A slot that is missing, unreadable or holds a different record is
//! treated as a miss; it never blocks the detail view.

use std::sync::Arc;

use tracing::warn;

use crate::entity::Entity;
use crate::error::Result;
use crate::store::KeyValueStore;

/// Typed single-slot cache per entity type, backed by the session store.
#[derive(Clone)]
pub struct SelectionCache {
    store: Arc<dyn KeyValueStore>,
}

impl SelectionCache {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Store `record` in its entity's slot, replacing whatever was there.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be serialized or the store
    /// write fails.
    pub async fn remember<E: Entity>(&self, record: &E) -> Result<()> {
        let raw = serde_json::to_string(record)?;
        self.store.put(E::KIND.cache_slot(), &raw).await
    }

    /// The record in `E`'s slot, if any.
    pub async fn recall<E: Entity>(&self) -> Option<E> {
        let slot = E::KIND.cache_slot();
        let raw = match self.store.get(slot).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(slot, error = %e, "selection cache unreadable");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(slot, error = %e, "discarding malformed cached selection");
                None
            }
        }
    }

    /// The cached record only if its identifier equals `key`.
    pub async fn recall_matching<E: Entity>(&self, key: &str) -> Option<E> {
        self.recall::<E>().await.filter(|r| r.identifier() == key)
    }

    /// Empty `E`'s slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub async fn forget<E: Entity>(&self) -> Result<()> {
        self.store.remove(E::KIND.cache_slot()).await
    }
}

impl std::fmt::Debug for SelectionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionCache").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::{Group, Role};
    use crate::store::MemoryStore;

    fn group(name: &str) -> Group {
        Group {
            group_name: name.into(),
            ..Group::default()
        }
    }

    #[tokio::test]
    async fn last_writer_wins() {
        let cache = SelectionCache::new(Arc::new(MemoryStore::new()));
        cache.remember(&group("ops")).await.unwrap();
        cache.remember(&group("billing")).await.unwrap();
        assert_eq!(cache.recall::<Group>().await, Some(group("billing")));
    }

    #[tokio::test]
    async fn slots_are_per_entity_type() {
        let cache = SelectionCache::new(Arc::new(MemoryStore::new()));
        cache.remember(&group("ops")).await.unwrap();
        assert_eq!(cache.recall::<Role>().await, None);
    }

    #[tokio::test]
    async fn mismatched_identifier_is_a_miss() {
        let cache = SelectionCache::new(Arc::new(MemoryStore::new()));
        cache.remember(&group("ops")).await.unwrap();
        assert!(cache.recall_matching::<Group>("ops").await.is_some());
        assert!(cache.recall_matching::<Group>("billing").await.is_none());
    }

    #[tokio::test]
    async fn malformed_slot_is_a_miss() {
        let store = Arc::new(MemoryStore::new());
        store.put("selectedGroup", "{not json").await.unwrap();
        let cache = SelectionCache::new(store);
        assert_eq!(cache.recall::<Group>().await, None);
    }

    #[tokio::test]
    async fn forget_empties_the_slot() {
        let cache = SelectionCache::new(Arc::new(MemoryStore::new()));
        cache.remember(&group("ops")).await.unwrap();
        cache.forget::<Group>().await.unwrap();
        assert_eq!(cache.recall::<Group>().await, None);
    }
}

use uuid::Uuid;

use crate::error::Result;
use crate::models::user::Slot;
use crate::store::UserStore;

/// One dean's offering in the aggregated catalog.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    /// Record ID of the dean, used by the booking engine to re-fetch
    /// the live record. Not exposed over HTTP.
    pub dean_id: Uuid,
    /// The dean's display name, the key clients book against.
    pub dean_name: String,
    /// The dean's available slots, flat and in pool order.
    pub slots: Vec<Slot>,
}

/// Aggregates every dean's available slots into one dean-labeled view.
///
/// Entries appear in dean-record order. Read-only: the returned snapshot
/// is detached from storage and must never be written back. An empty
/// store yields an empty catalog, not an error.
pub async fn list_available_slots(store: &dyn UserStore) -> Result<Vec<CatalogEntry>> {
    let deans = store.list_deans().await?;
    Ok(deans
        .into_iter()
        .map(|dean| CatalogEntry {
            dean_id: dean.id,
            dean_name: dean.name,
            slots: dean.available_slots,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Dean;
    use crate::store::memory::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn empty_store_yields_empty_catalog() {
        let store = MemoryStore::new();
        assert!(list_available_slots(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn one_entry_per_dean_in_record_order() {
        let store = MemoryStore::new();
        let alice = Dean::new(
            "Alice".into(),
            "D-1".into(),
            "hash".into(),
            Slot::intake_all(vec![json!([9, 0]), json!([10, 0])]),
        );
        let bob = Dean::new("Bob".into(), "D-2".into(), "hash".into(), Vec::new());
        store.insert_dean(&alice).await.unwrap();
        store.insert_dean(&bob).await.unwrap();

        let catalog = list_available_slots(&store).await.unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog[0].dean_name, "Alice");
        assert_eq!(catalog[0].slots.len(), 2);
        assert_eq!(catalog[0].slots[0].detail, json!([9, 0]));
        assert_eq!(catalog[1].dean_name, "Bob");
        assert!(catalog[1].slots.is_empty());
    }

    #[tokio::test]
    async fn grouped_intake_is_served_flat() {
        let store = MemoryStore::new();
        let dean = Dean::new(
            "Alice".into(),
            "D-1".into(),
            "hash".into(),
            Slot::intake_all(vec![json!([[9, 0], [10, 0]])]),
        );
        store.insert_dean(&dean).await.unwrap();

        let catalog = list_available_slots(&store).await.unwrap();
        let details: Vec<_> = catalog[0].slots.iter().map(|s| s.detail.clone()).collect();
        assert_eq!(details, vec![json!([9, 0]), json!([10, 0])]);
    }
}

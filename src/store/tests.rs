//! Store Module Tests
//!
//! Validates upsert semantics, key validation and write isolation of the in-memory table.

#[cfg(test)]
mod tests {
    use crate::error::StoreError;
    use crate::store::memory::{InMemoryStore, RecordStore};
    use crate::store::types::{Attributes, BillingMode, Record, TableSchema, WriteOutcome};
    use serde_json::json;
    use std::sync::Arc;

    fn store() -> InMemoryStore {
        InMemoryStore::new(TableSchema::new("acn_db_user", "userid"))
    }

    fn attrs(value: serde_json::Value) -> Attributes {
        value.as_object().cloned().unwrap()
    }

    // ============================================================
    // SCHEMA
    // ============================================================

    #[test]
    fn test_schema_is_on_demand_with_single_key() {
        let store = store();
        let schema = store.schema();

        assert_eq!(schema.table_name, "acn_db_user");
        assert_eq!(schema.partition_key, "userid");
        assert_eq!(schema.billing_mode, BillingMode::PayPerRequest);
        assert_eq!(
            serde_json::to_value(schema.billing_mode).unwrap(),
            json!("PAY_PER_REQUEST")
        );
    }

    // ============================================================
    // UPSERT
    // ============================================================

    #[tokio::test]
    async fn test_update_creates_missing_record() {
        let store = store();

        let outcome = store
            .update("abc123", attrs(json!({"Version": "v1", "response": {"q1": "value2"}})))
            .await
            .unwrap();

        assert_eq!(outcome, WriteOutcome::Created);
        let record = store.get("abc123").await.unwrap().unwrap();
        assert_eq!(record.attributes["Version"], "v1");
        assert_eq!(record.attributes["response"]["q1"], "value2");
    }

    #[tokio::test]
    async fn test_update_overwrites_named_attributes_and_keeps_others() {
        let store = store();
        store
            .put(Record::new(
                "abc123",
                attrs(json!({"Version": "v1", "response": {"q1": "value1"}, "region": "apse2"})),
            ))
            .await
            .unwrap();

        let outcome = store
            .update("abc123", attrs(json!({"Version": "v2", "response": {"q3": "value3"}})))
            .await
            .unwrap();

        assert_eq!(outcome, WriteOutcome::Updated);
        let record = store.get("abc123").await.unwrap().unwrap();
        assert_eq!(record.attributes["Version"], "v2");
        assert_eq!(record.attributes["response"], json!({"q3": "value3"}));
        assert_eq!(record.attributes["region"], "apse2");
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_empty_key_is_rejected() {
        let store = store();

        let result = store.update("", attrs(json!({"Version": "v1"}))).await;
        assert!(matches!(result, Err(StoreError::InvalidKey(ref k)) if k == "userid"));

        let result = store.put(Record::new("", Attributes::new())).await;
        assert!(result.is_err());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_get_missing_and_delete() {
        let store = store();
        assert!(store.get("nobody").await.unwrap().is_none());

        store.update("someone", Attributes::new()).await.unwrap();
        let removed = store.delete("someone").await.unwrap();
        assert_eq!(removed.unwrap().key, "someone");
        assert!(store.get("someone").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_to_item_includes_partition_key() {
        let record = Record::new("abc123", attrs(json!({"Version": "v1"})));
        let item = record.to_item("userid");

        assert_eq!(item["userid"], "abc123");
        assert_eq!(item["Version"], "v1");
    }

    #[tokio::test]
    async fn test_scan_respects_limit() {
        let store = store();
        for i in 0..20 {
            store
                .update(&format!("user{:02}", i), attrs(json!({"n": i})))
                .await
                .unwrap();
        }

        assert_eq!(store.scan(5).await.unwrap().len(), 5);
        assert_eq!(store.scan(100).await.unwrap().len(), 20);
    }

    // ============================================================
    // ISOLATION
    // ============================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_do_not_corrupt_unrelated_records() {
        let store = Arc::new(store());
        let mut handles = Vec::new();

        for writer in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                for round in 0..50 {
                    let key = format!("writer-{}", writer);
                    store
                        .update(&key, attrs(json!({"writer": writer, "round": round})))
                        .await
                        .unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.count().await.unwrap(), 8);
        for writer in 0..8 {
            let record = store.get(&format!("writer-{}", writer)).await.unwrap().unwrap();
            assert_eq!(record.attributes["writer"], writer);
            assert_eq!(record.attributes["round"], 49);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_to_one_key_keep_every_attribute() {
        let store = Arc::new(store());
        let mut handles = Vec::new();

        for writer in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let mut attributes = Attributes::new();
                attributes.insert(format!("field{}", writer), json!(writer));
                store.update("shared", attributes).await.unwrap()
            }));
        }

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap() == WriteOutcome::Created {
                created += 1;
            }
        }

        assert_eq!(created, 1, "exactly one writer creates the record");
        let record = store.get("shared").await.unwrap().unwrap();
        assert_eq!(record.attributes.len(), 16);
    }
}

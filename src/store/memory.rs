use super::types::*;
use crate::error::StoreError;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Key-value table operations the consumer and the inspection endpoints depend on.
#[async_trait]
pub trait RecordStore: Send + Sync {
    fn schema(&self) -> &TableSchema;

    async fn get(&self, key: &str) -> Result<Option<Record>, StoreError>;

    /// Replaces the whole record.
    async fn put(&self, record: Record) -> Result<(), StoreError>;

    /// SET-style upsert: overwrites the given attributes, keeps the others, and creates
    /// the record when the key is new.
    async fn update(&self, key: &str, attributes: Attributes) -> Result<WriteOutcome, StoreError>;

    async fn delete(&self, key: &str) -> Result<Option<Record>, StoreError>;

    /// Returns up to `limit` records in unspecified order.
    async fn scan(&self, limit: usize) -> Result<Vec<Record>, StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;
}

pub struct InMemoryStore {
    schema: TableSchema,
    records: DashMap<String, Record>,
}

impl InMemoryStore {
    pub fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            records: DashMap::new(),
        }
    }

    fn check_key(&self, key: &str) -> Result<(), StoreError> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey(self.schema.partition_key.clone()));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    fn schema(&self) -> &TableSchema {
        &self.schema
    }

    async fn get(&self, key: &str) -> Result<Option<Record>, StoreError> {
        Ok(self.records.get(key).map(|record| record.value().clone()))
    }

    async fn put(&self, record: Record) -> Result<(), StoreError> {
        self.check_key(&record.key)?;
        tracing::debug!("PUT {} = {}", self.schema.partition_key, record.key);
        self.records.insert(record.key.clone(), record);
        Ok(())
    }

    async fn update(&self, key: &str, attributes: Attributes) -> Result<WriteOutcome, StoreError> {
        self.check_key(key)?;

        // The entry guard holds the shard lock, so concurrent writers to one key serialize.
        let outcome = match self.records.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let record = occupied.get_mut();
                for (name, value) in attributes {
                    record.attributes.insert(name, value);
                }
                WriteOutcome::Updated
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Record::new(key, attributes));
                WriteOutcome::Created
            }
        };

        tracing::debug!(
            "UPDATE {} = {} -> {:?}",
            self.schema.partition_key,
            key,
            outcome
        );

        Ok(outcome)
    }

    async fn delete(&self, key: &str) -> Result<Option<Record>, StoreError> {
        Ok(self.records.remove(key).map(|(_, record)| record))
    }

    async fn scan(&self, limit: usize) -> Result<Vec<Record>, StoreError> {
        Ok(self
            .records
            .iter()
            .take(limit)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.records.len())
    }
}

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Attribute map of a record, excluding its partition key.
pub type Attributes = Map<String, Value>;

/// A persisted entity, uniquely identified by its partition key value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub key: String,
    pub attributes: Attributes,
}

impl Record {
    pub fn new(key: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            key: key.into(),
            attributes,
        }
    }

    /// Flattens the record into a single item map, with the key stored under
    /// the table's partition key name.
    pub fn to_item(&self, partition_key: &str) -> Attributes {
        let mut item = self.attributes.clone();
        item.insert(partition_key.to_string(), Value::String(self.key.clone()));
        item
    }
}

/// Whether an upsert created the record or modified an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WriteOutcome {
    Created,
    Updated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingMode {
    PayPerRequest,
}

/// Declared shape of the table: one string partition key, no sort key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub table_name: String,
    pub partition_key: String,
    pub billing_mode: BillingMode,
}

impl TableSchema {
    pub fn new(table_name: impl Into<String>, partition_key: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            partition_key: partition_key.into(),
            billing_mode: BillingMode::PayPerRequest,
        }
    }
}

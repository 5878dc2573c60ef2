//! Named analytics query definitions.
//!
//! Two statements are registered against the external query service: one creating the
//! log database, one creating an external JSON table over the exported logs. They are
//! declarations only; nothing in this service executes them.

use serde::Serialize;

pub const CREATE_DATABASE: &str = "CreateDatabase";
pub const CREATE_EXTERNAL_TABLE: &str = "CreateExternalTable";

/// Database the definitions are registered against when none is implied.
pub const DEFAULT_DATABASE: &str = "default";

/// Columns of the exported log records.
pub const LOG_SCHEMA: &[(&str, &str)] = &[("timestamp", "string"), ("message", "string")];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedQuery {
    pub name: String,
    pub database: String,
    pub query_string: String,
}

/// Where the exported logs live and what to call them.
#[derive(Debug, Clone)]
pub struct AnalyticsSettings {
    pub database: String,
    pub table: String,
    pub location: String,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            database: "cdk_cloudwatch_logs".to_string(),
            table: "your_table_name".to_string(),
            location: "s3://cdk-athena-cw-logs-1709/path/".to_string(),
        }
    }
}

/// The registered query definitions, in registration order.
#[derive(Debug, Clone)]
pub struct QueryCatalog {
    queries: Vec<NamedQuery>,
}

impl QueryCatalog {
    pub fn new(settings: &AnalyticsSettings) -> Self {
        Self {
            queries: vec![create_database(settings), create_external_table(settings)],
        }
    }

    pub fn list(&self) -> &[NamedQuery] {
        &self.queries
    }

    pub fn get(&self, name: &str) -> Option<&NamedQuery> {
        self.queries.iter().find(|query| query.name == name)
    }
}

fn create_database(settings: &AnalyticsSettings) -> NamedQuery {
    NamedQuery {
        name: CREATE_DATABASE.to_string(),
        database: DEFAULT_DATABASE.to_string(),
        query_string: format!("CREATE DATABASE IF NOT EXISTS {};", settings.database),
    }
}

fn create_external_table(settings: &AnalyticsSettings) -> NamedQuery {
    let columns = LOG_SCHEMA
        .iter()
        .map(|(name, kind)| format!("  {} {}", name, kind))
        .collect::<Vec<_>>()
        .join(",\n");

    NamedQuery {
        name: CREATE_EXTERNAL_TABLE.to_string(),
        database: settings.database.clone(),
        query_string: format!(
            "CREATE EXTERNAL TABLE IF NOT EXISTS {}.{} (\n{}\n)\n\
             ROW FORMAT SERDE 'org.openx.data.jsonserde.JsonSerDe'\n\
             LOCATION '{}';",
            settings.database, settings.table, columns, settings.location
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_holds_both_definitions_in_order() {
        let catalog = QueryCatalog::new(&AnalyticsSettings::default());
        let names: Vec<&str> = catalog.list().iter().map(|q| q.name.as_str()).collect();

        assert_eq!(names, vec![CREATE_DATABASE, CREATE_EXTERNAL_TABLE]);
    }

    #[test]
    fn test_create_database_targets_default_database() {
        let catalog = QueryCatalog::new(&AnalyticsSettings::default());
        let query = catalog.get(CREATE_DATABASE).unwrap();

        assert_eq!(query.database, "default");
        assert_eq!(
            query.query_string,
            "CREATE DATABASE IF NOT EXISTS cdk_cloudwatch_logs;"
        );
    }

    #[test]
    fn test_external_table_uses_settings() {
        let settings = AnalyticsSettings {
            database: "logs".to_string(),
            table: "relay_events".to_string(),
            location: "s3://bucket/relay/".to_string(),
        };
        let catalog = QueryCatalog::new(&settings);
        let query = catalog.get(CREATE_EXTERNAL_TABLE).unwrap();

        assert_eq!(query.database, "logs");
        assert!(query.query_string.starts_with("CREATE EXTERNAL TABLE IF NOT EXISTS logs.relay_events ("));
        assert!(query.query_string.contains("  timestamp string,\n  message string\n)"));
        assert!(query.query_string.contains("org.openx.data.jsonserde.JsonSerDe"));
        assert!(query.query_string.ends_with("LOCATION 's3://bucket/relay/';"));
    }

    #[test]
    fn test_unknown_query_is_none() {
        let catalog = QueryCatalog::new(&AnalyticsSettings::default());
        assert!(catalog.get("DropEverything").is_none());
    }
}

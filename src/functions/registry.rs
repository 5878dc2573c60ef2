//! Function Registry
//!
//! Maps function names (e.g., "random_reporting") to async closures taking a JSON event.
//! Each function carries its own invocation deadline, enforced on every call.

use super::types::FunctionInfo;
use crate::error::InvokeError;

use anyhow::Result;
use dashmap::DashMap;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// Type alias for a thread-safe, asynchronous function body.
/// It takes the JSON event and resolves to the JSON result.
pub type FunctionFn =
    Arc<dyn Fn(Value) -> Pin<Box<dyn Future<Output = Result<Value>> + Send>> + Send + Sync>;

struct RegisteredFunction {
    handler: FunctionFn,
    timeout: Duration,
}

/// Registry holding the mapping between function names and their implementation.
pub struct FunctionRegistry {
    functions: DashMap<String, RegisteredFunction>,
}

impl FunctionRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers `handler` under `name`, replacing any previous registration.
    pub fn register<F, Fut>(&self, name: &str, timeout: Duration, handler: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        // Type-erase the concrete future so different functions share one map.
        let handler: FunctionFn = Arc::new(move |event: Value| {
            Box::pin(handler(event)) as Pin<Box<dyn Future<Output = Result<Value>> + Send>>
        });

        self.functions
            .insert(name.to_string(), RegisteredFunction { handler, timeout });

        tracing::info!("Registered function: {} (timeout {:?})", name, timeout);
    }

    /// Invokes a function by name, bounded by its deadline.
    pub async fn invoke(&self, name: &str, event: Value) -> Result<Value, InvokeError> {
        // Clone out of the map so no shard lock is held across the await.
        let (handler, timeout) = match self.functions.get(name) {
            Some(function) => (function.handler.clone(), function.timeout),
            None => {
                tracing::error!("Unknown function: {}", name);
                return Err(InvokeError::UnknownFunction(name.to_string()));
            }
        };

        tracing::debug!(
            "Invoking {} (event size: {} bytes)",
            name,
            event.to_string().len()
        );

        match tokio::time::timeout(timeout, handler(event)).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(source)) => Err(InvokeError::Failed {
                name: name.to_string(),
                source,
            }),
            Err(_) => {
                tracing::warn!("Function {} exceeded its {:?} deadline", name, timeout);
                Err(InvokeError::Timeout {
                    name: name.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }
    }

    pub fn list_functions(&self) -> Vec<FunctionInfo> {
        let mut functions: Vec<FunctionInfo> = self
            .functions
            .iter()
            .map(|entry| FunctionInfo {
                name: entry.key().clone(),
                timeout_ms: entry.value().timeout.as_millis() as u64,
            })
            .collect();
        functions.sort_by(|a, b| a.name.cmp(&b.name));
        functions
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self {
            functions: DashMap::new(),
        }
    }
}

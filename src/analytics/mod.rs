//! Analytics Query Definitions
//!
//! Declarative named queries over the exported service logs. They are listed for
//! inspection and never executed by this service.

pub mod handlers;
pub mod queries;

//! Built-in statement renderers

pub mod postgres;

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::schema::adapter::StatementRenderer;

pub use postgres::PostgresRenderer;

/// Look up a renderer by dialect name
pub fn renderer_for(dialect: &str) -> Result<Arc<dyn StatementRenderer>> {
    match dialect.to_lowercase().as_str() {
        "postgres" | "postgresql" | "edb" => Ok(Arc::new(PostgresRenderer::new())),
        other => Err(Error::ConfigError(format!("Unsupported SQL dialect: {}", other))),
    }
}

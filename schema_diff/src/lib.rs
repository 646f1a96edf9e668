//! SchemaDiff: compares two snapshots of a database schema and generates the
//! DDL that turns the target into the source
//!
//! Snapshots come from an [`snapshot::ObjectSnapshotProvider`]; statements are
//! synthesized by a [`schema::StatementRenderer`], PostgreSQL by default.

pub mod config;
pub mod error;
pub mod render;
pub mod schema;
pub mod snapshot;
pub mod utils;

#[cfg(test)]
mod test;

use std::path::Path;

// Re-export main types for easier access
pub use config::Config;
pub use error::{Error, Result};
pub use schema::{
    ComparisonStatus, DdlComparison, SchemaComparer, SchemaComparison, ScriptOptions,
    ScriptReport,
};
pub use snapshot::{FileSnapshotProvider, SchemaSnapshot};

/// Initialize SchemaDiff with the specified configuration file
pub fn init(config_path: &str) -> Result<SchemaDiffClient> {
    let config = config::load_from_file(config_path)?;
    SchemaDiffClient::new(config)
}

/// The main client: a configured comparer plus script options
pub struct SchemaDiffClient {
    config: Config,
    comparer: SchemaComparer,
}

impl SchemaDiffClient {
    /// Create a new SchemaDiff client from configuration
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let renderer = render::renderer_for(&config.output.dialect)?;
        let comparer = SchemaComparer::new(config.compare.clone(), renderer);
        Ok(Self { config, comparer })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn comparer(&self) -> &SchemaComparer {
        &self.comparer
    }

    /// Load two snapshot files and compare them
    pub fn compare_files(
        &self,
        source: impl AsRef<Path>,
        target: impl AsRef<Path>,
    ) -> Result<SchemaComparison> {
        // The source is loaded completely before the target is read
        let source = FileSnapshotProvider::open(source)?.load()?;
        let target = FileSnapshotProvider::open(target)?.load()?;
        self.comparer.compare(source, target)
    }

    /// Script for every non-identical table, stamped with the current time
    pub fn generate_script(&self, comparison: &SchemaComparison) -> ScriptReport {
        let mut options = ScriptOptions::from(&self.config.output);
        options.generated_at = Some(chrono::Utc::now());
        self.comparer.generate_script(comparison, &options)
    }

    /// Source, target and delta DDL for one table
    pub fn ddl_compare(&self, comparison: &SchemaComparison, table: &str) -> Result<DdlComparison> {
        let status = comparison.status_of(table).ok_or_else(|| {
            Error::Precondition(format!("table '{}' is in neither snapshot", table))
        })?;
        self.comparer.ddl_compare(comparison, table, status)
    }
}

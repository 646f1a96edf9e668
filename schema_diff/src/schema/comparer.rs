//! Schema comparison entry point
//!
//! [`SchemaComparer`] classifies every table of two snapshots and produces
//! the DDL delta for one table or for the whole schema.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{CompareConfig, OutputConfig};
use crate::error::{Error, Result};
use crate::render::PostgresRenderer;
use crate::schema::adapter::{retarget, AdapterRegistry, StatementRenderer};
use crate::schema::collection::NamedCollectionDiffer;
use crate::schema::policy::PolicySet;
use crate::schema::table::{SchemaPair, TableDiffOrchestrator};
use crate::schema::types::{
    ComparisonEntry, ComparisonStatus, DdlFragment, KeySet, ObjectKind, PropertyBag,
};
use crate::snapshot::{Capabilities, SchemaSnapshot, ServerInfo};

/// Order in which entries are listed
const STATUS_ORDER: [ComparisonStatus; 4] = [
    ComparisonStatus::SourceOnly,
    ComparisonStatus::TargetOnly,
    ComparisonStatus::Different,
    ComparisonStatus::Identical,
];

/// Result of comparing two snapshots; owns both so DDL can be produced later
#[derive(Debug, Clone)]
pub struct SchemaComparison {
    entries: Vec<ComparisonEntry>,
    source: SchemaSnapshot,
    target: SchemaSnapshot,
    capabilities: Capabilities,
}

impl SchemaComparison {
    pub fn entries(&self) -> &[ComparisonEntry] {
        &self.entries
    }

    pub fn source(&self) -> &SchemaSnapshot {
        &self.source
    }

    pub fn target(&self) -> &SchemaSnapshot {
        &self.target
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Entry for the table called `name`
    pub fn entry(&self, name: &str) -> Option<&ComparisonEntry> {
        self.entries.iter().find(|entry| entry.title == name)
    }

    pub fn status_of(&self, name: &str) -> Option<ComparisonStatus> {
        self.entry(name).map(|entry| entry.status)
    }

    /// Number of entries with `status`
    pub fn count(&self, status: ComparisonStatus) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.status == status)
            .count()
    }

    /// Check if every table compared identical
    pub fn is_identical(&self) -> bool {
        self.entries
            .iter()
            .all(|entry| entry.status == ComparisonStatus::Identical)
    }
}

/// Full source creation, full target creation and the delta between them
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DdlComparison {
    pub source_ddl: String,
    pub target_ddl: String,
    pub diff_ddl: String,
}

/// How [`SchemaComparer::generate_script`] assembles its output
#[derive(Debug, Clone)]
pub struct ScriptOptions {
    pub include_header: bool,
    pub wrap_in_transaction: bool,
    /// Stamped into the header when set
    pub generated_at: Option<DateTime<Utc>>,
}

impl Default for ScriptOptions {
    fn default() -> Self {
        Self {
            include_header: true,
            wrap_in_transaction: true,
            generated_at: None,
        }
    }
}

impl From<&OutputConfig> for ScriptOptions {
    fn from(config: &OutputConfig) -> Self {
        Self {
            include_header: config.include_header,
            wrap_in_transaction: config.wrap_in_transaction,
            generated_at: None,
        }
    }
}

/// A table whose delta could not be produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableFailure {
    pub table: String,
    pub status: ComparisonStatus,
    /// Short error kind, see [`Error::kind`]
    pub kind: &'static str,
    pub message: String,
}

/// A migration script plus the tables that could not be scripted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptReport {
    pub script: String,
    /// Tables that contributed statements, in script order
    pub tables: Vec<String>,
    pub failures: Vec<TableFailure>,
}

impl ScriptReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Compares schema snapshots and generates DDL deltas
pub struct SchemaComparer {
    config: CompareConfig,
    policies: PolicySet,
    registry: AdapterRegistry,
}

impl SchemaComparer {
    pub fn new(config: CompareConfig, renderer: Arc<dyn StatementRenderer>) -> Self {
        let policies = PolicySet::from_config(&config);
        Self {
            config,
            policies,
            registry: AdapterRegistry::new(renderer),
        }
    }

    /// Comparer rendering PostgreSQL DDL
    pub fn with_postgres(config: CompareConfig) -> Self {
        Self::new(config, Arc::new(PostgresRenderer::new()))
    }

    pub fn config(&self) -> &CompareConfig {
        &self.config
    }

    pub fn policies(&self) -> &PolicySet {
        &self.policies
    }

    /// Classify every table of `source` and `target`
    pub fn compare(&self, source: SchemaSnapshot, target: SchemaSnapshot) -> Result<SchemaComparison> {
        if self.config.check_compatibility {
            if let (Some(source_server), Some(target_server)) = (source.server(), target.server()) {
                ServerInfo::check_compatibility(source_server, target_server)?;
            }
        }
        let capabilities = Capabilities::between(source.server(), target.server());

        let mut ignore_keys = self.policies.comparison_ignore_keys().clone();
        for kind in ObjectKind::SUBMODULES {
            if !capabilities.supports(kind) {
                ignore_keys.insert(kind.collection_key());
            }
        }
        let statuses = self.classify(&source, &target, &ignore_keys);

        let mut entries = Vec::with_capacity(statuses.len());
        for status in STATUS_ORDER {
            for (name, table_status) in &statuses {
                if *table_status != status {
                    continue;
                }
                entries.push(ComparisonEntry {
                    id: entries.len() + 1,
                    kind: ObjectKind::Table,
                    label: ObjectKind::Table.label().to_string(),
                    title: name.clone(),
                    source_oid: source.table(name).and_then(PropertyBag::oid).cloned(),
                    target_oid: target.table(name).and_then(PropertyBag::oid).cloned(),
                    status,
                });
            }
        }

        let comparison = SchemaComparison {
            entries,
            source,
            target,
            capabilities,
        };
        info!(
            source_schema = comparison.source.schema(),
            target_schema = comparison.target.schema(),
            source_only = comparison.count(ComparisonStatus::SourceOnly),
            target_only = comparison.count(ComparisonStatus::TargetOnly),
            different = comparison.count(ComparisonStatus::Different),
            identical = comparison.count(ComparisonStatus::Identical),
            "schema comparison finished"
        );
        Ok(comparison)
    }

    /// Tables are matched by name like any other named collection
    fn classify(
        &self,
        source: &SchemaSnapshot,
        target: &SchemaSnapshot,
        ignore_keys: &KeySet,
    ) -> Vec<(String, ComparisonStatus)> {
        let source_tables: Vec<PropertyBag> = source
            .tables()
            .iter()
            .map(|table| retarget(table, source.schema(), target.schema()))
            .collect();
        let result = NamedCollectionDiffer::new(ignore_keys)
            .carry(&[])
            .ignore_whitespace(self.policies.ignore_whitespace())
            .diff(&source_tables, target.tables());

        let named = |tables: &[PropertyBag], status: ComparisonStatus| {
            tables
                .iter()
                .filter_map(PropertyBag::name)
                .map(|name| (name.to_string(), status))
                .collect::<Vec<_>>()
        };
        let mut statuses = named(&result.added, ComparisonStatus::SourceOnly);
        statuses.extend(named(&result.deleted, ComparisonStatus::TargetOnly));
        statuses.extend(named(&result.changed, ComparisonStatus::Different));
        statuses.extend(
            result
                .unchanged
                .into_iter()
                .map(|name| (name, ComparisonStatus::Identical)),
        );
        for (name, status) in &statuses {
            debug!(table = name.as_str(), status = %status, "table classified");
        }
        statuses
    }

    fn orchestrator<'a>(&'a self, comparison: &SchemaComparison) -> TableDiffOrchestrator<'a> {
        TableDiffOrchestrator::new(
            &self.registry,
            &self.policies,
            comparison.capabilities,
            self.config.max_partition_depth,
        )
        .drop_cascade(self.config.drop_cascade)
    }

    /// DDL that brings the target's `name` table in line with the source
    pub fn ddl_for(
        &self,
        comparison: &SchemaComparison,
        name: &str,
        status: ComparisonStatus,
    ) -> Result<DdlFragment> {
        let missing = |side: &str| {
            Error::Precondition(format!(
                "table '{}' is not present in the {} snapshot",
                name, side
            ))
        };
        let orchestrator = self.orchestrator(comparison);
        let schemas = SchemaPair::new(comparison.source.schema(), comparison.target.schema());

        match status {
            ComparisonStatus::Identical => Ok(DdlFragment::new()),
            ComparisonStatus::SourceOnly => {
                let source = comparison.source.table(name).ok_or_else(|| missing("source"))?;
                orchestrator.create_table(source, schemas)
            }
            ComparisonStatus::TargetOnly => {
                let target = comparison.target.table(name).ok_or_else(|| missing("target"))?;
                orchestrator.drop_table(target, schemas.target, self.config.drop_cascade)
            }
            ComparisonStatus::Different => {
                let source = comparison.source.table(name).ok_or_else(|| missing("source"))?;
                let target = comparison.target.table(name).ok_or_else(|| missing("target"))?;
                orchestrator.diff_tables(source, target, schemas, 0)
            }
        }
    }

    /// Source creation, target creation and delta for one table
    pub fn ddl_compare(
        &self,
        comparison: &SchemaComparison,
        name: &str,
        status: ComparisonStatus,
    ) -> Result<DdlComparison> {
        let orchestrator = self.orchestrator(comparison);
        let create = |snapshot: &SchemaSnapshot| -> Result<String> {
            match snapshot.table(name) {
                Some(table) => Ok(orchestrator
                    .create_table(table, SchemaPair::same(snapshot.schema()))?
                    .to_sql()),
                None => Ok(String::new()),
            }
        };

        Ok(DdlComparison {
            source_ddl: create(&comparison.source)?,
            target_ddl: create(&comparison.target)?,
            diff_ddl: self.ddl_for(comparison, name, status)?.to_sql(),
        })
    }

    /// One script with the delta of every non-identical table.
    ///
    /// A table that fails is reported in [`ScriptReport::failures`] and left
    /// out of the script; the other tables are unaffected.
    pub fn generate_script(&self, comparison: &SchemaComparison, options: &ScriptOptions) -> ScriptReport {
        let mut sections = Vec::new();
        let mut tables = Vec::new();
        let mut failures = Vec::new();

        for entry in comparison.entries() {
            if entry.status == ComparisonStatus::Identical {
                continue;
            }
            match self.ddl_for(comparison, &entry.title, entry.status) {
                Ok(fragment) if fragment.is_empty() => {}
                Ok(fragment) => {
                    sections.push(fragment.to_sql());
                    tables.push(entry.title.clone());
                }
                Err(error) => {
                    warn!(table = %entry.title, status = %entry.status, error = %error, "table skipped");
                    failures.push(TableFailure {
                        table: entry.title.clone(),
                        status: entry.status,
                        kind: error.kind(),
                        message: error.to_string(),
                    });
                }
            }
        }

        let mut script = String::new();
        if options.include_header {
            script.push_str(&script_header(comparison, options));
        }
        let body = sections.join("\n\n");
        if options.wrap_in_transaction {
            script.push_str("BEGIN;\n\n");
            if !body.is_empty() {
                script.push_str(&body);
                script.push_str("\n\n");
            }
            script.push_str("END;\n");
        } else if !body.is_empty() {
            script.push_str(&body);
            script.push('\n');
        }

        ScriptReport {
            script,
            tables,
            failures,
        }
    }
}

fn script_header(comparison: &SchemaComparison, options: &ScriptOptions) -> String {
    let mut header = String::new();
    header.push_str("-- Schema delta generated by schema_diff\n");
    header.push_str(&format!(
        "-- Source schema: {}\n-- Target schema: {}\n",
        comparison.source.schema(),
        comparison.target.schema()
    ));
    if let Some(generated_at) = options.generated_at {
        header.push_str(&format!(
            "-- Generated at: {}\n",
            generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    header.push_str("--\n");
    header.push_str("-- WARNING: review this script before running it on the target database.\n");
    header.push_str("-- Statements are ordered per table; cross-table dependencies are not resolved.\n\n");
    header
}

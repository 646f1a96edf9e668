//! Table diff orchestration
//!
//! A matched table pair is processed in a fixed sequence: columns are
//! diffed, then constraints, then the table adapter emits the table-level
//! statements, and finally every sub-object collection is walked in
//! [`ObjectKind::SUBMODULES`] order. Partitions re-enter the orchestrator one
//! level deeper.

use std::fmt;
use tracing::debug;

use crate::error::{Error, Result};
use crate::schema::adapter::{retarget, AdapterRegistry, EmitContext};
use crate::schema::compare::StructuralComparator;
use crate::schema::policy::PolicySet;
use crate::schema::types::{
    ComparisonStatus, ConstraintKind, DdlFragment, ObjectKind, PropertyBag,
};
use crate::snapshot::Capabilities;

/// The schema a table is read from and the schema statements run against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaPair<'a> {
    pub source: &'a str,
    pub target: &'a str,
}

impl<'a> SchemaPair<'a> {
    pub fn new(source: &'a str, target: &'a str) -> Self {
        Self { source, target }
    }

    /// Render within one schema, without any retargeting
    pub fn same(schema: &'a str) -> Self {
        Self {
            source: schema,
            target: schema,
        }
    }
}

/// Progress of one table through [`TableDiffOrchestrator::diff_tables`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableDiffState {
    Start,
    ColumnsDiffed,
    ConstraintsDiffed,
    TableDdlEmitted,
    SubmodulesWalked,
    Done,
}

impl fmt::Display for TableDiffState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TableDiffState::Start => "start",
            TableDiffState::ColumnsDiffed => "columns_diffed",
            TableDiffState::ConstraintsDiffed => "constraints_diffed",
            TableDiffState::TableDdlEmitted => "table_ddl_emitted",
            TableDiffState::SubmodulesWalked => "submodules_walked",
            TableDiffState::Done => "done",
        };
        f.write_str(name)
    }
}

fn advance(table: &str, state: &mut TableDiffState, next: TableDiffState) {
    debug!(table, from = %state, to = %next, "table diff state");
    *state = next;
}

/// Drives the per-kind adapters for one table
pub struct TableDiffOrchestrator<'a> {
    registry: &'a AdapterRegistry,
    policies: &'a PolicySet,
    capabilities: Capabilities,
    max_depth: usize,
    drop_cascade: bool,
}

impl<'a> TableDiffOrchestrator<'a> {
    pub fn new(
        registry: &'a AdapterRegistry,
        policies: &'a PolicySet,
        capabilities: Capabilities,
        max_depth: usize,
    ) -> Self {
        Self {
            registry,
            policies,
            capabilities,
            max_depth,
            drop_cascade: false,
        }
    }

    /// Use `CASCADE` when a table has to be dropped and recreated
    pub fn drop_cascade(mut self, cascade: bool) -> Self {
        self.drop_cascade = cascade;
        self
    }

    pub fn registry(&self) -> &'a AdapterRegistry {
        self.registry
    }

    pub fn policies(&self) -> &'a PolicySet {
        self.policies
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn context<'c>(
        &'c self,
        schemas: SchemaPair<'c>,
        table: Option<&'c str>,
        cascade: bool,
        depth: usize,
    ) -> EmitContext<'c> {
        EmitContext {
            orchestrator: self,
            source_schema: schemas.source,
            target_schema: schemas.target,
            table,
            cascade,
            depth,
        }
    }

    fn check_depth(&self, depth: usize, table: &str) -> Result<()> {
        if depth > self.max_depth {
            return Err(Error::Precondition(format!(
                "partition nesting under '{}' exceeds the maximum depth of {}",
                table, self.max_depth
            )));
        }
        Ok(())
    }

    /// Full creation of a table: the table, its constraints and every sub-object
    pub fn create_table(&self, table: &PropertyBag, schemas: SchemaPair<'_>) -> Result<DdlFragment> {
        self.create_table_at(table, schemas, 0)
    }

    fn create_table_at(
        &self,
        table: &PropertyBag,
        schemas: SchemaPair<'_>,
        depth: usize,
    ) -> Result<DdlFragment> {
        let name = table.require_name("table")?;
        let ctx = self.context(schemas, None, false, depth);
        let mut fragment = self.registry.adapter(ObjectKind::Table).emit(
            ComparisonStatus::SourceOnly,
            Some(table),
            None,
            None,
            &ctx,
        )?;
        fragment.extend(self.create_children(table, schemas, name, depth)?);
        Ok(fragment)
    }

    /// Drop a table that only exists in the target
    pub fn drop_table(&self, table: &PropertyBag, schema: &str, cascade: bool) -> Result<DdlFragment> {
        let ctx = self.context(SchemaPair::same(schema), None, cascade, 0);
        self.registry.adapter(ObjectKind::Table).emit(
            ComparisonStatus::TargetOnly,
            None,
            Some(table),
            None,
            &ctx,
        )
    }

    /// Create every supported sub-object of `table`, in sub-object order
    pub fn create_children(
        &self,
        table: &PropertyBag,
        schemas: SchemaPair<'_>,
        table_name: &str,
        depth: usize,
    ) -> Result<DdlFragment> {
        self.check_depth(depth, table_name)?;
        let ctx = self.context(schemas, Some(table_name), false, depth);
        let mut fragment = DdlFragment::new();

        for kind in ObjectKind::SUBMODULES {
            if !self.capabilities.supports(kind) {
                continue;
            }
            let adapter = self.registry.adapter(kind);
            for item in table.bags(kind.collection_key()) {
                fragment.extend(adapter.emit(
                    ComparisonStatus::SourceOnly,
                    Some(&item),
                    None,
                    None,
                    &ctx,
                )?);
            }
        }
        Ok(fragment)
    }

    /// Statements turning `target` into `source` for a matched table pair.
    ///
    /// `depth` is the partition nesting level, zero for a top-level table.
    pub fn diff_tables(
        &self,
        source: &PropertyBag,
        target: &PropertyBag,
        schemas: SchemaPair<'_>,
        depth: usize,
    ) -> Result<DdlFragment> {
        let name = source.require_name("table")?;
        self.check_depth(depth, name)?;
        let source = &retarget(source, schemas.source, schemas.target);
        let mut state = TableDiffState::Start;
        debug!(table = name, depth, state = %state, "diffing table");

        let table_policy = self.policies.get(ObjectKind::Table);
        let table_comparator = self.policies.comparator(ObjectKind::Table);
        if let Some(key) = table_policy.non_editable_change(source, target, &table_comparator) {
            debug!(table = name, key, "table cannot be altered in place, recreating");
            let mut fragment = self.drop_table(target, schemas.target, self.drop_cascade)?;
            fragment.extend(self.create_table_at(source, schemas, depth)?);
            advance(name, &mut state, TableDiffState::Done);
            return Ok(fragment);
        }

        let column_key = ObjectKind::Column.collection_key();
        let columns = self
            .policies
            .differ(ObjectKind::Column)
            .diff(&source.bags(column_key), &target.bags(column_key));
        advance(name, &mut state, TableDiffState::ColumnsDiffed);

        let mut merged = StructuralComparator::new(
            self.policies.table_level_ignore_keys(),
            self.policies.ignore_whitespace(),
        )
        .diff(source, target);
        if !columns.is_empty() {
            merged.insert(column_key, columns.to_bag());
        }
        for kind in ConstraintKind::ALL {
            let key = kind.collection_key();
            let result = self
                .policies
                .differ(ObjectKind::Constraint(kind))
                .diff(&source.bags(key), &target.bags(key));
            if !result.is_empty() {
                merged.insert(key, result.to_bag());
            }
        }
        advance(name, &mut state, TableDiffState::ConstraintsDiffed);

        let ctx = self.context(schemas, None, false, depth);
        let mut fragment = DdlFragment::new();
        if !merged.is_empty() {
            fragment.extend(self.registry.adapter(ObjectKind::Table).emit(
                ComparisonStatus::Different,
                Some(source),
                Some(target),
                Some(&merged),
                &ctx,
            )?);
        }
        advance(name, &mut state, TableDiffState::TableDdlEmitted);

        let child_ctx = ctx.for_table(name);
        for kind in ObjectKind::SUBMODULES {
            if !self.capabilities.supports(kind) {
                debug!(table = name, kind = %kind, "not supported by both servers, skipped");
                continue;
            }
            fragment.extend(self.walk_submodule(kind, source, target, &child_ctx)?);
        }
        advance(name, &mut state, TableDiffState::SubmodulesWalked);

        advance(name, &mut state, TableDiffState::Done);
        Ok(fragment)
    }

    /// Source-only creates, then target-only drops, then changed pairs
    fn walk_submodule(
        &self,
        kind: ObjectKind,
        source: &PropertyBag,
        target: &PropertyBag,
        ctx: &EmitContext<'_>,
    ) -> Result<DdlFragment> {
        let adapter = self.registry.adapter(kind);
        let key = kind.collection_key();
        let sources = source.bags(key);
        let targets = target.bags(key);
        let comparator = self.policies.comparator(kind);
        let mut fragment = DdlFragment::new();

        for item in &sources {
            let item_name = item.require_name(kind.as_str())?;
            if !targets.iter().any(|other| other.name() == Some(item_name)) {
                fragment.extend(adapter.emit(
                    ComparisonStatus::SourceOnly,
                    Some(item),
                    None,
                    None,
                    ctx,
                )?);
            }
        }

        for item in &targets {
            let item_name = item.require_name(kind.as_str())?;
            if !sources.iter().any(|other| other.name() == Some(item_name)) {
                fragment.extend(adapter.emit(
                    ComparisonStatus::TargetOnly,
                    None,
                    Some(item),
                    None,
                    ctx,
                )?);
            }
        }

        for item in &sources {
            let matched = targets.iter().find(|other| other.name() == item.name());
            let Some(matched) = matched else {
                continue;
            };
            if !comparator.are_identical(item, matched) {
                fragment.extend(adapter.emit(
                    ComparisonStatus::Different,
                    Some(item),
                    Some(matched),
                    None,
                    ctx,
                )?);
            }
        }

        if !fragment.is_empty() {
            debug!(kind = %kind, statements = fragment.len(), "emitted sub-object statements");
        }
        Ok(fragment)
    }
}

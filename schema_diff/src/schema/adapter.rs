//! Per-kind DDL adapters
//!
//! An adapter turns the comparison status of one object into the statements
//! that make the target match the source. Adapters never format SQL
//! themselves; they decide *what* happens (create, alter, drop, replace) and
//! hand each operation to a [`StatementRenderer`].

use std::sync::Arc;
use tracing::debug;

use crate::error::{Error, Result};
use crate::schema::policy::PolicySet;
use crate::schema::table::{SchemaPair, TableDiffOrchestrator};
use crate::schema::types::{
    ComparisonStatus, ConstraintKind, DdlFragment, DiffResult, ObjectKind, Property, PropertyBag,
};

/// Keys holding a schema name that follow an object from source to target
const SCHEMA_KEYS: &[&str] = &["schema", "ref_schema"];

/// One statement request handed to a renderer
#[derive(Debug, Clone, Copy)]
pub enum Operation<'a> {
    Create(&'a PropertyBag),
    /// `changes` is the sparse diff of `source` against `target`
    Alter {
        source: &'a PropertyBag,
        target: &'a PropertyBag,
        changes: &'a PropertyBag,
    },
    Drop(&'a PropertyBag),
}

impl<'a> Operation<'a> {
    /// Name of the object the operation applies to
    pub fn name(&self) -> &'a str {
        let bag = match *self {
            Operation::Create(bag) | Operation::Drop(bag) => bag,
            Operation::Alter { source, .. } => source,
        };
        bag.name().unwrap_or_default()
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Operation::Create(_) => "create",
            Operation::Alter { .. } => "alter",
            Operation::Drop(_) => "drop",
        }
    }
}

/// Where a statement is rendered
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Schema the statement runs against, always the target schema for deltas
    pub schema: &'a str,
    /// Owning table for sub-objects, the parent for partitions
    pub table: Option<&'a str>,
    pub cascade: bool,
}

/// Synthesizes one DDL statement (or a short block) for one object
pub trait StatementRenderer: Send + Sync {
    fn render(
        &self,
        kind: ObjectKind,
        operation: Operation<'_>,
        ctx: &RenderContext<'_>,
    ) -> Result<String>;
}

/// Emits the statements for one object given its comparison status
pub trait ObjectKindAdapter {
    fn kind(&self) -> ObjectKind;

    fn emit(
        &self,
        status: ComparisonStatus,
        source: Option<&PropertyBag>,
        target: Option<&PropertyBag>,
        diff: Option<&PropertyBag>,
        ctx: &EmitContext<'_>,
    ) -> Result<DdlFragment>;
}

/// State shared by every adapter call within one table
#[derive(Clone, Copy)]
pub struct EmitContext<'a> {
    pub orchestrator: &'a TableDiffOrchestrator<'a>,
    pub source_schema: &'a str,
    pub target_schema: &'a str,
    pub table: Option<&'a str>,
    pub cascade: bool,
    /// Partition nesting level of the table being processed
    pub depth: usize,
}

impl<'a> EmitContext<'a> {
    pub fn policies(&self) -> &'a PolicySet {
        self.orchestrator.policies()
    }

    pub fn registry(&self) -> &'a AdapterRegistry {
        self.orchestrator.registry()
    }

    pub fn schemas(&self) -> SchemaPair<'a> {
        SchemaPair {
            source: self.source_schema,
            target: self.target_schema,
        }
    }

    /// Context for the sub-objects of `table`
    pub fn for_table<'b>(&self, table: &'b str) -> EmitContext<'b>
    where
        'a: 'b,
    {
        EmitContext {
            orchestrator: self.orchestrator,
            source_schema: self.source_schema,
            target_schema: self.target_schema,
            table: Some(table),
            cascade: false,
            depth: self.depth,
        }
    }

    /// Dotted path of an object, used in error messages
    pub fn object_path(&self, name: &str) -> String {
        match self.table {
            Some(table) => format!("{}.{}.{}", self.target_schema, table, name),
            None => format!("{}.{}", self.target_schema, name),
        }
    }

    fn render_context(&self, cascade: bool) -> RenderContext<'a> {
        RenderContext {
            schema: self.target_schema,
            table: self.table,
            cascade,
        }
    }
}

/// Copy of `bag` with schema references moved from `from` to `to`, at every depth
pub fn retarget(bag: &PropertyBag, from: &str, to: &str) -> PropertyBag {
    if from == to {
        return bag.clone();
    }
    bag.iter()
        .map(|(key, value)| {
            let value = match value {
                Property::Text(schema) if SCHEMA_KEYS.contains(&key) && schema == from => {
                    Property::from(to)
                }
                other => retarget_value(other, from, to),
            };
            (key.to_string(), value)
        })
        .collect()
}

fn retarget_value(value: &Property, from: &str, to: &str) -> Property {
    match value {
        Property::Bag(bag) => Property::Bag(retarget(bag, from, to)),
        Property::List(items) => Property::List(
            items
                .iter()
                .map(|item| retarget_value(item, from, to))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn required<'b>(
    bag: Option<&'b PropertyBag>,
    side: &str,
    kind: ObjectKind,
    status: ComparisonStatus,
) -> Result<&'b PropertyBag> {
    bag.ok_or_else(|| {
        Error::Precondition(format!(
            "{} object required to emit a {} {}",
            side, status, kind
        ))
    })
}

/// Source bag ready for creation in the target schema
fn prepare_create(source: &PropertyBag, ctx: &EmitContext<'_>) -> PropertyBag {
    let bag = retarget(source, ctx.source_schema, ctx.target_schema);
    ctx.policies().strip_owner(&bag)
}

fn render(
    renderer: &dyn StatementRenderer,
    kind: ObjectKind,
    operation: Operation<'_>,
    ctx: &EmitContext<'_>,
    cascade: bool,
) -> Result<String> {
    let name = operation.name();
    debug!(kind = %kind, object = name, operation = operation.verb(), "rendering statement");
    renderer
        .render(kind, operation, &ctx.render_context(cascade))
        .map_err(|error| {
            let message = match error {
                Error::Render { message, .. } => message,
                other => other.to_string(),
            };
            Error::render(kind, ctx.object_path(name), message)
        })
}

fn create_one(
    renderer: &dyn StatementRenderer,
    kind: ObjectKind,
    source: &PropertyBag,
    ctx: &EmitContext<'_>,
) -> Result<DdlFragment> {
    let bag = prepare_create(source, ctx);
    render(renderer, kind, Operation::Create(&bag), ctx, false).map(DdlFragment::from)
}

fn drop_one(
    renderer: &dyn StatementRenderer,
    kind: ObjectKind,
    target: &PropertyBag,
    ctx: &EmitContext<'_>,
    cascade: bool,
) -> Result<DdlFragment> {
    render(renderer, kind, Operation::Drop(target), ctx, cascade).map(DdlFragment::from)
}

fn replace_one(
    renderer: &dyn StatementRenderer,
    kind: ObjectKind,
    source: &PropertyBag,
    target: &PropertyBag,
    ctx: &EmitContext<'_>,
) -> Result<DdlFragment> {
    let mut fragment = drop_one(renderer, kind, target, ctx, false)?;
    fragment.extend(create_one(renderer, kind, source, ctx)?);
    Ok(fragment)
}

fn alter_one(
    renderer: &dyn StatementRenderer,
    kind: ObjectKind,
    source: &PropertyBag,
    target: &PropertyBag,
    diff: Option<&PropertyBag>,
    ctx: &EmitContext<'_>,
) -> Result<DdlFragment> {
    let policies = ctx.policies();
    let comparator = policies.comparator(kind);
    if policies
        .get(kind)
        .requires_recreate(source, target, &comparator)
    {
        return replace_one(renderer, kind, source, target, ctx);
    }

    let changes = match diff {
        Some(diff) => diff.clone(),
        None => comparator.diff(source, target),
    };
    if changes.is_empty() {
        return Ok(DdlFragment::new());
    }
    let source = prepare_create(source, ctx);
    let operation = Operation::Alter {
        source: &source,
        target,
        changes: &changes,
    };
    render(renderer, kind, operation, ctx, false).map(DdlFragment::from)
}

/// Create, drop or alter-or-replace, shared by the kinds without extra steps
fn emit_standard(
    renderer: &dyn StatementRenderer,
    kind: ObjectKind,
    status: ComparisonStatus,
    source: Option<&PropertyBag>,
    target: Option<&PropertyBag>,
    diff: Option<&PropertyBag>,
    ctx: &EmitContext<'_>,
) -> Result<DdlFragment> {
    match status {
        ComparisonStatus::Identical => Ok(DdlFragment::new()),
        ComparisonStatus::SourceOnly => {
            let source = required(source, "source", kind, status)?;
            create_one(renderer, kind, source, ctx)
        }
        ComparisonStatus::TargetOnly => {
            let target = required(target, "target", kind, status)?;
            drop_one(renderer, kind, target, ctx, ctx.cascade)
        }
        ComparisonStatus::Different => {
            let source = required(source, "source", kind, status)?;
            let target = required(target, "target", kind, status)?;
            alter_one(renderer, kind, source, target, diff, ctx)
        }
    }
}

/// Tables: the table itself, its columns and its constraints
pub struct TableAdapter {
    renderer: Arc<dyn StatementRenderer>,
}

impl TableAdapter {
    fn create(&self, source: &PropertyBag, ctx: &EmitContext<'_>) -> Result<DdlFragment> {
        let name = source.require_name("table")?;
        let mut fragment = create_one(self.renderer.as_ref(), ObjectKind::Table, source, ctx)?;

        let child_ctx = ctx.for_table(name);
        for kind in ConstraintKind::ALL {
            let kind = ObjectKind::Constraint(kind);
            let adapter = ctx.registry().adapter(kind);
            for constraint in source.bags(kind.collection_key()) {
                fragment.extend(adapter.emit(
                    ComparisonStatus::SourceOnly,
                    Some(&constraint),
                    None,
                    None,
                    &child_ctx,
                )?);
            }
        }
        Ok(fragment)
    }

    /// `diff` is the merged table diff: table-level changes plus one
    /// `{added, changed, deleted}` entry per column or constraint collection
    fn alter(
        &self,
        source: &PropertyBag,
        target: &PropertyBag,
        diff: &PropertyBag,
        ctx: &EmitContext<'_>,
    ) -> Result<DdlFragment> {
        let name = source.require_name("table")?;
        let registry = ctx.registry();
        let child_ctx = ctx.for_table(name);
        let collection = |kind: ObjectKind| {
            diff.bag(kind.collection_key())
                .map(DiffResult::from_bag)
                .unwrap_or_default()
        };

        let columns = collection(ObjectKind::Column);
        let constraints: Vec<(ObjectKind, DiffResult)> = ConstraintKind::ALL
            .iter()
            .map(|kind| {
                let kind = ObjectKind::Constraint(*kind);
                (kind, collection(kind))
            })
            .collect();
        let column_adapter = registry.adapter(ObjectKind::Column);
        let mut fragment = DdlFragment::new();

        // Foreign keys go first so nothing they reference is dropped under them.
        for (kind, result) in constraints.iter().rev() {
            let adapter = registry.adapter(*kind);
            for item in &result.deleted {
                fragment.extend(adapter.emit(
                    ComparisonStatus::TargetOnly,
                    None,
                    Some(item),
                    None,
                    &child_ctx,
                )?);
            }
        }

        for item in &columns.deleted {
            fragment.extend(column_adapter.emit(
                ComparisonStatus::TargetOnly,
                None,
                Some(item),
                None,
                &child_ctx,
            )?);
        }
        for item in &columns.added {
            fragment.extend(column_adapter.emit(
                ComparisonStatus::SourceOnly,
                Some(item),
                None,
                None,
                &child_ctx,
            )?);
        }

        let target_columns = target.bags(ObjectKind::Column.collection_key());
        for item in &columns.changed {
            let column_name = item.require_name("column")?;
            let matched = target_columns
                .iter()
                .find(|column| column.name() == Some(column_name))
                .ok_or_else(|| {
                    Error::Precondition(format!(
                        "changed column '{}' has no counterpart in the target",
                        child_ctx.object_path(column_name)
                    ))
                })?;
            fragment.extend(column_adapter.emit(
                ComparisonStatus::Different,
                Some(item),
                Some(matched),
                None,
                &child_ctx,
            )?);
        }

        let table_changes = diff.without(ctx.policies().table_level_ignore_keys());
        if !table_changes.is_empty() {
            let source = prepare_create(source, ctx);
            let operation = Operation::Alter {
                source: &source,
                target,
                changes: &table_changes,
            };
            fragment.extend(
                render(self.renderer.as_ref(), ObjectKind::Table, operation, ctx, false)?.into(),
            );
        }

        for (kind, result) in &constraints {
            let adapter = registry.adapter(*kind);
            let targets = target.bags(kind.collection_key());
            for item in &result.changed {
                let constraint_name = item.require_name(kind.as_str())?;
                let matched = targets
                    .iter()
                    .find(|candidate| candidate.name() == Some(constraint_name))
                    .ok_or_else(|| {
                        Error::Precondition(format!(
                            "changed {} '{}' has no counterpart in the target",
                            kind,
                            child_ctx.object_path(constraint_name)
                        ))
                    })?;
                fragment.extend(adapter.emit(
                    ComparisonStatus::Different,
                    Some(item),
                    Some(matched),
                    None,
                    &child_ctx,
                )?);
            }
        }

        for (kind, result) in &constraints {
            let adapter = registry.adapter(*kind);
            for item in &result.added {
                fragment.extend(adapter.emit(
                    ComparisonStatus::SourceOnly,
                    Some(item),
                    None,
                    None,
                    &child_ctx,
                )?);
            }
        }

        Ok(fragment)
    }
}

impl ObjectKindAdapter for TableAdapter {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Table
    }

    fn emit(
        &self,
        status: ComparisonStatus,
        source: Option<&PropertyBag>,
        target: Option<&PropertyBag>,
        diff: Option<&PropertyBag>,
        ctx: &EmitContext<'_>,
    ) -> Result<DdlFragment> {
        let kind = self.kind();
        match status {
            ComparisonStatus::Identical => Ok(DdlFragment::new()),
            ComparisonStatus::SourceOnly => self.create(required(source, "source", kind, status)?, ctx),
            ComparisonStatus::TargetOnly => {
                let target = required(target, "target", kind, status)?;
                drop_one(self.renderer.as_ref(), kind, target, ctx, ctx.cascade)
            }
            ComparisonStatus::Different => {
                let source = required(source, "source", kind, status)?;
                let target = required(target, "target", kind, status)?;
                let diff = diff.ok_or_else(|| {
                    Error::Precondition("table alteration requires a merged table diff".to_string())
                })?;
                self.alter(source, target, diff, ctx)
            }
        }
    }
}

/// Columns; a type change the target cannot convert is a drop and re-add
pub struct ColumnAdapter {
    renderer: Arc<dyn StatementRenderer>,
}

impl ObjectKindAdapter for ColumnAdapter {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Column
    }

    fn emit(
        &self,
        status: ComparisonStatus,
        source: Option<&PropertyBag>,
        target: Option<&PropertyBag>,
        diff: Option<&PropertyBag>,
        ctx: &EmitContext<'_>,
    ) -> Result<DdlFragment> {
        emit_standard(self.renderer.as_ref(), self.kind(), status, source, target, diff, ctx)
    }
}

/// One adapter per constraint flavour
pub struct ConstraintAdapter {
    kind: ConstraintKind,
    renderer: Arc<dyn StatementRenderer>,
}

impl ObjectKindAdapter for ConstraintAdapter {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Constraint(self.kind)
    }

    fn emit(
        &self,
        status: ComparisonStatus,
        source: Option<&PropertyBag>,
        target: Option<&PropertyBag>,
        diff: Option<&PropertyBag>,
        ctx: &EmitContext<'_>,
    ) -> Result<DdlFragment> {
        emit_standard(self.renderer.as_ref(), self.kind(), status, source, target, diff, ctx)
    }
}

pub struct IndexAdapter {
    renderer: Arc<dyn StatementRenderer>,
}

impl ObjectKindAdapter for IndexAdapter {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Index
    }

    fn emit(
        &self,
        status: ComparisonStatus,
        source: Option<&PropertyBag>,
        target: Option<&PropertyBag>,
        diff: Option<&PropertyBag>,
        ctx: &EmitContext<'_>,
    ) -> Result<DdlFragment> {
        emit_standard(self.renderer.as_ref(), self.kind(), status, source, target, diff, ctx)
    }
}

pub struct TriggerAdapter {
    renderer: Arc<dyn StatementRenderer>,
}

impl ObjectKindAdapter for TriggerAdapter {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Trigger
    }

    fn emit(
        &self,
        status: ComparisonStatus,
        source: Option<&PropertyBag>,
        target: Option<&PropertyBag>,
        diff: Option<&PropertyBag>,
        ctx: &EmitContext<'_>,
    ) -> Result<DdlFragment> {
        emit_standard(self.renderer.as_ref(), self.kind(), status, source, target, diff, ctx)
    }
}

/// Compound triggers; body changes are replaced in place by the renderer
pub struct CompoundTriggerAdapter {
    renderer: Arc<dyn StatementRenderer>,
}

impl ObjectKindAdapter for CompoundTriggerAdapter {
    fn kind(&self) -> ObjectKind {
        ObjectKind::CompoundTrigger
    }

    fn emit(
        &self,
        status: ComparisonStatus,
        source: Option<&PropertyBag>,
        target: Option<&PropertyBag>,
        diff: Option<&PropertyBag>,
        ctx: &EmitContext<'_>,
    ) -> Result<DdlFragment> {
        emit_standard(self.renderer.as_ref(), self.kind(), status, source, target, diff, ctx)
    }
}

/// Rules have no alter form; any difference drops and recreates them
pub struct RuleAdapter {
    renderer: Arc<dyn StatementRenderer>,
}

impl ObjectKindAdapter for RuleAdapter {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Rule
    }

    fn emit(
        &self,
        status: ComparisonStatus,
        source: Option<&PropertyBag>,
        target: Option<&PropertyBag>,
        diff: Option<&PropertyBag>,
        ctx: &EmitContext<'_>,
    ) -> Result<DdlFragment> {
        let kind = self.kind();
        match status {
            ComparisonStatus::Different => {
                let source = required(source, "source", kind, status)?;
                let target = required(target, "target", kind, status)?;
                replace_one(self.renderer.as_ref(), kind, source, target, ctx)
            }
            _ => emit_standard(self.renderer.as_ref(), kind, status, source, target, diff, ctx),
        }
    }
}

/// Row-level security policies
pub struct PolicyAdapter {
    renderer: Arc<dyn StatementRenderer>,
}

impl ObjectKindAdapter for PolicyAdapter {
    fn kind(&self) -> ObjectKind {
        ObjectKind::RowSecurityPolicy
    }

    fn emit(
        &self,
        status: ComparisonStatus,
        source: Option<&PropertyBag>,
        target: Option<&PropertyBag>,
        diff: Option<&PropertyBag>,
        ctx: &EmitContext<'_>,
    ) -> Result<DdlFragment> {
        emit_standard(self.renderer.as_ref(), self.kind(), status, source, target, diff, ctx)
    }
}

/// Partitions are tables in their own right: a matched pair is diffed
/// recursively one level deeper, a new one is created with its children.
pub struct PartitionAdapter {
    renderer: Arc<dyn StatementRenderer>,
}

impl PartitionAdapter {
    fn create(&self, source: &PropertyBag, ctx: &EmitContext<'_>) -> Result<DdlFragment> {
        let name = source.require_name("partition")?;
        let mut fragment = create_one(self.renderer.as_ref(), ObjectKind::Partition, source, ctx)?;
        fragment.extend(ctx.orchestrator.create_children(
            source,
            ctx.schemas(),
            name,
            ctx.depth + 1,
        )?);
        Ok(fragment)
    }

    fn must_replace(&self, source: &PropertyBag, target: &PropertyBag, ctx: &EmitContext<'_>) -> bool {
        let policies = ctx.policies();
        let partition = policies.comparator(ObjectKind::Partition);
        let table = policies.comparator(ObjectKind::Table);
        policies
            .get(ObjectKind::Partition)
            .requires_recreate(source, target, &partition)
            || policies
                .get(ObjectKind::Table)
                .non_editable_change(source, target, &table)
                .is_some()
    }
}

impl ObjectKindAdapter for PartitionAdapter {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Partition
    }

    fn emit(
        &self,
        status: ComparisonStatus,
        source: Option<&PropertyBag>,
        target: Option<&PropertyBag>,
        _diff: Option<&PropertyBag>,
        ctx: &EmitContext<'_>,
    ) -> Result<DdlFragment> {
        let kind = self.kind();
        if ctx.table.is_none() {
            return Err(Error::Precondition(
                "partitions can only be emitted under a parent table".to_string(),
            ));
        }
        match status {
            ComparisonStatus::Identical => Ok(DdlFragment::new()),
            ComparisonStatus::SourceOnly => self.create(required(source, "source", kind, status)?, ctx),
            ComparisonStatus::TargetOnly => {
                let target = required(target, "target", kind, status)?;
                drop_one(self.renderer.as_ref(), kind, target, ctx, ctx.cascade)
            }
            ComparisonStatus::Different => {
                let source = required(source, "source", kind, status)?;
                let target = required(target, "target", kind, status)?;
                if self.must_replace(source, target, ctx) {
                    let mut fragment = drop_one(self.renderer.as_ref(), kind, target, ctx, false)?;
                    fragment.extend(self.create(source, ctx)?);
                    return Ok(fragment);
                }
                ctx.orchestrator
                    .diff_tables(source, target, ctx.schemas(), ctx.depth + 1)
            }
        }
    }
}

/// One adapter per [`ObjectKind`], looked up by exhaustive match
pub struct AdapterRegistry {
    renderer: Arc<dyn StatementRenderer>,
    table: TableAdapter,
    column: ColumnAdapter,
    primary_key: ConstraintAdapter,
    unique: ConstraintAdapter,
    foreign_key: ConstraintAdapter,
    check: ConstraintAdapter,
    exclusion: ConstraintAdapter,
    index: IndexAdapter,
    trigger: TriggerAdapter,
    compound_trigger: CompoundTriggerAdapter,
    rule: RuleAdapter,
    row_security_policy: PolicyAdapter,
    partition: PartitionAdapter,
}

impl AdapterRegistry {
    pub fn new(renderer: Arc<dyn StatementRenderer>) -> Self {
        let constraint = |kind| ConstraintAdapter {
            kind,
            renderer: Arc::clone(&renderer),
        };
        Self {
            table: TableAdapter {
                renderer: Arc::clone(&renderer),
            },
            column: ColumnAdapter {
                renderer: Arc::clone(&renderer),
            },
            primary_key: constraint(ConstraintKind::PrimaryKey),
            unique: constraint(ConstraintKind::Unique),
            foreign_key: constraint(ConstraintKind::ForeignKey),
            check: constraint(ConstraintKind::Check),
            exclusion: constraint(ConstraintKind::Exclusion),
            index: IndexAdapter {
                renderer: Arc::clone(&renderer),
            },
            trigger: TriggerAdapter {
                renderer: Arc::clone(&renderer),
            },
            compound_trigger: CompoundTriggerAdapter {
                renderer: Arc::clone(&renderer),
            },
            rule: RuleAdapter {
                renderer: Arc::clone(&renderer),
            },
            row_security_policy: PolicyAdapter {
                renderer: Arc::clone(&renderer),
            },
            partition: PartitionAdapter {
                renderer: Arc::clone(&renderer),
            },
            renderer,
        }
    }

    pub fn renderer(&self) -> &dyn StatementRenderer {
        self.renderer.as_ref()
    }

    pub fn adapter(&self, kind: ObjectKind) -> &dyn ObjectKindAdapter {
        match kind {
            ObjectKind::Table => &self.table,
            ObjectKind::Column => &self.column,
            ObjectKind::Constraint(ConstraintKind::PrimaryKey) => &self.primary_key,
            ObjectKind::Constraint(ConstraintKind::Unique) => &self.unique,
            ObjectKind::Constraint(ConstraintKind::ForeignKey) => &self.foreign_key,
            ObjectKind::Constraint(ConstraintKind::Check) => &self.check,
            ObjectKind::Constraint(ConstraintKind::Exclusion) => &self.exclusion,
            ObjectKind::Index => &self.index,
            ObjectKind::Trigger => &self.trigger,
            ObjectKind::CompoundTrigger => &self.compound_trigger,
            ObjectKind::Rule => &self.rule,
            ObjectKind::RowSecurityPolicy => &self.row_security_policy,
            ObjectKind::Partition => &self.partition,
        }
    }
}

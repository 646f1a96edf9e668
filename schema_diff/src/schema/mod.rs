//! Schema module for SchemaDiff
//!
//! This module handles schema comparison and DDL delta generation.

pub mod adapter;
pub mod collection;
pub mod compare;
pub mod comparer;
pub mod policy;
pub mod table;
pub mod types;

// Re-export key types
pub use adapter::{
    AdapterRegistry, EmitContext, ObjectKindAdapter, Operation, RenderContext, StatementRenderer,
};
pub use collection::NamedCollectionDiffer;
pub use compare::StructuralComparator;
pub use comparer::{
    DdlComparison, SchemaComparer, SchemaComparison, ScriptOptions, ScriptReport, TableFailure,
};
pub use policy::{KindPolicy, PolicySet};
pub use table::{SchemaPair, TableDiffOrchestrator, TableDiffState};
pub use types::{
    ComparisonEntry, ComparisonStatus, ConstraintKind, DdlFragment, DiffResult, KeySet,
    ObjectKind, Property, PropertyBag,
};

//! Per-kind comparison policies
//!
//! Every object kind has a fixed set of ignored properties (server-assigned
//! ids, catalog internals, statistics) and a list of properties that cannot
//! be changed in place, forcing a drop and recreate instead of an alter.

use crate::config::CompareConfig;
use crate::schema::collection::{NamedCollectionDiffer, RecreatePredicate};
use crate::schema::compare::StructuralComparator;
use crate::schema::types::{ConstraintKind, KeySet, ObjectKind, PropertyBag};

/// Properties that depend on who owns an object
pub const OWNER_KEYS: &[&str] = &["relowner", "owner"];

/// Keys copied from the matched target item onto a changed source item
const CARRY_OID: &[&str] = &["oid"];
const CARRY_COLUMN: &[&str] = &["oid", "attnum"];

const TABLE_IGNORE: &[&str] = &[
    "oid",
    "schema",
    "vacuum_table",
    "vacuum_toast",
    "edit_types",
    "attnum",
    "col_type",
    "reltuples",
    "rows_cnt",
];
const COLUMN_IGNORE: &[&str] = &[
    "oid",
    "attnum",
    "attrelid",
    "adrelid",
    "relname",
    "nspname",
    "parent_tbl",
    "edit_types",
    "col_type",
];
const CONSTRAINT_IGNORE: &[&str] = &["oid"];
const CHECK_IGNORE: &[&str] = &["oid", "nspname"];
const FOREIGN_KEY_IGNORE: &[&str] = &["oid", "fknsp", "confrelid"];
const CHILD_IGNORE: &[&str] = &["oid", "schema", "table"];

const TABLE_NON_EDITABLE: &[&str] = &["is_partitioned", "partition_scheme"];
const PRIMARY_KEY_NON_EDITABLE: &[&str] =
    &["columns", "col_count", "deferrable", "deferred", "include"];
const UNIQUE_NON_EDITABLE: &[&str] = &["columns", "col_count", "deferrable", "deferred", "include"];
const FOREIGN_KEY_NON_EDITABLE: &[&str] = &[
    "columns",
    "ref_table",
    "ref_schema",
    "ref_columns",
    "on_update",
    "on_delete",
    "match_type",
    "deferrable",
    "deferred",
];
const CHECK_NON_EDITABLE: &[&str] = &["expression", "no_inherit"];
const EXCLUSION_NON_EDITABLE: &[&str] =
    &["amname", "columns", "predicate", "deferrable", "deferred"];
const INDEX_NON_EDITABLE: &[&str] = &["columns", "amname", "is_unique", "predicate", "include"];
const TRIGGER_NON_EDITABLE: &[&str] = &[
    "fires",
    "events",
    "for_each",
    "function",
    "arguments",
    "when",
    "columns",
];
const COMPOUND_TRIGGER_NON_EDITABLE: &[&str] = &["events", "columns", "when"];
const POLICY_NON_EDITABLE: &[&str] = &["event", "permissive"];
const PARTITION_NON_EDITABLE: &[&str] = &["partition_value"];

/// A column whose type changes to one the target column cannot be converted
/// to in place must be dropped and added again.
///
/// The target column advertises its in-place conversions in `edit_types`;
/// without that list the change is assumed to be convertible.
pub fn column_type_not_convertible(source: &PropertyBag, target: &PropertyBag) -> bool {
    let (Some(source_type), Some(target_type)) = (source.text("type"), target.text("type")) else {
        return false;
    };
    if source_type == target_type {
        return false;
    }
    match target.list("edit_types") {
        Some(edit_types) => !edit_types
            .iter()
            .any(|candidate| candidate.as_str() == Some(source_type)),
        None => false,
    }
}

/// Comparison rules for one object kind
#[derive(Clone)]
pub struct KindPolicy {
    pub ignore_keys: KeySet,
    pub non_editable_keys: &'static [&'static str],
    pub carried_keys: &'static [&'static str],
    pub recreate_when: Option<RecreatePredicate>,
    /// The kind has no in-place alteration at all
    pub replace_only: bool,
}

impl KindPolicy {
    fn new(ignore: &[&str], non_editable: &'static [&'static str]) -> Self {
        Self {
            ignore_keys: KeySet::from_keys(ignore),
            non_editable_keys: non_editable,
            carried_keys: CARRY_OID,
            recreate_when: None,
            replace_only: false,
        }
    }

    /// First non-editable property whose value differs, if any
    pub fn non_editable_change(
        &self,
        source: &PropertyBag,
        target: &PropertyBag,
        comparator: &StructuralComparator<'_>,
    ) -> Option<&'static str> {
        self.non_editable_keys
            .iter()
            .copied()
            .find(|key| !comparator.entries_equal(source.get(key), target.get(key)))
    }

    /// Whether a matched pair must be dropped and recreated
    pub fn requires_recreate(
        &self,
        source: &PropertyBag,
        target: &PropertyBag,
        comparator: &StructuralComparator<'_>,
    ) -> bool {
        self.replace_only
            || self.non_editable_change(source, target, comparator).is_some()
            || self
                .recreate_when
                .map(|predicate| predicate(source, target))
                .unwrap_or(false)
    }
}

/// The policies of every kind, built once per comparer
#[derive(Clone)]
pub struct PolicySet {
    table: KindPolicy,
    column: KindPolicy,
    primary_key: KindPolicy,
    unique: KindPolicy,
    foreign_key: KindPolicy,
    check: KindPolicy,
    exclusion: KindPolicy,
    index: KindPolicy,
    trigger: KindPolicy,
    compound_trigger: KindPolicy,
    rule: KindPolicy,
    row_security_policy: KindPolicy,
    partition: KindPolicy,
    /// Union of every ignore set; used when whole tables are compared
    comparison_ignore_keys: KeySet,
    /// Table ignore keys plus every sub-collection key
    table_level_ignore_keys: KeySet,
    owner_keys: KeySet,
    ignore_owner: bool,
    ignore_whitespace: bool,
}

impl PolicySet {
    pub fn from_config(config: &CompareConfig) -> Self {
        let mut column = KindPolicy::new(COLUMN_IGNORE, &[]);
        column.carried_keys = CARRY_COLUMN;
        column.recreate_when = Some(column_type_not_convertible);

        let mut rule = KindPolicy::new(CHILD_IGNORE, &[]);
        rule.replace_only = true;

        let mut policies = Self {
            table: KindPolicy::new(TABLE_IGNORE, TABLE_NON_EDITABLE),
            column,
            primary_key: KindPolicy::new(CONSTRAINT_IGNORE, PRIMARY_KEY_NON_EDITABLE),
            unique: KindPolicy::new(CONSTRAINT_IGNORE, UNIQUE_NON_EDITABLE),
            foreign_key: KindPolicy::new(FOREIGN_KEY_IGNORE, FOREIGN_KEY_NON_EDITABLE),
            check: KindPolicy::new(CHECK_IGNORE, CHECK_NON_EDITABLE),
            exclusion: KindPolicy::new(CONSTRAINT_IGNORE, EXCLUSION_NON_EDITABLE),
            index: KindPolicy::new(CHILD_IGNORE, INDEX_NON_EDITABLE),
            trigger: KindPolicy::new(CHILD_IGNORE, TRIGGER_NON_EDITABLE),
            compound_trigger: KindPolicy::new(CHILD_IGNORE, COMPOUND_TRIGGER_NON_EDITABLE),
            rule,
            row_security_policy: KindPolicy::new(CHILD_IGNORE, POLICY_NON_EDITABLE),
            partition: KindPolicy::new(TABLE_IGNORE, PARTITION_NON_EDITABLE),
            comparison_ignore_keys: KeySet::new(),
            table_level_ignore_keys: KeySet::new(),
            owner_keys: KeySet::from_keys(OWNER_KEYS),
            ignore_owner: config.ignore_owner,
            ignore_whitespace: config.ignore_whitespace,
        };

        if config.ignore_owner {
            let owner_keys = policies.owner_keys.clone();
            for policy in policies.all_mut() {
                policy.ignore_keys.extend(&owner_keys);
            }
        }

        let mut comparison = KeySet::new();
        for policy in policies.all_mut() {
            comparison.extend(&policy.ignore_keys);
        }
        policies.comparison_ignore_keys = comparison;

        let mut table_level = policies.table.ignore_keys.clone();
        table_level.insert(ObjectKind::Column.collection_key());
        for kind in ConstraintKind::ALL {
            table_level.insert(kind.collection_key());
        }
        for kind in ObjectKind::SUBMODULES {
            table_level.insert(kind.collection_key());
        }
        policies.table_level_ignore_keys = table_level;

        policies
    }

    fn all_mut(&mut self) -> [&mut KindPolicy; 13] {
        [
            &mut self.table,
            &mut self.column,
            &mut self.primary_key,
            &mut self.unique,
            &mut self.foreign_key,
            &mut self.check,
            &mut self.exclusion,
            &mut self.index,
            &mut self.trigger,
            &mut self.compound_trigger,
            &mut self.rule,
            &mut self.row_security_policy,
            &mut self.partition,
        ]
    }

    pub fn get(&self, kind: ObjectKind) -> &KindPolicy {
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

    pub fn ignore_owner(&self) -> bool {
        self.ignore_owner
    }

    pub fn ignore_whitespace(&self) -> bool {
        self.ignore_whitespace
    }

    /// Keys ignored when two whole table trees are compared for status
    pub fn comparison_ignore_keys(&self) -> &KeySet {
        &self.comparison_ignore_keys
    }

    /// Keys ignored when only a table's own properties are diffed
    pub fn table_level_ignore_keys(&self) -> &KeySet {
        &self.table_level_ignore_keys
    }

    /// Comparator honouring `kind`'s ignore set and the whitespace toggle
    pub fn comparator(&self, kind: ObjectKind) -> StructuralComparator<'_> {
        StructuralComparator::new(&self.get(kind).ignore_keys, self.ignore_whitespace)
    }

    /// Differ configured with `kind`'s ignore, non-editable and carried keys
    pub fn differ(&self, kind: ObjectKind) -> NamedCollectionDiffer<'_> {
        let policy = self.get(kind);
        let mut differ = NamedCollectionDiffer::new(&policy.ignore_keys)
            .non_editable(policy.non_editable_keys)
            .carry(policy.carried_keys)
            .ignore_whitespace(self.ignore_whitespace);
        if let Some(predicate) = policy.recreate_when {
            differ = differ.recreate_when(predicate);
        }
        differ
    }

    /// Remove owner properties when ownership is not compared
    pub fn strip_owner(&self, bag: &PropertyBag) -> PropertyBag {
        if self.ignore_owner {
            bag.without(&self.owner_keys)
        } else {
            bag.clone()
        }
    }
}

//! Type definitions for schema snapshots and comparison results

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Property holding the stable comparison identity of an object
pub const NAME_KEY: &str = "name";

/// Property holding the server-assigned identifier of an object
pub const OID_KEY: &str = "oid";

/// A single property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Property {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Property>),
    Bag(PropertyBag),
}

impl Property {
    pub fn is_null(&self) -> bool {
        matches!(self, Property::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Property::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Property::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Property::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Property]> {
        match self {
            Property::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_bag(&self) -> Option<&PropertyBag> {
        match self {
            Property::Bag(bag) => Some(bag),
            _ => None,
        }
    }

    /// A non-empty list whose every element is a bag carrying a `name`
    pub fn is_named_collection(&self) -> bool {
        match self {
            Property::List(items) => {
                !items.is_empty()
                    && items
                        .iter()
                        .all(|item| item.as_bag().and_then(|b| b.name()).is_some())
            }
            _ => false,
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Property::Null => Ok(()),
            Property::Bool(value) => write!(f, "{}", value),
            Property::Int(value) => write!(f, "{}", value),
            Property::Float(value) => write!(f, "{}", value),
            Property::Text(value) => f.write_str(value),
            Property::List(items) => {
                let parts: Vec<String> = items.iter().map(|item| item.to_string()).collect();
                f.write_str(&parts.join(", "))
            }
            Property::Bag(bag) => match serde_json::to_string(bag) {
                Ok(json) => f.write_str(&json),
                Err(_) => Err(fmt::Error),
            },
        }
    }
}

impl From<&str> for Property {
    fn from(value: &str) -> Self {
        Property::Text(value.to_string())
    }
}

impl From<String> for Property {
    fn from(value: String) -> Self {
        Property::Text(value)
    }
}

impl From<bool> for Property {
    fn from(value: bool) -> Self {
        Property::Bool(value)
    }
}

impl From<i64> for Property {
    fn from(value: i64) -> Self {
        Property::Int(value)
    }
}

impl From<i32> for Property {
    fn from(value: i32) -> Self {
        Property::Int(i64::from(value))
    }
}

impl From<u32> for Property {
    fn from(value: u32) -> Self {
        Property::Int(i64::from(value))
    }
}

impl From<f64> for Property {
    fn from(value: f64) -> Self {
        Property::Float(value)
    }
}

impl From<PropertyBag> for Property {
    fn from(value: PropertyBag) -> Self {
        Property::Bag(value)
    }
}

impl<T: Into<Property>> From<Vec<T>> for Property {
    fn from(values: Vec<T>) -> Self {
        Property::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Property>> From<Option<T>> for Property {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Property::Null)
    }
}

/// The properties of one database object, in snapshot order.
///
/// Equality ignores key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyBag(IndexMap<String, Property>);

impl PropertyBag {
    /// Create an empty bag
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Property> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Insert or replace a property, keeping the position of an existing key
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Property>) {
        self.0.insert(key.into(), value.into());
    }

    /// Builder form of [`PropertyBag::insert`]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Property>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<Property> {
        self.0.shift_remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// The stable comparison identity
    pub fn name(&self) -> Option<&str> {
        self.text(NAME_KEY)
    }

    /// The name, or a precondition error naming `context`
    pub fn require_name(&self, context: &str) -> Result<&str> {
        self.name().ok_or_else(|| {
            Error::Precondition(format!("{} entry without a '{}' property", context, NAME_KEY))
        })
    }

    /// The opaque server-assigned identifier
    pub fn oid(&self) -> Option<&Property> {
        self.get(OID_KEY)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Property::as_str)
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Property::as_bool)
    }

    /// A boolean property, `false` when absent
    pub fn flag(&self, key: &str) -> bool {
        self.bool(key).unwrap_or(false)
    }

    pub fn list(&self, key: &str) -> Option<&[Property]> {
        self.get(key).and_then(Property::as_list)
    }

    pub fn bag(&self, key: &str) -> Option<&PropertyBag> {
        self.get(key).and_then(Property::as_bag)
    }

    /// The bag elements of a sub-collection
    pub fn bags(&self, key: &str) -> Vec<PropertyBag> {
        self.list(key)
            .map(|items| items.iter().filter_map(Property::as_bag).cloned().collect())
            .unwrap_or_default()
    }

    /// The textual elements of a list property
    pub fn strings(&self, key: &str) -> Vec<String> {
        self.list(key)
            .map(|items| items.iter().map(|item| item.to_string()).collect())
            .unwrap_or_default()
    }

    /// A copy with `keys` removed at every depth
    pub fn without(&self, keys: &KeySet) -> PropertyBag {
        let mut stripped = PropertyBag::new();
        for (key, value) in self.iter() {
            if keys.contains(key) {
                continue;
            }
            stripped.insert(key, strip_value(value, keys));
        }
        stripped
    }
}

fn strip_value(value: &Property, keys: &KeySet) -> Property {
    match value {
        Property::Bag(bag) => Property::Bag(bag.without(keys)),
        Property::List(items) => {
            Property::List(items.iter().map(|item| strip_value(item, keys)).collect())
        }
        other => other.clone(),
    }
}

impl FromIterator<(String, Property)> for PropertyBag {
    fn from_iter<I: IntoIterator<Item = (String, Property)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Build a [`PropertyBag`] from `key => value` pairs
#[macro_export]
macro_rules! bag {
    () => {
        $crate::schema::types::PropertyBag::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut bag = $crate::schema::types::PropertyBag::new();
        $( bag.insert($key, $value); )+
        bag
    }};
}

/// A set of property names, e.g. the keys ignored for one object kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySet(BTreeSet<String>);

impl KeySet {
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    pub fn from_keys(keys: &[&str]) -> Self {
        Self(keys.iter().map(|key| key.to_string()).collect())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    pub fn insert(&mut self, key: impl Into<String>) {
        self.0.insert(key.into());
    }

    pub fn extend(&mut self, other: &KeySet) {
        self.0.extend(other.0.iter().cloned());
    }

    pub fn union(&self, other: &KeySet) -> KeySet {
        let mut merged = self.clone();
        merged.extend(other);
        merged
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Outcome of comparing one object across source and target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonStatus {
    Identical,
    SourceOnly,
    TargetOnly,
    Different,
}

impl ComparisonStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonStatus::Identical => "identical",
            ComparisonStatus::SourceOnly => "source_only",
            ComparisonStatus::TargetOnly => "target_only",
            ComparisonStatus::Different => "different",
        }
    }
}

impl fmt::Display for ComparisonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComparisonStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "identical" => Ok(ComparisonStatus::Identical),
            "source_only" => Ok(ComparisonStatus::SourceOnly),
            "target_only" => Ok(ComparisonStatus::TargetOnly),
            "different" => Ok(ComparisonStatus::Different),
            other => Err(Error::Precondition(format!(
                "Unknown comparison status: {}",
                other
            ))),
        }
    }
}

/// Classification of two named collections
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiffResult {
    pub added: Vec<PropertyBag>,
    pub changed: Vec<PropertyBag>,
    pub deleted: Vec<PropertyBag>,
    /// Names of matched pairs that compared equal
    pub unchanged: Vec<String>,
}

impl DiffResult {
    /// Check if nothing was added, changed or deleted
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.deleted.is_empty()
    }

    /// `{added, changed, deleted}` as a bag, the shape renderers receive
    pub fn to_bag(&self) -> PropertyBag {
        bag! {
            "added" => self.added.clone(),
            "changed" => self.changed.clone(),
            "deleted" => self.deleted.clone(),
        }
    }

    /// Read back a bag produced by [`DiffResult::to_bag`]
    pub fn from_bag(bag: &PropertyBag) -> Self {
        Self {
            added: bag.bags("added"),
            changed: bag.bags("changed"),
            deleted: bag.bags("deleted"),
            unchanged: Vec::new(),
        }
    }
}

/// An ordered run of DDL statements
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DdlFragment {
    statements: Vec<String>,
}

impl DdlFragment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a statement; blank statements are dropped
    pub fn push(&mut self, statement: impl Into<String>) {
        let statement = statement.into();
        let trimmed = statement.trim();
        if !trimmed.is_empty() {
            self.statements.push(trimmed.to_string());
        }
    }

    /// Append every statement of `other`, in order
    pub fn extend(&mut self, other: DdlFragment) {
        self.statements.extend(other.statements);
    }

    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn to_sql(&self) -> String {
        self.statements.join("\n")
    }
}

impl From<String> for DdlFragment {
    fn from(statement: String) -> Self {
        let mut fragment = DdlFragment::new();
        fragment.push(statement);
        fragment
    }
}

impl fmt::Display for DdlFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

/// Table constraint flavours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    PrimaryKey,
    Unique,
    ForeignKey,
    Check,
    Exclusion,
}

impl ConstraintKind {
    /// Creation order; foreign keys come last because they may need the others
    pub const ALL: [ConstraintKind; 5] = [
        ConstraintKind::PrimaryKey,
        ConstraintKind::Unique,
        ConstraintKind::Check,
        ConstraintKind::Exclusion,
        ConstraintKind::ForeignKey,
    ];

    pub fn collection_key(&self) -> &'static str {
        match self {
            ConstraintKind::PrimaryKey => "primary_key",
            ConstraintKind::Unique => "unique_constraint",
            ConstraintKind::ForeignKey => "foreign_key",
            ConstraintKind::Check => "check_constraint",
            ConstraintKind::Exclusion => "exclude_constraint",
        }
    }
}

/// Every kind of object the engine compares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Table,
    Column,
    Constraint(ConstraintKind),
    Index,
    Trigger,
    CompoundTrigger,
    Rule,
    RowSecurityPolicy,
    Partition,
}

impl ObjectKind {
    /// Sub-object kinds walked after the table-level statements, in emission order
    pub const SUBMODULES: [ObjectKind; 6] = [
        ObjectKind::Index,
        ObjectKind::RowSecurityPolicy,
        ObjectKind::Trigger,
        ObjectKind::CompoundTrigger,
        ObjectKind::Rule,
        ObjectKind::Partition,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Table => "table",
            ObjectKind::Column => "column",
            ObjectKind::Constraint(ConstraintKind::PrimaryKey) => "primary_key",
            ObjectKind::Constraint(ConstraintKind::Unique) => "unique_constraint",
            ObjectKind::Constraint(ConstraintKind::ForeignKey) => "foreign_key",
            ObjectKind::Constraint(ConstraintKind::Check) => "check_constraint",
            ObjectKind::Constraint(ConstraintKind::Exclusion) => "exclusion_constraint",
            ObjectKind::Index => "index",
            ObjectKind::Trigger => "trigger",
            ObjectKind::CompoundTrigger => "compound_trigger",
            ObjectKind::Rule => "rule",
            ObjectKind::RowSecurityPolicy => "row_security_policy",
            ObjectKind::Partition => "partition",
        }
    }

    /// Key of this kind's collection inside a table bag
    pub fn collection_key(&self) -> &'static str {
        match self {
            ObjectKind::Table => "tables",
            ObjectKind::Column => "columns",
            ObjectKind::Constraint(kind) => kind.collection_key(),
            ObjectKind::Index => "indexes",
            ObjectKind::Trigger => "triggers",
            ObjectKind::CompoundTrigger => "compound_triggers",
            ObjectKind::Rule => "rules",
            ObjectKind::RowSecurityPolicy => "row_security_policies",
            ObjectKind::Partition => "partitions",
        }
    }

    /// Collection label shown next to comparison results
    pub fn label(&self) -> &'static str {
        match self {
            ObjectKind::Table => "Tables",
            ObjectKind::Column => "Columns",
            ObjectKind::Constraint(ConstraintKind::PrimaryKey) => "Primary Keys",
            ObjectKind::Constraint(ConstraintKind::Unique) => "Unique Constraints",
            ObjectKind::Constraint(ConstraintKind::ForeignKey) => "Foreign Keys",
            ObjectKind::Constraint(ConstraintKind::Check) => "Check Constraints",
            ObjectKind::Constraint(ConstraintKind::Exclusion) => "Exclusion Constraints",
            ObjectKind::Index => "Indexes",
            ObjectKind::Trigger => "Triggers",
            ObjectKind::CompoundTrigger => "Compound Triggers",
            ObjectKind::Rule => "Rules",
            ObjectKind::RowSecurityPolicy => "RLS Policies",
            ObjectKind::Partition => "Partitions",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ObjectKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One row of a schema comparison
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonEntry {
    pub id: usize,
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    pub label: String,
    pub title: String,
    pub source_oid: Option<Property>,
    pub target_oid: Option<Property>,
    pub status: ComparisonStatus,
}

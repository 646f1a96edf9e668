//! Structural comparison of property bags
//!
//! Two bags are compared recursively. Ignored keys are never looked at, a
//! missing key is treated like `Null`, and `Null` is treated like an empty
//! list, so snapshot providers that omit empty collections do not produce
//! spurious differences.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

use crate::schema::collection::NamedCollectionDiffer;
use crate::schema::types::{KeySet, Property, PropertyBag};

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Collapse every whitespace run to a single space and trim both ends
pub fn normalize_whitespace(text: &str) -> Cow<'_, str> {
    let trimmed = text.trim();
    WHITESPACE.replace_all(trimmed, " ")
}

fn is_blank(value: &Property) -> bool {
    match value {
        Property::Null => true,
        Property::List(items) => items.is_empty(),
        _ => false,
    }
}

/// Key an element of a keyed list is matched by: `name`, or `grantee` for
/// privilege entries
fn identity(item: &Property) -> Option<&str> {
    let bag = item.as_bag()?;
    bag.name().or_else(|| bag.text("grantee"))
}

fn is_keyed_list(items: &[Property]) -> bool {
    !items.is_empty() && items.iter().all(|item| identity(item).is_some())
}

/// Recursive equality and diff for two matched bags
#[derive(Debug, Clone, Copy)]
pub struct StructuralComparator<'a> {
    ignore_keys: &'a KeySet,
    ignore_whitespace: bool,
}

impl<'a> StructuralComparator<'a> {
    pub fn new(ignore_keys: &'a KeySet, ignore_whitespace: bool) -> Self {
        Self {
            ignore_keys,
            ignore_whitespace,
        }
    }

    /// Check whether `a` and `b` agree on every key that is not ignored
    pub fn are_identical(&self, a: &PropertyBag, b: &PropertyBag) -> bool {
        let keys_a = a.keys().filter(|key| !self.ignore_keys.contains(key));
        let keys_b = b
            .keys()
            .filter(|key| !self.ignore_keys.contains(key) && !a.contains_key(key));

        keys_a
            .chain(keys_b)
            .all(|key| self.entries_equal(a.get(key), b.get(key)))
    }

    /// Compare two optional values, treating absence like `Null`
    pub fn entries_equal(&self, a: Option<&Property>, b: Option<&Property>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => self.values_equal(a, b),
            (Some(value), None) | (None, Some(value)) => is_blank(value),
            (None, None) => true,
        }
    }

    /// Compare two values under this comparator's rules
    pub fn values_equal(&self, a: &Property, b: &Property) -> bool {
        match (a, b) {
            (Property::Bag(a), Property::Bag(b)) => self.are_identical(a, b),
            (Property::List(a), Property::List(b)) => self.lists_equal(a, b),
            (Property::Text(a), Property::Text(b)) if self.ignore_whitespace => {
                normalize_whitespace(a) == normalize_whitespace(b)
            }
            (a, b) if is_blank(a) && is_blank(b) => true,
            (a, b) => a == b,
        }
    }

    fn lists_equal(&self, a: &[Property], b: &[Property]) -> bool {
        if a.len() != b.len() {
            return false;
        }
        if is_keyed_list(a) {
            // Matched by key, so reordering alone is not a difference.
            return a.iter().all(|item| {
                let (Some(key), Some(bag)) = (identity(item), item.as_bag()) else {
                    return false;
                };
                b.iter()
                    .find(|candidate| identity(candidate) == Some(key))
                    .and_then(Property::as_bag)
                    .map(|candidate| self.are_identical(bag, candidate))
                    .unwrap_or(false)
            });
        }
        a.iter().zip(b).all(|(a, b)| self.values_equal(a, b))
    }

    /// Sparse bag holding only the branches of `a` that differ from `b`.
    ///
    /// Named sub-collections become `{added, changed, deleted}`; a key that
    /// only `b` sets is reported as `Null`. Ignored keys never appear.
    pub fn diff(&self, a: &PropertyBag, b: &PropertyBag) -> PropertyBag {
        let mut difference = PropertyBag::new();

        for (key, value) in a.iter() {
            if self.ignore_keys.contains(key) {
                continue;
            }
            match (value, b.get(key)) {
                (Property::Bag(inner), Some(Property::Bag(other))) => {
                    let nested = self.diff(inner, other);
                    if !nested.is_empty() {
                        difference.insert(key, nested);
                    }
                }
                (Property::List(items), other) if self.is_collection(value, other) => {
                    let other_items = other.and_then(Property::as_list).unwrap_or(&[]);
                    let result = self.collection_diff(items, other_items);
                    if !result.is_empty() {
                        difference.insert(key, result);
                    }
                }
                (value, other) => {
                    if !self.entries_equal(Some(value), other) {
                        difference.insert(key, self.strip(value));
                    }
                }
            }
        }

        for (key, value) in b.iter() {
            if self.ignore_keys.contains(key) || a.contains_key(key) || is_blank(value) {
                continue;
            }
            if value.is_named_collection() {
                let deleted = self.collection_diff(&[], value.as_list().unwrap_or_default());
                difference.insert(key, deleted);
            } else {
                difference.insert(key, Property::Null);
            }
        }

        difference
    }

    fn is_collection(&self, value: &Property, other: Option<&Property>) -> bool {
        value.is_named_collection() || other.map(Property::is_named_collection).unwrap_or(false)
    }

    fn collection_diff(&self, source: &[Property], target: &[Property]) -> PropertyBag {
        let source: Vec<PropertyBag> = source
            .iter()
            .filter_map(Property::as_bag)
            .map(|bag| bag.without(self.ignore_keys))
            .collect();
        let target: Vec<PropertyBag> = target
            .iter()
            .filter_map(Property::as_bag)
            .map(|bag| bag.without(self.ignore_keys))
            .collect();

        let result = NamedCollectionDiffer::new(self.ignore_keys)
            .carry(&[])
            .ignore_whitespace(self.ignore_whitespace)
            .diff(&source, &target);
        if result.is_empty() {
            PropertyBag::new()
        } else {
            result.to_bag()
        }
    }

    fn strip(&self, value: &Property) -> Property {
        match value {
            Property::Bag(bag) => Property::Bag(bag.without(self.ignore_keys)),
            Property::List(items) => Property::List(items.iter().map(|v| self.strip(v)).collect()),
            other => other.clone(),
        }
    }
}

//! Matching of named collections
//!
//! Two sequences of named entities are matched by `name`, never by their
//! server-assigned identifiers, and every element ends up in exactly one of
//! added, changed, deleted or unchanged.

use crate::schema::compare::StructuralComparator;
use crate::schema::types::{DiffResult, KeySet, PropertyBag};

/// Decides from a matched `(source, target)` pair whether it must be recreated
pub type RecreatePredicate = fn(&PropertyBag, &PropertyBag) -> bool;

const DEFAULT_CARRIED: &[&str] = &["oid"];

/// Classifies two named collections into added, changed and deleted items
#[derive(Clone)]
pub struct NamedCollectionDiffer<'a> {
    ignore_keys: &'a KeySet,
    non_editable_keys: &'a [&'a str],
    carried_keys: &'a [&'a str],
    recreate_when: Option<RecreatePredicate>,
    ignore_whitespace: bool,
}

impl<'a> NamedCollectionDiffer<'a> {
    /// Create a differ that ignores `ignore_keys` when comparing matched items
    pub fn new(ignore_keys: &'a KeySet) -> Self {
        Self {
            ignore_keys,
            non_editable_keys: &[],
            carried_keys: DEFAULT_CARRIED,
            recreate_when: None,
            ignore_whitespace: false,
        }
    }

    /// Keys whose change forces a drop and recreate
    pub fn non_editable(mut self, keys: &'a [&'a str]) -> Self {
        self.non_editable_keys = keys;
        self
    }

    /// Keys copied from the matched target onto a changed source item
    pub fn carry(mut self, keys: &'a [&'a str]) -> Self {
        self.carried_keys = keys;
        self
    }

    /// Extra recreate rule evaluated on the original, unstripped pair
    pub fn recreate_when(mut self, predicate: RecreatePredicate) -> Self {
        self.recreate_when = Some(predicate);
        self
    }

    pub fn ignore_whitespace(mut self, ignore: bool) -> Self {
        self.ignore_whitespace = ignore;
        self
    }

    /// Diff `source` against `target`.
    ///
    /// Names are assumed unique within each side.
    pub fn diff(&self, source: &[PropertyBag], target: &[PropertyBag]) -> DiffResult {
        let comparator = StructuralComparator::new(self.ignore_keys, self.ignore_whitespace);
        let mut remaining: Vec<&PropertyBag> = target.iter().collect();
        let mut result = DiffResult::default();

        for item in source {
            let position = item.name().and_then(|name| {
                remaining
                    .iter()
                    .position(|candidate| candidate.name() == Some(name))
            });

            let Some(position) = position else {
                result.added.push(item.clone());
                continue;
            };
            let matched = remaining.remove(position);

            let stripped_source = item.without(self.ignore_keys);
            let stripped_target = matched.without(self.ignore_keys);

            if comparator.are_identical(&stripped_source, &stripped_target) {
                result
                    .unchanged
                    .push(item.name().unwrap_or_default().to_string());
            } else if self.forces_recreate(
                item,
                matched,
                &stripped_source,
                &stripped_target,
                &comparator,
            ) {
                tracing::trace!(name = item.name(), "non-editable change, recreating");
                result.added.push(item.clone());
                result.deleted.push(matched.clone());
            } else {
                let mut updated = item.clone();
                for key in self.carried_keys {
                    if let Some(value) = matched.get(key) {
                        updated.insert(*key, value.clone());
                    }
                }
                result.changed.push(updated);
            }
        }

        result.deleted.extend(remaining.into_iter().cloned());
        result
    }

    fn forces_recreate(
        &self,
        source: &PropertyBag,
        target: &PropertyBag,
        stripped_source: &PropertyBag,
        stripped_target: &PropertyBag,
        comparator: &StructuralComparator<'_>,
    ) -> bool {
        let key_changed = self.non_editable_keys.iter().any(|key| {
            !comparator.entries_equal(stripped_source.get(key), stripped_target.get(key))
        });
        key_changed
            || self
                .recreate_when
                .map(|predicate| predicate(source, target))
                .unwrap_or(false)
    }
}

//! Identifier-Names Registry
//!
//! The rename table shared by every asset in a build run. Global and property
//! identifiers are kept in separate maps; within one registry a given
//! original name maps to exactly one replacement for the lifetime of a run.
//! `merge_by_reference` is the only mutation the orchestrator performs and it
//! is append-only: existing keys are never reassigned.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifierNamesCache {
    pub global_identifiers: HashMap<String, String>,
    pub property_identifiers: HashMap<String, String>,
}

/// Per-category key sequences produced by [`diff`]: the names present in
/// `next` but absent in `prev`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifierNamesDiff {
    pub global_identifiers: Vec<String>,
    pub property_identifiers: Vec<String>,
}

impl IdentifierNamesDiff {
    pub fn is_empty(&self) -> bool {
        self.global_identifiers.is_empty() && self.property_identifiers.is_empty()
    }
}

impl IdentifierNamesCache {
    pub fn new() -> Self {
        IdentifierNamesCache::default()
    }
}

/// Shallow union of two registries into a fresh one; `overrides` wins
/// key-by-key. Absent inputs are treated as empty.
pub fn merge(
    base: Option<&IdentifierNamesCache>,
    overrides: Option<&IdentifierNamesCache>,
) -> IdentifierNamesCache {
    let mut merged = base.cloned().unwrap_or_default();
    if let Some(overrides) = overrides {
        merged
            .global_identifiers
            .extend(overrides.global_identifiers.clone());
        merged
            .property_identifiers
            .extend(overrides.property_identifiers.clone());
    }
    merged
}

/// In-place append-only union: keys present in `overrides` but absent in
/// `target` are added; an existing key's value is never changed. This is the
/// invariant that keeps renames consistent across every asset in a run.
pub fn merge_by_reference(
    target: &mut IdentifierNamesCache,
    overrides: Option<&IdentifierNamesCache>,
) {
    let Some(overrides) = overrides else {
        return;
    };

    for (name, renamed) in &overrides.global_identifiers {
        target
            .global_identifiers
            .entry(name.clone())
            .or_insert_with(|| renamed.clone());
    }

    for (name, renamed) in &overrides.property_identifiers {
        target
            .property_identifiers
            .entry(name.clone())
            .or_insert_with(|| renamed.clone());
    }
}

/// Names present in `next` and absent in `prev`, per category. Used to
/// compute the minimal delta a cache entry has to persist.
pub fn diff(
    prev: &IdentifierNamesCache,
    next: Option<&IdentifierNamesCache>,
) -> IdentifierNamesDiff {
    let Some(next) = next else {
        return IdentifierNamesDiff::default();
    };

    IdentifierNamesDiff {
        global_identifiers: next
            .global_identifiers
            .keys()
            .filter(|name| !prev.global_identifiers.contains_key(*name))
            .cloned()
            .collect(),
        property_identifiers: next
            .property_identifiers
            .keys()
            .filter(|name| !prev.property_identifiers.contains_key(*name))
            .cloned()
            .collect(),
    }
}

/// Extracts the mapping subset of `source` named by `diff`. The persisted
/// cache delta carries actual mappings so a cache hit can replay them into
/// the shared registry.
pub fn select(source: &IdentifierNamesCache, diff: &IdentifierNamesDiff) -> IdentifierNamesCache {
    let mut selected = IdentifierNamesCache::new();

    for name in &diff.global_identifiers {
        if let Some(renamed) = source.global_identifiers.get(name) {
            selected
                .global_identifiers
                .insert(name.clone(), renamed.clone());
        }
    }

    for name in &diff.property_identifiers {
        if let Some(renamed) = source.property_identifiers.get(name) {
            selected
                .property_identifiers
                .insert(name.clone(), renamed.clone());
        }
    }

    selected
}

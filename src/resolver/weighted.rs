// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Candidate weighting.
//!
//! Every script candidate found during collection is wrapped in a
//! [`WeightedResource`] holding three ordering keys:
//!
//! 1. Number of request selectors the candidate consumed. More is better.
//! 2. Method, prefix, and extension weight. More is better.
//! 3. Discovery ordinal. Earlier is better.
//!
//! The ordering is total, because no two candidates of one collection share
//! an ordinal. Comparing equal under the ordering never merges candidates:
//! the same script found under two locations is two members of a
//! [`WeightedSet`].

use crate::resource::Resource;

use std::cmp::Ordering;

/// Servlet registered without method, selectors, or extension.
pub const WEIGHT_LAST_RESORT: i32 = -1;

/// Script name matched no extension and no resource type prefix.
pub const WEIGHT_NONE: i32 = 0;

/// Script name matched the resource type name.
pub const WEIGHT_PREFIX: i32 = 1;

/// Script name matched the request extension.
pub const WEIGHT_EXTENSION: i32 = 2;

/// Script candidate with its ordering keys.
///
/// Has no equality of its own. Two candidates are the same only if they are
/// the same entry of a [`WeightedSet`].
#[derive(Debug, Clone)]
pub struct WeightedResource {
    ordinal: usize,
    num_selectors: usize,
    method_prefix_weight: i32,
    resource: Resource,
}

impl WeightedResource {
    /// Construct new weighted candidate.
    pub fn new(
        ordinal: usize,
        resource: Resource,
        num_selectors: usize,
        method_prefix_weight: i32,
    ) -> Self {
        Self {
            ordinal,
            num_selectors,
            method_prefix_weight,
            resource,
        }
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn num_selectors(&self) -> usize {
        self.num_selectors
    }

    pub fn method_prefix_weight(&self) -> i32 {
        self.method_prefix_weight
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn into_resource(self) -> Resource {
        self.resource
    }

    /// Compare candidates best first.
    ///
    /// [`Ordering::Less`] means `self` should be tried before `other`.
    pub fn compare(&self, other: &Self) -> Ordering {
        other
            .num_selectors
            .cmp(&self.num_selectors)
            .then_with(|| other.method_prefix_weight.cmp(&self.method_prefix_weight))
            .then_with(|| self.ordinal.cmp(&other.ordinal))
    }
}

/// Candidates of one collection, kept best first.
///
/// # Invariant
///
/// - Ordinals are handed out in insertion order and never reused.
/// - Nothing is ever deduplicated.
#[derive(Debug, Default, Clone)]
pub struct WeightedSet {
    entries: Vec<WeightedResource>,
    next_ordinal: usize,
}

impl WeightedSet {
    /// Construct new empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert candidate, giving it the next ordinal.
    pub fn insert(&mut self, resource: Resource, num_selectors: usize, method_prefix_weight: i32) {
        let entry =
            WeightedResource::new(self.next_ordinal, resource, num_selectors, method_prefix_weight);
        self.next_ordinal += 1;

        // INVARIANT: New entry goes after every entry that compares before it.
        let idx = self
            .entries
            .partition_point(|existing| existing.compare(&entry) == Ordering::Less);
        self.entries.insert(idx, entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate candidates best first.
    pub fn iter(&self) -> impl Iterator<Item = &WeightedResource> {
        self.entries.iter()
    }

    /// Unwrap candidates best first.
    pub fn into_resources(self) -> Vec<Resource> {
        self.entries
            .into_iter()
            .map(WeightedResource::into_resource)
            .collect()
    }
}

impl IntoIterator for WeightedSet {
    type Item = WeightedResource;
    type IntoIter = std::vec::IntoIter<WeightedResource>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn script(path: &str) -> Resource {
        Resource::new(path, "nt:file")
    }

    fn ordered_paths(set: &WeightedSet) -> Vec<&str> {
        set.iter().map(|entry| entry.resource().path()).collect()
    }

    #[test]
    fn more_selectors_sort_first() {
        let mut set = WeightedSet::new();
        set.insert(script("/apps/a/html.esp"), 0, WEIGHT_EXTENSION);
        set.insert(script("/apps/a/print.html.esp"), 1, WEIGHT_EXTENSION);
        set.insert(script("/apps/a/print/a4.html.esp"), 2, WEIGHT_NONE);

        assert_eq!(
            ordered_paths(&set),
            [
                "/apps/a/print/a4.html.esp",
                "/apps/a/print.html.esp",
                "/apps/a/html.esp"
            ]
        );
    }

    #[test]
    fn higher_weight_sorts_first_on_selector_tie() {
        let mut set = WeightedSet::new();
        set.insert(script("/apps/a/GET.esp"), 0, WEIGHT_NONE);
        set.insert(script("/apps/a/a.esp"), 0, WEIGHT_PREFIX);
        set.insert(script("/apps/a/a.html.esp"), 0, WEIGHT_EXTENSION + WEIGHT_PREFIX);
        set.insert(script("/apps/a.servlet"), 0, WEIGHT_LAST_RESORT);
        set.insert(script("/apps/a/html.esp"), 0, WEIGHT_EXTENSION);

        assert_eq!(
            ordered_paths(&set),
            [
                "/apps/a/a.html.esp",
                "/apps/a/html.esp",
                "/apps/a/a.esp",
                "/apps/a/GET.esp",
                "/apps/a.servlet"
            ]
        );
    }

    #[test]
    fn earlier_discovery_wins_full_tie() {
        let mut set = WeightedSet::new();
        set.insert(script("/apps/a/html.esp"), 0, WEIGHT_EXTENSION);
        set.insert(script("/libs/a/html.esp"), 0, WEIGHT_EXTENSION);
        set.insert(script("/apps/a/html.esp"), 0, WEIGHT_EXTENSION);

        assert_eq!(set.len(), 3);
        let ordinals: Vec<usize> = set.iter().map(WeightedResource::ordinal).collect();
        assert_eq!(ordinals, [0, 1, 2]);
        assert_eq!(
            ordered_paths(&set),
            ["/apps/a/html.esp", "/libs/a/html.esp", "/apps/a/html.esp"]
        );
    }

    #[test]
    fn compare_is_total() {
        let first = WeightedResource::new(0, script("/apps/a/html.esp"), 1, WEIGHT_NONE);
        let second = WeightedResource::new(1, script("/apps/a/html.esp"), 1, WEIGHT_NONE);

        assert_eq!(first.compare(&second), Ordering::Less);
        assert_eq!(second.compare(&first), Ordering::Greater);
        assert_eq!(first.compare(&first), Ordering::Equal);
    }
}

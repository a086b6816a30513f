// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Script location sequence.
//!
//! Scripts for a resource live below the path of its resource type. Relative
//! resource types are looked up under every search path prefix, absolute
//! ones are used as is. Once a resource type is exhausted, its super type is
//! tried, then the super type of that, and so on until the chain ends. The
//! __base resource type__ (usually `sling/servlet/default`) always comes
//! last.
//!
//! # Example
//!
//! Resource type `foo:bar` without super type, search path `/apps`, `/libs`:
//!
//! 1. `/apps/foo/bar`
//! 2. `/libs/foo/bar`
//! 3. `/apps/sling/servlet/default`
//! 4. `/libs/sling/servlet/default`

use crate::{config::SearchPath, path::resource_type_to_path, resource::ResourceTreeReader};

use std::collections::HashSet;
use tracing::{debug, error};

/// Lazy sequence of locations to search for scripts.
///
/// Yields plain paths without checking that anything exists there. Once
/// exhausted it stays exhausted.
pub struct LocationIterator<'a, R>
where
    R: ResourceTreeReader + ?Sized,
{
    reader: &'a R,
    search_path: &'a SearchPath,
    roots: Vec<&'a str>,
    base_resource_type: String,
    first_resource_type: String,
    first_resource_super_type: Option<String>,
    resource_type: Option<String>,
    relative_path: Option<String>,
    root_index: usize,
    used_resource_types: HashSet<String>,
}

impl<'a, R> LocationIterator<'a, R>
where
    R: ResourceTreeReader + ?Sized,
{
    /// Construct new location sequence.
    ///
    /// The super type given here overrides whatever the reader would report
    /// as super type of `resource_type`. Super types further up the chain
    /// always come from the reader.
    pub fn new(
        resource_type: impl Into<String>,
        resource_super_type: Option<&str>,
        base_resource_type: impl Into<String>,
        search_path: &'a SearchPath,
        reader: &'a R,
    ) -> Self {
        let resource_type = resource_type.into();
        let mut used_resource_types = HashSet::new();
        used_resource_types.insert(resource_type.clone());

        Self {
            reader,
            search_path,
            roots: search_path.roots(),
            base_resource_type: base_resource_type.into(),
            first_resource_type: resource_type.clone(),
            first_resource_super_type: resource_super_type.map(ToOwned::to_owned),
            resource_type: Some(resource_type),
            relative_path: None,
            root_index: 0,
            used_resource_types,
        }
    }

    fn advance_resource_type(&mut self) {
        self.resource_type = match self.resource_type.take() {
            Some(current) => self.super_type_of(&current),
            None => None,
        };
    }

    fn super_type_of(&mut self, resource_type: &str) -> Option<String> {
        if resource_type == self.base_resource_type {
            return None;
        }

        let super_type = match &self.first_resource_super_type {
            Some(super_type) if resource_type == self.first_resource_type => {
                Some(super_type.clone())
            }
            _ => self
                .reader
                .parent_resource_type(resource_type, self.search_path),
        };

        // INVARIANT: Visit each resource type at most once.
        //   - A repeated type means a circular hierarchy, so fall back to base.
        let super_type = match super_type {
            Some(super_type) if self.used_resource_types.contains(&super_type) => {
                if super_type == resource_type {
                    debug!("resource type {resource_type:?} is its own super type");
                } else {
                    error!(
                        "circular dependency in resource type hierarchy detected, \
                         check super types of {super_type:?}"
                    );
                }
                None
            }
            Some(super_type) => {
                self.used_resource_types.insert(super_type.clone());
                Some(super_type)
            }
            None => None,
        };

        Some(super_type.unwrap_or_else(|| self.base_resource_type.clone()))
    }
}

impl<R> Iterator for LocationIterator<'_, R>
where
    R: ResourceTreeReader + ?Sized,
{
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        let relative_path = match self.relative_path.take() {
            Some(relative_path) => relative_path,
            None => {
                let type_path = resource_type_to_path(self.resource_type.as_deref()?);

                // INVARIANT: Absolute resource types skip the search path.
                if type_path.starts_with('/') {
                    self.advance_resource_type();
                    return Some(type_path);
                }

                type_path
            }
        };

        let location = format!("{}{relative_path}", self.roots[self.root_index]);
        self.root_index += 1;
        if self.root_index < self.roots.len() {
            self.relative_path = Some(relative_path);
        } else {
            self.root_index = 0;
            self.advance_resource_type();
        }

        Some(location)
    }
}

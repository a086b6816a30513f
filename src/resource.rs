// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Resource tree access.
//!
//! A __resource__ is a node of the content repository, addressed by an
//! absolute path. Every resource carries a __resource type__ naming the
//! scripts that render it, and optionally a __resource super type__ that
//! scripts are inherited from.
//!
//! Script resolution never owns the repository. It reads it through the
//! [`ResourceTreeReader`] capability, so any backend that can look up a
//! resource by path and list the children of a resource will do.

use crate::{
    config::SearchPath,
    path::{name_of, resource_type_to_path},
};

/// Resource type of placeholder resources standing in for missing paths.
pub const SYNTHETIC_RESOURCE_TYPE: &str = "$synthetic$";

/// Resource type of request targets that do not exist.
pub const NON_EXISTING_RESOURCE_TYPE: &str = "sling:nonexisting";

/// Node of the content repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    path: String,
    resource_type: String,
    resource_super_type: Option<String>,
    synthetic: bool,
}

impl Resource {
    /// Construct new resource.
    pub fn new(path: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            resource_type: resource_type.into(),
            resource_super_type: None,
            synthetic: false,
        }
    }

    /// Set resource super type.
    pub fn with_super_type(mut self, resource_super_type: impl Into<String>) -> Self {
        self.resource_super_type = Some(resource_super_type.into());
        self
    }

    /// Construct placeholder for a path that has no resource.
    ///
    /// Placeholders can still be used to list children, because a missing
    /// intermediate resource does not mean its subtree is empty.
    pub fn synthetic(path: impl Into<String>) -> Self {
        Self::placeholder(path.into(), SYNTHETIC_RESOURCE_TYPE)
    }

    /// Construct placeholder for a request target that does not exist.
    pub fn non_existing(path: impl Into<String>) -> Self {
        Self::placeholder(path.into(), NON_EXISTING_RESOURCE_TYPE)
    }

    fn placeholder(mut path: String, resource_type: &str) -> Self {
        if !path.starts_with('/') {
            path.insert(0, '/');
        }

        Self {
            path,
            resource_type: resource_type.into(),
            resource_super_type: None,
            synthetic: true,
        }
    }

    /// Absolute path of resource.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last segment of resource path.
    pub fn name(&self) -> &str {
        name_of(&self.path)
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn resource_super_type(&self) -> Option<&str> {
        self.resource_super_type.as_deref()
    }

    /// Check if resource is a placeholder without backing content.
    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }
}

/// Read access to a resource tree.
///
/// Implementations must be safe to share between threads that resolve
/// requests concurrently.
pub trait ResourceTreeReader: Send + Sync {
    /// Look up resource at absolute path.
    fn get_resource(&self, path: &str) -> Option<Resource>;

    /// List direct children of resource.
    ///
    /// Must also work for synthetic resources by listing whatever exists
    /// below their path.
    fn list_children(&self, parent: &Resource) -> Vec<Resource>;

    /// Look up resource at path, or synthesize a placeholder for it.
    fn resolve_or_synthesize(&self, path: &str) -> Resource {
        self.get_resource(path)
            .unwrap_or_else(|| Resource::synthetic(path))
    }

    /// Determine super type of a resource type.
    ///
    /// Absolute resource types are looked up directly. Relative ones are
    /// looked up under each search path prefix, and the first resource found
    /// decides, even if it has no super type.
    fn parent_resource_type(
        &self,
        resource_type: &str,
        search_path: &SearchPath,
    ) -> Option<String> {
        let type_path = resource_type_to_path(resource_type);
        let resource = if type_path.starts_with('/') {
            self.get_resource(&type_path)
        } else {
            search_path
                .roots()
                .into_iter()
                .find_map(|root| self.get_resource(&format!("{root}{type_path}")))
        };

        resource.and_then(|resource| resource.resource_super_type().map(ToOwned::to_owned))
    }
}

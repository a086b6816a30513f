// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! In-memory resource tree.
//!
//! A [`MemoryTree`] is the simplest [`ResourceTreeReader`]: an ordered map of
//! absolute paths to resources. It can be built up in code, or loaded from a
//! __content file__ that lists resources in TOML.
//!
//! # Content File Layout
//!
//! ```toml
//! [[resource]]
//! path = "/content/page"
//! type = "foo:bar"
//!
//! [[resource]]
//! path = "/apps/foo/bar/html.esp"
//!
//! [[resource]]
//! path = "/apps/foo/bar"
//! type = "sling:Folder"
//! super_type = "foo/base"
//! ```
//!
//! Ancestors of listed resources exist implicitly as folders.

use crate::{
    path::{normalize, parent_of},
    resource::{Resource, ResourceTreeReader},
};

use serde::Deserialize;
use std::{
    collections::BTreeMap,
    fs::read_to_string,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{debug, instrument};

/// Resource type given to implicit ancestors.
pub const FOLDER_RESOURCE_TYPE: &str = "sling:Folder";

/// Resource type given to listed resources without a type.
pub const FILE_RESOURCE_TYPE: &str = "nt:file";

/// Resource tree held in memory.
///
/// # Invariant
///
/// - Every ancestor of a stored resource is stored as well.
#[derive(Debug, Default, Clone)]
pub struct MemoryTree {
    resources: BTreeMap<String, Resource>,
}

impl MemoryTree {
    /// Construct new empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load tree from content file.
    ///
    /// # Errors
    ///
    /// - Return [`TreeError::Read`] if content file cannot be read.
    /// - Return [`TreeError::Deserialize`] if content file is invalid.
    /// - Return [`TreeError::InvalidPath`] if a listed path is not absolute.
    #[instrument(skip(path), level = "debug")]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        debug!("load content tree: {:?}", path.as_ref().display());
        read_to_string(path.as_ref())
            .map_err(|err| TreeError::Read {
                source: err,
                path: path.as_ref().to_path_buf(),
            })?
            .parse()
    }

    /// Insert resource, replacing any resource at the same path.
    ///
    /// Missing ancestors are created as folders.
    pub fn insert(&mut self, resource: Resource) {
        let mut ancestor = parent_of(resource.path()).map(ToOwned::to_owned);
        while let Some(path) = ancestor {
            ancestor = parent_of(&path).map(ToOwned::to_owned);
            self.resources
                .entry(path.clone())
                .or_insert_with(|| Resource::new(path, FOLDER_RESOURCE_TYPE));
        }

        self.resources.insert(resource.path().to_owned(), resource);
    }

    /// Number of stored resources, implicit ancestors included.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl ResourceTreeReader for MemoryTree {
    fn get_resource(&self, path: &str) -> Option<Resource> {
        self.resources.get(path).cloned()
    }

    fn list_children(&self, parent: &Resource) -> Vec<Resource> {
        let prefix = if parent.path().ends_with('/') {
            parent.path().to_owned()
        } else {
            format!("{}/", parent.path())
        };

        self.resources
            .range(prefix.clone()..)
            .take_while(|(path, _)| path.starts_with(prefix.as_str()))
            .filter(|(path, _)| {
                let rest = &path[prefix.len()..];
                !rest.is_empty() && !rest.contains('/')
            })
            .map(|(_, resource)| resource.clone())
            .collect()
    }
}

impl FromIterator<Resource> for MemoryTree {
    fn from_iter<I: IntoIterator<Item = Resource>>(iter: I) -> Self {
        let mut tree = Self::new();
        for resource in iter {
            tree.insert(resource);
        }
        tree
    }
}

impl FromStr for MemoryTree {
    type Err = TreeError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let layout: ContentLayout = toml::de::from_str(data).map_err(TreeError::Deserialize)?;

        let mut tree = Self::new();
        for entry in layout.resources {
            // INVARIANT: Only store absolute and normalized paths.
            let path = match normalize(&entry.path) {
                Some(path) if path.starts_with('/') => path,
                _ => return Err(TreeError::InvalidPath(entry.path)),
            };

            let mut resource = Resource::new(path, entry.resource_type);
            if let Some(super_type) = entry.super_type {
                resource = resource.with_super_type(super_type);
            }
            tree.insert(resource);
        }

        Ok(tree)
    }
}

#[derive(Debug, Deserialize)]
struct ContentLayout {
    #[serde(rename = "resource", default)]
    resources: Vec<ContentEntry>,
}

#[derive(Debug, Deserialize)]
struct ContentEntry {
    path: String,

    #[serde(rename = "type", default = "default_resource_type")]
    resource_type: String,

    super_type: Option<String>,
}

fn default_resource_type() -> String {
    FILE_RESOURCE_TYPE.into()
}

/// Content tree error types.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// Content file cannot be read.
    #[error("failed to read content file at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Content file cannot be deserialized.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Content file lists a path that is not absolute.
    #[error("resource path {0:?} is not an absolute path")]
    InvalidPath(String),
}

/// Friendly result alias :3
type Result<T, E = TreeError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn paths(resources: Vec<Resource>) -> Vec<String> {
        resources.iter().map(|r| r.path().to_owned()).collect()
    }

    #[test]
    fn insert_creates_ancestors() {
        let tree = MemoryTree::from_iter([Resource::new("/apps/foo/bar/html.esp", "nt:file")]);

        assert_eq!(tree.len(), 5);
        let folder = tree.get_resource("/apps/foo").unwrap();
        assert_eq!(folder.resource_type(), FOLDER_RESOURCE_TYPE);
    }

    #[test]
    fn insert_keeps_existing_ancestor() {
        let mut tree = MemoryTree::new();
        tree.insert(Resource::new("/apps/foo", "foo/base"));
        tree.insert(Resource::new("/apps/foo/html.esp", "nt:file"));

        assert_eq!(tree.get_resource("/apps/foo").unwrap().resource_type(), "foo/base");
    }

    #[test]
    fn list_children_only_direct_children() {
        let tree = MemoryTree::from_iter([
            Resource::new("/apps/foo/bar/html.esp", "nt:file"),
            Resource::new("/apps/foo/bar/print/html.esp", "nt:file"),
            Resource::new("/apps/foo/bar.servlet", "nt:file"),
            Resource::new("/apps/foo/barbaz/GET.esp", "nt:file"),
        ]);

        let children = tree.list_children(&Resource::synthetic("/apps/foo/bar"));
        assert_eq!(
            paths(children),
            ["/apps/foo/bar/html.esp", "/apps/foo/bar/print"]
        );

        let root = tree.list_children(&Resource::synthetic("/"));
        assert_eq!(paths(root), ["/apps"]);

        let nothing = tree.list_children(&Resource::synthetic("/libs"));
        assert!(nothing.is_empty());
    }

    #[test]
    fn parse_content_file() -> anyhow::Result<()> {
        let tree: MemoryTree = indoc! {r#"
            [[resource]]
            path = "/content/page"
            type = "foo:bar"

            [[resource]]
            path = "/apps/foo/bar"
            type = "sling:Folder"
            super_type = "foo/base"

            [[resource]]
            path = "/apps/foo//bar/./html.esp"
        "#}
        .parse()?;

        let page = tree.get_resource("/content/page").unwrap();
        assert_eq!(page.resource_type(), "foo:bar");

        let bar = tree.get_resource("/apps/foo/bar").unwrap();
        assert_eq!(bar.resource_super_type(), Some("foo/base"));

        let script = tree.get_resource("/apps/foo/bar/html.esp").unwrap();
        assert_eq!(script.resource_type(), FILE_RESOURCE_TYPE);

        Ok(())
    }

    #[test]
    fn parse_content_file_rejects_relative_path() {
        let result = indoc! {r#"
            [[resource]]
            path = "apps/foo"
        "#}
        .parse::<MemoryTree>();

        assert!(matches!(result, Err(TreeError::InvalidPath(path)) if path == "apps/foo"));
    }
}

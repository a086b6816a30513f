// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Script candidate collection.
//!
//! A collector visits every location produced by [`LocationIterator`], and
//! gathers the resources below it that could render the request. Each
//! candidate is weighted by how well its name matches the request, and all
//! candidates of all locations end up in a single [`WeightedSet`].
//!
//! # Script Names
//!
//! Script names are matched without their own extension (the script
//! language), so `print.html.esp` is matched as `print.html`. Resources
//! without any dot in their name are never scripts. For a `GET` request with
//! selectors `print.a4` and extension `html` at location `/apps/foo/bar`,
//! matching names include:
//!
//! | Script                 | Selectors | Weight              |
//! |------------------------|-----------|---------------------|
//! | `print/a4.html.esp`    | 2         | extension           |
//! | `print.a4.html.esp`    | 2         | extension           |
//! | `print.html.esp`       | 1         | extension           |
//! | `bar.html.esp`         | 0         | extension + prefix  |
//! | `html.esp`             | 0         | extension           |
//! | `bar.esp`              | 0         | prefix              |
//! | `GET.esp`              | 0         | none                |
//! | `/apps/foo/bar.servlet`| 0         | last resort         |

use crate::{
    config::{ExecutionPaths, ResolverConfig, SearchPath},
    path::join,
    request::ScriptRequest,
    resolver::{
        location::LocationIterator,
        weighted::{WeightedSet, WEIGHT_EXTENSION, WEIGHT_LAST_RESORT, WEIGHT_NONE, WEIGHT_PREFIX},
        DEFAULT_ERROR_HANDLER_RESOURCE_TYPE, DEFAULT_SERVLET_NAME, SERVLET_PATH_EXTENSION,
    },
    resource::{Resource, ResourceTreeReader},
};

use std::hash::{Hash, Hasher};
use tracing::{debug, instrument};

/// Parameters every collector resolves with.
///
/// Two collectors with equal keys search the same locations for the same
/// extension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CollectorKey {
    pub resource_type: String,
    pub resource_super_type: Option<String>,
    pub extension: Option<String>,
    pub base_resource_type: String,
    pub workspace_name: Option<String>,
}

/// Gather weighted script candidates.
pub trait ScriptCollector {
    /// Resolution parameters of collector.
    fn key(&self) -> &CollectorKey;

    /// Allow-list every candidate must pass.
    fn execution_paths(&self) -> &ExecutionPaths;

    /// Gather candidates below a single location.
    fn collect_at<R>(&self, reader: &R, location: &Resource, candidates: &mut WeightedSet)
    where
        R: ResourceTreeReader + ?Sized;

    /// Gather candidates below each location into one set.
    ///
    /// Locations that do not exist are replaced by placeholders, so scripts
    /// further down their subtree are still found.
    fn collect_locations<R>(
        &self,
        reader: &R,
        locations: impl IntoIterator<Item = String>,
    ) -> WeightedSet
    where
        R: ResourceTreeReader + ?Sized,
    {
        let mut candidates = WeightedSet::new();
        for location in locations {
            let path = match location.strip_suffix('/') {
                Some(path) if !path.is_empty() => path,
                _ => location.as_str(),
            };
            let location = reader.resolve_or_synthesize(path);
            self.collect_at(reader, &location, &mut candidates);
        }

        candidates
    }

    /// List script candidates best first.
    ///
    /// An empty listing means that nothing can render the request. It is up
    /// to the caller to decide what that means.
    fn servlets<R>(&self, reader: &R, search_path: &SearchPath) -> Vec<Resource>
    where
        R: ResourceTreeReader + ?Sized,
    {
        let key = self.key();
        let locations = LocationIterator::new(
            key.resource_type.as_str(),
            key.resource_super_type.as_deref(),
            key.base_resource_type.as_str(),
            search_path,
            reader,
        );

        self.collect_locations(reader, locations).into_resources()
    }

    /// Add candidate if its path is allowed to execute.
    fn add_weighted(
        &self,
        candidates: &mut WeightedSet,
        resource: Resource,
        num_selectors: usize,
        method_prefix_weight: i32,
    ) {
        if !self.execution_paths().allows(resource.path()) {
            debug!("candidate {} not in execution paths, ignored", resource.path());
            return;
        }

        candidates.insert(resource, num_selectors, method_prefix_weight);
    }
}

/// Collector for scripts rendering a request.
///
/// Equality and hashing cover the resolution parameters, the method, and the
/// selectors, but not the execution paths.
#[derive(Debug, Clone)]
pub struct ResourceCollector {
    key: CollectorKey,
    method: String,
    selectors: Vec<String>,
    is_get: bool,
    is_default_extension: bool,
    execution_paths: ExecutionPaths,
}

impl ResourceCollector {
    /// Construct new collector for request targeting resource.
    ///
    /// Execution paths and default extensions are taken from `config`.
    pub fn new(request: &ScriptRequest, resource: &Resource, config: &ResolverConfig) -> Self {
        Self {
            key: CollectorKey {
                resource_type: resource.resource_type().to_owned(),
                resource_super_type: resource.resource_super_type().map(ToOwned::to_owned),
                extension: request.extension.clone(),
                base_resource_type: DEFAULT_SERVLET_NAME.into(),
                workspace_name: request.workspace_name.clone(),
            },
            method: request.method.clone(),
            selectors: request.selectors.clone(),
            is_get: request.is_get(),
            is_default_extension: config.is_default_extension(request.extension.as_deref()),
            execution_paths: config.execution_paths.clone(),
        }
    }

    /// Construct new collector for error handler scripts.
    ///
    /// The `name` takes the place of the method, e.g., a status code like
    /// `404` or the name of an error type. Without a base resource type,
    /// `sling/servlet/errorhandler` is used.
    pub fn for_error_handler(
        name: impl Into<String>,
        base_resource_type: Option<&str>,
        resource: &Resource,
        execution_paths: ExecutionPaths,
    ) -> Self {
        Self {
            key: CollectorKey {
                resource_type: resource.resource_type().to_owned(),
                resource_super_type: resource.resource_super_type().map(ToOwned::to_owned),
                extension: None,
                base_resource_type: base_resource_type
                    .unwrap_or(DEFAULT_ERROR_HANDLER_RESOURCE_TYPE)
                    .to_owned(),
                workspace_name: None,
            },
            method: name.into(),
            selectors: Vec::new(),
            is_get: false,
            is_default_extension: false,
            execution_paths,
        }
    }

    /// Count selectors at `depth` that script name spells out.
    ///
    /// Selectors are joined by dots, and must be followed by `.{tail}` if a
    /// tail is given. Returns how many selectors were consumed.
    fn selector_run(&self, script_name: &str, depth: usize, tail: Option<&str>) -> Option<usize> {
        let selectors = self.selectors.get(depth..)?;
        let mut rest = script_name;
        for (idx, selector) in selectors.iter().enumerate() {
            if idx > 0 {
                rest = rest.strip_prefix('.')?;
            }
            rest = rest.strip_prefix(selector.as_str())?;

            let complete = match tail {
                Some(tail) => rest.strip_prefix('.') == Some(tail),
                None => rest.is_empty(),
            };
            if complete {
                return Some(idx + 1);
            }
        }

        None
    }

    /// Weigh script name at selector depth.
    ///
    /// Returns consumed selectors and weight, or `None` if the script does
    /// not apply to the request. Rules are tried in order, first match wins.
    fn classify(&self, script_name: &str, depth: usize, parent_name: &str) -> Option<(usize, i32)> {
        let extension = self.key.extension.as_deref();

        if self.is_get {
            let run = extension.and_then(|ext| self.selector_run(script_name, depth, Some(ext)));
            if let Some(run) = run {
                return Some((depth + run, WEIGHT_EXTENSION));
            }
        }

        if let Some(ext) = extension {
            let rest = script_name
                .strip_prefix(parent_name)
                .and_then(|rest| rest.strip_prefix('.'));
            if rest == Some(ext) {
                return Some((depth, WEIGHT_EXTENSION + WEIGHT_PREFIX));
            }

            if script_name == ext {
                return Some((depth, WEIGHT_EXTENSION));
            }
        }

        if self.is_get && self.is_default_extension {
            if let Some(run) = self.selector_run(script_name, depth, None) {
                return Some((depth + run, WEIGHT_NONE));
            }

            if script_name == parent_name {
                return Some((depth, WEIGHT_PREFIX));
            }
        }

        if let Some(run) = self.selector_run(script_name, depth, Some(&self.method)) {
            return Some((depth + run, WEIGHT_NONE));
        }

        if script_name == self.method {
            return Some((depth, WEIGHT_NONE));
        }

        None
    }
}

impl ScriptCollector for ResourceCollector {
    fn key(&self) -> &CollectorKey {
        &self.key
    }

    fn execution_paths(&self) -> &ExecutionPaths {
        &self.execution_paths
    }

    #[instrument(
        skip(self, reader, candidates),
        fields(location = location.path()),
        level = "debug"
    )]
    fn collect_at<R>(&self, reader: &R, location: &Resource, candidates: &mut WeightedSet)
    where
        R: ResourceTreeReader + ?Sized,
    {
        let mut current = location.clone();
        let mut parent_name = location.name().to_owned();
        let mut depth = 0;

        loop {
            for child in reader.list_children(&current) {
                // INVARIANT: Only names with an extension can be scripts.
                let Some((script_name, _)) = child.name().rsplit_once('.') else {
                    continue;
                };

                if let Some((num_selectors, weight)) =
                    self.classify(script_name, depth, &parent_name)
                {
                    self.add_weighted(candidates, child, num_selectors, weight);
                }
            }

            let Some(selector) = self.selectors.get(depth) else {
                break;
            };
            current = reader.resolve_or_synthesize(&join(current.path(), selector));
            parent_name = selector.clone();
            depth += 1;
        }

        // INVARIANT: Servlets without method, extension, and selectors come last.
        let servlet_path = format!("{}{SERVLET_PATH_EXTENSION}", location.path());
        if let Some(servlet) = reader.get_resource(&servlet_path) {
            self.add_weighted(candidates, servlet, 0, WEIGHT_LAST_RESORT);
        }
    }
}

impl PartialEq for ResourceCollector {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.method == other.method
            && self.selectors == other.selectors
            && self.is_get == other.is_get
            && self.is_default_extension == other.is_default_extension
    }
}

impl Eq for ResourceCollector {}

impl Hash for ResourceCollector {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
        self.method.hash(state);
        self.selectors.hash(state);
        self.is_get.hash(state);
        self.is_default_extension.hash(state);
    }
}

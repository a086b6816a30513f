// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Script lookup by name.
//!
//! Sometimes a script is needed without any request to go with it, e.g., a
//! page component that includes `header.html` or `parts/header`. Such a
//! __script name__ is resolved against the same locations as a request
//! would be, but only scripts carrying that name are candidates.

use crate::{
    config::ExecutionPaths,
    path::join,
    resolver::{
        collector::{CollectorKey, ScriptCollector},
        weighted::{WeightedSet, WEIGHT_EXTENSION, WEIGHT_PREFIX},
        DEFAULT_SERVLET_NAME,
    },
    resource::{Resource, ResourceTreeReader},
};

use tracing::instrument;

/// Collector for scripts with a given name.
#[derive(Debug, Clone)]
pub struct NamedScriptCollector {
    key: CollectorKey,
    script_name: String,
    directory: Option<String>,
    file_name: String,
    execution_paths: ExecutionPaths,
}

impl NamedScriptCollector {
    /// Construct new collector for script name.
    ///
    /// Without a resource, only the bare search path prefixes are searched.
    /// The extension of a script name starts at the first dot of its last
    /// segment, so `parts/header.print.html` has extension `print.html`.
    pub fn new(
        script_name: impl Into<String>,
        resource: Option<&Resource>,
        execution_paths: ExecutionPaths,
    ) -> Self {
        let script_name = script_name.into();
        let (directory, file_name) = match script_name.rsplit_once('/') {
            Some((directory, file_name)) => (Some(directory.to_owned()), file_name.to_owned()),
            None => (None, script_name.clone()),
        };
        let extension = file_name
            .split_once('.')
            .map(|(_, extension)| extension.to_owned());

        let key = match resource {
            Some(resource) => CollectorKey {
                resource_type: resource.resource_type().to_owned(),
                resource_super_type: resource.resource_super_type().map(ToOwned::to_owned),
                extension,
                base_resource_type: DEFAULT_SERVLET_NAME.into(),
                workspace_name: None,
            },
            None => CollectorKey {
                extension,
                ..Default::default()
            },
        };

        Self {
            key,
            script_name,
            directory,
            file_name,
            execution_paths,
        }
    }
}

impl ScriptCollector for NamedScriptCollector {
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
        if self.key.extension.is_some() {
            if let Some(script) = reader.get_resource(&join(location.path(), &self.script_name)) {
                self.add_weighted(candidates, script, 0, WEIGHT_EXTENSION);
            }
        }

        let directory = match &self.directory {
            Some(directory) => reader.resolve_or_synthesize(&join(location.path(), directory)),
            None => location.clone(),
        };

        for child in reader.list_children(&directory) {
            let matches = child
                .name()
                .rsplit_once('.')
                .is_some_and(|(name, _)| name == self.file_name);
            if matches {
                self.add_weighted(candidates, child, 0, WEIGHT_PREFIX);
            }
        }
    }
}

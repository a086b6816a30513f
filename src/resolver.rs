// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Script resolution.
//!
//! The [`ServletResolver`] decides which script renders a request. It asks a
//! collector for every candidate in best first order, and offers each one to
//! a caller supplied __judge__ until a candidate takes the request. What it
//! means to execute a script is up to the caller.
//!
//! # Resolution Cache
//!
//! Resolving the same resource type with the same selectors, extension, and
//! method always yields the same candidates. Winners are therefore kept in a
//! bounded cache keyed by the collector that found them. A winner is only
//! cached if its acceptance did not depend on the request itself, i.e., it
//! accepted unconditionally and no conditional candidate came before it.

pub mod collector;
pub mod location;
pub mod named;
pub mod weighted;

use crate::{
    config::ResolverConfig,
    path::normalize,
    request::ScriptRequest,
    resolver::{
        collector::{ResourceCollector, ScriptCollector},
        named::NamedScriptCollector,
    },
    resource::{Resource, ResourceTreeReader},
    tree::MemoryTree,
};

use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};
use tracing::{debug, info, instrument, warn};

/// Resource type rendering anything no other script renders.
pub const DEFAULT_SERVLET_NAME: &str = "sling/servlet/default";

/// Resource type error handler scripts fall back to.
pub const DEFAULT_ERROR_HANDLER_RESOURCE_TYPE: &str = "sling/servlet/errorhandler";

/// Error handler name tried after every requested name failed.
pub const DEFAULT_ERROR_HANDLER_NAME: &str = "default";

/// Suffix of servlets registered without method, selectors, or extension.
pub const SERVLET_PATH_EXTENSION: &str = ".servlet";

/// Verdict of a judge on a script candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Candidacy {
    /// Candidate takes every request it is offered.
    Accepts,

    /// Candidate takes this request, but might not take the next one.
    AcceptsConditionally,

    /// Candidate turned down this request, but might take the next one.
    Declines,

    /// Candidate cannot be executed at all.
    NotExecutable,
}

impl Candidacy {
    pub fn is_accepted(self) -> bool {
        matches!(self, Self::Accepts | Self::AcceptsConditionally)
    }
}

/// Resolve scripts for requests over a resource tree.
///
/// Safe to share between threads, as long as the reader is.
pub struct ServletResolver<R = MemoryTree>
where
    R: ResourceTreeReader,
{
    config: ResolverConfig,
    reader: R,
    cache: Option<Mutex<ResolutionCache>>,
}

impl<R> ServletResolver<R>
where
    R: ResourceTreeReader,
{
    /// Construct new resolver.
    ///
    /// Resolution cache is only enabled if the configured cache size is
    /// large enough.
    pub fn new(config: ResolverConfig, reader: R) -> Self {
        let cache = config
            .cache_enabled()
            .then(|| Mutex::new(ResolutionCache::new(config.cache_size)));

        Self {
            config,
            reader,
            cache,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Construct collector for request targeting resource.
    pub fn collector(&self, request: &ScriptRequest, resource: &Resource) -> ResourceCollector {
        ResourceCollector::new(request, resource, &self.config)
    }

    /// List every script candidate for request, best first.
    #[instrument(
        skip(self, request, resource),
        fields(resource = resource.path()),
        level = "debug"
    )]
    pub fn candidates(&self, request: &ScriptRequest, resource: &Resource) -> Vec<Resource> {
        self.collector(request, resource)
            .servlets(&self.reader, &self.config.search_paths)
    }

    /// Resolve script rendering request.
    ///
    /// A resource with an absolute resource type names its script directly.
    /// If that script exists, may execute, and is accepted by `judge`, it is
    /// used without any further search. Otherwise, candidates are offered to
    /// `judge` best first.
    ///
    /// Returns `None` if no candidate accepted the request.
    #[instrument(
        skip(self, request, resource, judge),
        fields(resource = resource.path()),
        level = "debug"
    )]
    pub fn resolve_servlet<F>(
        &self,
        request: &ScriptRequest,
        resource: &Resource,
        mut judge: F,
    ) -> Option<Resource>
    where
        F: FnMut(&Resource) -> Candidacy,
    {
        let resource_type = resource.resource_type();
        if resource_type.starts_with('/') {
            if let Some(script) = self.lookup_allowed(resource_type) {
                if judge(&script).is_accepted() {
                    debug!("script {} found using absolute resource type", script.path());
                    return Some(script);
                }
            }
        }

        let script = self.select(self.collector(request, resource), &mut judge);
        match &script {
            Some(script) => {
                debug!("using script {} for resource {}", script.path(), resource.path())
            }
            None => info!("no script found for resource {}", resource.path()),
        }

        script
    }

    /// Resolve error handler script for resource.
    ///
    /// Each name is tried in order, e.g., a status code, or an error type
    /// followed by its more general error types. If none resolves, the
    /// `default` error handler is tried last.
    #[instrument(
        skip(self, names, resource, judge),
        fields(resource = resource.path()),
        level = "debug"
    )]
    pub fn resolve_error_handler<F>(
        &self,
        names: impl IntoIterator<Item = impl AsRef<str>>,
        resource: &Resource,
        mut judge: F,
    ) -> Option<Resource>
    where
        F: FnMut(&Resource) -> Candidacy,
    {
        let names = names
            .into_iter()
            .map(|name| name.as_ref().to_owned())
            .chain(std::iter::once(DEFAULT_ERROR_HANDLER_NAME.to_owned()));

        for name in names {
            let collector = ResourceCollector::for_error_handler(
                name.as_str(),
                None,
                resource,
                self.config.execution_paths.clone(),
            );

            if let Some(handler) = self.select(collector, &mut judge) {
                debug!("using error handler {} for {name:?}", handler.path());
                return Some(handler);
            }
        }

        info!("no error handler found for resource {}", resource.path());
        None
    }

    /// Find script by name.
    ///
    /// Absolute names are looked up as is. Relative names are looked up
    /// under each search path prefix, and the first existing script wins.
    #[instrument(skip(self), level = "debug")]
    pub fn find_script(&self, name: &str) -> Option<Resource> {
        let script = if name.starts_with('/') {
            self.lookup_allowed(name)
        } else {
            self.config
                .search_paths
                .roots()
                .into_iter()
                .find_map(|root| self.lookup_allowed(&format!("{root}{name}")))
        };

        match &script {
            Some(script) => debug!("using script {} for {name:?}", script.path()),
            None => info!("no script {name:?} found in search path"),
        }

        script
    }

    /// List every script carrying name, best first.
    ///
    /// With a resource, the locations of its resource type are searched.
    /// Without one, only the bare search path prefixes are.
    #[instrument(skip(self, resource), level = "debug")]
    pub fn named_candidates(&self, name: &str, resource: Option<&Resource>) -> Vec<Resource> {
        NamedScriptCollector::new(name, resource, self.config.execution_paths.clone())
            .servlets(&self.reader, &self.config.search_paths)
    }

    /// Drop every cached resolution.
    pub fn flush_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.lock().unwrap_or_else(PoisonError::into_inner).clear();
            debug!("resolution cache flushed");
        }
    }

    /// Number of cached resolutions.
    pub fn cache_len(&self) -> usize {
        self.cache
            .as_ref()
            .map_or(0, |cache| cache.lock().unwrap_or_else(PoisonError::into_inner).len())
    }

    fn lookup_allowed(&self, path: &str) -> Option<Resource> {
        let path = normalize(path)?;
        if !self.config.execution_paths.allows(&path) {
            debug!("script {path} not in execution paths, ignored");
            return None;
        }

        self.reader.get_resource(&path)
    }

    fn select<F>(&self, collector: ResourceCollector, judge: &mut F) -> Option<Resource>
    where
        F: FnMut(&Resource) -> Candidacy,
    {
        if let Some(cache) = &self.cache {
            let cache = cache.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(script) = cache.get(&collector) {
                debug!("using cached script {}", script.path());
                return Some(script.clone());
            }
        }

        let candidates = collector.servlets(&self.reader, &self.config.search_paths);
        if candidates.is_empty() {
            debug!("no script candidates found");
        }
        for candidate in &candidates {
            debug!("script candidate: {}", candidate.path());
        }

        let mut conditional_seen = false;
        for candidate in candidates {
            match judge(&candidate) {
                Candidacy::Accepts => {
                    // INVARIANT: Only cache winners that do not depend on the request.
                    if !conditional_seen {
                        if let Some(cache) = &self.cache {
                            cache
                                .lock()
                                .unwrap_or_else(PoisonError::into_inner)
                                .insert(collector, candidate.clone());
                        }
                    }
                    return Some(candidate);
                }
                Candidacy::AcceptsConditionally => return Some(candidate),
                Candidacy::Declines => {
                    conditional_seen = true;
                    debug!("candidate {} does not accept request, ignored", candidate.path());
                }
                Candidacy::NotExecutable => {
                    debug!("candidate {} is not executable, ignored", candidate.path());
                }
            }
        }

        None
    }
}

/// Bounded map of collectors to the scripts they resolved.
#[derive(Debug)]
struct ResolutionCache {
    entries: HashMap<ResourceCollector, Resource>,
    capacity: usize,
    full_logged: bool,
}

impl ResolutionCache {
    fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity,
            full_logged: false,
        }
    }

    fn get(&self, collector: &ResourceCollector) -> Option<&Resource> {
        self.entries.get(collector)
    }

    fn insert(&mut self, collector: ResourceCollector, script: Resource) {
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&collector) {
            if !self.full_logged {
                warn!(
                    "resolution cache is full at {} entries, consider increasing cache size",
                    self.capacity
                );
                self.full_logged = true;
            }
            return;
        }

        self.entries.insert(collector, script);
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.full_logged = false;
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

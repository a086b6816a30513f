// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Script resolution over hierarchical content.
//!
//! Content lives in a tree of __resources__, each carrying a __resource
//! type__. Scripts rendering a resource live below the path of its resource
//! type, under one of several __search path__ prefixes like `/apps` and
//! `/libs`. Given a request for a resource, oxisling determines which
//! scripts could render it, and in what order they should be tried.
//!
//! # Resolution In Short
//!
//! 1. [`LocationIterator`] lists every location to search: the resource
//!    type, its super types, and a base resource type, each under every
//!    search path prefix.
//! 2. [`ResourceCollector`] weighs the scripts below each location against
//!    the method, selectors, and extension of the request.
//! 3. [`ServletResolver`] offers the weighted candidates best first to the
//!    caller until one of them accepts the request.

pub mod config;
pub mod path;
pub mod request;
pub mod resolver;
pub mod resource;
pub mod tree;

pub use config::{ExecutionPaths, ResolverConfig, SearchPath};
pub use request::{split_request_path, ScriptRequest};
pub use resolver::{
    collector::{ResourceCollector, ScriptCollector},
    location::LocationIterator,
    named::NamedScriptCollector,
    weighted::{WeightedResource, WeightedSet},
    Candidacy, ServletResolver,
};
pub use resource::{Resource, ResourceTreeReader};
pub use tree::MemoryTree;

// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Request information relevant to script resolution.
//!
//! Script resolution only cares about four things of an incoming request:
//! its method, its __selectors__, its __extension__, and the workspace it
//! targets. Everything else belongs to the caller.
//!
//! # Request Path Decomposition
//!
//! A request path like `/content/page.print.a4.html/extra` is made of a
//! resource path (`/content/page`), followed by __path info__
//! (`.print.a4.html/extra`). The path info holds dot separated selectors
//! (`print`, `a4`), the extension (`html`), and a suffix (`/extra`).

use crate::resource::{Resource, ResourceTreeReader};

/// Request as seen by script resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptRequest {
    /// Request method, e.g., `GET` or `POST`.
    pub method: String,

    /// Selectors in request order.
    pub selectors: Vec<String>,

    /// Request extension without leading dot.
    pub extension: Option<String>,

    /// Suffix following the extension, with leading slash.
    pub suffix: Option<String>,

    /// Workspace the request targets.
    pub workspace_name: Option<String>,
}

impl ScriptRequest {
    /// Construct new request without selectors and extension.
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            ..Default::default()
        }
    }

    /// Decompose path info into selectors, extension, and suffix.
    ///
    /// The last dot separated segment is the extension, every segment before
    /// it is a selector. Path info starting with a slash is all suffix.
    pub fn from_path_info(method: impl Into<String>, path_info: &str) -> Self {
        let (dotted, suffix) = match path_info.find('/') {
            Some(idx) => (&path_info[..idx], Some(path_info[idx..].to_owned())),
            None => (path_info, None),
        };

        let mut segments: Vec<String> = dotted
            .split('.')
            .filter(|segment| !segment.is_empty())
            .map(ToOwned::to_owned)
            .collect();
        let extension = segments.pop();

        Self {
            method: method.into(),
            selectors: segments,
            extension,
            suffix,
            workspace_name: None,
        }
    }

    pub fn with_selectors(
        mut self,
        selectors: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.selectors = selectors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    pub fn with_workspace(mut self, workspace_name: impl Into<String>) -> Self {
        self.workspace_name = Some(workspace_name.into());
        self
    }

    /// Check if request only reads, i.e., is a GET or HEAD request.
    pub fn is_get(&self) -> bool {
        matches!(self.method.as_str(), "GET" | "HEAD")
    }
}

/// Split request path into target resource and path info.
///
/// The full path is tried first. After that the path is cut at each dot from
/// right to left, and the first prefix that exists is the target resource.
/// If no prefix exists, the path is cut at its first dot, and a
/// non-existing resource stands in for the target.
pub fn split_request_path<R>(reader: &R, path: &str) -> (Resource, String)
where
    R: ResourceTreeReader + ?Sized,
{
    if let Some(resource) = reader.get_resource(path) {
        return (resource, String::new());
    }

    for (idx, _) in path.rmatch_indices('.') {
        if let Some(resource) = reader.get_resource(&path[..idx]) {
            return (resource, path[idx..].to_owned());
        }
    }

    let cut = path.find('.').unwrap_or(path.len());
    (Resource::non_existing(&path[..cut]), path[cut..].to_owned())
}

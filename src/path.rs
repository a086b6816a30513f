// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Repository paths are plain `/` separated strings rooted at `/`, e.g.,
//! `/apps/foo/bar/html.esp`. They never touch the local file system, so they
//! are kept as [`String`] instead of [`PathBuf`]. The only local path this
//! module knows about is the location of the resolver configuration file.

use std::path::PathBuf;

/// Determine default absolute path to resolver configuration file.
///
/// Uses XDG Base Directory path `$XDG_CONFIG_HOME/oxisling/config.toml` as the
/// default. Does not check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if configuration directory cannot be determined.
///
/// # See Also
///
/// - [XDG Base Directory](https://wiki.archlinux.org/title/XDG_Base_Directory)
pub fn default_config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|path| path.join("oxisling").join("config.toml"))
        .ok_or(NoWayHome)
}

/// Normalize repository path.
///
/// Drops empty and `.` segments, and applies `..` segments to the segment
/// before them. A leading slash is kept, a trailing slash is not.
///
/// Returns `None` if a `..` segment would climb above the root.
pub fn normalize(path: &str) -> Option<String> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop()?;
            }
            _ => segments.push(segment),
        }
    }

    let mut normalized = segments.join("/");
    if path.starts_with('/') {
        normalized.insert(0, '/');
    }

    Some(normalized)
}

/// Last segment of repository path.
///
/// The root path `/` has an empty name.
pub fn name_of(path: &str) -> &str {
    let path = path.strip_suffix('/').unwrap_or(path);
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Parent of repository path.
///
/// Returns `None` for the root path, and for relative paths with a single
/// segment.
pub fn parent_of(path: &str) -> Option<&str> {
    let path = path.strip_suffix('/').unwrap_or(path);
    match path.rfind('/') {
        Some(0) if path.len() > 1 => Some("/"),
        Some(0) => None,
        Some(idx) => Some(&path[..idx]),
        None => None,
    }
}

/// Append child name to repository path.
pub fn join(parent: &str, child: &str) -> String {
    if parent.ends_with('/') {
        format!("{parent}{child}")
    } else {
        format!("{parent}/{child}")
    }
}

/// Convert resource type to relative or absolute repository path.
///
/// Absolute resource types are returned verbatim. For relative resource
/// types, namespace separators (`:`) in the first segment become slashes,
/// so `foo:bar` maps to `foo/bar`.
pub fn resource_type_to_path(resource_type: &str) -> String {
    if resource_type.starts_with('/') {
        return resource_type.to_owned();
    }

    match resource_type.split_once('/') {
        Some((head, tail)) => format!("{}/{tail}", head.replace(':', "/")),
        None => resource_type.replace(':', "/"),
    }
}

/// No way to determine user's configuration directory.
///
/// # See Also
///
/// - [`dirs::config_dir`](https://docs.rs/dirs/latest/dirs/fn.config_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's configuration directory")]
pub struct NoWayHome;

/// Friendly result alias :3
pub type Result<T, E = NoWayHome> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq as pretty_assert_eq;
    use simple_test_case::test_case;

    #[test_case("/apps/foo/bar", Some("/apps/foo/bar"); "already normal")]
    #[test_case("/apps//foo/./bar/", Some("/apps/foo/bar"); "empty and dot segments")]
    #[test_case("/apps/foo/../bar", Some("/apps/bar"); "parent segment")]
    #[test_case("/apps/../../bar", None; "climbs above root")]
    #[test_case("foo/bar", Some("foo/bar"); "relative")]
    #[test_case("/", Some("/"); "root")]
    #[test]
    fn normalize_paths(input: &str, expect: Option<&str>) {
        pretty_assert_eq!(normalize(input).as_deref(), expect);
    }

    #[test_case("/apps/foo/bar", "bar"; "nested")]
    #[test_case("/apps/", "apps"; "trailing slash")]
    #[test_case("/", ""; "root")]
    #[test_case("html.esp", "html.esp"; "bare name")]
    #[test]
    fn name_of_paths(input: &str, expect: &str) {
        pretty_assert_eq!(name_of(input), expect);
    }

    #[test_case("/apps/foo", Some("/apps"); "nested")]
    #[test_case("/apps", Some("/"); "top level")]
    #[test_case("/", None; "root")]
    #[test_case("apps", None; "single relative segment")]
    #[test]
    fn parent_of_paths(input: &str, expect: Option<&str>) {
        pretty_assert_eq!(parent_of(input), expect);
    }

    #[test_case("foo:bar", "foo/bar"; "namespaced")]
    #[test_case("foo/bar", "foo/bar"; "plain")]
    #[test_case("/foo/bar", "/foo/bar"; "absolute")]
    #[test_case("foo:bar/baz:qux", "foo/bar/baz:qux"; "namespace only in first segment")]
    #[test_case("", ""; "empty")]
    #[test]
    fn resource_type_paths(input: &str, expect: &str) {
        pretty_assert_eq!(resource_type_to_path(input), expect);
    }

    #[test]
    fn join_paths() {
        pretty_assert_eq!(join("/apps/", "foo"), "/apps/foo");
        pretty_assert_eq!(join("/apps", "foo"), "/apps/foo");
    }
}

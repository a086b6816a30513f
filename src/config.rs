// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the resolver configuration file, and the two path
//! lists that steer script resolution: the __search path__ and the
//! __execution paths__.
//!
//! # General Layout
//!
//! ```toml
//! search_paths = ["/apps", "/libs"]
//! execution_paths = ["/apps/", "/libs/"]
//! default_extensions = ["html"]
//! cache_size = 200
//! ```
//!
//! Every field is optional. Environment variables inside path entries are
//! expanded while parsing.

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    fs::read_to_string,
    io::ErrorKind,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{debug, instrument};

/// Cache sizes at or below this value disable the resolution cache.
pub const MIN_CACHE_SIZE: usize = 5;

/// Resolver configuration layout.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Ordered path prefixes to resolve relative resource types against.
    pub search_paths: SearchPath,

    /// Paths that scripts are allowed to execute from.
    pub execution_paths: ExecutionPaths,

    /// Extensions whose scripts may be named after the resource type alone.
    pub default_extensions: Vec<String>,

    /// Maximum number of cached resolutions.
    pub cache_size: usize,
}

impl ResolverConfig {
    /// Load configuration file.
    ///
    /// A missing file is not an error, the default configuration is used
    /// instead.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Read`] if file exists but cannot be read.
    /// - Return [`ConfigError::Deserialize`] if file content is invalid, or
    ///   if shell expansion of a path fails.
    #[instrument(skip(path), level = "debug")]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        match read_to_string(path.as_ref()) {
            Ok(content) => content.parse(),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(
                    "no configuration at {:?}, using defaults",
                    path.as_ref().display()
                );
                Ok(Self::default())
            }
            Err(err) => Err(ConfigError::Read {
                source: err,
                path: path.as_ref().to_path_buf(),
            }),
        }
    }

    /// Check if resolution cache should be used.
    pub fn cache_enabled(&self) -> bool {
        self.cache_size > MIN_CACHE_SIZE
    }

    /// Check if extension uses default script naming.
    pub fn is_default_extension(&self, extension: Option<&str>) -> bool {
        extension.is_some_and(|ext| self.default_extensions.iter().any(|default| default == ext))
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            search_paths: SearchPath::new(["/apps", "/libs"]),
            execution_paths: ExecutionPaths::default(),
            default_extensions: vec!["html".into()],
            cache_size: 200,
        }
    }
}

impl FromStr for ResolverConfig {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        toml::de::from_str(data).map_err(ConfigError::Deserialize)
    }
}

impl Display for ResolverConfig {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

fn expand_all(entries: &[String]) -> Result<Vec<String>> {
    entries
        .iter()
        .map(|entry| {
            shellexpand::full(entry)
                .map(|expanded| expanded.into_owned())
                .map_err(ConfigError::ShellExpansion)
        })
        .collect()
}

/// Ordered listing of path prefixes.
///
/// Relative resource types are resolved against each prefix in turn, and
/// earlier prefixes take precedence over later ones.
///
/// # Invariant
///
/// - Every prefix is absolute and ends with a slash.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct SearchPath(Vec<String>);

impl SearchPath {
    /// Construct new search path.
    ///
    /// Entries are made absolute and given exactly one leading and one
    /// trailing slash. Empty entries are dropped.
    pub fn new(prefixes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let prefixes = prefixes
            .into_iter()
            .map(Into::into)
            .filter(|prefix| !prefix.is_empty())
            .map(|prefix| match prefix.trim_matches('/') {
                "" => "/".to_owned(),
                trimmed => format!("/{trimmed}/"),
            })
            .collect();

        Self(prefixes)
    }

    /// Configured prefixes in precedence order.
    pub fn prefixes(&self) -> &[String] {
        &self.0
    }

    /// Prefixes to iterate over.
    ///
    /// An empty search path behaves like a search path holding only the
    /// root.
    pub fn roots(&self) -> Vec<&str> {
        if self.0.is_empty() {
            vec!["/"]
        } else {
            self.0.iter().map(String::as_str).collect()
        }
    }
}

/// Allow-list of paths that scripts may execute from.
///
/// An entry ending with a slash allows its whole subtree. Any other entry
/// only allows the exact path.
///
/// # Invariant
///
/// - An empty list, or a list holding an empty entry or the root, allows
///   everything.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Deserialize, Serialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ExecutionPaths(Vec<String>);

impl ExecutionPaths {
    /// Construct new execution path allow-list.
    pub fn new(entries: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(entries.into_iter().map(Into::into).collect())
    }

    /// Allow-list that allows every path.
    pub fn unrestricted() -> Self {
        Self(Vec::new())
    }

    /// Configured entries.
    pub fn entries(&self) -> &[String] {
        &self.0
    }

    /// Check if allow-list allows every path.
    pub fn is_unrestricted(&self) -> bool {
        self.0.is_empty() || self.0.iter().any(|entry| entry.is_empty() || entry == "/")
    }

    /// Check if script at path is allowed to execute.
    pub fn allows(&self, path: &str) -> bool {
        if self.is_unrestricted() {
            return true;
        }

        if path.is_empty() {
            return false;
        }

        self.0.iter().any(|entry| {
            if entry.ends_with('/') {
                path.starts_with(entry.as_str())
            } else {
                path == entry
            }
        })
    }
}

// INVARIANT: Deserialized search paths are expanded and normalized.
impl TryFrom<Vec<String>> for SearchPath {
    type Error = ConfigError;

    fn try_from(prefixes: Vec<String>) -> Result<Self, Self::Error> {
        Ok(Self::new(expand_all(&prefixes)?))
    }
}

impl From<SearchPath> for Vec<String> {
    fn from(search_path: SearchPath) -> Self {
        search_path.0
    }
}

// INVARIANT: Deserialized execution paths are expanded, but kept verbatim otherwise.
//   - A trailing slash is meaningful for execution paths.
impl TryFrom<Vec<String>> for ExecutionPaths {
    type Error = ConfigError;

    fn try_from(entries: Vec<String>) -> Result<Self, Self::Error> {
        Ok(Self::new(expand_all(&entries)?))
    }
}

impl From<ExecutionPaths> for Vec<String> {
    fn from(execution_paths: ExecutionPaths) -> Self {
        execution_paths.0
    }
}

impl Default for ExecutionPaths {
    fn default() -> Self {
        Self(vec!["/".into()])
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read configuration at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq as pretty_assert_eq;
    use sealed_test::prelude::*;
    use simple_test_case::test_case;

    #[sealed_test(env = [("SITE_ROOT", "/apps/site")])]
    fn deserialize_resolver_config() -> anyhow::Result<()> {
        let result: ResolverConfig = r#"
            search_paths = ["$SITE_ROOT", "libs"]
            execution_paths = ["$SITE_ROOT/", "/libs/sling/servlet/default.servlet"]
            default_extensions = ["html", "txt"]
            cache_size = 10
        "#
        .parse()?;

        let expect = ResolverConfig {
            search_paths: SearchPath::new(["/apps/site/", "/libs/"]),
            execution_paths: ExecutionPaths::new([
                "/apps/site/",
                "/libs/sling/servlet/default.servlet",
            ]),
            default_extensions: vec!["html".into(), "txt".into()],
            cache_size: 10,
        };

        pretty_assert_eq!(result, expect);

        Ok(())
    }

    #[test]
    fn deserialize_empty_config_uses_defaults() -> anyhow::Result<()> {
        let result: ResolverConfig = "".parse()?;
        pretty_assert_eq!(result, ResolverConfig::default());
        pretty_assert_eq!(result.search_paths.prefixes(), ["/apps/", "/libs/"]);
        assert!(result.execution_paths.is_unrestricted());
        assert!(result.cache_enabled());

        Ok(())
    }

    #[test]
    fn embedded_config_normalizes_search_paths() -> anyhow::Result<()> {
        #[derive(Debug, Deserialize)]
        struct Settings {
            resolver: ResolverConfig,
        }

        let result: Settings = toml::de::from_str(
            r#"
            [resolver]
            search_paths = ["/apps", "libs", "//custom//"]
            execution_paths = ["/apps/"]
        "#,
        )?;

        pretty_assert_eq!(
            result.resolver.search_paths.prefixes(),
            ["/apps/", "/libs/", "/custom/"]
        );
        pretty_assert_eq!(result.resolver.execution_paths.entries(), ["/apps/"]);

        Ok(())
    }

    #[sealed_test]
    fn load_missing_config_uses_defaults() -> anyhow::Result<()> {
        let result = ResolverConfig::load("missing.toml")?;
        pretty_assert_eq!(result, ResolverConfig::default());

        Ok(())
    }

    #[test]
    fn serialized_config_parses_back() -> anyhow::Result<()> {
        let config = ResolverConfig {
            search_paths: SearchPath::new(["/apps", "/libs"]),
            execution_paths: ExecutionPaths::new(["/apps/"]),
            default_extensions: vec!["html".into()],
            cache_size: 3,
        };
        let result: ResolverConfig = config.to_string().parse()?;

        pretty_assert_eq!(result, config);
        assert!(!result.cache_enabled());

        Ok(())
    }

    #[test]
    fn search_path_roots() {
        pretty_assert_eq!(SearchPath::default().roots(), ["/"]);
        pretty_assert_eq!(
            SearchPath::new(["apps", "/libs/", ""]).roots(),
            ["/apps/", "/libs/"]
        );
    }

    #[test_case(ExecutionPaths::unrestricted(), "/anything/at/all", true; "empty allows all")]
    #[test_case(ExecutionPaths::new(["/apps/", "/"]), "/tmp/x.esp", true; "root allows all")]
    #[test_case(ExecutionPaths::new(["/apps/", ""]), "/tmp/x.esp", true; "empty entry allows all")]
    #[test_case(ExecutionPaths::new(["/apps/"]), "/apps/foo/html.esp", true; "subtree entry")]
    #[test_case(ExecutionPaths::new(["/apps/"]), "/libs/foo/html.esp", false; "outside subtree")]
    #[test_case(
        ExecutionPaths::new(["/apps/foo/html.esp"]), "/apps/foo/html.esp", true;
        "exact entry"
    )]
    #[test_case(
        ExecutionPaths::new(["/apps/foo"]), "/apps/foo/html.esp", false;
        "exact entry is not a prefix"
    )]
    #[test_case(ExecutionPaths::new(["/apps/"]), "", false; "empty path")]
    #[test]
    fn execution_paths_allow(paths: ExecutionPaths, path: &str, expect: bool) {
        pretty_assert_eq!(paths.allows(path), expect);
    }

    #[test]
    fn default_extension_check() {
        let config = ResolverConfig::default();
        assert!(config.is_default_extension(Some("html")));
        assert!(!config.is_default_extension(Some("json")));
        assert!(!config.is_default_extension(None));
    }
}

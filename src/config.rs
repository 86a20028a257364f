use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::paths;

/// Files above this size are not parsed unless configured otherwise
pub const DEFAULT_MAX_SOURCE_BYTES: u64 = 10 * 1024 * 1024;

/// Extraction and transform settings
///
/// Loaded from an optional TOML file, then overridden by the `LIBRARY_DIRS`,
/// `LOCAL_INCLUDE_CHILD_DEPTH` and `MAX_SOURCE_BYTES` environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source files larger than this are skipped. 0 disables the check.
    pub max_source_bytes: u64,
    /// Extra system include directories, searched before the defaults
    pub library_dirs: Vec<String>,
    /// How deep to look below each ancestor directory for local includes
    pub local_include_child_depth: usize,
    pub identity: IdentityPolicy,
}

/// How a function identity is derived from its file and name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IdentityPolicy {
    /// Cut names at the first `<` (`Vec<int>::push` -> `Vec`)
    pub truncate_generics: bool,
    /// Strip every extension from the file name (`foo.o.c` -> `foo`), not just the last
    pub strip_all_extensions: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_source_bytes: DEFAULT_MAX_SOURCE_BYTES,
            library_dirs: Vec::new(),
            local_include_child_depth: 0,
            identity: IdentityPolicy::default(),
        }
    }
}

impl Default for IdentityPolicy {
    fn default() -> Self {
        Self {
            truncate_generics: true,
            strip_all_extensions: true,
        }
    }
}

impl Config {
    /// Load configuration from `path` (if any) and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Apply environment overrides, `var` looks a variable up
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(dirs) = var("LIBRARY_DIRS") {
            let mut from_env: Vec<String> = dirs
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(String::from)
                .collect();
            from_env.append(&mut self.library_dirs);
            self.library_dirs = from_env;
        }
        if let Some(depth) = var("LOCAL_INCLUDE_CHILD_DEPTH") {
            self.local_include_child_depth = depth
                .trim()
                .parse()
                .with_context(|| format!("LOCAL_INCLUDE_CHILD_DEPTH is not a number: {}", depth))?;
        }
        if let Some(bytes) = var("MAX_SOURCE_BYTES") {
            self.max_source_bytes = bytes
                .trim()
                .parse()
                .with_context(|| format!("MAX_SOURCE_BYTES is not a number: {}", bytes))?;
        }
        Ok(())
    }

    /// Every existing system include directory, configured ones first
    pub fn system_include_dirs(&self) -> Vec<PathBuf> {
        let configured = self
            .library_dirs
            .iter()
            .map(|dir| PathBuf::from(shellexpand::tilde(dir).as_ref()))
            .filter(|dir| dir.is_dir());

        let mut dirs: Vec<PathBuf> = Vec::new();
        for dir in configured.chain(paths::default_include_dirs()) {
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }
        dirs
    }
}

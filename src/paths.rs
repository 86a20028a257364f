//! Filesystem layout the tool depends on.
//!
//! Where system headers are looked up, and the preconditions on input and
//! output locations that are checked before any work starts.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

/// System include directories searched when no configured directory matches
pub const DEFAULT_INCLUDE_DIRS: &[&str] = &[
    "/usr/include",
    "/usr/local/include",
    "/opt/local/include",
    "/opt/homebrew/include",
    "/mingw64/include",
    "/mingw32/include",
    "/Library/Developer/CommandLineTools/SDKs/MacOSX.sdk/usr/include",
    "/Library/Developer/CommandLineTools/SDKs/MacOSX.sdk/usr/include/c++/v1",
];

/// Versioned compiler include directories
pub const DEFAULT_INCLUDE_GLOBS: &[&str] = &[
    "/usr/lib/clang/*/include",
    "/usr/lib/gcc/x86_64-linux-gnu/*/include",
];

/// Default include directories that exist on this machine, in search order
pub fn default_include_dirs() -> Vec<PathBuf> {
    let globbed = DEFAULT_INCLUDE_GLOBS.iter().flat_map(|pattern| {
        glob::glob(pattern)
            .map(|paths| paths.filter_map(|p| p.ok()).collect::<Vec<_>>())
            .unwrap_or_default()
    });

    DEFAULT_INCLUDE_DIRS
        .iter()
        .map(PathBuf::from)
        .chain(globbed)
        .filter(|dir| dir.is_dir())
        .collect()
}

/// Assert that the path exists and is a directory
pub fn check_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("Path {} does not exist", path.display());
    }
    if !path.is_dir() {
        bail!("Path {} is not a directory", path.display());
    }
    Ok(())
}

/// Create an empty directory at `path`. With `force`, an existing one is removed first.
pub fn mk_empty_dir(path: &Path, force: bool) -> Result<()> {
    if path.exists() {
        if !force {
            bail!("Path {} already exists (use --force to overwrite)", path.display());
        }
        if path.is_dir() {
            std::fs::remove_dir_all(path)
        } else {
            std::fs::remove_file(path)
        }
        .with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    std::fs::create_dir_all(path).with_context(|| format!("Failed to create {}", path.display()))
}

/// Absolute form of `path` with symlinks resolved, even if it does not exist yet
///
/// The nearest existing ancestor is canonicalized and the missing tail is
/// appended to it.
pub fn resolve(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path)
        .with_context(|| format!("Failed to resolve {}", path.display()))?;
    let mut missing = Vec::new();
    let mut current = absolute.as_path();
    loop {
        if let Ok(existing) = current.canonicalize() {
            return Ok(missing.iter().rev().fold(existing, |acc, name| acc.join(name)));
        }
        match (current.parent(), current.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                current = parent;
            }
            _ => return Ok(absolute),
        }
    }
}

/// Fail if `inner` is `outer` or lies anywhere below it
pub fn check_not_inside(inner: &Path, outer: &Path) -> Result<()> {
    let (inner, outer) = (resolve(inner)?, resolve(outer)?);
    if inner.starts_with(&outer) {
        bail!("Output {} is inside input {}", inner.display(), outer.display());
    }
    Ok(())
}

/// Check an output file can be written. Parent directories are created.
pub fn prepare_output_file(path: &Path, force: bool) -> Result<()> {
    if path.is_dir() {
        bail!("Path {} is a directory", path.display());
    }
    if path.exists() && !force {
        bail!("Path {} already exists (use --force to overwrite)", path.display());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    Ok(())
}

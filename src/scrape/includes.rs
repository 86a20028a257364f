//! `#include` resolution.
//!
//! Quoted includes are looked up next to the including file and then in each
//! ancestor directory, nearest first, never in the filesystem root. Optionally
//! the subdirectories of those ancestors are searched too. Every include,
//! quoted or not, finally falls back to the system include directories.

use std::path::{Path, PathBuf};
use understandable_metal::Include;
use walkdir::WalkDir;

use crate::config::Config;

#[derive(Debug, Clone, Default)]
pub struct IncludeResolver {
    system_dirs: Vec<PathBuf>,
    local_child_depth: usize,
}

impl IncludeResolver {
    pub fn new(system_dirs: Vec<PathBuf>, local_child_depth: usize) -> Self {
        Self {
            system_dirs,
            local_child_depth,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.system_include_dirs(), config.local_include_child_depth)
    }

    /// Locate the file an include in `source_path` refers to. `None` if nothing matches.
    pub fn resolve(&self, source_path: &Path, include: &Include) -> Option<PathBuf> {
        let target = Path::new(&include.target);
        if target.is_absolute() {
            return target.is_file().then(|| target.to_path_buf());
        }

        if !include.system {
            if let Some(found) = self.resolve_local(source_path, target) {
                return Some(found);
            }
        }

        self.system_dirs
            .iter()
            .map(|dir| dir.join(target))
            .find(|candidate| candidate.is_file())
    }

    fn resolve_local(&self, source_path: &Path, target: &Path) -> Option<PathBuf> {
        if let Some(found) = reasonable_parents(source_path)
            .map(|parent| parent.join(target))
            .find(|candidate| candidate.is_file())
        {
            return Some(found);
        }

        if self.local_child_depth == 0 {
            return None;
        }
        // Siblings and cousins of the ancestors
        for parent in reasonable_parents(source_path) {
            let relatives = WalkDir::new(parent)
                .min_depth(1)
                .max_depth(self.local_child_depth)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_dir());
            for relative in relatives {
                let candidate = relative.path().join(target);
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
        }
        None
    }
}

/// Ancestor directories of `path`, nearest first, excluding the root
fn reasonable_parents(path: &Path) -> impl Iterator<Item = &Path> {
    path.ancestors()
        .skip(1)
        .filter(|parent| parent.parent().is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::TempDir;

    fn quoted(target: &str) -> Include {
        Include {
            target: target.to_string(),
            system: false,
        }
    }

    fn system(target: &str) -> Include {
        Include {
            target: target.to_string(),
            system: true,
        }
    }

    #[test]
    fn test_nearest_ancestor_wins() -> Result<()> {
        let temp = TempDir::new()?;
        let root = temp.path();
        fs::create_dir_all(root.join("pkg/src/deep"))?;
        fs::write(root.join("pkg/util.h"), "// far")?;
        fs::write(root.join("pkg/src/util.h"), "// near")?;
        let source = root.join("pkg/src/deep/main.c");
        fs::write(&source, "#include \"util.h\"")?;

        let resolver = IncludeResolver::default();
        assert_eq!(
            resolver.resolve(&source, &quoted("util.h")),
            Some(root.join("pkg/src/util.h"))
        );
        Ok(())
    }

    #[test]
    fn test_system_include_skips_local_search() -> Result<()> {
        let temp = TempDir::new()?;
        let root = temp.path();
        fs::create_dir_all(root.join("src"))?;
        fs::create_dir_all(root.join("sys"))?;
        fs::write(root.join("src/only_local.h"), "")?;
        fs::write(root.join("sys/only_system.h"), "")?;
        let source = root.join("src/main.c");

        let resolver = IncludeResolver::new(vec![root.join("sys")], 0);
        assert_eq!(resolver.resolve(&source, &system("only_local.h")), None);
        assert_eq!(
            resolver.resolve(&source, &system("only_system.h")),
            Some(root.join("sys/only_system.h"))
        );
        // Quoted includes fall back to system directories
        assert_eq!(
            resolver.resolve(&source, &quoted("only_system.h")),
            Some(root.join("sys/only_system.h"))
        );
        Ok(())
    }

    #[test]
    fn test_unresolved_include() -> Result<()> {
        let temp = TempDir::new()?;
        let source = temp.path().join("main.c");
        let resolver = IncludeResolver::default();
        assert_eq!(resolver.resolve(&source, &quoted("nowhere/missing.h")), None);
        Ok(())
    }

    #[test]
    fn test_child_depth_finds_cousins() -> Result<()> {
        let temp = TempDir::new()?;
        let root = temp.path();
        fs::create_dir_all(root.join("pkg/src"))?;
        fs::create_dir_all(root.join("pkg/include"))?;
        fs::write(root.join("pkg/include/api.h"), "")?;
        let source = root.join("pkg/src/main.c");

        assert_eq!(IncludeResolver::new(Vec::new(), 0).resolve(&source, &quoted("api.h")), None);
        assert_eq!(
            IncludeResolver::new(Vec::new(), 1).resolve(&source, &quoted("api.h")),
            Some(root.join("pkg/include/api.h"))
        );
        Ok(())
    }

    #[test]
    fn test_directories_are_not_headers() -> Result<()> {
        let temp = TempDir::new()?;
        fs::create_dir_all(temp.path().join("sys"))?;
        let source = temp.path().join("main.c");
        let resolver = IncludeResolver::default();
        assert_eq!(resolver.resolve(&source, &quoted("sys")), None);
        Ok(())
    }

    #[test]
    fn test_reasonable_parents_excludes_root() {
        let parents: Vec<_> = reasonable_parents(Path::new("/a/b/c.c")).collect();
        assert_eq!(parents, vec![Path::new("/a/b"), Path::new("/a")]);
    }
}

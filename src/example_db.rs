//! Per-artifact matching of source functions to decompiled functions.
//!
//! Both sides are keyed by a function identity: the artifact-relative file
//! path with its extensions removed, then `::` and the function name. A source
//! function and a decompiled function with the same identity form one example.

use log::{debug, info};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use crate::code_type::LanguageModel;
use crate::config::IdentityPolicy;
use crate::error::ScrapeError;
use crate::scrape::Function;

/// Orphan identities listed individually at debug level
const MAX_LISTED_ORPHANS: usize = 100;

/// Output of finalizing one database
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuiltExamples {
    /// (source text, decompiled text)
    pub pairs: Vec<(String, String)>,
    /// Decompiled identities with no source function
    pub missing_sources: Vec<String>,
    /// Source identities with no decompiled function
    pub missing_decompileds: Vec<String>,
}

/// Accumulates one artifact's functions for one language
pub trait ExampleDb {
    /// Add the functions of a source file. Returns the number of new identities.
    fn add_source(&mut self, path: &Path) -> Result<usize, ScrapeError>;

    /// Add the functions of a decompiled file. Returns the number of new identities.
    fn add_decompiled(&mut self, path: &Path) -> Result<usize, ScrapeError>;

    /// Examples `build_examples` would produce right now
    fn pending_examples(&self) -> usize;

    /// Drain matched pairs. Consumes the database.
    fn build_examples(self: Box<Self>) -> BuiltExamples;

    /// Called when the run is cancelled while this database is open
    fn process_interrupt(&mut self) {}
}

/// Identity-matching database on top of a language model
pub struct FunctionExampleDb<'m> {
    model: &'m mut dyn LanguageModel,
    root: PathBuf,
    policy: IdentityPolicy,
    sources: BTreeMap<String, String>,
    decompileds: BTreeMap<String, String>,
    matched: usize,
}

impl<'m> FunctionExampleDb<'m> {
    pub fn new(model: &'m mut dyn LanguageModel, root: &Path, policy: IdentityPolicy) -> Self {
        Self {
            model,
            root: root.to_path_buf(),
            policy,
            sources: BTreeMap::new(),
            decompileds: BTreeMap::new(),
            matched: 0,
        }
    }

    /// Store each function's braced body under its identity. Last write wins.
    fn insert(&mut self, path: &Path, functions: Vec<Function>, decompiled: bool) -> usize {
        let mut added = 0;
        for function in functions.into_iter().filter(Function::has_body) {
            let identity = function_identity(&self.root, path, &function.name, self.policy);
            let body = self.model.split_function(&function.text).braced_body();

            let (side, other) = if decompiled {
                (&mut self.decompileds, &self.sources)
            } else {
                (&mut self.sources, &self.decompileds)
            };
            let is_new = side.insert(identity.clone(), body).is_none();
            if is_new {
                added += 1;
                if other.contains_key(&identity) {
                    self.matched += 1;
                }
            }
        }
        added
    }
}

impl ExampleDb for FunctionExampleDb<'_> {
    fn add_source(&mut self, path: &Path) -> Result<usize, ScrapeError> {
        let functions = self.model.scrape_functions(path)?;
        Ok(self.insert(path, functions, false))
    }

    fn add_decompiled(&mut self, path: &Path) -> Result<usize, ScrapeError> {
        let functions = self.model.scrape_decompiled(path)?;
        Ok(self.insert(path, functions, true))
    }

    fn pending_examples(&self) -> usize {
        self.matched
    }

    fn build_examples(self: Box<Self>) -> BuiltExamples {
        let FunctionExampleDb {
            mut sources,
            decompileds,
            root,
            ..
        } = *self;

        let mut built = BuiltExamples::default();
        for (identity, decompiled) in decompileds {
            match sources.remove(&identity) {
                Some(source) => built.pairs.push((source, decompiled)),
                None => built.missing_sources.push(identity),
            }
        }
        built.missing_decompileds = sources.into_keys().collect();

        report_orphans(&root, "decompiled functions without source", &built.missing_sources);
        report_orphans(&root, "source functions without decompiled", &built.missing_decompileds);
        built
    }

    fn process_interrupt(&mut self) {
        debug!(
            "Discarding {} source and {} decompiled functions of {}",
            self.sources.len(),
            self.decompileds.len(),
            self.root.display()
        );
    }
}

fn report_orphans(root: &Path, what: &str, identities: &[String]) {
    if identities.is_empty() {
        return;
    }
    info!("{}: {} {}", root.display(), identities.len(), what);
    for identity in identities.iter().take(MAX_LISTED_ORPHANS) {
        debug!("  {}", identity);
    }
    if identities.len() > MAX_LISTED_ORPHANS {
        debug!("  ... and {} more", identities.len() - MAX_LISTED_ORPHANS);
    }
}

/// Key that matches a function across a source file and its decompiled twin
///
/// `src/foo.o.c` + `Vec<int>::push` -> `src/foo::Vec` with the default policy.
pub fn function_identity(root: &Path, path: &Path, name: &str, policy: IdentityPolicy) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);

    let mut parts: Vec<String> = relative
        .parent()
        .into_iter()
        .flat_map(Path::components)
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    let file_name = relative
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    parts.push(file_stem(&file_name, policy.strip_all_extensions).to_string());

    let name = name.trim();
    let name = if policy.truncate_generics {
        name.split('<').next().unwrap_or(name)
    } else {
        name
    };

    format!("{}::{}", parts.join("/"), name)
}

/// File name without extensions. A leading dot is part of the name.
fn file_stem(file_name: &str, strip_all: bool) -> &str {
    let search_from = usize::from(file_name.starts_with('.'));
    let dot = if strip_all {
        file_name[search_from..].find('.')
    } else {
        file_name[search_from..].rfind('.')
    };
    match dot {
        Some(index) => &file_name[..search_from + index],
        None => file_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code_type::{LanguageModel, CODE_TYPE_C};
    use crate::config::Config;
    use anyhow::Result;
    use std::fs;
    use tempfile::TempDir;

    fn model() -> Result<Box<dyn LanguageModel>> {
        CODE_TYPE_C.language_model(&Config::default())
    }

    #[test]
    fn test_identity_strips_all_extensions() {
        let policy = IdentityPolicy::default();
        let root = Path::new("/data/pkg");
        assert_eq!(
            function_identity(root, Path::new("/data/pkg/foo.c"), "bar", policy),
            "foo::bar"
        );
        assert_eq!(
            function_identity(root, Path::new("/data/pkg/foo.o.c"), "bar", policy),
            "foo::bar"
        );
        assert_eq!(
            function_identity(root, Path::new("/data/pkg/src/net/tcp.o.c"), "send", policy),
            "src/net/tcp::send"
        );
    }

    #[test]
    fn test_identity_policy_is_configurable() {
        let root = Path::new("/r");
        let path = Path::new("/r/foo.o.cpp");
        let loose = IdentityPolicy {
            truncate_generics: false,
            strip_all_extensions: false,
        };
        assert_eq!(function_identity(root, path, "Vec<int>::push", loose), "foo.o::Vec<int>::push");
        assert_eq!(
            function_identity(root, path, "Vec<int>::push", IdentityPolicy::default()),
            "foo::Vec"
        );
    }

    #[test]
    fn test_file_stem_keeps_leading_dot() {
        assert_eq!(file_stem(".hidden.o.c", true), ".hidden");
        assert_eq!(file_stem(".hidden", true), ".hidden");
        assert_eq!(file_stem("plain", true), "plain");
        assert_eq!(file_stem("a.b.c", false), "a.b");
    }

    #[test]
    fn test_end_to_end_pair() -> Result<()> {
        let temp = TempDir::new()?;
        let root = temp.path();
        fs::write(root.join("foo.c"), "int add(int a, int b) { return a + b; }\n")?;
        fs::write(
            root.join("foo.o.c"),
            "// FUNCTION add\nint add(int a,int b){return a+b;}\n",
        )?;

        let mut model = model()?;
        let mut db = model.example_db(root);
        assert_eq!(db.add_source(&root.join("foo.c"))?, 1);
        assert_eq!(db.pending_examples(), 0);
        assert_eq!(db.add_decompiled(&root.join("foo.o.c"))?, 1);
        assert_eq!(db.pending_examples(), 1);

        let built = db.build_examples();
        assert_eq!(
            built.pairs,
            vec![("{ return a + b; }".to_string(), "{return a+b;}".to_string())]
        );
        assert!(built.missing_sources.is_empty());
        assert!(built.missing_decompileds.is_empty());
        Ok(())
    }

    #[test]
    fn test_add_source_is_idempotent() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("foo.c");
        fs::write(&path, "int a(void) { return 1; }\nint b(void);\nint c(void) { return 3; }\n")?;

        let mut model = model()?;
        let mut db = model.example_db(temp.path());
        assert_eq!(db.add_source(&path)?, 2);
        assert_eq!(db.add_source(&path)?, 0);

        let built = db.build_examples();
        assert!(built.pairs.is_empty());
        assert_eq!(built.missing_decompileds, vec!["foo::a", "foo::c"]);
        Ok(())
    }

    #[test]
    fn test_orphans_on_both_sides() -> Result<()> {
        let temp = TempDir::new()?;
        let root = temp.path();
        fs::write(root.join("m.c"), "int shared(void) { return 0; }\nint only_src(void) { return 1; }\n")?;
        fs::write(
            root.join("m.o.c"),
            "// FUNCTION shared\nint shared(void) { return 0; }\n// FUNCTION only_bin\nint only_bin(void) { return 2; }\n",
        )?;

        let mut model = model()?;
        let mut db = model.example_db(root);
        db.add_decompiled(&root.join("m.o.c"))?;
        db.add_source(&root.join("m.c"))?;
        let built = db.build_examples();

        assert_eq!(built.pairs.len(), 1);
        assert_eq!(built.missing_sources, vec!["m::only_bin"]);
        assert_eq!(built.missing_decompileds, vec!["m::only_src"]);
        Ok(())
    }

    #[test]
    fn test_bad_format_adds_nothing() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("x.o.c");
        fs::write(&path, "")?;

        let mut model = model()?;
        let mut db = model.example_db(temp.path());
        assert_eq!(db.add_decompiled(&path)?, 0);
        assert!(db.add_decompiled(&temp.path().join("missing.o.c")).is_err());
        assert!(db.build_examples().pairs.is_empty());
        Ok(())
    }

    #[test]
    fn test_different_directories_do_not_match() -> Result<()> {
        let temp = TempDir::new()?;
        let root = temp.path();
        fs::create_dir_all(root.join("a"))?;
        fs::create_dir_all(root.join("b"))?;
        fs::write(root.join("a/f.c"), "int f(void) { return 0; }\n")?;
        fs::write(root.join("b/f.o.c"), "// FUNCTION f\nint f(void) { return 0; }\n")?;

        let mut model = model()?;
        let mut db = model.example_db(root);
        db.add_source(&root.join("a/f.c"))?;
        db.add_decompiled(&root.join("b/f.o.c"))?;
        assert_eq!(db.pending_examples(), 0);
        assert!(db.build_examples().pairs.is_empty());
        Ok(())
    }
}

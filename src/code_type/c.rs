//! Tree-sitter backed language model for C and C++.

use anyhow::Result;
use log::debug;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use understandable_metal::{Analyzer, ParsedFile, UnitSpan};

use super::{CodeType, LanguageModel};
use crate::config::{Config, IdentityPolicy};
use crate::error::ScrapeError;
use crate::example_db::{ExampleDb, FunctionExampleDb};
use crate::scrape::includes::IncludeResolver;
use crate::scrape::{Function, Unit};

pub struct CLanguageModel {
    code_type: &'static CodeType,
    analyzer: Analyzer,
    resolver: IncludeResolver,
    max_source_bytes: u64,
    identity: IdentityPolicy,
}

impl CLanguageModel {
    pub fn new(code_type: &'static CodeType, config: &Config) -> Result<Self> {
        Ok(Self {
            code_type,
            analyzer: Analyzer::for_metal(code_type.metal)?,
            resolver: IncludeResolver::from_config(config),
            max_source_bytes: config.max_source_bytes,
            identity: config.identity,
        })
    }

    /// Read and parse one file, refusing files over the size limit
    fn parse_file(&mut self, path: &Path) -> Result<ParsedFile, ScrapeError> {
        let unreadable = |source| ScrapeError::Unreadable {
            path: path.to_path_buf(),
            source,
        };

        let size = std::fs::metadata(path).map_err(unreadable)?.len();
        if self.max_source_bytes > 0 && size > self.max_source_bytes {
            return Err(ScrapeError::Oversized {
                path: path.to_path_buf(),
                size,
                limit: self.max_source_bytes,
            });
        }

        let source = std::fs::read(path).map_err(unreadable)?;
        let parsed = self
            .analyzer
            .parse(source, self.code_type.metal)
            .map_err(|e| ScrapeError::Parse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        if parsed.has_errors() {
            debug!("Recovered from syntax errors in {}", path.display());
        }
        Ok(parsed)
    }

    /// Functions of one file plus the files its includes resolve to
    fn scrape_file(&mut self, path: &Path) -> Result<(Vec<Function>, Vec<PathBuf>), ScrapeError> {
        let parsed = self.parse_file(path)?;
        let parse_error = |e: anyhow::Error| ScrapeError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        let functions = self
            .analyzer
            .functions(&parsed)
            .map_err(parse_error)?
            .into_iter()
            .map(|span| Function::new(span.name, parsed.text(span.range)))
            .collect();

        let included = self
            .analyzer
            .includes(&parsed)
            .map_err(parse_error)?
            .iter()
            .filter_map(|include| {
                let resolved = self.resolver.resolve(path, include);
                if resolved.is_none() {
                    debug!("Unresolved include {} in {}", include.target, path.display());
                }
                resolved
            })
            .collect();

        Ok((functions, included))
    }
}

impl LanguageModel for CLanguageModel {
    fn code_type(&self) -> &'static CodeType {
        self.code_type
    }

    fn scrape_functions(&mut self, path: &Path) -> Result<Vec<Function>, ScrapeError> {
        let (mut functions, included) = self.scrape_file(path)?;

        let mut visited: HashSet<PathBuf> = HashSet::new();
        visited.insert(canonical(path));

        // Depth first, includes in file order
        let mut worklist: Vec<PathBuf> = included.into_iter().rev().collect();
        while let Some(next) = worklist.pop() {
            if !visited.insert(canonical(&next)) {
                continue;
            }
            match self.scrape_file(&next) {
                Ok((found, nested)) => {
                    functions.extend(found);
                    worklist.extend(nested.into_iter().rev());
                }
                Err(e) => e.log(),
            }
        }

        Ok(functions)
    }

    fn top_level_units(&mut self, path: &Path) -> Result<Vec<Unit>, ScrapeError> {
        let parsed = self.parse_file(path)?;
        let units = self
            .analyzer
            .top_level_units(&parsed)
            .into_iter()
            .map(|unit| match unit {
                UnitSpan::Function { name, range } => {
                    Unit::Function(Function::new(name, parsed.text(range)))
                }
                UnitSpan::Other(range) => Unit::Other(parsed.text(range).into_owned()),
            })
            .collect();
        Ok(units)
    }

    fn example_db(&mut self, artifact_root: &Path) -> Box<dyn ExampleDb + '_> {
        let identity = self.identity;
        Box::new(FunctionExampleDb::new(self, artifact_root, identity))
    }
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

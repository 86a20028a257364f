//! Supported languages and the per-language model behind them.
//!
//! A [`CodeType`] is an immutable descriptor: which file suffixes are source,
//! raw bytecode or decompiled output. A [`LanguageModel`] is the stateful
//! parser for one code type and is what the example database and the
//! transform driver talk to.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use understandable_metal::Metal;

use crate::config::Config;
use crate::error::ScrapeError;
use crate::example_db::ExampleDb;
use crate::scrape::{self, Function, FunctionParts, Unit};

pub mod c;

/// Language tag, stored with every example
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Lang {
    #[serde(rename = "c")]
    C,
    #[serde(rename = "c/c++")]
    Cpp,
}

impl Lang {
    pub fn all() -> Vec<Lang> {
        vec![Lang::C, Lang::Cpp]
    }

    /// Short key used on the command line and in saved datasets
    pub fn key(&self) -> &'static str {
        match self {
            Lang::C => "c",
            Lang::Cpp => "c/c++",
        }
    }

    pub fn from_key(key: &str) -> Option<Lang> {
        match key.trim() {
            "c" => Some(Lang::C),
            "c/c++" | "c++" | "cpp" => Some(Lang::Cpp),
            _ => None,
        }
    }

    pub fn code_type(&self) -> &'static CodeType {
        match self {
            Lang::C => &CODE_TYPE_C,
            Lang::Cpp => &CODE_TYPE_CPP,
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// What a file is to a code type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRole {
    Source,
    Bytecode,
    Decompiled,
}

/// File suffix families of one language
#[derive(Debug)]
pub struct CodeType {
    pub lang: Lang,
    pub metal: Metal,
    /// The first one is the canonical suffix for generated source
    pub source_extensions: &'static [&'static str],
    pub bytecode_extensions: &'static [&'static str],
    pub decompiled_extensions: &'static [&'static str],
}

pub static CODE_TYPE_C: CodeType = CodeType {
    lang: Lang::C,
    metal: Metal::C,
    source_extensions: &[".c", ".h"],
    bytecode_extensions: &[".o"],
    decompiled_extensions: &[".o.c"],
};

/// C++, also accepting C files
pub static CODE_TYPE_CPP: CodeType = CodeType {
    lang: Lang::Cpp,
    metal: Metal::Cpp,
    source_extensions: &[".cpp", ".cc", ".cxx", ".c++", ".hpp", ".c", ".h"],
    bytecode_extensions: &[".o"],
    decompiled_extensions: &[".o.cpp", ".o.cc", ".o.cxx", ".o.c++", ".o.c"],
};

impl CodeType {
    pub fn primary_source_extension(&self) -> &'static str {
        self.source_extensions[0]
    }

    fn extensions(&self, role: FileRole) -> &'static [&'static str] {
        match role {
            FileRole::Source => self.source_extensions,
            FileRole::Bytecode => self.bytecode_extensions,
            FileRole::Decompiled => self.decompiled_extensions,
        }
    }

    /// Longest suffix of `role` that `file_name` ends with
    pub fn matching_extension(&self, file_name: &str, role: FileRole) -> Option<&'static str> {
        self.extensions(role)
            .iter()
            .copied()
            .filter(|ext| file_name.len() > ext.len() && file_name.ends_with(ext))
            .max_by_key(|ext| ext.len())
    }

    /// Role of a file by name. Decompiled suffixes are checked first since
    /// they extend source suffixes (`.o.c` vs `.c`).
    pub fn classify(&self, file_name: &str) -> Option<FileRole> {
        [FileRole::Decompiled, FileRole::Source, FileRole::Bytecode]
            .into_iter()
            .find(|role| self.matching_extension(file_name, *role).is_some())
    }

    /// Build the language model for this code type
    pub fn language_model(&'static self, config: &Config) -> Result<Box<dyn LanguageModel>> {
        Ok(Box::new(c::CLanguageModel::new(self, config)?))
    }
}

/// Parse a comma separated language list, e.g. `c,c/c++`
pub fn code_types_for(langs: &str) -> Result<Vec<&'static CodeType>> {
    let mut code_types: Vec<&'static CodeType> = Vec::new();
    for key in langs.split(',').filter(|k| !k.trim().is_empty()) {
        let Some(lang) = Lang::from_key(key) else {
            let known: Vec<_> = Lang::all().iter().map(Lang::key).collect();
            bail!("Unknown code type '{}' (known: {})", key.trim(), known.join(", "));
        };
        if !code_types.iter().any(|ct| ct.lang == lang) {
            code_types.push(lang.code_type());
        }
    }
    if code_types.is_empty() {
        bail!("No code type given");
    }
    Ok(code_types)
}

/// Pluggable per-language parsing
pub trait LanguageModel {
    fn code_type(&self) -> &'static CodeType;

    /// Suffix for the source file generated from a bytecode or decompiled file
    fn source_extension_for(&self, _path: &Path) -> &'static str {
        self.code_type().primary_source_extension()
    }

    /// Every function defined in a source file and in the files it includes
    fn scrape_functions(&mut self, path: &Path) -> Result<Vec<Function>, ScrapeError>;

    /// Every function of a sentinel-segmented decompiled file
    fn scrape_decompiled(&mut self, path: &Path) -> Result<Vec<Function>, ScrapeError> {
        scrape::decompiled::scrape(path)
    }

    /// The file as top-level functions and the text between them
    fn top_level_units(&mut self, path: &Path) -> Result<Vec<Unit>, ScrapeError>;

    fn split_function<'a>(&self, text: &'a str) -> FunctionParts<'a> {
        scrape::split_function(text)
    }

    /// Fresh example database for one artifact
    fn example_db(&mut self, artifact_root: &Path) -> Box<dyn ExampleDb + '_>;
}

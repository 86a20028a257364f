//! Rewriting a decompiled tree into source through a [`Translator`].
//!
//! The input tree is mirrored into the output directory. Decompiled and
//! bytecode files are split into top-level units; function bodies go through
//! the translator while everything else is copied verbatim. All other files
//! are copied unchanged.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::code_type::{CodeType, FileRole, LanguageModel};
use crate::config::Config;
use crate::interrupt::Interrupt;
use crate::paths;
use crate::scrape::Unit;
use crate::translator::Translator;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformStats {
    pub files_transformed: usize,
    pub functions_transformed: usize,
    pub files_copied: usize,
    pub directories: usize,
    pub elapsed: Duration,
}

pub struct Transformer {
    models: Vec<Box<dyn LanguageModel>>,
    translator: Box<dyn Translator>,
    /// Files to transform before falling back to copying. 0 is unlimited.
    max_count: usize,
    interrupt: Interrupt,
}

impl Transformer {
    pub fn new(
        code_types: &[&'static CodeType],
        config: &Config,
        translator: Box<dyn Translator>,
        max_count: usize,
        interrupt: Interrupt,
    ) -> Result<Self> {
        let models = code_types
            .iter()
            .map(|code_type| code_type.language_model(config))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            models,
            translator,
            max_count,
            interrupt,
        })
    }

    /// Mirror `input` into a fresh `output` directory
    pub fn transform_dir(&mut self, input: &Path, output: &Path, force: bool) -> Result<TransformStats> {
        paths::check_dir(input)?;
        paths::check_not_inside(output, input)?;
        paths::mk_empty_dir(output, force)?;

        let start = Instant::now();
        let mut stats = TransformStats::default();
        let mut worklist: Vec<(PathBuf, PathBuf)> = vec![(input.to_path_buf(), output.to_path_buf())];

        while let Some((from_dir, to_dir)) = worklist.pop() {
            let mut entries: Vec<PathBuf> = fs::read_dir(&from_dir)
                .with_context(|| format!("Failed to list {}", from_dir.display()))?
                .map(|entry| entry.map(|e| e.path()))
                .collect::<std::io::Result<_>>()
                .with_context(|| format!("Failed to list {}", from_dir.display()))?;
            entries.sort();

            let mut subdirs = Vec::new();
            for path in entries {
                let Some(name) = path.file_name().map(|n| n.to_os_string()) else {
                    continue;
                };
                let file_type = fs::symlink_metadata(&path)
                    .with_context(|| format!("Failed to stat {}", path.display()))?
                    .file_type();

                if file_type.is_dir() {
                    let dest = to_dir.join(&name);
                    fs::create_dir(&dest).with_context(|| format!("Failed to create {}", dest.display()))?;
                    stats.directories += 1;
                    subdirs.push((path, dest));
                } else if path.is_file() {
                    self.interrupt.check()?;
                    self.transform_file(&path, &to_dir, &mut stats)?;
                } else {
                    warn!("Skipping {}: not a regular file", path.display());
                }
            }
            worklist.extend(subdirs.into_iter().rev());
        }

        stats.elapsed = start.elapsed();
        info!(
            "Transformed {} files ({} functions), copied {}",
            stats.files_transformed, stats.functions_transformed, stats.files_copied
        );
        Ok(stats)
    }

    fn transform_file(&mut self, path: &Path, to_dir: &Path, stats: &mut TransformStats) -> Result<()> {
        let Some(raw_name) = path.file_name() else {
            return Ok(());
        };
        let copy_dest = to_dir.join(raw_name);
        let Some(file_name) = raw_name.to_str() else {
            debug!("{} has a non UTF-8 name, copying unchanged", path.display());
            return copy_file(path, &copy_dest, stats);
        };

        let matched = self.models.iter().position(|model| {
            matches!(
                model.code_type().classify(file_name),
                Some(FileRole::Decompiled | FileRole::Bytecode)
            )
        });
        let Some(index) = matched else {
            return copy_file(path, &copy_dest, stats);
        };
        if self.max_count > 0 && stats.files_transformed >= self.max_count {
            debug!("Transform cap reached, copying {}", path.display());
            return copy_file(path, &copy_dest, stats);
        }

        let model = &mut self.models[index];
        let code_type = model.code_type();
        let Some(role) = code_type.classify(file_name) else {
            return copy_file(path, &copy_dest, stats);
        };
        if role == FileRole::Bytecode {
            let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
            if std::str::from_utf8(&bytes).is_err() {
                warn!("{} is binary, copying unchanged", path.display());
                return copy_file(path, &copy_dest, stats);
            }
        }

        let units = match model.top_level_units(path) {
            Ok(units) => units,
            Err(e) => {
                e.log();
                return copy_file(path, &copy_dest, stats);
            }
        };

        let mut text = String::new();
        let mut functions = 0;
        for unit in &units {
            match unit {
                Unit::Function(function) if function.has_body() => {
                    let parts = model.split_function(&function.text);
                    let body = self.translator.translate(parts.body).with_context(|| {
                        format!("Failed to translate {} in {}", function.name, path.display())
                    })?;
                    text.push_str(parts.head);
                    text.push_str(&body);
                    text.push_str(parts.tail);
                    functions += 1;
                }
                other => text.push_str(other.text()),
            }
        }

        let extension = code_type
            .matching_extension(file_name, role)
            .unwrap_or_default();
        let stem = &file_name[..file_name.len() - extension.len()];
        let dest = to_dir.join(format!("{}{}", stem, model.source_extension_for(path)));
        if dest.exists() {
            warn!("{} overwrites {}", path.display(), dest.display());
        }
        fs::write(&dest, text).with_context(|| format!("Failed to write {}", dest.display()))?;

        debug!("{} -> {} ({} functions)", path.display(), dest.display(), functions);
        stats.files_transformed += 1;
        stats.functions_transformed += functions;
        Ok(())
    }
}

fn copy_file(from: &Path, to: &Path, stats: &mut TransformStats) -> Result<()> {
    if to.exists() {
        warn!("{} overwrites {}", from.display(), to.display());
    }
    fs::copy(from, to).with_context(|| format!("Failed to copy {} to {}", from.display(), to.display()))?;
    stats.files_copied += 1;
    Ok(())
}

//! Extraction over a dataset tree.
//!
//! A repo root holds one directory per artifact. Every file of an artifact is
//! routed to the example database of each language that claims it, then each
//! database is finalized and its pairs are appended to the dataset.

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use walkdir::WalkDir;

use crate::code_type::{CodeType, FileRole, Lang, LanguageModel};
use crate::config::Config;
use crate::dataset::ModelData;
use crate::error::is_interrupted;
use crate::example_db::ExampleDb;
use crate::interrupt::Interrupt;
use crate::paths;

/// Counters for one extraction run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractStats {
    pub artifacts: usize,
    pub source_files: usize,
    pub decompiled_files: usize,
    pub ignored_files: usize,
    pub failed_files: usize,
    pub examples: usize,
    pub missing_sources: usize,
    pub missing_decompileds: usize,
    pub elapsed: Duration,
}

pub struct Walker {
    models: Vec<Box<dyn LanguageModel>>,
    interrupt: Interrupt,
}

impl Walker {
    /// One language model per code type, in the given order
    pub fn new(code_types: &[&'static CodeType], config: &Config, interrupt: Interrupt) -> Result<Self> {
        let models = code_types
            .iter()
            .map(|code_type| code_type.language_model(config))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { models, interrupt })
    }

    /// Extract every artifact directory under `repo` in name order
    ///
    /// Fails before any work if `repo` is not a directory. On failure or
    /// interruption `data` keeps the examples of the finished artifacts.
    pub fn add_repo(&mut self, data: &mut ModelData, repo: &Path) -> Result<ExtractStats> {
        paths::check_dir(repo)?;
        let start = Instant::now();
        let mut stats = ExtractStats::default();

        let mut entries: Vec<PathBuf> = std::fs::read_dir(repo)
            .with_context(|| format!("Failed to list {}", repo.display()))?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<_>>()
            .with_context(|| format!("Failed to list {}", repo.display()))?;
        entries.sort();

        for entry in entries {
            if data.is_full() {
                info!("Reached {} examples, stopping", data.len());
                break;
            }
            if !entry.is_dir() {
                debug!("Skipping loose file {}", entry.display());
                continue;
            }
            self.add_artifact(data, &entry, &mut stats)?;
        }

        stats.elapsed = start.elapsed();
        Ok(stats)
    }

    /// Extract one artifact. Its examples are appended to `data` only once
    /// all of its files have been read.
    pub fn add_artifact(&mut self, data: &mut ModelData, artifact: &Path, stats: &mut ExtractStats) -> Result<()> {
        let mut dbs: Vec<(Lang, Box<dyn ExampleDb + '_>)> = self
            .models
            .iter_mut()
            .map(|model| (model.code_type().lang, model.example_db(artifact)))
            .collect();

        let mut artifact_stats = ExtractStats::default();
        if let Err(e) = feed_artifact(&mut dbs, artifact, data, &self.interrupt, &mut artifact_stats) {
            for (_, db) in dbs.iter_mut() {
                db.process_interrupt();
            }
            if is_interrupted(&e) {
                info!("Interrupted while extracting {}", artifact.display());
            } else {
                error!("Failed to extract {}: {:#}", artifact.display(), e);
            }
            return Err(e.context(format!("While extracting artifact {}", artifact.display())));
        }

        for (lang, db) in dbs {
            let built = db.build_examples();
            artifact_stats.missing_sources += built.missing_sources.len();
            artifact_stats.missing_decompileds += built.missing_decompileds.len();
            artifact_stats.examples += data.extend(lang, built.pairs);
        }

        info!(
            "{}: {} examples ({} total)",
            artifact.display(),
            artifact_stats.examples,
            data.len()
        );
        stats.merge(&artifact_stats);
        stats.artifacts += 1;
        Ok(())
    }
}

impl ExtractStats {
    fn merge(&mut self, other: &ExtractStats) {
        self.source_files += other.source_files;
        self.decompiled_files += other.decompiled_files;
        self.ignored_files += other.ignored_files;
        self.failed_files += other.failed_files;
        self.examples += other.examples;
        self.missing_sources += other.missing_sources;
        self.missing_decompileds += other.missing_decompileds;
    }
}

/// Route every file of an artifact until it is exhausted or the cap is reached
fn feed_artifact(
    dbs: &mut [(Lang, Box<dyn ExampleDb + '_>)],
    artifact: &Path,
    data: &ModelData,
    interrupt: &Interrupt,
    stats: &mut ExtractStats,
) -> Result<()> {
    let walker = WalkDir::new(artifact).follow_links(false).sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", artifact.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        interrupt.check()?;

        if let Some(remaining) = data.remaining() {
            let pending: usize = dbs.iter().map(|(_, db)| db.pending_examples()).sum();
            if pending >= remaining {
                debug!("Example cap reached, not reading further files of {}", artifact.display());
                break;
            }
        }

        route_file(dbs, entry.path(), stats);
    }
    Ok(())
}

fn route_file(dbs: &mut [(Lang, Box<dyn ExampleDb + '_>)], path: &Path, stats: &mut ExtractStats) {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut claimed = None;
    for (lang, db) in dbs.iter_mut() {
        let role = lang.code_type().classify(&file_name);
        let outcome = match role {
            Some(FileRole::Source) => db.add_source(path),
            Some(FileRole::Decompiled) => db.add_decompiled(path),
            Some(FileRole::Bytecode) | None => continue,
        };
        claimed = role;
        if let Err(e) = outcome {
            e.log();
            stats.failed_files += 1;
        }
    }

    match claimed {
        Some(FileRole::Source) => stats.source_files += 1,
        Some(FileRole::Decompiled) => stats.decompiled_files += 1,
        _ => {
            debug!("Ignoring {}", path.display());
            stats.ignored_files += 1;
        }
    }
}

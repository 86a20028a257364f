//! The extracted dataset: aligned source, decompiled and language columns.

use anyhow::{bail, Context, Result};
use colored::*;
use serde::{Deserialize, Serialize};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::code_type::Lang;

/// Aligned example columns plus a cap on their length
///
/// All three columns always have the same length. A `max_len` of 0 means no cap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelData {
    max_len: usize,
    sources: Vec<String>,
    decompileds: Vec<String>,
    code_types: Vec<Lang>,
}

/// One row of a [`ModelData`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Example<'a> {
    pub lang: Lang,
    pub source: &'a str,
    pub decompiled: &'a str,
}

impl ModelData {
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn is_full(&self) -> bool {
        self.max_len > 0 && self.len() >= self.max_len
    }

    /// Rows that still fit under the cap
    pub fn remaining(&self) -> Option<usize> {
        (self.max_len > 0).then(|| self.max_len.saturating_sub(self.len()))
    }

    /// Append one row. `false` if the cap is already reached.
    pub fn push(&mut self, lang: Lang, source: String, decompiled: String) -> bool {
        if self.is_full() {
            return false;
        }
        self.sources.push(source);
        self.decompileds.push(decompiled);
        self.code_types.push(lang);
        true
    }

    /// Append pairs of one language in order, stopping at the cap. Returns rows added.
    pub fn extend(&mut self, lang: Lang, pairs: impl IntoIterator<Item = (String, String)>) -> usize {
        let mut added = 0;
        for (source, decompiled) in pairs {
            if !self.push(lang, source, decompiled) {
                break;
            }
            added += 1;
        }
        added
    }

    pub fn rows(&self) -> impl Iterator<Item = Example<'_>> + '_ {
        self.sources
            .iter()
            .zip(&self.decompileds)
            .zip(&self.code_types)
            .map(|((source, decompiled), lang)| Example {
                lang: *lang,
                source,
                decompiled,
            })
    }

    /// Move the last `floor(len * fraction)` rows into a new dataset
    pub fn split_off_end(&mut self, fraction: f64) -> Result<ModelData> {
        if !(0.0..=1.0).contains(&fraction) {
            bail!("Split fraction must be between 0 and 1, got {}", fraction);
        }
        let held_out = (self.len() as f64 * fraction).floor() as usize;
        let at = self.len() - held_out.min(self.len());

        Ok(ModelData {
            max_len: self.max_len,
            sources: self.sources.split_off(at),
            decompileds: self.decompileds.split_off(at),
            code_types: self.code_types.split_off(at),
        })
    }

    /// Keep only rows of the given languages
    pub fn limit_code_types(&mut self, langs: &[Lang]) {
        let keep: Vec<bool> = self.code_types.iter().map(|lang| langs.contains(lang)).collect();
        self.retain_rows(|index| keep[index]);
    }

    /// Drop the first `skip` rows, then keep at most `count` (0 keeps all)
    pub fn limit_count(&mut self, count: usize, skip: usize) {
        let end = if count == 0 {
            usize::MAX
        } else {
            skip.saturating_add(count)
        };
        self.retain_rows(|index| index >= skip && index < end);
    }

    /// Deterministic reorder for a given seed
    pub fn shuffle(&mut self, seed: u64) {
        let mut order: Vec<usize> = (0..self.len()).collect();
        fastrand::Rng::with_seed(seed).shuffle(&mut order);
        self.reorder(&order);
    }

    /// Stable sort by source text length, shortest first
    pub fn sort_by_source_len(&mut self) {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by_key(|&index| self.sources[index].len());
        self.reorder(&order);
    }

    /// Sort by source length and write JSON
    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.sort_by_source_len();
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &*self)
            .with_context(|| format!("Failed to write dataset to {}", path.display()))?;
        writer.flush()?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open dataset {}", path.display()))?;
        let data: ModelData = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Invalid dataset {}", path.display()))?;

        if data.decompileds.len() != data.sources.len() || data.code_types.len() != data.sources.len() {
            bail!(
                "Dataset {} has misaligned columns: {} sources, {} decompileds, {} code types",
                path.display(),
                data.sources.len(),
                data.decompileds.len(),
                data.code_types.len()
            );
        }
        Ok(data)
    }

    /// Count of rows per language, in first-seen order
    pub fn lang_counts(&self) -> Vec<(Lang, usize)> {
        let mut counts: Vec<(Lang, usize)> = Vec::new();
        for lang in &self.code_types {
            match counts.iter_mut().find(|(seen, _)| seen == lang) {
                Some((_, count)) => *count += 1,
                None => counts.push((*lang, 1)),
            }
        }
        counts
    }

    /// Print every row for a human
    pub fn print(&self) {
        for (index, row) in self.rows().enumerate() {
            println!("{}", format!("━━━ #{} [{}]", index, row.lang).bold().blue());
            println!("{}", "source:".green().bold());
            println!("{}", row.source);
            println!("{}", "decompiled:".yellow().bold());
            println!("{}", row.decompiled);
        }
    }

    fn retain_rows(&mut self, mut keep: impl FnMut(usize) -> bool) {
        let keep: Vec<bool> = (0..self.len()).map(&mut keep).collect();
        retain_indexed(&mut self.sources, &keep);
        retain_indexed(&mut self.decompileds, &keep);
        retain_indexed(&mut self.code_types, &keep);
    }

    fn reorder(&mut self, order: &[usize]) {
        self.sources = take_in_order(std::mem::take(&mut self.sources), order);
        self.decompileds = take_in_order(std::mem::take(&mut self.decompileds), order);
        self.code_types = take_in_order(std::mem::take(&mut self.code_types), order);
    }
}

fn retain_indexed<T>(column: &mut Vec<T>, keep: &[bool]) {
    let mut index = 0;
    column.retain(|_| {
        let kept = keep[index];
        index += 1;
        kept
    });
}

fn take_in_order<T>(column: Vec<T>, order: &[usize]) -> Vec<T> {
    let mut slots: Vec<Option<T>> = column.into_iter().map(Some).collect();
    order.iter().filter_map(|&index| slots[index].take()).collect()
}

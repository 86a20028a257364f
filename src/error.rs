//! Per-file failure outcomes and the interruption marker.
//!
//! Failures scoped to a single file are expected during extraction and are
//! returned as [`ScrapeError`] values. Callers log them and move on. Anything
//! that should stop a run travels as an `anyhow::Error`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("{} is {size} bytes, over the {limit} byte limit", .path.display())]
    Oversized { path: PathBuf, size: u64, limit: u64 },

    #[error("failed to read {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    #[error(
        "bad decompiled format in {}: {segments} segments after splitting on function sentinels",
        .path.display()
    )]
    Format { path: PathBuf, segments: usize },
}

impl ScrapeError {
    /// Level a skipped file is reported at
    pub fn log_level(&self) -> log::Level {
        match self {
            ScrapeError::Oversized { .. } => log::Level::Debug,
            _ => log::Level::Warn,
        }
    }

    /// Log this error at its level
    pub fn log(&self) {
        log::log!(self.log_level(), "Skipping file: {}", self);
    }
}

/// The user asked the run to stop
#[derive(Debug, Error)]
#[error("interrupted")]
pub struct Interrupted;

/// Whether an error chain carries [`Interrupted`]
pub fn is_interrupted(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| cause.is::<Interrupted>())
}

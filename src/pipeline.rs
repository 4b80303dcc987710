//! Batch driver
//!
//! Walks a dataset directory and loads every matching file through a
//! `DataSource`, one transaction per file. The first failing file stops the
//! batch: files before it stay committed, files after it are not attempted.

use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::error::Result;
use crate::source::{discover_files, DataSource, LogSource, SongSource};
use crate::store::{LoadStats, WarehouseStore};

/// Outcome of loading one dataset directory
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub source: String,
    pub root: PathBuf,
    pub files_found: usize,
    pub files_processed: usize,
    pub stats: LoadStats,
}

pub fn process_data(
    store: &mut WarehouseStore,
    root: &Path,
    pattern: &str,
    source: &dyn DataSource,
) -> Result<BatchReport> {
    let files = discover_files(root, pattern)?;
    let total = files.len();

    println!("{} files found in {}", total, root.display());
    info!(source = source.id(), files = total, root = %root.display(), "Starting batch");

    let mut report = BatchReport {
        source: source.id().to_string(),
        root: root.to_path_buf(),
        files_found: total,
        files_processed: 0,
        stats: LoadStats::default(),
    };

    for (i, path) in files.iter().enumerate() {
        let stats = match store.with_file_transaction(|sink| source.process_file(sink, path)) {
            Ok(stats) => stats,
            Err(e) => {
                error!(
                    file = %path.display(),
                    committed = report.files_processed,
                    "Batch aborted: {}",
                    e
                );
                return Err(e);
            }
        };

        report.stats.merge(&stats);
        report.files_processed = i + 1;
        println!("{}/{} files processed.", i + 1, total);
    }

    info!(
        source = source.id(),
        files = report.files_processed,
        matched_plays = report.stats.matched_plays,
        "Batch complete"
    );

    Ok(report)
}

/// Load songs first so that log plays can be resolved against them
pub fn run_all(
    store: &mut WarehouseStore,
    song_dir: &Path,
    log_dir: &Path,
    pattern: &str,
) -> Result<Vec<BatchReport>> {
    let songs = process_data(store, song_dir, pattern, &SongSource)?;
    let logs = process_data(store, log_dir, pattern, &LogSource)?;

    Ok(vec![songs, logs])
}

//! Load command implementation: a single dataset

use anyhow::{Context, Result};
use clap::ValueEnum;
use std::path::Path;

use crate::pipeline;
use crate::source::{DataSource, LogSource, SongSource};
use crate::store::WarehouseStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Dataset {
    /// Song metadata files
    Songs,
    /// Event log files
    Logs,
}

impl Dataset {
    pub fn source(self) -> Box<dyn DataSource> {
        match self {
            Dataset::Songs => Box::new(SongSource),
            Dataset::Logs => Box::new(LogSource),
        }
    }
}

pub fn run(store: &mut WarehouseStore, dataset: Dataset, dir: &Path, pattern: &str) -> Result<()> {
    let source = dataset.source();
    println!("📂 {} ({})", source.id(), source.description());

    let report = pipeline::process_data(store, dir, pattern, source.as_ref())
        .with_context(|| format!("Failed to load {} from {}", source.id(), dir.display()))?;

    super::print_report(&report);
    Ok(())
}

//! Run command implementation: songs, then logs

use anyhow::{Context, Result};
use std::path::Path;

use crate::pipeline;
use crate::store::WarehouseStore;

pub fn run(store: &mut WarehouseStore, song_dir: &Path, log_dir: &Path, pattern: &str) -> Result<()> {
    let reports = pipeline::run_all(store, song_dir, log_dir, pattern).context("ETL run failed")?;

    for report in &reports {
        super::print_report(report);
    }

    println!("\n✅ Load complete!");
    Ok(())
}

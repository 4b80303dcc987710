pub mod load;
pub mod reset;
pub mod run;
pub mod stats;

use crate::pipeline::BatchReport;

/// Per-table summary printed after a batch
pub(crate) fn print_report(report: &BatchReport) {
    println!(
        "\n{}: {}/{} files from {}",
        report.source,
        report.files_processed,
        report.files_found,
        report.root.display()
    );

    for (table, counts) in report.stats.by_table() {
        println!(
            "   {:<10} {:>8} inserted {:>8} already present",
            table, counts.inserted, counts.ignored
        );
    }

    let plays = report.stats.songplays.inserted + report.stats.songplays.ignored;
    if plays > 0 {
        println!(
            "   {} of {} plays matched a known song",
            report.stats.matched_plays, plays
        );
    }
}

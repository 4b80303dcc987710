//! Input datasets and the rows they map to
//!
//! Two datasets feed the warehouse:
//! - Song files: one JSON record per file, mapped to a song and an artist row
//! - Log files: newline-delimited events, of which only `NextSong` plays
//!   produce time, user and songplay rows

mod logs;
mod song;
mod time;

pub use logs::{map_log_lines, LogRows, LogSource, PendingPlay};
pub use song::{map_song_record, SongSource};
pub use time::{derive_time, format_start_time};

use serde::Deserialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{EtlError, Result};
use crate::store::{LoadStats, Sink};

/// Row for the `songs` dimension
#[derive(Debug, Clone, PartialEq)]
pub struct SongRow {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    /// Unknown years arrive as 0 or null and are stored as given
    pub year: Option<i32>,
    pub duration: f64,
}

/// Row for the `artists` dimension
#[derive(Debug, Clone, PartialEq)]
pub struct ArtistRow {
    pub artist_id: String,
    pub name: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Row for the `users` dimension
#[derive(Debug, Clone, PartialEq)]
pub struct UserRow {
    pub user_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: Level,
}

/// Row for the `time` dimension, all fields derived from `start_time`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRow {
    pub start_time: String,
    pub hour: u32,
    pub day: u32,
    /// ISO 8601 week number
    pub week: u32,
    pub month: u32,
    pub year: i32,
    /// Monday = 0 .. Sunday = 6
    pub weekday: u32,
}

/// Row for the `songplays` fact table
#[derive(Debug, Clone, PartialEq)]
pub struct SongPlayRow {
    pub start_time: String,
    pub user_id: i64,
    pub level: Level,
    pub song_id: Option<String>,
    pub artist_id: Option<String>,
    pub session_id: i64,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

/// Subscription level of a user at the time of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Free,
    Paid,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Free => "free",
            Level::Paid => "paid",
        }
    }
}

/// A kind of input file the batch driver can load
pub trait DataSource {
    /// Short identifier used in logs and reports ("songs", "logs")
    fn id(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str;

    /// Map one file and write its rows through the sink
    fn process_file(&self, sink: &Sink, path: &Path) -> Result<LoadStats>;
}

/// Error for a line that could not be read. Bytes that are not UTF-8 are a
/// record problem; anything else is a read failure.
pub(crate) fn line_error(path: &Path, line: usize, err: std::io::Error) -> EtlError {
    if err.kind() == std::io::ErrorKind::InvalidData {
        EtlError::malformed(path, line, err.to_string())
    } else {
        EtlError::Read {
            path: path.to_path_buf(),
            source: err,
        }
    }
}

/// Recursively collect files under `root` whose file name matches `pattern`,
/// in directory-walk order
pub fn discover_files(root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let matcher = glob::Pattern::new(pattern)?;
    let mut files = vec![];

    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let matches = entry
            .file_name()
            .to_str()
            .map(|name| matcher.matches(name))
            .unwrap_or(false);

        if matches {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

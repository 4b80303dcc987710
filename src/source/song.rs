//! Song metadata files
//!
//! Each file holds a single JSON record describing one song and its artist.

use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

use super::{line_error, ArtistRow, DataSource, SongRow};
use crate::error::{EtlError, Result};
use crate::store::{LoadStats, Sink};

#[derive(Debug, Deserialize)]
struct SongRecord {
    song_id: String,
    title: String,
    artist_id: String,
    year: Option<i32>,
    duration: f64,
    artist_name: String,
    artist_location: Option<String>,
    artist_latitude: Option<f64>,
    artist_longitude: Option<f64>,
}

/// Project one raw song record into its song and artist rows
pub fn map_song_record(path: &Path, line: usize, raw: &str) -> Result<(SongRow, ArtistRow)> {
    let record: SongRecord =
        serde_json::from_str(raw).map_err(|e| EtlError::malformed(path, line, e.to_string()))?;

    let song = SongRow {
        song_id: record.song_id,
        title: record.title,
        artist_id: record.artist_id.clone(),
        year: record.year,
        duration: record.duration,
    };

    let artist = ArtistRow {
        artist_id: record.artist_id,
        name: record.artist_name,
        location: record.artist_location,
        latitude: record.artist_latitude,
        longitude: record.artist_longitude,
    };

    Ok((song, artist))
}

/// Read the first record of a song file
fn read_song_file(path: &Path) -> Result<(SongRow, ArtistRow)> {
    let file = File::open(path).map_err(|source| EtlError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    let mut mapped = None;
    let mut line_number = 0;

    for line in reader.lines() {
        line_number += 1;
        let line = line.map_err(|e| line_error(path, line_number, e))?;

        if line.trim().is_empty() {
            continue;
        }

        if mapped.is_some() {
            debug!(file = %path.display(), line = line_number, "Ignoring extra record in song file");
            continue;
        }

        mapped = Some(map_song_record(path, line_number, &line)?);
    }

    mapped.ok_or_else(|| EtlError::malformed(path, line_number, "file contains no song record"))
}

/// Loads song files into `songs` and `artists`
pub struct SongSource;

impl DataSource for SongSource {
    fn id(&self) -> &str {
        "songs"
    }

    fn description(&self) -> &str {
        "Song metadata (one record per file)"
    }

    fn process_file(&self, sink: &Sink, path: &Path) -> Result<LoadStats> {
        let (song, artist) = read_song_file(path)?;

        let mut stats = LoadStats::default();
        stats.songs.record(sink.insert_song(&song)?);
        stats.artists.record(sink.insert_artist(&artist)?);

        Ok(stats)
    }
}

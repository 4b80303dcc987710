//! Application event logs
//!
//! Newline-delimited JSON, one event per line. Only `NextSong` events are
//! song plays; every other page view is dropped before typed decoding, so
//! anonymous events (empty `userId`, null song fields) never fail a file.

use serde::{de, Deserialize, Deserializer};
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

use super::{derive_time, line_error, DataSource, Level, SongPlayRow, TimeRow, UserRow};
use crate::error::{EtlError, Result};
use crate::store::{LoadStats, Sink, SongMatch};

const NEXT_SONG: &str = "NextSong";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogEvent {
    ts: i64,
    #[serde(deserialize_with = "deserialize_user_id")]
    user_id: i64,
    first_name: Option<String>,
    last_name: Option<String>,
    gender: Option<String>,
    level: Level,
    song: Option<String>,
    artist: Option<String>,
    length: Option<f64>,
    session_id: i64,
    location: Option<String>,
    user_agent: Option<String>,
}

/// Logs carry `userId` as a string; accept plain integers too
fn deserialize_user_id<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawUserId {
        Int(i64),
        Text(String),
    }

    match RawUserId::deserialize(deserializer)? {
        RawUserId::Int(id) => Ok(id),
        RawUserId::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid userId {:?}", text))),
    }
}

/// A song play waiting for its song/artist ids to be resolved
#[derive(Debug, Clone, PartialEq)]
pub struct PendingPlay {
    pub start_time: String,
    pub user_id: i64,
    pub level: Level,
    pub session_id: i64,
    pub location: Option<String>,
    pub user_agent: Option<String>,
    pub song: Option<String>,
    pub artist: Option<String>,
    pub length: Option<f64>,
}

impl PendingPlay {
    pub fn into_row(self, matched: Option<SongMatch>) -> SongPlayRow {
        let (song_id, artist_id) = match matched {
            Some(m) => (Some(m.song_id), Some(m.artist_id)),
            None => (None, None),
        };

        SongPlayRow {
            start_time: self.start_time,
            user_id: self.user_id,
            level: self.level,
            song_id,
            artist_id,
            session_id: self.session_id,
            location: self.location,
            user_agent: self.user_agent,
        }
    }
}

/// Rows mapped from one log file, each list in file-read order
#[derive(Debug, Default)]
pub struct LogRows {
    pub times: Vec<TimeRow>,
    pub users: Vec<UserRow>,
    pub plays: Vec<PendingPlay>,
}

/// Map every `NextSong` event read from `reader` into dimension rows and
/// pending plays
pub fn map_log_lines<R: BufRead>(path: &Path, reader: R) -> Result<LogRows> {
    let mut rows = LogRows::default();
    let mut line_number = 0;
    let mut skipped = 0usize;

    for line in reader.lines() {
        line_number += 1;
        let line = line.map_err(|e| line_error(path, line_number, e))?;

        if line.trim().is_empty() {
            continue;
        }

        let json: Value = serde_json::from_str(&line)
            .map_err(|e| EtlError::malformed(path, line_number, e.to_string()))?;

        if json.get("page").and_then(|v| v.as_str()) != Some(NEXT_SONG) {
            skipped += 1;
            continue;
        }

        let event: LogEvent = serde_json::from_value(json)
            .map_err(|e| EtlError::malformed(path, line_number, e.to_string()))?;

        let time = derive_time(event.ts).ok_or_else(|| {
            EtlError::malformed(path, line_number, format!("timestamp {} out of range", event.ts))
        })?;

        rows.users.push(UserRow {
            user_id: event.user_id,
            first_name: event.first_name,
            last_name: event.last_name,
            gender: event.gender,
            level: event.level,
        });

        rows.plays.push(PendingPlay {
            start_time: time.start_time.clone(),
            user_id: event.user_id,
            level: event.level,
            session_id: event.session_id,
            location: event.location,
            user_agent: event.user_agent,
            song: event.song,
            artist: event.artist,
            length: event.length,
        });

        rows.times.push(time);
    }

    debug!(
        file = %path.display(),
        plays = rows.plays.len(),
        skipped,
        "Mapped log file"
    );

    Ok(rows)
}

/// Loads event logs into `time`, `users` and `songplays`
pub struct LogSource;

impl DataSource for LogSource {
    fn id(&self) -> &str {
        "logs"
    }

    fn description(&self) -> &str {
        "Application event logs (NextSong plays)"
    }

    fn process_file(&self, sink: &Sink, path: &Path) -> Result<LoadStats> {
        let file = File::open(path).map_err(|source| EtlError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let rows = map_log_lines(path, BufReader::new(file))?;

        let mut stats = LoadStats::default();

        for time in &rows.times {
            stats.time.record(sink.insert_time(time)?);
        }

        for user in &rows.users {
            stats.users.record(sink.insert_user(user)?);
        }

        for play in rows.plays {
            let matched = match (&play.song, &play.artist, play.length) {
                (Some(song), Some(artist), Some(length)) => sink.find_song(song, artist, length)?,
                _ => None,
            };
            if matched.is_some() {
                stats.matched_plays += 1;
            }

            let row = play.into_row(matched);
            stats.songplays.record(sink.insert_songplay(&row)?);
        }

        Ok(stats)
    }
}

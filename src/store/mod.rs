//! Warehouse storage with SQLite
//!
//! `WarehouseStore` owns the connection. Loading happens through a `Sink`,
//! which only exists inside `with_file_transaction`: each input file gets
//! its own transaction, committed when the file is done and rolled back if
//! anything in it fails.

mod schema;

use rusqlite::{params, Connection};
use std::path::Path;
use tracing::warn;

use crate::error::Result;
use crate::source::{ArtistRow, SongPlayRow, SongRow, TimeRow, UserRow};

pub use schema::{DROP_SCHEMA, SCHEMA, TABLES};

pub struct WarehouseStore {
    conn: Connection,
}

impl WarehouseStore {
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Drop all five tables and recreate them empty
    pub fn reset(&self) -> Result<()> {
        self.conn.execute_batch(DROP_SCHEMA)?;
        self.init_schema()
    }

    /// Run `f` inside a transaction scoped to one input file.
    ///
    /// Commits if `f` succeeds. On error the transaction is dropped, which
    /// rolls back every row written through the sink.
    pub fn with_file_transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&Sink) -> Result<T>,
    {
        let tx = self.conn.transaction()?;
        let value = f(&Sink::new(&tx))?;
        tx.commit()?;
        Ok(value)
    }

    /// Row count per table, in `TABLES` order
    pub fn table_counts(&self) -> Result<Vec<(&'static str, i64)>> {
        TABLES
            .iter()
            .map(|table| -> Result<(&'static str, i64)> {
                let count: i64 = self.conn.query_row(
                    &format!("SELECT COUNT(*) FROM {}", table),
                    [],
                    |row| row.get(0),
                )?;
                Ok((*table, count))
            })
            .collect()
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

// ============================================
// SINK
// ============================================

const SONG_SELECT: &str = r#"SELECT s.song_id, a.artist_id
   FROM songs s
   JOIN artists a ON s.artist_id = a.artist_id
   WHERE s.title = ?1 AND a.name = ?2 AND s.duration = ?3"#;

/// Resolved ids for a played song
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongMatch {
    pub song_id: String,
    pub artist_id: String,
}

/// Insert-or-ignore writer bound to the current file's transaction.
///
/// Every insert returns `true` if a row was written and `false` if the
/// primary key already existed. Existing rows are never updated.
pub struct Sink<'a> {
    conn: &'a Connection,
}

impl<'a> Sink<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn insert_song(&self, song: &SongRow) -> Result<bool> {
        let changed = self.conn.execute(
            "INSERT INTO songs (song_id, title, artist_id, year, duration)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (song_id) DO NOTHING",
            params![
                song.song_id,
                song.title,
                song.artist_id,
                song.year,
                song.duration
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn insert_artist(&self, artist: &ArtistRow) -> Result<bool> {
        let changed = self.conn.execute(
            "INSERT INTO artists (artist_id, name, location, latitude, longitude)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (artist_id) DO NOTHING",
            params![
                artist.artist_id,
                artist.name,
                artist.location,
                artist.latitude,
                artist.longitude
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn insert_user(&self, user: &UserRow) -> Result<bool> {
        let changed = self.conn.execute(
            "INSERT INTO users (user_id, first_name, last_name, gender, level)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (user_id) DO NOTHING",
            params![
                user.user_id,
                user.first_name,
                user.last_name,
                user.gender,
                user.level.as_str()
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn insert_time(&self, time: &TimeRow) -> Result<bool> {
        let changed = self.conn.execute(
            "INSERT INTO time (start_time, hour, day, week, month, year, weekday)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (start_time) DO NOTHING",
            params![
                time.start_time,
                time.hour,
                time.day,
                time.week,
                time.month,
                time.year,
                time.weekday
            ],
        )?;
        Ok(changed > 0)
    }

    /// `songplay_id` is generated, so the conflict clause never fires in
    /// practice and reloading a log file appends its plays again.
    pub fn insert_songplay(&self, play: &SongPlayRow) -> Result<bool> {
        let changed = self.conn.execute(
            r#"INSERT INTO songplays
               (start_time, user_id, level, song_id, artist_id, session_id, location, user_agent)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT (songplay_id) DO NOTHING"#,
            params![
                play.start_time,
                play.user_id,
                play.level.as_str(),
                play.song_id,
                play.artist_id,
                play.session_id,
                play.location,
                play.user_agent,
            ],
        )?;
        Ok(changed > 0)
    }

    /// Find the song played, by exact title, artist name and duration.
    ///
    /// Duration is compared with float equality, so a value that went
    /// through any rounding will not match. Returns `None` when there is no
    /// match or more than one.
    pub fn find_song(
        &self,
        title: &str,
        artist_name: &str,
        duration: f64,
    ) -> Result<Option<SongMatch>> {
        let mut stmt = self.conn.prepare_cached(SONG_SELECT)?;
        let mut matches = stmt
            .query_map(params![title, artist_name, duration], |row| {
                Ok(SongMatch {
                    song_id: row.get(0)?,
                    artist_id: row.get(1)?,
                })
            })?
            .take(2)
            .collect::<rusqlite::Result<Vec<_>>>()?;

        if matches.len() > 1 {
            warn!(title, artist = artist_name, duration, "Ambiguous song lookup, leaving play unmatched");
            return Ok(None);
        }

        Ok(matches.pop())
    }
}

// ============================================
// LOAD STATS
// ============================================

/// Inserted/ignored counts for one table
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RowCounts {
    pub inserted: u64,
    pub ignored: u64,
}

impl RowCounts {
    pub fn record(&mut self, inserted: bool) {
        if inserted {
            self.inserted += 1;
        } else {
            self.ignored += 1;
        }
    }

    fn merge(&mut self, other: RowCounts) {
        self.inserted += other.inserted;
        self.ignored += other.ignored;
    }
}

/// What a file (or a whole batch) wrote to each table
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadStats {
    pub songs: RowCounts,
    pub artists: RowCounts,
    pub users: RowCounts,
    pub time: RowCounts,
    pub songplays: RowCounts,
    /// Plays whose song/artist ids were resolved
    pub matched_plays: u64,
}

impl LoadStats {
    pub fn merge(&mut self, other: &LoadStats) {
        self.songs.merge(other.songs);
        self.artists.merge(other.artists);
        self.users.merge(other.users);
        self.time.merge(other.time);
        self.songplays.merge(other.songplays);
        self.matched_plays += other.matched_plays;
    }

    /// Non-empty tables as (name, counts), in `TABLES` order
    pub fn by_table(&self) -> Vec<(&'static str, RowCounts)> {
        [
            ("songs", self.songs),
            ("artists", self.artists),
            ("users", self.users),
            ("time", self.time),
            ("songplays", self.songplays),
        ]
        .into_iter()
        .filter(|(_, counts)| counts.inserted + counts.ignored > 0)
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Level;

    fn song(song_id: &str, title: &str, artist_id: &str, duration: f64) -> SongRow {
        SongRow {
            song_id: song_id.to_string(),
            title: title.to_string(),
            artist_id: artist_id.to_string(),
            year: Some(2004),
            duration,
        }
    }

    fn artist(artist_id: &str, name: &str) -> ArtistRow {
        ArtistRow {
            artist_id: artist_id.to_string(),
            name: name.to_string(),
            location: None,
            latitude: None,
            longitude: None,
        }
    }

    fn user(user_id: i64, level: Level) -> UserRow {
        UserRow {
            user_id,
            first_name: Some("Kate".to_string()),
            last_name: Some("Harrell".to_string()),
            gender: Some("F".to_string()),
            level,
        }
    }

    #[test]
    fn test_schema_creates_all_tables() {
        let store = WarehouseStore::open_in_memory().unwrap();
        let counts = store.table_counts().unwrap();
        let names: Vec<&str> = counts.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, TABLES);
        assert!(counts.iter().all(|(_, count)| *count == 0));
    }

    #[test]
    fn test_insert_or_ignore_keeps_first_row() {
        let mut store = WarehouseStore::open_in_memory().unwrap();

        let (first, second) = store
            .with_file_transaction(|sink| {
                Ok((
                    sink.insert_user(&user(15, Level::Free))?,
                    sink.insert_user(&user(15, Level::Paid))?,
                ))
            })
            .unwrap();
        assert!(first);
        assert!(!second);

        let level: String = store
            .connection()
            .query_row("SELECT level FROM users WHERE user_id = 15", [], |row| row.get(0))
            .unwrap();
        assert_eq!(level, "free");
    }

    #[test]
    fn test_find_song_exact_match() {
        let mut store = WarehouseStore::open_in_memory().unwrap();

        let (hit, wrong_duration, wrong_artist) = store
            .with_file_transaction(|sink| {
                sink.insert_song(&song("SOTEST", "Test Song", "ARTEST", 210.5))?;
                sink.insert_artist(&artist("ARTEST", "Test Artist"))?;
                Ok((
                    sink.find_song("Test Song", "Test Artist", 210.5)?,
                    sink.find_song("Test Song", "Test Artist", 210.50001)?,
                    sink.find_song("Test Song", "Other Artist", 210.5)?,
                ))
            })
            .unwrap();

        assert_eq!(
            hit,
            Some(SongMatch {
                song_id: "SOTEST".to_string(),
                artist_id: "ARTEST".to_string(),
            })
        );
        assert_eq!(wrong_duration, None);
        assert_eq!(wrong_artist, None);
    }

    #[test]
    fn test_find_song_ambiguous_is_no_match() {
        let mut store = WarehouseStore::open_in_memory().unwrap();

        let found = store
            .with_file_transaction(|sink| {
                sink.insert_artist(&artist("ARTEST", "Test Artist"))?;
                sink.insert_song(&song("SOONE", "Test Song", "ARTEST", 210.5))?;
                sink.insert_song(&song("SOTWO", "Test Song", "ARTEST", 210.5))?;
                sink.find_song("Test Song", "Test Artist", 210.5)
            })
            .unwrap();

        assert_eq!(found, None);
    }

    #[test]
    fn test_failed_transaction_rolls_back() {
        let mut store = WarehouseStore::open_in_memory().unwrap();

        let result: Result<()> = store.with_file_transaction(|sink| {
            sink.insert_artist(&artist("ARTEST", "Test Artist"))?;
            Err(crate::error::EtlError::malformed("x.json", 1, "boom"))
        });
        assert!(result.is_err());

        let counts = store.table_counts().unwrap();
        assert!(counts.iter().all(|(_, count)| *count == 0));
    }

    #[test]
    fn test_reset_empties_tables() {
        let mut store = WarehouseStore::open_in_memory().unwrap();
        store
            .with_file_transaction(|sink| sink.insert_artist(&artist("ARTEST", "Test Artist")))
            .unwrap();

        store.reset().unwrap();

        let counts = store.table_counts().unwrap();
        assert!(counts.iter().all(|(_, count)| *count == 0));
    }

    #[test]
    fn test_load_stats_merge() {
        let mut total = LoadStats::default();
        let mut file = LoadStats::default();
        file.songs.record(true);
        file.artists.record(false);
        file.matched_plays = 2;

        total.merge(&file);
        total.merge(&file);

        assert_eq!(total.songs, RowCounts { inserted: 2, ignored: 0 });
        assert_eq!(total.artists, RowCounts { inserted: 0, ignored: 2 });
        assert_eq!(total.matched_plays, 4);
        let tables: Vec<&str> = total.by_table().iter().map(|(name, _)| *name).collect();
        assert_eq!(tables, vec!["songs", "artists"]);
    }
}

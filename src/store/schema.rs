//! SQLite schema definition - star schema for song plays
//!
//! One fact table (songplays) and four dimensions (users, songs, artists,
//! time). Dimension tables are keyed by their natural key so reloads are
//! absorbed by `ON CONFLICT ... DO NOTHING`.

pub const SCHEMA: &str = r#"
-- ============================================
-- FACT
-- ============================================

-- One row per 'NextSong' event; song_id/artist_id are NULL when the
-- played song could not be matched against the songs table
CREATE TABLE IF NOT EXISTS songplays (
    songplay_id INTEGER PRIMARY KEY AUTOINCREMENT,
    start_time TEXT NOT NULL,
    user_id INTEGER,
    level TEXT,                            -- 'free' | 'paid'
    song_id TEXT,
    artist_id TEXT,
    session_id INTEGER,
    location TEXT,
    user_agent TEXT
);

-- ============================================
-- DIMENSIONS
-- ============================================

-- First-seen state per user is kept; later level changes are not applied
CREATE TABLE IF NOT EXISTS users (
    user_id INTEGER PRIMARY KEY,
    first_name TEXT,
    last_name TEXT,
    gender TEXT,                           -- single character
    level TEXT
);

CREATE TABLE IF NOT EXISTS songs (
    song_id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    artist_id TEXT NOT NULL,
    year INTEGER,                          -- 0 = unknown
    duration REAL
);

CREATE TABLE IF NOT EXISTS artists (
    artist_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    location TEXT,
    latitude REAL,
    longitude REAL
);

-- start_time is UTC 'YYYY-MM-DD HH:MM:SS.mmm'
CREATE TABLE IF NOT EXISTS time (
    start_time TEXT PRIMARY KEY,
    hour INTEGER NOT NULL,
    day INTEGER NOT NULL,
    week INTEGER NOT NULL,
    month INTEGER NOT NULL,
    year INTEGER NOT NULL,
    weekday INTEGER NOT NULL               -- Monday = 0
);

-- ============================================
-- INDEXES
-- ============================================

-- Song lookup joins on artist and filters on title/name
CREATE INDEX IF NOT EXISTS idx_songs_title ON songs(title);
CREATE INDEX IF NOT EXISTS idx_artists_name ON artists(name);
"#;

pub const DROP_SCHEMA: &str = r#"
DROP TABLE IF EXISTS songplays;
DROP TABLE IF EXISTS users;
DROP TABLE IF EXISTS songs;
DROP TABLE IF EXISTS artists;
DROP TABLE IF EXISTS time;
"#;

/// Tables in the order they are reported by `stats`
pub const TABLES: &[&str] = &["songs", "artists", "users", "time", "songplays"];

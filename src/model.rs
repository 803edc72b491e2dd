use serde::{Deserialize, Serialize};
use std::ops::Deref;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongPlay {
    pub song_name: String,
    pub artist: String,
    pub genre: String,
    pub play_count: u64,
}

impl SongPlay {
    pub fn new(song_name: &str, artist: &str, genre: &str, play_count: u64) -> Self {
        Self {
            song_name: song_name.to_string(),
            artist: artist.to_string(),
            genre: genre.to_string(),
            play_count,
        }
    }

    pub fn label(&self) -> String {
        format!("{} - {}", self.song_name, self.artist)
    }
}

/// Immutable, ordered snapshot of every play record. Cloning shares the rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    rows: Arc<[SongPlay]>,
}

impl Dataset {
    pub fn new(rows: Vec<SongPlay>) -> Self {
        Self { rows: rows.into() }
    }

    pub fn records(&self) -> &[SongPlay] {
        &self.rows
    }
}

impl Deref for Dataset {
    type Target = [SongPlay];

    fn deref(&self) -> &Self::Target {
        &self.rows
    }
}

impl From<Vec<SongPlay>> for Dataset {
    fn from(rows: Vec<SongPlay>) -> Self {
        Self::new(rows)
    }
}

impl FromIterator<SongPlay> for Dataset {
    fn from_iter<I: IntoIterator<Item = SongPlay>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTotal {
    pub name: String,
    pub play_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBucket {
    pub lower: f64,
    pub upper: f64,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total_plays: u64,
    pub total_songs: usize,
    pub top_song: SongPlay,
    pub top_artist: String,
    pub top_genre: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub summary: Summary,
    pub top_songs: Vec<SongPlay>,
    pub top_artists: Vec<GroupTotal>,
    pub genres: Vec<GroupTotal>,
    pub histogram: Vec<HistogramBucket>,
}

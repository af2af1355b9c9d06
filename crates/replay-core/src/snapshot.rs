//! The document boundary: addressing and snapshot shapes.
//!
//! The persistence collaborator pushes whole-document snapshots addressed
//! by `{collection}/{id}` paths. Everything entering the core is decoded
//! here into a tagged union with an explicit schema; past this point there
//! are no duck-typed field lookups.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grid::YearMonth;
use crate::listen::{ListenDate, ListenEvent};
use crate::types::{ArtistId, TrackId};

/// Errors at the document boundary.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// A document path did not match any known collection.
    #[error("invalid document path: {value}")]
    InvalidPath { value: String },

    /// A document body did not match its collection's schema.
    #[error("invalid {collection} document: {source}")]
    Decode {
        collection: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Address of one document in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocPath {
    /// `songs/{track_id}`
    Song(TrackId),
    /// `artists/{artist_id}`
    Artist(ArtistId),
    /// `history_{year}/{month}`
    HistoryMonth(YearMonth),
}

impl DocPath {
    /// The collection name, as it appears in the path.
    #[must_use]
    pub fn collection(&self) -> String {
        match self {
            Self::Song(_) => "songs".to_string(),
            Self::Artist(_) => "artists".to_string(),
            Self::HistoryMonth(ym) => format!("history_{}", ym.year()),
        }
    }

    /// The document id within its collection.
    #[must_use]
    pub fn doc_id(&self) -> String {
        match self {
            Self::Song(id) => id.to_string(),
            Self::Artist(id) => id.to_string(),
            Self::HistoryMonth(ym) => ym.month().to_string(),
        }
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection(), self.doc_id())
    }
}

impl std::str::FromStr for DocPath {
    type Err = SnapshotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SnapshotError::InvalidPath {
            value: s.to_string(),
        };
        let (collection, id) = s.split_once('/').ok_or_else(invalid)?;
        match collection {
            "songs" => TrackId::new(id).map(Self::Song).map_err(|_| invalid()),
            "artists" => ArtistId::new(id).map(Self::Artist).map_err(|_| invalid()),
            _ => {
                let year = collection.strip_prefix("history_").ok_or_else(invalid)?;
                let year: i32 = year.parse().map_err(|_| invalid())?;
                let month: u32 = id.parse().map_err(|_| invalid())?;
                YearMonth::new(year, month)
                    .map(Self::HistoryMonth)
                    .map_err(|_| invalid())
            }
        }
    }
}

/// A track entry in an artist document's track list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRef {
    pub track_id: TrackId,
    #[serde(rename = "song_name")]
    pub name: String,
}

/// A song reference inside an artist document's first/last listen fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongRef {
    #[serde(rename = "song_name")]
    pub name: String,
}

/// Latest state of one song: scalar totals plus the raw listen log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongAggregate {
    #[serde(rename = "song_name")]
    pub name: String,
    pub artist_name: String,
    pub listen_count: i64,
    #[serde(rename = "listen_time")]
    pub listen_time_ms: i64,
    pub first_listen: ListenDate,
    pub last_listen: ListenDate,
    #[serde(default)]
    pub listens: Vec<ListenEvent>,
}

/// Latest state of one artist: scalar totals plus the expected track list.
/// The per-track listen logs live in the tracks' own song documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistAggregate {
    #[serde(rename = "artist_name")]
    pub name: String,
    pub listen_count: i64,
    #[serde(rename = "listen_time")]
    pub listen_time_ms: i64,
    pub first_listen: SongRef,
    pub first_listen_time: ListenDate,
    pub last_listen: SongRef,
    pub last_listen_time: ListenDate,
    #[serde(default)]
    pub tracks: Vec<TrackRef>,
}

/// Pre-aggregated totals for one calendar month of the full history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthAggregate {
    pub listen_count: i64,
    #[serde(rename = "listen_time")]
    pub listen_time_ms: i64,
    #[serde(rename = "uq_artists")]
    pub unique_artists: Vec<ArtistId>,
    #[serde(rename = "uq_songs")]
    pub unique_songs: Vec<TrackId>,
}

/// A decoded document snapshot, tagged by source collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snapshot {
    Song(SongAggregate),
    Artist(ArtistAggregate),
    HistoryMonth(MonthAggregate),
}

impl Snapshot {
    /// Decodes a raw document body against the schema of the collection
    /// the path addresses.
    pub fn decode(path: &DocPath, value: serde_json::Value) -> Result<Self, SnapshotError> {
        match path {
            DocPath::Song(_) => serde_json::from_value(value)
                .map(Self::Song)
                .map_err(|source| SnapshotError::Decode {
                    collection: "song",
                    source,
                }),
            DocPath::Artist(_) => serde_json::from_value(value)
                .map(Self::Artist)
                .map_err(|source| SnapshotError::Decode {
                    collection: "artist",
                    source,
                }),
            DocPath::HistoryMonth(_) => serde_json::from_value(value)
                .map(Self::HistoryMonth)
                .map_err(|source| SnapshotError::Decode {
                    collection: "history month",
                    source,
                }),
        }
    }
}

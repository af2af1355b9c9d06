//! Listen events, the raw playback occurrences folded into buckets.

use serde::{Deserialize, Serialize};

use crate::types::TrackId;

/// A calendar date attached to a listen (`first_listen`, `last_listen`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

/// One playback occurrence, as stored inside a song document.
///
/// Immutable once it arrives; the fold never mutates events, only
/// accumulators. Field names mirror the store documents (`duration` is
/// milliseconds played).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenEvent {
    pub year: i32,
    pub month: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
    #[serde(rename = "duration")]
    pub duration_ms: i64,
}

/// An event suitable for bucket folding.
///
/// This trait lets the fold work over different carriers: a song page
/// folds bare [`ListenEvent`]s, while an artist page folds each track's
/// events tagged with the owning track id for the unique-song sets.
pub trait FoldableListen {
    /// The calendar year the listen occurred in.
    fn year(&self) -> i32;

    /// The calendar month, 1-12.
    fn month(&self) -> u32;

    /// Milliseconds played.
    fn duration_ms(&self) -> i64;

    /// The owning entity id, if unique-entity sets should be tracked.
    fn entity_id(&self) -> Option<&str>;
}

impl FoldableListen for ListenEvent {
    fn year(&self) -> i32 {
        self.year
    }

    fn month(&self) -> u32 {
        self.month
    }

    fn duration_ms(&self) -> i64 {
        self.duration_ms
    }

    fn entity_id(&self) -> Option<&str> {
        None
    }
}

/// A listen borrowed from a track, carrying the track id as its owner.
#[derive(Debug, Clone, Copy)]
pub struct TrackListen<'a> {
    pub track_id: &'a TrackId,
    pub listen: &'a ListenEvent,
}

impl FoldableListen for TrackListen<'_> {
    fn year(&self) -> i32 {
        self.listen.year
    }

    fn month(&self) -> u32 {
        self.listen.month
    }

    fn duration_ms(&self) -> i64 {
        self.listen.duration_ms
    }

    fn entity_id(&self) -> Option<&str> {
        Some(self.track_id.as_str())
    }
}

//! Entity rollups: merged statistics over one or many source entities.
//!
//! A rollup owns the latest snapshot of every child entity a view has
//! heard about and the series derived from them. Snapshots arrive
//! asynchronously in no particular order; each arrival replaces the prior
//! snapshot for that entity wholesale (last-write-wins) and triggers a
//! full recompute from the complete held state. There are no incremental
//! deltas: redundant work buys consistency, and dataset sizes are bounded
//! (thousands of listens, not millions).
//!
//! State lives only as long as its view; it is created empty when a view
//! opens and discarded when it closes.

use std::collections::{BTreeMap, HashMap, HashSet};

use thiserror::Error;

use crate::duration::TimeUnit;
use crate::fold::{dominant_unit, fold};
use crate::grid::{BucketGrid, BucketKey, YearMonth};
use crate::listen::TrackListen;
use crate::snapshot::{ArtistAggregate, DocPath, MonthAggregate, Snapshot, SongAggregate, TrackRef};
use crate::types::{ArtistId, Granularity, TrackId};

/// Errors applying snapshots to a rollup.
#[derive(Debug, Error)]
pub enum RollupError {
    /// The pushed snapshot belongs to a different kind of view.
    #[error("snapshot for {path} does not belong to this view")]
    SnapshotMismatch { path: DocPath },
}

/// Derived series for one granularity.
///
/// Unique-entity series are present only where the entity type tracks
/// them (artist pages count songs, the history view counts both).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesSet {
    /// Play counts per bucket.
    pub counts: BTreeMap<BucketKey, i64>,
    /// Summed playback time per bucket, milliseconds (unscaled).
    pub duration_ms: BTreeMap<BucketKey, i64>,
    /// Distinct songs per bucket.
    pub unique_songs: Option<BTreeMap<BucketKey, i64>>,
    /// Distinct artists per bucket.
    pub unique_artists: Option<BTreeMap<BucketKey, i64>>,
    /// Display unit chosen by this granularity's dominant bucket.
    pub unit: TimeUnit,
}

impl SeriesSet {
    fn zero(grid: &BucketGrid, granularity: Granularity) -> Self {
        Self {
            counts: grid.zeroed(granularity),
            duration_ms: grid.zeroed(granularity),
            unique_songs: None,
            unique_artists: None,
            unit: TimeUnit::Minutes,
        }
    }
}

/// Whole-dataset scalars for the summary cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub listen_count: i64,
    pub listen_time_ms: i64,
    pub unique_songs: Option<i64>,
    pub unique_artists: Option<i64>,
}

/// The full derived statistic set held by a rollup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollupStats {
    pub month: SeriesSet,
    pub year: SeriesSet,
    pub totals: Totals,
}

impl RollupStats {
    fn zero(grid: &BucketGrid) -> Self {
        Self {
            month: SeriesSet::zero(grid, Granularity::Month),
            year: SeriesSet::zero(grid, Granularity::Year),
            totals: Totals::default(),
        }
    }

    /// The series set for one granularity.
    #[must_use]
    pub const fn series(&self, granularity: Granularity) -> &SeriesSet {
        match granularity {
            Granularity::Month => &self.month,
            Granularity::Year => &self.year,
        }
    }
}

/// Rollup over a single song's listen log.
#[derive(Debug, Clone)]
pub struct SongRollup {
    grid: BucketGrid,
    snapshot: Option<SongAggregate>,
    stats: RollupStats,
}

impl SongRollup {
    /// Creates an empty rollup; everything reads as zero until a snapshot
    /// arrives.
    #[must_use]
    pub fn new(grid: BucketGrid) -> Self {
        Self {
            stats: RollupStats::zero(&grid),
            grid,
            snapshot: None,
        }
    }

    /// Replaces the held snapshot (last-write-wins) and recomputes.
    /// `None` means the store has no document for this song yet; the
    /// rollup returns to its zero state.
    pub fn apply_snapshot(&mut self, snapshot: Option<SongAggregate>) {
        self.snapshot = snapshot;
        self.recompute();
    }

    /// The held snapshot, for card fields the series do not carry.
    #[must_use]
    pub const fn snapshot(&self) -> Option<&SongAggregate> {
        self.snapshot.as_ref()
    }

    /// The derived statistics for the current held state.
    #[must_use]
    pub const fn stats(&self) -> &RollupStats {
        &self.stats
    }

    fn recompute(&mut self) {
        let listens = self
            .snapshot
            .as_ref()
            .map_or(&[][..], |song| song.listens.as_slice());

        self.stats = RollupStats::zero(&self.grid);
        for granularity in [Granularity::Month, Granularity::Year] {
            let folded = fold(listens, &self.grid, granularity);
            let series = match granularity {
                Granularity::Month => &mut self.stats.month,
                Granularity::Year => &mut self.stats.year,
            };
            series.unit = folded.dominant_unit();
            series.counts = folded.counts;
            series.duration_ms = folded.duration_ms;
        }
        if let Some(song) = &self.snapshot {
            self.stats.totals.listen_count = song.listen_count;
            self.stats.totals.listen_time_ms = song.listen_time_ms;
        }
    }
}

/// Two-level rollup over an artist's tracks.
///
/// The artist document names the expected tracks; each track's listen log
/// arrives separately as its own song snapshot. Per-bucket unique-song
/// counts are the cardinality of the union of the children's id sets,
/// never a sum of child counts, so a song appearing under several pushes
/// in the same bucket is counted once.
#[derive(Debug, Clone)]
pub struct ArtistRollup {
    grid: BucketGrid,
    profile: Option<ArtistAggregate>,
    tracks: HashMap<TrackId, SongAggregate>,
    stats: RollupStats,
}

impl ArtistRollup {
    #[must_use]
    pub fn new(grid: BucketGrid) -> Self {
        Self {
            stats: RollupStats::zero(&grid),
            grid,
            profile: None,
            tracks: HashMap::new(),
        }
    }

    /// Replaces the artist profile document and recomputes.
    pub fn apply_profile(&mut self, profile: Option<ArtistAggregate>) {
        self.profile = profile;
        self.recompute();
    }

    /// Replaces one track's snapshot (last-write-wins per track id) and
    /// recomputes. `None` clears the track back to zero-state.
    pub fn apply_track(&mut self, track_id: TrackId, snapshot: Option<SongAggregate>) {
        match snapshot {
            Some(song) => {
                self.tracks.insert(track_id, song);
            }
            None => {
                self.tracks.remove(&track_id);
            }
        }
        self.recompute();
    }

    /// The tracks the profile says to subscribe to. Empty until the
    /// profile document arrives.
    #[must_use]
    pub fn expected_tracks(&self) -> &[TrackRef] {
        self.profile
            .as_ref()
            .map_or(&[][..], |profile| profile.tracks.as_slice())
    }

    /// The held profile, for card fields the series do not carry.
    #[must_use]
    pub const fn profile(&self) -> Option<&ArtistAggregate> {
        self.profile.as_ref()
    }

    #[must_use]
    pub const fn stats(&self) -> &RollupStats {
        &self.stats
    }

    #[allow(clippy::cast_possible_wrap)]
    fn recompute(&mut self) {
        let events: Vec<TrackListen<'_>> = self
            .tracks
            .iter()
            .flat_map(|(track_id, song)| {
                song.listens
                    .iter()
                    .map(move |listen| TrackListen { track_id, listen })
            })
            .collect();

        self.stats = RollupStats::zero(&self.grid);
        for granularity in [Granularity::Month, Granularity::Year] {
            let folded = fold(&events, &self.grid, granularity);
            let series = match granularity {
                Granularity::Month => &mut self.stats.month,
                Granularity::Year => &mut self.stats.year,
            };
            series.unit = folded.dominant_unit();
            series.counts = folded.counts;
            series.duration_ms = folded.duration_ms;
            series.unique_songs = Some(
                folded
                    .unique_ids
                    .iter()
                    .map(|(key, ids)| (*key, ids.len() as i64))
                    .collect(),
            );
        }

        self.stats.totals.listen_count = self.tracks.values().map(|song| song.listen_count).sum();
        self.stats.totals.listen_time_ms =
            self.tracks.values().map(|song| song.listen_time_ms).sum();
        self.stats.totals.unique_songs = Some(self.tracks.len() as i64);
    }
}

/// Rollup over the full history's per-month pre-aggregates.
///
/// Month buckets read the pre-aggregated documents directly; year buckets
/// sum counts and durations and union the months' id sets.
#[derive(Debug, Clone)]
pub struct HistoryRollup {
    grid: BucketGrid,
    months: HashMap<YearMonth, MonthAggregate>,
    stats: RollupStats,
}

impl HistoryRollup {
    #[must_use]
    pub fn new(grid: BucketGrid) -> Self {
        Self {
            stats: RollupStats::zero(&grid),
            grid,
            months: HashMap::new(),
        }
    }

    /// Replaces one month's pre-aggregate (last-write-wins per month) and
    /// recomputes. Months outside the configured range are dropped.
    pub fn apply_month(&mut self, month: YearMonth, snapshot: Option<MonthAggregate>) {
        if !self.grid.range().contains(month.year(), month.month()) {
            tracing::debug!(%month, "history month outside bucket range, dropped");
            return;
        }
        match snapshot {
            Some(aggregate) => {
                self.months.insert(month, aggregate);
            }
            None => {
                self.months.remove(&month);
            }
        }
        self.recompute();
    }

    #[must_use]
    pub const fn stats(&self) -> &RollupStats {
        &self.stats
    }

    #[allow(clippy::cast_possible_wrap)]
    fn recompute(&mut self) {
        self.stats = RollupStats::zero(&self.grid);
        self.stats.month.unique_songs = Some(self.grid.zeroed(Granularity::Month));
        self.stats.month.unique_artists = Some(self.grid.zeroed(Granularity::Month));

        let mut year_songs: BTreeMap<BucketKey, HashSet<&TrackId>> =
            self.grid.zeroed(Granularity::Year);
        let mut year_artists: BTreeMap<BucketKey, HashSet<&ArtistId>> =
            self.grid.zeroed(Granularity::Year);
        let mut all_songs: HashSet<&TrackId> = HashSet::new();
        let mut all_artists: HashSet<&ArtistId> = HashSet::new();

        for (month, aggregate) in &self.months {
            let Some(month_key) =
                self.grid
                    .key_for(Granularity::Month, month.year(), month.month())
            else {
                continue;
            };
            let year_key = BucketKey::Year(month.year());

            self.stats.month.counts.insert(month_key, aggregate.listen_count);
            self.stats
                .month
                .duration_ms
                .insert(month_key, aggregate.listen_time_ms);
            if let Some(series) = &mut self.stats.month.unique_songs {
                series.insert(month_key, aggregate.unique_songs.len() as i64);
            }
            if let Some(series) = &mut self.stats.month.unique_artists {
                series.insert(month_key, aggregate.unique_artists.len() as i64);
            }

            if let Some(count) = self.stats.year.counts.get_mut(&year_key) {
                *count += aggregate.listen_count;
            }
            if let Some(total) = self.stats.year.duration_ms.get_mut(&year_key) {
                *total += aggregate.listen_time_ms;
            }
            if let Some(ids) = year_songs.get_mut(&year_key) {
                ids.extend(&aggregate.unique_songs);
            }
            if let Some(ids) = year_artists.get_mut(&year_key) {
                ids.extend(&aggregate.unique_artists);
            }
            all_songs.extend(&aggregate.unique_songs);
            all_artists.extend(&aggregate.unique_artists);

            self.stats.totals.listen_count += aggregate.listen_count;
            self.stats.totals.listen_time_ms += aggregate.listen_time_ms;
        }

        self.stats.year.unique_songs = Some(
            year_songs
                .iter()
                .map(|(key, ids)| (*key, ids.len() as i64))
                .collect(),
        );
        self.stats.year.unique_artists = Some(
            year_artists
                .iter()
                .map(|(key, ids)| (*key, ids.len() as i64))
                .collect(),
        );
        self.stats.totals.unique_songs = Some(all_songs.len() as i64);
        self.stats.totals.unique_artists = Some(all_artists.len() as i64);

        self.stats.month.unit = dominant_unit(&self.stats.month.duration_ms);
        self.stats.year.unit = dominant_unit(&self.stats.year.duration_ms);
    }
}

/// A rollup of any entity type behind the push-driven snapshot interface.
///
/// The document feed does not know which concrete rollup a view holds;
/// it just pushes `(path, snapshot)` pairs as they arrive.
#[derive(Debug, Clone)]
pub enum EntityRollup {
    Song(SongRollup),
    Artist(ArtistRollup),
    History(HistoryRollup),
}

impl EntityRollup {
    /// Applies one pushed snapshot. `None` is a valid zero-state push for
    /// a document the store has nothing for yet. Re-pushing the same
    /// snapshot is idempotent.
    pub fn apply(&mut self, path: &DocPath, snapshot: Option<Snapshot>) -> Result<(), RollupError> {
        let mismatch = || RollupError::SnapshotMismatch { path: path.clone() };
        match (self, path, snapshot) {
            (Self::Song(rollup), DocPath::Song(_), Some(Snapshot::Song(song))) => {
                rollup.apply_snapshot(Some(song));
            }
            (Self::Song(rollup), DocPath::Song(_), None) => rollup.apply_snapshot(None),
            (Self::Artist(rollup), DocPath::Artist(_), Some(Snapshot::Artist(artist))) => {
                rollup.apply_profile(Some(artist));
            }
            (Self::Artist(rollup), DocPath::Artist(_), None) => rollup.apply_profile(None),
            (Self::Artist(rollup), DocPath::Song(track_id), Some(Snapshot::Song(song))) => {
                rollup.apply_track(track_id.clone(), Some(song));
            }
            (Self::Artist(rollup), DocPath::Song(track_id), None) => {
                rollup.apply_track(track_id.clone(), None);
            }
            (
                Self::History(rollup),
                DocPath::HistoryMonth(month),
                Some(Snapshot::HistoryMonth(aggregate)),
            ) => rollup.apply_month(*month, Some(aggregate)),
            (Self::History(rollup), DocPath::HistoryMonth(month), None) => {
                rollup.apply_month(*month, None);
            }
            _ => return Err(mismatch()),
        }
        Ok(())
    }

    /// The derived statistics for the current held state.
    #[must_use]
    pub const fn stats(&self) -> &RollupStats {
        match self {
            Self::Song(rollup) => rollup.stats(),
            Self::Artist(rollup) => rollup.stats(),
            Self::History(rollup) => rollup.stats(),
        }
    }
}

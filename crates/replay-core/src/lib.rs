//! Aggregation core for listening-history statistics.
//!
//! This crate turns a sparse, document-oriented listen-event log into
//! dense, time-bucketed statistical series:
//! - Grid: the fixed calendar bucket set (months, years) for a dataset
//! - Fold: events into per-bucket counts, durations, and unique-id sets
//! - Rollup: merging one or many entity snapshots into a statistic set
//! - Present: projecting one (granularity, metric) series for rendering
//!
//! Persistence and rendering are external collaborators: the core only
//! consumes pushed document snapshots and emits finished series.

pub mod duration;
pub mod fold;
pub mod grid;
pub mod listen;
pub mod present;
pub mod rollup;
pub mod snapshot;
pub mod types;

pub use duration::{ScaledDuration, TimeUnit, pick_unit, scale_to_unit};
pub use fold::{BucketFold, fold};
pub use grid::{BucketGrid, BucketKey, BucketRange, YearMonth};
pub use listen::{FoldableListen, ListenDate, ListenEvent};
pub use present::{PresentError, Selection, SeriesView};
pub use rollup::{ArtistRollup, EntityRollup, HistoryRollup, RollupStats, SongRollup};
pub use snapshot::{DocPath, Snapshot, SnapshotError};
pub use types::{ArtistId, Granularity, Metric, TrackId};

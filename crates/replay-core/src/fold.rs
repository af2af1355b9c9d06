//! The central aggregation fold.
//!
//! Folds a collection of listen events into dense per-bucket accumulators:
//! play counts, summed durations, and unique-entity id sets. The fold is
//! idempotent and order-independent: the result depends only on the
//! multiset of events, never on arrival order, which is what lets
//! unordered asynchronous snapshot pushes converge to one final state.

use std::collections::{BTreeMap, HashSet};

use crate::duration::{TimeUnit, pick_unit};
use crate::grid::{BucketGrid, BucketKey};
use crate::listen::FoldableListen;
use crate::types::Granularity;

/// Dense per-bucket accumulators for one granularity.
///
/// Every bucket key of the grid is present, zero-initialized; folding only
/// ever increments. Maps iterate chronologically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketFold {
    /// Play counts per bucket.
    pub counts: BTreeMap<BucketKey, i64>,
    /// Summed playback time per bucket, milliseconds.
    pub duration_ms: BTreeMap<BucketKey, i64>,
    /// Owning-entity ids seen per bucket, for events that carry one.
    pub unique_ids: BTreeMap<BucketKey, HashSet<String>>,
}

impl BucketFold {
    /// The display unit chosen by the dominant bucket.
    #[must_use]
    pub fn dominant_unit(&self) -> TimeUnit {
        dominant_unit(&self.duration_ms)
    }
}

/// The display unit chosen by the dominant bucket: the strict maximum of
/// the duration sums, scanned chronologically so the earliest maximal
/// bucket wins ties. All-zero data yields Minutes via the `-1` sentinel.
#[must_use]
pub fn dominant_unit(duration_ms: &BTreeMap<BucketKey, i64>) -> TimeUnit {
    let mut max_ms: i64 = -1;
    for &ms in duration_ms.values() {
        if ms > max_ms {
            max_ms = ms;
        }
    }
    pick_unit(max_ms).unit
}

/// Folds events into the grid's buckets at the given granularity.
///
/// Events outside the configured range are skipped without error; this is
/// deliberate (the grid is fixed at construction, nothing is clamped into
/// an edge bucket). Skips are logged at debug for range-misconfiguration
/// diagnosis.
pub fn fold<E: FoldableListen>(
    events: &[E],
    grid: &BucketGrid,
    granularity: Granularity,
) -> BucketFold {
    let mut counts = grid.zeroed::<i64>(granularity);
    let mut duration_ms = grid.zeroed::<i64>(granularity);
    let mut unique_ids = grid.zeroed::<HashSet<String>>(granularity);

    for event in events {
        let Some(key) = grid.key_for(granularity, event.year(), event.month()) else {
            tracing::debug!(
                year = event.year(),
                month = event.month(),
                "listen outside bucket range, dropped"
            );
            continue;
        };
        if let Some(count) = counts.get_mut(&key) {
            *count += 1;
        }
        if let Some(total) = duration_ms.get_mut(&key) {
            *total += event.duration_ms();
        }
        if let Some(entity_id) = event.entity_id() {
            if let Some(ids) = unique_ids.get_mut(&key) {
                ids.insert(entity_id.to_string());
            }
        }
    }

    BucketFold {
        counts,
        duration_ms,
        unique_ids,
    }
}

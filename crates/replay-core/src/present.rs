//! Series presentation: projecting one selected series for rendering.
//!
//! The presenter never recomputes. It reads the rollup's derived state,
//! pairs the selected series with its axis/title metadata, and returns a
//! fresh immutable descriptor; the rendering collaborator redraws from
//! the descriptor. Switching the selection is a re-read, not a re-fold.

use serde::Serialize;
use thiserror::Error;

use crate::duration::{ScaledDuration, TimeUnit, pick_unit, scale_to_unit};
use crate::listen::ListenDate;
use crate::rollup::{ArtistRollup, HistoryRollup, RollupStats, SongRollup};
use crate::types::{Granularity, Metric};

/// Presentation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PresentError {
    /// The view's rollup does not track the selected metric (a song page
    /// has no unique-entity series). Callers should hide the control
    /// rather than draw a zero line.
    #[error("metric {metric} is not tracked for this view")]
    MetricUnavailable { metric: Metric },
}

/// The UI-facing cursor: which single series is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub granularity: Granularity,
    pub metric: Metric,
}

/// One finished series plus its labels and titles, ready to hand to a
/// chart renderer. An immutable value; a new one is produced per
/// selection change or data arrival.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesView {
    /// Bucket labels in chronological order (`"2015"`, `"10/2015"`, ...).
    pub labels: Vec<String>,
    /// One value per label. Times are scaled into `unit` and rounded to
    /// two decimals; other metrics are whole counts.
    pub data: Vec<f64>,
    /// Chart title, e.g. `"Hours Listened per Month"`.
    pub title: String,
    /// X-axis title.
    pub x_label: &'static str,
    /// Y-axis title.
    pub y_label: String,
    /// The shared display unit, present for the times metric.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<TimeUnit>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

const fn per_label(granularity: Granularity) -> &'static str {
    match granularity {
        Granularity::Month => "Month",
        Granularity::Year => "Year",
    }
}

/// Projects the selected (granularity, metric) series out of a rollup's
/// derived state.
#[allow(clippy::cast_precision_loss)]
pub fn present(stats: &RollupStats, selection: Selection) -> Result<SeriesView, PresentError> {
    let series = stats.series(selection.granularity);
    let per = per_label(selection.granularity);

    let (data, title, y_label, unit) = match selection.metric {
        Metric::Counts => (
            series.counts.values().map(|&v| v as f64).collect(),
            format!("Listens per {per}"),
            "Listens".to_string(),
            None,
        ),
        Metric::Times => (
            series
                .duration_ms
                .values()
                .map(|&ms| round2(scale_to_unit(ms, series.unit)))
                .collect(),
            format!("{} Listened per {per}", series.unit),
            series.unit.to_string(),
            Some(series.unit),
        ),
        Metric::UniqueSongs => {
            let unique = series
                .unique_songs
                .as_ref()
                .ok_or(PresentError::MetricUnavailable {
                    metric: selection.metric,
                })?;
            (
                unique.values().map(|&v| v as f64).collect(),
                format!("Unique Songs per {per}"),
                "Unique Songs".to_string(),
                None,
            )
        }
        Metric::UniqueArtists => {
            let unique =
                series
                    .unique_artists
                    .as_ref()
                    .ok_or(PresentError::MetricUnavailable {
                        metric: selection.metric,
                    })?;
            (
                unique.values().map(|&v| v as f64).collect(),
                format!("Unique Artists per {per}"),
                "Unique Artists".to_string(),
                None,
            )
        }
    };

    Ok(SeriesView {
        labels: series.counts.keys().map(ToString::to_string).collect(),
        data,
        title,
        x_label: per,
        y_label,
        unit,
    })
}

/// Month names for card dates.
const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Formats a listen date as `"March 14, 2015"`.
#[must_use]
pub fn format_listen_date(date: ListenDate) -> String {
    let month = MONTH_NAMES
        .get(date.month.saturating_sub(1) as usize)
        .unwrap_or(&"?");
    format!("{month} {}, {}", date.day, date.year)
}

/// Summary card for a song page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SongCard {
    pub song_name: String,
    pub artist_name: String,
    pub listen_count: i64,
    pub listen_time: ScaledDuration,
    pub first_listen: Option<String>,
    pub last_listen: Option<String>,
}

impl SongCard {
    /// Builds the card from the rollup's held state. A rollup with no
    /// snapshot yet renders as the zero state, not an error.
    #[must_use]
    pub fn from_rollup(rollup: &SongRollup) -> Self {
        let totals = rollup.stats().totals;
        let snapshot = rollup.snapshot();
        Self {
            song_name: snapshot.map(|s| s.name.clone()).unwrap_or_default(),
            artist_name: snapshot.map(|s| s.artist_name.clone()).unwrap_or_default(),
            listen_count: totals.listen_count,
            listen_time: pick_unit(totals.listen_time_ms),
            first_listen: snapshot.map(|s| format_listen_date(s.first_listen)),
            last_listen: snapshot.map(|s| format_listen_date(s.last_listen)),
        }
    }
}

/// Summary card for an artist page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistCard {
    pub artist_name: String,
    pub listen_count: i64,
    pub listen_time: ScaledDuration,
    pub track_count: i64,
    pub first_song: Option<String>,
    pub first_listen: Option<String>,
    pub last_song: Option<String>,
    pub last_listen: Option<String>,
}

impl ArtistCard {
    /// Builds the card from the rollup's held state. Totals come from the
    /// held track snapshots, so they grow as children arrive; names and
    /// first/last lines come from the profile document.
    #[must_use]
    pub fn from_rollup(rollup: &ArtistRollup) -> Self {
        let totals = rollup.stats().totals;
        let profile = rollup.profile();
        Self {
            artist_name: profile.map(|a| a.name.clone()).unwrap_or_default(),
            listen_count: totals.listen_count,
            listen_time: pick_unit(totals.listen_time_ms),
            track_count: totals.unique_songs.unwrap_or(0),
            first_song: profile.map(|a| a.first_listen.name.clone()),
            first_listen: profile.map(|a| format_listen_date(a.first_listen_time)),
            last_song: profile.map(|a| a.last_listen.name.clone()),
            last_listen: profile.map(|a| format_listen_date(a.last_listen_time)),
        }
    }
}

/// Summary card for the full-history page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryCard {
    pub listen_count: i64,
    pub listen_time: ScaledDuration,
    pub unique_songs: i64,
    pub unique_artists: i64,
}

impl HistoryCard {
    #[must_use]
    pub fn from_rollup(rollup: &HistoryRollup) -> Self {
        let totals = rollup.stats().totals;
        Self {
            listen_count: totals.listen_count,
            listen_time: pick_unit(totals.listen_time_ms),
            unique_songs: totals.unique_songs.unwrap_or(0),
            unique_artists: totals.unique_artists.unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{BucketGrid, BucketRange};
    use crate::listen::ListenEvent;
    use crate::snapshot::SongAggregate;

    fn grid() -> BucketGrid {
        BucketGrid::new(BucketRange::years(2015, 2016).unwrap())
    }

    fn listen(year: i32, month: u32, duration_ms: i64) -> ListenEvent {
        ListenEvent {
            year,
            month,
            day: None,
            duration_ms,
        }
    }

    fn song_rollup(listens: Vec<ListenEvent>) -> SongRollup {
        let listen_count = listens.len() as i64;
        let listen_time_ms = listens.iter().map(|l| l.duration_ms).sum();
        let mut rollup = SongRollup::new(grid());
        rollup.apply_snapshot(Some(SongAggregate {
            name: "Heroes".to_string(),
            artist_name: "David Bowie".to_string(),
            listen_count,
            listen_time_ms,
            first_listen: ListenDate {
                year: 2015,
                month: 3,
                day: 14,
            },
            last_listen: ListenDate {
                year: 2016,
                month: 11,
                day: 2,
            },
            listens,
        }));
        rollup
    }

    #[test]
    fn counts_series_has_labels_and_title() {
        let rollup = song_rollup(vec![listen(2015, 5, 120_000)]);
        let view = present(
            rollup.stats(),
            Selection {
                granularity: Granularity::Year,
                metric: Metric::Counts,
            },
        )
        .unwrap();

        assert_eq!(view.labels, vec!["2015", "2016"]);
        assert_eq!(view.data, vec![1.0, 0.0]);
        assert_eq!(view.title, "Listens per Year");
        assert_eq!(view.x_label, "Year");
        assert_eq!(view.y_label, "Listens");
        assert_eq!(view.unit, None);
    }

    #[test]
    fn times_series_shares_the_dominant_unit() {
        // 2015 dominates at three hours; 2016's half hour renders in
        // hours too, not minutes.
        let rollup = song_rollup(vec![
            listen(2015, 1, 3 * 60 * 60_000),
            listen(2016, 2, 30 * 60_000),
        ]);
        let view = present(
            rollup.stats(),
            Selection {
                granularity: Granularity::Year,
                metric: Metric::Times,
            },
        )
        .unwrap();

        assert_eq!(view.unit, Some(TimeUnit::Hours));
        assert_eq!(view.data, vec![3.0, 0.5]);
        assert_eq!(view.title, "Hours Listened per Year");
        assert_eq!(view.y_label, "Hours");
    }

    #[test]
    fn month_series_labels_are_month_keys() {
        let rollup = song_rollup(vec![listen(2015, 5, 120_000)]);
        let view = present(
            rollup.stats(),
            Selection {
                granularity: Granularity::Month,
                metric: Metric::Times,
            },
        )
        .unwrap();
        assert_eq!(view.labels.len(), 24);
        assert_eq!(view.labels[0], "1/2015");
        assert_eq!(view.data[4], 2.0); // 5/2015, two minutes
        assert_eq!(view.title, "Minutes Listened per Month");
    }

    #[test]
    fn selection_change_is_a_pure_reread() {
        let rollup = song_rollup(vec![listen(2015, 5, 120_000)]);
        let stats_before = rollup.stats().clone();
        let _ = present(
            rollup.stats(),
            Selection {
                granularity: Granularity::Month,
                metric: Metric::Counts,
            },
        );
        let _ = present(
            rollup.stats(),
            Selection {
                granularity: Granularity::Year,
                metric: Metric::Times,
            },
        );
        assert_eq!(rollup.stats(), &stats_before);
    }

    #[test]
    fn unavailable_metric_is_an_error() {
        let rollup = song_rollup(vec![listen(2015, 5, 120_000)]);
        let err = present(
            rollup.stats(),
            Selection {
                granularity: Granularity::Year,
                metric: Metric::UniqueArtists,
            },
        )
        .unwrap_err();
        assert_eq!(
            err,
            PresentError::MetricUnavailable {
                metric: Metric::UniqueArtists
            }
        );
    }

    #[test]
    fn listen_date_formats_with_month_name() {
        let date = ListenDate {
            year: 2015,
            month: 3,
            day: 14,
        };
        assert_eq!(format_listen_date(date), "March 14, 2015");
    }

    #[test]
    fn song_card_zero_state() {
        let rollup = SongRollup::new(grid());
        let card = SongCard::from_rollup(&rollup);
        assert_eq!(card.listen_count, 0);
        assert_eq!(card.listen_time.value, "0.00");
        assert_eq!(card.listen_time.unit, TimeUnit::Minutes);
        assert_eq!(card.first_listen, None);
    }

    #[test]
    fn song_card_from_snapshot() {
        let rollup = song_rollup(vec![listen(2015, 5, 61 * 60_000)]);
        let card = SongCard::from_rollup(&rollup);
        assert_eq!(card.song_name, "Heroes");
        assert_eq!(card.listen_count, 1);
        assert_eq!(card.listen_time.to_string(), "1.02 Hours");
        assert_eq!(card.first_listen.as_deref(), Some("March 14, 2015"));
        assert_eq!(card.last_listen.as_deref(), Some("November 2, 2016"));
    }
}

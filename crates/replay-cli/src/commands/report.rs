//! Report commands: drive the document feed into a rollup and render.
//!
//! Each report builds its rollup over the configured bucket grid,
//! subscribes to the documents backing the view, applies every pushed
//! snapshot, then prints a summary card plus a bar chart of the selected
//! series, or the whole report as JSON.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use replay_core::present::{ArtistCard, HistoryCard, Selection, SeriesView, SongCard, present};
use replay_core::rollup::EntityRollup;
use replay_core::{
    ArtistId, ArtistRollup, BucketGrid, BucketKey, DocPath, Granularity, HistoryRollup, Snapshot,
    SongRollup, TrackId,
};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::cli::ReportOptions;
use crate::store::{DocumentStore, FeedItem};

/// Width of chart bars, in block characters.
const BAR_WIDTH: usize = 20;

/// Statistics for one song.
pub async fn song(
    store: &DocumentStore,
    grid: BucketGrid,
    id: &str,
    options: &ReportOptions,
) -> Result<()> {
    let track_id = TrackId::new(id).context("invalid track id")?;
    let rollup = EntityRollup::Song(SongRollup::new(grid));
    run(store, rollup, vec![DocPath::Song(track_id)], options).await
}

/// Statistics for one artist across all of their tracks.
///
/// The profile document names the tracks to subscribe to, so it is
/// fetched and applied before the track feed starts.
pub async fn artist(
    store: &DocumentStore,
    grid: BucketGrid,
    id: &str,
    options: &ReportOptions,
) -> Result<()> {
    let artist_id = ArtistId::new(id).context("invalid artist id")?;
    let path = DocPath::Artist(artist_id);

    let mut rollup = EntityRollup::Artist(ArtistRollup::new(grid));
    let profile = store.fetch(&path).await?;
    apply(&mut rollup, &path, profile)?;

    let tracks = if let EntityRollup::Artist(artist) = &rollup {
        artist
            .expected_tracks()
            .iter()
            .map(|track| DocPath::Song(track.track_id.clone()))
            .collect()
    } else {
        Vec::new()
    };
    run(store, rollup, tracks, options).await
}

/// Statistics over the full listening history.
pub async fn history(store: &DocumentStore, grid: BucketGrid, options: &ReportOptions) -> Result<()> {
    let paths = grid
        .keys(Granularity::Month)
        .into_iter()
        .filter_map(|key| match key {
            BucketKey::Month(ym) => Some(DocPath::HistoryMonth(ym)),
            BucketKey::Year(_) => None,
        })
        .collect();
    let rollup = EntityRollup::History(HistoryRollup::new(grid));
    run(store, rollup, paths, options).await
}

async fn run(
    store: &DocumentStore,
    mut rollup: EntityRollup,
    paths: Vec<DocPath>,
    options: &ReportOptions,
) -> Result<()> {
    let feed = store.subscribe(paths);
    drain_feed(&mut rollup, feed).await?;

    let selection = Selection {
        granularity: options.granularity,
        metric: options.metric,
    };
    let series = present(rollup.stats(), selection)?;
    let card = card_for(&rollup);

    if options.json {
        let report = Report { card, series };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", format_card(&card));
        println!();
        print!("{}", format_chart(&series));
    }
    Ok(())
}

/// Applies every snapshot the feed delivers, in arrival order.
async fn drain_feed(rollup: &mut EntityRollup, mut feed: mpsc::Receiver<FeedItem>) -> Result<()> {
    while let Some((path, snapshot)) = feed.recv().await {
        let snapshot = snapshot.with_context(|| format!("failed to fetch {path}"))?;
        apply(rollup, &path, snapshot)?;
    }
    Ok(())
}

fn apply(
    rollup: &mut EntityRollup,
    path: &DocPath,
    snapshot: Option<serde_json::Value>,
) -> Result<()> {
    let decoded = snapshot
        .map(|value| Snapshot::decode(path, value))
        .transpose()
        .with_context(|| format!("failed to decode {path}"))?;
    rollup
        .apply(path, decoded)
        .with_context(|| format!("failed to apply {path}"))?;
    tracing::debug!(%path, "snapshot applied");
    Ok(())
}

/// JSON report body.
#[derive(Debug, Serialize)]
struct Report {
    card: Card,
    series: SeriesView,
}

/// Summary card for whichever entity the report covers.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Card {
    Song(SongCard),
    Artist(ArtistCard),
    History(HistoryCard),
}

fn card_for(rollup: &EntityRollup) -> Card {
    match rollup {
        EntityRollup::Song(rollup) => Card::Song(SongCard::from_rollup(rollup)),
        EntityRollup::Artist(rollup) => Card::Artist(ArtistCard::from_rollup(rollup)),
        EntityRollup::History(rollup) => Card::History(HistoryCard::from_rollup(rollup)),
    }
}

fn format_card(card: &Card) -> String {
    let mut output = String::new();
    match card {
        Card::Song(card) => {
            if card.song_name.is_empty() {
                writeln!(output, "SONG: (no document)").unwrap();
            } else {
                writeln!(output, "SONG: {} by {}", card.song_name, card.artist_name).unwrap();
            }
            writeln!(output, "Listens:      {}", card.listen_count).unwrap();
            writeln!(output, "Time:         {}", card.listen_time).unwrap();
            if let Some(first) = &card.first_listen {
                writeln!(output, "First listen: {first}").unwrap();
            }
            if let Some(last) = &card.last_listen {
                writeln!(output, "Last listen:  {last}").unwrap();
            }
        }
        Card::Artist(card) => {
            if card.artist_name.is_empty() {
                writeln!(output, "ARTIST: (no document)").unwrap();
            } else {
                writeln!(output, "ARTIST: {}", card.artist_name).unwrap();
            }
            writeln!(output, "Listens: {}", card.listen_count).unwrap();
            writeln!(output, "Time:    {}", card.listen_time).unwrap();
            writeln!(output, "Tracks:  {}", card.track_count).unwrap();
            if let (Some(song), Some(date)) = (&card.first_song, &card.first_listen) {
                writeln!(output, "First listen: {song} ({date})").unwrap();
            }
            if let (Some(song), Some(date)) = (&card.last_song, &card.last_listen) {
                writeln!(output, "Last listen:  {song} ({date})").unwrap();
            }
        }
        Card::History(card) => {
            writeln!(output, "LISTENING HISTORY").unwrap();
            writeln!(output, "Listens:        {}", card.listen_count).unwrap();
            writeln!(output, "Time:           {}", card.listen_time).unwrap();
            writeln!(output, "Unique songs:   {}", card.unique_songs).unwrap();
            writeln!(output, "Unique artists: {}", card.unique_artists).unwrap();
        }
    }
    output
}

/// Renders one series as a labeled horizontal bar chart.
fn format_chart(view: &SeriesView) -> String {
    let mut output = String::new();
    writeln!(output, "{}", view.title).unwrap();
    writeln!(output, "{}", "─".repeat(view.title.chars().count())).unwrap();

    let max = view.data.iter().copied().fold(0.0_f64, f64::max);
    let label_width = view.labels.iter().map(String::len).max().unwrap_or(0);
    for (label, &value) in view.labels.iter().zip(&view.data) {
        let bar = bar(value, max);
        if view.unit.is_some() {
            writeln!(output, "{label:>label_width$}  {bar}  {value:.2}").unwrap();
        } else {
            writeln!(output, "{label:>label_width$}  {bar}  {value:.0}").unwrap();
        }
    }
    output
}

/// A fixed-width bar. Non-zero values always get at least one block.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 {
        return "░".repeat(BAR_WIDTH);
    }
    let ratio = (value / max).clamp(0.0, 1.0);
    let mut filled = (ratio * BAR_WIDTH as f64).round() as usize;
    if value > 0.0 && filled == 0 {
        filled = 1;
    }
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

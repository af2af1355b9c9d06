//! End-to-end tests for the report flow: document files on disk are
//! fetched, folded, and rendered through the real binary.

use std::path::Path;
use std::process::Command;

use serde_json::json;
use tempfile::TempDir;

fn replay_binary() -> String {
    env!("CARGO_BIN_EXE_replay").to_string()
}

fn write_doc(root: &Path, path: &str, value: &serde_json::Value) {
    let (collection, id) = path.split_once('/').unwrap();
    let dir = root.join(collection);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(format!("{id}.json")), value.to_string()).unwrap();
}

/// Runs the binary against a temp store covering 2015-2016.
fn run_replay(temp: &TempDir, args: &[&str]) -> std::process::Output {
    Command::new(replay_binary())
        .env("HOME", temp.path())
        .env("REPLAY_DATA_DIR", temp.path().join("store"))
        .env("REPLAY_RANGE_START", "1/2015")
        .env("REPLAY_RANGE_END", "12/2016")
        .args(args)
        .output()
        .expect("failed to run replay")
}

fn seed_song(temp: &TempDir) {
    write_doc(
        &temp.path().join("store"),
        "songs/abc",
        &json!({
            "song_name": "Heroes",
            "artist_name": "David Bowie",
            "listen_count": 3,
            "listen_time": 540_000,
            "first_listen": {"year": 2015, "month": 3, "day": 14},
            "last_listen": {"year": 2016, "month": 11, "day": 2},
            "listens": [
                {"year": 2015, "month": 3, "day": 14, "duration": 120_000},
                {"year": 2015, "month": 8, "day": 1, "duration": 60_000},
                {"year": 2016, "month": 11, "day": 2, "duration": 360_000}
            ]
        }),
    );
}

#[test]
fn song_report_renders_card_and_chart() {
    let temp = TempDir::new().unwrap();
    seed_song(&temp);

    let output = run_replay(&temp, &["song", "abc", "--granularity", "year"]);
    assert!(
        output.status.success(),
        "song report should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("SONG: Heroes by David Bowie"), "{stdout}");
    assert!(stdout.contains("Listens:      3"), "{stdout}");
    assert!(stdout.contains("First listen: March 14, 2015"), "{stdout}");
    assert!(stdout.contains("Listens per Year"), "{stdout}");
    // Two year buckets, labeled.
    assert!(stdout.contains("2015"), "{stdout}");
    assert!(stdout.contains("2016"), "{stdout}");
}

#[test]
fn song_report_missing_document_is_zero_state() {
    let temp = TempDir::new().unwrap();

    let output = run_replay(&temp, &["song", "nothing-here"]);
    assert!(
        output.status.success(),
        "missing document is not an error: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Listens:      0"), "{stdout}");
    assert!(stdout.contains("0.00 Minutes"), "{stdout}");
}

#[test]
fn song_report_json_output() {
    let temp = TempDir::new().unwrap();
    seed_song(&temp);

    let output = run_replay(
        &temp,
        &[
            "song",
            "abc",
            "--granularity",
            "year",
            "--metric",
            "times",
            "--json",
        ],
    );
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["card"]["song_name"], "Heroes");
    assert_eq!(report["series"]["title"], "Minutes Listened per Year");
    assert_eq!(report["series"]["labels"], json!(["2015", "2016"]));
    // 3 minutes in 2015, 6 in 2016; 6 minutes dominates, stays Minutes.
    assert_eq!(report["series"]["data"], json!([3.0, 6.0]));
}

#[test]
fn song_report_rejects_untracked_metric() {
    let temp = TempDir::new().unwrap();
    seed_song(&temp);

    let output = run_replay(&temp, &["song", "abc", "--metric", "uq_artists"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not tracked"), "{stderr}");
}

#[test]
fn artist_report_aggregates_tracks() {
    let temp = TempDir::new().unwrap();
    let store = temp.path().join("store");
    write_doc(
        &store,
        "artists/xyz",
        &json!({
            "artist_name": "David Bowie",
            "listen_count": 3,
            "listen_time": 420_000,
            "first_listen": {"song_name": "Heroes"},
            "first_listen_time": {"year": 2015, "month": 3, "day": 14},
            "last_listen": {"song_name": "Life on Mars?"},
            "last_listen_time": {"year": 2016, "month": 6, "day": 20},
            "tracks": [
                {"track_id": "abc", "song_name": "Heroes"},
                {"track_id": "def", "song_name": "Life on Mars?"}
            ]
        }),
    );
    write_doc(
        &store,
        "songs/abc",
        &json!({
            "song_name": "Heroes",
            "artist_name": "David Bowie",
            "listen_count": 2,
            "listen_time": 300_000,
            "first_listen": {"year": 2015, "month": 3, "day": 14},
            "last_listen": {"year": 2015, "month": 9, "day": 9},
            "listens": [
                {"year": 2015, "month": 3, "day": 14, "duration": 120_000},
                {"year": 2015, "month": 9, "day": 9, "duration": 180_000}
            ]
        }),
    );
    write_doc(
        &store,
        "songs/def",
        &json!({
            "song_name": "Life on Mars?",
            "artist_name": "David Bowie",
            "listen_count": 1,
            "listen_time": 120_000,
            "first_listen": {"year": 2016, "month": 6, "day": 20},
            "last_listen": {"year": 2016, "month": 6, "day": 20},
            "listens": [
                {"year": 2016, "month": 6, "day": 20, "duration": 120_000}
            ]
        }),
    );

    let output = run_replay(
        &temp,
        &[
            "artist",
            "xyz",
            "--granularity",
            "year",
            "--metric",
            "uq_songs",
            "--json",
        ],
    );
    assert!(
        output.status.success(),
        "artist report should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["card"]["artist_name"], "David Bowie");
    assert_eq!(report["card"]["listen_count"], 3);
    assert_eq!(report["card"]["track_count"], 2);
    assert_eq!(report["series"]["title"], "Unique Songs per Year");
    // One distinct song per year bucket despite two 2015 listens.
    assert_eq!(report["series"]["data"], json!([1.0, 1.0]));
}

#[test]
fn history_report_unions_months() {
    let temp = TempDir::new().unwrap();
    let store = temp.path().join("store");
    write_doc(
        &store,
        "history_2015/1",
        &json!({
            "listen_count": 5,
            "listen_time": 300_000,
            "uq_artists": ["a1"],
            "uq_songs": ["t1", "t2"]
        }),
    );
    write_doc(
        &store,
        "history_2015/2",
        &json!({
            "listen_count": 3,
            "listen_time": 180_000,
            "uq_artists": ["a1", "a2"],
            "uq_songs": ["t1"]
        }),
    );

    let output = run_replay(
        &temp,
        &["history", "--granularity", "year", "--metric", "uq_songs", "--json"],
    );
    assert!(
        output.status.success(),
        "history report should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["card"]["listen_count"], 8);
    assert_eq!(report["card"]["unique_songs"], 2);
    assert_eq!(report["card"]["unique_artists"], 2);
    // "t1" spans both months of 2015 but counts once in the year bucket.
    assert_eq!(report["series"]["data"], json!([2.0, 0.0]));
}

//! Timeline integration tests.
//!
//! These tests exercise the full disk-backed stack: save, history,
//! recover, diff, and reopening a repository across service instances.

use chronicle::log::LogOptions;
use chronicle::{LineStatus, TimelineConfig, TimelineService};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

fn no_seed() -> TimelineConfig {
    // First test in wins; later installs are rejected and ignored.
    let _ = chronicle::log::init(&LogOptions {
        default_filter: "chronicle=debug".to_string(),
        ..Default::default()
    });
    TimelineConfig {
        seed_on_init: false,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_save_recover_roundtrip_on_disk() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let file = temp.path().join("draft.md");
    let service = TimelineService::open(temp.path(), no_seed())
        .await
        .expect("Failed to open timeline");

    fs::write(&file, "# Draft\n\nFirst take.\n").expect("Failed to write file");
    let v1 = service
        .save_timeline("draft.md", "first take")
        .await
        .expect("First save should produce a commit");

    fs::write(&file, "# Draft\n\nSecond take.\n").expect("Failed to write file");
    service
        .save_timeline("draft.md", "second take")
        .await
        .expect("Second save should produce a commit");

    service
        .recover_timeline("draft.md", v1)
        .await
        .expect("Failed to recover");

    let content = fs::read_to_string(&file).expect("Failed to read file");
    assert_eq!(content, "# Draft\n\nFirst take.\n");

    // Recovery is append-only: both saves plus the restore entry
    let history = service.history("draft.md").await.expect("Failed to list history");
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].message, "first take");
    assert_eq!(history[0].provenance.as_ref().map(|p| p.origin), Some(v1));
    assert_eq!(history[2].id, v1);
}

#[tokio::test]
async fn test_history_survives_reopen() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let file = temp.path().join("notes.md");

    {
        let service = TimelineService::open(temp.path(), no_seed())
            .await
            .expect("Failed to open timeline");
        fs::write(&file, "v1\n").expect("Failed to write file");
        service.save_timeline("notes.md", "v1").await;
        fs::write(&file, "v2\n").expect("Failed to write file");
        service.save_timeline("notes.md", "v2").await;
    }

    let service = TimelineService::open(temp.path(), no_seed())
        .await
        .expect("Failed to reopen timeline");
    let history = service.history("notes.md").await.expect("Failed to list history");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].message, "v2");
    assert_eq!(history[1].message, "v1");
}

#[tokio::test]
async fn test_fresh_repository_seeds_existing_files() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    fs::write(temp.path().join("README.md"), "hello\n").expect("Failed to write file");

    let service = TimelineService::open(temp.path(), TimelineConfig::default())
        .await
        .expect("Failed to open timeline");

    let history = service
        .history("README.md")
        .await
        .expect("Failed to list history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].message, "init");
}

#[tokio::test]
async fn test_history_only_lists_changing_commits() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let service = TimelineService::open(temp.path(), no_seed())
        .await
        .expect("Failed to open timeline");

    fs::write(temp.path().join("a.md"), "a1\n").expect("Failed to write file");
    fs::write(temp.path().join("b.md"), "b1\n").expect("Failed to write file");

    service.save_timeline("a.md", "a v1").await;
    service.save_timeline("b.md", "b v1").await;
    fs::write(temp.path().join("a.md"), "a2\n").expect("Failed to write file");
    service.save_timeline("a.md", "a v2").await;

    // Commits that left a.md untouched are filtered out
    let history = service.history("a.md").await.expect("Failed to list history");
    let messages: Vec<&str> = history.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, vec!["a v2", "a v1"]);
}

#[tokio::test]
async fn test_diff_against_earlier_snapshot() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let file = temp.path().join("poem.txt");
    let service = TimelineService::open(temp.path(), no_seed())
        .await
        .expect("Failed to open timeline");

    fs::write(&file, "roses are red\nviolets are blue\n").expect("Failed to write file");
    let v1 = service
        .save_timeline("poem.txt", "v1")
        .await
        .expect("First save should produce a commit");

    fs::write(&file, "roses are red\nviolets are violet\n").expect("Failed to write file");
    service.save_timeline("poem.txt", "v2").await;

    let report = service
        .target_to_current(v1)
        .await
        .expect("Failed to diff");
    let lines = report.get("poem.txt").expect("poem.txt should differ");

    assert_eq!(lines[0].status, LineStatus::Context);
    assert_eq!(lines[0].content, "roses are red");
    assert!(lines
        .iter()
        .any(|l| l.status == LineStatus::Removed && l.content == "violets are violet"));
    assert!(lines
        .iter()
        .any(|l| l.status == LineStatus::Added && l.content == "violets are blue"));
}

#[tokio::test]
async fn test_watched_path_views_follow_saves() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let file = temp.path().join("notes.md");
    let service = TimelineService::open(temp.path(), no_seed())
        .await
        .expect("Failed to open timeline");
    let mut views = service.subscribe();

    service
        .watch_path("notes.md")
        .await
        .expect("Failed to watch path");

    fs::write(&file, "v1\n").expect("Failed to write file");
    service.save_timeline("notes.md", "v1").await;
    fs::write(&file, "v2\n").expect("Failed to write file");
    service.save_timeline("notes.md", "v2").await;

    // Views are last-write-wins; poll until the second save shows up.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        tokio::time::timeout_at(deadline, views.changed())
            .await
            .expect("view published before deadline")
            .expect("publisher alive");
        let view = views.borrow().clone();
        if view.entries.len() == 2 {
            assert_eq!(view.path.as_deref(), Some("notes.md"));
            assert_eq!(view.entries[0].message, "v2");
            break;
        }
    }
}

#[tokio::test]
async fn test_save_missing_file_leaves_history_untouched() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let service = TimelineService::open(temp.path(), no_seed())
        .await
        .expect("Failed to open timeline");

    assert!(service.save_timeline("ghost.md", "nope").await.is_none());
    let history = service.history("ghost.md").await.expect("Failed to list history");
    assert!(history.is_empty());
}

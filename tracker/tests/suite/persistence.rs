use super::ALICE_TITLE;
use super::ALICE_URL;
use super::FakeHost;
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;
use xtrail_tracker::CheckOutcome;
use xtrail_tracker::HISTORY_KEY;
use xtrail_tracker::RETENTION_CONFIG_KEY;
use xtrail_tracker::RetentionConfig;
use xtrail_tracker::RetentionPeriod;
use xtrail_tracker::Tracker;
use xtrail_tracker::TrackerConfig;
use xtrail_tracker::TrackerError;

fn config_in(dir: &TempDir) -> TrackerConfig {
    TrackerConfig {
        storage_dir: dir.path().join("store"),
        ..TrackerConfig::default()
    }
}

#[tokio::test]
async fn history_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let host = FakeHost::new();
    host.open_page(ALICE_URL, ALICE_TITLE);

    let first = Tracker::open(config_in(&dir), host.clone()).unwrap();
    let CheckOutcome::Recorded(record) = first.pipeline().check(ALICE_URL).await.unwrap() else {
        panic!("expected the visit to be recorded");
    };
    drop(first);

    let reopened = Tracker::open(config_in(&dir), host).unwrap();
    assert_eq!(reopened.config().storage_dir, dir.path().join("store"));
    assert_eq!(reopened.history().load_all().await.unwrap(), vec![record]);
    assert_eq!(
        reopened.pipeline().check(ALICE_URL).await.unwrap(),
        CheckOutcome::Duplicate
    );
}

#[tokio::test]
async fn persisted_layout_uses_camel_case_keys() {
    let dir = TempDir::new().unwrap();
    let host = FakeHost::new();
    host.open_page(ALICE_URL, ALICE_TITLE);
    let tracker = Tracker::open(config_in(&dir), host).unwrap();

    tracker.pipeline().check(ALICE_URL).await.unwrap();
    tracker
        .update_retention(RetentionConfig::new(RetentionPeriod::ThreeMonths))
        .await
        .unwrap();

    let store_dir = dir.path().join("store");
    let history: serde_json::Value = serde_json::from_slice(
        &fs::read(store_dir.join(format!("{HISTORY_KEY}.json"))).unwrap(),
    )
    .unwrap();
    assert_eq!(history[0]["contentId"], "42");
    assert_eq!(history[0]["titleSummary"], "Hello world");
    assert_eq!(history[0]["fullContent"], "Hello world");

    let retention: serde_json::Value = serde_json::from_slice(
        &fs::read(store_dir.join(format!("{RETENTION_CONFIG_KEY}.json"))).unwrap(),
    )
    .unwrap();
    assert_eq!(
        retention,
        serde_json::json!({ "period": "3m", "lastCleanup": 0 })
    );
}

#[tokio::test]
async fn legacy_history_is_readable() {
    let dir = TempDir::new().unwrap();
    let store_dir = dir.path().join("store");
    fs::create_dir_all(&store_dir).unwrap();
    fs::write(
        store_dir.join(format!("{HISTORY_KEY}.json")),
        r#"[{"tweetId":"42","url":"https://x.com/alice/status/42","timestamp":5,"author":"Alice","title":"Hello world"}]"#,
    )
    .unwrap();

    let tracker = Tracker::open(config_in(&dir), FakeHost::new()).unwrap();
    let history = tracker.history().load_all().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].content_id, "42");
    assert_eq!(history[0].title_summary.as_deref(), Some("Hello world"));
    assert_eq!(history[0].full_content, None);
}

#[test]
fn config_file_overrides_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        "hosts = [\"x.com\"]\nsummary_max_chars = 10\nsweep_interval_secs = 600\n",
    )
    .unwrap();

    let config = TrackerConfig::load_from(&path).unwrap();
    assert_eq!(config.hosts, vec!["x.com"]);
    assert_eq!(config.summary_max_chars, 10);
    assert_eq!(config.debounce_ms, 300);
}

#[test]
fn empty_host_list_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = TrackerConfig {
        hosts: Vec::new(),
        ..config_in(&dir)
    };
    let result = Tracker::open(config, FakeHost::new());
    assert!(matches!(result, Err(TrackerError::Config(_))));
}

use super::ALICE_TITLE;
use super::ALICE_URL;
use super::FakeHost;
use super::memory_tracker;
use pretty_assertions::assert_eq;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use xtrail_tracker::NavigationSignal;

fn mutation(url: &str) -> NavigationSignal {
    NavigationSignal::Mutation {
        url: Some(url.to_string()),
    }
}

fn tab_updated(url: &str) -> NavigationSignal {
    NavigationSignal::TabUpdated {
        url: url.to_string(),
    }
}

fn status_url(id: u32) -> String {
    format!("https://x.com/someone/status/{id}")
}

#[tokio::test(start_paused = true)]
async fn rapid_triggers_for_one_page_record_once() {
    let host = FakeHost::new();
    host.open_page(ALICE_URL, ALICE_TITLE);
    let tracker = memory_tracker(host.clone());
    let mut updates = tracker.subscribe();
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = tracker.start(rx);

    tx.send(mutation(ALICE_URL)).unwrap();
    sleep(Duration::from_millis(100)).await;
    tx.send(mutation(ALICE_URL)).unwrap();
    sleep(Duration::from_secs(2)).await;

    let message = updates.recv().await.unwrap();
    assert_eq!(message.record().map(|r| r.content_id.as_str()), Some("42"));
    assert!(updates.try_recv().is_err());
    assert_eq!(host.lookups(), vec![ALICE_URL.to_string()]);
    assert_eq!(tracker.history().load_all().await.unwrap().len(), 1);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn debounce_checks_only_the_latest_url_of_a_burst() {
    let host = FakeHost::new();
    let tracker = memory_tracker(host.clone());
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = tracker.start(rx);

    for id in 1..=3 {
        tx.send(mutation(&status_url(id))).unwrap();
        sleep(Duration::from_millis(100)).await;
    }
    assert!(host.lookups().is_empty());

    sleep(Duration::from_millis(250)).await;
    assert_eq!(host.lookups(), vec![status_url(3)]);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn throttle_checks_leading_and_trailing_edges() {
    let host = FakeHost::new();
    let tracker = memory_tracker(host.clone());
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = tracker.start(rx);

    tx.send(tab_updated(&status_url(1))).unwrap();
    sleep(Duration::from_millis(10)).await;
    assert_eq!(host.lookups(), vec![status_url(1)]);

    tx.send(tab_updated(&status_url(2))).unwrap();
    tx.send(tab_updated(&status_url(3))).unwrap();
    sleep(Duration::from_millis(500)).await;
    assert_eq!(host.lookups().len(), 1);

    sleep(Duration::from_millis(600)).await;
    assert_eq!(host.lookups(), vec![status_url(1), status_url(3)]);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn unchanged_url_is_not_checked_again() {
    let host = FakeHost::new();
    let tracker = memory_tracker(host.clone());
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = tracker.start(rx);

    tx.send(tab_updated(&status_url(1))).unwrap();
    sleep(Duration::from_secs(2)).await;
    tx.send(tab_updated(&status_url(1))).unwrap();
    sleep(Duration::from_secs(2)).await;
    tx.send(tab_updated(&status_url(2))).unwrap();
    sleep(Duration::from_secs(2)).await;

    assert_eq!(host.lookups(), vec![status_url(1), status_url(2)]);
    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn signals_without_url_check_the_active_tab() {
    let host = FakeHost::new();
    host.open_page(ALICE_URL, ALICE_TITLE);
    host.focus(ALICE_URL);
    let tracker = memory_tracker(host.clone());
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = tracker.start(rx);

    tx.send(NavigationSignal::CheckNow { url: None }).unwrap();
    sleep(Duration::from_millis(10)).await;

    assert_eq!(host.lookups(), vec![ALICE_URL.to_string()]);
    assert!(tracker.history().contains("42").await.unwrap());
    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn closing_the_source_flushes_pending_checks() {
    let host = FakeHost::new();
    host.open_page(ALICE_URL, ALICE_TITLE);
    let tracker = memory_tracker(host);
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = tracker.start(rx);

    tx.send(mutation(ALICE_URL)).unwrap();
    drop(tx);
    handle.join().await;

    assert!(tracker.history().contains("42").await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn shutdown_drops_pending_checks() {
    let host = FakeHost::new();
    host.open_page(ALICE_URL, ALICE_TITLE);
    let tracker = memory_tracker(host.clone());
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = tracker.start(rx);

    tx.send(mutation(ALICE_URL)).unwrap();
    sleep(Duration::from_millis(10)).await;
    handle.shutdown().await;

    assert!(host.lookups().is_empty());
    assert!(tracker.history().load_all().await.unwrap().is_empty());
}

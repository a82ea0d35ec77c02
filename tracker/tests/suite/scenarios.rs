use super::ALICE_TITLE;
use super::ALICE_URL;
use super::FakeHost;
use super::memory_tracker;
use pretty_assertions::assert_eq;
use xtrail_tracker::CheckOutcome;
use xtrail_tracker::HistoryMessage;

#[tokio::test]
async fn matching_title_is_recorded() {
    let host = FakeHost::new();
    host.open_page(ALICE_URL, ALICE_TITLE);
    let tracker = memory_tracker(host);
    let mut updates = tracker.subscribe();

    let outcome = tracker.pipeline().check(ALICE_URL).await.unwrap();
    let CheckOutcome::Recorded(record) = outcome else {
        panic!("expected a recorded visit, got {outcome:?}");
    };
    assert_eq!(record.content_id, "42");
    assert_eq!(record.url, ALICE_URL);
    assert_eq!(record.author.as_deref(), Some("Alice"));
    assert_eq!(record.title_summary.as_deref(), Some("Hello world"));
    assert_eq!(record.full_content.as_deref(), Some("Hello world"));

    assert_eq!(
        updates.recv().await.unwrap(),
        HistoryMessage::inserted(record.clone())
    );
    assert_eq!(tracker.history().load_all().await.unwrap(), vec![record]);
}

#[tokio::test]
async fn unrelated_title_is_skipped_silently() {
    let host = FakeHost::new();
    host.open_page(ALICE_URL, "random unrelated text");
    let tracker = memory_tracker(host);
    let mut updates = tracker.subscribe();

    assert_eq!(
        tracker.pipeline().check(ALICE_URL).await.unwrap(),
        CheckOutcome::NoMetadata
    );
    assert!(tracker.history().load_all().await.unwrap().is_empty());
    assert!(updates.try_recv().is_err());
}

#[tokio::test]
async fn newer_visits_come_first_and_first_visit_wins() {
    let host = FakeHost::new();
    let bob = "https://twitter.com/bob/status/7";
    host.open_page(ALICE_URL, ALICE_TITLE);
    host.open_page(bob, r#"Bob on X: "second post""#);
    let tracker = memory_tracker(host.clone());

    tracker.pipeline().check(ALICE_URL).await.unwrap();
    tracker.pipeline().check(bob).await.unwrap();
    let revisit = format!("{ALICE_URL}?s=20");
    host.open_page(&revisit, r#"Alice on X: "edited""#);
    assert_eq!(
        tracker.pipeline().check(&revisit).await.unwrap(),
        CheckOutcome::Duplicate
    );

    let history = tracker.history().load_all().await.unwrap();
    let ids: Vec<&str> = history.iter().map(|r| r.content_id.as_str()).collect();
    assert_eq!(ids, vec!["7", "42"]);
    assert_eq!(history[1].full_content.as_deref(), Some("Hello world"));
}

#[tokio::test]
async fn page_without_open_tab_yields_no_metadata() {
    let tracker = memory_tracker(FakeHost::new());
    assert_eq!(
        tracker.pipeline().check(ALICE_URL).await.unwrap(),
        CheckOutcome::NoMetadata
    );
}

#[tokio::test]
async fn search_finds_recorded_visits() {
    let host = FakeHost::new();
    host.open_page(ALICE_URL, ALICE_TITLE);
    let tracker = memory_tracker(host);
    tracker.pipeline().check(ALICE_URL).await.unwrap();

    let hits = tracker.history().search("hello").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert!(tracker.history().search("goodbye").await.unwrap().is_empty());
}

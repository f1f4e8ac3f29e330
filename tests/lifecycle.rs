//! End-to-end lifecycle tests: start, stop, rate, clear, driven through the
//! controllers against a real on-disk store with a pinned clock.

use std::sync::{
    atomic::{AtomicI64, Ordering},
    Arc,
};

use sleeplog::{
    Database, NightRepository, OneShot, QualityController, TrackerController, UNRATED_QUALITY,
};
use tempfile::TempDir;

async fn open_repo() -> (TempDir, NightRepository) {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = TempDir::new().expect("temp dir");
    let db = Database::new(dir.path().join("sleeplog.sqlite3")).expect("open database");
    let repo = NightRepository::new(db).await.expect("repository");
    (dir, repo)
}

fn manual_clock(initial: i64) -> (Arc<AtomicI64>, impl Fn() -> i64 + Send + Sync + 'static) {
    let now = Arc::new(AtomicI64::new(initial));
    let handle = Arc::clone(&now);
    (now, move || handle.load(Ordering::SeqCst))
}

#[tokio::test]
async fn empty_store_initializes_idle() {
    let (_dir, repo) = open_repo().await;
    let tracker = TrackerController::new(repo).await.unwrap();

    let snapshot = tracker.subscribe_snapshot().borrow().clone();
    assert!(snapshot.start_visible);
    assert!(!snapshot.stop_visible);
    assert!(!snapshot.clear_visible);
    assert_eq!(snapshot.history_text, "");
    assert!(tracker.current_night().is_none());
}

#[tokio::test]
async fn start_persists_an_open_night() {
    let (_dir, repo) = open_repo().await;
    let (_now, clock) = manual_clock(1000);
    let tracker = TrackerController::with_clock(repo.clone(), clock)
        .await
        .unwrap();

    tracker.on_start_tracking().await.unwrap();

    let stored = repo.get_most_recent().await.unwrap().unwrap();
    assert_eq!(stored.start_time_milli, 1000);
    assert_eq!(stored.end_time_milli, 1000);
    assert_eq!(stored.sleep_quality, UNRATED_QUALITY);

    let tonight = tracker.current_night().unwrap();
    assert!(tonight.is_in_progress());
    assert_eq!(tonight, stored);

    let snapshot = tracker.subscribe_snapshot().borrow().clone();
    assert!(snapshot.stop_visible);
    assert!(!snapshot.start_visible);
    assert!(snapshot.clear_visible);
}

#[tokio::test]
async fn stop_completes_the_night_and_navigates() {
    let (_dir, repo) = open_repo().await;
    let (now, clock) = manual_clock(1000);
    let tracker = TrackerController::with_clock(repo.clone(), clock)
        .await
        .unwrap();

    tracker.on_start_tracking().await.unwrap();
    let inserted = repo.get_most_recent().await.unwrap().unwrap();

    now.store(5000, Ordering::SeqCst);
    tracker.on_stop_tracking().await.unwrap();

    let nav = tracker.subscribe_navigate_to_quality().borrow().clone();
    let payload = match nav {
        OneShot::Pending(night) => night,
        OneShot::Consumed => panic!("stop must fire the navigation one-shot"),
    };
    assert_eq!(payload.night_id, inserted.night_id);
    assert_eq!(payload.start_time_milli, 1000);
    assert_eq!(payload.end_time_milli, 5000);
    assert!(payload.end_time_milli > payload.start_time_milli);

    // What was written equals what is read back by key.
    let stored = repo.get(payload.night_id).await.unwrap();
    assert_eq!(stored, payload);

    // Implicit return to idle: the held night is completed now.
    let snapshot = tracker.subscribe_snapshot().borrow().clone();
    assert!(snapshot.start_visible);
    assert!(!snapshot.stop_visible);
}

#[tokio::test]
async fn set_quality_updates_the_row_and_navigates_back() {
    let (_dir, repo) = open_repo().await;
    let (now, clock) = manual_clock(1000);
    let tracker = TrackerController::with_clock(repo.clone(), clock)
        .await
        .unwrap();

    tracker.on_start_tracking().await.unwrap();
    now.store(5000, Ordering::SeqCst);
    tracker.on_stop_tracking().await.unwrap();
    let night_key = repo.get_most_recent().await.unwrap().unwrap().night_id;

    let quality = QualityController::new(repo.clone(), night_key);
    let back_rx = quality.subscribe_navigate_back();
    quality.on_set_sleep_quality(3).await.unwrap();

    assert_eq!(repo.get(night_key).await.unwrap().sleep_quality, 3);
    assert!(back_rx.borrow().is_pending());

    quality.done_navigating();
    assert!(!back_rx.borrow().is_pending());

    // The tracker's history text follows the external write.
    let mut snapshot_rx = tracker.subscribe_snapshot();
    let snapshot = snapshot_rx
        .wait_for(|s| s.history_text.contains("ok"))
        .await
        .unwrap();
    assert!(snapshot.history_text.contains("Here is your sleep data"));
}

#[tokio::test]
async fn clear_wipes_history_and_fires_the_notice_once() {
    let (_dir, repo) = open_repo().await;
    let (now, clock) = manual_clock(1000);
    let tracker = TrackerController::with_clock(repo.clone(), clock)
        .await
        .unwrap();

    tracker.on_start_tracking().await.unwrap();
    now.store(5000, Ordering::SeqCst);
    tracker.on_stop_tracking().await.unwrap();

    tracker.on_clear().await.unwrap();

    assert!(repo.get_most_recent().await.unwrap().is_none());
    assert!(tracker.current_night().is_none());

    let snapshot = tracker.subscribe_snapshot().borrow().clone();
    assert!(!snapshot.clear_visible);
    assert_eq!(snapshot.history_text, "");

    let notice_rx = tracker.subscribe_cleared_notice();
    assert!(notice_rx.borrow().is_pending());
    tracker.done_showing_notice();
    assert!(!notice_rx.borrow().is_pending());

    // A fresh subscription after acknowledgment sees the inert value, not a
    // replay of the earlier notice.
    assert_eq!(*tracker.subscribe_cleared_notice().borrow(), OneShot::Consumed);
}

#[tokio::test]
async fn acknowledged_navigation_does_not_refire_on_resubscribe() {
    let (_dir, repo) = open_repo().await;
    let (now, clock) = manual_clock(1000);
    let tracker = TrackerController::with_clock(repo, clock).await.unwrap();

    tracker.on_start_tracking().await.unwrap();
    now.store(5000, Ordering::SeqCst);
    tracker.on_stop_tracking().await.unwrap();
    tracker.done_navigating();

    let rx = tracker.subscribe_navigate_to_quality();
    assert_eq!(*rx.borrow(), OneShot::Consumed);
}

#[tokio::test]
async fn in_progress_night_survives_a_restart() {
    let (_dir, repo) = open_repo().await;
    let (_now, clock) = manual_clock(1000);

    let night_id = {
        let tracker = TrackerController::with_clock(repo.clone(), clock)
            .await
            .unwrap();
        tracker.on_start_tracking().await.unwrap();
        tracker.current_night().unwrap().night_id
    };

    // New holder over the same store adopts the still-open night.
    let tracker = TrackerController::new(repo).await.unwrap();
    let tonight = tracker.current_night().unwrap();
    assert_eq!(tonight.night_id, night_id);
    assert!(tonight.is_in_progress());

    let snapshot = tracker.subscribe_snapshot().borrow().clone();
    assert!(snapshot.stop_visible);
}

#[tokio::test]
async fn completed_night_is_not_adopted_at_startup() {
    let (_dir, repo) = open_repo().await;
    let (now, clock) = manual_clock(1000);

    {
        let tracker = TrackerController::with_clock(repo.clone(), clock)
            .await
            .unwrap();
        tracker.on_start_tracking().await.unwrap();
        now.store(5000, Ordering::SeqCst);
        tracker.on_stop_tracking().await.unwrap();
    }

    let tracker = TrackerController::new(repo).await.unwrap();
    assert!(tracker.current_night().is_none());
    assert!(tracker.subscribe_snapshot().borrow().start_visible);
}

#[tokio::test]
async fn double_start_keeps_a_single_open_night() {
    let (_dir, repo) = open_repo().await;
    let (_now, clock) = manual_clock(1000);
    let tracker = TrackerController::with_clock(repo.clone(), clock)
        .await
        .unwrap();

    tracker.on_start_tracking().await.unwrap();
    tracker.on_start_tracking().await.unwrap();

    let history = repo.observe_all_desc().borrow().clone();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn stop_without_a_current_night_is_a_no_op() {
    let (_dir, repo) = open_repo().await;
    let tracker = TrackerController::new(repo.clone()).await.unwrap();

    tracker.on_stop_tracking().await.unwrap();

    assert!(repo.get_most_recent().await.unwrap().is_none());
    assert_eq!(
        *tracker.subscribe_navigate_to_quality().borrow(),
        OneShot::Consumed
    );
}

#[tokio::test]
async fn end_time_never_precedes_start_time() {
    let (_dir, repo) = open_repo().await;
    let (now, clock) = manual_clock(1000);
    let tracker = TrackerController::with_clock(repo.clone(), clock)
        .await
        .unwrap();

    tracker.on_start_tracking().await.unwrap();
    now.store(5000, Ordering::SeqCst);
    tracker.on_stop_tracking().await.unwrap();
    // A second stop on the completed night must not touch it again.
    now.store(9000, Ordering::SeqCst);
    tracker.on_stop_tracking().await.unwrap();

    for night in repo.observe_all_desc().borrow().iter() {
        assert!(night.end_time_milli >= night.start_time_milli);
    }
    let stored = repo.get_most_recent().await.unwrap().unwrap();
    assert_eq!(stored.end_time_milli, 5000);
}

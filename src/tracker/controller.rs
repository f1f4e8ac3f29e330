use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use log::info;
use serde::Serialize;
use tokio::{sync::watch, task::JoinHandle};

use crate::{db::SleepNight, repository::NightRepository};

use super::{
    format::format_nights,
    signals::{OneShot, OneShotSignal},
};

/// Everything the tracker screen binds to, derived from the tonight slot and
/// the observed history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerSnapshot {
    pub start_visible: bool,
    pub stop_visible: bool,
    pub clear_visible: bool,
    pub history_text: String,
}

fn derive_snapshot(tonight: Option<&SleepNight>, history: &[SleepNight]) -> TrackerSnapshot {
    let tracking = tonight.is_some_and(SleepNight::is_in_progress);
    TrackerSnapshot {
        start_visible: !tracking,
        stop_visible: tracking,
        clear_visible: !history.is_empty(),
        history_text: format_nights(history),
    }
}

async fn fetch_tonight(repo: &NightRepository) -> Result<Option<SleepNight>> {
    Ok(repo
        .get_most_recent()
        .await?
        .filter(SleepNight::is_in_progress))
}

/// View-state holder for the tracker screen. Sole writer of the tonight slot
/// and the one-shot signals; consumers subscribe through watch channels.
pub struct TrackerController {
    repo: NightRepository,
    tonight: Arc<watch::Sender<Option<SleepNight>>>,
    snapshot: Arc<watch::Sender<TrackerSnapshot>>,
    history: watch::Receiver<Vec<SleepNight>>,
    navigate_to_quality: OneShotSignal<SleepNight>,
    show_cleared_notice: OneShotSignal<()>,
    refresher: JoinHandle<()>,
    now_ms: Arc<dyn Fn() -> i64 + Send + Sync>,
}

impl TrackerController {
    pub async fn new(repo: NightRepository) -> Result<Self> {
        Self::with_clock(repo, || Utc::now().timestamp_millis()).await
    }

    /// Like [`Self::new`] but with an injected clock, so tests can pin
    /// timestamps.
    pub async fn with_clock(
        repo: NightRepository,
        now_ms: impl Fn() -> i64 + Send + Sync + 'static,
    ) -> Result<Self> {
        // Adopt the most recent night only while it is still open, through
        // the same path every later re-fetch uses. Makes an in-progress night
        // durable across restarts.
        let adopted = fetch_tonight(&repo).await?;
        if let Some(night) = &adopted {
            info!("resuming in-progress night {}", night.night_id);
        }

        let history = repo.observe_all_desc();
        let initial = derive_snapshot(adopted.as_ref(), history.borrow().as_slice());

        let (tonight, _) = watch::channel(adopted);
        let tonight = Arc::new(tonight);
        let (snapshot, _) = watch::channel(initial);
        let snapshot = Arc::new(snapshot);

        // Recompute the derived snapshot on every store emission, including
        // writes made by other holders (the quality screen).
        let refresher = {
            let mut history_rx = repo.observe_all_desc();
            let tonight = Arc::clone(&tonight);
            let snapshot = Arc::clone(&snapshot);
            tokio::spawn(async move {
                while history_rx.changed().await.is_ok() {
                    let nights = history_rx.borrow_and_update().clone();
                    let current = tonight.borrow().clone();
                    snapshot.send_replace(derive_snapshot(current.as_ref(), &nights));
                }
            })
        };

        Ok(Self {
            repo,
            tonight,
            snapshot,
            history,
            navigate_to_quality: OneShotSignal::new(),
            show_cleared_notice: OneShotSignal::new(),
            refresher,
            now_ms: Arc::new(now_ms),
        })
    }

    /// Start command. A no-op while an in-progress night is already held, so
    /// a double-tap cannot insert two open nights.
    pub async fn on_start_tracking(&self) -> Result<()> {
        if self
            .tonight
            .borrow()
            .as_ref()
            .is_some_and(SleepNight::is_in_progress)
        {
            return Ok(());
        }

        let night = SleepNight::started_at((self.now_ms)());
        self.repo.insert(&night).await?;

        // Repopulate the slot from storage, not from the in-memory value the
        // insert was built from.
        let adopted = fetch_tonight(&self.repo).await?;
        self.tonight.send_replace(adopted);
        self.refresh_signals();
        Ok(())
    }

    /// Stop command. Completes the held night and fires the quality-screen
    /// navigation one-shot with the persisted record. The completed night
    /// stays in the slot; the in-progress predicate turning false is what
    /// flips the buttons back.
    pub async fn on_stop_tracking(&self) -> Result<()> {
        let current = self.tonight.borrow().clone();
        let Some(mut night) = current else {
            return Ok(());
        };
        if night.is_completed() {
            return Ok(());
        }

        night.end_time_milli = (self.now_ms)();
        self.repo.update(&night).await?;

        self.tonight.send_replace(Some(night.clone()));
        self.refresh_signals();
        self.navigate_to_quality.fire(night);
        Ok(())
    }

    /// Clear command. Wipes the table, empties the slot and fires the
    /// confirmation notice.
    pub async fn on_clear(&self) -> Result<()> {
        self.repo.clear_all().await?;
        self.tonight.send_replace(None);
        self.refresh_signals();
        self.show_cleared_notice.fire(());
        info!("cleared sleep history");
        Ok(())
    }

    pub fn current_night(&self) -> Option<SleepNight> {
        self.tonight.borrow().clone()
    }

    pub fn subscribe_tonight(&self) -> watch::Receiver<Option<SleepNight>> {
        self.tonight.subscribe()
    }

    pub fn subscribe_snapshot(&self) -> watch::Receiver<TrackerSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn subscribe_navigate_to_quality(&self) -> watch::Receiver<OneShot<SleepNight>> {
        self.navigate_to_quality.subscribe()
    }

    pub fn subscribe_cleared_notice(&self) -> watch::Receiver<OneShot<()>> {
        self.show_cleared_notice.subscribe()
    }

    pub fn done_navigating(&self) {
        self.navigate_to_quality.acknowledge();
    }

    pub fn done_showing_notice(&self) {
        self.show_cleared_notice.acknowledge();
    }

    fn refresh_signals(&self) {
        let nights = self.history.borrow().clone();
        let current = self.tonight.borrow().clone();
        self.snapshot
            .send_replace(derive_snapshot(current.as_ref(), &nights));
    }
}

impl Drop for TrackerController {
    fn drop(&mut self) {
        self.refresher.abort();
    }
}

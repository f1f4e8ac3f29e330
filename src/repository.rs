use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;

use crate::db::{Database, SleepNight};

/// Storefront the view-state controllers talk to. Wraps the database and owns
/// the live history channel: every mutating call republishes the full
/// descending-by-id snapshot after the write commits.
#[derive(Clone)]
pub struct NightRepository {
    db: Database,
    history: Arc<watch::Sender<Vec<SleepNight>>>,
}

impl NightRepository {
    pub async fn new(db: Database) -> Result<Self> {
        let initial = db.list_nights_desc().await?;
        let (history, _) = watch::channel(initial);
        Ok(Self {
            db,
            history: Arc::new(history),
        })
    }

    pub async fn insert(&self, night: &SleepNight) -> Result<()> {
        self.db.insert_night(night).await?;
        self.republish().await
    }

    pub async fn update(&self, night: &SleepNight) -> Result<()> {
        self.db.update_night(night).await?;
        self.republish().await
    }

    pub async fn get(&self, night_id: i64) -> Result<SleepNight> {
        self.db.get_night(night_id).await
    }

    pub async fn get_most_recent(&self) -> Result<Option<SleepNight>> {
        self.db.get_latest_night().await
    }

    pub async fn clear_all(&self) -> Result<()> {
        self.db.clear_nights().await?;
        self.republish().await
    }

    /// Live descending view of the whole table. New subscribers observe the
    /// current snapshot immediately; every mutation emits a fresh one.
    pub fn observe_all_desc(&self) -> watch::Receiver<Vec<SleepNight>> {
        self.history.subscribe()
    }

    async fn republish(&self) -> Result<()> {
        let snapshot = self.db.list_nights_desc().await?;
        self.history.send_replace(snapshot);
        Ok(())
    }
}

use anyhow::Result;
use tokio::sync::watch;

use crate::repository::NightRepository;

use super::signals::{OneShot, OneShotSignal};

/// View-state holder for the quality screen, bound to one night by key.
pub struct QualityController {
    repo: NightRepository,
    night_key: i64,
    navigate_back: OneShotSignal<()>,
}

impl QualityController {
    pub fn new(repo: NightRepository, night_key: i64) -> Self {
        Self {
            repo,
            night_key,
            navigate_back: OneShotSignal::new(),
        }
    }

    /// Rates the bound night and fires the navigate-back one-shot. The value
    /// is stored as given; the store does not constrain the range.
    pub async fn on_set_sleep_quality(&self, quality: i32) -> Result<()> {
        let mut night = self.repo.get(self.night_key).await?;
        night.sleep_quality = quality;
        self.repo.update(&night).await?;
        self.navigate_back.fire(());
        Ok(())
    }

    pub fn subscribe_navigate_back(&self) -> watch::Receiver<OneShot<()>> {
        self.navigate_back.subscribe()
    }

    pub fn done_navigating(&self) {
        self.navigate_back.acknowledge();
    }
}

use serde::{Deserialize, Serialize};

/// Quality value stored before the user has rated a night.
pub const UNRATED_QUALITY: i32 = -1;

/// One sleep record. The store assigns `night_id` on insert; a freshly
/// started night has `end_time_milli == start_time_milli` until stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepNight {
    pub night_id: i64,
    pub start_time_milli: i64,
    pub end_time_milli: i64,
    pub sleep_quality: i32,
}

impl SleepNight {
    pub fn started_at(start_time_milli: i64) -> Self {
        Self {
            night_id: 0,
            start_time_milli,
            end_time_milli: start_time_milli,
            sleep_quality: UNRATED_QUALITY,
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.end_time_milli == self.start_time_milli
    }

    pub fn is_completed(&self) -> bool {
        self.end_time_milli > self.start_time_milli
    }

    pub fn duration_milli(&self) -> i64 {
        self.end_time_milli - self.start_time_milli
    }
}

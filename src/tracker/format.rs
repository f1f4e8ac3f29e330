use std::fmt::Write;

use chrono::{TimeZone, Utc};

use crate::db::SleepNight;

pub fn quality_label(quality: i32) -> &'static str {
    match quality {
        0 => "very bad",
        1 => "poor",
        2 => "so-so",
        3 => "ok",
        4 => "pretty good",
        5 => "excellent",
        _ => "--",
    }
}

/// Plain-text rendering of the history feed, newest night first.
pub fn format_nights(nights: &[SleepNight]) -> String {
    if nights.is_empty() {
        return String::new();
    }

    let mut out = String::from("Here is your sleep data:\n");
    for night in nights {
        let started = Utc
            .timestamp_millis_opt(night.start_time_milli)
            .single()
            .map(|dt| dt.format("%a %b %d %Y").to_string())
            .unwrap_or_else(|| night.start_time_milli.to_string());

        if night.is_in_progress() {
            let _ = writeln!(out, "{started} -- still sleeping");
        } else {
            let hours = night.duration_milli() as f64 / 3_600_000.0;
            let _ = writeln!(
                out,
                "{started} -- {hours:.1} h, quality: {}",
                quality_label(night.sleep_quality)
            );
        }
    }
    out
}

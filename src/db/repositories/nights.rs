use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Row};

use crate::db::{connection::Database, models::SleepNight};

fn row_to_night(row: &Row) -> rusqlite::Result<SleepNight> {
    Ok(SleepNight {
        night_id: row.get("nightId")?,
        start_time_milli: row.get("startTimeMilli")?,
        end_time_milli: row.get("endTimeMilli")?,
        sleep_quality: row.get("sleepQuality")?,
    })
}

impl Database {
    pub async fn insert_night(&self, night: &SleepNight) -> Result<i64> {
        let record = night.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO daily_sleep_quality_table (startTimeMilli, endTimeMilli, sleepQuality)
                 VALUES (?1, ?2, ?3)",
                params![
                    record.start_time_milli,
                    record.end_time_milli,
                    record.sleep_quality,
                ],
            )
            .context("failed to insert night")?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    pub async fn update_night(&self, night: &SleepNight) -> Result<()> {
        let record = night.clone();
        self.execute(move |conn| {
            let rows_affected = conn.execute(
                "UPDATE daily_sleep_quality_table
                 SET startTimeMilli = ?1,
                     endTimeMilli = ?2,
                     sleepQuality = ?3
                 WHERE nightId = ?4",
                params![
                    record.start_time_milli,
                    record.end_time_milli,
                    record.sleep_quality,
                    record.night_id,
                ],
            )?;

            if rows_affected == 0 {
                return Err(anyhow!("night {} not found", record.night_id));
            }

            Ok(())
        })
        .await
    }

    pub async fn get_night(&self, night_id: i64) -> Result<SleepNight> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT nightId, startTimeMilli, endTimeMilli, sleepQuality
                 FROM daily_sleep_quality_table
                 WHERE nightId = ?1",
            )?;

            let night = stmt
                .query_row(params![night_id], row_to_night)
                .with_context(|| format!("night {night_id} not found"))?;

            Ok(night)
        })
        .await
    }

    pub async fn get_latest_night(&self) -> Result<Option<SleepNight>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT nightId, startTimeMilli, endTimeMilli, sleepQuality
                 FROM daily_sleep_quality_table
                 ORDER BY nightId DESC
                 LIMIT 1",
            )?;

            let mut rows = stmt.query([])?;
            let night = match rows.next()? {
                Some(row) => Some(row_to_night(row)?),
                None => None,
            };
            Ok(night)
        })
        .await
    }

    pub async fn clear_nights(&self) -> Result<()> {
        self.execute(|conn| {
            conn.execute("DELETE FROM daily_sleep_quality_table", [])
                .context("failed to clear nights")?;
            Ok(())
        })
        .await
    }

    pub async fn list_nights_desc(&self) -> Result<Vec<SleepNight>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT nightId, startTimeMilli, endTimeMilli, sleepQuality
                 FROM daily_sleep_quality_table
                 ORDER BY nightId DESC",
            )?;

            let mut rows = stmt.query([])?;
            let mut nights = Vec::new();
            while let Some(row) = rows.next()? {
                nights.push(row_to_night(row)?);
            }

            Ok(nights)
        })
        .await
    }
}

//! Statistics views over the local cache.
//!
//! Lifetime totals and the fate index prefer the server when signed in, since
//! the cache may hold only part of the user's history.

use chrono::Datelike;

use crate::api::RemoteApi;
use crate::clock::format_date;
use crate::error::Result;
use crate::models::{DayStats, FateLevel, MonthStats, TodayStats, TotalStats, WeekDay};
use crate::stats;

use super::{with_remote_fallback, Store};

impl<A: RemoteApi> Store<A> {
    pub fn day_stats(&self, date: &str) -> Result<DayStats> {
        Ok(stats::day_stats(&self.cache.load_all()?, date))
    }

    pub fn get_today_stats(&self) -> Result<TodayStats> {
        Ok(stats::today_stats(
            &self.cache.load_all()?,
            self.clock.today(),
        ))
    }

    /// The seven days ending today, oldest first.
    pub fn week_stats(&self) -> Result<Vec<WeekDay>> {
        Ok(stats::week_stats(&self.cache.load_all()?, self.clock.today()))
    }

    pub fn month_stats(&self, year: i32, month: u32) -> Result<MonthStats> {
        Ok(stats::month_stats(&self.cache.load_all()?, year, month))
    }

    pub fn current_month_stats(&self) -> Result<MonthStats> {
        let today = self.clock.today();
        self.month_stats(today.year(), today.month())
    }

    pub async fn total_stats(&self) -> Result<TotalStats> {
        with_remote_fallback(
            "total_stats",
            self.api.is_authenticated(),
            || async {
                let remote = self.api.get_stats().await?;
                Ok(TotalStats {
                    merit: remote.total_gong,
                    fault: remote.total_guo,
                    total_records: remote.total_count,
                })
            },
            || Ok(stats::total_stats(&self.cache.load_all()?)),
        )
        .await
    }

    /// Heuristic 0..=100 "how virtuous recently" score.
    pub async fn fate_index(&self) -> Result<u8> {
        with_remote_fallback(
            "fate_index",
            self.api.is_authenticated(),
            || async {
                let remote = self.api.get_fate_index().await?;
                Ok(u8::try_from(remote.fate_index.clamp(0, 100)).unwrap_or(100))
            },
            || {
                Ok(stats::fate_index(
                    &self.cache.load_all()?,
                    self.clock.today(),
                    self.policy.fate_window_days,
                ))
            },
        )
        .await
    }

    pub async fn fate_level(&self) -> Result<FateLevel> {
        Ok(FateLevel::from_index(self.fate_index().await?))
    }

    /// Today's bucket key.
    pub fn today(&self) -> String {
        format_date(self.clock.today())
    }
}

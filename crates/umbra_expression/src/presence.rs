//! Daily post window
//!
//! One unprompted post per local calendar day, only before the cutoff.

use anyhow::Result;
use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use umbra_core::config::PlannerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyWindow {
    /// Local time-of-day after which no daily post is planned (exclusive).
    pub cutoff: NaiveTime,
}

impl DailyWindow {
    pub fn new(cutoff: NaiveTime) -> Self {
        Self { cutoff }
    }

    pub fn from_config(config: &PlannerConfig) -> Result<Self> {
        Ok(Self::new(config.cutoff_time()?))
    }

    /// Is `local_time` still before the cutoff?
    pub fn is_open(&self, local_time: NaiveTime) -> bool {
        local_time < self.cutoff
    }

    /// True unless the last daily post fell on the same local date as `now`.
    pub fn allows_today<Tz: TimeZone>(&self, last_daily: Option<DateTime<Utc>>, now: &DateTime<Tz>) -> bool {
        match last_daily {
            None => true,
            Some(last) => last.with_timezone(&now.timezone()).date_naive() != now.date_naive(),
        }
    }
}

impl Default for DailyWindow {
    fn default() -> Self {
        Self::new(NaiveTime::from_hms_opt(22, 0, 0).unwrap_or(NaiveTime::MIN))
    }
}

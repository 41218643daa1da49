//! Aggregate views derived from records

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Score sums for one day
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayStats {
    pub merit: u64,
    pub fault: u64,
    /// Number of distinct records counted
    pub count: usize,
}

/// Today's sums plus per-kind record counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodayStats {
    pub merit: u64,
    pub fault: u64,
    pub merit_count: usize,
    pub fault_count: usize,
    pub total: usize,
}

/// One entry of the trailing-week view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekDay {
    pub date: String,
    /// 0 = Sunday .. 6 = Saturday
    pub weekday: u32,
    pub is_today: bool,
    #[serde(flatten)]
    pub stats: DayStats,
}

/// Merit and fault sums without a count
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindTotals {
    pub merit: u64,
    pub fault: u64,
}

/// Month totals plus a per-day breakdown keyed by `YYYY-MM-DD`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthStats {
    pub merit: u64,
    pub fault: u64,
    pub daily: BTreeMap<String, KindTotals>,
}

/// Lifetime sums
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalStats {
    pub merit: u64,
    pub fault: u64,
    pub total_records: u64,
}

/// Five-step classification of a fate index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FateLevel {
    Dim = 1,
    Glimmer = 2,
    Bright = 3,
    Daylight = 4,
    Radiant = 5,
}

impl FateLevel {
    /// Classify an index: `[0,20)`, `[20,40)`, `[40,60)`, `[60,80)`, `[80,100]`.
    #[must_use]
    pub const fn from_index(index: u8) -> Self {
        match index {
            0..=19 => Self::Dim,
            20..=39 => Self::Glimmer,
            40..=59 => Self::Bright,
            60..=79 => Self::Daylight,
            _ => Self::Radiant,
        }
    }

    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Dim => "dim",
            Self::Glimmer => "glimmer",
            Self::Bright => "bright",
            Self::Daylight => "daylight",
            Self::Radiant => "radiant",
        }
    }
}

//! Data models for Merit

mod record;
mod stats;

pub(crate) use record::lenient_id;
pub use record::{
    decode_records, iso_timestamp, local_id, NewRecord, Record, RecordKind, RecordUpdate,
    MAX_NOTE_CHARS, MAX_SCORE, MIN_SCORE, PRESET_SCORES,
};
pub use stats::{DayStats, FateLevel, KindTotals, MonthStats, TodayStats, TotalStats, WeekDay};

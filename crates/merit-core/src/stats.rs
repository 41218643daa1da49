//! Statistics engine.
//!
//! Pure derivations over a record slice. Every function de-duplicates by `id`
//! first (keeping the most recent snapshot, see [`dedupe_by_id`]) and skips
//! records without an id or a day bucket, so a cache holding repeated or
//! partially-written entries still yields stable numbers. `today` is always an
//! explicit argument.

use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate};

use crate::clock::format_date;
use crate::models::{
    DayStats, FateLevel, KindTotals, MonthStats, Record, RecordKind, TodayStats, TotalStats,
    WeekDay,
};

/// Fate index reported when the window holds no scored records.
pub const NEUTRAL_FATE_INDEX: u8 = 50;

/// Collapse records sharing an `id` into one, keeping the most recent by
/// `created_at` then `updated_at`. On a full tie the later entry wins, since
/// snapshots are appended in mutation order. First-appearance order of ids is
/// preserved and uncountable records are dropped.
pub fn dedupe_by_id<'a, I>(records: I) -> Vec<&'a Record>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut positions: HashMap<&'a str, usize> = HashMap::new();
    let mut unique: Vec<&'a Record> = Vec::new();

    for record in records {
        if !record.is_countable() {
            continue;
        }
        match positions.get(record.id.as_str()) {
            Some(&position) => {
                if record.recency_cmp(unique[position]).is_ge() {
                    unique[position] = record;
                }
            }
            None => {
                positions.insert(record.id.as_str(), unique.len());
                unique.push(record);
            }
        }
    }

    unique
}

/// Distinct records of one day, ordered by time of day.
pub fn records_for_date<'a>(records: &'a [Record], date: &str) -> Vec<&'a Record> {
    let mut day = dedupe_by_id(records.iter().filter(|record| record.date == date));
    day.sort_by_cached_key(|record| record.sort_time());
    day
}

pub fn day_stats(records: &[Record], date: &str) -> DayStats {
    sum_day(&dedupe_by_id(records.iter().filter(|record| record.date == date)))
}

pub fn today_stats(records: &[Record], today: NaiveDate) -> TodayStats {
    let date = format_date(today);
    let day = dedupe_by_id(records.iter().filter(|record| record.date == date));
    let mut stats = TodayStats {
        total: day.len(),
        ..TodayStats::default()
    };
    for record in day {
        match record.kind {
            RecordKind::Merit => {
                stats.merit += u64::from(record.score);
                stats.merit_count += 1;
            }
            RecordKind::Fault => {
                stats.fault += u64::from(record.score);
                stats.fault_count += 1;
            }
        }
    }
    stats
}

/// The seven days ending at `today` inclusive, oldest first.
pub fn week_stats(records: &[Record], today: NaiveDate) -> Vec<WeekDay> {
    let unique = dedupe_by_id(records);
    (0..7)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            let key = format_date(date);
            let day = unique
                .iter()
                .copied()
                .filter(|record| record.date == key)
                .collect::<Vec<_>>();
            WeekDay {
                date: key,
                weekday: date.weekday().num_days_from_sunday(),
                is_today: offset == 0,
                stats: sum_day(&day),
            }
        })
        .collect()
}

pub fn month_stats(records: &[Record], year: i32, month: u32) -> MonthStats {
    let prefix = format!("{year:04}-{month:02}-");
    let mut stats = MonthStats::default();

    for record in dedupe_by_id(records.iter().filter(|record| record.date.starts_with(&prefix))) {
        let daily = stats.daily.entry(record.date.clone()).or_default();
        add_to_totals(daily, record);
        match record.kind {
            RecordKind::Merit => stats.merit += u64::from(record.score),
            RecordKind::Fault => stats.fault += u64::from(record.score),
        }
    }

    stats
}

pub fn total_stats(records: &[Record]) -> TotalStats {
    let unique = dedupe_by_id(records);
    let mut totals = KindTotals::default();
    for record in &unique {
        add_to_totals(&mut totals, record);
    }
    TotalStats {
        merit: totals.merit,
        fault: totals.fault,
        total_records: unique.len() as u64,
    }
}

/// Heuristic "how virtuous recently" score in `0..=100`.
///
/// Sums merit and fault over the `window_days` days ending at `today`
/// inclusive and returns `round(100 * merit / (merit + fault))`. An empty
/// window yields [`NEUTRAL_FATE_INDEX`]. This is a bounded percentage, not a
/// probability.
pub fn fate_index(records: &[Record], today: NaiveDate, window_days: u32) -> u8 {
    let window_days = window_days.max(1);
    let oldest = today - Duration::days(i64::from(window_days) - 1);
    let oldest = format_date(oldest);
    let newest = format_date(today);

    let mut totals = KindTotals::default();
    for record in dedupe_by_id(records.iter().filter(|record| {
        record.date.as_str() >= oldest.as_str() && record.date.as_str() <= newest.as_str()
    })) {
        add_to_totals(&mut totals, record);
    }

    ratio_index(totals)
}

/// Five-bucket level (1..=5) for a fate index.
pub const fn fate_level(index: u8) -> u8 {
    FateLevel::from_index(index).as_u8()
}

fn ratio_index(totals: KindTotals) -> u8 {
    let total = totals.merit + totals.fault;
    if total == 0 {
        return NEUTRAL_FATE_INDEX;
    }
    let rounded = (totals.merit * 200 + total) / (total * 2);
    u8::try_from(rounded.min(100)).unwrap_or(100)
}

fn sum_day(records: &[&Record]) -> DayStats {
    let mut totals = KindTotals::default();
    for record in records {
        add_to_totals(&mut totals, record);
    }
    DayStats {
        merit: totals.merit,
        fault: totals.fault,
        count: records.len(),
    }
}

fn add_to_totals(totals: &mut KindTotals, record: &Record) {
    match record.kind {
        RecordKind::Merit => totals.merit += u64::from(record.score),
        RecordKind::Fault => totals.fault += u64::from(record.score),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn record(id: &str, date: &str, kind: RecordKind, score: u32) -> Record {
        Record {
            id: id.to_string(),
            date: date.to_string(),
            time: "08:00".to_string(),
            kind,
            score,
            note: None,
            created_at: format!("{date}T08:00:00.000Z"),
            updated_at: format!("{date}T08:00:00.000Z"),
        }
    }

    fn day(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn day_stats_sums_per_kind() {
        let records = vec![
            record("a", "2026-10-14", RecordKind::Merit, 10),
            record("b", "2026-10-14", RecordKind::Merit, 30),
            record("c", "2026-10-14", RecordKind::Fault, 1),
            record("d", "2026-10-13", RecordKind::Fault, 100),
        ];
        assert_eq!(
            day_stats(&records, "2026-10-14"),
            DayStats {
                merit: 40,
                fault: 1,
                count: 3,
            }
        );
    }

    #[test]
    fn day_stats_is_stable_across_calls() {
        let records = vec![
            record("a", "2026-10-14", RecordKind::Merit, 10),
            record("a", "2026-10-14", RecordKind::Merit, 10),
        ];
        let first = day_stats(&records, "2026-10-14");
        let second = day_stats(&records, "2026-10-14");
        assert_eq!(first, second);
    }

    #[test]
    fn duplicate_ids_keep_the_newest_created_at() {
        let older = record("dup", "2026-10-14", RecordKind::Merit, 1);
        let mut newer = record("dup", "2026-10-14", RecordKind::Merit, 100);
        newer.created_at = "2026-10-14T09:00:00.000Z".to_string();

        for records in [
            vec![older.clone(), newer.clone()],
            vec![newer.clone(), older.clone()],
        ] {
            let listed = records_for_date(&records, "2026-10-14");
            assert_eq!(listed.len(), 1);
            assert_eq!(listed[0].score, 100);

            let stats = day_stats(&records, "2026-10-14");
            assert_eq!(stats.merit, 100);
            assert_eq!(stats.count, 1);
        }
    }

    #[test]
    fn duplicate_ids_with_equal_created_at_prefer_later_edit() {
        let original = record("dup", "2026-10-14", RecordKind::Merit, 1);
        let mut edited = original.clone();
        edited.score = 30;
        edited.updated_at = "2026-10-14T10:00:00.000Z".to_string();

        let records = vec![edited, original];
        assert_eq!(day_stats(&records, "2026-10-14").merit, 30);
    }

    #[test]
    fn uncountable_records_are_skipped() {
        let mut no_id = record("", "2026-10-14", RecordKind::Merit, 10);
        no_id.id = "  ".to_string();
        let no_date = record("x", "", RecordKind::Merit, 10);
        let records = vec![no_id, no_date, record("ok", "2026-10-14", RecordKind::Fault, 1)];

        assert_eq!(total_stats(&records).total_records, 1);
        assert_eq!(day_stats(&records, "2026-10-14").count, 1);
    }

    #[test]
    fn records_for_date_sorts_by_time() {
        let mut late = record("late", "2026-10-14", RecordKind::Merit, 1);
        late.time = "21:15".to_string();
        let mut early = record("early", "2026-10-14", RecordKind::Merit, 1);
        early.time = "06:40".to_string();

        let records = vec![late, early];
        let ids = records_for_date(&records, "2026-10-14")
            .iter()
            .map(|record| record.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["early", "late"]);
    }

    #[test]
    fn today_stats_counts_per_kind() {
        let records = vec![
            record("a", "2026-10-14", RecordKind::Merit, 10),
            record("b", "2026-10-14", RecordKind::Fault, 30),
            record("c", "2026-10-14", RecordKind::Fault, 1),
        ];
        assert_eq!(
            today_stats(&records, day("2026-10-14")),
            TodayStats {
                merit: 10,
                fault: 31,
                merit_count: 1,
                fault_count: 2,
                total: 3,
            }
        );
    }

    #[test]
    fn week_stats_covers_seven_days_oldest_first() {
        let records = vec![
            record("a", "2026-10-08", RecordKind::Merit, 5),
            record("b", "2026-10-14", RecordKind::Fault, 2),
            record("c", "2026-10-07", RecordKind::Merit, 99),
        ];
        let week = week_stats(&records, day("2026-10-14"));

        assert_eq!(week.len(), 7);
        assert_eq!(week[0].date, "2026-10-08");
        assert_eq!(week[0].stats.merit, 5);
        assert_eq!(week[6].date, "2026-10-14");
        assert!(week[6].is_today);
        assert!(week[..6].iter().all(|entry| !entry.is_today));
        assert_eq!(week[6].stats.fault, 2);
        // 2026-10-14 is a Wednesday
        assert_eq!(week[6].weekday, 3);
        assert_eq!(week.iter().map(|entry| entry.stats.merit).sum::<u64>(), 5);
    }

    #[test]
    fn month_stats_groups_by_day() {
        let records = vec![
            record("a", "2026-10-01", RecordKind::Merit, 10),
            record("b", "2026-10-01", RecordKind::Fault, 1),
            record("c", "2026-10-31", RecordKind::Merit, 30),
            record("d", "2026-11-01", RecordKind::Merit, 1000),
            record("e", "2026-01-10", RecordKind::Merit, 1000),
        ];
        let month = month_stats(&records, 2026, 10);

        assert_eq!(month.merit, 40);
        assert_eq!(month.fault, 1);
        assert_eq!(month.daily.len(), 2);
        assert_eq!(
            month.daily["2026-10-01"],
            KindTotals {
                merit: 10,
                fault: 1
            }
        );
        assert_eq!(month.daily["2026-10-31"].merit, 30);
    }

    #[test]
    fn total_stats_sums_everything() {
        let records = vec![
            record("a", "2025-01-01", RecordKind::Merit, 10),
            record("b", "2026-10-14", RecordKind::Fault, 3),
        ];
        assert_eq!(
            total_stats(&records),
            TotalStats {
                merit: 10,
                fault: 3,
                total_records: 2,
            }
        );
    }

    #[test]
    fn fate_index_is_neutral_without_records() {
        assert_eq!(fate_index(&[], day("2026-10-14"), 30), 50);

        let outside = vec![record("old", "2026-09-14", RecordKind::Merit, 10)];
        assert_eq!(fate_index(&outside, day("2026-10-14"), 30), 50);
    }

    #[test]
    fn fate_index_extremes() {
        let all_merit = vec![record("a", "2026-10-14", RecordKind::Merit, 10)];
        assert_eq!(fate_index(&all_merit, day("2026-10-14"), 30), 100);

        let all_fault = vec![record("a", "2026-09-15", RecordKind::Fault, 10)];
        assert_eq!(fate_index(&all_fault, day("2026-10-14"), 30), 0);
    }

    #[test]
    fn fate_index_rounds_ratio() {
        let records = vec![
            record("a", "2026-10-14", RecordKind::Merit, 2),
            record("b", "2026-10-10", RecordKind::Fault, 1),
        ];
        // 2 / 3 = 66.67
        assert_eq!(fate_index(&records, day("2026-10-14"), 30), 67);

        let half = vec![
            record("a", "2026-10-14", RecordKind::Merit, 1),
            record("b", "2026-10-14", RecordKind::Fault, 1),
        ];
        assert_eq!(fate_index(&half, day("2026-10-14"), 30), 50);

        let one_eighth = vec![
            record("a", "2026-10-14", RecordKind::Merit, 1),
            record("b", "2026-10-14", RecordKind::Fault, 7),
        ];
        // 12.5 rounds half up
        assert_eq!(fate_index(&one_eighth, day("2026-10-14"), 30), 13);
    }

    #[test]
    fn fate_index_ignores_future_days() {
        let records = vec![
            record("a", "2026-10-15", RecordKind::Fault, 10),
            record("b", "2026-10-14", RecordKind::Merit, 10),
        ];
        assert_eq!(fate_index(&records, day("2026-10-14"), 30), 100);
    }

    #[test]
    fn fate_level_matches_documented_edges() {
        assert_eq!(fate_level(19), 1);
        assert_eq!(fate_level(20), 2);
        assert_eq!(fate_level(59), 3);
        assert_eq!(fate_level(60), 4);
        assert_eq!(fate_level(100), 5);
    }
}

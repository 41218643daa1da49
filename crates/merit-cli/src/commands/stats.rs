use chrono::Datelike;
use merit_core::clock::parse_date;

use crate::cli::StatsView;
use crate::commands::common::{
    format_fate_line, format_month_lines, format_today_lines, format_total_lines,
    format_week_lines, open_store, FateView, StoreOptions,
};
use crate::error::CliError;

pub async fn run_stats(view: StatsView, as_json: bool, options: &StoreOptions) -> Result<(), CliError> {
    let store = open_store(options)?;
    let today = store.today();

    let (json, lines) = match view {
        StatsView::Today => {
            let stats = store.get_today_stats()?;
            (
                serde_json::to_string_pretty(&stats)?,
                format_today_lines(&today, &stats),
            )
        }
        StatsView::Week => {
            let days = store.week_stats()?;
            (serde_json::to_string_pretty(&days)?, format_week_lines(&days))
        }
        StatsView::Month { year, month } => {
            let current = parse_date(&today)
                .ok_or_else(|| CliError::InvalidDate(today.clone()))?;
            let year = year.unwrap_or_else(|| current.year());
            let month = month.unwrap_or_else(|| current.month());
            let stats = store.month_stats(year, month)?;
            (
                serde_json::to_string_pretty(&stats)?,
                format_month_lines(year, month, &stats),
            )
        }
        StatsView::Total => {
            let stats = store.total_stats().await?;
            (serde_json::to_string_pretty(&stats)?, format_total_lines(&stats))
        }
        StatsView::Fate => {
            let view = FateView::new(store.fate_index().await?);
            (
                serde_json::to_string_pretty(&view)?,
                vec![format_fate_line(&view)],
            )
        }
    };

    if as_json {
        println!("{json}");
    } else {
        for line in lines {
            println!("{line}");
        }
    }
    Ok(())
}

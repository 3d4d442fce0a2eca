//! Daily series extraction.
//!
//! Filters the sales table down to one product (within a category) or one
//! category, sums units per date and fills every missing calendar day with
//! zero so the forecasting models always see a regular daily grid.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::{SalesRecord, SelectionMode, SeriesSelection, TimeSeries};

/// Fewer observations than this and the forecast is not attempted.
pub const MIN_OBSERVATIONS: usize = 40;

/// Build the contiguous daily series for `selection`.
///
/// Returns an empty series when no row matches.
pub fn extract_series(records: &[SalesRecord], selection: &SeriesSelection) -> TimeSeries {
    let mut daily: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for record in records.iter().filter(|r| matches_selection(r, selection)) {
        *daily.entry(record.date).or_insert(0.0) += record.units;
    }

    let series = fill_daily(&daily);
    tracing::debug!(
        selection = %selection.legend(),
        observations = series.len(),
        "extracted daily series"
    );
    series
}

fn matches_selection(record: &SalesRecord, selection: &SeriesSelection) -> bool {
    if record.category != selection.category {
        return false;
    }
    match selection.mode {
        SelectionMode::Category => true,
        SelectionMode::Product => selection.product.as_deref() == Some(record.product.as_str()),
    }
}

/// Reindex sparse per-date totals onto every day from the first to the last key.
fn fill_daily(daily: &BTreeMap<NaiveDate, f64>) -> TimeSeries {
    let (Some((&first, _)), Some((&last, _))) = (daily.first_key_value(), daily.last_key_value()) else {
        return TimeSeries::default();
    };

    let values = first
        .iter_days()
        .take_while(|d| *d <= last)
        .map(|d| daily.get(&d).copied().unwrap_or(0.0))
        .collect();

    TimeSeries::new(first, values)
}

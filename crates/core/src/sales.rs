//! Sales aggregation over order snapshots.
//!
//! Orders keep a denormalised copy of what was bought, so the figures here
//! are computed from those snapshots rather than the live catalog.

use std::collections::BTreeMap;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::Serialize;

use crate::Price;

/// The parts of an order that per-day figures need.
#[derive(Debug, Clone, Copy)]
pub struct SaleRecord {
    pub placed_at: DateTime<Utc>,
    pub units: u32,
    pub total: Price,
}

/// Sales totals for one UTC day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySales {
    pub day: NaiveDate,
    pub orders: u64,
    pub units: u64,
    pub revenue: Price,
}

impl DailySales {
    const fn empty(day: NaiveDate) -> Self {
        Self {
            day,
            orders: 0,
            units: 0,
            revenue: Price::ZERO,
        }
    }
}

/// Group orders into per-day totals for the `days` days ending on `last_day`.
///
/// Days are UTC calendar days, returned oldest first. Every day in the window
/// is present, zero-filled when nothing sold. Records outside the window are
/// ignored.
#[must_use]
pub fn daily_sales<I>(records: I, last_day: NaiveDate, days: u32) -> Vec<DailySales>
where
    I: IntoIterator<Item = SaleRecord>,
{
    if days == 0 {
        return Vec::new();
    }
    let Some(first_day) = last_day.checked_sub_days(Days::new(u64::from(days - 1))) else {
        return Vec::new();
    };

    let mut by_day: BTreeMap<NaiveDate, DailySales> = first_day
        .iter_days()
        .take_while(|day| *day <= last_day)
        .map(|day| (day, DailySales::empty(day)))
        .collect();

    for record in records {
        if let Some(entry) = by_day.get_mut(&record.placed_at.date_naive()) {
            entry.orders += 1;
            entry.units += u64::from(record.units);
            entry.revenue = [entry.revenue, record.total].into_iter().sum();
        }
    }

    by_day.into_values().collect()
}

//! Date planning for seasons and rolling windows. Pure functions, no I/O.

use chrono::{Duration, NaiveDate};

use crate::domain::SeasonBounds;

/// Every calendar date from season start to `min(end, today)`, ascending.
///
/// A season that has not started yet yields an empty plan.
pub fn season_dates(season: SeasonBounds, today: NaiveDate) -> Vec<NaiveDate> {
    let end = season.end.min(today);
    if season.start > end {
        return Vec::new();
    }
    season
        .start
        .iter_days()
        .take_while(|d| *d <= end)
        .collect()
}

/// The most recent `window_days` dates ending at `anchor`, most recent first,
/// never earlier than `floor`.
pub fn rolling_window(anchor: NaiveDate, window_days: u32, floor: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(window_days as usize);
    let mut day = anchor;
    while dates.len() < window_days as usize && day >= floor {
        dates.push(day);
        day -= Duration::days(1);
    }
    dates
}

/// Drop every date up to and including `cursor` from an ascending plan.
pub fn after_cursor(dates: Vec<NaiveDate>, cursor: Option<NaiveDate>) -> Vec<NaiveDate> {
    match cursor {
        Some(c) => dates.into_iter().filter(|d| *d > c).collect(),
        None => dates,
    }
}

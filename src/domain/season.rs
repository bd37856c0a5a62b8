use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Result, SyncError};

/// Calendar bounds of one named season (inclusive on both ends)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonBounds {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SeasonBounds {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Named seasons keyed like "2024-25"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonCatalog {
    seasons: BTreeMap<String, SeasonBounds>,
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

impl Default for SeasonCatalog {
    fn default() -> Self {
        let mut seasons = BTreeMap::new();
        seasons.insert(
            "2025-26".to_string(),
            SeasonBounds::new(ymd(2025, 10, 21), ymd(2026, 6, 30)),
        );
        seasons.insert(
            "2024-25".to_string(),
            SeasonBounds::new(ymd(2024, 10, 22), ymd(2025, 6, 17)),
        );
        seasons.insert(
            "2023-24".to_string(),
            SeasonBounds::new(ymd(2023, 10, 24), ymd(2024, 6, 17)),
        );
        Self { seasons }
    }
}

impl SeasonCatalog {
    pub fn empty() -> Self {
        Self {
            seasons: BTreeMap::new(),
        }
    }

    /// Built-in seasons overlaid with configured entries
    pub fn with_overrides(overrides: &BTreeMap<String, SeasonBounds>) -> Result<Self> {
        let mut catalog = Self::default();
        for (key, bounds) in overrides {
            catalog.insert(key.clone(), *bounds)?;
        }
        Ok(catalog)
    }

    pub fn insert(&mut self, key: String, bounds: SeasonBounds) -> Result<()> {
        if bounds.end < bounds.start {
            return Err(SyncError::Validation(format!(
                "season {key} ends ({}) before it starts ({})",
                bounds.end, bounds.start
            )));
        }
        self.seasons.insert(key, bounds);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<SeasonBounds> {
        self.seasons
            .get(key)
            .copied()
            .ok_or_else(|| SyncError::UnknownSeason(key.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SeasonBounds)> {
        self.seasons.iter()
    }

    /// The season that contains `today`, else the latest one that has already
    /// started. Used as the hard floor for rolling windows.
    pub fn current(&self, today: NaiveDate) -> Option<(&str, SeasonBounds)> {
        if let Some((key, bounds)) = self.seasons.iter().find(|(_, b)| b.contains(today)) {
            return Some((key.as_str(), *bounds));
        }
        self.seasons
            .iter()
            .filter(|(_, b)| b.start <= today)
            .max_by_key(|(_, b)| b.start)
            .map(|(k, b)| (k.as_str(), *b))
    }
}

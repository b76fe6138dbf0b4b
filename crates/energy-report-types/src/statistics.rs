// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Granularity at which the store pre-aggregates statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Hour,
    Day,
    Month,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Month => "month",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate requested from the statistics store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregate {
    /// Delta over one bucket
    Change,
    /// Cumulative running total at the end of one bucket
    Sum,
}

impl Aggregate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Change => "change",
            Self::Sum => "sum",
        }
    }
}

/// One bucketed statistics row as returned by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsRow {
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub change: Option<f64>,
    #[serde(default)]
    pub sum: Option<f64>,
}

impl StatisticsRow {
    pub fn with_change(start: DateTime<Utc>, change: f64) -> Self {
        Self {
            start,
            change: Some(change),
            sum: None,
        }
    }

    pub fn with_sum(start: DateTime<Utc>, sum: f64) -> Self {
        Self {
            start,
            change: None,
            sum: Some(sum),
        }
    }
}

/// Descriptive metadata of one statistic
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticMetadata {
    /// Store-internal row id, when the store exposes one
    #[serde(default)]
    pub numeric_id: Option<i64>,
    #[serde(default)]
    pub unit_of_measurement: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl StatisticMetadata {
    /// Unit, or an empty string when unknown
    pub fn unit(&self) -> &str {
        self.unit_of_measurement.as_deref().unwrap_or("")
    }

    /// True when `name` carries something other than the raw identifier
    pub fn has_meaningful_name(&self, statistic_id: &str) -> bool {
        self.name
            .as_deref()
            .map(str::trim)
            .is_some_and(|name| !name.is_empty() && name != statistic_id)
    }
}

/// Raw state change from the recorder history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    pub state: String,
    pub last_changed: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meaningful_name() {
        let mut meta = StatisticMetadata {
            numeric_id: Some(3),
            unit_of_measurement: Some("kWh".to_owned()),
            name: Some("sensor.grid_in".to_owned()),
        };
        assert!(!meta.has_meaningful_name("sensor.grid_in"));

        meta.name = Some("  ".to_owned());
        assert!(!meta.has_meaningful_name("sensor.grid_in"));

        meta.name = Some("Grid import".to_owned());
        assert!(meta.has_meaningful_name("sensor.grid_in"));
        assert_eq!(meta.unit(), "kWh");
    }

    #[test]
    fn test_row_deserializes_without_aggregates() {
        let row: StatisticsRow =
            serde_json::from_str(r#"{"start": "2024-01-01T00:00:00Z"}"#).unwrap();
        assert_eq!(row.change, None);
        assert_eq!(row.sum, None);
    }
}

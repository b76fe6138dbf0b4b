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

use chrono::{DateTime, TimeZone, Utc};
use energy_report_types::{StateChange, StatisticMetadata, StatisticsRow};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HaEntityState {
    pub entity_id: String,
    pub state: String,
    pub attributes: serde_json::Value,
    pub last_changed: String,
    pub last_updated: String,
}

impl HaEntityState {
    pub fn friendly_name(&self) -> Option<&str> {
        self.attributes
            .get("friendly_name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Historical state point from HA history API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HaHistoryState {
    #[serde(default)]
    pub entity_id: Option<String>,
    pub state: String,
    #[serde(default)]
    pub attributes: Option<serde_json::Value>,
    pub last_changed: String,
    #[serde(default)]
    pub last_updated: Option<String>,
}

impl HaHistoryState {
    /// Raw state change, `None` when the timestamp does not parse
    pub fn to_state_change(&self) -> Option<StateChange> {
        DateTime::parse_from_rfc3339(&self.last_changed)
            .ok()
            .map(|changed| StateChange {
                state: self.state.clone(),
                last_changed: changed.with_timezone(&Utc),
            })
    }
}

/// One row of `recorder/statistics_during_period`
#[derive(Debug, Clone, Deserialize)]
pub struct WsStatisticsRow {
    /// Epoch milliseconds on current cores, ISO text on older ones
    pub start: Value,
    #[serde(default)]
    pub change: Option<f64>,
    #[serde(default)]
    pub sum: Option<f64>,
}

impl WsStatisticsRow {
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        match &self.start {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|ms| ms as i64))
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn to_row(&self) -> Option<StatisticsRow> {
        self.start_time().map(|start| StatisticsRow {
            start,
            change: self.change,
            sum: self.sum,
        })
    }
}

/// One entry of `recorder/get_statistics_metadata` or `recorder/list_statistic_ids`
#[derive(Debug, Clone, Deserialize)]
pub struct WsStatisticMetadata {
    pub statistic_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub statistics_unit_of_measurement: Option<String>,
    #[serde(default)]
    pub display_unit_of_measurement: Option<String>,
    #[serde(default)]
    pub unit_of_measurement: Option<String>,
}

impl WsStatisticMetadata {
    pub fn to_metadata(&self) -> StatisticMetadata {
        let unit = self
            .statistics_unit_of_measurement
            .as_ref()
            .or(self.display_unit_of_measurement.as_ref())
            .or(self.unit_of_measurement.as_ref())
            .filter(|unit| !unit.trim().is_empty())
            .cloned();

        StatisticMetadata {
            numeric_id: None,
            unit_of_measurement: unit,
            name: self.name.clone(),
        }
    }
}

/// Answer of `recorder/info`
#[derive(Debug, Clone, Deserialize)]
pub struct RecorderInfo {
    #[serde(default)]
    pub recording: bool,
    #[serde(default)]
    pub thread_running: bool,
    #[serde(default)]
    pub migration_in_progress: bool,
}

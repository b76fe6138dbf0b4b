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

//! Core collaborator traits backed by Home Assistant

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use energy_report_core::{
    EnergyConfigProvider, MetadataConvention, StatisticsQuery, StatisticsStore, StoreError,
};
use energy_report_types::{Aggregate, StateChange, StatisticMetadata, StatisticsRow};
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::client::HomeAssistantClient;
use crate::errors::{HaError, HaResult};
use crate::types::{RecorderInfo, WsStatisticMetadata, WsStatisticsRow};
use crate::websocket::HaWebSocketClient;

/// Error codes meaning "this server does not support the call shape"
const UNSUPPORTED_CODES: [&str; 3] = ["unknown_command", "invalid_format", "not_supported"];

/// Host-side dashboard lookups, tried in order
const DASHBOARD_PROBES: [(&str, &str); 4] = [
    ("energy/get_prefs", "dashboard_id"),
    ("energy/get_prefs", "dashboard"),
    ("energy/get_dashboard", "dashboard_id"),
    ("energy/dashboard/get", "id"),
];

fn rfc3339(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Recorder statistics over the WebSocket API, entity state and history over REST
#[derive(Debug, Clone)]
pub struct HaStatisticsStore {
    rest: HomeAssistantClient,
    ws: Arc<HaWebSocketClient>,
}

impl HaStatisticsStore {
    pub fn new(rest: HomeAssistantClient, ws: Arc<HaWebSocketClient>) -> Self {
        Self { rest, ws }
    }

    async fn metadata_scoped(
        &self,
        statistic_ids: &[String],
    ) -> HaResult<HashMap<String, StatisticMetadata>> {
        let result = self
            .ws
            .command(
                "recorder/get_statistics_metadata",
                json!({ "statistic_ids": statistic_ids }),
            )
            .await?;
        let entries: Vec<WsStatisticMetadata> = serde_json::from_value(result)?;

        Ok(entries
            .iter()
            .map(|entry| (entry.statistic_id.clone(), entry.to_metadata()))
            .collect())
    }

    /// Older servers only list everything; filter locally
    async fn metadata_legacy(
        &self,
        statistic_ids: &[String],
    ) -> HaResult<HashMap<String, StatisticMetadata>> {
        let result = self
            .ws
            .command("recorder/list_statistic_ids", Value::Null)
            .await?;
        let entries: Vec<WsStatisticMetadata> = serde_json::from_value(result)?;
        let wanted: HashSet<&str> = statistic_ids.iter().map(String::as_str).collect();

        Ok(entries
            .iter()
            .filter(|entry| wanted.contains(entry.statistic_id.as_str()))
            .map(|entry| (entry.statistic_id.clone(), entry.to_metadata()))
            .collect())
    }
}

#[async_trait]
impl StatisticsStore for HaStatisticsStore {
    async fn ensure_available(&self) -> Result<(), StoreError> {
        let result = match self.ws.command("recorder/info", Value::Null).await {
            Ok(result) => result,
            Err(e) if e.command_code().is_some_and(|c| UNSUPPORTED_CODES.contains(&c)) => {
                return Err(StoreError::Unavailable(
                    "the recorder integration is not loaded".to_owned(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        let info: RecorderInfo =
            serde_json::from_value(result).map_err(|e| StoreError::InvalidResponse(e.to_string()))?;
        if !info.thread_running {
            return Err(StoreError::Unavailable(
                "the recorder thread is not running".to_owned(),
            ));
        }
        if info.migration_in_progress {
            warn!("Recorder migration in progress, statistics may be incomplete");
        }
        Ok(())
    }

    async fn get_metadata(
        &self,
        statistic_ids: &[String],
        convention: MetadataConvention,
    ) -> Result<HashMap<String, StatisticMetadata>, StoreError> {
        let metadata = match convention {
            MetadataConvention::Scoped => self.metadata_scoped(statistic_ids).await?,
            MetadataConvention::Legacy => self.metadata_legacy(statistic_ids).await?,
        };
        trace!(
            "Metadata for {}/{} statistic(s) ({convention:?})",
            metadata.len(),
            statistic_ids.len()
        );
        Ok(metadata)
    }

    async fn statistics_during_period(
        &self,
        query: &StatisticsQuery,
    ) -> Result<HashMap<String, Vec<StatisticsRow>>, StoreError> {
        let types: Vec<&str> = query.aggregates.iter().map(Aggregate::as_str).collect();
        let result = self
            .ws
            .command(
                "recorder/statistics_during_period",
                json!({
                    "start_time": rfc3339(query.start),
                    "end_time": rfc3339(query.end),
                    "statistic_ids": query.statistic_ids,
                    "period": query.bucket.as_str(),
                    "types": types,
                }),
            )
            .await?;

        let series: HashMap<String, Vec<WsStatisticsRow>> = serde_json::from_value(result)
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;

        let mut rows = HashMap::with_capacity(series.len());
        for (statistic_id, raw_rows) in series {
            let parsed: Vec<StatisticsRow> = raw_rows.iter().filter_map(WsStatisticsRow::to_row).collect();
            if parsed.len() != raw_rows.len() {
                debug!(
                    "Dropped {} row(s) of {} with an unreadable start",
                    raw_rows.len() - parsed.len(),
                    statistic_id
                );
            }
            rows.insert(statistic_id, parsed);
        }
        Ok(rows)
    }

    async fn state_changes_during_period(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        entity_id: &str,
    ) -> Result<Vec<StateChange>, StoreError> {
        match self.rest.get_history(entity_id, start, end).await {
            Err(HaError::EntityNotFound(_)) => Ok(Vec::new()),
            other => Ok(other?),
        }
    }

    async fn friendly_name(&self, entity_id: &str) -> Result<Option<String>, StoreError> {
        match self.rest.get_state(entity_id).await {
            Ok(state) => Ok(state.friendly_name().map(str::to_owned)),
            Err(HaError::EntityNotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &str {
        "Home Assistant recorder"
    }
}

/// Energy dashboard preferences over the WebSocket API
#[derive(Debug, Clone)]
pub struct HaEnergyConfig {
    ws: Arc<HaWebSocketClient>,
}

impl HaEnergyConfig {
    pub fn new(ws: Arc<HaWebSocketClient>) -> Self {
        Self { ws }
    }
}

#[async_trait]
impl EnergyConfigProvider for HaEnergyConfig {
    async fn energy_document(&self) -> Result<Value, StoreError> {
        match self.ws.command("energy/get_prefs", Value::Null).await {
            Ok(document) => Ok(document),
            // Energy dashboard never configured
            Err(e) if e.command_code() == Some("not_found") => Ok(Value::Null),
            Err(e) => Err(e.into()),
        }
    }

    async fn fetch_dashboard(&self, requested: &str) -> Result<Option<Value>, StoreError> {
        for (command, param) in DASHBOARD_PROBES {
            let mut payload = serde_json::Map::new();
            payload.insert(param.to_owned(), Value::String(requested.to_owned()));

            match self.ws.command(command, Value::Object(payload)).await {
                Ok(Value::Null) => {}
                Ok(found) => {
                    debug!("Dashboard '{requested}' answered by {command} ({param})");
                    return Ok(Some(found));
                }
                Err(e) if e.command_code().is_some() => {
                    trace!("{command} ({param}) rejected: {e}");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(None)
    }

    fn name(&self) -> &str {
        "Home Assistant energy"
    }
}

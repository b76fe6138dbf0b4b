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

//! In-memory collaborators shared by the unit tests of this crate

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use energy_report_i18n::Language;
use energy_report_types::{Aggregate, StateChange, StatisticMetadata, StatisticsRow};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::collector::MetadataConvention;
use crate::errors::{ReportError, ReportResult, StoreError};
use crate::report::{Block, ReportDocument, ReportRenderer};
use crate::traits::{AdviceProvider, EnergyConfigProvider, StatisticsQuery, StatisticsStore};

fn row_start(index: usize) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(index as i64)
}

#[derive(Debug, Default)]
pub struct FakeStore {
    change_rows: HashMap<String, Vec<f64>>,
    sum_rows: HashMap<String, Vec<f64>>,
    metadata: HashMap<String, StatisticMetadata>,
    friendly_names: HashMap<String, String>,
    history: HashMap<String, Vec<StateChange>>,
    accepted_convention: Option<MetadataConvention>,
    metadata_failure: Option<String>,
    statistics_failure: Option<String>,
    unavailable: bool,
    calls: AtomicUsize,
    queries: Mutex<Vec<StatisticsQuery>>,
    metadata_calls: Mutex<Vec<MetadataConvention>>,
    history_calls: Mutex<Vec<String>>,
}

impl FakeStore {
    pub fn with_change_rows(mut self, statistic_id: &str, values: &[f64]) -> Self {
        self.change_rows
            .insert(statistic_id.to_owned(), values.to_vec());
        self
    }

    pub fn with_sum_rows(mut self, statistic_id: &str, values: &[f64]) -> Self {
        self.sum_rows.insert(statistic_id.to_owned(), values.to_vec());
        self
    }

    pub fn with_metadata(mut self, statistic_id: &str, unit: &str, name: Option<&str>) -> Self {
        self.metadata.insert(
            statistic_id.to_owned(),
            StatisticMetadata {
                numeric_id: Some(self.metadata.len() as i64 + 1),
                unit_of_measurement: Some(unit.to_owned()),
                name: name.map(str::to_owned),
            },
        );
        self
    }

    pub fn with_friendly_name(mut self, entity_id: &str, name: &str) -> Self {
        self.friendly_names
            .insert(entity_id.to_owned(), name.to_owned());
        self
    }

    pub fn with_history(mut self, entity_id: &str, states: Vec<StateChange>) -> Self {
        self.history.insert(entity_id.to_owned(), states);
        self
    }

    /// Reject the other calling convention with the host's error text
    pub fn accepting_only(mut self, convention: MetadataConvention) -> Self {
        self.accepted_convention = Some(convention);
        self
    }

    pub fn failing_metadata(mut self, message: &str) -> Self {
        self.metadata_failure = Some(message.to_owned());
        self
    }

    pub fn failing_statistics(mut self, message: &str) -> Self {
        self.statistics_failure = Some(message.to_owned());
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<StatisticsQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub fn metadata_calls(&self) -> Vec<MetadataConvention> {
        self.metadata_calls.lock().unwrap().clone()
    }

    pub fn history_calls(&self) -> Vec<String> {
        self.history_calls.lock().unwrap().clone()
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl StatisticsStore for FakeStore {
    async fn ensure_available(&self) -> Result<(), StoreError> {
        self.record_call();
        if self.unavailable {
            return Err(StoreError::Unavailable("recorder is not loaded".to_owned()));
        }
        Ok(())
    }

    async fn get_metadata(
        &self,
        statistic_ids: &[String],
        convention: MetadataConvention,
    ) -> Result<HashMap<String, StatisticMetadata>, StoreError> {
        self.record_call();
        self.metadata_calls.lock().unwrap().push(convention);

        if let Some(message) = &self.metadata_failure {
            return Err(StoreError::Call(message.clone()));
        }

        match (self.accepted_convention, convention) {
            (Some(MetadataConvention::Legacy), MetadataConvention::Scoped) => {
                return Err(StoreError::Call(
                    "get_metadata() got an unexpected keyword argument 'statistic_ids'".to_owned(),
                ));
            }
            (Some(MetadataConvention::Scoped), MetadataConvention::Legacy) => {
                return Err(StoreError::Call(
                    "get_metadata() missing 1 required positional argument: 'hass'".to_owned(),
                ));
            }
            _ => {}
        }

        Ok(statistic_ids
            .iter()
            .filter_map(|id| self.metadata.get(id).map(|meta| (id.clone(), meta.clone())))
            .collect())
    }

    async fn statistics_during_period(
        &self,
        query: &StatisticsQuery,
    ) -> Result<HashMap<String, Vec<StatisticsRow>>, StoreError> {
        self.record_call();
        self.queries.lock().unwrap().push(query.clone());

        if let Some(message) = &self.statistics_failure {
            return Err(StoreError::Call(message.clone()));
        }

        let wants_change = query.aggregates.contains(&Aggregate::Change);
        let wants_sum = query.aggregates.contains(&Aggregate::Sum);
        let mut result = HashMap::new();

        for statistic_id in &query.statistic_ids {
            let changes = self.change_rows.get(statistic_id).filter(|_| wants_change);
            let sums = self.sum_rows.get(statistic_id).filter(|_| wants_sum);
            let len = changes
                .map_or(0, Vec::len)
                .max(sums.map_or(0, Vec::len));
            if len == 0 {
                continue;
            }

            let rows = (0..len)
                .map(|i| StatisticsRow {
                    start: row_start(i),
                    change: changes.and_then(|v| v.get(i).copied()),
                    sum: sums.and_then(|v| v.get(i).copied()),
                })
                .collect();
            result.insert(statistic_id.clone(), rows);
        }

        Ok(result)
    }

    async fn state_changes_during_period(
        &self,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
        entity_id: &str,
    ) -> Result<Vec<StateChange>, StoreError> {
        self.record_call();
        self.history_calls.lock().unwrap().push(entity_id.to_owned());
        Ok(self.history.get(entity_id).cloned().unwrap_or_default())
    }

    async fn friendly_name(&self, entity_id: &str) -> Result<Option<String>, StoreError> {
        self.record_call();
        Ok(self.friendly_names.get(entity_id).cloned())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

#[derive(Debug, Default)]
pub struct FakeEnergyConfig {
    pub document: Value,
    pub fetched: HashMap<String, Value>,
}

impl FakeEnergyConfig {
    pub fn new(document: Value) -> Self {
        Self {
            document,
            fetched: HashMap::new(),
        }
    }
}

#[async_trait]
impl EnergyConfigProvider for FakeEnergyConfig {
    async fn energy_document(&self) -> Result<Value, StoreError> {
        Ok(self.document.clone())
    }

    async fn fetch_dashboard(&self, requested: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.fetched.get(requested).cloned())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Advisor echoing its input so tests can see what was sent
#[derive(Debug, Default)]
pub struct EchoAdvisor {
    pub calls: Mutex<Vec<(String, Language)>>,
}

#[async_trait]
impl AdviceProvider for EchoAdvisor {
    async fn advise(&self, conclusion: &str, language: Language) -> String {
        self.calls
            .lock()
            .unwrap()
            .push((conclusion.to_owned(), language));
        format!("advice for: {conclusion}")
    }
}

/// Renderer writing a plain-text dump of the document
#[derive(Debug, Default, Clone)]
pub struct TextRenderer {
    pub fail_with: Option<String>,
    pub extension: Option<&'static str>,
}

impl ReportRenderer for TextRenderer {
    fn render(&self, document: &ReportDocument, path: &Path) -> ReportResult<()> {
        if let Some(message) = &self.fail_with {
            return Err(ReportError::Render(message.clone()));
        }

        let mut out = String::new();
        out.push_str(&document.title);
        out.push('\n');
        for section in &document.sections {
            out.push_str(&section.title);
            out.push('\n');
            for block in &section.blocks {
                match block {
                    Block::Paragraph { text, .. } => out.push_str(text),
                    Block::Table(table) => {
                        let rows: Vec<String> = table.rows.iter().map(|r| r.join(" | ")).collect();
                        out.push_str(&rows.join("\n"));
                    }
                    Block::Chart { title, points } => {
                        out.push_str(&format!("{title}: {} bar(s)", points.len()));
                    }
                }
                out.push('\n');
            }
        }
        out.push_str(&document.footer);
        std::fs::write(path, out)?;
        Ok(())
    }

    fn extension(&self) -> &str {
        self.extension.unwrap_or("pdf")
    }
}

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
use energy_report_types::{Aggregate, Bucket, StatisticMetadata, StatisticsRow};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::{debug, warn};

use crate::errors::{ReportError, ReportResult, StoreError};
use crate::traits::{StatisticsQuery, StatisticsStore};

/// Calling convention of the store's metadata lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataConvention {
    /// Lookup scoped by a context handle (current hosts)
    Scoped,
    /// Bare identifier lookup (older hosts)
    Legacy,
}

impl MetadataConvention {
    pub fn other(self) -> Self {
        match self {
            Self::Scoped => Self::Legacy,
            Self::Legacy => Self::Scoped,
        }
    }

    fn to_raw(self) -> u8 {
        match self {
            Self::Scoped => 1,
            Self::Legacy => 2,
        }
    }

    fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(Self::Scoped),
            2 => Some(Self::Legacy),
            _ => None,
        }
    }
}

const UNKNOWN: u8 = 0;

/// Process-wide cache of the detected metadata calling convention.
///
/// Transitions: unknown -> detected, detected -> other on an observed
/// signature mismatch. Racing writers are harmless: the loser retries once.
#[derive(Debug)]
pub struct ConventionCell(AtomicU8);

impl ConventionCell {
    pub const fn new() -> Self {
        Self(AtomicU8::new(UNKNOWN))
    }

    pub fn get(&self) -> Option<MetadataConvention> {
        MetadataConvention::from_raw(self.0.load(Ordering::Acquire))
    }

    /// Current convention, seeding the cell with `hint` when unknown
    pub fn resolve(&self, hint: MetadataConvention) -> MetadataConvention {
        match self
            .0
            .compare_exchange(UNKNOWN, hint.to_raw(), Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => hint,
            Err(current) => MetadataConvention::from_raw(current).unwrap_or(hint),
        }
    }

    /// Replace `observed` by the other convention unless someone already did
    pub fn flip(&self, observed: MetadataConvention) -> MetadataConvention {
        let next = observed.other();
        match self.0.compare_exchange(
            observed.to_raw(),
            next.to_raw(),
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => next,
            Err(current) => MetadataConvention::from_raw(current).unwrap_or(next),
        }
    }
}

impl Default for ConventionCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared by every report generated in this process
pub static METADATA_CONVENTION: ConventionCell = ConventionCell::new();

const LEGACY_SIGNATURE_MARKERS: [&str; 4] = [
    "multiple values",
    "positional argument",
    "unexpected keyword",
    "unknown command",
];

const REQUIRES_CONTEXT_MARKERS: [&str; 4] = [
    "missing 1 required positional argument",
    "unhashable type",
    "homeassistant",
    "unknown command",
];

/// Error text says the scoped lookup is not supported
pub fn indicates_legacy_signature(message: &str) -> bool {
    let lowered = message.to_lowercase();
    LEGACY_SIGNATURE_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

/// Error text says the lookup needs its context handle
pub fn indicates_requires_context(message: &str) -> bool {
    let lowered = message.to_lowercase();
    REQUIRES_CONTEXT_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

/// Rows and metadata for one statistics collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectedStatistics {
    pub rows: HashMap<String, Vec<StatisticsRow>>,
    pub metadata: HashMap<String, StatisticMetadata>,
}

pub struct StatisticsCollector<'a> {
    store: &'a dyn StatisticsStore,
    convention: &'a ConventionCell,
}

impl std::fmt::Debug for StatisticsCollector<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatisticsCollector")
            .field("store", &self.store.name())
            .field("convention", &self.convention.get())
            .finish()
    }
}

impl<'a> StatisticsCollector<'a> {
    pub fn new(store: &'a dyn StatisticsStore, convention: &'a ConventionCell) -> Self {
        Self { store, convention }
    }

    /// Bucketed `change` rows plus metadata for `statistic_ids`
    pub async fn collect(
        &self,
        statistic_ids: &BTreeSet<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        bucket: Bucket,
    ) -> ReportResult<CollectedStatistics> {
        if statistic_ids.is_empty() {
            return Ok(CollectedStatistics::default());
        }

        self.store.ensure_available().await.map_err(|e| match e {
            StoreError::Unavailable(msg) => ReportError::RecorderUnavailable(msg),
            other => ReportError::Store(other),
        })?;

        let ids: Vec<String> = statistic_ids.iter().cloned().collect();
        let mut metadata = self.fetch_metadata(&ids).await?;
        self.enrich_names(&ids, &mut metadata).await;

        let query = StatisticsQuery {
            start,
            end,
            statistic_ids: ids,
            bucket,
            aggregates: vec![Aggregate::Change],
        };
        let rows = self.store.statistics_during_period(&query).await?;

        debug!(
            "Collected {} statistic series ({} with metadata) from {}",
            rows.len(),
            metadata.len(),
            self.store.name()
        );

        Ok(CollectedStatistics { rows, metadata })
    }

    /// Metadata lookup with one self-healing retry on a signature mismatch
    pub async fn fetch_metadata(
        &self,
        statistic_ids: &[String],
    ) -> ReportResult<HashMap<String, StatisticMetadata>> {
        let convention = self
            .convention
            .resolve(self.store.metadata_convention_hint());

        match self.store.get_metadata(statistic_ids, convention).await {
            Ok(metadata) => Ok(metadata),
            Err(e) => {
                let message = e.message();
                let mismatch = match convention {
                    MetadataConvention::Scoped => indicates_legacy_signature(message),
                    MetadataConvention::Legacy => indicates_requires_context(message),
                };
                if !mismatch {
                    return Err(e.into());
                }

                let retry = self.convention.flip(convention);
                debug!(
                    "Metadata lookup rejected the {convention:?} convention ({message}), retrying with {retry:?}"
                );
                Ok(self.store.get_metadata(statistic_ids, retry).await?)
            }
        }
    }

    /// Backfill names that are missing or equal to the raw identifier
    async fn enrich_names(
        &self,
        statistic_ids: &[String],
        metadata: &mut HashMap<String, StatisticMetadata>,
    ) {
        for statistic_id in statistic_ids {
            let entry = metadata.entry(statistic_id.clone()).or_default();
            if entry.has_meaningful_name(statistic_id) {
                continue;
            }

            match self.store.friendly_name(statistic_id).await {
                Ok(Some(name)) if !name.trim().is_empty() => entry.name = Some(name),
                Ok(_) => {}
                Err(e) => warn!("Could not resolve a friendly name for {statistic_id}: {e}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeStore;
    use chrono::TimeZone;

    fn ids(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| (*v).to_owned()).collect()
    }

    fn window() -> (DateTime<Utc>, DateTime<Utc>) {
        (
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_marker_tables() {
        assert!(indicates_legacy_signature(
            "get_metadata() got an unexpected keyword argument 'statistic_ids'"
        ));
        assert!(indicates_legacy_signature("Unknown command."));
        assert!(indicates_requires_context(
            "get_metadata() missing 1 required positional argument: 'hass'"
        ));
        assert!(!indicates_legacy_signature("database is locked"));
        assert!(!indicates_requires_context("database is locked"));
    }

    #[test]
    fn test_convention_cell_transitions() {
        let cell = ConventionCell::new();
        assert_eq!(cell.get(), None);
        assert_eq!(cell.resolve(MetadataConvention::Scoped), MetadataConvention::Scoped);
        // Later hints do not override a detected convention
        assert_eq!(cell.resolve(MetadataConvention::Legacy), MetadataConvention::Scoped);

        assert_eq!(cell.flip(MetadataConvention::Scoped), MetadataConvention::Legacy);
        // A stale observer does not flip back
        assert_eq!(cell.flip(MetadataConvention::Scoped), MetadataConvention::Legacy);
        assert_eq!(cell.get(), Some(MetadataConvention::Legacy));
    }

    #[tokio::test]
    async fn test_empty_identifier_set_issues_no_query() {
        let store = FakeStore::default();
        let cell = ConventionCell::new();
        let (start, end) = window();

        let collected = StatisticsCollector::new(&store, &cell)
            .collect(&BTreeSet::new(), start, end, Bucket::Day)
            .await
            .unwrap();

        assert_eq!(collected, CollectedStatistics::default());
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn test_requests_change_aggregate_only() {
        let store = FakeStore::default().with_change_rows("sensor.grid_in", &[1.0, 2.0]);
        let cell = ConventionCell::new();
        let (start, end) = window();

        let collected = StatisticsCollector::new(&store, &cell)
            .collect(&ids(&["sensor.grid_in"]), start, end, Bucket::Day)
            .await
            .unwrap();

        assert_eq!(collected.rows["sensor.grid_in"].len(), 2);
        let queries = store.queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].aggregates, vec![Aggregate::Change]);
        assert_eq!(queries[0].end, end);
    }

    #[tokio::test]
    async fn test_metadata_self_heals_once_to_legacy() {
        let store = FakeStore::default()
            .with_metadata("sensor.grid_in", "kWh", Some("Grid import"))
            .accepting_only(MetadataConvention::Legacy);
        let cell = ConventionCell::new();

        let collector = StatisticsCollector::new(&store, &cell);
        let metadata = collector
            .fetch_metadata(&["sensor.grid_in".to_owned()])
            .await
            .unwrap();

        assert_eq!(metadata["sensor.grid_in"].unit(), "kWh");
        assert_eq!(
            store.metadata_calls(),
            vec![MetadataConvention::Scoped, MetadataConvention::Legacy]
        );
        assert_eq!(cell.get(), Some(MetadataConvention::Legacy));

        // The detected convention is reused without another failure
        collector
            .fetch_metadata(&["sensor.grid_in".to_owned()])
            .await
            .unwrap();
        assert_eq!(store.metadata_calls().len(), 3);
    }

    #[tokio::test]
    async fn test_metadata_self_heals_once_to_scoped() {
        let store = FakeStore::default()
            .with_metadata("sensor.grid_in", "kWh", None)
            .accepting_only(MetadataConvention::Scoped);
        let cell = ConventionCell::new();
        cell.resolve(MetadataConvention::Legacy);

        let collector = StatisticsCollector::new(&store, &cell);
        let metadata = collector
            .fetch_metadata(&["sensor.grid_in".to_owned()])
            .await
            .unwrap();

        assert_eq!(metadata["sensor.grid_in"].unit(), "kWh");
        assert_eq!(
            store.metadata_calls(),
            vec![MetadataConvention::Legacy, MetadataConvention::Scoped]
        );
        assert_eq!(cell.get(), Some(MetadataConvention::Scoped));

        collector
            .fetch_metadata(&["sensor.grid_in".to_owned()])
            .await
            .unwrap();
        assert_eq!(
            store.metadata_calls(),
            vec![
                MetadataConvention::Legacy,
                MetadataConvention::Scoped,
                MetadataConvention::Scoped,
            ]
        );
    }

    #[tokio::test]
    async fn test_metadata_failed_retry_is_fatal() {
        let store = FakeStore::default()
            .failing_metadata("get_metadata() got an unexpected keyword argument 'statistic_ids'");
        let cell = ConventionCell::new();

        let err = StatisticsCollector::new(&store, &cell)
            .fetch_metadata(&["sensor.grid_in".to_owned()])
            .await
            .unwrap_err();

        assert!(matches!(err, ReportError::Store(_)));
        assert_eq!(
            store.metadata_calls(),
            vec![MetadataConvention::Scoped, MetadataConvention::Legacy]
        );
        // Flipped once, never flipped back by the second failure
        assert_eq!(cell.get(), Some(MetadataConvention::Legacy));
    }

    #[tokio::test]
    async fn test_metadata_unrelated_error_is_fatal() {
        let store = FakeStore::default().failing_metadata("database is locked");
        let cell = ConventionCell::new();

        let err = StatisticsCollector::new(&store, &cell)
            .fetch_metadata(&["sensor.grid_in".to_owned()])
            .await
            .unwrap_err();

        assert!(matches!(err, ReportError::Store(_)));
        assert_eq!(store.metadata_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_recorder_unavailable() {
        let store = FakeStore::default().unavailable();
        let cell = ConventionCell::new();
        let (start, end) = window();

        let err = StatisticsCollector::new(&store, &cell)
            .collect(&ids(&["sensor.grid_in"]), start, end, Bucket::Day)
            .await
            .unwrap_err();

        assert!(matches!(err, ReportError::RecorderUnavailable(_)));
    }

    #[tokio::test]
    async fn test_names_are_enriched_from_live_state() {
        let store = FakeStore::default()
            .with_metadata("sensor.grid_in", "kWh", Some("sensor.grid_in"))
            .with_metadata("sensor.pv", "kWh", Some("Solar"))
            .with_friendly_name("sensor.grid_in", "Grid meter")
            .with_friendly_name("sensor.pv", "Ignored");
        let cell = ConventionCell::new();
        let (start, end) = window();

        let collected = StatisticsCollector::new(&store, &cell)
            .collect(&ids(&["sensor.grid_in", "sensor.pv"]), start, end, Bucket::Day)
            .await
            .unwrap();

        assert_eq!(
            collected.metadata["sensor.grid_in"].name.as_deref(),
            Some("Grid meter")
        );
        assert_eq!(collected.metadata["sensor.pv"].name.as_deref(), Some("Solar"));
    }
}

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

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use energy_report_types::{
    Aggregate, AuxiliarySensor, Bucket, MetricDefinition, StateChange, StatisticsRow,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

use crate::traits::{StatisticsQuery, StatisticsStore};

/// Sum one aggregate over bucket rows; `None` when no row carries it
pub fn sum_aggregate(rows: &[StatisticsRow], aggregate: Aggregate) -> Option<f64> {
    rows.iter()
        .filter_map(|row| match aggregate {
            Aggregate::Change => row.change,
            Aggregate::Sum => row.sum,
        })
        .fold(None, |acc, value| Some(acc.unwrap_or(0.0) + value))
}

/// One signed total per metric, `0.0` when no row carries a change
pub fn aggregate_totals(
    metrics: &[MetricDefinition],
    rows: &HashMap<String, Vec<StatisticsRow>>,
) -> HashMap<String, f64> {
    metrics
        .iter()
        .map(|metric| {
            let total = rows
                .get(&metric.statistic_id)
                .and_then(|rows| sum_aggregate(rows, Aggregate::Change))
                .unwrap_or(0.0);
            (metric.statistic_id.clone(), total)
        })
        .collect()
}

/// Sum of the latest numeric state of each local calendar day.
///
/// Ties on `last_changed` keep the state seen last. Non-numeric states
/// (`unknown`, `unavailable`, ...) are skipped. `None` when no state parses.
pub fn daily_snapshot_total(states: &[StateChange], timezone: Tz) -> Option<f64> {
    let mut snapshots: BTreeMap<NaiveDate, (DateTime<Utc>, f64)> = BTreeMap::new();

    for state in states {
        let Ok(value) = state.state.trim().parse::<f64>() else {
            continue;
        };
        if !value.is_finite() {
            continue;
        }

        let day = state.last_changed.with_timezone(&timezone).date_naive();
        match snapshots.get(&day) {
            Some((seen, _)) if state.last_changed < *seen => {}
            Some(_) | None => {
                snapshots.insert(day, (state.last_changed, value));
            }
        }
    }

    if snapshots.is_empty() {
        None
    } else {
        Some(snapshots.values().map(|(_, value)| value).sum())
    }
}

/// How auxiliary (CO₂ / price) totals are accumulated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuxiliaryStrategy {
    /// Daily `change` rows summed over the period
    #[default]
    Change,
    /// Daily `sum` rows summed over the period, falling back to one raw
    /// state snapshot per day when the store has no `sum` for a sensor
    SumWithHistoryFallback,
}

/// Totals keyed by translation key; every sensor defaults to `0.0`.
///
/// Failures never abort the report: they are logged and the affected
/// sensors keep their zero total.
pub async fn collect_auxiliary<S: AuxiliarySensor + Sync>(
    store: &dyn StatisticsStore,
    sensors: &[S],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    timezone: Tz,
    strategy: AuxiliaryStrategy,
) -> HashMap<&'static str, f64> {
    let mut results: HashMap<&'static str, f64> = sensors
        .iter()
        .map(|sensor| (sensor.translation_key(), 0.0))
        .collect();

    if sensors.is_empty() {
        return results;
    }

    let aggregate = match strategy {
        AuxiliaryStrategy::Change => Aggregate::Change,
        AuxiliaryStrategy::SumWithHistoryFallback => Aggregate::Sum,
    };

    let mut statistic_ids: Vec<String> = sensors.iter().map(|s| s.entity_id().to_owned()).collect();
    statistic_ids.sort_unstable();
    statistic_ids.dedup();

    let query = StatisticsQuery {
        start,
        end,
        statistic_ids,
        bucket: Bucket::Day,
        aggregates: vec![aggregate],
    };

    let rows = match store.statistics_during_period(&query).await {
        Ok(rows) => rows,
        Err(e) => {
            warn!("Auxiliary statistics unavailable, totals stay at zero: {e}");
            HashMap::new()
        }
    };

    for sensor in sensors {
        let aggregated = rows
            .get(sensor.entity_id())
            .and_then(|rows| sum_aggregate(rows, aggregate));

        let total = match (aggregated, strategy) {
            (Some(total), _) => Some(total),
            (None, AuxiliaryStrategy::Change) => {
                debug!("No change rows for {}", sensor.entity_id());
                None
            }
            (None, AuxiliaryStrategy::SumWithHistoryFallback) => {
                history_fallback(store, sensor.entity_id(), start, end, timezone).await
            }
        };

        if let Some(total) = total {
            results.insert(sensor.translation_key(), total);
        }
    }

    results
}

async fn history_fallback(
    store: &dyn StatisticsStore,
    entity_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    timezone: Tz,
) -> Option<f64> {
    match store.state_changes_during_period(start, end, entity_id).await {
        Ok(states) => {
            let total = daily_snapshot_total(&states, timezone);
            debug!(
                "History fallback for {entity_id}: {} state(s), total {total:?}",
                states.len()
            );
            total
        }
        Err(e) => {
            warn!("History fallback failed for {entity_id}: {e}");
            None
        }
    }
}

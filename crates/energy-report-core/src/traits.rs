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

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use energy_report_i18n::Language;
use energy_report_types::{Aggregate, Bucket, StateChange, StatisticMetadata, StatisticsRow};
use serde_json::Value;
use std::collections::HashMap;

use crate::collector::MetadataConvention;
use crate::errors::StoreError;

/// One bucketed statistics query
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsQuery {
    pub start: DateTime<Utc>,
    /// Exclusive upper bound
    pub end: DateTime<Utc>,
    pub statistic_ids: Vec<String>,
    pub bucket: Bucket,
    pub aggregates: Vec<Aggregate>,
}

// ============= Collaborator Traits =============

/// Read access to the long-term statistics store (the recorder)
#[async_trait]
pub trait StatisticsStore: Send + Sync {
    /// Fails with `StoreError::Unavailable` when the recorder is not running
    async fn ensure_available(&self) -> Result<(), StoreError>;

    /// Fetch descriptive metadata using the given calling convention
    async fn get_metadata(
        &self,
        statistic_ids: &[String],
        convention: MetadataConvention,
    ) -> Result<HashMap<String, StatisticMetadata>, StoreError>;

    /// Calling convention to try first when nothing has been observed yet
    fn metadata_convention_hint(&self) -> MetadataConvention {
        MetadataConvention::Scoped
    }

    async fn statistics_during_period(
        &self,
        query: &StatisticsQuery,
    ) -> Result<HashMap<String, Vec<StatisticsRow>>, StoreError>;

    /// Raw state changes of one entity, oldest first
    async fn state_changes_during_period(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        entity_id: &str,
    ) -> Result<Vec<StateChange>, StoreError>;

    /// Friendly name from the live entity state, if the entity exists
    async fn friendly_name(&self, _entity_id: &str) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    /// Get the store name (for logging)
    fn name(&self) -> &str;
}

/// Access to the host's energy dashboard configuration
#[async_trait]
pub trait EnergyConfigProvider: Send + Sync {
    /// Whole energy configuration document as reported by the host.
    ///
    /// The shape is not fixed: it may be a single preferences blob or any
    /// nesting of dashboards around several of them.
    async fn energy_document(&self) -> Result<Value, StoreError>;

    /// Host-side lookup of one dashboard by identifier or name
    async fn fetch_dashboard(&self, _requested: &str) -> Result<Option<Value>, StoreError> {
        Ok(None)
    }

    fn name(&self) -> &str;
}

/// Natural-language advice generator.
///
/// Implementations never fail: any error is logged and replaced by a fixed
/// fallback text.
#[async_trait]
pub trait AdviceProvider: Send + Sync {
    async fn advise(&self, conclusion: &str, language: Language) -> String;
}

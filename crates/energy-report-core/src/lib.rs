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

pub mod aggregation;
pub mod balance;
pub mod collector;
pub mod dashboard;
pub mod errors;
pub mod filename;
pub mod generator;
pub mod period;
pub mod preferences;
pub mod report;
pub mod sensors;
pub mod traits;

#[cfg(test)]
mod testing;

pub use aggregation::{AuxiliaryStrategy, aggregate_totals, collect_auxiliary, daily_snapshot_total};
pub use balance::reconcile;
pub use collector::{
    CollectedStatistics, ConventionCell, METADATA_CONVENTION, MetadataConvention,
    StatisticsCollector, indicates_legacy_signature, indicates_requires_context,
};
pub use dashboard::{DashboardSelection, discover_dashboards, select_dashboard};
pub use errors::{ReportError, ReportResult, StoreError};
pub use filename::{DEFAULT_FILENAME_PATTERN, FilenameContext, resolve_filename};
pub use generator::{GeneratedReport, GeneratorSettings, ReportGenerator, ReportRequest};
pub use period::{resolve_period, select_bucket};
pub use preferences::{EnergyPreferences, build_cost_mapping, build_metrics};
pub use report::{
    Block, ChartPoint, CoverPage, ReportContent, ReportDocument, ReportRenderer, Section,
    TableSpec, build_document, format_number, notification_message,
};
pub use sensors::{
    Co2Options, PriceOptions, build_co2_sensor_definitions, build_price_sensor_definitions,
};
pub use traits::{AdviceProvider, EnergyConfigProvider, StatisticsQuery, StatisticsStore};

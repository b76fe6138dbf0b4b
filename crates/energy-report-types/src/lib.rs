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

pub mod category;
pub mod period;
pub mod sensors;
pub mod statistics;
pub mod summary;

// Re-export common types for convenience
pub use category::{BalanceSlot, Category, MetricDefinition};
pub use period::{PeriodKind, ResolvedPeriod, UnknownPeriodKind};
pub use sensors::{
    AuxiliarySensor, Co2Polarity, Co2SensorDefinition, PricePolarity, PriceSensorDefinition,
};
pub use statistics::{Aggregate, Bucket, StateChange, StatisticMetadata, StatisticsRow};
pub use summary::ConclusionSummary;

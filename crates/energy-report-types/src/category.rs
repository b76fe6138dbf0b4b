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

use serde::{Deserialize, Serialize};

/// Human-facing category a tracked statistic is filed under.
///
/// The set is closed: every statistic discovered in the energy preferences
/// maps to exactly one of these. Localized labels are looked up through
/// [`Category::translation_key`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    GridImport,
    GridCost,
    GridExport,
    GridCompensation,
    SolarProduction,
    BatteryDischarge,
    BatteryCharge,
    GasConsumption,
    GasCost,
    WaterConsumption,
    WaterCost,
    DeviceConsumption,
    Co2Emissions,
}

/// Slot of the energy balance a category feeds into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceSlot {
    Production,
    Imported,
    Exported,
    Consumption,
    Charge,
    Discharge,
}

impl Category {
    /// Fluent message id of the localized label
    pub fn translation_key(&self) -> &'static str {
        match self {
            Self::GridImport => "category-grid-import",
            Self::GridCost => "category-grid-cost",
            Self::GridExport => "category-grid-export",
            Self::GridCompensation => "category-grid-compensation",
            Self::SolarProduction => "category-solar-production",
            Self::BatteryDischarge => "category-battery-discharge",
            Self::BatteryCharge => "category-battery-charge",
            Self::GasConsumption => "category-gas-consumption",
            Self::GasCost => "category-gas-cost",
            Self::WaterConsumption => "category-water-consumption",
            Self::WaterCost => "category-water-cost",
            Self::DeviceConsumption => "category-device-consumption",
            Self::Co2Emissions => "category-co2-emissions",
        }
    }

    /// Balance slot this category participates in, if any.
    ///
    /// Gas, water, costs and CO₂ stay outside the electrical balance.
    pub fn balance_slot(&self) -> Option<BalanceSlot> {
        match self {
            Self::SolarProduction => Some(BalanceSlot::Production),
            Self::GridImport => Some(BalanceSlot::Imported),
            Self::GridExport => Some(BalanceSlot::Exported),
            Self::DeviceConsumption => Some(BalanceSlot::Consumption),
            Self::BatteryCharge => Some(BalanceSlot::Charge),
            Self::BatteryDischarge => Some(BalanceSlot::Discharge),
            Self::GridCost
            | Self::GridCompensation
            | Self::GasConsumption
            | Self::GasCost
            | Self::WaterConsumption
            | Self::WaterCost
            | Self::Co2Emissions => None,
        }
    }

    /// Whether the statistic is monetary rather than physical
    pub fn is_monetary(&self) -> bool {
        matches!(
            self,
            Self::GridCost | Self::GridCompensation | Self::GasCost | Self::WaterCost
        )
    }

    /// Whether the category belongs to a battery
    pub fn is_battery(&self) -> bool {
        matches!(self, Self::BatteryCharge | Self::BatteryDischarge)
    }

    /// List all categories
    pub fn all() -> &'static [Category] {
        &[
            Self::GridImport,
            Self::GridCost,
            Self::GridExport,
            Self::GridCompensation,
            Self::SolarProduction,
            Self::BatteryDischarge,
            Self::BatteryCharge,
            Self::GasConsumption,
            Self::GasCost,
            Self::WaterConsumption,
            Self::WaterCost,
            Self::DeviceConsumption,
            Self::Co2Emissions,
        ]
    }
}

/// A tracked time series tagged with its category.
///
/// One instance exists per distinct `statistic_id` in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricDefinition {
    pub category: Category,
    pub statistic_id: String,
}

impl MetricDefinition {
    pub fn new(category: Category, statistic_id: impl Into<String>) -> Self {
        Self {
            category,
            statistic_id: statistic_id.into(),
        }
    }
}

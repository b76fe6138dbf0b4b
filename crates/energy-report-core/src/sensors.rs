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

use energy_report_types::{
    Co2Polarity, Co2SensorDefinition, PricePolarity, PriceSensorDefinition,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CO2_ELECTRICITY_SENSOR: &str = "sensor.energy_co2_electricity";
pub const DEFAULT_CO2_GAS_SENSOR: &str = "sensor.energy_co2_gas";
pub const DEFAULT_CO2_WATER_SENSOR: &str = "sensor.energy_co2_water";
pub const DEFAULT_CO2_SAVINGS_SENSOR: &str = "sensor.energy_co2_savings";

pub const DEFAULT_PRICE_ELECTRICITY_IMPORT_SENSOR: &str = "sensor.energy_price_electricity_import";
pub const DEFAULT_PRICE_ELECTRICITY_EXPORT_SENSOR: &str = "sensor.energy_price_electricity_export";
pub const DEFAULT_PRICE_GAS_SENSOR: &str = "sensor.energy_price_gas";
pub const DEFAULT_PRICE_WATER_SENSOR: &str = "sensor.energy_price_water";

/// CO₂ sensor toggle and per-sensor overrides
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Co2Options {
    pub enabled: bool,
    pub electricity: Option<String>,
    pub gas: Option<String>,
    pub water: Option<String>,
    pub savings: Option<String>,
}

impl Default for Co2Options {
    fn default() -> Self {
        Self {
            enabled: true,
            electricity: None,
            gas: None,
            water: None,
            savings: None,
        }
    }
}

/// Price sensor toggle and per-sensor overrides
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceOptions {
    pub enabled: bool,
    pub electricity_import: Option<String>,
    pub electricity_export: Option<String>,
    pub gas: Option<String>,
    pub water: Option<String>,
}

impl Default for PriceOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            electricity_import: None,
            electricity_export: None,
            gas: None,
            water: None,
        }
    }
}

/// Trimmed override, or the default when missing or blank
fn pick(value: Option<&str>, default: &str) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_owned(),
        _ => default.to_owned(),
    }
}

pub fn build_co2_sensor_definitions(options: &Co2Options) -> Vec<Co2SensorDefinition> {
    if !options.enabled {
        return Vec::new();
    }

    let sensor = |value: &Option<String>, default: &str, key: &'static str, polarity| {
        Co2SensorDefinition {
            entity_id: pick(value.as_deref(), default),
            translation_key: key,
            polarity,
        }
    };

    vec![
        sensor(
            &options.electricity,
            DEFAULT_CO2_ELECTRICITY_SENSOR,
            "co2-electricity",
            Co2Polarity::Emission,
        ),
        sensor(&options.gas, DEFAULT_CO2_GAS_SENSOR, "co2-gas", Co2Polarity::Emission),
        sensor(&options.water, DEFAULT_CO2_WATER_SENSOR, "co2-water", Co2Polarity::Emission),
        sensor(
            &options.savings,
            DEFAULT_CO2_SAVINGS_SENSOR,
            "co2-savings",
            Co2Polarity::Saving,
        ),
    ]
}

pub fn build_price_sensor_definitions(options: &PriceOptions) -> Vec<PriceSensorDefinition> {
    if !options.enabled {
        return Vec::new();
    }

    let sensor = |value: &Option<String>, default: &str, key: &'static str, polarity| {
        PriceSensorDefinition {
            entity_id: pick(value.as_deref(), default),
            translation_key: key,
            polarity,
        }
    };

    vec![
        sensor(
            &options.electricity_import,
            DEFAULT_PRICE_ELECTRICITY_IMPORT_SENSOR,
            "price-electricity-import",
            PricePolarity::Expense,
        ),
        sensor(
            &options.electricity_export,
            DEFAULT_PRICE_ELECTRICITY_EXPORT_SENSOR,
            "price-electricity-export",
            PricePolarity::Credit,
        ),
        sensor(&options.gas, DEFAULT_PRICE_GAS_SENSOR, "price-gas", PricePolarity::Expense),
        sensor(
            &options.water,
            DEFAULT_PRICE_WATER_SENSOR,
            "price-water",
            PricePolarity::Expense,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_enabled() {
        let sensors = build_co2_sensor_definitions(&Co2Options::default());
        let keys: Vec<_> = sensors.iter().map(|s| s.translation_key).collect();

        assert_eq!(keys, ["co2-electricity", "co2-gas", "co2-water", "co2-savings"]);
        assert_eq!(sensors[0].entity_id, DEFAULT_CO2_ELECTRICITY_SENSOR);
        assert_eq!(sensors[3].polarity, Co2Polarity::Saving);
    }

    #[test]
    fn test_overrides_are_trimmed_and_blank_falls_back() {
        let options = PriceOptions {
            electricity_import: Some("  sensor.my_tariff ".to_owned()),
            gas: Some("   ".to_owned()),
            ..PriceOptions::default()
        };
        let sensors = build_price_sensor_definitions(&options);

        assert_eq!(sensors[0].entity_id, "sensor.my_tariff");
        assert_eq!(sensors[1].polarity, PricePolarity::Credit);
        assert_eq!(sensors[2].entity_id, DEFAULT_PRICE_GAS_SENSOR);
    }

    #[test]
    fn test_disabled_yields_nothing() {
        let co2 = Co2Options {
            enabled: false,
            ..Co2Options::default()
        };
        let price = PriceOptions {
            enabled: false,
            ..PriceOptions::default()
        };

        assert!(build_co2_sensor_definitions(&co2).is_empty());
        assert!(build_price_sensor_definitions(&price).is_empty());
    }
}

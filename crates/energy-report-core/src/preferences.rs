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

//! Typed view of the energy preferences and the walker that turns them into
//! the flat list of tracked statistics.

use energy_report_types::{Category, MetricDefinition};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::errors::{ReportError, ReportResult};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GridFlowFrom {
    #[serde(default)]
    pub stat_energy_from: Option<String>,
    #[serde(default)]
    pub stat_cost: Option<String>,
    #[serde(default)]
    pub stat_co2: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GridFlowTo {
    #[serde(default)]
    pub stat_energy_to: Option<String>,
    #[serde(default)]
    pub stat_compensation: Option<String>,
    #[serde(default)]
    pub stat_co2: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GridSource {
    #[serde(default)]
    pub flow_from: Vec<GridFlowFrom>,
    #[serde(default)]
    pub flow_to: Vec<GridFlowTo>,
    #[serde(default)]
    pub stat_co2: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SolarSource {
    #[serde(default)]
    pub stat_energy_from: Option<String>,
    #[serde(default)]
    pub stat_co2: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BatterySource {
    /// Energy leaving the battery
    #[serde(default)]
    pub stat_energy_from: Option<String>,
    /// Energy entering the battery
    #[serde(default)]
    pub stat_energy_to: Option<String>,
    #[serde(default)]
    pub stat_co2: Option<String>,
}

/// Gas or water source
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MeteredSource {
    #[serde(default)]
    pub stat_energy_from: Option<String>,
    #[serde(default)]
    pub stat_cost: Option<String>,
    #[serde(default)]
    pub stat_co2: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EnergySource {
    Grid(GridSource),
    Solar(SolarSource),
    Battery(BatterySource),
    Gas(MeteredSource),
    Water(MeteredSource),
    #[serde(other)]
    Unknown,
}

impl EnergySource {
    fn stat_co2(&self) -> Option<&str> {
        match self {
            Self::Grid(source) => source.stat_co2.as_deref(),
            Self::Solar(source) => source.stat_co2.as_deref(),
            Self::Battery(source) => source.stat_co2.as_deref(),
            Self::Gas(source) | Self::Water(source) => source.stat_co2.as_deref(),
            Self::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeviceConsumption {
    #[serde(default)]
    pub stat_consumption: Option<String>,
    #[serde(default)]
    pub stat_co2: Option<String>,
}

/// Energy preferences of one dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnergyPreferences {
    pub energy_sources: Vec<EnergySource>,
    pub device_consumption: Vec<DeviceConsumption>,
}

impl EnergyPreferences {
    /// Parse a raw preferences blob.
    ///
    /// Individual records that do not parse are skipped with a debug log;
    /// only a blob whose collections are not lists is rejected.
    pub fn from_value(value: &Value) -> ReportResult<Self> {
        let sources = list_field(value, "energy_sources")?;
        let devices = list_field(value, "device_consumption")?;

        let energy_sources = sources
            .iter()
            .filter_map(|raw| match EnergySource::deserialize(raw) {
                Ok(source) => Some(source),
                Err(e) => {
                    debug!("Skipping unreadable energy source {raw}: {e}");
                    None
                }
            })
            .collect();

        let device_consumption = devices
            .iter()
            .filter_map(|raw| match DeviceConsumption::deserialize(raw) {
                Ok(device) => Some(device),
                Err(e) => {
                    debug!("Skipping unreadable device {raw}: {e}");
                    None
                }
            })
            .collect();

        Ok(Self {
            energy_sources,
            device_consumption,
        })
    }
}

fn list_field<'a>(value: &'a Value, key: &str) -> ReportResult<&'a [Value]> {
    match value.get(key) {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(ReportError::InvalidPreferences(format!(
            "'{key}' must be a list, got {other}"
        ))),
    }
}

/// Ordered, deduplicated metric list under construction
struct MetricWalker {
    metrics: Vec<MetricDefinition>,
    seen: HashSet<String>,
    co2_enabled: bool,
    price_enabled: bool,
}

impl MetricWalker {
    fn add(&mut self, statistic_id: Option<&str>, category: Category) {
        let Some(statistic_id) = statistic_id.map(str::trim).filter(|id| !id.is_empty()) else {
            return;
        };
        if category.is_monetary() && !self.price_enabled {
            return;
        }
        if !self.seen.insert(statistic_id.to_owned()) {
            return;
        }
        self.metrics
            .push(MetricDefinition::new(category, statistic_id));
    }

    fn add_co2(&mut self, statistic_id: Option<&str>) {
        if self.co2_enabled {
            self.add(statistic_id, Category::Co2Emissions);
        }
    }
}

/// Flatten preferences into tracked statistics.
///
/// Order follows the configuration. An identifier is kept once, under the
/// first category it was seen with.
pub fn build_metrics(
    preferences: &EnergyPreferences,
    co2_enabled: bool,
    price_enabled: bool,
) -> Vec<MetricDefinition> {
    let mut walker = MetricWalker {
        metrics: Vec::new(),
        seen: HashSet::new(),
        co2_enabled,
        price_enabled,
    };

    for source in &preferences.energy_sources {
        match source {
            EnergySource::Grid(grid) => {
                for flow in &grid.flow_from {
                    walker.add(flow.stat_energy_from.as_deref(), Category::GridImport);
                    walker.add(flow.stat_cost.as_deref(), Category::GridCost);
                    walker.add_co2(flow.stat_co2.as_deref());
                }
                for flow in &grid.flow_to {
                    walker.add(flow.stat_energy_to.as_deref(), Category::GridExport);
                    walker.add(flow.stat_compensation.as_deref(), Category::GridCompensation);
                    walker.add_co2(flow.stat_co2.as_deref());
                }
            }
            EnergySource::Solar(solar) => {
                walker.add(solar.stat_energy_from.as_deref(), Category::SolarProduction);
            }
            EnergySource::Battery(battery) => {
                walker.add(battery.stat_energy_from.as_deref(), Category::BatteryDischarge);
                walker.add(battery.stat_energy_to.as_deref(), Category::BatteryCharge);
            }
            EnergySource::Gas(gas) => {
                walker.add(gas.stat_energy_from.as_deref(), Category::GasConsumption);
                walker.add(gas.stat_cost.as_deref(), Category::GasCost);
            }
            EnergySource::Water(water) => {
                walker.add(water.stat_energy_from.as_deref(), Category::WaterConsumption);
                walker.add(water.stat_cost.as_deref(), Category::WaterCost);
            }
            EnergySource::Unknown => {}
        }
        walker.add_co2(source.stat_co2());
    }

    for device in &preferences.device_consumption {
        walker.add(device.stat_consumption.as_deref(), Category::DeviceConsumption);
        walker.add_co2(device.stat_co2.as_deref());
    }

    walker.metrics
}

/// Map each energy statistic to the cost statistic configured beside it
pub fn build_cost_mapping(preferences: &EnergyPreferences) -> HashMap<String, String> {
    let mut mapping = HashMap::new();
    let mut link = |energy: Option<&str>, cost: Option<&str>| {
        if let (Some(energy), Some(cost)) = (non_blank(energy), non_blank(cost)) {
            mapping
                .entry(energy.to_owned())
                .or_insert_with(|| cost.to_owned());
        }
    };

    for source in &preferences.energy_sources {
        match source {
            EnergySource::Grid(grid) => {
                for flow in &grid.flow_from {
                    link(flow.stat_energy_from.as_deref(), flow.stat_cost.as_deref());
                }
                for flow in &grid.flow_to {
                    link(flow.stat_energy_to.as_deref(), flow.stat_compensation.as_deref());
                }
            }
            EnergySource::Gas(metered) | EnergySource::Water(metered) => {
                link(metered.stat_energy_from.as_deref(), metered.stat_cost.as_deref());
            }
            EnergySource::Solar(_) | EnergySource::Battery(_) | EnergySource::Unknown => {}
        }
    }

    mapping
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> EnergyPreferences {
        EnergyPreferences::from_value(&json!({
            "energy_sources": [
                {
                    "type": "grid",
                    "flow_from": [{
                        "stat_energy_from": "sensor.grid_in",
                        "stat_cost": "sensor.grid_in_cost",
                        "stat_co2": "sensor.grid_co2"
                    }],
                    "flow_to": [{
                        "stat_energy_to": "sensor.grid_out",
                        "stat_compensation": "sensor.grid_out_comp"
                    }]
                },
                {"type": "solar", "stat_energy_from": "sensor.pv"},
                {
                    "type": "battery",
                    "stat_energy_from": "sensor.bat_out",
                    "stat_energy_to": "sensor.bat_in"
                },
                {"type": "gas", "stat_energy_from": "sensor.gas", "stat_cost": "sensor.gas_cost"},
                {"type": "heat_pump", "stat_energy_from": "sensor.ignored"}
            ],
            "device_consumption": [
                {"stat_consumption": "sensor.fridge"},
                {"stat_consumption": "sensor.pv"},
                {"stat_consumption": "  "}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_walker_categories_and_order() {
        let metrics = build_metrics(&sample(), false, true);
        let pairs: Vec<_> = metrics
            .iter()
            .map(|m| (m.category, m.statistic_id.as_str()))
            .collect();

        assert_eq!(
            pairs,
            vec![
                (Category::GridImport, "sensor.grid_in"),
                (Category::GridCost, "sensor.grid_in_cost"),
                (Category::GridExport, "sensor.grid_out"),
                (Category::GridCompensation, "sensor.grid_out_comp"),
                (Category::SolarProduction, "sensor.pv"),
                (Category::BatteryDischarge, "sensor.bat_out"),
                (Category::BatteryCharge, "sensor.bat_in"),
                (Category::GasConsumption, "sensor.gas"),
                (Category::GasCost, "sensor.gas_cost"),
                (Category::DeviceConsumption, "sensor.fridge"),
            ]
        );
    }

    #[test]
    fn test_first_category_wins_and_ids_are_unique() {
        let metrics = build_metrics(&sample(), true, true);
        let ids: HashSet<_> = metrics.iter().map(|m| m.statistic_id.as_str()).collect();
        assert_eq!(ids.len(), metrics.len());

        let pv: Vec<_> = metrics
            .iter()
            .filter(|m| m.statistic_id == "sensor.pv")
            .collect();
        assert_eq!(pv.len(), 1);
        assert_eq!(pv[0].category, Category::SolarProduction);
    }

    #[test]
    fn test_walker_is_deterministic() {
        let prefs = sample();
        assert_eq!(build_metrics(&prefs, true, true), build_metrics(&prefs, true, true));
    }

    #[test]
    fn test_co2_identifiers_follow_toggle() {
        let without = build_metrics(&sample(), false, true);
        assert!(without.iter().all(|m| m.category != Category::Co2Emissions));

        let with = build_metrics(&sample(), true, true);
        let co2: Vec<_> = with
            .iter()
            .filter(|m| m.category == Category::Co2Emissions)
            .map(|m| m.statistic_id.as_str())
            .collect();
        assert_eq!(co2, vec!["sensor.grid_co2"]);
    }

    #[test]
    fn test_price_toggle_drops_cost_identifiers() {
        let metrics = build_metrics(&sample(), false, false);
        assert!(metrics.iter().all(|m| !m.category.is_monetary()));
        assert_eq!(metrics.len(), 7);
    }

    #[test]
    fn test_cost_mapping() {
        let mapping = build_cost_mapping(&sample());
        assert_eq!(mapping.get("sensor.grid_in").unwrap(), "sensor.grid_in_cost");
        assert_eq!(mapping.get("sensor.grid_out").unwrap(), "sensor.grid_out_comp");
        assert_eq!(mapping.get("sensor.gas").unwrap(), "sensor.gas_cost");
        assert!(!mapping.contains_key("sensor.pv"));
    }

    #[test]
    fn test_unreadable_records_are_skipped() {
        let prefs = EnergyPreferences::from_value(&json!({
            "energy_sources": [
                {"stat_energy_from": "sensor.no_type"},
                {"type": "solar", "stat_energy_from": 42},
                {"type": "solar", "stat_energy_from": "sensor.pv"}
            ],
            "device_consumption": []
        }))
        .unwrap();

        assert_eq!(prefs.energy_sources.len(), 1);
    }

    #[test]
    fn test_non_list_collection_is_rejected() {
        let err = EnergyPreferences::from_value(&json!({
            "energy_sources": {"type": "grid"},
            "device_consumption": []
        }))
        .unwrap_err();
        assert!(matches!(err, ReportError::InvalidPreferences(_)));
    }
}

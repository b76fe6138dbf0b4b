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

use energy_report_types::{BalanceSlot, ConclusionSummary, MetricDefinition, StatisticMetadata};
use std::collections::HashMap;

#[derive(Debug, Default)]
struct SlotTotals {
    production: f64,
    imported: f64,
    exported: f64,
    consumption: f64,
    charge: f64,
    discharge: f64,
}

impl SlotTotals {
    fn add(&mut self, slot: BalanceSlot, value: f64) {
        let target = match slot {
            BalanceSlot::Production => &mut self.production,
            BalanceSlot::Imported => &mut self.imported,
            BalanceSlot::Exported => &mut self.exported,
            BalanceSlot::Consumption => &mut self.consumption,
            BalanceSlot::Charge => &mut self.charge,
            BalanceSlot::Discharge => &mut self.discharge,
        };
        *target += value;
    }
}

/// Reconcile per-statistic totals into an energy balance.
///
/// Returns `None` when no metric belongs to the balance vocabulary. Several
/// metrics in one slot (e.g. many metered devices) add up. The unit comes
/// from the first metric, balance or not, whose metadata carries one.
pub fn reconcile(
    metrics: &[MetricDefinition],
    totals: &HashMap<String, f64>,
    metadata: &HashMap<String, StatisticMetadata>,
) -> Option<ConclusionSummary> {
    let mut slots = SlotTotals::default();
    let mut any_slot = false;
    let mut has_battery = false;

    for metric in metrics {
        let Some(slot) = metric.category.balance_slot() else {
            continue;
        };
        any_slot = true;
        has_battery |= metric.category.is_battery();
        slots.add(
            slot,
            totals.get(&metric.statistic_id).copied().unwrap_or(0.0),
        );
    }

    if !any_slot {
        return None;
    }

    let energy_unit = metrics.iter().find_map(|metric| {
        metadata
            .get(&metric.statistic_id)
            .map(|meta| meta.unit().trim())
            .filter(|unit| !unit.is_empty())
            .map(str::to_owned)
    });

    let SlotTotals {
        production,
        imported,
        exported,
        consumption,
        charge,
        discharge,
    } = slots;

    let direct = (production - exported.max(0.0) - charge.max(0.0)).max(0.0);
    let indirect = has_battery.then(|| discharge.min(charge).max(0.0));
    let total_estimated_consumption = production + imported + discharge - exported - charge;
    let untracked_consumption = (total_estimated_consumption - consumption).max(0.0);

    Some(ConclusionSummary {
        production,
        imported,
        exported,
        consumption,
        charge,
        discharge,
        direct,
        indirect,
        total_estimated_consumption,
        untracked_consumption,
        has_battery,
        energy_unit,
    })
}

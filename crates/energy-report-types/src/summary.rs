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

/// Reconciled energy balance for one report period.
///
/// All quantities share `energy_unit`. `direct` and `untracked_consumption`
/// are never negative. `indirect` is only defined when a battery is tracked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConclusionSummary {
    pub production: f64,
    pub imported: f64,
    pub exported: f64,
    pub consumption: f64,
    pub charge: f64,
    pub discharge: f64,
    pub direct: f64,
    pub indirect: Option<f64>,
    pub total_estimated_consumption: f64,
    pub untracked_consumption: f64,
    pub has_battery: bool,
    pub energy_unit: Option<String>,
}

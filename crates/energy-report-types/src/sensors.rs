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

/// Whether a CO₂ sensor reports emitted or avoided carbon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Co2Polarity {
    Emission,
    Saving,
}

/// Whether a price sensor reports money spent or money earned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PricePolarity {
    Expense,
    Credit,
}

/// Auxiliary sensor outside the energy balance vocabulary.
///
/// Totals for these sensors are keyed by [`AuxiliarySensor::translation_key`]
/// so display labels do not depend on the configured entity.
pub trait AuxiliarySensor {
    fn entity_id(&self) -> &str;
    fn translation_key(&self) -> &'static str;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Co2SensorDefinition {
    pub entity_id: String,
    pub translation_key: &'static str,
    pub polarity: Co2Polarity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceSensorDefinition {
    pub entity_id: String,
    pub translation_key: &'static str,
    pub polarity: PricePolarity,
}

impl AuxiliarySensor for Co2SensorDefinition {
    fn entity_id(&self) -> &str {
        &self.entity_id
    }

    fn translation_key(&self) -> &'static str {
        self.translation_key
    }
}

impl AuxiliarySensor for PriceSensorDefinition {
    fn entity_id(&self) -> &str {
        &self.entity_id
    }

    fn translation_key(&self) -> &'static str {
        self.translation_key
    }
}

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

pub mod adapters;
pub mod client;
pub mod errors;
pub mod types;
pub mod websocket;

#[cfg(test)]
mod test_server;

pub use adapters::{HaEnergyConfig, HaStatisticsStore};
pub use client::{HomeAssistantClient, websocket_url};
pub use errors::{HaError, HaResult};
pub use types::{HaEntityState, HaHistoryState, RecorderInfo};
pub use websocket::HaWebSocketClient;

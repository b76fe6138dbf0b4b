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

mod cli;
mod config;
mod html_renderer;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use clap::Parser;
use energy_report_advisor::OpenAiAdvisor;
use energy_report_core::{GeneratedReport, ReportGenerator, notification_message};
use energy_report_ha::{HaEnergyConfig, HaStatisticsStore, HaWebSocketClient, HomeAssistantClient};
use energy_report_i18n::I18n;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::cli::Cli;
use crate::config::ReportConfig;
use crate::html_renderer::HtmlRenderer;

/// Notifications replace each other instead of piling up
const NOTIFICATION_ID: &str = "energy_report_last_report";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, source) = ReportConfig::load()?;

    // Respects RUST_LOG, else the configured level
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install the tracing subscriber")?;

    info!("🚀 Starting energy report v{}", env!("CARGO_PKG_VERSION"));
    info!("✅ Loaded configuration from {}", source);

    let ha_client = HomeAssistantClient::from_config(config.ha_base_url.clone(), config.ha_token.clone())
        .context("Failed to initialize the Home Assistant client")?;
    let (timezone, currency) = host_locale(&ha_client).await;

    let ws = Arc::new(
        HaWebSocketClient::from_client(&ha_client)
            .context("Failed to derive the WebSocket endpoint")?,
    );
    let store = Arc::new(HaStatisticsStore::new(ha_client.clone(), Arc::clone(&ws)));
    let energy = Arc::new(HaEnergyConfig::new(Arc::clone(&ws)));
    let advisor = OpenAiAdvisor::new(config.openai_api_key.clone())
        .with_endpoint(config.advice_endpoint.clone());
    if !advisor.is_enabled() {
        info!("🤖 No OpenAI API key configured, advice will use the fallback text");
    }

    let generator = ReportGenerator::new(
        store,
        energy,
        Arc::new(HtmlRenderer),
        config.generator_settings(timezone, currency),
    )
    .with_advisor(Arc::new(advisor));

    let outcome = generator
        .generate(&cli.request())
        .await
        .context("Energy report generation failed");
    ws.close().await;
    let report = outcome?;

    if cli.no_notify {
        info!("Notification skipped (--no-notify)");
    } else {
        notify(&ha_client, &report).await;
    }

    println!("{}", report.path.display());
    Ok(())
}

/// Timezone and currency from the HA configuration, UTC and none on failure
async fn host_locale(client: &HomeAssistantClient) -> (Tz, Option<String>) {
    let ha_config = match client.get_config().await {
        Ok(ha_config) => ha_config,
        Err(e) => {
            warn!("⚠️ Failed to fetch the HA configuration ({}), using UTC", e);
            return (Tz::UTC, None);
        }
    };

    let timezone = ha_config
        .get("time_zone")
        .and_then(Value::as_str)
        .and_then(|name| match name.parse::<Tz>() {
            Ok(tz) => Some(tz),
            Err(e) => {
                warn!("⚠️ Unknown HA timezone '{}' ({}), using UTC", name, e);
                None
            }
        })
        .unwrap_or(Tz::UTC);
    let currency = ha_config
        .get("currency")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_owned);

    info!("🌍 Home Assistant timezone: {}", timezone);
    (timezone, currency)
}

/// Failures are logged; the report already exists
async fn notify(client: &HomeAssistantClient, report: &GeneratedReport) {
    let i18n = match I18n::new(report.language) {
        Ok(i18n) => i18n,
        Err(e) => {
            warn!("⚠️ Notification skipped, translations unavailable: {}", e);
            return;
        }
    };
    let (title, message) = notification_message(
        &i18n,
        &report.period,
        report.dashboard_label.as_deref(),
        &report.path,
    );

    match client
        .create_notification(&title, &message, NOTIFICATION_ID)
        .await
    {
        Ok(()) => info!("🔔 Notification posted"),
        Err(e) => warn!("⚠️ Failed to post the notification: {}", e),
    }
}

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

use anyhow::{Context, Result, bail};
use chrono_tz::Tz;
use energy_report_core::{
    AuxiliaryStrategy, Co2Options, DEFAULT_FILENAME_PATTERN, GeneratorSettings, PriceOptions,
};
use energy_report_i18n::Language;
use energy_report_types::PeriodKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const ADDON_OPTIONS_PATH: &str = "/data/options.json";
pub const DEFAULT_OUTPUT_DIR: &str = "www/energy_reports";
pub const DEFAULT_ADVICE_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Where the configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    AddonOptions(PathBuf),
    Toml(PathBuf),
    Json(PathBuf),
    Defaults,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddonOptions(path) => write!(f, "HA addon options ({})", path.display()),
            Self::Toml(path) | Self::Json(path) => write!(f, "{}", path.display()),
            Self::Defaults => f.write_str("defaults with environment overrides"),
        }
    }
}

/// Report configuration - HA addon options or a development config file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Directory receiving the reports
    pub output_dir: String,

    /// Supports `{start}`, `{end}` and `{period}`
    pub filename_pattern: String,

    /// day, week or month
    pub default_report_type: Option<String>,

    /// Historical name of `default_report_type`
    #[serde(rename = "period", skip_serializing_if = "Option::is_none")]
    pub legacy_period: Option<String>,

    pub language: String,

    pub co2: bool,
    pub co2_electricity: Option<String>,
    pub co2_gas: Option<String>,
    pub co2_water: Option<String>,
    pub co2_savings: Option<String>,

    pub price: bool,
    pub price_electricity_import: Option<String>,
    pub price_electricity_export: Option<String>,
    pub price_gas: Option<String>,
    pub price_water: Option<String>,

    /// How CO₂ and price sensor totals are computed
    pub auxiliary_strategy: AuxiliaryStrategy,

    /// Empty disables the advisor
    pub openai_api_key: String,
    pub advice_endpoint: String,

    /// Home Assistant base URL (optional, defaults to supervisor)
    pub ha_base_url: Option<String>,

    /// Home Assistant token (optional, uses SUPERVISOR_TOKEN if not set)
    pub ha_token: Option<String>,

    /// Log level (debug, info, warn, error)
    pub log_level: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: DEFAULT_OUTPUT_DIR.to_owned(),
            filename_pattern: DEFAULT_FILENAME_PATTERN.to_owned(),
            default_report_type: None,
            legacy_period: None,
            language: Language::default().code().to_owned(),
            co2: true,
            co2_electricity: None,
            co2_gas: None,
            co2_water: None,
            co2_savings: None,
            price: true,
            price_electricity_import: None,
            price_electricity_export: None,
            price_gas: None,
            price_water: None,
            auxiliary_strategy: AuxiliaryStrategy::default(),
            openai_api_key: String::new(),
            advice_endpoint: DEFAULT_ADVICE_ENDPOINT.to_owned(),
            ha_base_url: None,
            ha_token: None,
            log_level: "info".to_owned(),
        }
    }
}

impl ReportConfig {
    /// Load configuration from HA addon options or config file
    pub fn load() -> Result<(Self, ConfigSource)> {
        Self::load_from(
            Path::new(ADDON_OPTIONS_PATH),
            Path::new("config.toml"),
            Path::new("config.json"),
            |key| std::env::var(key).ok(),
        )
    }

    /// First readable file wins; without any, defaults plus environment
    pub fn load_from(
        addon_options: &Path,
        toml_path: &Path,
        json_path: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<(Self, ConfigSource)> {
        let (config, source) = if let Ok(options_str) = std::fs::read_to_string(addon_options) {
            let config: ReportConfig =
                serde_json::from_str(&options_str).context("Failed to parse HA addon options")?;
            (config, ConfigSource::AddonOptions(addon_options.to_path_buf()))
        } else if let Ok(config_str) = std::fs::read_to_string(toml_path) {
            let config: ReportConfig = toml::from_str(&config_str)
                .with_context(|| format!("Failed to parse {}", toml_path.display()))?;
            (config, ConfigSource::Toml(toml_path.to_path_buf()))
        } else if let Ok(config_str) = std::fs::read_to_string(json_path) {
            let config: ReportConfig = serde_json::from_str(&config_str)
                .with_context(|| format!("Failed to parse {}", json_path.display()))?;
            (config, ConfigSource::Json(json_path.to_path_buf()))
        } else {
            (Self::from_env(env), ConfigSource::Defaults)
        };

        let config = config.normalized();
        config.validate()?;
        Ok((config, source))
    }

    /// Defaults with environment variable overrides (development/testing)
    fn from_env(env: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = env("HA_BASE_URL") {
            config.ha_base_url = Some(url);
        }
        if let Some(token) = env("HA_TOKEN") {
            config.ha_token = Some(token);
        }
        if let Some(key) = env("OPENAI_API_KEY") {
            config.openai_api_key = key;
        }
        if let Some(language) = env("REPORT_LANGUAGE") {
            config.language = language;
        }
        if let Some(dir) = env("REPORT_OUTPUT_DIR") {
            config.output_dir = dir;
        }

        config
    }

    /// Replace blank or unusable values by their defaults
    fn normalized(mut self) -> Self {
        if self.filename_pattern.trim().is_empty() {
            self.filename_pattern = DEFAULT_FILENAME_PATTERN.to_owned();
        }
        if self.output_dir.trim().is_empty() {
            self.output_dir = DEFAULT_OUTPUT_DIR.to_owned();
        }
        if self.advice_endpoint.trim().is_empty() {
            self.advice_endpoint = DEFAULT_ADVICE_ENDPOINT.to_owned();
        }
        if self.default_report_type.is_none() {
            self.default_report_type = self.legacy_period.take();
        }

        for sensor in [
            &mut self.co2_electricity,
            &mut self.co2_gas,
            &mut self.co2_water,
            &mut self.co2_savings,
            &mut self.price_electricity_import,
            &mut self.price_electricity_export,
            &mut self.price_gas,
            &mut self.price_water,
        ] {
            *sensor = sensor
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_owned);
        }

        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.advice_endpoint.starts_with("http://")
            || self.advice_endpoint.starts_with("https://"))
        {
            bail!(
                "advice_endpoint must be an http(s) URL, got '{}'",
                self.advice_endpoint
            );
        }
        if let Some(url) = &self.ha_base_url
            && !url.trim().is_empty()
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            bail!("ha_base_url must be an http(s) URL, got '{url}'");
        }
        Ok(())
    }

    /// Configured period; unknown values fall back to `week`
    pub fn period_kind(&self) -> PeriodKind {
        let Some(raw) = self.default_report_type.as_deref() else {
            return PeriodKind::default();
        };
        raw.parse().unwrap_or_else(|e| {
            warn!("{e}, using {}", PeriodKind::default());
            PeriodKind::default()
        })
    }

    /// Configured language; unknown codes fall back to French
    pub fn language(&self) -> Language {
        Language::from_code(&self.language).unwrap_or_else(|e| {
            warn!("{e}, using {}", Language::default());
            Language::default()
        })
    }

    pub fn co2_options(&self) -> Co2Options {
        Co2Options {
            enabled: self.co2,
            electricity: self.co2_electricity.clone(),
            gas: self.co2_gas.clone(),
            water: self.co2_water.clone(),
            savings: self.co2_savings.clone(),
        }
    }

    pub fn price_options(&self) -> PriceOptions {
        PriceOptions {
            enabled: self.price,
            electricity_import: self.price_electricity_import.clone(),
            electricity_export: self.price_electricity_export.clone(),
            gas: self.price_gas.clone(),
            water: self.price_water.clone(),
        }
    }

    /// Generator settings in the host's timezone and currency
    pub fn generator_settings(&self, timezone: Tz, currency: Option<String>) -> GeneratorSettings {
        GeneratorSettings {
            output_dir: PathBuf::from(&self.output_dir),
            filename_pattern: self.filename_pattern.clone(),
            default_period: self.period_kind(),
            language: self.language(),
            timezone,
            co2: self.co2_options(),
            price: self.price_options(),
            auxiliary_strategy: self.auxiliary_strategy,
            currency,
        }
    }
}

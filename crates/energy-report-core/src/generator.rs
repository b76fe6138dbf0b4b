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

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use energy_report_i18n::{I18n, Language};
use energy_report_types::{ConclusionSummary, PeriodKind, ResolvedPeriod};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::aggregation::{AuxiliaryStrategy, aggregate_totals, collect_auxiliary};
use crate::balance::reconcile;
use crate::collector::{METADATA_CONVENTION, StatisticsCollector};
use crate::dashboard::select_dashboard;
use crate::errors::{ReportError, ReportResult};
use crate::filename::{DEFAULT_FILENAME_PATTERN, FilenameContext, resolve_filename};
use crate::period::resolve_period;
use crate::preferences::{EnergyPreferences, build_cost_mapping, build_metrics};
use crate::report::{
    ReportContent, ReportDocument, ReportRenderer, build_document, conclusion_paragraphs,
    summary_series,
};
use crate::sensors::{
    Co2Options, PriceOptions, build_co2_sensor_definitions, build_price_sensor_definitions,
};
use crate::traits::{AdviceProvider, EnergyConfigProvider, StatisticsStore};

/// Settings shared by every report of one generator
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub output_dir: PathBuf,
    pub filename_pattern: String,
    pub default_period: PeriodKind,
    pub language: Language,
    pub timezone: Tz,
    pub co2: Co2Options,
    pub price: PriceOptions,
    pub auxiliary_strategy: AuxiliaryStrategy,
    pub currency: Option<String>,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("www/energy_reports"),
            filename_pattern: DEFAULT_FILENAME_PATTERN.to_owned(),
            default_period: PeriodKind::default(),
            language: Language::default(),
            timezone: Tz::UTC,
            co2: Co2Options::default(),
            price: PriceOptions::default(),
            auxiliary_strategy: AuxiliaryStrategy::default(),
            currency: None,
        }
    }
}

/// Per-request options; unset values fall back to the settings
#[derive(Debug, Clone, Default)]
pub struct ReportRequest {
    pub period: Option<PeriodKind>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub filename: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub language: Option<Language>,
    pub dashboard: Option<String>,
}

impl ReportRequest {
    /// Period kind for this request.
    ///
    /// Explicit start and end dates without a kind form a custom period.
    fn period_kind(&self, default: PeriodKind) -> Option<PeriodKind> {
        match (self.period, self.start_date, self.end_date) {
            (Some(kind), _, _) => Some(kind),
            (None, Some(_), Some(_)) => None,
            _ => Some(default),
        }
    }
}

/// Outcome of one successful report generation
#[derive(Debug, Clone)]
pub struct GeneratedReport {
    pub path: PathBuf,
    pub period: ResolvedPeriod,
    pub language: Language,
    pub dashboard_label: Option<String>,
    pub metric_count: usize,
    pub summary: Option<ConclusionSummary>,
    pub advice: Option<String>,
}

/// End-to-end report pipeline over the host collaborators
pub struct ReportGenerator {
    store: Arc<dyn StatisticsStore>,
    energy: Arc<dyn EnergyConfigProvider>,
    renderer: Arc<dyn ReportRenderer>,
    advisor: Option<Arc<dyn AdviceProvider>>,
    settings: GeneratorSettings,
}

impl std::fmt::Debug for ReportGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportGenerator")
            .field("store", &self.store.name())
            .field("energy", &self.energy.name())
            .field("advisor", &self.advisor.is_some())
            .field("settings", &self.settings)
            .finish()
    }
}

impl ReportGenerator {
    pub fn new(
        store: Arc<dyn StatisticsStore>,
        energy: Arc<dyn EnergyConfigProvider>,
        renderer: Arc<dyn ReportRenderer>,
        settings: GeneratorSettings,
    ) -> Self {
        Self {
            store,
            energy,
            renderer,
            advisor: None,
            settings,
        }
    }

    pub fn with_advisor(mut self, advisor: Arc<dyn AdviceProvider>) -> Self {
        self.advisor = Some(advisor);
        self
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    /// Resolve, collect, reconcile and render one report
    pub async fn generate(&self, request: &ReportRequest) -> ReportResult<GeneratedReport> {
        let settings = &self.settings;
        let language = request.language.unwrap_or(settings.language);
        let today = Utc::now().with_timezone(&settings.timezone).date_naive();

        let period = resolve_period(
            request.period_kind(settings.default_period),
            request.start_date,
            request.end_date,
            settings.timezone,
            today,
        )?;
        info!(
            "Generating {} report for {} → {} ({} buckets)",
            period.kind_label(),
            period.display_start.date_naive(),
            period.display_end.date_naive(),
            period.bucket
        );

        let dashboard = select_dashboard(self.energy.as_ref(), request.dashboard.as_deref()).await?;
        let dashboard_label = dashboard.label();
        let preferences = EnergyPreferences::from_value(&dashboard.preferences)?;

        let metrics = build_metrics(&preferences, settings.co2.enabled, settings.price.enabled);
        if metrics.is_empty() {
            return Err(ReportError::NoMetricsFound);
        }
        let cost_mapping = build_cost_mapping(&preferences);
        debug!(
            "Tracking {} statistic(s), {} cost pair(s)",
            metrics.len(),
            cost_mapping.len()
        );

        let statistic_ids: BTreeSet<String> =
            metrics.iter().map(|m| m.statistic_id.clone()).collect();
        let collected = StatisticsCollector::new(self.store.as_ref(), &METADATA_CONVENTION)
            .collect(&statistic_ids, period.query_start, period.query_end, period.bucket)
            .await?;
        let totals = aggregate_totals(&metrics, &collected.rows);

        let co2_sensors = build_co2_sensor_definitions(&settings.co2);
        let co2_totals = collect_auxiliary(
            self.store.as_ref(),
            &co2_sensors,
            period.query_start,
            period.query_end,
            settings.timezone,
            settings.auxiliary_strategy,
        )
        .await;
        let price_sensors = build_price_sensor_definitions(&settings.price);
        let price_totals = collect_auxiliary(
            self.store.as_ref(),
            &price_sensors,
            period.query_start,
            period.query_end,
            settings.timezone,
            settings.auxiliary_strategy,
        )
        .await;

        let summary = reconcile(&metrics, &totals, &collected.metadata);
        let i18n = I18n::new(language)?;

        let advice = match &self.advisor {
            Some(advisor) => {
                let series = summary_series(&i18n, &metrics, &totals, &collected.metadata);
                let conclusion = conclusion_paragraphs(&i18n, &series, summary.as_ref()).join("\n");
                Some(advisor.advise(&conclusion, language).await)
            }
            None => None,
        };

        let output_dir = request
            .output_dir
            .clone()
            .unwrap_or_else(|| settings.output_dir.clone());
        let filename = resolve_filename(
            request.filename.as_deref(),
            &settings.filename_pattern,
            &FilenameContext {
                start: period.display_start.date_naive(),
                end: period.display_end.date_naive(),
                period: period.kind_label(),
            },
        )?;
        let mut path = output_dir.join(filename);
        // Names are resolved with a `.pdf` suffix. A renderer producing another
        // format (the bundled HTML one) swaps it so the file matches its content.
        if !self.renderer.extension().eq_ignore_ascii_case("pdf") {
            path.set_extension(self.renderer.extension());
        }

        let document = build_document(
            &i18n,
            &ReportContent {
                period: &period,
                metrics: &metrics,
                totals: &totals,
                metadata: &collected.metadata,
                cost_mapping: &cost_mapping,
                dashboard_label: dashboard_label.as_deref(),
                co2_sensors: &co2_sensors,
                co2_totals: &co2_totals,
                price_sensors: &price_sensors,
                price_totals: &price_totals,
                currency: settings.currency.as_deref(),
                summary: summary.as_ref(),
                advice: advice.as_deref(),
                file_path: &path,
                generated_at: Utc::now().with_timezone(&settings.timezone),
            },
        );

        self.write_staged(document, &output_dir, &path).await?;
        info!("📄 Energy report written to {}", path.display());

        Ok(GeneratedReport {
            path,
            period,
            language,
            dashboard_label,
            metric_count: metrics.len(),
            summary,
            advice,
        })
    }

    /// Render into a staging directory beside the target, then move into place.
    ///
    /// The staging directory is removed on every exit path.
    async fn write_staged(
        &self,
        document: ReportDocument,
        output_dir: &Path,
        target: &Path,
    ) -> ReportResult<()> {
        tokio::fs::create_dir_all(output_dir).await?;

        let staging = tempfile::Builder::new()
            .prefix(".energy-report-")
            .tempdir_in(output_dir)?;
        let file_name = target
            .file_name()
            .ok_or_else(|| ReportError::InvalidFilenamePattern(target.display().to_string()))?;
        let staged = staging.path().join(file_name);

        let renderer = Arc::clone(&self.renderer);
        let staged_for_task = staged.clone();
        tokio::task::spawn_blocking(move || renderer.render(&document, &staged_for_task))
            .await
            .map_err(|e| ReportError::Render(format!("renderer task failed: {e}")))??;

        tokio::fs::rename(&staged, target).await?;

        if let Err(e) = staging.close() {
            warn!("Could not remove staging directory: {e}");
        }
        Ok(())
    }
}

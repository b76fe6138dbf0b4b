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

//! Report assembly: turns aggregated figures into an ordered, localized
//! document that a [`ReportRenderer`] lays out.

use chrono::DateTime;
use chrono_tz::Tz;
use energy_report_i18n::{I18n, Language, fluent_args};
use energy_report_types::{
    Co2Polarity, Co2SensorDefinition, ConclusionSummary, MetricDefinition, PricePolarity,
    PriceSensorDefinition, ResolvedPeriod, StatisticMetadata,
};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

use crate::errors::ReportResult;

const CO2_UNIT: &str = "kgCO₂e";
const NEGLIGIBLE: f64 = 1e-6;

// ============= Document Model =============

/// One table as handed to the renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSpec {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Relative column widths, one per header
    pub column_weights: Vec<f64>,
    pub emphasized_rows: Vec<usize>,
}

impl TableSpec {
    pub fn is_emphasized(&self, row: usize) -> bool {
        self.emphasized_rows.contains(&row)
    }
}

/// One bar of the category chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Paragraph { text: String, bold: bool },
    Table(TableSpec),
    Chart { title: String, points: Vec<ChartPoint> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub title: String,
    pub blocks: Vec<Block>,
}

impl Section {
    fn new(title: String) -> Self {
        Self {
            title,
            blocks: Vec::new(),
        }
    }

    fn paragraph(&mut self, text: String) {
        self.blocks.push(Block::Paragraph { text, bold: false });
    }

    fn bold(&mut self, text: String) {
        self.blocks.push(Block::Paragraph { text, bold: true });
    }

    fn table(&mut self, table: TableSpec) {
        self.blocks.push(Block::Table(table));
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Paragraph { text, .. } => Some(text.as_str()),
            Block::Table(_) | Block::Chart { .. } => None,
        })
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableSpec> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Table(table) => Some(table),
            Block::Paragraph { .. } | Block::Chart { .. } => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverPage {
    pub subtitle: String,
    pub details: Vec<String>,
}

/// Fully assembled, localized report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDocument {
    pub title: String,
    pub language: Language,
    pub cover: CoverPage,
    pub sections: Vec<Section>,
    pub footer: String,
}

impl ReportDocument {
    pub fn section(&self, title: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.title == title)
    }
}

/// Lays a document out into a file.
///
/// Rendering is synchronous and runs on a blocking worker.
pub trait ReportRenderer: Send + Sync {
    fn render(&self, document: &ReportDocument, path: &Path) -> ReportResult<()>;

    /// File extension produced by this renderer
    fn extension(&self) -> &str {
        "pdf"
    }
}

// ============= Number Formatting =============

/// Human-readable number: magnitude-dependent decimals, space-grouped thousands
pub fn format_number(value: f64) -> String {
    let value = if value.abs() < 0.0005 { 0.0 } else { value };
    let decimals = if value.abs() >= 1000.0 {
        0
    } else if value.abs() >= 10.0 {
        1
    } else {
        3
    };

    let formatted = format!("{value:.decimals$}");
    let (sign, unsigned) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted.as_str()),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(formatted.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(digit);
    }

    match fraction {
        Some(fraction) => format!("{sign}{grouped}.{fraction}"),
        None => format!("{sign}{grouped}"),
    }
}

fn with_unit(value: f64, unit: Option<&str>) -> String {
    match unit.map(str::trim).filter(|unit| !unit.is_empty()) {
        Some(unit) => format!("{} {unit}", format_number(value)),
        None => format_number(value),
    }
}

fn format_date(value: &DateTime<Tz>) -> String {
    value.format("%d/%m/%Y").to_string()
}

// ============= Row Preparation =============

fn metric_unit<'a>(
    metadata: &'a HashMap<String, StatisticMetadata>,
    statistic_id: &str,
) -> &'a str {
    metadata
        .get(statistic_id)
        .map(StatisticMetadata::unit)
        .unwrap_or("")
}

/// Summary series grouped by (category, unit), largest magnitude first.
///
/// Groups whose total is negligible are dropped.
pub fn summary_series(
    i18n: &I18n,
    metrics: &[MetricDefinition],
    totals: &HashMap<String, f64>,
    metadata: &HashMap<String, StatisticMetadata>,
) -> Vec<ChartPoint> {
    let mut grouped: Vec<ChartPoint> = Vec::new();

    for metric in metrics {
        let Some(total) = totals.get(&metric.statistic_id) else {
            continue;
        };
        let label = i18n.text(metric.category.translation_key());
        let unit = metric_unit(metadata, &metric.statistic_id);

        match grouped
            .iter_mut()
            .find(|point| point.label == label && point.unit == unit)
        {
            Some(point) => point.value += total,
            None => grouped.push(ChartPoint {
                label,
                value: *total,
                unit: unit.to_owned(),
            }),
        }
    }

    grouped.retain(|point| point.value.abs() >= NEGLIGIBLE);
    grouped.sort_by(|a, b| {
        b.value
            .abs()
            .total_cmp(&a.value.abs())
            .then_with(|| a.label.cmp(&b.label))
    });
    grouped
}

/// One row per statistic; monetary identifiers paired in `cost_mapping`
/// are left out so the table only lists physical quantities.
pub fn detail_rows(
    i18n: &I18n,
    metrics: &[MetricDefinition],
    totals: &HashMap<String, f64>,
    metadata: &HashMap<String, StatisticMetadata>,
    cost_mapping: &HashMap<String, String>,
) -> Vec<Vec<String>> {
    let cost_ids: Vec<&str> = cost_mapping.values().map(String::as_str).collect();

    let mut details: Vec<(String, String, f64, String)> = metrics
        .iter()
        .filter(|metric| !cost_ids.contains(&metric.statistic_id.as_str()))
        .map(|metric| {
            let meta = metadata.get(&metric.statistic_id);
            let name = meta
                .and_then(|meta| meta.name.as_deref())
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .unwrap_or(metric.statistic_id.as_str())
                .to_owned();
            (
                i18n.text(metric.category.translation_key()),
                name,
                totals.get(&metric.statistic_id).copied().unwrap_or(0.0),
                meta.map(|meta| meta.unit().to_owned()).unwrap_or_default(),
            )
        })
        .collect();

    details.sort_by(|a, b| {
        a.0.cmp(&b.0)
            .then_with(|| b.2.abs().total_cmp(&a.2.abs()))
            .then_with(|| a.1.cmp(&b.1))
    });

    details
        .into_iter()
        .map(|(category, name, value, unit)| vec![category, name, format_number(value), unit])
        .collect()
}

/// Conclusion paragraphs; the first line of each is also the advisor input
pub fn conclusion_paragraphs(
    i18n: &I18n,
    series: &[ChartPoint],
    summary: Option<&ConclusionSummary>,
) -> Vec<String> {
    let mut paragraphs = Vec::new();

    if !series.is_empty() {
        let mut units: Vec<&str> = series
            .iter()
            .map(|point| point.unit.as_str())
            .filter(|unit| !unit.is_empty())
            .collect();
        units.sort_unstable();
        units.dedup();
        let unit = (units.len() == 1).then(|| units[0]);

        let total: f64 = series.iter().map(|point| point.value).sum();
        paragraphs.push(i18n.text_with(
            "conclusion-total",
            &fluent_args!["total" => with_unit(total, unit)],
        ));

        if let Some(dominant) = series
            .iter()
            .max_by(|a, b| a.value.abs().total_cmp(&b.value.abs()))
        {
            paragraphs.push(i18n.text_with(
                "conclusion-dominant",
                &fluent_args![
                    "category" => dominant.label.clone(),
                    "value" => with_unit(dominant.value, Some(dominant.unit.as_str()))
                ],
            ));
        }
    }

    if let Some(summary) = summary {
        let unit = summary.energy_unit.as_deref();
        paragraphs.push(i18n.text_with(
            "conclusion-balance",
            &fluent_args![
                "production" => with_unit(summary.production, unit),
                "direct" => with_unit(summary.direct, unit),
                "total" => with_unit(summary.total_estimated_consumption, unit),
                "untracked" => with_unit(summary.untracked_consumption, unit)
            ],
        ));
        if let Some(indirect) = summary.indirect {
            paragraphs.push(i18n.text_with(
                "conclusion-battery",
                &fluent_args!["indirect" => with_unit(indirect, unit)],
            ));
        }
    }

    paragraphs
}

fn balance_table(i18n: &I18n, summary: &ConclusionSummary) -> TableSpec {
    let unit = summary.energy_unit.as_deref();
    let mut rows = vec![
        ("balance-production", Some(summary.production)),
        ("balance-imported", Some(summary.imported)),
        ("balance-exported", Some(summary.exported)),
        ("balance-consumption", Some(summary.consumption)),
    ];
    if summary.has_battery {
        rows.push(("balance-charge", Some(summary.charge)));
        rows.push(("balance-discharge", Some(summary.discharge)));
    }
    rows.push(("balance-direct", Some(summary.direct)));
    rows.push(("balance-indirect", summary.indirect));
    rows.push(("balance-total-estimated", Some(summary.total_estimated_consumption)));
    rows.push(("balance-untracked", Some(summary.untracked_consumption)));

    let rows: Vec<Vec<String>> = rows
        .into_iter()
        .filter_map(|(key, value)| value.map(|value| vec![i18n.text(key), with_unit(value, unit)]))
        .collect();
    let last = rows.len().saturating_sub(1);

    TableSpec {
        title: i18n.text("balance-table-title"),
        headers: vec![
            i18n.text("balance-header-metric"),
            i18n.text("balance-header-value"),
        ],
        column_weights: vec![0.6, 0.4],
        emphasized_rows: vec![last - 1, last],
        rows,
    }
}

// ============= Document Assembly =============

/// Everything a report is assembled from
#[derive(Debug, Clone, Copy)]
pub struct ReportContent<'a> {
    pub period: &'a ResolvedPeriod,
    pub metrics: &'a [MetricDefinition],
    pub totals: &'a HashMap<String, f64>,
    pub metadata: &'a HashMap<String, StatisticMetadata>,
    pub cost_mapping: &'a HashMap<String, String>,
    pub dashboard_label: Option<&'a str>,
    pub co2_sensors: &'a [Co2SensorDefinition],
    pub co2_totals: &'a HashMap<&'static str, f64>,
    pub price_sensors: &'a [PriceSensorDefinition],
    pub price_totals: &'a HashMap<&'static str, f64>,
    pub currency: Option<&'a str>,
    pub summary: Option<&'a ConclusionSummary>,
    pub advice: Option<&'a str>,
    pub file_path: &'a Path,
    pub generated_at: DateTime<Tz>,
}

pub fn build_document(i18n: &I18n, content: &ReportContent<'_>) -> ReportDocument {
    let period = content.period;
    let start = format_date(&period.display_start);
    let end = format_date(&period.display_end);
    let period_label = format!("{start} → {end}");
    let generated = content.generated_at.format("%d/%m/%Y %H:%M").to_string();

    let mut details = vec![i18n.text_with("cover-period", &fluent_args!["period" => period_label])];
    if let Some(dashboard) = content.dashboard_label {
        details.push(i18n.text_with("cover-dashboard", &fluent_args!["dashboard" => dashboard]));
    }
    details.push(i18n.text_with(
        "cover-bucket",
        &fluent_args!["bucket" => i18n.text(&format!("bucket-{}", period.bucket))],
    ));
    details.push(i18n.text_with(
        "cover-stats",
        &fluent_args!["count" => content.metrics.len()],
    ));
    details.push(i18n.text_with(
        "cover-generated",
        &fluent_args!["timestamp" => generated.clone()],
    ));

    let cover = CoverPage {
        subtitle: i18n.text_with(
            "cover-subtitle",
            &fluent_args!["start" => start, "end" => end],
        ),
        details,
    };

    let series = summary_series(i18n, content.metrics, content.totals, content.metadata);
    let mut sections = vec![
        summary_section(i18n, &series),
        detail_section(i18n, content, &series),
    ];
    sections.extend(co2_section(i18n, content));
    sections.extend(price_section(i18n, content));
    if let Some(summary) = content.summary {
        let mut section = Section::new(i18n.text("balance-title"));
        section.paragraph(i18n.text("balance-intro"));
        section.table(balance_table(i18n, summary));
        sections.push(section);
    }

    let mut conclusion = Section::new(i18n.text("conclusion-title"));
    for (i, paragraph) in conclusion_paragraphs(i18n, &series, content.summary)
        .into_iter()
        .enumerate()
    {
        if i == 0 {
            conclusion.bold(paragraph);
        } else {
            conclusion.paragraph(paragraph);
        }
    }
    conclusion.paragraph(i18n.text("conclusion-hint"));
    sections.push(conclusion);

    if let Some(advice) = content.advice.map(str::trim).filter(|a| !a.is_empty()) {
        let mut section = Section::new(i18n.text("advice-title"));
        section.paragraph(advice.to_owned());
        sections.push(section);
    }

    ReportDocument {
        title: i18n.text("report-title"),
        language: i18n.language(),
        cover,
        sections,
        footer: i18n.text_with(
            "footer-path",
            &fluent_args!["path" => content.file_path.display().to_string()],
        ),
    }
}

fn summary_section(i18n: &I18n, series: &[ChartPoint]) -> Section {
    let rows: Vec<Vec<String>> = series
        .iter()
        .map(|point| {
            vec![
                point.label.clone(),
                format_number(point.value),
                point.unit.clone(),
            ]
        })
        .collect();

    let mut section = Section::new(i18n.text("summary-title"));
    section.paragraph(i18n.text("summary-intro"));
    section.table(TableSpec {
        title: i18n.text("summary-table-title"),
        headers: vec![
            i18n.text("summary-header-category"),
            i18n.text("summary-header-total"),
            i18n.text("summary-header-unit"),
        ],
        column_weights: vec![0.55, 0.27, 0.18],
        emphasized_rows: (0..rows.len()).collect(),
        rows,
    });
    section.paragraph(i18n.text("summary-note-totals"));
    section.paragraph(i18n.text("summary-note-negative"));
    section
}

fn detail_section(i18n: &I18n, content: &ReportContent<'_>, series: &[ChartPoint]) -> Section {
    let mut section = Section::new(i18n.text("detail-title"));
    section.paragraph(i18n.text("detail-intro"));
    section.table(TableSpec {
        title: i18n.text("detail-table-title"),
        headers: vec![
            i18n.text("detail-header-category"),
            i18n.text("detail-header-statistic"),
            i18n.text("detail-header-total"),
            i18n.text("detail-header-unit"),
        ],
        rows: detail_rows(
            i18n,
            content.metrics,
            content.totals,
            content.metadata,
            content.cost_mapping,
        ),
        column_weights: vec![0.26, 0.44, 0.18, 0.12],
        emphasized_rows: Vec::new(),
    });

    if !series.is_empty() {
        section.paragraph(i18n.text("chart-intro"));
        section.blocks.push(Block::Chart {
            title: i18n.text("chart-title"),
            points: series.to_vec(),
        });
    }
    section
}

fn co2_section(i18n: &I18n, content: &ReportContent<'_>) -> Option<Section> {
    if content.co2_sensors.is_empty() {
        return None;
    }

    let mut emissions = 0.0;
    let mut savings = 0.0;
    let mut rows = Vec::new();
    for sensor in content.co2_sensors {
        let value = content
            .co2_totals
            .get(sensor.translation_key)
            .copied()
            .unwrap_or(0.0);
        let impact = match sensor.polarity {
            Co2Polarity::Emission => {
                emissions += value;
                i18n.text("co2-emission")
            }
            Co2Polarity::Saving => {
                savings += value;
                i18n.text("co2-saving")
            }
        };
        rows.push(vec![i18n.text(sensor.translation_key), format_number(value), impact]);
    }

    let mut section = Section::new(i18n.text("co2-section-title"));
    section.paragraph(i18n.text("co2-section-intro"));
    section.table(TableSpec {
        title: i18n.text("co2-table-title"),
        headers: vec![
            i18n.text("co2-header-source"),
            i18n.text("co2-header-total"),
            i18n.text("co2-header-impact"),
        ],
        rows,
        column_weights: vec![0.5, 0.28, 0.22],
        emphasized_rows: Vec::new(),
    });
    section.bold(i18n.text_with(
        "co2-balance",
        &fluent_args![
            "emissions" => with_unit(emissions, Some(CO2_UNIT)),
            "savings" => with_unit(savings, Some(CO2_UNIT)),
            "balance" => with_unit(emissions - savings, Some(CO2_UNIT))
        ],
    ));
    Some(section)
}

fn price_section(i18n: &I18n, content: &ReportContent<'_>) -> Option<Section> {
    if content.price_sensors.is_empty() {
        return None;
    }

    let currency = content.currency;
    let mut expenses = 0.0;
    let mut credits = 0.0;
    let mut rows = Vec::new();
    for sensor in content.price_sensors {
        let value = content
            .price_totals
            .get(sensor.translation_key)
            .copied()
            .unwrap_or(0.0);
        let kind = match sensor.polarity {
            PricePolarity::Expense => {
                expenses += value;
                i18n.text("price-expense")
            }
            PricePolarity::Credit => {
                credits += value;
                i18n.text("price-credit")
            }
        };
        rows.push(vec![
            i18n.text(sensor.translation_key),
            with_unit(value, currency),
            kind,
        ]);
    }

    let mut section = Section::new(i18n.text("price-section-title"));
    section.paragraph(i18n.text("price-section-intro"));
    section.table(TableSpec {
        title: i18n.text("price-table-title"),
        headers: vec![
            i18n.text("price-header-source"),
            i18n.text("price-header-total"),
            i18n.text("price-header-impact"),
        ],
        rows,
        column_weights: vec![0.5, 0.28, 0.22],
        emphasized_rows: Vec::new(),
    });
    section.bold(i18n.text_with(
        "price-balance",
        &fluent_args![
            "expenses" => with_unit(expenses, currency),
            "credits" => with_unit(credits, currency),
            "balance" => with_unit(expenses - credits, currency)
        ],
    ));
    Some(section)
}

/// Title and body of the "report ready" notification
pub fn notification_message(
    i18n: &I18n,
    period: &ResolvedPeriod,
    dashboard_label: Option<&str>,
    path: &Path,
) -> (String, String) {
    let mut lines = vec![i18n.text_with(
        "notification-period",
        &fluent_args![
            "start" => period.display_start.date_naive().to_string(),
            "end" => period.display_end.date_naive().to_string()
        ],
    )];
    if let Some(dashboard) = dashboard_label {
        lines.push(i18n.text_with(
            "notification-dashboard",
            &fluent_args!["dashboard" => dashboard],
        ));
    }
    lines.push(i18n.text_with(
        "notification-file",
        &fluent_args!["path" => path.display().to_string()],
    ));

    (i18n.text("notification-title"), lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::resolve_period;
    use chrono::{NaiveDate, TimeZone};
    use chrono_tz::Europe::Brussels;
    use energy_report_types::{Category, PeriodKind};
    use std::path::PathBuf;

    fn english() -> I18n {
        I18n::new(Language::English).unwrap()
    }

    fn kwh() -> StatisticMetadata {
        StatisticMetadata {
            unit_of_measurement: Some("kWh".to_owned()),
            ..StatisticMetadata::default()
        }
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0.0004), "0.000");
        assert_eq!(format_number(-0.0004), "0.000");
        assert_eq!(format_number(3.14159), "3.142");
        assert_eq!(format_number(12.34), "12.3");
        assert_eq!(format_number(-987.64), "-987.6");
        assert_eq!(format_number(1234.5), "1 234");
        assert_eq!(format_number(-1234567.0), "-1 234 567");
        assert_eq!(format_number(999_999.6), "1 000 000");
    }

    #[test]
    fn test_summary_groups_sorts_and_drops_negligible() {
        let i18n = english();
        let metrics = vec![
            MetricDefinition::new(Category::DeviceConsumption, "sensor.fridge"),
            MetricDefinition::new(Category::DeviceConsumption, "sensor.heater"),
            MetricDefinition::new(Category::GridExport, "sensor.out"),
            MetricDefinition::new(Category::GasConsumption, "sensor.gas"),
        ];
        let totals: HashMap<String, f64> = [
            ("sensor.fridge", 2.0),
            ("sensor.heater", 3.0),
            ("sensor.out", -7.5),
            ("sensor.gas", 0.0000001),
        ]
        .into_iter()
        .map(|(id, v)| (id.to_owned(), v))
        .collect();
        let metadata: HashMap<String, StatisticMetadata> = ["sensor.fridge", "sensor.heater", "sensor.out"]
            .into_iter()
            .map(|id| (id.to_owned(), kwh()))
            .collect();

        let series = summary_series(&i18n, &metrics, &totals, &metadata);

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].label, "Grid export");
        assert_eq!(series[0].value, -7.5);
        assert_eq!(series[1].label, "Device consumption");
        assert_eq!(series[1].value, 5.0);
        assert_eq!(series[1].unit, "kWh");
    }

    #[test]
    fn test_detail_rows_skip_paired_costs() {
        let i18n = english();
        let metrics = vec![
            MetricDefinition::new(Category::GridImport, "sensor.in"),
            MetricDefinition::new(Category::GridCost, "sensor.in_cost"),
            MetricDefinition::new(Category::GridImport, "sensor.in_night"),
        ];
        let totals: HashMap<String, f64> = [("sensor.in", 4.0), ("sensor.in_cost", 1.2), ("sensor.in_night", 9.0)]
            .into_iter()
            .map(|(id, v)| (id.to_owned(), v))
            .collect();
        let mut metadata = HashMap::new();
        metadata.insert(
            "sensor.in".to_owned(),
            StatisticMetadata {
                name: Some("Day meter".to_owned()),
                ..kwh()
            },
        );
        let mut cost_mapping = HashMap::new();
        cost_mapping.insert("sensor.in".to_owned(), "sensor.in_cost".to_owned());

        let rows = detail_rows(&i18n, &metrics, &totals, &metadata, &cost_mapping);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["Grid import", "sensor.in_night", "9.000", ""]);
        assert_eq!(rows[1], vec!["Grid import", "Day meter", "4.000", "kWh"]);
    }

    #[test]
    fn test_conclusion_with_balance() {
        let i18n = english();
        let series = vec![
            ChartPoint {
                label: "Solar production".to_owned(),
                value: 10.0,
                unit: "kWh".to_owned(),
            },
            ChartPoint {
                label: "Grid export".to_owned(),
                value: -2.0,
                unit: "kWh".to_owned(),
            },
        ];
        let summary = ConclusionSummary {
            production: 10.0,
            imported: 5.0,
            exported: 2.0,
            consumption: 9.0,
            charge: 3.0,
            discharge: 1.0,
            direct: 5.0,
            indirect: Some(1.0),
            total_estimated_consumption: 11.0,
            untracked_consumption: 2.0,
            has_battery: true,
            energy_unit: Some("kWh".to_owned()),
        };

        let paragraphs = conclusion_paragraphs(&i18n, &series, Some(&summary));

        assert_eq!(paragraphs.len(), 4);
        assert_eq!(paragraphs[0], "The net flow observed over the period is 8.000 kWh.");
        assert_eq!(
            paragraphs[1],
            "The most significant category is Solar production with 10.0 kWh."
        );
        assert!(paragraphs[2].contains("11.0 kWh"));
        assert!(paragraphs[3].contains("1.000 kWh"));
        assert!(conclusion_paragraphs(&i18n, &[], None).is_empty());
    }

    #[test]
    fn test_document_layout() {
        let i18n = english();
        let period = resolve_period(
            Some(PeriodKind::Week),
            Some(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            None,
            Brussels,
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
        )
        .unwrap();
        let metrics = vec![MetricDefinition::new(Category::SolarProduction, "sensor.pv")];
        let totals: HashMap<String, f64> = [("sensor.pv".to_owned(), 12.0)].into_iter().collect();
        let co2 = vec![
            Co2SensorDefinition {
                entity_id: "sensor.co2".to_owned(),
                translation_key: "co2-electricity",
                polarity: Co2Polarity::Emission,
            },
            Co2SensorDefinition {
                entity_id: "sensor.co2_saved".to_owned(),
                translation_key: "co2-savings",
                polarity: Co2Polarity::Saving,
            },
        ];
        let co2_totals: HashMap<&'static str, f64> =
            [("co2-electricity", 5.0), ("co2-savings", 2.0)].into_iter().collect();
        let path = PathBuf::from("/tmp/report.pdf");
        let empty_meta = HashMap::new();
        let empty_costs = HashMap::new();
        let empty_prices = HashMap::new();

        let document = build_document(
            &i18n,
            &ReportContent {
                period: &period,
                metrics: &metrics,
                totals: &totals,
                metadata: &empty_meta,
                cost_mapping: &empty_costs,
                dashboard_label: Some("Home (home)"),
                co2_sensors: &co2,
                co2_totals: &co2_totals,
                price_sensors: &[],
                price_totals: &empty_prices,
                currency: None,
                summary: None,
                advice: Some("  Run the dishwasher at noon. "),
                file_path: &path,
                generated_at: Brussels.with_ymd_and_hms(2024, 1, 8, 6, 30, 0).unwrap(),
            },
        );

        assert_eq!(document.title, "Energy Report");
        assert_eq!(document.cover.subtitle, "Energy report from 01/01/2024 to 07/01/2024");
        assert_eq!(document.cover.details[1], "Energy dashboard: Home (home)");
        assert_eq!(document.cover.details[2], "Statistics granularity: day");
        assert_eq!(document.footer, "File path: /tmp/report.pdf");

        let titles: Vec<&str> = document.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(
            titles,
            [
                "Overall summary",
                "Breakdown by category/source",
                "CO₂",
                "Conclusion",
                "Advice"
            ]
        );

        let co2_section = document.section("CO₂").unwrap();
        assert!(
            co2_section
                .paragraphs()
                .any(|p| p.contains("Net balance: 3.000 kgCO₂e"))
        );
        let summary_table = document.sections[0].tables().next().unwrap();
        assert!(summary_table.is_emphasized(0));
        assert_eq!(
            document.section("Advice").unwrap().paragraphs().next(),
            Some("Run the dishwasher at noon.")
        );
    }

    #[test]
    fn test_notification_message() {
        let i18n = I18n::new(Language::French).unwrap();
        let period = resolve_period(
            Some(PeriodKind::Day),
            Some(NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()),
            None,
            Brussels,
            NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
        )
        .unwrap();

        let (_, message) =
            notification_message(&i18n, &period, None, Path::new("/config/www/r.pdf"));

        let lines: Vec<&str> = message.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("2024-05-02"));
        assert!(lines[1].contains("/config/www/r.pdf"));
    }
}

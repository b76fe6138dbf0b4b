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

//! Self-contained HTML layout of a report document

use askama::Template;
use energy_report_core::{
    Block, ChartPoint, ReportDocument, ReportError, ReportRenderer, ReportResult, TableSpec,
    format_number,
};
use std::path::Path;
use tracing::debug;

#[derive(Debug)]
struct ParagraphView {
    text: String,
    bold: bool,
}

#[derive(Debug)]
struct RowView {
    cells: Vec<String>,
    emphasized: bool,
}

#[derive(Debug)]
struct HeaderView {
    text: String,
    /// Percent of the table width
    width: u32,
}

#[derive(Debug)]
struct TableView {
    title: String,
    headers: Vec<HeaderView>,
    rows: Vec<RowView>,
}

#[derive(Debug)]
struct BarView {
    label: String,
    value: String,
    percent: u32,
    negative: bool,
}

#[derive(Debug)]
struct ChartView {
    title: String,
    bars: Vec<BarView>,
}

/// Exactly one member is set
#[derive(Debug, Default)]
struct BlockView {
    paragraph: Option<ParagraphView>,
    table: Option<TableView>,
    chart: Option<ChartView>,
}

#[derive(Debug)]
struct SectionView {
    title: String,
    blocks: Vec<BlockView>,
}

#[derive(Debug, Template)]
#[template(path = "report.html")]
struct ReportTemplate {
    lang: &'static str,
    title: String,
    subtitle: String,
    details: Vec<String>,
    sections: Vec<SectionView>,
    footer: String,
}

fn percent(part: f64, whole: f64) -> u32 {
    if whole <= 0.0 {
        return 0;
    }
    // Bounded to 0..=100 before the cast
    (part / whole * 100.0).round().clamp(0.0, 100.0) as u32
}

fn table_view(table: &TableSpec) -> TableView {
    let total_weight: f64 = table.column_weights.iter().sum();
    TableView {
        title: table.title.clone(),
        headers: table
            .headers
            .iter()
            .enumerate()
            .map(|(index, text)| HeaderView {
                text: text.clone(),
                width: table
                    .column_weights
                    .get(index)
                    .map_or(0, |weight| percent(*weight, total_weight)),
            })
            .collect(),
        rows: table
            .rows
            .iter()
            .enumerate()
            .map(|(index, cells)| RowView {
                cells: cells.clone(),
                emphasized: table.is_emphasized(index),
            })
            .collect(),
    }
}

fn chart_view(title: &str, points: &[ChartPoint]) -> ChartView {
    let largest = points.iter().map(|p| p.value.abs()).fold(0.0, f64::max);
    ChartView {
        title: title.to_owned(),
        bars: points
            .iter()
            .map(|point| BarView {
                label: point.label.clone(),
                value: format!("{} {}", format_number(point.value), point.unit),
                percent: percent(point.value.abs(), largest),
                negative: point.value < 0.0,
            })
            .collect(),
    }
}

fn block_view(block: &Block) -> BlockView {
    match block {
        Block::Paragraph { text, bold } => BlockView {
            paragraph: Some(ParagraphView {
                text: text.clone(),
                bold: *bold,
            }),
            ..BlockView::default()
        },
        Block::Table(table) => BlockView {
            table: Some(table_view(table)),
            ..BlockView::default()
        },
        Block::Chart { title, points } => BlockView {
            chart: Some(chart_view(title, points)),
            ..BlockView::default()
        },
    }
}

impl From<&ReportDocument> for ReportTemplate {
    fn from(document: &ReportDocument) -> Self {
        Self {
            lang: document.language.code(),
            title: document.title.clone(),
            subtitle: document.cover.subtitle.clone(),
            details: document.cover.details.clone(),
            sections: document
                .sections
                .iter()
                .map(|section| SectionView {
                    title: section.title.clone(),
                    blocks: section.blocks.iter().map(block_view).collect(),
                })
                .collect(),
            footer: document.footer.clone(),
        }
    }
}

/// Writes the report as one HTML page with inline styles
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlRenderer;

impl ReportRenderer for HtmlRenderer {
    fn render(&self, document: &ReportDocument, path: &Path) -> ReportResult<()> {
        let html = ReportTemplate::from(document)
            .render()
            .map_err(|e| ReportError::Render(e.to_string()))?;
        std::fs::write(path, html)?;
        debug!("Rendered {} section(s) to {}", document.sections.len(), path.display());
        Ok(())
    }

    fn extension(&self) -> &str {
        "html"
    }
}

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

use chrono::NaiveDate;
use clap::Parser;
use energy_report_core::ReportRequest;
use energy_report_i18n::Language;
use energy_report_types::PeriodKind;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "energy-report", version)]
#[command(
    about = "Generate an energy usage report from Home Assistant statistics",
    long_about = "Generate an energy usage report from Home Assistant long-term statistics.\n\
    \nWithout dates the report covers the current day, week or month.\n\
    Start and end dates without --period form a custom range.\n\
    \nExamples:\n  \
    energy-report --period month\n  \
    energy-report --start-date 2024-01-01 --end-date 2024-01-15 --language en\n  \
    energy-report --dashboard cabin --filename cabin.pdf --no-notify"
)]
pub struct Cli {
    /// Report period (day, week, month)
    #[arg(long)]
    pub period: Option<PeriodKind>,

    /// First day of the report (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Last day of the report, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub end_date: Option<NaiveDate>,

    /// Output file name, overrides the configured pattern
    #[arg(long)]
    pub filename: Option<String>,

    /// Output directory, overrides the configured one
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Report language (fr, en, nl)
    #[arg(long)]
    pub language: Option<Language>,

    /// Energy dashboard identifier or name
    #[arg(long)]
    pub dashboard: Option<String>,

    /// Do not post a Home Assistant notification
    #[arg(long)]
    pub no_notify: bool,
}

impl Cli {
    pub fn request(&self) -> ReportRequest {
        ReportRequest {
            period: self.period,
            start_date: self.start_date,
            end_date: self.end_date,
            filename: self.filename.clone(),
            output_dir: self.output_dir.clone(),
            language: self.language,
            dashboard: self.dashboard.clone(),
        }
    }
}

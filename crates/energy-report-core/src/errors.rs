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

use thiserror::Error;

/// Failure reported by a statistics or energy-configuration collaborator.
///
/// The message text is kept verbatim: the metadata calling-convention
/// detector inspects it for signature-mismatch markers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Recorder unavailable: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Call(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl StoreError {
    pub fn message(&self) -> &str {
        match self {
            Self::Unavailable(msg) | Self::Call(msg) | Self::InvalidResponse(msg) => msg,
        }
    }
}

/// Report generation errors surfaced to the caller
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    #[error("No energy dashboard named '{0}' was found")]
    DashboardNotFound(String),

    #[error("The energy dashboard is not configured yet")]
    NoDashboardConfigured,

    #[error("No statistics were found in the energy preferences")]
    NoMetricsFound,

    #[error("The recorder must be running to generate the report: {0}")]
    RecorderUnavailable(String),

    #[error("Invalid filename pattern: {0}")]
    InvalidFilenamePattern(String),

    #[error("Invalid energy preferences: {0}")]
    InvalidPreferences(String),

    #[error("Statistics store error: {0}")]
    Store(#[from] StoreError),

    #[error("Localization error: {0}")]
    Localization(#[from] energy_report_i18n::I18nError),

    #[error("Rendering failed: {0}")]
    Render(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ReportResult<T> = Result<T, ReportError>;

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

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::statistics::Bucket;

/// Logical report period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    Day,
    #[default]
    Week,
    Month,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown period: '{0}'. Supported periods: day, week, month")]
pub struct UnknownPeriodKind(pub String);

impl PeriodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    pub const ALL: [PeriodKind; 3] = [PeriodKind::Day, PeriodKind::Week, PeriodKind::Month];
}

impl fmt::Display for PeriodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PeriodKind {
    type Err = UnknownPeriodKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            _ => Err(UnknownPeriodKind(s.to_owned())),
        }
    }
}

/// A reporting period resolved into query and display bounds.
///
/// `query_end` is exclusive (local midnight after the last day) while
/// `display_end` is inclusive (one second before `query_end`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPeriod {
    pub kind: Option<PeriodKind>,
    pub query_start: DateTime<Utc>,
    pub query_end: DateTime<Utc>,
    pub display_start: DateTime<Tz>,
    pub display_end: DateTime<Tz>,
    pub bucket: Bucket,
}

impl ResolvedPeriod {
    /// Name used in file patterns; span-resolved periods have none
    pub fn kind_label(&self) -> &'static str {
        self.kind.map_or("custom", |kind| kind.as_str())
    }
}

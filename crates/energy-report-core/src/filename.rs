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

use crate::errors::{ReportError, ReportResult};

pub const DEFAULT_FILENAME_PATTERN: &str = "energy_report_{start}_{end}.pdf";

/// Values substituted into a filename pattern
#[derive(Debug, Clone, Copy)]
pub struct FilenameContext<'a> {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub period: &'a str,
}

/// Expand `{start}`, `{end}` and `{period}`; `{{` and `}}` are literal braces
pub fn expand_pattern(pattern: &str, context: &FilenameContext<'_>) -> ReportResult<String> {
    let mut out = String::with_capacity(pattern.len() + 16);
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for n in chars.by_ref() {
                    if n == '}' {
                        closed = true;
                        break;
                    }
                    name.push(n);
                }
                if !closed {
                    return Err(ReportError::InvalidFilenamePattern(format!(
                        "unclosed placeholder in '{pattern}'"
                    )));
                }
                match name.as_str() {
                    "start" => out.push_str(&context.start.to_string()),
                    "end" => out.push_str(&context.end.to_string()),
                    "period" => out.push_str(context.period),
                    other => {
                        return Err(ReportError::InvalidFilenamePattern(format!(
                            "unknown placeholder '{{{other}}}'"
                        )));
                    }
                }
            }
            '}' => {
                return Err(ReportError::InvalidFilenamePattern(format!(
                    "single '}}' in '{pattern}'"
                )));
            }
            c => out.push(c),
        }
    }

    Ok(out)
}

/// Final file name: the explicit one when non-blank, else the expanded
/// pattern. The `.pdf` suffix is always enforced.
pub fn resolve_filename(
    explicit: Option<&str>,
    pattern: &str,
    context: &FilenameContext<'_>,
) -> ReportResult<String> {
    let name = match explicit.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => name.to_owned(),
        None => {
            let expanded = expand_pattern(pattern, context)?;
            let expanded = expanded.trim();
            if expanded.is_empty() {
                return Err(ReportError::InvalidFilenamePattern(
                    "the pattern produced an empty file name".to_owned(),
                ));
            }
            expanded.to_owned()
        }
    };

    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(ReportError::InvalidFilenamePattern(format!(
            "'{name}' is not a plain file name"
        )));
    }

    if name.to_lowercase().ends_with(".pdf") {
        Ok(name)
    } else {
        Ok(format!("{name}.pdf"))
    }
}

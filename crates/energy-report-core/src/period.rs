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

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use energy_report_types::{Bucket, PeriodKind, ResolvedPeriod};

use crate::errors::{ReportError, ReportResult};

/// Resolve a logical period into query and display bounds.
///
/// Missing bounds are derived from `today` (a local date): the day itself,
/// the Monday of its week or the first of its month. The query window is
/// `[local midnight of start, local midnight after end)`.
pub fn resolve_period(
    kind: Option<PeriodKind>,
    explicit_start: Option<NaiveDate>,
    explicit_end: Option<NaiveDate>,
    timezone: Tz,
    today: NaiveDate,
) -> ReportResult<ResolvedPeriod> {
    let start_date = match (explicit_start, kind) {
        (Some(start), _) => start,
        (None, Some(PeriodKind::Day)) => today,
        (None, Some(PeriodKind::Week)) => {
            today - Duration::days(i64::from(today.weekday().num_days_from_monday()))
        }
        (None, Some(PeriodKind::Month)) => today.with_day(1).unwrap_or(today),
        (None, None) => {
            return Err(ReportError::InvalidPeriod(
                "a period type or an explicit start date is required".to_owned(),
            ));
        }
    };

    let end_date = match (explicit_end, kind) {
        (Some(end), _) => end,
        (None, Some(PeriodKind::Week)) => start_date + Duration::days(6),
        (None, Some(PeriodKind::Month)) => last_day_of_month(start_date),
        (None, Some(PeriodKind::Day) | None) => start_date,
    };

    if end_date < start_date {
        return Err(ReportError::InvalidPeriod(format!(
            "end date {end_date} is before start date {start_date}"
        )));
    }

    let display_start = local_midnight(start_date, timezone)?;
    let day_after_end = end_date
        .succ_opt()
        .ok_or_else(|| ReportError::InvalidPeriod(format!("end date {end_date} out of range")))?;
    let end_exclusive = local_midnight(day_after_end, timezone)?;
    let display_end = end_exclusive - Duration::seconds(1);

    Ok(ResolvedPeriod {
        kind,
        query_start: display_start.with_timezone(&Utc),
        query_end: end_exclusive.with_timezone(&Utc),
        display_start,
        display_end,
        bucket: select_bucket(kind, &display_start, &end_exclusive),
    })
}

/// Bucket by period type, or by span when the type is unknown
pub fn select_bucket(
    kind: Option<PeriodKind>,
    start: &DateTime<Tz>,
    end_exclusive: &DateTime<Tz>,
) -> Bucket {
    match kind {
        Some(PeriodKind::Day) => Bucket::Hour,
        Some(PeriodKind::Week | PeriodKind::Month) => Bucket::Day,
        None => {
            let span = *end_exclusive - *start;
            if span <= Duration::days(2) {
                Bucket::Hour
            } else if span <= Duration::days(35) {
                Bucket::Day
            } else {
                Bucket::Month
            }
        }
    }
}

/// Local midnight of `date`, localized through the zone rules.
///
/// Where midnight does not exist (a DST gap at 00:00) the first valid
/// instant of the day is used.
pub fn local_midnight(date: NaiveDate, timezone: Tz) -> ReportResult<DateTime<Tz>> {
    let midnight = date.and_time(NaiveTime::MIN);
    for shift in 0..=3 {
        let candidate = midnight + Duration::hours(shift);
        if let Some(local) = timezone.from_local_datetime(&candidate).earliest() {
            return Ok(local);
        }
    }

    Err(ReportError::InvalidPeriod(format!(
        "cannot localize {date} in time zone {timezone}"
    )))
}

fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };

    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .unwrap_or(date)
}

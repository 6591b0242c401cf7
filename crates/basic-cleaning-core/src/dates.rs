use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use polars::prelude::*;
use serde::Serialize;

use crate::error::Result;

static DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

// Numeric day/month ambiguity resolves month-first.
static DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%Y%m%d",
    "%d %B %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%b %d, %Y",
];

/// Parse a date-like string into a naive timestamp. Offsets are converted to UTC.
pub fn parse_date_like(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(dt.naive_utc());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(date.and_time(NaiveTime::MIN));
        }
    }

    None
}

/// How much of each timestamp the rendered column keeps, chosen once per column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePrecision {
    Day,
    Second,
    Subsecond,
}

impl DatePrecision {
    fn of(dt: &NaiveDateTime) -> Self {
        let time = dt.time();
        if time.nanosecond() != 0 {
            DatePrecision::Subsecond
        } else if time != NaiveTime::MIN {
            DatePrecision::Second
        } else {
            DatePrecision::Day
        }
    }

    fn format(&self) -> &'static str {
        match self {
            DatePrecision::Day => "%Y-%m-%d",
            DatePrecision::Second => "%Y-%m-%d %H:%M:%S",
            DatePrecision::Subsecond => "%Y-%m-%d %H:%M:%S%.f",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateStats {
    pub parsed: usize,
    pub empty: usize,
    pub unparseable: usize,
    pub precision: DatePrecision,
}

/// Rewrite `column` in place as ISO 8601 text. Empty or unparseable cells become null.
pub fn normalize_dates(df: &mut DataFrame, column: &str) -> Result<DateStats> {
    let raw = df.column(column)?.str()?;

    let mut empty = 0;
    let mut unparseable = 0;
    let parsed: Vec<Option<NaiveDateTime>> = raw
        .into_iter()
        .map(|value| match value.map(str::trim) {
            None | Some("") => {
                empty += 1;
                None
            }
            Some(text) => {
                let dt = parse_date_like(text);
                if dt.is_none() {
                    unparseable += 1;
                }
                dt
            }
        })
        .collect();

    let precision = parsed
        .iter()
        .flatten()
        .map(DatePrecision::of)
        .max()
        .unwrap_or(DatePrecision::Day);
    let fmt = precision.format();

    let rendered: Vec<Option<String>> = parsed
        .iter()
        .map(|dt| dt.map(|value| value.format(fmt).to_string()))
        .collect();
    let series = Series::new(
        column.into(),
        rendered
            .iter()
            .map(|opt| opt.as_deref())
            .collect::<Vec<Option<&str>>>(),
    );
    df.with_column(series)?;

    Ok(DateStats {
        parsed: parsed.iter().filter(|dt| dt.is_some()).count(),
        empty,
        unparseable,
        precision,
    })
}

//! Time bucketing and display helpers shared by reports and the dashboard.
//!
//! All calendar math happens in the configured reporting zone, so a report opened
//! from anywhere buckets the same entries into the same days, weeks and months.
//! Labels follow the regional (es-DO) style: `19 oct 2026`, `octubre de 2026`.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "ene", "feb", "mar", "abr", "may", "jun", "jul", "ago", "sept", "oct", "nov", "dic",
];

const MONTH_NAMES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Label of the single bucket produced by [`Granularity::Total`].
pub const TOTAL_LABEL: &str = "Total";

/// Time-bucketing unit for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Calendar day
    Day,
    /// Monday-to-Sunday week
    #[default]
    Week,
    /// Calendar month
    Month,
    /// Everything in one bucket
    Total,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Total => "total",
        };
        f.write_str(name)
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "total" => Ok(Self::Total),
            other => Err(format!("unknown granularity '{other}'")),
        }
    }
}

/// The bucket an entry falls into for a given granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Period {
    /// A single calendar day
    Day(NaiveDate),
    /// The week starting on this Monday
    Week(NaiveDate),
    /// A calendar month
    Month {
        /// Calendar year
        year: i32,
        /// Month number, 1-12
        month: u32,
    },
    /// The collapsing bucket
    Total,
}

impl Period {
    /// Buckets `timestamp` (read in `zone`) at the given granularity.
    #[must_use]
    pub fn of(timestamp: DateTime<Utc>, granularity: Granularity, zone: &FixedOffset) -> Self {
        let date = local_date(timestamp, zone);
        match granularity {
            Granularity::Day => Self::Day(date),
            Granularity::Week => Self::Week(start_of_week(date)),
            Granularity::Month => Self::Month {
                year: date.year(),
                month: date.month(),
            },
            Granularity::Total => Self::Total,
        }
    }

    /// Human-readable label used as the period column of report rows.
    #[must_use]
    pub fn label(&self) -> String {
        match *self {
            Self::Day(date) => format_date(date),
            Self::Week(monday) => {
                format!("{} – {}", format_date(monday), format_date(end_of_week(monday)))
            }
            Self::Month { year, month } => format_month(year, month),
            Self::Total => TOTAL_LABEL.to_string(),
        }
    }
}

/// Calendar date of `timestamp` in `zone`.
#[must_use]
pub fn local_date(timestamp: DateTime<Utc>, zone: &FixedOffset) -> NaiveDate {
    timestamp.with_timezone(zone).date_naive()
}

/// Monday of the week containing `date`.
#[must_use]
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Sunday of the week containing `date`.
#[must_use]
pub fn end_of_week(date: NaiveDate) -> NaiveDate {
    start_of_week(date) + Duration::days(6)
}

/// Start of the trailing seven-day (7×24h) window ending at `now`.
#[must_use]
pub fn trailing_week_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(7)
}

/// Medium date label, e.g. `19 oct 2026`.
#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    let month = MONTH_ABBREVIATIONS[date.month0() as usize];
    format!("{} {month} {}", date.day(), date.year())
}

/// Month label, e.g. `octubre de 2026`. Out-of-range months fall back to the number.
#[must_use]
pub fn format_month(year: i32, month: u32) -> String {
    let name = month
        .checked_sub(1)
        .and_then(|index| MONTH_NAMES.get(index as usize))
        .map_or_else(|| month.to_string(), |name| (*name).to_string());
    format!("{name} de {year}")
}

/// Date and time label for entry listings, e.g. `19 oct 2026, 14:05`.
#[must_use]
pub fn format_timestamp(timestamp: DateTime<Utc>, zone: &FixedOffset) -> String {
    let local = timestamp.with_timezone(zone);
    format!("{}, {}", format_date(local.date_naive()), local.format("%H:%M"))
}

/// Whole amount with thousands separators, e.g. `12,500`.
#[must_use]
pub fn format_amount(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        grouped.push('-');
    }
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

/// Inclusive calendar-date filter, evaluated in the reporting zone.
///
/// `from` includes everything from 00:00:00.000 that day, `to` everything up to
/// 23:59:59.999. A missing bound leaves that side open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateWindow {
    /// First included day
    pub from: Option<NaiveDate>,
    /// Last included day
    pub to: Option<NaiveDate>,
}

impl DateWindow {
    /// Window between two inclusive days.
    #[must_use]
    pub const fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    /// Window with no bounds at all.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self { from: None, to: None }
    }

    /// The Monday-to-Sunday week containing `now` in `zone`.
    #[must_use]
    pub fn current_week(now: DateTime<Utc>, zone: &FixedOffset) -> Self {
        let today = local_date(now, zone);
        Self::between(start_of_week(today), end_of_week(today))
    }

    /// Whether `timestamp` falls inside the window.
    #[must_use]
    pub fn contains(&self, timestamp: DateTime<Utc>, zone: &FixedOffset) -> bool {
        let date = local_date(timestamp, zone);
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }
}

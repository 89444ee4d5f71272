//! Minimal calendar math for date selection and week anchoring.
//!
//! # Responsibility
//! - Parse and render ISO `YYYY-MM-DD` keys in the caller-local calendar.
//! - Compute ISO week starts (Monday) and week day sequences.
//!
//! Locale-specific label formatting is owned by the presentation layer.

use chrono::{Datelike, Days, Local, NaiveDate, Weekday};

const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Today's date in the device-local calendar.
pub fn today_iso() -> String {
    to_iso(Local::now().date_naive())
}

/// Parses an ISO date key, rejecting anything but `YYYY-MM-DD`.
pub fn parse_iso(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, ISO_DATE_FORMAT).ok()
}

/// Monday of the week containing `date`.
pub fn iso_week_start(date: &str) -> Option<String> {
    let parsed = parse_iso(date)?;
    let days_from_monday = parsed.weekday().num_days_from_monday() as u64;
    parsed
        .checked_sub_days(Days::new(days_from_monday))
        .map(to_iso)
}

/// The seven dates of the week starting at `week_start`.
pub fn week_days(week_start: &str) -> Option<Vec<String>> {
    let start = parse_iso(week_start)?;
    (0..7)
        .map(|offset| start.checked_add_days(Days::new(offset)).map(to_iso))
        .collect()
}

/// Shifts a week anchor by `delta` whole weeks (negative shifts backward).
pub fn shift_weeks(week_start: &str, delta: i64) -> Option<String> {
    let start = parse_iso(week_start)?;
    let shifted = if delta >= 0 {
        start.checked_add_days(Days::new((delta as u64) * 7))?
    } else {
        start.checked_sub_days(Days::new(delta.unsigned_abs() * 7))?
    };
    Some(to_iso(shifted))
}

fn to_iso(date: NaiveDate) -> String {
    date.format(ISO_DATE_FORMAT).to_string()
}

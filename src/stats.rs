//! The aggregate statistics model and its text formatting.

use chrono::{Datelike as _, NaiveDate};

/// Lines-of-code totals across every counted repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocTotals {
    pub added: i64,
    pub deleted: i64,
    /// Whether the numbers came straight from the cache without a rebuild.
    pub from_cache: bool,
}

impl LocTotals {
    /// Net lines of code (added minus deleted).
    pub fn net(&self) -> i64 {
        self.added - self.deleted
    }
}

/// Everything one run renders into the templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileStats {
    /// Pre-rendered age line, e.g. `20 years, 5 months, 23 days`.
    pub age: String,
    pub commits: u64,
    pub stars: u64,
    pub repos: u64,
    pub contributed: u64,
    pub followers: u64,
    pub loc: LocTotals,
}

/// Renders the time elapsed since `birth` as `X years, Y months, Z days`,
/// with a cake on the birthday itself.
pub fn age_since(birth: NaiveDate, today: NaiveDate) -> String {
    let (years, months, days) = calendar_diff(birth, today);
    format!(
        "{} year{}, {} month{}, {} day{}{}",
        years,
        plural(years),
        months,
        plural(months),
        days,
        plural(days),
        if months == 0 && days == 0 { " 🎂" } else { "" }
    )
}

/// The difference between two dates in whole years, months and days.
fn calendar_diff(from: NaiveDate, to: NaiveDate) -> (i32, i32, i32) {
    let mut years = to.year() - from.year();
    let mut months = to.month() as i32 - from.month() as i32;
    let mut days = to.day() as i32 - from.day() as i32;

    if days < 0 {
        months -= 1;
        days += days_in_previous_month(to);
    }
    if months < 0 {
        years -= 1;
        months += 12;
    }
    (years, months, days)
}

fn days_in_previous_month(date: NaiveDate) -> i32 {
    let (year, month) = match date.month() {
        1 => (date.year() - 1, 12),
        month => (date.year(), month - 1),
    };
    let first = NaiveDate::from_ymd_opt(year, month, 1);
    let next = match month {
        12 => NaiveDate::from_ymd_opt(year + 1, 1, 1),
        month => NaiveDate::from_ymd_opt(year, month + 1, 1),
    };
    match (first, next) {
        (Some(first), Some(next)) => (next - first).num_days() as i32,
        _ => 30,
    }
}

fn plural(unit: i32) -> &'static str {
    if unit == 1 { "" } else { "s" }
}

/// Formats an integer with thousands separators, e.g. `1,234,567`.
pub fn with_commas(value: impl Into<i128>) -> String {
    let value: i128 = value.into();
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
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

//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::Context;
use chrono::{Days, Local, NaiveDate};
use regex::Regex;

/// Pre-compiled regex for relative date parsing.
static RELATIVE_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(day|week)s?\s+ago$").unwrap());

/// Conservative bound for relative dates (~100 years in days).
const MAX_RELATIVE_DAYS: u64 = 100 * 366;

/// Display layout for timestamps, matching the movement sheet.
pub const DISPLAY_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Parse a date relative to the local calendar day.
pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    parse_date_from(s, Local::now().date_naive())
}

/// Parse a date string as ISO, sheet layout, or relative to `today`.
///
/// Supports:
/// - ISO 8601: "2025-03-10"
/// - Sheet layout: "10/03/2025"
/// - Relative: "today", "3 days ago", "1 week ago"
pub fn parse_date_from(s: &str, today: NaiveDate) -> anyhow::Result<NaiveDate> {
    let s = s.trim();
    if s == "today" {
        return Ok(today);
    }
    for fmt in ["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    let Some(caps) = RELATIVE_DATE_RE.captures(s) else {
        anyhow::bail!(
            "Invalid date: {s}. Use YYYY-MM-DD, DD/MM/YYYY or relative (e.g., '7 days ago')"
        );
    };

    let n: u64 = caps[1]
        .parse()
        .context("failed to parse number in relative date")?;
    let days = match &caps[2] {
        "day" => n,
        "week" => n.saturating_mul(7),
        unit => anyhow::bail!("Unknown date unit: {unit}"),
    };

    if days > MAX_RELATIVE_DAYS {
        anyhow::bail!("Relative date too far back: {s}");
    }

    today
        .checked_sub_days(Days::new(days))
        .with_context(|| format!("date out of range: {s}"))
}

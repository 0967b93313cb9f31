use std::convert::TryFrom;

use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, NaiveDateTime, Timelike};

/// Timestamps are stored as local wall-clock ISO-8601 at second precision.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn format_timestamp(value: &NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

pub fn format_date(value: &NaiveDate) -> String {
    value.format(DATE_FORMAT).to_string()
}

pub fn truncate_to_second(value: NaiveDateTime) -> NaiveDateTime {
    value.with_nanosecond(0).unwrap_or(value)
}

pub fn parse_timestamp(value: &str, field: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .with_context(|| format!("failed to parse {field} '{value}'"))
}

pub fn parse_optional_timestamp(
    value: Option<String>,
    field: &str,
) -> Result<Option<NaiveDateTime>> {
    match value {
        Some(raw) if !raw.is_empty() => parse_timestamp(&raw, field).map(Some),
        _ => Ok(None),
    }
}

pub fn parse_date(value: &str, field: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .with_context(|| format!("failed to parse {field} '{value}'"))
}

pub fn to_u32(value: i64, field: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| anyhow!("{field} contains out-of-range value {value}"))
}

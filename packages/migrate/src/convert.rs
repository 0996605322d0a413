//! Field converters: raw legacy text -> typed destination values.
//!
//! The legacy desktop database stores everything as text, with years of
//! inconsistent hand entry on top ("Y" vs "YES" vs "1", currency strings,
//! two-digit years, zeroed-out date placeholders). Each converter maps one
//! raw cell to a typed value or to null, and reports which of the two kinds
//! of null it produced. Converters never fail and never log — they have no
//! idea which row they are looking at. The transfer orchestrator owns the
//! logging because only it knows the table/column/row context.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

/// Target type a legacy column is converted to.
///
/// `Text` means the value is carried over verbatim (reference fields like
/// work-order-number cross-references stay strings on purpose).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetType {
    Boolean,
    Date,
    DateTime,
    Integer,
    Decimal,
    Text,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Text => "text",
        }
    }
}

/// A successfully converted destination value.
#[derive(Debug, Clone, PartialEq)]
pub enum DestValue {
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Int(i32),
    Decimal(Decimal),
    Text(String),
}

/// Per-cell result of a conversion attempt.
///
/// `NullEmpty` and `NullUnrecognized` both land as SQL NULL in the
/// destination; the distinction exists so callers can log and tally the
/// unrecognized ones without branching on error types.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionOutcome {
    Converted(DestValue),
    /// Input was absent or blank.
    NullEmpty,
    /// Input was present but matched no recognized encoding.
    NullUnrecognized,
}

/// Date variant: keep time-of-day or truncate to the calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateVariant {
    Date,
    DateTime,
}

/// Numeric kind: whole number or money-style fixed point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericKind {
    Integer,
    Decimal,
}

/// Placeholder dates the legacy application wrote instead of NULL.
pub const INVALID_DATE_SENTINELS: [&str; 3] = ["0000-00-00", "00/00/00", "00/00/0000"];

const TRUTHY: [&str; 5] = ["1", "YES", "Y", "TRUE", "T"];
const FALSY: [&str; 5] = ["0", "NO", "N", "FALSE", "F"];

/// Convert a raw legacy flag to a boolean.
///
/// The legacy tables disagree on vocabulary (one table writes `1`/`0`,
/// its sibling writes `YES`/`NO`), so the union of encodings is accepted
/// everywhere. Anything outside the union is nulled rather than guessed.
pub fn convert_boolean(raw: Option<&str>) -> ConversionOutcome {
    let trimmed = match raw {
        Some(s) if !s.trim().is_empty() => s.trim().to_uppercase(),
        _ => return ConversionOutcome::NullEmpty,
    };

    if TRUTHY.contains(&trimmed.as_str()) {
        ConversionOutcome::Converted(DestValue::Bool(true))
    } else if FALSY.contains(&trimmed.as_str()) {
        ConversionOutcome::Converted(DestValue::Bool(false))
    } else {
        ConversionOutcome::NullUnrecognized
    }
}

/// Convert a raw legacy date string.
///
/// Zeroed-out sentinel dates are treated the same as blank cells. Parse
/// attempts run in a fixed order and the first success wins; the
/// `%m/%d/%y %H:%M:%S` entry is what `mdb-export` emits by default, the
/// rest cover values typed into free-text fields over the years.
pub fn convert_date(raw: Option<&str>, variant: DateVariant) -> ConversionOutcome {
    let trimmed = match raw {
        Some(s) if !s.trim().is_empty() => s.trim(),
        _ => return ConversionOutcome::NullEmpty,
    };

    if INVALID_DATE_SENTINELS.contains(&trimmed) {
        return ConversionOutcome::NullEmpty;
    }

    match parse_legacy_timestamp(trimmed) {
        Some(dt) => ConversionOutcome::Converted(match variant {
            DateVariant::Date => DestValue::Date(dt.date()),
            DateVariant::DateTime => DestValue::DateTime(dt),
        }),
        None => ConversionOutcome::NullUnrecognized,
    }
}

fn parse_legacy_timestamp(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%m/%d/%y %H:%M:%S") {
        return Some(dt);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%m/%d/%Y") {
        return d.and_hms_opt(0, 0, 0);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%m/%d/%y") {
        return d.and_hms_opt(0, 0, 0);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt);
    }
    None
}

/// Convert a raw legacy numeric string.
///
/// Currency symbols and thousands separators are stripped first, so
/// `"$1,234.56"` and `"1234.56"` convert identically. Integers are parsed
/// through f64 and truncated toward zero to tolerate values like `"5.0"`
/// that the legacy app wrote into count columns.
pub fn convert_numeric(raw: Option<&str>, kind: NumericKind) -> ConversionOutcome {
    let trimmed = match raw {
        Some(s) if !s.trim().is_empty() => s.trim(),
        _ => return ConversionOutcome::NullEmpty,
    };

    let cleaned: String = trimmed.chars().filter(|c| *c != '$' && *c != ',').collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return ConversionOutcome::NullUnrecognized;
    }

    match kind {
        NumericKind::Integer => match cleaned.parse::<f64>() {
            Ok(v) if v.is_finite() && v >= i32::MIN as f64 && v <= i32::MAX as f64 => {
                ConversionOutcome::Converted(DestValue::Int(v.trunc() as i32))
            }
            _ => ConversionOutcome::NullUnrecognized,
        },
        NumericKind::Decimal => match cleaned.parse::<Decimal>() {
            Ok(v) => ConversionOutcome::Converted(DestValue::Decimal(v.round_dp(2))),
            Err(_) => ConversionOutcome::NullUnrecognized,
        },
    }
}

/// Dispatch a raw cell through the converter for its declared target type.
pub fn convert_value(raw: Option<&str>, ty: TargetType) -> ConversionOutcome {
    match ty {
        TargetType::Boolean => convert_boolean(raw),
        TargetType::Date => convert_date(raw, DateVariant::Date),
        TargetType::DateTime => convert_date(raw, DateVariant::DateTime),
        TargetType::Integer => convert_numeric(raw, NumericKind::Integer),
        TargetType::Decimal => convert_numeric(raw, NumericKind::Decimal),
        TargetType::Text => match raw {
            Some(s) if !s.trim().is_empty() => {
                ConversionOutcome::Converted(DestValue::Text(s.trim().to_string()))
            }
            _ => ConversionOutcome::NullEmpty,
        },
    }
}

//! Typed parameter parsing: one raw token against one spec.

use chrono::NaiveDate;

use super::catalog::{ParamKind, ParamSpec};
use super::error::LedgerError;
use super::fx;
use super::sref::SRef;

/// A parsed parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Str(String),
    Decimal(f64),
    Date(NaiveDate),
    SRef(SRef),
    Uint(u64),
    Choice(&'static str),
}

fn violation(spec: &ParamSpec, reason: String) -> LedgerError {
    LedgerError::Validation {
        param: spec.name.to_string(),
        reason,
    }
}

/// Parse a raw token against a spec. Decimals are rounded to the declared
/// precision here so every downstream consumer sees canonical values.
pub fn parse(spec: &ParamSpec, raw: &str) -> Result<ParamValue, LedgerError> {
    match spec.kind {
        ParamKind::Str { max } => {
            if raw.chars().count() > max {
                return Err(violation(spec, format!("longer than {max} characters")));
            }
            Ok(ParamValue::Str(raw.to_string()))
        }
        ParamKind::Decimal { decimals, positive } => {
            let value: f64 = raw
                .parse()
                .map_err(|_| violation(spec, format!("'{raw}' is not a decimal number")))?;
            if !value.is_finite() {
                return Err(violation(spec, format!("'{raw}' is not a finite number")));
            }
            let value = fx::round_to(value, decimals);
            if positive && value <= 0.0 {
                return Err(violation(spec, "must be greater than zero".to_string()));
            }
            if !positive && value < 0.0 {
                return Err(violation(spec, "must not be negative".to_string()));
            }
            Ok(ParamValue::Decimal(value))
        }
        ParamKind::Date => {
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| violation(spec, format!("'{raw}' is not a yyyy-MM-dd date")))?;
            Ok(ParamValue::Date(date))
        }
        ParamKind::SRef => {
            let sref: SRef = raw.parse().map_err(|e| violation(spec, e))?;
            Ok(ParamValue::SRef(sref))
        }
        ParamKind::Uint { max } => {
            let value: u64 = raw
                .parse()
                .map_err(|_| violation(spec, format!("'{raw}' is not an unsigned integer")))?;
            if value >= max {
                return Err(violation(spec, format!("must be below {max}")));
            }
            Ok(ParamValue::Uint(value))
        }
        ParamKind::Choice { variants } => variants
            .iter()
            .find(|v| v.eq_ignore_ascii_case(raw))
            .map(|v| ParamValue::Choice(*v))
            .ok_or_else(|| violation(spec, format!("expected one of {}", variants.join(", ")))),
    }
}

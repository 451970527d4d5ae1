//! Scientific Field Parsing
//!
//! Reference data for Martian regions and candidate crops arrives as
//! loosely-formatted text ("6.2–6.8", "4.5895°S", "~0.5 wt%"). This module
//! normalizes those strings into numeric values the matcher can compare.
//!
//! Absence of a number is a normal outcome, never an error: every function
//! here degrades to `Unresolved`/`None` on malformed input so the scoring
//! loop has no failure path.

use regex::Regex;
use std::sync::OnceLock;

/// Outcome of extracting a single numeric value from free text.
///
/// An explicit two-state result rather than a bare `Option<f64>` so the
/// "no signal" branch is visible at every call site in the matcher.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Resolved(f64),
    Unresolved,
}

impl Scalar {
    pub fn value(self) -> Option<f64> {
        match self {
            Scalar::Resolved(v) => Some(v),
            Scalar::Unresolved => None,
        }
    }

    pub fn is_resolved(self) -> bool {
        matches!(self, Scalar::Resolved(_))
    }
}

impl From<Option<f64>> for Scalar {
    fn from(v: Option<f64>) -> Self {
        match v {
            Some(v) => Scalar::Resolved(v),
            None => Scalar::Unresolved,
        }
    }
}

/// A parsed numeric range with inclusive bounds.
///
/// `(None, None)` means the source text was empty, "unknown", or contained
/// no numeric token. The matcher treats that as a neutral no-signal case,
/// never as zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ParsedRange {
    pub const UNRESOLVED: ParsedRange = ParsedRange { min: None, max: None };

    pub fn is_resolved(&self) -> bool {
        self.min.is_some() && self.max.is_some()
    }

    /// Inclusive containment check. Always false on an unresolved range.
    pub fn contains(&self, value: f64) -> bool {
        match (self.min, self.max) {
            (Some(lo), Some(hi)) => lo <= value && value <= hi,
            _ => false,
        }
    }
}

fn range_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Hyphen or en-dash separator, optional whitespace
    RE.get_or_init(|| Regex::new(r"(\d+\.?\d*)\s*[–-]\s*(\d+\.?\d*)").unwrap())
}

fn decimal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+\.?\d*").unwrap())
}

fn signed_decimal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-?\d+\.?\d*").unwrap())
}

fn hemisphere_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+\.?\d*)°\s*([NS])").unwrap())
}

/// Extract the first unsigned decimal number from text.
pub fn first_decimal(text: &str) -> Option<f64> {
    decimal_re()
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Extract the first decimal number from text, accepting a leading minus.
pub fn first_signed_decimal(text: &str) -> Option<f64> {
    signed_decimal_re()
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Parse a range string like "6.2–6.8" or "5.0-7.0".
///
/// A lone number is widened to a synthetic ±0.5 range around the point
/// estimate. Empty text, the literal "unknown", or text with no numeric
/// token all come back unresolved.
pub fn parse_range(text: &str) -> ParsedRange {
    let text = text.trim();
    if text.is_empty() || text.eq_ignore_ascii_case("unknown") {
        return ParsedRange::UNRESOLVED;
    }

    if let Some(caps) = range_re().captures(text) {
        let lo = caps[1].parse::<f64>().ok();
        let hi = caps[2].parse::<f64>().ok();
        if let (Some(lo), Some(hi)) = (lo, hi) {
            return ParsedRange {
                min: Some(lo),
                max: Some(hi),
            };
        }
    }

    if let Some(value) = first_decimal(text) {
        return ParsedRange {
            min: Some(value - 0.5),
            max: Some(value + 0.5),
        };
    }

    ParsedRange::UNRESOLVED
}

/// Parse a latitude string like "4.5895°S" or "68°N".
///
/// The hemisphere letter is case-sensitive: S negates the magnitude, N keeps
/// it positive. Plain signed decimals ("-12.3") are accepted as a fallback.
pub fn parse_latitude(text: &str) -> Scalar {
    let text = text.trim();
    if text.is_empty() {
        return Scalar::Unresolved;
    }

    if let Some(caps) = hemisphere_re().captures(text) {
        if let Ok(value) = caps[1].parse::<f64>() {
            let signed = if &caps[2] == "S" { -value } else { value };
            return Scalar::Resolved(signed);
        }
    }

    first_signed_decimal(text).into()
}

/// Parse a pH scalar from free text like "7.2" or "~8.5 (alkaline)".
///
/// Historically this shared the latitude parser; it keeps the same
/// degree-format-first behavior, then falls back to the first unsigned
/// decimal found anywhere in the string.
pub fn parse_ph_scalar(text: &str) -> Scalar {
    let text = text.trim();
    if text.is_empty() {
        return Scalar::Unresolved;
    }

    match parse_latitude(text) {
        Scalar::Resolved(v) => Scalar::Resolved(v),
        Scalar::Unresolved => first_decimal(text).into(),
    }
}

//! Number formats and threshold flags shared by the xlsx and console renderers.

use serde::Deserialize;
use ssfmt::{FormatOptions, NumberFormat};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueFormat {
    #[default]
    Number,
    Percent,
    Ratio,
    Decimal,
}

impl ValueFormat {
    /// Excel number format code.
    pub fn code(&self) -> &'static str {
        match self {
            ValueFormat::Number => "#,##0",
            ValueFormat::Percent => "0.0%",
            ValueFormat::Ratio => "0.00\"x\"",
            ValueFormat::Decimal => "#,##0.00",
        }
    }

    /// Render `value` through this format's code.
    pub fn render(&self, value: f64) -> String {
        match NumberFormat::parse(self.code()) {
            Ok(fmt) => fmt.format(value, &FormatOptions::default()),
            Err(_) => value.to_string(),
        }
    }
}

/// Three-band classification of an output value.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Thresholds {
    pub good: f64,
    pub bad: f64,
    /// Lower is better.
    #[serde(default)]
    pub invert: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Good,
    Warning,
    Bad,
    Unknown,
}

impl Thresholds {
    pub fn classify(&self, value: f64) -> Flag {
        if !value.is_finite() {
            return Flag::Unknown;
        }
        if self.invert {
            if value <= self.good {
                Flag::Good
            } else if value > self.bad {
                Flag::Bad
            } else {
                Flag::Warning
            }
        } else if value >= self.good {
            Flag::Good
        } else if value < self.bad {
            Flag::Bad
        } else {
            Flag::Warning
        }
    }
}

/// Flag a possibly non-numeric value against optional thresholds.
pub fn flag(value: Option<f64>, thresholds: Option<&Thresholds>) -> Flag {
    match (value, thresholds) {
        (Some(v), Some(t)) => t.classify(v),
        _ => Flag::Unknown,
    }
}

impl Flag {
    pub fn glyph(&self) -> &'static str {
        match self {
            Flag::Good => "🟢",
            Flag::Warning => "🟡",
            Flag::Bad => "🔴",
            Flag::Unknown => "⚪",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.glyph())
    }
}

//! Duration unit normalization.
//!
//! Raw listening times are milliseconds. For display they are rescaled into
//! a human unit chosen by magnitude: minutes, then hours past 60 minutes,
//! then days past 24 hours. Each threshold is checked once, top-down, so a
//! value never escalates more than one step per rule.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Display unit for a listening duration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeUnit {
    /// The starting unit; also the fallback when there is no data.
    #[default]
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Minutes => "Minutes",
            Self::Hours => "Hours",
            Self::Days => "Days",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A duration rescaled for display: the value formatted to two decimal
/// places, and the unit it is expressed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScaledDuration {
    pub value: String,
    pub unit: TimeUnit,
}

impl fmt::Display for ScaledDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// Chooses the display unit for a duration by magnitude and formats it.
///
/// Zero and negative inputs still format ("-1" is a caller-side sentinel
/// for "no maximum found"; guard before calling if that case matters).
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn pick_unit(total_ms: i64) -> ScaledDuration {
    let mut value = total_ms as f64 / 60_000.0;
    let mut unit = TimeUnit::Minutes;
    if value > 60.0 {
        value /= 60.0;
        unit = TimeUnit::Hours;
        if value > 24.0 {
            value /= 24.0;
            unit = TimeUnit::Days;
        }
    }
    ScaledDuration {
        value: format!("{value:.2}"),
        unit,
    }
}

/// Re-expresses a duration in a unit chosen elsewhere.
///
/// Used to render every bucket of a chart in the single unit picked for
/// the dominant bucket, even when individual magnitudes would each pick
/// a different unit on their own.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn scale_to_unit(total_ms: i64, unit: TimeUnit) -> f64 {
    let minutes = total_ms as f64 / 60_000.0;
    match unit {
        TimeUnit::Minutes => minutes,
        TimeUnit::Hours => minutes / 60.0,
        TimeUnit::Days => minutes / (60.0 * 24.0),
    }
}

/// [`scale_to_unit`] formatted to two decimal places.
#[must_use]
pub fn format_in_unit(total_ms: i64, unit: TimeUnit) -> String {
    format!("{:.2}", scale_to_unit(total_ms, unit))
}

//! Annual rainfall classification bands.
//!
//! An annual total falls into exactly one band:
//!
//!   total <  medium_min_mm                  → Low
//!   medium_min_mm <= total <= high_above_mm → Medium
//!   total >  high_above_mm                  → High
//!
//! Both boundaries belong to Medium; `> high_above_mm` is the only strict
//! comparison.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::RainfallError;

/// Lower bound of the Medium band, in mm per year.
pub const DEFAULT_MEDIUM_MIN_MM: f64 = 1500.0;

/// Totals strictly above this are High, in mm per year.
pub const DEFAULT_HIGH_ABOVE_MM: f64 = 2500.0;

/// Rainfall bands, in ascending order of wetness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RainfallClass {
    Low,
    Medium,
    High,
}

impl RainfallClass {
    pub const ALL: [RainfallClass; 3] = [RainfallClass::Low, RainfallClass::Medium, RainfallClass::High];
}

impl fmt::Display for RainfallClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RainfallClass::Low => write!(f, "Low"),
            RainfallClass::Medium => write!(f, "Medium"),
            RainfallClass::High => write!(f, "High"),
        }
    }
}

/// Band thresholds for annual totals, in mm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassificationBands {
    #[serde(default = "default_medium_min_mm")]
    pub medium_min_mm: f64,
    #[serde(default = "default_high_above_mm")]
    pub high_above_mm: f64,
}

fn default_medium_min_mm() -> f64 {
    DEFAULT_MEDIUM_MIN_MM
}
fn default_high_above_mm() -> f64 {
    DEFAULT_HIGH_ABOVE_MM
}

impl Default for ClassificationBands {
    fn default() -> Self {
        Self {
            medium_min_mm: DEFAULT_MEDIUM_MIN_MM,
            high_above_mm: DEFAULT_HIGH_ABOVE_MM,
        }
    }
}

impl ClassificationBands {
    /// Checks that both thresholds are finite and ordered.
    pub fn validate(&self) -> Result<(), RainfallError> {
        if !self.medium_min_mm.is_finite() || !self.high_above_mm.is_finite() {
            return Err(RainfallError::Config {
                reason: "classification thresholds must be finite numbers".to_string(),
            });
        }
        if self.medium_min_mm > self.high_above_mm {
            return Err(RainfallError::Config {
                reason: format!(
                    "medium_min_mm ({}) must not exceed high_above_mm ({})",
                    self.medium_min_mm, self.high_above_mm
                ),
            });
        }
        Ok(())
    }

    /// Band for an annual total.
    pub fn classify(&self, total_mm: f64) -> RainfallClass {
        if total_mm > self.high_above_mm {
            RainfallClass::High
        } else if total_mm >= self.medium_min_mm {
            RainfallClass::Medium
        } else {
            RainfallClass::Low
        }
    }
}

/// Band for an annual total using the default thresholds.
pub fn classify(total_mm: f64) -> RainfallClass {
    ClassificationBands::default().classify(total_mm)
}

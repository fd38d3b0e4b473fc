use serde::{Deserialize, Serialize};

use crate::error::PlagueError;

/// The three rates driving a run. They are fixed for the lifetime of a model.
///
/// No validation happens on construction or deserialization: rates outside `[0, 1]` are the
/// caller's responsibility, and a large `transmission_rate` simply makes every trial succeed.
/// Use [`ModelParameters::checked`] for a strict variant.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ModelParameters {
    /// Fraction of a city's current infected that newly infect someone in the city each step.
    pub infection_rate: f64,
    /// Fraction of a city's current infected that die each step.
    pub mortality_rate: f64,
    /// Per-route trial probability for each infected person in the origin city.
    pub transmission_rate: f64,
}

impl Default for ModelParameters {
    fn default() -> Self {
        ModelParameters {
            infection_rate: 0.2,
            mortality_rate: 0.2,
            transmission_rate: 0.1,
        }
    }
}

impl From<(f64, f64, f64)> for ModelParameters {
    fn from((infection_rate, mortality_rate, transmission_rate): (f64, f64, f64)) -> Self {
        ModelParameters {
            infection_rate,
            mortality_rate,
            transmission_rate,
        }
    }
}

impl ModelParameters {
    /// Returns the parameters unchanged if every rate lies in `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` naming the first rate out of range.
    pub fn checked(self) -> Result<Self, PlagueError> {
        for (name, rate) in [
            ("infection_rate", self.infection_rate),
            ("mortality_rate", self.mortality_rate),
            ("transmission_rate", self.transmission_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(PlagueError::InvalidParameter(format!(
                    "{name} must be in [0, 1], got {rate}"
                )));
            }
        }
        Ok(self)
    }
}

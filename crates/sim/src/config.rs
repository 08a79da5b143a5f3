use thiserror::Error;

/// Reactivity and feedback coefficients, fixed for the lifetime of a run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicsConstants {
    /// Reactivity inserted by withdrawing the bank over its full travel.
    pub rod_worth: f64,
    /// Temperature feedback per degree C above the reference temperature.
    /// Must be negative; this is what lets the core settle at all.
    pub temp_coeff: f64,
    /// Primary-to-secondary heat transfer scaler. Read by nothing yet; kept
    /// so saved constant sets stay loadable when the secondary loop grows
    /// inertia. Only required to be finite until then.
    pub heat_transfer: f64,
    /// Scales net reactivity into the per-tick relative power change.
    pub response_time: f64,
}

impl Default for PhysicsConstants {
    fn default() -> Self {
        Self {
            rod_worth: 0.015,
            temp_coeff: -0.0002,
            heat_transfer: 1.0,
            response_time: 0.1,
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConstantsError {
    #[error("{name} must be positive and finite, got {value}")]
    NotPositive { name: &'static str, value: f64 },
    #[error("{name} must be finite, got {value}")]
    NotFinite { name: &'static str, value: f64 },
    #[error("temp_coeff must be negative, got {0}; positive feedback drives power to the clamp")]
    TempCoeffNotNegative(f64),
}

impl PhysicsConstants {
    /// Reject constant sets the stepper would turn into runaways or NaNs.
    /// Callers are expected to do this once, before stepping.
    pub fn validate(&self) -> Result<(), ConstantsError> {
        let positives = [
            ("rod_worth", self.rod_worth),
            ("response_time", self.response_time),
        ];
        for (name, value) in positives {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConstantsError::NotPositive { name, value });
            }
        }
        // The reserved scaler feeds nothing, so any finite value is fine.
        if !self.heat_transfer.is_finite() {
            return Err(ConstantsError::NotFinite {
                name: "heat_transfer",
                value: self.heat_transfer,
            });
        }
        if !self.temp_coeff.is_finite() || self.temp_coeff >= 0.0 {
            return Err(ConstantsError::TempCoeffNotNegative(self.temp_coeff));
        }
        Ok(())
    }
}

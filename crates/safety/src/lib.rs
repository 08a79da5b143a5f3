//! Reactor protection limits and the latching trip monitor. The monitor only
//! decides *whether* to trip; acting on it (scram flags, rod insertion) is
//! the caller's job.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TripReason {
    Manual,
    OverPower,
    OverTemp,
    LowRcsPressure,
    HighRcsPressure,
    SensorInvalid,
}

#[derive(Clone, Copy, Debug)]
pub struct SafetyLimits {
    pub trip_power_pct: f64,
    pub trip_core_temp_c: f64,
    pub low_rcs_pressure_mpa: f64,
    pub high_rcs_pressure_mpa: f64,
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            trip_power_pct: 118.0,
            trip_core_temp_c: 345.0,
            low_rcs_pressure_mpa: 13.0,
            high_rcs_pressure_mpa: 16.2,
        }
    }
}

/// The process variables the protection system watches.
#[derive(Clone, Copy, Debug)]
pub struct PlantSample {
    pub power_pct: f64,
    pub core_temp_c: f64,
    pub rcs_pressure_mpa: f64,
}

/// Latching trip logic: the first limit violation wins and stays the recorded
/// cause until an operator clears it.
#[derive(Clone, Copy, Debug, Default)]
pub struct TripMonitor {
    latched: Option<TripReason>,
}

impl TripMonitor {
    pub fn is_latched(&self) -> bool {
        self.latched.is_some()
    }

    pub fn reason(&self) -> Option<TripReason> {
        self.latched
    }

    /// Check one sample against the limits. Returns the newly latched reason
    /// on the evaluation that trips; returns `None` both before and after,
    /// so a caller can treat `Some` as the trip edge.
    pub fn evaluate(&mut self, limits: &SafetyLimits, sample: &PlantSample) -> Option<TripReason> {
        if self.latched.is_some() {
            return None;
        }
        let reason = check(limits, sample)?;
        self.latched = Some(reason);
        Some(reason)
    }

    /// Latch an externally demanded trip (operator scram button). Keeps an
    /// earlier cause if one is already latched.
    pub fn demand(&mut self, reason: TripReason) {
        if self.latched.is_none() {
            self.latched = Some(reason);
        }
    }

    pub fn clear(&mut self) {
        self.latched = None;
    }
}

fn check(limits: &SafetyLimits, sample: &PlantSample) -> Option<TripReason> {
    let readings = [
        sample.power_pct,
        sample.core_temp_c,
        sample.rcs_pressure_mpa,
    ];
    if readings.iter().any(|v| !v.is_finite()) {
        return Some(TripReason::SensorInvalid);
    }
    if sample.power_pct >= limits.trip_power_pct {
        return Some(TripReason::OverPower);
    }
    if sample.core_temp_c >= limits.trip_core_temp_c {
        return Some(TripReason::OverTemp);
    }
    if sample.rcs_pressure_mpa <= limits.low_rcs_pressure_mpa {
        return Some(TripReason::LowRcsPressure);
    }
    if sample.rcs_pressure_mpa >= limits.high_rcs_pressure_mpa {
        return Some(TripReason::HighRcsPressure);
    }
    None
}

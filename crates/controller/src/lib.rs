//! Rod drive control: the automatic power regulator and the rate-limited
//! actuators behind scram insertion and manual hold-to-move. Everything here
//! deals in whole rod steps; fractional travel is carried between calls so
//! slow rates still move the bank across short frames.

/// Direction for manual continuous rod motion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RodDirection {
    Withdraw,
    Insert,
}

impl RodDirection {
    /// Sign convention: withdrawing increases the step count.
    pub fn sign(self) -> i32 {
        match self {
            RodDirection::Withdraw => 1,
            RodDirection::Insert => -1,
        }
    }
}

/// Constant-rate rod drive. Used for the scram insertion run and for
/// hold-to-move buttons; the caller supplies the direction.
#[derive(Clone, Copy, Debug)]
pub struct RodActuator {
    pub steps_per_s: f64,
    carry: f64,
}

impl RodActuator {
    pub fn new(steps_per_s: f64) -> Self {
        Self {
            steps_per_s,
            carry: 0.0,
        }
    }

    /// Whole steps of travel earned by `dt_s` at the configured rate.
    /// Fractional travel is kept for the next call.
    pub fn advance(&mut self, dt_s: f64) -> u32 {
        self.carry += self.steps_per_s * dt_s.max(0.0);
        let whole = self.carry.floor();
        self.carry -= whole;
        whole as u32
    }

    pub fn reset(&mut self) {
        self.carry = 0.0;
    }
}

/// Proportional, rate-limited rod regulator for AUTO mode.
///
/// Commands signed whole steps toward the power setpoint: positive withdraws,
/// negative inserts. Inside the deadband it commands nothing and drops any
/// carried fraction, so the bank parks instead of twitching.
#[derive(Clone, Copy, Debug)]
pub struct AutoRegulator {
    /// Power the regulator holds, percent of rated.
    pub setpoint_pct: f64,
    /// Half-width of the no-motion band around the setpoint.
    pub deadband_pct: f64,
    /// Step rate per percent of power error.
    pub gain: f64,
    /// Saturation on the commanded rate. Sized so the startup transient from
    /// a fully mismatched bank position turns around below the overpower trip.
    pub max_steps_per_s: f64,
    carry: f64,
}

impl Default for AutoRegulator {
    fn default() -> Self {
        Self {
            setpoint_pct: 100.0,
            deadband_pct: 0.5,
            gain: 0.5,
            max_steps_per_s: 6.0,
            carry: 0.0,
        }
    }
}

impl AutoRegulator {
    pub fn with_setpoint(setpoint_pct: f64) -> Self {
        Self {
            setpoint_pct,
            ..Self::default()
        }
    }

    /// Signed whole steps to move this frame given the current power reading.
    pub fn command(&mut self, power_pct: f64, dt_s: f64) -> i32 {
        let error = self.setpoint_pct - power_pct;
        if error.abs() <= self.deadband_pct {
            self.carry = 0.0;
            return 0;
        }
        let rate = (self.gain * error).clamp(-self.max_steps_per_s, self.max_steps_per_s);
        self.carry += rate * dt_s.max(0.0);
        let whole = self.carry.trunc();
        self.carry -= whole;
        whole as i32
    }

    pub fn reset(&mut self) {
        self.carry = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actuator_carries_fractional_travel() {
        let mut drive = RodActuator::new(10.0);
        // Half a step per call: one whole step every second call, no bursts.
        let mut total = 0;
        for _ in 0..20 {
            let steps = drive.advance(0.05);
            assert!(steps <= 1);
            total += steps;
        }
        assert_eq!(total, 10);
    }

    #[test]
    fn actuator_ignores_negative_dt() {
        let mut drive = RodActuator::new(76.0);
        assert_eq!(drive.advance(-1.0), 0);
        assert_eq!(drive.advance(3.0), 228);
    }

    #[test]
    fn regulator_parks_inside_deadband() {
        let mut reg = AutoRegulator::default();
        assert_eq!(reg.command(100.0, 0.1), 0);
        assert_eq!(reg.command(100.4, 0.1), 0);
        assert_eq!(reg.command(99.6, 0.1), 0);
    }

    #[test]
    fn regulator_inserts_when_power_is_high() {
        let mut reg = AutoRegulator::default();
        // 16% over setpoint saturates the rate at 6 steps/s.
        let mut moved = 0;
        for _ in 0..10 {
            moved += reg.command(116.0, 0.1);
        }
        assert_eq!(moved, -6);
    }

    #[test]
    fn regulator_withdraws_when_power_is_low() {
        let mut reg = AutoRegulator::default();
        let mut moved = 0;
        // 2% under setpoint commands 1 step/s; 2 seconds of travel.
        for _ in 0..4 {
            moved += reg.command(98.0, 0.5);
        }
        assert_eq!(moved, 2);
    }

    #[test]
    fn deadband_entry_drops_the_carry() {
        let mut reg = AutoRegulator::default();
        reg.command(98.0, 0.5); // accumulates half a step
        reg.command(100.0, 0.1); // inside the band
        // Carry was dropped, so motion restarts from zero.
        assert_eq!(reg.command(98.0, 0.5), 0);
        assert_eq!(reg.command(98.0, 0.5), 1);
    }
}

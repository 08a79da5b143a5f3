//! One interactive run of the plant.
//!
//! The session owns the state, quantizes wall time into fixed physics ticks,
//! arbitrates who moves the rods (auto regulator, manual hold, scram
//! insertion), runs the protection check between ticks, and keeps a bounded
//! sample history for trend plots. Front ends call `advance` once per frame
//! with the frame's wall-clock delta and issue commands between frames.

mod history;

pub use history::History;

use controller::{AutoRegulator, RodActuator, RodDirection};
use safety::{PlantSample, SafetyLimits, TripMonitor, TripReason};
use sim::{
    step, ConstantsError, NoiseSource, PhysicsConstants, ReactorState, RodMode, NOMINAL_TICK_S,
};

/// Scram insertion rate: full travel in three seconds.
pub const SCRAM_STEPS_PER_S: f64 = 76.0;
/// Hold-to-move rate for the manual rod buttons.
pub const MANUAL_STEPS_PER_S: f64 = 10.0;
/// Ticks a single `advance` call may execute. A display coming back from a
/// long suspend catches up over several frames instead of stalling on one.
pub const MAX_TICKS_PER_ADVANCE: u64 = 1000;

const DEFAULT_SAMPLE_EVERY: u32 = 6;
const DEFAULT_HISTORY_CAP: usize = 4096;

pub struct Session {
    state: ReactorState,
    constants: PhysicsConstants,
    limits: SafetyLimits,
    regulator: AutoRegulator,
    monitor: TripMonitor,
    scram_drive: RodActuator,
    hold_drive: RodActuator,
    hold: Option<RodDirection>,
    noise: Box<dyn NoiseSource>,
    tick_s: f64,
    sample_every: u32,
    ticks_since_sample: u32,
    carry_s: f64,
    history: History,
}

impl Session {
    /// Start a run from cold defaults. Constants are checked once here so the
    /// stepper never sees a set that would run away or go non-finite.
    pub fn new(
        constants: PhysicsConstants,
        limits: SafetyLimits,
        noise: Box<dyn NoiseSource>,
    ) -> Result<Self, ConstantsError> {
        constants.validate()?;
        Ok(Self {
            state: ReactorState::default(),
            constants,
            limits,
            regulator: AutoRegulator::default(),
            monitor: TripMonitor::default(),
            scram_drive: RodActuator::new(SCRAM_STEPS_PER_S),
            hold_drive: RodActuator::new(MANUAL_STEPS_PER_S),
            hold: None,
            noise,
            tick_s: NOMINAL_TICK_S,
            sample_every: DEFAULT_SAMPLE_EVERY,
            ticks_since_sample: 0,
            carry_s: 0.0,
            history: History::with_capacity(DEFAULT_HISTORY_CAP),
        })
    }

    pub fn state(&self) -> &ReactorState {
        &self.state
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn constants(&self) -> &PhysicsConstants {
        &self.constants
    }

    pub fn limits(&self) -> &SafetyLimits {
        &self.limits
    }

    pub fn trip_reason(&self) -> Option<TripReason> {
        self.monitor.reason()
    }

    pub fn setpoint_pct(&self) -> f64 {
        self.regulator.setpoint_pct
    }

    pub fn tick_s(&self) -> f64 {
        self.tick_s
    }

    pub fn set_tick_s(&mut self, tick_s: f64) {
        self.tick_s = tick_s.max(0.001);
    }

    pub fn set_sample_every(&mut self, ticks: u32) {
        self.sample_every = ticks.max(1);
    }

    pub fn set_setpoint(&mut self, setpoint_pct: f64) {
        self.regulator.setpoint_pct = setpoint_pct.clamp(5.0, 110.0);
    }

    /// Switch between AUTO and MANUAL rod control. Ignored while tripped;
    /// SCRAM is only ever entered through a trip.
    pub fn set_rod_mode(&mut self, mode: RodMode) {
        if self.state.is_scram || mode == RodMode::Scram || mode == self.state.rod_mode {
            return;
        }
        self.hold = None;
        self.hold_drive.reset();
        self.regulator.reset();
        self.state.rod_mode = mode;
        log::debug!("rod mode -> {mode:?}");
    }

    /// One-shot rod jog, applied immediately. Travel limits clamp.
    pub fn nudge_rods(&mut self, steps: i32) {
        if self.state.is_scram {
            return;
        }
        self.state.move_rods(steps);
    }

    /// Begin continuous rod motion; keeps moving until released.
    pub fn hold_rods(&mut self, direction: RodDirection) {
        if self.state.is_scram {
            return;
        }
        if self.hold != Some(direction) {
            self.hold_drive.reset();
            self.hold = Some(direction);
        }
    }

    pub fn release_rods(&mut self) {
        self.hold = None;
        self.hold_drive.reset();
    }

    /// Operator scram button. Latches `Manual` unless the protection system
    /// got there first.
    pub fn scram(&mut self) {
        if self.state.is_scram {
            return;
        }
        self.monitor.demand(TripReason::Manual);
        log::warn!("manual scram at t={:.1}s", self.state.time_s);
        self.begin_scram();
    }

    /// Clear a trip: re-arms the protection system and returns rod control to
    /// AUTO. Process variables recover through ordinary stepping. No-op when
    /// not tripped.
    pub fn reset(&mut self) {
        if !self.state.is_scram {
            return;
        }
        self.monitor.clear();
        self.regulator.reset();
        self.state.reset_scram();
        log::info!(
            "trip reset at t={:.1}s, rods at {} steps",
            self.state.time_s,
            self.state.rod_position
        );
    }

    /// Feed one frame of wall time. Rod drives run on the full frame delta so
    /// motion stays smooth between ticks; physics then runs in whole fixed
    /// ticks, protection check first, with leftover time carried to the next
    /// frame. Returns the number of ticks executed.
    pub fn advance(&mut self, wall_dt_s: f64) -> u32 {
        self.drive_rods(wall_dt_s);

        self.carry_s += wall_dt_s.max(0.0);
        let ticks = ((self.carry_s / self.tick_s).floor() as u64).min(MAX_TICKS_PER_ADVANCE);
        self.carry_s -= ticks as f64 * self.tick_s;

        for _ in 0..ticks {
            self.check_protection();
            step(&mut self.state, &self.constants, self.tick_s, self.noise.as_mut());
            self.ticks_since_sample += 1;
            if self.ticks_since_sample >= self.sample_every {
                self.ticks_since_sample = 0;
                self.history.push(self.state);
            }
        }
        ticks as u32
    }

    fn drive_rods(&mut self, dt_s: f64) {
        let travel = u32::from(sim::ROD_STEPS_FULL_OUT);
        if self.state.is_scram {
            if self.state.rod_position > 0 {
                let steps = self.scram_drive.advance(dt_s).min(travel);
                self.state.move_rods(-(steps as i32));
            }
            return;
        }
        match self.state.rod_mode {
            RodMode::Auto => {
                let steps = self.regulator.command(self.state.power_pct, dt_s);
                if steps != 0 {
                    self.state.move_rods(steps);
                }
            }
            RodMode::Manual => {
                if let Some(direction) = self.hold {
                    let steps = self.hold_drive.advance(dt_s).min(travel);
                    if steps > 0 {
                        self.state.move_rods(direction.sign() * steps as i32);
                    }
                }
            }
            // Unreachable outside a trip; reset always leaves AUTO.
            RodMode::Scram => {}
        }
    }

    fn check_protection(&mut self) {
        if self.state.is_scram {
            return;
        }
        let sample = PlantSample {
            power_pct: self.state.power_pct,
            core_temp_c: self.state.core_temp_c,
            rcs_pressure_mpa: self.state.rcs_pressure_mpa,
        };
        if let Some(reason) = self.monitor.evaluate(&self.limits, &sample) {
            log::warn!("reactor trip: {reason:?} at t={:.1}s", self.state.time_s);
            self.begin_scram();
        }
    }

    fn begin_scram(&mut self) {
        self.hold = None;
        self.hold_drive.reset();
        self.scram_drive.reset();
        self.state.scram();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim::Midpoint;

    fn quiet_session() -> Session {
        Session::new(
            PhysicsConstants::default(),
            SafetyLimits::default(),
            Box::new(Midpoint),
        )
        .expect("default constants validate")
    }

    #[test]
    fn wall_time_quantizes_into_whole_ticks_with_carry() {
        let mut s = quiet_session();
        assert_eq!(s.advance(0.25), 2);
        assert_eq!(s.advance(0.0), 0);
        // The carried 0.05 s plus 0.06 s crosses one tick.
        assert_eq!(s.advance(0.06), 1);
        assert_eq!(s.advance(0.35), 3);
    }

    #[test]
    fn one_advance_is_capped_and_the_backlog_drains_later() {
        let mut s = quiet_session();
        assert_eq!(s.advance(500.0), 1000);
        assert_eq!(s.advance(1.0), 1000);
    }

    #[test]
    fn history_samples_on_the_slow_cadence() {
        let mut s = quiet_session();
        s.advance(0.65); // 6 ticks
        assert_eq!(s.history().len(), 1);
        s.advance(0.65);
        assert_eq!(s.history().len(), 2);
    }

    #[test]
    fn protection_trips_between_ticks_and_the_tick_runs_tripped() {
        let limits = SafetyLimits {
            trip_power_pct: 99.0,
            ..SafetyLimits::default()
        };
        let mut s = Session::new(PhysicsConstants::default(), limits, Box::new(Midpoint))
            .expect("default constants validate");

        assert_eq!(s.advance(0.15), 1);
        assert_eq!(s.trip_reason(), Some(safety::TripReason::OverPower));
        assert!(s.state().is_scram);
        assert!(!s.state().is_online);
        // The tick after the trip already ran the cooldown branch.
        assert_eq!(s.state().power_pct, 98.0);
    }

    #[test]
    fn scram_drive_runs_the_bank_fully_in_within_three_seconds() {
        let mut s = quiet_session();
        s.scram();
        s.advance(1.0);
        assert_eq!(s.state().rod_position, 149);
        s.advance(1.0);
        s.advance(1.0);
        assert!(s.state().rods_full_in());
    }

    #[test]
    fn manual_hold_moves_at_the_hold_rate() {
        let mut s = quiet_session();
        s.set_rod_mode(RodMode::Manual);
        s.hold_rods(RodDirection::Insert);
        s.advance(1.05);
        assert_eq!(s.state().rod_position, 215);
        s.release_rods();
        s.advance(1.0);
        assert_eq!(s.state().rod_position, 215);
    }

    #[test]
    fn reset_clears_the_latch_and_returns_to_auto() {
        let mut s = quiet_session();
        s.scram();
        s.advance(0.5);
        assert!(s.state().is_scram);
        assert_eq!(s.trip_reason(), Some(safety::TripReason::Manual));

        s.reset();
        assert_eq!(s.trip_reason(), None);
        assert!(s.state().is_online);
        assert_eq!(s.state().rod_mode, RodMode::Auto);

        // Second reset is a no-op.
        let power = s.state().power_pct;
        s.reset();
        assert_eq!(s.state().power_pct, power);
    }

    #[test]
    fn commands_are_ignored_while_tripped() {
        let mut s = quiet_session();
        s.scram();
        let rods = s.state().rod_position;
        s.nudge_rods(10);
        assert_eq!(s.state().rod_position, rods);
        s.set_rod_mode(RodMode::Manual);
        assert_eq!(s.state().rod_mode, RodMode::Scram);
    }
}

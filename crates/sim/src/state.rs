/// Rod travel span in steps. 0 is fully inserted, 228 fully withdrawn.
pub const ROD_STEPS_FULL_OUT: u16 = 228;

/// Who moves the control rods.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RodMode {
    Auto,
    Manual,
    Scram,
}

/// Full plant readout for one instant. Plain data: the stepper rewrites the
/// process variables each tick, everything else changes only through the
/// methods below.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReactorState {
    pub time_s: f64,
    /// Percent of rated power, held in 0..=120 by the stepper.
    pub power_pct: f64,
    /// Control rod bank position in steps, 0..=ROD_STEPS_FULL_OUT.
    pub rod_position: u16,
    pub core_temp_c: f64,
    pub rcs_pressure_mpa: f64,
    /// Always tracks `rcs_pressure_mpa` after a step.
    pub przr_pressure_mpa: f64,
    pub przr_level_pct: f64,
    pub neutron_flux_pct: f64,
    pub sg_pressure_mpa: f64,
    pub sg_temp_c: f64,
    pub sg_flow_kg_s: f64,
    pub steam_flow_kg_s: f64,
    pub turbine_power_mwe: f64,
    pub thermal_power_mwt: f64,
    /// Condenser vacuum, kPa gauge (negative).
    pub condenser_vac_kpa: f64,
    pub is_online: bool,
    pub is_scram: bool,
    pub rod_mode: RodMode,
}

impl Default for ReactorState {
    fn default() -> Self {
        Self {
            time_s: 0.0,
            power_pct: 100.0,
            rod_position: 225,
            core_temp_c: 315.0,
            rcs_pressure_mpa: 15.4,
            przr_pressure_mpa: 15.4,
            przr_level_pct: 60.0,
            neutron_flux_pct: 98.0,
            sg_pressure_mpa: 6.8,
            sg_temp_c: 284.0,
            sg_flow_kg_s: 1500.0,
            steam_flow_kg_s: 1500.0,
            turbine_power_mwe: 980.0,
            thermal_power_mwt: 2850.0,
            condenser_vac_kpa: -95.0,
            is_online: true,
            is_scram: false,
            rod_mode: RodMode::Auto,
        }
    }
}

impl ReactorState {
    /// Rod withdrawal as a fraction of full travel.
    pub fn rod_withdrawal(&self) -> f64 {
        f64::from(self.rod_position) / f64::from(ROD_STEPS_FULL_OUT)
    }

    pub fn rods_full_in(&self) -> bool {
        self.rod_position == 0
    }

    /// Move the rod bank by a signed number of steps, clamped to travel limits.
    pub fn move_rods(&mut self, steps: i32) {
        let target = i64::from(self.rod_position) + i64::from(steps);
        self.rod_position = target.clamp(0, i64::from(ROD_STEPS_FULL_OUT)) as u16;
    }

    /// Latch the tripped condition. Idempotent; touches no process variable.
    pub fn scram(&mut self) {
        if self.is_scram {
            return;
        }
        self.is_scram = true;
        self.is_online = false;
        self.rod_mode = RodMode::Scram;
    }

    /// Clear a trip and return rod control to automatic. Process variables and
    /// rod position are left wherever the cooldown put them; recovery happens
    /// through ordinary stepping. No-op when not tripped.
    pub fn reset_scram(&mut self) {
        if !self.is_scram {
            return;
        }
        self.is_scram = false;
        self.is_online = true;
        self.rod_mode = RodMode::Auto;
    }
}

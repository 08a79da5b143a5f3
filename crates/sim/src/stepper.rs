use crate::config::PhysicsConstants;
use crate::noise::NoiseSource;
use crate::state::ReactorState;

/// Tick the per-tick coefficients below are tuned for. Callers that drive the
/// model from wall time quantize into whole ticks of this length.
pub const NOMINAL_TICK_S: f64 = 0.1;

/// Power indication ceiling, percent of rated.
pub const POWER_MAX_PCT: f64 = 120.0;
/// Core thermal output per percent of rated power.
pub const HEAT_RATE_MWT_PER_PCT: f64 = 28.5;

// Post-trip decay multipliers and the floors the decays park at.
const TRIP_FLUX_DECAY: f64 = 0.95;
const TRIP_FLUX_FLOOR_PCT: f64 = 0.1;
const TRIP_POWER_DECAY: f64 = 0.98;
const TRIP_POWER_FLOOR_PCT: f64 = 1.0;
const TRIP_COOLDOWN_C_PER_TICK: f64 = 0.5;
const TRIP_CORE_TEMP_FLOOR_C: f64 = 150.0;
const TRIP_THERMAL_FLOOR_MWT: f64 = 50.0;
const TRIP_STEAM_DECAY: f64 = 0.95;
const TRIP_TURBINE_DECAY: f64 = 0.96;
const TRIP_VAC_RECOVERY_KPA_PER_TICK: f64 = 0.5;
const TRIP_VAC_CEILING_KPA: f64 = -50.0;

// At-power tracking targets and first-order lag gains.
const FLUX_PER_PCT: f64 = 0.98;
const FLUX_JITTER_PCT: f64 = 0.2;
const CORE_TEMP_BASE_C: f64 = 280.0;
const CORE_TEMP_PER_PCT: f64 = 0.5;
const CORE_TEMP_LAG: f64 = 0.1;
const REF_TEMP_C: f64 = 300.0;
const RCS_PRESSURE_BASE_MPA: f64 = 15.0;
const RCS_PRESSURE_PER_C: f64 = 0.02;
const RCS_PRESSURE_LAG: f64 = 0.05;

// Secondary loop is memoryless: re-derived from power every tick.
const SG_PRESSURE_BASE_MPA: f64 = 4.9;
const SG_PRESSURE_PER_PCT: f64 = 0.019;
const SG_PRESSURE_JITTER_MPA: f64 = 0.05;
const SG_TEMP_BASE_C: f64 = 218.0;
const SG_TEMP_PER_PCT: f64 = 0.66;
const SG_FLOW_PER_PCT: f64 = 15.0;
const SG_FLOW_JITTER_KG_S: f64 = 2.0;
const STEAM_FLOW_PER_PCT: f64 = 15.0;
const TURBINE_MWE_PER_PCT: f64 = 9.8;
const COND_VAC_BASE_KPA: f64 = -89.0;
const COND_VAC_PER_PCT: f64 = 0.06;
const PRZR_LEVEL_BASE_PCT: f64 = 44.0;
const PRZR_LEVEL_PER_PCT: f64 = 0.16;

// Instrument-style display jitter applied after either branch.
const SG_PRESSURE_DISPLAY_JITTER_MPA: f64 = 0.01;
const CORE_TEMP_DISPLAY_JITTER_C: f64 = 0.15;

/// Advance the plant by one tick.
///
/// Branches purely on `state.is_scram`, then layers display jitter on top.
/// Mutates `state` in place and returns it for chaining; the only other
/// effect is consuming samples from `noise`. `dt_s` advances the clock and
/// nothing else: the coefficients assume [`NOMINAL_TICK_S`] and are not
/// rescaled for other tick lengths.
pub fn step<'a>(
    state: &'a mut ReactorState,
    constants: &PhysicsConstants,
    dt_s: f64,
    noise: &mut dyn NoiseSource,
) -> &'a mut ReactorState {
    if state.is_scram {
        step_tripped(state);
    } else {
        step_at_power(state, constants, noise);
    }

    state.sg_pressure_mpa += noise.jitter(SG_PRESSURE_DISPLAY_JITTER_MPA);
    state.core_temp_c += noise.jitter(CORE_TEMP_DISPLAY_JITTER_C);
    if state.is_scram {
        // The cooldown floor binds even against display jitter.
        state.core_temp_c = state.core_temp_c.max(TRIP_CORE_TEMP_FLOOR_C);
    }

    state.time_s += dt_s;
    state
}

/// Post-trip coastdown: everything decays toward its shutdown floor, primary
/// pressure stays frozen where the trip left it.
fn step_tripped(state: &mut ReactorState) {
    state.neutron_flux_pct = (state.neutron_flux_pct * TRIP_FLUX_DECAY).max(TRIP_FLUX_FLOOR_PCT);
    state.power_pct = (state.power_pct * TRIP_POWER_DECAY).max(TRIP_POWER_FLOOR_PCT);
    state.core_temp_c =
        (state.core_temp_c - TRIP_COOLDOWN_C_PER_TICK).max(TRIP_CORE_TEMP_FLOOR_C);
    state.thermal_power_mwt =
        (state.power_pct * HEAT_RATE_MWT_PER_PCT).max(TRIP_THERMAL_FLOOR_MWT);
    state.steam_flow_kg_s = (state.steam_flow_kg_s * TRIP_STEAM_DECAY).max(0.0);
    state.turbine_power_mwe = (state.turbine_power_mwe * TRIP_TURBINE_DECAY).max(0.0);
    state.condenser_vac_kpa =
        (state.condenser_vac_kpa + TRIP_VAC_RECOVERY_KPA_PER_TICK).min(TRIP_VAC_CEILING_KPA);
    state.przr_pressure_mpa = state.rcs_pressure_mpa;
}

fn step_at_power(state: &mut ReactorState, k: &PhysicsConstants, noise: &mut dyn NoiseSource) {
    let rod_reactivity = state.rod_withdrawal() * k.rod_worth;
    let temp_feedback = (state.core_temp_c - REF_TEMP_C) * k.temp_coeff;
    let net_reactivity = rod_reactivity + temp_feedback;

    // Reactivity acts on current power, so growth is multiplicative.
    let power_change = net_reactivity * state.power_pct * k.response_time;
    state.power_pct = (state.power_pct + power_change).clamp(0.0, POWER_MAX_PCT);

    state.neutron_flux_pct = state.power_pct * FLUX_PER_PCT + noise.jitter(FLUX_JITTER_PCT);

    let temp_target = CORE_TEMP_BASE_C + state.power_pct * CORE_TEMP_PER_PCT;
    state.core_temp_c += (temp_target - state.core_temp_c) * CORE_TEMP_LAG;

    state.thermal_power_mwt = state.power_pct * HEAT_RATE_MWT_PER_PCT;

    let pressure_target =
        RCS_PRESSURE_BASE_MPA + (state.core_temp_c - REF_TEMP_C) * RCS_PRESSURE_PER_C;
    state.rcs_pressure_mpa += (pressure_target - state.rcs_pressure_mpa) * RCS_PRESSURE_LAG;
    state.przr_pressure_mpa = state.rcs_pressure_mpa;

    let p = state.power_pct;
    state.sg_pressure_mpa =
        SG_PRESSURE_BASE_MPA + p * SG_PRESSURE_PER_PCT + noise.jitter(SG_PRESSURE_JITTER_MPA);
    state.sg_temp_c = SG_TEMP_BASE_C + p * SG_TEMP_PER_PCT;
    state.sg_flow_kg_s = p * SG_FLOW_PER_PCT + noise.jitter(SG_FLOW_JITTER_KG_S);
    state.steam_flow_kg_s = p * STEAM_FLOW_PER_PCT;
    state.turbine_power_mwe = p * TURBINE_MWE_PER_PCT;
    state.condenser_vac_kpa = COND_VAC_BASE_KPA - p * COND_VAC_PER_PCT;
    state.przr_level_pct = PRZR_LEVEL_BASE_PCT + p * PRZR_LEVEL_PER_PCT;
}

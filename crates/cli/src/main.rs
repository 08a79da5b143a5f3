use anyhow::Result;
use clap::{Parser, ValueEnum};
use controller::RodDirection;
use safety::SafetyLimits;
use session::Session;
use sim::{PhysicsConstants, PrngNoise, RodMode};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Scenario {
    /// AUTO regulator rides out the startup mismatch and holds the setpoint.
    Steady,
    /// Operator holds the withdraw button in MANUAL until protection trips.
    Withdrawal,
    /// Manual scram partway through, then the coastdown.
    Scram,
    /// Tripped from the first tick; nothing but decay curves.
    Cooldown,
}

#[derive(Parser, Debug)]
#[command(
    name = "pwr-sim",
    version,
    about = "Lumped-parameter PWR trainer: scripted scenarios, JSONL trace on stdout"
)]
struct Args {
    #[arg(value_enum, long, default_value = "steady")]
    scenario: Scenario,

    /// Total simulated time in seconds
    #[arg(long, default_value_t = 120.0)]
    seconds: f64,

    /// Physics tick in milliseconds
    #[arg(long, default_value_t = 100)]
    tick_ms: u64,

    /// Emit a trace row every N ticks
    #[arg(long, default_value_t = 6)]
    sample_every: u32,

    /// Power setpoint for the AUTO regulator (% rated)
    #[arg(long, default_value_t = 100.0)]
    setpoint: f64,

    /// Overpower trip limit (% rated)
    #[arg(long, default_value_t = 118.0)]
    trip_power: f64,

    /// Core overtemperature trip limit (°C)
    #[arg(long, default_value_t = 345.0)]
    trip_temp: f64,

    /// When the scram scenario pushes the button (seconds)
    #[arg(long, default_value_t = 30.0)]
    scram_at: f64,

    /// Rod worth over full travel (reactivity)
    #[arg(long, default_value_t = 0.015)]
    rod_worth: f64,

    /// Temperature feedback coefficient (per °C, negative)
    #[arg(long, default_value_t = -0.0002, allow_negative_numbers = true)]
    temp_coeff: f64,

    /// Reactivity-to-power response scaling
    #[arg(long, default_value_t = 0.1)]
    response_time: f64,

    /// RNG seed for deterministic runs
    #[arg(long, default_value_t = 12345)]
    seed: u64,
}

#[derive(serde::Serialize)]
struct TraceRow {
    t_s: f64,
    power_pct: f64,
    rod_steps: u16,
    core_temp_c: f64,
    rcs_mpa: f64,
    przr_mpa: f64,
    przr_level_pct: f64,
    flux_pct: f64,
    sg_mpa: f64,
    sg_temp_c: f64,
    sg_flow_kg_s: f64,
    steam_flow_kg_s: f64,
    turbine_mwe: f64,
    thermal_mwt: f64,
    cond_vac_kpa: f64,
    online: bool,
    scram: bool,
    mode: String,
    reason: Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let constants = PhysicsConstants {
        rod_worth: args.rod_worth,
        temp_coeff: args.temp_coeff,
        response_time: args.response_time,
        ..PhysicsConstants::default()
    };
    let limits = SafetyLimits {
        trip_power_pct: args.trip_power,
        trip_core_temp_c: args.trip_temp,
        ..SafetyLimits::default()
    };

    // Bad constants are a CLI error, not twenty minutes of runaway trace.
    let mut session = Session::new(constants, limits, Box::new(PrngNoise::seeded(args.seed)))?;
    session.set_setpoint(args.setpoint);
    session.set_sample_every(args.sample_every);
    let tick_s = (args.tick_ms.max(1) as f64) / 1000.0;
    session.set_tick_s(tick_s);

    match args.scenario {
        Scenario::Steady => {}
        Scenario::Withdrawal => {
            session.set_rod_mode(RodMode::Manual);
            session.hold_rods(RodDirection::Withdraw);
        }
        Scenario::Scram => {}
        Scenario::Cooldown => session.scram(),
    }

    let total_ticks = (args.seconds / tick_s).ceil() as u64;
    for k in 0..total_ticks {
        if matches!(args.scenario, Scenario::Scram)
            && !session.state().is_scram
            && session.state().time_s >= args.scram_at
        {
            session.scram();
        }

        session.advance(tick_s);

        if (k + 1) % u64::from(args.sample_every.max(1)) == 0 {
            let row = trace_row(&session);
            println!("{}", serde_json::to_string(&row)?);
        }
    }

    let end = session.state();
    log::info!(
        "{:?} finished at t={:.1}s: power {:.1}%, rods {} steps, scram={}",
        args.scenario,
        end.time_s,
        end.power_pct,
        end.rod_position,
        end.is_scram
    );

    Ok(())
}

fn trace_row(session: &Session) -> TraceRow {
    let s = session.state();
    TraceRow {
        t_s: s.time_s,
        power_pct: s.power_pct,
        rod_steps: s.rod_position,
        core_temp_c: s.core_temp_c,
        rcs_mpa: s.rcs_pressure_mpa,
        przr_mpa: s.przr_pressure_mpa,
        przr_level_pct: s.przr_level_pct,
        flux_pct: s.neutron_flux_pct,
        sg_mpa: s.sg_pressure_mpa,
        sg_temp_c: s.sg_temp_c,
        sg_flow_kg_s: s.sg_flow_kg_s,
        steam_flow_kg_s: s.steam_flow_kg_s,
        turbine_mwe: s.turbine_power_mwe,
        thermal_mwt: s.thermal_power_mwt,
        cond_vac_kpa: s.condenser_vac_kpa,
        online: s.is_online,
        scram: s.is_scram,
        mode: format!("{:?}", s.rod_mode),
        reason: session.trip_reason().map(|r| format!("{r:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::Args;
    use clap::Parser;

    #[test]
    fn temp_coeff_takes_a_space_separated_negative_value() {
        let args =
            Args::try_parse_from(["pwr-sim", "--temp-coeff", "-0.0003"]).expect("args parse");
        assert_eq!(args.temp_coeff, -0.0003);

        let defaults = Args::try_parse_from(["pwr-sim"]).expect("defaults parse");
        assert_eq!(defaults.temp_coeff, -0.0002);
    }
}

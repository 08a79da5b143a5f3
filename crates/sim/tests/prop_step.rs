//! Property tests for the stepper: bounds and couplings that must hold for
//! any plant state the display could ever be showing.

use proptest::prelude::*;

use sim::{step, PhysicsConstants, PrngNoise, ReactorState, NOMINAL_TICK_S, POWER_MAX_PCT};

prop_compose! {
    fn arb_state()(
        power_pct in 0.0f64..=120.0,
        rod_position in 0u16..=228,
        core_temp_c in 140.0f64..=400.0,
        rcs_pressure_mpa in 10.0f64..=17.0,
        neutron_flux_pct in 0.0f64..=120.0,
        steam_flow_kg_s in 0.0f64..=2000.0,
        turbine_power_mwe in 0.0f64..=1200.0,
        condenser_vac_kpa in -100.0f64..=-50.0,
        is_scram in any::<bool>(),
    ) -> ReactorState {
        let mut s = ReactorState {
            power_pct,
            rod_position,
            core_temp_c,
            rcs_pressure_mpa,
            przr_pressure_mpa: rcs_pressure_mpa,
            neutron_flux_pct,
            steam_flow_kg_s,
            turbine_power_mwe,
            condenser_vac_kpa,
            ..ReactorState::default()
        };
        if is_scram {
            s.scram();
        }
        s
    }
}

proptest! {
    #[test]
    fn power_stays_in_indication_range(mut s in arb_state(), seed in any::<u64>()) {
        let k = PhysicsConstants::default();
        let mut noise = PrngNoise::seeded(seed);
        for _ in 0..20 {
            step(&mut s, &k, NOMINAL_TICK_S, &mut noise);
            prop_assert!(s.power_pct >= 0.0 && s.power_pct <= POWER_MAX_PCT);
        }
    }

    #[test]
    fn tripped_floors_hold_for_any_state(mut s in arb_state(), seed in any::<u64>()) {
        s.scram();
        let k = PhysicsConstants::default();
        let mut noise = PrngNoise::seeded(seed);
        for _ in 0..20 {
            step(&mut s, &k, NOMINAL_TICK_S, &mut noise);
            prop_assert!(s.power_pct >= 1.0);
            prop_assert!(s.neutron_flux_pct >= 0.1);
            prop_assert!(s.core_temp_c >= 150.0);
            prop_assert!(s.thermal_power_mwt >= 50.0);
            prop_assert!(s.steam_flow_kg_s >= 0.0);
            prop_assert!(s.turbine_power_mwe >= 0.0);
            prop_assert!(s.condenser_vac_kpa <= -50.0);
        }
    }

    #[test]
    fn pressurizer_tracks_rcs_pressure(mut s in arb_state(), seed in any::<u64>()) {
        let k = PhysicsConstants::default();
        let mut noise = PrngNoise::seeded(seed);
        for _ in 0..20 {
            step(&mut s, &k, NOMINAL_TICK_S, &mut noise);
            prop_assert_eq!(s.przr_pressure_mpa.to_bits(), s.rcs_pressure_mpa.to_bits());
        }
    }

    #[test]
    fn stepping_never_produces_non_finite_values(mut s in arb_state(), seed in any::<u64>()) {
        let k = PhysicsConstants::default();
        let mut noise = PrngNoise::seeded(seed);
        for _ in 0..50 {
            step(&mut s, &k, NOMINAL_TICK_S, &mut noise);
        }
        prop_assert!(s.power_pct.is_finite());
        prop_assert!(s.core_temp_c.is_finite());
        prop_assert!(s.rcs_pressure_mpa.is_finite());
        prop_assert!(s.sg_pressure_mpa.is_finite());
        prop_assert!(s.turbine_power_mwe.is_finite());
    }

    #[test]
    fn clock_advances_by_dt_each_tick(mut s in arb_state(), ticks in 1u32..200) {
        let k = PhysicsConstants::default();
        let mut noise = PrngNoise::seeded(0);
        for _ in 0..ticks {
            step(&mut s, &k, NOMINAL_TICK_S, &mut noise);
        }
        let expected = f64::from(ticks) * NOMINAL_TICK_S;
        prop_assert!((s.time_s - expected).abs() < 1e-9);
    }
}

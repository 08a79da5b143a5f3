//! Lumped-parameter PWR primary/secondary model for a training display.
//!
//! Fixed-tick reactivity arithmetic with temperature feedback on the primary
//! side and a memoryless power-indexed map on the secondary side. Not a
//! safety analysis tool: coefficients are tuned so the panel reads plausibly
//! and transients resolve on classroom timescales.

pub mod config;
pub mod noise;
pub mod state;
pub mod stepper;

pub use config::{ConstantsError, PhysicsConstants};
pub use noise::{Midpoint, NoiseSource, PrngNoise};
pub use state::{ReactorState, RodMode, ROD_STEPS_FULL_OUT};
pub use stepper::{step, HEAT_RATE_MWT_PER_PCT, NOMINAL_TICK_S, POWER_MAX_PCT};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform sample source behind every stochastic term in the model.
///
/// The stepper shapes raw uniforms into centered jitter by arithmetic, so a
/// run is reproducible from the seed alone, and swapping in [`Midpoint`]
/// zeroes every jitter term without touching the physics.
pub trait NoiseSource {
    /// Next sample in `[0, 1)`.
    fn uniform(&mut self) -> f64;

    /// Centered jitter in `[-amplitude, amplitude)`, zero at the midpoint.
    fn jitter(&mut self, amplitude: f64) -> f64 {
        (self.uniform() - 0.5) * 2.0 * amplitude
    }
}

/// Seedable PRNG source used for live runs.
#[derive(Clone, Debug)]
pub struct PrngNoise {
    rng: StdRng,
}

impl PrngNoise {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl NoiseSource for PrngNoise {
    fn uniform(&mut self) -> f64 {
        self.rng.gen()
    }
}

/// Returns 0.5 forever. Every jitter term becomes exactly zero, which makes
/// single-step arithmetic checkable to the bit.
#[derive(Clone, Copy, Debug, Default)]
pub struct Midpoint;

impl NoiseSource for Midpoint {
    fn uniform(&mut self) -> f64 {
        0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midpoint_jitter_is_exactly_zero() {
        let mut n = Midpoint;
        assert_eq!(n.jitter(0.2), 0.0);
        assert_eq!(n.jitter(2.0), 0.0);
    }

    #[test]
    fn jitter_stays_inside_amplitude() {
        let mut n = PrngNoise::seeded(42);
        for _ in 0..10_000 {
            let j = n.jitter(0.05);
            assert!(j >= -0.05 && j < 0.05, "jitter {j} out of range");
        }
    }

    #[test]
    fn entropy_seeded_source_samples_the_unit_interval() {
        let mut n = PrngNoise::from_entropy();
        for _ in 0..1_000 {
            let u = n.uniform();
            assert!(u >= 0.0 && u < 1.0, "uniform {u} out of range");
        }
    }

    #[test]
    fn same_seed_same_stream() {
        let mut a = PrngNoise::seeded(7);
        let mut b = PrngNoise::seeded(7);
        for _ in 0..100 {
            assert_eq!(a.uniform().to_bits(), b.uniform().to_bits());
        }
    }
}

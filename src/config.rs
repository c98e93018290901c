//! Tuning knobs shared by the resolvers.
//!
//! Mirrors the teacher crate's `SolverConfig` pattern: a plain, serializable
//! struct with named presets, rather than per-call magic numbers.

use serde::{Deserialize, Serialize};

/// Resolver tuning constants that are not already part of a resolver's
/// per-call arguments in the specification (delta, growthTol, maximize,
/// numSamples all remain explicit call arguments).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolverOptions {
    /// Initial parameter step size for the linear adaptive resolver.
    pub initial_stepsize: f64,

    /// Multiplicative growth applied to the step size after an accepted step.
    pub step_growth: f64,

    /// Multiplicative shrink applied to the step size during the line search.
    pub step_shrink: f64,

    /// Multiplier defining how tight the solver's tolerance is held during
    /// adaptive stepping, relative to the caller's tolerance (`tol0 * this`).
    pub tolerance_tighten: f64,

    /// Base additive term in the roadmap's `k-nearest-neighbor` formula:
    /// `k = floor(log(samples_so_far + 2)) + neighbor_base`.
    pub neighbor_base: usize,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            initial_stepsize: 0.1,
            step_growth: 1.5,
            step_shrink: 0.5,
            tolerance_tighten: 0.1,
            neighbor_base: 2,
        }
    }
}

impl ResolverOptions {
    /// Fewer, larger steps; accepts a looser effective tolerance band.
    pub fn fast() -> Self {
        Self {
            initial_stepsize: 0.2,
            step_growth: 2.0,
            ..Default::default()
        }
    }

    /// Smaller initial step, slower growth; favors precision over speed.
    pub fn precise() -> Self {
        Self {
            initial_stepsize: 0.05,
            step_growth: 1.2,
            step_shrink: 0.25,
            ..Default::default()
        }
    }

    /// Load resolver options from a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        let data = std::fs::read_to_string(path)?;
        serde_json::from_str(&data)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_constants() {
        let opts = ResolverOptions::default();
        assert_eq!(opts.initial_stepsize, 0.1);
        assert_eq!(opts.step_growth, 1.5);
        assert_eq!(opts.step_shrink, 0.5);
    }

    #[test]
    fn presets_round_trip_through_json() {
        let opts = ResolverOptions::precise();
        let json = serde_json::to_string(&opts).unwrap();
        let back: ResolverOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(opts, back);
    }
}

//! Population based stochastic optimisers for bounded black-box functions.
//!
//! Seven engines share one harness:
//! - Differential Evolution ([`DE`]) and its self-adaptive variant ([`SADE`])
//! - Simulated Annealing with independent chains ([`SA`])
//! - Particle Swarm ([`PSO`]) and Quantum Particle Swarm ([`QPSO`])
//! - Krill Herd ([`KrillHerd`])
//! - Grenade Explosion Method ([`GrenadeExplosion`])
//!
//! Every optimiser is built from an objective, a box of `(low, high)` pairs
//! and a possibly partial map of hyperparameters overriding the engine's
//! defaults. An invocation performs `nruns` independent runs, merges all
//! final members, sorts them by score and returns either the full record or
//! the best vectors. Every returned vector lies strictly inside the box.
//!
//! ```no_run
//! use metaopt::{DE, Hypers, RunOptions};
//! use ndarray::Array1;
//!
//! let sphere = |x: &Array1<f64>| x.iter().map(|v| v * v).sum::<f64>();
//! let de = DE::new(sphere, &[(-5.0, 5.0); 3], Hypers::new().with("N", 20))?;
//! let out = de.call(&RunOptions::new().nruns(2).full_output(true))?;
//! # Ok::<(), metaopt::OptimError>(())
//! ```

use ndarray::Array1;

pub mod bounds;
pub mod engine;
pub mod error;
pub mod harness;
pub mod hypers;
pub mod objective;
pub mod parallel;
pub mod population;
pub mod report;

pub mod distinct_indices;
pub mod mutation;

pub mod de;
pub mod grenade_explosion;
pub mod krill_herd;
pub mod pso;
pub mod qpso;
pub mod sa;
pub mod sade;

pub use bounds::{BoundaryPolicy, Bounds};
pub use engine::{CommonParams, Engine, SearchContext};
pub use error::{OptimError, Result};
pub use harness::{Optimiser, RunOptions};
pub use hypers::{HyperValue, Hypers};
pub use mutation::{Crossover, Mutation};
pub use objective::{Evaluator, Fallible, Objective};
pub use parallel::ParallelConfig;
pub use population::{Init, Population};
pub use report::{FullOutput, RunOutput};

pub use de::DifferentialEvolution;
pub use grenade_explosion::GrenadeExplosionMethod;
pub use krill_herd::KrillHerdSwarm;
pub use pso::ParticleSwarm;
pub use qpso::QuantumParticleSwarm;
pub use sa::SimulatedAnnealing;
pub use sade::SelfAdaptiveDifferentialEvolution;

pub type DE<F> = Optimiser<DifferentialEvolution, F>;
pub type SADE<F> = Optimiser<SelfAdaptiveDifferentialEvolution, F>;
pub type SA<F> = Optimiser<SimulatedAnnealing, F>;
pub type PSO<F> = Optimiser<ParticleSwarm, F>;
pub type QPSO<F> = Optimiser<QuantumParticleSwarm, F>;
pub type KrillHerd<F> = Optimiser<KrillHerdSwarm, F>;
pub type GrenadeExplosion<F> = Optimiser<GrenadeExplosionMethod, F>;

/// Display names of every engine, in the order above
pub const OPTIMISER_NAMES: [&str; 7] = [
    DifferentialEvolution::NAME,
    SelfAdaptiveDifferentialEvolution::NAME,
    SimulatedAnnealing::NAME,
    ParticleSwarm::NAME,
    QuantumParticleSwarm::NAME,
    KrillHerdSwarm::NAME,
    GrenadeExplosionMethod::NAME,
];

pub(crate) fn argmin(v: &Array1<f64>) -> (usize, f64) {
    let mut best_i = 0usize;
    let mut best_v = v[0];
    for (i, &val) in v.iter().enumerate() {
        if val < best_v {
            best_v = val;
            best_i = i;
        }
    }
    (best_i, best_v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmin_first_of_ties() {
        let v = Array1::from(vec![3.0, -1.0, 2.0, -1.0]);
        assert_eq!(argmin(&v), (1, -1.0));
    }

    #[test]
    fn test_names_are_distinct() {
        let mut names = OPTIMISER_NAMES.to_vec();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 7);
    }
}

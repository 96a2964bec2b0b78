//! Quantum-behaved Particle Swarm Optimisation.
//!
//! Particles carry no velocity. Each coordinate is redrawn around a random
//! local attractor between the personal and the global best, with a spread
//! proportional to the distance to the mean of the personal bests.

use ndarray::{Array1, Array2, Axis};
use rand::Rng;
use rand::rngs::StdRng;

use crate::engine::{CommonParams, Engine, SearchContext, progress};
use crate::error::Result;
use crate::hypers::{Hypers, schedule};
use crate::objective::{Evaluator, Objective};
use crate::population::Population;

/// Quantum PSO parameters
#[derive(Debug, Clone, Copy)]
pub struct QuantumParticleSwarm {
    pub npop: usize,
    pub generations: usize,
    /// Contraction-expansion coefficient, from start to end of the run
    pub alpha: (f64, f64),
    pub common: CommonParams,
}

impl Default for QuantumParticleSwarm {
    fn default() -> Self {
        Self { npop: 100, generations: 200, alpha: (1.0, 0.5), common: CommonParams::default() }
    }
}

#[derive(Debug, Clone)]
pub struct QuantumSwarm {
    positions: Array2<f64>,
    personal: Population,
}

impl QuantumParticleSwarm {
    /// New coordinate around the attractor `p`
    fn sample_coord<R: Rng + ?Sized>(alpha: f64, p: f64, mean_best: f64, x: f64, rng: &mut R) -> f64 {
        // u in (0, 1] keeps the logarithm finite
        let u = 1.0 - rng.random::<f64>();
        let spread = alpha * (mean_best - x).abs() * (1.0 / u).ln();
        if rng.random::<bool>() { p + spread } else { p - spread }
    }
}

impl Engine for QuantumParticleSwarm {
    const NAME: &'static str = "Quantum Particle Swarm Optimisation";
    type State = QuantumSwarm;

    fn hyper_defaults() -> Hypers {
        let d = Self::default();
        CommonParams::add_defaults(
            Hypers::new().with("N", d.npop).with("G", d.generations).with("alpha", d.alpha),
        )
    }

    fn from_hypers(hypers: &Hypers) -> Result<Self> {
        Ok(Self {
            npop: hypers.usize_at_least("N", 1)?,
            generations: hypers.usize("G")?,
            alpha: hypers.pair_positive("alpha")?,
            common: CommonParams::from_hypers(hypers)?,
        })
    }

    fn population_size(&self) -> usize {
        self.npop
    }

    fn generations(&self) -> usize {
        self.generations
    }

    fn initialise<F: Objective + ?Sized>(
        &self,
        ctx: &SearchContext<'_>,
        eval: &mut Evaluator<'_, F>,
        rng: &mut StdRng,
    ) -> Result<QuantumSwarm> {
        let positions = self.common.init.sample(self.npop, ctx.bounds, ctx.initial_guess, rng);
        let scores = eval.evaluate_rows(&positions)?;
        Ok(QuantumSwarm { personal: Population::new(positions.clone(), scores), positions })
    }

    fn evolve<F: Objective + ?Sized>(
        &self,
        swarm: &mut QuantumSwarm,
        generation: usize,
        ctx: &SearchContext<'_>,
        eval: &mut Evaluator<'_, F>,
        rng: &mut StdRng,
    ) -> Result<()> {
        let alpha = schedule(self.alpha, progress(generation, self.generations));
        let (leader, _) = swarm.personal.best();
        let gbest = swarm.personal.solutions.row(leader).to_owned();
        let mean_best: Array1<f64> = swarm
            .personal
            .solutions
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(ctx.bounds.dim()));

        for i in 0..self.npop {
            let mut x = swarm.positions.row(i).to_owned();
            for j in 0..x.len() {
                let phi: f64 = rng.random();
                let p = phi * swarm.personal.solutions[(i, j)] + (1.0 - phi) * gbest[j];
                x[j] = Self::sample_coord(alpha, p, mean_best[j], x[j], rng);
            }
            self.common.bounding.apply(&mut x, ctx.bounds, rng);
            swarm.positions.row_mut(i).assign(&x);
        }
        let scores = eval.evaluate_rows(&swarm.positions)?;
        for i in 0..self.npop {
            if scores[i] <= swarm.personal.scores[i] {
                swarm.personal.solutions.row_mut(i).assign(&swarm.positions.row(i));
                swarm.personal.scores[i] = scores[i];
            }
        }
        log::trace!("QPSO gen {:4}  alpha={:.3}  best_f={:.6e}", generation, alpha, swarm.personal.best().1);
        Ok(())
    }

    fn harvest(&self, swarm: QuantumSwarm) -> Population {
        swarm.personal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::Optimiser;
    use rand::SeedableRng;

    fn sphere(x: &Array1<f64>) -> f64 {
        x.iter().map(|&v| v * v).sum()
    }

    #[test]
    fn test_collapsed_swarm_stays_put() {
        // no spread once every particle sits on the mean best
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..100 {
            let v = QuantumParticleSwarm::sample_coord(1.0, 0.3, 0.7, 0.7, &mut rng);
            assert_eq!(v, 0.3);
        }
        let spread: Vec<f64> =
            (0..200).map(|_| QuantumParticleSwarm::sample_coord(1.0, 0.0, 1.0, 0.0, &mut rng)).collect();
        assert!(spread.iter().any(|&v| v > 0.0) && spread.iter().any(|&v| v < 0.0));
        assert!(spread.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_no_nq_hyper() {
        let h = QuantumParticleSwarm::hyper_defaults();
        assert_eq!(h.pair("alpha").unwrap(), (1.0, 0.5));
        assert!(!h.contains_key("Nq"));
        let bad = h.overlay(&Hypers::new().with("alpha", (1.0, 0.0)));
        assert!(QuantumParticleSwarm::from_hypers(&bad).is_err());
    }

    #[test]
    fn test_converges_on_sphere() {
        let bounds = vec![(-5.0, 5.0); 3];
        let opt = Optimiser::<QuantumParticleSwarm, _>::new(sphere, &bounds, Hypers::new().with("N", 20).with("G", 100))
            .unwrap()
            .with_seed(13);
        let out = opt.full_output(1).unwrap();
        assert_eq!(out.nfe, 101 * 20);
        assert!(out.scores[0] < 0.1, "best {}", out.scores[0]);
    }
}

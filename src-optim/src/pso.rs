//! Particle Swarm Optimisation with linearly decaying inertia.

use ndarray::{Array1, Array2, Zip};
use rand::Rng;
use rand::rngs::StdRng;

use crate::engine::{CommonParams, Engine, SearchContext, progress};
use crate::error::{OptimError, Result};
use crate::hypers::{Hypers, schedule};
use crate::objective::{Evaluator, Objective};
use crate::population::Population;

/// Particle Swarm parameters
#[derive(Debug, Clone, Copy)]
pub struct ParticleSwarm {
    pub npop: usize,
    pub generations: usize,
    /// Inertia weight, from start to end of the run
    pub inertia: (f64, f64),
    /// Cognitive and social acceleration
    pub acceleration: (f64, f64),
    /// Initial speed as a fraction of the span
    pub v0: f64,
    pub common: CommonParams,
}

impl Default for ParticleSwarm {
    fn default() -> Self {
        Self {
            npop: 100,
            generations: 200,
            inertia: (0.9, 0.4),
            acceleration: (2.0, 2.0),
            v0: 0.0,
            common: CommonParams::default(),
        }
    }
}

/// Positions, velocities and personal bests of the swarm
#[derive(Debug, Clone)]
pub struct Swarm {
    pub(crate) positions: Array2<f64>,
    pub(crate) velocities: Array2<f64>,
    pub(crate) personal: Population,
}

impl Swarm {
    /// Index of the global best particle
    pub(crate) fn leader(&self) -> usize {
        self.personal.best().0
    }

    /// Fold freshly evaluated positions into the personal bests
    pub(crate) fn remember(&mut self, scores: &Array1<f64>) -> usize {
        let mut improved = 0;
        for i in 0..scores.len() {
            if scores[i] <= self.personal.scores[i] {
                self.personal.solutions.row_mut(i).assign(&self.positions.row(i));
                self.personal.scores[i] = scores[i];
                improved += 1;
            }
        }
        improved
    }
}

impl Engine for ParticleSwarm {
    const NAME: &'static str = "Particle Swarm Optimisation";
    type State = Swarm;

    fn hyper_defaults() -> Hypers {
        let d = Self::default();
        CommonParams::add_defaults(
            Hypers::new()
                .with("N", d.npop)
                .with("G", d.generations)
                .with("I", d.inertia)
                .with("A", d.acceleration)
                .with("v0", d.v0),
        )
    }

    fn from_hypers(hypers: &Hypers) -> Result<Self> {
        let acceleration = hypers.pair("A")?;
        if acceleration.0 < 0.0 || acceleration.1 < 0.0 {
            return Err(OptimError::invalid_hyper("A", "accelerations must be >= 0"));
        }
        Ok(Self {
            npop: hypers.usize_at_least("N", 1)?,
            generations: hypers.usize("G")?,
            inertia: hypers.pair("I")?,
            acceleration,
            v0: hypers.f64_in("v0", 0.0, 1.0)?,
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
    ) -> Result<Swarm> {
        let positions = self.common.init.sample(self.npop, ctx.bounds, ctx.initial_guess, rng);
        let scores = eval.evaluate_rows(&positions)?;
        let span = ctx.bounds.span();
        let velocities = Array2::from_shape_fn(positions.dim(), |(_, j)| {
            self.v0 * span[j] * (2.0 * rng.random::<f64>() - 1.0)
        });
        Ok(Swarm { personal: Population::new(positions.clone(), scores), positions, velocities })
    }

    fn evolve<F: Objective + ?Sized>(
        &self,
        swarm: &mut Swarm,
        generation: usize,
        ctx: &SearchContext<'_>,
        eval: &mut Evaluator<'_, F>,
        rng: &mut StdRng,
    ) -> Result<()> {
        let w = schedule(self.inertia, progress(generation, self.generations));
        let (c1, c2) = self.acceleration;
        let span = ctx.bounds.span();
        let gbest = swarm.personal.solutions.row(swarm.leader()).to_owned();

        for i in 0..self.npop {
            let pbest = swarm.personal.solutions.row(i);
            let mut x = swarm.positions.row(i).to_owned();
            let mut v = swarm.velocities.row_mut(i);
            Zip::indexed(&mut v).for_each(|j, vj| {
                let (r1, r2): (f64, f64) = (rng.random(), rng.random());
                let next = w * *vj + c1 * r1 * (pbest[j] - x[j]) + c2 * r2 * (gbest[j] - x[j]);
                *vj = next.clamp(-span[j], span[j]);
            });
            x += &v;
            self.common.bounding.apply(&mut x, ctx.bounds, rng);
            swarm.positions.row_mut(i).assign(&x);
        }
        let scores = eval.evaluate_rows(&swarm.positions)?;
        let improved = swarm.remember(&scores);
        log::trace!(
            "PSO gen {:4}  w={:.3}  best_f={:.6e}  improved={}/{}",
            generation,
            w,
            swarm.personal.best().1,
            improved,
            self.npop
        );
        Ok(())
    }

    fn harvest(&self, swarm: Swarm) -> Population {
        swarm.personal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::Bounds;
    use crate::harness::Optimiser;
    use rand::SeedableRng;

    fn sphere(x: &Array1<f64>) -> f64 {
        x.iter().map(|&v| v * v).sum()
    }

    #[test]
    fn test_initial_velocity_range() {
        let pso = ParticleSwarm::from_hypers(
            &ParticleSwarm::hyper_defaults().overlay(&Hypers::new().with("N", 30).with("v0", 0.25)),
        )
        .unwrap();
        let bounds = Bounds::new(&[(0.0, 4.0), (-1.0, 1.0)]).unwrap();
        let ctx = SearchContext { bounds: &bounds, initial_guess: None };
        let mut eval = Evaluator::new(&sphere, &bounds);
        let mut rng = StdRng::seed_from_u64(1);
        let swarm = pso.initialise(&ctx, &mut eval, &mut rng).unwrap();
        assert!(swarm.velocities.column(0).iter().all(|v| v.abs() <= 1.0));
        assert!(swarm.velocities.column(1).iter().all(|v| v.abs() <= 0.5));

        let still = ParticleSwarm::from_hypers(&ParticleSwarm::hyper_defaults()).unwrap();
        let swarm = still.initialise(&ctx, &mut eval, &mut rng).unwrap();
        assert!(swarm.velocities.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_personal_bests_never_worsen() {
        let pso = ParticleSwarm::from_hypers(
            &ParticleSwarm::hyper_defaults().overlay(&Hypers::new().with("N", 8).with("G", 5)),
        )
        .unwrap();
        let bounds = Bounds::new(&[(-5.0, 5.0); 3]).unwrap();
        let ctx = SearchContext { bounds: &bounds, initial_guess: None };
        let mut eval = Evaluator::new(&sphere, &bounds);
        let mut rng = StdRng::seed_from_u64(6);
        let mut swarm = pso.initialise(&ctx, &mut eval, &mut rng).unwrap();
        for g in 1..=5 {
            let before = swarm.personal.scores.clone();
            pso.evolve(&mut swarm, g, &ctx, &mut eval, &mut rng).unwrap();
            for i in 0..8 {
                assert!(swarm.personal.scores[i] <= before[i]);
                assert!(bounds.contains(&swarm.positions.row(i).to_owned()));
            }
            let span = bounds.span();
            for row in swarm.velocities.rows() {
                assert!(row.iter().zip(span.iter()).all(|(v, s)| v.abs() <= *s));
            }
        }
        assert_eq!(eval.nfe(), 6 * 8);
    }

    #[test]
    fn test_rejects_negative_acceleration() {
        let h = ParticleSwarm::hyper_defaults().overlay(&Hypers::new().with("A", (2.0, -1.0)));
        assert!(ParticleSwarm::from_hypers(&h).unwrap_err().is_config_error());
    }

    #[test]
    fn test_converges_on_sphere() {
        let bounds = vec![(-5.0, 5.0); 3];
        let hypers = Hypers::new().with("N", 20).with("G", 100).with("A", (1.5, 1.5));
        let opt = Optimiser::<ParticleSwarm, _>::new(sphere, &bounds, hypers).unwrap().with_seed(10);
        let out = opt.full_output(1).unwrap();
        assert_eq!(out.nfe, 101 * 20);
        assert!(out.scores[0] < 0.1, "best {}", out.scores[0]);
    }
}

//! Simulated Annealing with `N` independent Metropolis chains.
//!
//! Every step proposes a Gaussian neighbour for each chain, scaled to the
//! box span. Each chain remembers the best point it visited; those points
//! make up the reported population.

use ndarray::{Array1, Array2};
use rand::Rng;
use rand::rngs::StdRng;
use rand_distr::StandardNormal;

use crate::engine::{CommonParams, Engine, SearchContext};
use crate::error::Result;
use crate::hypers::Hypers;
use crate::objective::{Evaluator, Objective};
use crate::population::Population;

/// Simulated Annealing parameters
#[derive(Debug, Clone, Copy)]
pub struct SimulatedAnnealing {
    /// Number of chains
    pub nchains: usize,
    /// Number of annealing steps
    pub steps: usize,
    /// Initial temperature
    pub t0: f64,
    /// Geometric cooling factor
    pub alpha: f64,
    /// Neighbour standard deviation as a fraction of the span
    pub step: f64,
    pub common: CommonParams,
}

impl Default for SimulatedAnnealing {
    fn default() -> Self {
        Self { nchains: 100, steps: 500, t0: 50.0, alpha: 0.99, step: 0.1, common: CommonParams::default() }
    }
}

/// Current and best-visited point of every chain
#[derive(Debug, Clone)]
pub struct AnnealingState {
    current: Population,
    best: Population,
    temperature: f64,
}

impl AnnealingState {
    pub fn temperature(&self) -> f64 {
        self.temperature
    }
}

/// Metropolis acceptance test
fn accept<R: Rng + ?Sized>(f_old: f64, f_new: f64, temperature: f64, rng: &mut R) -> bool {
    if f_new <= f_old {
        return true;
    }
    if temperature <= 0.0 {
        return false;
    }
    rng.random::<f64>() < (-(f_new - f_old) / temperature).exp()
}

impl Engine for SimulatedAnnealing {
    const NAME: &'static str = "Simulated Annealing";
    type State = AnnealingState;

    fn hyper_defaults() -> Hypers {
        let d = Self::default();
        CommonParams::add_defaults(
            Hypers::new()
                .with("N", d.nchains)
                .with("K", d.steps)
                .with("T0", d.t0)
                .with("alpha", d.alpha)
                .with("step", d.step),
        )
    }

    fn from_hypers(hypers: &Hypers) -> Result<Self> {
        Ok(Self {
            nchains: hypers.usize_at_least("N", 1)?,
            steps: hypers.usize("K")?,
            t0: hypers.f64_positive("T0")?,
            alpha: hypers.f64_in("alpha", 0.0, 1.0)?,
            step: hypers.f64_positive("step")?,
            common: CommonParams::from_hypers(hypers)?,
        })
    }

    fn population_size(&self) -> usize {
        self.nchains
    }

    fn generations(&self) -> usize {
        self.steps
    }

    fn initialise<F: Objective + ?Sized>(
        &self,
        ctx: &SearchContext<'_>,
        eval: &mut Evaluator<'_, F>,
        rng: &mut StdRng,
    ) -> Result<AnnealingState> {
        let solutions = self.common.init.sample(self.nchains, ctx.bounds, ctx.initial_guess, rng);
        let scores = eval.evaluate_rows(&solutions)?;
        let current = Population::new(solutions, scores);
        Ok(AnnealingState { best: current.clone(), current, temperature: self.t0 })
    }

    fn evolve<F: Objective + ?Sized>(
        &self,
        state: &mut AnnealingState,
        generation: usize,
        ctx: &SearchContext<'_>,
        eval: &mut Evaluator<'_, F>,
        rng: &mut StdRng,
    ) -> Result<()> {
        state.temperature = self.t0 * self.alpha.powi(generation as i32);
        let sigma = ctx.bounds.span() * self.step;
        let dim = ctx.bounds.dim();

        let mut proposals = Array2::<f64>::zeros((self.nchains, dim));
        for i in 0..self.nchains {
            let noise: Array1<f64> = (0..dim).map(|_| rng.sample::<f64, _>(StandardNormal)).collect();
            let mut x = state.current.solutions.row(i).to_owned() + noise * &sigma;
            self.common.bounding.apply(&mut x, ctx.bounds, rng);
            proposals.row_mut(i).assign(&x);
        }
        let scores = eval.evaluate_rows(&proposals)?;

        let mut moves = 0usize;
        for i in 0..self.nchains {
            if accept(state.current.scores[i], scores[i], state.temperature, rng) {
                state.current.solutions.row_mut(i).assign(&proposals.row(i));
                state.current.scores[i] = scores[i];
                moves += 1;
            }
            if scores[i] < state.best.scores[i] {
                state.best.solutions.row_mut(i).assign(&proposals.row(i));
                state.best.scores[i] = scores[i];
            }
        }
        log::trace!(
            "SA step {:4}  T={:.4e}  best_f={:.6e}  moves={}/{}",
            generation,
            state.temperature,
            state.best.best().1,
            moves,
            self.nchains
        );
        Ok(())
    }

    fn harvest(&self, state: AnnealingState) -> Population {
        state.best
    }
}

//! Self-adaptive Differential Evolution.
//!
//! Every member picks one strategy from a small pool by roulette. Strategy
//! probabilities and the per-strategy crossover median are learned from the
//! successes and failures of the last `Lp` generations.

use std::collections::VecDeque;

use ndarray::{Array1, Array2};
use rand::Rng;
use rand::rngs::StdRng;
use rand_distr::StandardNormal;

use crate::engine::{CommonParams, Engine, SearchContext};
use crate::error::Result;
use crate::hypers::Hypers;
use crate::mutation::{Crossover, Mutation};
use crate::objective::{Evaluator, Objective};
use crate::population::Population;

/// Candidate strategies, in roulette order
pub const STRATEGY_POOL: [Mutation; 4] =
    [Mutation::Rand1, Mutation::RandToBest2, Mutation::Rand2, Mutation::CurrentToRand1];

// added to every success rate so no strategy dies out
const SUCCESS_FLOOR: f64 = 0.01;

/// Self-adaptive DE parameters
#[derive(Debug, Clone)]
pub struct SelfAdaptiveDifferentialEvolution {
    pub npop: usize,
    pub generations: usize,
    /// Learning period, in generations
    pub learning_period: usize,
    pub f_mu: f64,
    pub f_sig: f64,
    /// Initial crossover median of every strategy
    pub cr_mu: f64,
    pub cr_sig: f64,
    /// Strategies usable with `npop` members
    pub strategies: Vec<Mutation>,
    pub common: CommonParams,
}

impl Default for SelfAdaptiveDifferentialEvolution {
    fn default() -> Self {
        Self {
            npop: 100,
            generations: 100,
            learning_period: 10,
            f_mu: 0.5,
            f_sig: 0.3,
            cr_mu: 0.5,
            cr_sig: 0.1,
            strategies: STRATEGY_POOL.to_vec(),
            common: CommonParams::default(),
        }
    }
}

/// Outcome counts of one generation, per strategy
#[derive(Debug, Clone)]
struct GenerationRecord {
    successes: Vec<usize>,
    failures: Vec<usize>,
    /// Crossover rates that produced a successful trial
    good_cr: Vec<Vec<f64>>,
}

impl GenerationRecord {
    fn new(k: usize) -> Self {
        Self { successes: vec![0; k], failures: vec![0; k], good_cr: vec![Vec::new(); k] }
    }
}

/// Population plus the learning memory
#[derive(Debug, Clone)]
pub struct SadeState {
    pop: Population,
    memory: VecDeque<GenerationRecord>,
    probabilities: Vec<f64>,
    cr_mu: Vec<f64>,
}

impl SadeState {
    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    pub fn crossover_medians(&self) -> &[f64] {
        &self.cr_mu
    }
}

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let n = values.len();
    Some(if n % 2 == 1 { values[n / 2] } else { 0.5 * (values[n / 2 - 1] + values[n / 2]) })
}

fn roulette<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> usize {
    let total: f64 = weights.iter().sum();
    let mut u = rng.random::<f64>() * total;
    for (k, &w) in weights.iter().enumerate() {
        if u < w {
            return k;
        }
        u -= w;
    }
    weights.len() - 1
}

impl SelfAdaptiveDifferentialEvolution {
    fn sample_normal<R: Rng + ?Sized>(mu: f64, sig: f64, rng: &mut R) -> f64 {
        let z: f64 = rng.sample(StandardNormal);
        mu + sig * z
    }

    /// Recompute probabilities and crossover medians from the memory
    fn learn(&self, state: &mut SadeState) {
        let k = self.strategies.len();
        let mut rates = vec![0.0; k];
        for s in 0..k {
            let succ: usize = state.memory.iter().map(|r| r.successes[s]).sum();
            let fail: usize = state.memory.iter().map(|r| r.failures[s]).sum();
            let total = succ + fail;
            let rate = if total == 0 { 0.0 } else { succ as f64 / total as f64 };
            rates[s] = rate + SUCCESS_FLOOR;

            let mut good: Vec<f64> = state.memory.iter().flat_map(|r| r.good_cr[s].iter().copied()).collect();
            if let Some(m) = median(&mut good) {
                state.cr_mu[s] = m;
            }
        }
        let sum: f64 = rates.iter().sum();
        state.probabilities = rates.iter().map(|r| r / sum).collect();
    }
}

impl Engine for SelfAdaptiveDifferentialEvolution {
    const NAME: &'static str = "Self-Adaptive Differential Evolution";
    type State = SadeState;

    fn hyper_defaults() -> Hypers {
        let d = Self::default();
        CommonParams::add_defaults(
            Hypers::new()
                .with("N", d.npop)
                .with("G", d.generations)
                .with("Lp", d.learning_period)
                .with("F_mu", d.f_mu)
                .with("F_sig", d.f_sig)
                .with("Cr_mu", d.cr_mu)
                .with("Cr_sig", d.cr_sig),
        )
    }

    fn from_hypers(hypers: &Hypers) -> Result<Self> {
        let min_npop = STRATEGY_POOL.iter().map(|m| m.min_population()).min().unwrap_or(4);
        let npop = hypers.usize_at_least("N", min_npop)?;
        let strategies: Vec<Mutation> =
            STRATEGY_POOL.iter().copied().filter(|m| m.min_population() <= npop).collect();
        if strategies.len() < STRATEGY_POOL.len() {
            log::debug!("SADE: N={} too small for some strategies, using {:?}", npop, strategies);
        }
        Ok(Self {
            npop,
            generations: hypers.usize("G")?,
            learning_period: hypers.usize_at_least("Lp", 1)?,
            f_mu: hypers.f64_in("F_mu", 0.0, 2.0)?,
            f_sig: hypers.f64_in("F_sig", 0.0, 2.0)?,
            cr_mu: hypers.f64_in("Cr_mu", 0.0, 1.0)?,
            cr_sig: hypers.f64_in("Cr_sig", 0.0, 1.0)?,
            strategies,
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
    ) -> Result<SadeState> {
        let solutions = self.common.init.sample(self.npop, ctx.bounds, ctx.initial_guess, rng);
        let scores = eval.evaluate_rows(&solutions)?;
        let k = self.strategies.len();
        Ok(SadeState {
            pop: Population::new(solutions, scores),
            memory: VecDeque::with_capacity(self.learning_period + 1),
            probabilities: vec![1.0 / k as f64; k],
            cr_mu: vec![self.cr_mu; k],
        })
    }

    fn evolve<F: Objective + ?Sized>(
        &self,
        state: &mut SadeState,
        generation: usize,
        ctx: &SearchContext<'_>,
        eval: &mut Evaluator<'_, F>,
        rng: &mut StdRng,
    ) -> Result<()> {
        let pop = &state.pop;
        let (best_idx, _) = pop.best();

        let mut trials = Array2::<f64>::zeros(pop.solutions.dim());
        let mut picks = Vec::with_capacity(self.npop);
        for i in 0..self.npop {
            let k = roulette(&state.probabilities, rng);
            let strategy = self.strategies[k];
            let f = Self::sample_normal(self.f_mu, self.f_sig, rng);
            let cr = Self::sample_normal(state.cr_mu[k], self.cr_sig, rng).clamp(0.0, 1.0);

            let target: Array1<f64> = pop.solutions.row(i).to_owned();
            let mutant = strategy.mutant(i, &pop.solutions, best_idx, f, rng);
            let crossover =
                if strategy == Mutation::CurrentToRand1 { Crossover::None } else { Crossover::Binomial };
            let mut trial = crossover.apply(&target, mutant, cr, rng);
            self.common.bounding.apply(&mut trial, ctx.bounds, rng);
            trials.row_mut(i).assign(&trial);
            picks.push((k, cr));
        }
        let trial_scores = eval.evaluate_rows(&trials)?;

        let mut record = GenerationRecord::new(self.strategies.len());
        for (i, &(k, cr)) in picks.iter().enumerate() {
            if trial_scores[i] <= state.pop.scores[i] {
                state.pop.solutions.row_mut(i).assign(&trials.row(i));
                state.pop.scores[i] = trial_scores[i];
                record.successes[k] += 1;
                record.good_cr[k].push(cr);
            } else {
                record.failures[k] += 1;
            }
        }
        state.memory.push_back(record);
        if state.memory.len() > self.learning_period {
            state.memory.pop_front();
        }
        if generation >= self.learning_period {
            self.learn(state);
        }

        log::trace!(
            "SADE gen {:4}  best_f={:.6e}  p={:?}",
            generation,
            state.pop.best().1,
            state.probabilities
        );
        Ok(())
    }

    fn harvest(&self, state: SadeState) -> Population {
        state.pop
    }
}

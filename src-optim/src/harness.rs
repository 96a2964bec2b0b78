//! Multi-run driver shared by all engines.
//!
//! `Optimiser` binds an engine to an objective and a search box. Each call
//! performs `nruns` independent runs, merges every final population, sorts by
//! score and shapes the result.

use std::fmt;
use std::time::Instant;

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::bounds::Bounds;
use crate::engine::{Engine, SearchContext};
use crate::error::{OptimError, Result};
use crate::hypers::Hypers;
use crate::objective::{Evaluator, Objective};
use crate::parallel::ParallelConfig;
use crate::population::Population;
use crate::report::{FullOutput, RunOutput};

/// Options of one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Number of independent restarts
    pub nruns: usize,
    /// Return the full record instead of the best vectors
    pub full_output: bool,
    /// Number of vectors returned when `full_output` is false
    pub return_m: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self { nruns: 1, full_output: false, return_m: 1 }
    }
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn nruns(mut self, v: usize) -> Self {
        self.nruns = v;
        self
    }
    pub fn full_output(mut self, v: bool) -> Self {
        self.full_output = v;
        self
    }
    pub fn return_m(mut self, v: usize) -> Self {
        self.return_m = v;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.nruns == 0 {
            return Err(OptimError::InvalidRunOption { name: "nruns", reason: "must be >= 1".into() });
        }
        if self.return_m == 0 {
            return Err(OptimError::InvalidRunOption { name: "return_m", reason: "must be >= 1".into() });
        }
        Ok(())
    }
}

/// Outcome of a single run
#[derive(Debug, Clone)]
pub(crate) struct RunResult {
    pub population: Population,
    pub nfe: usize,
}

/// An engine bound to an objective and a search box
pub struct Optimiser<E: Engine, F> {
    objective: F,
    bounds: Bounds,
    hypers: Hypers,
    engine: E,
    seed: Option<u64>,
    initial_guess: Option<Array1<f64>>,
}

impl<E: Engine, F: Objective> Optimiser<E, F> {
    /// Bind `objective` to `bounds`; `overrides` replace any subset of
    /// `E::hyper_defaults()`.
    pub fn new(objective: F, bounds: &[(f64, f64)], overrides: Hypers) -> Result<Self> {
        let bounds = Bounds::new(bounds)?;
        let defaults = E::hyper_defaults();
        let hypers = defaults.overlay(&overrides);
        let unknown = hypers.unknown_keys(&defaults);
        if !unknown.is_empty() {
            log::warn!("{}: ignoring unrecognised hyperparameters {:?}", E::NAME, unknown);
        }
        let engine = E::from_hypers(&hypers)?;
        log::debug!(
            "{} ready: D={}, N={}, steps={}",
            E::NAME,
            bounds.dim(),
            engine.population_size(),
            engine.generations()
        );
        Ok(Self { objective, bounds, hypers, engine, seed: None, initial_guess: None })
    }

    /// Make every invocation reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Start every run from `x0` (replacing one member of the initial
    /// population). Coordinates on or outside the box are pulled inside.
    pub fn with_initial_guess(mut self, x0: &[f64]) -> Result<Self> {
        if x0.len() != self.bounds.dim() {
            return Err(OptimError::DimensionMismatch { expected: self.bounds.dim(), got: x0.len() });
        }
        if let Some(j) = x0.iter().position(|v| !v.is_finite()) {
            return Err(OptimError::InvalidHyper {
                name: "initial_guess".into(),
                reason: format!("coordinate {} is not finite", j),
            });
        }
        let mut x = Array1::from(x0.to_vec());
        self.bounds.project_inside(&mut x);
        self.initial_guess = Some(x);
        Ok(self)
    }

    pub fn name(&self) -> &'static str {
        E::NAME
    }

    /// Effective hyperparameters
    pub fn hypers(&self) -> &Hypers {
        &self.hypers
    }

    pub fn hyper_defaults() -> Hypers {
        E::hyper_defaults()
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Run sequentially on the calling thread
    pub fn call(&self, opts: &RunOptions) -> Result<RunOutput> {
        opts.validate()?;
        let runs = self.run_sequential(opts.nruns)?;
        Ok(if opts.full_output {
            RunOutput::Full(self.full_record(runs, opts.nruns))
        } else {
            RunOutput::Best(best_of(runs, opts.return_m))
        })
    }

    /// `nruns` runs, full record
    pub fn full_output(&self, nruns: usize) -> Result<FullOutput> {
        RunOptions::new().nruns(nruns).full_output(true).validate()?;
        let runs = self.run_sequential(nruns)?;
        Ok(self.full_record(runs, nruns))
    }

    /// `nruns` runs, the `return_m` best vectors
    pub fn best(&self, nruns: usize, return_m: usize) -> Result<Vec<Vec<f64>>> {
        RunOptions::new().nruns(nruns).return_m(return_m).validate()?;
        let runs = self.run_sequential(nruns)?;
        Ok(best_of(runs, return_m))
    }

    fn run_sequential(&self, nruns: usize) -> Result<Vec<RunResult>> {
        self.run_seeds(nruns)
            .into_iter()
            .enumerate()
            .map(|(run, seed)| self.run_once(run, seed))
            .collect()
    }

    fn run_seeds(&self, nruns: usize) -> Vec<u64> {
        match self.seed {
            Some(base) => (0..nruns as u64).map(|run| base.wrapping_add(run << 32)).collect(),
            None => {
                let mut thread_rng = rand::rng();
                (0..nruns).map(|_| thread_rng.random::<u64>()).collect()
            }
        }
    }

    pub(crate) fn run_once(&self, run: usize, seed: u64) -> Result<RunResult> {
        let timing_enabled = std::env::var("METAOPT_TIMING").map(|v| v != "0").unwrap_or(false);
        let t0 = Instant::now();

        let mut rng = StdRng::seed_from_u64(seed);
        let ctx = SearchContext { bounds: &self.bounds, initial_guess: self.initial_guess.as_ref() };
        let mut eval = Evaluator::new(&self.objective, &self.bounds);

        let mut state = self.engine.initialise(&ctx, &mut eval, &mut rng)?;
        let mut generation = 0;
        while !self.engine.is_terminal(generation) {
            generation += 1;
            self.engine.evolve(&mut state, generation, &ctx, &mut eval, &mut rng)?;
        }
        let population = self.engine.harvest(state);
        let (_, best_f) = population.best();

        log::debug!(
            "{} run {}: {} steps, nfe={}, best_f={:.6e}",
            E::NAME,
            run,
            generation,
            eval.nfe(),
            best_f
        );
        if timing_enabled {
            log::info!("TIMING {} run {}: {:.3} ms", E::NAME, run, t0.elapsed().as_secs_f64() * 1e3);
        }
        Ok(RunResult { population, nfe: eval.nfe() })
    }

    fn full_record(&self, runs: Vec<RunResult>, nruns: usize) -> FullOutput {
        let nfe = runs.iter().map(|r| r.nfe).sum();
        let (solutions, scores) = merge_sorted(runs).into_iter().unzip();
        FullOutput {
            optimiser: E::NAME.to_string(),
            solutions,
            scores,
            nfe,
            nruns,
            hypers: self.hypers.clone(),
            bounds: self.bounds.pairs(),
        }
    }
}

/// Concatenate the runs in order and sort by score; the sort is stable so
/// ties keep merge order.
fn merge_sorted(runs: Vec<RunResult>) -> Vec<(Vec<f64>, f64)> {
    let mut merged: Vec<(Vec<f64>, f64)> = Vec::new();
    for run in runs {
        let pop = run.population;
        for (row, &score) in pop.solutions.rows().into_iter().zip(pop.scores.iter()) {
            merged.push((row.to_vec(), score));
        }
    }
    merged.sort_by(|a, b| a.1.total_cmp(&b.1));
    merged
}

fn best_of(runs: Vec<RunResult>, return_m: usize) -> Vec<Vec<f64>> {
    merge_sorted(runs).into_iter().take(return_m).map(|(x, _)| x).collect()
}

impl<E, F> Optimiser<E, F>
where
    E: Engine + Sync,
    F: Objective + Sync,
{
    /// Run the independent restarts on a rayon pool.
    ///
    /// Each run draws from its own seeded generator, so a seeded optimiser
    /// returns the same result as [`Optimiser::call`].
    pub fn call_parallel(&self, opts: &RunOptions, parallel: &ParallelConfig) -> Result<RunOutput> {
        opts.validate()?;
        if !parallel.enabled {
            return self.call(opts);
        }
        let seeds = self.run_seeds(opts.nruns);
        let run_all = || {
            seeds
                .par_iter()
                .enumerate()
                .map(|(run, &seed)| self.run_once(run, seed))
                .collect::<Result<Vec<_>>>()
        };
        let runs = match parallel.num_threads {
            Some(n) => rayon::ThreadPoolBuilder::new().num_threads(n).build()?.install(run_all)?,
            None => run_all()?,
        };
        Ok(if opts.full_output {
            RunOutput::Full(self.full_record(runs, opts.nruns))
        } else {
            RunOutput::Best(best_of(runs, opts.return_m))
        })
    }
}

impl<E: Engine, F> fmt::Display for Optimiser<E, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} optimisation object", E::NAME)
    }
}

impl<E: Engine, F> fmt::Debug for Optimiser<E, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Optimiser")
            .field("name", &E::NAME)
            .field("dim", &self.bounds.dim())
            .field("hypers", &self.hypers)
            .field("seed", &self.seed)
            .field("initial_guess", &self.initial_guess.as_ref().map(|x| x.to_vec()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::de::DifferentialEvolution;

    fn quadratic(x: &Array1<f64>) -> f64 {
        x.iter().map(|&xi| xi * xi).sum()
    }

    fn small() -> Hypers {
        Hypers::new().with("N", 6).with("G", 3)
    }

    #[test]
    fn test_run_options_validation() {
        assert!(RunOptions::default().validate().is_ok());
        assert!(RunOptions::new().nruns(0).validate().unwrap_err().is_invocation_error());
        assert!(RunOptions::new().return_m(0).validate().unwrap_err().is_invocation_error());
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let bounds = vec![(-2.0, 2.0); 3];
        let opt = Optimiser::<DifferentialEvolution, _>::new(quadratic, &bounds, small())
            .unwrap()
            .with_seed(9);
        let a = opt.full_output(2).unwrap();
        let b = opt.full_output(2).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.nfe, 2 * (3 + 1) * 6);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let bounds = vec![(-2.0, 2.0); 2];
        let opt = Optimiser::<DifferentialEvolution, _>::new(quadratic, &bounds, small())
            .unwrap()
            .with_seed(21);
        let opts = RunOptions::new().nruns(4).full_output(true);
        let seq = opt.call(&opts).unwrap();
        let par = opt
            .call_parallel(&opts, &ParallelConfig { enabled: true, num_threads: Some(2) })
            .unwrap();
        assert_eq!(seq, par);
    }

    #[test]
    fn test_initial_guess() {
        let bounds = vec![(-1.0, 1.0); 2];
        let opt = Optimiser::<DifferentialEvolution, _>::new(quadratic, &bounds, small()).unwrap();
        assert!(matches!(
            opt.with_initial_guess(&[0.0]),
            Err(OptimError::DimensionMismatch { expected: 2, got: 1 })
        ));

        // the guess sits on the optimum and on a bound: it is pulled inside
        let opt = Optimiser::<DifferentialEvolution, _>::new(quadratic, &bounds, small())
            .unwrap()
            .with_seed(4)
            .with_initial_guess(&[0.0, 1.0])
            .unwrap();
        let out = opt.full_output(1).unwrap();
        let bounds = opt.bounds();
        for x in &out.solutions {
            assert!(bounds.contains(&Array1::from(x.clone())));
        }
        assert!(out.scores[0] <= 1.0);
    }

    #[test]
    fn test_display_and_debug() {
        let opt =
            Optimiser::<DifferentialEvolution, _>::new(quadratic, &[(-1.0, 1.0)], Hypers::new()).unwrap();
        assert_eq!(opt.to_string(), "Differential Evolution optimisation object");
        assert!(format!("{:?}", opt).contains("dim: 1"));
    }
}

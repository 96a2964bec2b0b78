//! The contract every optimisation engine implements.
//!
//! An engine owns no run state: `initialise` builds the state of one run,
//! `evolve` advances it by one generation and `harvest` turns it into the
//! final population. The harness in [`crate::harness`] drives the loop.

use ndarray::Array1;
use rand::rngs::StdRng;

use crate::bounds::{BoundaryPolicy, Bounds};
use crate::error::{OptimError, Result};
use crate::hypers::{HyperValue, Hypers};
use crate::objective::{Evaluator, Objective};
use crate::population::{Init, Population};

/// Read-only inputs shared by every generation of a run
#[derive(Debug, Clone, Copy)]
pub struct SearchContext<'a> {
    pub bounds: &'a Bounds,
    /// Optional starting point, already strictly inside `bounds`
    pub initial_guess: Option<&'a Array1<f64>>,
}

pub trait Engine: Sized {
    /// Stable display name of the variant
    const NAME: &'static str;

    /// Working state of one run
    type State;

    /// Default hyperparameters of the variant
    fn hyper_defaults() -> Hypers;

    /// Parse and validate the effective hyperparameters
    fn from_hypers(hypers: &Hypers) -> Result<Self>;

    /// Number of members reported per run
    fn population_size(&self) -> usize;

    /// Number of evolve steps per run
    fn generations(&self) -> usize;

    fn is_terminal(&self, generation: usize) -> bool {
        generation >= self.generations()
    }

    /// Sample and evaluate the initial state
    fn initialise<F: Objective + ?Sized>(
        &self,
        ctx: &SearchContext<'_>,
        eval: &mut Evaluator<'_, F>,
        rng: &mut StdRng,
    ) -> Result<Self::State>;

    /// Advance `state` by one generation; `generation` counts from 1
    fn evolve<F: Objective + ?Sized>(
        &self,
        state: &mut Self::State,
        generation: usize,
        ctx: &SearchContext<'_>,
        eval: &mut Evaluator<'_, F>,
        rng: &mut StdRng,
    ) -> Result<()>;

    /// Final snapshot of the run
    fn harvest(&self, state: Self::State) -> Population;
}

/// Settings shared by all engines: initial sampling and bounds handling
#[derive(Debug, Clone, Copy, Default)]
pub struct CommonParams {
    pub init: Init,
    pub bounding: BoundaryPolicy,
}

impl CommonParams {
    pub(crate) fn add_defaults(hypers: Hypers) -> Hypers {
        hypers
            .with("init", HyperValue::Text("random".into()))
            .with("bounding", HyperValue::Text("sticky".into()))
    }

    pub(crate) fn from_hypers(hypers: &Hypers) -> Result<Self> {
        let init = hypers
            .text("init")?
            .parse::<Init>()
            .map_err(|e| OptimError::invalid_hyper("init", e))?;
        let bounding = hypers
            .text("bounding")?
            .parse::<BoundaryPolicy>()
            .map_err(|e| OptimError::invalid_hyper("bounding", e))?;
        Ok(Self { init, bounding })
    }
}

/// Fraction of the run completed after `generation` steps out of `total`
pub(crate) fn progress(generation: usize, total: usize) -> f64 {
    if total == 0 { 1.0 } else { generation as f64 / total as f64 }
}

//! Classic Differential Evolution.
//!
//! Each generation builds one trial per member from the generation's
//! population (mutation, crossover, bounding), evaluates all trials and keeps
//! a trial whenever it is no worse than its parent.

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;

use crate::engine::{CommonParams, Engine, SearchContext};
use crate::error::{OptimError, Result};
use crate::hypers::Hypers;
use crate::mutation::{Crossover, Mutation};
use crate::objective::{Evaluator, Objective};
use crate::population::Population;

/// Differential Evolution parameters
#[derive(Debug, Clone, Copy)]
pub struct DifferentialEvolution {
    /// Population size
    pub npop: usize,
    /// Number of generations
    pub generations: usize,
    /// Mutation factor
    pub f: f64,
    /// Crossover rate
    pub cr: f64,
    pub mutation: Mutation,
    pub crossover: Crossover,
    pub common: CommonParams,
}

impl Default for DifferentialEvolution {
    fn default() -> Self {
        Self {
            npop: 100,
            generations: 100,
            f: 0.5,
            cr: 0.2,
            mutation: Mutation::Rand1,
            crossover: Crossover::Binomial,
            common: CommonParams::default(),
        }
    }
}

impl Engine for DifferentialEvolution {
    const NAME: &'static str = "Differential Evolution";
    type State = Population;

    fn hyper_defaults() -> Hypers {
        let d = Self::default();
        CommonParams::add_defaults(
            Hypers::new()
                .with("N", d.npop)
                .with("G", d.generations)
                .with("F", d.f)
                .with("Cr", d.cr)
                .with("mutation", d.mutation.to_string())
                .with("crossover", "binomial"),
        )
    }

    fn from_hypers(hypers: &Hypers) -> Result<Self> {
        let mutation = hypers
            .text("mutation")?
            .parse::<Mutation>()
            .map_err(|e| OptimError::invalid_hyper("mutation", e))?;
        let crossover = hypers
            .text("crossover")?
            .parse::<Crossover>()
            .map_err(|e| OptimError::invalid_hyper("crossover", e))?;
        Ok(Self {
            npop: hypers.usize_at_least("N", mutation.min_population())?,
            generations: hypers.usize("G")?,
            f: hypers.f64_in("F", 0.0, 2.0)?,
            cr: hypers.f64_in("Cr", 0.0, 1.0)?,
            mutation,
            crossover,
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
    ) -> Result<Population> {
        let solutions = self.common.init.sample(self.npop, ctx.bounds, ctx.initial_guess, rng);
        let scores = eval.evaluate_rows(&solutions)?;
        Ok(Population::new(solutions, scores))
    }

    fn evolve<F: Objective + ?Sized>(
        &self,
        pop: &mut Population,
        generation: usize,
        ctx: &SearchContext<'_>,
        eval: &mut Evaluator<'_, F>,
        rng: &mut StdRng,
    ) -> Result<()> {
        let (best_idx, _) = pop.best();

        // Generate all trials first, then evaluate and select
        let mut trials = Array2::<f64>::zeros(pop.solutions.dim());
        for i in 0..self.npop {
            let target: Array1<f64> = pop.solutions.row(i).to_owned();
            let mutant = self.mutation.mutant(i, &pop.solutions, best_idx, self.f, rng);
            let mut trial = self.crossover.apply(&target, mutant, self.cr, rng);
            self.common.bounding.apply(&mut trial, ctx.bounds, rng);
            trials.row_mut(i).assign(&trial);
        }
        let trial_scores = eval.evaluate_rows(&trials)?;

        let mut accepted = 0usize;
        for i in 0..self.npop {
            if trial_scores[i] <= pop.scores[i] {
                pop.solutions.row_mut(i).assign(&trials.row(i));
                pop.scores[i] = trial_scores[i];
                accepted += 1;
            }
        }
        log::trace!(
            "DE gen {:4}  best_f={:.6e}  accepted={}/{}",
            generation,
            pop.best().1,
            accepted,
            self.npop
        );
        Ok(())
    }

    fn harvest(&self, pop: Population) -> Population {
        pop
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::Optimiser;

    fn sphere(x: &Array1<f64>) -> f64 {
        x.iter().map(|&v| v * v).sum()
    }

    #[test]
    fn test_defaults_parse_back() {
        let de = DifferentialEvolution::from_hypers(&DifferentialEvolution::hyper_defaults()).unwrap();
        assert_eq!(de.npop, 100);
        assert_eq!(de.generations, 100);
        assert_eq!(de.mutation, Mutation::Rand1);
        assert_eq!(de.crossover, Crossover::Binomial);
    }

    #[test]
    fn test_population_too_small_for_strategy() {
        let h = DifferentialEvolution::hyper_defaults().overlay(&Hypers::new().with("N", 5).with("mutation", "rand2"));
        let err = DifferentialEvolution::from_hypers(&h).unwrap_err();
        assert!(matches!(err, OptimError::InvalidHyper { ref name, .. } if name == "N"));

        let h = DifferentialEvolution::hyper_defaults().overlay(&Hypers::new().with("N", 6).with("mutation", "rand2"));
        assert!(DifferentialEvolution::from_hypers(&h).is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        let defaults = DifferentialEvolution::hyper_defaults();
        for bad in [
            Hypers::new().with("F", -0.1),
            Hypers::new().with("Cr", 1.5),
            Hypers::new().with("mutation", "best3"),
            Hypers::new().with("crossover", 0.5),
            Hypers::new().with("G", 2.5),
        ] {
            let err = DifferentialEvolution::from_hypers(&defaults.overlay(&bad)).unwrap_err();
            assert!(err.is_config_error(), "{:?} accepted", bad);
        }
    }

    #[test]
    fn test_every_strategy_improves_sphere() {
        let bounds = vec![(-5.0, 5.0); 4];
        for strategy in ["rand1", "best1", "current_to_best1", "rand2", "best2", "rand_to_best1"] {
            for crossover in ["binomial", "exponential"] {
                let hypers = Hypers::new()
                    .with("N", 20)
                    .with("G", 60)
                    .with("F", 0.7)
                    .with("Cr", 0.9)
                    .with("mutation", strategy)
                    .with("crossover", crossover);
                let opt = Optimiser::<DifferentialEvolution, _>::new(sphere, &bounds, hypers)
                    .unwrap()
                    .with_seed(17);
                let out = opt.full_output(1).unwrap();
                assert_eq!(out.nfe, 61 * 20);
                assert!(out.scores[0] < 1.0, "{}/{} best {}", strategy, crossover, out.scores[0]);
            }
        }
    }

    #[test]
    fn test_greedy_selection_never_worsens() {
        let bounds = vec![(-3.0, 3.0); 2];
        let base = Hypers::new().with("N", 8).with("F", 0.8).with("Cr", 0.5);
        let short = Optimiser::<DifferentialEvolution, _>::new(sphere, &bounds, base.clone().with("G", 0))
            .unwrap()
            .with_seed(3);
        let long = Optimiser::<DifferentialEvolution, _>::new(sphere, &bounds, base.with("G", 10))
            .unwrap()
            .with_seed(3);
        // same seed, same initial population
        let before = short.full_output(1).unwrap();
        let after = long.full_output(1).unwrap();
        assert_eq!(before.nfe, 8);
        assert!(after.scores[0] <= before.scores[0]);
        assert!(after.scores[7] <= before.scores[7]);
    }
}

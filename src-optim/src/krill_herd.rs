//! Krill Herd.
//!
//! Every krill moves under three influences: motion induced by its nearest
//! neighbours and the herd's best, foraging toward a food centre and its own
//! best position, and a random diffusion that fades over the run. Crossover
//! and mutation operators follow the motion step.

use ndarray::{Array1, Array2, ArrayView1};
use rand::Rng;
use rand::rngs::StdRng;

use crate::distinct_indices::distinct_indices;
use crate::engine::{CommonParams, Engine, SearchContext, progress};
use crate::error::Result;
use crate::hypers::{Hypers, schedule};
use crate::objective::{Evaluator, Objective};
use crate::population::Population;

const EPS: f64 = 1e-12;

/// Krill Herd parameters
#[derive(Debug, Clone, Copy)]
pub struct KrillHerdSwarm {
    pub npop: usize,
    pub generations: usize,
    /// Neighbours sensed by every krill, at most `npop - 1`
    pub neighbours: usize,
    /// Maximum induced speed
    pub n_max: f64,
    /// Foraging speed
    pub v_f: f64,
    /// Maximum diffusion speed
    pub d_max: f64,
    /// Step scale, multiplied by the sum of the spans
    pub c_t: f64,
    /// Crossover rate
    pub cr: f64,
    /// Mutation probability
    pub mu: f64,
    /// Inertia of the induced and foraging motions
    pub inertia: (f64, f64),
    pub common: CommonParams,
}

impl Default for KrillHerdSwarm {
    fn default() -> Self {
        Self {
            npop: 100,
            generations: 100,
            neighbours: 5,
            n_max: 0.01,
            v_f: 0.02,
            d_max: 0.005,
            c_t: 0.5,
            cr: 0.2,
            mu: 0.05,
            inertia: (0.9, 0.1),
            common: CommonParams::default(),
        }
    }
}

/// Herd positions, motion memory and personal bests
#[derive(Debug, Clone)]
pub struct Herd {
    positions: Array2<f64>,
    scores: Array1<f64>,
    induced: Array2<f64>,
    foraging: Array2<f64>,
    personal: Population,
}

/// Unit vector from `from` to `to` (zero when they coincide)
fn direction(from: ArrayView1<f64>, to: ArrayView1<f64>) -> Array1<f64> {
    let d = &to - &from;
    let norm = d.dot(&d).sqrt();
    d / (norm + EPS)
}

/// Indices of the `k` members closest to `i`
fn nearest(positions: &Array2<f64>, i: usize, k: usize) -> Vec<usize> {
    let xi = positions.row(i);
    let mut others: Vec<(usize, f64)> = (0..positions.nrows())
        .filter(|&j| j != i)
        .map(|j| {
            let d = &positions.row(j) - &xi;
            (j, d.dot(&d))
        })
        .collect();
    others.sort_by(|a, b| a.1.total_cmp(&b.1));
    others.into_iter().take(k).map(|(j, _)| j).collect()
}

impl KrillHerdSwarm {
    /// Food centre: fitness weighted mean, better krill weigh more
    fn food_centre(positions: &Array2<f64>, scores: &Array1<f64>, best: f64, worst: f64) -> Array1<f64> {
        let range = worst - best + EPS;
        let weights: Array1<f64> = scores.mapv(|k| (worst - k) / range + EPS);
        weights.dot(positions) / weights.sum()
    }
}

impl Engine for KrillHerdSwarm {
    const NAME: &'static str = "Krill Herd";
    type State = Herd;

    fn hyper_defaults() -> Hypers {
        let d = Self::default();
        CommonParams::add_defaults(
            Hypers::new()
                .with("N", d.npop)
                .with("G", d.generations)
                .with("Ng", d.neighbours)
                .with("Nmax", d.n_max)
                .with("Vf", d.v_f)
                .with("Dmax", d.d_max)
                .with("Ct", d.c_t)
                .with("Cr", d.cr)
                .with("Mu", d.mu)
                .with("I", d.inertia),
        )
    }

    fn from_hypers(hypers: &Hypers) -> Result<Self> {
        let npop = hypers.usize_at_least("N", 3)?;
        let neighbours = hypers.usize("Ng")?.min(npop - 1);
        Ok(Self {
            npop,
            generations: hypers.usize("G")?,
            neighbours,
            n_max: hypers.f64_in("Nmax", 0.0, f64::MAX)?,
            v_f: hypers.f64_in("Vf", 0.0, f64::MAX)?,
            d_max: hypers.f64_in("Dmax", 0.0, f64::MAX)?,
            c_t: hypers.f64_positive("Ct")?,
            cr: hypers.f64_in("Cr", 0.0, 1.0)?,
            mu: hypers.f64_in("Mu", 0.0, 1.0)?,
            inertia: hypers.pair("I")?,
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
    ) -> Result<Herd> {
        let positions = self.common.init.sample(self.npop, ctx.bounds, ctx.initial_guess, rng);
        let scores = eval.evaluate_rows(&positions)?;
        let dim = positions.dim();
        Ok(Herd {
            personal: Population::new(positions.clone(), scores.clone()),
            positions,
            scores,
            induced: Array2::zeros(dim),
            foraging: Array2::zeros(dim),
        })
    }

    fn evolve<F: Objective + ?Sized>(
        &self,
        herd: &mut Herd,
        generation: usize,
        ctx: &SearchContext<'_>,
        eval: &mut Evaluator<'_, F>,
        rng: &mut StdRng,
    ) -> Result<()> {
        let t = progress(generation, self.generations);
        let w = schedule(self.inertia, t);
        let dt = self.c_t * ctx.bounds.span().sum();
        let dim = ctx.bounds.dim();

        let (best_idx, best) = crate::argmin(&herd.scores);
        let worst = herd.scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = worst - best + EPS;
        let (leader, _) = herd.personal.best();
        let gbest = herd.personal.solutions.row(leader).to_owned();
        let food = Self::food_centre(&herd.positions, &herd.scores, best, worst);
        let c_best = 2.0 * (rng.random::<f64>() + t);
        let c_food = 2.0 * (1.0 - t);

        let mut next = herd.positions.clone();
        for i in 0..self.npop {
            let xi = herd.positions.row(i);
            let ki = herd.scores[i];

            // induced motion
            let mut alpha = Array1::<f64>::zeros(dim);
            for j in nearest(&herd.positions, i, self.neighbours) {
                let kij = (ki - herd.scores[j]) / range;
                alpha.scaled_add(kij, &direction(xi, herd.positions.row(j)));
            }
            if i != best_idx {
                let kib = (ki - best) / range;
                alpha.scaled_add(c_best * kib, &direction(xi, herd.positions.row(best_idx)));
            }
            let induced = alpha * self.n_max + &herd.induced.row(i) * w;

            // foraging
            let ki_norm = (ki - best) / range;
            let mut beta = direction(xi, food.view()) * (c_food * ki_norm);
            let kip = (ki - herd.personal.scores[i]) / range;
            beta.scaled_add(kip, &direction(xi, herd.personal.solutions.row(i)));
            let foraging = beta * self.v_f + &herd.foraging.row(i) * w;

            // diffusion
            let diffusion: Array1<f64> =
                (0..dim).map(|_| self.d_max * (1.0 - t) * (2.0 * rng.random::<f64>() - 1.0)).collect();

            let mut x = xi.to_owned() + (&induced + &foraging + &diffusion) * dt;

            // crossover: worse krill borrow more coordinates
            let cr = self.cr * ki_norm;
            let r = distinct_indices(&[i], 1, self.npop, rng)[0];
            for j in 0..dim {
                if rng.random::<f64>() < cr {
                    x[j] = herd.positions[(r, j)];
                }
            }
            // mutation around the herd's best
            let pq = distinct_indices(&[i], 2, self.npop, rng);
            for j in 0..dim {
                if rng.random::<f64>() < self.mu {
                    let m: f64 = rng.random();
                    x[j] = gbest[j] + m * (herd.positions[(pq[0], j)] - herd.positions[(pq[1], j)]);
                }
            }

            self.common.bounding.apply(&mut x, ctx.bounds, rng);
            next.row_mut(i).assign(&x);
            herd.induced.row_mut(i).assign(&induced);
            herd.foraging.row_mut(i).assign(&foraging);
        }

        herd.scores = eval.evaluate_rows(&next)?;
        herd.positions = next;
        for i in 0..self.npop {
            if herd.scores[i] <= herd.personal.scores[i] {
                herd.personal.solutions.row_mut(i).assign(&herd.positions.row(i));
                herd.personal.scores[i] = herd.scores[i];
            }
        }
        log::trace!("KH gen {:4}  best_f={:.6e}", generation, herd.personal.best().1);
        Ok(())
    }

    fn harvest(&self, herd: Herd) -> Population {
        herd.personal
    }
}

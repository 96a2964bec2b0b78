//! Differential mutation operators shared by DE and SADE.
//!
//! Every operator builds a mutant for member `i` from scaled differences of
//! other members drawn without replacement (never `i` itself).

use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, Array2};
use rand::Rng;

use crate::distinct_indices::distinct_indices;

/// Differential mutation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// x_r0 + F (x_r1 - x_r2)
    Rand1,
    /// x_best + F (x_r0 - x_r1)
    Best1,
    /// x_i + F (x_best - x_i) + F (x_r0 - x_r1)
    CurrentToBest1,
    /// x_r0 + F (x_r1 - x_r2 + x_r3 - x_r4)
    Rand2,
    /// x_best + F (x_r0 - x_r1 + x_r2 - x_r3)
    Best2,
    /// x_r0 + F (x_best - x_r0) + F (x_r1 - x_r2)
    RandToBest1,
    /// x_i + F (x_best - x_i) + F (x_r0 - x_r1 + x_r2 - x_r3)
    RandToBest2,
    /// x_i + K (x_r0 - x_i) + F (x_r1 - x_r2), K ~ U(0, 1)
    CurrentToRand1,
}

impl FromStr for Mutation {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.to_lowercase().replace(['-', '/'], "_");
        match t.as_str() {
            "rand1" | "rand_1" => Ok(Mutation::Rand1),
            "best1" | "best_1" => Ok(Mutation::Best1),
            "current_to_best1" | "currenttobest1" | "current_to_best_1" => Ok(Mutation::CurrentToBest1),
            "rand2" | "rand_2" => Ok(Mutation::Rand2),
            "best2" | "best_2" => Ok(Mutation::Best2),
            "rand_to_best1" | "randtobest1" | "rand_to_best_1" => Ok(Mutation::RandToBest1),
            "rand_to_best2" | "randtobest2" | "rand_to_best_2" => Ok(Mutation::RandToBest2),
            "current_to_rand1" | "currenttorand1" | "current_to_rand_1" => Ok(Mutation::CurrentToRand1),
            _ => Err(format!("unknown mutation strategy: {}", s)),
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mutation::Rand1 => "rand1",
            Mutation::Best1 => "best1",
            Mutation::CurrentToBest1 => "current_to_best1",
            Mutation::Rand2 => "rand2",
            Mutation::Best2 => "best2",
            Mutation::RandToBest1 => "rand_to_best1",
            Mutation::RandToBest2 => "rand_to_best2",
            Mutation::CurrentToRand1 => "current_to_rand1",
        };
        f.write_str(s)
    }
}

impl Mutation {
    /// Number of members other than the target the strategy draws
    pub fn required_others(&self) -> usize {
        match self {
            Mutation::Best1 | Mutation::CurrentToBest1 => 2,
            Mutation::Rand1 | Mutation::RandToBest1 | Mutation::CurrentToRand1 => 3,
            Mutation::Best2 | Mutation::RandToBest2 => 4,
            Mutation::Rand2 => 5,
        }
    }

    /// Smallest population the strategy can run on
    pub fn min_population(&self) -> usize {
        self.required_others() + 1
    }

    pub(crate) fn mutant<R: Rng + ?Sized>(
        &self,
        i: usize,
        pop: &Array2<f64>,
        best_idx: usize,
        f: f64,
        rng: &mut R,
    ) -> Array1<f64> {
        let r = distinct_indices(&[i], self.required_others(), pop.nrows(), rng);
        let x = |k: usize| pop.row(k).to_owned();
        match self {
            Mutation::Rand1 => x(r[0]) + (x(r[1]) - x(r[2])) * f,
            Mutation::Best1 => x(best_idx) + (x(r[0]) - x(r[1])) * f,
            Mutation::CurrentToBest1 => x(i) + ((x(best_idx) - x(i)) + (x(r[0]) - x(r[1]))) * f,
            Mutation::Rand2 => x(r[0]) + (x(r[1]) - x(r[2]) + x(r[3]) - x(r[4])) * f,
            Mutation::Best2 => x(best_idx) + (x(r[0]) - x(r[1]) + x(r[2]) - x(r[3])) * f,
            Mutation::RandToBest1 => x(r[0]) + ((x(best_idx) - x(r[0])) + (x(r[1]) - x(r[2]))) * f,
            Mutation::RandToBest2 => {
                x(i) + ((x(best_idx) - x(i)) + (x(r[0]) - x(r[1]) + x(r[2]) - x(r[3]))) * f
            }
            Mutation::CurrentToRand1 => {
                let k: f64 = rng.random::<f64>();
                x(i) + (x(r[0]) - x(i)) * k + (x(r[1]) - x(r[2])) * f
            }
        }
    }
}

/// Crossover type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Crossover {
    /// Binomial (uniform) crossover
    #[default]
    Binomial,
    /// Exponential crossover
    Exponential,
    /// No crossover: the mutant is the trial (used by current-to-rand)
    None,
}

impl FromStr for Crossover {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "binomial" | "bin" | "binary" | "binary_crossover" => Ok(Crossover::Binomial),
            "exponential" | "exp" => Ok(Crossover::Exponential),
            "none" => Ok(Crossover::None),
            _ => Err(format!("unknown crossover: {}", s)),
        }
    }
}

impl Crossover {
    pub(crate) fn apply<R: Rng + ?Sized>(
        &self,
        target: &Array1<f64>,
        mutant: Array1<f64>,
        cr: f64,
        rng: &mut R,
    ) -> Array1<f64> {
        match self {
            Crossover::Binomial => binomial(target, mutant, cr, rng),
            Crossover::Exponential => exponential(target, mutant, cr, rng),
            Crossover::None => mutant,
        }
    }
}

/// Each gene comes from the mutant with probability `cr`; one forced gene
/// guarantees the trial differs from the target.
fn binomial<R: Rng + ?Sized>(target: &Array1<f64>, mut mutant: Array1<f64>, cr: f64, rng: &mut R) -> Array1<f64> {
    let forced = rng.random_range(0..target.len());
    for (j, gene) in mutant.iter_mut().enumerate() {
        if j != forced && rng.random::<f64>() >= cr {
            *gene = target[j];
        }
    }
    mutant
}

/// A circular run of mutant genes starting at a random position; the run
/// grows while draws stay below `cr`.
fn exponential<R: Rng + ?Sized>(target: &Array1<f64>, mutant: Array1<f64>, cr: f64, rng: &mut R) -> Array1<f64> {
    let n = target.len();
    let start = rng.random_range(0..n);
    let mut len = 1;
    while len < n && rng.random::<f64>() < cr {
        len += 1;
    }
    let mut trial = target.clone();
    for k in 0..len {
        let j = (start + k) % n;
        trial[j] = mutant[j];
    }
    trial
}

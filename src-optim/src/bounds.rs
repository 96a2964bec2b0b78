use std::fmt;
use std::str::FromStr;

use ndarray::Array1;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{OptimError, Result};

// relative distance kept from a bound by the sticky policy
const STICKY_MARGIN: f64 = 1e-9;

// rejection draws before falling back to the centre of the interval
const MAX_DRAWS: usize = 64;

/// Axis aligned search box. Every admissible point satisfies `low < x < high`
/// strictly in every dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<(f64, f64)>", into = "Vec<(f64, f64)>")]
pub struct Bounds {
    lower: Array1<f64>,
    upper: Array1<f64>,
}

impl Bounds {
    /// Validate and build from `(low, high)` pairs
    pub fn new(pairs: &[(f64, f64)]) -> Result<Self> {
        if pairs.is_empty() {
            return Err(OptimError::EmptyBounds);
        }
        for (index, &(low, high)) in pairs.iter().enumerate() {
            if !(low.is_finite() && high.is_finite() && low < high) {
                return Err(OptimError::InvalidBounds { index, low, high });
            }
            // adjacent floats leave no interior point to sample
            let mid = low + (high - low) * 0.5;
            if !(mid > low && mid < high) {
                return Err(OptimError::InvalidBounds { index, low, high });
            }
        }
        Ok(Self {
            lower: pairs.iter().map(|p| p.0).collect(),
            upper: pairs.iter().map(|p| p.1).collect(),
        })
    }

    pub fn dim(&self) -> usize {
        self.lower.len()
    }

    pub fn lower(&self) -> &Array1<f64> {
        &self.lower
    }

    pub fn upper(&self) -> &Array1<f64> {
        &self.upper
    }

    pub fn span(&self) -> Array1<f64> {
        &self.upper - &self.lower
    }

    pub fn pairs(&self) -> Vec<(f64, f64)> {
        self.lower.iter().zip(self.upper.iter()).map(|(&l, &u)| (l, u)).collect()
    }

    /// Strict interior test
    pub fn contains(&self, x: &Array1<f64>) -> bool {
        x.len() == self.dim()
            && x.iter().enumerate().all(|(j, &v)| v > self.lower[j] && v < self.upper[j])
    }

    /// Uniform draw strictly inside `(lower[j], upper[j])`
    pub fn sample_coord<R: Rng + ?Sized>(&self, j: usize, rng: &mut R) -> f64 {
        let (lo, hi) = (self.lower[j], self.upper[j]);
        for _ in 0..MAX_DRAWS {
            let v = lo + rng.random::<f64>() * (hi - lo);
            if v > lo && v < hi {
                return v;
            }
        }
        // only reachable for boxes a few ulps wide
        lo + (hi - lo) * 0.5
    }

    /// Pull every coordinate of `x` strictly inside the box, sticking to the
    /// violated bound. Non-finite coordinates go to the centre.
    pub fn project_inside(&self, x: &mut Array1<f64>) {
        for j in 0..x.len() {
            let (lo, hi) = (self.lower[j], self.upper[j]);
            let v = x[j];
            if v > lo && v < hi {
                continue;
            }
            let margin = (hi - lo) * STICKY_MARGIN;
            x[j] = if !v.is_finite() {
                lo + (hi - lo) * 0.5
            } else if v <= lo {
                lo + margin
            } else {
                hi - margin
            };
            if !(x[j] > lo && x[j] < hi) {
                x[j] = lo + (hi - lo) * 0.5;
            }
        }
    }

    /// Uniform draw of a whole vector strictly inside the box
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Array1<f64> {
        (0..self.dim()).map(|j| self.sample_coord(j, rng)).collect()
    }

    /// Map `x` to the unit cube, coordinate by coordinate
    pub fn to_unit(&self, x: &Array1<f64>) -> Array1<f64> {
        (x - &self.lower) / self.span()
    }

    /// Inverse of [`Bounds::to_unit`]
    pub fn from_unit(&self, u: &Array1<f64>) -> Array1<f64> {
        &self.lower + &(u * &self.span())
    }
}

impl TryFrom<Vec<(f64, f64)>> for Bounds {
    type Error = OptimError;
    fn try_from(pairs: Vec<(f64, f64)>) -> Result<Self> {
        Bounds::new(&pairs)
    }
}

impl From<Bounds> for Vec<(f64, f64)> {
    fn from(b: Bounds) -> Self {
        b.pairs()
    }
}

/// How a coordinate that left the box is brought back inside
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundaryPolicy {
    /// Stick to the violated bound, nudged inward so the point stays interior
    #[default]
    Sticky,
    /// Reflect off the violated bound
    Bounce,
    /// Resample the coordinate uniformly
    Random,
}

impl FromStr for BoundaryPolicy {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let t = s.to_lowercase();
        match t.as_str() {
            "sticky" | "sticky_bounds" | "clip" => Ok(BoundaryPolicy::Sticky),
            "bounce" | "bounce_bounds" | "reflect" => Ok(BoundaryPolicy::Bounce),
            "random" | "random_bounds" | "resample" => Ok(BoundaryPolicy::Random),
            _ => Err(format!("unknown bounding policy: {}", s)),
        }
    }
}

impl fmt::Display for BoundaryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BoundaryPolicy::Sticky => "sticky",
            BoundaryPolicy::Bounce => "bounce",
            BoundaryPolicy::Random => "random",
        };
        f.write_str(s)
    }
}


impl BoundaryPolicy {
    /// Bring every coordinate of `x` strictly inside `bounds`
    pub fn apply<R: Rng + ?Sized>(&self, x: &mut Array1<f64>, bounds: &Bounds, rng: &mut R) {
        for j in 0..x.len() {
            let (lo, hi) = (bounds.lower[j], bounds.upper[j]);
            let v = x[j];
            if v > lo && v < hi {
                continue;
            }
            x[j] = match self {
                // NaN lands here too and is resampled
                _ if !v.is_finite() => bounds.sample_coord(j, rng),
                BoundaryPolicy::Sticky => {
                    let margin = (hi - lo) * STICKY_MARGIN;
                    if v <= lo { lo + margin } else { hi - margin }
                }
                BoundaryPolicy::Bounce => {
                    let span = hi - lo;
                    // fold onto [0, 2 span) then mirror the upper half
                    let mut t = (v - lo).rem_euclid(2.0 * span);
                    if t > span {
                        t = 2.0 * span - t;
                    }
                    lo + t
                }
                BoundaryPolicy::Random => bounds.sample_coord(j, rng),
            };
            if !(x[j] > lo && x[j] < hi) {
                // reflection landed exactly on a bound, or the margin underflowed
                x[j] = bounds.sample_coord(j, rng);
            }
        }
    }
}

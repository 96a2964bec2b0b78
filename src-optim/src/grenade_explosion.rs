//! Grenade Explosion Method.
//!
//! Grenades live in the box normalised to `[-1, 1]^D`. Each one throws `Nq`
//! shrapnel pieces and moves to the best piece when it is no worse. Grenades
//! that end up inside the territory of a better grenade are relocated.

use ndarray::{Array1, Array2};
use rand::Rng;
use rand::rngs::StdRng;

use crate::bounds::Bounds;
use crate::engine::{CommonParams, Engine, SearchContext, progress};
use crate::error::{OptimError, Result};
use crate::hypers::{Hypers, geometric_schedule};
use crate::objective::{Evaluator, Objective};
use crate::population::Population;

/// Grenade Explosion parameters
#[derive(Debug, Clone, Copy)]
pub struct GrenadeExplosionMethod {
    /// Number of grenades
    pub npop: usize,
    pub generations: usize,
    /// Shrapnel pieces per grenade and generation
    pub shrapnel: usize,
    /// Territory radius, decays geometrically
    pub territory: (f64, f64),
    /// Explosion length, decays geometrically
    pub explosion: (f64, f64),
    /// Probability that a piece lands inside the territory
    pub rrd: f64,
    pub common: CommonParams,
}

impl Default for GrenadeExplosionMethod {
    fn default() -> Self {
        Self {
            npop: 100,
            generations: 100,
            shrapnel: 10,
            territory: (0.1, 0.001),
            explosion: (0.5, 0.001),
            rrd: 0.1,
            common: CommonParams::default(),
        }
    }
}

fn to_centred(bounds: &Bounds, x: &Array1<f64>) -> Array1<f64> {
    bounds.to_unit(x) * 2.0 - 1.0
}

fn from_centred(bounds: &Bounds, c: &Array1<f64>) -> Array1<f64> {
    bounds.from_unit(&((c + 1.0) * 0.5))
}

/// Exponent that puts a piece inside radius `rt` with probability `rrd`
fn shrapnel_exponent(dim: usize, rt: f64, le: f64, rrd: f64) -> f64 {
    if rt >= le {
        return 1.0;
    }
    (dim as f64 * (rt / le).ln() / rrd.ln()).max(1.0)
}

/// Largest fraction of the step `from -> to` that stays inside `[-1, 1]^D`
fn admissible_fraction(from: &Array1<f64>, to: &Array1<f64>) -> f64 {
    let mut t = 1.0f64;
    for (&a, &b) in from.iter().zip(to.iter()) {
        if b > 1.0 {
            t = t.min((1.0 - a) / (b - a));
        } else if b < -1.0 {
            t = t.min((-1.0 - a) / (b - a));
        }
    }
    t
}

fn distance(a: &Array1<f64>, b: &Array1<f64>) -> f64 {
    let d = a - b;
    d.dot(&d).sqrt()
}

impl GrenadeExplosionMethod {
    fn throw<R: Rng + ?Sized>(&self, grenade: &Array1<f64>, le: f64, p: f64, rng: &mut R) -> Array1<f64> {
        let mut piece: Array1<f64> = grenade
            .iter()
            .map(|&g| {
                let u: f64 = 2.0 * rng.random::<f64>() - 1.0;
                g + u.signum() * u.abs().powf(p) * le
            })
            .collect();
        let t = admissible_fraction(grenade, &piece);
        if t < 1.0 {
            // pulled back to a random point of the admissible part of the segment
            let r = t * rng.random::<f64>();
            piece = grenade + &((&piece - grenade) * r);
        }
        piece
    }
}

impl Engine for GrenadeExplosionMethod {
    const NAME: &'static str = "Grenade Explosion Method";
    type State = Population;

    fn hyper_defaults() -> Hypers {
        let d = Self::default();
        CommonParams::add_defaults(
            Hypers::new()
                .with("N", d.npop)
                .with("G", d.generations)
                .with("Nq", d.shrapnel)
                .with("Rt", d.territory)
                .with("Le", d.explosion)
                .with("Rrd", d.rrd),
        )
    }

    fn from_hypers(hypers: &Hypers) -> Result<Self> {
        let rrd = hypers.f64("Rrd")?;
        if !(rrd > 0.0 && rrd < 1.0) {
            return Err(OptimError::invalid_hyper("Rrd", format!("must be in (0, 1), got {}", rrd)));
        }
        Ok(Self {
            npop: hypers.usize_at_least("N", 1)?,
            generations: hypers.usize("G")?,
            shrapnel: hypers.usize_at_least("Nq", 1)?,
            territory: hypers.pair_positive("Rt")?,
            explosion: hypers.pair_positive("Le")?,
            rrd,
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
        grenades: &mut Population,
        generation: usize,
        ctx: &SearchContext<'_>,
        eval: &mut Evaluator<'_, F>,
        rng: &mut StdRng,
    ) -> Result<()> {
        let t = progress(generation, self.generations);
        let rt = geometric_schedule(self.territory, t);
        let le = geometric_schedule(self.explosion, t);
        let p = shrapnel_exponent(ctx.bounds.dim(), rt, le, self.rrd);

        for i in 0..self.npop {
            let grenade = to_centred(ctx.bounds, &grenades.solutions.row(i).to_owned());
            let mut pieces = Array2::<f64>::zeros((self.shrapnel, ctx.bounds.dim()));
            for q in 0..self.shrapnel {
                let mut x = from_centred(ctx.bounds, &self.throw(&grenade, le, p, rng));
                // the round trip through the normalised box can touch a bound
                self.common.bounding.apply(&mut x, ctx.bounds, rng);
                pieces.row_mut(q).assign(&x);
            }
            let scores = eval.evaluate_rows(&pieces)?;
            let (q, f) = crate::argmin(&scores);
            if f <= grenades.scores[i] {
                grenades.solutions.row_mut(i).assign(&pieces.row(q));
                grenades.scores[i] = f;
            }
        }

        // keep grenades out of each other's territory, better ones stay
        let mut order: Vec<usize> = (0..self.npop).collect();
        order.sort_by(|&a, &b| grenades.scores[a].total_cmp(&grenades.scores[b]));
        let centred: Vec<Array1<f64>> =
            (0..self.npop).map(|i| to_centred(ctx.bounds, &grenades.solutions.row(i).to_owned())).collect();
        let mut relocated = 0usize;
        for (rank, &i) in order.iter().enumerate().skip(1) {
            let crowded = order[..rank].iter().any(|&k| distance(&centred[i], &centred[k]) < rt);
            if crowded {
                let x = ctx.bounds.sample(rng);
                grenades.scores[i] = eval.evaluate(&x)?;
                grenades.solutions.row_mut(i).assign(&x);
                relocated += 1;
            }
        }
        log::trace!(
            "GEM gen {:4}  Rt={:.3e}  Le={:.3e}  p={:.3}  best_f={:.6e}  relocated={}",
            generation,
            rt,
            le,
            p,
            grenades.best().1,
            relocated
        );
        Ok(())
    }

    fn harvest(&self, grenades: Population) -> Population {
        grenades
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
    fn test_exponent_matches_probability() {
        let (rt, le, rrd) = (0.1, 0.5, 0.1);
        let p = shrapnel_exponent(2, rt, le, rrd);
        // P(|u|^p < rt/le) per coordinate, for both coordinates
        let inside = (rt / le).powf(1.0 / p).powi(2);
        assert!((inside - rrd).abs() < 1e-12);
        assert_eq!(shrapnel_exponent(3, 0.5, 0.1, rrd), 1.0);
    }

    #[test]
    fn test_pieces_stay_in_normalised_box() {
        let gem = GrenadeExplosionMethod::default();
        let mut rng = StdRng::seed_from_u64(9);
        let grenade = Array1::from(vec![0.95, -0.99, 0.0]);
        for _ in 0..500 {
            let piece = gem.throw(&grenade, 0.5, 1.0, &mut rng);
            assert!(piece.iter().all(|&c| c >= -1.0 && c <= 1.0), "{:?}", piece);
        }
    }

    #[test]
    fn test_admissible_fraction() {
        let from = Array1::from(vec![0.0, 0.0]);
        assert_eq!(admissible_fraction(&from, &Array1::from(vec![0.5, -0.5])), 1.0);
        assert!((admissible_fraction(&from, &Array1::from(vec![2.0, 0.0])) - 0.5).abs() < 1e-12);
        assert!((admissible_fraction(&from, &Array1::from(vec![0.0, -4.0])) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_nfe_accounts_for_relocations() {
        let bounds = vec![(-1.0, 1.0); 2];
        let hypers = Hypers::new().with("N", 6).with("G", 3).with("Nq", 4);
        let opt = Optimiser::<GrenadeExplosionMethod, _>::new(sphere, &bounds, hypers).unwrap().with_seed(2);
        let out = opt.full_output(2).unwrap();
        let base = 2 * (6 + 3 * 6 * 4);
        assert!(out.nfe >= base && out.nfe <= base + 2 * 3 * 5, "nfe {}", out.nfe);
        assert_eq!(out.solutions.len(), 12);
    }

    #[test]
    fn test_converges_on_sphere() {
        let bounds = vec![(-5.0, 5.0); 3];
        let hypers = Hypers::new().with("N", 10).with("G", 60).with("Nq", 5);
        let opt = Optimiser::<GrenadeExplosionMethod, _>::new(sphere, &bounds, hypers).unwrap().with_seed(44);
        let out = opt.full_output(1).unwrap();
        assert!(out.scores[0] < 0.5, "best {}", out.scores[0]);
    }

    #[test]
    fn test_rejects_bad_rrd() {
        let h = GrenadeExplosionMethod::hyper_defaults().overlay(&Hypers::new().with("Rrd", 1.0));
        assert!(GrenadeExplosionMethod::from_hypers(&h).unwrap_err().is_config_error());
    }
}

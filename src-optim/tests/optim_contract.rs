//! Behaviour every optimiser shares, checked engine by engine.

use metaopt::{
    DifferentialEvolution, Engine, FullOutput, GrenadeExplosionMethod, Hypers, KrillHerdSwarm, Optimiser,
    ParallelConfig, ParticleSwarm, QuantumParticleSwarm, RunOptions, RunOutput, SelfAdaptiveDifferentialEvolution,
    SimulatedAnnealing,
};
use metaopt_testfunctions::exponential;

/// Small settings shared by all engines; keys an engine does not know are ignored
fn small_hypers() -> Hypers {
    Hypers::new().with("N", 5).with("G", 2).with("K", 2).with("Ng", 5).with("Nq", 2)
}

/// `d` boxes of different widths and offsets, cycling through three shapes
fn mixed_bounds(d: usize) -> Vec<(f64, f64)> {
    [(-1.0, 1.0), (0.0, 0.5), (-10.0, -9.0)].into_iter().cycle().take(d).collect()
}

fn assert_inside(out: &FullOutput) {
    for x in &out.solutions {
        assert_eq!(x.len(), out.bounds.len());
        for (v, (lo, hi)) in x.iter().zip(out.bounds.iter()) {
            assert!(v > lo && v < hi, "{} outside ({}, {})", v, lo, hi);
        }
    }
}

fn assert_sorted(scores: &[f64]) {
    for w in scores.windows(2) {
        assert!(w[0] <= w[1], "scores not sorted: {} > {}", w[0], w[1]);
    }
}

macro_rules! contract_tests {
    ($module:ident, $engine:ty, $nfe_per_run:expr, $exact_nfe:expr) => {
        mod $module {
            use super::*;

            type Opt = Optimiser<$engine, fn(&ndarray::Array1<f64>) -> f64>;

            fn build(bounds: &[(f64, f64)], hypers: Hypers) -> Opt {
                let _ = env_logger::builder().is_test(true).try_init();
                Optimiser::new(exponential as fn(&ndarray::Array1<f64>) -> f64, bounds, hypers).unwrap()
            }

            fn check_nfe(nfe: usize, nruns: usize) {
                let expected = $nfe_per_run * nruns;
                if $exact_nfe {
                    assert_eq!(nfe, expected);
                } else {
                    assert!(nfe >= expected, "nfe {} < {}", nfe, expected);
                }
            }

            #[test]
            fn test_defaults_without_overrides() {
                let opt = build(&mixed_bounds(3), Hypers::new());
                let defaults = <$engine>::hyper_defaults();
                for (key, value) in defaults.iter() {
                    assert_eq!(opt.hypers().get(key), Some(value), "hyper {}", key);
                }
                assert_eq!(opt.hypers(), &defaults);
            }

            #[test]
            fn test_overrides_keep_other_defaults() {
                let opt = build(&mixed_bounds(3), small_hypers());
                assert_eq!(opt.hypers().usize("N").unwrap(), 5);
                let defaults = <$engine>::hyper_defaults();
                for (key, value) in defaults.iter() {
                    if !small_hypers().contains_key(key) {
                        assert_eq!(opt.hypers().get(key), Some(value), "hyper {}", key);
                    }
                }
            }

            #[test]
            fn test_nfe_and_lengths() {
                for d in [1usize, 3, 5] {
                    let opt = build(&mixed_bounds(d), small_hypers()).with_seed(1);
                    for n in [1usize, 3, 5] {
                        let out = opt.full_output(n).unwrap();
                        check_nfe(out.nfe, n);
                        assert_eq!(out.nruns, n);
                        assert_eq!(out.solutions.len(), n * 5);
                        assert_eq!(out.scores.len(), n * 5);
                        assert!(out.solutions.iter().all(|x| x.len() == d));
                        assert_sorted(&out.scores);
                        assert_inside(&out);
                    }
                }
            }

            #[test]
            fn test_unseeded_runs() {
                let opt = build(&mixed_bounds(3), small_hypers());
                let out = opt.full_output(2).unwrap();
                assert_eq!(out.solutions.len(), 10);
                assert_sorted(&out.scores);
                assert_inside(&out);
            }

            #[test]
            fn test_default_nruns() {
                let opt = build(&mixed_bounds(3), small_hypers()).with_seed(2);
                let out = opt.call(&RunOptions::new().full_output(true)).unwrap();
                assert_eq!(out.len(), 5);
                let full = out.into_full().unwrap();
                assert_eq!(full.nruns, 1);
                check_nfe(full.nfe, 1);
            }

            #[test]
            fn test_return_m() {
                for d in [1usize, 5] {
                    let opt = build(&mixed_bounds(d), small_hypers()).with_seed(3);
                    for n in [1usize, 3] {
                        let best = opt.call(&RunOptions::new().nruns(n).return_m(3)).unwrap();
                        let RunOutput::Best(vectors) = best else { panic!("expected the best vectors") };
                        assert_eq!(vectors.len(), 3);
                        assert!(vectors.iter().all(|x| x.len() == d));
                    }
                }

                let opt = build(&mixed_bounds(3), small_hypers()).with_seed(3);

                assert_eq!(opt.best(1, 1).unwrap().len(), 1);
                // more than available: everything comes back
                assert_eq!(opt.best(2, 50).unwrap().len(), 10);

                // the best vectors are the head of the full record
                let full = opt.full_output(2).unwrap();
                assert_eq!(opt.best(2, 4).unwrap(), full.top(4));
            }

            #[test]
            fn test_full_output_json() {
                let opt = build(&mixed_bounds(3), small_hypers()).with_seed(4);
                let out = opt.full_output(2).unwrap();
                let json = out.to_json().unwrap();
                let back = FullOutput::from_json(&json).unwrap();
                assert_eq!(back, out);
                assert_eq!(back.optimiser, <$engine>::NAME);
                assert_eq!(&back.hypers, opt.hypers());
            }

            #[test]
            fn test_display() {
                let opt = build(&mixed_bounds(3), small_hypers());
                assert_eq!(opt.to_string(), format!("{} optimisation object", <$engine>::NAME));
                assert_eq!(opt.name(), <$engine>::NAME);
            }

            #[test]
            fn test_one_dimension() {
                let opt = build(&[(-1.0, 1.0)], small_hypers()).with_seed(9);
                let out = opt.full_output(3).unwrap();
                check_nfe(out.nfe, 3);
                assert_eq!(out.solutions.len(), 15);
                assert!(out.solutions.iter().all(|x| x.len() == 1));
                assert_sorted(&out.scores);
                assert_inside(&out);
            }

            #[test]
            fn test_exponential_scenario() {
                let bounds = vec![(-1.0, 1.0); 3];
                let opt = build(&bounds, small_hypers()).with_seed(5);
                let out = opt.full_output(3).unwrap();
                check_nfe(out.nfe, 3);
                assert_eq!(out.solutions.len(), 15);
                assert_sorted(&out.scores);
                assert_inside(&out);
                assert!(out.scores.iter().all(|&f| f > -1.0 && f < 0.0));
            }

            #[test]
            fn test_parallel_matches_sequential() {
                let opt = build(&mixed_bounds(3), small_hypers()).with_seed(6);
                let opts = RunOptions::new().nruns(4).full_output(true);
                let seq = opt.call(&opts).unwrap();
                let par = opt.call_parallel(&opts, &ParallelConfig::with_threads(2)).unwrap();
                assert_eq!(seq, par);
                let global = opt.call_parallel(&opts, &ParallelConfig::default()).unwrap();
                assert_eq!(seq, global);
            }

            #[test]
            fn test_bounding_policies() {
                for policy in ["sticky", "bounce", "random"] {
                    let hypers = small_hypers().with("bounding", policy).with("init", "lhs");
                    let opt = build(&mixed_bounds(3), hypers).with_seed(7);
                    let out = opt.full_output(2).unwrap();
                    assert_inside(&out);
                }
            }
        }
    };
}

contract_tests!(differential_evolution, DifferentialEvolution, 15, true);
contract_tests!(self_adaptive_differential_evolution, SelfAdaptiveDifferentialEvolution, 15, true);
contract_tests!(simulated_annealing, SimulatedAnnealing, 15, true);
contract_tests!(particle_swarm, ParticleSwarm, 15, true);
contract_tests!(quantum_particle_swarm, QuantumParticleSwarm, 15, true);
contract_tests!(krill_herd, KrillHerdSwarm, 15, true);
// relocated grenades cost one evaluation each on top of N + G * N * Nq
contract_tests!(grenade_explosion, GrenadeExplosionMethod, 25, false);

#[test]
fn test_de_nfe_formula() {
    let bounds = vec![(-1.0, 1.0); 2];
    for (n, g) in [(4usize, 0usize), (6, 3), (10, 7)] {
        let hypers = Hypers::new().with("N", n).with("G", g);
        let opt = Optimiser::<DifferentialEvolution, _>::new(exponential, &bounds, hypers).unwrap();
        for nruns in [1usize, 3, 5] {
            assert_eq!(opt.full_output(nruns).unwrap().nfe, (g + 1) * n * nruns);
        }
    }
}

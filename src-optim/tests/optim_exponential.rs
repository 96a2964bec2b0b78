use metaopt::{DE, GrenadeExplosion, Hypers, KrillHerd, PSO, QPSO, RunOptions, SA, SADE};
use metaopt_testfunctions::{Benchmark, create_bounds, exponential, rastrigin, sphere};

fn check_exponential_best(x: &[f64], f: f64, tol: f64) {
    // Global minimum is at the origin with f = -1
    assert!(f >= -1.0, "Solution below theoretical minimum: {}", f);
    assert!(f < -1.0 + tol, "Solution quality too low: {}", f);
    for &xi in x {
        assert!(xi > -1.0 && xi < 1.0, "Solution coordinate out of bounds: {}", xi);
    }
}

#[test]
fn test_de_exponential_2d() {
    let bounds = create_bounds(2, -1.0, 1.0);
    let hypers = Hypers::new().with("N", 30).with("G", 100).with("Cr", 0.7).with("mutation", "best1");
    let de = DE::new(exponential, &bounds, hypers).unwrap().with_seed(170);
    let out = de.full_output(1).unwrap();
    let (x, f) = out.best().unwrap();
    check_exponential_best(x, f, 1e-4);
    for &xi in x {
        assert!(xi.abs() < 1e-2, "Solution not near global optimum (0, 0): {}", xi);
    }
}

#[test]
fn test_de_exponential_5d_exponential_crossover() {
    let bounds = create_bounds(5, -1.0, 1.0);
    let hypers = Hypers::new().with("N", 40).with("G", 150).with("Cr", 0.9).with("crossover", "exponential");
    let de = DE::new(exponential, &bounds, hypers).unwrap().with_seed(171);
    let out = de.full_output(1).unwrap();
    let (x, f) = out.best().unwrap();
    check_exponential_best(x, f, 0.05);
}

#[test]
fn test_sade_exponential_3d() {
    let bench = Benchmark::exponential(3);
    let sade = SADE::new(bench.function, &bench.bounds, Hypers::new().with("N", 30).with("G", 80))
        .unwrap()
        .with_seed(172);
    let out = sade.full_output(2).unwrap();
    let (x, f) = out.best().unwrap();
    check_exponential_best(x, f, 1e-3);
}

#[test]
fn test_sa_exponential_2d() {
    let bounds = create_bounds(2, -1.0, 1.0);
    let hypers = Hypers::new().with("N", 10).with("K", 300).with("T0", 0.1).with("step", 0.05);
    let sa = SA::new(exponential, &bounds, hypers).unwrap().with_seed(173);
    let out = sa.full_output(1).unwrap();
    let (x, f) = out.best().unwrap();
    check_exponential_best(x, f, 1e-2);
}

#[test]
fn test_pso_exponential_2d() {
    let bounds = create_bounds(2, -1.0, 1.0);
    let hypers = Hypers::new().with("N", 20).with("G", 100).with("A", (1.5, 1.5)).with("v0", 0.1);
    let pso = PSO::new(exponential, &bounds, hypers).unwrap().with_seed(174);
    let out = pso.full_output(1).unwrap();
    let (x, f) = out.best().unwrap();
    check_exponential_best(x, f, 1e-3);
}

#[test]
fn test_qpso_exponential_2d() {
    let bounds = create_bounds(2, -1.0, 1.0);
    let qpso = QPSO::new(exponential, &bounds, Hypers::new().with("N", 20).with("G", 100))
        .unwrap()
        .with_seed(175);
    let out = qpso.full_output(1).unwrap();
    let (x, f) = out.best().unwrap();
    check_exponential_best(x, f, 1e-3);
}

#[test]
fn test_krill_herd_exponential_2d() {
    let bounds = create_bounds(2, -1.0, 1.0);
    let kh = KrillHerd::new(exponential, &bounds, Hypers::new().with("N", 25).with("G", 100))
        .unwrap()
        .with_seed(176);
    let out = kh.full_output(1).unwrap();
    let (x, f) = out.best().unwrap();
    check_exponential_best(x, f, 0.05);
}

#[test]
fn test_grenade_explosion_exponential_2d() {
    let bounds = create_bounds(2, -1.0, 1.0);
    let hypers = Hypers::new().with("N", 10).with("G", 60).with("Nq", 5);
    let gem = GrenadeExplosion::new(exponential, &bounds, hypers).unwrap().with_seed(177);
    let out = gem.full_output(1).unwrap();
    let (x, f) = out.best().unwrap();
    check_exponential_best(x, f, 1e-2);
}

#[test]
fn test_de_rastrigin_more_runs_no_worse() {
    // the merged record of more runs contains the single run's population
    let bounds = create_bounds(2, -5.12, 5.12);
    let hypers = Hypers::new().with("N", 20).with("G", 50).with("F", 0.7).with("Cr", 0.9);
    let de = DE::new(rastrigin, &bounds, hypers).unwrap().with_seed(178);
    let one = de.full_output(1).unwrap();
    let three = de.full_output(3).unwrap();
    assert!(three.scores[0] <= one.scores[0]);
    assert!(three.solutions.contains(&one.solutions[0]));
}

#[test]
fn test_initial_guess_at_optimum_is_kept() {
    let bounds = create_bounds(3, -5.0, 5.0);
    let pso = PSO::new(sphere, &bounds, Hypers::new().with("N", 10).with("G", 5))
        .unwrap()
        .with_seed(179)
        .with_initial_guess(&[0.0, 0.0, 0.0])
        .unwrap();
    let best = pso.call(&RunOptions::default()).unwrap().into_solutions();
    assert_eq!(best.len(), 1);
    assert_eq!(best[0], vec![0.0, 0.0, 0.0]);
}

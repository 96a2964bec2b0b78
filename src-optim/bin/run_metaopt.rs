use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use metaopt::{
    DifferentialEvolution, Engine, FullOutput, GrenadeExplosionMethod, HyperValue, Hypers, KrillHerdSwarm,
    Optimiser, ParallelConfig, ParticleSwarm, QuantumParticleSwarm, RunOptions, SelfAdaptiveDifferentialEvolution,
    SimulatedAnnealing,
};
use metaopt_testfunctions::{Benchmark, get_function_metadata, list_functions};

/// CLI arguments for running one optimiser on one benchmark function
#[derive(Parser, Debug)]
#[command(name = "run_metaopt")]
#[command(about = "Run a stochastic optimiser on a benchmark function and print the result as JSON")]
struct Args {
    /// Optimiser: de, sade, sa, pso, qpso, krillherd, grenade
    #[arg(short, long, default_value = "de")]
    optimiser: String,

    /// Benchmark function name (see --list-functions)
    #[arg(short, long, default_value = "exponential")]
    function: String,

    /// Problem dimension
    #[arg(short, long, default_value_t = 2)]
    dim: usize,

    /// Number of independent runs
    #[arg(short, long, default_value_t = 1)]
    nruns: usize,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Hyperparameter override, repeatable: --hyper N=20 --hyper I=0.9,0.4
    #[arg(long = "hyper", value_name = "KEY=VALUE", value_parser = parse_hyper)]
    hypers: Vec<(String, HyperValue)>,

    /// Run the independent restarts in parallel
    #[arg(long)]
    parallel: bool,

    /// Number of threads for --parallel (default: rayon's choice)
    #[arg(long)]
    threads: Option<usize>,

    /// List the available benchmark functions and exit
    #[arg(long)]
    list_functions: bool,

    /// Also write the record to <output>/<optimiser>_<function>.json
    #[arg(long, value_name = "DIR")]
    output: Option<PathBuf>,
}

fn parse_hyper(s: &str) -> Result<(String, HyperValue), String> {
    let (key, value) = s.split_once('=').ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.to_string(), value.parse::<HyperValue>()?))
}

fn run<E: Engine + Sync>(args: &Args, bench: &Benchmark, hypers: Hypers) -> metaopt::Result<FullOutput> {
    let mut opt = Optimiser::<E, _>::new(bench.function, &bench.bounds, hypers)?;
    if let Some(seed) = args.seed {
        opt = opt.with_seed(seed);
    }
    let opts = RunOptions::new().nruns(args.nruns).full_output(true);
    let out = if args.parallel {
        let parallel = match args.threads {
            Some(n) => ParallelConfig::with_threads(n),
            None => ParallelConfig::default(),
        };
        opt.call_parallel(&opts, &parallel)?
    } else {
        opt.call(&opts)?
    };
    out.into_full()
        .ok_or_else(|| metaopt::OptimError::InvalidRunOption { name: "full_output", reason: "not produced".into() })
}

fn dispatch(args: &Args, bench: &Benchmark, hypers: Hypers) -> Result<FullOutput, String> {
    let key = args.optimiser.to_lowercase().replace(['-', '_', ' '], "");
    let result = match key.as_str() {
        "de" | "differentialevolution" => run::<DifferentialEvolution>(args, bench, hypers),
        "sade" => run::<SelfAdaptiveDifferentialEvolution>(args, bench, hypers),
        "sa" | "simulatedannealing" => run::<SimulatedAnnealing>(args, bench, hypers),
        "pso" => run::<ParticleSwarm>(args, bench, hypers),
        "qpso" => run::<QuantumParticleSwarm>(args, bench, hypers),
        "kh" | "krillherd" => run::<KrillHerdSwarm>(args, bench, hypers),
        "gem" | "grenade" | "grenadeexplosion" => run::<GrenadeExplosionMethod>(args, bench, hypers),
        _ => return Err(format!("unknown optimiser '{}'", args.optimiser)),
    };
    result.map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    if args.list_functions {
        let metadata = get_function_metadata();
        for name in list_functions() {
            if let Some(meta) = metadata.get(&name) {
                println!("{:<26} [{}, {}]  {}", name, meta.bound.0, meta.bound.1, meta.description);
            }
        }
        return ExitCode::SUCCESS;
    }

    let Some(bench) = Benchmark::by_name(&args.function, args.dim) else {
        eprintln!("unknown function '{}', try --list-functions", args.function);
        return ExitCode::FAILURE;
    };
    let hypers: Hypers = args.hypers.iter().cloned().collect();
    log::info!("{} on {} (D={}), {} run(s)", args.optimiser, bench.name, bench.dim(), args.nruns);

    let out = match dispatch(&args, &bench, hypers) {
        Ok(out) => out,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some((x, f)) = out.best() {
        log::info!("best f={:.6e} at {:?} after {} evaluations", f, x, out.nfe);
    }
    if let Some(dir) = &args.output {
        let stem = format!("{}_{}", args.optimiser.to_lowercase(), bench.name);
        match out.save_json(dir, &stem) {
            Ok(path) => log::info!("record written to {}", path.display()),
            Err(e) => {
                eprintln!("error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }
    match out.to_json_pretty() {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

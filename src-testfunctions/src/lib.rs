//! Optimization test functions library
//!
//! A small collection of classic benchmark objectives together with their
//! recommended search boxes. Functions are organized by category:
//!
//! - **Unimodal**: single global optimum (exponential, sphere, rosenbrock, ...)
//! - **Multimodal**: many local minima (rastrigin, ackley, griewank, ...)
//!
//! # Example
//!
//! ```rust
//! use ndarray::Array1;
//! use metaopt_testfunctions::*;
//!
//! let x = Array1::from_vec(vec![0.0, 0.0]);
//! assert_eq!(sphere(&x), 0.0);
//!
//! // A benchmark bundles a function with its bounds for a given dimension
//! let bench = Benchmark::exponential(3);
//! assert_eq!(bench.bounds.len(), 3);
//! assert!((bench.eval(&Array1::zeros(3)) + 1.0).abs() < 1e-12);
//! ```

use ndarray::Array1;
use std::collections::HashMap;

pub mod functions;
pub use functions::*;

/// Signature shared by every test function in this crate
pub type TestFunction = fn(&Array1<f64>) -> f64;

/// Metadata for a test function: bounds per dimension and known optimum
#[derive(Debug, Clone)]
pub struct FunctionMetadata {
    /// Function name
    pub name: String,
    /// Bounds for every dimension (min, max)
    pub bound: (f64, f64),
    /// Value of the global minimum, when it does not depend on dimension
    pub global_minimum: Option<f64>,
    /// Description of the function
    pub description: String,
    /// Whether the function is multimodal
    pub multimodal: bool,
    /// The function itself
    pub function: TestFunction,
}

/// A test function instantiated for a dimension: callable plus bounding box
#[derive(Debug, Clone)]
pub struct Benchmark {
    pub name: String,
    pub bounds: Vec<(f64, f64)>,
    pub function: TestFunction,
}

impl Benchmark {
    /// Look up `name` in the metadata table and build a `dim`-dimensional instance
    pub fn by_name(name: &str, dim: usize) -> Option<Self> {
        let metadata = get_function_metadata();
        metadata.get(name).map(|meta| Benchmark {
            name: meta.name.clone(),
            bounds: create_bounds(dim, meta.bound.0, meta.bound.1),
            function: meta.function,
        })
    }

    /// Exponential benchmark in `dim` dimensions, bounds [-1, 1]
    pub fn exponential(dim: usize) -> Self {
        Benchmark {
            name: "exponential".to_string(),
            bounds: create_bounds(dim, -1.0, 1.0),
            function: exponential,
        }
    }

    pub fn dim(&self) -> usize {
        self.bounds.len()
    }

    pub fn eval(&self, x: &Array1<f64>) -> f64 {
        (self.function)(x)
    }
}

/// Create `n` identical (lower, upper) pairs
pub fn create_bounds(n: usize, lower: f64, upper: f64) -> Vec<(f64, f64)> {
    vec![(lower, upper); n]
}

/// Get metadata for all available test functions
pub fn get_function_metadata() -> HashMap<String, FunctionMetadata> {
    let table: [(&str, (f64, f64), Option<f64>, &str, bool, TestFunction); 10] = [
        ("exponential", (-1.0, 1.0), Some(-1.0), "N-dimensional unimodal bowl", false, exponential),
        ("sphere", (-5.12, 5.12), Some(0.0), "N-dimensional convex quadratic", false, sphere),
        ("rosenbrock", (-5.0, 10.0), Some(0.0), "Banana shaped valley", false, rosenbrock),
        (
            "rotated_hyper_ellipsoid",
            (-65.536, 65.536),
            Some(0.0),
            "Convex, ill conditioned quadratic",
            false,
            rotated_hyper_ellipsoid,
        ),
        ("rastrigin", (-5.12, 5.12), Some(0.0), "Regular grid of local minima", true, rastrigin),
        ("ackley", (-32.768, 32.768), Some(0.0), "Nearly flat outer region, central funnel", true, ackley),
        ("griewank", (-600.0, 600.0), Some(0.0), "Widespread regularly distributed minima", true, griewank),
        ("styblinski_tang", (-5.0, 5.0), None, "Separable, minimum depends on dimension", true, styblinski_tang),
        ("step", (-100.0, 100.0), Some(0.0), "Discontinuous plateaus", true, step),
        ("quadratic", (-5.0, 5.0), Some(0.0), "Alias of sphere with a narrower box", false, sphere),
    ];

    table
        .into_iter()
        .map(|(name, bound, global_minimum, description, multimodal, function)| {
            (
                name.to_string(),
                FunctionMetadata {
                    name: name.to_string(),
                    bound,
                    global_minimum,
                    description: description.to_string(),
                    multimodal,
                    function,
                },
            )
        })
        .collect()
}

/// Get the recommended bounds of a function in `dim` dimensions
pub fn get_function_bounds(function_name: &str, dim: usize) -> Option<Vec<(f64, f64)>> {
    let metadata = get_function_metadata();
    metadata
        .get(function_name)
        .map(|meta| create_bounds(dim, meta.bound.0, meta.bound.1))
}

/// Sorted list of the available function names
pub fn list_functions() -> Vec<String> {
    let mut names: Vec<String> = get_function_metadata().into_keys().collect();
    names.sort();
    names
}

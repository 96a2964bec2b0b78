//! Unimodal test functions
//!
//! A single global optimum; useful to check that an optimiser converges at all.

use ndarray::Array1;

/// Exponential function - unimodal, bowl shaped
/// Global minimum: f(x) = -1 at x = (0, 0, ..., 0)
/// Bounds: x_i in [-1, 1]
pub fn exponential(x: &Array1<f64>) -> f64 {
    let sum_squares: f64 = x.iter().map(|&xi| xi.powi(2)).sum();
    -(-0.5 * sum_squares).exp()
}

/// Sphere function - unimodal, convex
/// Global minimum: f(x) = 0 at x = (0, 0, ..., 0)
/// Bounds: x_i in [-5.12, 5.12]
pub fn sphere(x: &Array1<f64>) -> f64 {
    x.iter().map(|&xi| xi * xi).sum()
}

/// Rosenbrock function - unimodal valley (for d <= 3)
/// Global minimum: f(x) = 0 at x = (1, 1, ..., 1)
/// Bounds: x_i in [-5, 10]
pub fn rosenbrock(x: &Array1<f64>) -> f64 {
    x.windows(2)
        .into_iter()
        .map(|w| 100.0 * (w[1] - w[0] * w[0]).powi(2) + (1.0 - w[0]).powi(2))
        .sum()
}

/// Rotated hyper-ellipsoid - unimodal, convex
/// Global minimum: f(x) = 0 at x = (0, 0, ..., 0)
/// Bounds: x_i in [-65.536, 65.536]
pub fn rotated_hyper_ellipsoid(x: &Array1<f64>) -> f64 {
    let mut total = 0.0;
    let mut partial = 0.0;
    for &xi in x.iter() {
        partial += xi * xi;
        total += partial;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_known_properties() {
        let origin = Array1::from(vec![0.0, 0.0, 0.0]);
        assert!((exponential(&origin) + 1.0).abs() < 1e-15);

        // moving away from the origin strictly increases the value
        let near = Array1::from(vec![0.1, 0.0, 0.0]);
        let far = Array1::from(vec![0.5, 0.0, 0.0]);
        assert!(exponential(&near) > exponential(&origin));
        assert!(exponential(&far) > exponential(&near));
        assert!(exponential(&far) < 0.0);
    }

    #[test]
    fn test_rosenbrock_minimum() {
        let ones = Array1::from(vec![1.0; 4]);
        assert_eq!(rosenbrock(&ones), 0.0);
        let x = Array1::from(vec![0.0, 0.0]);
        assert_eq!(rosenbrock(&x), 1.0);
    }

    #[test]
    fn test_rotated_hyper_ellipsoid() {
        let x = Array1::from(vec![1.0, 1.0]);
        // 1 + (1 + 1)
        assert_eq!(rotated_hyper_ellipsoid(&x), 3.0);
        assert_eq!(sphere(&x), 2.0);
    }
}

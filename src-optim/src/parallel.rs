/// Parallel execution of independent runs
#[derive(Debug, Clone)]
pub struct ParallelConfig {
    /// Run the restarts on a rayon pool
    pub enabled: bool,
    /// Number of threads to use (None = use the global rayon pool)
    pub num_threads: Option<usize>,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            num_threads: None, // Use rayon's default (typically num_cpus)
        }
    }
}

impl ParallelConfig {
    pub fn with_threads(num_threads: usize) -> Self {
        Self { enabled: true, num_threads: Some(num_threads) }
    }

    pub fn disabled() -> Self {
        Self { enabled: false, num_threads: None }
    }
}

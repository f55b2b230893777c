use crate::error::SamplerError;
use crate::prelude::*;

/// Sampler configuration.
///
/// `max_topics` is the fixed topic-slot capacity; it equals the number of
/// topics the sampler is constructed with and is never resized. `start_topics`
/// of those slots are active at initialization.
#[derive(Debug, Clone)]
pub struct HdpConfig {
    pub max_topics: usize,
    pub start_topics: usize,
    /// Document-topic Dirichlet concentration (the scalar multiplying psi).
    pub alpha: Concentration,
    /// Word-topic Dirichlet smoothing.
    pub beta: Smoothing,
    /// Concentration of the Gamma process driving topic births.
    pub gamma: Mass,
    /// Worker tasks for document sampling.
    pub n_workers: usize,
    /// Threads in the alias-table builder pool.
    pub table_threads: usize,
    pub seed: u64,
}

impl HdpConfig {
    pub fn new(
        max_topics: usize,
        start_topics: usize,
        alpha: Concentration,
        beta: Smoothing,
        gamma: Mass,
    ) -> Self {
        Self {
            max_topics,
            start_topics,
            alpha,
            beta,
            gamma,
            n_workers: 4,
            table_threads: 2,
            seed: 0,
        }
    }

    pub fn with_workers(mut self, n_workers: usize, table_threads: usize) -> Self {
        self.n_workers = n_workers;
        self.table_threads = table_threads;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), SamplerError> {
        if self.max_topics == 0 {
            return Err(SamplerError::Config("max_topics must be positive".into()));
        }
        if self.start_topics == 0 || self.start_topics > self.max_topics {
            return Err(SamplerError::Config(format!(
                "start_topics must lie in 1..={}, got {}",
                self.max_topics, self.start_topics
            )));
        }
        if self.n_workers == 0 || self.table_threads == 0 {
            return Err(SamplerError::Config("worker counts must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max: usize, start: usize) -> HdpConfig {
        HdpConfig::new(
            max,
            start,
            Concentration::new(0.1),
            Smoothing::new(0.01),
            Mass::new(5.0),
        )
    }

    #[test]
    fn test_validate() {
        assert!(config(100, 10).validate().is_ok());
        assert!(config(100, 0).validate().is_err());
        assert!(config(10, 11).validate().is_err());
        assert!(config(100, 10).with_workers(0, 2).validate().is_err());
    }
}

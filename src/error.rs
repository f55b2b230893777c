use thiserror::Error;

/// Fatal conditions raised by the sampler.
///
/// All variants abort the run; they are propagated to the caller rather than
/// terminating the process, so the caller decides process lifetime.
#[derive(Debug, Error)]
pub enum SamplerError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invariant violation: {0}")]
    Invariant(String),

    #[error("topic capacity exhausted: {active} active topics plus {fresh} newly drawn exceed {capacity} slots")]
    CapacityExhausted {
        active: usize,
        fresh: usize,
        capacity: usize,
    },

    #[error("worker task failed: {0}")]
    Worker(String),
}

impl SamplerError {
    pub fn invariant(detail: impl Into<String>) -> Self {
        SamplerError::Invariant(detail.into())
    }
}

// Per-type prior tables over the topic-word matrix

use crate::alias::AliasTable;
use crate::error::SamplerError;
use crate::prelude::Concentration;
use crate::wgt::TopicWeights;

use rayon::prelude::*;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Prior sampling state for one vocabulary type, rebuilt every iteration.
#[derive(Debug)]
pub struct TypePrior {
    /// O(1)-draw table over `phi[.][type] * alpha * psi`.
    pub table: AliasTable,
    /// Total prior mass the table was built from.
    pub mass: f64,
    /// Topic slots whose word probability for this type is nonzero.
    pub nonzero: Vec<usize>,
}

/// Build the prior record for a single type from the transposed topic-word
/// matrix row. Covers every slotted topic: pruned slots keep their stale
/// word probabilities and weights, which is what lets a dormant slot be
/// drawn again.
pub fn build_type_prior(
    phi_row: &[f64],
    alpha: Concentration,
    psi: &TopicWeights,
) -> TypePrior {
    let n_slots = phi_row.len();
    let mut weights = vec![0.0; n_slots];
    let mut mass = 0.0;
    let mut nonzero = Vec::new();
    for topic in 0..n_slots {
        let w = phi_row[topic] * alpha * psi[topic];
        weights[topic] = w;
        mass += w;
        if phi_row[topic] != 0.0 {
            nonzero.push(topic);
        }
    }
    TypePrior {
        table: AliasTable::new(&weights, mass),
        mass,
        nonzero,
    }
}

/// Rebuild the prior records for all vocabulary types on the given pool.
///
/// This is a full rebuild: both the topic-word matrix and the weight vector
/// may have changed since the last iteration. The call is a hard barrier; a
/// panicking builder task aborts the run as a worker failure.
pub fn build_type_priors(
    pool: &rayon::ThreadPool,
    phi_t: &[Vec<f64>],
    alpha: Concentration,
    psi: &TopicWeights,
) -> Result<Vec<TypePrior>, SamplerError> {
    catch_unwind(AssertUnwindSafe(|| {
        pool.install(|| {
            phi_t
                .par_iter()
                .map(|phi_row| build_type_prior(phi_row, alpha, psi))
                .collect()
        })
    }))
    .map_err(|cause| {
        let detail = cause
            .downcast_ref::<String>()
            .map(String::as_str)
            .or_else(|| cause.downcast_ref::<&str>().copied())
            .unwrap_or("table builder panicked");
        SamplerError::Worker(detail.to_string())
    })
}

// Polya urn approximation to sparse Dirichlet draws

use crate::binom::{sample_poisson, POISSON_NORMAL_CUTOFF};
use crate::prelude::Smoothing;

use rand::Rng;
use rand_distr::{Distribution, Gamma};

/// Draws a topic's word distribution from its type-count row.
///
/// Each entry is an independent Poisson(count + smoothing) variate and the
/// vector is normalized, the urn approximation to a Dirichlet posterior
/// draw. Entries with zero count and a small smoothing come out exactly zero
/// most of the time, which is what makes the per-type nonzero-topic lists
/// worth maintaining.
#[derive(Debug, Clone, Copy)]
pub struct PolyaUrnDirichlet {
    smoothing: Smoothing,
}

impl PolyaUrnDirichlet {
    pub fn new(smoothing: Smoothing) -> Self {
        Self { smoothing }
    }

    pub fn draw_row<R: Rng>(&self, counts: &[u32], rng: &mut R) -> Vec<f64> {
        let mut row = vec![0.0; counts.len()];
        let mut total = 0u64;
        for (entry, &count) in row.iter_mut().zip(counts) {
            let urn = sample_poisson(
                count as f64 + self.smoothing,
                POISSON_NORMAL_CUTOFF,
                rng,
            );
            *entry = urn as f64;
            total += urn;
        }
        if total == 0 {
            // Every urn came up empty (tiny vocabularies, fresh topics);
            // fall back to a dense symmetric Dirichlet draw.
            return self.dense_row(counts.len(), rng);
        }
        for entry in &mut row {
            *entry /= total as f64;
        }
        row
    }

    fn dense_row<R: Rng>(&self, n_types: usize, rng: &mut R) -> Vec<f64> {
        let gamma = Gamma::new(self.smoothing.unwrap(), 1.0).unwrap();
        let mut row: Vec<f64> = (0..n_types).map(|_| gamma.sample(rng)).collect();
        let total: f64 = row.iter().sum();
        if total > 0.0 {
            for entry in &mut row {
                *entry /= total;
            }
        } else {
            row.fill(1.0 / n_types as f64);
        }
        row
    }
}

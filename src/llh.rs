// Model log-likelihood diagnostic

use crate::corpus::Document;
use crate::prelude::{Concentration, Smoothing};

use statrs::function::gamma::ln_gamma;

/// Dirichlet-multinomial model log-likelihood over current counts: one term
/// for the topics within each document, one for the words within each topic.
/// Monitoring only; nothing in the sampling cycle reads it.
///
/// A NaN or infinite accumulation is reported as a degraded value of 0.0
/// with a warning, and sampling continues.
pub fn model_log_likelihood(
    docs: &[Document],
    type_topic: &[u32],
    tokens_per_topic: &[u64],
    n_types: usize,
    n_slots: usize,
    alpha: Concentration,
    beta: Smoothing,
) -> f64 {
    let alpha_sum = alpha * n_slots as f64;
    let ln_gamma_alpha = ln_gamma(alpha.unwrap());
    let mut ll = 0.0;

    // Topics within documents.
    let mut topic_counts = vec![0u32; n_slots];
    for doc in docs {
        for &topic in doc.labels() {
            topic_counts[topic] += 1;
        }
        for count in topic_counts.iter_mut() {
            if *count > 0 {
                ll += ln_gamma(alpha + *count as f64) - ln_gamma_alpha;
                *count = 0;
            }
        }
        ll -= ln_gamma(alpha_sum + doc.len() as f64);
    }
    ll += docs.len() as f64 * ln_gamma(alpha_sum);

    // Words within topics.
    let mut nonzero_pairs = 0usize;
    for vocab_type in 0..n_types {
        for topic in 0..n_slots {
            let count = type_topic[vocab_type * n_slots + topic];
            if count > 0 {
                nonzero_pairs += 1;
                ll += ln_gamma(beta + count as f64);
            }
        }
    }
    let beta_total = beta * n_types as f64;
    for &total in tokens_per_topic {
        ll -= ln_gamma(beta_total + total as f64);
    }
    ll += ln_gamma(beta_total) * n_slots as f64;
    ll -= ln_gamma(beta.unwrap()) * nonzero_pairs as f64;

    if !ll.is_finite() {
        log::warn!("degenerate model log-likelihood ({}), reporting 0.0", ll);
        return 0.0;
    }
    ll
}

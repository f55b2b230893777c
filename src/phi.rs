// Table-count sampling and topic-word redraws

use crate::binom::{sample_binomial, sample_poisson, BinomialAliasCache, POISSON_NORMAL_CUTOFF};
use crate::dirichlet::PolyaUrnDirichlet;
use crate::freq::DocTopicFreqTable;
use crate::prelude::Mass;
use crate::wgt::TopicWeights;

use rand::Rng;

/// Draw the auxiliary table count `l_k` for one topic.
///
/// Walks the topic's reverse cumulative sum: at depth `l` (zero-indexed),
/// `trials` documents hold more than `l` tokens of the topic and each opens
/// a new table with probability `gamma / (gamma + l)`. The walk stops at the
/// first zero, since the reverse cumulative sum is non-increasing.
pub fn sample_table_count<R: Rng>(
    freq: &DocTopicFreqTable,
    topic: usize,
    gamma: Mass,
    max_doc_len: usize,
    cache: &BinomialAliasCache,
    rng: &mut R,
) -> u64 {
    let rcs = freq.reverse_cumulative_sum(topic);
    let mut total = 0;
    for doc_len in 0..max_doc_len {
        let trials = rcs.get(doc_len).copied().unwrap_or(0);
        if trials == 0 {
            break;
        }
        let p = gamma / (gamma + doc_len as f64);
        total += sample_binomial(trials, p, doc_len, cache, rng);
    }
    total
}

/// One active topic's update for the phi phase: draw its table count, boost
/// its weight by a Poisson(`l_k`) "new table" contribution, and redraw its
/// word distribution from its current type counts.
///
/// Topics born this iteration have an empty frequency row, so `l_k` is zero
/// and their weight keeps only the unit contribution paid at birth.
pub fn resample_topic<R: Rng>(
    topic: usize,
    freq: &DocTopicFreqTable,
    gamma: Mass,
    max_doc_len: usize,
    cache: &BinomialAliasCache,
    dirichlet: &PolyaUrnDirichlet,
    counts_row: &[u32],
    psi: &mut TopicWeights,
    rng: &mut R,
) -> Vec<f64> {
    let table_count = sample_table_count(freq, topic, gamma, max_doc_len, cache, rng);
    if table_count > 0 {
        let eta = sample_poisson(table_count as f64, POISSON_NORMAL_CUTOFF, rng);
        psi.add(topic, eta as f64);
    }
    dirichlet.draw_row(counts_row, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::Smoothing;
    use rand::prelude::*;
    use rand_pcg::Pcg64Mcg;

    fn freq_fixture() -> DocTopicFreqTable {
        let mut freq = DocTopicFreqTable::new(2);
        // topic 0: three docs, with 1, 2, and 4 tokens
        freq.record(0, 1);
        freq.record(0, 2);
        freq.record(0, 4);
        freq
    }

    #[test]
    fn test_table_count_bounds() {
        let freq = freq_fixture();
        let gamma = Mass::new(0.5);
        let cache = BinomialAliasCache::build(gamma);
        let mut rng = Pcg64Mcg::seed_from_u64(71);
        let ceiling: u64 = freq.reverse_cumulative_sum(0).iter().sum();
        for _ in 0..500 {
            let l_k = sample_table_count(&freq, 0, gamma, 16, &cache, &mut rng);
            assert!(l_k >= 1, "every document with the topic opens a first table");
            assert!(l_k <= ceiling);
        }
    }

    #[test]
    fn test_table_count_saturates_at_huge_gamma() {
        // p ~ 1 at every depth, so each trial opens a table
        let freq = freq_fixture();
        let gamma = Mass::new(1e9);
        let cache = BinomialAliasCache::build(gamma);
        let mut rng = Pcg64Mcg::seed_from_u64(72);
        let ceiling: u64 = freq.reverse_cumulative_sum(0).iter().sum();
        assert_eq!(sample_table_count(&freq, 0, gamma, 16, &cache, &mut rng), ceiling);
    }

    #[test]
    fn test_untouched_topic_draws_zero() {
        let freq = freq_fixture();
        let gamma = Mass::new(2.0);
        let cache = BinomialAliasCache::build(gamma);
        let mut rng = Pcg64Mcg::seed_from_u64(73);
        assert_eq!(sample_table_count(&freq, 1, gamma, 16, &cache, &mut rng), 0);
    }

    #[test]
    fn test_resample_topic_boosts_weight_and_redraws_row() {
        let freq = freq_fixture();
        let gamma = Mass::new(2.0);
        let cache = BinomialAliasCache::build(gamma);
        let dirichlet = PolyaUrnDirichlet::new(Smoothing::new(0.01));
        let mut psi = TopicWeights::start(2, 2);
        let mut rng = Pcg64Mcg::seed_from_u64(74);
        let mut row = Vec::new();
        for _ in 0..20 {
            row = resample_topic(
                0,
                &freq,
                gamma,
                16,
                &cache,
                &dirichlet,
                &[4, 0, 3],
                &mut psi,
                &mut rng,
            );
        }
        assert!(psi[0] > 1.0, "tables accumulate weight on the populated topic");
        assert_eq!(psi[1], 1.0);
        assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }
}

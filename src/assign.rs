// Per-token topic assignment sampling

use crate::corpus::Document;
use crate::error::SamplerError;
use crate::freq::DocTopicFreqTable;
use crate::nonzero::TopicSet;
use crate::prior::TypePrior;

use rand::Rng;

/// Read-only state shared by every assignment worker within one iteration:
/// the transposed topic-word matrix `[type][topic]` and the freshly built
/// per-type prior tables.
pub struct AssignContext<'a> {
    pub phi_t: &'a [Vec<f64>],
    pub priors: &'a [TypePrior],
    pub n_slots: usize,
}

/// A batch's private delta against the shared type-topic counts. Workers
/// never touch the shared matrix during the parallel phase; deltas are merged
/// once all workers have joined.
#[derive(Debug)]
pub struct CountDelta {
    n_slots: usize,
    entries: Vec<i64>,
    topic_totals: Vec<i64>,
}

impl CountDelta {
    pub fn new(n_types: usize, n_slots: usize) -> Self {
        Self {
            n_slots,
            entries: vec![0; n_types * n_slots],
            topic_totals: vec![0; n_slots],
        }
    }

    fn increment(&mut self, vocab_type: usize, topic: usize) {
        self.entries[vocab_type * self.n_slots + topic] += 1;
        self.topic_totals[topic] += 1;
    }

    fn decrement(&mut self, vocab_type: usize, topic: usize) {
        self.entries[vocab_type * self.n_slots + topic] -= 1;
        self.topic_totals[topic] -= 1;
    }

    /// Fold this delta into the shared matrix. A count driven negative means
    /// the workers and the matrix disagree about where tokens live.
    pub fn apply(
        &self,
        type_topic: &mut [u32],
        tokens_per_topic: &mut [u64],
    ) -> Result<(), SamplerError> {
        debug_assert_eq!(type_topic.len(), self.entries.len());
        for (count, &delta) in type_topic.iter_mut().zip(&self.entries) {
            let updated = *count as i64 + delta;
            if updated < 0 {
                return Err(SamplerError::invariant(
                    "type-topic count driven negative by batch delta",
                ));
            }
            *count = updated as u32;
        }
        for (total, &delta) in tokens_per_topic.iter_mut().zip(&self.topic_totals) {
            let updated = *total as i64 + delta;
            if updated < 0 {
                return Err(SamplerError::invariant(
                    "tokens-per-topic total driven negative by batch delta",
                ));
            }
            *total = updated as u64;
        }
        Ok(())
    }
}

/// Working storage reused across the documents of one batch.
pub struct DocScratch {
    counts: Vec<u32>,
    nonzero: TopicSet,
    cumsum: Vec<f64>,
}

impl DocScratch {
    pub fn new(n_slots: usize) -> Self {
        Self {
            counts: vec![0; n_slots],
            nonzero: TopicSet::new(n_slots),
            cumsum: vec![0.0; n_slots],
        }
    }
}

/// Resample every token of one document in order.
///
/// Each token's new topic is drawn with probability proportional to
/// `phi[topic][type] * alpha * psi[topic] + localCount[topic] * phi[topic][type]`,
/// realized as a two-region split of a single uniform: the prior region is
/// served by the type's alias table, the likelihood region by a binary search
/// over the cumulative scores of a sparse candidate set, the smaller of the
/// document's nonzero topics and the type's nonzero-topic list. The
/// intersection is a pure optimization; both choices cover the same
/// distribution.
pub fn sample_document<R: Rng>(
    doc: &mut Document,
    ctx: &AssignContext,
    scratch: &mut DocScratch,
    delta: &mut CountDelta,
    freq: &mut DocTopicFreqTable,
    rng: &mut R,
) -> Result<(), SamplerError> {
    if doc.is_empty() {
        return Ok(());
    }
    let (types, labels) = doc.split_mut();

    scratch.counts.fill(0);
    scratch.nonzero.clear();
    for &label in labels.iter() {
        if label >= ctx.n_slots {
            return Err(SamplerError::invariant(format!(
                "label {} outside {} topic slots",
                label, ctx.n_slots
            )));
        }
        scratch.counts[label] += 1;
        if scratch.counts[label] == 1 {
            scratch.nonzero.insert(label);
        }
    }

    for (position, &vocab_type) in types.iter().enumerate() {
        let old_topic = labels[position];
        if scratch.counts[old_topic] == 0 {
            return Err(SamplerError::invariant(format!(
                "local count for topic {} would go negative",
                old_topic
            )));
        }
        scratch.counts[old_topic] -= 1;
        if scratch.counts[old_topic] == 0 && !scratch.nonzero.remove(old_topic) {
            return Err(SamplerError::invariant(
                "nonzero-topic set out of sync with local counts",
            ));
        }
        delta.decrement(vocab_type, old_topic);

        let prior = &ctx.priors[vocab_type];
        let candidates: &[usize] = if prior.nonzero.len() < scratch.nonzero.len() {
            &prior.nonzero
        } else {
            scratch.nonzero.as_slice()
        };

        let u = rng.random::<f64>();
        let new_topic = if candidates.is_empty() {
            // Document and type sparsity removed every topic; only the
            // prior remains, uniform over the full slot range.
            ((u * ctx.n_slots as f64) as usize).min(ctx.n_slots - 1)
        } else {
            let phi_row = &ctx.phi_t[vocab_type];
            let mut running = 0.0;
            for (slot, &topic) in candidates.iter().enumerate() {
                running += scratch.counts[topic] as f64 * phi_row[topic];
                scratch.cumsum[slot] = running;
            }
            let likelihood_sum = running;
            if u < prior.mass / (prior.mass + likelihood_sum) {
                // Stretch u back to [0,1) across the prior region.
                prior.table.sample_with(u + (likelihood_sum * u) / prior.mass)
            } else {
                let u_lik = u * (prior.mass + likelihood_sum) - prior.mass;
                let slot = scratch.cumsum[..candidates.len()]
                    .partition_point(|&c| c < u_lik)
                    .min(candidates.len() - 1);
                candidates[slot]
            }
        };
        if new_topic >= ctx.n_slots {
            return Err(SamplerError::invariant(format!(
                "sampled topic {} outside {} slots",
                new_topic, ctx.n_slots
            )));
        }

        labels[position] = new_topic;
        scratch.counts[new_topic] += 1;
        if scratch.counts[new_topic] == 1 {
            scratch.nonzero.insert(new_topic);
        }
        delta.increment(vocab_type, new_topic);
    }

    for topic in scratch.nonzero.iter() {
        freq.record(topic, scratch.counts[topic] as usize);
    }
    Ok(())
}

/// Everything a finished batch hands back for merging.
pub struct BatchOutcome {
    pub delta: CountDelta,
    pub freq: DocTopicFreqTable,
}

/// Resample a disjoint batch of documents with a private delta buffer,
/// frequency table, and random source.
pub fn sample_batch<R: Rng>(
    docs: &mut [Document],
    ctx: &AssignContext,
    n_types: usize,
    rng: &mut R,
) -> Result<BatchOutcome, SamplerError> {
    let mut delta = CountDelta::new(n_types, ctx.n_slots);
    let mut freq = DocTopicFreqTable::new(ctx.n_slots);
    let mut scratch = DocScratch::new(ctx.n_slots);
    for doc in docs.iter_mut() {
        sample_document(doc, ctx, &mut scratch, &mut delta, &mut freq, rng)?;
    }
    Ok(BatchOutcome { delta, freq })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::Concentration;
    use crate::prior::build_type_prior;
    use crate::wgt::TopicWeights;
    use rand::prelude::*;
    use rand_pcg::Pcg64Mcg;

    fn context(phi_t: &[Vec<f64>], psi: &TopicWeights) -> Vec<TypePrior> {
        phi_t
            .iter()
            .map(|row| build_type_prior(row, Concentration::new(0.1), psi))
            .collect()
    }

    #[test]
    fn test_token_count_preserved() {
        let n_slots = 4;
        let phi_t = vec![vec![0.25; n_slots]; 3];
        let psi = TopicWeights::start(n_slots, n_slots);
        let priors = context(&phi_t, &psi);
        let ctx = AssignContext {
            phi_t: &phi_t,
            priors: &priors,
            n_slots,
        };
        let mut doc = Document::new(vec![0, 1, 2, 1, 0, 2, 1]);
        let mut rng = Pcg64Mcg::seed_from_u64(51);
        let outcome = sample_batch(std::slice::from_mut(&mut doc), &ctx, 3, &mut rng).unwrap();
        assert_eq!(doc.labels().len(), 7);
        assert!(doc.labels().iter().all(|&k| k < n_slots));
        // the frequency table saw exactly this document's counts
        let mut counts = vec![0usize; n_slots];
        for &k in doc.labels() {
            counts[k] += 1;
        }
        assert_eq!(counts.iter().sum::<usize>(), 7);
        for (topic, &count) in counts.iter().enumerate() {
            let rcs = outcome.freq.reverse_cumulative_sum(topic);
            if count > 0 {
                assert_eq!(rcs.len(), count);
                assert_eq!(rcs[count - 1], 1);
            } else {
                assert!(rcs.is_empty());
            }
        }
    }

    #[test]
    fn test_delta_tracks_relabeling() {
        let n_slots = 3;
        let n_types = 2;
        let phi_t = vec![vec![0.4, 0.3, 0.3], vec![0.1, 0.8, 0.1]];
        let psi = TopicWeights::start(n_slots, n_slots);
        let priors = context(&phi_t, &psi);
        let ctx = AssignContext {
            phi_t: &phi_t,
            priors: &priors,
            n_slots,
        };
        let mut docs = vec![
            Document::new(vec![0, 1, 0, 1]),
            Document::new(vec![1, 1, 0]),
        ];
        // seed the shared matrix from the initial all-zero labels
        let mut type_topic = vec![0u32; n_types * n_slots];
        let mut tokens_per_topic = vec![0u64; n_slots];
        for doc in &docs {
            for (&t, &k) in doc.types().iter().zip(doc.labels()) {
                type_topic[t * n_slots + k] += 1;
                tokens_per_topic[k] += 1;
            }
        }
        let mut rng = Pcg64Mcg::seed_from_u64(52);
        let outcome = sample_batch(&mut docs, &ctx, n_types, &mut rng).unwrap();
        outcome
            .delta
            .apply(&mut type_topic, &mut tokens_per_topic)
            .unwrap();
        // merged matrix must equal a recount from the new labels
        let mut expected = vec![0u32; n_types * n_slots];
        for doc in &docs {
            for (&t, &k) in doc.types().iter().zip(doc.labels()) {
                expected[t * n_slots + k] += 1;
            }
        }
        assert_eq!(type_topic, expected);
        assert_eq!(tokens_per_topic.iter().sum::<u64>(), 7);
    }

    #[test]
    fn test_out_of_range_label_rejected() {
        let n_slots = 2;
        let phi_t = vec![vec![0.5, 0.5]];
        let psi = TopicWeights::start(n_slots, n_slots);
        let priors = context(&phi_t, &psi);
        let ctx = AssignContext {
            phi_t: &phi_t,
            priors: &priors,
            n_slots,
        };
        let mut doc = Document::new(vec![0]);
        doc.labels_mut()[0] = 7;
        let mut scratch = DocScratch::new(n_slots);
        let mut delta = CountDelta::new(1, n_slots);
        let mut freq = DocTopicFreqTable::new(n_slots);
        let mut rng = Pcg64Mcg::seed_from_u64(53);
        let result = sample_document(&mut doc, &ctx, &mut scratch, &mut delta, &mut freq, &mut rng);
        assert!(matches!(result, Err(SamplerError::Invariant(_))));
    }

    #[test]
    fn test_tokens_migrate_to_favored_topic() {
        // a topic-word table that heavily favors topic 1 for every type
        let n_slots = 2;
        let n_types = 3;
        let phi_t = vec![vec![0.001, 0.999]; n_types];
        let psi = TopicWeights::start(n_slots, n_slots);
        let priors = context(&phi_t, &psi);
        let ctx = AssignContext {
            phi_t: &phi_t,
            priors: &priors,
            n_slots,
        };
        let mut rng = Pcg64Mcg::seed_from_u64(54);
        let mut favored = 0usize;
        let trials = 200;
        for _ in 0..trials {
            let mut doc = Document::new(vec![0, 1, 2, 0, 1]);
            // every token starts in topic 0
            let outcome = sample_batch(std::slice::from_mut(&mut doc), &ctx, n_types, &mut rng).unwrap();
            assert_eq!(doc.labels().len(), 5);
            favored += doc.labels().iter().filter(|&&k| k == 1).count();
            // length invariant held at the end of the pass
            let total: u64 = (0..n_slots)
                .map(|k| outcome.freq.reverse_cumulative_sum(k).iter().sum::<u64>())
                .sum();
            assert_eq!(total, 5);
        }
        assert!(
            favored as f64 > 0.6 * (5 * trials) as f64,
            "only {}/{} tokens moved to the favored topic",
            favored,
            5 * trials
        );
    }
}

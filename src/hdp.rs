// Poisson-Polya urn HDP-LDA sampler

use crate::assign::{sample_batch, AssignContext, BatchOutcome};
use crate::binom::BinomialAliasCache;
use crate::config::HdpConfig;
use crate::corpus::Corpus;
use crate::dirichlet::PolyaUrnDirichlet;
use crate::error::SamplerError;
use crate::freq::DocTopicFreqTable;
use crate::llh::model_log_likelihood;
use crate::mcmc::GibbsCycle;
use crate::nonzero::TopicSet;
use crate::phi::resample_topic;
use crate::prior::{build_type_priors, TypePrior};
use crate::urn;
use crate::wgt::TopicWeights;

use rand::prelude::*;
use rand_pcg::Pcg64Mcg;
use std::thread;

/// The uncollapsed HDP sampler: per-token topic assignment with
/// mixture-of-alias draws, a Poisson-urn controller growing and shrinking
/// the set of topics in use, and table-count-driven topic weights.
///
/// Topic slots form a fixed arena of `max_topics` entries. Slots are never
/// deallocated; the active set decides which take part in the phi phase, and
/// dormant slots keep their counts, weight, and word distribution
/// addressable so the urn can revive them.
pub struct HdpSampler {
    config: HdpConfig,
    corpus: Corpus,
    max_doc_len: usize,

    /// Shared type-topic counts, `[type * max_topics + topic]`.
    type_topic: Vec<u32>,
    tokens_per_topic: Vec<u64>,
    /// Word distribution per topic slot, `[topic][type]`.
    phi: Vec<Vec<f64>>,
    /// Transposed copy rebuilt each iteration, `[type][topic]`.
    phi_t: Vec<Vec<f64>>,
    priors: Vec<TypePrior>,

    psi: TopicWeights,
    active: TopicSet,
    occurrence: Vec<u64>,
    freq: DocTopicFreqTable,

    cache: BinomialAliasCache,
    dirichlet: PolyaUrnDirichlet,
    /// Alias-table builder pool; alive between `pre_sample` and `post_sample`.
    pool: Option<rayon::ThreadPool>,
    rng: Pcg64Mcg,

    active_history: Vec<usize>,
    active_in_data_history: Vec<usize>,
}

impl HdpSampler {
    pub fn new(config: HdpConfig, corpus: Corpus) -> Result<Self, SamplerError> {
        config.validate()?;
        let n_slots = config.max_topics;
        let n_types = corpus.n_types();
        let mut rng = Pcg64Mcg::seed_from_u64(config.seed);

        let mut corpus = corpus;
        let mut type_topic = vec![0u32; n_types * n_slots];
        let mut tokens_per_topic = vec![0u64; n_slots];
        for doc in corpus.docs_mut() {
            let (types, labels) = doc.split_mut();
            for (position, &vocab_type) in types.iter().enumerate() {
                let topic = rng.random_range(0..config.start_topics);
                labels[position] = topic;
                type_topic[vocab_type * n_slots + topic] += 1;
                tokens_per_topic[topic] += 1;
            }
        }

        let dirichlet = PolyaUrnDirichlet::new(config.beta);
        let mut sampler = Self {
            max_doc_len: corpus.longest_doc_len(),
            type_topic,
            tokens_per_topic,
            phi: vec![vec![0.0; n_types]; n_slots],
            phi_t: vec![vec![0.0; n_slots]; n_types],
            priors: Vec::new(),
            psi: TopicWeights::start(n_slots, config.start_topics),
            active: TopicSet::first(config.start_topics, n_slots),
            occurrence: vec![0; n_slots],
            freq: DocTopicFreqTable::new(n_slots),
            cache: BinomialAliasCache::build(config.gamma),
            dirichlet,
            pool: None,
            rng,
            active_history: Vec::new(),
            active_in_data_history: Vec::new(),
            config,
            corpus,
        };
        for topic in 0..sampler.config.start_topics {
            let counts = sampler.counts_column(topic);
            sampler.phi[topic] = sampler.dirichlet.draw_row(&counts, &mut sampler.rng);
        }
        Ok(sampler)
    }

    /// Run `n_iterations` full Gibbs cycles.
    pub fn run(&mut self, n_iterations: usize) -> Result<(), SamplerError> {
        crate::mcmc::run(self, n_iterations)
    }

    fn n_slots(&self) -> usize {
        self.config.max_topics
    }

    fn counts_column(&self, topic: usize) -> Vec<u32> {
        let n_slots = self.n_slots();
        (0..self.corpus.n_types())
            .map(|vocab_type| self.type_topic[vocab_type * n_slots + topic])
            .collect()
    }

    fn transpose_phi(&mut self) {
        for (vocab_type, column) in self.phi_t.iter_mut().enumerate() {
            for (topic, slot) in column.iter_mut().enumerate() {
                *slot = self.phi[topic][vocab_type];
            }
        }
    }

    /// Reorder topic slots by descending occurrence so the most-used topics
    /// take the lowest indices: a pure permutation of the type-topic matrix,
    /// its per-topic totals, the occurrence counts, and the frequency table.
    fn reindex_by_occurrence(&mut self) {
        let n_slots = self.n_slots();
        let mut order: Vec<usize> = (0..n_slots).collect();
        order.sort_by(|&a, &b| self.occurrence[b].cmp(&self.occurrence[a]).then(a.cmp(&b)));

        self.occurrence = order.iter().map(|&old| self.occurrence[old]).collect();
        self.tokens_per_topic = order.iter().map(|&old| self.tokens_per_topic[old]).collect();
        let mut reordered = vec![0u32; self.type_topic.len()];
        for vocab_type in 0..self.corpus.n_types() {
            let row = vocab_type * n_slots;
            for (new, &old) in order.iter().enumerate() {
                reordered[row + new] = self.type_topic[row + old];
            }
        }
        self.type_topic = reordered;
        self.freq.permute(&order);
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Unnormalized during an iteration; sums to one after each
    /// `post_iteration`.
    pub fn topic_weights(&self) -> &TopicWeights {
        &self.psi
    }

    pub fn active_topics(&self) -> Vec<usize> {
        self.active.sorted()
    }

    /// Word distribution per topic slot; rows of dormant slots are stale.
    pub fn word_distributions(&self) -> &[Vec<f64>] {
        &self.phi
    }

    pub fn type_topic_counts(&self) -> &[u32] {
        &self.type_topic
    }

    pub fn occurrence_counts(&self) -> &[u64] {
        &self.occurrence
    }

    pub fn active_history(&self) -> &[usize] {
        &self.active_history
    }

    pub fn active_in_data_history(&self) -> &[usize] {
        &self.active_in_data_history
    }

    pub fn log_likelihood(&self) -> f64 {
        model_log_likelihood(
            self.corpus.docs(),
            &self.type_topic,
            &self.tokens_per_topic,
            self.corpus.n_types(),
            self.config.max_topics,
            self.config.alpha,
            self.config.beta,
        )
    }
}

impl GibbsCycle for HdpSampler {
    type Error = SamplerError;

    fn pre_sample(&mut self) -> Result<(), SamplerError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.table_threads)
            .build()
            .map_err(|e| SamplerError::Worker(e.to_string()))?;
        self.pool = Some(pool);
        Ok(())
    }

    fn pre_iteration(&mut self) -> Result<(), SamplerError> {
        self.transpose_phi();
        let pool = self
            .pool
            .as_ref()
            .ok_or_else(|| SamplerError::invariant("sampling cycle not started"))?;
        self.priors = build_type_priors(pool, &self.phi_t, self.config.alpha, &self.psi)?;
        Ok(())
    }

    fn sample_z(&mut self) -> Result<(), SamplerError> {
        let n_slots = self.config.max_topics;
        let n_types = self.corpus.n_types();
        let n_docs = self.corpus.n_docs();
        if n_docs == 0 {
            self.freq = DocTopicFreqTable::new(n_slots);
            return Ok(());
        }
        let n_workers = self.config.n_workers.min(n_docs);
        let seeds: Vec<u64> = (0..n_workers).map(|_| self.rng.random()).collect();
        let batch_len = n_docs.div_ceil(n_workers);

        let ctx = AssignContext {
            phi_t: &self.phi_t,
            priors: &self.priors,
            n_slots,
        };
        let docs = self.corpus.docs_mut();
        let outcomes: Vec<Result<BatchOutcome, SamplerError>> = thread::scope(|scope| {
            let ctx = &ctx;
            let handles: Vec<_> = docs
                .chunks_mut(batch_len)
                .zip(seeds)
                .map(|(batch, seed)| {
                    scope.spawn(move || {
                        let mut rng = Pcg64Mcg::seed_from_u64(seed);
                        sample_batch(batch, ctx, n_types, &mut rng)
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| {
                    handle.join().unwrap_or_else(|_| {
                        Err(SamplerError::Worker(
                            "document sampling worker panicked".into(),
                        ))
                    })
                })
                .collect()
        });

        let mut freq = DocTopicFreqTable::new(n_slots);
        for outcome in outcomes {
            let outcome = outcome?;
            outcome
                .delta
                .apply(&mut self.type_topic, &mut self.tokens_per_topic)?;
            freq.merge(&outcome.freq);
        }
        self.freq = freq;
        Ok(())
    }

    fn post_z(&mut self) -> Result<(), SamplerError> {
        self.active_history.push(self.active.len());
        let in_data = urn::prune_empty_topics(&mut self.active, &self.freq);
        self.active_in_data_history.push(in_data);

        let births = urn::draw_birth_count(self.config.gamma, &mut self.rng);
        let drawn = urn::draw_birth_slots(births, self.n_slots(), &mut self.rng);
        let fresh = urn::grow(
            &mut self.active,
            &mut self.psi,
            &drawn,
            self.config.max_topics,
        )?;
        log::debug!(
            "topics: active {}, in data {}, newly added {}",
            self.active.len(),
            in_data,
            fresh.len()
        );
        Ok(())
    }

    fn sample_phi(&mut self) -> Result<(), SamplerError> {
        for topic in self.active.sorted() {
            self.occurrence[topic] += 1;
            let counts = self.counts_column(topic);
            self.phi[topic] = resample_topic(
                topic,
                &self.freq,
                self.config.gamma,
                self.max_doc_len,
                &self.cache,
                &self.dirichlet,
                &counts,
                &mut self.psi,
                &mut self.rng,
            );
        }
        Ok(())
    }

    fn post_iteration(&mut self) -> Result<(), SamplerError> {
        self.psi.normalize();
        Ok(())
    }

    fn post_sample(&mut self) -> Result<(), SamplerError> {
        self.pool = None;
        self.reindex_by_occurrence();
        Ok(())
    }
}

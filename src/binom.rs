// Binomial and Poisson sampling machinery for the urn scheme

use crate::alias::AliasTable;
use crate::prelude::Mass;

use rand::Rng;
use rand_distr::{Binomial, Distribution, Poisson, StandardNormal};
use statrs::distribution::{Binomial as BinomialPmf, Discrete};

/// First trial count covered by the precomputed tables.
pub const TABLE_TRIALS_START: usize = 50;
/// Number of consecutive trial counts covered.
pub const TABLE_TRIALS_COUNT: usize = 50;
/// Document lengths covered by the precomputed tables.
pub const TABLE_MAX_DOC_LEN: usize = 200;

/// Poisson draws at or above this rate use the normal approximation.
pub const POISSON_NORMAL_CUTOFF: f64 = 100.0;

/// Precomputed alias tables for Binomial(trials, gamma/(gamma+docLen)) over
/// the grid trials in [50, 100) x docLen in [0, 200).
///
/// Built once at setup from the exact binomial probability mass function and
/// immutable afterwards; lookups are read-only during sampling.
#[derive(Debug)]
pub struct BinomialAliasCache {
    tables: Vec<Vec<AliasTable>>,
}

impl BinomialAliasCache {
    pub fn build(gamma: Mass) -> Self {
        let mut tables = Vec::with_capacity(TABLE_TRIALS_COUNT);
        for offset in 0..TABLE_TRIALS_COUNT {
            let trials = TABLE_TRIALS_START + offset;
            let mut row = Vec::with_capacity(TABLE_MAX_DOC_LEN);
            for doc_len in 0..TABLE_MAX_DOC_LEN {
                let p = gamma / (gamma + doc_len as f64);
                row.push(binomial_alias_table(trials, p));
            }
            tables.push(row);
        }
        Self { tables }
    }

    pub fn lookup(&self, trials: u64, doc_len: usize) -> Option<&AliasTable> {
        let trials = trials as usize;
        if (TABLE_TRIALS_START..TABLE_TRIALS_START + TABLE_TRIALS_COUNT).contains(&trials)
            && doc_len < TABLE_MAX_DOC_LEN
        {
            Some(&self.tables[trials - TABLE_TRIALS_START][doc_len])
        } else {
            None
        }
    }
}

fn binomial_alias_table(trials: usize, p: f64) -> AliasTable {
    // The table spans [0, max(100, 2*trials)), comfortably past the support.
    let table_len = 100.max(2 * trials);
    let pmf = BinomialPmf::new(p, trials as u64).unwrap();
    let weights: Vec<f64> = (0..table_len).map(|k| pmf.pmf(k as u64)).collect();
    AliasTable::from_weights(&weights)
}

/// Draw from Binomial(trials, p), selecting a strategy by regime:
/// a single Bernoulli for one trial; the rounded normal approximation when
/// both np and n(1-p) reach 5; a sum of Bernoullis below the cache's trial
/// range; a cached alias table inside the grid; exact sampling otherwise.
pub fn sample_binomial<R: Rng>(
    trials: u64,
    p: f64,
    doc_len: usize,
    cache: &BinomialAliasCache,
    rng: &mut R,
) -> u64 {
    if trials == 0 {
        return 0;
    }
    if trials == 1 {
        return u64::from(rng.random::<f64>() < p);
    }
    let n = trials as f64;
    if n * p >= 5.0 && n * (1.0 - p) >= 5.0 {
        let mean = n * p;
        let sd = (n * p * (1.0 - p)).sqrt();
        let z: f64 = rng.sample(StandardNormal);
        return (sd * z + mean).round().clamp(0.0, n) as u64;
    }
    if (trials as usize) < TABLE_TRIALS_START {
        return (0..trials).filter(|_| rng.random::<f64>() < p).count() as u64;
    }
    if let Some(table) = cache.lookup(trials, doc_len) {
        return table.sample(rng) as u64;
    }
    Binomial::new(trials, p).unwrap().sample(rng)
}

/// Draw from Poisson(lambda), switching to the rounded normal approximation
/// at `normal_cutoff` to sidestep the exact sampler's numerical trouble at
/// large rates.
pub fn sample_poisson<R: Rng>(lambda: f64, normal_cutoff: f64, rng: &mut R) -> u64 {
    if lambda <= 0.0 {
        return 0;
    }
    if lambda < normal_cutoff {
        Poisson::new(lambda).unwrap().sample(rng) as u64
    } else {
        let z: f64 = rng.sample(StandardNormal);
        (lambda + lambda.sqrt() * z).round().max(0.0) as u64
    }
}

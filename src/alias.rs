// Walker's alias method

use rand::Rng;

/// An O(1)-draw sampling table over a fixed discrete distribution.
///
/// Built from non-negative weights and their precomputed total `mass` (the
/// caller usually accumulates the sum while filling the weight vector, so it
/// is taken as an argument rather than recomputed). A non-finite or
/// non-positive mass degenerates to the uniform distribution over all
/// buckets; such a table is never reached by the samplers, which route a
/// zero prior mass to the likelihood or fallback path first.
#[derive(Debug, Clone)]
pub struct AliasTable {
    prob: Vec<f64>,
    alias: Vec<usize>,
    mass: f64,
}

impl AliasTable {
    pub fn new(weights: &[f64], mass: f64) -> Self {
        let n = weights.len();
        assert!(n > 0, "alias table needs at least one bucket");
        if !(mass.is_finite() && mass > 0.0) {
            return Self {
                prob: vec![1.0; n],
                alias: (0..n).collect(),
                mass: 0.0,
            };
        }

        // Scale so the average bucket weight is 1, then pair underfull
        // buckets with overfull ones.
        let mut scaled: Vec<f64> = weights.iter().map(|&w| w * n as f64 / mass).collect();
        let mut prob = vec![0.0; n];
        let mut alias: Vec<usize> = (0..n).collect();
        let mut small: Vec<usize> = Vec::with_capacity(n);
        let mut large: Vec<usize> = Vec::with_capacity(n);
        for (i, &p) in scaled.iter().enumerate() {
            if p < 1.0 {
                small.push(i);
            } else {
                large.push(i);
            }
        }
        while let (Some(s), Some(l)) = (small.pop(), large.pop()) {
            prob[s] = scaled[s];
            alias[s] = l;
            scaled[l] = (scaled[l] + scaled[s]) - 1.0;
            if scaled[l] < 1.0 {
                small.push(l);
            } else {
                large.push(l);
            }
        }
        for i in small.into_iter().chain(large) {
            prob[i] = 1.0;
            alias[i] = i;
        }
        Self { prob, alias, mass }
    }

    pub fn from_weights(weights: &[f64]) -> Self {
        Self::new(weights, weights.iter().sum())
    }

    /// Total unnormalized mass the table was built from.
    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn len(&self) -> usize {
        self.prob.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prob.is_empty()
    }

    /// Draw using a single uniform variate `u` in [0,1): the integer part of
    /// `u * n` picks the bucket and the fractional part decides between the
    /// bucket and its alias.
    pub fn sample_with(&self, u: f64) -> usize {
        let n = self.prob.len();
        let scaled = u * n as f64;
        let bucket = (scaled as usize).min(n - 1);
        if scaled - bucket as f64 <= self.prob[bucket] {
            bucket
        } else {
            self.alias[bucket]
        }
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> usize {
        self.sample_with(rng.random::<f64>())
    }
}

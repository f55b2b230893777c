use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Chi-square goodness-of-fit check for a sampler over `0..n_categories`.
///
/// Categories are pooled in index order until the expected count reaches 5,
/// the usual validity threshold for the chi-square approximation. Panics if
/// the test rejects at level `alpha`.
pub fn assert_goodness_of_fit(
    n_samples: usize,
    n_categories: usize,
    mut sample: impl FnMut() -> usize,
    pmf: impl Fn(usize) -> f64,
    alpha: f64,
) {
    let ns = n_samples as f64;
    let mut counts = vec![0usize; n_categories];
    for _ in 0..n_samples {
        let x = sample();
        assert!(x < n_categories, "sampled {} outside 0..{}", x, n_categories);
        counts[x] += 1;
    }
    let threshold = 5.0;
    let mut buckets: Vec<(f64, f64)> = Vec::new();
    let mut observed = 0.0;
    let mut expected = 0.0;
    for category in 0..n_categories {
        observed += counts[category] as f64;
        expected += ns * pmf(category);
        if expected >= threshold {
            buckets.push((observed, expected));
            observed = 0.0;
            expected = 0.0;
        }
    }
    // Fold the under-threshold tail into the last pooled bucket.
    if let Some(last) = buckets.last_mut() {
        last.0 += observed;
        last.1 += expected;
    }
    let df = buckets.len();
    assert!(df >= 2, "too few pooled categories ({}) for a chi-square test", df);
    let chisq: f64 = buckets.iter().map(|(o, e)| (o - e) * (o - e) / e).sum();
    let distr = ChiSquared::new((df - 1) as f64).unwrap();
    let p_value = 1.0 - distr.cdf(chisq);
    assert!(
        p_value > alpha,
        "rejected goodness of fit... p-value: {:.8}, chisq: {:.2}, df: {}",
        p_value,
        chisq,
        df
    );
}

/// Z-statistic check that a sampler's mean matches `mean` given the sampler's
/// standard deviation `sd`. Panics when |z| exceeds the 0.1% two-sided bound.
pub fn assert_mean_within(n_samples: usize, mut sample: impl FnMut() -> f64, mean: f64, sd: f64) {
    let ns = n_samples as f64;
    let sum: f64 = (0..n_samples).map(|_| sample()).sum();
    let z_stat = (sum / ns - mean) / (sd / ns.sqrt());
    assert!(
        z_stat.abs() < 3.290527,
        "sample mean {:.4} too far from {:.4} (z = {:.2})",
        sum / ns,
        mean,
        z_stat
    );
}

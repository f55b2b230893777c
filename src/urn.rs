// Poisson-Polya urn topic birth process

use crate::binom::sample_poisson;
use crate::error::SamplerError;
use crate::freq::DocTopicFreqTable;
use crate::nonzero::TopicSet;
use crate::prelude::Mass;
use crate::wgt::TopicWeights;

use rand::Rng;

/// Birth-count draws at or above this rate use the normal approximation,
/// where the exact Poisson sampler runs into numerical trouble.
pub const BIRTH_NORMAL_CUTOFF: f64 = 1000.0;

/// Deactivate every topic no document used this iteration. Slots are never
/// freed, only toggled out of the active set; a dormant slot keeps its
/// weight and counts addressable for later rebirth. Returns the number of
/// topics still active, i.e. the count actually present in the data.
pub fn prune_empty_topics(active: &mut TopicSet, freq: &DocTopicFreqTable) -> usize {
    for topic in freq.empty_topics() {
        active.remove(topic);
    }
    active.len()
}

/// Number of topics born this iteration, Poisson in the urn concentration.
pub fn draw_birth_count<R: Rng>(gamma: Mass, rng: &mut R) -> u64 {
    sample_poisson(gamma.unwrap(), BIRTH_NORMAL_CUTOFF, rng)
}

/// Slot indices for the newly born topics, uniform over the slot range and
/// drawn with replacement; duplicates are resolved by `grow`.
pub fn draw_birth_slots<R: Rng>(n_births: u64, n_slots: usize, rng: &mut R) -> Vec<usize> {
    (0..n_births).map(|_| rng.random_range(0..n_slots)).collect()
}

/// Apply a round of drawn slots to the active set and the weight vector.
///
/// Drawn slots are deduplicated against each other and against the active
/// set; the genuinely new ones are activated (in ascending order) and
/// returned. Every draw adds one unit of weight to its slot, duplicates and
/// already-active slots included: the "new ball" event pays its slot whether
/// or not the slot was dormant. Exceeding `capacity` is fatal and leaves the
/// state untouched.
pub fn grow(
    active: &mut TopicSet,
    psi: &mut TopicWeights,
    drawn: &[usize],
    capacity: usize,
) -> Result<Vec<usize>, SamplerError> {
    let mut fresh: Vec<usize> = Vec::new();
    for &topic in drawn {
        if topic >= active.n_slots() {
            return Err(SamplerError::invariant(format!(
                "drawn topic {} outside {} slots",
                topic,
                active.n_slots()
            )));
        }
        if !active.contains(topic) && !fresh.contains(&topic) {
            fresh.push(topic);
        }
    }
    if active.len() + fresh.len() > capacity {
        return Err(SamplerError::CapacityExhausted {
            active: active.len(),
            fresh: fresh.len(),
            capacity,
        });
    }
    fresh.sort_unstable();
    for &topic in &fresh {
        active.insert(topic);
    }
    for &topic in drawn {
        psi.add(topic, 1.0);
    }
    Ok(fresh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use rand_pcg::Pcg64Mcg;

    #[test]
    fn test_urn_round_activates_new_slots_and_pays_every_draw() {
        // capacity 100, topics 0-9 active, six draws with one duplicate
        let capacity = 100;
        let mut active = TopicSet::first(10, capacity);
        let mut psi = TopicWeights::start(capacity, 10);
        let drawn = [3, 15, 22, 40, 3, 71];
        let fresh = grow(&mut active, &mut psi, &drawn, capacity).unwrap();
        assert_eq!(fresh, vec![15, 22, 40, 71]);
        assert_eq!(active.len(), 14);
        assert!((psi[3] - 3.0).abs() < 1e-12); // started at 1, drawn twice
        for &topic in &[15, 22, 40, 71] {
            assert!((psi[topic] - 1.0).abs() < 1e-12);
        }
        assert!((psi[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_capacity_exhaustion_is_fatal_not_truncated() {
        let mut active = TopicSet::first(2, 10);
        let mut psi = TopicWeights::start(10, 2);
        let result = grow(&mut active, &mut psi, &[5, 6, 7], 4);
        assert!(matches!(
            result,
            Err(SamplerError::CapacityExhausted {
                active: 2,
                fresh: 3,
                capacity: 4
            })
        ));
        // failed growth left the state untouched
        assert_eq!(active.len(), 2);
        assert_eq!(psi.sum(), 2.0);
    }

    #[test]
    fn test_prune_empty_topics() {
        let mut active = TopicSet::first(4, 8);
        let mut freq = DocTopicFreqTable::new(8);
        freq.record(1, 2);
        freq.record(3, 1);
        let in_data = prune_empty_topics(&mut active, &freq);
        assert_eq!(in_data, 2);
        assert_eq!(active.sorted(), vec![1, 3]);
    }

    #[test]
    fn test_birth_draws_land_in_range() {
        let mut rng = Pcg64Mcg::seed_from_u64(61);
        let n = draw_birth_count(Mass::new(5.0), &mut rng);
        let slots = draw_birth_slots(n, 37, &mut rng);
        assert_eq!(slots.len() as u64, n);
        assert!(slots.iter().all(|&k| k < 37));
    }

    #[test]
    fn test_birth_count_mean() {
        let mut rng = Pcg64Mcg::seed_from_u64(62);
        let gamma = Mass::new(5.0);
        crate::testing::assert_mean_within(
            20_000,
            || draw_birth_count(gamma, &mut rng) as f64,
            5.0,
            5.0f64.sqrt(),
        );
    }
}

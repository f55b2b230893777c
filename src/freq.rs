/// Per-topic histogram over "number of documents holding exactly n tokens of
/// this topic", together with its reverse cumulative sum.
///
/// Rebuilt from scratch every iteration out of the sampling workers' private
/// tables; consumed by the cardinality controller (empty-topic query) and the
/// table-count sampler (reverse cumulative sums).
#[derive(Debug, Clone)]
pub struct DocTopicFreqTable {
    hist: Vec<Vec<u64>>,
}

impl DocTopicFreqTable {
    pub fn new(n_slots: usize) -> Self {
        Self {
            hist: vec![Vec::new(); n_slots],
        }
    }

    pub fn n_slots(&self) -> usize {
        self.hist.len()
    }

    /// Record one document holding exactly `count` tokens of `topic`.
    pub fn record(&mut self, topic: usize, count: usize) {
        debug_assert!(count > 0);
        let row = &mut self.hist[topic];
        if row.len() <= count {
            row.resize(count + 1, 0);
        }
        row[count] += 1;
    }

    pub fn merge(&mut self, other: &DocTopicFreqTable) {
        debug_assert_eq!(self.hist.len(), other.hist.len());
        for (row, other_row) in self.hist.iter_mut().zip(&other.hist) {
            if row.len() < other_row.len() {
                row.resize(other_row.len(), 0);
            }
            for (n, &docs) in other_row.iter().enumerate() {
                row[n] += docs;
            }
        }
    }

    /// `rcs[i]` = number of documents holding at least `i + 1` tokens of
    /// `topic`. The result carries no trailing zeros.
    pub fn reverse_cumulative_sum(&self, topic: usize) -> Vec<u64> {
        let row = &self.hist[topic];
        if row.len() <= 1 {
            return Vec::new();
        }
        let mut rcs = vec![0u64; row.len() - 1];
        let mut running = 0;
        for n in (1..row.len()).rev() {
            running += row[n];
            rcs[n - 1] = running;
        }
        rcs
    }

    pub fn has_documents(&self, topic: usize) -> bool {
        self.hist[topic].iter().any(|&docs| docs > 0)
    }

    /// Topic slots no document touched this iteration.
    pub fn empty_topics(&self) -> Vec<usize> {
        (0..self.hist.len())
            .filter(|&topic| !self.has_documents(topic))
            .collect()
    }

    pub fn swap_topics(&mut self, a: usize, b: usize) {
        self.hist.swap(a, b);
    }

    /// Relabel topics so new slot `i` holds what `order[i]` held.
    pub fn permute(&mut self, order: &[usize]) {
        debug_assert_eq!(order.len(), self.hist.len());
        self.hist = order
            .iter()
            .map(|&old| std::mem::take(&mut self.hist[old]))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_cumulative_sum() {
        let mut table = DocTopicFreqTable::new(3);
        // topic 1: two docs with 1 token, one with 3
        table.record(1, 1);
        table.record(1, 1);
        table.record(1, 3);
        assert_eq!(table.reverse_cumulative_sum(1), vec![3, 1, 1]);
        assert_eq!(table.reverse_cumulative_sum(0), Vec::<u64>::new());
    }

    #[test]
    fn test_empty_topics() {
        let mut table = DocTopicFreqTable::new(4);
        table.record(2, 5);
        assert_eq!(table.empty_topics(), vec![0, 1, 3]);
        assert!(table.has_documents(2));
    }

    #[test]
    fn test_merge() {
        let mut a = DocTopicFreqTable::new(2);
        let mut b = DocTopicFreqTable::new(2);
        a.record(0, 2);
        b.record(0, 2);
        b.record(0, 4);
        b.record(1, 1);
        a.merge(&b);
        assert_eq!(a.reverse_cumulative_sum(0), vec![3, 3, 1, 1]);
        assert_eq!(a.reverse_cumulative_sum(1), vec![1]);
    }

    #[test]
    fn test_swap_topics() {
        let mut table = DocTopicFreqTable::new(2);
        table.record(0, 2);
        table.swap_topics(0, 1);
        assert!(!table.has_documents(0));
        assert_eq!(table.reverse_cumulative_sum(1), vec![1, 1]);
    }
}

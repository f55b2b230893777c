const ABSENT: usize = usize::MAX;

/// A set of topic indices over a fixed universe `[0, n_slots)`, with O(1)
/// insert, remove, and membership.
///
/// Members live in a dense array; `position` maps a topic index back to its
/// slot in that array. Removal swaps the removed member with the last live
/// member and truncates, so iteration order is unspecified.
///
/// The same structure serves two roles: the per-document set of topics with
/// nonzero local count, and the global active-topic set.
#[derive(Debug, Clone)]
pub struct TopicSet {
    members: Vec<usize>,
    position: Vec<usize>,
}

impl TopicSet {
    pub fn new(n_slots: usize) -> Self {
        Self {
            members: Vec::with_capacity(n_slots),
            position: vec![ABSENT; n_slots],
        }
    }

    /// The set `{0, 1, ..., n_members - 1}` over a universe of `n_slots`.
    pub fn first(n_members: usize, n_slots: usize) -> Self {
        let mut set = Self::new(n_slots);
        for topic in 0..n_members {
            set.insert(topic);
        }
        set
    }

    pub fn n_slots(&self) -> usize {
        self.position.len()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, topic: usize) -> bool {
        self.position[topic] != ABSENT
    }

    /// Returns false if the topic was already a member.
    pub fn insert(&mut self, topic: usize) -> bool {
        if self.contains(topic) {
            return false;
        }
        self.position[topic] = self.members.len();
        self.members.push(topic);
        true
    }

    /// Returns false if the topic was not a member.
    pub fn remove(&mut self, topic: usize) -> bool {
        let slot = self.position[topic];
        if slot == ABSENT {
            return false;
        }
        let last = self.members[self.members.len() - 1];
        self.members[slot] = last;
        self.position[last] = slot;
        self.members.pop();
        self.position[topic] = ABSENT;
        true
    }

    pub fn clear(&mut self) {
        for &topic in &self.members {
            self.position[topic] = ABSENT;
        }
        self.members.clear();
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.members
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.members.iter().copied()
    }

    /// Members in ascending order; for reporting, not for sampling paths.
    pub fn sorted(&self) -> Vec<usize> {
        let mut members = self.members.clone();
        members.sort_unstable();
        members
    }
}

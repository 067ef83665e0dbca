//! Dense set of currently infected vertices.
//!
//! Infected vertices occupy the first `len` slots of `slots`, and `position`
//! maps a vertex to its slot. Removal swaps the last occupied slot into the
//! vacated one, so every operation is O(1) but slot order is not stable.

use rand::Rng;

#[derive(Clone, Debug)]
pub struct InfectedSet {
    slots: Vec<usize>,
    slot_degrees: Vec<usize>,
    position: Vec<Option<usize>>,
    sum_degrees: usize,
}

impl InfectedSet {
    /// Empty set able to hold vertices `0..n_nodes`.
    pub fn new(n_nodes: usize) -> Self {
        Self {
            slots: Vec::with_capacity(n_nodes),
            slot_degrees: Vec::with_capacity(n_nodes),
            position: vec![None; n_nodes],
            sum_degrees: 0,
        }
    }

    /// Number of infected vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Running sum of the degrees of all members.
    #[inline]
    pub fn sum_degrees(&self) -> usize {
        self.sum_degrees
    }

    /// Whether `v` is currently infected.
    #[inline]
    pub fn contains(&self, v: usize) -> bool {
        self.position[v].is_some()
    }

    /// Append `v` at the next free slot.
    ///
    /// Returns `false` and leaves the set untouched if `v` is already present.
    pub fn insert(&mut self, v: usize, degree: usize) -> bool {
        if self.position[v].is_some() {
            return false;
        }
        self.position[v] = Some(self.slots.len());
        self.slots.push(v);
        self.slot_degrees.push(degree);
        self.sum_degrees += degree;
        true
    }

    /// Remove the vertex at `slot`, moving the last member into its place.
    ///
    /// Returns the removed vertex.
    pub fn remove_at(&mut self, slot: usize) -> usize {
        let removed = self.slots.swap_remove(slot);
        let degree = self.slot_degrees.swap_remove(slot);
        if let Some(&moved) = self.slots.get(slot) {
            self.position[moved] = Some(slot);
        }
        self.position[removed] = None;
        self.sum_degrees -= degree;
        removed
    }

    /// Remove `v` by identity. Returns `false` if it was not a member.
    pub fn remove(&mut self, v: usize) -> bool {
        match self.position[v] {
            Some(slot) => {
                self.remove_at(slot);
                true
            }
            None => false,
        }
    }

    /// Uniformly random occupied slot and its vertex, or `None` when empty.
    pub fn pick_uniform<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(usize, usize)> {
        if self.slots.is_empty() {
            return None;
        }
        let slot = rng.gen_range(0..self.slots.len());
        Some((slot, self.slots[slot]))
    }

    /// Members in slot order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn assert_consistent(set: &InfectedSet, degrees: &[usize]) {
        let members: Vec<usize> = set.iter().collect();
        let marked = (0..degrees.len()).filter(|&v| set.contains(v)).count();
        assert_eq!(members.len(), marked);
        assert_eq!(set.sum_degrees(), members.iter().map(|&v| degrees[v]).sum::<usize>());
        assert!(members.iter().all(|&v| set.contains(v)));
    }

    #[test]
    fn test_insert_and_remove_at() {
        let degrees = [3, 1, 4, 1, 5];
        let mut set = InfectedSet::new(degrees.len());
        for v in [0, 2, 4] {
            assert!(set.insert(v, degrees[v]));
        }
        assert_eq!(set.len(), 3);
        assert_eq!(set.sum_degrees(), 12);

        // Removing slot 0 moves vertex 4 from the last slot into it.
        assert_eq!(set.remove_at(0), 0);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![4, 2]);
        assert!(!set.contains(0));
        assert_eq!(set.sum_degrees(), 9);
        assert_consistent(&set, &degrees);
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let mut set = InfectedSet::new(3);
        assert!(set.insert(1, 2));
        assert!(!set.insert(1, 2));
        assert_eq!(set.len(), 1);
        assert_eq!(set.sum_degrees(), 2);
    }

    #[test]
    fn test_remove_last_slot() {
        let mut set = InfectedSet::new(3);
        set.insert(0, 1);
        set.insert(1, 1);
        assert_eq!(set.remove_at(1), 1);
        assert_eq!(set.len(), 1);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![0]);
        assert!(set.remove(0));
        assert!(set.is_empty());
        assert!(!set.remove(0));
    }

    #[test]
    fn test_random_churn_keeps_invariants() {
        let degrees: Vec<usize> = (0..50).map(|v| v % 7 + 1).collect();
        let mut set = InfectedSet::new(degrees.len());
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..2_000 {
            if rng.gen_bool(0.55) {
                let v = rng.gen_range(0..degrees.len());
                set.insert(v, degrees[v]);
            } else if let Some((slot, _)) = set.pick_uniform(&mut rng) {
                set.remove_at(slot);
            }
            assert_consistent(&set, &degrees);
        }
    }

    #[test]
    fn test_pick_uniform_empty() {
        let set = InfectedSet::new(4);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(set.pick_uniform(&mut rng).is_none());
    }
}

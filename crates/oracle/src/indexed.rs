use crate::sum_table::SumTable;
use crate::SumSetOracle;
use erdos_bigint::BigUint;

/// Collision oracle that materializes every live subset sum in a hashed
/// set, trading memory (`2^len()` entries) for O(1)-ish admissibility
/// checks.
pub struct IndexedOracle {
    elements: Vec<BigUint>,
    sums: SumTable,
    /// Per-depth undo frames, pooled and indexed by depth-before-push so a
    /// frame's backing `Vec` is reused every time that depth is revisited
    /// rather than reallocated.
    frames: Vec<Vec<u32>>,
}

impl IndexedOracle {
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
            sums: SumTable::new(),
            frames: Vec::new(),
        }
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            elements: Vec::with_capacity(n),
            sums: SumTable::new(),
            frames: Vec::with_capacity(n),
        }
    }
}

impl Default for IndexedOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl SumSetOracle for IndexedOracle {
    fn reset(&mut self) {
        self.elements.clear();
        self.sums.clear();
    }

    fn try_push(&mut self, x: BigUint) -> bool {
        if self.sums.contains(&x) {
            return false;
        }
        // Snapshot bounds memory to the table's current size (2^k - 1):
        // inserting into `self.sums` while iterating it would be unsound.
        let snapshot = self.sums.values_snapshot();
        for s in &snapshot {
            if self.sums.contains(&x.add(s)) {
                return false;
            }
        }

        let depth = self.elements.len();
        if depth >= self.frames.len() {
            self.frames.push(Vec::with_capacity(snapshot.len() + 1));
        }
        let frame = &mut self.frames[depth];
        frame.clear();

        frame.push(self.sums.insert(x.clone()));
        for s in &snapshot {
            frame.push(self.sums.insert(x.add(s)));
        }

        self.elements.push(x);
        true
    }

    fn pop(&mut self) {
        let depth = self
            .elements
            .len()
            .checked_sub(1)
            .expect("pop() with no successful push since reset()");
        // Frame contents are consumed, but the frame's own Vec stays in
        // `self.frames` at this depth for the next push to reuse.
        let node_indices: Vec<u32> = self.frames[depth].drain(..).collect();
        for idx in node_indices {
            self.sums.remove(idx);
        }
        self.elements.pop();
    }

    fn len(&self) -> usize {
        self.elements.len()
    }

    fn get(&self, index: usize) -> &BigUint {
        &self.elements[index]
    }

    fn snapshot(&self, out: &mut Vec<BigUint>) {
        out.clear();
        out.extend(self.elements.iter().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_duplicate_element() {
        let mut o = IndexedOracle::new();
        assert!(o.try_push(BigUint::from_u64(5)));
        assert!(!o.try_push(BigUint::from_u64(5)));
    }

    #[test]
    fn rejects_subset_sum_collision() {
        let mut o = IndexedOracle::new();
        assert!(o.try_push(BigUint::from_u64(1)));
        assert!(o.try_push(BigUint::from_u64(2)));
        // 3 = 1 + 2, collides with the existing pair sum
        assert!(!o.try_push(BigUint::from_u64(3)));
        assert!(o.try_push(BigUint::from_u64(4)));
    }

    #[test]
    fn pop_restores_prior_state() {
        let mut o = IndexedOracle::new();
        o.try_push(BigUint::from_u64(1));
        o.try_push(BigUint::from_u64(2));
        assert_eq!(o.sums.len(), 3); // {1, 2, 3}
        o.try_push(BigUint::from_u64(4));
        assert_eq!(o.sums.len(), 7); // {1,2,3,4,5,6,7}
        o.pop();
        assert_eq!(o.len(), 2);
        assert_eq!(o.sums.len(), 3);
        assert!(o.sums.contains(&BigUint::from_u64(3)));
        assert!(!o.sums.contains(&BigUint::from_u64(7)));
    }

    #[test]
    fn reset_clears_everything() {
        let mut o = IndexedOracle::new();
        o.try_push(BigUint::from_u64(1));
        o.try_push(BigUint::from_u64(2));
        o.reset();
        assert_eq!(o.len(), 0);
        assert_eq!(o.sums.len(), 0);
        assert!(o.try_push(BigUint::from_u64(1)));
    }

    #[test]
    #[should_panic]
    fn pop_without_push_panics() {
        let mut o = IndexedOracle::new();
        o.pop();
    }
}

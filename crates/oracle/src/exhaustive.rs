use crate::SumSetOracle;
use erdos_bigint::BigUint;

/// Collision oracle that stores only the element list and re-derives
/// admissibility on every call.
///
/// A prior implementation of this idea only checked collision class (a)
/// (`x` equal to an existing subset sum) and omitted class (b) (`{x} ∪ A`
/// colliding with a disjoint `B`) — that omission is a correctness bug, not
/// a legitimate simplification, so this implementation checks both.
pub struct ExhaustiveOracle {
    elements: Vec<BigUint>,
}

impl ExhaustiveOracle {
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
        }
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            elements: Vec::with_capacity(n),
        }
    }

    /// True iff appending `x` would introduce a collision: `x` equal to
    /// some existing subset sum (class a), or `x + sum(A) == sum(B)` for
    /// some disjoint `A, B ⊆ elements` with `B` nonempty (class b, which
    /// subsumes class a at `A = ∅`).
    ///
    /// Enumerated by recursing over the element list with each element
    /// assigned to `A`, `B`, or neither — `O(3^k)` calls, `O(k)` stack
    /// depth. This sidesteps the native-word bitmask-counter limit the
    /// spec's `OversizedExhaustive` error kind guards against in a
    /// mask-based enumeration; the defensive cap below exists for
    /// pathologically large `k` regardless.
    fn collides(&self, x: &BigUint) -> bool {
        const OVERSIZED_LIMIT: usize = 4096;
        if self.elements.len() > OVERSIZED_LIMIT {
            tracing::error!(
                k = self.elements.len(),
                limit = OVERSIZED_LIMIT,
                "exhaustive oracle enumeration width exceeded; conservatively reporting a collision"
            );
            return true;
        }
        recurse(&self.elements, 0, &BigUint::zero(), &BigUint::zero(), false, x)
    }
}

fn recurse(
    elements: &[BigUint],
    idx: usize,
    sum_a: &BigUint,
    sum_b: &BigUint,
    any_b: bool,
    x: &BigUint,
) -> bool {
    if idx == elements.len() {
        return any_b && &x.add(sum_a) == sum_b;
    }
    let e = &elements[idx];
    if recurse(elements, idx + 1, sum_a, sum_b, any_b, x) {
        return true;
    }
    if recurse(elements, idx + 1, &sum_a.add(e), sum_b, any_b, x) {
        return true;
    }
    recurse(elements, idx + 1, sum_a, &sum_b.add(e), true, x)
}

impl Default for ExhaustiveOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl SumSetOracle for ExhaustiveOracle {
    fn reset(&mut self) {
        self.elements.clear();
    }

    fn try_push(&mut self, x: BigUint) -> bool {
        if self.collides(&x) {
            return false;
        }
        self.elements.push(x);
        true
    }

    fn pop(&mut self) {
        self.elements
            .pop()
            .expect("pop() with no successful push since reset()");
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
        let mut o = ExhaustiveOracle::new();
        assert!(o.try_push(BigUint::from_u64(5)));
        assert!(!o.try_push(BigUint::from_u64(5)));
    }

    #[test]
    fn rejects_subset_sum_collision() {
        let mut o = ExhaustiveOracle::new();
        assert!(o.try_push(BigUint::from_u64(1)));
        assert!(o.try_push(BigUint::from_u64(2)));
        assert!(!o.try_push(BigUint::from_u64(3)));
        assert!(o.try_push(BigUint::from_u64(4)));
    }

    #[test]
    fn rejects_cross_collision_class_b() {
        // E = {1, 2, 4}; with x = 7: {1,2,4} sums to 7 directly (class a).
        let mut o = ExhaustiveOracle::new();
        o.try_push(BigUint::from_u64(1));
        o.try_push(BigUint::from_u64(2));
        o.try_push(BigUint::from_u64(4));
        assert!(!o.try_push(BigUint::from_u64(7)));

        // E = {3, 5}; x = 2 gives {2,5} vs {3}: 2+5 == ... actually check a
        // genuine class-(b)-only collision: E = {1, 4}, x = 3:
        // {x} ∪ {1} = {3,1} sums to 4, collides with B = {4}. x itself (3)
        // is not an existing subset sum (subset sums of {1,4} are 1,4,5).
        let mut o2 = ExhaustiveOracle::new();
        o2.try_push(BigUint::from_u64(1));
        o2.try_push(BigUint::from_u64(4));
        assert!(!o2.try_push(BigUint::from_u64(3)));
    }

    #[test]
    fn pop_restores_prior_state() {
        let mut o = ExhaustiveOracle::new();
        o.try_push(BigUint::from_u64(1));
        o.try_push(BigUint::from_u64(2));
        o.try_push(BigUint::from_u64(4));
        o.pop();
        assert_eq!(o.len(), 2);
        assert!(o.try_push(BigUint::from_u64(4)));
    }
}

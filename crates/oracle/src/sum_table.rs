//! A hashed set of [`BigUint`] values backed by a node arena with a
//! free-list, so that the millions of insert/remove pairs the engine's hot
//! path performs do not pressure the allocator.

use erdos_bigint::BigUint;

const NIL: u32 = u32::MAX;

struct Node {
    value: BigUint,
    hash: u64,
    next: u32,
}

/// Open hash set with separate chaining over a pooled node arena.
///
/// `insert` returns the arena index of the inserted node; callers that need
/// to undo an insertion later (the oracle's undo frames) keep that index
/// and pass it back to `remove`.
pub struct SumTable {
    buckets: Vec<u32>,
    nodes: Vec<Node>,
    free_list: Vec<u32>,
    len: usize,
}

const INITIAL_BUCKETS: usize = 16;
const LOAD_FACTOR_NUM: usize = 3;
const LOAD_FACTOR_DEN: usize = 4;

impl SumTable {
    pub fn new() -> Self {
        Self {
            buckets: vec![NIL; INITIAL_BUCKETS],
            nodes: Vec::with_capacity(512),
            free_list: Vec::with_capacity(512),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn contains(&self, value: &BigUint) -> bool {
        let hash = value.mix_hash();
        let bucket = (hash as usize) % self.buckets.len();
        let mut cur = self.buckets[bucket];
        while cur != NIL {
            let node = &self.nodes[cur as usize];
            if node.hash == hash && &node.value == value {
                return true;
            }
            cur = node.next;
        }
        false
    }

    /// Inserts `value` (assumed not already present) and returns the arena
    /// index recording where it landed.
    pub fn insert(&mut self, value: BigUint) -> u32 {
        if (self.len + 1) * LOAD_FACTOR_DEN > self.buckets.len() * LOAD_FACTOR_NUM {
            self.grow();
        }
        let hash = value.mix_hash();
        let bucket = (hash as usize) % self.buckets.len();
        let next = self.buckets[bucket];
        let node = Node { value, hash, next };
        let idx = if let Some(reused) = self.free_list.pop() {
            self.nodes[reused as usize] = node;
            reused
        } else {
            let idx = self.nodes.len() as u32;
            self.nodes.push(node);
            idx
        };
        self.buckets[bucket] = idx;
        self.len += 1;
        idx
    }

    /// Removes the node at `idx`, unlinking it from its bucket chain and
    /// returning it to the free-list.
    pub fn remove(&mut self, idx: u32) {
        let hash = self.nodes[idx as usize].hash;
        let bucket = (hash as usize) % self.buckets.len();
        let mut cur = self.buckets[bucket];
        if cur == idx {
            self.buckets[bucket] = self.nodes[idx as usize].next;
        } else {
            while cur != NIL {
                let next = self.nodes[cur as usize].next;
                if next == idx {
                    self.nodes[cur as usize].next = self.nodes[idx as usize].next;
                    break;
                }
                cur = next;
            }
        }
        self.free_list.push(idx);
        self.len -= 1;
    }

    /// Returns every live value, visiting only active chain entries (never
    /// the recycled, unlinked nodes) — the snapshot is exactly `self.len()`
    /// elements.
    pub fn values_snapshot(&self) -> Vec<BigUint> {
        let mut out = Vec::with_capacity(self.len);
        for &head in &self.buckets {
            let mut cur = head;
            while cur != NIL {
                let node = &self.nodes[cur as usize];
                out.push(node.value.clone());
                cur = node.next;
            }
        }
        out
    }

    /// Recycles every live node in one sweep, without shrinking backing
    /// storage.
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            *bucket = NIL;
        }
        self.free_list.clear();
        self.free_list.extend(0..self.nodes.len() as u32);
        self.len = 0;
    }

    fn grow(&mut self) {
        let new_len = self.buckets.len() * 2;
        let mut new_buckets = vec![NIL; new_len];
        for &head in &self.buckets {
            let mut cur = head;
            while cur != NIL {
                let next = self.nodes[cur as usize].next;
                let new_bucket = (self.nodes[cur as usize].hash as usize) % new_len;
                self.nodes[cur as usize].next = new_buckets[new_bucket];
                new_buckets[new_bucket] = cur;
                cur = next;
            }
        }
        self.buckets = new_buckets;
    }
}

impl Default for SumTable {
    fn default() -> Self {
        Self::new()
    }
}

//! The subset-sum collision oracle: given a strictly increasing sequence of
//! elements known to have the B-property (all subset sums distinct), decide
//! whether a new element can be appended without breaking it.
//!
//! Two back-ends implement [`SumSetOracle`]: [`IndexedOracle`], which keeps
//! every live subset sum in a hashed set for O(1)-ish membership tests, and
//! [`ExhaustiveOracle`], which keeps no derived state and re-derives the
//! answer from the element list on every call. [`BacktrackEngine`] in
//! `erdos_engine` is generic over this trait, so the choice between the two
//! is resolved at a single call site rather than through a vtable on the
//! hot path (see `erdos_engine::BacktrackEngine::solve`).

mod exhaustive;
mod indexed;
mod sum_table;

pub use exhaustive::ExhaustiveOracle;
pub use indexed::IndexedOracle;

use erdos_bigint::BigUint;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("pop() called with no successful push since the last reset()")]
    PopUnderflow,
}

/// Capability set the backtracking engine needs from a collision oracle.
///
/// Implementations must uphold the B-property invariant: after any sequence
/// of successful `try_push`/`pop` calls, all `2^len()` subset sums of the
/// current elements are pairwise distinct.
pub trait SumSetOracle {
    fn reset(&mut self);

    /// Attempts to append `x`. On success, the oracle's element sequence now
    /// ends with `x` and the B-property still holds; on failure, there is no
    /// observable change.
    fn try_push(&mut self, x: BigUint) -> bool;

    /// Undoes the most recent successful `try_push`. Panics if there has
    /// been no successful push since construction or the last `reset`.
    fn pop(&mut self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, index: usize) -> &BigUint;

    fn snapshot(&self, out: &mut Vec<BigUint>);
}

/// Which [`SumSetOracle`] back-end to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleKind {
    Indexed,
    Exhaustive,
    Auto,
}

impl std::str::FromStr for OracleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "indexed" => Ok(OracleKind::Indexed),
            "exhaustive" => Ok(OracleKind::Exhaustive),
            "auto" => Ok(OracleKind::Auto),
            other => Err(format!("unknown oracle kind {other:?}")),
        }
    }
}

/// The N below which the `Auto` selection rule picks [`IndexedOracle`]; at
/// or above this width `2^N` subset sums would make the hashed set's memory
/// footprint impractical, so [`ExhaustiveOracle`] is used instead.
pub const AUTO_INDEXED_MAX_N: usize = 25;

/// Resolves [`OracleKind::Auto`] for a target sequence length, and
/// downgrades an explicit `Indexed` request that would be impractical,
/// logging a warning (spec's `ConfigDowngrade`).
pub fn resolve_oracle_kind(requested: OracleKind, target_n: usize) -> OracleKind {
    match requested {
        OracleKind::Auto => {
            if target_n < AUTO_INDEXED_MAX_N {
                OracleKind::Indexed
            } else {
                OracleKind::Exhaustive
            }
        }
        OracleKind::Indexed if target_n >= AUTO_INDEXED_MAX_N => {
            tracing::warn!(
                target_n,
                limit = AUTO_INDEXED_MAX_N,
                "Indexed oracle requested for N at or above the practical memory limit; downgrading to Exhaustive"
            );
            OracleKind::Exhaustive
        }
        other => other,
    }
}

// Cross-back-end agreement and undo-exactness
// are covered by `tests/cross_check.rs`, which also brings in a third,
// independent brute-force reference oracle.

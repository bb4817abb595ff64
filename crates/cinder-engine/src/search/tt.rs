//! Fixed-capacity transposition table with mate-distance-safe scoring.
//!
//! `2^k` slots indexed by `hash & (len - 1)`, always-replace. Mate scores are
//! stored relative to the root (ply folded in on store, folded out on probe)
//! so an entry written deep in one line still reads as the same absolute
//! distance to mate anywhere else in the tree.

use cinder_core::Move;

use crate::search::negamax::{MATE_SCORE, MATE_THRESHOLD};

/// log2 of the default table size: 2^21 slots, about 48 MB.
pub const DEFAULT_TT_BITS: u32 = 21;

/// Bound semantics of a stored score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// Empty slot sentinel.
    None,
    /// The stored score is exact.
    Exact,
    /// The stored score is a lower bound (the node failed high).
    Lower,
    /// The stored score is an upper bound (the node failed low).
    Upper,
}

#[derive(Debug, Clone)]
struct TtEntry {
    key: u64,
    score: i32,
    depth: i16,
    bound: Bound,
    best_move: Option<Move>,
}

impl TtEntry {
    const EMPTY: TtEntry = TtEntry {
        key: 0,
        score: 0,
        depth: -1,
        bound: Bound::None,
        best_move: None,
    };
}

/// Result of a table probe.
#[derive(Debug, Clone)]
pub enum Probe {
    /// The entry is deep enough and its bound settles the current window;
    /// the caller may return `score` directly (except at the root).
    Cutoff {
        /// Stored score, mate distances already adjusted to the probing ply.
        score: i32,
        /// Bound kind of the stored score.
        bound: Bound,
        /// Best move recorded for this position, if any.
        best_move: Option<Move>,
    },
    /// The entry matches but cannot cut; its move still seeds ordering.
    MoveOnly(Move),
    /// No entry for this position.
    Miss,
}

/// Convert a search score into its stored, root-relative form.
fn score_to_tt(score: i32, ply: usize) -> i32 {
    if score.abs() >= MATE_SCORE - MATE_THRESHOLD {
        score + score.signum() * ply as i32
    } else {
        score
    }
}

/// Reverse [`score_to_tt`] at the probing ply.
fn score_from_tt(score: i32, ply: usize) -> i32 {
    if score.abs() >= MATE_SCORE - MATE_THRESHOLD {
        score - score.signum() * ply as i32
    } else {
        score
    }
}

/// Hit and store counters, reported by the UCI `ttstats` command.
#[derive(Debug, Clone, Copy, Default)]
pub struct TtStats {
    /// Probes that found a matching key.
    pub hits: u64,
    /// Entries written.
    pub stores: u64,
    /// Total slot count.
    pub slots: usize,
}

/// Always-replace transposition table.
pub struct TranspositionTable {
    entries: Box<[TtEntry]>,
    mask: u64,
    hits: u64,
    stores: u64,
}

impl TranspositionTable {
    /// Create a table with `2^bits` slots.
    pub fn new(bits: u32) -> Self {
        let len = 1usize << bits;
        Self {
            entries: vec![TtEntry::EMPTY; len].into_boxed_slice(),
            mask: (len - 1) as u64,
            hits: 0,
            stores: 0,
        }
    }

    /// Reset every slot to the empty sentinel and zero the counters.
    pub fn clear(&mut self) {
        self.entries.fill(TtEntry::EMPTY);
        self.hits = 0;
        self.stores = 0;
    }

    /// Probe for `key` at `ply` with the current window.
    ///
    /// A [`Probe::Cutoff`] is returned only when the stored key matches, the
    /// stored depth is at least `depth`, and the bound settles the window:
    /// exact always, a lower bound when `score >= beta`, an upper bound when
    /// `score <= alpha`. The comparison uses the ply-adjusted score.
    pub fn probe(&mut self, key: u64, depth: i32, alpha: i32, beta: i32, ply: usize) -> Probe {
        let entry = &self.entries[(key & self.mask) as usize];
        if entry.bound == Bound::None || entry.key != key {
            return Probe::Miss;
        }
        self.hits += 1;

        if i32::from(entry.depth) >= depth {
            let score = score_from_tt(entry.score, ply);
            let usable = match entry.bound {
                Bound::Exact => true,
                Bound::Lower => score >= beta,
                Bound::Upper => score <= alpha,
                Bound::None => false,
            };
            if usable {
                return Probe::Cutoff {
                    score,
                    bound: entry.bound,
                    best_move: entry.best_move.clone(),
                };
            }
        }

        match entry.best_move.clone() {
            Some(m) => Probe::MoveOnly(m),
            None => Probe::Miss,
        }
    }

    /// Store a search result, replacing whatever occupies the slot.
    pub fn store(
        &mut self,
        key: u64,
        depth: i32,
        score: i32,
        bound: Bound,
        best_move: Option<Move>,
        ply: usize,
    ) {
        debug_assert!(bound != Bound::None, "storing the empty sentinel");
        let index = (key & self.mask) as usize;
        self.entries[index] = TtEntry {
            key,
            score: score_to_tt(score, ply),
            depth: depth.clamp(i16::MIN as i32, i16::MAX as i32) as i16,
            bound,
            best_move,
        };
        self.stores += 1;
    }

    /// Current hit/store counters.
    pub fn stats(&self) -> TtStats {
        TtStats {
            hits: self.hits,
            stores: self.stores,
            slots: self.entries.len(),
        }
    }
}

impl std::fmt::Debug for TranspositionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranspositionTable")
            .field("slots", &self.entries.len())
            .field("hits", &self.hits)
            .field("stores", &self.stores)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinder_core::Position;

    fn some_move() -> Move {
        let pos = Position::starting_position();
        pos.parse_uci_move("e2e4").unwrap()
    }

    #[test]
    fn store_then_probe_round_trips() {
        let mut tt = TranspositionTable::new(10);
        let key = 0xDEAD_BEEF_1234_5678;
        let m = some_move();

        tt.store(key, 5, 100, Bound::Exact, Some(m.clone()), 3);

        match tt.probe(key, 5, -1000, 1000, 3) {
            Probe::Cutoff { score, bound, best_move } => {
                assert_eq!(score, 100);
                assert_eq!(bound, Bound::Exact);
                assert_eq!(best_move, Some(m));
            }
            other => panic!("expected cutoff, got {other:?}"),
        }
    }

    #[test]
    fn probe_miss_on_empty_table() {
        let mut tt = TranspositionTable::new(10);
        assert!(matches!(tt.probe(0x1234, 1, -10, 10, 0), Probe::Miss));
    }

    #[test]
    fn key_zero_is_not_a_phantom_hit() {
        // The sentinel key is 0; an actual probe for hash 0 must miss on a
        // cleared table rather than read the sentinel as a stored entry.
        let mut tt = TranspositionTable::new(10);
        assert!(matches!(tt.probe(0, 0, -10, 10, 0), Probe::Miss));
    }

    #[test]
    fn shallow_entry_yields_move_only() {
        let mut tt = TranspositionTable::new(10);
        let key = 0xABCD_EF01_2345_6789;
        let m = some_move();

        tt.store(key, 3, 50, Bound::Exact, Some(m.clone()), 0);

        match tt.probe(key, 6, -1000, 1000, 0) {
            Probe::MoveOnly(found) => assert_eq!(found, m),
            other => panic!("expected move-only, got {other:?}"),
        }
    }

    #[test]
    fn lower_bound_cuts_only_at_or_above_beta() {
        let mut tt = TranspositionTable::new(10);
        let key = 0x1111_2222_3333_4444;

        tt.store(key, 4, 250, Bound::Lower, None, 0);

        assert!(matches!(
            tt.probe(key, 4, 0, 200, 0),
            Probe::Cutoff { score: 250, .. }
        ));
        // Below the stored lower bound the window is not settled, and with
        // no stored move there is nothing to seed ordering with.
        assert!(matches!(tt.probe(key, 4, 0, 300, 0), Probe::Miss));
    }

    #[test]
    fn upper_bound_cuts_only_at_or_below_alpha() {
        let mut tt = TranspositionTable::new(10);
        let key = 0x5555_6666_7777_8888;

        tt.store(key, 4, -80, Bound::Upper, None, 0);

        assert!(matches!(
            tt.probe(key, 4, -50, 50, 0),
            Probe::Cutoff { score: -80, .. }
        ));
        assert!(matches!(tt.probe(key, 4, -100, 50, 0), Probe::Miss));
    }

    #[test]
    fn mate_scores_translate_between_plies() {
        let mut tt = TranspositionTable::new(10);
        let key = 0x9999_AAAA_BBBB_CCCC;

        // Mate in 5 plies seen from ply 2.
        let score_at_p1 = MATE_SCORE - 5;
        tt.store(key, 8, score_at_p1, Bound::Exact, None, 2);

        // Probed from ply 4 the same mate is two plies closer to the root
        // horizon, so the adjusted score shrinks by the ply difference.
        match tt.probe(key, 8, -MATE_SCORE, MATE_SCORE, 4) {
            Probe::Cutoff { score, .. } => assert_eq!(score, score_at_p1 - 2),
            other => panic!("expected cutoff, got {other:?}"),
        }
    }

    #[test]
    fn mated_scores_translate_the_other_way() {
        let mut tt = TranspositionTable::new(10);
        let key = 0xCCCC_DDDD_EEEE_FFFF;

        let score_at_p6 = -(MATE_SCORE - 6);
        tt.store(key, 8, score_at_p6, Bound::Exact, None, 6);

        match tt.probe(key, 8, -MATE_SCORE, MATE_SCORE, 2) {
            Probe::Cutoff { score, .. } => assert_eq!(score, score_at_p6 - 4),
            other => panic!("expected cutoff, got {other:?}"),
        }
    }

    #[test]
    fn same_ply_mate_round_trip_is_identity() {
        let mut tt = TranspositionTable::new(10);
        let key = 0x0F0F_0F0F_F0F0_F0F0;
        let score = MATE_SCORE - 3;

        tt.store(key, 2, score, Bound::Exact, None, 7);
        match tt.probe(key, 2, -MATE_SCORE, MATE_SCORE, 7) {
            Probe::Cutoff { score: probed, .. } => assert_eq!(probed, score),
            other => panic!("expected cutoff, got {other:?}"),
        }
    }

    #[test]
    fn always_replace_overwrites_deeper_entries() {
        let mut tt = TranspositionTable::new(10);
        let key = 0x2468_ACE0_1357_9BDF;

        tt.store(key, 9, 10, Bound::Exact, None, 0);
        tt.store(key, 1, 20, Bound::Exact, None, 0);

        match tt.probe(key, 1, -1000, 1000, 0) {
            Probe::Cutoff { score, .. } => assert_eq!(score, 20),
            other => panic!("expected cutoff, got {other:?}"),
        }
    }

    #[test]
    fn clear_empties_every_slot_and_counter() {
        let mut tt = TranspositionTable::new(10);
        let key = 0x1357_9BDF_2468_ACE0;
        tt.store(key, 4, 42, Bound::Exact, None, 0);
        assert!(!matches!(tt.probe(key, 4, -100, 100, 0), Probe::Miss));

        tt.clear();
        assert!(matches!(tt.probe(key, 4, -100, 100, 0), Probe::Miss));
        assert_eq!(tt.stats().hits, 0);
        assert_eq!(tt.stats().stores, 0);
    }
}

//! MTD-bi iterative deepening over mailbox positions.
//!
//! Each depth is solved by a binary search over null-window `bound` calls.
//! Results are handed out one depth at a time through [`SearchIter`], so a
//! consumer decides after every completed depth whether to keep going.

use std::cmp::Reverse;
use std::collections::HashMap;

use crate::search::{Move, SearchProgress};

use super::position::Position;
use super::pst::MATERIAL;

/// Scores at or beyond this mean a king has been or will be taken.
pub const MATE_LOWER: i32 = MATERIAL[5] - 10 * MATERIAL[4];
pub const MATE_UPPER: i32 = MATERIAL[5] + 10 * MATERIAL[4];

/// Minimum gain for a move to be searched in quiescence.
const QS_LIMIT: i32 = 219;

/// Precision at which the MTD-bi window is considered closed.
const EVAL_ROUGHNESS: i32 = 13;

/// Entries kept per table before it is cleared.
const TABLE_SIZE: usize = 1 << 20;

pub const DEFAULT_MAX_DEPTH: u32 = 64;

#[derive(Clone, Copy, Debug)]
struct Bounds {
    lower: i32,
    upper: i32,
}

impl Bounds {
    const OPEN: Self = Bounds {
        lower: -MATE_UPPER,
        upper: MATE_UPPER,
    };
}

/// Search state kept between iterations: score bounds and best moves.
pub struct Searcher {
    scores: HashMap<(u64, i32, bool), Bounds>,
    moves: HashMap<u64, Move>,
    nodes: u64,
    max_depth: u32,
}

impl Default for Searcher {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl Searcher {
    #[must_use]
    pub fn new(max_depth: u32) -> Self {
        Searcher {
            scores: HashMap::new(),
            moves: HashMap::new(),
            nodes: 0,
            max_depth: max_depth.max(1),
        }
    }

    /// Nodes visited by the current search.
    #[must_use]
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Start a search from depth 1. Best moves from earlier searches are
    /// kept for ordering; score bounds are not.
    pub fn search(&mut self, root: Position) -> SearchIter<'_> {
        self.nodes = 0;
        self.scores.clear();
        let legal = root.legal_moves();
        SearchIter {
            searcher: self,
            root_key: root.key(),
            root,
            legal,
            depth: 0,
            finished: false,
        }
    }

    fn store_move(&mut self, key: u64, mv: Move) {
        if self.moves.len() > TABLE_SIZE {
            self.moves.clear();
        }
        self.moves.insert(key, mv);
    }

    /// Fail-soft null-window search: returns a score `>= gamma` if the
    /// position is worth at least `gamma`, a score `< gamma` otherwise.
    fn bound(&mut self, pos: &Position, gamma: i32, depth: i32, root: bool) -> i32 {
        self.nodes += 1;
        let depth = depth.max(0);

        // The mover's king is gone
        if pos.score() <= -MATE_LOWER {
            return -MATE_UPPER;
        }

        let key = pos.key();
        let entry = self
            .scores
            .get(&(key, depth, root))
            .copied()
            .unwrap_or(Bounds::OPEN);
        if entry.lower >= gamma && (!root || self.moves.contains_key(&key)) {
            return entry.lower;
        }
        if entry.upper < gamma {
            return entry.upper;
        }

        let mut best = -MATE_UPPER;

        if depth > 0 && !root && pos.has_officers() {
            best = best.max(-self.bound(&pos.null_move(), 1 - gamma, depth - 3, false));
        }
        if best < gamma && depth == 0 {
            best = best.max(pos.score());
        }

        if best < gamma {
            let killer = self
                .moves
                .get(&key)
                .copied()
                .filter(|mv| pos.board()[mv.from()].is_ascii_uppercase());
            if let Some(killer) = killer {
                if depth > 0 || pos.value(killer) >= QS_LIMIT {
                    best = best.max(-self.bound(&pos.make_move(killer), 1 - gamma, depth - 1, false));
                }
            }
        }

        if best < gamma {
            let mut moves = pos.gen_moves();
            moves.sort_by_cached_key(|&mv| Reverse(pos.value(mv)));
            for mv in moves {
                if depth == 0 && pos.value(mv) < QS_LIMIT {
                    // Sorted, so nothing after this qualifies either
                    break;
                }
                best = best.max(-self.bound(&pos.make_move(mv), 1 - gamma, depth - 1, false));
                if best >= gamma {
                    self.store_move(key, mv);
                    break;
                }
            }
        }

        if self.scores.len() > TABLE_SIZE {
            self.scores.clear();
        }
        let stored = if best >= gamma {
            Bounds {
                lower: best,
                upper: entry.upper,
            }
        } else {
            Bounds {
                lower: entry.lower,
                upper: best,
            }
        };
        self.scores.insert((key, depth, root), stored);
        best
    }
}

/// Lazy sequence of search results, one per depth.
///
/// Ends when the root has no legal move, once a forced mate is proven, or at
/// the searcher's maximum depth. Nothing is computed until `next` is called.
pub struct SearchIter<'a> {
    searcher: &'a mut Searcher,
    root: Position,
    root_key: u64,
    legal: Vec<Move>,
    depth: u32,
    finished: bool,
}

impl SearchIter<'_> {
    /// Legal moves at the root.
    #[must_use]
    pub fn root_moves(&self) -> &[Move] {
        &self.legal
    }
}

impl Iterator for SearchIter<'_> {
    type Item = SearchProgress;

    fn next(&mut self) -> Option<SearchProgress> {
        if self.finished || self.depth >= self.searcher.max_depth {
            return None;
        }
        let fallback = *self.legal.first()?;
        self.depth += 1;
        let depth = self.depth as i32;

        let (mut lower, mut upper) = (-MATE_UPPER, MATE_UPPER);
        while lower < upper - EVAL_ROUGHNESS {
            let gamma = (lower + upper + 1).div_euclid(2);
            let score = self.searcher.bound(&self.root, gamma, depth, true);
            if score >= gamma {
                lower = score;
            } else {
                upper = score;
            }
        }
        // Make sure the root has a stored move for the final window
        self.searcher.bound(&self.root, lower, depth, true);

        let best_move = self
            .searcher
            .moves
            .get(&self.root_key)
            .copied()
            .filter(|mv| self.legal.contains(mv))
            .unwrap_or(fallback);

        if lower.abs() >= MATE_LOWER {
            self.finished = true;
        }

        Some(SearchProgress {
            depth: self.depth,
            best_move,
            score: lower,
        })
    }
}

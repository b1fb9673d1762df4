//! Minimax search with alpha-beta pruning.
//!
//! This module implements the search-based player's engine:
//! - A static evaluator scoring colours won now and colours the end-game
//!   sweep would win, plus the game result once the game has ended
//! - Depth-limited minimax with alpha-beta pruning over every legal
//!   (connection, placement) pair
//! - Move ordering from a score cache keyed on position and move, filled by
//!   shallower iterative-deepening passes
//! - A cheaper one-ply lookahead ordering when the cache is disabled
//! - Optional node and wall-clock budgets
//!
//! Every ply works on its own clone of the state, so the caller's state is
//! never modified.

use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

use rustc_hash::{FxHashMap, FxHasher};
use tracing::{debug, info};

use crate::config::{ConfigError, Rewards, SearchConfig};
use crate::constants::{DEADLINE_CHECK_INTERVAL, SCORE_INFINITY};
use crate::movegen::{Move, apply_move, legal_moves};
use crate::state::{GameState, Phase, PlayerIndex};

/// Evaluation score, from one player's perspective.
pub type Score = i32;

// =============================================================================
// Evaluation
// =============================================================================

/// Difference in colour wins between `perspective` and the opponent.
fn colour_margin(wins: [usize; 2], perspective: PlayerIndex) -> i32 {
    wins[perspective] as i32 - wins[1 - perspective] as i32
}

/// Score `state` for `perspective`.
///
/// - `±rewards.game` if the game has ended (after simulating the sweep)
/// - `±rewards.colour` per colour won under current captures
/// - `±rewards.possible_colour` per colour won if the sweep ran now
///
/// The two colour terms may count the same colour twice. The sweep is run on
/// a private copy; `state` is not modified.
pub fn evaluate(state: &GameState, perspective: PlayerIndex, rewards: &Rewards) -> Score {
    let mut swept = state.clone();
    swept.collect_end_game_pieces();

    let mut score = 0;
    if state.phase != Phase::Playing {
        score += if swept.winner() == perspective {
            rewards.game
        } else {
            -rewards.game
        };
    }
    score += rewards.colour * colour_margin(state.colour_wins(), perspective);
    score += rewards.possible_colour * colour_margin(swept.colour_wins(), perspective);
    score
}

// =============================================================================
// Ordering Keys
// =============================================================================

/// Structural hash of everything that identifies a position.
pub fn position_key(state: &GameState) -> u64 {
    let mut h = FxHasher::default();
    state.current.hash(&mut h);
    state.phase.hash(&mut h);
    for player in &state.players {
        player.captured.len().hash(&mut h);
        for piece in &player.captured {
            piece.id.hash(&mut h);
        }
        player.tokens.len().hash(&mut h);
        for token in &player.tokens {
            token.pos.x.to_bits().hash(&mut h);
            token.pos.y.to_bits().hash(&mut h);
        }
    }
    for piece in &state.pieces {
        piece.id.hash(&mut h);
    }
    h.finish()
}

/// Hash of a candidate move played from the position with key `position`.
pub fn move_key(position: u64, mv: &Move) -> u64 {
    let mut h = FxHasher::default();
    position.hash(&mut h);
    mv.pieces.hash(&mut h);
    mv.placement.x.to_bits().hash(&mut h);
    mv.placement.y.to_bits().hash(&mut h);
    h.finish()
}

// =============================================================================
// Search
// =============================================================================

/// Counters for one decision.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    /// Deepest pass that ran to completion.
    pub depth: u32,
    pub elapsed: Duration,
    /// A node or time budget cut the search short.
    pub aborted: bool,
}

/// Outcome of a full decision.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SearchResult {
    pub best: Option<Move>,
    pub score: Score,
    pub stats: SearchStats,
}

/// Alpha-beta searcher with a per-decision ordering cache.
#[derive(Debug)]
pub struct SearchEngine {
    config: SearchConfig,
    cache: FxHashMap<u64, Score>,
    nodes: u64,
    started: Instant,
    stopped: bool,
}

impl SearchEngine {
    /// Engine for a validated `config`.
    pub fn new(config: SearchConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            config: config.validate()?,
            cache: FxHashMap::default(),
            nodes: 0,
            started: Instant::now(),
            stopped: false,
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Nodes visited since the last reset.
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Number of scored (position, move) entries.
    pub fn cached_scores(&self) -> usize {
        self.cache.len()
    }

    /// Forget cached scores and counters.
    pub fn reset(&mut self) {
        self.cache.clear();
        self.nodes = 0;
        self.stopped = false;
        self.started = Instant::now();
    }

    /// Pick a move for the player to move in `state`.
    ///
    /// With move ordering enabled, searches depths `1..=max_depth` sharing the
    /// score cache; otherwise searches `max_depth` once. If a budget trips, the
    /// deepest completed pass wins; an interrupted first pass still reports
    /// whatever it found.
    pub fn choose(&mut self, state: &GameState) -> SearchResult {
        self.reset();
        let perspective = state.current;
        let first = if self.config.order_moves {
            1
        } else {
            self.config.max_depth
        };

        let mut best = None;
        let mut score = -SCORE_INFINITY;
        let mut completed = 0;
        for depth in first..=self.config.max_depth {
            let (mv, s) = self.search(state, depth, perspective, true, -SCORE_INFINITY, SCORE_INFINITY);
            if self.stopped {
                if completed == 0 {
                    best = mv;
                    score = s;
                }
                break;
            }
            best = mv;
            score = s;
            completed = depth;
            debug!(depth, score, nodes = self.nodes, "search pass complete");
        }

        let stats = SearchStats {
            nodes: self.nodes,
            depth: completed,
            elapsed: self.started.elapsed(),
            aborted: self.stopped,
        };
        info!(
            score,
            nodes = stats.nodes,
            depth = stats.depth,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            aborted = stats.aborted,
            "search finished"
        );
        SearchResult { best, score, stats }
    }

    /// One ply of minimax with alpha-beta pruning.
    ///
    /// Scores are always from `perspective`'s view; `maximizing` says whether
    /// this ply picks the highest or lowest child. Returns the best move (none
    /// at leaves, or when no legal move exists) and its score.
    pub fn search(
        &mut self,
        state: &GameState,
        depth: u32,
        perspective: PlayerIndex,
        maximizing: bool,
        mut alpha: Score,
        mut beta: Score,
    ) -> (Option<Move>, Score) {
        self.nodes += 1;
        self.check_budget();

        if depth == 0 || state.phase != Phase::Playing {
            return (None, evaluate(state, perspective, &self.config.rewards));
        }

        let mut candidates = legal_moves(state, self.config.resolution);
        if candidates.is_empty() {
            return (None, evaluate(state, perspective, &self.config.rewards));
        }

        let position = self.config.order_moves.then(|| position_key(state));
        self.order_candidates(state, &mut candidates, depth, perspective, maximizing, position);

        let mut best_move = None;
        let mut best_score = if maximizing { -SCORE_INFINITY } else { SCORE_INFINITY };
        for mv in candidates {
            if self.stopped {
                break;
            }
            let mut child = state.clone();
            if let Err(err) = apply_move(&mut child, &mv) {
                debug!(%err, "skipping generated move");
                continue;
            }
            let (_, score) = self.search(&child, depth - 1, perspective, !maximizing, alpha, beta);
            if self.stopped {
                break;
            }
            if let Some(position) = position {
                self.cache.insert(move_key(position, &mv), score);
            }

            if maximizing {
                alpha = alpha.max(score);
                if score > best_score {
                    best_score = score;
                    best_move = Some(mv);
                }
            } else {
                beta = beta.min(score);
                if score < best_score {
                    best_score = score;
                    best_move = Some(mv);
                }
            }

            if beta <= alpha {
                break;
            }
        }

        if best_move.is_none() && !self.stopped {
            return (None, evaluate(state, perspective, &self.config.rewards));
        }
        (best_move, best_score)
    }

    /// Sort `candidates` so the most promising move for this ply comes first.
    ///
    /// With a `position` key, moves are ordered by their cached score from a
    /// shallower pass; moves without one go last. Otherwise, when lookahead is
    /// enabled and `depth > 1`, each move is ordered by the static evaluation
    /// of its child. Lookahead evaluations are not counted as nodes. Ties keep
    /// generation order.
    fn order_candidates(
        &self,
        state: &GameState,
        candidates: &mut Vec<Move>,
        depth: u32,
        perspective: PlayerIndex,
        maximizing: bool,
        position: Option<u64>,
    ) {
        if let Some(position) = position {
            let unseen = if maximizing { -SCORE_INFINITY } else { SCORE_INFINITY };
            candidates.sort_by_cached_key(|mv| {
                let s = self.cache.get(&move_key(position, mv)).copied().unwrap_or(unseen);
                order_key(s, maximizing)
            });
        } else if self.config.one_step_lookahead && depth > 1 {
            let mut scored: Vec<(i64, Move)> = Vec::with_capacity(candidates.len());
            for mv in candidates.drain(..) {
                let mut child = state.clone();
                if apply_move(&mut child, &mv).is_err() {
                    continue;
                }
                let s = evaluate(&child, perspective, &self.config.rewards);
                scored.push((order_key(s, maximizing), mv));
            }
            scored.sort_by_key(|(key, _)| *key);
            candidates.extend(scored.into_iter().map(|(_, mv)| mv));
        }
    }

    fn check_budget(&mut self) {
        if self.stopped {
            return;
        }
        if self.config.node_limit.is_some_and(|limit| self.nodes >= limit) {
            self.stopped = true;
        }
        if let Some(limit) = self.config.time_limit {
            if self.nodes % DEADLINE_CHECK_INTERVAL == 0 && self.started.elapsed() >= limit {
                self.stopped = true;
            }
        }
    }
}

/// Sort key putting the best score for the ply first.
fn order_key(score: Score, maximizing: bool) -> i64 {
    if maximizing {
        -(score as i64)
    } else {
        score as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::geometry::Point;
    use crate::state::Token;

    fn small_board() -> GameState {
        GameState::with_pieces(
            GameConfig::new(2, 2, 2).unwrap(),
            [
                (Point::new(250.0, 300.0), 0),
                (Point::new(400.0, 300.0), 0),
                (Point::new(500.0, 600.0), 1),
                (Point::new(650.0, 600.0), 1),
            ],
        )
        .unwrap()
    }

    /// Player 0 to move. Connecting colour 1 wins it and lets the sweep hand
    /// colour 0 to player 0 as well; connecting colour 0 leaves colour 1 to
    /// player 1's token.
    fn contested() -> GameState {
        let mut state = GameState::with_pieces(
            GameConfig::new(2, 2, 2).unwrap(),
            [
                (Point::new(600.0, 700.0), 0),
                (Point::new(750.0, 700.0), 0),
                (Point::new(100.0, 200.0), 1),
                (Point::new(350.0, 200.0), 1),
            ],
        )
        .unwrap();
        state.players[1].tokens.push(Token {
            pos: Point::new(225.0, 80.0),
            owner: 1,
        });
        state.update();
        state
    }

    fn ordering_config(order_moves: bool, one_step_lookahead: bool) -> SearchConfig {
        SearchConfig {
            max_depth: 2,
            resolution: 7,
            order_moves,
            one_step_lookahead,
            ..SearchConfig::default()
        }
    }

    #[test]
    fn test_engine_rejects_invalid_config() {
        let zero_depth = SearchConfig {
            max_depth: 0,
            ..SearchConfig::default()
        };
        assert_eq!(SearchEngine::new(zero_depth).err(), Some(ConfigError::ZeroDepth));

        let no_samples = SearchConfig {
            resolution: 0,
            ..SearchConfig::default()
        };
        assert_eq!(SearchEngine::new(no_samples).err(), Some(ConfigError::Resolution(0)));
    }

    #[test]
    fn test_unseen_moves_sort_last() {
        let state = contested();
        let mut engine = SearchEngine::new(ordering_config(true, false)).unwrap();
        let moves = legal_moves(&state, 7);
        assert!(moves.len() >= 7);

        let position = position_key(&state);
        engine.cache.insert(move_key(position, &moves[3]), 5);
        engine.cache.insert(move_key(position, &moves[6]), -5);
        let rest: Vec<Move> = moves
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != 3 && *i != 6)
            .map(|(_, mv)| *mv)
            .collect();

        let mut max_ply = moves.clone();
        engine.order_candidates(&state, &mut max_ply, 2, 0, true, Some(position));
        assert_eq!(max_ply[..2], [moves[3], moves[6]]);
        assert_eq!(max_ply[2..], rest[..]);

        let mut min_ply = moves.clone();
        engine.order_candidates(&state, &mut min_ply, 2, 0, false, Some(position));
        assert_eq!(min_ply[..2], [moves[6], moves[3]]);
        assert_eq!(min_ply[2..], rest[..]);
    }

    #[test]
    fn test_deeper_pass_tries_previous_best_first() {
        let state = contested();
        let mut engine = SearchEngine::new(ordering_config(true, false)).unwrap();
        engine.reset();
        let (best, _) = engine.search(&state, 1, 0, true, -SCORE_INFINITY, SCORE_INFINITY);
        let best = best.unwrap();
        assert_eq!(best.pieces, [2, 3]);

        let mut moves = legal_moves(&state, 7);
        assert_ne!(moves[0], best, "generation order starts with colour 0");
        engine.order_candidates(&state, &mut moves, 2, 0, true, Some(position_key(&state)));
        assert_eq!(moves[0], best);
    }

    #[test]
    fn test_lookahead_orders_by_child_evaluation() {
        let state = contested();
        let engine = SearchEngine::new(ordering_config(false, true)).unwrap();
        let moves = legal_moves(&state, 7);
        let winning = moves.iter().filter(|mv| mv.pieces == [2, 3]).count();
        assert!(winning > 0 && winning < moves.len());

        let mut max_ply = moves.clone();
        engine.order_candidates(&state, &mut max_ply, 2, 0, true, None);
        assert!(max_ply[..winning].iter().all(|mv| mv.pieces == [2, 3]));
        assert!(max_ply[winning..].iter().all(|mv| mv.pieces == [0, 1]));

        let mut min_ply = moves.clone();
        engine.order_candidates(&state, &mut min_ply, 2, 0, false, None);
        let losing = moves.len() - winning;
        assert!(min_ply[..losing].iter().all(|mv| mv.pieces == [0, 1]));
        assert_eq!(engine.nodes(), 0, "lookahead evaluations are not nodes");
    }

    #[test]
    fn test_lookahead_does_not_visit_more_nodes() {
        let state = contested();
        let mut plain = SearchEngine::new(ordering_config(false, false)).unwrap();
        let mut lookahead = SearchEngine::new(ordering_config(false, true)).unwrap();
        let a = plain.choose(&state);
        let b = lookahead.choose(&state);
        assert_eq!(a.score, b.score);
        assert!(
            b.stats.nodes <= a.stats.nodes,
            "lookahead {} vs plain {}",
            b.stats.nodes,
            a.stats.nodes
        );
    }

    #[test]
    fn test_evaluate_is_symmetric_while_playing() {
        let mut state = small_board();
        let piece = state.pieces.remove(0);
        state.players[0].capture(piece);
        let piece = state.pieces.remove(0);
        state.players[0].capture(piece);
        state.update();

        let rewards = Rewards::default();
        let mine = evaluate(&state, 0, &rewards);
        let theirs = evaluate(&state, 1, &rewards);
        assert_eq!(mine, -theirs);
        assert_eq!(mine, rewards.colour + rewards.possible_colour);
    }

    #[test]
    fn test_evaluate_counts_sweep() {
        let mut state = small_board();
        state.players[1].tokens.push(Token {
            pos: Point::new(575.0, 650.0),
            owner: 1,
        });
        state.update();

        let rewards = Rewards::default();
        // Nothing captured yet, but the sweep would hand everything to player 1.
        assert_eq!(evaluate(&state, 1, &rewards), 2 * rewards.possible_colour);
        assert_eq!(state.pieces.len(), 4, "evaluation must not sweep the real state");
    }

    #[test]
    fn test_position_key_depends_on_turn() {
        let state = small_board();
        let mut other = state.clone();
        other.set_next_player();
        assert_ne!(position_key(&state), position_key(&other));
        assert_eq!(position_key(&state), position_key(&state.clone()));
    }

    #[test]
    fn test_search_leaves_state_untouched() {
        let state = small_board();
        let before = state.clone();
        let mut engine = SearchEngine::new(SearchConfig {
            max_depth: 2,
            resolution: 5,
            ..SearchConfig::default()
        })
        .unwrap();
        let result = engine.choose(&state);
        assert!(result.best.is_some());
        assert_eq!(state, before);
        assert!(engine.nodes() > 1);
        assert!(engine.cached_scores() > 0);
    }

    #[test]
    fn test_search_without_moves_returns_none() {
        let state = GameState::with_pieces(
            GameConfig::new(2, 1, 1).unwrap(),
            [(Point::new(300.0, 300.0), 0), (Point::new(600.0, 600.0), 1)],
        )
        .unwrap();
        let mut engine = SearchEngine::new(SearchConfig::default()).unwrap();
        let (mv, _) = engine.search(&state, 2, 0, true, -SCORE_INFINITY, SCORE_INFINITY);
        assert!(mv.is_none());
    }

    #[test]
    fn test_node_limit_stops_search() {
        let mut rng = fastrand::Rng::with_seed(11);
        let state = GameState::new_random(GameConfig::default(), &mut rng).unwrap();
        let mut engine = SearchEngine::new(SearchConfig {
            max_depth: 3,
            node_limit: Some(50),
            ..SearchConfig::default()
        })
        .unwrap();
        let result = engine.choose(&state);
        assert!(result.stats.aborted);
        assert!(result.stats.nodes <= 60);
    }
}

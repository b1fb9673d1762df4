//! Bot policies.
//!
//! Every bot answers one question: given the current state, which connection
//! and placement should the player to move play? Heuristic bots score
//! candidates from a [`StateView`]; the search bot runs alpha-beta on a
//! private copy of the state. Any bot whose own policy finds nothing falls
//! back to a uniformly random legal move, and only returns `None` when no
//! legal move exists at all.

use clap::ValueEnum;
use tracing::info;

use crate::config::{ConfigError, SearchConfig};
use crate::constants::DEFAULT_RESOLUTION;
use crate::geometry::Point;
use crate::movegen::{ColourView, Move, StateView, connectable_pairs, valid_placements};
use crate::search::{SearchEngine, SearchStats};
use crate::state::{GameState, Piece, PlayerIndex};

/// A move-choosing policy.
pub trait Bot {
    fn name(&self) -> &'static str;

    /// Pick a legal move for `state.current`, or `None` if there is none.
    fn choose_move(&mut self, state: &GameState) -> Option<Move>;
}

fn connect(a: &Piece, b: &Piece, placement: Point) -> Move {
    Move {
        pieces: [a.id, b.id],
        placement,
    }
}

/// Capture lead of `me` over the opponent in every colour, or `None` for
/// colours already decided.
fn colour_leads(state: &GameState, me: PlayerIndex) -> Vec<Option<i64>> {
    let mine = &state.players[me].by_colour;
    let theirs = &state.players[1 - me].by_colour;
    (0..state.config.num_colours())
        .map(|c| {
            if state.is_colour_decided(c) {
                None
            } else {
                Some(mine[c] as i64 - theirs[c] as i64)
            }
        })
        .collect()
}

/// The connectable pair in `view` furthest apart, with its squared
/// normalised distance. The first of equal pairs wins.
fn longest_pair(view: &ColourView) -> Option<(Piece, Piece, f64)> {
    let mut best: Option<(Piece, Piece, f64)> = None;
    for (i, j) in view.pairs() {
        let d = view.coordinates[i].distance_sq(view.coordinates[j]);
        if best.is_none_or(|(_, _, bd)| d > bd) {
            best = Some((view.pieces[i], view.pieces[j], d));
        }
    }
    best
}

// =============================================================================
// Random
// =============================================================================

/// Uniformly random connection, then a uniformly random placement on it.
///
/// Connections with no valid placement are skipped and another is drawn, so
/// each playable connection is equally likely however many placements it has.
pub struct RandomBot {
    rng: fastrand::Rng,
    resolution: usize,
}

impl RandomBot {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
            resolution: DEFAULT_RESOLUTION,
        }
    }
}

impl Bot for RandomBot {
    fn name(&self) -> &'static str {
        "random"
    }

    fn choose_move(&mut self, state: &GameState) -> Option<Move> {
        let mut pairs = connectable_pairs(state);
        self.rng.shuffle(&mut pairs);
        for (a, b) in pairs {
            let placements = valid_placements(state, &a, &b, self.resolution);
            if !placements.is_empty() {
                let placement = placements[self.rng.usize(..placements.len())];
                return Some(connect(&a, &b, placement));
            }
        }
        None
    }
}

// =============================================================================
// Distance Heuristics
// =============================================================================

/// Longest connection on the board, token in the middle of it.
pub struct MaxDistanceBot {
    fallback: RandomBot,
}

impl MaxDistanceBot {
    pub fn new(seed: u64) -> Self {
        Self {
            fallback: RandomBot::new(seed),
        }
    }
}

impl Bot for MaxDistanceBot {
    fn name(&self) -> &'static str {
        "max-distance"
    }

    fn choose_move(&mut self, state: &GameState) -> Option<Move> {
        let view = StateView::new(state);
        let best = view
            .colours
            .iter()
            .filter_map(|cv| longest_pair(cv))
            .fold(None, |best: Option<(Piece, Piece, f64)>, cand| match best {
                Some(b) if b.2 >= cand.2 => Some(b),
                _ => Some(cand),
            });

        if let Some((a, b, _)) = best {
            let placements = valid_placements(state, &a, &b, DEFAULT_RESOLUTION);
            if !placements.is_empty() {
                return Some(connect(&a, &b, placements[placements.len() / 2]));
            }
        }
        info!(bot = self.name(), "doing random move");
        self.fallback.choose_move(state)
    }
}

/// Longest connection in the undecided colour where the mover leads most.
pub struct MaxDistanceGreedyBot {
    fallback: RandomBot,
}

impl MaxDistanceGreedyBot {
    pub fn new(seed: u64) -> Self {
        Self {
            fallback: RandomBot::new(seed),
        }
    }
}

impl Bot for MaxDistanceGreedyBot {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn choose_move(&mut self, state: &GameState) -> Option<Move> {
        let view = StateView::new(state);
        let mut order: Vec<(usize, i64)> = colour_leads(state, state.current)
            .into_iter()
            .enumerate()
            .filter_map(|(c, lead)| lead.map(|l| (c, l)))
            .collect();
        order.sort_by_key(|&(_, lead)| std::cmp::Reverse(lead));

        for (colour, _) in order {
            let Some(cv) = view.colour(colour) else {
                continue;
            };
            if let Some((a, b, _)) = longest_pair(cv) {
                let placements = valid_placements(state, &a, &b, DEFAULT_RESOLUTION);
                if !placements.is_empty() {
                    return Some(connect(&a, &b, placements[placements.len() / 2]));
                }
            }
        }
        info!(bot = self.name(), "doing random move");
        self.fallback.choose_move(state)
    }
}

/// Deliberately weak: shortest connection in the colour where the mover is
/// worst off, decided colours first, token at the first fitting sample.
pub struct MinDistanceWorstGreedyBot {
    fallback: RandomBot,
}

impl MinDistanceWorstGreedyBot {
    pub fn new(seed: u64) -> Self {
        Self {
            fallback: RandomBot::new(seed),
        }
    }
}

impl Bot for MinDistanceWorstGreedyBot {
    fn name(&self) -> &'static str {
        "worst-greedy"
    }

    fn choose_move(&mut self, state: &GameState) -> Option<Move> {
        let view = StateView::new(state);
        let decided = -(state.config.pieces_per_colour() as i64);
        let mut order: Vec<(usize, i64)> = colour_leads(state, state.current)
            .into_iter()
            .enumerate()
            .map(|(c, lead)| (c, lead.unwrap_or(decided)))
            .collect();
        order.sort_by_key(|&(_, score)| score);

        for (colour, _) in order {
            let Some(cv) = view.colour(colour) else {
                continue;
            };
            // Shortest pair that has at least one placement.
            let mut best: Option<(Piece, Piece, Point)> = None;
            let mut best_distance = f64::INFINITY;
            for (i, j) in cv.pairs() {
                let d = cv.coordinates[i].distance_sq(cv.coordinates[j]);
                if d >= best_distance {
                    continue;
                }
                let (a, b) = (cv.pieces[i], cv.pieces[j]);
                if let Some(&first) = valid_placements(state, &a, &b, DEFAULT_RESOLUTION).first() {
                    best_distance = d;
                    best = Some((a, b, first));
                }
            }
            if let Some((a, b, placement)) = best {
                return Some(connect(&a, &b, placement));
            }
        }
        info!(bot = self.name(), "doing random move");
        self.fallback.choose_move(state)
    }
}

// =============================================================================
// Proximity Heuristic
// =============================================================================

/// Place the token where it becomes the closest token to the most contested
/// pieces.
///
/// Only pieces of undecided colours that are not already nearest to one of
/// the mover's tokens count. On the first move of the game, when no token is
/// on the board yet, the placement with the smallest total distance to those
/// pieces wins instead.
pub struct MaxClosestPiecesBot {
    resolution: usize,
    fallback: RandomBot,
}

impl MaxClosestPiecesBot {
    pub fn new(seed: u64, resolution: usize) -> Self {
        Self {
            resolution,
            fallback: RandomBot::new(seed),
        }
    }

    fn score(&self, state: &GameState, a: &Piece, b: &Piece, placement: Point, first_move: bool) -> f64 {
        let me = state.current;
        let at = placement.unnormalize();
        let mut score = 0.0;
        for piece in &state.pieces {
            if piece.id == a.id || piece.id == b.id || state.is_colour_decided(piece.colour) {
                continue;
            }
            if piece.closest.is_some_and(|c| c.player == me) {
                continue;
            }
            let d = piece.pos.distance(at);
            if first_move {
                score -= d;
            } else if d < piece.closest_distance() {
                score += 1.0;
            }
        }
        score
    }
}

impl Bot for MaxClosestPiecesBot {
    fn name(&self) -> &'static str {
        "max-closest"
    }

    fn choose_move(&mut self, state: &GameState) -> Option<Move> {
        let first_move = state.tokens_placed() == 0;
        let mut best: Option<(Move, f64)> = None;
        for (a, b) in connectable_pairs(state) {
            for placement in valid_placements(state, &a, &b, self.resolution) {
                let score = self.score(state, &a, &b, placement, first_move);
                if best.is_none_or(|(_, s)| score > s) {
                    best = Some((connect(&a, &b, placement), score));
                }
            }
        }
        if let Some((mv, _)) = best {
            return Some(mv);
        }
        info!(bot = self.name(), "doing random move");
        self.fallback.choose_move(state)
    }
}

// =============================================================================
// Search
// =============================================================================

/// Alpha-beta minimax over sampled placements.
pub struct MinimaxBot {
    engine: SearchEngine,
    fallback: RandomBot,
    last_stats: Option<SearchStats>,
}

impl MinimaxBot {
    pub fn new(seed: u64, config: SearchConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            engine: SearchEngine::new(config)?,
            fallback: RandomBot::new(seed),
            last_stats: None,
        })
    }

    /// Counters from the most recent decision.
    pub fn last_stats(&self) -> Option<SearchStats> {
        self.last_stats
    }
}

impl Bot for MinimaxBot {
    fn name(&self) -> &'static str {
        "minimax"
    }

    fn choose_move(&mut self, state: &GameState) -> Option<Move> {
        let mut internal = GameState::new(state.config);
        internal.restore(&state.snapshot());

        let result = self.engine.choose(&internal);
        self.last_stats = Some(result.stats);
        if result.best.is_some() {
            return result.best;
        }
        info!(bot = self.name(), "search found no move, doing random move");
        self.fallback.choose_move(state)
    }
}

// =============================================================================
// Selection
// =============================================================================

/// The closed set of available policies.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum BotKind {
    Random,
    MaxDistance,
    Greedy,
    WorstGreedy,
    MaxClosest,
    Minimax,
}

impl BotKind {
    pub const ALL: [BotKind; 6] = [
        BotKind::Random,
        BotKind::MaxDistance,
        BotKind::Greedy,
        BotKind::WorstGreedy,
        BotKind::MaxClosest,
        BotKind::Minimax,
    ];

    /// Instantiate the policy. `seed` drives its random fallback.
    ///
    /// `search` is validated for every kind, so a bad configuration is caught
    /// however the players are paired.
    pub fn build(self, seed: u64, search: SearchConfig) -> Result<Box<dyn Bot>, ConfigError> {
        let search = search.validate()?;
        Ok(match self {
            BotKind::Random => Box::new(RandomBot::new(seed)),
            BotKind::MaxDistance => Box::new(MaxDistanceBot::new(seed)),
            BotKind::Greedy => Box::new(MaxDistanceGreedyBot::new(seed)),
            BotKind::WorstGreedy => Box::new(MinDistanceWorstGreedyBot::new(seed)),
            BotKind::MaxClosest => Box::new(MaxClosestPiecesBot::new(seed, search.resolution)),
            BotKind::Minimax => Box::new(MinimaxBot::new(seed, search)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::state::Token;

    fn spread() -> GameState {
        // Colour 0: a long and a short option. Colour 1: one short pair.
        GameState::with_pieces(
            GameConfig::new(2, 3, 3).unwrap(),
            [
                (Point::new(150.0, 200.0), 0),
                (Point::new(750.0, 200.0), 0),
                (Point::new(640.0, 320.0), 0),
                (Point::new(300.0, 650.0), 1),
                (Point::new(420.0, 650.0), 1),
                (Point::new(420.0, 800.0), 1),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_colour_leads_marks_decided() {
        let mut state = spread();
        for _ in 0..2 {
            let piece = state.pieces.remove(0);
            state.players[1].capture(piece);
        }
        state.update();
        assert_eq!(colour_leads(&state, 0), vec![None, Some(0)]);
    }

    #[test]
    fn test_max_distance_picks_longest() {
        let state = spread();
        let mv = MaxDistanceBot::new(1).choose_move(&state).unwrap();
        assert_eq!(mv.pieces, [0, 1]);
    }

    #[test]
    fn test_worst_greedy_picks_shortest() {
        let state = spread();
        let mv = MinDistanceWorstGreedyBot::new(1).choose_move(&state).unwrap();
        // Both colours tie on lead; colour 0 comes first and its shortest pair is 1-2.
        assert_eq!(mv.pieces, [1, 2]);
    }

    #[test]
    fn test_greedy_skips_decided_colour() {
        let mut state = spread();
        state.players[0].by_colour[0] = 2;
        let mv = MaxDistanceGreedyBot::new(1).choose_move(&state).unwrap();
        assert!(mv.pieces.iter().all(|&id| id >= 3));
    }

    #[test]
    fn test_max_closest_prefers_contested_pieces() {
        let mut state = spread();
        state.players[1].tokens.push(Token {
            pos: Point::new(100.0, 850.0),
            owner: 1,
        });
        state.update();
        let mut bot = MaxClosestPiecesBot::new(1, 15);
        let mv = bot.choose_move(&state).unwrap();
        assert!(crate::movegen::check_move(&state, &mv).is_ok());
    }

    #[test]
    fn test_random_bot_is_seeded() {
        let state = spread();
        let a = RandomBot::new(9).choose_move(&state);
        let b = RandomBot::new(9).choose_move(&state);
        assert_eq!(a, b);
    }

    #[test]
    fn test_random_bot_skips_connection_without_placement() {
        // Colour 0 is too close to fit a token between its pieces.
        let state = GameState::with_pieces(
            GameConfig::new(2, 2, 1).unwrap(),
            [
                (Point::new(400.0, 450.0), 0),
                (Point::new(430.0, 450.0), 0),
                (Point::new(200.0, 150.0), 1),
                (Point::new(200.0, 400.0), 1),
            ],
        )
        .unwrap();
        assert_eq!(connectable_pairs(&state).len(), 2);
        for seed in 0..20 {
            let mv = RandomBot::new(seed).choose_move(&state).unwrap();
            assert_eq!(mv.pieces, [2, 3], "seed {seed}");
        }
    }

    #[test]
    fn test_every_kind_builds() {
        let state = spread();
        let search = SearchConfig {
            max_depth: 1,
            resolution: 5,
            ..SearchConfig::default()
        };
        for kind in BotKind::ALL {
            let mut bot = kind.build(3, search).unwrap();
            let mv = bot.choose_move(&state).unwrap();
            assert!(crate::movegen::check_move(&state, &mv).is_ok(), "{}", bot.name());
        }
    }

    #[test]
    fn test_invalid_search_config_is_rejected() {
        let shallow = SearchConfig {
            max_depth: 0,
            ..SearchConfig::default()
        };
        assert_eq!(MinimaxBot::new(1, shallow).err(), Some(ConfigError::ZeroDepth));
        for kind in BotKind::ALL {
            assert_eq!(kind.build(1, shallow).err(), Some(ConfigError::ZeroDepth), "{kind:?}");
        }

        let coarse = SearchConfig {
            resolution: 0,
            ..SearchConfig::default()
        };
        assert_eq!(MinimaxBot::new(1, coarse).err(), Some(ConfigError::Resolution(0)));
        assert_eq!(
            BotKind::Minimax.build(1, coarse).err(),
            Some(ConfigError::Resolution(0))
        );
    }
}

//! Lacuna game state: pieces, tokens, players and the game phase.
//!
//! This module provides the authoritative mutable state:
//! - Remaining (uncaptured) pieces with their cached closest-token annotation
//! - Each player's captured pieces, placed tokens and per-colour counters
//! - Whose turn it is and the phase (`playing` → `end_game` → `game_over`)
//! - Snapshots for saving and restoring the state around speculative moves
//!
//! The state is a plain value: cloning it yields an independent copy, which
//! is what the search uses to explore hypothetical futures.

use std::fmt;

use thiserror::Error;

use crate::config::GameConfig;
use crate::constants::{BOARD_RADIUS, MAX_PLACEMENT_ATTEMPTS, PIECE_RADIUS};
use crate::geometry::Point;

/// Stable identifier of a piece for the lifetime of a game.
pub type PieceId = usize;

/// Index of a player (0 or 1).
pub type PlayerIndex = usize;

/// A board could not be set up.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SetupError {
    #[error("could not place piece {piece} of colour {colour} without overlap")]
    Crowded { piece: usize, colour: usize },
    #[error("piece {piece} has colour {colour}, but the game has {colours} colours")]
    UnknownColour {
        piece: usize,
        colour: usize,
        colours: usize,
    },
}

/// The placed token nearest to a piece.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Closest {
    pub player: PlayerIndex,
    /// Index into that player's placed tokens.
    pub token: usize,
    pub distance: f64,
}

/// A capturable piece.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Piece {
    pub id: PieceId,
    /// Centre in board space.
    pub pos: Point,
    pub colour: usize,
    /// Derived annotation, recomputed by [`GameState::update`].
    pub closest: Option<Closest>,
}

impl Piece {
    pub fn new(id: PieceId, pos: Point, colour: usize) -> Self {
        Self {
            id,
            pos,
            colour,
            closest: None,
        }
    }

    /// Distance to the nearest placed token, or infinity when none is placed.
    pub fn closest_distance(&self) -> f64 {
        self.closest.map_or(f64::INFINITY, |c| c.distance)
    }
}

/// A token placed by a player between two pieces.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Token {
    /// Centre in board space.
    pub pos: Point,
    pub owner: PlayerIndex,
}

/// Per-player game record.
#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub captured: Vec<Piece>,
    pub tokens: Vec<Token>,
    /// Capture count per colour. Always sums to `captured.len()`.
    pub by_colour: Vec<usize>,
}

impl Player {
    fn new(num_colours: usize) -> Self {
        Self {
            captured: Vec::new(),
            tokens: Vec::new(),
            by_colour: vec![0; num_colours],
        }
    }

    pub(crate) fn capture(&mut self, piece: Piece) {
        self.by_colour[piece.colour] += 1;
        self.captured.push(Piece {
            closest: None,
            ..piece
        });
    }
}

/// Game phase. Only advances forward, except through [`GameState::restore`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Playing,
    EndGame,
    GameOver,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Playing => write!(f, "playing"),
            Phase::EndGame => write!(f, "end_game"),
            Phase::GameOver => write!(f, "game_over"),
        }
    }
}

/// An independent copy of everything [`GameState::restore`] needs.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    players: [Player; 2],
    pieces: Vec<Piece>,
    current: PlayerIndex,
    phase: Phase,
}

/// The full game state.
#[derive(Clone, Debug, PartialEq)]
pub struct GameState {
    pub config: GameConfig,
    pub players: [Player; 2],
    /// Player to move.
    pub current: PlayerIndex,
    /// Remaining (uncaptured) pieces.
    pub pieces: Vec<Piece>,
    pub phase: Phase,
}

impl GameState {
    /// An empty board (no pieces, no tokens).
    pub fn new(config: GameConfig) -> Self {
        let n = config.num_colours();
        Self {
            config,
            players: [Player::new(n), Player::new(n)],
            current: 0,
            pieces: Vec::new(),
            phase: Phase::Playing,
        }
    }

    /// A board with the given pieces, ids assigned in order.
    ///
    /// Positions are board-space centres. Fails if a colour is not below
    /// `config.num_colours()`.
    pub fn with_pieces(
        config: GameConfig,
        pieces: impl IntoIterator<Item = (Point, usize)>,
    ) -> Result<Self, SetupError> {
        let mut state = Self::new(config);
        for (id, (pos, colour)) in pieces.into_iter().enumerate() {
            if colour >= config.num_colours() {
                return Err(SetupError::UnknownColour {
                    piece: id,
                    colour,
                    colours: config.num_colours(),
                });
            }
            state.pieces.push(Piece::new(id, pos, colour));
        }
        state.update();
        Ok(state)
    }

    /// Scatter pieces randomly over the disc and award one random piece to
    /// the first player.
    pub fn new_random(config: GameConfig, rng: &mut fastrand::Rng) -> Result<Self, SetupError> {
        let centre = Point::new(BOARD_RADIUS, BOARD_RADIUS);
        let mut pieces: Vec<Piece> = Vec::new();

        for colour in 0..config.num_colours() {
            for piece in 0..config.pieces_per_colour() {
                let mut placed = false;
                for _ in 0..MAX_PLACEMENT_ATTEMPTS {
                    let angle = rng.f64() * std::f64::consts::TAU;
                    let radius = rng.f64() * (BOARD_RADIUS - PIECE_RADIUS);
                    let pos = centre + Point::new(angle.cos(), angle.sin()) * radius;
                    let overlaps = pieces
                        .iter()
                        .any(|p| p.pos.distance(pos) < 2.0 * PIECE_RADIUS);
                    if !overlaps {
                        pieces.push(Piece::new(pieces.len(), pos, colour));
                        placed = true;
                        break;
                    }
                }
                if !placed {
                    return Err(SetupError::Crowded { piece, colour });
                }
            }
        }

        let mut state = Self::new(config);
        let gift = pieces.swap_remove(rng.usize(..pieces.len()));
        state.pieces = pieces;
        state.pieces.sort_by_key(|p| p.id);
        state.players[0].capture(gift);
        state.update();
        Ok(state)
    }

    pub fn current_player(&self) -> &Player {
        &self.players[self.current]
    }

    pub fn set_next_player(&mut self) {
        self.current = 1 - self.current;
    }

    /// Tokens the given player may still place.
    pub fn tokens_left(&self, player: PlayerIndex) -> usize {
        self.config
            .tokens_per_player()
            .saturating_sub(self.players[player].tokens.len())
    }

    /// Total tokens placed by both players.
    pub fn tokens_placed(&self) -> usize {
        self.players.iter().map(|p| p.tokens.len()).sum()
    }

    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.iter().find(|p| p.id == id)
    }

    /// Every placed token of both players, in player then placement order.
    pub fn all_tokens(&self) -> impl Iterator<Item = &Token> {
        self.players.iter().flat_map(|p| p.tokens.iter())
    }

    /// True once either player holds a strict majority of `colour`.
    pub fn is_colour_decided(&self, colour: usize) -> bool {
        let majority = self.config.colour_majority();
        self.players.iter().any(|p| p.by_colour[colour] >= majority)
    }

    /// Take an independent copy of the mutable parts of the state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            players: self.players.clone(),
            pieces: self.pieces.clone(),
            current: self.current,
            phase: self.phase,
        }
    }

    /// Overwrite the state with a snapshot and recompute derived annotations.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        self.players = snapshot.players.clone();
        self.pieces = snapshot.pieces.clone();
        self.current = snapshot.current;
        self.phase = snapshot.phase;
        self.update();
    }

    /// Advance the phase if due and recompute each piece's closest token.
    pub fn update(&mut self) {
        if self.phase == Phase::Playing && (self.budgets_exhausted() || !self.any_connection_possible())
        {
            self.phase = Phase::EndGame;
        }

        let tokens: Vec<(PlayerIndex, usize, Point)> = self
            .players
            .iter()
            .enumerate()
            .flat_map(|(player, p)| {
                p.tokens
                    .iter()
                    .enumerate()
                    .map(move |(token, t)| (player, token, t.pos))
            })
            .collect();

        for piece in &mut self.pieces {
            piece.closest = None;
            for &(player, token, pos) in &tokens {
                let distance = piece.pos.distance(pos);
                if distance < piece.closest_distance() {
                    piece.closest = Some(Closest {
                        player,
                        token,
                        distance,
                    });
                }
            }
        }
    }

    fn budgets_exhausted(&self) -> bool {
        let budget = self.config.tokens_per_player();
        self.players.iter().all(|p| p.tokens.len() == budget)
    }

    fn any_connection_possible(&self) -> bool {
        let mut counts = vec![0usize; self.config.num_colours()];
        for piece in &self.pieces {
            counts[piece.colour] += 1;
            if counts[piece.colour] >= 2 {
                return true;
            }
        }
        false
    }

    /// Award every remaining piece to the owner of its nearest token.
    ///
    /// Pieces with no token on the board are discarded. Remaining pieces are
    /// empty afterwards.
    pub fn collect_end_game_pieces(&mut self) {
        for piece in std::mem::take(&mut self.pieces) {
            if let Some(closest) = piece.closest {
                self.players[closest.player].capture(piece);
            }
        }
    }

    /// Move the game into `end_game` regardless of token budgets.
    pub fn force_end_game(&mut self) {
        if self.phase == Phase::Playing {
            self.phase = Phase::EndGame;
        }
    }

    /// Run the end-game sweep and move to `game_over`.
    pub fn finish(&mut self) {
        if self.phase == Phase::EndGame {
            self.collect_end_game_pieces();
            self.phase = Phase::GameOver;
        }
    }

    /// Number of colours each player has won outright.
    pub fn colour_wins(&self) -> [usize; 2] {
        let majority = self.config.colour_majority();
        [0, 1].map(|i| {
            self.players[i]
                .by_colour
                .iter()
                .filter(|&&n| n >= majority)
                .count()
        })
    }

    /// Winner under current captures. Ties go to the second player.
    pub fn winner(&self) -> PlayerIndex {
        let [first, second] = self.colour_wins();
        if first > second { 0 } else { 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(colours: usize, pieces: usize, tokens: usize) -> GameConfig {
        GameConfig::new(colours, pieces, tokens).unwrap()
    }

    fn two_pairs() -> GameState {
        GameState::with_pieces(
            config(2, 2, 2),
            [
                (Point::new(300.0, 300.0), 0),
                (Point::new(400.0, 300.0), 0),
                (Point::new(300.0, 600.0), 1),
                (Point::new(400.0, 600.0), 1),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_new_random_places_all_pieces() {
        let mut rng = fastrand::Rng::with_seed(7);
        let cfg = GameConfig::default();
        let state = GameState::new_random(cfg, &mut rng).unwrap();

        let total = cfg.num_colours() * cfg.pieces_per_colour();
        assert_eq!(state.pieces.len() + state.players[0].captured.len(), total);
        assert_eq!(state.players[0].captured.len(), 1, "first player gets one piece");
        assert_eq!(state.phase, Phase::Playing);

        let centre = Point::new(BOARD_RADIUS, BOARD_RADIUS);
        for (i, a) in state.pieces.iter().enumerate() {
            assert!(a.pos.distance(centre) <= BOARD_RADIUS - PIECE_RADIUS + 1e-9);
            for b in &state.pieces[i + 1..] {
                assert!(a.pos.distance(b.pos) >= 2.0 * PIECE_RADIUS);
            }
        }
    }

    #[test]
    fn test_new_random_is_reproducible() {
        let cfg = GameConfig::default();
        let a = GameState::new_random(cfg, &mut fastrand::Rng::with_seed(3)).unwrap();
        let b = GameState::new_random(cfg, &mut fastrand::Rng::with_seed(3)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_update_tracks_closest_token() {
        let mut state = two_pairs();
        state.players[1].tokens.push(Token {
            pos: Point::new(350.0, 350.0),
            owner: 1,
        });
        state.players[0].tokens.push(Token {
            pos: Point::new(350.0, 650.0),
            owner: 0,
        });
        state.update();

        assert_eq!(state.pieces[0].closest.map(|c| c.player), Some(1));
        assert_eq!(state.pieces[2].closest.map(|c| c.player), Some(0));
    }

    #[test]
    fn test_equidistant_tie_goes_to_lower_player() {
        let mut state = GameState::with_pieces(
            config(1, 3, 2),
            [
                (Point::new(450.0, 450.0), 0),
                (Point::new(100.0, 450.0), 0),
                (Point::new(800.0, 450.0), 0),
            ],
        )
        .unwrap();
        state.players[1].tokens.push(Token {
            pos: Point::new(450.0, 400.0),
            owner: 1,
        });
        state.players[0].tokens.push(Token {
            pos: Point::new(450.0, 500.0),
            owner: 0,
        });
        state.update();
        assert_eq!(state.pieces[0].closest.map(|c| c.player), Some(0));
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut state = two_pairs();
        let snap = state.snapshot();
        let before = state.clone();

        let piece = state.pieces.remove(0);
        state.players[0].capture(piece);
        state.set_next_player();
        state.phase = Phase::EndGame;

        state.restore(&snap);
        assert_eq!(state, before);
    }

    #[test]
    fn test_sweep_empties_board() {
        let mut state = two_pairs();
        state.players[0].tokens.push(Token {
            pos: Point::new(350.0, 250.0),
            owner: 0,
        });
        state.update();
        state.force_end_game();
        state.finish();

        assert_eq!(state.phase, Phase::GameOver);
        assert!(state.pieces.is_empty());
        assert_eq!(state.players[0].captured.len(), 4);
        assert_eq!(state.players[0].by_colour, vec![2, 2]);
    }

    #[test]
    fn test_winner_tie_goes_to_second_player() {
        let mut state = two_pairs();
        assert_eq!(state.colour_wins(), [0, 0]);
        assert_eq!(state.winner(), 1);

        for _ in 0..2 {
            let piece = state.pieces.remove(0);
            state.players[0].capture(piece);
        }
        assert_eq!(state.colour_wins(), [1, 0]);
        assert_eq!(state.winner(), 0);
        assert!(state.is_colour_decided(0));
        assert!(!state.is_colour_decided(1));
    }

    #[test]
    fn test_with_pieces_rejects_unknown_colour() {
        let result = GameState::with_pieces(
            config(1, 2, 1),
            [(Point::new(300.0, 300.0), 0), (Point::new(500.0, 300.0), 3)],
        );
        assert_eq!(
            result,
            Err(SetupError::UnknownColour {
                piece: 1,
                colour: 3,
                colours: 1,
            })
        );
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Playing.to_string(), "playing");
        assert_eq!(Phase::EndGame.to_string(), "end_game");
        assert_eq!(Phase::GameOver.to_string(), "game_over");
    }
}

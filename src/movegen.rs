//! Move legality, enumeration and application.
//!
//! A move connects two remaining pieces of the same colour with an
//! unobstructed straight segment and places a token on that segment where it
//! overlaps nothing. Applying it captures both pieces for the mover.

use thiserror::Error;

use crate::constants::{EFFECTIVE_TOKEN_RADIUS, PIECE_RADIUS, PLACEMENT_TOLERANCE};
use crate::geometry::{Point, circles_overlap, lerp, linspace, point_on_segment};
use crate::state::{GameState, Phase, Piece, PieceId, Token};

/// Reasons a move request is rejected. The state is untouched in every case.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MoveError {
    #[error("illegal move: a connection needs two distinct pieces")]
    SamePiece,
    #[error("illegal move: piece {0} is not on the board")]
    NoSuchPiece(PieceId),
    #[error("illegal move: pieces have different colours")]
    ColourMismatch,
    #[error("illegal move: game is in the {0} phase")]
    NotPlaying(Phase),
    #[error("illegal move: player {0} has no tokens left")]
    NoTokensLeft(usize),
    #[error("illegal move: point is {0:.1} units from the connection")]
    OffSegment(f64),
    #[error("illegal move: connection is obstructed")]
    Obstructed,
    #[error("illegal move: token would overlap another object")]
    Overlap,
}

/// A complete move: two pieces and a placement in normalised board space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Move {
    pub pieces: [PieceId; 2],
    pub placement: Point,
}

// =============================================================================
// Geometry Queries Against the State
// =============================================================================

/// True if a remaining piece or a placed token (other than `excluded`) sits
/// within its own radius of the segment `[a, b]`.
pub fn segment_blocked(state: &GameState, a: Point, b: Point, excluded: &[PieceId]) -> bool {
    let piece_hit = state
        .pieces
        .iter()
        .filter(|p| !excluded.contains(&p.id))
        .any(|p| point_on_segment(a, b, p.pos).distance(p.pos) < PIECE_RADIUS);
    if piece_hit {
        return true;
    }
    state
        .all_tokens()
        .any(|t| point_on_segment(a, b, t.pos).distance(t.pos) < EFFECTIVE_TOKEN_RADIUS)
}

/// True if a token centred at `point` (board space) overlaps no remaining
/// piece (endpoints included) and no placed token.
///
/// `endpoints` are tested even if they are no longer on the board.
pub fn placement_fits(state: &GameState, point: Point, endpoints: &[Piece]) -> bool {
    let hits_piece = state
        .pieces
        .iter()
        .filter(|p| !endpoints.iter().any(|e| e.id == p.id))
        .chain(endpoints.iter())
        .any(|p| circles_overlap(point, EFFECTIVE_TOKEN_RADIUS, p.pos, PIECE_RADIUS));
    if hits_piece {
        return false;
    }
    !state
        .all_tokens()
        .any(|t| circles_overlap(point, EFFECTIVE_TOKEN_RADIUS, t.pos, EFFECTIVE_TOKEN_RADIUS))
}

// =============================================================================
// Enumeration
// =============================================================================

/// Every unobstructed same-colour connection, each undirected pair once.
///
/// Pairs are ordered by colour, then by position in the remaining-piece list.
pub fn connectable_pairs(state: &GameState) -> Vec<(Piece, Piece)> {
    let mut pairs = Vec::new();
    for colour in 0..state.config.num_colours() {
        pairs.extend(colour_pairs(state, colour));
    }
    pairs
}

/// Unobstructed connections between pieces of one colour.
pub fn colour_pairs(state: &GameState, colour: usize) -> Vec<(Piece, Piece)> {
    let same: Vec<&Piece> = state.pieces.iter().filter(|p| p.colour == colour).collect();
    let mut pairs = Vec::new();
    for (i, a) in same.iter().enumerate() {
        for b in &same[i + 1..] {
            if !segment_blocked(state, a.pos, b.pos, &[a.id, b.id]) {
                pairs.push((**a, **b));
            }
        }
    }
    pairs
}

/// Sample `resolution` points from `a` to `b` (both ends included) and keep
/// those where a token fits, in normalised coordinates and sample order.
pub fn valid_placements(state: &GameState, a: &Piece, b: &Piece, resolution: usize) -> Vec<Point> {
    let endpoints = [*a, *b];
    linspace(resolution)
        .map(|t| lerp(a.pos, b.pos, t))
        .filter(|&p| placement_fits(state, p, &endpoints))
        .map(Point::normalize)
        .collect()
}

/// Every legal move, flattened from connections and their placements.
pub fn legal_moves(state: &GameState, resolution: usize) -> Vec<Move> {
    let mut moves = Vec::new();
    for (a, b) in connectable_pairs(state) {
        for placement in valid_placements(state, &a, &b, resolution) {
            moves.push(Move {
                pieces: [a.id, b.id],
                placement,
            });
        }
    }
    moves
}

// =============================================================================
// Application
// =============================================================================

/// Validate and apply a move for the current player, all or nothing.
///
/// On success the token is placed at the projection of `placement` onto the
/// segment, both pieces are captured, the turn passes to the opponent and
/// derived state is refreshed.
pub fn apply_move(state: &mut GameState, mv: &Move) -> Result<(), MoveError> {
    let token = check_move(state, mv)?;
    let player = state.current;

    state.players[player].tokens.push(token);
    for id in mv.pieces {
        if let Some(idx) = state.pieces.iter().position(|p| p.id == id) {
            let piece = state.pieces.remove(idx);
            state.players[player].capture(piece);
        }
    }
    state.set_next_player();
    state.update();
    Ok(())
}

/// Run every validation of [`apply_move`] and return the token it would place.
pub fn check_move(state: &GameState, mv: &Move) -> Result<Token, MoveError> {
    let [ida, idb] = mv.pieces;
    if ida == idb {
        return Err(MoveError::SamePiece);
    }
    if state.phase != Phase::Playing {
        return Err(MoveError::NotPlaying(state.phase));
    }
    let a = *state.piece(ida).ok_or(MoveError::NoSuchPiece(ida))?;
    let b = *state.piece(idb).ok_or(MoveError::NoSuchPiece(idb))?;
    if a.colour != b.colour {
        return Err(MoveError::ColourMismatch);
    }
    if state.tokens_left(state.current) == 0 {
        return Err(MoveError::NoTokensLeft(state.current));
    }

    let requested = mv.placement.unnormalize();
    let on_line = point_on_segment(a.pos, b.pos, requested);
    let offset = on_line.distance(requested);
    if offset > PLACEMENT_TOLERANCE {
        return Err(MoveError::OffSegment(offset));
    }
    if segment_blocked(state, a.pos, b.pos, &[a.id, b.id]) {
        return Err(MoveError::Obstructed);
    }
    if !placement_fits(state, on_line, &[a, b]) {
        return Err(MoveError::Overlap);
    }
    Ok(Token {
        pos: on_line,
        owner: state.current,
    })
}

// =============================================================================
// Normalised View for Bots
// =============================================================================

/// Remaining pieces of one colour, as bots see them.
#[derive(Clone, Debug, PartialEq)]
pub struct ColourView {
    pub colour: usize,
    /// `connections[i][j]` is true if pieces `i` and `j` can be connected.
    pub connections: Vec<Vec<bool>>,
    /// Normalised centres, indexed like `pieces`.
    pub coordinates: Vec<Point>,
    pub pieces: Vec<Piece>,
}

/// Normalised read-only summary of the state.
#[derive(Clone, Debug, PartialEq)]
pub struct StateView {
    /// One entry per colour with remaining pieces, in colour order.
    pub colours: Vec<ColourView>,
    /// Normalised token positions per player.
    pub tokens: [Vec<Point>; 2],
    /// Capture counts per player and colour.
    pub captures: [Vec<usize>; 2],
}

impl StateView {
    pub fn new(state: &GameState) -> Self {
        let mut colours = Vec::new();
        for colour in 0..state.config.num_colours() {
            let pieces: Vec<Piece> = state
                .pieces
                .iter()
                .filter(|p| p.colour == colour)
                .copied()
                .collect();
            if pieces.is_empty() {
                continue;
            }
            let connections = pieces
                .iter()
                .map(|a| {
                    pieces
                        .iter()
                        .map(|b| a.id != b.id && !segment_blocked(state, a.pos, b.pos, &[a.id, b.id]))
                        .collect()
                })
                .collect();
            let coordinates = pieces.iter().map(|p| p.pos.normalize()).collect();
            colours.push(ColourView {
                colour,
                connections,
                coordinates,
                pieces,
            });
        }

        Self {
            colours,
            tokens: [0, 1].map(|i| {
                state.players[i]
                    .tokens
                    .iter()
                    .map(|t| t.pos.normalize())
                    .collect()
            }),
            captures: [0, 1].map(|i| state.players[i].by_colour.clone()),
        }
    }

    pub fn colour(&self, colour: usize) -> Option<&ColourView> {
        self.colours.iter().find(|c| c.colour == colour)
    }
}

impl ColourView {
    /// Connectable index pairs `(i, j)` with `i < j`.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let n = self.pieces.len();
        (0..n)
            .flat_map(move |i| (i + 1..n).map(move |j| (i, j)))
            .filter(|&(i, j)| self.connections[i][j])
    }
}

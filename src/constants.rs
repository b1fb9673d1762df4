//! Constants for board geometry, evaluation weights, and search defaults.
//!
//! All lengths are in board units. The board is a disc of radius
//! [`BOARD_RADIUS`] centred in a square of side [`BOARD_DIAMETER`]; the
//! normalised board space used by bots maps that square onto `[0, 1]²`.

// =============================================================================
// Board Geometry
// =============================================================================

/// Radius of the playing disc.
pub const BOARD_RADIUS: f64 = 450.0;

/// Side of the square that bounds the disc (normalisation scale).
pub const BOARD_DIAMETER: f64 = 2.0 * BOARD_RADIUS;

/// Radius of every piece.
pub const PIECE_RADIUS: f64 = 14.0;

/// Visual radius of a player token, without its border.
pub const TOKEN_RADIUS: f64 = 10.0;

/// Width of the border drawn around a player token.
pub const TOKEN_BORDER_WIDTH: f64 = 3.0;

/// Radius used for every token overlap and obstruction test.
pub const EFFECTIVE_TOKEN_RADIUS: f64 = TOKEN_RADIUS + TOKEN_BORDER_WIDTH;

/// How far a requested placement may sit from the connecting segment.
pub const PLACEMENT_TOLERANCE: f64 = 10.0;

/// Slack applied to overlap tests so touching circles do not count as overlapping
/// after a normalise/unnormalise round trip.
pub const GEOMETRY_EPSILON: f64 = 1e-9;

/// Maximum number of piece colours.
pub const MAX_COLOURS: usize = 7;

/// Attempts allowed per piece when scattering pieces at setup.
pub const MAX_PLACEMENT_ATTEMPTS: usize = 10_000;

// =============================================================================
// Game Defaults
// =============================================================================

/// Default number of colours.
pub const DEFAULT_COLOURS: usize = 7;

/// Default number of pieces per colour.
pub const DEFAULT_PIECES_PER_COLOUR: usize = 7;

/// Default number of tokens per player.
pub const DEFAULT_TOKENS_PER_PLAYER: usize = 6;

// =============================================================================
// Sampling Resolutions
// =============================================================================

/// Samples along a connection for the random and distance bots.
pub const DEFAULT_RESOLUTION: usize = 100;

/// Samples along a connection inside the search and the proximity bot.
pub const SEARCH_RESOLUTION: usize = 15;

// =============================================================================
// Search Parameters
// =============================================================================

/// Default maximum search depth (plies).
pub const DEFAULT_SEARCH_DEPTH: u32 = 2;

/// Reward for winning (or penalty for losing) the game.
pub const GAME_REWARD: i32 = 100;

/// Reward per colour already won under current captures.
pub const COLOUR_REWARD: i32 = 10;

/// Reward per colour that the end-game sweep would win right now.
pub const POSSIBLE_COLOUR_REWARD: i32 = 5;

/// Bound used for alpha/beta windows and unseen ordering sentinels.
pub const SCORE_INFINITY: i32 = 1_000_000_000;

/// Nodes between deadline checks.
pub const DEADLINE_CHECK_INTERVAL: u64 = 256;

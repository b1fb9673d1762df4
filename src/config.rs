//! Game and search configuration, validated at construction.

use std::time::Duration;

use thiserror::Error;

use crate::constants::{
    COLOUR_REWARD, DEFAULT_COLOURS, DEFAULT_PIECES_PER_COLOUR, DEFAULT_SEARCH_DEPTH,
    DEFAULT_TOKENS_PER_PLAYER, GAME_REWARD, MAX_COLOURS, POSSIBLE_COLOUR_REWARD,
    SEARCH_RESOLUTION,
};

/// A configuration value outside its allowed range.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("number of colours must be between 1 and 7, got {0}")]
    Colours(usize),
    #[error("pieces per colour must be positive")]
    NoPieces,
    #[error("tokens per player must be positive")]
    NoTokens,
    #[error("search depth must be positive")]
    ZeroDepth,
    #[error("search resolution must be at least 2, got {0}")]
    Resolution(usize),
}

/// Board setup parameters.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GameConfig {
    num_colours: usize,
    pieces_per_colour: usize,
    tokens_per_player: usize,
}

impl GameConfig {
    pub fn new(
        num_colours: usize,
        pieces_per_colour: usize,
        tokens_per_player: usize,
    ) -> Result<Self, ConfigError> {
        if num_colours == 0 || num_colours > MAX_COLOURS {
            return Err(ConfigError::Colours(num_colours));
        }
        if pieces_per_colour == 0 {
            return Err(ConfigError::NoPieces);
        }
        if tokens_per_player == 0 {
            return Err(ConfigError::NoTokens);
        }
        Ok(Self {
            num_colours,
            pieces_per_colour,
            tokens_per_player,
        })
    }

    pub fn num_colours(&self) -> usize {
        self.num_colours
    }

    pub fn pieces_per_colour(&self) -> usize {
        self.pieces_per_colour
    }

    pub fn tokens_per_player(&self) -> usize {
        self.tokens_per_player
    }

    /// Captures needed to win a colour outright (strictly more than half).
    pub fn colour_majority(&self) -> usize {
        self.pieces_per_colour / 2 + 1
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            num_colours: DEFAULT_COLOURS,
            pieces_per_colour: DEFAULT_PIECES_PER_COLOUR,
            tokens_per_player: DEFAULT_TOKENS_PER_PLAYER,
        }
    }
}

/// Weights used by the position evaluator.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Rewards {
    /// Won or lost game.
    pub game: i32,
    /// Colour already won under current captures.
    pub colour: i32,
    /// Colour that would be won if the end-game sweep ran now.
    pub possible_colour: i32,
}

impl Default for Rewards {
    fn default() -> Self {
        Self {
            game: GAME_REWARD,
            colour: COLOUR_REWARD,
            possible_colour: POSSIBLE_COLOUR_REWARD,
        }
    }
}

/// Knobs for the search-based bot.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SearchConfig {
    /// Plies searched.
    pub max_depth: u32,
    /// Samples per connection when enumerating placements.
    pub resolution: usize,
    /// Order candidates by cached scores and deepen iteratively.
    pub order_moves: bool,
    /// Order candidates by a one-ply static evaluation (only without `order_moves`).
    pub one_step_lookahead: bool,
    /// Wall-clock budget per decision.
    pub time_limit: Option<Duration>,
    /// Node budget per decision.
    pub node_limit: Option<u64>,
    pub rewards: Rewards,
}

impl SearchConfig {
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }
        if self.resolution < 2 {
            return Err(ConfigError::Resolution(self.resolution));
        }
        Ok(self)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_SEARCH_DEPTH,
            resolution: SEARCH_RESOLUTION,
            order_moves: true,
            one_step_lookahead: true,
            time_limit: None,
            node_limit: None,
            rewards: Rewards::default(),
        }
    }
}

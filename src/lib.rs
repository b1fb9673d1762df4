//! Lacuna: a two-player connect-and-capture board game engine with bots.
//!
//! Pieces of several colours are scattered over a circular board. On each
//! turn a player connects two same-coloured pieces with an unobstructed
//! straight line, places a token somewhere along it, and captures both
//! pieces. When the tokens run out, every remaining piece goes to the owner
//! of its nearest token. The player holding a majority in more colours wins.
//!
//! ## Modules
//!
//! - [`constants`] - Board geometry and default parameters
//! - [`config`] - Validated game and search configuration
//! - [`geometry`] - Points, distances and segment projection
//! - [`state`] - Game state, phases, snapshots and the end-game sweep
//! - [`movegen`] - Move legality, enumeration and application
//! - [`search`] - Static evaluation and alpha-beta minimax
//! - [`bots`] - Heuristic and search-based move policies
//! - [`game`] - Headless game loop between two bots
//!
//! ## Example
//!
//! ```
//! use lacuna::config::{GameConfig, SearchConfig};
//! use lacuna::movegen::{apply_move, legal_moves};
//! use lacuna::search::SearchEngine;
//! use lacuna::state::GameState;
//!
//! // Set up a small random board
//! let config = GameConfig::new(3, 3, 2).unwrap();
//! let mut rng = fastrand::Rng::with_seed(1);
//! let mut state = GameState::new_random(config, &mut rng).unwrap();
//!
//! // Search for a move and play it
//! let mut engine = SearchEngine::new(SearchConfig::default()).unwrap();
//! if let Some(mv) = engine.choose(&state).best {
//!     apply_move(&mut state, &mv).unwrap();
//! }
//! println!("{} moves available", legal_moves(&state, 15).len());
//! ```

pub mod bots;
pub mod config;
pub mod constants;
pub mod game;
pub mod geometry;
pub mod movegen;
pub mod search;
pub mod state;

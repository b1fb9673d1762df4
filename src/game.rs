//! Headless game loop driving two bots.
//!
//! Each [`Game::step`] advances the phase machine by one transition:
//! - `playing`: ask the bot to move, fall back to a random legal move if its
//!   choice is rejected, and force the end game if no legal move exists
//! - `end_game`: run the end-game sweep and move to `game_over`
//! - `game_over`: report the winner
//!
//! ## Example
//!
//! ```
//! use lacuna::bots::BotKind;
//! use lacuna::config::{GameConfig, SearchConfig};
//! use lacuna::game::Game;
//!
//! let config = GameConfig::new(3, 3, 2).unwrap();
//! let search = SearchConfig::default();
//! let mut game = Game::from_seed(
//!     config,
//!     BotKind::Greedy.build(1, search).unwrap(),
//!     BotKind::Random.build(2, search).unwrap(),
//!     42,
//! )
//! .unwrap();
//! let outcome = game.run();
//! assert!(outcome.winner < 2);
//! ```

use tracing::{debug, info, warn};

use crate::bots::{Bot, RandomBot};
use crate::config::GameConfig;
use crate::movegen::{Move, apply_move};
use crate::state::{GameState, Phase, PlayerIndex, SetupError};

/// Result of one [`Game::step`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GameStatus {
    InProgress,
    Finished(PlayerIndex),
}

/// Summary of a finished game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameOutcome {
    pub winner: PlayerIndex,
    pub colour_wins: [usize; 2],
    pub captured: [usize; 2],
    /// Moves applied by either player.
    pub moves: usize,
    /// Turns where the bot's own choice was missing or rejected.
    pub fallbacks: usize,
}

/// A game between two bots.
pub struct Game {
    state: GameState,
    bots: [Box<dyn Bot>; 2],
    fallback: RandomBot,
    moves: usize,
    fallbacks: usize,
}

impl Game {
    pub fn new(state: GameState, first: Box<dyn Bot>, second: Box<dyn Bot>, seed: u64) -> Self {
        Self {
            state,
            bots: [first, second],
            fallback: RandomBot::new(seed),
            moves: 0,
            fallbacks: 0,
        }
    }

    /// Random setup from `seed`, which also seeds the loop's random fallback.
    pub fn from_seed(
        config: GameConfig,
        first: Box<dyn Bot>,
        second: Box<dyn Bot>,
        seed: u64,
    ) -> Result<Self, SetupError> {
        let mut rng = fastrand::Rng::with_seed(seed);
        let state = GameState::new_random(config, &mut rng)?;
        Ok(Self::new(state, first, second, rng.u64(..)))
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn bot_names(&self) -> [&'static str; 2] {
        [self.bots[0].name(), self.bots[1].name()]
    }

    /// Advance by one phase transition or one move.
    pub fn step(&mut self) -> GameStatus {
        match self.state.phase {
            Phase::Playing => {
                self.play_turn();
                GameStatus::InProgress
            }
            Phase::EndGame => {
                self.state.finish();
                info!(
                    captured_first = self.state.players[0].captured.len(),
                    captured_second = self.state.players[1].captured.len(),
                    "end-game sweep done"
                );
                GameStatus::InProgress
            }
            Phase::GameOver => GameStatus::Finished(self.state.winner()),
        }
    }

    /// Step until the game is over.
    pub fn run(&mut self) -> GameOutcome {
        let winner = loop {
            if let GameStatus::Finished(winner) = self.step() {
                break winner;
            }
        };
        let outcome = self.outcome(winner);
        info!(
            winner = outcome.winner,
            colours_first = outcome.colour_wins[0],
            colours_second = outcome.colour_wins[1],
            moves = outcome.moves,
            "game over"
        );
        outcome
    }

    fn outcome(&self, winner: PlayerIndex) -> GameOutcome {
        GameOutcome {
            winner,
            colour_wins: self.state.colour_wins(),
            captured: [0, 1].map(|i| self.state.players[i].captured.len()),
            moves: self.moves,
            fallbacks: self.fallbacks,
        }
    }

    fn play_turn(&mut self) {
        let player = self.state.current;
        let bot = &mut self.bots[player];
        let name = bot.name();

        if let Some(mv) = bot.choose_move(&self.state) {
            match apply_move(&mut self.state, &mv) {
                Ok(()) => {
                    self.record(player, name, &mv);
                    return;
                }
                Err(err) => warn!(bot = name, %err, "bot move rejected"),
            }
        }

        self.fallbacks += 1;
        if let Some(mv) = self.fallback.choose_move(&self.state) {
            if apply_move(&mut self.state, &mv).is_ok() {
                self.record(player, "fallback", &mv);
                return;
            }
        }
        info!(player, "no legal move, forcing end game");
        self.state.force_end_game();
    }

    fn record(&mut self, player: PlayerIndex, name: &str, mv: &Move) {
        self.moves += 1;
        debug!(
            player,
            bot = name,
            a = mv.pieces[0],
            b = mv.pieces[1],
            placement = %mv.placement,
            phase = %self.state.phase,
            "move applied"
        );
    }
}

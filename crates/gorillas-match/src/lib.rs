//! Match control for two-player Gorillas.
//!
//! Each match runs as an isolated Tokio task (actor model) that owns its
//! roster, turn state, and score. Level generation is a pure function of
//! the configuration and a seeded RNG.
//!
//! # Key types
//!
//! - [`Match`]: the state machine for one game
//! - [`MatchManager`]: creates matches and pairs players
//! - [`MatchHandle`]: sends commands to a running match actor
//! - [`MatchPhase`]: lifecycle of a match
//! - [`MatchConfig`] / [`LevelConfig`]: per-match and skyline settings

mod actor;
mod config;
mod error;
mod game;
pub mod level;
mod manager;
mod roster;

pub use actor::{MatchHandle, MatchInfo, spawn_match};
pub use config::{GameInfo, LevelConfig, MatchConfig, MatchPhase};
pub use error::MatchError;
pub use game::{Match, Outbound};
pub use level::{Level, generate_level};
pub use manager::MatchManager;
pub use roster::{Player, PlayerSender, Roster};

//! Match configuration, the game descriptor, and the match phase machine.

use serde::{Deserialize, Serialize};

use crate::MatchError;

// ---------------------------------------------------------------------------
// GameInfo
// ---------------------------------------------------------------------------

/// What the hosting lobby needs to know about the game before it creates
/// or fills a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameInfo {
    pub min_players: usize,
    pub max_players: usize,
    /// The route name the lobby uses to launch the game page.
    pub launch_verb: &'static str,
}

impl GameInfo {
    pub const GORILLAS: Self = Self {
        min_players: 2,
        max_players: 2,
        launch_verb: "play",
    };
}

// ---------------------------------------------------------------------------
// LevelConfig
// ---------------------------------------------------------------------------

/// Parameters for skyline generation. Ranges are inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub map_width: u32,
    pub map_height: u32,
    pub min_building_width: u32,
    pub max_building_width: u32,
    pub min_building_height: u32,
    pub max_building_height: u32,
    /// How many times a building may be redrawn because it matches its
    /// left neighbour before generation gives up.
    pub max_resample_attempts: u32,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            map_width: 80,
            map_height: 50,
            min_building_width: 6,
            max_building_width: 10,
            min_building_height: 6,
            max_building_height: 28,
            max_resample_attempts: 64,
        }
    }
}

impl LevelConfig {
    /// Checks that the ranges are non-empty and fit on the map.
    ///
    /// # Errors
    /// Returns [`MatchError::Config`] describing the first violation.
    pub fn validate(&self) -> Result<(), MatchError> {
        if self.map_width == 0 {
            return Err(MatchError::Config("map_width must be positive".into()));
        }
        if self.min_building_width == 0
            || self.min_building_width > self.max_building_width
        {
            return Err(MatchError::Config(format!(
                "building width range {}..={} is empty or starts at zero",
                self.min_building_width, self.max_building_width
            )));
        }
        if self.min_building_height == 0
            || self.min_building_height > self.max_building_height
        {
            return Err(MatchError::Config(format!(
                "building height range {}..={} is empty or starts at zero",
                self.min_building_height, self.max_building_height
            )));
        }
        if self.max_building_height > self.map_height {
            return Err(MatchError::Config(format!(
                "max_building_height {} exceeds map_height {}",
                self.max_building_height, self.map_height
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MatchConfig
// ---------------------------------------------------------------------------

/// Per-match settings supplied by the host when it creates a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Best-of-N: a player wins the match once their round wins exceed
    /// half of this.
    pub max_rounds: u32,
    /// Sent to clients in `matchStarted`.
    pub return_url: String,
    /// Fixed RNG seed. `None` draws one from the OS.
    pub seed: Option<u64>,
    pub level: LevelConfig,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_rounds: 3,
            return_url: "/".to_string(),
            seed: None,
            level: LevelConfig::default(),
        }
    }
}

impl MatchConfig {
    /// Returns `true` once `wins` round wins decide the match.
    pub fn is_decisive(&self, wins: u32) -> bool {
        // wins > max_rounds / 2 without the fractional half.
        wins * 2 > self.max_rounds
    }
}

// ---------------------------------------------------------------------------
// MatchPhase
// ---------------------------------------------------------------------------

/// The lifecycle of a match.
///
/// ```text
/// AwaitingPlayers → AwaitingReady → RoundActive → RoundEnded ─┬→ RoundActive
///                                                             └→ MatchEnded
/// ```
///
/// `RoundEnded` only exists between scoring a round and deciding what
/// comes next; outside observers never see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPhase {
    AwaitingPlayers,
    AwaitingReady,
    RoundActive,
    RoundEnded,
    MatchEnded,
}

impl MatchPhase {
    /// Returns `true` if another player may still take a seat.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::AwaitingPlayers)
    }

    /// Returns `true` once the match has a winner.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::MatchEnded)
    }

    /// Returns `true` if `target` is a legal next phase.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::AwaitingPlayers, Self::AwaitingReady)
                | (Self::AwaitingReady, Self::RoundActive)
                | (Self::RoundActive, Self::RoundEnded)
                | (Self::RoundEnded, Self::RoundActive)
                | (Self::RoundEnded, Self::MatchEnded)
        )
    }
}

impl std::fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AwaitingPlayers => write!(f, "AwaitingPlayers"),
            Self::AwaitingReady => write!(f, "AwaitingReady"),
            Self::RoundActive => write!(f, "RoundActive"),
            Self::RoundEnded => write!(f, "RoundEnded"),
            Self::MatchEnded => write!(f, "MatchEnded"),
        }
    }
}

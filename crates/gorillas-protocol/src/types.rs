//! Core protocol types.
//!
//! Event names and field names follow what the browser client already
//! speaks: camelCase, with events tagged by name
//! (`{"event": "roundStarted", "data": {...}}`).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// The protocol version clients must send in their handshake.
pub const PROTOCOL_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A player's seat in a match: 0 for whoever joined first, 1 for the
/// second player. Stable for the lifetime of the match.
///
/// Serializes as a plain number so `{"winner": 1}` reads the same as it
/// does on the client. Decoding anything but 0 or 1 fails.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct PlayerIndex(u8);

impl PlayerIndex {
    /// The player who joined first.
    pub const FIRST: Self = Self(0);
    /// The player who joined second.
    pub const SECOND: Self = Self(1);

    /// Returns the index for seat `n`, or `None` if `n` is not 0 or 1.
    pub fn new(n: usize) -> Option<Self> {
        match n {
            0 => Some(Self::FIRST),
            1 => Some(Self::SECOND),
            _ => None,
        }
    }

    /// Maps any counter onto a seat by parity.
    pub fn from_parity(n: u32) -> Self {
        Self((n % 2) as u8)
    }

    /// The opponent's seat.
    pub fn other(self) -> Self {
        Self(1 - self.0)
    }

    /// The seat as an array index.
    pub fn as_usize(self) -> usize {
        usize::from(self.0)
    }
}

impl TryFrom<u8> for PlayerIndex {
    type Error = ProtocolError;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        Self::new(usize::from(n)).ok_or_else(|| {
            ProtocolError::InvalidMessage(format!("no seat {n}"))
        })
    }
}

impl From<PlayerIndex> for u8 {
    fn from(index: PlayerIndex) -> Self {
        index.0
    }
}

impl fmt::Display for PlayerIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unique identifier for one match instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(pub u64);

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Level data
// ---------------------------------------------------------------------------

/// One building of the skyline. `x` is the left edge in map columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    pub x: u32,
    pub width: u32,
    pub height: u32,
}

impl Building {
    /// The column just past the right edge, i.e. where the next building
    /// starts.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// Who should receive an outbound [`ServerEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every player in the match.
    All,
    /// One specific seat.
    Player(PlayerIndex),
}

// ---------------------------------------------------------------------------
// Game events
// ---------------------------------------------------------------------------

/// Events a player's client sends to the match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// The client has loaded and the player wants to start.
    Ready,
    /// The current player threw. The payload (angle, velocity, ...) is
    /// opaque to the server and forwarded verbatim to the opponent.
    ThrowBanana(serde_json::Value),
    /// Sent by the player whose banana just hit: ends the round in their
    /// favour.
    EndRound,
}

impl ClientEvent {
    /// The wire name of the event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::ThrowBanana(_) => "throwBanana",
            Self::EndRound => "endRound",
        }
    }
}

/// Payload of `matchStarted`, sent individually to each player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchStarted {
    /// The recipient's own seat.
    pub player_index: PlayerIndex,
    /// Usernames ordered by seat.
    pub usernames: [String; 2],
    /// Where the client should navigate once the match is over.
    #[serde(rename = "returnURL")]
    pub return_url: String,
}

/// Payload of `roundStarted`, broadcast identically to both players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundStarted {
    pub starting_player: PlayerIndex,
    pub buildings: Vec<Building>,
    /// Building index each gorilla stands on, indexed by seat.
    pub gorilla_buildings: [usize; 2],
}

/// Events the match sends to players.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    MatchStarted(MatchStarted),
    RoundStarted(RoundStarted),
    /// The opponent's throw, exactly as they sent it.
    BananaThrown(serde_json::Value),
    MatchEnded { winner: PlayerIndex },
    Error { msg: String },
}

impl ServerEvent {
    /// The wire name of the event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MatchStarted(_) => "matchStarted",
            Self::RoundStarted(_) => "roundStarted",
            Self::BananaThrown(_) => "bananaThrown",
            Self::MatchEnded { .. } => "matchEnded",
            Self::Error { .. } => "error",
        }
    }
}

// ---------------------------------------------------------------------------
// Framing
// ---------------------------------------------------------------------------

/// Connection-level messages, handled by the server rather than the match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SystemMessage {
    /// Client → Server: first frame on every connection. `token` is handed
    /// to the server's authenticator to obtain a username.
    Handshake { version: u32, token: String },

    /// Server → Client: the player is authenticated and seated.
    HandshakeAck {
        username: String,
        match_id: MatchId,
        player_index: PlayerIndex,
    },

    /// Server → Client: the connection-level request failed. `code`
    /// follows HTTP conventions (400 bad request, 401 unauthorized,
    /// 409 conflict).
    Error { code: u16, message: String },
}

/// Everything on the wire is a `Frame`: either plumbing or a game event.
///
/// ```text
/// { "type": "System", "data": { "type": "Handshake", ... } }
/// { "type": "Game",   "data": { "event": "ready" } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Frame<E> {
    System(SystemMessage),
    Game(E),
}

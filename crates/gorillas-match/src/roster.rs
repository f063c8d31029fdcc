//! The two seats of a match and who is sitting in them.

use gorillas_protocol::{PlayerIndex, ServerEvent};
use tokio::sync::mpsc;

use crate::{GameInfo, MatchError};

/// Channel sender for delivering events to one player's connection.
///
/// The connection handler owns the receiving half; a closed receiver
/// just means the player is gone and sends to it are dropped.
pub type PlayerSender = mpsc::UnboundedSender<ServerEvent>;

/// One seated player.
#[derive(Debug, Clone)]
pub struct Player {
    pub username: String,
    pub index: PlayerIndex,
    pub ready: bool,
    sender: PlayerSender,
}

impl Player {
    /// Sends an event to this player. Fire-and-forget: a disconnected
    /// player never blocks or fails delivery to anyone else.
    pub fn send(&self, event: ServerEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!(
                username = %self.username,
                "player channel closed, dropping event"
            );
        }
    }
}

/// Tracks the players of one match in join order.
///
/// Players are never removed; the seat a username gets on first join is
/// the seat it keeps.
#[derive(Debug, Default)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seats a player and returns their index.
    ///
    /// Joining again with a username that is already seated changes
    /// nothing and returns the existing seat.
    ///
    /// # Errors
    /// Returns [`MatchError::RosterFull`] for a new username once both
    /// seats are taken.
    pub fn join(
        &mut self,
        username: &str,
        sender: PlayerSender,
    ) -> Result<PlayerIndex, MatchError> {
        if let Some(existing) = self.lookup(username) {
            return Ok(existing.index);
        }

        let index = PlayerIndex::new(self.players.len())
            .filter(|_| !self.is_full())
            .ok_or(MatchError::RosterFull)?;

        self.players.push(Player {
            username: username.to_string(),
            index,
            ready: false,
            sender,
        });
        Ok(index)
    }

    /// Finds a seated player by username.
    pub fn lookup(&self, username: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.username == username)
    }

    /// Like [`lookup`](Self::lookup), but an unknown username is an error.
    ///
    /// # Errors
    /// Returns [`MatchError::UnknownPlayer`].
    pub fn resolve(&self, username: &str) -> Result<&Player, MatchError> {
        self.lookup(username)
            .ok_or_else(|| MatchError::UnknownPlayer(username.to_string()))
    }

    /// The player in a given seat, if seated.
    pub fn player(&self, index: PlayerIndex) -> Option<&Player> {
        self.players.get(index.as_usize())
    }

    /// Marks a player ready. Returns `true` if they already were.
    ///
    /// # Errors
    /// Returns [`MatchError::UnknownPlayer`].
    pub fn mark_ready(&mut self, username: &str) -> Result<bool, MatchError> {
        let player = self
            .players
            .iter_mut()
            .find(|p| p.username == username)
            .ok_or_else(|| MatchError::UnknownPlayer(username.to_string()))?;
        let was_ready = player.ready;
        player.ready = true;
        Ok(was_ready)
    }

    /// Returns `true` once every seat is taken.
    pub fn is_full(&self) -> bool {
        self.players.len() >= GameInfo::GORILLAS.max_players
    }

    /// Returns `true` if the roster is full and everyone is ready.
    pub fn all_ready(&self) -> bool {
        self.is_full() && self.players.iter().all(|p| p.ready)
    }

    /// Usernames ordered by seat, or `None` until both seats are taken.
    pub fn usernames(&self) -> Option<[String; 2]> {
        match self.players.as_slice() {
            [first, second] => {
                Some([first.username.clone(), second.username.clone()])
            }
            _ => None,
        }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }
}

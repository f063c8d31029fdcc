//! Match actor: a Tokio task that owns one [`Match`].
//!
//! Connection handlers never touch a `Match` directly. They send commands
//! through a [`MatchHandle`] and the actor applies them one at a time, so
//! events from both players are serialized without a lock.

use gorillas_protocol::{ClientEvent, MatchId, PlayerIndex};
use tokio::sync::{mpsc, oneshot};

use crate::{Match, MatchConfig, MatchError, MatchPhase, PlayerSender};

/// Commands sent to a match actor through its channel.
pub(crate) enum MatchCommand {
    /// Seat a player.
    Join {
        username: String,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<PlayerIndex, MatchError>>,
    },

    /// Apply a game event from a player.
    Event {
        username: String,
        event: ClientEvent,
        reply: oneshot::Sender<Result<(), MatchError>>,
    },

    /// Request a metadata snapshot.
    Info {
        reply: oneshot::Sender<MatchInfo>,
    },

    Shutdown,
}

/// A snapshot of match metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchInfo {
    pub match_id: MatchId,
    pub phase: MatchPhase,
    pub player_count: usize,
    pub max_players: usize,
    /// Round wins, indexed by seat.
    pub wins: [u32; 2],
}

impl MatchInfo {
    /// Returns `true` if a new player could take a seat.
    pub fn has_open_seat(&self) -> bool {
        self.phase.is_joinable() && self.player_count < self.max_players
    }
}

/// Handle to a running match actor. Cheap to clone.
#[derive(Debug, Clone)]
pub struct MatchHandle {
    match_id: MatchId,
    sender: mpsc::Sender<MatchCommand>,
}

impl MatchHandle {
    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    /// Seats a player and returns their index.
    pub async fn join(
        &self,
        username: &str,
        sender: PlayerSender,
    ) -> Result<PlayerIndex, MatchError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(MatchCommand::Join {
            username: username.to_string(),
            sender,
            reply: reply_tx,
        })
        .await?;
        reply_rx
            .await
            .map_err(|_| MatchError::Unavailable(self.match_id))?
    }

    /// Applies a game event and waits for the outcome. Outbound events
    /// have already been delivered to the players by the time this
    /// returns.
    pub async fn dispatch(
        &self,
        username: &str,
        event: ClientEvent,
    ) -> Result<(), MatchError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(MatchCommand::Event {
            username: username.to_string(),
            event,
            reply: reply_tx,
        })
        .await?;
        reply_rx
            .await
            .map_err(|_| MatchError::Unavailable(self.match_id))?
    }

    pub async fn info(&self) -> Result<MatchInfo, MatchError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(MatchCommand::Info { reply: reply_tx }).await?;
        reply_rx
            .await
            .map_err(|_| MatchError::Unavailable(self.match_id))
    }

    /// Tells the actor to stop. Pending commands behind this one are
    /// dropped.
    pub async fn shutdown(&self) -> Result<(), MatchError> {
        self.send(MatchCommand::Shutdown).await
    }

    async fn send(&self, cmd: MatchCommand) -> Result<(), MatchError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| MatchError::Unavailable(self.match_id))
    }
}

struct MatchActor {
    game: Match,
    receiver: mpsc::Receiver<MatchCommand>,
}

impl MatchActor {
    async fn run(mut self) {
        let match_id = self.game.id();
        tracing::info!(%match_id, "match actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                MatchCommand::Join {
                    username,
                    sender,
                    reply,
                } => {
                    let result = self.game.join(&username, sender);
                    if let Err(err) = &result {
                        tracing::debug!(%match_id, %username, %err, "join rejected");
                    }
                    let _ = reply.send(result);
                }
                MatchCommand::Event {
                    username,
                    event,
                    reply,
                } => {
                    let result = self.game.apply(&username, event);
                    if let Err(err) = &result {
                        tracing::debug!(%match_id, %username, %err, "event rejected");
                    }
                    let _ = reply.send(result);
                }
                MatchCommand::Info { reply } => {
                    let _ = reply.send(self.info());
                }
                MatchCommand::Shutdown => {
                    tracing::info!(%match_id, "match shutting down");
                    break;
                }
            }
        }

        tracing::info!(%match_id, "match actor stopped");
    }

    fn info(&self) -> MatchInfo {
        MatchInfo {
            match_id: self.game.id(),
            phase: self.game.phase(),
            player_count: self.game.roster().player_count(),
            max_players: crate::GameInfo::GORILLAS.max_players,
            wins: self.game.wins(),
        }
    }
}

/// Spawns a match actor and returns a handle to it.
///
/// `channel_size` bounds the command queue; senders wait once it fills.
pub fn spawn_match(
    match_id: MatchId,
    config: MatchConfig,
    channel_size: usize,
) -> MatchHandle {
    let (tx, rx) = mpsc::channel(channel_size);
    let actor = MatchActor {
        game: Match::new(match_id, config),
        receiver: rx,
    };
    tokio::spawn(actor.run());

    MatchHandle {
        match_id,
        sender: tx,
    }
}

#[cfg(test)]
mod tests {
    use gorillas_protocol::ServerEvent;

    use super::*;

    fn seeded() -> MatchConfig {
        MatchConfig {
            seed: Some(99),
            ..MatchConfig::default()
        }
    }

    #[tokio::test]
    async fn test_handle_join_and_info() {
        let handle = spawn_match(MatchId(7), seeded(), 8);
        let index = handle
            .join("alice", mpsc::unbounded_channel().0)
            .await
            .unwrap();
        assert_eq!(index, PlayerIndex::FIRST);

        let info = handle.info().await.unwrap();
        assert_eq!(info.match_id, MatchId(7));
        assert_eq!(info.phase, MatchPhase::AwaitingPlayers);
        assert_eq!(info.player_count, 1);
        assert!(info.has_open_seat());
    }

    #[tokio::test]
    async fn test_handle_dispatch_delivers_before_reply() {
        let handle = spawn_match(MatchId(1), seeded(), 8);
        let (tx0, mut rx0) = mpsc::unbounded_channel();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        handle.join("alice", tx0).await.unwrap();
        handle.join("bob", tx1).await.unwrap();

        handle.dispatch("alice", ClientEvent::Ready).await.unwrap();
        handle.dispatch("bob", ClientEvent::Ready).await.unwrap();

        assert!(matches!(rx0.try_recv(), Ok(ServerEvent::MatchStarted(_))));
        assert!(matches!(rx0.try_recv(), Ok(ServerEvent::RoundStarted(_))));
        assert!(matches!(rx1.try_recv(), Ok(ServerEvent::MatchStarted(_))));
        assert!(matches!(rx1.try_recv(), Ok(ServerEvent::RoundStarted(_))));

        let info = handle.info().await.unwrap();
        assert_eq!(info.phase, MatchPhase::RoundActive);
        assert!(!info.has_open_seat());
    }

    #[tokio::test]
    async fn test_handle_dispatch_returns_rejection() {
        let handle = spawn_match(MatchId(1), seeded(), 8);
        let result = handle.dispatch("ghost", ClientEvent::Ready).await;
        assert_eq!(result, Err(MatchError::UnknownPlayer("ghost".into())));
    }

    #[tokio::test]
    async fn test_handle_after_shutdown_is_unavailable() {
        let handle = spawn_match(MatchId(3), seeded(), 8);
        handle.shutdown().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        assert_eq!(
            handle.info().await,
            Err(MatchError::Unavailable(MatchId(3)))
        );
    }
}

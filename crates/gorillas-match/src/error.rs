//! Error types for the match layer.

use gorillas_protocol::MatchId;

/// Errors returned by the roster, level generator, match state machine
/// and lobby.
///
/// None of these are fatal to a match: every failure is scoped to the
/// single operation that produced it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    /// The acting player doesn't own the action right now. The display
    /// string is what the offending client sees.
    #[error("It is not your turn.")]
    TurnViolation,

    /// The event names a username that never joined this match.
    #[error("unknown player {0}")]
    UnknownPlayer(String),

    /// Both seats are taken.
    #[error("match is full")]
    RosterFull,

    /// Throw or endRound arrived before the first round started.
    #[error("no round is in progress")]
    RoundNotActive,

    /// The match has a winner; nothing else is accepted.
    #[error("the match is over")]
    MatchEnded,

    /// Level generation parameters can't produce a valid map.
    #[error("invalid level configuration: {0}")]
    Config(String),

    /// No match with this ID.
    #[error("match {0} not found")]
    NotFound(MatchId),

    /// The player is already seated in a match.
    #[error("player {0} already in match {1}")]
    AlreadyInMatch(String, MatchId),

    /// The player isn't seated in any match.
    #[error("player {0} is not in any match")]
    NotInMatch(String),

    /// The match actor's command channel is closed.
    #[error("match {0} is unavailable")]
    Unavailable(MatchId),
}

//! The match state machine: readiness, rounds, turns, and scoring.
//!
//! A [`Match`] is the whole state of one game instance. It is not
//! synchronized; the actor in [`crate::actor`] owns it and feeds it one
//! event at a time.

use gorillas_protocol::{
    ClientEvent, MatchId, MatchStarted, PlayerIndex, Recipient, RoundStarted,
    ServerEvent,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::level::{self, Level};
use crate::{MatchConfig, MatchError, MatchPhase, PlayerSender, Roster};

/// Events produced by one handler call, paired with who gets them.
pub type Outbound = Vec<(Recipient, ServerEvent)>;

/// One best-of-N Gorillas match between two players.
#[derive(Debug)]
pub struct Match {
    id: MatchId,
    config: MatchConfig,
    phase: MatchPhase,
    roster: Roster,
    starting_player: PlayerIndex,
    /// `None` until the first turn of a round. The first advance sets it
    /// to 2, not 1; only parity matters, and with 2 the starting player
    /// is the current player.
    turn_number: Option<u32>,
    wins: [u32; 2],
    level: Option<Level>,
    rng: StdRng,
}

impl Match {
    /// Creates an empty match waiting for its two players.
    pub fn new(id: MatchId, config: MatchConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            id,
            config,
            phase: MatchPhase::AwaitingPlayers,
            roster: Roster::new(),
            starting_player: PlayerIndex::FIRST,
            turn_number: None,
            wins: [0, 0],
            level: None,
            rng,
        }
    }

    // -- Accessors ---------------------------------------------------------

    pub fn id(&self) -> MatchId {
        self.id
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Round wins, indexed by seat.
    pub fn wins(&self) -> [u32; 2] {
        self.wins
    }

    pub fn turn_number(&self) -> Option<u32> {
        self.turn_number
    }

    pub fn starting_player(&self) -> PlayerIndex {
        self.starting_player
    }

    /// The current round's field, once a round has started.
    pub fn level(&self) -> Option<&Level> {
        self.level.as_ref()
    }

    /// The seat whose turn it is to throw.
    pub fn current_player(&self) -> PlayerIndex {
        PlayerIndex::from_parity(self.turn_parity())
    }

    /// The seat that threw last, and the only one allowed to end the
    /// round.
    pub fn other_player(&self) -> PlayerIndex {
        PlayerIndex::from_parity(self.turn_parity() + 1)
    }

    fn turn_parity(&self) -> u32 {
        self.turn_number.unwrap_or(0) + self.starting_player.as_usize() as u32
    }

    // -- Entry points ------------------------------------------------------

    /// Seats a player. Rejoining with a seated username returns the seat
    /// it already has.
    ///
    /// # Errors
    /// [`MatchError::RosterFull`] for a third username,
    /// [`MatchError::MatchEnded`] once the match is over.
    pub fn join(
        &mut self,
        username: &str,
        sender: PlayerSender,
    ) -> Result<PlayerIndex, MatchError> {
        if self.phase.is_terminal() {
            return Err(MatchError::MatchEnded);
        }

        let index = self.roster.join(username, sender)?;
        tracing::info!(
            match_id = %self.id,
            username,
            player_index = %index,
            players = self.roster.player_count(),
            "player joined"
        );

        if self.phase == MatchPhase::AwaitingPlayers && self.roster.is_full() {
            self.transition(MatchPhase::AwaitingReady);
        }
        Ok(index)
    }

    /// Handles an event and delivers the result.
    ///
    /// On success the outbound events go to their recipients. When a known
    /// player's event is rejected, that player alone receives an `error`
    /// event carrying the error's message.
    ///
    /// # Errors
    /// Whatever [`handle`](Self::handle) returns.
    pub fn apply(
        &mut self,
        username: &str,
        event: ClientEvent,
    ) -> Result<(), MatchError> {
        match self.handle(username, event) {
            Ok(outbound) => {
                self.deliver(outbound);
                Ok(())
            }
            Err(err) => {
                if let Some(player) = self.roster.lookup(username) {
                    player.send(ServerEvent::Error {
                        msg: err.to_string(),
                    });
                }
                Err(err)
            }
        }
    }

    /// Resolves the acting player and dispatches the event to its handler.
    /// Nothing is sent; the caller decides what to do with the result.
    ///
    /// # Errors
    /// - [`MatchError::UnknownPlayer`] if `username` never joined
    /// - [`MatchError::MatchEnded`] once the match is over
    /// - [`MatchError::RoundNotActive`] for a throw or endRound outside a round
    /// - [`MatchError::TurnViolation`] if the player doesn't own the action
    /// - [`MatchError::Config`] if the next round's level can't be generated
    pub fn handle(
        &mut self,
        username: &str,
        event: ClientEvent,
    ) -> Result<Outbound, MatchError> {
        let actor = self.roster.resolve(username)?.index;
        if self.phase.is_terminal() {
            return Err(MatchError::MatchEnded);
        }

        tracing::debug!(
            match_id = %self.id,
            username,
            event = event.name(),
            current_player = %self.current_player(),
            "handling event"
        );

        match event {
            ClientEvent::Ready => self.on_ready(username),
            ClientEvent::ThrowBanana(payload) => {
                self.on_throw_banana(actor, payload)
            }
            ClientEvent::EndRound => self.on_end_round(actor),
        }
    }

    // -- Handlers ----------------------------------------------------------

    fn on_ready(&mut self, username: &str) -> Result<Outbound, MatchError> {
        if self.roster.mark_ready(username)? {
            tracing::debug!(match_id = %self.id, username, "already ready");
        } else {
            tracing::info!(match_id = %self.id, username, "player ready");
        }

        if self.phase != MatchPhase::AwaitingReady || !self.roster.all_ready()
        {
            return Ok(Vec::new());
        }
        let Some(usernames) = self.roster.usernames() else {
            return Ok(Vec::new());
        };

        let level = self.generate_level()?;
        tracing::info!(match_id = %self.id, "both players ready, match starting");

        let mut outbound: Outbound = self
            .roster
            .players()
            .iter()
            .map(|player| {
                (
                    Recipient::Player(player.index),
                    ServerEvent::MatchStarted(MatchStarted {
                        player_index: player.index,
                        usernames: usernames.clone(),
                        return_url: self.config.return_url.clone(),
                    }),
                )
            })
            .collect();
        outbound.extend(self.start_round(level));
        Ok(outbound)
    }

    fn on_throw_banana(
        &mut self,
        actor: PlayerIndex,
        payload: serde_json::Value,
    ) -> Result<Outbound, MatchError> {
        self.require_round()?;
        if actor != self.current_player() {
            tracing::debug!(
                match_id = %self.id,
                %actor,
                "banana thrown out of turn"
            );
            return Err(MatchError::TurnViolation);
        }

        let target = self.other_player();
        self.next_turn();
        Ok(vec![(Recipient::Player(target), ServerEvent::BananaThrown(payload))])
    }

    fn on_end_round(&mut self, actor: PlayerIndex) -> Result<Outbound, MatchError> {
        self.require_round()?;
        // The player who just threw reports the hit, so the round belongs
        // to the other player, not the current one.
        let scorer = self.other_player();
        if actor != scorer {
            tracing::debug!(
                match_id = %self.id,
                %actor,
                "round ended by the wrong player"
            );
            return Err(MatchError::TurnViolation);
        }

        let wins = self.wins[scorer.as_usize()] + 1;
        if self.config.is_decisive(wins) {
            self.wins[scorer.as_usize()] = wins;
            self.transition(MatchPhase::RoundEnded);
            self.transition(MatchPhase::MatchEnded);
            tracing::info!(
                match_id = %self.id,
                winner = %scorer,
                wins = ?self.wins,
                "match over"
            );
            return Ok(vec![(
                Recipient::All,
                ServerEvent::MatchEnded { winner: scorer },
            )]);
        }

        // Generate first so a bad level leaves the score untouched.
        let level = self.generate_level()?;
        self.wins[scorer.as_usize()] = wins;
        self.transition(MatchPhase::RoundEnded);
        tracing::info!(
            match_id = %self.id,
            scorer = %scorer,
            wins = ?self.wins,
            "round won"
        );
        Ok(self.start_round(level))
    }

    // -- Round plumbing ----------------------------------------------------

    fn start_round(&mut self, level: Level) -> Outbound {
        self.starting_player = if self.rng.random_bool(0.5) {
            PlayerIndex::SECOND
        } else {
            PlayerIndex::FIRST
        };
        self.turn_number = None;

        let event = ServerEvent::RoundStarted(RoundStarted {
            starting_player: self.starting_player,
            buildings: level.buildings.clone(),
            gorilla_buildings: level.gorilla_buildings,
        });
        self.level = Some(level);
        self.transition(MatchPhase::RoundActive);
        self.next_turn();

        tracing::info!(
            match_id = %self.id,
            current_player = %self.current_player(),
            "round started"
        );
        vec![(Recipient::All, event)]
    }

    fn next_turn(&mut self) {
        let turn = self.turn_number.unwrap_or(1);
        self.turn_number = Some(turn + 1);
    }

    fn generate_level(&mut self) -> Result<Level, MatchError> {
        level::generate_level(&self.config.level, &mut self.rng).inspect_err(
            |err| {
                tracing::warn!(
                    match_id = %self.id,
                    error = %err,
                    "level generation failed, round not started"
                );
            },
        )
    }

    fn require_round(&self) -> Result<(), MatchError> {
        if self.phase == MatchPhase::RoundActive {
            Ok(())
        } else {
            Err(MatchError::RoundNotActive)
        }
    }

    fn transition(&mut self, target: MatchPhase) {
        debug_assert!(
            self.phase.can_transition_to(target),
            "illegal transition {} -> {}",
            self.phase,
            target
        );
        tracing::debug!(
            match_id = %self.id,
            from = %self.phase,
            to = %target,
            "phase transition"
        );
        self.phase = target;
    }

    /// Sends each outbound event to its recipients.
    pub fn deliver(&self, outbound: Outbound) {
        for (recipient, event) in outbound {
            match recipient {
                Recipient::All => {
                    for player in self.roster.players() {
                        player.send(event.clone());
                    }
                }
                Recipient::Player(index) => {
                    if let Some(player) = self.roster.player(index) {
                        player.send(event);
                    }
                }
            }
        }
    }
}

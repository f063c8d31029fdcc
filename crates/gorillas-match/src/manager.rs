//! Match manager: creates matches, pairs players, and tracks who plays
//! where.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use gorillas_protocol::{ClientEvent, MatchId, PlayerIndex};

use crate::actor::spawn_match;
use crate::{MatchConfig, MatchError, MatchHandle, MatchInfo, PlayerSender};

static NEXT_MATCH_ID: AtomicU64 = AtomicU64::new(1);

/// Default command channel size for match actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Owns every running match and maps usernames to the match they sit in.
///
/// A username is seated in at most one match at a time.
#[derive(Debug, Default)]
pub struct MatchManager {
    config: MatchConfig,
    matches: HashMap<MatchId, MatchHandle>,
    player_matches: HashMap<String, MatchId>,
}

impl MatchManager {
    /// Creates an empty manager. `config` is used for every new match.
    pub fn new(config: MatchConfig) -> Self {
        Self {
            config,
            matches: HashMap::new(),
            player_matches: HashMap::new(),
        }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Spawns a new match and returns its ID.
    pub fn create_match(&mut self) -> MatchId {
        let match_id = MatchId(NEXT_MATCH_ID.fetch_add(1, Ordering::Relaxed));
        let handle =
            spawn_match(match_id, self.config.clone(), DEFAULT_CHANNEL_SIZE);
        self.matches.insert(match_id, handle);
        tracing::info!(%match_id, "match created");
        match_id
    }

    /// Seats a player in a specific match.
    ///
    /// Joining the match the player already sits in returns their seat.
    ///
    /// # Errors
    /// - [`MatchError::AlreadyInMatch`] if seated in a different match
    /// - [`MatchError::NotFound`] for an unknown match
    /// - whatever the match itself rejects the join with
    pub async fn join_match(
        &mut self,
        username: &str,
        match_id: MatchId,
        sender: PlayerSender,
    ) -> Result<PlayerIndex, MatchError> {
        if let Some(current) = self.player_matches.get(username) {
            if *current != match_id {
                return Err(MatchError::AlreadyInMatch(
                    username.to_string(),
                    *current,
                ));
            }
        }

        let handle = self
            .matches
            .get(&match_id)
            .ok_or(MatchError::NotFound(match_id))?;
        let index = handle.join(username, sender).await?;
        self.player_matches.insert(username.to_string(), match_id);
        Ok(index)
    }

    /// Puts the player in the first match with an open seat, else in a
    /// new one. Finished matches are reclaimed first.
    ///
    /// # Errors
    /// [`MatchError::AlreadyInMatch`] if the player still holds a seat in
    /// a match that hasn't ended.
    pub async fn join_or_create(
        &mut self,
        username: &str,
        sender: PlayerSender,
    ) -> Result<(MatchId, PlayerIndex), MatchError> {
        self.reap_finished().await;
        if let Some(current) = self.player_matches.get(username) {
            return Err(MatchError::AlreadyInMatch(
                username.to_string(),
                *current,
            ));
        }

        // A seat can fill between the info query and the join; on any
        // rejection keep looking.
        for handle in self.matches.values() {
            let Ok(info) = handle.info().await else {
                continue;
            };
            if !info.has_open_seat() {
                continue;
            }
            if let Ok(index) = handle.join(username, sender.clone()).await {
                self.player_matches
                    .insert(username.to_string(), info.match_id);
                return Ok((info.match_id, index));
            }
        }

        let match_id = self.create_match();
        let index = self.join_match(username, match_id, sender).await?;
        Ok((match_id, index))
    }

    /// Called when a player's connection goes away.
    ///
    /// Seats are never given back and nobody can reconnect, so the match
    /// can't go on without them: it is destroyed, which also frees the
    /// opponent. Does nothing unless the player still sits in `match_id`.
    ///
    /// # Errors
    /// [`MatchError::NotInMatch`] if the player isn't seated in `match_id`.
    pub async fn leave_match(
        &mut self,
        username: &str,
        match_id: MatchId,
    ) -> Result<(), MatchError> {
        if self.player_matches.get(username) != Some(&match_id) {
            return Err(MatchError::NotInMatch(username.to_string()));
        }
        tracing::info!(%match_id, username, "player left, abandoning match");
        self.destroy_match(match_id).await
    }

    /// Destroys every match that has ended or whose actor is gone.
    /// Returns how many were removed.
    pub async fn reap_finished(&mut self) -> usize {
        let mut finished = Vec::new();
        for (match_id, handle) in &self.matches {
            match handle.info().await {
                Ok(info) if !info.phase.is_terminal() => {}
                _ => finished.push(*match_id),
            }
        }

        for match_id in &finished {
            let _ = self.destroy_match(*match_id).await;
        }
        if !finished.is_empty() {
            tracing::debug!(count = finished.len(), "reaped finished matches");
        }
        finished.len()
    }

    /// Sends a game event to the match the player sits in.
    ///
    /// # Errors
    /// [`MatchError::NotInMatch`] if the player isn't seated anywhere,
    /// otherwise whatever the match returns.
    pub async fn route_event(
        &self,
        username: &str,
        event: ClientEvent,
    ) -> Result<(), MatchError> {
        let match_id = self
            .player_match(username)
            .ok_or_else(|| MatchError::NotInMatch(username.to_string()))?;
        self.handle(match_id)
            .ok_or(MatchError::NotFound(match_id))?
            .dispatch(username, event)
            .await
    }

    pub async fn match_info(
        &self,
        match_id: MatchId,
    ) -> Result<MatchInfo, MatchError> {
        self.handle(match_id)
            .ok_or(MatchError::NotFound(match_id))?
            .info()
            .await
    }

    /// Lists the matches that still have an open seat. Matches that
    /// don't answer are skipped.
    pub async fn list_matches(&self) -> Vec<MatchInfo> {
        let mut infos = Vec::with_capacity(self.matches.len());
        for handle in self.matches.values() {
            if let Ok(info) = handle.info().await {
                if info.has_open_seat() {
                    infos.push(info);
                }
            }
        }
        infos
    }

    /// Shuts a match down and forgets its players.
    pub async fn destroy_match(
        &mut self,
        match_id: MatchId,
    ) -> Result<(), MatchError> {
        let handle = self
            .matches
            .remove(&match_id)
            .ok_or(MatchError::NotFound(match_id))?;
        let _ = handle.shutdown().await;
        self.player_matches.retain(|_, id| *id != match_id);

        tracing::info!(%match_id, "match destroyed");
        Ok(())
    }

    /// A clone of the match's handle, for talking to it without holding
    /// the manager.
    pub fn handle(&self, match_id: MatchId) -> Option<MatchHandle> {
        self.matches.get(&match_id).cloned()
    }

    pub fn player_match(&self, username: &str) -> Option<MatchId> {
        self.player_matches.get(username).copied()
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    pub fn match_ids(&self) -> Vec<MatchId> {
        self.matches.keys().copied().collect()
    }
}

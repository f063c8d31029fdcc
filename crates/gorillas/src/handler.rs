//! Per-connection handler: handshake, seating, and event routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Receive Handshake → validate version
//!   2. Authenticate token → get username
//!   3. Seat the player in a match → send HandshakeAck
//!   4. Spawn a writer that forwards match events to the socket
//!   5. Loop: receive frames → route game events to the match
//!
//! When the handler exits, the match the player sat in is abandoned.

use std::sync::Arc;

use gorillas_match::{MatchError, MatchHandle};
use gorillas_protocol::{
    ClientEvent, Codec, Frame, MatchId, PROTOCOL_VERSION, ProtocolError,
    ServerEvent, SystemMessage,
};
use tokio::sync::mpsc;

use crate::server::ServerState;
use crate::transport::{ConnectionReader, ConnectionWriter, WebSocketConnection};
use crate::{Authenticator, GorillasError, TransportError};

/// Drop guard that takes a player out of the lobby when the handler exits,
/// even if it panics. `Drop` is synchronous, so the lobby lock is taken in
/// a spawned task.
struct SeatGuard<A: Authenticator, C: Codec> {
    username: String,
    match_id: MatchId,
    state: Arc<ServerState<A, C>>,
}

impl<A: Authenticator, C: Codec> Drop for SeatGuard<A, C> {
    fn drop(&mut self) {
        let username = std::mem::take(&mut self.username);
        let match_id = self.match_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let mut matches = state.matches.lock().await;
            if let Err(e) = matches.leave_match(&username, match_id).await {
                tracing::debug!(%username, %match_id, error = %e, "leave match failed");
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<A, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<A, C>>,
) -> Result<(), GorillasError>
where
    A: Authenticator,
    C: Codec,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");
    let (writer, mut reader) = conn.split();

    // --- Step 1: Handshake ---
    let username = perform_handshake(&writer, &mut reader, &state).await?;
    tracing::info!(%conn_id, %username, "player authenticated");

    // --- Step 2: Seat the player ---
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let seated = {
        let mut matches = state.matches.lock().await;
        match matches.join_or_create(&username, events_tx).await {
            Ok((match_id, index)) => matches
                .handle(match_id)
                .map(|handle| (handle, index))
                .ok_or(MatchError::NotFound(match_id)),
            Err(e) => Err(e),
        }
    };
    let (handle, player_index) = match seated {
        Ok(seated) => seated,
        Err(e) => {
            send_system(&writer, &state.codec, conflict(&e)).await?;
            return Err(e.into());
        }
    };
    let match_id = handle.match_id();

    let ack = SystemMessage::HandshakeAck {
        username: username.clone(),
        match_id,
        player_index,
    };
    let _guard = SeatGuard {
        username: username.clone(),
        match_id,
        state: Arc::clone(&state),
    };
    send_system(&writer, &state.codec, ack).await?;
    tracing::info!(%conn_id, %username, %match_id, %player_index, "player seated");

    // --- Step 3: Forward match events until either side goes away ---
    let mut forwarder = tokio::spawn(forward_events(
        writer.clone(),
        Arc::clone(&state),
        events_rx,
    ));

    let result = tokio::select! {
        result = read_loop(&writer, &mut reader, &state, &handle, &username) => result,
        // The event stream ends once the match is gone.
        _ = &mut forwarder => {
            tracing::info!(%conn_id, %username, %match_id, "match closed, closing connection");
            let _ = writer.close().await;
            Ok(())
        }
    };

    forwarder.abort();
    tracing::info!(%conn_id, %username, %match_id, "player disconnected");
    result
}

/// Receives and validates the handshake. Returns the authenticated
/// username.
async fn perform_handshake<A, C>(
    writer: &ConnectionWriter,
    reader: &mut ConnectionReader,
    state: &Arc<ServerState<A, C>>,
) -> Result<String, GorillasError>
where
    A: Authenticator,
    C: Codec,
{
    let data = match tokio::time::timeout(state.handshake_timeout, reader.recv())
        .await
    {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(TransportError::ConnectionClosed(
                "closed before handshake".into(),
            )
            .into());
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => {
            return Err(ProtocolError::InvalidMessage(
                "handshake timed out".into(),
            )
            .into());
        }
    };

    let frame: Result<Frame<ClientEvent>, _> = state.codec.decode(&data);
    let (version, token) = match frame {
        Ok(Frame::System(SystemMessage::Handshake { version, token })) => {
            (version, token)
        }
        _ => {
            send_system(writer, &state.codec, bad_request("expected Handshake"))
                .await?;
            return Err(ProtocolError::InvalidMessage(
                "first message must be Handshake".into(),
            )
            .into());
        }
    };

    if version != PROTOCOL_VERSION {
        let message =
            format!("version mismatch: expected {PROTOCOL_VERSION}, got {version}");
        send_system(writer, &state.codec, bad_request(&message)).await?;
        return Err(ProtocolError::InvalidMessage(message).into());
    }

    match state.auth.authenticate(&token).await {
        Ok(username) => Ok(username),
        Err(e) => {
            send_system(
                writer,
                &state.codec,
                SystemMessage::Error {
                    code: 401,
                    message: "unauthorized".into(),
                },
            )
            .await?;
            Err(e.into())
        }
    }
}

/// Decodes client frames and hands game events to the match.
async fn read_loop<A, C>(
    writer: &ConnectionWriter,
    reader: &mut ConnectionReader,
    state: &Arc<ServerState<A, C>>,
    handle: &MatchHandle,
    username: &str,
) -> Result<(), GorillasError>
where
    A: Authenticator,
    C: Codec,
{
    let conn_id = reader.id();
    loop {
        let data = match reader.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::debug!(%conn_id, %username, "connection closed cleanly");
                return Ok(());
            }
            Err(e) => {
                tracing::debug!(%conn_id, %username, error = %e, "recv error");
                return Ok(());
            }
        };

        let event = match state.codec.decode::<Frame<ClientEvent>>(&data) {
            Ok(Frame::Game(event)) => event,
            Ok(Frame::System(msg)) => {
                tracing::debug!(%username, ?msg, "unexpected system message");
                send_system(
                    writer,
                    &state.codec,
                    bad_request("unexpected system message"),
                )
                .await?;
                continue;
            }
            Err(e) => {
                tracing::debug!(%username, error = %e, "failed to decode frame");
                send_system(
                    writer,
                    &state.codec,
                    bad_request(&format!("invalid frame: {e}")),
                )
                .await?;
                continue;
            }
        };

        // Rejections were already reported to the player as an `error`
        // event by the match itself.
        match handle.dispatch(username, event).await {
            Ok(()) => {}
            Err(MatchError::Unavailable(match_id)) => {
                tracing::warn!(%username, %match_id, "match actor gone, closing");
                let _ = writer.close().await;
                return Err(MatchError::Unavailable(match_id).into());
            }
            Err(e) => {
                tracing::debug!(%username, error = %e, "event rejected");
            }
        }
    }
}

/// Forwards a player's match events to their socket as Game frames.
async fn forward_events<A, C>(
    writer: ConnectionWriter,
    state: Arc<ServerState<A, C>>,
    mut events: mpsc::UnboundedReceiver<ServerEvent>,
) where
    A: Authenticator,
    C: Codec,
{
    let conn_id = writer.id();
    while let Some(event) = events.recv().await {
        let name = event.name();
        let bytes = match state.codec.encode(&Frame::<ServerEvent>::Game(event)) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(%conn_id, event = name, error = %e, "failed to encode event");
                continue;
            }
        };
        if let Err(e) = writer.send(&bytes).await {
            tracing::debug!(%conn_id, error = %e, "send failed, stopping writer");
            break;
        }
        tracing::trace!(%conn_id, event = name, "event sent");
    }
}

async fn send_system(
    writer: &ConnectionWriter,
    codec: &impl Codec,
    msg: SystemMessage,
) -> Result<(), GorillasError> {
    let bytes = codec.encode(&Frame::<ServerEvent>::System(msg))?;
    writer.send(&bytes).await.map_err(GorillasError::Transport)
}

fn bad_request(message: &str) -> SystemMessage {
    SystemMessage::Error {
        code: 400,
        message: message.to_string(),
    }
}

fn conflict(err: &MatchError) -> SystemMessage {
    SystemMessage::Error {
        code: 409,
        message: err.to_string(),
    }
}

//! Websocket transport: one socket per session, JSON events out,
//! submissions in.

use crate::ServerState;
use claimline_core::ExchangeStream;
use claimline_protocol::{EventMsg, EventPayload, EventSink, SessionId, SubmissionPayload};
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use rocket::{State, get};
use rocket_ws as ws;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Websocket endpoint. Reusing a known session id resumes its
/// transcript; anything else starts a fresh session. The first frame
/// the client receives is a `connection_status` event carrying the
/// session id to use for REST calls.
#[get("/ws?<session>")]
pub fn chat_socket(
    socket: ws::WebSocket,
    session: Option<&str>,
    state: &State<ServerState>,
) -> ws::Channel<'static> {
    let state = state.inner().clone();
    let requested = session.and_then(|raw| Uuid::parse_str(raw).ok());

    socket.channel(move |mut stream| {
        Box::pin(async move {
            let session_id = match resolve_session(&state, requested) {
                Ok(session_id) => session_id,
                Err(err) => {
                    warn!("rejecting socket, no session available: {err}");
                    let event = EventMsg::new(
                        Uuid::nil(),
                        EventPayload::Error { exchange_id: None, message: err },
                    );
                    send_event(&mut stream, &event).await?;
                    return Ok(());
                }
            };
            info!("socket connected (session_id={session_id})");

            let mut events = state.router.subscribe(session_id);
            send_event(
                &mut stream,
                &EventMsg::new(session_id, EventPayload::ConnectionStatus { connected: true }),
            )
            .await?;

            let mut active: Option<ExchangeStream> = None;
            loop {
                tokio::select! {
                    event = events.recv() => match event {
                        Ok(event) => send_event(&mut stream, &event).await?,
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(
                                "socket lagged, events dropped (session_id={session_id}, \
                                 skipped={skipped})"
                            );
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    frame = stream.next() => match frame {
                        Some(Ok(ws::Message::Text(text))) => {
                            handle_frame(&state, session_id, &text, &mut active);
                        }
                        Some(Ok(ws::Message::Close(_))) | None => break,
                        Some(Ok(_)) => {}
                        Some(Err(err)) => {
                            debug!("socket read failed (session_id={session_id}): {err}");
                            break;
                        }
                    },
                }
            }

            // A disconnect cancels whatever was in flight.
            if let Some(active) = active.take() {
                active.abort();
            }
            drop(events);
            state.router.release(session_id);
            info!("socket disconnected (session_id={session_id})");
            Ok(())
        })
    })
}

fn resolve_session(state: &ServerState, requested: Option<SessionId>) -> Result<SessionId, String> {
    if let Some(session_id) = requested
        && state.orchestrator.resume_session(session_id).is_ok()
    {
        debug!("resuming session over socket (session_id={session_id})");
        return Ok(session_id);
    }
    state
        .orchestrator
        .create_session()
        .map_err(|err| err.to_string())
}

fn handle_frame(
    state: &ServerState,
    session_id: SessionId,
    text: &str,
    active: &mut Option<ExchangeStream>,
) {
    let payload: SubmissionPayload = match serde_json::from_str(text) {
        Ok(payload) => payload,
        Err(err) => {
            debug!("ignoring unparseable frame (session_id={session_id}): {err}");
            state.router.emit(EventMsg::new(
                session_id,
                EventPayload::Error {
                    exchange_id: None,
                    message: format!("unrecognised message: {err}"),
                },
            ));
            return;
        }
    };

    match payload {
        SubmissionPayload::UserMessage { content } => {
            match state.orchestrator.submit_message(session_id, content) {
                Ok(stream) => *active = Some(stream),
                Err(err) => {
                    state.router.emit(EventMsg::new(
                        session_id,
                        EventPayload::Error { exchange_id: None, message: err.to_string() },
                    ));
                }
            }
        }
        SubmissionPayload::CancelExchange { exchange_id } => {
            match active.take_if(|stream| stream.exchange_id == exchange_id) {
                Some(stream) => {
                    info!(
                        "cancelling exchange (session_id={session_id}, exchange_id={exchange_id})"
                    );
                    stream.abort();
                }
                None => debug!(
                    "cancel for unknown exchange (session_id={session_id}, \
                     exchange_id={exchange_id})"
                ),
            }
        }
    }
}

async fn send_event(
    stream: &mut ws::stream::DuplexStream,
    event: &EventMsg,
) -> ws::result::Result<()> {
    match serde_json::to_string(event) {
        Ok(text) => stream.send(ws::Message::Text(text)).await,
        Err(err) => {
            warn!("failed to encode event (session_id={}): {err}", event.session_id);
            Ok(())
        }
    }
}

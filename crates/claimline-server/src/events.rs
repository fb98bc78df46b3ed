//! Per-session event routing between the orchestrator and sockets.

use claimline_protocol::{EventMsg, EventSink, SessionId};
use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;
use tokio::sync::broadcast;

const SESSION_CHANNEL_BUFFER: usize = 512;

/// Routes orchestrator events to the websocket subscribed to their
/// session. Events for sessions with no subscriber are dropped; the
/// transcript is replayed from persistence on reconnect instead.
#[derive(Default)]
pub struct EventRouter {
    channels: RwLock<HashMap<SessionId, broadcast::Sender<EventMsg>>>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to events for a session, creating its channel if needed.
    pub fn subscribe(&self, session_id: SessionId) -> broadcast::Receiver<EventMsg> {
        let mut channels = self.channels.write();
        channels
            .entry(session_id)
            .or_insert_with(|| broadcast::channel(SESSION_CHANNEL_BUFFER).0)
            .subscribe()
    }

    /// Drop the channel for a session once its last subscriber is gone.
    pub fn release(&self, session_id: SessionId) {
        let mut channels = self.channels.write();
        if let Some(sender) = channels.get(&session_id)
            && sender.receiver_count() == 0
        {
            debug!("releasing event channel (session_id={session_id})");
            channels.remove(&session_id);
        }
    }

    /// Number of live session channels; used in tests.
    pub fn channel_count(&self) -> usize {
        self.channels.read().len()
    }
}

impl EventSink for EventRouter {
    fn emit(&self, event: EventMsg) {
        let channels = self.channels.read();
        if let Some(sender) = channels.get(&event.session_id) {
            let _ = sender.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::EventRouter;
    use claimline_protocol::{EventMsg, EventPayload, EventSink};
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    #[tokio::test]
    async fn events_reach_only_their_session_subscriber() {
        let router = EventRouter::new();
        let session_a = Uuid::new_v4();
        let session_b = Uuid::new_v4();
        let mut sub_a = router.subscribe(session_a);
        let mut sub_b = router.subscribe(session_b);

        router.emit(EventMsg::new(
            session_a,
            EventPayload::ConnectionStatus { connected: true },
        ));

        let received = sub_a.recv().await.expect("event for a");
        assert_eq!(received.session_id, session_a);
        assert!(sub_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn release_drops_unsubscribed_channels() {
        let router = EventRouter::new();
        let session_id = Uuid::new_v4();
        let receiver = router.subscribe(session_id);
        assert_eq!(router.channel_count(), 1);

        // Still subscribed: release keeps the channel.
        router.release(session_id);
        assert_eq!(router.channel_count(), 1);

        drop(receiver);
        router.release(session_id);
        assert_eq!(router.channel_count(), 0);
    }
}

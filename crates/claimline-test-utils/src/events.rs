use claimline_protocol::{EventMsg, EventSink};
use parking_lot::Mutex;
use std::sync::Arc;

/// Sink that collects every emitted event for later assertions.
#[derive(Clone, Default)]
pub struct CollectingSink {
    events: Arc<Mutex<Vec<EventMsg>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of events emitted so far.
    pub fn events(&self) -> Vec<EventMsg> {
        self.events.lock().clone()
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: EventMsg) {
        self.events.lock().push(event);
    }
}

//! Conversation orchestration core.

mod document;
pub mod prompt;
mod runtime;
mod sessions;

pub use runtime::ExchangeOutcome;

use crate::error::ClaimlineCoreError;
use crate::extract::{PlainTextExtractor, TextExtractor};
use crate::knowledge::KnowledgeBase;
use crate::llm::{ChatProvider, OpenAiProvider};
use crate::referral::SolicitorDirectory;
use crate::state::{SqliteStateStore, StateStore};
use crate::types::{DocumentAnalysis, Message, Session, SessionSummary};
use claimline_config::{ClaimlineConfig, SessionsConfig};
use claimline_protocol::{EventMsg, EventSink, ExchangeId, SessionId};
use directories::BaseDirs;
use document::{DocumentExecutor, DocumentParams};
use log::{debug, info};
use parking_lot::Mutex;
use runtime::{ExchangeExecutor, ExchangeParams};
use sessions::SessionStore;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

const EXCHANGE_STREAM_BUFFER: usize = 512;

/// Streaming handle for a single in-flight exchange.
#[derive(Debug)]
pub struct ExchangeStream {
    /// Session the exchange runs in.
    pub session_id: SessionId,
    /// Exchange identifier; every event the exchange emits carries it.
    pub exchange_id: ExchangeId,
    /// Stream of events emitted during the exchange.
    pub events: BroadcastStream<EventMsg>,
    handle: JoinHandle<Result<ExchangeOutcome, ClaimlineCoreError>>,
}

impl ExchangeStream {
    /// Await completion of the exchange and return the final outcome.
    pub async fn finish(self) -> Result<ExchangeOutcome, ClaimlineCoreError> {
        self.handle
            .await
            .map_err(|err| ClaimlineCoreError::Executor(err.to_string()))?
    }

    /// Cancel the exchange. Work already emitted stays emitted; nothing
    /// is persisted for a cancelled exchange.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

#[derive(Clone)]
struct ExchangeEventBus {
    sender: broadcast::Sender<EventMsg>,
}

impl ExchangeEventBus {
    fn new(buffer: usize) -> (Self, broadcast::Receiver<EventMsg>) {
        let (sender, receiver) = broadcast::channel(buffer);
        (Self { sender }, receiver)
    }
}

impl EventSink for ExchangeEventBus {
    fn emit(&self, event: EventMsg) {
        let _ = self.sender.send(event);
    }
}

struct FanoutEventSink {
    primary: Option<Arc<dyn EventSink>>,
    secondary: Arc<dyn EventSink>,
}

impl EventSink for FanoutEventSink {
    fn emit(&self, event: EventMsg) {
        if let Some(primary) = &self.primary {
            primary.emit(event.clone());
        }
        self.secondary.emit(event);
    }
}

/// Removes a session from the in-flight set when the exchange future
/// finishes or is aborted.
struct InFlightGuard {
    in_flight: Arc<Mutex<HashSet<SessionId>>>,
    session_id: SessionId,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.session_id);
    }
}

/// Main orchestration façade: manages sessions and runs chat and
/// document exchanges.
pub struct Orchestrator {
    config: Arc<ClaimlineConfig>,
    session_store: SessionStore,
    exchange_executor: Arc<ExchangeExecutor>,
    document_executor: Arc<DocumentExecutor>,
    event_sink: Option<Arc<dyn EventSink>>,
    in_flight: Arc<Mutex<HashSet<SessionId>>>,
}

impl Orchestrator {
    /// Construct a new orchestrator with optional overrides. A missing
    /// chat provider is built from config; a missing state store is
    /// opened under the configured sessions path when persistence is
    /// enabled.
    pub fn new(
        config: ClaimlineConfig,
        llm: Option<Arc<dyn ChatProvider>>,
        extractor: Option<Arc<dyn TextExtractor>>,
        state_store: Option<Arc<dyn StateStore>>,
        event_sink: Option<Arc<dyn EventSink>>,
    ) -> Result<Self, ClaimlineCoreError> {
        info!("initializing orchestrator");
        debug!(
            "orchestrator config flags (sessions={}, model={})",
            config.sessions.enabled, config.llm.model
        );

        let llm = match llm {
            Some(llm) => llm,
            None => Arc::new(OpenAiProvider::from_config(&config.llm)?),
        };
        let extractor: Arc<dyn TextExtractor> = match extractor {
            Some(extractor) => extractor,
            None => Arc::new(PlainTextExtractor),
        };
        let state_store = if config.sessions.enabled {
            match state_store {
                Some(store) => Some(store),
                None => Some(build_default_state_store(&config.sessions)?),
            }
        } else {
            None
        };

        let config = Arc::new(config);
        let session_store = SessionStore::new(state_store);
        let knowledge = Arc::new(KnowledgeBase::seed());
        let directory = Arc::new(SolicitorDirectory::seed());
        debug!(
            "knowledge base wired (records={}, firms=4)",
            knowledge.len()
        );

        let exchange_executor = Arc::new(ExchangeExecutor::new(
            config.clone(),
            knowledge,
            directory,
            llm.clone(),
            session_store.clone(),
        ));
        let document_executor = Arc::new(DocumentExecutor::new(
            config.clone(),
            llm,
            extractor,
            session_store.clone(),
        ));

        info!("orchestrator initialized");
        Ok(Self {
            config,
            session_store,
            exchange_executor,
            document_executor,
            event_sink,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        })
    }

    /// Return the shared configuration for this orchestrator.
    pub fn config(&self) -> &ClaimlineConfig {
        &self.config
    }

    /// Create a new session.
    pub fn create_session(&self) -> Result<SessionId, ClaimlineCoreError> {
        self.session_store.create_session()
    }

    /// Resume a session and return its state.
    pub fn resume_session(&self, session_id: SessionId) -> Result<Session, ClaimlineCoreError> {
        self.session_store.resume_session(session_id)
    }

    /// Return the transcript for a session; unknown sessions yield an
    /// empty transcript.
    pub fn history(&self, session_id: SessionId) -> Result<Vec<Message>, ClaimlineCoreError> {
        self.session_store.history(session_id)
    }

    /// List all persisted sessions.
    pub fn list_sessions(&self) -> Result<Vec<SessionSummary>, ClaimlineCoreError> {
        self.session_store.list_sessions()
    }

    /// Load document analyses for a session, oldest first.
    pub fn document_analyses(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<DocumentAnalysis>, ClaimlineCoreError> {
        self.session_store.document_analyses(session_id)
    }

    /// Submit a chat message for a session and stream the exchange. At
    /// most one exchange runs per session; a second submission while one
    /// is in flight is rejected.
    pub fn submit_message(
        &self,
        session_id: SessionId,
        input: impl Into<String>,
    ) -> Result<ExchangeStream, ClaimlineCoreError> {
        let input = input.into();
        let exchange_id = Uuid::new_v4();
        info!(
            "submitting message (session_id={}, exchange_id={}, input_len={})",
            session_id,
            exchange_id,
            input.len()
        );
        let guard = self.claim_session(session_id)?;
        let (events, fanout) = self.wire_sinks();
        let executor = self.exchange_executor.clone();
        let handle = tokio::spawn(async move {
            let _guard = guard;
            executor
                .run_exchange(ExchangeParams {
                    session_id,
                    exchange_id,
                    input,
                    event_sink: fanout,
                })
                .await
        });

        Ok(ExchangeStream { session_id, exchange_id, events, handle })
    }

    /// Submit an uploaded document for analysis and stream the exchange.
    /// The successful outcome's response text is the analysis summary.
    pub fn submit_document(
        &self,
        session_id: SessionId,
        filename: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<ExchangeStream, ClaimlineCoreError> {
        let filename = filename.into();
        let exchange_id = Uuid::new_v4();
        info!(
            "submitting document (session_id={}, exchange_id={}, filename={}, bytes={})",
            session_id,
            exchange_id,
            filename,
            bytes.len()
        );
        let guard = self.claim_session(session_id)?;
        let (events, fanout) = self.wire_sinks();
        let executor = self.document_executor.clone();
        let handle = tokio::spawn(async move {
            let _guard = guard;
            let analysis = executor
                .analyze(DocumentParams {
                    session_id,
                    exchange_id,
                    filename,
                    bytes,
                    event_sink: fanout,
                })
                .await?;
            Ok(ExchangeOutcome {
                session_id,
                exchange_id,
                response: analysis.ai_summary,
            })
        });

        Ok(ExchangeStream { session_id, exchange_id, events, handle })
    }

    fn claim_session(&self, session_id: SessionId) -> Result<InFlightGuard, ClaimlineCoreError> {
        let mut in_flight = self.in_flight.lock();
        if !in_flight.insert(session_id) {
            return Err(ClaimlineCoreError::ExchangeInFlight(session_id));
        }
        Ok(InFlightGuard { in_flight: self.in_flight.clone(), session_id })
    }

    fn wire_sinks(&self) -> (BroadcastStream<EventMsg>, Arc<dyn EventSink>) {
        let (bus, receiver) = ExchangeEventBus::new(EXCHANGE_STREAM_BUFFER);
        let fanout: Arc<dyn EventSink> = Arc::new(FanoutEventSink {
            primary: self.event_sink.clone(),
            secondary: Arc::new(bus),
        });
        (BroadcastStream::new(receiver), fanout)
    }
}

/// Build the default state store from config.
fn build_default_state_store(
    config: &SessionsConfig,
) -> Result<Arc<dyn StateStore>, ClaimlineCoreError> {
    let path = resolve_default_path(config.path.as_ref())?;
    info!("initializing session store (path={})", path.display());
    let store =
        SqliteStateStore::open(path).map_err(|err| ClaimlineCoreError::State(err.to_string()))?;
    Ok(Arc::new(store))
}

/// Resolve the database path for session storage.
fn resolve_default_path(path: Option<&String>) -> Result<PathBuf, ClaimlineCoreError> {
    let cwd = std::env::current_dir().map_err(ClaimlineCoreError::Io)?;
    if let Some(path) = path {
        let path = PathBuf::from(path);
        if path.is_absolute() {
            debug!("using absolute session store path: {}", path.display());
            return Ok(path);
        }
        debug!(
            "resolving session store path relative to cwd: {}",
            cwd.join(&path).display()
        );
        return Ok(cwd.join(path));
    }

    if let Some(home) = BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf()) {
        return Ok(home.join(".claimline").join("claimline.db"));
    }

    Ok(cwd.join(".claimline").join("claimline.db"))
}

//! Session lifecycle glue — start/stop contracts and event relay.
//!
//! The service decouples the start request from the work: `start` registers
//! the session, spawns the orchestrator on its own task, and returns a
//! handle immediately; turns and the single terminal status flow to the
//! caller through a bounded, ordered event channel. `stop` is fire-and-
//! forget. Cleanup of the cancellation flag and the active-session entry is
//! guaranteed on every exit path, including panics.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cancel::{CancellationRegistry, SharedCancellationRegistry};
use crate::debate::{
    DebateConfig, DebateOrchestrator, ErrorKind, PersonaActor, RunOutcome, Speaker, Turn,
};
use crate::retrieval::{ground_topic, EvidenceRetriever};

/// Bound on the outbound event channel. A slow observer backpressures the
/// debate instead of growing an unbounded buffer.
pub const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Error from the session layer.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A run is already in flight for this session id; concurrent starts
    /// sharing an id are rejected rather than silently overwriting each
    /// other's cancellation entry.
    #[error("a debate is already running for session '{0}'")]
    AlreadyRunning(String),

    /// The spawned debate task panicked or was aborted.
    #[error("debate task did not complete: {0}")]
    RunIncomplete(String),
}

/// Start contract consumed from the transport boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartRequest {
    /// Opaque caller-supplied session identifier (e.g. a connection id).
    pub session_id: String,
    /// Debate topic.
    pub topic: String,
    /// Exchange pairs to run; `None` uses the configured default.
    pub total_rounds: Option<u32>,
}

/// One event pushed to the observer. Turns arrive in production order;
/// exactly one terminal variant closes the stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DebateEvent {
    Turn {
        speaker: Speaker,
        text: String,
        round: u32,
    },
    Completed,
    Stopped {
        cancelled: bool,
    },
    Error {
        kind: ErrorKind,
        message: String,
    },
}

impl DebateEvent {
    fn from_turn(turn: &Turn) -> Self {
        Self::Turn {
            speaker: turn.speaker,
            text: turn.text.clone(),
            round: turn.round,
        }
    }

    fn terminal(outcome: &RunOutcome) -> Self {
        match outcome {
            RunOutcome::Completed(_) => Self::Completed,
            RunOutcome::Stopped(_) => Self::Stopped { cancelled: true },
            RunOutcome::Failed { kind, error, .. } => Self::Error {
                kind: *kind,
                message: error.to_string(),
            },
        }
    }

    /// Whether this event closes the stream.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Turn { .. })
    }
}

/// Handle returned by [`DebateService::start`]. Owns the event receiver and
/// the running task.
#[derive(Debug)]
pub struct DebateHandle {
    session_id: String,
    events: mpsc::Receiver<DebateEvent>,
    task: JoinHandle<RunOutcome>,
}

impl DebateHandle {
    /// The session this handle observes.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Receive the next event, or `None` once the stream has closed.
    pub async fn next_event(&mut self) -> Option<DebateEvent> {
        self.events.recv().await
    }

    /// Await the run's terminal outcome. Drain events first: the debate
    /// backpressures on the bounded channel while events are unread.
    pub async fn outcome(self) -> Result<RunOutcome, SessionError> {
        self.task
            .await
            .map_err(|join_error| SessionError::RunIncomplete(join_error.to_string()))
    }
}

/// Accepts start/stop requests and runs each debate off the request path.
pub struct DebateService {
    registry: SharedCancellationRegistry,
    active: Arc<Mutex<HashSet<String>>>,
    config: DebateConfig,
    retriever: Option<Arc<dyn EvidenceRetriever>>,
}

impl DebateService {
    /// Create a service with the default debate config.
    pub fn new() -> Self {
        Self::with_config(DebateConfig::default())
    }

    /// Create a service with a custom debate config.
    pub fn with_config(config: DebateConfig) -> Self {
        Self {
            registry: CancellationRegistry::new().shared(),
            active: Arc::new(Mutex::new(HashSet::new())),
            config,
            retriever: None,
        }
    }

    /// Attach an evidence retriever; its top snippets for the topic are
    /// folded into the opening framing before each run.
    pub fn with_retriever(mut self, retriever: Arc<dyn EvidenceRetriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Whether a run is currently in flight for the given id.
    pub fn is_active(&self, session_id: &str) -> bool {
        lock_active(&self.active).contains(session_id)
    }

    /// Start a debate. Returns immediately with a handle; the run proceeds
    /// on its own task. A second start for an id already in flight is
    /// rejected.
    pub fn start(
        &self,
        request: StartRequest,
        critic: Arc<dyn PersonaActor>,
        defender: Arc<dyn PersonaActor>,
    ) -> Result<DebateHandle, SessionError> {
        {
            let mut active = lock_active(&self.active);
            if !active.insert(request.session_id.clone()) {
                return Err(SessionError::AlreadyRunning(request.session_id));
            }
        }

        let session_id = request.session_id.clone();
        let config = match request.total_rounds {
            Some(rounds) => self.config.clone().with_total_rounds(rounds),
            None => self.config.clone(),
        };
        let registry = Arc::clone(&self.registry);
        let retriever = self.retriever.clone();
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        info!(session_id = %session_id, topic = %request.topic, "Debate session accepted");

        let cleanup = SessionCleanup {
            registry: Arc::clone(&registry),
            active: Arc::clone(&self.active),
            session_id: session_id.clone(),
        };

        let task = tokio::spawn(async move {
            // Dropped on every exit path, panics included: the cancellation
            // flag and the active-session entry never outlive the run.
            let _cleanup = cleanup;

            let topic = match &retriever {
                Some(retriever) => match retriever.retrieve(&request.topic).await {
                    Ok(snippets) => ground_topic(&request.topic, &snippets),
                    Err(error) => {
                        warn!(
                            session_id = %request.session_id,
                            %error,
                            "Evidence retrieval failed; running ungrounded"
                        );
                        request.topic.clone()
                    }
                },
                None => request.topic.clone(),
            };

            let (turn_tx, mut turn_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
            let orchestrator = DebateOrchestrator::with_config(
                &request.session_id,
                registry,
                turn_tx,
                config,
            );

            let relay = async {
                while let Some(turn) = turn_rx.recv().await {
                    if event_tx.send(DebateEvent::from_turn(&turn)).await.is_err() {
                        // Observer gone; stop relaying so the run's own
                        // sink detection kicks in.
                        break;
                    }
                }
            };

            let (outcome, ()) = tokio::join!(
                orchestrator.run(critic.as_ref(), defender.as_ref(), &topic),
                relay
            );

            if event_tx
                .send(DebateEvent::terminal(&outcome))
                .await
                .is_err()
            {
                debug!(session_id = %request.session_id, "Observer gone before terminal event");
            }
            outcome
        });

        Ok(DebateHandle {
            session_id,
            events: event_rx,
            task,
        })
    }

    /// Stop contract: mark the session cancelled. Fire-and-forget and
    /// idempotent; observed by the run at its next check point. A stop for
    /// an id with no run in flight is a no-op, so a stray request cannot
    /// plant a flag that would leak into a future session.
    pub fn stop(&self, session_id: &str) {
        if !self.is_active(session_id) {
            debug!(session_id, "Stop requested for inactive session; ignored");
            return;
        }
        self.registry.request(session_id);
    }

    /// The registry shared with running orchestrators. Exposed for
    /// transports that deliver stop signals on their own path.
    pub fn registry(&self) -> SharedCancellationRegistry {
        Arc::clone(&self.registry)
    }
}

impl Default for DebateService {
    fn default() -> Self {
        Self::new()
    }
}

/// Guaranteed-release guard for a session's shared entries.
struct SessionCleanup {
    registry: SharedCancellationRegistry,
    active: Arc<Mutex<HashSet<String>>>,
    session_id: String,
}

impl Drop for SessionCleanup {
    fn drop(&mut self) {
        self.registry.clear(&self.session_id);
        lock_active(&self.active).remove(&self.session_id);
        debug!(session_id = %self.session_id, "Session entries released");
    }
}

// The active set stays coherent across a poisoning panic; recover it.
fn lock_active(active: &Mutex<HashSet<String>>) -> std::sync::MutexGuard<'_, HashSet<String>> {
    active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

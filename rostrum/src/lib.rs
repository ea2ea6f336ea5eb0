//! Rostrum — Debate Orchestration Engine
//!
//! Stages a scripted multi-turn argument between two automated personas
//! (Critic and Defender) over a shared evidence set, streaming each turn to
//! a remote observer as soon as it is produced. The engine enforces a fixed
//! inter-turn gap to respect an external per-minute call quota, and supports
//! cooperative mid-run cancellation that never leaks session state.
//!
//! # Components
//!
//! - [`debate`] — the core: round loop, actor invoker, failure taxonomy,
//!   transcript types
//! - [`cancel`] — process-wide cancellation flags keyed by session id
//! - [`pacing`] — interruptible inter-turn delay
//! - [`retrieval`] — the evidence retriever contract and topic grounding
//! - [`session`] — start/stop contracts, per-session task spawning, and the
//!   bounded event channel to the observer
//!
//! # Usage
//!
//! ```rust,ignore
//! use rostrum::session::{DebateService, StartRequest};
//!
//! let service = DebateService::new();
//! let mut handle = service.start(
//!     StartRequest {
//!         session_id: "conn-1".into(),
//!         topic: "Is X ethical?".into(),
//!         total_rounds: Some(3),
//!     },
//!     critic,
//!     defender,
//! )?;
//!
//! while let Some(event) = handle.next_event().await {
//!     // relay to the observer; exactly one terminal event closes the stream
//! }
//! ```

pub mod cancel;
pub mod debate;
pub mod pacing;
pub mod retrieval;
pub mod session;

// Re-export key debate types
pub use debate::{
    ActorInvoker, DebateConfig, DebateError, DebateOrchestrator, ErrorKind, PersonaActor,
    RunOutcome, Speaker, Transcript, Turn,
};

// Re-export cancellation and pacing primitives
pub use cancel::{CancellationRegistry, SharedCancellationRegistry};
pub use pacing::PacedClock;

// Re-export retrieval contract
pub use retrieval::{EvidenceRetriever, EvidenceSnippet};

// Re-export session layer types
pub use session::{DebateEvent, DebateHandle, DebateService, SessionError, StartRequest};

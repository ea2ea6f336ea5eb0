//! Debate Orchestration — Paced Critic/Defender Round Loop
//!
//! Stages a scripted multi-turn argument between two personas, emitting
//! each turn as it is produced and honoring the external call quota with a
//! fixed, cancellable gap between actor calls.
//!
//! # Round Flow
//!
//! ```text
//! RoundStart(n) → CriticInvoking → CriticPacing → DefenderInvoking → DefenderPacing
//!      │                │               │               │                 │
//!      │                │               │               │                 ├─ n == total → Completed
//!      │                │               │               │                 └─ else → RoundStart(n+1)
//!      │                └── failure ────┼── failure ────┘
//!      │                                ▼
//!      │                             Failed (classified, one System turn)
//!      └── cancellation observed at round start or any pacing tick
//!                                       ▼
//!                                    Stopped (one System turn)
//! ```
//!
//! Cancellation is cooperative: an in-flight actor call always finishes;
//! the stop only prevents the next call.

pub mod actor;
pub mod error;
pub mod orchestrator;
pub mod transcript;

pub use actor::{ActorInvoker, PersonaActor};
pub use error::{classify, DebateError, ErrorKind};
pub use orchestrator::{DebateConfig, DebateOrchestrator};
pub use transcript::{RunOutcome, Speaker, Transcript, Turn, NO_PRIOR_TURNS};

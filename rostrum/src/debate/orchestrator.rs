//! Debate orchestrator — drives the paced critic/defender round loop.
//!
//! One orchestrator owns one run: it consults the cancellation registry at
//! every check point, invokes actors through the [`ActorInvoker`], emits
//! each turn the moment it is produced, and terminates into exactly one of
//! Completed, Stopped, or Failed — always carrying the partial transcript.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::cancel::SharedCancellationRegistry;
use crate::pacing::PacedClock;

use super::actor::{ActorInvoker, PersonaActor};
use super::error::{classify, DebateError, ErrorKind};
use super::transcript::{RunOutcome, Speaker, Transcript, Turn};

/// Rounds used when the caller supplies a non-conforming count.
pub const DEFAULT_TOTAL_ROUNDS: u32 = 3;

/// Inter-turn gap honoring the external per-minute call quota.
pub const DEFAULT_TURN_GAP_MS: u64 = 6_500;

/// Cancellation polling granularity during a pacing wait.
pub const DEFAULT_POLL_TICK_MS: u64 = 250;

/// Configuration for one debate run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateConfig {
    /// Number of critic/defender exchange pairs. A zero value is coerced
    /// to [`DEFAULT_TOTAL_ROUNDS`] rather than rejected.
    pub total_rounds: u32,
    /// Enforced minimum delay between successive actor calls.
    pub turn_gap_ms: u64,
    /// How often a pacing wait polls for cancellation. Smaller ticks mean
    /// faster stop response at no quota cost.
    pub poll_tick_ms: u64,
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self {
            total_rounds: DEFAULT_TOTAL_ROUNDS,
            turn_gap_ms: DEFAULT_TURN_GAP_MS,
            poll_tick_ms: DEFAULT_POLL_TICK_MS,
        }
    }
}

impl DebateConfig {
    /// Override the number of rounds.
    pub fn with_total_rounds(mut self, total_rounds: u32) -> Self {
        self.total_rounds = total_rounds;
        self
    }

    /// Override the inter-turn gap.
    pub fn with_turn_gap_ms(mut self, turn_gap_ms: u64) -> Self {
        self.turn_gap_ms = turn_gap_ms;
        self
    }

    /// Override the cancellation polling tick.
    pub fn with_poll_tick_ms(mut self, poll_tick_ms: u64) -> Self {
        self.poll_tick_ms = poll_tick_ms;
        self
    }

    fn normalized(mut self) -> Self {
        if self.total_rounds == 0 {
            warn!(
                default = DEFAULT_TOTAL_ROUNDS,
                "total_rounds of 0 coerced to default"
            );
            self.total_rounds = DEFAULT_TOTAL_ROUNDS;
        }
        self
    }
}

/// Drives one debate run for one session.
///
/// The run is a single sequential task: turns are produced and emitted in
/// strict order, cancellation is cooperative (polled at round starts and
/// pacing ticks, never preemptive), and an in-flight actor call is always
/// allowed to finish — a stop only prevents the next call.
pub struct DebateOrchestrator {
    session_id: String,
    config: DebateConfig,
    registry: SharedCancellationRegistry,
    clock: PacedClock,
    transcript: Transcript,
    turns: mpsc::Sender<Turn>,
    sink_gone: bool,
}

impl DebateOrchestrator {
    /// Create an orchestrator with the default config.
    pub fn new(
        session_id: &str,
        registry: SharedCancellationRegistry,
        turns: mpsc::Sender<Turn>,
    ) -> Self {
        Self::with_config(session_id, registry, turns, DebateConfig::default())
    }

    /// Create an orchestrator with a custom config. Non-conforming round
    /// counts are coerced here, before the run starts.
    pub fn with_config(
        session_id: &str,
        registry: SharedCancellationRegistry,
        turns: mpsc::Sender<Turn>,
        config: DebateConfig,
    ) -> Self {
        let config = config.normalized();
        let clock = PacedClock::new(Duration::from_millis(config.poll_tick_ms));
        Self {
            session_id: session_id.to_string(),
            config,
            registry,
            clock,
            transcript: Transcript::new(),
            turns,
            sink_gone: false,
        }
    }

    /// Run the debate to termination.
    ///
    /// Per round: check cancellation, invoke the critic, pace, invoke the
    /// defender, pace, then carry the defender's text forward as the next
    /// round's critic-facing topic. Validation failures surface before any
    /// actor call is made.
    pub async fn run(
        mut self,
        critic: &dyn PersonaActor,
        defender: &dyn PersonaActor,
        topic: &str,
    ) -> RunOutcome {
        let topic = topic.trim();
        if topic.is_empty() {
            return self.rejected(DebateError::InvalidTopic);
        }
        if !critic.is_available().await {
            return self.rejected(DebateError::InvalidActor {
                role: Speaker::Critic,
            });
        }
        if !defender.is_available().await {
            return self.rejected(DebateError::InvalidActor {
                role: Speaker::Defender,
            });
        }

        let total_rounds = self.config.total_rounds;
        let gap = Duration::from_millis(self.config.turn_gap_ms);
        info!(
            session_id = %self.session_id,
            total_rounds,
            turn_gap_ms = self.config.turn_gap_ms,
            "Debate started"
        );

        // The text the critic argues against: the original topic in round 1,
        // the defender's latest rebuttal afterwards.
        let mut facing = topic.to_string();

        for round in 1..=total_rounds {
            if self.cancellation_requested() {
                return self.stopped(round).await;
            }

            let instruction = if round == 1 {
                opening_critique(&facing)
            } else {
                attack_previous_defense(&facing)
            };
            let critic_text = match ActorInvoker::invoke(
                critic,
                &instruction,
                &self.transcript.render_context(),
            )
            .await
            {
                Ok(text) => text,
                Err(error) => return self.failed(round, error).await,
            };
            self.emit(Turn::new(Speaker::Critic, critic_text.clone(), round))
                .await;

            if self.pace(gap).await.is_err() {
                return self.stopped(round).await;
            }

            let instruction = defend_latest_critique(&critic_text);
            let defender_text = match ActorInvoker::invoke(
                defender,
                &instruction,
                &self.transcript.render_context(),
            )
            .await
            {
                Ok(text) => text,
                Err(error) => return self.failed(round, error).await,
            };
            self.emit(Turn::new(Speaker::Defender, defender_text.clone(), round))
                .await;

            if self.pace(gap).await.is_err() {
                return self.stopped(round).await;
            }

            facing = defender_text;
        }

        info!(
            session_id = %self.session_id,
            turns = self.transcript.len(),
            "Debate completed"
        );
        RunOutcome::Completed(self.transcript)
    }

    fn cancellation_requested(&self) -> bool {
        self.registry.is_requested(&self.session_id)
    }

    async fn pace(&self, gap: Duration) -> Result<(), DebateError> {
        let registry = &self.registry;
        let session_id = &self.session_id;
        self.clock
            .wait(gap, || registry.is_requested(session_id))
            .await
    }

    /// Append a turn and push it to the observer immediately. A vanished
    /// observer is tolerated: the transcript keeps accumulating so the
    /// outcome invariant still holds.
    async fn emit(&mut self, turn: Turn) {
        self.transcript.push(turn.clone());
        if self.sink_gone {
            return;
        }
        if self.turns.send(turn).await.is_err() {
            warn!(
                session_id = %self.session_id,
                "Turn receiver dropped; continuing without emission"
            );
            self.sink_gone = true;
        }
    }

    /// Fail-fast path for validation errors: no actor was called, so the
    /// transcript stays empty and no System turn is appended.
    fn rejected(self, error: DebateError) -> RunOutcome {
        warn!(session_id = %self.session_id, %error, "Debate rejected before start");
        let kind = classify(&error);
        RunOutcome::Failed {
            transcript: self.transcript,
            kind,
            error,
        }
    }

    async fn stopped(mut self, round: u32) -> RunOutcome {
        info!(session_id = %self.session_id, round, "Debate stopped by user");
        self.emit(Turn::new(
            Speaker::System,
            ErrorKind::Cancelled.user_message(),
            round,
        ))
        .await;
        RunOutcome::Stopped(self.transcript)
    }

    async fn failed(mut self, round: u32, error: DebateError) -> RunOutcome {
        let kind = classify(&error);
        warn!(
            session_id = %self.session_id,
            round,
            %kind,
            %error,
            "Debate failed"
        );
        self.emit(Turn::new(Speaker::System, kind.user_message(), round))
            .await;
        RunOutcome::Failed {
            transcript: self.transcript,
            kind,
            error,
        }
    }
}

/// Round-1 critic instruction: open against the original position.
fn opening_critique(topic: &str) -> String {
    format!("Open the debate with a strong critique of the following position: {topic}")
}

/// Round-k (k > 1) critic instruction: attack the previous rebuttal.
fn attack_previous_defense(defense: &str) -> String {
    format!("Attack the Defender's previous argument: {defense}")
}

/// Defender instruction: rebut the critique just produced this round.
fn defend_latest_critique(critique: &str) -> String {
    format!("Defend the original position against the Critic's latest argument: {critique}")
}

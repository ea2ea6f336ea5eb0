//! Turn and transcript types — the debate's append-only record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{DebateError, ErrorKind};

/// Sentinel prior-context value passed to an actor before any turn exists.
pub const NO_PRIOR_TURNS: &str = "(no prior turns)";

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    /// Attacks the current position.
    Critic,
    /// Rebuts the critic's latest argument.
    Defender,
    /// Engine-authored turn describing why the loop stopped.
    System,
}

impl Speaker {
    /// Capitalized role name used in prompts and context serialization.
    pub fn label(self) -> &'static str {
        match self {
            Self::Critic => "Critic",
            Self::Defender => "Defender",
            Self::System => "System",
        }
    }
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Critic => write!(f, "critic"),
            Self::Defender => write!(f, "defender"),
            Self::System => write!(f, "system"),
        }
    }
}

/// One produced utterance within a round. Immutable once created.
///
/// System turns carry the round at which the loop stopped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Who spoke.
    pub speaker: Speaker,
    /// Non-empty utterance text.
    pub text: String,
    /// Round number (1-indexed).
    pub round: u32,
    /// When the turn was produced.
    pub created_at: DateTime<Utc>,
}

impl Turn {
    /// Create a turn stamped with the current time.
    pub fn new(speaker: Speaker, text: impl Into<String>, round: u32) -> Self {
        Self {
            speaker,
            text: text.into(),
            round,
            created_at: Utc::now(),
        }
    }
}

/// Ordered, append-only sequence of turns, owned by one orchestrator run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    /// Create an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn in production order.
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// All turns, in production order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Number of turns recorded.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether no turn has been produced yet.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The most recently produced turn.
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Serialize the conversation-so-far as one `"{Speaker}: {text}"` line
    /// per turn, or [`NO_PRIOR_TURNS`] when empty. This is the prior-context
    /// form handed to actors.
    pub fn render_context(&self) -> String {
        if self.turns.is_empty() {
            return NO_PRIOR_TURNS.to_string();
        }
        self.turns
            .iter()
            .map(|turn| format!("{}: {}", turn.speaker.label(), turn.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Terminal result of one debate run.
///
/// Every variant carries the partial transcript accumulated before
/// termination: the turns successfully produced, in production order, plus
/// at most one trailing System turn describing the stop reason.
#[derive(Debug)]
pub enum RunOutcome {
    /// All rounds ran to completion; no System turn.
    Completed(Transcript),
    /// Stopped by a user cancellation request.
    Stopped(Transcript),
    /// Terminated by a failure, classified for the caller.
    Failed {
        transcript: Transcript,
        kind: ErrorKind,
        error: DebateError,
    },
}

impl RunOutcome {
    /// The transcript accumulated before termination.
    pub fn transcript(&self) -> &Transcript {
        match self {
            Self::Completed(transcript) | Self::Stopped(transcript) => transcript,
            Self::Failed { transcript, .. } => transcript,
        }
    }

    /// Whether the run completed all rounds.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Whether the run was stopped by the user.
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_transcript_renders_sentinel() {
        let transcript = Transcript::new();
        assert!(transcript.is_empty());
        assert_eq!(transcript.render_context(), NO_PRIOR_TURNS);
    }

    #[test]
    fn test_render_context_one_line_per_turn() {
        let mut transcript = Transcript::new();
        transcript.push(Turn::new(Speaker::Critic, "premise is flawed", 1));
        transcript.push(Turn::new(Speaker::Defender, "the premise holds", 1));

        assert_eq!(
            transcript.render_context(),
            "Critic: premise is flawed\nDefender: the premise holds"
        );
    }

    #[test]
    fn test_push_preserves_production_order() {
        let mut transcript = Transcript::new();
        transcript.push(Turn::new(Speaker::Critic, "a", 1));
        transcript.push(Turn::new(Speaker::Defender, "b", 1));
        transcript.push(Turn::new(Speaker::Critic, "c", 2));

        let speakers: Vec<_> = transcript.turns().iter().map(|t| t.speaker).collect();
        assert_eq!(
            speakers,
            vec![Speaker::Critic, Speaker::Defender, Speaker::Critic]
        );
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript.last().unwrap().text, "c");
    }

    #[test]
    fn test_outcome_carries_transcript() {
        let mut transcript = Transcript::new();
        transcript.push(Turn::new(Speaker::Critic, "only turn", 1));

        let outcome = RunOutcome::Stopped(transcript);
        assert!(outcome.is_stopped());
        assert!(!outcome.is_completed());
        assert_eq!(outcome.transcript().len(), 1);
    }

    #[test]
    fn test_speaker_display_and_label() {
        assert_eq!(Speaker::Critic.to_string(), "critic");
        assert_eq!(Speaker::Defender.to_string(), "defender");
        assert_eq!(Speaker::System.to_string(), "system");
        assert_eq!(Speaker::Critic.label(), "Critic");
    }

    #[test]
    fn test_turn_serde_shape() {
        let turn = Turn::new(Speaker::Defender, "rebuttal", 2);
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["speaker"], "defender");
        assert_eq!(json["text"], "rebuttal");
        assert_eq!(json["round"], 2);
    }
}

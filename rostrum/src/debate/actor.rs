//! Persona actor capability and the call-and-validate invoker.
//!
//! The engine depends on exactly one normalized actor contract; whatever
//! call shape a concrete model client exposes is adapted to this trait
//! outside the core.

use async_trait::async_trait;
use tracing::debug;

use super::error::DebateError;
use super::transcript::Speaker;

/// A role-bound text-generation capability, invoked once per turn.
///
/// Implementations may be slow, may fail, and may be rate-limited; the
/// orchestrator treats them as opaque beyond this contract.
#[async_trait]
pub trait PersonaActor: Send + Sync {
    /// The fixed role this actor argues.
    fn role(&self) -> Speaker;

    /// Produce a response to `topic` given the serialized conversation so
    /// far (or the no-prior-turns sentinel on the very first call).
    async fn respond(&self, topic: &str, prior_context: &str) -> anyhow::Result<String>;

    /// Whether the actor currently exposes a usable response capability.
    async fn is_available(&self) -> bool {
        true
    }
}

/// Uniform wrapper around a [`PersonaActor`] call.
///
/// Performs no retries: a failed call is terminal for the run, on the
/// premise that retrying here would amplify quota violations the upstream
/// provider already refuses to absorb.
pub struct ActorInvoker;

impl ActorInvoker {
    /// Invoke an actor and validate its response.
    ///
    /// Fails with `InvalidActor` when the actor reports no response
    /// capability, `EmptyResponse` when the call yields nothing usable
    /// after trimming, and otherwise propagates the underlying failure
    /// untouched for later classification.
    pub async fn invoke(
        actor: &dyn PersonaActor,
        topic: &str,
        prior_context: &str,
    ) -> Result<String, DebateError> {
        let role = actor.role();
        if !actor.is_available().await {
            return Err(DebateError::InvalidActor { role });
        }

        debug!(%role, topic_len = topic.len(), "Invoking actor");
        let response = actor
            .respond(topic, prior_context)
            .await
            .map_err(DebateError::Upstream)?;

        let trimmed = response.trim();
        if trimmed.is_empty() {
            return Err(DebateError::EmptyResponse { role });
        }
        Ok(trimmed.to_string())
    }
}

//! Update dispatcher: turns a change notification into propagation.
//!
//! ```text
//! Received -> Validating -> Matching -> Resolving -> Dispatching -> Done
//!                 |             |            |
//!                 v             +------------+--> Done (nothing to send)
//!           Failed(kind)
//! ```
//!
//! Only validation can fail the run outright. A document that fell out of
//! scope or a sharing without eligible recipients completes normally. The
//! dispatcher never retries; it classifies errors so the job layer can.

use std::sync::Arc;

use futures::future::join_all;
use tokio::time::Instant;
use tracing::Instrument;

use crate::error::{PropagationError, PropagationFailures, SharingError, SharingResult};
use crate::models::{Recipient, Rule, TriggerEvent};
use crate::propagation::{Propagator, SharingUpdate};
use crate::recipients::resolve_recipients;
use crate::registry::SharingRegistry;
use crate::selector::is_document_still_shared;
use crate::store::DocumentStore;
use crate::validator::validate_sharing_documents;

/// Execution context handed over by the job layer.
///
/// Carries the tenant explicitly; nothing in the dispatcher reads ambient
/// state.
#[derive(Debug, Clone)]
pub struct JobContext {
    /// Domain of the instance the event belongs to.
    pub domain: String,
    pub job_id: String,
    /// Deadline for the whole run. Each recipient propagation is cut off at
    /// this instant.
    pub deadline: Option<Instant>,
}

impl JobContext {
    pub fn new(domain: impl Into<String>, job_id: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            job_id: job_id.into(),
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Validation failures that end a run in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    SharingDoesNotExist,
    SharingIdNotUnique,
    DocumentNotLegitimate,
}

impl FailureKind {
    pub fn of(error: &SharingError) -> Option<Self> {
        match error {
            SharingError::SharingDoesNotExist { .. } => Some(FailureKind::SharingDoesNotExist),
            SharingError::SharingIdNotUnique { .. } => Some(FailureKind::SharingIdNotUnique),
            SharingError::DocumentNotLegitimate { .. } => Some(FailureKind::DocumentNotLegitimate),
            _ => None,
        }
    }
}

/// States a dispatch run moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Received,
    Validating,
    Matching,
    Resolving,
    Dispatching,
    Done,
    Failed(FailureKind),
}

/// What a successful run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// States visited, in order.
    pub transitions: Vec<DispatchState>,
    /// Recipients a propagation was attempted for.
    pub attempted: usize,
    /// Labels of the recipients that received the update.
    pub delivered: Vec<String>,
}

impl DispatchOutcome {
    fn enter(&mut self, state: DispatchState) {
        tracing::trace!(?state, "dispatch transition");
        self.transitions.push(state);
    }

    /// True if the run reached the dispatching stage.
    pub fn dispatched(&self) -> bool {
        self.transitions.contains(&DispatchState::Dispatching)
    }

    /// Last state visited.
    pub fn final_state(&self) -> Option<DispatchState> {
        self.transitions.last().copied()
    }
}

/// Consumes trigger events and propagates them to sharing recipients.
#[derive(Debug)]
pub struct UpdateDispatcher<S, P> {
    store: Arc<S>,
    propagator: Arc<P>,
}

impl<S, P> Clone for UpdateDispatcher<S, P> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            propagator: Arc::clone(&self.propagator),
        }
    }
}

impl<S: DocumentStore, P: Propagator> UpdateDispatcher<S, P> {
    pub fn new(store: Arc<S>, propagator: Arc<P>) -> Self {
        Self { store, propagator }
    }

    /// Decodes a raw job payload and dispatches it.
    pub async fn handle_payload(&self, ctx: &JobContext, payload: &[u8]) -> SharingResult<DispatchOutcome> {
        let event = TriggerEvent::from_json(payload)?;
        self.dispatch(ctx, &event).await
    }

    /// Runs one event through validation, matching, resolution and fan-out.
    ///
    /// Safe to re-run from scratch: with unchanged backing state the same
    /// decision is reached.
    pub async fn dispatch(&self, ctx: &JobContext, event: &TriggerEvent) -> SharingResult<DispatchOutcome> {
        let span = tracing::info_span!(
            "sharing_updates",
            domain = %ctx.domain,
            job_id = %ctx.job_id,
            sharing_id = %event.sharing_id(),
            doc_id = %event.doc().id,
        );
        self.run(ctx, event).instrument(span).await
    }

    async fn run(&self, ctx: &JobContext, event: &TriggerEvent) -> SharingResult<DispatchOutcome> {
        let mut outcome = DispatchOutcome::default();
        outcome.enter(DispatchState::Received);

        outcome.enter(DispatchState::Validating);
        let registry = SharingRegistry::new(self.store.as_ref());
        let validated = match registry.find_sharing_documents(event.sharing_id()).await {
            Ok(found) => validate_sharing_documents(event.sharing_id(), found),
            Err(e) => Err(e),
        };
        let validated = match validated {
            Ok(v) => v,
            Err(e) => {
                if let Some(kind) = FailureKind::of(&e) {
                    outcome.enter(DispatchState::Failed(kind));
                }
                tracing::warn!(error = %e, retryable = e.is_retryable(), "sharing validation failed");
                return Err(e);
            }
        };
        let sharing = &validated.sharing;

        outcome.enter(DispatchState::Matching);
        let doc = event.doc();
        let doc_type = &event.message.rule.doc_type;
        let covering: Vec<&Rule> = sharing
            .rules_for(doc_type)
            .filter(|rule| is_document_still_shared(rule, &doc.id, &doc.referenced_by))
            .collect();
        // A covering rule that grants the event's verb decides who receives it.
        let verb = event.event_type().verb();
        let Some(rule) = covering
            .iter()
            .find(|rule| rule.permits(verb))
            .or(covering.first())
            .copied()
        else {
            tracing::info!(%doc_type, "document not covered by any sharing rule, skipping");
            outcome.enter(DispatchState::Done);
            return Ok(outcome);
        };
        tracing::debug!(rules = covering.len(), "document covered by sharing rules");

        outcome.enter(DispatchState::Resolving);
        let recipients = resolve_recipients(sharing, rule, event.event_type());
        if recipients.is_empty() {
            tracing::info!("no eligible recipient");
            outcome.enter(DispatchState::Done);
            return Ok(outcome);
        }

        outcome.enter(DispatchState::Dispatching);
        let update = SharingUpdate {
            sharing_id: sharing.sharing_id.clone(),
            event_type: event.event_type(),
            doc: doc.clone(),
        };
        let results = join_all(
            recipients
                .iter()
                .map(|r| self.propagate_one(ctx, r, &update)),
        )
        .await;

        outcome.attempted = recipients.len();
        let mut failures = PropagationFailures {
            attempted: recipients.len(),
            ..Default::default()
        };
        for (recipient, result) in recipients.iter().zip(results) {
            match result {
                Ok(()) => outcome.delivered.push(recipient.label().to_string()),
                Err(e) => {
                    tracing::warn!(recipient = recipient.label(), error = %e, transient = e.transient, "propagation failed");
                    failures.push(recipient.label(), e);
                }
            }
        }
        failures.into_result()?;

        tracing::info!(delivered = outcome.delivered.len(), "update propagated");
        outcome.enter(DispatchState::Done);
        Ok(outcome)
    }

    async fn propagate_one(
        &self,
        ctx: &JobContext,
        recipient: &Recipient,
        update: &SharingUpdate,
    ) -> Result<(), PropagationError> {
        let attempt = self.propagator.propagate(recipient, update);
        match ctx.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, attempt)
                .await
                .unwrap_or_else(|_| Err(PropagationError::transient("deadline exceeded"))),
            None => attempt.await,
        }
    }
}

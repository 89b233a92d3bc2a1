//! Escalation gateway — the boundary between collection and moderation
//!
//! Both entry paths meet here: finished manual reports are published to the
//! community's moderator surface, and classifier verdicts are turned into
//! pre-filled sessions that skip the reporter flow entirely. Routing is an
//! explicit configuration map injected at construction; there is no ambient
//! registry to consult.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::classifier::ClassifierResult;
use crate::config::ModerationConfig;
use crate::error::{FlowError, FlowResult};
use crate::events::{ModerationEvent, SharedEventBus};
use crate::notify::{MessageRef, NotificationSink, PromptHandle, Target};
use crate::render;
use crate::session::trail::PromptStage;
use crate::session::ReportSession;
use crate::taxonomy::Taxonomy;

/// The boundary component both flows call into
pub struct EscalationGateway {
    taxonomy: Arc<Taxonomy>,
    config: Arc<ModerationConfig>,
    sink: Arc<dyn NotificationSink>,
    bus: SharedEventBus,
}

impl EscalationGateway {
    pub fn new(
        taxonomy: Arc<Taxonomy>,
        config: Arc<ModerationConfig>,
        sink: Arc<dyn NotificationSink>,
        bus: SharedEventBus,
    ) -> Self {
        Self {
            taxonomy,
            config,
            sink,
            bus,
        }
    }

    /// Publish a finished collection to the moderator pool. Requires a
    /// collecting session with at least one recorded category (the `other`
    /// root counts — "other" reports always escalate). Returns the handle of
    /// the escalation posting for thread-scoping follow-ups.
    pub async fn submit(&self, session: &mut ReportSession) -> FlowResult<PromptHandle> {
        if !session.is_collecting() {
            return Err(FlowError::stale(session.id.clone()));
        }
        if session.category_path.is_empty() {
            return Err(FlowError::out_of_turn(session.id.clone()));
        }
        let surface = self
            .config
            .moderator_surface(&session.community)
            .cloned()
            .ok_or_else(|| FlowError::NoModeratorSurface {
                community: session.community.clone(),
            })?;

        session.escalate()?;

        let prompt = render::moderator_report_prompt(session, &self.taxonomy);
        let handle = self
            .sink
            .render_prompt(Target::Surface(surface), prompt)
            .await?;
        session.trail.push(PromptStage::ModeratorAction, handle.clone());
        session.escalation = Some(handle.clone());

        self.bus.publish(ModerationEvent::ReportEscalated {
            session_id: session.id.clone(),
            community: session.community.clone(),
            category_path: session.category_path.clone(),
            origin: session.origin,
            timestamp: chrono::Utc::now(),
        });
        info!(
            session = %session.id,
            community = %session.community,
            category = %session.category_path.join("/"),
            origin = %session.origin,
            "report escalated"
        );
        Ok(handle)
    }

    /// Accept a classifier verdict and inject it straight into the moderator
    /// pool, bypassing the reporter flow. Returns `None` when the verdict is
    /// below the configured confidence threshold or when the community has no
    /// moderator surface (there is no reporter to tell, so the report is
    /// logged and dropped).
    pub async fn submit_automatic(
        &self,
        target: MessageRef,
        result: ClassifierResult,
    ) -> FlowResult<Option<ReportSession>> {
        if result.confidence < self.config.auto_confidence_threshold {
            debug!(
                confidence = result.confidence,
                threshold = self.config.auto_confidence_threshold,
                "classifier verdict below threshold, ignored"
            );
            return Ok(None);
        }

        let resolution = result.resolve_path(&self.taxonomy);
        let note: String = format!("Classifier reasoning: {}", result.reasoning)
            .chars()
            .take(self.config.note_max_len)
            .collect();
        let mut session =
            ReportSession::new_automatic(target, resolution.path, note, result);

        for fallback in &resolution.fallbacks {
            warn!(session = %session.id, %fallback, "classifier field failed taxonomy validation");
            self.bus.publish(ModerationEvent::DataQuality {
                session_id: session.id.clone(),
                community: session.community.clone(),
                field: fallback.field.to_string(),
                raw: fallback.raw.clone(),
                substituted: fallback.substituted.clone(),
                timestamp: chrono::Utc::now(),
            });
        }

        match self.submit(&mut session).await {
            Ok(_) => Ok(Some(session)),
            Err(FlowError::NoModeratorSurface { community }) => {
                warn!(
                    session = %session.id,
                    %community,
                    "no moderator surface for automatic report, dropping"
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

//! Reporter-side guided classification flow
//!
//! Walks the reporter down the taxonomy one level at a time, recording
//! selections into the session, then offers the optional free-text note and
//! hands the finished session to the escalation gateway. Re-selecting a
//! different value at an already-answered level retracts every deeper prompt
//! before the next one is rendered, so divergent branches never coexist.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ModerationConfig;
use crate::error::{FlowError, FlowResult};
use crate::events::{ModerationEvent, SharedEventBus};
use crate::gateway::EscalationGateway;
use crate::notify::{NotificationSink, PromptHandle, PromptSpec, Target};
use crate::render;
use crate::session::trail::PromptStage;
use crate::session::{CloseOutcome, ReportSession, ReporterStage};
use crate::taxonomy::Taxonomy;

/// Inputs the reporter can send. `level` on a selection names the taxonomy
/// depth the answered prompt was rendered for, which is what makes revision
/// detection possible.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReporterInput {
    /// A taxonomy selection at the given depth (0 = root categories)
    Select { level: usize, key: String },
    /// Free-text note at the optional-note step
    Note { text: String },
    /// Decline the note and submit as-is
    SkipNote,
}

/// The reporter-side state machine
pub struct ReporterFlow {
    taxonomy: Arc<Taxonomy>,
    config: Arc<ModerationConfig>,
    sink: Arc<dyn NotificationSink>,
    gateway: Arc<EscalationGateway>,
    bus: SharedEventBus,
}

impl ReporterFlow {
    pub fn new(
        taxonomy: Arc<Taxonomy>,
        config: Arc<ModerationConfig>,
        sink: Arc<dyn NotificationSink>,
        gateway: Arc<EscalationGateway>,
        bus: SharedEventBus,
    ) -> Self {
        Self {
            taxonomy,
            config,
            sink,
            gateway,
            bus,
        }
    }

    /// Render the first prompt for a freshly created session
    pub async fn open(&self, session: &mut ReportSession) -> FlowResult<()> {
        let prompt = render::root_category_prompt(&session.target, self.taxonomy.roots());
        self.render_to_reporter(session, PromptStage::Category { level: 0 }, prompt)
            .await
    }

    /// Process one reporter input to completion
    pub async fn handle(&self, session: &mut ReportSession, input: ReporterInput) -> FlowResult<()> {
        if session.is_terminal() || !session.is_collecting() {
            return Err(FlowError::stale(session.id.clone()));
        }

        match input {
            ReporterInput::Select { level, key } => self.select(session, level, &key).await,
            ReporterInput::Note { text } => {
                self.require_note_stage(session)?;
                session.set_note(&text, self.config.note_max_len)?;
                session.touch();
                self.submit(session).await
            }
            ReporterInput::SkipNote => {
                self.require_note_stage(session)?;
                session.touch();
                self.submit(session).await
            }
        }
    }

    /// Explicit cancellation from any non-terminal reporter-side state
    pub async fn cancel(&self, session: &mut ReportSession) -> FlowResult<()> {
        self.cancel_inner(session, false).await
    }

    /// Advisory-timeout expiry: same terminal path, different notice
    pub async fn expire(&self, session: &mut ReportSession) -> FlowResult<()> {
        self.cancel_inner(session, true).await
    }

    async fn cancel_inner(&self, session: &mut ReportSession, expired: bool) -> FlowResult<()> {
        if session.is_terminal() || !session.is_collecting() {
            return Err(FlowError::stale(session.id.clone()));
        }

        self.retract_handles(session.trail.drain()).await;
        session.close(CloseOutcome::Cancelled)?;

        let notice = if expired {
            render::expiry_notice(&session.id)
        } else {
            render::cancellation_notice(&session.id)
        };
        if let Some(target) = reporter_target(session) {
            if let Err(e) = self.sink.notify(target, notice).await {
                debug!(session = %session.id, error = %e, "cancellation notice failed");
            }
        }

        self.bus.publish(ModerationEvent::ReportCancelled {
            session_id: session.id.clone(),
            community: session.community.clone(),
            expired,
            timestamp: chrono::Utc::now(),
        });
        debug!(session = %session.id, expired, "report cancelled");
        Ok(())
    }

    /// Selection at a taxonomy level, covering both fresh answers and
    /// revisions of earlier ones.
    async fn select(&self, session: &mut ReportSession, level: usize, key: &str) -> FlowResult<()> {
        if level > session.category_path.len() {
            // Prompt for that depth has not been rendered yet.
            return Err(FlowError::out_of_turn(session.id.clone()));
        }

        if level < session.category_path.len() {
            if session.category_path[level] == key {
                // Same answer again — deeper prompts are still valid.
                return Ok(());
            }
            // Revision: retract everything rendered for deeper levels before
            // presenting the replacement branch.
            let stale = session.trail.retract_from(PromptStage::Category { level: level + 1 });
            self.retract_handles(stale).await;
            session.category_path.truncate(level);
            debug!(session = %session.id, level, key, "category revision");
        }

        let children = self
            .taxonomy
            .children_of(&session.category_path)
            .ok_or_else(|| FlowError::invalid_selection(key))?;
        let node = children
            .iter()
            .find(|n| n.key == key)
            .ok_or_else(|| FlowError::invalid_selection(key))?;
        let node = node.clone();

        session.category_path.push(node.key.clone());
        session.touch();

        if node.is_leaf() {
            session.reporter_stage = ReporterStage::OptionalNote;
            self.render_to_reporter(session, PromptStage::Note, render::note_prompt())
                .await
        } else {
            session.reporter_stage = ReporterStage::SelectSubtype;
            let prompt = render::subtype_prompt(&node, &node.children);
            self.render_to_reporter(session, PromptStage::Category { level: level + 1 }, prompt)
                .await
        }
    }

    /// Submission: hand over to the gateway, then confirm to the reporter.
    /// A missing moderator surface is a blocking error surfaced on the
    /// reporter thread, never a silent drop.
    async fn submit(&self, session: &mut ReportSession) -> FlowResult<()> {
        match self.gateway.submit(session).await {
            Ok(_) => {
                let notice = render::confirmation_notice(session, &self.taxonomy);
                if let Some(target) = reporter_target(session) {
                    if let Err(e) = self.sink.notify(target, notice).await {
                        warn!(session = %session.id, error = %e, "confirmation notice failed");
                    }
                }
                Ok(())
            }
            Err(err @ FlowError::NoModeratorSurface { .. }) => {
                if let Some(target) = reporter_target(session) {
                    let notice = crate::notify::Notice::new("Configuration Error", err.actor_message());
                    if let Err(e) = self.sink.notify(target, notice).await {
                        warn!(session = %session.id, error = %e, "config error notice failed");
                    }
                }
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    fn require_note_stage(&self, session: &ReportSession) -> FlowResult<()> {
        if session.reporter_stage == ReporterStage::OptionalNote {
            Ok(())
        } else {
            Err(FlowError::out_of_turn(session.id.clone()))
        }
    }

    async fn render_to_reporter(
        &self,
        session: &mut ReportSession,
        stage: PromptStage,
        prompt: PromptSpec,
    ) -> FlowResult<()> {
        let Some(target) = reporter_target(session) else {
            debug!(session = %session.id, "no reporter surface, prompt skipped");
            return Ok(());
        };
        let handle = self.sink.render_prompt(target, prompt).await?;
        session.trail.push(stage, handle);
        Ok(())
    }

    /// Retract stale prompts, tolerating handles the platform already dropped
    async fn retract_handles(&self, handles: Vec<PromptHandle>) {
        for handle in handles {
            if let Err(e) = self.sink.retract(&handle).await {
                debug!(handle = %handle.0, error = %e, "retraction failed");
            }
        }
    }
}

fn reporter_target(session: &ReportSession) -> Option<Target> {
    session.reporter_surface.clone().map(Target::Surface)
}

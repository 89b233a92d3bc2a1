//! Moderator-side action flow
//!
//! Multiple moderators observe the same escalation concurrently; at most one
//! may act on it. The flow is claimed with `TakeAction`, walked through
//! severity → message action → user action, and terminated by the summary or
//! a dismissal. Every transition re-checks the session's exclusivity state —
//! a lost race is a normal outcome reported to the losing moderator, never a
//! fault. Sanctions are applied only after the terminal transition and their
//! failures never roll it back.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ModerationConfig;
use crate::error::{FlowError, FlowResult};
use crate::events::{ModerationEvent, SharedEventBus};
use crate::notify::{NotificationSink, PromptHandle, PromptSpec, Target, UserRef};
use crate::render;
use crate::session::decision::{MessageAction, Severity, UserAction};
use crate::session::trail::PromptStage;
use crate::session::{CloseOutcome, Lifecycle, ModerationStage, Origin, ReportSession};

/// Inputs a moderator can send against an escalated session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModeratorInput {
    /// Claim the action flow for this session
    TakeAction,
    Severity { value: Severity },
    MessageAction { value: MessageAction },
    UserAction { value: UserAction },
    /// Close without action, with a free-text reason
    Dismiss { reason: String },
}

/// The moderator-side state machine
pub struct ModeratorFlow {
    config: Arc<ModerationConfig>,
    sink: Arc<dyn NotificationSink>,
    bus: SharedEventBus,
}

impl ModeratorFlow {
    pub fn new(
        config: Arc<ModerationConfig>,
        sink: Arc<dyn NotificationSink>,
        bus: SharedEventBus,
    ) -> Self {
        Self { config, sink, bus }
    }

    /// Process one moderator input to completion. The caller holds the
    /// session's single-writer lock for the duration, so the exclusivity
    /// checks below cannot interleave with another moderator's transition.
    pub async fn handle(
        &self,
        session: &mut ReportSession,
        actor: &UserRef,
        input: ModeratorInput,
    ) -> FlowResult<()> {
        // Re-read the exclusivity state before every transition.
        if session.is_terminal() || !session.active {
            return Err(match session.lifecycle {
                Lifecycle::Closed {
                    outcome: CloseOutcome::Cancelled,
                } => FlowError::stale(session.id.clone()),
                _ => FlowError::lost_race(session.id.clone()),
            });
        }
        if !session.is_escalated() {
            return Err(FlowError::NotEscalated {
                session: session.id.clone(),
            });
        }

        match input {
            ModeratorInput::TakeAction => self.take_action(session, actor).await,
            ModeratorInput::Severity { value } => self.set_severity(session, actor, value).await,
            ModeratorInput::MessageAction { value } => {
                self.set_message_action(session, actor, value).await
            }
            ModeratorInput::UserAction { value } => {
                self.set_user_action(session, actor, value).await
            }
            ModeratorInput::Dismiss { reason } => self.dismiss(session, actor, &reason).await,
        }
    }

    /// Release a claimed but stalled flow back to the pool (advisory
    /// moderator timeout). The session stays escalated.
    pub async fn release(&self, session: &mut ReportSession) -> FlowResult<()> {
        let Some(handler) = session.handler.take() else {
            return Ok(());
        };
        let stale = session.trail.retract_from(PromptStage::Severity);
        self.retract_handles(stale).await;
        session.decision.clear();
        session.moderation_stage = ModerationStage::AwaitingModerator;
        session.touch();

        self.bus.publish(ModerationEvent::ModeratorFlowReleased {
            session_id: session.id.clone(),
            community: session.community.clone(),
            moderator: handler.name.clone(),
            timestamp: chrono::Utc::now(),
        });
        debug!(session = %session.id, moderator = %handler.name, "stalled moderator flow released");
        Ok(())
    }

    async fn take_action(&self, session: &mut ReportSession, actor: &UserRef) -> FlowResult<()> {
        if session.handler.is_some() {
            return Err(FlowError::lost_race(session.id.clone()));
        }
        session.handler = Some(actor.clone());
        session.moderation_stage = ModerationStage::SelectSeverity;
        session.touch();
        debug!(session = %session.id, moderator = %actor.name, "moderation flow claimed");
        self.render_stage(session, PromptStage::Severity, render::severity_prompt())
            .await
    }

    async fn set_severity(
        &self,
        session: &mut ReportSession,
        actor: &UserRef,
        value: Severity,
    ) -> FlowResult<()> {
        self.ensure_handler(session, actor)?;
        match session.moderation_stage {
            ModerationStage::SelectSeverity => {}
            ModerationStage::SelectMessageAction | ModerationStage::SelectUserAction => {
                // Revision: drop the deeper prompts and answers first.
                let stale = session.trail.retract_from(PromptStage::MessageAction);
                self.retract_handles(stale).await;
                session.decision.clear_after_severity();
                debug!(session = %session.id, "severity revised");
            }
            _ => return Err(FlowError::out_of_turn(session.id.clone())),
        }
        session.decision.severity = Some(value);
        session.moderation_stage = ModerationStage::SelectMessageAction;
        session.touch();
        self.render_stage(session, PromptStage::MessageAction, render::message_action_prompt())
            .await
    }

    async fn set_message_action(
        &self,
        session: &mut ReportSession,
        actor: &UserRef,
        value: MessageAction,
    ) -> FlowResult<()> {
        self.ensure_handler(session, actor)?;
        match session.moderation_stage {
            ModerationStage::SelectMessageAction => {}
            ModerationStage::SelectUserAction => {
                let stale = session.trail.retract_from(PromptStage::UserAction);
                self.retract_handles(stale).await;
                session.decision.clear_after_message_action();
                debug!(session = %session.id, "message action revised");
            }
            _ => return Err(FlowError::out_of_turn(session.id.clone())),
        }
        session.decision.message_action = Some(value);
        session.moderation_stage = ModerationStage::SelectUserAction;
        session.touch();
        self.render_stage(session, PromptStage::UserAction, render::user_action_prompt())
            .await
    }

    async fn set_user_action(
        &self,
        session: &mut ReportSession,
        actor: &UserRef,
        value: UserAction,
    ) -> FlowResult<()> {
        self.ensure_handler(session, actor)?;
        if session.moderation_stage != ModerationStage::SelectUserAction {
            return Err(FlowError::out_of_turn(session.id.clone()));
        }
        session.decision.user_action = Some(value);
        session.moderation_stage = ModerationStage::Summarized;
        self.summarize(session, actor).await
    }

    /// Terminal path: close first, then apply sanctions and fan out the
    /// summary. Action failures are surfaced as warnings, never rolled back.
    async fn summarize(&self, session: &mut ReportSession, actor: &UserRef) -> FlowResult<()> {
        let (Some(severity), Some(message_action), Some(user_action)) = (
            session.decision.severity,
            session.decision.message_action,
            session.decision.user_action,
        ) else {
            return Err(FlowError::out_of_turn(session.id.clone()));
        };

        // The terminal transition happens before any external call so a
        // racing moderator observes a closed session immediately.
        session.close(CloseOutcome::Actioned)?;

        let mod_surface = self.moderator_target(session);

        // The two sanction calls are independent of each other.
        let message_result = async {
            match message_action {
                MessageAction::Remove => {
                    self.sink
                        .apply_message_action(&session.target, message_action)
                        .await
                }
                MessageAction::Keep => Ok(()),
            }
        };
        let user_result = self.sink.apply_user_action(&session.target.author, user_action);
        let (message_result, user_result) = futures::join!(message_result, user_result);

        if let Err(e) = message_result {
            self.report_action_failure(session, &mod_surface, "remove the reported message", &e.to_string())
                .await;
        }
        if let Err(e) = user_result {
            self.report_action_failure(
                session,
                &mod_surface,
                &format!("{} the reported user", user_action),
                &e.to_string(),
            )
            .await;
        }

        // Tell the sanctioned user; delivery is best-effort.
        if let Err(e) = self
            .sink
            .notify(
                Target::User(session.target.author.clone()),
                render::sanction_notice(user_action),
            )
            .await
        {
            debug!(session = %session.id, error = %e, "sanction notice undeliverable");
        }

        let summary = render::summary_text(
            &session.id,
            &actor.name,
            severity,
            message_action,
            user_action,
        );
        if let Some(target) = &mod_surface {
            if let Err(e) = self
                .sink
                .notify(target.clone(), render::moderation_summary_notice(&summary))
                .await
            {
                warn!(session = %session.id, error = %e, "moderator summary failed");
            }
        }
        if session.origin == Origin::Manual {
            if let Some(surface) = session.reporter_surface.clone() {
                if let Err(e) = self
                    .sink
                    .notify(Target::Surface(surface), render::reporter_outcome_notice(&summary))
                    .await
                {
                    warn!(session = %session.id, error = %e, "reporter summary failed");
                }
            }
        }

        if severity.needs_oversight() {
            if let Some(oversight) = self.config.oversight_surface.clone() {
                if let Err(e) = self
                    .sink
                    .notify(
                        Target::Surface(oversight),
                        render::oversight_notice(session, severity),
                    )
                    .await
                {
                    warn!(session = %session.id, error = %e, "oversight notice failed");
                }
            }
        }

        self.bus.publish(ModerationEvent::ReportActioned {
            session_id: session.id.clone(),
            community: session.community.clone(),
            moderator: actor.name.clone(),
            severity,
            message_action,
            user_action,
            timestamp: chrono::Utc::now(),
        });
        debug!(
            session = %session.id,
            severity = %severity,
            message_action = %message_action,
            user_action = %user_action,
            "report actioned"
        );
        Ok(())
    }

    /// Dismissal, reachable before or instead of the three-stage sequence
    async fn dismiss(
        &self,
        session: &mut ReportSession,
        actor: &UserRef,
        reason: &str,
    ) -> FlowResult<()> {
        if let Some(handler) = &session.handler {
            if handler.id != actor.id {
                return Err(FlowError::lost_race(session.id.clone()));
            }
        }

        let stale = session.trail.retract_from(PromptStage::Severity);
        self.retract_handles(stale).await;
        session.close(CloseOutcome::Dismissed)?;

        if let Some(target) = self.moderator_target(session) {
            if let Err(e) = self
                .sink
                .notify(target, render::dismissal_notice(&actor.name, reason))
                .await
            {
                warn!(session = %session.id, error = %e, "dismissal record failed");
            }
        }
        if session.origin == Origin::Manual {
            if let Some(surface) = session.reporter_surface.clone() {
                if let Err(e) = self
                    .sink
                    .notify(Target::Surface(surface), render::reporter_dismissal_notice())
                    .await
                {
                    warn!(session = %session.id, error = %e, "reporter dismissal notice failed");
                }
            }
        }

        self.bus.publish(ModerationEvent::ReportDismissed {
            session_id: session.id.clone(),
            community: session.community.clone(),
            moderator: actor.name.clone(),
            reason: reason.to_string(),
            timestamp: chrono::Utc::now(),
        });
        debug!(session = %session.id, moderator = %actor.name, "report dismissed");
        Ok(())
    }

    fn ensure_handler(&self, session: &ReportSession, actor: &UserRef) -> FlowResult<()> {
        match &session.handler {
            Some(handler) if handler.id == actor.id => Ok(()),
            Some(_) => Err(FlowError::lost_race(session.id.clone())),
            None => Err(FlowError::out_of_turn(session.id.clone())),
        }
    }

    fn moderator_target(&self, session: &ReportSession) -> Option<Target> {
        self.config
            .moderator_surface(&session.community)
            .cloned()
            .map(Target::Surface)
    }

    async fn render_stage(
        &self,
        session: &mut ReportSession,
        stage: PromptStage,
        prompt: PromptSpec,
    ) -> FlowResult<()> {
        let target = self.moderator_target(session).ok_or_else(|| {
            FlowError::NoModeratorSurface {
                community: session.community.clone(),
            }
        })?;
        let handle = self.sink.render_prompt(target, prompt).await?;
        session.trail.push(stage, handle);
        Ok(())
    }

    async fn report_action_failure(
        &self,
        session: &ReportSession,
        mod_surface: &Option<Target>,
        action: &str,
        error: &str,
    ) {
        warn!(session = %session.id, action, error, "sanction failed after close");
        self.bus.publish(ModerationEvent::ActionFailed {
            session_id: session.id.clone(),
            community: session.community.clone(),
            action: action.to_string(),
            error: error.to_string(),
            timestamp: chrono::Utc::now(),
        });
        if let Some(target) = mod_surface {
            if let Err(e) = self
                .sink
                .notify(target.clone(), render::action_failure_notice(action, error))
                .await
            {
                warn!(session = %session.id, error = %e, "action failure notice failed");
            }
        }
    }

    async fn retract_handles(&self, handles: Vec<PromptHandle>) {
        for handle in handles {
            if let Err(e) = self.sink.retract(&handle).await {
                debug!(handle = %handle.0, error = %e, "retraction failed");
            }
        }
    }
}

//! Report session — the unit of state tracking one report
//!
//! A session is created by the reporter flow (manual) or the escalation
//! gateway (automatic), mutated by exactly one flow at a time, and closed
//! once. Ownership transfers from the reporter flow to the moderator flow at
//! the escalation transition. The `active` flag is the concurrency gate: it
//! is true from creation until the single terminal transition flips it.

pub mod decision;
pub mod trail;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::classifier::ClassifierResult;
use crate::error::{FlowError, FlowResult};
use crate::notify::{CommunityId, MessageRef, PromptHandle, SurfaceId, UserRef};
use decision::ModerationDecision;
use trail::UiTrail;

/// Opaque short session id
pub type SessionId = String;

/// How the report entered the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// A reporter walked the guided classification flow
    Manual,
    /// The external classifier injected it directly
    Automatic,
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Manual => write!(f, "manual"),
            Self::Automatic => write!(f, "automatic"),
        }
    }
}

/// Terminal outcome of a closed session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseOutcome {
    /// A moderator completed the action flow
    Actioned,
    /// A moderator dismissed the report
    Dismissed,
    /// The reporter cancelled, or the prompts expired
    Cancelled,
}

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    /// Reporter-side collection in progress
    Collecting,
    /// Visible to the moderator pool, awaiting action
    Escalated,
    /// Terminal
    Closed { outcome: CloseOutcome },
}

/// Reporter-flow cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReporterStage {
    SelectCategory,
    SelectSubtype,
    OptionalNote,
    Submitted,
}

/// Moderator-flow cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationStage {
    /// Escalated, nobody has claimed the action flow yet
    AwaitingModerator,
    SelectSeverity,
    SelectMessageAction,
    SelectUserAction,
    Summarized,
}

/// The central mutable entity: one report from creation to terminal outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSession {
    /// Short unique id, generated at creation, never reused
    pub id: SessionId,
    pub origin: Origin,
    /// The reported content (read-only external handle)
    pub target: MessageRef,
    /// The reporting actor; absent for automatic reports
    pub reporter: Option<UserRef>,
    /// Routing scope, taken from the reported message
    pub community: CommunityId,
    /// Surface where reporter-side prompts and notices land
    pub reporter_surface: Option<SurfaceId>,

    /// Root-to-leaf prefix of taxonomy keys selected so far
    pub category_path: Vec<String>,
    /// Free-text note, set at most once
    pub note: Option<String>,
    /// Classifier finding retained for rendering (automatic origin only)
    pub classifier: Option<ClassifierResult>,

    pub lifecycle: Lifecycle,
    /// The exclusivity lock: true until the single terminal transition
    pub active: bool,
    pub reporter_stage: ReporterStage,
    pub moderation_stage: ModerationStage,
    /// Moderator who claimed the action flow
    pub handler: Option<UserRef>,
    pub decision: ModerationDecision,

    /// Retraction bookkeeping for rendered prompts
    pub trail: UiTrail,
    /// Handle of the escalation posting on the moderator surface, used for
    /// thread-scoping follow-up messages
    pub escalation: Option<PromptHandle>,

    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl ReportSession {
    /// Generate a fresh short session id
    pub fn new_id() -> SessionId {
        Uuid::new_v4().simple().to_string()[..8].to_string()
    }

    /// Create a session for the manual reporter-driven path
    pub fn new_manual(target: MessageRef, reporter: UserRef, reporter_surface: SurfaceId) -> Self {
        let now = Utc::now();
        let community = target.community.clone();
        Self {
            id: Self::new_id(),
            origin: Origin::Manual,
            target,
            reporter: Some(reporter),
            community,
            reporter_surface: Some(reporter_surface),
            category_path: Vec::new(),
            note: None,
            classifier: None,
            lifecycle: Lifecycle::Collecting,
            active: true,
            reporter_stage: ReporterStage::SelectCategory,
            moderation_stage: ModerationStage::AwaitingModerator,
            handler: None,
            decision: ModerationDecision::default(),
            trail: UiTrail::new(),
            escalation: None,
            created_at: now,
            last_activity: now,
        }
    }

    /// Create a session for the automatic classifier path. The category path
    /// must already be validated against the taxonomy; the lifecycle starts
    /// at `Collecting` and the gateway escalates it immediately.
    pub fn new_automatic(
        target: MessageRef,
        category_path: Vec<String>,
        note: String,
        finding: ClassifierResult,
    ) -> Self {
        let now = Utc::now();
        let community = target.community.clone();
        Self {
            id: Self::new_id(),
            origin: Origin::Automatic,
            target,
            reporter: None,
            community,
            reporter_surface: None,
            category_path,
            note: Some(note),
            classifier: Some(finding),
            lifecycle: Lifecycle::Collecting,
            active: true,
            reporter_stage: ReporterStage::Submitted,
            moderation_stage: ModerationStage::AwaitingModerator,
            handler: None,
            decision: ModerationDecision::default(),
            trail: UiTrail::new(),
            escalation: None,
            created_at: now,
            last_activity: now,
        }
    }

    /// Stamp activity (drives prompt expiry)
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Closed { .. })
    }

    pub fn is_escalated(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Escalated)
    }

    pub fn is_collecting(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Collecting)
    }

    /// Transition to the moderator-visible state. Ownership of the session
    /// passes to the moderator flow here.
    pub fn escalate(&mut self) -> FlowResult<()> {
        if !self.is_collecting() {
            return Err(FlowError::stale(self.id.clone()));
        }
        self.lifecycle = Lifecycle::Escalated;
        self.reporter_stage = ReporterStage::Submitted;
        self.moderation_stage = ModerationStage::AwaitingModerator;
        self.touch();
        Ok(())
    }

    /// The single terminal transition: flips `active` exactly once. A second
    /// close is a stale interaction, reported to the caller, never silent.
    pub fn close(&mut self, outcome: CloseOutcome) -> FlowResult<()> {
        if self.is_terminal() {
            return Err(FlowError::stale(self.id.clone()));
        }
        self.lifecycle = Lifecycle::Closed { outcome };
        self.active = false;
        self.touch();
        Ok(())
    }

    /// Store the free-text note, truncated to `max_len`. At most once.
    pub fn set_note(&mut self, text: &str, max_len: usize) -> FlowResult<()> {
        if self.note.is_some() {
            return Err(FlowError::NoteAlreadySet {
                session: self.id.clone(),
            });
        }
        let mut stored: String = text.chars().take(max_len).collect();
        if stored.len() < text.len() {
            stored.push('…');
        }
        self.note = Some(stored);
        Ok(())
    }

    /// Read-only snapshot for operator listings
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            origin: self.origin,
            community: self.community.clone(),
            category_path: self.category_path.clone(),
            lifecycle: self.lifecycle,
            reporter: self.reporter.as_ref().map(|r| r.name.clone()),
            handler: self.handler.as_ref().map(|h| h.name.clone()),
            created_at: self.created_at,
            last_activity: self.last_activity,
        }
    }
}

/// Read-only session snapshot returned by `list_active`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub origin: Origin,
    pub community: CommunityId,
    pub category_path: Vec<String>,
    pub lifecycle: Lifecycle,
    pub reporter: Option<String>,
    pub handler: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

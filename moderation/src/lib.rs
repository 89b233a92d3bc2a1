//! Guided content-moderation workflow engine
//!
//! This library drives one report from intake to outcome across three actors:
//!
//! - a **reporter** walked through a branching abuse taxonomy
//!   ([`flow::ReporterFlow`]),
//! - a **moderator pool** in which exactly one moderator may act on each
//!   escalated report ([`flow::ModeratorFlow`]),
//! - an **automated classifier** whose verdicts enter the moderator pool
//!   directly, skipping the reporter flow ([`gateway::EscalationGateway`]).
//!
//! The chat platform itself stays behind the [`notify::NotificationSink`]
//! trait: the engine renders prompts, retracts the stale ones when an actor
//! revises an earlier answer, and applies sanctions, but never owns the
//! transport.
//!
//! # Data flow
//!
//! ```text
//! reporter input ──▶ ReporterFlow ──▶ EscalationGateway ──▶ ModeratorFlow
//!                        │                  ▲                    │
//!                        ▼                  │ (classifier)       ▼
//!                   ReportSession ◀─────────┴──────────── sanctions + summary
//! ```
//!
//! Workflow state lives in memory only; nothing here survives a restart.

#![allow(clippy::uninlined_format_args)]

pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod flow;
pub mod gateway;
pub mod notify;
pub mod render;
pub mod session;
pub mod taxonomy;

// Re-export the engine facade and its inbound vocabulary
pub use engine::ModerationEngine;
pub use error::{FlowError, FlowResult};
pub use flow::{ModeratorFlow, ModeratorInput, ReporterFlow, ReporterInput};
pub use gateway::EscalationGateway;

// Re-export the central state types
pub use session::decision::{MessageAction, ModerationDecision, Severity, UserAction};
pub use session::trail::{PromptStage, UiTrail};
pub use session::{
    CloseOutcome, Lifecycle, ModerationStage, Origin, ReportSession, ReporterStage, SessionId,
    SessionSummary,
};

// Re-export the boundary contracts
pub use classifier::{ClassifierResult, FieldFallback, PathResolution};
pub use config::{ConfigError, ModerationConfig};
pub use notify::{
    CommunityId, MessageRef, Notice, NotificationSink, PromptHandle, PromptOption, PromptSpec,
    SinkError, SinkResult, SurfaceId, Target, UserRef,
};
pub use taxonomy::{Taxonomy, TaxonomyError, TaxonomyNode, OTHER_KEY};

// Re-export event types for operator subscribers
pub use events::{EventBus, EventFilter, FilteredReceiver, ModerationEvent, SharedEventBus};

//! Notification sink — the platform boundary
//!
//! Everything the engine says to the outside world goes through the
//! [`NotificationSink`] trait: interactive prompts, plain notices, and the
//! two sanction calls. The engine never talks to a chat platform directly;
//! a transport adapter implements this trait and owns message/channel/thread
//! mechanics, button rendering, and permissions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::decision::{MessageAction, UserAction};

/// Opaque identifier for a community (server/guild) a report belongs to.
pub type CommunityId = String;

/// Opaque identifier for a deliverable surface: a channel, a thread, or any
/// other place the transport can render into.
pub type SurfaceId = String;

/// Errors a sink implementation may surface back to the engine
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("missing permission: {0}")]
    PermissionDenied(String),

    #[error("target not found: {0}")]
    NotFound(String),

    #[error("platform unavailable: {0}")]
    Unavailable(String),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Reference to a platform user (reporter, moderator, or reported author)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    /// Platform-scoped user id
    pub id: String,
    /// Display name, used only for rendering
    pub name: String,
}

impl UserRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for UserRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Read-only reference to the reported content. The engine inspects it for
/// rendering and routing but never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRef {
    /// Community the message was posted in (routing scope)
    pub community: CommunityId,
    /// Channel the message was posted in
    pub channel: SurfaceId,
    /// Platform message id
    pub message_id: String,
    /// Author of the reported message
    pub author: UserRef,
    /// Message text at report time
    pub content: String,
    /// Jump link for moderators
    pub link: String,
    /// When the message was sent
    pub sent_at: DateTime<Utc>,
}

/// Handle to a previously rendered interactive prompt, used for retraction.
/// The engine treats it as opaque; only the sink that issued it can interpret it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PromptHandle(pub String);

impl PromptHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

/// Where an outbound prompt or notice should land
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// A channel or thread
    Surface(SurfaceId),
    /// A direct message to a user
    User(UserRef),
}

impl Target {
    pub fn surface(id: impl Into<String>) -> Self {
        Self::Surface(id.into())
    }
}

/// One selectable option on an interactive prompt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptOption {
    /// Stable key the transport echoes back as the selection value
    pub key: String,
    /// Button/menu label
    pub label: String,
    /// Longer description where the surface supports it
    pub description: String,
}

impl PromptOption {
    pub fn new(
        key: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            description: description.into(),
        }
    }
}

/// An interactive prompt to render. Options may be empty for free-text
/// prompts (the note and the dismissal reason).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptSpec {
    pub title: String,
    pub body: String,
    pub options: Vec<PromptOption>,
}

/// A non-interactive notice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub body: String,
}

impl Notice {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// The outbound collaborator interface. Implemented by the transport layer;
/// the engine only ever calls it.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Render an interactive prompt and return a handle for later retraction.
    async fn render_prompt(&self, target: Target, prompt: PromptSpec) -> SinkResult<PromptHandle>;

    /// Retract (delete or disable) a previously rendered prompt.
    async fn retract(&self, handle: &PromptHandle) -> SinkResult<()>;

    /// Deliver a plain notice.
    async fn notify(&self, target: Target, notice: Notice) -> SinkResult<()>;

    /// Apply a message-level sanction (e.g. delete the reported content).
    async fn apply_message_action(
        &self,
        message: &MessageRef,
        action: MessageAction,
    ) -> SinkResult<()>;

    /// Apply a user-level sanction.
    async fn apply_user_action(&self, user: &UserRef, action: UserAction) -> SinkResult<()>;
}

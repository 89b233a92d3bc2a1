//! Moderator decision vocabulary
//!
//! Unlike the taxonomy, these option sets are fixed: severity, message
//! action, and user action are enums, populated into a session's decision
//! record only after escalation.

use serde::{Deserialize, Serialize};

/// Severity rating of a confirmed violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    /// Button label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Low => "Minor violation, little risk of harm",
            Self::Medium => "Clear violation with moderate risk",
            Self::High => "Serious violation or targeted harm",
            Self::Critical => "Severe or time-sensitive harm",
        }
    }

    /// Whether this rating triggers the supplementary oversight notice
    pub fn needs_oversight(&self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }

    /// Parse a canonical key as emitted by [`Severity::to_string`]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// What happens to the reported message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageAction {
    /// Delete the reported content
    Remove,
    /// Leave the content in place
    Keep,
}

impl MessageAction {
    pub const ALL: [MessageAction; 2] = [Self::Remove, Self::Keep];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Remove => "Remove Message",
            Self::Keep => "Keep Message",
        }
    }
}

impl std::fmt::Display for MessageAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remove => write!(f, "remove"),
            Self::Keep => write!(f, "keep"),
        }
    }
}

/// What happens to the reported user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserAction {
    Warn,
    Timeout,
    Kick,
    Ban,
}

impl UserAction {
    pub const ALL: [UserAction; 4] = [Self::Warn, Self::Timeout, Self::Kick, Self::Ban];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Warn => "Warn User",
            Self::Timeout => "Timeout User",
            Self::Kick => "Kick User",
            Self::Ban => "Ban User",
        }
    }
}

impl std::fmt::Display for UserAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warn => write!(f, "warn"),
            Self::Timeout => write!(f, "timeout"),
            Self::Kick => write!(f, "kick"),
            Self::Ban => write!(f, "ban"),
        }
    }
}

/// The moderator's recorded answers, populated stage by stage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModerationDecision {
    pub severity: Option<Severity>,
    pub message_action: Option<MessageAction>,
    pub user_action: Option<UserAction>,
}

impl ModerationDecision {
    /// All three stages answered
    pub fn is_complete(&self) -> bool {
        self.severity.is_some() && self.message_action.is_some() && self.user_action.is_some()
    }

    /// Drop the answers recorded after the severity stage (severity revision)
    pub fn clear_after_severity(&mut self) {
        self.message_action = None;
        self.user_action = None;
    }

    /// Drop the answer recorded after the message-action stage
    pub fn clear_after_message_action(&mut self) {
        self.user_action = None;
    }

    /// Drop everything (flow released back to the pool)
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

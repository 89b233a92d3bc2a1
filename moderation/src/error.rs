//! Workflow error types
//!
//! Errors here fall into two groups: recoverable per-session conditions that
//! are surfaced to the acting party (stale interactions, lost races, bad
//! selections) and boundary failures bubbled up from the sink. Malformed
//! taxonomy or configuration is not represented here — those are validated
//! once at startup and are fatal there.

use thiserror::Error;

use crate::notify::{CommunityId, SinkError};
use crate::session::SessionId;

/// Result type alias for workflow operations
pub type FlowResult<T> = Result<T, FlowError>;

/// Errors produced while driving a report through its workflow
#[derive(Debug, Error)]
pub enum FlowError {
    /// Input arrived for a session that already reached a terminal state
    #[error("report {session} is no longer accepting input")]
    StaleInteraction { session: SessionId },

    /// Another moderator completed or claimed the session first
    #[error("report {session} has already been handled by another moderator")]
    LostRace { session: SessionId },

    /// No session with this id is registered
    #[error("unknown report session: {id}")]
    UnknownSession { id: SessionId },

    /// The selected key is not an option at the current step
    #[error("'{key}' is not a valid option at this step")]
    InvalidSelection { key: String },

    /// Input does not match the step the session is waiting on
    #[error("input does not match the current step of report {session}")]
    OutOfTurn { session: SessionId },

    /// The free-text note may be set at most once
    #[error("additional information was already provided for report {session}")]
    NoteAlreadySet { session: SessionId },

    /// Moderator input for a session that never reached the moderator pool
    #[error("report {session} has not been escalated to moderators")]
    NotEscalated { session: SessionId },

    /// No moderator surface registered for the report's community
    #[error("no moderator surface is configured for community {community}")]
    NoModeratorSurface { community: CommunityId },

    /// Outbound platform call failed
    #[error("platform call failed: {0}")]
    Sink(#[from] SinkError),
}

impl FlowError {
    /// Create a stale-interaction error
    pub fn stale(session: impl Into<SessionId>) -> Self {
        Self::StaleInteraction {
            session: session.into(),
        }
    }

    /// Create a lost-race error
    pub fn lost_race(session: impl Into<SessionId>) -> Self {
        Self::LostRace {
            session: session.into(),
        }
    }

    /// Create an unknown-session error
    pub fn unknown(id: impl Into<SessionId>) -> Self {
        Self::UnknownSession { id: id.into() }
    }

    /// Create an invalid-selection error
    pub fn invalid_selection(key: impl Into<String>) -> Self {
        Self::InvalidSelection { key: key.into() }
    }

    /// Create an out-of-turn error
    pub fn out_of_turn(session: impl Into<SessionId>) -> Self {
        Self::OutOfTurn {
            session: session.into(),
        }
    }

    /// Whether the condition is a normal per-actor outcome rather than a
    /// failure of the engine or the platform.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Sink(_))
    }

    /// Message suitable for showing to the actor whose input was rejected.
    pub fn actor_message(&self) -> String {
        match self {
            Self::StaleInteraction { .. } => {
                "This report is no longer accepting input.".to_string()
            }
            Self::LostRace { .. } => {
                "This report has already been handled by another moderator.".to_string()
            }
            Self::UnknownSession { .. } => "This report could not be found.".to_string(),
            Self::InvalidSelection { key } => {
                format!("'{}' is not one of the available options.", key)
            }
            Self::OutOfTurn { .. } => {
                "That selection does not match the current step. Please use the latest prompt."
                    .to_string()
            }
            Self::NoteAlreadySet { .. } => {
                "Additional information was already provided for this report.".to_string()
            }
            Self::NotEscalated { .. } => {
                "This report is still being filled in by the reporter.".to_string()
            }
            Self::NoModeratorSurface { .. } => {
                "Moderator channel not configured for this server. Please contact an administrator."
                    .to_string()
            }
            Self::Sink(e) => format!("A platform call failed: {}.", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_session() {
        let err = FlowError::stale("abc123");
        assert!(err.to_string().contains("abc123"));

        let err = FlowError::lost_race("abc123");
        assert!(err.to_string().contains("another moderator"));
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(FlowError::stale("s").is_recoverable());
        assert!(FlowError::lost_race("s").is_recoverable());
        assert!(FlowError::invalid_selection("nope").is_recoverable());

        let sink = FlowError::Sink(SinkError::Unavailable("down".to_string()));
        assert!(!sink.is_recoverable());
    }

    #[test]
    fn test_actor_message_is_friendly() {
        let msg = FlowError::lost_race("s").actor_message();
        assert!(msg.contains("another moderator"));
        assert!(!msg.contains('{'));
    }
}

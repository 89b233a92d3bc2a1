//! Moderation events — pub/sub visibility into workflow transitions
//!
//! Notable transitions are broadcast over a Tokio channel for operator
//! dashboards and audit logging. The bus is in-memory only (workflow state
//! carries no durability guarantee) and the flows never read events back:
//! publishing with no receivers is a normal, silent outcome.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use crate::notify::CommunityId;
use crate::session::decision::{MessageAction, Severity, UserAction};
use crate::session::{CloseOutcome, Origin, SessionId};

/// Channel capacity for broadcast
const CHANNEL_CAPACITY: usize = 256;

/// Shared reference to the event bus
pub type SharedEventBus = Arc<EventBus>;

/// Everything the engine announces about a session's progress
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModerationEvent {
    /// A report session was opened
    SessionOpened {
        session_id: SessionId,
        community: CommunityId,
        origin: Origin,
        timestamp: DateTime<Utc>,
    },

    /// A session became visible to the moderator pool
    ReportEscalated {
        session_id: SessionId,
        community: CommunityId,
        category_path: Vec<String>,
        origin: Origin,
        timestamp: DateTime<Utc>,
    },

    /// The reporter cancelled, or the prompts expired
    ReportCancelled {
        session_id: SessionId,
        community: CommunityId,
        expired: bool,
        timestamp: DateTime<Utc>,
    },

    /// A moderator dismissed the report
    ReportDismissed {
        session_id: SessionId,
        community: CommunityId,
        moderator: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// A moderator completed the action flow
    ReportActioned {
        session_id: SessionId,
        community: CommunityId,
        moderator: String,
        severity: Severity,
        message_action: MessageAction,
        user_action: UserAction,
        timestamp: DateTime<Utc>,
    },

    /// An external sanction call failed after the terminal transition
    ActionFailed {
        session_id: SessionId,
        community: CommunityId,
        action: String,
        error: String,
        timestamp: DateTime<Utc>,
    },

    /// A classifier field failed taxonomy validation and fell back
    DataQuality {
        session_id: SessionId,
        community: CommunityId,
        field: String,
        raw: String,
        substituted: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// A stalled moderator flow was released back to the pool
    ModeratorFlowReleased {
        session_id: SessionId,
        community: CommunityId,
        moderator: String,
        timestamp: DateTime<Utc>,
    },

    /// A session reached a terminal state and left the registry
    SessionClosed {
        session_id: SessionId,
        community: CommunityId,
        outcome: CloseOutcome,
        timestamp: DateTime<Utc>,
    },
}

impl ModerationEvent {
    /// Short type tag for logging and filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::SessionOpened { .. } => "session_opened",
            Self::ReportEscalated { .. } => "report_escalated",
            Self::ReportCancelled { .. } => "report_cancelled",
            Self::ReportDismissed { .. } => "report_dismissed",
            Self::ReportActioned { .. } => "report_actioned",
            Self::ActionFailed { .. } => "action_failed",
            Self::DataQuality { .. } => "data_quality",
            Self::ModeratorFlowReleased { .. } => "moderator_flow_released",
            Self::SessionClosed { .. } => "session_closed",
        }
    }

    pub fn session_id(&self) -> &str {
        match self {
            Self::SessionOpened { session_id, .. }
            | Self::ReportEscalated { session_id, .. }
            | Self::ReportCancelled { session_id, .. }
            | Self::ReportDismissed { session_id, .. }
            | Self::ReportActioned { session_id, .. }
            | Self::ActionFailed { session_id, .. }
            | Self::DataQuality { session_id, .. }
            | Self::ModeratorFlowReleased { session_id, .. }
            | Self::SessionClosed { session_id, .. } => session_id,
        }
    }

    pub fn community(&self) -> &str {
        match self {
            Self::SessionOpened { community, .. }
            | Self::ReportEscalated { community, .. }
            | Self::ReportCancelled { community, .. }
            | Self::ReportDismissed { community, .. }
            | Self::ReportActioned { community, .. }
            | Self::ActionFailed { community, .. }
            | Self::DataQuality { community, .. }
            | Self::ModeratorFlowReleased { community, .. }
            | Self::SessionClosed { community, .. } => community,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::SessionOpened { timestamp, .. }
            | Self::ReportEscalated { timestamp, .. }
            | Self::ReportCancelled { timestamp, .. }
            | Self::ReportDismissed { timestamp, .. }
            | Self::ReportActioned { timestamp, .. }
            | Self::ActionFailed { timestamp, .. }
            | Self::DataQuality { timestamp, .. }
            | Self::ModeratorFlowReleased { timestamp, .. }
            | Self::SessionClosed { timestamp, .. } => *timestamp,
        }
    }
}

/// Broadcast event bus
pub struct EventBus {
    sender: broadcast::Sender<ModerationEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Wrap in a shared reference
    pub fn shared(self) -> SharedEventBus {
        Arc::new(self)
    }

    /// Publish an event to all subscribers. No receivers is fine.
    pub fn publish(&self, event: ModerationEvent) {
        let event_type = event.event_type();
        match self.sender.send(event) {
            Ok(count) => debug!(event_type, receivers = count, "event published"),
            Err(_) => debug!(event_type, "event published (no receivers)"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ModerationEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Filter for selective subscription
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub session_id: Option<SessionId>,
    pub community: Option<CommunityId>,
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(mut self, session_id: impl Into<SessionId>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn community(mut self, community: impl Into<CommunityId>) -> Self {
        self.community = Some(community.into());
        self
    }

    pub fn matches(&self, event: &ModerationEvent) -> bool {
        if let Some(ref sid) = self.session_id {
            if event.session_id() != sid {
                return false;
            }
        }
        if let Some(ref community) = self.community {
            if event.community() != community {
                return false;
            }
        }
        true
    }
}

/// Receiver that only yields events matching a filter
pub struct FilteredReceiver {
    receiver: broadcast::Receiver<ModerationEvent>,
    filter: EventFilter,
}

impl FilteredReceiver {
    pub fn new(receiver: broadcast::Receiver<ModerationEvent>, filter: EventFilter) -> Self {
        Self { receiver, filter }
    }

    /// Receive the next matching event
    pub async fn recv(&mut self) -> Result<ModerationEvent, broadcast::error::RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.filter.matches(&event) {
                return Ok(event);
            }
        }
    }
}

impl EventBus {
    /// Subscribe with a filter
    pub fn subscribe_filtered(&self, filter: EventFilter) -> FilteredReceiver {
        FilteredReceiver::new(self.subscribe(), filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opened(session: &str, community: &str) -> ModerationEvent {
        ModerationEvent::SessionOpened {
            session_id: session.to_string(),
            community: community.to_string(),
            origin: Origin::Manual,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_publish_subscribe() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();

        bus.publish(opened("s1", "guild-1"));

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.event_type(), "session_opened");
        assert_eq!(received.session_id(), "s1");
    }

    #[test]
    fn test_publish_without_receivers_is_silent() {
        let bus = EventBus::new();
        bus.publish(opened("s1", "guild-1"));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_filtered_receiver_skips_non_matching() {
        let bus = EventBus::new().shared();
        let mut filtered = bus.subscribe_filtered(EventFilter::new().session("s2"));

        bus.publish(opened("s1", "guild-1"));
        bus.publish(opened("s2", "guild-1"));

        let event = filtered.recv().await.unwrap();
        assert_eq!(event.session_id(), "s2");
    }

    #[test]
    fn test_filter_by_community() {
        let filter = EventFilter::new().community("guild-2");
        assert!(!filter.matches(&opened("s1", "guild-1")));
        assert!(filter.matches(&opened("s1", "guild-2")));
    }

    #[test]
    fn test_event_serialization_tags() {
        let json = serde_json::to_string(&opened("s1", "guild-1")).unwrap();
        assert!(json.contains("\"type\":\"session_opened\""), "JSON: {json}");
        assert!(json.contains("\"origin\":\"manual\""), "JSON: {json}");
    }
}

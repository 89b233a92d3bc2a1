//! UI trail — retraction bookkeeping for rendered prompts
//!
//! Every interactive prompt the engine renders is pushed here with the stage
//! it belongs to. When an actor revises an earlier answer, the trail is popped
//! down to that stage and the returned handles are retracted at the sink, so
//! two divergent branches never appear on a surface simultaneously. This is
//! the one piece of genuinely stateful UI bookkeeping, kept independently
//! testable without a platform.

use serde::{Deserialize, Serialize};

use crate::notify::PromptHandle;

/// Which step of a workflow a rendered prompt belongs to. Stages are totally
/// ordered: reporter taxonomy levels first (by depth), then the note, then
/// the moderator stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptStage {
    /// Taxonomy selection prompt for the given depth (0 = root categories)
    Category { level: usize },
    /// Optional free-text note prompt
    Note,
    /// The Take Action / Dismiss prompt on the moderator surface
    ModeratorAction,
    Severity,
    MessageAction,
    UserAction,
}

impl PromptStage {
    fn order_key(&self) -> (u8, usize) {
        match self {
            Self::Category { level } => (0, *level),
            Self::Note => (1, 0),
            Self::ModeratorAction => (2, 0),
            Self::Severity => (3, 0),
            Self::MessageAction => (4, 0),
            Self::UserAction => (5, 0),
        }
    }
}

impl PartialOrd for PromptStage {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PromptStage {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.order_key().cmp(&other.order_key())
    }
}

/// One rendered prompt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrailEntry {
    pub stage: PromptStage,
    pub handle: PromptHandle,
}

/// Ordered record of rendered prompts for one session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiTrail {
    entries: Vec<TrailEntry>,
}

impl UiTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly rendered prompt
    pub fn push(&mut self, stage: PromptStage, handle: PromptHandle) {
        self.entries.push(TrailEntry { stage, handle });
    }

    /// Pop every entry at or deeper than `stage`, returning the handles to
    /// retract (deepest first, so surfaces unwind in reverse render order).
    pub fn retract_from(&mut self, stage: PromptStage) -> Vec<PromptHandle> {
        let mut popped = Vec::new();
        let keep: Vec<TrailEntry> = std::mem::take(&mut self.entries)
            .into_iter()
            .filter_map(|entry| {
                if entry.stage >= stage {
                    popped.push(entry.handle);
                    None
                } else {
                    Some(entry)
                }
            })
            .collect();
        self.entries = keep;
        popped.reverse();
        popped
    }

    /// Pop everything (cancellation / expiry)
    pub fn drain(&mut self) -> Vec<PromptHandle> {
        let mut handles: Vec<PromptHandle> =
            std::mem::take(&mut self.entries).into_iter().map(|e| e.handle).collect();
        handles.reverse();
        handles
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The most recently rendered prompt
    pub fn latest(&self) -> Option<&TrailEntry> {
        self.entries.last()
    }

    pub fn entries(&self) -> &[TrailEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(n: u32) -> PromptHandle {
        PromptHandle::new(format!("prompt-{n}"))
    }

    #[test]
    fn test_stage_ordering() {
        assert!(PromptStage::Category { level: 0 } < PromptStage::Category { level: 1 });
        assert!(PromptStage::Category { level: 5 } < PromptStage::Note);
        assert!(PromptStage::Note < PromptStage::ModeratorAction);
        assert!(PromptStage::Severity < PromptStage::UserAction);
    }

    #[test]
    fn test_retract_from_level() {
        let mut trail = UiTrail::new();
        trail.push(PromptStage::Category { level: 0 }, handle(0));
        trail.push(PromptStage::Category { level: 1 }, handle(1));
        trail.push(PromptStage::Category { level: 2 }, handle(2));
        trail.push(PromptStage::Note, handle(3));

        // Revising the level-1 answer retracts the level-2 and note prompts.
        let popped = trail.retract_from(PromptStage::Category { level: 2 });
        assert_eq!(popped, vec![handle(3), handle(2)]);
        assert_eq!(trail.len(), 2);
        assert_eq!(trail.latest().unwrap().stage, PromptStage::Category { level: 1 });
    }

    #[test]
    fn test_retract_from_moderator_stage() {
        let mut trail = UiTrail::new();
        trail.push(PromptStage::ModeratorAction, handle(0));
        trail.push(PromptStage::Severity, handle(1));
        trail.push(PromptStage::MessageAction, handle(2));

        let popped = trail.retract_from(PromptStage::MessageAction);
        assert_eq!(popped, vec![handle(2)]);
        assert_eq!(trail.len(), 2);
    }

    #[test]
    fn test_drain_unwinds_in_reverse() {
        let mut trail = UiTrail::new();
        trail.push(PromptStage::Category { level: 0 }, handle(0));
        trail.push(PromptStage::Category { level: 1 }, handle(1));

        assert_eq!(trail.drain(), vec![handle(1), handle(0)]);
        assert!(trail.is_empty());
        assert!(trail.drain().is_empty());
    }
}

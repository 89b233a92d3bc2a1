//! Shared fixtures for the workflow integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use moderation::{
    MessageAction, MessageRef, ModerationConfig, ModerationEngine, Notice, NotificationSink,
    PromptHandle, PromptSpec, SinkError, SinkResult, Target, Taxonomy, TaxonomyNode, UserAction,
    UserRef, OTHER_KEY,
};

/// Everything the engine said to the outside world, in call order
#[derive(Debug, Clone)]
pub enum SinkCall {
    Prompt {
        target: Target,
        title: String,
        option_keys: Vec<String>,
        handle: String,
    },
    Retract {
        handle: String,
    },
    Notice {
        target: Target,
        title: String,
        body: String,
    },
    MessageAction {
        message_id: String,
        action: MessageAction,
    },
    UserAction {
        user_id: String,
        action: UserAction,
    },
}

/// Recording sink: captures every outbound call, with switchable failures
#[derive(Default)]
pub struct RecordingSink {
    seq: AtomicU32,
    pub calls: Mutex<Vec<SinkCall>>,
    pub fail_message_action: AtomicBool,
    pub fail_user_action: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn prompts_for(&self, surface: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SinkCall::Prompt { target, title, .. }
                    if target == Target::surface(surface) =>
                {
                    Some(title)
                }
                _ => None,
            })
            .collect()
    }

    pub fn retracted(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SinkCall::Retract { handle } => Some(handle),
                _ => None,
            })
            .collect()
    }

    pub fn notices_for(&self, target: &Target) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SinkCall::Notice { target: t, title, body } if &t == target => {
                    Some((title, body))
                }
                _ => None,
            })
            .collect()
    }

    pub fn message_actions(&self) -> Vec<(String, MessageAction)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SinkCall::MessageAction { message_id, action } => Some((message_id, action)),
                _ => None,
            })
            .collect()
    }

    pub fn user_actions(&self) -> Vec<(String, UserAction)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SinkCall::UserAction { user_id, action } => Some((user_id, action)),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn render_prompt(&self, target: Target, prompt: PromptSpec) -> SinkResult<PromptHandle> {
        let n = self.seq.fetch_add(1, Ordering::SeqCst);
        let handle = format!("prompt-{n}");
        self.calls.lock().unwrap().push(SinkCall::Prompt {
            target,
            title: prompt.title,
            option_keys: prompt.options.iter().map(|o| o.key.clone()).collect(),
            handle: handle.clone(),
        });
        Ok(PromptHandle::new(handle))
    }

    async fn retract(&self, handle: &PromptHandle) -> SinkResult<()> {
        self.calls.lock().unwrap().push(SinkCall::Retract {
            handle: handle.0.clone(),
        });
        Ok(())
    }

    async fn notify(&self, target: Target, notice: Notice) -> SinkResult<()> {
        self.calls.lock().unwrap().push(SinkCall::Notice {
            target,
            title: notice.title,
            body: notice.body,
        });
        Ok(())
    }

    async fn apply_message_action(
        &self,
        message: &MessageRef,
        action: MessageAction,
    ) -> SinkResult<()> {
        if self.fail_message_action.load(Ordering::SeqCst) {
            return Err(SinkError::PermissionDenied("manage messages".to_string()));
        }
        self.calls.lock().unwrap().push(SinkCall::MessageAction {
            message_id: message.message_id.clone(),
            action,
        });
        Ok(())
    }

    async fn apply_user_action(&self, user: &UserRef, action: UserAction) -> SinkResult<()> {
        if self.fail_user_action.load(Ordering::SeqCst) {
            return Err(SinkError::PermissionDenied("moderate members".to_string()));
        }
        self.calls.lock().unwrap().push(SinkCall::UserAction {
            user_id: user.id.clone(),
            action,
        });
        Ok(())
    }
}

/// Compact taxonomy used by the end-to-end scenarios: fraud branches once,
/// spam and other are direct leaves.
pub fn small_taxonomy() -> Taxonomy {
    Taxonomy::new(vec![
        TaxonomyNode::branch(
            "fraud",
            "Fraud",
            "Scams and deceptive content",
            vec![
                TaxonomyNode::leaf("phishing", "Phishing", "Attempts to steal personal information"),
                TaxonomyNode::leaf(
                    "investment_scam",
                    "Investment Scam",
                    "Fraudulent investment opportunities",
                ),
                TaxonomyNode::leaf(OTHER_KEY, "Other", "Other fraud"),
            ],
        ),
        TaxonomyNode::leaf("spam", "Spam", "Unwanted promotional or repetitive content"),
        TaxonomyNode::leaf(OTHER_KEY, "Other", "Other reportable content"),
    ])
    .expect("test taxonomy is valid")
}

pub const COMMUNITY: &str = "guild-1";
pub const MOD_SURFACE: &str = "guild-1-mod";
pub const OVERSIGHT_SURFACE: &str = "trust-and-safety";
pub const REPORTER_SURFACE: &str = "report-thread-1";

pub fn test_config() -> ModerationConfig {
    let mut config = ModerationConfig::default().with_moderator_surface(COMMUNITY, MOD_SURFACE);
    config.oversight_surface = Some(OVERSIGHT_SURFACE.to_string());
    config
}

pub fn engine_with(sink: Arc<RecordingSink>) -> ModerationEngine {
    ModerationEngine::new(small_taxonomy(), test_config(), sink)
}

pub fn reported_message() -> MessageRef {
    MessageRef {
        community: COMMUNITY.to_string(),
        channel: "general".to_string(),
        message_id: "msg-42".to_string(),
        author: UserRef::new("u-scammer", "scammer"),
        content: "send me your card number and I will double it".to_string(),
        link: "https://chat.example/guild-1/general/msg-42".to_string(),
        sent_at: chrono::Utc::now(),
    }
}

pub fn reporter() -> UserRef {
    UserRef::new("u-alice", "alice")
}

pub fn moderator(n: u32) -> UserRef {
    UserRef::new(format!("u-mod-{n}"), format!("mod-{n}"))
}

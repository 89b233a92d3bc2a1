//! End-to-end tests for the automatic classifier entry path
//!
//! Classifier verdicts enter at the gateway, skip the reporter flow, and land
//! directly in the moderator pool. Invalid taxonomy references fall back to
//! the designated `other` nodes and are reported as data-quality events.

mod common;

use common::*;
use moderation::{
    ClassifierResult, Lifecycle, ModerationEvent, ModeratorInput, Origin, Severity, Target,
};

fn verdict(category: Option<&str>, subtype: Option<&str>, confidence: f32) -> ClassifierResult {
    ClassifierResult {
        category: category.map(String::from),
        subtype: subtype.map(String::from),
        severity: Severity::High,
        confidence,
        reasoning: "message solicits payment credentials".to_string(),
    }
}

/// Automatic bypass: the session is escalated from the start, with no
/// reporter and the classifier rationale as its note.
#[tokio::test]
async fn test_automatic_report_skips_reporter_flow() {
    let sink = RecordingSink::new();
    let engine = engine_with(sink.clone());

    let id = engine
        .submit_automatic(reported_message(), verdict(Some("fraud"), Some("phishing"), 0.95))
        .await
        .unwrap()
        .expect("above threshold");

    let session = engine.snapshot(&id).await.unwrap();
    assert_eq!(session.origin, Origin::Automatic);
    assert_eq!(session.lifecycle, Lifecycle::Escalated);
    assert!(session.reporter.is_none());
    assert_eq!(session.category_path, vec!["fraud", "phishing"]);
    assert!(session
        .note
        .as_deref()
        .unwrap()
        .contains("payment credentials"));

    // Only the moderator surface saw anything; there is no reporter thread.
    assert_eq!(
        sink.prompts_for(MOD_SURFACE),
        vec!["Automatic Report (Classifier Detected)"]
    );
    assert!(sink
        .calls()
        .iter()
        .all(|c| !matches!(c, SinkCall::Notice { .. })));
}

/// Scenario D: wrong-case category normalizes silently, unknown subtype
/// falls back to `other`, and the stored confidence is untouched.
#[tokio::test]
async fn test_classifier_fallback_normalization() {
    let sink = RecordingSink::new();
    let engine = engine_with(sink);
    let mut events = engine.events().subscribe();

    let id = engine
        .submit_automatic(reported_message(), verdict(Some("FRAUD"), Some("nonexistent"), 0.9))
        .await
        .unwrap()
        .expect("accepted");

    let session = engine.snapshot(&id).await.unwrap();
    assert_eq!(session.category_path, vec!["fraud", "other"]);
    let finding = session.classifier.as_ref().unwrap();
    assert_eq!(finding.confidence, 0.9);
    assert_eq!(finding.category.as_deref(), Some("FRAUD"));

    // Exactly one data-quality event, for the subtype.
    let mut data_quality = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let ModerationEvent::DataQuality { field, raw, .. } = event {
            data_quality.push((field, raw));
        }
    }
    assert_eq!(
        data_quality,
        vec![("subtype".to_string(), "nonexistent".to_string())]
    );
}

/// Fallback is idempotent: the same invalid verdict lands on the same path
#[tokio::test]
async fn test_fallback_is_idempotent() {
    let sink = RecordingSink::new();
    let engine = engine_with(sink);

    let first = engine
        .submit_automatic(reported_message(), verdict(Some("gibberish"), None, 0.9))
        .await
        .unwrap()
        .expect("accepted");
    let second = engine
        .submit_automatic(reported_message(), verdict(Some("gibberish"), None, 0.9))
        .await
        .unwrap()
        .expect("accepted");

    let first = engine.snapshot(&first).await.unwrap();
    let second = engine.snapshot(&second).await.unwrap();
    assert_eq!(first.category_path, vec!["other"]);
    assert_eq!(second.category_path, first.category_path);
}

/// Below the confidence threshold nothing is created at all
#[tokio::test]
async fn test_below_threshold_creates_nothing() {
    let sink = RecordingSink::new();
    let engine = engine_with(sink.clone());

    let outcome = engine
        .submit_automatic(reported_message(), verdict(Some("fraud"), None, 0.5))
        .await
        .unwrap();
    assert!(outcome.is_none());
    assert!(sink.calls().is_empty());
    assert!(engine.list_active(COMMUNITY).await.is_empty());
}

/// An automatic report for an unrouted community is logged and dropped
#[tokio::test]
async fn test_unrouted_automatic_report_is_dropped() {
    let sink = RecordingSink::new();
    let engine = engine_with(sink.clone());

    let mut message = reported_message();
    message.community = "guild-unrouted".to_string();

    let outcome = engine
        .submit_automatic(message, verdict(Some("fraud"), None, 0.9))
        .await
        .unwrap();
    assert!(outcome.is_none());
    assert!(sink.calls().is_empty());
}

/// A moderator can action an automatic report; with no reporter there is no
/// reporter-side outcome notice, but the sanctioned user is still told.
#[tokio::test]
async fn test_moderating_automatic_report_has_no_reporter_notice() {
    let sink = RecordingSink::new();
    let engine = engine_with(sink.clone());
    let actor = moderator(1);

    let id = engine
        .submit_automatic(reported_message(), verdict(Some("fraud"), Some("phishing"), 0.95))
        .await
        .unwrap()
        .expect("accepted");

    engine
        .moderator_input(&id, &actor, ModeratorInput::TakeAction)
        .await
        .unwrap();
    engine
        .moderator_input(&id, &actor, ModeratorInput::Severity { value: Severity::Medium })
        .await
        .unwrap();
    engine
        .moderator_input(
            &id,
            &actor,
            ModeratorInput::MessageAction {
                value: moderation::MessageAction::Remove,
            },
        )
        .await
        .unwrap();
    engine
        .moderator_input(
            &id,
            &actor,
            ModeratorInput::UserAction {
                value: moderation::UserAction::Timeout,
            },
        )
        .await
        .unwrap();

    let session = engine.snapshot(&id).await.unwrap();
    assert!(session.is_terminal());

    // Summary on the moderator surface, sanction notice to the user, nothing
    // on any reporter thread.
    assert!(sink
        .notices_for(&Target::surface(MOD_SURFACE))
        .iter()
        .any(|(title, _)| title == "Moderation Summary"));
    let user_target = Target::User(reported_message().author);
    assert!(sink
        .notices_for(&user_target)
        .iter()
        .any(|(title, _)| title == "Timeout"));
    assert!(sink
        .notices_for(&Target::surface(REPORTER_SURFACE))
        .is_empty());
}

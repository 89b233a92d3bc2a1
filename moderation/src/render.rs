//! Rendering — prompt and notice text for every surface
//!
//! Pure functions from session data to [`PromptSpec`]/[`Notice`] values. The
//! sink decides how these become embeds, buttons, or plain text; nothing here
//! touches a platform.

use crate::classifier::ClassifierResult;
use crate::notify::{MessageRef, Notice, PromptOption, PromptSpec};
use crate::session::decision::{MessageAction, Severity, UserAction};
use crate::session::{ReportSession, SessionId};
use crate::taxonomy::{Taxonomy, TaxonomyNode};

/// Longest quoted excerpt of reported content
const QUOTE_MAX_LEN: usize = 1024;

/// Standard confirmation shown to every reporter on submission
pub const REPORT_CONFIRMATION_MESSAGE: &str = "Thank you for helping keep our community safe. \
Our moderation team will review your report and take appropriate action.\n\n\
We will notify you once we have reviewed your report.";

/// Security advisory appended for account-takeover reports
pub const ACCOUNT_SECURITY_ADVISORY: &str = "If you believe your account security may be \
compromised, we strongly recommend:\n\
• Changing your account password\n\
• Updating your account email\n\
• Enabling two-factor authentication";

/// Truncate reported content and place it inside a block quote
pub fn quote_content(content: &str) -> String {
    let content = if content.is_empty() {
        "[No text content]"
    } else {
        content
    };
    if content.chars().count() > QUOTE_MAX_LEN {
        let prefix: String = content.chars().take(QUOTE_MAX_LEN - 3).collect();
        format!(">>> {}...", prefix)
    } else {
        format!(">>> {}", content)
    }
}

fn taxonomy_options(nodes: &[TaxonomyNode]) -> Vec<PromptOption> {
    nodes
        .iter()
        .map(|n| PromptOption::new(&n.key, &n.label, &n.description))
        .collect()
}

/// The first reporter prompt: root category selection plus the report header
pub fn root_category_prompt(target: &MessageRef, roots: &[TaxonomyNode]) -> PromptSpec {
    PromptSpec {
        title: "Report a Message".to_string(),
        body: format!(
            "Please select the type of violation you want to report.\n\n\
             Reported message from {}:\n{}\n{}",
            target.author,
            quote_content(&target.content),
            target.link,
        ),
        options: taxonomy_options(roots),
    }
}

/// A deeper taxonomy prompt, titled after the node being refined
pub fn subtype_prompt(parent: &TaxonomyNode, children: &[TaxonomyNode]) -> PromptSpec {
    PromptSpec {
        title: format!("Select {} Type", parent.label),
        body: format!("What kind of {} is this?", parent.label.to_lowercase()),
        options: taxonomy_options(children),
    }
}

/// Optional free-text note prompt
pub fn note_prompt() -> PromptSpec {
    PromptSpec {
        title: "Additional Information".to_string(),
        body: "Would you like to provide any additional information about this report?"
            .to_string(),
        options: vec![
            PromptOption::new("add_info", "Add Information", "Provide additional context"),
            PromptOption::new("skip", "Skip", "Submit the report as-is"),
        ],
    }
}

/// Confirmation notice sent to the reporter thread after submission
pub fn confirmation_notice(session: &ReportSession, taxonomy: &Taxonomy) -> Notice {
    let mut body = REPORT_CONFIRMATION_MESSAGE.to_string();
    if !session.category_path.is_empty() {
        body.push_str(&format!(
            "\n\nReport type: {}",
            taxonomy.label_path(&session.category_path)
        ));
    }
    if session.category_path.iter().any(|k| k == "account_takeover") {
        body.push_str("\n\n");
        body.push_str(ACCOUNT_SECURITY_ADVISORY);
    }
    body.push_str(&format!("\n\nReport ID: {}", session.id));
    Notice::new("Report Submitted Successfully", body)
}

/// Notice for an explicit reporter cancellation
pub fn cancellation_notice(session_id: &str) -> Notice {
    Notice::new(
        "Report Cancelled",
        format!("Report {} was cancelled. No action will be taken.", session_id),
    )
}

/// Notice for a report whose prompts expired unanswered
pub fn expiry_notice(session_id: &str) -> Notice {
    Notice::new(
        "Report Expired",
        format!(
            "Report {} was closed because it sat unanswered too long. \
             You can start a new report at any time.",
            session_id
        ),
    )
}

/// The escalation posting: the rendered report plus the Take Action / Dismiss
/// prompt shown to the moderator pool.
pub fn moderator_report_prompt(session: &ReportSession, taxonomy: &Taxonomy) -> PromptSpec {
    let target = &session.target;
    let mut body = match &session.classifier {
        Some(finding) => automatic_report_body(finding),
        None => {
            let reporter = session
                .reporter
                .as_ref()
                .map(|r| r.name.as_str())
                .unwrap_or("unknown");
            format!(
                "A new report has been submitted and requires moderator attention.\n\
                 Reporter: {}",
                reporter
            )
        }
    };

    if !session.category_path.is_empty() {
        body.push_str(&format!(
            "\nReport type: {}",
            taxonomy.label_path(&session.category_path)
        ));
    }
    if let Some(note) = &session.note {
        body.push_str(&format!("\nAdditional information: {}", note));
    }
    body.push_str(&format!(
        "\n\nReported message from {}:\n{}\n{}\n\nReport ID: {}",
        target.author,
        quote_content(&target.content),
        target.link,
        session.id,
    ));

    let title = match &session.classifier {
        Some(_) => "Automatic Report (Classifier Detected)".to_string(),
        None => "New Report Received".to_string(),
    };

    PromptSpec {
        title,
        body,
        options: vec![
            PromptOption::new("take_action", "Take Action", "Start the moderation flow"),
            PromptOption::new("dismiss", "Dismiss Report", "Dismiss with a reason"),
        ],
    }
}

fn automatic_report_body(finding: &ClassifierResult) -> String {
    format!(
        "Our classifier detected potential abuse with {}% confidence.\n\
         Detected type: {}\n\
         Subtype: {}\n\
         Severity: {}\n\
         Reasoning: {}",
        finding.confidence_pct(),
        finding.category.as_deref().unwrap_or("N/A"),
        finding.subtype.as_deref().unwrap_or("N/A"),
        finding.severity,
        finding.reasoning,
    )
}

/// First stage of the moderator flow
pub fn severity_prompt() -> PromptSpec {
    PromptSpec {
        title: "Severity Level".to_string(),
        body: "How severe is this violation?".to_string(),
        options: Severity::ALL
            .iter()
            .map(|s| PromptOption::new(s.to_string(), s.label(), s.description()))
            .collect(),
    }
}

/// Second stage of the moderator flow
pub fn message_action_prompt() -> PromptSpec {
    PromptSpec {
        title: "Message Action".to_string(),
        body: "What should be done with the reported message?".to_string(),
        options: MessageAction::ALL
            .iter()
            .map(|a| PromptOption::new(a.to_string(), a.label(), ""))
            .collect(),
    }
}

/// Third stage of the moderator flow
pub fn user_action_prompt() -> PromptSpec {
    PromptSpec {
        title: "User Action".to_string(),
        body: "What action should be taken against the user?".to_string(),
        options: UserAction::ALL
            .iter()
            .map(|a| PromptOption::new(a.to_string(), a.label(), ""))
            .collect(),
    }
}

/// The completed-moderation summary body shared by both surfaces
pub fn summary_text(
    session_id: &SessionId,
    moderator: &str,
    severity: Severity,
    message_action: MessageAction,
    user_action: UserAction,
) -> String {
    format!(
        "Message action: {}\n\
         User action: {}\n\
         Severity: {}\n\
         Report ID: {}\n\
         Handled by: {}",
        message_action.label(),
        user_action.label(),
        severity.label(),
        session_id,
        moderator,
    )
}

/// Summary notice for the moderator surface
pub fn moderation_summary_notice(summary: &str) -> Notice {
    Notice::new("Moderation Summary", summary.to_string())
}

/// Outcome notice for the reporter thread
pub fn reporter_outcome_notice(summary: &str) -> Notice {
    Notice::new(
        "Report Outcome",
        format!("Your report has been reviewed by our moderators.\n{}", summary),
    )
}

/// Dismissal record for the moderator surface
pub fn dismissal_notice(moderator: &str, reason: &str) -> Notice {
    Notice::new(
        "Report Dismissed",
        format!("Reason: {}\nDismissed by {}", reason, moderator),
    )
}

/// Dismissal notice for the reporter thread
pub fn reporter_dismissal_notice() -> Notice {
    Notice::new(
        "Report Dismissed",
        "Your report has been dismissed by our moderators. If you disagree with the \
         dismissal, please submit another report and provide more information in the \
         additional information field."
            .to_string(),
    )
}

/// Direct notice delivered to a sanctioned user
pub fn sanction_notice(action: UserAction) -> Notice {
    match action {
        UserAction::Warn => Notice::new(
            "Warning",
            "You have received a warning for violating our community guidelines.",
        ),
        UserAction::Timeout => Notice::new(
            "Timeout",
            "You have been timed out for 24 hours for violating our community guidelines.",
        ),
        UserAction::Kick => Notice::new(
            "Kick",
            "You have been kicked from the server for violating our community guidelines.",
        ),
        UserAction::Ban => Notice::new(
            "Ban",
            "You have been banned from the server for violating our community guidelines.",
        ),
    }
}

/// Supplementary escalation for High/Critical outcomes
pub fn oversight_notice(session: &ReportSession, severity: Severity) -> Notice {
    Notice::new(
        "High-Severity Moderation Outcome",
        format!(
            "Report {} in community {} was actioned at {} severity.\n\
             Reported user: {}\n{}",
            session.id,
            session.community,
            severity.label(),
            session.target.author,
            quote_content(&session.target.content),
        ),
    )
}

/// Warning shown on the moderator surface when a sanction call fails
pub fn action_failure_notice(action: &str, error: &str) -> Notice {
    Notice::new(
        "Action Failed",
        format!(
            "Failed to {}: {}. The report remains closed; please apply the action manually.",
            action, error
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_content_truncates() {
        let long = "a".repeat(2000);
        let quoted = quote_content(&long);
        assert!(quoted.starts_with(">>> "));
        assert!(quoted.ends_with("..."));
        assert!(quoted.chars().count() <= QUOTE_MAX_LEN + 7);

        assert_eq!(quote_content(""), ">>> [No text content]");
        assert_eq!(quote_content("hi"), ">>> hi");
    }

    #[test]
    fn test_severity_prompt_has_all_levels() {
        let prompt = severity_prompt();
        assert_eq!(prompt.options.len(), 4);
        assert_eq!(prompt.options[0].key, "low");
        assert_eq!(prompt.options[3].key, "critical");
    }

    #[test]
    fn test_summary_text_includes_all_values() {
        let summary = summary_text(
            &"abc123".to_string(),
            "mod-jane",
            Severity::High,
            MessageAction::Remove,
            UserAction::Ban,
        );
        assert!(summary.contains("Remove Message"));
        assert!(summary.contains("Ban User"));
        assert!(summary.contains("High"));
        assert!(summary.contains("abc123"));
        assert!(summary.contains("mod-jane"));
    }
}

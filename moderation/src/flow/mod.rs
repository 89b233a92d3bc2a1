//! Workflow state machines
//!
//! Two guided flows drive a report session: the reporter-side classification
//! flow over the taxonomy tree, and the moderator-side action flow over the
//! fixed severity/message/user option sets. Both are explicit state machines
//! (enum cursor + transition functions), not callback chains, so every
//! transition is auditable and unit-testable on its own.
//!
//! ```text
//! Reporter:   SelectCategory → SelectSubtype* → OptionalNote → Submitted
//!                  │                │               │
//!                  └────────────────┴───────────────┴──→ Cancelled
//!
//! Moderator:  AwaitingModerator → SelectSeverity → SelectMessageAction
//!                  │                                        │
//!                  └──→ Dismissed          SelectUserAction ┘ → Summarized
//! ```
//!
//! Revising an earlier answer in either flow retracts every deeper prompt
//! recorded in the session's UI trail before the next prompt is rendered.

pub mod moderator;
pub mod reporter;

pub use moderator::{ModeratorFlow, ModeratorInput};
pub use reporter::{ReporterFlow, ReporterInput};

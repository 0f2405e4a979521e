use std::fmt;

use carehub_core::models::ids::{InstanceId, ItemId, SectionId, TemplateId};
use carehub_core::models::template::TemplateProblem;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::handoff::HandoffError;

#[derive(Debug, Error)]
pub enum BuilderError {
    #[error("section not found: {0}")]
    SectionNotFound(SectionId),

    #[error("item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("invalid reorder: {0}")]
    InvalidReorder(String),

    #[error("template {0} is already published")]
    AlreadyPublished(TemplateId),

    #[error("template {0} has no items to publish")]
    EmptyTemplate(TemplateId),

    #[error("template is not publishable: {}", summarize(.0))]
    InvalidTemplate(Vec<TemplateProblem>),
}

fn summarize(problems: &[TemplateProblem]) -> String {
    problems
        .iter()
        .map(|p| p.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Which hand-off a form has outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum HandoffKind {
    DraftSave,
    Submit,
}

impl fmt::Display for HandoffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandoffKind::DraftSave => f.write_str("draft save"),
            HandoffKind::Submit => f.write_str("submission"),
        }
    }
}

/// Failures of the form session itself. Invalid responses are not errors
/// here; they are reported as values in an error map.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("template {0} is not published")]
    TemplateNotPublished(TemplateId),

    #[error("template {0} is disabled")]
    TemplateDisabled(TemplateId),

    #[error("item {0} is not part of this form")]
    UnknownItem(ItemId),

    #[error("item {0} is not a multiple-choice item")]
    NotMultipleChoice(ItemId),

    #[error("'{option}' is not an option of item {item}")]
    UnknownOption { item: ItemId, option: String },

    #[error("a {0} is already in flight for this form")]
    HandoffInFlight(HandoffKind),

    #[error("no {0} is in flight for this form")]
    NotInFlight(HandoffKind),

    #[error("draft saving is not available for this form")]
    DraftsUnavailable,

    #[error("form {0} has already been submitted")]
    Finalized(InstanceId),

    /// A persistence failure, carried verbatim.
    #[error("{0}")]
    Handoff(#[source] HandoffError),
}

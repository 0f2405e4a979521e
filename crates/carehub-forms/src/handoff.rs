//! Collaborator seams.
//!
//! The engine never persists anything itself. Templates are loaded from and
//! saved to a [`TemplateStore`]; response sets leave a form session only
//! through a [`DraftStore`] (unvalidated) or a [`SubmissionStore`]
//! (validated against every item).

use std::future::Future;
use std::pin::Pin;

use carehub_core::models::ids::{InstanceId, TemplateId};
use carehub_core::models::response::ResponseSet;
use carehub_core::models::template::TemplateDefinition;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Whatever a collaborator fails with. Surfaced to the caller untouched.
pub type HandoffError = Box<dyn std::error::Error + Send + Sync>;

/// An in-progress response set, saved without validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Draft {
    pub instance_id: InstanceId,
    pub template_id: TemplateId,
    pub template_version: u32,
    pub responses: ResponseSet,
    pub saved_at: jiff::Timestamp,
}

/// A response set that passed validation against every item of
/// `template_version`. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Submission {
    pub instance_id: InstanceId,
    pub template_id: TemplateId,
    pub template_version: u32,
    pub responses: ResponseSet,
    pub score: Option<f64>,
    pub submitted_at: jiff::Timestamp,
}

pub trait DraftStore: Send + Sync {
    fn save_draft<'a>(&'a self, draft: &'a Draft) -> BoxFuture<'a, Result<(), HandoffError>>;

    fn load_draft(
        &self,
        instance: InstanceId,
    ) -> BoxFuture<'_, Result<Option<Draft>, HandoffError>>;
}

pub trait SubmissionStore: Send + Sync {
    /// Store a submission. Storing a second one for the same instance fails.
    fn submit<'a>(
        &'a self,
        submission: &'a Submission,
    ) -> BoxFuture<'a, Result<(), HandoffError>>;

    fn load_submission(
        &self,
        instance: InstanceId,
    ) -> BoxFuture<'_, Result<Option<Submission>, HandoffError>>;
}

/// A template as read from its store, with the revision it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredTemplate {
    pub template: TemplateDefinition,
    /// Opaque; changes on every save.
    pub revision: String,
}

pub trait TemplateStore: Send + Sync {
    fn load_template(
        &self,
        id: TemplateId,
    ) -> BoxFuture<'_, Result<Option<StoredTemplate>, HandoffError>>;

    /// The shape a template had at one version.
    fn load_template_version(
        &self,
        id: TemplateId,
        version: u32,
    ) -> BoxFuture<'_, Result<Option<TemplateDefinition>, HandoffError>>;

    fn list_templates(&self) -> BoxFuture<'_, Result<Vec<TemplateDefinition>, HandoffError>>;

    /// Persist the template if it is still at `expected`, the revision it
    /// was loaded at (`None` for a template that must not exist yet), and
    /// return its new revision. A stale `expected` fails without writing.
    ///
    /// The first save of each version of an `Active` template also writes an
    /// immutable snapshot of that version; later saves at the same version
    /// leave the snapshot alone.
    fn save_template<'a>(
        &'a self,
        template: &'a TemplateDefinition,
        expected: Option<&'a str>,
    ) -> BoxFuture<'a, Result<String, HandoffError>>;
}

//! Object key conventions.
//!
//! Pure string functions, no storage SDK dependency. These define the
//! canonical layout of templates and form responses in the object store.

use crate::models::ids::{InstanceId, TemplateId};

pub const TEMPLATES_PREFIX: &str = "templates/";

/// The latest saved shape of a template.
pub fn template(id: TemplateId) -> String {
    format!("templates/{id}/current.json")
}

/// Immutable snapshot of a template at one version. Responses are validated
/// against exactly one of these.
pub fn template_version(id: TemplateId, version: u32) -> String {
    format!("templates/{id}/versions/{version}.json")
}

pub fn draft(instance: InstanceId) -> String {
    format!("responses/{instance}/draft.json")
}

pub fn submission(instance: InstanceId) -> String {
    format!("responses/{instance}/submitted.json")
}

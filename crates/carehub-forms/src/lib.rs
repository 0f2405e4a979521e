//! carehub-forms
//!
//! The template-driven form engine. Pure and synchronous apart from the two
//! response hand-offs; no storage dependency. Validates responses per item
//! type, derives progress and instrument scores, edits and publishes
//! templates, and runs form sessions against published templates.

pub mod affordance;
pub mod builder;
pub mod error;
pub mod handoff;
pub mod scoring;
pub mod session;
pub mod validate;

pub use builder::{TemplateBuilder, TemplateEdit};
pub use error::{BuilderError, FormError};
pub use session::{FormSession, Handoffs, SubmitOutcome};

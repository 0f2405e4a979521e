//! carehub-storage
//!
//! Persistence collaborators for the form engine: templates, drafts, and
//! submissions stored as JSON objects in S3, plus an in-memory store with
//! the same behavior for local runs and tests.

pub mod client;
pub mod error;
pub mod json;
pub mod memory;
pub mod objects;
pub mod s3;

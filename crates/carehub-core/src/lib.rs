//! carehub-core
//!
//! Pure domain types for template-driven forms: templates, sections, items,
//! response values, and object key conventions. No I/O. This is the shared
//! vocabulary of the form engine, its stores, and its HTTP surface.

pub mod error;
pub mod keys;
pub mod models;

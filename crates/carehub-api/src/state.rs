use std::collections::HashMap;
use std::sync::Arc;

use carehub_core::models::ids::InstanceId;
use carehub_forms::handoff::{DraftStore, SubmissionStore, TemplateStore};
use carehub_forms::{FormSession, Handoffs};
use tokio::sync::Mutex;

/// Shared application state, injected into all route handlers via Axum state.
#[derive(Clone)]
pub struct AppState {
    pub templates: Arc<dyn TemplateStore>,
    pub drafts: Arc<dyn DraftStore>,
    pub handoffs: Handoffs,
    /// Open form sessions. Never held across a store call.
    pub sessions: Arc<Mutex<HashMap<InstanceId, FormSession>>>,
}

impl AppState {
    /// State over one store that persists templates, drafts and submissions.
    pub fn new<S>(store: Arc<S>) -> Self
    where
        S: TemplateStore + DraftStore + SubmissionStore + 'static,
    {
        Self {
            templates: store.clone(),
            drafts: store.clone(),
            handoffs: Handoffs {
                submissions: store.clone(),
                drafts: Some(store),
            },
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

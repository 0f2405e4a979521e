#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use carehub_core::models::ids::InstanceId;
use carehub_core::models::template::{ItemKind, TemplateCategory, TemplateDefinition};
use carehub_forms::builder::{NewItem, NewSection, TemplateBuilder};
use carehub_forms::handoff::{
    BoxFuture, Draft, DraftStore, HandoffError, Submission, SubmissionStore,
};
use carehub_forms::session::Handoffs;

pub fn new_item(label: &str, required: bool, kind: ItemKind) -> NewItem {
    NewItem {
        label: label.to_string(),
        description: None,
        required,
        kind,
    }
}

pub fn new_section(title: &str) -> NewSection {
    NewSection {
        title: title.to_string(),
        ..NewSection::default()
    }
}

/// Build and publish a one-section template from `(label, required, kind)`.
pub fn published(items: Vec<(&str, bool, ItemKind)>) -> TemplateDefinition {
    let mut builder = TemplateBuilder::create("Visit note", TemplateCategory::VisitNote);
    let section = builder.add_section(new_section("Visit"));
    for (label, required, kind) in items {
        builder.add_item(section, new_item(label, required, kind)).unwrap();
    }
    builder.publish().unwrap();
    builder.into_template()
}

/// Records every hand-off; optionally fails them or never completes them.
#[derive(Default)]
pub struct RecordingStore {
    pub drafts: Mutex<Vec<Draft>>,
    pub submissions: Mutex<Vec<Submission>>,
    pub fail_with: Mutex<Option<String>>,
    pub stall: AtomicBool,
}

impl RecordingStore {
    pub fn failing(message: &str) -> Self {
        let store = Self::default();
        *store.fail_with.lock().unwrap() = Some(message.to_string());
        store
    }

    pub fn stalled() -> Self {
        let store = Self::default();
        store.stall.store(true, Ordering::SeqCst);
        store
    }

    pub fn recover(&self) {
        *self.fail_with.lock().unwrap() = None;
        self.stall.store(false, Ordering::SeqCst);
    }

    async fn wait_if_stalled(&self) {
        if self.stall.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
    }

    fn outcome(&self) -> Result<(), HandoffError> {
        match self.fail_with.lock().unwrap().clone() {
            Some(message) => Err(message.into()),
            None => Ok(()),
        }
    }
}

impl DraftStore for RecordingStore {
    fn save_draft<'a>(&'a self, draft: &'a Draft) -> BoxFuture<'a, Result<(), HandoffError>> {
        Box::pin(async move {
            self.wait_if_stalled().await;
            self.outcome()?;
            self.drafts.lock().unwrap().push(draft.clone());
            Ok(())
        })
    }

    fn load_draft(
        &self,
        instance: InstanceId,
    ) -> BoxFuture<'_, Result<Option<Draft>, HandoffError>> {
        Box::pin(async move {
            Ok(self
                .drafts
                .lock()
                .unwrap()
                .iter()
                .rev()
                .find(|d| d.instance_id == instance)
                .cloned())
        })
    }
}

impl SubmissionStore for RecordingStore {
    fn submit<'a>(
        &'a self,
        submission: &'a Submission,
    ) -> BoxFuture<'a, Result<(), HandoffError>> {
        Box::pin(async move {
            self.wait_if_stalled().await;
            self.outcome()?;
            self.submissions.lock().unwrap().push(submission.clone());
            Ok(())
        })
    }

    fn load_submission(
        &self,
        instance: InstanceId,
    ) -> BoxFuture<'_, Result<Option<Submission>, HandoffError>> {
        Box::pin(async move {
            Ok(self
                .submissions
                .lock()
                .unwrap()
                .iter()
                .find(|s| s.instance_id == instance)
                .cloned())
        })
    }
}

pub fn handoffs(store: &Arc<RecordingStore>, with_drafts: bool) -> Handoffs {
    Handoffs {
        submissions: store.clone(),
        drafts: with_drafts.then(|| store.clone() as Arc<dyn DraftStore>),
    }
}

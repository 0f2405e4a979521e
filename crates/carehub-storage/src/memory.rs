use std::collections::HashMap;

use carehub_core::keys;
use carehub_core::models::ids::{InstanceId, TemplateId};
use carehub_core::models::template::{TemplateDefinition, TemplateStatus};
use carehub_forms::handoff::{
    BoxFuture, Draft, DraftStore, HandoffError, StoredTemplate, Submission, SubmissionStore,
    TemplateStore,
};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::StorageError;

/// Process-local store with the same semantics as [`S3Store`](crate::s3::S3Store):
/// saves are compare-and-swap on a revision counter, version snapshots of
/// published templates are write-once, and so are submissions.
#[derive(Default)]
pub struct MemoryStore {
    templates: RwLock<HashMap<TemplateId, (TemplateDefinition, u64)>>,
    versions: RwLock<HashMap<(TemplateId, u32), TemplateDefinition>>,
    drafts: RwLock<HashMap<InstanceId, Draft>>,
    submissions: RwLock<HashMap<InstanceId, Submission>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn submission(&self, instance: InstanceId) -> Option<Submission> {
        self.submissions.read().await.get(&instance).cloned()
    }

    pub async fn submission_count(&self) -> usize {
        self.submissions.read().await.len()
    }
}

impl TemplateStore for MemoryStore {
    fn load_template(
        &self,
        id: TemplateId,
    ) -> BoxFuture<'_, Result<Option<StoredTemplate>, HandoffError>> {
        Box::pin(async move {
            Ok(self
                .templates
                .read()
                .await
                .get(&id)
                .map(|(template, revision)| StoredTemplate {
                    template: template.clone(),
                    revision: revision.to_string(),
                }))
        })
    }

    fn load_template_version(
        &self,
        id: TemplateId,
        version: u32,
    ) -> BoxFuture<'_, Result<Option<TemplateDefinition>, HandoffError>> {
        Box::pin(async move { Ok(self.versions.read().await.get(&(id, version)).cloned()) })
    }

    fn list_templates(&self) -> BoxFuture<'_, Result<Vec<TemplateDefinition>, HandoffError>> {
        Box::pin(async move {
            let mut templates: Vec<TemplateDefinition> = self
                .templates
                .read()
                .await
                .values()
                .map(|(template, _)| template.clone())
                .collect();
            templates.sort_by_key(|t| t.created_at);
            Ok(templates)
        })
    }

    fn save_template<'a>(
        &'a self,
        template: &'a TemplateDefinition,
        expected: Option<&'a str>,
    ) -> BoxFuture<'a, Result<String, HandoffError>> {
        Box::pin(async move {
            let mut templates = self.templates.write().await;
            let current = templates.get(&template.id).map(|(_, revision)| revision.to_string());
            if current.as_deref() != expected {
                return Err(HandoffError::from(StorageError::PreconditionFailed {
                    key: keys::template(template.id),
                }));
            }

            let revision = templates.get(&template.id).map_or(1, |(_, r)| r + 1);
            templates.insert(template.id, (template.clone(), revision));

            if template.status == TemplateStatus::Active {
                self.versions
                    .write()
                    .await
                    .entry((template.id, template.version))
                    .or_insert_with(|| template.clone());
            }
            debug!(template_id = %template.id, version = template.version, revision, "template saved");
            Ok(revision.to_string())
        })
    }
}

impl DraftStore for MemoryStore {
    fn save_draft<'a>(&'a self, draft: &'a Draft) -> BoxFuture<'a, Result<(), HandoffError>> {
        Box::pin(async move {
            self.drafts
                .write()
                .await
                .insert(draft.instance_id, draft.clone());
            Ok(())
        })
    }

    fn load_draft(
        &self,
        instance: InstanceId,
    ) -> BoxFuture<'_, Result<Option<Draft>, HandoffError>> {
        Box::pin(async move { Ok(self.drafts.read().await.get(&instance).cloned()) })
    }
}

impl SubmissionStore for MemoryStore {
    fn submit<'a>(
        &'a self,
        submission: &'a Submission,
    ) -> BoxFuture<'a, Result<(), HandoffError>> {
        Box::pin(async move {
            let mut submissions = self.submissions.write().await;
            if submissions.contains_key(&submission.instance_id) {
                return Err(HandoffError::from(StorageError::AlreadyExists {
                    key: keys::submission(submission.instance_id),
                }));
            }
            submissions.insert(submission.instance_id, submission.clone());
            Ok(())
        })
    }

    fn load_submission(
        &self,
        instance: InstanceId,
    ) -> BoxFuture<'_, Result<Option<Submission>, HandoffError>> {
        Box::pin(async move { Ok(self.submissions.read().await.get(&instance).cloned()) })
    }
}

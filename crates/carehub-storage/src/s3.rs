use aws_sdk_s3::Client;
use carehub_core::keys;
use carehub_core::models::ids::{InstanceId, TemplateId};
use carehub_core::models::template::{TemplateDefinition, TemplateStatus};
use carehub_forms::handoff::{
    BoxFuture, Draft, DraftStore, HandoffError, StoredTemplate, Submission, SubmissionStore,
    TemplateStore,
};
use tracing::{debug, info};

use crate::error::StorageError;
use crate::json;

/// Templates and responses as JSON objects in one S3 bucket.
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

impl TemplateStore for S3Store {
    fn load_template(
        &self,
        id: TemplateId,
    ) -> BoxFuture<'_, Result<Option<StoredTemplate>, HandoffError>> {
        Box::pin(async move {
            let loaded = json::load_json_tagged(&self.client, &self.bucket, &keys::template(id))
                .await?;
            Ok(loaded.map(|(template, revision)| StoredTemplate { template, revision }))
        })
    }

    fn load_template_version(
        &self,
        id: TemplateId,
        version: u32,
    ) -> BoxFuture<'_, Result<Option<TemplateDefinition>, HandoffError>> {
        Box::pin(async move {
            let key = keys::template_version(id, version);
            Ok(json::load_json(&self.client, &self.bucket, &key).await?)
        })
    }

    fn list_templates(&self) -> BoxFuture<'_, Result<Vec<TemplateDefinition>, HandoffError>> {
        Box::pin(async move {
            let keys = crate::objects::list_objects(&self.client, &self.bucket, keys::TEMPLATES_PREFIX)
                .await?;

            let mut templates = Vec::new();
            for key in keys.iter().filter(|k| k.ends_with("/current.json")) {
                if let Some(template) = json::load_json(&self.client, &self.bucket, key).await? {
                    templates.push(template);
                }
            }
            Ok(templates)
        })
    }

    fn save_template<'a>(
        &'a self,
        template: &'a TemplateDefinition,
        expected: Option<&'a str>,
    ) -> BoxFuture<'a, Result<String, HandoffError>> {
        Box::pin(async move {
            let key = keys::template(template.id);
            let revision = match expected {
                Some(etag) => {
                    json::save_json_if_match(&self.client, &self.bucket, &key, template, etag)
                        .await?
                }
                None => json::save_json_once(&self.client, &self.bucket, &key, template)
                    .await
                    .map_err(|e| match e {
                        StorageError::AlreadyExists { key } => {
                            StorageError::PreconditionFailed { key }
                        }
                        other => other,
                    })?,
            };

            if template.status == TemplateStatus::Active {
                let snapshot = keys::template_version(template.id, template.version);
                match json::save_json_once(&self.client, &self.bucket, &snapshot, template).await {
                    Ok(_) => {}
                    Err(StorageError::AlreadyExists { .. }) => {
                        debug!(template_id = %template.id, version = template.version, "version snapshot already retained");
                    }
                    Err(e) => return Err(e.into()),
                }
            }

            info!(template_id = %template.id, version = template.version, "template saved");
            Ok(revision)
        })
    }
}

impl DraftStore for S3Store {
    fn save_draft<'a>(&'a self, draft: &'a Draft) -> BoxFuture<'a, Result<(), HandoffError>> {
        Box::pin(async move {
            let key = keys::draft(draft.instance_id);
            json::save_json(&self.client, &self.bucket, &key, draft).await?;
            Ok(())
        })
    }

    fn load_draft(
        &self,
        instance: InstanceId,
    ) -> BoxFuture<'_, Result<Option<Draft>, HandoffError>> {
        Box::pin(async move {
            Ok(json::load_json(&self.client, &self.bucket, &keys::draft(instance)).await?)
        })
    }
}

impl SubmissionStore for S3Store {
    fn submit<'a>(
        &'a self,
        submission: &'a Submission,
    ) -> BoxFuture<'a, Result<(), HandoffError>> {
        Box::pin(async move {
            let key = keys::submission(submission.instance_id);
            json::save_json_once(&self.client, &self.bucket, &key, submission).await?;
            info!(instance_id = %submission.instance_id, "submission stored");
            Ok(())
        })
    }

    fn load_submission(
        &self,
        instance: InstanceId,
    ) -> BoxFuture<'_, Result<Option<Submission>, HandoffError>> {
        Box::pin(async move {
            Ok(json::load_json(&self.client, &self.bucket, &keys::submission(instance)).await?)
        })
    }
}

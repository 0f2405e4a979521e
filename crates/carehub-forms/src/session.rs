//! The response renderer: one live, client-held form instance.
//!
//! A session holds a template snapshot, the response set being filled, and
//! the advisory error map from the last submit attempt. It leaves the
//! process only through its two hand-offs, and keeps at most one of them
//! in flight. Each hand-off is split into `begin_*` (guard and payload),
//! `send` (the await), and `finish_*` (record the outcome), so callers that
//! share a session behind a lock never hold the lock across the await.
//!
//! A hand-off whose `send` is dropped before `finish_*` runs must be
//! released with [`FormSession::abandon_handoff`]; the async `save_draft`
//! and `submit` do this themselves when their future is dropped.

use std::sync::Arc;

use carehub_core::models::ids::{InstanceId, ItemId, SectionId, TemplateId};
use carehub_core::models::response::{ResponseSet, ResponseValue};
use carehub_core::models::template::{ItemKind, TemplateDefinition, TemplateStatus};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::affordance::{affordance_for, Affordance};
use crate::error::{FormError, HandoffKind};
use crate::handoff::{Draft, DraftStore, HandoffError, Submission, SubmissionStore};
use crate::scoring::{self, Progress, SectionScore};
use crate::validate::{self, ErrorMap, ValidationError};

/// Where a session's response sets go.
#[derive(Clone)]
pub struct Handoffs {
    pub submissions: Arc<dyn SubmissionStore>,
    /// Draft saving is only offered when this is present.
    pub drafts: Option<Arc<dyn DraftStore>>,
}

pub struct FormSession {
    instance_id: InstanceId,
    template: Arc<TemplateDefinition>,
    responses: ResponseSet,
    errors: ErrorMap,
    focus: Option<ItemId>,
    in_flight: Option<HandoffKind>,
    submitted: bool,
    handoffs: Handoffs,
}

/// A draft ready to be handed to its store.
pub struct DraftHandoff {
    store: Arc<dyn DraftStore>,
    draft: Draft,
}

impl DraftHandoff {
    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub async fn send(&self) -> Result<(), HandoffError> {
        self.store.save_draft(&self.draft).await
    }
}

/// A validated submission ready to be handed to its store.
pub struct SubmitHandoff {
    store: Arc<dyn SubmissionStore>,
    submission: Submission,
}

impl SubmitHandoff {
    pub fn submission(&self) -> &Submission {
        &self.submission
    }

    pub fn into_submission(self) -> Submission {
        self.submission
    }

    pub async fn send(&self) -> Result<(), HandoffError> {
        self.store.submit(&self.submission).await
    }
}

/// A submit attempt that failed validation. Nothing was handed off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rejection {
    /// The first offending item in template order.
    pub first_invalid: ItemId,
    pub errors: ErrorMap,
}

pub enum SubmitStep {
    Rejected(Rejection),
    Ready(SubmitHandoff),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "outcome", rename_all = "snake_case")]
#[ts(export)]
pub enum SubmitOutcome {
    Submitted { submission: Submission },
    Rejected { rejection: Rejection },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemView {
    pub id: ItemId,
    pub label: String,
    pub description: Option<String>,
    pub required: bool,
    pub affordance: Affordance,
    pub value: Option<ResponseValue>,
    pub error: Option<ValidationError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SectionView {
    pub id: SectionId,
    pub title: String,
    pub description: Option<String>,
    pub section_type: Option<String>,
    pub items: Vec<ItemView>,
}

/// Everything a form screen needs to draw the current state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FormView {
    pub instance_id: InstanceId,
    pub template_id: TemplateId,
    pub template_version: u32,
    pub name: String,
    pub sections: Vec<SectionView>,
    pub progress: Progress,
    pub score: Option<f64>,
    pub focus: Option<ItemId>,
    pub in_flight: Option<HandoffKind>,
    pub submitted: bool,
    pub can_submit: bool,
    pub can_save_draft: bool,
}

impl FormSession {
    /// Begin a new instance. Only published, enabled templates can be
    /// instantiated.
    pub fn start(
        template: Arc<TemplateDefinition>,
        initial: ResponseSet,
        handoffs: Handoffs,
    ) -> Result<Self, FormError> {
        if template.status != TemplateStatus::Active {
            return Err(FormError::TemplateNotPublished(template.id));
        }
        if !template.is_enabled {
            return Err(FormError::TemplateDisabled(template.id));
        }
        Ok(Self::resume(InstanceId::new(), template, initial, handoffs))
    }

    /// Reopen an existing instance, such as a saved draft. Availability of
    /// the template does not matter for instances that already exist.
    pub fn resume(
        instance_id: InstanceId,
        template: Arc<TemplateDefinition>,
        responses: ResponseSet,
        handoffs: Handoffs,
    ) -> Self {
        let session = Self {
            instance_id,
            template,
            responses,
            errors: ErrorMap::new(),
            focus: None,
            in_flight: None,
            submitted: false,
            handoffs,
        };
        let orphans = session.orphaned_items();
        if !orphans.is_empty() {
            debug!(
                instance_id = %instance_id,
                count = orphans.len(),
                "response set holds values for items not in this template version"
            );
        }
        session
    }

    pub fn instance_id(&self) -> InstanceId {
        self.instance_id
    }

    pub fn template(&self) -> &TemplateDefinition {
        &self.template
    }

    pub fn responses(&self) -> &ResponseSet {
        &self.responses
    }

    pub fn value(&self, item: ItemId) -> Option<&ResponseValue> {
        self.responses.get(item)
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    pub fn error(&self, item: ItemId) -> Option<&ValidationError> {
        self.errors.get(&item)
    }

    /// The item surfaced for attention after a rejected submit.
    pub fn focus(&self) -> Option<ItemId> {
        self.focus
    }

    pub fn in_flight(&self) -> Option<HandoffKind> {
        self.in_flight
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn can_submit(&self) -> bool {
        !self.submitted && self.in_flight.is_none()
    }

    pub fn can_save_draft(&self) -> bool {
        self.handoffs.drafts.is_some() && self.can_submit()
    }

    /// Response keys that name no item of this template.
    pub fn orphaned_items(&self) -> Vec<ItemId> {
        self.responses
            .item_ids()
            .filter(|id| self.template.item(*id).is_none())
            .collect()
    }

    pub fn progress(&self) -> Progress {
        scoring::progress(&self.template, &self.responses)
    }

    pub fn score(&self) -> Option<f64> {
        scoring::score(&self.template, &self.responses)
    }

    pub fn section_scores(&self) -> Vec<SectionScore> {
        scoring::section_scores(&self.template, &self.responses)
    }

    /// Record a new value for an item, clearing its error.
    pub fn set_value(
        &mut self,
        item: ItemId,
        value: impl Into<ResponseValue>,
    ) -> Result<(), FormError> {
        self.check_editable(item)?;
        self.responses.set(item, value);
        self.clear_error(item);
        Ok(())
    }

    pub fn clear_value(&mut self, item: ItemId) -> Result<(), FormError> {
        self.check_editable(item)?;
        self.responses.remove(item);
        self.clear_error(item);
        Ok(())
    }

    /// Select or deselect one option of a multiple-choice item. Selections
    /// are kept in option order and never duplicated.
    pub fn toggle_option(&mut self, item: ItemId, option: &str) -> Result<(), FormError> {
        self.check_editable(item)?;
        let options = match self.template.item(item).map(|i| &i.kind) {
            Some(ItemKind::MultipleChoice { options }) => options,
            _ => return Err(FormError::NotMultipleChoice(item)),
        };
        if !options.iter().any(|o| o.value == option) {
            return Err(FormError::UnknownOption {
                item,
                option: option.to_string(),
            });
        }

        let current: Vec<String> = self
            .responses
            .get(item)
            .and_then(ResponseValue::as_list)
            .map(<[String]>::to_vec)
            .unwrap_or_default();
        let was_selected = current.iter().any(|v| v == option);
        let selected: Vec<String> = options
            .iter()
            .map(|o| &o.value)
            .filter(|v| {
                if v.as_str() == option {
                    !was_selected
                } else {
                    current.contains(*v)
                }
            })
            .cloned()
            .collect();

        self.responses.set(item, ResponseValue::List(selected));
        self.clear_error(item);
        Ok(())
    }

    pub fn view(&self) -> FormView {
        let sections = self
            .template
            .sections_in_order()
            .into_iter()
            .map(|section| SectionView {
                id: section.id,
                title: section.title.clone(),
                description: section.description.clone(),
                section_type: section.section_type.clone(),
                items: section
                    .items_in_order()
                    .into_iter()
                    .map(|item| ItemView {
                        id: item.id,
                        label: item.label.clone(),
                        description: item.description.clone(),
                        required: item.required,
                        affordance: affordance_for(&item.kind),
                        value: self.responses.get(item.id).cloned(),
                        error: self.errors.get(&item.id).cloned(),
                    })
                    .collect(),
            })
            .collect();

        FormView {
            instance_id: self.instance_id,
            template_id: self.template.id,
            template_version: self.template.version,
            name: self.template.name.clone(),
            sections,
            progress: self.progress(),
            score: self.score(),
            focus: self.focus,
            in_flight: self.in_flight,
            submitted: self.submitted,
            can_submit: self.can_submit(),
            can_save_draft: self.can_save_draft(),
        }
    }

    /// Guard and snapshot a draft save. No validation runs.
    pub fn begin_save_draft(&mut self) -> Result<DraftHandoff, FormError> {
        self.check_idle()?;
        let store = self
            .handoffs
            .drafts
            .clone()
            .ok_or(FormError::DraftsUnavailable)?;

        self.in_flight = Some(HandoffKind::DraftSave);
        Ok(DraftHandoff {
            store,
            draft: Draft {
                instance_id: self.instance_id,
                template_id: self.template.id,
                template_version: self.template.version,
                responses: self.responses.clone(),
                saved_at: jiff::Timestamp::now(),
            },
        })
    }

    pub fn finish_save_draft(&mut self, result: Result<(), HandoffError>) -> Result<(), FormError> {
        self.finish(HandoffKind::DraftSave)?;
        match result {
            Ok(()) => {
                debug!(instance_id = %self.instance_id, "draft saved");
                Ok(())
            }
            Err(e) => {
                warn!(instance_id = %self.instance_id, error = %e, "draft save failed");
                Err(FormError::Handoff(e))
            }
        }
    }

    pub async fn save_draft(&mut self) -> Result<(), FormError> {
        let handoff = self.begin_save_draft()?;
        let guard = InFlight::new(self, HandoffKind::DraftSave);
        let result = handoff.send().await;
        guard.session.finish_save_draft(result)
    }

    /// Validate every item of the template. On failure the error map and
    /// focus are recorded and nothing is handed off; on success the
    /// submission is snapshotted and marked in flight.
    pub fn begin_submit(&mut self) -> Result<SubmitStep, FormError> {
        self.check_idle()?;

        let errors = validate::validate_all(&self.template, &self.responses);
        if let Some(first_invalid) = validate::first_invalid(&self.template, &errors) {
            info!(
                instance_id = %self.instance_id,
                errors = errors.len(),
                first_invalid = %first_invalid,
                "submission rejected"
            );
            self.errors = errors.clone();
            self.focus = Some(first_invalid);
            return Ok(SubmitStep::Rejected(Rejection {
                first_invalid,
                errors,
            }));
        }

        self.errors.clear();
        self.focus = None;
        self.in_flight = Some(HandoffKind::Submit);
        Ok(SubmitStep::Ready(SubmitHandoff {
            store: self.handoffs.submissions.clone(),
            submission: Submission {
                instance_id: self.instance_id,
                template_id: self.template.id,
                template_version: self.template.version,
                responses: self.responses.clone(),
                score: self.score(),
                submitted_at: jiff::Timestamp::now(),
            },
        }))
    }

    /// Record the outcome of a submission hand-off. A failure leaves the
    /// response set untouched so the user can retry.
    pub fn finish_submit(&mut self, result: Result<(), HandoffError>) -> Result<(), FormError> {
        self.finish(HandoffKind::Submit)?;
        match result {
            Ok(()) => {
                self.submitted = true;
                info!(
                    instance_id = %self.instance_id,
                    template_id = %self.template.id,
                    version = self.template.version,
                    "submission handed off"
                );
                Ok(())
            }
            Err(e) => {
                warn!(instance_id = %self.instance_id, error = %e, "submission failed");
                Err(FormError::Handoff(e))
            }
        }
    }

    pub async fn submit(&mut self) -> Result<SubmitOutcome, FormError> {
        let handoff = match self.begin_submit()? {
            SubmitStep::Rejected(rejection) => return Ok(SubmitOutcome::Rejected { rejection }),
            SubmitStep::Ready(handoff) => handoff,
        };
        let guard = InFlight::new(self, HandoffKind::Submit);
        let result = handoff.send().await;
        guard.session.finish_submit(result)?;
        Ok(SubmitOutcome::Submitted {
            submission: handoff.into_submission(),
        })
    }

    /// Release a hand-off whose outcome will never be reported, such as
    /// one whose `send` was cancelled. Responses are untouched and the
    /// hand-off can be retried. A no-op when `kind` is not in flight.
    pub fn abandon_handoff(&mut self, kind: HandoffKind) {
        if self.in_flight == Some(kind) {
            self.in_flight = None;
            warn!(instance_id = %self.instance_id, handoff = %kind, "hand-off abandoned");
        }
    }

    fn check_editable(&self, item: ItemId) -> Result<(), FormError> {
        if self.submitted {
            return Err(FormError::Finalized(self.instance_id));
        }
        if self.in_flight == Some(HandoffKind::Submit) {
            return Err(FormError::HandoffInFlight(HandoffKind::Submit));
        }
        if self.template.item(item).is_none() {
            return Err(FormError::UnknownItem(item));
        }
        Ok(())
    }

    fn check_idle(&self) -> Result<(), FormError> {
        if self.submitted {
            return Err(FormError::Finalized(self.instance_id));
        }
        if let Some(kind) = self.in_flight {
            return Err(FormError::HandoffInFlight(kind));
        }
        Ok(())
    }

    fn finish(&mut self, kind: HandoffKind) -> Result<(), FormError> {
        if self.in_flight != Some(kind) {
            return Err(FormError::NotInFlight(kind));
        }
        self.in_flight = None;
        Ok(())
    }

    fn clear_error(&mut self, item: ItemId) {
        self.errors.remove(&item);
        if self.focus == Some(item) {
            self.focus = None;
        }
    }
}

/// Releases an in-flight hand-off if the future awaiting it is dropped
/// before its outcome is recorded.
struct InFlight<'a> {
    session: &'a mut FormSession,
    kind: HandoffKind,
}

impl<'a> InFlight<'a> {
    fn new(session: &'a mut FormSession, kind: HandoffKind) -> Self {
        Self { session, kind }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.session.abandon_handoff(self.kind);
    }
}

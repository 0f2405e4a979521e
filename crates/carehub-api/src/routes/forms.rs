use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use carehub_core::models::ids::{InstanceId, ItemId, TemplateId};
use carehub_core::models::response::{ResponseSet, ResponseValue};
use carehub_forms::error::HandoffKind;
use carehub_forms::handoff::Submission;
use carehub_forms::session::{FormView, SubmitStep};
use carehub_forms::{FormSession, SubmitOutcome};
use serde::Deserialize;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::routes::templates::load_template;
use crate::state::AppState;

/// Either start a new instance of a template or reopen a saved draft.
#[derive(Deserialize)]
pub struct OpenForm {
    #[serde(default)]
    template_id: Option<TemplateId>,
    #[serde(default)]
    instance_id: Option<InstanceId>,
    #[serde(default)]
    responses: ResponseSet,
}

type Sessions = HashMap<InstanceId, FormSession>;

fn session_mut(sessions: &mut Sessions, id: InstanceId) -> Result<&mut FormSession, ApiError> {
    sessions
        .get_mut(&id)
        .ok_or_else(|| ApiError::NotFound(format!("form not found: {id}")))
}

/// Lock the open sessions, provided `id` is one of them. A form that is no
/// longer open because it was submitted is a conflict, anything else is
/// not found.
async fn lock_open(state: &AppState, id: InstanceId) -> Result<MutexGuard<'_, Sessions>, ApiError> {
    let sessions = state.sessions.lock().await;
    if sessions.contains_key(&id) {
        return Ok(sessions);
    }
    drop(sessions);
    Err(closed(state, id).await)
}

async fn closed(state: &AppState, id: InstanceId) -> ApiError {
    match state.handoffs.submissions.load_submission(id).await {
        Ok(Some(_)) => ApiError::Conflict(format!("form already submitted: {id}")),
        Ok(None) => ApiError::NotFound(format!("form not found: {id}")),
        Err(e) => e.into(),
    }
}

/// Releases a session's outstanding hand-off when the request carrying it is
/// dropped before the outcome is recorded.
struct PendingHandoff {
    sessions: Arc<Mutex<Sessions>>,
    id: InstanceId,
    kind: HandoffKind,
    armed: bool,
}

impl PendingHandoff {
    fn new(state: &AppState, id: InstanceId, kind: HandoffKind) -> Self {
        Self {
            sessions: state.sessions.clone(),
            id,
            kind,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingHandoff {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let (id, kind) = (self.id, self.kind);
        if let Ok(mut sessions) = self.sessions.try_lock() {
            if let Some(session) = sessions.get_mut(&id) {
                session.abandon_handoff(kind);
            }
            return;
        }
        // Lock is busy; release from a task instead of blocking in drop.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let sessions = self.sessions.clone();
            handle.spawn(async move {
                if let Some(session) = sessions.lock().await.get_mut(&id) {
                    session.abandon_handoff(kind);
                }
            });
        }
    }
}

pub async fn open_form(
    State(state): State<AppState>,
    Json(req): Json<OpenForm>,
) -> Result<(StatusCode, Json<FormView>), ApiError> {
    let session = match (req.instance_id, req.template_id) {
        (Some(instance), _) => {
            if let Some(open) = state.sessions.lock().await.get(&instance) {
                return Ok((StatusCode::OK, Json(open.view())));
            }
            if state
                .handoffs
                .submissions
                .load_submission(instance)
                .await?
                .is_some()
            {
                return Err(ApiError::Conflict(format!(
                    "form already submitted: {instance}"
                )));
            }
            resume(&state, instance).await?
        }
        (None, Some(template_id)) => {
            let template = load_template(&state, template_id).await?.template;
            FormSession::start(Arc::new(template), req.responses, state.handoffs.clone())?
        }
        (None, None) => {
            return Err(ApiError::BadRequest(
                "either template_id or instance_id is required".to_string(),
            ));
        }
    };

    let view = session.view();
    info!(
        instance_id = %view.instance_id,
        template_id = %view.template_id,
        version = view.template_version,
        "form opened"
    );
    state.sessions.lock().await.insert(view.instance_id, session);
    Ok((StatusCode::CREATED, Json(view)))
}

/// Reopen a draft against the template version it was saved under.
async fn resume(state: &AppState, instance: InstanceId) -> Result<FormSession, ApiError> {
    let draft = state
        .drafts
        .load_draft(instance)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("draft not found: {instance}")))?;

    let template = match state
        .templates
        .load_template_version(draft.template_id, draft.template_version)
        .await?
    {
        Some(template) => template,
        None => load_template(state, draft.template_id).await?.template,
    };

    Ok(FormSession::resume(
        instance,
        Arc::new(template),
        draft.responses,
        state.handoffs.clone(),
    ))
}

pub async fn get_form(
    State(state): State<AppState>,
    Path(id): Path<InstanceId>,
) -> Result<Json<FormView>, ApiError> {
    let mut sessions = lock_open(&state, id).await?;
    Ok(Json(session_mut(&mut sessions, id)?.view()))
}

/// Close an open form without submitting it. A saved draft stays resumable.
pub async fn close_form(
    State(state): State<AppState>,
    Path(id): Path<InstanceId>,
) -> Result<StatusCode, ApiError> {
    let mut sessions = lock_open(&state, id).await?;
    sessions.remove(&id);
    info!(instance_id = %id, "form closed");
    Ok(StatusCode::NO_CONTENT)
}

/// The stored submission of a form, once it has been submitted.
pub async fn get_submission(
    State(state): State<AppState>,
    Path(id): Path<InstanceId>,
) -> Result<Json<Submission>, ApiError> {
    state
        .handoffs
        .submissions
        .load_submission(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("submission not found: {id}")))
}

/// Set one item's value. A JSON `null` clears it.
pub async fn put_response(
    State(state): State<AppState>,
    Path((id, item)): Path<(InstanceId, ItemId)>,
    Json(value): Json<ResponseValue>,
) -> Result<Json<FormView>, ApiError> {
    let mut sessions = lock_open(&state, id).await?;
    let session = session_mut(&mut sessions, id)?;
    match value {
        ResponseValue::Null => session.clear_value(item)?,
        value => session.set_value(item, value)?,
    }
    Ok(Json(session.view()))
}

pub async fn save_draft(
    State(state): State<AppState>,
    Path(id): Path<InstanceId>,
) -> Result<Json<FormView>, ApiError> {
    let handoff = {
        let mut sessions = lock_open(&state, id).await?;
        session_mut(&mut sessions, id)?.begin_save_draft()?
    };
    let pending = PendingHandoff::new(&state, id, HandoffKind::DraftSave);

    let result = handoff.send().await;

    let mut sessions = lock_open(&state, id).await?;
    let session = session_mut(&mut sessions, id)?;
    let finished = session.finish_save_draft(result);
    pending.disarm();
    finished?;
    Ok(Json(session.view()))
}

/// Submit the form. A validation rejection is a 422 carrying the error map.
/// A stored submission closes the form; it is then served by
/// [`get_submission`].
pub async fn submit_form(
    State(state): State<AppState>,
    Path(id): Path<InstanceId>,
) -> Result<(StatusCode, Json<SubmitOutcome>), ApiError> {
    let step = {
        let mut sessions = lock_open(&state, id).await?;
        session_mut(&mut sessions, id)?.begin_submit()?
    };

    let handoff = match step {
        SubmitStep::Rejected(rejection) => {
            return Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(SubmitOutcome::Rejected { rejection }),
            ));
        }
        SubmitStep::Ready(handoff) => handoff,
    };
    let pending = PendingHandoff::new(&state, id, HandoffKind::Submit);

    let result = handoff.send().await;

    {
        let mut sessions = lock_open(&state, id).await?;
        let finished = session_mut(&mut sessions, id)?.finish_submit(result);
        pending.disarm();
        finished?;
        sessions.remove(&id);
        debug!(instance_id = %id, "submitted form closed");
    }

    Ok((
        StatusCode::OK,
        Json(SubmitOutcome::Submitted {
            submission: handoff.into_submission(),
        }),
    ))
}

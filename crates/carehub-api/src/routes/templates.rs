use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use carehub_core::models::ids::TemplateId;
use carehub_core::models::template::{TemplateCategory, TemplateDefinition};
use carehub_forms::builder::Applied;
use carehub_forms::handoff::StoredTemplate;
use carehub_forms::{TemplateBuilder, TemplateEdit};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateTemplate {
    name: String,
    category: TemplateCategory,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Serialize)]
pub struct EditResult {
    template: TemplateDefinition,
    applied: Vec<Applied>,
}

#[derive(Deserialize)]
pub struct SetEnabled {
    enabled: bool,
}

/// Load a template with the revision later saves must match.
pub(crate) async fn load_template(
    state: &AppState,
    id: TemplateId,
) -> Result<StoredTemplate, ApiError> {
    state
        .templates
        .load_template(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("template not found: {id}")))
}

pub async fn list_templates(
    State(state): State<AppState>,
) -> Result<Json<Vec<TemplateDefinition>>, ApiError> {
    Ok(Json(state.templates.list_templates().await?))
}

pub async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<TemplateId>,
) -> Result<Json<TemplateDefinition>, ApiError> {
    Ok(Json(load_template(&state, id).await?.template))
}

pub async fn create_template(
    State(state): State<AppState>,
    Json(req): Json<CreateTemplate>,
) -> Result<(StatusCode, Json<TemplateDefinition>), ApiError> {
    let mut builder = TemplateBuilder::create(req.name, req.category);
    builder.set_description(req.description);
    let template = builder.into_template();
    state.templates.save_template(&template, None).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

/// Apply a batch of edits. Either every edit applies and the result is
/// saved, or nothing is. A concurrent save since the load is a conflict.
pub async fn apply_edits(
    State(state): State<AppState>,
    Path(id): Path<TemplateId>,
    Json(edits): Json<Vec<TemplateEdit>>,
) -> Result<Json<EditResult>, ApiError> {
    let stored = load_template(&state, id).await?;
    let mut builder = TemplateBuilder::edit(stored.template);
    let applied = edits
        .into_iter()
        .map(|edit| builder.apply(edit))
        .collect::<Result<Vec<_>, _>>()?;

    let template = builder.into_template();
    state
        .templates
        .save_template(&template, Some(&stored.revision))
        .await?;
    Ok(Json(EditResult { template, applied }))
}

pub async fn publish_template(
    State(state): State<AppState>,
    Path(id): Path<TemplateId>,
) -> Result<Json<TemplateDefinition>, ApiError> {
    let stored = load_template(&state, id).await?;
    let mut builder = TemplateBuilder::edit(stored.template);
    builder.publish()?;
    let template = builder.into_template();
    state
        .templates
        .save_template(&template, Some(&stored.revision))
        .await?;
    Ok(Json(template))
}

pub async fn set_enabled(
    State(state): State<AppState>,
    Path(id): Path<TemplateId>,
    Json(req): Json<SetEnabled>,
) -> Result<Json<TemplateDefinition>, ApiError> {
    let stored = load_template(&state, id).await?;
    let mut builder = TemplateBuilder::edit(stored.template);
    builder.set_enabled(req.enabled);
    let template = builder.into_template();
    state
        .templates
        .save_template(&template, Some(&stored.revision))
        .await?;
    Ok(Json(template))
}

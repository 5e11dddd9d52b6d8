use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use smo_core::Actor;
use smo_domain::Stage;

use crate::dto::{
    AdvanceStageRequest, EditManifestRequest, JustificationRequest, ManifestChangeResponse,
    RegisterManifestRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn register_manifest_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<RegisterManifestRequest>,
) -> ApiResult<(StatusCode, Json<ManifestChangeResponse>)> {
    let change = state
        .manifest_service
        .register(&actor, payload.into())
        .await?;

    Ok((StatusCode::CREATED, Json(ManifestChangeResponse::from(change))))
}

pub async fn edit_manifest_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(manifest_id): Path<String>,
    Json(payload): Json<EditManifestRequest>,
) -> ApiResult<Json<ManifestChangeResponse>> {
    let change = state
        .manifest_service
        .edit(&actor, manifest_id.as_str(), payload.into())
        .await?;

    Ok(Json(ManifestChangeResponse::from(change)))
}

pub async fn cancel_manifest_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(manifest_id): Path<String>,
    Json(payload): Json<JustificationRequest>,
) -> ApiResult<Json<ManifestChangeResponse>> {
    let change = state
        .manifest_service
        .cancel(&actor, manifest_id.as_str(), payload.justification.as_str())
        .await?;

    Ok(Json(ManifestChangeResponse::from(change)))
}

pub async fn void_manifest_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(manifest_id): Path<String>,
    Json(payload): Json<JustificationRequest>,
) -> ApiResult<Json<ManifestChangeResponse>> {
    let change = state
        .manifest_service
        .void(&actor, manifest_id.as_str(), payload.justification.as_str())
        .await?;

    Ok(Json(ManifestChangeResponse::from(change)))
}

pub async fn deliver_manifest_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(manifest_id): Path<String>,
) -> ApiResult<Json<ManifestChangeResponse>> {
    let change = state
        .manifest_service
        .deliver(&actor, manifest_id.as_str())
        .await?;

    Ok(Json(ManifestChangeResponse::from(change)))
}

pub async fn advance_manifest_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(manifest_id): Path<String>,
    Json(payload): Json<AdvanceStageRequest>,
) -> ApiResult<Json<ManifestChangeResponse>> {
    let stage = payload.stage.parse::<Stage>()?;
    let change = state
        .manifest_service
        .advance(&actor, manifest_id.as_str(), stage)
        .await?;

    Ok(Json(ManifestChangeResponse::from(change)))
}

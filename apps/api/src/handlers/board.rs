use axum::Json;
use axum::extract::{Path, State};

use crate::dto::{BoardResponse, ManifestHistoryResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn board_handler(State(state): State<AppState>) -> ApiResult<Json<BoardResponse>> {
    let snapshot = state.board_service.load_board().await?;

    Ok(Json(BoardResponse::from(snapshot)))
}

pub async fn manifest_history_handler(
    State(state): State<AppState>,
    Path(manifest_id): Path<String>,
) -> ApiResult<Json<ManifestHistoryResponse>> {
    let history = state
        .board_service
        .manifest_history(manifest_id.as_str())
        .await?;

    Ok(Json(ManifestHistoryResponse::from(history)))
}

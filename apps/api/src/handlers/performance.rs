use axum::Json;
use axum::extract::{Query, State};
use chrono::NaiveDate;
use smo_core::AppError;
use smo_domain::ReportPeriod;

use crate::dto::{PerformanceQueryRequest, PerformanceReportResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn performance_report_handler(
    State(state): State<AppState>,
    Query(query): Query<PerformanceQueryRequest>,
) -> ApiResult<Json<PerformanceReportResponse>> {
    let date = match query.date.as_deref() {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|error| {
            AppError::Validation(format!("invalid date '{raw}': {error}"))
        })?,
        None => state.board_service.now().date(),
    };
    let period = match query.period.as_deref() {
        Some(raw) => raw.parse::<ReportPeriod>()?,
        None => ReportPeriod::Day,
    };

    let report = state.performance_service.report(period, date).await?;

    Ok(Json(PerformanceReportResponse::from(report)))
}

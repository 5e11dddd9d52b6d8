use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use chrono::{NaiveDate, NaiveDateTime};
use smo_application::{
    BoardService, Clock, DEFAULT_BOARD_FETCH_LIMIT, ManifestService, PerformanceService,
};
use smo_core::{Actor, AppError};
use smo_infrastructure::{InMemoryManifestRepository, InMemoryPerformanceLogRepository};

use crate::dto::{
    AdvanceStageRequest, EditManifestRequest, JustificationRequest, PerformanceQueryRequest,
    RegisterManifestRequest,
};
use crate::error::ApiError;
use crate::state::AppState;

use super::board::{board_handler, manifest_history_handler};
use super::health::health_handler;
use super::manifests::{
    advance_manifest_handler, cancel_manifest_handler, deliver_manifest_handler,
    edit_manifest_handler, register_manifest_handler, void_manifest_handler,
};
use super::performance::performance_report_handler;

struct FixedClock(NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 12, 25)
        .and_then(|date| date.and_hms_opt(10, 0, 0))
        .unwrap_or_else(|| unreachable!())
}

fn test_state() -> AppState {
    let clock: Arc<dyn Clock> = Arc::new(FixedClock(now()));
    let repository = Arc::new(InMemoryManifestRepository::new());
    let performance_service = PerformanceService::new(
        Arc::new(InMemoryPerformanceLogRepository::new()),
        clock.clone(),
    );

    AppState {
        board_service: BoardService::new(
            repository.clone(),
            repository.clone(),
            clock.clone(),
            DEFAULT_BOARD_FETCH_LIMIT,
        ),
        manifest_service: ManifestService::new(
            repository.clone(),
            repository,
            performance_service.clone(),
            clock,
        ),
        performance_service,
    }
}

fn actor() -> Extension<Actor> {
    let actor = Actor::new("joana.s", Some("Joana Souza".to_owned()))
        .unwrap_or_else(|_| unreachable!());
    Extension(actor)
}

fn register_request(id: &str) -> RegisterManifestRequest {
    RegisterManifestRequest {
        id: id.to_owned(),
        carrier: "latam".to_owned(),
        shift: "1º Turno".to_owned(),
        cargo_inh: 3,
        cargo_iz: 1,
        pulled: Some("25/12/2024 08:30".to_owned()),
        received: Some("25/12/2024 09:15".to_owned()),
    }
}

async fn register(state: &AppState, id: &str) {
    let result =
        register_manifest_handler(State(state.clone()), actor(), Json(register_request(id))).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn health_reports_ok() {
    let Json(response) = health_handler().await;
    assert_eq!(response.status, "ok");
}

#[tokio::test]
async fn registered_manifest_lands_in_received_column() {
    let state = test_state();

    let (status, Json(change)) =
        register_manifest_handler(State(state.clone()), actor(), Json(register_request("LA-0042")))
            .await
            .unwrap_or_else(|_| unreachable!());
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(change.manifest.carrier, "Latam");
    assert_eq!(change.manifest.short_id, "0042");
    assert_eq!(change.manifest.stage.as_deref(), Some("recebido"));
    assert_eq!(change.event.action, "Registro");

    let Json(board) = board_handler(State(state))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(board.total, 1);
    assert_eq!(board.columns.len(), 6);
    assert_eq!(board.columns[0].stage, "recebido");
    assert_eq!(board.columns[0].cards.len(), 1);
    assert_eq!(board.columns[0].cards[0].shift_label, "1º T");
    assert_eq!(board.columns[0].cards[0].elapsed, "00:45:00");
}

#[tokio::test]
async fn duplicate_registration_is_a_conflict() {
    let state = test_state();
    register(&state, "LA-0042").await;

    let result =
        register_manifest_handler(State(state), actor(), Json(register_request("LA-0042"))).await;

    assert!(matches!(result, Err(ApiError(AppError::Conflict(_)))));
}

#[tokio::test]
async fn advance_moves_card_and_starts_its_clock() {
    let state = test_state();
    register(&state, "LA-0042").await;

    let Json(change) = advance_manifest_handler(
        State(state.clone()),
        actor(),
        Path("LA-0042".to_owned()),
        Json(AdvanceStageRequest {
            stage: "iniciado".to_owned(),
        }),
    )
    .await
    .unwrap_or_else(|_| unreachable!());
    assert_eq!(change.manifest.status, "Manifesto Iniciado");
    assert_eq!(change.event.action, "Atualização de Status");

    let Json(board) = board_handler(State(state))
        .await
        .unwrap_or_else(|_| unreachable!());
    let started = board
        .columns
        .iter()
        .find(|column| column.stage == "iniciado")
        .unwrap_or_else(|| unreachable!());
    assert_eq!(started.cards.len(), 1);
    assert_eq!(started.cards[0].elapsed, "00:00:00");
}

#[tokio::test]
async fn unknown_stage_is_rejected() {
    let state = test_state();
    register(&state, "LA-0042").await;

    let result = advance_manifest_handler(
        State(state),
        actor(),
        Path("LA-0042".to_owned()),
        Json(AdvanceStageRequest {
            stage: "entregue".to_owned(),
        }),
    )
    .await;

    assert!(matches!(result, Err(ApiError(AppError::Validation(_)))));
}

#[tokio::test]
async fn edit_shows_field_diff_in_history() {
    let state = test_state();
    register(&state, "LA-0042").await;

    let edited = edit_manifest_handler(
        State(state.clone()),
        actor(),
        Path("LA-0042".to_owned()),
        Json(EditManifestRequest {
            carrier: "Latam".to_owned(),
            cargo_inh: 5,
            cargo_iz: 1,
            pulled: None,
            received: None,
            justification: "recontagem".to_owned(),
        }),
    )
    .await;
    assert!(edited.is_ok());

    let Json(history) =
        manifest_history_handler(State(state), Path("LA-0042".to_owned()))
            .await
            .unwrap_or_else(|_| unreachable!());
    assert_eq!(history.manifest.cargo_inh, 5);
    assert_eq!(history.timeline[0].value, "25/12/2024, 08:30:00");
    assert_eq!(history.timeline[1].value, "25/12/2024, 09:15:00");
    assert_eq!(history.events.len(), 2);
    assert_eq!(history.events[1].action, "Edição de Dados");
    assert_eq!(history.events[1].changes.len(), 1);
    assert_eq!(history.events[1].changes[0].old_value, "3");
    assert_eq!(history.events[1].changes[0].new_value, "5");
}

#[tokio::test]
async fn cancel_hides_card_and_void_restores_it() {
    let state = test_state();
    register(&state, "LA-0042").await;

    let cancelled = cancel_manifest_handler(
        State(state.clone()),
        actor(),
        Path("LA-0042".to_owned()),
        Json(JustificationRequest {
            justification: "voo cancelado".to_owned(),
        }),
    )
    .await;
    assert!(cancelled.is_ok());

    let Json(board) = board_handler(State(state.clone()))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(board.total, 0);
    assert_eq!(board.excluded, 1);

    let Json(voided) = void_manifest_handler(
        State(state.clone()),
        actor(),
        Path("LA-0042".to_owned()),
        Json(JustificationRequest {
            justification: "cancelado por engano".to_owned(),
        }),
    )
    .await
    .unwrap_or_else(|_| unreachable!());
    assert_eq!(voided.manifest.status, "Manifesto Recebido");
    assert_eq!(voided.event.action, "Anulação");

    let Json(board) = board_handler(State(state))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(board.total, 1);
}

#[tokio::test]
async fn blank_cancellation_justification_is_rejected() {
    let state = test_state();
    register(&state, "LA-0042").await;

    let result = cancel_manifest_handler(
        State(state),
        actor(),
        Path("LA-0042".to_owned()),
        Json(JustificationRequest {
            justification: "   ".to_owned(),
        }),
    )
    .await;

    assert!(matches!(result, Err(ApiError(AppError::Validation(_)))));
}

#[tokio::test]
async fn delivering_twice_is_a_conflict() {
    let state = test_state();
    register(&state, "LA-0042").await;

    let first =
        deliver_manifest_handler(State(state.clone()), actor(), Path("LA-0042".to_owned())).await;
    assert!(first.is_ok());

    let second =
        deliver_manifest_handler(State(state), actor(), Path("LA-0042".to_owned())).await;
    assert!(matches!(second, Err(ApiError(AppError::Conflict(_)))));
}

#[tokio::test]
async fn history_of_unknown_manifest_is_not_found() {
    let result = manifest_history_handler(State(test_state()), Path("nope".to_owned())).await;

    assert!(matches!(result, Err(ApiError(AppError::NotFound(_)))));
}

#[tokio::test]
async fn performance_report_counts_recorded_operations() {
    let state = test_state();
    register(&state, "LA-0042").await;
    register(&state, "AD-0007").await;

    let Json(report) = performance_report_handler(
        State(state.clone()),
        Query(PerformanceQueryRequest {
            date: None,
            period: None,
        }),
    )
    .await
    .unwrap_or_else(|_| unreachable!());
    assert_eq!(report.period, "day");
    assert_eq!(report.label, "2024-12-25");
    assert_eq!(report.totals.total_requests, 2);
    assert_eq!(report.totals.registrations, 2);
    assert_eq!(report.totals.unique_users, vec!["joana.s".to_owned()]);
    assert_eq!(report.totals.hourly_requests.get("10"), Some(&2));

    let Json(month) = performance_report_handler(
        State(state),
        Query(PerformanceQueryRequest {
            date: Some("2024-12-01".to_owned()),
            period: Some("month".to_owned()),
        }),
    )
    .await
    .unwrap_or_else(|_| unreachable!());
    assert_eq!(month.label, "2024-12");
    assert_eq!(month.from, "2024-12-01");
    assert_eq!(month.to, "2024-12-31");
    assert_eq!(month.totals.total_requests, 2);
}

#[tokio::test]
async fn malformed_report_query_is_rejected() {
    let bad_date = performance_report_handler(
        State(test_state()),
        Query(PerformanceQueryRequest {
            date: Some("25/12/2024".to_owned()),
            period: None,
        }),
    )
    .await;
    assert!(matches!(bad_date, Err(ApiError(AppError::Validation(_)))));

    let bad_period = performance_report_handler(
        State(test_state()),
        Query(PerformanceQueryRequest {
            date: None,
            period: Some("year".to_owned()),
        }),
    )
    .await;
    assert!(matches!(bad_period, Err(ApiError(AppError::Validation(_)))));
}

#[tokio::test]
async fn board_payload_serializes_with_snake_case_keys() {
    let state = test_state();
    register(&state, "LA-0042").await;

    let Json(board) = board_handler(State(state))
        .await
        .unwrap_or_else(|_| unreachable!());
    let payload = serde_json::to_value(&board).unwrap_or_else(|_| unreachable!());

    assert_eq!(payload["rendered_at"], "25/12/2024 10:00:00");
    assert_eq!(payload["columns"][0]["title"], "Recebido");
    assert_eq!(payload["columns"][0]["cards"][0]["elapsed_short"], "00:45");
}

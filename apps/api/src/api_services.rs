use std::sync::Arc;

use smo_application::{BoardService, Clock, ManifestService, PerformanceService};
use smo_core::AppError;
use smo_infrastructure::{
    PostgresManifestRepository, PostgresPerformanceLogRepository, SystemClock,
};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::state::AppState;

pub async fn connect_and_migrate(database_url: &str) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    Ok(pool)
}

pub fn build_app_state(pool: PgPool, board_fetch_limit: usize) -> AppState {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let manifest_repository = Arc::new(PostgresManifestRepository::new(pool.clone()));
    let performance_service = PerformanceService::new(
        Arc::new(PostgresPerformanceLogRepository::new(pool)),
        clock.clone(),
    );

    AppState {
        board_service: BoardService::new(
            manifest_repository.clone(),
            manifest_repository.clone(),
            clock.clone(),
            board_fetch_limit,
        ),
        manifest_service: ManifestService::new(
            manifest_repository.clone(),
            manifest_repository,
            performance_service.clone(),
            clock,
        ),
        performance_service,
    }
}

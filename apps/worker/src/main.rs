//! SMO board monitor.
//!
//! Refreshes the cached board from the store on one cadence and recomputes
//! elapsed counters on a faster tick, warning about stalled manifests.

#![forbid(unsafe_code)]

mod board_monitor;

use std::env;
use std::sync::Arc;
use std::time::Duration;

use smo_application::{BoardService, DEFAULT_BOARD_FETCH_LIMIT};
use smo_core::{AppError, AppResult};
use smo_infrastructure::{PostgresManifestRepository, SystemClock};

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::board_monitor::BoardMonitor;

#[derive(Debug, Clone, PartialEq, Eq)]
struct WorkerConfig {
    database_url: String,
    board_fetch_limit: usize,
    refresh_interval_ms: u64,
    tick_interval_ms: u64,
    stall_threshold_minutes: u64,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = WorkerConfig::load()?;
    let pool = connect_pool(config.database_url.as_str()).await?;
    let board_service = build_board_service(pool, config.board_fetch_limit);
    let mut monitor = BoardMonitor::new(
        board_service,
        config.stall_threshold_minutes.saturating_mul(60),
    );

    info!(
        board_fetch_limit = config.board_fetch_limit,
        refresh_interval_ms = config.refresh_interval_ms,
        tick_interval_ms = config.tick_interval_ms,
        stall_threshold_minutes = config.stall_threshold_minutes,
        "smo-worker started"
    );

    run_until(
        &mut monitor,
        Duration::from_millis(config.refresh_interval_ms),
        Duration::from_millis(config.tick_interval_ms),
        shutdown_signal(),
    )
    .await;

    info!("smo-worker shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(error = %error, "failed to listen for ctrl-c, running until killed");
        std::future::pending::<()>().await;
    }
}

/// Drives both cadences until `shutdown` resolves. The shutdown future is
/// created once and polled across iterations, so a signal is never lost
/// between ticks.
async fn run_until(
    monitor: &mut BoardMonitor,
    refresh_every: Duration,
    tick_every: Duration,
    shutdown: impl Future<Output = ()>,
) {
    let mut refresh = tokio::time::interval(refresh_every);
    refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut tick = tokio::time::interval(tick_every);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = refresh.tick() => {
                if let Err(error) = monitor.refresh().await {
                    warn!(error = %error, "failed to refresh board");
                }
            }
            _ = tick.tick() => {
                let now = monitor.now();
                for card in monitor.tick(now) {
                    warn!(
                        manifest_id = %card.id,
                        carrier = %card.carrier,
                        elapsed = %card.elapsed,
                        "manifest stalled on board"
                    );
                }
            }
            () = &mut shutdown => return,
        }
    }
}

async fn connect_pool(database_url: &str) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))
}

fn build_board_service(pool: PgPool, board_fetch_limit: usize) -> BoardService {
    let repository = Arc::new(PostgresManifestRepository::new(pool));

    BoardService::new(
        repository.clone(),
        repository,
        Arc::new(SystemClock),
        board_fetch_limit,
    )
}

impl WorkerConfig {
    fn load() -> AppResult<Self> {
        Self::from_values(required_env("DATABASE_URL")?, |name| env::var(name).ok())
    }

    fn from_values(
        database_url: String,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> AppResult<Self> {
        let board_fetch_limit = parse_positive(
            "BOARD_FETCH_LIMIT",
            lookup("BOARD_FETCH_LIMIT"),
            DEFAULT_BOARD_FETCH_LIMIT as u64,
        )?;
        let refresh_interval_ms = parse_positive(
            "BOARD_REFRESH_INTERVAL_MS",
            lookup("BOARD_REFRESH_INTERVAL_MS"),
            5_000,
        )?;
        let tick_interval_ms = parse_positive(
            "BOARD_TICK_INTERVAL_MS",
            lookup("BOARD_TICK_INTERVAL_MS"),
            1_000,
        )?;
        let stall_threshold_minutes = parse_positive(
            "BOARD_STALL_THRESHOLD_MINUTES",
            lookup("BOARD_STALL_THRESHOLD_MINUTES"),
            120,
        )?;

        Ok(Self {
            database_url,
            board_fetch_limit: usize::try_from(board_fetch_limit).map_err(|error| {
                AppError::Validation(format!("invalid BOARD_FETCH_LIMIT value: {error}"))
            })?,
            refresh_interval_ms,
            tick_interval_ms,
            stall_threshold_minutes,
        })
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn parse_positive(name: &str, raw: Option<String>, default: u64) -> AppResult<u64> {
    let value = match raw {
        Some(value) => value.trim().parse::<u64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        })?,
        None => default,
    };

    if value == 0 {
        return Err(AppError::Validation(format!(
            "{name} must be greater than zero"
        )));
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use smo_application::BoardService;
    use smo_core::AppError;
    use smo_infrastructure::{InMemoryManifestRepository, SystemClock};

    use super::{BoardMonitor, WorkerConfig, run_until};

    fn load(values: &[(&str, &str)]) -> Result<WorkerConfig, AppError> {
        let values: HashMap<String, String> = values
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect();
        WorkerConfig::from_values("postgres://localhost/smo".to_owned(), |name| {
            values.get(name).cloned()
        })
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = load(&[]).unwrap_or_else(|_| unreachable!());

        assert_eq!(config.board_fetch_limit, 200);
        assert_eq!(config.refresh_interval_ms, 5_000);
        assert_eq!(config.tick_interval_ms, 1_000);
        assert_eq!(config.stall_threshold_minutes, 120);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = load(&[
            ("BOARD_FETCH_LIMIT", "50"),
            ("BOARD_REFRESH_INTERVAL_MS", " 10000 "),
            ("BOARD_STALL_THRESHOLD_MINUTES", "45"),
        ])
        .unwrap_or_else(|_| unreachable!());

        assert_eq!(config.board_fetch_limit, 50);
        assert_eq!(config.refresh_interval_ms, 10_000);
        assert_eq!(config.tick_interval_ms, 1_000);
        assert_eq!(config.stall_threshold_minutes, 45);
    }

    #[test]
    fn zero_and_garbage_are_rejected() {
        assert!(matches!(
            load(&[("BOARD_TICK_INTERVAL_MS", "0")]),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            load(&[("BOARD_FETCH_LIMIT", "many")]),
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn loop_stops_when_shutdown_fires_between_ticks() {
        let repository = Arc::new(InMemoryManifestRepository::new());
        let service = BoardService::new(repository.clone(), repository, Arc::new(SystemClock), 200);
        let mut monitor = BoardMonitor::new(service, 2 * 3_600);

        let finished = tokio::time::timeout(
            Duration::from_secs(60),
            run_until(
                &mut monitor,
                Duration::from_millis(500),
                Duration::from_millis(100),
                tokio::time::sleep(Duration::from_secs(3)),
            ),
        )
        .await;

        assert!(finished.is_ok());
    }
}

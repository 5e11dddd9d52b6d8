use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::debug;

use smo_application::PerformanceLogRepository;
use smo_core::{AppError, AppResult};
use smo_domain::{ActionCounts, PerformanceDelta, PerformanceLog, PerformanceTotals};

/// PostgreSQL-backed repository for daily performance counters.
#[derive(Clone)]
pub struct PostgresPerformanceLogRepository {
    pool: PgPool,
}

impl PostgresPerformanceLogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PerformanceLogRow {
    data: NaiveDate,
    total_requisicoes: i64,
    total_n8n: i64,
    banda_mb: f64,
    usuarios_unicos: Json<Vec<String>>,
    detalhes_hora: Json<BTreeMap<String, i64>>,
    total_cadastro: i64,
    total_edicao: i64,
    total_cancelamento: i64,
    total_anulacao: i64,
    total_login: i64,
    total_logoff: i64,
    ultima_atualizacao: Option<NaiveDateTime>,
}

impl PerformanceLogRow {
    fn into_log(self) -> PerformanceLog {
        PerformanceLog {
            date: self.data,
            totals: PerformanceTotals {
                total_requests: counter_from_db(self.total_requisicoes),
                total_automation_calls: counter_from_db(self.total_n8n),
                bandwidth_mb: self.banda_mb,
                unique_users: self.usuarios_unicos.0.into_iter().collect::<BTreeSet<_>>(),
                actions: ActionCounts {
                    registrations: counter_from_db(self.total_cadastro),
                    edits: counter_from_db(self.total_edicao),
                    cancellations: counter_from_db(self.total_cancelamento),
                    voids: counter_from_db(self.total_anulacao),
                    logins: counter_from_db(self.total_login),
                    logoffs: counter_from_db(self.total_logoff),
                },
                hourly_requests: self
                    .detalhes_hora
                    .0
                    .into_iter()
                    .map(|(hour, requests)| (hour, counter_from_db(requests)))
                    .collect(),
                last_updated: self.ultima_atualizacao,
            },
        }
    }
}

fn counter_from_db(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn counter_to_db(value: u64) -> AppResult<i64> {
    i64::try_from(value)
        .map_err(|_| AppError::Validation(format!("performance counter {value} is out of range")))
}

#[async_trait]
impl PerformanceLogRepository for PostgresPerformanceLogRepository {
    async fn record_metrics(&self, date: NaiveDate, delta: PerformanceDelta) -> AppResult<()> {
        let hour = delta.hour_key();
        sqlx::query(
            r#"
            INSERT INTO "Log_Performance_SMO_Sistema" AS log (
                data,
                total_requisicoes,
                total_n8n,
                banda_mb,
                usuarios_unicos,
                detalhes_hora,
                total_cadastro,
                total_edicao,
                total_cancelamento,
                total_anulacao,
                total_login,
                total_logoff,
                ultima_atualizacao
            )
            VALUES (
                $1,
                $2,
                $3,
                $4,
                CASE WHEN btrim($5) = '' THEN '[]'::jsonb ELSE jsonb_build_array($5::TEXT) END,
                jsonb_build_object($6::TEXT, $2),
                $7,
                $8,
                $9,
                $10,
                $11,
                $12,
                $13
            )
            ON CONFLICT (data) DO UPDATE SET
                total_requisicoes = log.total_requisicoes + EXCLUDED.total_requisicoes,
                total_n8n = log.total_n8n + EXCLUDED.total_n8n,
                banda_mb = log.banda_mb + EXCLUDED.banda_mb,
                usuarios_unicos = CASE
                    WHEN log.usuarios_unicos @> EXCLUDED.usuarios_unicos THEN log.usuarios_unicos
                    ELSE log.usuarios_unicos || EXCLUDED.usuarios_unicos
                END,
                detalhes_hora = jsonb_set(
                    COALESCE(log.detalhes_hora, '{}'::jsonb),
                    ARRAY[$6::TEXT],
                    to_jsonb(COALESCE((log.detalhes_hora ->> $6::TEXT)::BIGINT, 0) + EXCLUDED.total_requisicoes)
                ),
                total_cadastro = log.total_cadastro + EXCLUDED.total_cadastro,
                total_edicao = log.total_edicao + EXCLUDED.total_edicao,
                total_cancelamento = log.total_cancelamento + EXCLUDED.total_cancelamento,
                total_anulacao = log.total_anulacao + EXCLUDED.total_anulacao,
                total_login = log.total_login + EXCLUDED.total_login,
                total_logoff = log.total_logoff + EXCLUDED.total_logoff,
                ultima_atualizacao = GREATEST(log.ultima_atualizacao, EXCLUDED.ultima_atualizacao)
            "#,
        )
        .bind(date)
        .bind(counter_to_db(delta.requests)?)
        .bind(counter_to_db(delta.automation_calls)?)
        .bind(delta.bandwidth_mb)
        .bind(delta.user.as_str())
        .bind(hour.as_str())
        .bind(counter_to_db(delta.actions.registrations)?)
        .bind(counter_to_db(delta.actions.edits)?)
        .bind(counter_to_db(delta.actions.cancellations)?)
        .bind(counter_to_db(delta.actions.voids)?)
        .bind(counter_to_db(delta.actions.logins)?)
        .bind(counter_to_db(delta.actions.logoffs)?)
        .bind(delta.recorded_at)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to record performance metrics for {date}: {error}"
            ))
        })?;

        debug!(%date, hour = hour.as_str(), user = delta.user.as_str(), "performance metrics recorded");
        Ok(())
    }

    async fn list_logs(&self, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<PerformanceLog>> {
        let rows = sqlx::query_as::<_, PerformanceLogRow>(
            r#"
            SELECT
                data,
                total_requisicoes,
                total_n8n,
                banda_mb,
                usuarios_unicos,
                detalhes_hora,
                total_cadastro,
                total_edicao,
                total_cancelamento,
                total_anulacao,
                total_login,
                total_logoff,
                ultima_atualizacao
            FROM "Log_Performance_SMO_Sistema"
            WHERE data BETWEEN $1 AND $2
            ORDER BY data ASC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list performance logs between {from} and {to}: {error}"
            ))
        })?;

        Ok(rows.into_iter().map(PerformanceLogRow::into_log).collect())
    }
}

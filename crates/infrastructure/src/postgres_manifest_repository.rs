use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tracing::warn;

use smo_application::{ManifestEventRepository, ManifestRepository};
use smo_core::{AppError, AppResult};
use smo_domain::{AuditAction, Manifest, ManifestEvent, ManifestInput, NewManifestEvent, Timeline};

/// PostgreSQL-backed repository for manifests and their audit log.
#[derive(Clone)]
pub struct PostgresManifestRepository {
    pool: PgPool,
}

impl PostgresManifestRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ManifestRow {
    row_id: i64,
    manifest_id: String,
    operator: String,
    operation_user: Option<String>,
    action_user: Option<String>,
    carrier: String,
    shift: String,
    cargo_inh: i32,
    cargo_iz: i32,
    status: String,
    pulled: Option<String>,
    received: Option<String>,
    started: Option<String>,
    available: Option<String>,
    under_review: Option<String>,
    pending: Option<String>,
    complete: Option<String>,
    last_updated_stamp: Option<String>,
}

#[derive(Debug, FromRow)]
struct ManifestEventRow {
    sequence: i64,
    manifest_id: String,
    performed_by: String,
    carrier: String,
    cargo_inh: i32,
    cargo_iz: i32,
    pulled: Option<String>,
    received: Option<String>,
    status: String,
    action: String,
    justification: Option<String>,
    recorded_at: Option<String>,
}

const SELECT_MANIFEST_COLUMNS: &str = r#"
    SELECT
        id AS row_id,
        "ID_Manifesto" AS manifest_id,
        "Usuario_Sistema" AS operator,
        "Usuario_Operação" AS operation_user,
        "Usuario_Ação" AS action_user,
        "CIA" AS carrier,
        "Turno" AS shift,
        "Cargas_(IN/H)" AS cargo_inh,
        "Cargas_(IZ)" AS cargo_iz,
        "Status" AS status,
        "Manifesto_Puxado" AS pulled,
        "Manifesto_Recebido" AS received,
        "Manifesto_Iniciado" AS started,
        "Manifesto_Disponivel" AS available,
        "Manifesto_em_Conferência" AS under_review,
        "Manifesto_Pendente" AS pending,
        "Manifesto_Completo" AS complete,
        "Carimbo_Data/HR" AS last_updated_stamp
    FROM "SMO_Sistema"
"#;

/// Plain insert; a taken identifier surfaces as a unique violation.
const INSERT_MANIFEST: &str = r#"
    INSERT INTO "SMO_Sistema" (
        "ID_Manifesto",
        "Usuario_Sistema",
        "Usuario_Operação",
        "Usuario_Ação",
        "CIA",
        "Turno",
        "Cargas_(IN/H)",
        "Cargas_(IZ)",
        "Status",
        "Manifesto_Puxado",
        "Manifesto_Recebido",
        "Manifesto_Iniciado",
        "Manifesto_Disponivel",
        "Manifesto_em_Conferência",
        "Manifesto_Pendente",
        "Manifesto_Completo",
        "Carimbo_Data/HR"
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
"#;

/// Insert or replace keyed on `ID_Manifesto`.
const UPSERT_MANIFEST: &str = r#"
    INSERT INTO "SMO_Sistema" (
        "ID_Manifesto",
        "Usuario_Sistema",
        "Usuario_Operação",
        "Usuario_Ação",
        "CIA",
        "Turno",
        "Cargas_(IN/H)",
        "Cargas_(IZ)",
        "Status",
        "Manifesto_Puxado",
        "Manifesto_Recebido",
        "Manifesto_Iniciado",
        "Manifesto_Disponivel",
        "Manifesto_em_Conferência",
        "Manifesto_Pendente",
        "Manifesto_Completo",
        "Carimbo_Data/HR"
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
    ON CONFLICT ("ID_Manifesto") DO UPDATE SET
        "Usuario_Operação" = EXCLUDED."Usuario_Operação",
        "Usuario_Ação" = EXCLUDED."Usuario_Ação",
        "CIA" = EXCLUDED."CIA",
        "Turno" = EXCLUDED."Turno",
        "Cargas_(IN/H)" = EXCLUDED."Cargas_(IN/H)",
        "Cargas_(IZ)" = EXCLUDED."Cargas_(IZ)",
        "Status" = EXCLUDED."Status",
        "Manifesto_Puxado" = EXCLUDED."Manifesto_Puxado",
        "Manifesto_Recebido" = EXCLUDED."Manifesto_Recebido",
        "Manifesto_Iniciado" = EXCLUDED."Manifesto_Iniciado",
        "Manifesto_Disponivel" = EXCLUDED."Manifesto_Disponivel",
        "Manifesto_em_Conferência" = EXCLUDED."Manifesto_em_Conferência",
        "Manifesto_Pendente" = EXCLUDED."Manifesto_Pendente",
        "Manifesto_Completo" = EXCLUDED."Manifesto_Completo",
        "Carimbo_Data/HR" = EXCLUDED."Carimbo_Data/HR"
"#;

impl ManifestRow {
    fn into_manifest(self) -> AppResult<Manifest> {
        Manifest::new(ManifestInput {
            id: self.manifest_id,
            operator: self.operator,
            operation_user: self.operation_user,
            action_user: self.action_user,
            carrier: self.carrier,
            shift: self.shift,
            cargo_inh: count_from_db(self.cargo_inh),
            cargo_iz: count_from_db(self.cargo_iz),
            status: self.status,
            timeline: Timeline {
                pulled: self.pulled,
                received: self.received,
                started: self.started,
                available: self.available,
                under_review: self.under_review,
                pending: self.pending,
                complete: self.complete,
                last_updated_stamp: self.last_updated_stamp,
            },
        })
    }
}

impl ManifestEventRow {
    fn into_event(self) -> ManifestEvent {
        ManifestEvent {
            sequence: self.sequence,
            manifest_id: self.manifest_id,
            carrier: self.carrier,
            cargo_inh: count_from_db(self.cargo_inh),
            cargo_iz: count_from_db(self.cargo_iz),
            pulled: self.pulled,
            received: self.received,
            status: self.status,
            action: AuditAction::parse(self.action.as_str()),
            justification: self.justification,
            performed_by: self.performed_by,
            recorded_at: self.recorded_at,
        }
    }
}

fn count_from_db(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

fn count_to_db(value: u32) -> AppResult<i32> {
    i32::try_from(value)
        .map_err(|_| AppError::Validation(format!("cargo count {value} is out of range")))
}

#[async_trait]
impl ManifestRepository for PostgresManifestRepository {
    async fn list_recent_manifests(&self, limit: usize) -> AppResult<Vec<Manifest>> {
        let capped_limit = i64::try_from(limit.clamp(1, 1_000)).unwrap_or(1_000);
        let rows = sqlx::query_as::<_, ManifestRow>(&format!(
            "{SELECT_MANIFEST_COLUMNS} ORDER BY id DESC LIMIT $1"
        ))
        .bind(capped_limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list manifests: {error}")))?;

        let mut manifests = Vec::with_capacity(rows.len());
        for row in rows {
            let row_id = row.row_id;
            match row.into_manifest() {
                Ok(manifest) => manifests.push(manifest),
                Err(error) => warn!(row_id, %error, "skipping unreadable manifest row"),
            }
        }

        Ok(manifests)
    }

    async fn find_manifest(&self, manifest_id: &str) -> AppResult<Option<Manifest>> {
        let row = sqlx::query_as::<_, ManifestRow>(&format!(
            r#"{SELECT_MANIFEST_COLUMNS} WHERE "ID_Manifesto" = $1"#
        ))
        .bind(manifest_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find manifest '{manifest_id}': {error}"))
        })?;

        row.map(ManifestRow::into_manifest).transpose()
    }

    async fn insert_manifest(
        &self,
        manifest: Manifest,
        event: NewManifestEvent,
    ) -> AppResult<ManifestEvent> {
        self.write_with_event(&manifest, event, INSERT_MANIFEST).await
    }

    async fn save_manifest(
        &self,
        manifest: Manifest,
        event: NewManifestEvent,
    ) -> AppResult<ManifestEvent> {
        self.write_with_event(&manifest, event, UPSERT_MANIFEST).await
    }
}

#[async_trait]
impl ManifestEventRepository for PostgresManifestRepository {
    async fn list_events(&self, manifest_id: &str) -> AppResult<Vec<ManifestEvent>> {
        let rows = sqlx::query_as::<_, ManifestEventRow>(
            r#"
            SELECT
                id AS sequence,
                "ID_Manifesto" AS manifest_id,
                "Usuario_Sistema" AS performed_by,
                "CIA" AS carrier,
                "Cargas_(IN/H)" AS cargo_inh,
                "Cargas_(IZ)" AS cargo_iz,
                "Manifesto_Puxado" AS pulled,
                "Manifesto_Recebido" AS received,
                "Status" AS status,
                "Ação" AS action,
                "Justificativa" AS justification,
                "Carimbo_Data/HR" AS recorded_at
            FROM "SMO_Sistema_Eventos"
            WHERE "ID_Manifesto" = $1
            ORDER BY id ASC
            "#,
        )
        .bind(manifest_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list events for manifest '{manifest_id}': {error}"
            ))
        })?;

        Ok(rows.into_iter().map(ManifestEventRow::into_event).collect())
    }
}

impl PostgresManifestRepository {
    async fn write_with_event(
        &self,
        manifest: &Manifest,
        event: NewManifestEvent,
        manifest_statement: &str,
    ) -> AppResult<ManifestEvent> {
        if event.manifest_id != manifest.id() {
            return Err(AppError::Internal(format!(
                "event for manifest '{}' cannot be stored with manifest '{}'",
                event.manifest_id,
                manifest.id()
            )));
        }

        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!(
                "failed to start write transaction for manifest '{}': {error}",
                manifest.id()
            ))
        })?;

        let timeline = manifest.timeline();
        sqlx::query(manifest_statement)
            .bind(manifest.id())
            .bind(manifest.operator())
            .bind(manifest.operation_user())
            .bind(manifest.action_user())
            .bind(manifest.carrier())
            .bind(manifest.shift())
            .bind(count_to_db(manifest.cargo_inh())?)
            .bind(count_to_db(manifest.cargo_iz())?)
            .bind(manifest.status())
            .bind(timeline.pulled.as_deref())
            .bind(timeline.received.as_deref())
            .bind(timeline.started.as_deref())
            .bind(timeline.available.as_deref())
            .bind(timeline.under_review.as_deref())
            .bind(timeline.pending.as_deref())
            .bind(timeline.complete.as_deref())
            .bind(timeline.last_updated_stamp.as_deref())
            .execute(&mut *transaction)
            .await
            .map_err(|error| map_manifest_write_error(error, manifest.id()))?;

        let sequence = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO "SMO_Sistema_Eventos" (
                "ID_Manifesto",
                "Usuario_Sistema",
                "CIA",
                "Cargas_(IN/H)",
                "Cargas_(IZ)",
                "Manifesto_Puxado",
                "Manifesto_Recebido",
                "Status",
                "Ação",
                "Justificativa",
                "Carimbo_Data/HR"
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
            "#,
        )
        .bind(event.manifest_id.as_str())
        .bind(event.performed_by.as_str())
        .bind(event.carrier.as_str())
        .bind(count_to_db(event.cargo_inh)?)
        .bind(count_to_db(event.cargo_iz)?)
        .bind(event.pulled.as_deref())
        .bind(event.received.as_deref())
        .bind(event.status.as_str())
        .bind(event.action.as_str())
        .bind(event.justification.as_deref())
        .bind(event.recorded_at.as_deref())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to append event for manifest '{}': {error}",
                event.manifest_id
            ))
        })?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!(
                "failed to commit write for manifest '{}': {error}",
                manifest.id()
            ))
        })?;

        Ok(event.into_event(sequence))
    }
}

fn map_manifest_write_error(error: sqlx::Error, manifest_id: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!("manifest '{manifest_id}' already exists"));
    }

    AppError::Internal(format!("failed to save manifest '{manifest_id}': {error}"))
}

#[cfg(test)]
mod tests;

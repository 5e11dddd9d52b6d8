use smo_application::{BoardSnapshot, ManifestChange, ManifestHistory, TimelineRow};
use smo_domain::{
    BoardCard, BoardColumn, EventWithDiff, FieldChange, Manifest, ManifestEdit, ManifestEvent,
    PerformanceLog, PerformanceReport, PerformanceTotals, RegisterManifest, STORAGE_FORMAT,
};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// One card on the board.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/board-card-response.ts"
)]
pub struct BoardCardResponse {
    pub id: String,
    pub short_id: String,
    pub carrier: String,
    pub cargo_inh: u32,
    pub cargo_iz: u32,
    pub shift_label: String,
    /// `HH:MM:SS` or `--:--:--`.
    pub elapsed: String,
    /// `HH:MM` or `--:--`.
    pub elapsed_short: String,
}

impl From<BoardCard> for BoardCardResponse {
    fn from(card: BoardCard) -> Self {
        Self {
            elapsed: card.elapsed.to_string(),
            elapsed_short: card.elapsed.to_short_string(),
            id: card.id,
            short_id: card.short_id,
            carrier: card.carrier,
            cargo_inh: card.cargo_inh,
            cargo_iz: card.cargo_iz,
            shift_label: card.shift_label,
        }
    }
}

/// One board column.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/board-column-response.ts"
)]
pub struct BoardColumnResponse {
    pub stage: String,
    pub title: String,
    pub cards: Vec<BoardCardResponse>,
}

impl BoardColumnResponse {
    fn render(column: &BoardColumn, now: chrono::NaiveDateTime) -> Self {
        Self {
            stage: column.stage().as_str().to_owned(),
            title: column.stage().title().to_owned(),
            cards: column
                .cards(now)
                .into_iter()
                .map(BoardCardResponse::from)
                .collect(),
        }
    }
}

/// Board payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/board-response.ts"
)]
pub struct BoardResponse {
    pub rendered_at: String,
    pub total: usize,
    pub excluded: usize,
    pub columns: Vec<BoardColumnResponse>,
}

impl From<BoardSnapshot> for BoardResponse {
    fn from(snapshot: BoardSnapshot) -> Self {
        let now = snapshot.rendered_at;
        Self {
            rendered_at: now.format(STORAGE_FORMAT).to_string(),
            total: snapshot.board.total(),
            excluded: snapshot.board.excluded(),
            columns: snapshot
                .board
                .columns()
                .iter()
                .map(|column| BoardColumnResponse::render(column, now))
                .collect(),
        }
    }
}

/// API representation of a manifest.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/manifest-response.ts"
)]
pub struct ManifestResponse {
    pub id: String,
    pub short_id: String,
    pub operator: String,
    pub operation_user: Option<String>,
    pub action_user: Option<String>,
    pub carrier: String,
    pub shift: String,
    pub shift_label: String,
    pub cargo_inh: u32,
    pub cargo_iz: u32,
    pub status: String,
    /// Board column identifier, absent for cancelled manifests.
    pub stage: Option<String>,
    pub last_updated_stamp: Option<String>,
}

impl From<Manifest> for ManifestResponse {
    fn from(manifest: Manifest) -> Self {
        Self {
            id: manifest.id().to_owned(),
            short_id: manifest.short_id().to_owned(),
            operator: manifest.operator().to_owned(),
            operation_user: manifest.operation_user().map(str::to_owned),
            action_user: manifest.action_user().map(str::to_owned),
            carrier: manifest.carrier().to_owned(),
            shift: manifest.shift().to_owned(),
            shift_label: manifest.shift_label(),
            cargo_inh: manifest.cargo_inh(),
            cargo_iz: manifest.cargo_iz(),
            status: manifest.status().to_owned(),
            stage: manifest
                .classification()
                .stage()
                .map(|stage| stage.as_str().to_owned()),
            last_updated_stamp: manifest.timeline().last_updated_stamp.clone(),
        }
    }
}

/// Formatted timeline row.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/timeline-row-response.ts"
)]
pub struct TimelineRowResponse {
    pub label: String,
    pub value: String,
}

impl From<TimelineRow> for TimelineRowResponse {
    fn from(row: TimelineRow) -> Self {
        Self {
            label: row.field.label().to_owned(),
            value: row.value,
        }
    }
}

/// One changed field on an edit event.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/field-change-response.ts"
)]
pub struct FieldChangeResponse {
    pub label: String,
    pub old_value: String,
    pub new_value: String,
}

impl From<FieldChange> for FieldChangeResponse {
    fn from(change: FieldChange) -> Self {
        Self {
            label: change.field.label().to_owned(),
            old_value: change.old_value,
            new_value: change.new_value,
        }
    }
}

/// API representation of an audit row.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/manifest-event-response.ts"
)]
pub struct ManifestEventResponse {
    #[ts(type = "number")]
    pub sequence: i64,
    pub action: String,
    pub status: String,
    pub performed_by: String,
    pub justification: Option<String>,
    pub recorded_at: Option<String>,
    pub changes: Vec<FieldChangeResponse>,
}

impl From<ManifestEvent> for ManifestEventResponse {
    fn from(event: ManifestEvent) -> Self {
        Self::from(EventWithDiff {
            event,
            changes: Vec::new(),
        })
    }
}

impl From<EventWithDiff> for ManifestEventResponse {
    fn from(value: EventWithDiff) -> Self {
        let event = value.event;
        Self {
            sequence: event.sequence,
            action: event.action.as_str().to_owned(),
            status: event.status,
            performed_by: event.performed_by,
            justification: event.justification,
            recorded_at: event.recorded_at,
            changes: value
                .changes
                .into_iter()
                .map(FieldChangeResponse::from)
                .collect(),
        }
    }
}

/// Detail view payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/manifest-history-response.ts"
)]
pub struct ManifestHistoryResponse {
    pub manifest: ManifestResponse,
    pub timeline: Vec<TimelineRowResponse>,
    pub events: Vec<ManifestEventResponse>,
}

impl From<ManifestHistory> for ManifestHistoryResponse {
    fn from(history: ManifestHistory) -> Self {
        Self {
            manifest: ManifestResponse::from(history.manifest),
            timeline: history
                .timeline
                .into_iter()
                .map(TimelineRowResponse::from)
                .collect(),
            events: history
                .events
                .into_iter()
                .map(ManifestEventResponse::from)
                .collect(),
        }
    }
}

/// Result of a state-changing operation.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/manifest-change-response.ts"
)]
pub struct ManifestChangeResponse {
    pub manifest: ManifestResponse,
    pub event: ManifestEventResponse,
}

impl From<ManifestChange> for ManifestChangeResponse {
    fn from(change: ManifestChange) -> Self {
        Self {
            manifest: ManifestResponse::from(change.manifest),
            event: ManifestEventResponse::from(change.event),
        }
    }
}

/// Incoming payload for manifest registration.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/register-manifest-request.ts"
)]
pub struct RegisterManifestRequest {
    pub id: String,
    pub carrier: String,
    #[serde(default)]
    pub shift: String,
    pub cargo_inh: u32,
    pub cargo_iz: u32,
    pub pulled: Option<String>,
    pub received: Option<String>,
}

impl From<RegisterManifestRequest> for RegisterManifest {
    fn from(request: RegisterManifestRequest) -> Self {
        Self {
            id: request.id,
            carrier: request.carrier,
            shift: request.shift,
            cargo_inh: request.cargo_inh,
            cargo_iz: request.cargo_iz,
            pulled: request.pulled,
            received: request.received,
        }
    }
}

/// Incoming payload for a data edit.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/edit-manifest-request.ts"
)]
pub struct EditManifestRequest {
    pub carrier: String,
    pub cargo_inh: u32,
    pub cargo_iz: u32,
    pub pulled: Option<String>,
    pub received: Option<String>,
    pub justification: String,
}

impl From<EditManifestRequest> for ManifestEdit {
    fn from(request: EditManifestRequest) -> Self {
        Self {
            carrier: request.carrier,
            cargo_inh: request.cargo_inh,
            cargo_iz: request.cargo_iz,
            pulled: request.pulled,
            received: request.received,
            justification: request.justification,
        }
    }
}

/// Incoming payload for cancel and void.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/justification-request.ts"
)]
pub struct JustificationRequest {
    pub justification: String,
}

/// Incoming payload for a stage change.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/advance-stage-request.ts"
)]
pub struct AdvanceStageRequest {
    /// Column identifier such as `iniciado`.
    pub stage: String,
}

/// Performance report query string.
#[derive(Debug, Deserialize)]
pub struct PerformanceQueryRequest {
    pub date: Option<String>,
    pub period: Option<String>,
}

/// Counters of a day or period.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/performance-totals-response.ts"
)]
pub struct PerformanceTotalsResponse {
    #[ts(type = "number")]
    pub total_requests: u64,
    #[ts(type = "number")]
    pub total_automation_calls: u64,
    pub bandwidth_mb: f64,
    pub unique_users: Vec<String>,
    #[ts(type = "number")]
    pub registrations: u64,
    #[ts(type = "number")]
    pub edits: u64,
    #[ts(type = "number")]
    pub cancellations: u64,
    #[ts(type = "number")]
    pub voids: u64,
    #[ts(type = "number")]
    pub logins: u64,
    #[ts(type = "number")]
    pub logoffs: u64,
    #[ts(type = "Record<string, number>")]
    pub hourly_requests: std::collections::BTreeMap<String, u64>,
    pub last_updated: Option<String>,
}

impl From<PerformanceTotals> for PerformanceTotalsResponse {
    fn from(totals: PerformanceTotals) -> Self {
        Self {
            total_requests: totals.total_requests,
            total_automation_calls: totals.total_automation_calls,
            bandwidth_mb: totals.bandwidth_mb,
            unique_users: totals.unique_users.into_iter().collect(),
            registrations: totals.actions.registrations,
            edits: totals.actions.edits,
            cancellations: totals.actions.cancellations,
            voids: totals.actions.voids,
            logins: totals.actions.logins,
            logoffs: totals.actions.logoffs,
            hourly_requests: totals.hourly_requests,
            last_updated: totals
                .last_updated
                .map(|value| value.format(STORAGE_FORMAT).to_string()),
        }
    }
}

/// Daily row inside a report.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/daily-performance-response.ts"
)]
pub struct DailyPerformanceResponse {
    pub date: String,
    pub totals: PerformanceTotalsResponse,
}

impl From<PerformanceLog> for DailyPerformanceResponse {
    fn from(log: PerformanceLog) -> Self {
        Self {
            date: log.date.format("%Y-%m-%d").to_string(),
            totals: PerformanceTotalsResponse::from(log.totals),
        }
    }
}

/// Performance report payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/performance-report-response.ts"
)]
pub struct PerformanceReportResponse {
    pub period: String,
    pub label: String,
    pub from: String,
    pub to: String,
    pub totals: PerformanceTotalsResponse,
    pub daily: Vec<DailyPerformanceResponse>,
}

impl From<PerformanceReport> for PerformanceReportResponse {
    fn from(report: PerformanceReport) -> Self {
        Self {
            period: report.period.as_str().to_owned(),
            label: report.label,
            from: report.from.format("%Y-%m-%d").to_string(),
            to: report.to.format("%Y-%m-%d").to_string(),
            totals: PerformanceTotalsResponse::from(report.totals),
            daily: report
                .daily
                .into_iter()
                .map(DailyPerformanceResponse::from)
                .collect(),
        }
    }
}

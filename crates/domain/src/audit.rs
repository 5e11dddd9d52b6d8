use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::status::ManifestStatus;
use crate::timeline::format_display_timestamp;

/// Action label recorded on a manifest audit row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AuditAction {
    /// `Registro`.
    Registration,
    /// `Edição de Dados`, the only action whose rows are diffed.
    DataEdit,
    /// `Atualização de Status`.
    StatusUpdate,
    /// `Entrega`.
    Delivery,
    /// `Cancelamento`.
    Cancellation,
    /// `Anulação`.
    Void,
    /// Any label written by other tools.
    Other(String),
}

impl AuditAction {
    /// Returns the stored label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Registration => "Registro",
            Self::DataEdit => "Edição de Dados",
            Self::StatusUpdate => "Atualização de Status",
            Self::Delivery => "Entrega",
            Self::Cancellation => "Cancelamento",
            Self::Void => "Anulação",
            Self::Other(label) => label.as_str(),
        }
    }

    /// Parses a stored label, keeping unknown labels verbatim.
    #[must_use]
    pub fn parse(label: &str) -> Self {
        let normalized = label.trim().to_lowercase();
        match normalized.as_str() {
            "registro" => Self::Registration,
            "edição de dados" => Self::DataEdit,
            "atualização de status" => Self::StatusUpdate,
            "entrega" => Self::Delivery,
            "cancelamento" => Self::Cancellation,
            "anulação" => Self::Void,
            _ => Self::Other(label.trim().to_owned()),
        }
    }

    /// Returns whether rows with this action are compared against their predecessor.
    #[must_use]
    pub fn is_edit_action(&self) -> bool {
        matches!(self, Self::DataEdit)
    }
}

impl From<String> for AuditAction {
    fn from(value: String) -> Self {
        Self::parse(value.as_str())
    }
}

impl From<AuditAction> for String {
    fn from(value: AuditAction) -> Self {
        match value {
            AuditAction::Other(label) => label,
            known => known.as_str().to_owned(),
        }
    }
}

/// Snapshot of a manifest written to the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEvent {
    /// Monotonic insertion order assigned by the store.
    pub sequence: i64,
    /// Manifest identifier.
    pub manifest_id: String,
    /// Carrier at the time of the action.
    pub carrier: String,
    /// IN/H count at the time of the action.
    pub cargo_inh: u32,
    /// IZ count at the time of the action.
    pub cargo_iz: u32,
    /// Pulled timestamp text.
    pub pulled: Option<String>,
    /// Received timestamp text.
    pub received: Option<String>,
    /// Status after the action.
    pub status: String,
    /// Action label.
    pub action: AuditAction,
    /// Optional reason given by the operator.
    pub justification: Option<String>,
    /// Login of the operator.
    pub performed_by: String,
    /// Stamp of the action.
    pub recorded_at: Option<String>,
}

/// Audit row before the store assigns its sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewManifestEvent {
    /// Manifest identifier.
    pub manifest_id: String,
    /// Carrier at the time of the action.
    pub carrier: String,
    /// IN/H count at the time of the action.
    pub cargo_inh: u32,
    /// IZ count at the time of the action.
    pub cargo_iz: u32,
    /// Pulled timestamp text.
    pub pulled: Option<String>,
    /// Received timestamp text.
    pub received: Option<String>,
    /// Status after the action.
    pub status: String,
    /// Action label.
    pub action: AuditAction,
    /// Optional reason given by the operator.
    pub justification: Option<String>,
    /// Login of the operator.
    pub performed_by: String,
    /// Stamp of the action.
    pub recorded_at: Option<String>,
}

impl NewManifestEvent {
    /// Attaches the sequence assigned by the store.
    #[must_use]
    pub fn into_event(self, sequence: i64) -> ManifestEvent {
        ManifestEvent {
            sequence,
            manifest_id: self.manifest_id,
            carrier: self.carrier,
            cargo_inh: self.cargo_inh,
            cargo_iz: self.cargo_iz,
            pulled: self.pulled,
            received: self.received,
            status: self.status,
            action: self.action,
            justification: self.justification,
            performed_by: self.performed_by,
            recorded_at: self.recorded_at,
        }
    }
}

/// Fields compared between consecutive audit rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitoredField {
    /// Carrier.
    Carrier,
    /// IN/H count.
    CargoInh,
    /// IZ count.
    CargoIz,
    /// Pulled timestamp.
    Pulled,
    /// Received timestamp.
    Received,
}

impl MonitoredField {
    /// Returns monitored fields in display order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[MonitoredField] = &[
            MonitoredField::Carrier,
            MonitoredField::CargoInh,
            MonitoredField::CargoIz,
            MonitoredField::Pulled,
            MonitoredField::Received,
        ];

        ALL
    }

    /// Returns the label shown in the history view.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Carrier => "CIA",
            Self::CargoInh => "Cargas IN/H",
            Self::CargoIz => "Cargas IZ",
            Self::Pulled => "Data Puxado",
            Self::Received => "Data Recebido",
        }
    }

    fn display_value(&self, event: &ManifestEvent, now: NaiveDateTime) -> String {
        match self {
            Self::Carrier => event.carrier.clone(),
            Self::CargoInh => event.cargo_inh.to_string(),
            Self::CargoIz => event.cargo_iz.to_string(),
            Self::Pulled => format_display_timestamp(event.pulled.as_deref(), now),
            Self::Received => format_display_timestamp(event.received.as_deref(), now),
        }
    }
}

/// One field that differs from the previous audit row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    /// Changed field.
    pub field: MonitoredField,
    /// Display value on the previous row.
    pub old_value: String,
    /// Display value on this row.
    pub new_value: String,
}

/// Audit row together with its detected changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventWithDiff {
    /// Audit row.
    pub event: ManifestEvent,
    /// Changes relative to the previous row; empty unless the row is an edit.
    pub changes: Vec<FieldChange>,
}

/// Orders audit rows by sequence and attaches field changes to edit rows.
///
/// Timestamps are compared by their display form, so a value rewritten in a
/// different text shape but denoting the same instant is not a change.
#[must_use]
pub fn diff_events(events: &[ManifestEvent], now: NaiveDateTime) -> Vec<EventWithDiff> {
    let mut ordered = events.to_vec();
    ordered.sort_by_key(|event| event.sequence);

    let mut result = Vec::with_capacity(ordered.len());
    let mut previous: Option<&ManifestEvent> = None;
    for event in &ordered {
        let changes = match previous {
            Some(previous) if event.action.is_edit_action() => {
                changes_between(previous, event, now)
            }
            _ => Vec::new(),
        };

        result.push(EventWithDiff {
            event: event.clone(),
            changes,
        });
        previous = Some(event);
    }

    result
}

fn changes_between(
    previous: &ManifestEvent,
    current: &ManifestEvent,
    now: NaiveDateTime,
) -> Vec<FieldChange> {
    MonitoredField::all()
        .iter()
        .filter_map(|field| {
            let old_value = field.display_value(previous, now);
            let new_value = field.display_value(current, now);
            (old_value != new_value).then_some(FieldChange {
                field: *field,
                old_value,
                new_value,
            })
        })
        .collect()
}

/// Returns the status a voided cancellation restores.
///
/// Picks the latest row whose status is recognized and not cancelled,
/// defaulting to `Manifesto Recebido`.
#[must_use]
pub fn status_before_cancellation(events: &[ManifestEvent]) -> ManifestStatus {
    let mut ordered: Vec<&ManifestEvent> = events.iter().collect();
    ordered.sort_by_key(|event| event.sequence);

    ordered
        .into_iter()
        .rev()
        .filter_map(|event| ManifestStatus::recognize(event.status.as_str()))
        .find(|status| *status != ManifestStatus::Cancelled)
        .unwrap_or(ManifestStatus::Received)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::{
        AuditAction, ManifestEvent, MonitoredField, diff_events, status_before_cancellation,
    };
    use crate::status::ManifestStatus;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 12, 26)
            .and_then(|date| date.and_hms_opt(9, 0, 0))
            .unwrap_or_else(|| unreachable!())
    }

    fn event(sequence: i64, action: AuditAction) -> ManifestEvent {
        ManifestEvent {
            sequence,
            manifest_id: "LA-2024-0042".to_owned(),
            carrier: "Latam".to_owned(),
            cargo_inh: 4,
            cargo_iz: 2,
            pulled: None,
            received: Some("25/12/2024 06:00".to_owned()),
            status: "Manifesto Recebido".to_owned(),
            action,
            justification: None,
            performed_by: "joana.s".to_owned(),
            recorded_at: None,
        }
    }

    #[test]
    fn action_labels_parse_back_and_keep_unknown_text() {
        for action in [
            AuditAction::Registration,
            AuditAction::DataEdit,
            AuditAction::StatusUpdate,
            AuditAction::Delivery,
            AuditAction::Cancellation,
            AuditAction::Void,
        ] {
            assert_eq!(AuditAction::parse(action.as_str()), action);
        }

        assert_eq!(
            AuditAction::parse(" Reimpressão "),
            AuditAction::Other("Reimpressão".to_owned())
        );
        assert!(AuditAction::parse("EDIÇÃO DE DADOS").is_edit_action());
    }

    #[test]
    fn edit_reports_changed_fields_with_labels() {
        let first = event(1, AuditAction::Registration);
        let mut second = event(2, AuditAction::DataEdit);
        second.cargo_inh = 5;
        second.carrier = "Gol".to_owned();

        let diffs = diff_events(&[first, second], now());

        assert!(diffs[0].changes.is_empty());
        let labels: Vec<_> = diffs[1]
            .changes
            .iter()
            .map(|change| change.field.label())
            .collect();
        assert_eq!(labels, vec!["CIA", "Cargas IN/H"]);
        assert_eq!(diffs[1].changes[1].old_value, "4");
        assert_eq!(diffs[1].changes[1].new_value, "5");
    }

    #[test]
    fn single_event_has_no_changes() {
        let diffs = diff_events(&[event(1, AuditAction::Registration)], now());

        assert_eq!(diffs.len(), 1);
        assert!(diffs[0].changes.is_empty());
    }

    #[test]
    fn edits_differing_only_in_inh_count_yield_one_change() {
        let first = event(1, AuditAction::DataEdit);
        let mut second = event(2, AuditAction::DataEdit);
        second.cargo_inh = 5;

        let diffs = diff_events(&[second, first], now());

        assert_eq!(diffs[0].event.sequence, 1);
        assert!(diffs[0].changes.is_empty());
        assert_eq!(diffs[1].changes.len(), 1);
        assert_eq!(diffs[1].changes[0].field, MonitoredField::CargoInh);
        assert_eq!(diffs[1].changes[0].old_value, "4");
        assert_eq!(diffs[1].changes[0].new_value, "5");
    }

    #[test]
    fn same_instant_in_another_shape_is_not_a_change() {
        let first = event(1, AuditAction::Registration);
        let mut second = event(2, AuditAction::DataEdit);
        second.received = Some("2024-12-25T06:00:00Z".to_owned());

        let diffs = diff_events(&[first, second], now());
        assert!(diffs[1].changes.is_empty());
    }

    #[test]
    fn non_edit_actions_never_carry_changes() {
        let first = event(1, AuditAction::Registration);
        let mut second = event(2, AuditAction::StatusUpdate);
        second.status = "Manifesto Iniciado".to_owned();
        second.cargo_iz = 7;

        let diffs = diff_events(&[first, second], now());
        assert!(diffs[1].changes.is_empty());
    }

    #[test]
    fn rows_are_ordered_by_sequence_before_diffing() {
        let mut late = event(7, AuditAction::DataEdit);
        late.received = None;
        let early = event(3, AuditAction::Registration);

        let diffs = diff_events(&[late, early], now());

        assert_eq!(diffs[0].event.sequence, 3);
        assert_eq!(diffs[1].changes.len(), 1);
        assert_eq!(diffs[1].changes[0].field, MonitoredField::Received);
        assert_eq!(diffs[1].changes[0].old_value, "25/12/2024, 06:00:00");
        assert_eq!(diffs[1].changes[0].new_value, "Não registrado");
    }

    #[test]
    fn voided_cancellation_restores_latest_non_cancelled_status() {
        let mut started = event(2, AuditAction::StatusUpdate);
        started.status = "Manifesto Iniciado".to_owned();
        let mut cancelled = event(3, AuditAction::Cancellation);
        cancelled.status = "Manifesto Cancelado".to_owned();

        assert_eq!(
            status_before_cancellation(&[cancelled.clone(), event(1, AuditAction::Registration), started]),
            ManifestStatus::Started
        );
        assert_eq!(
            status_before_cancellation(&[cancelled]),
            ManifestStatus::Received
        );
    }

    #[test]
    fn audit_action_serializes_as_stored_label() {
        let encoded = serde_json::to_string(&AuditAction::Cancellation).unwrap_or_default();
        assert_eq!(encoded, "\"Cancelamento\"");

        let decoded: AuditAction =
            serde_json::from_str("\"Login\"").unwrap_or_else(|_| unreachable!());
        assert_eq!(decoded, AuditAction::Other("Login".to_owned()));
    }
}

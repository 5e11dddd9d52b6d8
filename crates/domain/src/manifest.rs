use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use smo_core::{Actor, AppError, AppResult, NonEmptyString};

use crate::audit::{AuditAction, NewManifestEvent};
use crate::date_parsing::parse_flexible_date;
use crate::status::{Classification, ManifestStatus, Stage, classify};
use crate::timeline::{Timeline, TimelineField};

/// Pattern used for timestamps written by board operations.
///
/// Day-first slash text never goes through the ISO day/month swap check.
pub const STORAGE_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Carriers operating through the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Carrier {
    /// Azul.
    Azul,
    /// Gol.
    Gol,
    /// Latam.
    Latam,
    /// Modern.
    Modern,
    /// Total.
    Total,
}

impl Carrier {
    /// Returns all carriers in display order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Carrier] = &[
            Carrier::Azul,
            Carrier::Gol,
            Carrier::Latam,
            Carrier::Modern,
            Carrier::Total,
        ];

        ALL
    }

    /// Returns the stored carrier name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Azul => "Azul",
            Self::Gol => "Gol",
            Self::Latam => "Latam",
            Self::Modern => "Modern",
            Self::Total => "Total",
        }
    }
}

impl Display for Carrier {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Carrier {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        Self::all()
            .iter()
            .copied()
            .find(|carrier| carrier.as_str().eq_ignore_ascii_case(normalized))
            .ok_or_else(|| AppError::Validation(format!("unknown carrier '{value}'")))
    }
}

/// Fields read from the record store for one manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestInput {
    /// Stable manifest identifier.
    pub id: String,
    /// System user who registered the manifest.
    pub operator: String,
    /// Operator handling the cargo.
    pub operation_user: Option<String>,
    /// Last user to act on the record.
    pub action_user: Option<String>,
    /// Carrier name as stored.
    pub carrier: String,
    /// Shift label.
    pub shift: String,
    /// Cargo count in the IN/H category.
    pub cargo_inh: u32,
    /// Cargo count in the IZ category.
    pub cargo_iz: u32,
    /// Free-text status.
    pub status: String,
    /// Raw timeline columns.
    pub timeline: Timeline,
}

/// Payload for registering a new manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterManifest {
    /// Manifest identifier issued by the carrier.
    pub id: String,
    /// Carrier name, validated against [`Carrier`].
    pub carrier: String,
    /// Shift label.
    pub shift: String,
    /// Cargo count in the IN/H category.
    pub cargo_inh: u32,
    /// Cargo count in the IZ category.
    pub cargo_iz: u32,
    /// Optional pulled timestamp text.
    pub pulled: Option<String>,
    /// Optional received timestamp; defaults to the registration instant.
    pub received: Option<String>,
}

/// Payload for the data edit operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEdit {
    /// Replacement carrier name.
    pub carrier: String,
    /// Replacement IN/H count.
    pub cargo_inh: u32,
    /// Replacement IZ count.
    pub cargo_iz: u32,
    /// New pulled timestamp; `None` keeps the current value.
    pub pulled: Option<String>,
    /// New received timestamp; `None` keeps the current value.
    pub received: Option<String>,
    /// Reason recorded on the audit row.
    pub justification: String,
}

/// Cargo manifest tracked on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    id: NonEmptyString,
    operator: String,
    operation_user: Option<String>,
    action_user: Option<String>,
    carrier: String,
    shift: String,
    cargo_inh: u32,
    cargo_iz: u32,
    status: String,
    timeline: Timeline,
}

impl Manifest {
    /// Builds a manifest from stored fields.
    ///
    /// Only the identifier is validated; other columns are kept verbatim so
    /// that imperfect rows still reach the board.
    pub fn new(input: ManifestInput) -> AppResult<Self> {
        Ok(Self {
            id: NonEmptyString::new(input.id.trim())?,
            operator: input.operator,
            operation_user: input.operation_user,
            action_user: input.action_user,
            carrier: input.carrier,
            shift: input.shift,
            cargo_inh: input.cargo_inh,
            cargo_iz: input.cargo_iz,
            status: input.status,
            timeline: input.timeline,
        })
    }

    /// Registers a new manifest in the received stage.
    pub fn register(
        input: RegisterManifest,
        actor: &Actor,
        at: NaiveDateTime,
    ) -> AppResult<(Self, NewManifestEvent)> {
        let carrier = input.carrier.parse::<Carrier>()?;
        let pulled = normalize_timestamp("pulled", input.pulled, at)?;
        let received = normalize_timestamp("received", input.received, at)?
            .unwrap_or_else(|| format_storage(at));

        let mut manifest = Self::new(ManifestInput {
            id: input.id,
            operator: actor.login().to_owned(),
            operation_user: None,
            action_user: None,
            carrier: carrier.as_str().to_owned(),
            shift: input.shift.trim().to_owned(),
            cargo_inh: input.cargo_inh,
            cargo_iz: input.cargo_iz,
            status: ManifestStatus::Received.as_str().to_owned(),
            timeline: Timeline {
                pulled,
                received: Some(received),
                ..Timeline::default()
            },
        })?;

        let event = manifest.stamp(AuditAction::Registration, None, actor, at);
        Ok((manifest, event))
    }

    /// Returns the manifest identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Returns the trailing segment of the identifier used on cards.
    #[must_use]
    pub fn short_id(&self) -> &str {
        self.id
            .as_str()
            .rsplit('-')
            .next()
            .unwrap_or(self.id.as_str())
    }

    /// Returns the system user who registered the manifest.
    #[must_use]
    pub fn operator(&self) -> &str {
        self.operator.as_str()
    }

    /// Returns the operator handling the cargo.
    #[must_use]
    pub fn operation_user(&self) -> Option<&str> {
        self.operation_user.as_deref()
    }

    /// Returns the last user to act on the record.
    #[must_use]
    pub fn action_user(&self) -> Option<&str> {
        self.action_user.as_deref()
    }

    /// Returns the carrier name as stored.
    #[must_use]
    pub fn carrier(&self) -> &str {
        self.carrier.as_str()
    }

    /// Returns the shift label.
    #[must_use]
    pub fn shift(&self) -> &str {
        self.shift.as_str()
    }

    /// Returns the compact shift label shown on cards.
    #[must_use]
    pub fn shift_label(&self) -> String {
        if self.shift.trim().is_empty() {
            return "-".to_owned();
        }

        self.shift.replace("Turno", "T")
    }

    /// Returns the IN/H cargo count.
    #[must_use]
    pub fn cargo_inh(&self) -> u32 {
        self.cargo_inh
    }

    /// Returns the IZ cargo count.
    #[must_use]
    pub fn cargo_iz(&self) -> u32 {
        self.cargo_iz
    }

    /// Returns the free-text status.
    #[must_use]
    pub fn status(&self) -> &str {
        self.status.as_str()
    }

    /// Returns the board placement derived from the status.
    #[must_use]
    pub fn classification(&self) -> Classification {
        classify(self.status.as_str())
    }

    /// Returns the raw timeline columns.
    #[must_use]
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Replaces carrier, quantities and optionally the pulled/received stamps.
    pub fn apply_edit(
        &mut self,
        edit: ManifestEdit,
        actor: &Actor,
        at: NaiveDateTime,
    ) -> AppResult<NewManifestEvent> {
        let justification = require_justification(edit.justification.as_str())?;
        self.ensure_not_cancelled("edit")?;

        let carrier = edit.carrier.parse::<Carrier>()?;
        let pulled = normalize_timestamp("pulled", edit.pulled, at)?;
        let received = normalize_timestamp("received", edit.received, at)?;

        self.carrier = carrier.as_str().to_owned();
        self.cargo_inh = edit.cargo_inh;
        self.cargo_iz = edit.cargo_iz;
        if pulled.is_some() {
            self.timeline.overwrite(TimelineField::Pulled, pulled);
        }
        if received.is_some() {
            self.timeline.overwrite(TimelineField::Received, received);
        }

        Ok(self.stamp(AuditAction::DataEdit, Some(justification), actor, at))
    }

    /// Moves the manifest into `stage`, recording the stage timestamp once.
    pub fn advance_to(
        &mut self,
        stage: Stage,
        actor: &Actor,
        at: NaiveDateTime,
    ) -> AppResult<NewManifestEvent> {
        self.ensure_not_cancelled("change the status of")?;

        self.status = stage.canonical_status().as_str().to_owned();
        self.timeline
            .record_once(TimelineField::for_stage(stage), format_storage(at));

        Ok(self.stamp(AuditAction::StatusUpdate, None, actor, at))
    }

    /// Marks the manifest as delivered.
    pub fn deliver(&mut self, actor: &Actor, at: NaiveDateTime) -> AppResult<NewManifestEvent> {
        self.ensure_not_cancelled("deliver")?;
        if ManifestStatus::recognize(self.status.as_str()) == Some(ManifestStatus::Delivered) {
            return Err(AppError::Conflict(format!(
                "manifest '{}' is already delivered",
                self.id
            )));
        }

        self.status = ManifestStatus::Delivered.as_str().to_owned();
        self.timeline
            .record_once(TimelineField::Complete, format_storage(at));

        Ok(self.stamp(AuditAction::Delivery, None, actor, at))
    }

    /// Cancels the manifest, removing it from the board.
    pub fn cancel(
        &mut self,
        justification: &str,
        actor: &Actor,
        at: NaiveDateTime,
    ) -> AppResult<NewManifestEvent> {
        let justification = require_justification(justification)?;
        self.ensure_not_cancelled("cancel")?;

        self.status = ManifestStatus::Cancelled.as_str().to_owned();

        Ok(self.stamp(AuditAction::Cancellation, Some(justification), actor, at))
    }

    /// Undoes a cancellation, restoring `restored_status`.
    pub fn void(
        &mut self,
        restored_status: ManifestStatus,
        justification: &str,
        actor: &Actor,
        at: NaiveDateTime,
    ) -> AppResult<NewManifestEvent> {
        let justification = require_justification(justification)?;
        if self.classification() != Classification::Excluded {
            return Err(AppError::Conflict(format!(
                "manifest '{}' is not cancelled",
                self.id
            )));
        }

        if restored_status == ManifestStatus::Cancelled {
            return Err(AppError::Validation(
                "a voided cancellation cannot restore a cancelled status".to_owned(),
            ));
        }

        self.status = restored_status.as_str().to_owned();

        Ok(self.stamp(AuditAction::Void, Some(justification), actor, at))
    }

    fn ensure_not_cancelled(&self, operation: &str) -> AppResult<()> {
        if self.classification() == Classification::Excluded {
            return Err(AppError::Conflict(format!(
                "cannot {operation} cancelled manifest '{}'",
                self.id
            )));
        }

        Ok(())
    }

    fn stamp(
        &mut self,
        action: AuditAction,
        justification: Option<String>,
        actor: &Actor,
        at: NaiveDateTime,
    ) -> NewManifestEvent {
        let stamp = format_storage(at);
        self.action_user = Some(actor.login().to_owned());
        self.timeline.last_updated_stamp = Some(stamp.clone());

        NewManifestEvent {
            manifest_id: self.id.as_str().to_owned(),
            carrier: self.carrier.clone(),
            cargo_inh: self.cargo_inh,
            cargo_iz: self.cargo_iz,
            pulled: self.timeline.pulled.clone(),
            received: self.timeline.received.clone(),
            status: self.status.clone(),
            action,
            justification,
            performed_by: actor.login().to_owned(),
            recorded_at: Some(stamp),
        }
    }
}

/// Formats an instant the way board operations store it.
#[must_use]
pub fn format_storage(at: NaiveDateTime) -> String {
    at.format(STORAGE_FORMAT).to_string()
}

fn normalize_timestamp(
    field: &str,
    value: Option<String>,
    now: NaiveDateTime,
) -> AppResult<Option<String>> {
    let Some(value) = value.filter(|value| !value.trim().is_empty()) else {
        return Ok(None);
    };

    parse_flexible_date(value.as_str(), now)
        .map(|parsed| Some(format_storage(parsed)))
        .ok_or_else(|| AppError::Validation(format!("invalid {field} timestamp '{value}'")))
}

fn require_justification(value: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(
            "a justification is required for this action".to_owned(),
        ));
    }

    Ok(value.to_owned())
}

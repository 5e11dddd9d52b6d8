use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::date_parsing::parse_flexible_date;
use crate::status::Stage;

/// Display pattern shared by timeline rows and audit diffs.
pub const DISPLAY_FORMAT: &str = "%d/%m/%Y, %H:%M:%S";

/// Placeholder rendered for timestamps that were never written.
pub const NOT_RECORDED: &str = "Não registrado";

/// Timestamp columns carried by a manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineField {
    /// Manifest pulled from the carrier system.
    Pulled,
    /// Cargo received.
    Received,
    /// Handling started.
    Started,
    /// Cargo made available.
    Available,
    /// Entered conference review.
    UnderReview,
    /// Flagged as pending.
    Pending,
    /// Completed or delivered.
    Complete,
}

impl TimelineField {
    /// Returns all timeline fields in chronological order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[TimelineField] = &[
            TimelineField::Pulled,
            TimelineField::Received,
            TimelineField::Started,
            TimelineField::Available,
            TimelineField::UnderReview,
            TimelineField::Pending,
            TimelineField::Complete,
        ];

        ALL
    }

    /// Returns the field written when a manifest enters `stage`.
    #[must_use]
    pub fn for_stage(stage: Stage) -> Self {
        match stage {
            Stage::Received => Self::Received,
            Stage::Started => Self::Started,
            Stage::Available => Self::Available,
            Stage::UnderReview => Self::UnderReview,
            Stage::Pending => Self::Pending,
            Stage::Complete => Self::Complete,
        }
    }

    /// Returns the row label used in the detail view.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pulled => "Manifesto Puxado",
            Self::Received => "Manifesto Recebido",
            Self::Started => "Manifesto Iniciado",
            Self::Available => "Manifesto Disponível",
            Self::UnderReview => "Manifesto Em Conferência",
            Self::Pending => "Manifesto Pendente",
            Self::Complete => "Manifesto Completo",
        }
    }
}

/// Raw timestamp text per timeline column, as stored.
///
/// Values are kept verbatim and only parsed on read, so a malformed cell
/// degrades one display value instead of rejecting the whole record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    /// Pulled timestamp.
    pub pulled: Option<String>,
    /// Received timestamp.
    pub received: Option<String>,
    /// Started timestamp.
    pub started: Option<String>,
    /// Available timestamp.
    pub available: Option<String>,
    /// Under review timestamp.
    pub under_review: Option<String>,
    /// Pending timestamp.
    pub pending: Option<String>,
    /// Complete timestamp.
    pub complete: Option<String>,
    /// Stamp of the last write to the record.
    pub last_updated_stamp: Option<String>,
}

impl Timeline {
    /// Returns the raw value of a field, treating blank text as absent.
    #[must_use]
    pub fn get(&self, field: TimelineField) -> Option<&str> {
        let value = match field {
            TimelineField::Pulled => &self.pulled,
            TimelineField::Received => &self.received,
            TimelineField::Started => &self.started,
            TimelineField::Available => &self.available,
            TimelineField::UnderReview => &self.under_review,
            TimelineField::Pending => &self.pending,
            TimelineField::Complete => &self.complete,
        };

        value.as_deref().filter(|value| !value.trim().is_empty())
    }

    /// Writes a field only when it holds no value yet.
    ///
    /// Returns whether the value was written.
    pub fn record_once(&mut self, field: TimelineField, value: impl Into<String>) -> bool {
        if self.get(field).is_some() {
            return false;
        }

        *self.slot_mut(field) = Some(value.into());
        true
    }

    /// Overwrites a field unconditionally. Reserved for data edits.
    pub(crate) fn overwrite(&mut self, field: TimelineField, value: Option<String>) {
        *self.slot_mut(field) = value;
    }

    fn slot_mut(&mut self, field: TimelineField) -> &mut Option<String> {
        match field {
            TimelineField::Pulled => &mut self.pulled,
            TimelineField::Received => &mut self.received,
            TimelineField::Started => &mut self.started,
            TimelineField::Available => &mut self.available,
            TimelineField::UnderReview => &mut self.under_review,
            TimelineField::Pending => &mut self.pending,
            TimelineField::Complete => &mut self.complete,
        }
    }

    /// Returns the first non-empty raw value on the fallback chain of `stage`.
    #[must_use]
    pub fn resolve_raw(&self, stage: Stage) -> Option<&str> {
        let mut current = Some(stage);
        while let Some(stage) = current {
            if let Some(value) = self.get(TimelineField::for_stage(stage)) {
                return Some(value);
            }
            current = stage.previous();
        }

        None
    }

    /// Resolves and parses the timestamp displayed for a card in `stage`.
    ///
    /// The chain stops at the first non-empty value; if that value cannot be
    /// parsed the result is `None` rather than a further fallback.
    #[must_use]
    pub fn resolve_display_timestamp(
        &self,
        stage: Stage,
        now: NaiveDateTime,
    ) -> Option<NaiveDateTime> {
        self.resolve_raw(stage)
            .and_then(|raw| parse_flexible_date(raw, now))
    }
}

/// Formats stored timestamp text for display.
///
/// Absent values render as [`NOT_RECORDED`], unreadable values verbatim.
#[must_use]
pub fn format_display_timestamp(raw: Option<&str>, now: NaiveDateTime) -> String {
    let Some(raw) = raw.filter(|value| !value.trim().is_empty()) else {
        return NOT_RECORDED.to_owned();
    };

    match parse_flexible_date(raw, now) {
        Some(parsed) => parsed.format(DISPLAY_FORMAT).to_string(),
        None => raw.to_owned(),
    }
}

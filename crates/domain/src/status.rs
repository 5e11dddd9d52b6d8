use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smo_core::AppError;

/// Board stages in workflow order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Cargo received at the terminal.
    Received,
    /// Handling started.
    Started,
    /// Cargo available for pickup.
    Available,
    /// Under conference review.
    UnderReview,
    /// Waiting on a pending issue.
    Pending,
    /// Terminal stage, covers completed and delivered manifests.
    Complete,
}

/// Stage used when a status does not match any canonical phrase.
///
/// Unknown statuses stay visible on the board instead of disappearing.
pub const UNRECOGNIZED_STATUS_STAGE: Stage = Stage::Received;

impl Stage {
    /// Returns all stages in board column order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Stage] = &[
            Stage::Received,
            Stage::Started,
            Stage::Available,
            Stage::UnderReview,
            Stage::Pending,
            Stage::Complete,
        ];

        ALL
    }

    /// Returns a stable column identifier.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "recebido",
            Self::Started => "iniciado",
            Self::Available => "disponivel",
            Self::UnderReview => "conferencia",
            Self::Pending => "pendente",
            Self::Complete => "completo",
        }
    }

    /// Returns the column title shown to operators.
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::Received => "Recebido",
            Self::Started => "Iniciado",
            Self::Available => "Disponível",
            Self::UnderReview => "Em Conferência",
            Self::Pending => "Pendente",
            Self::Complete => "Completo",
        }
    }

    /// Returns the nearest earlier stage consulted when this stage has no timestamp.
    #[must_use]
    pub fn previous(&self) -> Option<Self> {
        match self {
            Self::Received => None,
            Self::Started => Some(Self::Received),
            Self::Available => Some(Self::Started),
            Self::UnderReview => Some(Self::Available),
            Self::Pending => Some(Self::UnderReview),
            Self::Complete => Some(Self::Pending),
        }
    }

    /// Returns the canonical status written when a manifest enters this stage.
    #[must_use]
    pub fn canonical_status(&self) -> ManifestStatus {
        match self {
            Self::Received => ManifestStatus::Received,
            Self::Started => ManifestStatus::Started,
            Self::Available => ManifestStatus::Available,
            Self::UnderReview => ManifestStatus::UnderReview,
            Self::Pending => ManifestStatus::Pending,
            Self::Complete => ManifestStatus::Complete,
        }
    }
}

impl Display for Stage {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|stage| stage.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown stage value '{value}'")))
    }
}

/// Canonical manifest statuses as written by board operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestStatus {
    /// `Manifesto Recebido`.
    Received,
    /// `Manifesto Iniciado`.
    Started,
    /// `Manifesto Disponível`.
    Available,
    /// `Manifesto em Conferência`.
    UnderReview,
    /// `Manifesto Pendente`.
    Pending,
    /// `Manifesto Completo`.
    Complete,
    /// `Manifesto Entregue`, shares the complete column.
    Delivered,
    /// `Manifesto Cancelado`, hidden from the board.
    Cancelled,
}

impl ManifestStatus {
    /// Returns the status text stored on the record.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "Manifesto Recebido",
            Self::Started => "Manifesto Iniciado",
            Self::Available => "Manifesto Disponível",
            Self::UnderReview => "Manifesto em Conferência",
            Self::Pending => "Manifesto Pendente",
            Self::Complete => "Manifesto Completo",
            Self::Delivered => "Manifesto Entregue",
            Self::Cancelled => "Manifesto Cancelado",
        }
    }

    /// Recognizes free-text status, returning `None` for unknown phrases.
    ///
    /// Matching lower-cases and trims the input. Any text containing
    /// `cancelado` is treated as cancelled.
    #[must_use]
    pub fn recognize(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        if normalized.contains("cancelado") {
            return Some(Self::Cancelled);
        }

        match normalized.as_str() {
            "manifesto recebido" => Some(Self::Received),
            "manifesto iniciado" => Some(Self::Started),
            "manifesto disponível" => Some(Self::Available),
            "manifesto em conferência" => Some(Self::UnderReview),
            "manifesto pendente" => Some(Self::Pending),
            "manifesto completo" => Some(Self::Complete),
            "manifesto entregue" => Some(Self::Delivered),
            _ => None,
        }
    }

    /// Returns where a manifest with this status sits on the board.
    #[must_use]
    pub fn classification(&self) -> Classification {
        match self {
            Self::Received => Classification::Board(Stage::Received),
            Self::Started => Classification::Board(Stage::Started),
            Self::Available => Classification::Board(Stage::Available),
            Self::UnderReview => Classification::Board(Stage::UnderReview),
            Self::Pending => Classification::Board(Stage::Pending),
            Self::Complete | Self::Delivered => Classification::Board(Stage::Complete),
            Self::Cancelled => Classification::Excluded,
        }
    }
}

impl Display for ManifestStatus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Board placement of a manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "stage", rename_all = "snake_case")]
pub enum Classification {
    /// Shown in the column of the given stage.
    Board(Stage),
    /// Cancelled manifests are omitted from the board.
    Excluded,
}

impl Classification {
    /// Returns the board stage, if the manifest is shown.
    #[must_use]
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Board(stage) => Some(*stage),
            Self::Excluded => None,
        }
    }
}

/// Maps free-text status to its board placement.
///
/// Total over every input: unknown and empty statuses fall back to
/// [`UNRECOGNIZED_STATUS_STAGE`].
#[must_use]
pub fn classify(status: &str) -> Classification {
    match ManifestStatus::recognize(status) {
        Some(status) => status.classification(),
        None => Classification::Board(UNRECOGNIZED_STATUS_STAGE),
    }
}

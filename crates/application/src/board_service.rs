use std::sync::Arc;

use chrono::NaiveDateTime;

use smo_core::{AppError, AppResult};
use smo_domain::{
    Board, EventWithDiff, Manifest, TimelineField, diff_events, format_display_timestamp,
};

use crate::manifest_ports::{Clock, ManifestEventRepository, ManifestRepository};

/// Formatted timeline row of the detail view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineRow {
    /// Timeline column.
    pub field: TimelineField,
    /// Display value, `Não registrado` when absent.
    pub value: String,
}

/// Detail view of one manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestHistory {
    /// Current manifest state.
    pub manifest: Manifest,
    /// Formatted timeline in stage order.
    pub timeline: Vec<TimelineRow>,
    /// Audit rows with field changes, oldest first.
    pub events: Vec<EventWithDiff>,
}

/// Board snapshot with the instant it was rendered for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    /// Bucketed manifests.
    pub board: Board,
    /// Instant used for elapsed counters.
    pub rendered_at: NaiveDateTime,
}

/// Application service for the read side of the board.
#[derive(Clone)]
pub struct BoardService {
    manifests: Arc<dyn ManifestRepository>,
    events: Arc<dyn ManifestEventRepository>,
    clock: Arc<dyn Clock>,
    fetch_limit: usize,
}

impl BoardService {
    /// Creates a board service fetching at most `fetch_limit` manifests per refresh.
    #[must_use]
    pub fn new(
        manifests: Arc<dyn ManifestRepository>,
        events: Arc<dyn ManifestEventRepository>,
        clock: Arc<dyn Clock>,
        fetch_limit: usize,
    ) -> Self {
        Self {
            manifests,
            events,
            clock,
            fetch_limit,
        }
    }

    /// Returns the current instant of the injected clock.
    #[must_use]
    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    /// Fetches recent manifests and buckets them by stage.
    pub async fn load_board(&self) -> AppResult<BoardSnapshot> {
        let manifests = self
            .manifests
            .list_recent_manifests(self.fetch_limit)
            .await?;

        Ok(BoardSnapshot {
            board: Board::from_manifests(manifests),
            rendered_at: self.clock.now(),
        })
    }

    /// Returns a manifest with its formatted timeline and diffed audit trail.
    pub async fn manifest_history(&self, manifest_id: &str) -> AppResult<ManifestHistory> {
        let manifest = self
            .manifests
            .find_manifest(manifest_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("manifest '{manifest_id}' does not exist")))?;
        let events = self.events.list_events(manifest_id).await?;
        let now = self.clock.now();

        let timeline = TimelineField::all()
            .iter()
            .map(|field| TimelineRow {
                field: *field,
                value: format_display_timestamp(manifest.timeline().get(*field), now),
            })
            .collect();

        Ok(ManifestHistory {
            manifest,
            timeline,
            events: diff_events(&events, now),
        })
    }
}

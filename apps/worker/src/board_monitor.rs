use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use smo_application::{BoardService, BoardSnapshot};
use smo_core::AppResult;
use smo_domain::{BoardCard, Stage};
use tracing::{debug, info};

/// Cached board kept between refreshes.
///
/// Ticks only recompute counters over the cached snapshot; the store is read
/// on refresh alone.
pub struct BoardMonitor {
    board_service: BoardService,
    stall_threshold_seconds: u64,
    snapshot: Option<BoardSnapshot>,
    reported: BTreeSet<String>,
}

impl BoardMonitor {
    #[must_use]
    pub fn new(board_service: BoardService, stall_threshold_seconds: u64) -> Self {
        Self {
            board_service,
            stall_threshold_seconds,
            snapshot: None,
            reported: BTreeSet::new(),
        }
    }

    /// Refetches recent manifests and replaces the cached board.
    pub async fn refresh(&mut self) -> AppResult<()> {
        let snapshot = self.board_service.load_board().await?;
        let board = &snapshot.board;

        debug!(
            received = column_len(&snapshot, Stage::Received),
            started = column_len(&snapshot, Stage::Started),
            available = column_len(&snapshot, Stage::Available),
            under_review = column_len(&snapshot, Stage::UnderReview),
            pending = column_len(&snapshot, Stage::Pending),
            complete = column_len(&snapshot, Stage::Complete),
            "board columns refreshed"
        );
        if self
            .snapshot
            .as_ref()
            .is_none_or(|previous| previous.board.total() != board.total())
        {
            info!(
                total = board.total(),
                excluded = board.excluded(),
                "board size changed"
            );
        }

        self.snapshot = Some(snapshot);
        Ok(())
    }

    /// Recomputes counters at `now` and returns cards that crossed the stall
    /// threshold since the previous tick.
    pub fn tick(&mut self, now: NaiveDateTime) -> Vec<BoardCard> {
        let Some(snapshot) = self.snapshot.as_ref() else {
            return Vec::new();
        };

        let stalled = snapshot.board.stalled(now, self.stall_threshold_seconds);
        let current: BTreeSet<String> = stalled.iter().map(|card| card.id.clone()).collect();
        let newly_stalled = stalled
            .into_iter()
            .filter(|card| !self.reported.contains(&card.id))
            .collect();

        self.reported = current;
        newly_stalled
    }

    #[must_use]
    pub fn now(&self) -> NaiveDateTime {
        self.board_service.now()
    }
}

fn column_len(snapshot: &BoardSnapshot, stage: Stage) -> usize {
    snapshot
        .board
        .column(stage)
        .map_or(0, |column| column.manifests().len())
}

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::elapsed::{ElapsedTime, elapsed_time};
use crate::manifest::Manifest;
use crate::status::{Classification, Stage};

/// Manifests bucketed into the six board columns.
///
/// Built once per fetch; rendering with a fresh `now` recomputes elapsed
/// counters without touching the buckets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    columns: Vec<BoardColumn>,
    excluded: usize,
}

/// One stage column with its manifests in fetch order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardColumn {
    stage: Stage,
    manifests: Vec<Manifest>,
}

/// Card values rendered for a manifest at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardCard {
    /// Manifest identifier.
    pub id: String,
    /// Trailing identifier segment.
    pub short_id: String,
    /// Carrier name.
    pub carrier: String,
    /// IN/H cargo count.
    pub cargo_inh: u32,
    /// IZ cargo count.
    pub cargo_iz: u32,
    /// Abbreviated shift label.
    pub shift_label: String,
    /// Time spent in the column.
    pub elapsed: ElapsedTime,
}

impl Board {
    /// Buckets manifests by classification, skipping cancelled ones.
    #[must_use]
    pub fn from_manifests(manifests: impl IntoIterator<Item = Manifest>) -> Self {
        let mut columns: Vec<BoardColumn> = Stage::all()
            .iter()
            .map(|stage| BoardColumn {
                stage: *stage,
                manifests: Vec::new(),
            })
            .collect();
        let mut excluded = 0;

        for manifest in manifests {
            match manifest.classification() {
                Classification::Board(stage) => {
                    if let Some(column) = columns.iter_mut().find(|column| column.stage == stage) {
                        column.manifests.push(manifest);
                    }
                }
                Classification::Excluded => excluded += 1,
            }
        }

        Self { columns, excluded }
    }

    /// Returns the columns in stage order.
    #[must_use]
    pub fn columns(&self) -> &[BoardColumn] {
        &self.columns
    }

    /// Returns the column for one stage.
    #[must_use]
    pub fn column(&self, stage: Stage) -> Option<&BoardColumn> {
        self.columns.iter().find(|column| column.stage == stage)
    }

    /// Returns the number of manifests shown.
    #[must_use]
    pub fn total(&self) -> usize {
        self.columns.iter().map(|column| column.manifests.len()).sum()
    }

    /// Returns the number of cancelled manifests left off the board.
    #[must_use]
    pub fn excluded(&self) -> usize {
        self.excluded
    }

    /// Returns manifests whose counter reached `threshold_seconds`.
    ///
    /// The complete column is ignored.
    #[must_use]
    pub fn stalled(&self, now: NaiveDateTime, threshold_seconds: u64) -> Vec<BoardCard> {
        self.columns
            .iter()
            .filter(|column| column.stage != Stage::Complete)
            .flat_map(|column| column.cards(now))
            .filter(|card| {
                card.elapsed
                    .seconds()
                    .is_some_and(|seconds| seconds >= threshold_seconds)
            })
            .collect()
    }
}

impl BoardColumn {
    /// Returns the column stage.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Returns the manifests in this column.
    #[must_use]
    pub fn manifests(&self) -> &[Manifest] {
        &self.manifests
    }

    /// Renders the column cards at `now`.
    #[must_use]
    pub fn cards(&self, now: NaiveDateTime) -> Vec<BoardCard> {
        self.manifests
            .iter()
            .map(|manifest| BoardCard {
                id: manifest.id().to_owned(),
                short_id: manifest.short_id().to_owned(),
                carrier: manifest.carrier().to_owned(),
                cargo_inh: manifest.cargo_inh(),
                cargo_iz: manifest.cargo_iz(),
                shift_label: manifest.shift_label(),
                elapsed: elapsed_time(manifest, self.stage, now),
            })
            .collect()
    }
}

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use smo_core::AppResult;
use smo_domain::{Manifest, ManifestEvent, NewManifestEvent, PerformanceDelta, PerformanceLog};

/// Number of manifests fetched per board refresh when not configured.
pub const DEFAULT_BOARD_FETCH_LIMIT: usize = 200;

/// Repository port for manifest records.
#[async_trait]
pub trait ManifestRepository: Send + Sync {
    /// Lists the most recently registered manifests, newest first.
    async fn list_recent_manifests(&self, limit: usize) -> AppResult<Vec<Manifest>>;

    /// Returns one manifest by identifier.
    async fn find_manifest(&self, manifest_id: &str) -> AppResult<Option<Manifest>>;

    /// Stores a new manifest together with its registration event.
    ///
    /// Fails with `Conflict` when the identifier is taken; nothing is written
    /// in that case.
    async fn insert_manifest(
        &self,
        manifest: Manifest,
        event: NewManifestEvent,
    ) -> AppResult<ManifestEvent>;

    /// Replaces a manifest and appends its audit event as one write.
    ///
    /// Either both are stored or neither is. Concurrent writers are
    /// last-write-wins.
    async fn save_manifest(
        &self,
        manifest: Manifest,
        event: NewManifestEvent,
    ) -> AppResult<ManifestEvent>;
}

/// Read port for the append-only manifest audit log.
///
/// Events are written only alongside their manifest through
/// [`ManifestRepository`].
#[async_trait]
pub trait ManifestEventRepository: Send + Sync {
    /// Lists events of one manifest in ascending sequence.
    async fn list_events(&self, manifest_id: &str) -> AppResult<Vec<ManifestEvent>>;
}

/// Repository port for daily performance counters.
#[async_trait]
pub trait PerformanceLogRepository: Send + Sync {
    /// Accumulates a delta into the row of `date`, creating it when missing.
    async fn record_metrics(&self, date: NaiveDate, delta: PerformanceDelta) -> AppResult<()>;

    /// Lists rows between two dates, inclusive, ordered by date.
    async fn list_logs(&self, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<PerformanceLog>>;
}

/// Source of the current local wall-clock instant.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> NaiveDateTime;
}

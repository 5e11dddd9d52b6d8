use std::sync::Arc;

use smo_core::{Actor, AppError, AppResult};
use smo_domain::{
    Manifest, ManifestEdit, ManifestEvent, NewManifestEvent, RegisterManifest, Stage,
    status_before_cancellation,
};

use crate::manifest_ports::{Clock, ManifestEventRepository, ManifestRepository};
use crate::performance_service::PerformanceService;

/// Manifest state after an operation together with its audit row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestChange {
    /// Persisted manifest.
    pub manifest: Manifest,
    /// Appended audit row.
    pub event: ManifestEvent,
}

/// Application service for state-changing board operations.
#[derive(Clone)]
pub struct ManifestService {
    manifests: Arc<dyn ManifestRepository>,
    events: Arc<dyn ManifestEventRepository>,
    performance: PerformanceService,
    clock: Arc<dyn Clock>,
}

impl ManifestService {
    /// Creates a manifest service.
    #[must_use]
    pub fn new(
        manifests: Arc<dyn ManifestRepository>,
        events: Arc<dyn ManifestEventRepository>,
        performance: PerformanceService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            manifests,
            events,
            performance,
            clock,
        }
    }

    /// Registers a new manifest.
    pub async fn register(
        &self,
        actor: &Actor,
        input: RegisterManifest,
    ) -> AppResult<ManifestChange> {
        let (manifest, event) = Manifest::register(input, actor, self.clock.now())?;
        let event = self
            .manifests
            .insert_manifest(manifest.clone(), event)
            .await?;

        self.record(actor, manifest, event).await
    }

    /// Replaces carrier, quantities and pulled/received stamps.
    pub async fn edit(
        &self,
        actor: &Actor,
        manifest_id: &str,
        edit: ManifestEdit,
    ) -> AppResult<ManifestChange> {
        let mut manifest = self.require_manifest(manifest_id).await?;
        let event = manifest.apply_edit(edit, actor, self.clock.now())?;

        self.persist(actor, manifest, event).await
    }

    /// Moves a manifest into `stage`.
    pub async fn advance(
        &self,
        actor: &Actor,
        manifest_id: &str,
        stage: Stage,
    ) -> AppResult<ManifestChange> {
        let mut manifest = self.require_manifest(manifest_id).await?;
        let event = manifest.advance_to(stage, actor, self.clock.now())?;

        self.persist(actor, manifest, event).await
    }

    /// Marks a manifest as delivered.
    pub async fn deliver(&self, actor: &Actor, manifest_id: &str) -> AppResult<ManifestChange> {
        let mut manifest = self.require_manifest(manifest_id).await?;
        let event = manifest.deliver(actor, self.clock.now())?;

        self.persist(actor, manifest, event).await
    }

    /// Cancels a manifest.
    pub async fn cancel(
        &self,
        actor: &Actor,
        manifest_id: &str,
        justification: &str,
    ) -> AppResult<ManifestChange> {
        let mut manifest = self.require_manifest(manifest_id).await?;
        let event = manifest.cancel(justification, actor, self.clock.now())?;

        self.persist(actor, manifest, event).await
    }

    /// Voids a cancellation, restoring the status held before it.
    pub async fn void(
        &self,
        actor: &Actor,
        manifest_id: &str,
        justification: &str,
    ) -> AppResult<ManifestChange> {
        let mut manifest = self.require_manifest(manifest_id).await?;
        let history = self.events.list_events(manifest_id).await?;
        let restored = status_before_cancellation(&history);
        let event = manifest.void(restored, justification, actor, self.clock.now())?;

        self.persist(actor, manifest, event).await
    }

    async fn require_manifest(&self, manifest_id: &str) -> AppResult<Manifest> {
        self.manifests
            .find_manifest(manifest_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("manifest '{manifest_id}' does not exist")))
    }

    async fn persist(
        &self,
        actor: &Actor,
        manifest: Manifest,
        event: NewManifestEvent,
    ) -> AppResult<ManifestChange> {
        let event = self.manifests.save_manifest(manifest.clone(), event).await?;

        self.record(actor, manifest, event).await
    }

    async fn record(
        &self,
        actor: &Actor,
        manifest: Manifest,
        event: ManifestEvent,
    ) -> AppResult<ManifestChange> {
        self.performance
            .record_action(&event.action, actor.login())
            .await?;

        Ok(ManifestChange { manifest, event })
    }
}

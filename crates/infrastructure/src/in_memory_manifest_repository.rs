use async_trait::async_trait;
use tokio::sync::RwLock;

use smo_application::{ManifestEventRepository, ManifestRepository};
use smo_core::{AppError, AppResult};
use smo_domain::{Manifest, ManifestEvent, NewManifestEvent};

/// In-memory manifest and audit log repository.
///
/// Manifests keep their first insertion slot, so recency follows
/// registration order like the row id of the relational store.
#[derive(Debug, Default)]
pub struct InMemoryManifestRepository {
    manifests: RwLock<Vec<Manifest>>,
    events: RwLock<Vec<ManifestEvent>>,
}

impl InMemoryManifestRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ManifestRepository for InMemoryManifestRepository {
    async fn list_recent_manifests(&self, limit: usize) -> AppResult<Vec<Manifest>> {
        Ok(self
            .manifests
            .read()
            .await
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn find_manifest(&self, manifest_id: &str) -> AppResult<Option<Manifest>> {
        Ok(self
            .manifests
            .read()
            .await
            .iter()
            .find(|manifest| manifest.id() == manifest_id)
            .cloned())
    }

    async fn insert_manifest(
        &self,
        manifest: Manifest,
        event: NewManifestEvent,
    ) -> AppResult<ManifestEvent> {
        ensure_event_targets(&manifest, &event)?;
        let mut manifests = self.manifests.write().await;
        let mut events = self.events.write().await;
        if manifests.iter().any(|stored| stored.id() == manifest.id()) {
            return Err(AppError::Conflict(format!(
                "manifest '{}' already exists",
                manifest.id()
            )));
        }

        manifests.push(manifest);
        Ok(push_event(&mut events, event))
    }

    async fn save_manifest(
        &self,
        manifest: Manifest,
        event: NewManifestEvent,
    ) -> AppResult<ManifestEvent> {
        ensure_event_targets(&manifest, &event)?;
        let mut manifests = self.manifests.write().await;
        let mut events = self.events.write().await;
        match manifests
            .iter_mut()
            .find(|stored| stored.id() == manifest.id())
        {
            Some(stored) => *stored = manifest,
            None => manifests.push(manifest),
        }

        Ok(push_event(&mut events, event))
    }
}

#[async_trait]
impl ManifestEventRepository for InMemoryManifestRepository {
    async fn list_events(&self, manifest_id: &str) -> AppResult<Vec<ManifestEvent>> {
        Ok(self
            .events
            .read()
            .await
            .iter()
            .filter(|event| event.manifest_id == manifest_id)
            .cloned()
            .collect())
    }
}

fn ensure_event_targets(manifest: &Manifest, event: &NewManifestEvent) -> AppResult<()> {
    if event.manifest_id != manifest.id() {
        return Err(AppError::Internal(format!(
            "event for manifest '{}' cannot be stored with manifest '{}'",
            event.manifest_id,
            manifest.id()
        )));
    }

    Ok(())
}

fn push_event(events: &mut Vec<ManifestEvent>, event: NewManifestEvent) -> ManifestEvent {
    let sequence = events.last().map_or(1, |last| last.sequence + 1);
    let event = event.into_event(sequence);
    events.push(event.clone());
    event
}

use chrono::NaiveDate;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use smo_application::{ManifestEventRepository, ManifestRepository};
use smo_core::{Actor, AppError};
use smo_domain::{AuditAction, Manifest, RegisterManifest, Stage};

use super::PostgresManifestRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres manifest tests: {error}");
    }

    Some(pool)
}

fn unique_id(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    format!("{prefix}-{nanos}")
}

#[tokio::test]
async fn manifest_writes_round_trip_with_their_events() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresManifestRepository::new(pool);
    let actor = Actor::new("joana.s", None).unwrap_or_else(|_| unreachable!());
    let at = NaiveDate::from_ymd_opt(2024, 12, 25)
        .and_then(|date| date.and_hms_opt(6, 0, 0))
        .unwrap_or_else(|| unreachable!());
    let id = unique_id("LA");

    let (mut manifest, registration) = Manifest::register(
        RegisterManifest {
            id: id.clone(),
            carrier: "Latam".to_owned(),
            shift: "1º Turno".to_owned(),
            cargo_inh: 3,
            cargo_iz: 1,
            pulled: None,
            received: None,
        },
        &actor,
        at,
    )
    .unwrap_or_else(|_| unreachable!());

    let first = repository
        .insert_manifest(manifest.clone(), registration)
        .await;
    assert!(first.is_ok());

    let advance = manifest
        .advance_to(Stage::Started, &actor, at)
        .unwrap_or_else(|_| unreachable!());
    let second = repository.save_manifest(manifest.clone(), advance).await;
    assert!(second.is_ok());

    let stored = repository.find_manifest(id.as_str()).await;
    assert!(matches!(stored, Ok(Some(ref value)) if *value == manifest));

    let events = repository
        .list_events(id.as_str())
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(events.len(), 2);
    assert!(events[0].sequence < events[1].sequence);
    assert_eq!(events[0].action, AuditAction::Registration);
    assert_eq!(events[1].action, AuditAction::StatusUpdate);

    let recent = repository
        .list_recent_manifests(200)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(recent.iter().any(|candidate| candidate.id() == id));
}

#[tokio::test]
async fn missing_manifest_is_none() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresManifestRepository::new(pool);
    let result = repository.find_manifest(unique_id("NONE").as_str()).await;

    assert!(matches!(result, Ok(None)));
}

#[tokio::test]
async fn registering_a_taken_identifier_is_a_conflict() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresManifestRepository::new(pool);
    let actor = Actor::new("joana.s", None).unwrap_or_else(|_| unreachable!());
    let at = NaiveDate::from_ymd_opt(2024, 12, 25)
        .and_then(|date| date.and_hms_opt(6, 0, 0))
        .unwrap_or_else(|| unreachable!());
    let id = unique_id("G3");
    let input = || RegisterManifest {
        id: id.clone(),
        carrier: "Gol".to_owned(),
        shift: "2º Turno".to_owned(),
        cargo_inh: 1,
        cargo_iz: 0,
        pulled: None,
        received: None,
    };

    let (original, registration) =
        Manifest::register(input(), &actor, at).unwrap_or_else(|_| unreachable!());
    assert!(
        repository
            .insert_manifest(original.clone(), registration)
            .await
            .is_ok()
    );

    let (duplicate, duplicate_registration) = Manifest::register(
        RegisterManifest {
            cargo_inh: 9,
            ..input()
        },
        &actor,
        at,
    )
    .unwrap_or_else(|_| unreachable!());
    let result = repository
        .insert_manifest(duplicate, duplicate_registration)
        .await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
    let stored = repository.find_manifest(id.as_str()).await;
    assert!(matches!(stored, Ok(Some(ref value)) if *value == original));
    let events = repository.list_events(id.as_str()).await;
    assert!(matches!(events, Ok(ref events) if events.len() == 1));
}

#[tokio::test]
async fn event_of_another_manifest_rolls_back_the_write() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresManifestRepository::new(pool);
    let actor = Actor::new("joana.s", None).unwrap_or_else(|_| unreachable!());
    let at = NaiveDate::from_ymd_opt(2024, 12, 25)
        .and_then(|date| date.and_hms_opt(6, 0, 0))
        .unwrap_or_else(|| unreachable!());
    let register = |id: &str| {
        Manifest::register(
            RegisterManifest {
                id: id.to_owned(),
                carrier: "Azul".to_owned(),
                shift: String::new(),
                cargo_inh: 1,
                cargo_iz: 1,
                pulled: None,
                received: None,
            },
            &actor,
            at,
        )
        .unwrap_or_else(|_| unreachable!())
    };
    let id = unique_id("AD");
    let other_id = unique_id("AD-OTHER");
    let (manifest, _) = register(id.as_str());
    let (_, foreign_event) = register(other_id.as_str());

    let result = repository.save_manifest(manifest, foreign_event).await;

    assert!(matches!(result, Err(AppError::Internal(_))));
    assert!(matches!(repository.find_manifest(id.as_str()).await, Ok(None)));
    let events = repository.list_events(other_id.as_str()).await;
    assert!(matches!(events, Ok(ref events) if events.is_empty()));
}

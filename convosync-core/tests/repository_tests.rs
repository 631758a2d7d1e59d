// File: convosync-core/tests/repository_tests.rs
//
// Repository-level tests against a real Postgres. Run with a local database:
//   TEST_DATABASE_URL=postgres://... cargo test -- --ignored

use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use convosync_core::models::{
    EventType, RawTranscript, Session, SessionEvent, UserCategory,
};
use convosync_core::repositories::postgres::{
    PostgresSessionEventRepository, PostgresSessionRepository, PostgresTranscriptRepository,
    SessionRepo, TranscriptRepo,
};
use convosync_core::test_utils::helpers::*;
use convosync_core::Error;

fn raw(external_id: &str, session_id: &str) -> RawTranscript {
    RawTranscript {
        external_id: external_id.to_string(),
        session_id: session_id.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
#[ignore = "requires a local Postgres (TEST_DATABASE_URL)"]
async fn transcript_upsert_keeps_identity_and_advances_the_watermark() -> Result<(), Error> {
    let db = setup_test_database().await?;
    let repo = PostgresTranscriptRepository::new(db.pool().clone());

    let t = raw("t-1", "s-1");
    let first_now = Utc::now();

    let mut tx = db.pool().begin().await?;
    let id_one = repo
        .upsert(&mut tx, &t, &t.to_raw_value(), &t.content_hash(), first_now)
        .await?;
    tx.commit().await?;

    // Re-ingest with changed content later; identity stays, hash moves.
    let mut changed = raw("t-1", "s-1");
    changed.user_id = Some("u-1".to_string());
    let second_now = first_now + Duration::seconds(5);

    let mut tx = db.pool().begin().await?;
    let id_two = repo
        .upsert(
            &mut tx,
            &changed,
            &changed.to_raw_value(),
            &changed.content_hash(),
            second_now,
        )
        .await?;
    tx.commit().await?;

    assert_eq!(id_one, id_two);

    let stored = repo.get_by_external_id("t-1").await?.expect("stored");
    assert_eq!(stored.user_id.as_deref(), Some("u-1"));
    assert_eq!(stored.content_hash, changed.content_hash());

    let watermark = repo.latest_updated_at().await?.expect("watermark");
    assert_eq!(watermark, stored.updated_at);
    assert!(watermark > first_now);

    Ok(())
}

#[tokio::test]
#[ignore = "requires a local Postgres (TEST_DATABASE_URL)"]
async fn session_upsert_never_nulls_out_known_fields() -> Result<(), Error> {
    let db = setup_test_database().await?;
    let repo = PostgresSessionRepository::new(db.pool().clone());
    let now = Utc::now();

    let full = Session {
        session_id: "s-1".to_string(),
        user_id: Some("u-1".to_string()),
        transcript_external_id: Some("t-1".to_string()),
        user_category: Some(UserCategory::Tenant),
        location_type: None,
        location_value: None,
        rating: None,
        feedback: None,
        started_at: Some(now),
        ended_at: None,
        created_at: now,
        updated_at: now,
    };

    let mut tx = db.pool().begin().await?;
    repo.upsert(&mut tx, &full).await?;
    tx.commit().await?;

    // A later, sparser pass must not erase the category.
    let sparse = Session {
        user_id: None,
        user_category: None,
        rating: Some(3),
        updated_at: now + Duration::seconds(10),
        ..full.clone()
    };

    let mut tx = db.pool().begin().await?;
    repo.upsert(&mut tx, &sparse).await?;
    tx.commit().await?;

    let stored = repo.get("s-1").await?.expect("stored");
    assert_eq!(stored.user_category, Some(UserCategory::Tenant));
    assert_eq!(stored.user_id.as_deref(), Some("u-1"));
    assert_eq!(stored.rating, Some(3));

    Ok(())
}

#[tokio::test]
#[ignore = "requires a local Postgres (TEST_DATABASE_URL)"]
async fn duplicate_events_are_no_ops() -> Result<(), Error> {
    let db = setup_test_database().await?;
    let events = PostgresSessionEventRepository::new(db.pool().clone());
    let now = Utc::now();

    let exact = SessionEvent {
        event_id: Uuid::new_v4(),
        session_id: "s-1".to_string(),
        user_id: None,
        event_type: EventType::CategorySelected,
        event_ts: now,
        ts_estimated: false,
        user_category: Some("tenant".to_string()),
        location_type: None,
        location_value: None,
        rating: None,
        feedback: None,
        metadata: None,
    };

    let mut tx = db.pool().begin().await?;
    assert!(events.insert(&mut tx, &exact, now).await?);
    // Same (session, type, ts) again, fresh event_id: must not duplicate.
    let replay = SessionEvent {
        event_id: Uuid::new_v4(),
        ..exact.clone()
    };
    assert!(!events.insert(&mut tx, &replay, now).await?);
    tx.commit().await?;

    // Estimated events dedupe per type+metadata even though each pass gets
    // a fresh wall-clock timestamp.
    let estimated = SessionEvent {
        event_id: Uuid::new_v4(),
        event_type: EventType::CtaClicked,
        event_ts: now,
        ts_estimated: true,
        user_category: None,
        metadata: Some(json!({ "label": "Call us" })),
        ..exact.clone()
    };
    let mut tx = db.pool().begin().await?;
    assert!(events.insert(&mut tx, &estimated, now).await?);

    let later = SessionEvent {
        event_id: Uuid::new_v4(),
        event_ts: now + Duration::seconds(60),
        ..estimated.clone()
    };
    assert!(!events.insert(&mut tx, &later, now).await?);

    // A different label is a different fact.
    let other_label = SessionEvent {
        event_id: Uuid::new_v4(),
        metadata: Some(json!({ "label": "Book a valuation" })),
        ..estimated.clone()
    };
    assert!(events.insert(&mut tx, &other_label, now).await?);
    tx.commit().await?;

    Ok(())
}

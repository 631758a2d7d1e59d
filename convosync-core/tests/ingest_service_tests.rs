// File: convosync-core/tests/ingest_service_tests.rs
//
// End-to-end ingestion against a real Postgres. Run with a local database:
//   TEST_DATABASE_URL=postgres://... cargo test -- --ignored

use serde_json::{json, Map, Value};

use convosync_core::models::{LocationType, RawTranscript, UserCategory};
use convosync_core::repositories::postgres::{
    DialogueTurnRepo, PostgresDialogueTurnRepository, PostgresSessionEventRepository,
    PostgresSessionRepository, PostgresTranscriptRepository, SessionEventRepo, SessionRepo,
    TranscriptRepo,
};
use convosync_core::services::ingest_service::{TranscriptIngestService, TranscriptIngestor};
use convosync_core::test_utils::helpers::*;
use convosync_core::Error;

fn props(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("props must be an object")
}

fn tenant_transcript() -> RawTranscript {
    RawTranscript {
        external_id: "t-100".to_string(),
        session_id: "s-100".to_string(),
        user_id: Some("u-100".to_string()),
        properties: props(json!({
            "typeuser": "tenant",
            "rentallocation": "Woollongong",
            "rating": "4/5",
        })),
        logs: vec![
            json!({
                "type": "request",
                "payload": { "message": "hi there" },
                "timestamp": 1_700_000_000_000i64,
            }),
            json!({
                "type": "text",
                "payload": { "message": "welcome!" },
                "timestamp": 1_700_000_001_000i64,
            }),
            json!({
                "type": "set",
                "payload": { "key": "typeuser", "value": "tenant" },
                "timestamp": 1_700_000_002_000i64,
            }),
        ],
        ..Default::default()
    }
}

#[tokio::test]
#[ignore = "requires a local Postgres (TEST_DATABASE_URL)"]
async fn ingesting_twice_is_idempotent_but_bumps_updated_at() -> Result<(), Error> {
    let db = setup_test_database().await?;
    let service = TranscriptIngestService::new(db.clone());
    let transcripts = PostgresTranscriptRepository::new(db.pool().clone());
    let turns = PostgresDialogueTurnRepository::new(db.pool().clone());
    let events = PostgresSessionEventRepository::new(db.pool().clone());

    let raw = tenant_transcript();

    let first = service.ingest_transcript(&raw).await;
    assert!(first.success, "first pass failed: {:?}", first.errors);
    assert_eq!(first.turns_count, 2);
    assert!(first.events_count >= 3); // category, location, rating

    let stored_first = transcripts
        .get_by_external_id("t-100")
        .await?
        .expect("transcript stored");

    let second = service.ingest_transcript(&raw).await;
    assert!(second.success);
    assert_eq!(second.turns_count, 2);
    // Identical content: every event already exists.
    assert_eq!(second.events_count, 0);

    let stored_second = transcripts
        .get_by_external_id("t-100")
        .await?
        .expect("transcript stored");
    assert_eq!(stored_first.transcript_id, stored_second.transcript_id);
    assert_eq!(stored_first.content_hash, stored_second.content_hash);
    assert!(stored_second.updated_at > stored_first.updated_at);

    let turn_rows = turns.list_for_transcript(stored_second.transcript_id).await?;
    assert_eq!(turn_rows.len(), 2);
    assert_eq!(turn_rows[0].turn_index, 0);
    assert_eq!(turn_rows[1].turn_index, 1);

    let event_rows = events.list_for_session("s-100").await?;
    assert_eq!(event_rows.len(), first.events_count);

    Ok(())
}

#[tokio::test]
#[ignore = "requires a local Postgres (TEST_DATABASE_URL)"]
async fn session_fields_coalesce_across_passes() -> Result<(), Error> {
    let db = setup_test_database().await?;
    let service = TranscriptIngestService::new(db.clone());
    let sessions = PostgresSessionRepository::new(db.pool().clone());

    // Pass A knows the category but not the rating.
    let pass_a = RawTranscript {
        external_id: "t-200".to_string(),
        session_id: "s-200".to_string(),
        properties: props(json!({ "typeuser": "investor", "investorlocation": "Kiama" })),
        ..Default::default()
    };
    // Pass B (same session) knows the rating but not the category.
    let pass_b = RawTranscript {
        external_id: "t-201".to_string(),
        session_id: "s-200".to_string(),
        properties: props(json!({ "rating": "2", "feedback": "too slow" })),
        ..Default::default()
    };

    assert!(service.ingest_transcript(&pass_a).await.success);
    assert!(service.ingest_transcript(&pass_b).await.success);

    let session = sessions.get("s-200").await?.expect("session stored");
    assert_eq!(session.user_category, Some(UserCategory::Investor));
    assert_eq!(session.location_type, Some(LocationType::Investor));
    assert_eq!(session.location_value.as_deref(), Some("kiama"));
    assert_eq!(session.rating, Some(2));
    assert_eq!(session.feedback.as_deref(), Some("too slow"));

    Ok(())
}

#[tokio::test]
#[ignore = "requires a local Postgres (TEST_DATABASE_URL)"]
async fn turns_update_in_place_at_their_index() -> Result<(), Error> {
    let db = setup_test_database().await?;
    let service = TranscriptIngestService::new(db.clone());
    let transcripts = PostgresTranscriptRepository::new(db.pool().clone());
    let turns = PostgresDialogueTurnRepository::new(db.pool().clone());

    let mut raw = tenant_transcript();
    assert!(service.ingest_transcript(&raw).await.success);

    // The remote corrected the first utterance; same index, new text.
    raw.logs[0] = json!({
        "type": "request",
        "payload": { "message": "hello corrected" },
        "timestamp": 1_700_000_000_000i64,
    });
    assert!(service.ingest_transcript(&raw).await.success);

    let stored = transcripts
        .get_by_external_id("t-100")
        .await?
        .expect("transcript stored");
    let turn_rows = turns.list_for_transcript(stored.transcript_id).await?;
    assert_eq!(turn_rows.len(), 2);
    assert_eq!(turn_rows[0].text, "hello corrected");

    Ok(())
}

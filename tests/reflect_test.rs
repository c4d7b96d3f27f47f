mod helpers;

use std::sync::{Arc, Mutex};

use memoir::error::{Capability, JournalError, ValidationError};
use memoir::journal::reflect::{self, ReflectOptions, Resolver, SentimentFailurePolicy};
use memoir::journal::store;
use memoir::models::ModelProvider;
use memoir::sentiment::lexicon::LexiconClassifier;
use memoir::sentiment::Sentiment;
use memoir::summary::extractive::ExtractiveSummarizer;

const PROUD: &str = "I finally felt proud of finishing my project today and it made me smile";
const PROUD_AGAIN: &str =
    "I finally felt proud of finishing my project today and it made me smile again";
const RAINY: &str =
    "The train was late and the rain soaked my shoes before the long meeting began";

fn shared_db() -> Arc<Mutex<rusqlite::Connection>> {
    Arc::new(Mutex::new(helpers::test_db()))
}

#[tokio::test]
async fn first_entry_is_annotated_without_reflection() {
    let db = shared_db();
    let resolver = helpers::test_resolver();

    let annotated = reflect::write_entry(&db, &resolver, "ana", PROUD).await.unwrap();

    assert_eq!(annotated.entry.sentiment, Sentiment::Positive);
    assert!(!annotated.entry.summary.is_empty());
    assert!(annotated.similar.is_none());

    let summary_words: Vec<String> = annotated
        .entry
        .summary
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .collect();
    for tag in &annotated.entry.tags {
        assert!(tag.chars().count() > 4, "short tag {tag}");
        assert!(summary_words.contains(tag), "tag {tag} not in summary");
    }
}

#[tokio::test]
async fn near_duplicate_reflects_earlier_entry() {
    let db = shared_db();
    let resolver = helpers::test_resolver();

    let first = reflect::write_entry(&db, &resolver, "ana", PROUD).await.unwrap();
    let second = reflect::write_entry(&db, &resolver, "ana", PROUD_AGAIN).await.unwrap();

    let similar = second.similar.expect("expected a reflection");
    assert_eq!(similar.entry_id, first.entry.id);
    assert!(similar.score > 0.70);
}

#[tokio::test]
async fn most_recent_similar_entry_wins() {
    let db = shared_db();
    let resolver = helpers::test_resolver();

    let _older = reflect::write_entry(&db, &resolver, "ana", PROUD).await.unwrap();
    let newer = reflect::write_entry(&db, &resolver, "ana", PROUD_AGAIN).await.unwrap();
    let _unrelated = reflect::write_entry(&db, &resolver, "ana", RAINY).await.unwrap();

    // PROUD is an exact match for the oldest entry, but the newer near-duplicate
    // clears the threshold first.
    let latest = reflect::write_entry(&db, &resolver, "ana", PROUD).await.unwrap();
    assert_eq!(latest.similar.unwrap().entry_id, newer.entry.id);
}

#[tokio::test]
async fn unrelated_entry_has_no_reflection() {
    let db = shared_db();
    let resolver = helpers::test_resolver();

    reflect::write_entry(&db, &resolver, "ana", PROUD).await.unwrap();
    let rainy = reflect::write_entry(&db, &resolver, "ana", RAINY).await.unwrap();
    assert!(rainy.similar.is_none());
}

#[tokio::test]
async fn reflections_stay_within_one_journal() {
    let db = shared_db();
    let resolver = helpers::test_resolver();

    reflect::write_entry(&db, &resolver, "ana", PROUD).await.unwrap();
    let ben = reflect::write_entry(&db, &resolver, "ben", PROUD).await.unwrap();
    assert!(ben.similar.is_none());
}

#[tokio::test]
async fn validation_errors_store_nothing() {
    let db = shared_db();
    let resolver = helpers::test_resolver();

    let err = reflect::write_entry(&db, &resolver, "ana", "   ").await.unwrap_err();
    assert!(matches!(err, JournalError::Validation(ValidationError::Empty)));
    assert_eq!(err.to_string(), "Please write something.");

    let err = reflect::write_entry(&db, &resolver, "ana", "a short day").await.unwrap_err();
    assert!(matches!(
        err,
        JournalError::Validation(ValidationError::TooShort { words: 3, min: 10 })
    ));

    let conn = db.lock().unwrap();
    assert_eq!(store::entry_count(&conn, "ana").unwrap(), 0);
}

#[tokio::test]
async fn embedder_failure_is_always_surfaced() {
    let db = shared_db();
    let models = ModelProvider::new(
        Arc::new(LexiconClassifier::new()),
        Arc::new(ExtractiveSummarizer::new()),
        Arc::new(helpers::FailingEmbedder),
    );
    let options = ReflectOptions {
        on_sentiment_failure: SentimentFailurePolicy::StoreUnknown,
        ..ReflectOptions::default()
    };
    let resolver = Resolver::new(models, options);

    let err = reflect::write_entry(&db, &resolver, "ana", PROUD).await.unwrap_err();
    match err {
        JournalError::ModelUnavailable(e) => assert_eq!(e.capability, Capability::Embedder),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unknown_sentiment_policy_keeps_the_entry() {
    let db = shared_db();
    let models = ModelProvider::new(
        Arc::new(helpers::FailingClassifier),
        Arc::new(ExtractiveSummarizer::new()),
        Arc::new(helpers::HashingEmbedder),
    );
    let options = ReflectOptions {
        on_sentiment_failure: SentimentFailurePolicy::StoreUnknown,
        ..ReflectOptions::default()
    };
    let resolver = Resolver::new(models, options);

    let annotated = reflect::write_entry(&db, &resolver, "ana", PROUD).await.unwrap();
    assert_eq!(annotated.entry.sentiment, Sentiment::Unknown);

    let conn = db.lock().unwrap();
    let stored = store::list_entries(&conn, "ana").unwrap();
    assert_eq!(stored[0].sentiment, Sentiment::Unknown);
}

#[tokio::test]
async fn long_entry_is_truncated_for_sentiment_but_stored_whole() {
    let db = shared_db();
    let resolver = helpers::test_resolver();

    let long = format!("{PROUD} {}", "and then we walked home slowly ".repeat(120));
    let annotated = reflect::write_entry(&db, &resolver, "ana", &long).await.unwrap();
    assert!(annotated.entry.truncated);

    let conn = db.lock().unwrap();
    let stored = store::list_entries(&conn, "ana").unwrap();
    assert_eq!(stored[0].text, long);
}

#[tokio::test]
async fn entries_from_another_encoder_are_not_reflected() {
    let db = shared_db();
    {
        let mut conn = db.lock().unwrap();
        let mut old = helpers::test_draft(PROUD, Sentiment::Positive, helpers::test_embedding(1));
        old.embedding_model = "retired-model".into();
        store::append_entry(&mut conn, "ana", &old, helpers::at(1, 1, 9)).unwrap();
    }

    let resolver = helpers::test_resolver();
    let annotated = reflect::write_entry(&db, &resolver, "ana", PROUD).await.unwrap();
    assert!(annotated.similar.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writes_for_one_user_are_serialized() {
    let db = shared_db();
    let resolver = Arc::new(helpers::test_resolver());

    let mut writes = tokio::task::JoinSet::new();
    for i in 0..8 {
        let db = Arc::clone(&db);
        let resolver = Arc::clone(&resolver);
        writes.spawn(async move {
            let text = format!("{RAINY} and this was entry number {i}");
            reflect::write_entry(&db, &resolver, "ana", &text).await
        });
    }
    while let Some(joined) = writes.join_next().await {
        joined.unwrap().unwrap();
    }

    let conn = db.lock().unwrap();
    let entries = store::list_entries(&conn, "ana").unwrap();
    assert_eq!(entries.len(), 8);
    assert!(entries
        .windows(2)
        .all(|pair| pair[0].created_at <= pair[1].created_at));
    assert_eq!(store::entry_count(&conn, "ana").unwrap(), 8);
}

use contact_router_core::mocks::{RecordingCorpusWriter, ScriptedGateway};
use contact_router_core::types::{
    CacheEntry, DestinationCatalog, Fingerprint, RouteDecision, RoutePath, TextTurnRequest,
};
use contact_router_core::traits::AnswerStore;
use contact_router_gateway::{AnswerCache, FeedbackUpdater, RouterSettings, TextRouter};
use contact_router_store::InMemoryAnswerStore;
use std::sync::Arc;
use std::time::Duration;

fn catalog() -> Arc<DestinationCatalog> {
    Arc::new(DestinationCatalog::new([("Sales", "arnA"), ("Support", "arnB")]))
}

#[tokio::test]
async fn test_self_learning_does_not_wait_for_corpus() {
    let gateway = Arc::new(ScriptedGateway::constant("Support"));
    let writer = Arc::new(RecordingCorpusWriter::gated());
    let router = TextRouter::new(
        catalog(),
        gateway,
        AnswerCache::disabled(),
        FeedbackUpdater::spawn(writer.clone(), 8),
        RouterSettings::default(),
    );

    // The writer is parked, so a turn that waited on it would time out here.
    let outcome = tokio::time::timeout(
        Duration::from_secs(1),
        router.route(&TextTurnRequest::free_form("my router keeps dropping")),
    )
    .await
    .expect("turn must not wait on the corpus update");

    assert_eq!(outcome.path, RoutePath::SelfLearned);
    assert!(writer.samples().is_empty());

    writer.release();
    tokio::time::timeout(Duration::from_secs(1), writer.wait_for(1))
        .await
        .unwrap();
    assert_eq!(
        writer.samples(),
        vec![("Support".to_string(), "my router keeps dropping".to_string())]
    );
}

#[tokio::test]
async fn test_cache_round_trip_through_memory_store() {
    let gateway = Arc::new(ScriptedGateway::constant("Returns are accepted for 30 days."));
    let store = Arc::new(InMemoryAnswerStore::new());
    let router = TextRouter::new(
        catalog(),
        gateway.clone(),
        AnswerCache::new(Some(store.clone() as Arc<dyn AnswerStore>)),
        FeedbackUpdater::disabled(),
        RouterSettings::default(),
    );

    let first = router.route(&TextTurnRequest::free_form("What is your return policy?")).await;
    let second = router.route(&TextTurnRequest::free_form("what is your return policy?")).await;

    assert_eq!(first.path, RoutePath::Generated);
    assert_eq!(second.path, RoutePath::CacheHit);
    assert_eq!(first.decision, second.decision);
    assert_eq!(gateway.complete_calls(), 1);

    let stored = store
        .get(&Fingerprint::of("What is your return policy?"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.question, "What is your return policy?");
    assert!(stored.expires_at > chrono::Utc::now() + chrono::Duration::hours(23));
}

#[tokio::test]
async fn test_expired_entry_is_regenerated_and_overwritten() {
    let gateway = Arc::new(ScriptedGateway::constant("New answer"));
    let store = Arc::new(InMemoryAnswerStore::new());
    let fingerprint = Fingerprint::of("store hours?");
    store
        .put(CacheEntry::new(
            fingerprint.clone(),
            "store hours?",
            "Old answer",
            chrono::Duration::hours(24),
            chrono::Utc::now() - chrono::Duration::hours(48),
        ))
        .await
        .unwrap();

    let router = TextRouter::new(
        catalog(),
        gateway.clone(),
        AnswerCache::new(Some(store.clone() as Arc<dyn AnswerStore>)),
        FeedbackUpdater::disabled(),
        RouterSettings::default(),
    );

    let outcome = router.route(&TextTurnRequest::free_form("Store hours?")).await;

    assert_eq!(
        outcome.decision,
        RouteDecision::Answer {
            text: "New answer".into()
        }
    );
    assert_eq!(gateway.complete_calls(), 1);
    assert_eq!(store.get(&fingerprint).await.unwrap().unwrap().answer, "New answer");
}

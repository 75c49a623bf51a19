//! End-to-end tests combining repositories and caches through the coordinator

use deckhaus::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Deck {
    id: String,
    owner_id: String,
    name: String,
    card_count: u32,
    #[serde(default)]
    archived: bool,
    created_at: String,
    updated_at: String,
}

impl Entity for Deck {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeckPatch {
    name: Option<String>,
    card_count: Option<u32>,
    archived: Option<bool>,
}

fn setup() -> (Arc<MemoryDocumentStore>, DeckHaus) {
    let store = Arc::new(MemoryDocumentStore::new());
    let deckhaus = DeckHaus::with_document_store(AppConfig::default(), store.clone()).unwrap();
    (store, deckhaus)
}

#[tokio::test]
async fn test_repository_round_trip() {
    let (_, deckhaus) = setup();
    let decks = deckhaus.repository::<Deck>("decks").unwrap();

    let created = decks
        .create(&serde_json::json!({"ownerId": "u1", "name": "Kanji N5", "cardCount": 80}))
        .await
        .unwrap();
    let fetched = decks.find_by_id(&created.id).await.unwrap().unwrap();
    assert_eq!(fetched, created);

    let updated = decks
        .update(
            &created.id,
            &DeckPatch {
                name: None,
                card_count: Some(81),
                archived: Some(true),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Kanji N5");
    assert_eq!(updated.card_count, 81);
    assert!(updated.archived);

    assert!(decks.delete(&created.id).await.unwrap());
    assert_eq!(decks.find_by_id(&created.id).await.unwrap(), None);
}

fn position_creates(decks: &GenericRepository<Deck>, count: usize) -> Vec<BatchOperation> {
    (0..count)
        .map(|i| {
            let mut data = Document::new();
            data.insert("position".to_string(), serde_json::json!(i));
            BatchOperation::create(decks.new_document_ref(), data)
        })
        .collect()
}

#[tokio::test]
async fn test_repository_batches_ignore_cache_batch_size() {
    let store = Arc::new(MemoryDocumentStore::new());
    let mut config = AppConfig::default();
    config.cache.max_batch_size = 100;
    let deckhaus = DeckHaus::with_document_store(config, store.clone()).unwrap();
    let decks = deckhaus.repository::<Deck>("decks").unwrap();

    decks.execute_batch(position_creates(&decks, 250)).await.unwrap();
    assert_eq!(store.commit_count(), 1);

    decks.execute_batch(position_creates(&decks, 1200)).await.unwrap();
    assert_eq!(store.commit_count(), 4);
    assert_eq!(decks.count(&Filters::new()).await.unwrap(), 1450);
}

#[tokio::test]
async fn test_repository_rejects_invalid_collection() {
    let (_, deckhaus) = setup();
    assert!(matches!(
        deckhaus.repository::<Deck>("user decks"),
        Err(DeckHausError::Repository(RepositoryError::InvalidCollection(_)))
    ));
}

#[tokio::test]
async fn test_cached_deck_summary() {
    let (_, deckhaus) = setup();
    let decks = deckhaus.repository::<Deck>("decks").unwrap();
    let cache = deckhaus.cache("deck_summaries").unwrap();
    for (name, cards) in [("Verbs", 40), ("Nouns", 120), ("Idioms", 15)] {
        decks
            .create(&serde_json::json!({"ownerId": "u1", "name": name, "cardCount": cards}))
            .await
            .unwrap();
    }

    let loads = AtomicUsize::new(0);
    let loads = &loads;
    let load_total = || {
        let decks = decks.clone();
        async move {
            loads.fetch_add(1, Ordering::SeqCst);
            let options = FindOptions::new().filters(Filters::new().eq("ownerId", "u1"));
            let total: u32 = decks
                .find_all(&options)
                .await?
                .iter()
                .map(|deck| deck.card_count)
                .sum();
            Ok::<_, RepositoryError>(total)
        }
    };

    let first: u32 = cache.remember("cards:u1", load_total, Some(300)).await.unwrap();
    let second: u32 = cache.remember("cards:u1", load_total, Some(300)).await.unwrap();

    assert_eq!(first, 175);
    assert_eq!(second, 175);
    assert_eq!(loads.load(Ordering::SeqCst), 1);

    cache.delete("cards:u1").await.unwrap();
    assert_eq!(cache.get::<u32>("cards:u1").await, None);
}

#[tokio::test]
async fn test_caches_in_different_collections_are_isolated() {
    let (store, deckhaus) = setup();
    let a = deckhaus.cache("cache_a").unwrap();
    let b = deckhaus.cache("cache_b").unwrap();

    a.set("k", &1u32, None).await.unwrap();
    b.set("k", &2u32, None).await.unwrap();
    assert_eq!(a.get::<u32>("k").await, Some(1));
    assert_eq!(b.get::<u32>("k").await, Some(2));

    assert_eq!(a.clear().await.unwrap(), 1);
    assert_eq!(b.get::<u32>("k").await, Some(2));
    assert_eq!(store.collection_len("cache_b").await, 1);
}

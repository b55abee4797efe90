//! End-to-end feed engine behaviour over the in-memory adapters.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use feed_core::domain::{ChannelFeedRequest, ContentBatch, ContentItem, HomeFeedRequest, SessionPolicy};
use feed_core::error::DomainError;
use feed_core::services::{CleanupRun, FeedService, SessionCleanupJob, SessionService, ViewTracker};
use feed_core::{Clock, ManualClock};
use feed_infrastructure::{InMemoryContentStore, InMemorySessionStore};
use feed_shared::config::FeedSettings;

struct Engine {
    clock: Arc<ManualClock>,
    store: InMemorySessionStore,
    content: InMemoryContentStore,
    sessions: Arc<SessionService>,
    views: Arc<ViewTracker>,
    feed: FeedService,
}

fn engine(items: Vec<ContentItem>) -> Engine {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let store = InMemorySessionStore::new();
    let content = InMemoryContentStore::with_items(items);

    let sessions = Arc::new(SessionService::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        clock.clone(),
        SessionPolicy::default(),
    ));
    let views = Arc::new(ViewTracker::new(sessions.clone(), Arc::new(store.clone())));
    let feed = FeedService::new(
        sessions.clone(),
        views.clone(),
        Arc::new(content.clone()),
        FeedSettings {
            default_limit: 20,
            max_limit: 100,
            default_max_consecutive: 5,
        },
    );

    Engine {
        clock,
        store,
        content,
        sessions,
        views,
        feed,
    }
}

fn sport_items() -> Vec<ContentItem> {
    [500, 400, 300, 200, 100]
        .into_iter()
        .map(|wm| ContentItem::new(format!("s{wm}"), vec!["sport".into()], wm))
        .collect()
}

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

async fn channel(engine: &Engine, session_id: Uuid, cursor: Option<&str>, limit: usize) -> ContentBatch {
    engine
        .feed
        .channel_feed(ChannelFeedRequest {
            session_id,
            channel_id: "sport".into(),
            cursor: cursor.map(str::to_string),
            limit: Some(limit),
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn test_channel_feed_skips_viewed_items() {
    let engine = engine(sport_items());
    let session = engine.sessions.create(None).await.unwrap();
    engine
        .views
        .mark_viewed(&session.session_id, &ids(&["s500", "s400"]))
        .await
        .unwrap();

    let batch = channel(&engine, session.session_id, None, 3).await;

    assert_eq!(batch.item_ids(), vec!["s300", "s200", "s100"]);
    assert_eq!(batch.next_cursor.as_deref(), Some("100"));
    assert!(!batch.has_more);
    assert!(batch.cycle_count.is_none());
}

#[tokio::test]
async fn test_channel_feed_recycles_from_newest() {
    let engine = engine(sport_items());
    let session = engine.sessions.create(None).await.unwrap();
    engine
        .views
        .mark_viewed(&session.session_id, &ids(&["s300"]))
        .await
        .unwrap();

    let batch = channel(&engine, session.session_id, Some("200"), 3).await;

    assert_eq!(batch.item_ids(), vec!["s100", "s500", "s400"]);
    assert_eq!(batch.cycle_count, Some(1));
    assert!(batch.has_more);
    assert_eq!(batch.next_cursor.as_deref(), Some("400:200"));
}

#[tokio::test]
async fn test_page_after_recycle_does_not_repeat_items() {
    let engine = engine(sport_items());
    let session = engine.sessions.create(None).await.unwrap();

    let first = channel(&engine, session.session_id, Some("200"), 3).await;
    assert_eq!(first.item_ids(), vec!["s100", "s500", "s400"]);
    assert_eq!(first.cycle_count, Some(1));

    // Nothing marked viewed in between
    let second = channel(&engine, session.session_id, first.next_cursor.as_deref(), 3).await;
    assert_eq!(second.item_ids(), vec!["s300", "s200"]);
    assert!(!second.has_more);
    assert!(second.cycle_count.is_none());

    let a: HashSet<_> = first.item_ids().into_iter().collect();
    let b: HashSet<_> = second.item_ids().into_iter().collect();
    assert!(a.is_disjoint(&b));
}

#[tokio::test]
async fn test_fully_viewed_channel_is_exhausted() {
    let engine = engine(sport_items());
    let session = engine.sessions.create(None).await.unwrap();
    engine
        .views
        .mark_viewed(&session.session_id, &ids(&["s500", "s400", "s300", "s200", "s100"]))
        .await
        .unwrap();

    let batch = channel(&engine, session.session_id, None, 3).await;

    assert!(batch.items.is_empty());
    assert!(batch.next_cursor.is_none());
    assert!(!batch.has_more);
    assert!(batch.cycle_count.is_none());
}

#[tokio::test]
async fn test_sequential_home_pages_are_disjoint() {
    let mut items = Vec::new();
    for n in 0..30i64 {
        let channel = if n % 4 == 0 { "news" } else { "sport" };
        items.push(ContentItem::new(format!("i{n:02}"), vec![channel.into()], 10_000 - n * 10));
    }
    let engine = engine(items);
    let session = engine.sessions.create(None).await.unwrap();
    engine
        .views
        .mark_viewed(&session.session_id, &ids(&["i00", "i05"]))
        .await
        .unwrap();
    let viewed = engine.views.viewed_set(&session.session_id).await.unwrap();

    let request = |cursor: Option<String>| HomeFeedRequest {
        session_id: session.session_id,
        cursor,
        limit: Some(8),
        max_consecutive: Some(2),
    };

    let first = engine.feed.home_feed(request(None)).await.unwrap();
    let second = engine
        .feed
        .home_feed(request(first.next_cursor.clone()))
        .await
        .unwrap();

    let a: HashSet<_> = first.item_ids().into_iter().collect();
    let b: HashSet<_> = second.item_ids().into_iter().collect();
    assert_eq!(a.len(), 8);
    assert!(!b.is_empty());
    assert!(a.is_disjoint(&b));
    for id in a.iter().chain(b.iter()) {
        assert!(!viewed.contains(*id), "{id} was already viewed");
    }
    assert!(first.has_more);
}

#[tokio::test]
async fn test_home_feed_caps_channel_runs() {
    let mut items = Vec::new();
    for n in 0..10i64 {
        items.push(ContentItem::new(format!("a{n}"), vec!["a".into()], 1_000 - n));
    }
    items.push(ContentItem::new("b0", vec!["b".into()], 500));
    items.push(ContentItem::new("b1", vec!["b".into()], 499));
    let engine = engine(items);
    let session = engine.sessions.create(None).await.unwrap();

    let batch = engine
        .feed
        .home_feed(HomeFeedRequest {
            session_id: session.session_id,
            cursor: None,
            limit: Some(12),
            max_consecutive: Some(5),
        })
        .await
        .unwrap();

    let channels: String = batch
        .items
        .iter()
        .map(|i| i.primary_channel().to_uppercase())
        .collect();
    assert_eq!(channels, "AAAAABBAAAAA");
    assert!(!batch.has_more);
}

#[tokio::test]
async fn test_home_paging_serves_every_unseen_item() {
    let mut items = Vec::new();
    for n in 0..10i64 {
        items.push(ContentItem::new(format!("a{n}"), vec!["a".into()], 1_000 - n));
    }
    items.push(ContentItem::new("b0", vec!["b".into()], 500));
    items.push(ContentItem::new("b1", vec!["b".into()], 499));
    let engine = engine(items);
    let session = engine.sessions.create(None).await.unwrap();

    let mut served = Vec::new();
    let mut cursor: Option<String> = None;
    for _ in 0..10 {
        let batch = engine
            .feed
            .home_feed(HomeFeedRequest {
                session_id: session.session_id,
                cursor: cursor.clone(),
                limit: Some(7),
                max_consecutive: Some(5),
            })
            .await
            .unwrap();
        assert!(!batch.items.is_empty() || !batch.has_more);
        served.extend(batch.item_ids().into_iter().map(str::to_string));

        if !batch.has_more {
            break;
        }
        cursor = batch.next_cursor;
    }

    let unique: HashSet<_> = served.iter().collect();
    assert_eq!(served.len(), 12);
    assert_eq!(unique.len(), 12);
}

#[tokio::test]
async fn test_mark_viewed_is_idempotent() {
    let engine = engine(sport_items());
    let session = engine.sessions.create(None).await.unwrap();
    let item = ids(&["s500"]);

    assert_eq!(engine.views.mark_viewed(&session.session_id, &item).await, Ok(1));
    assert_eq!(engine.views.mark_viewed(&session.session_id, &item).await, Ok(0));

    let stats = engine.sessions.stats(&session.session_id).await.unwrap().unwrap();
    assert_eq!(stats.total_viewed, 1);
}

#[tokio::test]
async fn test_session_expires_after_inactivity() {
    let engine = engine(sport_items());
    let session = engine.sessions.create(Some("device".into())).await.unwrap();
    assert!(engine.sessions.validate(&session.session_id).await.unwrap());

    engine.clock.advance(Duration::minutes(16));

    assert!(!engine.sessions.validate(&session.session_id).await.unwrap());
    let stored = engine
        .sessions
        .stats(&session.session_id)
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.is_active);

    let err = engine
        .feed
        .channel_feed(ChannelFeedRequest {
            session_id: session.session_id,
            channel_id: "sport".into(),
            cursor: None,
            limit: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidSession(_)));
}

#[tokio::test]
async fn test_activity_keeps_session_alive() {
    let engine = engine(sport_items());
    let session = engine.sessions.create(None).await.unwrap();

    for _ in 0..4 {
        engine.clock.advance(Duration::minutes(10));
        channel(&engine, session.session_id, None, 2).await;
    }

    let current = engine.sessions.extend(&session.session_id).await.unwrap().unwrap();
    assert_eq!(current.expires_at, current.last_activity + Duration::minutes(15));
    assert_eq!(current.last_activity, engine.clock.now());
}

#[tokio::test]
async fn test_start_reactivates_only_valid_sessions() {
    let engine = engine(Vec::new());
    let first = engine.sessions.start(None, None).await.unwrap();
    assert!(first.is_new);

    let again = engine
        .sessions
        .start(None, Some(first.session.session_id))
        .await
        .unwrap();
    assert!(!again.is_new);
    assert_eq!(again.session.session_id, first.session.session_id);

    engine.clock.advance(Duration::minutes(20));
    let replaced = engine
        .sessions
        .start(None, Some(first.session.session_id))
        .await
        .unwrap();
    assert!(replaced.is_new);
    assert_ne!(replaced.session.session_id, first.session.session_id);
}

#[tokio::test]
async fn test_cleanup_deactivates_then_deletes() {
    let engine = engine(sport_items());
    let job = SessionCleanupJob::new(engine.sessions.clone());

    let stale = engine.sessions.create(None).await.unwrap();
    engine
        .views
        .mark_viewed(&stale.session_id, &ids(&["s500"]))
        .await
        .unwrap();

    engine.clock.advance(Duration::minutes(30));
    let fresh = engine.sessions.create(None).await.unwrap();

    let run = job.run_once().await.unwrap();
    let CleanupRun::Completed(report) = run else {
        panic!("cleanup should not be skipped");
    };
    assert_eq!(report.deactivated, 1);
    assert_eq!(report.deleted, 0);
    assert_eq!(engine.store.len(), 2);

    engine.clock.advance(Duration::hours(24));
    let CleanupRun::Completed(report) = job.run_once().await.unwrap() else {
        panic!("cleanup should not be skipped");
    };
    // The fresh session has expired by now but is still inside the retention window.
    assert_eq!(report.deactivated, 1);
    assert_eq!(report.deleted, 1);
    assert!(engine.sessions.stats(&stale.session_id).await.unwrap().is_none());
    assert!(engine.sessions.stats(&fresh.session_id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_paging_with_marking_visits_each_item_once() {
    for seed in 0..25u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut watermarks: Vec<i64> = (1..=200).collect();
        watermarks.shuffle(&mut rng);

        let count = rng.random_range(1..40);
        let items: Vec<ContentItem> = watermarks
            .into_iter()
            .take(count)
            .enumerate()
            .map(|(n, wm)| {
                let channel = if rng.random_bool(0.6) { "sport" } else { "news" };
                ContentItem::new(format!("item-{n}"), vec![channel.into()], wm)
            })
            .collect();
        let expected: HashSet<String> = items
            .iter()
            .filter(|i| i.in_channel("sport"))
            .map(|i| i.item_id.clone())
            .collect();

        let engine = engine(items);
        let session = engine.sessions.create(None).await.unwrap();
        let limit = rng.random_range(1..8);

        let mut seen = HashSet::new();
        let mut cursor: Option<String> = None;
        for _ in 0..100 {
            let batch = channel(&engine, session.session_id, cursor.as_deref(), limit).await;
            let page: Vec<String> = batch.items.iter().map(|i| i.item_id.clone()).collect();
            for id in &page {
                assert!(seen.insert(id.clone()), "seed {seed}: {id} served twice");
            }
            engine.views.mark_viewed(&session.session_id, &page).await.unwrap();

            if !batch.has_more {
                break;
            }
            cursor = batch.next_cursor;
        }

        assert_eq!(seen, expected, "seed {seed}");
        assert!(engine.content.len() >= expected.len());
    }
}

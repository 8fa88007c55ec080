//! End-to-end tests for the retention engine
//!
//! These drive the real components (fjall store, ledger with memory cache,
//! lane board, tick runner) against a manual clock and a scripted deleter:
//! set-ttl → message intake → tick → remote delete → ledger retired, plus
//! the restart/backfill and failure paths.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::Mutex;

use lethe::backfill::backfill_lanes;
use lethe::cache::MemoryCache;
use lethe::clock::{Clock, ManualClock};
use lethe::directory::StaticDirectory;
use lethe::intake::Intake;
use lethe::lanes::LaneBoard;
use lethe::ledger::{ChannelRef, MessageRef, RetentionLedger};
use lethe::observability::Metrics;
use lethe::store::RetentionStore;
use lethe::worker::{MessageDeleter, MockDeleter, TickRunner};

struct Engine {
    intake: Intake,
    runner: Arc<TickRunner>,
    ledger: Arc<RetentionLedger>,
    lanes: Arc<Mutex<LaneBoard>>,
    deleter: Arc<MockDeleter>,
    clock: Arc<ManualClock>,
    metrics: Arc<Metrics>,
}

fn build_engine(store: RetentionStore, now: u64) -> Engine {
    let metrics = Arc::new(Metrics::new());
    let clock = Arc::new(ManualClock::at(now));
    let ledger = Arc::new(RetentionLedger::new(
        store,
        Arc::new(MemoryCache::new()),
        Duration::from_secs(3600),
        Arc::clone(&metrics),
    ));
    let lanes = Arc::new(Mutex::new(LaneBoard::new()));
    let deleter = Arc::new(MockDeleter::new());

    let intake = Intake::new(
        Arc::clone(&ledger),
        Arc::clone(&lanes),
        clock.clone() as Arc<dyn Clock>,
        Arc::clone(&metrics),
    );
    let runner = Arc::new(TickRunner::new(
        Arc::clone(&lanes),
        Arc::clone(&ledger),
        deleter.clone() as Arc<dyn MessageDeleter>,
        clock.clone() as Arc<dyn Clock>,
        Arc::clone(&metrics),
        100,
    ));

    Engine {
        intake,
        runner,
        ledger,
        lanes,
        deleter,
        clock,
        metrics,
    }
}

fn open_store(temp: &TempDir) -> RetentionStore {
    RetentionStore::open(temp.path().join("retention")).unwrap()
}

#[tokio::test]
async fn message_lifecycle_set_ttl_to_deletion() {
    let temp = TempDir::new().unwrap();
    let engine = build_engine(open_store(&temp), 1000);

    engine
        .ledger
        .set_ttl(&ChannelRef::new("g1", "c1"), 60)
        .await
        .unwrap();

    let message = MessageRef::new("g1", "c1", "m1");
    let expires_at = engine.intake.on_message_create(&message).await.unwrap();
    assert_eq!(expires_at, Some(1060));
    assert_eq!(
        engine.ledger.get_expiry(&message, true).await.unwrap(),
        Some(1060)
    );

    // Not yet due: the tick leaves everything in place
    engine.clock.set(1059);
    engine.runner.run_tick().await;
    assert!(engine.deleter.deleted().is_empty());
    assert!(engine.lanes.lock().await.contains(1060, "m1"));

    // Due: deleted remotely, retired from lane and ledger
    engine.clock.set(1060);
    engine.runner.run_tick().await;
    assert_eq!(
        engine.deleter.deleted(),
        vec![("c1".to_string(), "m1".to_string())]
    );
    assert!(!engine.lanes.lock().await.contains(1060, "m1"));
    assert_eq!(engine.ledger.get_expiry(&message, true).await.unwrap(), None);
    assert_eq!(engine.lanes.lock().await.lane_count(), 0);

    let snap = engine.metrics.snapshot();
    assert_eq!(snap.messages_scheduled, 1);
    assert_eq!(snap.deletions_succeeded, 1);
}

#[tokio::test]
async fn failed_deletion_is_unprocessable_and_never_retried() {
    let temp = TempDir::new().unwrap();
    let engine = build_engine(open_store(&temp), 1000);

    engine
        .ledger
        .set_ttl(&ChannelRef::new("g1", "c1"), 60)
        .await
        .unwrap();

    let ok = MessageRef::new("g1", "c1", "m1");
    let broken = MessageRef::new("g1", "c1", "m2");
    engine.intake.on_message_create(&ok).await.unwrap();
    engine.intake.on_message_create(&broken).await.unwrap();
    engine.deleter.fail_message("m2");

    engine.clock.set(1060);
    engine.runner.run_tick().await;

    // The failure stays contained to m2; m1 is deleted normally
    assert_eq!(
        engine.deleter.deleted(),
        vec![("c1".to_string(), "m1".to_string())]
    );

    // m2 is gone from lane and ledger and gets no second attempt
    assert_eq!(engine.lanes.lock().await.entry_count(), 0);
    assert_eq!(engine.ledger.get_expiry(&broken, true).await.unwrap(), None);

    let calls_after_first_tick = engine.deleter.calls();
    engine.clock.advance(10);
    engine.runner.run_tick().await;
    assert_eq!(engine.deleter.calls(), calls_after_first_tick);

    assert_eq!(engine.metrics.snapshot().deletions_failed, 1);
}

#[tokio::test]
async fn restart_backfills_pending_work() {
    let temp = TempDir::new().unwrap();

    // First process run: schedule work, then go down before it is due
    {
        let engine = build_engine(open_store(&temp), 1000);
        engine
            .ledger
            .set_ttl(&ChannelRef::new("g1", "c1"), 60)
            .await
            .unwrap();
        engine
            .intake
            .on_message_create(&MessageRef::new("g1", "c1", "m1"))
            .await
            .unwrap();
        engine.ledger.store().persist().unwrap();
    }

    // Second process run: lanes start empty, backfill restores the entry
    let engine = build_engine(open_store(&temp), 1100);
    assert_eq!(engine.lanes.lock().await.entry_count(), 0);

    let mut guilds = HashMap::new();
    guilds.insert("g1".to_string(), vec!["c1".to_string()]);
    let directory = StaticDirectory::new(guilds);

    let report = backfill_lanes(
        &engine.ledger,
        &engine.lanes,
        &directory,
        engine.clock.as_ref(),
        1800,
        &engine.metrics,
    )
    .await
    .unwrap();
    assert_eq!(report.enqueued, 1);
    assert!(engine.lanes.lock().await.contains(1060, "m1"));

    engine.runner.run_tick().await;
    assert_eq!(
        engine.deleter.deleted(),
        vec![("c1".to_string(), "m1".to_string())]
    );
    assert_eq!(
        engine
            .ledger
            .get_expiry(&MessageRef::new("g1", "c1", "m1"), true)
            .await
            .unwrap(),
        None
    );
}

#[tokio::test]
async fn backfill_drops_entries_for_vanished_channels() {
    let temp = TempDir::new().unwrap();

    {
        let engine = build_engine(open_store(&temp), 400);
        engine
            .ledger
            .schedule_expiry(&MessageRef::new("g1", "c-gone", "m1"), 500)
            .await
            .unwrap();
        engine.ledger.store().persist().unwrap();
    }

    let engine = build_engine(open_store(&temp), 1000);

    let mut guilds = HashMap::new();
    guilds.insert("g1".to_string(), vec!["c1".to_string()]);
    let directory = StaticDirectory::new(guilds);

    let report = backfill_lanes(
        &engine.ledger,
        &engine.lanes,
        &directory,
        engine.clock.as_ref(),
        1800,
        &engine.metrics,
    )
    .await
    .unwrap();

    assert_eq!(report.orphaned, 1);
    assert_eq!(engine.lanes.lock().await.entry_count(), 0);
    assert_eq!(
        engine
            .ledger
            .get_expiry(&MessageRef::new("g1", "c-gone", "m1"), true)
            .await
            .unwrap(),
        None
    );

    // No delete is ever attempted for the orphan
    engine.runner.run_tick().await;
    assert_eq!(engine.deleter.calls(), 0);
}

#[tokio::test]
async fn entries_enqueued_mid_tick_wait_for_the_next_tick() {
    let temp = TempDir::new().unwrap();
    let engine = build_engine(open_store(&temp), 1000);

    engine
        .ledger
        .set_ttl(&ChannelRef::new("g1", "c1"), 60)
        .await
        .unwrap();
    engine
        .intake
        .on_message_create(&MessageRef::new("g1", "c1", "m1"))
        .await
        .unwrap();

    engine.clock.set(1060);
    engine.deleter.set_delay(Duration::from_millis(100));

    let runner = Arc::clone(&engine.runner);
    let tick = tokio::spawn(async move { runner.run_tick().await });
    tokio::time::sleep(Duration::from_millis(20)).await;

    // m2 arrives while the tick is still draining lane 1060. Intake at
    // clock 1060 with a 60s policy puts it in lane 1120, which is not in
    // the running tick's due snapshot, so it must wait for a later tick.
    engine
        .intake
        .on_message_create(&MessageRef::new("g1", "c1", "m2"))
        .await
        .unwrap();

    assert!(tick.await.unwrap());
    assert_eq!(engine.deleter.deleted().len(), 1);

    engine.clock.set(1120);
    engine.runner.run_tick().await;
    assert_eq!(engine.deleter.deleted().len(), 2);
}

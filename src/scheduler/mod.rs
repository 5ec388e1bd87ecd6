//! Timing for poll cycles.
//!
//! A single actor task owns the refresh timer and the in-flight cycle. It is
//! driven by [`SchedulerHandle`] calls and by change notifications for
//! `selectedFeeds` and `refreshIntervalMin` from the store. At most one cycle
//! runs at a time; triggers that arrive meanwhile collapse into one follow-up.

mod handle;
mod messages;
mod runner;

pub use handle::SchedulerHandle;
pub use messages::{SchedulerError, SchedulerMessage};
pub use runner::SchedulerActor;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::domain::keys;
use crate::store::Store;

/// One poll cycle. Implementations absorb their own errors.
#[async_trait]
pub trait CycleRunner: Send + Sync + 'static {
    async fn run_cycle(&self);
}

/// Spawn the scheduler actor and its store listeners.
///
/// Subscriptions are taken before this returns, so any store write made
/// afterwards is observed. Polling begins with [`SchedulerHandle::start`].
pub fn spawn(
    runner: Arc<dyn CycleRunner>,
    store: Arc<dyn Store>,
    default_interval_min: u64,
) -> SchedulerHandle {
    let (tx, rx) = mpsc::channel(32);
    let handle = SchedulerHandle::new(tx);

    let selection_rx = store.subscribe(keys::SELECTED_FEEDS);
    let interval_rx = store.subscribe(keys::REFRESH_INTERVAL_MIN);

    let listeners = vec![
        listen(selection_rx, handle.clone(), |_| SchedulerMessage::SelectionChanged),
        listen(interval_rx, handle.clone(), |value| {
            SchedulerMessage::IntervalChanged(value.and_then(|v| interval_from_value(&v)))
        }),
    ];

    let mut actor = SchedulerActor::new(runner, store, default_interval_min, rx);
    actor.attach_listeners(listeners);
    tokio::spawn(actor.run());

    handle
}

/// Forward one key's notifications to the actor.
///
/// A lagged receiver has lost values, so the message is built from `None`
/// and the actor reads the current value itself.
fn listen<F>(
    mut rx: broadcast::Receiver<Value>,
    handle: SchedulerHandle,
    to_message: F,
) -> JoinHandle<()>
where
    F: Fn(Option<Value>) -> SchedulerMessage + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            let msg = match rx.recv().await {
                Ok(value) => to_message(Some(value)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Missed {} store notifications", skipped);
                    to_message(None)
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };

            if let Err(e) = handle.send(msg).await {
                tracing::debug!("Store listener exiting: {}", e);
                break;
            }
        }
    })
}

/// Minutes from a stored `refreshIntervalMin` value.
///
/// Accepts a positive integer or a string holding one.
pub fn interval_from_value(value: &Value) -> Option<u64> {
    let minutes = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;

    (minutes > 0).then_some(minutes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use serde_json::json;

    use crate::store::{MemoryStore, SqliteStore, StoreExt};

    const MIN: Duration = Duration::from_secs(60);

    #[derive(Default)]
    struct CountingRunner {
        cycles: AtomicUsize,
        running: AtomicUsize,
        peak: AtomicUsize,
        work: Duration,
    }

    impl CountingRunner {
        fn slow(work: Duration) -> Self {
            Self {
                work,
                ..Self::default()
            }
        }

        fn cycles(&self) -> usize {
            self.cycles.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CycleRunner for CountingRunner {
        async fn run_cycle(&self) {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            if !self.work.is_zero() {
                tokio::time::sleep(self.work).await;
            }
            self.running.fetch_sub(1, Ordering::SeqCst);
            self.cycles.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Let every ready task run before the paused clock moves on.
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    fn setup(runner: CountingRunner) -> (Arc<CountingRunner>, Arc<MemoryStore>, SchedulerHandle) {
        let runner = Arc::new(runner);
        let store = Arc::new(MemoryStore::new());
        let handle = spawn(runner.clone(), store.clone(), 15);
        (runner, store, handle)
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_polls_immediately_then_on_timer() {
        let (runner, _store, handle) = setup(CountingRunner::default());

        handle.start().await.unwrap();
        settle().await;
        assert_eq!(runner.cycles(), 1);

        tokio::time::sleep(14 * MIN).await;
        assert_eq!(runner.cycles(), 1);

        tokio::time::sleep(MIN).await;
        settle().await;
        assert_eq!(runner.cycles(), 2);

        tokio::time::sleep(15 * MIN).await;
        settle().await;
        assert_eq!(runner.cycles(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_reads_stored_interval() {
        let (runner, store, handle) = setup(CountingRunner::default());
        store.set(keys::REFRESH_INTERVAL_MIN, &5).unwrap();

        handle.start().await.unwrap();
        settle().await;
        tokio::time::sleep(5 * MIN).await;
        settle().await;
        assert_eq!(runner.cycles(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_selection_change_polls_without_moving_timer() {
        let (runner, store, handle) = setup(CountingRunner::default());
        handle.start().await.unwrap();
        settle().await;

        tokio::time::sleep(5 * MIN).await;
        store.set(keys::SELECTED_FEEDS, &["bbc-news"]).unwrap();
        settle().await;
        assert_eq!(runner.cycles(), 2);

        // Original schedule: next tick still at 15 minutes
        tokio::time::sleep(10 * MIN).await;
        settle().await;
        assert_eq!(runner.cycles(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_change_rearms_without_polling() {
        let (runner, store, handle) = setup(CountingRunner::default());
        handle.start().await.unwrap();
        settle().await;

        tokio::time::sleep(10 * MIN).await;
        store.set(keys::REFRESH_INTERVAL_MIN, &30).unwrap();
        settle().await;
        assert_eq!(runner.cycles(), 1);

        // The old 15 minute tick was cancelled
        tokio::time::sleep(6 * MIN).await;
        assert_eq!(runner.cycles(), 1);

        // New tick lands 30 minutes after the change
        tokio::time::sleep(25 * MIN).await;
        settle().await;
        assert_eq!(runner.cycles(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_interval_change() {
        let (runner, _store, handle) = setup(CountingRunner::default());
        handle.start().await.unwrap();
        handle.on_interval_changed(2).await.unwrap();
        settle().await;

        tokio::time::sleep(2 * MIN).await;
        settle().await;
        assert_eq!(runner.cycles(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_interval_falls_back_to_default() {
        let (runner, store, handle) = setup(CountingRunner::default());
        store.set(keys::REFRESH_INTERVAL_MIN, &5).unwrap();
        handle.start().await.unwrap();
        settle().await;

        store.set(keys::REFRESH_INTERVAL_MIN, "soon").unwrap();
        settle().await;

        tokio::time::sleep(14 * MIN).await;
        assert_eq!(runner.cycles(), 1);

        tokio::time::sleep(MIN).await;
        settle().await;
        assert_eq!(runner.cycles(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_falls_back_to_default() {
        let (runner, _store, handle) = setup(CountingRunner::default());
        handle.start().await.unwrap();
        handle.on_interval_changed(0).await.unwrap();
        settle().await;

        tokio::time::sleep(15 * MIN).await;
        settle().await;
        assert_eq!(runner.cycles(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_triggers_coalesce() {
        let (runner, _store, handle) = setup(CountingRunner::slow(Duration::from_secs(10)));
        handle.start().await.unwrap();
        settle().await;

        for _ in 0..3 {
            handle.on_selection_changed().await.unwrap();
        }
        settle().await;

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(runner.cycles(), 2);
        assert_eq!(runner.peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_selection_before_start_is_ignored() {
        let (runner, store, _handle) = setup(CountingRunner::default());
        store.set(keys::SELECTED_FEEDS, &["cnn"]).unwrap();
        settle().await;
        assert_eq!(runner.cycles(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_waits_for_cycle_and_disarms() {
        let (runner, store, handle) = setup(CountingRunner::slow(Duration::from_secs(5)));
        handle.start().await.unwrap();
        settle().await;

        handle.stop().await.unwrap();
        assert_eq!(runner.cycles(), 1);

        store.set(keys::SELECTED_FEEDS, &["cnn"]).unwrap();
        tokio::time::sleep(60 * MIN).await;
        assert_eq!(runner.cycles(), 1);
        assert!(handle.start().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_interval_rereads_store() {
        let (runner, store, handle) = setup(CountingRunner::default());
        handle.start().await.unwrap();
        settle().await;

        store.set(keys::REFRESH_INTERVAL_MIN, &5).unwrap();
        handle.send(SchedulerMessage::IntervalChanged(None)).await.unwrap();
        settle().await;

        tokio::time::sleep(5 * MIN).await;
        settle().await;
        assert_eq!(runner.cycles(), 2);
    }

    #[tokio::test]
    async fn test_selection_written_by_another_process_polls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("headliner.db");

        let runner = Arc::new(CountingRunner::default());
        let daemon = Arc::new(SqliteStore::new(&path).unwrap());
        let handle = spawn(runner.clone(), daemon, 15);
        handle.start().await.unwrap();

        let cli = SqliteStore::new(&path).unwrap();
        cli.set(keys::SELECTED_FEEDS, &["cnn"]).unwrap();

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while runner.cycles() < 2 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(runner.cycles(), 2);

        handle.stop().await.unwrap();
    }

    #[test]
    fn test_interval_from_value() {
        assert_eq!(interval_from_value(&json!(30)), Some(30));
        assert_eq!(interval_from_value(&json!(" 45 ")), Some(45));
        assert_eq!(interval_from_value(&json!(0)), None);
        assert_eq!(interval_from_value(&json!(-5)), None);
        assert_eq!(interval_from_value(&json!(2.5)), None);
        assert_eq!(interval_from_value(&json!("soon")), None);
        assert_eq!(interval_from_value(&json!(null)), None);
    }
}

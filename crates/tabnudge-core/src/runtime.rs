//! Tokio event loops for the contexts.
//!
//! Each context owns one unbounded FIFO queue. Handlers run to completion
//! before the next event is taken, and timers and store changes are
//! posted into the same queue as every other event.
//!
//! Timer tasks hold sender clones, so a queue never closes while timers
//! are pending. Loops end on an explicit `Shutdown`/`Unload` event.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::background::BackgroundContext;
use crate::content::ContentContext;
use crate::events::{BackgroundEvent, ContentEvent};
use crate::host::{RandomSource, TabHost, TimerId, Timers};
use crate::storage::{KvStore, StorageChange};
use crate::suggestion::Document;

/// Slowest accepted time factor.
pub const MIN_SPEED: f64 = 0.001;

/// Longest delay a timer is armed for after scaling.
const MAX_TIMER_DELAY: Duration = Duration::from_secs(365 * 24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Stop,
}

/// A single-threaded event handler.
pub trait Context {
    type Event;

    fn dispatch(&mut self, event: Self::Event) -> Control;
}

/// Drain `rx` into `ctx` until a handler stops or the queue closes.
/// Returns the context for inspection.
pub async fn run<C: Context>(mut ctx: C, mut rx: mpsc::UnboundedReceiver<C::Event>) -> C {
    while let Some(event) = rx.recv().await {
        if ctx.dispatch(event) == Control::Stop {
            break;
        }
    }
    ctx
}

pub async fn run_background<H: TabHost, T: Timers>(
    ctx: BackgroundContext<H, T>,
    rx: mpsc::UnboundedReceiver<BackgroundEvent>,
) -> BackgroundContext<H, T> {
    let ctx = run(ctx, rx).await;
    debug!("background loop finished");
    ctx
}

pub async fn run_content<D: Document, T: Timers, R: RandomSource>(
    ctx: ContentContext<D, T, R>,
    rx: mpsc::UnboundedReceiver<ContentEvent>,
) -> ContentContext<D, T, R> {
    let ctx = run(ctx, rx).await;
    debug!(url = ctx.page_url(), "content loop finished");
    ctx
}

/// Timer source that posts expirations into a context's queue.
///
/// Must be used from within a tokio runtime. Dropping it aborts all
/// pending timers.
pub struct TokioTimers<E> {
    tx: mpsc::UnboundedSender<E>,
    wrap: fn(TimerId) -> E,
    tasks: HashMap<TimerId, JoinHandle<()>>,
    next_id: u64,
    speed: f64,
}

impl<E: Send + 'static> TokioTimers<E> {
    pub fn new(tx: mpsc::UnboundedSender<E>, wrap: fn(TimerId) -> E) -> Self {
        Self {
            tx,
            wrap,
            tasks: HashMap::new(),
            next_id: 1,
            speed: 1.0,
        }
    }

    /// Divide every delay by `speed`, raised to at least [`MIN_SPEED`].
    /// Non-finite values and values below or equal to zero are ignored.
    pub fn with_speed(mut self, speed: f64) -> Self {
        if speed.is_finite() && speed > 0.0 {
            self.speed = speed.max(MIN_SPEED);
        }
        self
    }

    fn scaled(&self, delay: Duration) -> Duration {
        Duration::try_from_secs_f64(delay.as_secs_f64() / self.speed)
            .map(|d| d.min(MAX_TIMER_DELAY))
            .unwrap_or(MAX_TIMER_DELAY)
    }

    pub fn pending_count(&self) -> usize {
        self.tasks.values().filter(|t| !t.is_finished()).count()
    }
}

impl<E: Send + 'static> Timers for TokioTimers<E> {
    fn schedule(&mut self, delay: Duration) -> TimerId {
        self.tasks.retain(|_, task| !task.is_finished());

        let id = TimerId(self.next_id);
        self.next_id += 1;
        let delay = self.scaled(delay);
        let tx = self.tx.clone();
        let event = (self.wrap)(id);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(event).is_err() {
                debug!(timer = %id, "context gone before timer fired");
            }
        });
        self.tasks.insert(id, task);
        id
    }

    fn cancel(&mut self, id: TimerId) {
        if let Some(task) = self.tasks.remove(&id) {
            task.abort();
        }
    }
}

impl<E> Drop for TokioTimers<E> {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}

/// Relay store changes into a context queue until either side closes.
pub fn spawn_store_forwarder<E: Send + 'static>(
    store: &dyn KvStore,
    tx: mpsc::UnboundedSender<E>,
    wrap: fn(StorageChange) -> E,
) -> JoinHandle<()> {
    let mut changes = store.subscribe();
    tokio::spawn(async move {
        loop {
            match changes.recv().await {
                Ok(change) => {
                    if tx.send(wrap(change)).is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "store change listener lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{keys, LocalStore};
    use serde_json::json;

    struct Counter {
        seen: Vec<u32>,
    }

    impl Context for Counter {
        type Event = u32;

        fn dispatch(&mut self, event: u32) -> Control {
            self.seen.push(event);
            if event == 0 {
                Control::Stop
            } else {
                Control::Continue
            }
        }
    }

    #[tokio::test]
    async fn run_processes_in_fifo_order_until_stop() {
        let (tx, rx) = mpsc::unbounded_channel();
        for n in [3, 1, 2, 0, 9] {
            tx.send(n).unwrap();
        }
        let ctx = run(Counter { seen: Vec::new() }, rx).await;
        assert_eq!(ctx.seen, vec![3, 1, 2, 0]);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_timers_fire_and_cancel() {
        let (tx, mut rx) = mpsc::unbounded_channel::<TimerId>();
        let mut timers = TokioTimers::new(tx, |id| id);
        let cancelled = timers.schedule(Duration::from_millis(10));
        let kept = timers.schedule(Duration::from_millis(20));
        timers.cancel(cancelled);

        assert_eq!(rx.recv().await, Some(kept));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_timers_aborts_pending() {
        let (tx, mut rx) = mpsc::unbounded_channel::<TimerId>();
        let keep_open = tx.clone();
        let mut timers = TokioTimers::new(tx, |id| id);
        timers.schedule(Duration::from_millis(10));
        drop(timers);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
        drop(keep_open);
    }

    #[tokio::test(start_paused = true)]
    async fn speed_scales_delays() {
        let (tx, mut rx) = mpsc::unbounded_channel::<TimerId>();
        let mut timers = TokioTimers::new(tx, |id| id).with_speed(100.0);
        let start = tokio::time::Instant::now();
        let id = timers.schedule(Duration::from_secs(10));
        assert_eq!(rx.recv().await, Some(id));
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn extreme_speeds_do_not_panic() {
        let (tx, mut rx) = mpsc::unbounded_channel::<TimerId>();
        let mut slow = TokioTimers::new(tx.clone(), |id| id).with_speed(1e-300);
        slow.schedule(Duration::from_secs(5));
        slow.schedule(Duration::MAX);
        assert_eq!(slow.pending_count(), 2);

        let mut fast = TokioTimers::new(tx, |id| id).with_speed(f64::MAX);
        let id = fast.schedule(Duration::from_secs(5));
        assert_eq!(rx.recv().await, Some(id));
    }

    #[test]
    fn slow_speed_is_clamped_and_delay_capped() {
        let (tx, _rx) = mpsc::unbounded_channel::<TimerId>();
        let timers = TokioTimers::new(tx, |id| id).with_speed(1e-300);
        assert_eq!(timers.speed, MIN_SPEED);
        assert_eq!(timers.scaled(Duration::from_secs(5)), Duration::from_secs(5_000));
        assert_eq!(timers.scaled(Duration::MAX), MAX_TIMER_DELAY);

        let (tx, _rx) = mpsc::unbounded_channel::<TimerId>();
        let ignored = TokioTimers::new(tx, |id| id).with_speed(f64::NAN);
        assert_eq!(ignored.speed, 1.0);
    }

    #[tokio::test]
    async fn forwarder_relays_store_changes() {
        let store = LocalStore::in_memory();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = spawn_store_forwarder(&store, tx, |c: StorageChange| c);
        store.set_value(keys::IN_TESTING_MODE, json!(true)).unwrap();

        let change = rx.recv().await.unwrap();
        assert_eq!(change.key, keys::IN_TESTING_MODE);
        assert_eq!(change.new_value, Some(json!(true)));
        handle.abort();
    }
}

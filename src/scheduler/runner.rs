use std::future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use super::messages::SchedulerMessage;
use super::{interval_from_value, CycleRunner};
use crate::domain::{keys, DEFAULT_REFRESH_INTERVAL_MIN};
use crate::store::Store;

/// Owns the poll timer and serializes poll cycles.
pub struct SchedulerActor {
    runner: Arc<dyn CycleRunner>,
    store: Arc<dyn Store>,
    default_interval_min: u64,
    receiver: mpsc::Receiver<SchedulerMessage>,
    timer: Option<Interval>,
    in_flight: Option<JoinHandle<()>>,
    rerun_pending: bool,
    listeners: Vec<JoinHandle<()>>,
}

impl SchedulerActor {
    pub fn new(
        runner: Arc<dyn CycleRunner>,
        store: Arc<dyn Store>,
        default_interval_min: u64,
        receiver: mpsc::Receiver<SchedulerMessage>,
    ) -> Self {
        Self {
            runner,
            store,
            default_interval_min,
            receiver,
            timer: None,
            in_flight: None,
            rerun_pending: false,
            listeners: Vec::new(),
        }
    }

    /// Tasks forwarding store notifications; aborted when the actor exits.
    pub fn attach_listeners(&mut self, listeners: Vec<JoinHandle<()>>) {
        self.listeners.extend(listeners);
    }

    pub async fn run(mut self) {
        tracing::info!("Scheduler started");

        loop {
            tokio::select! {
                msg = self.receiver.recv() => match msg {
                    Some(SchedulerMessage::Stop { reply }) => {
                        self.shutdown().await;
                        let _ = reply.send(());
                        break;
                    }
                    Some(msg) => self.handle_message(msg),
                    None => {
                        self.shutdown().await;
                        break;
                    }
                },
                _ = next_tick(&mut self.timer) => {
                    tracing::debug!("Refresh timer fired");
                    self.trigger_cycle();
                }
                result = cycle_finished(&mut self.in_flight) => {
                    self.on_cycle_finished(result);
                }
            }
        }

        tracing::info!("Scheduler stopped");
    }

    fn handle_message(&mut self, msg: SchedulerMessage) {
        match msg {
            SchedulerMessage::Start => {
                if self.timer.is_some() {
                    tracing::debug!("Scheduler already started");
                    return;
                }
                let minutes = self.stored_interval();
                self.trigger_cycle();
                self.arm(minutes);
            }

            SchedulerMessage::SelectionChanged => {
                if self.timer.is_none() {
                    tracing::debug!("Selection changed before start, ignoring");
                    return;
                }
                tracing::info!("Feed selection changed, polling now");
                self.trigger_cycle();
            }

            SchedulerMessage::IntervalChanged(minutes) => {
                if self.timer.is_none() {
                    tracing::debug!("Interval changed before start, will be read on start");
                    return;
                }
                let minutes = minutes.or_else(|| self.stored_interval());
                self.arm(minutes);
            }

            // Handled in the run loop
            SchedulerMessage::Stop { .. } => {}
        }
    }

    /// Start a cycle, or queue one follow-up if a cycle is running.
    fn trigger_cycle(&mut self) {
        if self.in_flight.is_some() {
            if !self.rerun_pending {
                tracing::debug!("Poll cycle in flight, queueing one follow-up");
            }
            self.rerun_pending = true;
            return;
        }

        let runner = self.runner.clone();
        self.in_flight = Some(tokio::spawn(async move {
            runner.run_cycle().await;
        }));
    }

    fn on_cycle_finished(&mut self, result: Result<(), JoinError>) {
        self.in_flight = None;

        if let Err(e) = result {
            tracing::error!("Poll cycle task failed: {}", e);
        }

        if self.rerun_pending {
            self.rerun_pending = false;
            self.trigger_cycle();
        }
    }

    /// Replace the timer. Unusable intervals fall back to the default.
    fn arm(&mut self, minutes: Option<u64>) {
        let schedule = match minutes.and_then(schedule_for) {
            Some(schedule) => {
                tracing::info!("Refresh timer armed at {} min", schedule.1.as_secs() / 60);
                schedule
            }
            None => {
                tracing::error!(
                    "Invalid refresh interval {:?}, falling back to {} min",
                    minutes,
                    self.default_interval_min
                );
                schedule_for(self.default_interval_min)
                    .or_else(|| schedule_for(DEFAULT_REFRESH_INTERVAL_MIN))
                    .unwrap_or_else(|| {
                        let period = Duration::from_secs(DEFAULT_REFRESH_INTERVAL_MIN * 60);
                        (Instant::now() + period, period)
                    })
            }
        };

        let (first_tick, period) = schedule;
        let mut timer = time::interval_at(first_tick, period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.timer = Some(timer);
    }

    /// The interval currently stored, if any.
    ///
    /// An absent key means the default; a present but unusable one is
    /// reported as `None` so `arm` logs it.
    fn stored_interval(&self) -> Option<u64> {
        match self.store.get_raw(keys::REFRESH_INTERVAL_MIN) {
            Ok(None) => Some(self.default_interval_min),
            Ok(Some(value)) => interval_from_value(&value),
            Err(e) => {
                tracing::error!("Failed to read refresh interval: {}", e);
                None
            }
        }
    }

    async fn shutdown(&mut self) {
        self.timer = None;
        self.rerun_pending = false;

        for listener in self.listeners.drain(..) {
            listener.abort();
        }

        if let Some(handle) = self.in_flight.take() {
            tracing::info!("Waiting for running poll cycle to finish");
            if let Err(e) = handle.await {
                tracing::error!("Poll cycle task failed: {}", e);
            }
        }
    }
}

/// First tick and period for a timer of `minutes`, if representable.
fn schedule_for(minutes: u64) -> Option<(Instant, Duration)> {
    if minutes == 0 {
        return None;
    }
    let period = Duration::from_secs(minutes.checked_mul(60)?);
    let first_tick = Instant::now().checked_add(period)?;
    Some((first_tick, period))
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => future::pending::<()>().await,
    }
}

async fn cycle_finished(in_flight: &mut Option<JoinHandle<()>>) -> Result<(), JoinError> {
    match in_flight {
        Some(handle) => handle.await,
        None => future::pending().await,
    }
}

use tokio::sync::{mpsc, oneshot};

use super::messages::{SchedulerError, SchedulerMessage};

/// Cloneable front door to the scheduler actor.
#[derive(Clone)]
pub struct SchedulerHandle {
    sender: mpsc::Sender<SchedulerMessage>,
}

impl SchedulerHandle {
    pub fn new(sender: mpsc::Sender<SchedulerMessage>) -> Self {
        Self { sender }
    }

    /// Run a cycle immediately and arm the repeating timer.
    pub async fn start(&self) -> Result<(), SchedulerError> {
        self.send(SchedulerMessage::Start).await
    }

    /// Run an out-of-band cycle. The timer keeps its schedule.
    pub async fn on_selection_changed(&self) -> Result<(), SchedulerError> {
        self.send(SchedulerMessage::SelectionChanged).await
    }

    /// Replace the timer with one at `minutes`. Does not poll by itself.
    ///
    /// Zero is rejected by the actor, which falls back to the default.
    pub async fn on_interval_changed(&self, minutes: u64) -> Result<(), SchedulerError> {
        self.send(SchedulerMessage::IntervalChanged(Some(minutes)))
            .await
    }

    /// Stop the timer and wait for any running cycle to finish.
    pub async fn stop(&self) -> Result<(), SchedulerError> {
        let (reply, rx) = oneshot::channel();
        self.send(SchedulerMessage::Stop { reply }).await?;
        rx.await.map_err(|_| SchedulerError::ServiceUnavailable)
    }

    pub(super) async fn send(&self, msg: SchedulerMessage) -> Result<(), SchedulerError> {
        self.sender
            .send(msg)
            .await
            .map_err(|_| SchedulerError::ServiceUnavailable)
    }
}

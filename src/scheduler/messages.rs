use tokio::sync::oneshot;

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("Scheduler is not running")]
    ServiceUnavailable,
}

/// Commands understood by the scheduler actor.
#[derive(Debug)]
pub enum SchedulerMessage {
    /// Poll now, then arm the timer.
    Start,

    /// `selectedFeeds` changed; poll out of band.
    SelectionChanged,

    /// `refreshIntervalMin` changed. `None` means re-read the stored value.
    IntervalChanged(Option<u64>),

    /// Disarm, let the running cycle finish, then exit.
    Stop { reply: oneshot::Sender<()> },
}

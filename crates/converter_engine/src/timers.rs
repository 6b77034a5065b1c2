use std::sync::{mpsc, Arc};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{AttemptId, EngineEvent};

#[derive(Debug, Clone)]
pub struct TimerSettings {
    pub progress_interval: Duration,
    pub elapsed_interval: Duration,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            progress_interval: Duration::from_millis(200),
            elapsed_interval: Duration::from_millis(100),
        }
    }
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// The progress and elapsed-time timers of one attempt.
///
/// Both tasks share a cancellation token. Cancelling (or dropping) the
/// handle stops them; a tick already in the channel may still be delivered,
/// which the state machine ignores once the attempt is over.
pub struct AttemptTimers {
    attempt: AttemptId,
    token: CancellationToken,
}

impl AttemptTimers {
    pub fn start(
        runtime: &Handle,
        attempt: AttemptId,
        settings: &TimerSettings,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let token = CancellationToken::new();

        runtime.spawn(run_timer(
            settings.progress_interval,
            token.clone(),
            sink.clone(),
            move |_| EngineEvent::ProgressTick { attempt },
        ));
        runtime.spawn(run_timer(
            settings.elapsed_interval,
            token.clone(),
            sink,
            move |period| EngineEvent::ElapsedTick {
                attempt,
                delta_secs: period.as_secs_f64(),
            },
        ));

        Self { attempt, token }
    }

    pub fn attempt(&self) -> AttemptId {
        self.attempt
    }

    /// Token observed by both timer tasks.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for AttemptTimers {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn run_timer<F>(
    period: Duration,
    token: CancellationToken,
    sink: Arc<dyn EventSink>,
    make_event: F,
) where
    F: Fn(Duration) -> EngineEvent + Send + 'static,
{
    let period = period.max(Duration::from_millis(1));
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                if token.is_cancelled() {
                    break;
                }
                sink.emit(make_event(period));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CollectingSink {
        events: Mutex<Vec<EngineEvent>>,
    }

    impl EventSink for CollectingSink {
        fn emit(&self, event: EngineEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl CollectingSink {
        fn len(&self) -> usize {
            self.events.lock().unwrap().len()
        }
    }

    fn fast() -> TimerSettings {
        TimerSettings {
            progress_interval: Duration::from_millis(10),
            elapsed_interval: Duration::from_millis(5),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn timers_tick_until_cancelled() {
        let sink = Arc::new(CollectingSink::default());
        let timers = AttemptTimers::start(&Handle::current(), 3, &fast(), sink.clone());

        tokio::time::sleep(Duration::from_millis(80)).await;
        timers.cancel();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let after_cancel = sink.len();
        assert!(after_cancel > 0);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(sink.len(), after_cancel);

        let events = sink.events.lock().unwrap();
        assert!(events
            .iter()
            .any(|e| matches!(e, EngineEvent::ProgressTick { attempt: 3 })));
        assert!(events.iter().any(|e| matches!(
            e,
            EngineEvent::ElapsedTick { attempt: 3, delta_secs } if (*delta_secs - 0.005).abs() < 1e-9
        )));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn dropping_the_handle_stops_ticks() {
        let sink = Arc::new(CollectingSink::default());
        let timers = AttemptTimers::start(&Handle::current(), 1, &fast(), sink.clone());
        let token = timers.token();
        drop(timers);
        assert!(token.is_cancelled());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(sink.len(), 0);
    }
}

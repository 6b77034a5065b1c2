use std::collections::HashMap;
use std::io;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use converter_logging::{converter_debug, converter_info, converter_warn};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

use crate::timers::{AttemptTimers, ChannelEventSink, EventSink, TimerSettings};
use crate::{AttemptId, ConversionBackend, EngineEvent, SqlFile};

enum EngineCommand {
    StartTimers { attempt: AttemptId },
    Convert { attempt: AttemptId, files: Vec<SqlFile> },
    StopTimers { attempt: AttemptId },
    CancelTimers { attempt: AttemptId },
}

/// Command side of the engine. Dropping it shuts the engine thread down,
/// cancelling any timers still running.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
}

/// Event side of the engine, usually moved to a forwarding thread.
pub struct EngineEvents {
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(
        backend: Arc<dyn ConversionBackend>,
        timer_settings: TimerSettings,
    ) -> io::Result<(Self, EngineEvents)> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = Runtime::new()?;

        thread::Builder::new()
            .name("converter-engine".to_string())
            .spawn(move || {
                let mut worker = Worker {
                    runtime,
                    backend,
                    timer_settings,
                    sink: Arc::new(ChannelEventSink::new(event_tx.clone())),
                    event_tx,
                    timers: HashMap::new(),
                };
                while let Ok(command) = cmd_rx.recv() {
                    worker.handle(command);
                }
                converter_debug!("Engine command channel closed; stopping timers");
            })?;

        Ok((Self { cmd_tx }, EngineEvents { event_rx }))
    }

    pub fn start_timers(&self, attempt: AttemptId) {
        let _ = self.cmd_tx.send(EngineCommand::StartTimers { attempt });
    }

    pub fn convert(&self, attempt: AttemptId, files: Vec<SqlFile>) {
        let _ = self.cmd_tx.send(EngineCommand::Convert { attempt, files });
    }

    pub fn stop_timers(&self, attempt: AttemptId) {
        let _ = self.cmd_tx.send(EngineCommand::StopTimers { attempt });
    }

    pub fn cancel_timers(&self, attempt: AttemptId) {
        let _ = self.cmd_tx.send(EngineCommand::CancelTimers { attempt });
    }
}

impl EngineEvents {
    /// Blocks for up to `timeout`; `None` on timeout or once the engine is gone.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Blocks until the next event; `None` once the engine thread has exited.
    pub fn recv(&self) -> Option<EngineEvent> {
        self.event_rx.recv().ok()
    }
}

struct Worker {
    runtime: Runtime,
    backend: Arc<dyn ConversionBackend>,
    timer_settings: TimerSettings,
    sink: Arc<dyn EventSink>,
    event_tx: mpsc::Sender<EngineEvent>,
    timers: HashMap<AttemptId, AttemptTimers>,
}

impl Worker {
    fn handle(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::StartTimers { attempt } => {
                let timers = AttemptTimers::start(
                    self.runtime.handle(),
                    attempt,
                    &self.timer_settings,
                    self.sink.clone(),
                );
                if let Some(previous) = self.timers.insert(attempt, timers) {
                    converter_warn!("Timers for attempt {} restarted", previous.attempt());
                }
            }
            EngineCommand::Convert { attempt, files } => {
                let backend = self.backend.clone();
                let event_tx = self.event_tx.clone();
                let timers = self.timers.get(&attempt).map(AttemptTimers::token);
                self.runtime.spawn(async move {
                    run_conversion(backend, attempt, files, timers, event_tx).await;
                });
            }
            EngineCommand::StopTimers { attempt } => {
                if self.timers.remove(&attempt).is_some() {
                    converter_debug!("Timers for attempt {} stopped", attempt);
                }
            }
            EngineCommand::CancelTimers { attempt } => {
                if self.timers.remove(&attempt).is_some() {
                    converter_info!(
                        "View closed during attempt {}; timers cancelled, request left running",
                        attempt
                    );
                }
            }
        }
    }
}

async fn run_conversion(
    backend: Arc<dyn ConversionBackend>,
    attempt: AttemptId,
    files: Vec<SqlFile>,
    timers: Option<CancellationToken>,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    converter_info!(
        "Attempt {} converting {} file(s) with {} backend",
        attempt,
        files.len(),
        backend.name()
    );
    let result = backend.convert(&files).await;
    // Stop animating before the completion is observable.
    if let Some(token) = timers {
        token.cancel();
    }
    match &result {
        Ok(_) => converter_info!("Attempt {} completed", attempt),
        Err(err) => converter_warn!("Attempt {} failed ({}): {}", attempt, err.kind, err.message),
    }
    let _ = event_tx.send(EngineEvent::ConversionCompleted { attempt, result });
}

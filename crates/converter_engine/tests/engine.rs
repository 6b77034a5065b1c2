use std::sync::{Arc, Mutex, Once};
use std::time::{Duration, Instant};

use converter_engine::{
    ConversionBackend, ConversionError, ConversionOutput, EngineEvent, EngineEvents,
    EngineHandle, SqlFile, StubBackend, StubSettings, TimerSettings,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(converter_logging::initialize_for_tests);
}

fn fast_timers() -> TimerSettings {
    TimerSettings {
        progress_interval: Duration::from_millis(10),
        elapsed_interval: Duration::from_millis(10),
    }
}

/// Backend that sleeps, then reports which files it saw.
struct SlowBackend {
    delay: Duration,
    seen: Arc<Mutex<Vec<String>>>,
}

#[async_trait::async_trait]
impl ConversionBackend for SlowBackend {
    fn name(&self) -> &'static str {
        "slow"
    }

    async fn convert(&self, files: &[SqlFile]) -> Result<ConversionOutput, ConversionError> {
        tokio::time::sleep(self.delay).await;
        self.seen
            .lock()
            .unwrap()
            .extend(files.iter().map(|f| f.name.clone()));
        Ok(ConversionOutput::Combined(String::from("BEGIN NULL; END;")))
    }
}

fn drain_until_completed(events: &EngineEvents, limit: Duration) -> Vec<EngineEvent> {
    let deadline = Instant::now() + limit;
    let mut seen = Vec::new();
    while Instant::now() < deadline {
        if let Some(event) = events.recv_timeout(Duration::from_millis(20)) {
            let done = matches!(event, EngineEvent::ConversionCompleted { .. });
            seen.push(event);
            if done {
                break;
            }
        }
    }
    seen
}

fn drain_for(events: &EngineEvents, window: Duration) -> Vec<EngineEvent> {
    let deadline = Instant::now() + window;
    let mut seen = Vec::new();
    while Instant::now() < deadline {
        if let Some(event) = events.recv_timeout(Duration::from_millis(10)) {
            seen.push(event);
        }
    }
    seen
}

#[test]
fn ticks_flow_until_completion_then_stop() {
    init_logging();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let backend = Arc::new(SlowBackend {
        delay: Duration::from_millis(120),
        seen: seen.clone(),
    });
    let (engine, events) = EngineHandle::new(backend, fast_timers()).unwrap();

    engine.start_timers(1);
    engine.convert(1, vec![SqlFile::new("orders.sql", "select 1")]);

    let observed = drain_until_completed(&events, Duration::from_secs(5));
    let ticks = observed
        .iter()
        .filter(|e| matches!(e, EngineEvent::ProgressTick { attempt: 1 }))
        .count();
    assert!(ticks > 0, "expected progress ticks before completion");
    assert!(matches!(
        observed.last(),
        Some(EngineEvent::ConversionCompleted { attempt: 1, result: Ok(_) })
    ));
    assert_eq!(*seen.lock().unwrap(), vec!["orders.sql".to_string()]);

    engine.stop_timers(1);
    // Allow one in-flight tick to land, then expect silence.
    let _ = drain_for(&events, Duration::from_millis(30));
    assert!(drain_for(&events, Duration::from_millis(80)).is_empty());
}

#[test]
fn cancel_stops_timers_but_request_still_completes() {
    init_logging();
    let backend = Arc::new(SlowBackend {
        delay: Duration::from_millis(150),
        seen: Arc::new(Mutex::new(Vec::new())),
    });
    let (engine, events) = EngineHandle::new(backend, fast_timers()).unwrap();

    engine.start_timers(4);
    engine.convert(4, vec![SqlFile::new("orders.sql", "select 1")]);
    std::thread::sleep(Duration::from_millis(40));
    engine.cancel_timers(4);

    let _ = drain_for(&events, Duration::from_millis(20));
    let after_cancel = drain_until_completed(&events, Duration::from_secs(5));
    assert!(after_cancel
        .iter()
        .all(|e| !matches!(e, EngineEvent::ProgressTick { .. } | EngineEvent::ElapsedTick { .. })));
    assert!(matches!(
        after_cancel.last(),
        Some(EngineEvent::ConversionCompleted { attempt: 4, .. })
    ));
}

#[test]
fn dropping_the_handle_ends_the_event_stream() {
    init_logging();
    let backend = Arc::new(StubBackend::new(StubSettings {
        min_delay: Duration::from_secs(30),
        max_jitter: Duration::ZERO,
    }));
    let (engine, events) = EngineHandle::new(backend, fast_timers()).unwrap();
    engine.start_timers(2);
    std::thread::sleep(Duration::from_millis(30));
    drop(engine);

    // Once the engine thread exits every sender is gone and `recv` returns None.
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        match events.recv_timeout(Duration::from_millis(50)) {
            Some(_) if Instant::now() < deadline => continue,
            Some(_) => panic!("engine kept ticking after the handle was dropped"),
            None => break,
        }
    }
    assert!(events.recv().is_none());
}

use std::sync::mpsc;
use std::thread;

use converter_core::{ConversionResult, Effect, Msg, NamedResult, Notification, SelectedFile};
use converter_engine::{
    ConversionOutput, Downloader, EngineEvent, EngineEvents, EngineHandle, SqlFile,
};
use converter_logging::{converter_debug, converter_info, converter_warn};

use super::persistence::AuthProvider;

/// Executes the side effects produced by `update`.
///
/// Timer and conversion effects go to the engine thread; downloads and
/// sign-out run inline. Notifications are handed back to the caller for
/// rendering.
pub struct EffectRunner {
    engine: EngineHandle,
    downloader: Downloader,
    auth: Box<dyn AuthProvider>,
    msg_tx: mpsc::Sender<Msg>,
}

impl EffectRunner {
    pub fn new(
        engine: EngineHandle,
        events: EngineEvents,
        downloader: Downloader,
        auth: Box<dyn AuthProvider>,
        msg_tx: mpsc::Sender<Msg>,
    ) -> Self {
        spawn_event_loop(events, msg_tx.clone());
        Self {
            engine,
            downloader,
            auth,
            msg_tx,
        }
    }

    pub fn enqueue(&mut self, effects: Vec<Effect>) -> Vec<Notification> {
        let mut notifications = Vec::new();
        for effect in effects {
            match effect {
                Effect::Notify(notification) => notifications.push(notification),
                Effect::StartTimers { attempt } => self.engine.start_timers(attempt),
                Effect::Convert { attempt, files } => {
                    converter_info!("Converting {} file(s)", files.len());
                    self.engine.convert(attempt, files.into_iter().map(to_sql_file).collect());
                }
                Effect::StopTimers { attempt } => self.engine.stop_timers(attempt),
                Effect::CancelTimers { attempt } => self.engine.cancel_timers(attempt),
                Effect::Download { file_name, content } => {
                    let outcome = self
                        .downloader
                        .save(&file_name, &content)
                        .map(|path| path.display().to_string())
                        .map_err(|err| {
                            converter_warn!("Download of {} failed: {}", file_name, err);
                            err.to_string()
                        });
                    let _ = self.msg_tx.send(Msg::DownloadFinished { file_name, outcome });
                }
                Effect::SignOut => {
                    if let Err(err) = self.auth.sign_out() {
                        converter_warn!("Sign-out failed: {}", err);
                    }
                }
            }
        }
        notifications
    }
}

fn spawn_event_loop(events: EngineEvents, msg_tx: mpsc::Sender<Msg>) {
    thread::spawn(move || {
        while let Some(event) = events.recv() {
            if msg_tx.send(map_event(event)).is_err() {
                break;
            }
        }
        converter_debug!("Engine event stream ended");
    });
}

fn to_sql_file(file: SelectedFile) -> SqlFile {
    SqlFile::new(file.name, file.contents)
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::ProgressTick { attempt } => Msg::ProgressTick { attempt },
        EngineEvent::ElapsedTick {
            attempt,
            delta_secs,
        } => Msg::ElapsedTick {
            attempt,
            delta_secs,
        },
        EngineEvent::ConversionCompleted { attempt, result } => Msg::ConversionFinished {
            attempt,
            outcome: result.map(map_output).map_err(|err| err.to_string()),
        },
    }
}

fn map_output(output: ConversionOutput) -> ConversionResult {
    match output {
        ConversionOutput::Combined(text) => ConversionResult::Text(text),
        ConversionOutput::Files(files) => ConversionResult::Files(
            files
                .into_iter()
                .map(|file| NamedResult {
                    name: file.name,
                    content: file.content,
                })
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::sync::Arc;
    use std::time::Duration;

    use converter_core::{NotificationLevel, DEFAULT_DOWNLOAD_NAME};
    use converter_engine::{ConvertedFile, StubBackend, StubSettings, TimerSettings};
    use tempfile::TempDir;

    use crate::platform::persistence::SessionError;

    struct CountingAuth {
        sign_outs: Rc<Cell<u32>>,
    }

    impl AuthProvider for CountingAuth {
        fn current_user(&self) -> Option<converter_core::SessionUser> {
            None
        }

        fn sign_in(&self, _username: &str) -> Result<converter_core::SessionUser, SessionError> {
            Err(SessionError::EmptyUsername)
        }

        fn sign_out(&self) -> Result<(), SessionError> {
            self.sign_outs.set(self.sign_outs.get() + 1);
            Ok(())
        }
    }

    fn runner(dir: &TempDir) -> (EffectRunner, mpsc::Receiver<Msg>, Rc<Cell<u32>>) {
        let backend = Arc::new(StubBackend::new(StubSettings {
            min_delay: Duration::from_millis(20),
            max_jitter: Duration::ZERO,
        }));
        let timers = TimerSettings {
            progress_interval: Duration::from_millis(5),
            elapsed_interval: Duration::from_millis(5),
        };
        let (engine, events) = EngineHandle::new(backend, timers).unwrap();
        let (msg_tx, msg_rx) = mpsc::channel();
        let sign_outs = Rc::new(Cell::new(0));
        let auth = Box::new(CountingAuth {
            sign_outs: sign_outs.clone(),
        });
        let runner = EffectRunner::new(
            engine,
            events,
            Downloader::new(dir.path().join("out"), DEFAULT_DOWNLOAD_NAME),
            auth,
            msg_tx,
        );
        (runner, msg_rx, sign_outs)
    }

    #[test]
    fn engine_outputs_map_to_core_results() {
        assert_eq!(
            map_output(ConversionOutput::Combined("BEGIN NULL; END;".into())),
            ConversionResult::Text("BEGIN NULL; END;".into())
        );
        assert_eq!(
            map_output(ConversionOutput::Files(vec![ConvertedFile {
                name: None,
                content: "x".into(),
            }])),
            ConversionResult::Files(vec![NamedResult {
                name: None,
                content: "x".into(),
            }])
        );
    }

    #[test]
    fn notifications_are_returned_to_the_caller() {
        let temp = TempDir::new().unwrap();
        let (mut runner, _rx, _) = runner(&temp);
        let note = Notification::new(NotificationLevel::Info, "hello");
        let out = runner.enqueue(vec![Effect::Notify(note.clone())]);
        assert_eq!(out, vec![note]);
    }

    #[test]
    fn convert_effect_reports_back_as_messages() {
        let temp = TempDir::new().unwrap();
        let (mut runner, rx, _) = runner(&temp);
        runner.enqueue(vec![
            Effect::StartTimers { attempt: 1 },
            Effect::Convert {
                attempt: 1,
                files: vec![SelectedFile::new("orders.sql", "select 1")],
            },
        ]);

        let finished = loop {
            match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
                msg @ Msg::ConversionFinished { .. } => break msg,
                Msg::ProgressTick { attempt } | Msg::ElapsedTick { attempt, .. } => {
                    assert_eq!(attempt, 1)
                }
                other => panic!("unexpected message {other:?}"),
            }
        };
        match finished {
            Msg::ConversionFinished {
                attempt: 1,
                outcome: Ok(ConversionResult::Text(text)),
            } => assert!(text.starts_with("-- Converted Oracle SQL for orders.sql")),
            other => panic!("unexpected completion {other:?}"),
        }
    }

    #[test]
    fn download_effect_writes_and_reports() {
        let temp = TempDir::new().unwrap();
        let (mut runner, rx, _) = runner(&temp);
        runner.enqueue(vec![Effect::Download {
            file_name: "orders.sql".into(),
            content: "BEGIN NULL; END;".into(),
        }]);

        match rx.recv_timeout(Duration::from_secs(1)).unwrap() {
            Msg::DownloadFinished {
                file_name,
                outcome: Ok(location),
            } => {
                assert_eq!(file_name, "orders.sql");
                assert!(location.ends_with("orders.sql"));
            }
            other => panic!("unexpected message {other:?}"),
        }
        let written = std::fs::read_to_string(temp.path().join("out").join("orders.sql")).unwrap();
        assert_eq!(written, "BEGIN NULL; END;");
    }

    #[test]
    fn sign_out_effect_reaches_the_provider() {
        let temp = TempDir::new().unwrap();
        let (mut runner, _rx, sign_outs) = runner(&temp);
        runner.enqueue(vec![Effect::SignOut]);
        assert_eq!(sign_outs.get(), 1);
    }
}

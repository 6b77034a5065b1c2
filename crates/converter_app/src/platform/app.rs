use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc;

use anyhow::{Context, Result};
use converter_core::{
    guard, update, AppState, ConversionState, Effect, Msg, Notification, NotificationLevel,
    Route, DEFAULT_DOWNLOAD_NAME,
};
use converter_engine::{Downloader, EngineHandle};
use converter_logging::{converter_info, converter_warn, set_attempt};

use super::config::{app_dir, AppConfig, ConfigOverrides};
use super::effects::EffectRunner;
use super::files::{select_paths, SkippedPath};
use super::persistence::{AuthProvider, FileSessionStore};
use super::ui::TerminalUi;

/// How a command ended; mapped onto the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failed,
    NotSignedIn,
    Interrupted,
}

impl Outcome {
    pub fn exit_code(self) -> ExitCode {
        match self {
            Outcome::Success => ExitCode::SUCCESS,
            Outcome::Failed => ExitCode::from(1),
            Outcome::NotSignedIn => ExitCode::from(2),
            Outcome::Interrupted => ExitCode::from(130),
        }
    }
}

pub struct ConvertRequest {
    pub paths: Vec<PathBuf>,
    pub overrides: ConfigOverrides,
    pub download: bool,
}

/// `sql2oracle convert`: selects, converts, and optionally downloads.
pub fn run_convert(config_path: Option<&Path>, request: ConvertRequest) -> Result<Outcome> {
    let mut config = AppConfig::load(config_path)?;
    config.apply_overrides(request.overrides);

    let store = FileSessionStore::new(app_dir(), config.session_ttl_hours);
    let user = store.current_user();

    let settings = config.backend_settings();
    converter_info!("Using {:?} backend", settings.kind());
    let (engine, events) = EngineHandle::new(settings.into_backend(), config.timer_settings())
        .context("failed to start conversion engine")?;

    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    let interrupt_tx = msg_tx.clone();
    ctrlc::set_handler(move || {
        let _ = interrupt_tx.send(Msg::ViewClosed);
    })
    .context("failed to install Ctrl-C handler")?;

    let runner = EffectRunner::new(
        engine,
        events,
        Downloader::new(config.output_dir.clone(), DEFAULT_DOWNLOAD_NAME),
        Box::new(store),
        msg_tx,
    );
    let mut session = ConverterSession {
        state: AppState::new(),
        runner,
        ui: TerminalUi::new(),
        msg_rx,
    };

    session.dispatch(Msg::SessionChanged(user));
    if guard(session.state.session()) == Route::Login {
        session.ui.login_redirect();
        return Ok(Outcome::NotSignedIn);
    }

    let selection = select_paths(&request.paths);
    for skipped in &selection.skipped {
        converter_warn!("Skipping {:?}: {}", skipped.path, skipped.reason);
        session.ui.notify(&skipped_notification(skipped));
    }
    if !selection.files.is_empty() {
        session.dispatch(Msg::FilesSelected(selection.files));
    }

    session.dispatch(Msg::ConvertClicked);
    if !session.state.conversion().is_in_flight() {
        return Ok(Outcome::Failed);
    }

    let outcome = session.wait_for_completion();
    if outcome == Outcome::Success && request.download {
        session.download_all();
    }
    session.close();
    Ok(outcome)
}

/// `sql2oracle login <USERNAME>`.
pub fn run_login(config_path: Option<&Path>, username: &str) -> Result<Outcome> {
    let store = session_store(config_path)?;
    let user = store.sign_in(username)?;
    TerminalUi::new().notify(&Notification::new(
        NotificationLevel::Success,
        format!("Signed in as {}", user.username),
    ));
    Ok(Outcome::Success)
}

/// `sql2oracle logout`: the header's Sign out button.
pub fn run_logout(config_path: Option<&Path>) -> Result<Outcome> {
    let store = session_store(config_path)?;
    let ui = TerminalUi::new();
    let Some(user) = store.current_user() else {
        ui.notify(&Notification::new(NotificationLevel::Info, "Not signed in"));
        return Ok(Outcome::Success);
    };

    let (_, effects) = update(AppState::with_session(user.clone()), Msg::SignOutClicked);
    for effect in effects {
        if let Effect::SignOut = effect {
            store.sign_out()?;
        }
    }
    ui.notify(&Notification::new(
        NotificationLevel::Success,
        format!("Signed out {}", user.username),
    ));
    Ok(Outcome::Success)
}

/// `sql2oracle whoami`.
pub fn run_whoami(config_path: Option<&Path>) -> Result<Outcome> {
    let store = session_store(config_path)?;
    match store.current_user() {
        Some(user) => {
            println!("{} (signed in {})", user.username, user.signed_in_utc);
            Ok(Outcome::Success)
        }
        None => {
            TerminalUi::new().login_redirect();
            Ok(Outcome::NotSignedIn)
        }
    }
}

fn skipped_notification(skipped: &SkippedPath) -> Notification {
    Notification::new(
        NotificationLevel::Error,
        format!("Could not read {}", skipped.path.display()),
    )
    .with_description(skipped.reason.clone())
}

fn session_store(config_path: Option<&Path>) -> Result<FileSessionStore> {
    let config = AppConfig::load(config_path)?;
    Ok(FileSessionStore::new(app_dir(), config.session_ttl_hours))
}

/// The converter page: state, its effects, and the terminal it draws on.
struct ConverterSession {
    state: AppState,
    runner: EffectRunner,
    ui: TerminalUi,
    msg_rx: mpsc::Receiver<Msg>,
}

impl ConverterSession {
    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        set_attempt(state.attempt());
        if state.consume_dirty() {
            self.ui.render(&state.view());
        }
        self.state = state;

        for notification in self.runner.enqueue(effects) {
            self.ui.notify(&notification);
        }
    }

    fn wait_for_completion(&mut self) -> Outcome {
        loop {
            let Ok(msg) = self.msg_rx.recv() else {
                return Outcome::Failed;
            };
            self.dispatch(msg);
            if self.state.is_closed() {
                converter_info!("Interrupted by user");
                return Outcome::Interrupted;
            }
            match self.state.conversion() {
                ConversionState::Succeeded(_) => return Outcome::Success,
                ConversionState::Failed(_) => return Outcome::Failed,
                ConversionState::Idle | ConversionState::InFlight { .. } => {}
            }
        }
    }

    fn download_all(&mut self) {
        let count = self
            .state
            .conversion()
            .result()
            .map(|result| result.entries().len())
            .unwrap_or(0);
        for index in 0..count {
            self.dispatch(Msg::DownloadClicked { index });
            self.drain();
        }
    }

    /// Dispatches whatever is already queued, late ticks included.
    fn drain(&mut self) {
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.dispatch(msg);
        }
    }

    fn close(&mut self) {
        self.dispatch(Msg::ViewClosed);
        self.ui.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreadable_paths_become_error_notifications() {
        let note = skipped_notification(&SkippedPath {
            path: PathBuf::from("missing.sql"),
            reason: "No such file or directory (os error 2)".to_string(),
        });
        assert_eq!(note.level, NotificationLevel::Error);
        assert_eq!(note.title, "Could not read missing.sql");
        assert_eq!(
            note.description.as_deref(),
            Some("No such file or directory (os error 2)")
        );
    }

    #[test]
    fn outcomes_map_to_exit_statuses() {
        assert_eq!(Outcome::Success.exit_code(), ExitCode::SUCCESS);
        assert_eq!(Outcome::Failed.exit_code(), ExitCode::from(1));
        assert_eq!(Outcome::NotSignedIn.exit_code(), ExitCode::from(2));
        assert_eq!(Outcome::Interrupted.exit_code(), ExitCode::from(130));
    }
}

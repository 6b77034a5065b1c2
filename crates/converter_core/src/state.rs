use crate::progress::{next_progress, PROGRESS_COMPLETE};
use crate::session::{guard, SessionUser};
use crate::view_model::{
    AppViewModel, ProgressView, ResultRowView, ResultView, SelectedFileRow, DEFAULT_DOWNLOAD_NAME,
};

pub type AttemptId = u64;

/// In-memory handle to a user-chosen file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub contents: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.contents.len() as u64
    }
}

/// One converted output as returned by the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedResult {
    pub name: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionResult {
    /// Single opaque blob of concatenated output.
    Text(String),
    /// One entry per converted input, in request order.
    Files(Vec<NamedResult>),
}

/// Borrowed row view over either result form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultEntry<'a> {
    pub name: Option<&'a str>,
    pub content: &'a str,
}

impl ConversionResult {
    /// The text form is exactly one unnamed entry.
    pub fn entries(&self) -> Vec<ResultEntry<'_>> {
        match self {
            ConversionResult::Text(content) => vec![ResultEntry {
                name: None,
                content,
            }],
            ConversionResult::Files(files) => files
                .iter()
                .map(|file| ResultEntry {
                    name: file.name.as_deref(),
                    content: &file.content,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConversionState {
    #[default]
    Idle,
    InFlight {
        progress: f64,
        elapsed_secs: f64,
    },
    Succeeded(ConversionResult),
    Failed(String),
}

impl ConversionState {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, ConversionState::InFlight { .. })
    }

    /// Percentage shown for this state; completed attempts always report 100.
    pub fn progress(&self) -> f64 {
        match self {
            ConversionState::Idle => 0.0,
            ConversionState::InFlight { progress, .. } => *progress,
            ConversionState::Succeeded(_) | ConversionState::Failed(_) => PROGRESS_COMPLETE,
        }
    }

    pub fn elapsed_secs(&self) -> Option<f64> {
        match self {
            ConversionState::InFlight { elapsed_secs, .. } => Some(*elapsed_secs),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&ConversionResult> {
        match self {
            ConversionState::Succeeded(result) => Some(result),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    session: Option<SessionUser>,
    files: Vec<SelectedFile>,
    conversion: ConversionState,
    attempt: AttemptId,
    closed: bool,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(user: SessionUser) -> Self {
        Self {
            session: Some(user),
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        let in_flight = self.conversion.is_in_flight();
        let progress = match self.conversion {
            ConversionState::InFlight {
                progress,
                elapsed_secs,
            } => Some(ProgressView {
                percent: progress,
                elapsed_secs,
            }),
            _ => None,
        };
        let result = match &self.conversion {
            ConversionState::Succeeded(ConversionResult::Text(content)) => ResultView::Text {
                content: content.clone(),
                download_name: DEFAULT_DOWNLOAD_NAME.to_string(),
            },
            ConversionState::Succeeded(ConversionResult::Files(files)) if !files.is_empty() => {
                ResultView::Files(
                    files
                        .iter()
                        .enumerate()
                        .map(|(index, file)| ResultRowView {
                            index,
                            name: file.name.clone(),
                            content: file.content.clone(),
                            download_name: download_name_for(file.name.as_deref()),
                        })
                        .collect(),
                )
            }
            _ => ResultView::Empty,
        };
        let error = match &self.conversion {
            ConversionState::Failed(message) => Some(message.clone()),
            _ => None,
        };

        AppViewModel {
            route: guard(self.session.as_ref()),
            username: self.session.as_ref().map(|user| user.username.clone()),
            selected: self
                .files
                .iter()
                .map(|file| SelectedFileRow {
                    name: file.name.clone(),
                    size: file.size(),
                })
                .collect(),
            convert_enabled: !in_flight && !self.files.is_empty(),
            convert_label: if in_flight {
                "Converting..."
            } else {
                "Convert Files"
            },
            progress,
            result,
            error,
            dirty: self.dirty,
        }
    }

    pub fn session(&self) -> Option<&SessionUser> {
        self.session.as_ref()
    }

    pub fn files(&self) -> &[SelectedFile] {
        &self.files
    }

    pub fn conversion(&self) -> &ConversionState {
        &self.conversion
    }

    /// Id of the current (or most recent) attempt; 0 before the first one.
    pub fn attempt(&self) -> AttemptId {
        self.attempt
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Returns whether the state changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_session(&mut self, session: Option<SessionUser>) {
        self.session = session;
        self.mark_dirty();
    }

    pub(crate) fn replace_files(&mut self, files: Vec<SelectedFile>) {
        self.files = files;
        self.mark_dirty();
    }

    /// Clears the previous result and enters `InFlight` at 0/0 under a fresh id.
    pub(crate) fn begin_attempt(&mut self) -> AttemptId {
        self.attempt += 1;
        self.conversion = ConversionState::InFlight {
            progress: 0.0,
            elapsed_secs: 0.0,
        };
        self.mark_dirty();
        self.attempt
    }

    /// Whether an event tagged with `attempt` may still mutate state.
    pub(crate) fn accepts(&self, attempt: AttemptId) -> bool {
        !self.closed && attempt == self.attempt && self.conversion.is_in_flight()
    }

    pub(crate) fn advance_progress(&mut self) {
        if let ConversionState::InFlight { progress, .. } = &mut self.conversion {
            *progress = next_progress(*progress);
            self.dirty = true;
        }
    }

    pub(crate) fn add_elapsed(&mut self, delta_secs: f64) {
        if let ConversionState::InFlight { elapsed_secs, .. } = &mut self.conversion {
            if delta_secs > 0.0 {
                *elapsed_secs += delta_secs;
                self.dirty = true;
            }
        }
    }

    pub(crate) fn finish_attempt(&mut self, outcome: Result<ConversionResult, String>) {
        self.conversion = match outcome {
            Ok(result) => ConversionState::Succeeded(result),
            Err(message) => ConversionState::Failed(message),
        };
        self.mark_dirty();
    }

    pub(crate) fn close(&mut self) {
        self.closed = true;
    }
}

pub(crate) fn download_name_for(name: Option<&str>) -> String {
    match name.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => DEFAULT_DOWNLOAD_NAME.to_string(),
    }
}

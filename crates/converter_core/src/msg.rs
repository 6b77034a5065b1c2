#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Auth collaborator reported the current user (or its absence).
    SessionChanged(Option<crate::SessionUser>),
    /// User clicked Sign out in the header.
    SignOutClicked,
    /// File picker produced a new selection; replaces the previous one.
    FilesSelected(Vec<crate::SelectedFile>),
    /// User clicked Convert Files.
    ConvertClicked,
    /// Progress animation timer fired.
    ProgressTick { attempt: crate::AttemptId },
    /// Elapsed-time timer fired.
    ElapsedTick {
        attempt: crate::AttemptId,
        delta_secs: f64,
    },
    /// Backend finished the attempt; `Err` carries the user-facing reason.
    ConversionFinished {
        attempt: crate::AttemptId,
        outcome: Result<crate::ConversionResult, String>,
    },
    /// User asked to download the result row at `index`.
    DownloadClicked { index: usize },
    /// A download effect completed.
    DownloadFinished {
        file_name: String,
        outcome: Result<String, String>,
    },
    /// Owning view is being torn down.
    ViewClosed,
    /// Fallback for placeholder wiring.
    NoOp,
}

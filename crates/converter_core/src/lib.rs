//! Converter core: pure state machine and view-model helpers.
mod effect;
mod msg;
mod progress;
mod session;
mod state;
mod update;
mod view_model;

pub use effect::{Effect, Notification, NotificationLevel};
pub use msg::Msg;
pub use progress::{next_progress, IN_FLIGHT_CEILING, PROGRESS_COMPLETE};
pub use session::{guard, Route, SessionUser};
pub use state::{
    AppState, AttemptId, ConversionResult, ConversionState, NamedResult, ResultEntry,
    SelectedFile,
};
pub use update::update;
pub use view_model::{
    AppViewModel, ProgressView, ResultRowView, ResultView, SelectedFileRow,
    DEFAULT_DOWNLOAD_NAME,
};

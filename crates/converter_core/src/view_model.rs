use crate::session::Route;

/// File name offered when a result carries no name of its own.
pub const DEFAULT_DOWNLOAD_NAME: &str = "converted_oracle_sql.sql";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub route: Route,
    pub username: Option<String>,
    pub selected: Vec<SelectedFileRow>,
    pub convert_enabled: bool,
    pub convert_label: &'static str,
    /// Hidden entirely while no conversion is in flight.
    pub progress: Option<ProgressView>,
    pub result: ResultView,
    pub error: Option<String>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFileRow {
    pub name: String,
    pub size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressView {
    pub percent: f64,
    pub elapsed_secs: f64,
}

impl ProgressView {
    /// Elapsed seconds with one decimal place, e.g. `"3.4s"`.
    pub fn elapsed_label(&self) -> String {
        format!("{:.1}s", self.elapsed_secs)
    }

    /// Percentage rounded down for integer progress bars.
    pub fn whole_percent(&self) -> u64 {
        self.percent.clamp(0.0, 100.0).floor() as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResultView {
    /// "No Files Converted Yet".
    #[default]
    Empty,
    Text {
        content: String,
        download_name: String,
    },
    Files(Vec<ResultRowView>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRowView {
    pub index: usize,
    pub name: Option<String>,
    pub content: String,
    pub download_name: String,
}

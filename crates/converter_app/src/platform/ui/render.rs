use std::time::Duration;

use converter_core::{
    AppViewModel, Notification, NotificationLevel, ProgressView, ResultView, SelectedFileRow,
};
use indicatif::{ProgressBar, ProgressStyle};

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

/// Draws view models onto the terminal.
///
/// The progress bar exists only while the view carries a [`ProgressView`].
/// The selection, result and error panels are printed once per change.
#[derive(Default)]
pub struct TerminalUi {
    bar: Option<ProgressBar>,
    shown_selection: Vec<SelectedFileRow>,
    shown_result: ResultView,
    shown_error: Option<String>,
}

impl TerminalUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, view: &AppViewModel) {
        if view.selected != self.shown_selection {
            self.shown_selection = view.selected.clone();
            for line in selection_lines(&view.selected) {
                self.print_status(&line);
            }
        }

        match &view.progress {
            Some(progress) => self.show_progress(view.convert_label, progress),
            None => self.hide_progress(),
        }

        if view.result != self.shown_result {
            self.shown_result = view.result.clone();
            for line in result_lines(&view.result) {
                println!("{line}");
            }
        }

        if view.error != self.shown_error {
            self.shown_error = view.error.clone();
            if let Some(message) = &view.error {
                self.print_status(&format!("{} {}", red("✗ Error:"), message));
            }
        }
    }

    pub fn notify(&self, notification: &Notification) {
        self.print_status(&format_notification(notification));
    }

    /// Printed instead of the converter when nobody is signed in.
    pub fn login_redirect(&self) {
        self.print_status(&format!(
            "{} {}",
            yellow("!"),
            bold("Not signed in. Run `sql2oracle login <USERNAME>` first.")
        ));
    }

    pub fn finish(&mut self) {
        self.hide_progress();
    }

    fn show_progress(&mut self, label: &str, progress: &ProgressView) {
        let bar = self.bar.get_or_insert_with(|| new_bar(label));
        bar.set_position(progress.whole_percent());
        bar.set_message(progress.elapsed_label());
    }

    fn hide_progress(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }

    fn print_status(&self, line: &str) {
        match &self.bar {
            Some(bar) => bar.println(line),
            None => eprintln!("{line}"),
        }
    }
}

fn new_bar(label: &str) -> ProgressBar {
    let bar = ProgressBar::new(100);
    let style = ProgressStyle::with_template(
        "{spinner:.cyan} {prefix:.bold}  [{bar:40.green/238}] {pos:>3}%  {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("█▉▊▋▌▍▎▏ ");
    bar.set_style(style);
    bar.set_prefix(label.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

fn format_notification(notification: &Notification) -> String {
    let marker = match notification.level {
        NotificationLevel::Info => cyan("◆"),
        NotificationLevel::Success => green("✓"),
        NotificationLevel::Warning => yellow("!"),
        NotificationLevel::Error => red("✗"),
    };
    match &notification.description {
        Some(description) => format!(
            "{} {}  {}",
            marker,
            bold(&notification.title),
            dim(description)
        ),
        None => format!("{} {}", marker, bold(&notification.title)),
    }
}

fn selection_lines(rows: &[SelectedFileRow]) -> Vec<String> {
    if rows.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![bold(&format!("Selected Files ({})", rows.len()))];
    lines.extend(
        rows.iter()
            .map(|row| format!("  {}  {}", row.name, dim(&format_size(row.size)))),
    );
    lines
}

fn result_lines(result: &ResultView) -> Vec<String> {
    match result {
        ResultView::Empty => Vec::new(),
        ResultView::Text {
            content,
            download_name,
        } => vec![
            bold(&format!("── Converted Oracle SQL ({download_name}) ──")),
            content.clone(),
        ],
        ResultView::Files(rows) => {
            let mut lines = vec![bold(&format!("Converted Files ({})", rows.len()))];
            for row in rows {
                let title = row.name.as_deref().unwrap_or("Converted File");
                lines.push(cyan(&format!(
                    "── [{}] {} → {} ──",
                    row.index + 1,
                    title,
                    row.download_name
                )));
                lines.push(row.content.clone());
            }
            lines
        }
    }
}

/// Human-readable byte count, e.g. `1.5 KB`.
fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use converter_core::ResultRowView;

    fn strip_ansi(s: &str) -> String {
        let mut out = String::new();
        let mut in_escape = false;
        for c in s.chars() {
            match (in_escape, c) {
                (false, '\x1b') => in_escape = true,
                (true, 'm') => in_escape = false,
                (false, c) => out.push(c),
                _ => {}
            }
        }
        out
    }

    #[test]
    fn sizes_are_human_readable() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn notification_shows_title_and_description() {
        let note = Notification::new(NotificationLevel::Error, "Conversion failed")
            .with_description("conversion service returned 500 Internal Server Error");
        assert_eq!(
            strip_ansi(&format_notification(&note)),
            "✗ Conversion failed  conversion service returned 500 Internal Server Error"
        );
    }

    #[test]
    fn empty_result_prints_nothing() {
        assert!(result_lines(&ResultView::Empty).is_empty());
        assert!(selection_lines(&[]).is_empty());
    }

    #[test]
    fn file_rows_fall_back_to_a_generic_title() {
        let rows = ResultView::Files(vec![
            ResultRowView {
                index: 0,
                name: Some("orders.sql".into()),
                content: "BEGIN NULL; END;".into(),
                download_name: "orders.sql".into(),
            },
            ResultRowView {
                index: 1,
                name: None,
                content: "END;".into(),
                download_name: "converted_oracle_sql.sql".into(),
            },
        ]);
        let lines: Vec<String> = result_lines(&rows).iter().map(|l| strip_ansi(l)).collect();
        assert_eq!(lines[0], "Converted Files (2)");
        assert_eq!(lines[1], "── [1] orders.sql → orders.sql ──");
        assert_eq!(lines[3], "── [2] Converted File → converted_oracle_sql.sql ──");
        assert_eq!(lines[4], "END;");
    }

    #[test]
    fn selection_lists_names_with_sizes() {
        let rows = vec![SelectedFileRow {
            name: "orders.sql".into(),
            size: 2048,
        }];
        let lines: Vec<String> = selection_lines(&rows).iter().map(|l| strip_ansi(l)).collect();
        assert_eq!(lines, vec!["Selected Files (1)", "  orders.sql  2.0 KB"]);
    }
}

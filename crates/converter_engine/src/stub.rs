use std::time::Duration;

use converter_logging::converter_info;
use rand::Rng;

use crate::{ConversionBackend, ConversionError, ConversionOutput, SqlFile};

#[derive(Debug, Clone)]
pub struct StubSettings {
    pub min_delay: Duration,
    /// Upper bound of the uniform extra delay added to `min_delay`.
    pub max_jitter: Duration,
}

impl Default for StubSettings {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_secs(3),
            max_jitter: Duration::from_secs(2),
        }
    }
}

/// Offline backend: waits a little, then returns a fixed PL/SQL block per file.
#[derive(Debug, Clone, Default)]
pub struct StubBackend {
    settings: StubSettings,
}

impl StubBackend {
    pub fn new(settings: StubSettings) -> Self {
        Self { settings }
    }

    fn pick_delay(&self) -> Duration {
        let jitter_ms = u64::try_from(self.settings.max_jitter.as_millis()).unwrap_or(u64::MAX);
        let extra = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_ms)
        };
        self.settings.min_delay + Duration::from_millis(extra)
    }
}

#[async_trait::async_trait]
impl ConversionBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn convert(&self, files: &[SqlFile]) -> Result<ConversionOutput, ConversionError> {
        let delay = self.pick_delay();
        converter_info!(
            "Stub conversion of {} file(s) completes in {}ms",
            files.len(),
            delay.as_millis()
        );
        tokio::time::sleep(delay).await;

        let scripts = files
            .iter()
            .map(|file| placeholder_script(&file.name))
            .collect::<Vec<_>>();
        Ok(ConversionOutput::Combined(scripts.join("\n")))
    }
}

/// Placeholder Oracle script for `source_name`, framed as an anonymous PL/SQL block.
///
/// Control characters in the name become `_` so it stays inside its comment line.
pub fn placeholder_script(source_name: &str) -> String {
    let source_name = source_name.replace(|c: char| c.is_control(), "_");
    format!(
        "-- Converted Oracle SQL for {source_name}\n\
         -- Placeholder output: no dialect translation was performed.\n\
         DECLARE\n\
         \x20 v_row_count NUMBER := 0;\n\
         BEGIN\n\
         \x20 SELECT COUNT(*) INTO v_row_count FROM dual;\n\
         \x20 DBMS_OUTPUT.PUT_LINE('Rows: ' || v_row_count);\n\
         EXCEPTION\n\
         \x20 WHEN OTHERS THEN\n\
         \x20   DBMS_OUTPUT.PUT_LINE('Error: ' || SQLERRM);\n\
         \x20   RAISE;\n\
         END;\n\
         /\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_embeds_source_name_inside_plsql_block() {
        let script = placeholder_script("orders.sql");
        assert!(script.starts_with("-- Converted Oracle SQL for orders.sql\n"));
        assert!(script.contains("\nBEGIN\n"));
        assert!(script.contains("\nEND;\n/\n"));
        assert!(script.contains("  v_row_count NUMBER := 0;"));
    }

    #[test]
    fn newlines_in_the_name_stay_inside_the_comment() {
        let script = placeholder_script("orders.sql\nDROP TABLE orders;\r\n--");
        let first = script.lines().next().unwrap();
        assert_eq!(first, "-- Converted Oracle SQL for orders.sql_DROP TABLE orders;__--");
        assert!(!script.lines().any(|line| line.starts_with("DROP")));
    }

    #[test]
    fn delay_stays_within_configured_window() {
        let backend = StubBackend::new(StubSettings {
            min_delay: Duration::from_millis(10),
            max_jitter: Duration::from_millis(5),
        });
        for _ in 0..50 {
            let delay = backend.pick_delay();
            assert!(delay >= Duration::from_millis(10));
            assert!(delay <= Duration::from_millis(15));
        }
    }

    #[test]
    fn zero_jitter_is_exact() {
        let backend = StubBackend::new(StubSettings {
            min_delay: Duration::from_millis(7),
            max_jitter: Duration::ZERO,
        });
        assert_eq!(backend.pick_delay(), Duration::from_millis(7));
    }
}

use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::{Event, Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::Registry;

/// Warning and error counts for the final summary line.
#[derive(Debug, Clone, Default)]
pub struct Summary {
    warnings: Arc<AtomicUsize>,
    errors: Arc<AtomicUsize>,
}

impl Summary {
    pub fn warnings(&self) -> usize {
        self.warnings.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn success_line(&self, rule_count: usize) -> String {
        format!(
            "Completed successfully. Extracted {rule_count} rules. {} warning(s).",
            self.warnings()
        )
    }

    pub fn failure_line(&self) -> String {
        format!("Failed with {} error(s). See messages above.", self.errors())
    }
}

/// Counts WARN and ERROR events that pass the level filter.
pub struct SummaryLayer {
    summary: Summary,
}

impl<S: Subscriber> Layer<S> for SummaryLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        match *event.metadata().level() {
            Level::WARN => {
                self.summary.warnings.fetch_add(1, Ordering::Relaxed);
            }
            Level::ERROR => {
                self.summary.errors.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }
}

/// Map a `LOG_LEVEL` value; `None` for unknown names.
pub fn parse_level(name: &str) -> Option<LevelFilter> {
    match name.trim().to_ascii_uppercase().as_str() {
        "DEBUG" => Some(LevelFilter::DEBUG),
        "INFO" => Some(LevelFilter::INFO),
        "WARNING" | "WARN" => Some(LevelFilter::WARN),
        "ERROR" | "CRITICAL" => Some(LevelFilter::ERROR),
        _ => None,
    }
}

/// Handles that must outlive the subscriber's use.
pub struct Logging {
    pub summary: Summary,
    /// Flushes the file sink on drop
    pub file_guard: Option<WorkerGuard>,
    /// Problems met while setting up, to be logged once the subscriber is active
    pub notes: Vec<String>,
}

/// Build the subscriber: console output split between stdout and stderr by
/// level, an optional append-mode log file, and the summary counter.
pub fn init(level: &str, log_file: Option<&Path>) -> (impl Subscriber + Send + Sync, Logging) {
    let mut notes = Vec::new();
    let level = parse_level(level).unwrap_or_else(|| {
        notes.push(format!("Unknown LOG_LEVEL '{level}'; using INFO"));
        LevelFilter::INFO
    });

    let console = tracing_subscriber::fmt::layer()
        .with_writer(
            std::io::stderr
                .with_max_level(Level::WARN)
                .or_else(std::io::stdout),
        )
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time();

    let mut file_guard = None;
    let file_layer = log_file.and_then(|path| match open_log_file(path) {
        Ok(file) => {
            let (writer, guard) = tracing_appender::non_blocking(file);
            file_guard = Some(guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false),
            )
        }
        Err(e) => {
            notes.push(format!("Cannot open log file {}: {e}", path.display()));
            None
        }
    });

    let summary = Summary::default();
    let subscriber = Registry::default()
        .with(EnvFilter::default().add_directive(level.into()))
        .with(console)
        .with(file_layer)
        .with(SummaryLayer {
            summary: summary.clone(),
        });

    (
        subscriber,
        Logging {
            summary,
            file_guard,
            notes,
        },
    )
}

fn open_log_file(path: &Path) -> std::io::Result<std::fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level_names() {
        assert_eq!(parse_level("DEBUG"), Some(LevelFilter::DEBUG));
        assert_eq!(parse_level("info"), Some(LevelFilter::INFO));
        assert_eq!(parse_level("WARNING"), Some(LevelFilter::WARN));
        assert_eq!(parse_level("warn"), Some(LevelFilter::WARN));
        assert_eq!(parse_level("CRITICAL"), Some(LevelFilter::ERROR));
        assert_eq!(parse_level("verbose"), None);
    }

    #[test]
    fn test_summary_counts_warnings_and_errors() {
        let (subscriber, logging) = init("INFO", None);
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("not counted");
            tracing::warn!("first warning");
            tracing::error!("boom");
            tracing::warn!("later warning");
        });

        assert_eq!(logging.summary.warnings(), 2);
        assert_eq!(logging.summary.errors(), 1);
        assert_eq!(
            logging.summary.success_line(5),
            "Completed successfully. Extracted 5 rules. 2 warning(s)."
        );
        assert_eq!(
            logging.summary.failure_line(),
            "Failed with 1 error(s). See messages above."
        );
    }

    #[test]
    fn test_filtered_events_are_not_counted() {
        let (subscriber, logging) = init("ERROR", None);
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("hidden");
        });
        assert_eq!(logging.summary.warnings(), 0);
    }

    #[test]
    fn test_unknown_level_falls_back_with_note() {
        let (_subscriber, logging) = init("LOUD", None);
        assert_eq!(logging.notes, vec!["Unknown LOG_LEVEL 'LOUD'; using INFO".to_string()]);
    }

    #[test]
    fn test_file_sink_receives_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("run.log");
        {
            let (subscriber, logging) = init("INFO", Some(&path));
            tracing::subscriber::with_default(subscriber, || {
                tracing::info!("written to file");
            });
            drop(logging);
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("written to file"));
    }
}

//! Diagnostic sinks for monitor log lines.

use std::sync::Arc;

use parking_lot::Mutex;

/// Receives the monitor's human-readable diagnostic lines.
///
/// Purely informational: a sink must not panic and its output never affects
/// monitor control flow.
pub trait DiagnosticSink: Send + Sync {
    /// Record one diagnostic line.
    fn log(&self, message: &str);
}

impl<F> DiagnosticSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn log(&self, message: &str) {
        self(message);
    }
}

/// Default sink: forwards each line to `tracing` at INFO under the
/// `cable_monitor` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn log(&self, message: &str) {
        tracing::info!(target: "cable_monitor", "{message}");
    }
}

/// Sink that keeps every line in memory.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    /// Create an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded lines, oldest first.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Number of recorded lines containing `needle`.
    pub fn count_matching(&self, needle: &str) -> usize {
        self.lines.lock().iter().filter(|l| l.contains(needle)).count()
    }

    /// Whether any recorded line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.count_matching(needle) > 0
    }
}

impl DiagnosticSink for RecordingSink {
    fn log(&self, message: &str) {
        self.lines.lock().push(message.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use cable_logging::capture_logs;
    use tracing::Level;

    use super::*;

    #[test]
    fn tracing_sink_emits_info_under_monitor_target() {
        let (logs, _guard) = capture_logs();
        TracingSink.log("ConnectionMonitor recorded connect");

        let events = logs.events_for_target("cable_monitor");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].level, Level::INFO);
        assert_eq!(events[0].message, "ConnectionMonitor recorded connect");
    }

    #[test]
    fn closures_are_sinks() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = Arc::clone(&seen);
        let sink = move |line: &str| seen2.lock().push(line.to_string());

        sink.log("one");
        DiagnosticSink::log(&sink, "two");
        assert_eq!(*seen.lock(), vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn recording_sink_clones_share_lines() {
        let sink = RecordingSink::new();
        let clone = sink.clone();
        clone.log("ConnectionMonitor reopening");
        clone.log("ConnectionMonitor stopped");

        assert_eq!(sink.lines().len(), 2);
        assert!(sink.contains("reopening"));
        assert_eq!(sink.count_matching("ConnectionMonitor"), 2);
    }
}

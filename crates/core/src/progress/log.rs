use serde::Serialize;
use std::time::Duration;

/// One timestamped status line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEntry {
    /// Time since the job started.
    pub elapsed: Duration,
    pub message: String,
}

impl ProgressEntry {
    pub fn new(elapsed: Duration, message: impl Into<String>) -> Self {
        Self {
            elapsed,
            message: message.into(),
        }
    }
}

/// Append-only log of a single job's progress.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProgressLog {
    header: String,
    entries: Vec<ProgressEntry>,
}

impl ProgressLog {
    /// Creates a log whose rendering starts with `header`.
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: ProgressEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ProgressEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the log contains an entry with exactly this message.
    pub fn contains(&self, message: &str) -> bool {
        self.entries.iter().any(|e| e.message == message)
    }

    /// Renders the header followed by one `[seconds] message` line per entry.
    pub fn render(&self) -> String {
        let mut out = self.header.clone();
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        for entry in &self.entries {
            out.push_str(&format!(
                "[{:.3}] {}\n",
                entry.elapsed.as_secs_f64(),
                entry.message.trim_end()
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_header_only() {
        let log = ProgressLog::new("Downloading information...");
        assert_eq!(log.render(), "Downloading information...\n");
        assert!(log.is_empty());
    }

    #[test]
    fn test_render_entries_in_order() {
        let mut log = ProgressLog::new("Start\n");
        log.push(ProgressEntry::new(Duration::from_millis(1500), "Downloading video..."));
        log.push(ProgressEntry::new(Duration::from_millis(62_250), "Done!\n"));

        assert_eq!(
            log.render(),
            "Start\n[1.500] Downloading video...\n[62.250] Done!\n"
        );
        assert_eq!(log.len(), 2);
        assert!(log.contains("Done!\n"));
    }
}

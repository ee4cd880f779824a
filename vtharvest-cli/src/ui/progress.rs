//! Single-line progress display on stdout.
//!
//! Log records go to stderr, so redrawing this line never clobbers them.

use console::{style, Term};
use vtharvest::progress::{ProgressSink, ProgressSnapshot};

/// Redraws one status line per update: stage, percent, rate and ETA.
pub struct TerminalSink {
    term: Term,
    label: String,
}

impl TerminalSink {
    pub fn new(label: &str) -> Self {
        Self {
            term: Term::stdout(),
            label: label.to_string(),
        }
    }

    fn status_line(&self, snapshot: &ProgressSnapshot) -> String {
        format!(
            "{:<8}{} {}/{}",
            style(&self.label).cyan().bold(),
            snapshot,
            snapshot.index,
            snapshot.total
        )
    }
}

impl ProgressSink for TerminalSink {
    fn render(&mut self, snapshot: &ProgressSnapshot) {
        let line = self.status_line(snapshot);
        // Display errors are ignored.
        let _ = self.term.clear_line();
        let _ = self.term.write_str(&line);
    }

    fn finish(&mut self) {
        let _ = self.term.write_line("");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_status_line_shows_counts() {
        let sink = TerminalSink::new("fetch");
        let snapshot = ProgressSnapshot {
            index: 50,
            total: 200,
            rate: 12.5,
            eta: Some(Duration::from_secs(12)),
        };

        let line = console::strip_ansi_codes(&sink.status_line(&snapshot)).to_string();

        assert!(line.starts_with("fetch"));
        assert!(line.contains("25.00%"));
        assert!(line.contains("12.5/s"));
        assert!(line.ends_with("50/200"));
    }
}

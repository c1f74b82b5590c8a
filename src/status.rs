//! Status sink for long-running steps.

use colored::*;

/// Receives progress text for a running step.
pub trait StatusSink {
    fn update(&mut self, text: &str);
    fn stop(&mut self);
}

/// Prints each update as a dimmed line on stderr.
#[derive(Debug, Default)]
pub struct ConsoleStatus {
    active: bool,
}

impl ConsoleStatus {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatusSink for ConsoleStatus {
    fn update(&mut self, text: &str) {
        self.active = true;
        eprintln!("  {} {}", "›".cyan(), text.dimmed());
    }

    fn stop(&mut self) {
        if self.active {
            eprintln!("  {} {}", "✓".green(), "done".dimmed());
        }
        self.active = false;
    }
}

/// Keeps every update in memory; used by tests and quiet callers.
#[derive(Debug, Default, Clone)]
pub struct RecordingStatus {
    pub updates: Vec<String>,
    pub stopped: bool,
}

impl StatusSink for RecordingStatus {
    fn update(&mut self, text: &str) {
        self.updates.push(text.to_string());
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_status() {
        let mut status = RecordingStatus::default();
        status.update("Installing dependencies with pnpm");
        status.stop();
        assert_eq!(status.updates, vec!["Installing dependencies with pnpm"]);
        assert!(status.stopped);
    }

    #[test]
    fn test_console_status_tracks_activity() {
        let mut status = ConsoleStatus::new();
        status.update("Fetching crates");
        assert!(status.active);
        status.stop();
        assert!(!status.active);
    }
}

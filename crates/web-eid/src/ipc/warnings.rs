//! Deduplicated log of warnings broadcast by the extension.

use parking_lot::Mutex;
use std::collections::HashSet;
use tracing::warn;

/// Every warning string seen so far by one service instance.
#[derive(Debug, Default)]
pub struct WarningLog {
    seen: Mutex<HashSet<String>>,
}

impl WarningLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember `warning`. Returns true the first time a string is seen.
    pub fn record(&self, warning: &str) -> bool {
        let mut seen = self.seen.lock();
        if seen.contains(warning) {
            return false;
        }
        seen.insert(warning.to_owned())
    }

    /// Log each warning not seen before, with line breaks stripped.
    pub fn emit_all<'a>(&self, warnings: impl IntoIterator<Item = &'a str>) -> usize {
        let mut emitted = 0;
        for warning in warnings {
            if self.record(warning) {
                warn!(warning = %strip_line_breaks(warning), "Web eID extension warning");
                emitted += 1;
            }
        }
        emitted
    }

    pub fn len(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Remove CR and LF so one warning is one log line.
pub fn strip_line_breaks(text: &str) -> String {
    text.chars().filter(|c| !matches!(c, '\r' | '\n')).collect()
}

use std::io::{self, Write};
use std::time::Instant;

/// Stderr status reporter for the CLI. Timestamped with elapsed wall time so
/// long model loads and big batches are visibly accounted for.
pub struct ConsoleProgress {
    enabled: bool,
    t0: Instant,
}

impl ConsoleProgress {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            t0: Instant::now(),
        }
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        self.emit("", msg.as_ref());
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        self.emit("warning: ", msg.as_ref());
    }

    fn emit(&self, prefix: &str, msg: &str) {
        if !self.enabled {
            return;
        }
        let secs = self.t0.elapsed().as_secs();
        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "[{:02}:{:02}] {prefix}{msg}", secs / 60, secs % 60);
    }
}

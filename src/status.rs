//! Run context and console status indicator
//!
//! The status indicator is a cosmetic background thread that animates a
//! "working" line while a blocking step (the library query) runs. The only
//! thing it shares with the caller is its stop flag.

use crossterm::{
    ExecutableCommand,
    cursor::MoveToColumn,
    style::Print,
    terminal::{Clear, ClearType},
};
use std::io::{IsTerminal, stderr};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{Span, debug, info_span};

/// Delay between animation frames
const FRAME_INTERVAL: Duration = Duration::from_millis(300);

const FRAMES: [&str; 4] = ["", ".", "..", "..."];

/// Background "working" indicator with an explicit stop signal
pub struct StatusIndicator {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl StatusIndicator {
    /// Start animating `message` on stderr
    pub fn start(message: impl Into<String>) -> Self {
        let message = message.into();
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);

        let handle = thread::spawn(move || {
            let mut err = stderr();
            let mut frame = 0usize;
            while !flag.load(Ordering::Relaxed) {
                let _ = err.execute(MoveToColumn(0));
                let _ = err.execute(Clear(ClearType::CurrentLine));
                let _ = err.execute(Print(format!("{}{}", message, FRAMES[frame % FRAMES.len()])));
                frame += 1;
                thread::sleep(FRAME_INTERVAL);
            }
            let _ = err.execute(MoveToColumn(0));
            let _ = err.execute(Clear(ClearType::CurrentLine));
        });

        Self {
            stop,
            handle: Some(handle),
        }
    }

    /// Signal the thread to stop and wait for it to clear its line
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for StatusIndicator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Per-run state handed to each pipeline stage
///
/// Carries the run's tracing span and owns the status indicator, so teardown
/// happens when the context is finished or dropped.
pub struct RunContext {
    span: Span,
    show_status: bool,
    status: Option<StatusIndicator>,
}

impl RunContext {
    /// Context for an interactive run; the indicator only shows on a terminal
    pub fn new(show_status: bool) -> Self {
        Self {
            span: info_span!("export_run"),
            show_status: show_status && stderr().is_terminal(),
            status: None,
        }
    }

    /// Context that never draws to the console
    pub fn quiet() -> Self {
        Self {
            span: info_span!("export_run"),
            show_status: false,
            status: None,
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Start the status indicator, replacing any running one
    pub fn begin_status(&mut self, message: &str) {
        self.end_status();
        if self.show_status {
            self.status = Some(StatusIndicator::start(message));
        }
    }

    /// Stop the status indicator if running
    pub fn end_status(&mut self) {
        if let Some(status) = self.status.take() {
            status.stop();
            debug!("Status indicator stopped");
        }
    }

    pub fn has_status(&self) -> bool {
        self.status.is_some()
    }

    /// Explicit end-of-run teardown
    pub fn finish(mut self) {
        self.end_status();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_indicator_stops_promptly() {
        let indicator = StatusIndicator::start("Searching photos");
        thread::sleep(Duration::from_millis(50));

        let started = Instant::now();
        indicator.stop();
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_quiet_context_never_starts_indicator() {
        let mut ctx = RunContext::quiet();
        ctx.begin_status("Searching photos");
        assert!(!ctx.has_status());
        ctx.end_status();
        ctx.finish();
    }
}

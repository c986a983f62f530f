//! Terminal spinner for long-running steps
//!
//! Spinners are drawn through one shared [`MultiProgress`] on stderr. Log
//! output that goes to the same stream should be written through
//! [`LogWriter`] (or [`suspend`]) so lines are printed above the spinner
//! instead of being torn by its redraws.

use std::io::{self, Write};
use std::sync::OnceLock;
use std::time::Duration;

use console::Term;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

fn draw_area() -> &'static MultiProgress {
    static AREA: OnceLock<MultiProgress> = OnceLock::new();
    AREA.get_or_init(|| MultiProgress::with_draw_target(ProgressDrawTarget::stderr()))
}

/// Run `f` with any active spinner hidden, redrawing it afterwards
pub fn suspend<F: FnOnce() -> R, R>(f: F) -> R {
    draw_area().suspend(f)
}

/// Stderr writer that keeps spinners intact
///
/// Meant as a `tracing_subscriber` writer: `.with_writer(|| LogWriter)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogWriter;

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        suspend(|| io::stderr().write_all(buf)).map(|()| buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

const TICK_STRINGS: &[&str] = &[
    "⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓",
];

/// Spinner shown while a step runs; cleared when dropped
///
/// Inactive in dry-run and when stderr is not a terminal.
pub struct Spinner {
    bar: Option<ProgressBar>,
}

impl Spinner {
    pub fn start(message: impl Into<String>, enabled: bool) -> Self {
        if !enabled || !Term::stderr().is_term() {
            return Self { bar: None };
        }

        let bar = draw_area().add(ProgressBar::new_spinner());
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}...") {
            bar.set_style(style.tick_strings(TICK_STRINGS));
        }
        bar.set_message(message.into());
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar: Some(bar) }
    }

    /// Disabled spinner
    pub fn hidden() -> Self {
        Self { bar: None }
    }

    pub fn is_active(&self) -> bool {
        self.bar.is_some()
    }

    /// Stop and clear the spinner
    pub fn stop(mut self) {
        self.clear();
    }

    fn clear(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
            draw_area().remove(&bar);
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_spinner_is_inert() {
        let spinner = Spinner::start("Creating cluster", false);
        assert!(!spinner.is_active());
        spinner.stop();
        assert!(!Spinner::hidden().is_active());
    }

    #[test]
    fn test_suspend_returns_closure_result() {
        assert_eq!(suspend(|| 40 + 2), 42);
    }

    #[test]
    fn test_log_writer_reports_full_writes() {
        let mut writer = LogWriter;
        assert_eq!(writer.write(b"").unwrap(), 0);
        assert_eq!(writer.write(b"line\n").unwrap(), 5);
        writer.flush().unwrap();
    }
}

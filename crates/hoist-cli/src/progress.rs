//! Progress display for recipe installs.

use std::io::{self, Write};
use std::sync::Mutex;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use hoist_core::ux::ProgressIndicator;

const TICK: Duration = Duration::from_millis(100);

/// Animated spinner for interactive terminals.
#[derive(Default)]
pub struct SpinnerProgress {
    current: Mutex<Option<(ProgressBar, String)>>,
}

impl SpinnerProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn finish(&self, symbol: console::StyledObject<&str>) {
        if let Ok(mut current) = self.current.lock()
            && let Some((bar, label)) = current.take()
        {
            bar.finish_with_message(format!("{} {}", symbol, label));
        }
    }
}

impl ProgressIndicator for SpinnerProgress {
    fn start(&self, label: &str) {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(label.to_string());
        bar.enable_steady_tick(TICK);

        if let Ok(mut current) = self.current.lock()
            && let Some((previous, _)) = current.replace((bar, label.to_string()))
        {
            previous.finish_and_clear();
        }
    }

    fn success(&self) {
        self.finish(style("✓").green());
    }

    fn fail(&self) {
        self.finish(style("✗").red());
    }

    fn stop(&self) {
        if let Ok(mut current) = self.current.lock()
            && let Some((bar, _)) = current.take()
        {
            bar.finish_and_clear();
        }
    }
}

/// Line-based progress for pipes and CI logs.
pub struct PlainProgress<W: Write + Send = io::Stderr> {
    writer: Mutex<W>,
    current: Mutex<Option<String>>,
}

impl PlainProgress<io::Stderr> {
    pub fn new() -> Self {
        Self::with_writer(io::stderr())
    }
}

impl<W: Write + Send> PlainProgress<W> {
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
            current: Mutex::new(None),
        }
    }

    fn line(&self, text: &str) {
        if let Ok(mut writer) = self.writer.lock() {
            // Progress output is best-effort.
            let _ = writeln!(writer, "{}", text);
        }
    }

    fn take_label(&self) -> Option<String> {
        self.current.lock().ok().and_then(|mut c| c.take())
    }

    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> ProgressIndicator for PlainProgress<W> {
    fn start(&self, label: &str) {
        if let Ok(mut current) = self.current.lock() {
            *current = Some(label.to_string());
        }
        self.line(&format!("{}...", label));
    }

    fn success(&self) {
        if let Some(label) = self.take_label() {
            self.line(&format!("{}... done", label));
        }
    }

    fn fail(&self) {
        if let Some(label) = self.take_label() {
            self.line(&format!("{}... failed", label));
        }
    }

    fn stop(&self) {
        self.take_label();
    }
}

//! User interaction seams: confirmation prompts and progress display.
//!
//! Frontends supply the concrete implementations.

/// Asks the user questions.
///
/// A prompt the user aborts (Ctrl-C, Esc) resolves to "no" or an empty
/// selection. Errors are reserved for terminal I/O failures.
pub trait Prompter: Send + Sync {
    fn prompt_yes_no(&self, msg: &str) -> anyhow::Result<bool>;

    fn multi_select(&self, msg: &str, options: &[String]) -> anyhow::Result<Vec<String>>;
}

/// Shows progress for one long-running operation at a time.
pub trait ProgressIndicator: Send + Sync {
    fn start(&self, label: &str);
    fn success(&self);
    fn fail(&self);
    fn stop(&self);
}

/// Starts a progress indicator and stops it when dropped.
pub struct ProgressGuard<'a> {
    indicator: &'a dyn ProgressIndicator,
}

impl<'a> ProgressGuard<'a> {
    pub fn start(indicator: &'a dyn ProgressIndicator, label: &str) -> Self {
        indicator.start(label);
        Self { indicator }
    }

    pub fn success(&self) {
        self.indicator.success();
    }

    pub fn fail(&self) {
        self.indicator.fail();
    }
}

impl Drop for ProgressGuard<'_> {
    fn drop(&mut self) {
        self.indicator.stop();
    }
}

//! User-visible text channel of the host (build console, terminal).

use std::io::Write;
use std::sync::Mutex;

pub trait TextOutput: Send + Sync {
    fn info(&self, text: &str);
    fn warning(&self, text: &str);
    fn severe(&self, text: &str);
}

/// Writes prefixed lines to stderr.
#[derive(Debug, Default)]
pub struct StderrOutput;

impl TextOutput for StderrOutput {
    fn info(&self, text: &str) {
        eprintln!("[INFO] {}", text);
    }

    fn warning(&self, text: &str) {
        eprintln!("[WARNING] {}", text);
    }

    fn severe(&self, text: &str) {
        eprintln!("[ERROR] {}", text);
    }
}

/// Collects lines in memory, for hosts that render them later.
#[derive(Debug, Default)]
pub struct BufferedOutput {
    lines: Mutex<Vec<(OutputLevel, String)>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLevel {
    Info,
    Warning,
    Severe,
}

impl BufferedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(OutputLevel, String)> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn count(&self, level: OutputLevel) -> usize {
        self.lines().iter().filter(|(l, _)| *l == level).count()
    }

    /// Write every line to `out`, one per line with its level prefix.
    pub fn write_to(&self, out: &mut dyn Write) -> std::io::Result<()> {
        for (level, text) in self.lines() {
            let prefix = match level {
                OutputLevel::Info => "INFO",
                OutputLevel::Warning => "WARNING",
                OutputLevel::Severe => "ERROR",
            };
            writeln!(out, "[{}] {}", prefix, text)?;
        }
        Ok(())
    }

    fn push(&self, level: OutputLevel, text: &str) {
        let mut lines = match self.lines.lock() {
            Ok(lines) => lines,
            Err(poisoned) => poisoned.into_inner(),
        };
        lines.push((level, text.to_string()));
    }
}

impl TextOutput for BufferedOutput {
    fn info(&self, text: &str) {
        self.push(OutputLevel::Info, text);
    }

    fn warning(&self, text: &str) {
        self.push(OutputLevel::Warning, text);
    }

    fn severe(&self, text: &str) {
        self.push(OutputLevel::Severe, text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffered_output_keeps_order_and_level() {
        let out = BufferedOutput::new();
        out.info("connected");
        out.severe("boom");
        out.warning("slow");
        assert_eq!(out.count(OutputLevel::Severe), 1);

        let mut rendered = Vec::new();
        out.write_to(&mut rendered).unwrap();
        assert_eq!(
            String::from_utf8(rendered).unwrap(),
            "[INFO] connected\n[ERROR] boom\n[WARNING] slow\n"
        );
    }
}

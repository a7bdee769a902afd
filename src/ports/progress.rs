//! Progress reporting for long-running downloads.

use log::info;

/// Receives human-readable progress lines.
pub trait ProgressSink: Send + Sync {
    fn report(&self, message: &str);
}

/// Routes progress through the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&self, message: &str) {
        info!("{}", message.trim_start());
    }
}

/// Echoes progress to stdout, indented under the current command.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrintProgress;

impl ProgressSink for PrintProgress {
    fn report(&self, message: &str) {
        println!("  {}", message);
    }
}

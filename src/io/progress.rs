//! The user-facing progress log.
//!
//! A merge run reports checkpoints (file found, file processed, batch
//! progress, warnings, completion) through a single append operation. Sinks
//! must return promptly; the run waits on every call.

use tracing::info;

pub trait ProgressSink {
    fn append(&mut self, message: &str);
}

impl<F> ProgressSink for F
where
    F: FnMut(&str),
{
    fn append(&mut self, message: &str) {
        self(message)
    }
}

/// Forwards progress messages to `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn append(&mut self, message: &str) {
        info!(target: "xlsx_merge::progress", "{message}");
    }
}

/// Collects messages in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub messages: Vec<String>,
}

impl ProgressSink for MemorySink {
    fn append(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}

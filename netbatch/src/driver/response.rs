//! Result of one command sent through a driver.

use std::time::Duration;

/// A command's normalized output and the prompt that ended it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub command: String,
    /// Output with the command echo and trailing prompt removed.
    pub output: String,
    pub prompt: String,
    pub elapsed: Duration,
    /// Failure marker found in the output, if the device rejected the command.
    pub failure: Option<String>,
}

impl Response {
    pub fn new(command: impl Into<String>, output: impl Into<String>, prompt: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            command: command.into(),
            output: output.into(),
            prompt: prompt.into(),
            elapsed,
            failure: None,
        }
    }

    pub fn with_failure(mut self, marker: impl Into<String>) -> Self {
        self.failure = Some(marker.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

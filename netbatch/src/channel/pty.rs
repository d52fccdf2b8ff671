//! Interactive shell channel.

use std::time::Duration;

use log::trace;
use regex::bytes::Regex;
use russh::client::Msg;
use russh::{Channel, ChannelMsg};
use tokio::time::{Instant, timeout_at};

use super::buffer::PatternBuffer;
use crate::error::{ChannelError, Result};

#[derive(Debug, Clone)]
pub struct PtyConfig {
    /// Default bound on a prompt read.
    pub timeout: Duration,
    /// Bytes from the end of the output searched for a prompt.
    pub search_depth: usize,
}

impl Default for PtyConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            search_depth: 1000,
        }
    }
}

/// A PTY shell: write lines, read until a prompt.
pub struct PtyChannel {
    channel: Channel<Msg>,
    config: PtyConfig,
    buffer: PatternBuffer,
}

impl PtyChannel {
    pub fn new(channel: Channel<Msg>, config: PtyConfig) -> Self {
        Self {
            buffer: PatternBuffer::new(config.search_depth),
            channel,
            config,
        }
    }

    /// Write `input` followed by a newline.
    pub async fn send(&mut self, input: &str) -> Result<()> {
        let line = format!("{input}\n");
        self.channel
            .data(line.as_bytes())
            .await
            .map_err(ChannelError::Ssh)?;
        Ok(())
    }

    /// Collect output until `pattern` matches its tail, and return it with
    /// escape sequences removed. Fails if the timeout passes first or the
    /// device closes the channel.
    pub async fn read_until_pattern(&mut self, pattern: &Regex) -> Result<Vec<u8>> {
        let timeout = self.config.timeout;
        let deadline = Instant::now() + timeout;

        while !self.buffer.tail_matches(pattern) {
            let msg = timeout_at(deadline, self.channel.wait())
                .await
                .map_err(|_| ChannelError::PatternTimeout(timeout))?;

            match msg {
                Some(ChannelMsg::Data { data }) | Some(ChannelMsg::ExtendedData { data, .. }) => {
                    trace!("read {} bytes", data.len());
                    self.buffer.push(&data);
                }
                Some(ChannelMsg::Eof | ChannelMsg::Close) | None => {
                    return Err(ChannelError::Closed.into());
                }
                Some(_) => {}
            }
        }
        Ok(self.buffer.drain())
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.config.timeout = timeout;
    }

    /// Send EOF and close. Failures are ignored; the connection is going away.
    pub async fn close(self) {
        let _ = self.channel.eof().await;
        let _ = self.channel.close().await;
    }
}

//! Command-level access to one device.
//!
//! A driver owns the SSH connection and the interactive shell, knows which
//! privilege level the shell is at, and turns raw shell output into
//! [`Response`]s.

mod builder;
mod generic;
mod privilege;
mod response;

pub use builder::DriverBuilder;
pub use generic::GenericDriver;
pub use privilege::{PrivilegeGraph, Step};
pub use response::Response;

use std::future::Future;

use crate::error::Result;

/// Interactive CLI driver.
pub trait Driver: Send {
    /// Connect, log in, and run the dialect's on-open commands.
    fn open(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Disconnect. A no-op when not connected.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Send one command and wait for the next prompt.
    fn send_command(&mut self, command: &str) -> impl Future<Output = Result<Response>> + Send;

    /// Apply `lines` at the dialect's configuration level, then go back to the
    /// level the session was at.
    ///
    /// Stops after the first rejected line; that response is the last one
    /// returned.
    fn send_config(&mut self, lines: &[&str]) -> impl Future<Output = Result<Vec<Response>>> + Send;

    /// Move to the named privilege level.
    fn acquire_privilege(&mut self, level: &str) -> impl Future<Output = Result<()>> + Send;

    fn is_open(&self) -> bool;

    /// Level the shell is believed to be at.
    fn current_privilege(&self) -> Option<&str>;
}

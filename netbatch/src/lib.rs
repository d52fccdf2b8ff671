//! # netbatch
//!
//! Batch administrative actions against a fleet of network devices over SSH.
//!
//! An inventory lists one task per line: a device, its credentials, an action
//! (`AUDIT`, `BACKUP` or `PUSH`) and the commands for it. Every row gets its
//! own session, its own output file and exactly one line in the run summary.
//! A failing device never stops the run.
//!
//! ## Layers
//!
//! - [`transport`], [`channel`], [`driver`], [`platform`]: the SSH stack.
//!   Connect with russh, drive an interactive PTY shell, match prompts, and
//!   navigate privilege levels per device dialect.
//! - [`session`]: the per-row [`DeviceSession`] lifecycle on top of the driver.
//! - [`action`]: what AUDIT, BACKUP and PUSH do with an open session.
//! - [`runner`]: the bounded, order-preserving pass over the inventory.
//! - [`inventory`], [`artifact`], [`sink`]: files in and out.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use netbatch::{PlatformRegistry, RunConfig, SshConnector, SshOptions, TaskRunner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let rows = netbatch::inventory::load(Path::new("equipement_reseau.csv"))?;
//!     let connector = SshConnector::new(PlatformRegistry::with_builtins()?, SshOptions::default());
//!
//!     let report = TaskRunner::new(connector, RunConfig::default()).run(rows).await?;
//!     println!("{} -> {}", report.counts, report.summary_path.display());
//!     Ok(())
//! }
//! ```

pub mod action;
pub mod artifact;
pub mod channel;
pub mod cli;
pub mod driver;
pub mod error;
pub mod inventory;
pub mod platform;
pub mod runner;
pub mod session;
pub mod sink;
pub mod transport;

pub use driver::{Driver, DriverBuilder, GenericDriver, Response};
pub use error::{ConnectError, Error, ExecError, RowError, RunError};
pub use inventory::{Action, InventoryRow};
pub use platform::{PlatformDefinition, PlatformRegistry, PrivilegeLevel};
pub use runner::{RunConfig, RunReport, TaskRunner};
pub use session::{DeviceSession, SessionConnector, SessionState, SshConnector, SshOptions};
pub use sink::{ResultRecord, Status};
pub use transport::{HostKeyVerification, SshConfig};

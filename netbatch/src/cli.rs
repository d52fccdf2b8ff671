//! Command-line interface.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::runner::RunConfig;
use crate::session::SshOptions;
use crate::transport::HostKeyVerification;

/// Run AUDIT, BACKUP and PUSH actions against the devices of an inventory
#[derive(Parser, Debug)]
#[command(name = "netbatch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct Cli {
    /// `;`-separated inventory file
    #[arg(short, long, env = "NETBATCH_INVENTORY", default_value = "equipement_reseau.csv")]
    pub inventory: PathBuf,

    /// Directory for output files and the summary
    #[arg(short, long, env = "NETBATCH_OUTPUT_DIR", default_value = "outputs")]
    pub output_dir: PathBuf,

    /// Most devices worked on at the same time (1 = one after another)
    #[arg(
        short,
        long,
        env = "NETBATCH_CONCURRENCY",
        default_value_t = 4,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub concurrency: u16,

    /// Seconds allowed for login and privilege escalation
    #[arg(long, env = "NETBATCH_CONNECT_TIMEOUT", default_value_t = 30)]
    pub connect_timeout: u64,

    /// Seconds allowed for each command
    #[arg(long, env = "NETBATCH_COMMAND_TIMEOUT", default_value_t = 60)]
    pub command_timeout: u64,

    /// SSH port
    #[arg(short, long, env = "NETBATCH_PORT", default_value_t = 22)]
    pub port: u16,

    /// How unknown or changed host keys are handled
    #[arg(long, env = "NETBATCH_HOST_KEY_VERIFICATION", value_enum, default_value_t = HostKeyVerification::AcceptNew)]
    pub host_key_verification: HostKeyVerification,

    /// known_hosts file (defaults to ~/.ssh/known_hosts)
    #[arg(long, env = "NETBATCH_KNOWN_HOSTS")]
    pub known_hosts: Option<PathBuf>,
}

impl Cli {
    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            output_dir: self.output_dir.clone(),
            concurrency: usize::from(self.concurrency),
            connect_timeout: Duration::from_secs(self.connect_timeout),
            command_timeout: Duration::from_secs(self.command_timeout),
        }
    }

    pub fn ssh_options(&self) -> SshOptions {
        SshOptions {
            port: self.port,
            connect_timeout: Duration::from_secs(self.connect_timeout),
            command_timeout: Duration::from_secs(self.command_timeout),
            host_key_verification: self.host_key_verification,
            known_hosts_path: self.known_hosts.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["netbatch"]);
        let config = cli.run_config();
        assert_eq!(cli.inventory, PathBuf::from("equipement_reseau.csv"));
        assert_eq!(config.output_dir, PathBuf::from("outputs"));
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
        assert_eq!(cli.ssh_options().port, 22);
        assert_eq!(cli.host_key_verification, HostKeyVerification::AcceptNew);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from([
            "netbatch",
            "--inventory",
            "fleet.csv",
            "-c",
            "1",
            "--command-timeout",
            "5",
            "--host-key-verification",
            "strict",
            "--known-hosts",
            "/tmp/kh",
        ]);
        assert_eq!(cli.inventory, PathBuf::from("fleet.csv"));
        assert_eq!(cli.run_config().concurrency, 1);
        assert_eq!(cli.run_config().command_timeout, Duration::from_secs(5));

        let ssh = cli.ssh_options();
        assert_eq!(ssh.host_key_verification, HostKeyVerification::Strict);
        assert_eq!(ssh.known_hosts_path, Some(PathBuf::from("/tmp/kh")));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        assert!(Cli::try_parse_from(["netbatch", "--concurrency", "0"]).is_err());
    }

    #[test]
    fn test_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;
use slurm_api::FailurePolicy;
use slurm_providers::runner::DEFAULT_COMMAND_TIMEOUT;

pub const DEFAULT_LISTEN_ADDRESS: &str = ":9341";
pub const DEFAULT_CLUSTERS: &str = "local";

#[derive(Parser, Debug, Default)]
#[command(name = "slurm-exporter")]
#[command(about = "Prometheus exporter for Slurm cluster metrics")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Address to listen on for telemetry [default: :9341]
    #[arg(long, value_name = "ADDR")]
    pub listen_address: Option<String>,

    /// Comma-separated list of clusters to export [default: local]
    #[arg(long, value_name = "LIST")]
    pub clusters: Option<String>,

    /// Enable GPU accounting
    #[arg(long)]
    pub gpus_acct: bool,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Seconds an external command may run before it is killed [default: 30]
    #[arg(long, value_name = "SECS")]
    pub command_timeout: Option<u64>,

    /// What a scrape does when a command fails: exit or skip [default: exit]
    #[arg(long, value_name = "POLICY")]
    pub on_command_failure: Option<FailurePolicy>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("command timeout must be at least one second")]
    ZeroTimeout,
}

/// Keys accepted in the TOML file. Everything is optional.
#[derive(Deserialize, Debug, Default)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    listen_address: Option<String>,
    clusters: Option<Vec<String>>,
    gpus_acct: Option<bool>,
    command_timeout_secs: Option<u64>,
    on_command_failure: Option<FailurePolicy>,
}

/// Settings after merging flags over the file over the defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub listen_address: String,
    pub clusters: Vec<String>,
    pub gpus_acct: bool,
    pub command_timeout: Duration,
    pub on_command_failure: FailurePolicy,
}

impl Config {
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => read_file(path)?,
            None => FileConfig::default(),
        };
        Self::merge(cli, file)
    }

    fn merge(cli: &Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let listenAddress = cli
            .listen_address
            .clone()
            .or(file.listen_address)
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDRESS.into());

        let mut clusters = match &cli.clusters {
            Some(list) => split_list(list),
            None => file.clusters.unwrap_or_default(),
        };
        clusters.retain(|c| !c.trim().is_empty());
        if clusters.is_empty() {
            clusters.push(DEFAULT_CLUSTERS.into());
        }

        let commandTimeout = match cli.command_timeout.or(file.command_timeout_secs) {
            Some(0) => return Err(ConfigError::ZeroTimeout),
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_COMMAND_TIMEOUT,
        };

        Ok(Self {
            listen_address: bind_address(&listenAddress),
            clusters,
            gpus_acct: cli.gpus_acct || file.gpus_acct.unwrap_or(false),
            command_timeout: commandTimeout,
            on_command_failure: cli
                .on_command_failure
                .or(file.on_command_failure)
                .unwrap_or_default(),
        })
    }
}

fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',').map(|s| s.trim().to_string()).collect()
}

/// `:9341` means every interface.
fn bind_address(addr: &str) -> String {
    if addr.starts_with(':') {
        format!("0.0.0.0{addr}")
    } else {
        addr.to_string()
    }
}

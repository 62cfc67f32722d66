#![allow(non_snake_case)]

pub mod clusters;
pub mod cpus;
pub mod fairshare;
pub mod gpus;
pub mod jobs;
pub mod node;
pub mod nodes;
pub mod parser;
pub mod partitions;
pub mod queue;
pub mod runner;
pub mod scheduler;

#[cfg(any(test, feature = "test-util"))]
pub mod fake;

use std::time::Duration;

pub use runner::{CommandRunner, SystemRunner};

/// Failure to obtain output from an external Slurm command.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {status}: {stderr}")]
    Exit {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("{command} did not finish within {timeout:?}")]
    Timeout { command: String, timeout: Duration },
}

pub type Result<T> = std::result::Result<T, ProviderError>;

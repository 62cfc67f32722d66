//! Canned command output for exercising sources without a Slurm installation.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::{CommandRunner, ProviderError, Result};

struct Reply {
    command: String,
    required: Vec<String>,
    stdout: Option<Vec<u8>>,
}

/// Answers invocations from a list of rules. The first rule whose command
/// matches and whose required tokens all appear in the arguments wins;
/// anything unmatched gets empty output.
#[derive(Default)]
pub struct FakeRunner {
    replies: Vec<Reply>,
    calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, command: &str, required: &[&str], stdout: &str) -> Self {
        self.replies.push(Reply {
            command: command.into(),
            required: required.iter().map(|s| s.to_string()).collect(),
            stdout: Some(stdout.as_bytes().to_vec()),
        });
        self
    }

    /// Makes matching invocations fail as if the command exited non-zero.
    pub fn fail(mut self, command: &str, required: &[&str]) -> Self {
        self.replies.push(Reply {
            command: command.into(),
            required: required.iter().map(|s| s.to_string()).collect(),
            stdout: None,
        });
        self
    }

    /// Every invocation seen so far, in order.
    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn execute(&self, command: &str, args: &[String]) -> Result<Vec<u8>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((command.to_string(), args.to_vec()));

        let matched = self.replies.iter().find(|r| {
            r.command == command && r.required.iter().all(|token| args.contains(token))
        });

        match matched {
            Some(Reply { stdout: Some(out), .. }) => Ok(out.clone()),
            Some(Reply { stdout: None, .. }) => Err(ProviderError::Exit {
                command: command.to_string(),
                status: "exit status: 1".into(),
                stderr: "simulated failure".into(),
            }),
            None => Ok(Vec::new()),
        }
    }
}

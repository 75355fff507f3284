//! Remote shell handoff.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::info;

use crate::config::ShellConfig;

/// Opens an interactive session on a remote host and waits for it to end.
#[async_trait]
pub trait RemoteShell: Send + Sync {
    /// Returns the session's exit code (`None` if it was killed by a signal).
    ///
    /// # Errors
    /// Fails only when the session process cannot be spawned.
    async fn open(&self, host: &str) -> std::io::Result<Option<i32>>;
}

/// `ssh` with the terminal attached.
#[derive(Debug, Clone)]
pub struct SshShell {
    config: ShellConfig,
}

impl SshShell {
    pub fn new(config: ShellConfig) -> Self {
        Self { config }
    }

    /// Arguments passed to `ssh` for `host`.
    pub fn args(&self, host: &str) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(key) = &self.config.key_path {
            args.push("-i".to_string());
            args.push(key.display().to_string());
        }
        args.push(format!("{}@{host}", self.config.user));
        args
    }
}

#[async_trait]
impl RemoteShell for SshShell {
    async fn open(&self, host: &str) -> std::io::Result<Option<i32>> {
        let args = self.args(host);
        info!(host = %host, user = %self.config.user, "Opening SSH session");

        // The child inherits the terminal.
        let status = Command::new("ssh").args(&args).status().await?;
        Ok(status.code())
    }
}

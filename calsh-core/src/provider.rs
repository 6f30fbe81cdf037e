//! Provider subprocess protocol.
//!
//! This module handles communication with external provider binaries
//! (e.g., `calsh-provider-google`) using JSON over stdin/stdout.
//!
//! The protocol is designed to be language-agnostic: any executable
//! that speaks the JSON protocol can be a provider.
//!
//! Providers manage their own credentials and tokens. Core just passes
//! provider-specific parameters from the shell config.

use crate::error::{CalshError, CalshResult};
use crate::protocol::{Command as ProviderCommand, Request, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct Provider {
    name: String,
    timeout: Duration,
}

impl Provider {
    pub fn from_name(name: &str) -> Self {
        Provider {
            name: name.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn binary_name(&self) -> String {
        format!("calsh-provider-{}", self.name)
    }

    fn binary_path(&self) -> CalshResult<std::path::PathBuf> {
        let binary_name = self.binary_name();
        which::which(&binary_name).map_err(|_| CalshError::ProviderNotInstalled {
            name: self.name.clone(),
            binary: binary_name.clone(),
        })
    }

    /// Run the provider's interactive auth flow. Returns the account identifier.
    ///
    /// No timeout: the user is busy in a browser.
    pub async fn authenticate(&self) -> CalshResult<String> {
        self.call(ProviderCommand::Authenticate, serde_json::json!({})).await
    }

    /// Call a provider command, giving up after the configured timeout.
    pub async fn call_with_timeout<R: DeserializeOwned>(
        &self,
        command: ProviderCommand,
        params: serde_json::Value,
    ) -> CalshResult<R> {
        timeout(self.timeout, self.call(command, params))
            .await
            .map_err(|_| CalshError::ProviderTimeout(self.timeout.as_secs()))?
    }

    pub async fn call<R: DeserializeOwned>(
        &self,
        command: ProviderCommand,
        params: serde_json::Value,
    ) -> CalshResult<R> {
        let request = Request { command, params };
        let request_json =
            serde_json::to_string(&request).map_err(|e| CalshError::Serialization(e.to_string()))?;

        let binary_path = self.binary_path()?;
        log::debug!("{:?} -> {}", command, binary_path.display());

        let mut child = Command::new(&binary_path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CalshError::Provider(format!("Failed to spawn {}: {}", binary_path.display(), e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| CalshError::Provider("Provider stdin was not piped".into()))?;
        stdin.write_all(format!("{request_json}\n").as_bytes()).await?;
        drop(stdin);

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(CalshError::Provider(format!(
                "Provider exited with status: {}",
                output.status.code().unwrap_or(-1)
            )));
        }

        let response_str = String::from_utf8_lossy(&output.stdout);
        let response_line = response_str.lines().find(|l| !l.trim().is_empty());
        let Some(response_line) = response_line else {
            return Err(CalshError::Provider("Provider returned no response".into()));
        };

        let response: Response<R> = serde_json::from_str(response_line)
            .map_err(|e| CalshError::Provider(format!("Failed to parse response: {}", e)))?;

        match response {
            Response::Success { data } => Ok(data),
            Response::Error { error } => Err(CalshError::Provider(error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_name_is_prefixed() {
        assert_eq!(Provider::from_name("google").binary_name(), "calsh-provider-google");
    }

    #[tokio::test]
    async fn missing_provider_is_reported() {
        let provider = Provider::from_name("definitely-not-installed-anywhere");
        let err = provider
            .call_with_timeout::<()>(ProviderCommand::ListEvents, serde_json::json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, CalshError::ProviderNotInstalled { .. }));
    }
}

//! Credential and token storage for the Google provider.
//!
//! Files live in:
//!   ~/.config/calsh/providers/google/credentials.json
//!   ~/.config/calsh/providers/google/tokens/{account}.json

use crate::types::{AccountTokens, GoogleCredentials};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

fn base_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("Could not determine config directory")?
        .join("calsh")
        .join("providers")
        .join("google"))
}

pub fn load_credentials() -> Result<GoogleCredentials> {
    load_credentials_from(&base_dir()?.join("credentials.json"))
}

fn load_credentials_from(path: &Path) -> Result<GoogleCredentials> {
    if !path.exists() {
        anyhow::bail!(
            "Google credentials not found.\n\n\
            Create {} with:\n\n\
            {{\n  \
              \"client_id\": \"your-client-id.apps.googleusercontent.com\",\n  \
              \"client_secret\": \"your-client-secret\"\n\
            }}\n\n\
            See https://console.cloud.google.com/apis/credentials for setup.",
            path.display()
        );
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read credentials from {}", path.display()))?;

    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse credentials from {}", path.display()))
}

pub fn load_tokens(account: &str) -> Result<AccountTokens> {
    load_tokens_from(&token_path(&base_dir()?, account), account)
}

fn load_tokens_from(path: &Path, account: &str) -> Result<AccountTokens> {
    if !path.exists() {
        anyhow::bail!(
            "No tokens for account: {}\n\
            Run `calsh auth google` first.",
            account
        );
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read tokens from {}", path.display()))?;

    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse tokens from {}", path.display()))
}

pub fn save_tokens(account: &str, tokens: &AccountTokens) -> Result<()> {
    save_tokens_to(&token_path(&base_dir()?, account), tokens)
}

fn save_tokens_to(path: &Path, tokens: &AccountTokens) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create tokens directory at {}", parent.display()))?;
    }

    let contents = serde_json::to_string_pretty(tokens).context("Failed to serialize tokens")?;

    write_private(path, contents.as_bytes())
        .with_context(|| format!("Failed to write tokens to {}", path.display()))
}

// Tokens are secrets: owner read/write only.
#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on create
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, contents)
}

fn token_path(base: &Path, account: &str) -> PathBuf {
    let safe_account = account.replace(['/', '\\', ':'], "_");
    base.join("tokens").join(format!("{}.json", safe_account))
}

use alloy::primitives::B256;
use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, anyhow};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const DEFAULT_KEY_DIR: &str = "simple-storage";
const DEFAULT_KEY_FILE: &str = "private.key";

/// Gets the default private key path, e.g. `~/.config/simple-storage/private.key` on Linux.
pub fn default_key_path() -> anyhow::Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("Could not find config directory")?
        .join(DEFAULT_KEY_DIR)
        .join(DEFAULT_KEY_FILE))
}

/// Loads a private key file holding either the raw 32 key bytes or the key as hex text.
pub fn load_private_key(path: &Path) -> anyhow::Result<PrivateKeySigner> {
    let bytes = fs::read(path)
        .with_context(|| format!("Failed to read private key at {}", path.display()))?;

    if bytes.len() == 32 {
        return PrivateKeySigner::from_bytes(&B256::from_slice(&bytes))
            .map_err(|e| anyhow!("Failed to parse private key: {e}"));
    }

    let text = std::str::from_utf8(&bytes)
        .map_err(|_| anyhow!("Private key at {} is neither raw nor hex", path.display()))?;
    PrivateKeySigner::from_str(text.trim())
        .map_err(|e| anyhow!("Failed to parse private key: {e}"))
}

/// Loads the key from the default location.
pub fn load_default_private_key() -> anyhow::Result<PrivateKeySigner> {
    load_private_key(&default_key_path()?)
}

//! Generated-file emission with explicit permission bits.
//!
//! Conventions across the recipes: secrets and config files 0o600,
//! lifecycle scripts 0o700, READMEs 0o600. Writes are not atomic and
//! existing files are overwritten silently; re-running an installer is not
//! idempotent by contract.

use std::fs::{self, OpenOptions, Permissions};
use std::io::Write as _;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use opal_core::Result;

/// Write (create or truncate) a file, then chmod it.
pub fn write_file(path: &Path, content: &str, mode: u32) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    fs::set_permissions(path, Permissions::from_mode(mode))?;
    tracing::debug!("wrote {} (mode {mode:o})", path.display());
    Ok(())
}

/// Append to a file (creating it if absent), then chmod it.
pub fn append_file(path: &Path, content: &str, mode: u32) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(content.as_bytes())?;
    fs::set_permissions(path, Permissions::from_mode(mode))?;
    Ok(())
}

/// Patch `KEY=VALUE` entries in an env-style file.
///
/// Parses the file into its line structure, replaces the value of every key
/// named in `updates` in place, appends keys that were not present, and
/// serializes back. Comments and unrelated lines survive untouched. This
/// replaces the original scripts' regex-over-text patching.
pub fn patch_env_file(path: &Path, updates: &[(&str, &str)]) -> Result<()> {
    let original = fs::read_to_string(path)?;
    fs::write(path, patch_env(&original, updates))?;
    Ok(())
}

fn patch_env(content: &str, updates: &[(&str, &str)]) -> String {
    let mut seen = vec![false; updates.len()];
    let mut out: Vec<String> = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim_start();
        let replaced = if trimmed.starts_with('#') {
            None
        } else {
            trimmed.split_once('=').and_then(|(key, _)| {
                let key = key.trim();
                updates.iter().position(|(k, _)| *k == key)
            })
        };
        match replaced {
            Some(idx) => {
                seen[idx] = true;
                out.push(format!("{}={}", updates[idx].0, updates[idx].1));
            }
            None => out.push(line.to_string()),
        }
    }

    for (idx, (key, value)) in updates.iter().enumerate() {
        if !seen[idx] {
            out.push(format!("{key}={value}"));
        }
    }

    let mut result = out.join("\n");
    result.push('\n');
    result
}

//! Cron keepalive installation.
//!
//! The one mutation to shared OS state outside the application directory.
//! The current crontab is staged into a uniquely named temp file before
//! reinstalling, because several installers may run concurrently for the
//! same OS user. Lines are appended without deduplication; re-running an
//! installer adds a second keepalive line.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use rand::RngExt;

use opal_core::secrets;

/// Build the keepalive line for a start script: six times per hour at a
/// random minute offset, so installed apps do not all restart at once.
pub fn keepalive_line(start_script: &Path) -> String {
    let offset = rand::rng().random_range(0..10u32);
    keepalive_line_at(offset, start_script)
}

fn keepalive_line_at(offset: u32, start_script: &Path) -> String {
    let minutes: Vec<String> = (0..6).map(|i| (offset + i * 10).to_string()).collect();
    format!("{} * * * * {}", minutes.join(","), start_script.display())
}

/// Append one line to crontab text, normalizing the trailing newline.
pub fn append_line(current: &str, line: &str) -> String {
    let mut out = current.trim_end().to_string();
    if !out.is_empty() {
        out.push('\n');
    }
    out.push_str(line);
    out.push('\n');
    out
}

/// Unique staging path for the combined crontab.
fn staging_path() -> PathBuf {
    std::env::temp_dir().join(format!("crontab.{}", secrets::random_token(10)))
}

/// Read the current crontab, append `line`, and reinstall the result.
///
/// `crontab -l` exits non-zero when the user has no crontab yet; that case
/// starts from empty. No verification beyond the install exit status.
pub fn install_line(line: &str) -> Result<()> {
    let current = match Command::new("crontab").arg("-l").output() {
        Ok(o) if o.status.success() => String::from_utf8_lossy(&o.stdout).into_owned(),
        _ => String::new(),
    };

    let staging = staging_path();
    std::fs::write(&staging, append_line(&current, line))
        .with_context(|| format!("failed to stage crontab at {}", staging.display()))?;

    let status = Command::new("crontab")
        .arg(&staging)
        .status()
        .context("failed to execute crontab")?;
    let _ = std::fs::remove_file(&staging);
    if !status.success() {
        bail!("crontab install failed (exit {status})");
    }
    Ok(())
}

/// Install the keepalive line for a generated start script.
pub fn install_keepalive(start_script: &Path) -> Result<()> {
    let line = keepalive_line(start_script);
    tracing::info!("installing cron keepalive: {line}");
    install_line(&line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keepalive_line_covers_six_slots() {
        let line = keepalive_line_at(3, Path::new("/home/testuser/apps/testapp/start"));
        assert_eq!(
            line,
            "3,13,23,33,43,53 * * * * /home/testuser/apps/testapp/start"
        );
    }

    #[test]
    fn keepalive_offset_stays_within_cadence() {
        for _ in 0..100 {
            let line = keepalive_line(Path::new("/x/start"));
            let first = line.split(',').next().unwrap();
            let offset: u32 = first.parse().unwrap();
            assert!(offset < 10, "offset out of range in: {line}");
        }
    }

    #[test]
    fn append_to_empty_crontab() {
        assert_eq!(append_line("", "1 * * * * /x/start"), "1 * * * * /x/start\n");
    }

    #[test]
    fn append_preserves_existing_lines() {
        let combined = append_line("0 * * * * /y/start\n", "1 * * * * /x/start");
        assert_eq!(combined, "0 * * * * /y/start\n1 * * * * /x/start\n");
    }

    #[test]
    fn append_twice_keeps_both_lines() {
        // No deduplication by contract.
        let once = append_line("", "1 * * * * /x/start");
        let twice = append_line(&once, "1 * * * * /x/start");
        assert_eq!(twice.lines().count(), 2);
    }

    #[test]
    fn staging_paths_are_unique_across_invocations() {
        // Concurrent installers for one OS user must not share a temp file.
        let paths: Vec<PathBuf> = (0..100).map(|_| staging_path()).collect();
        for (i, a) in paths.iter().enumerate() {
            for b in &paths[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}

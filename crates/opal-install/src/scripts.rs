//! Lifecycle script and README templates.
//!
//! Every recipe emits the same four scripts into the application directory:
//! `start`, `stop`, `restart`, `status`. They manage a PID file under
//! `tmp/`; `start` refuses to double-start (exit 99 when already running)
//! and `stop` escalates SIGTERM to SIGKILL after a 10 second grace period.

use std::path::Path;

use anyhow::Result;

use crate::files;

/// Values interpolated into the lifecycle templates.
#[derive(Debug, Clone)]
pub struct ScriptParams<'a> {
    pub app_name: &'a str,
    pub app_dir: &'a Path,
    pub port: u16,
    /// Command line launching the service, executed from the app directory.
    pub start_command: &'a str,
}

pub fn start_script(p: &ScriptParams<'_>) -> String {
    format!(
        r#"#!/bin/bash
# Start {name} (port {port}).

APP_DIR={dir}
PIDFILE="$APP_DIR/tmp/{name}.pid"

if [ -e "$PIDFILE" ] && kill -0 "$(cat "$PIDFILE")" 2> /dev/null; then
    echo "{name} is already running (pid $(cat "$PIDFILE"))."
    exit 99
fi

mkdir -p "$APP_DIR/tmp" "$APP_DIR/logs"
cd "$APP_DIR"
nohup {start_command} >> "$APP_DIR/logs/{name}.log" 2>&1 &
echo $! > "$PIDFILE"
echo "Started {name} on port {port}."
"#,
        name = p.app_name,
        dir = p.app_dir.display(),
        port = p.port,
        start_command = p.start_command,
    )
}

pub fn stop_script(p: &ScriptParams<'_>) -> String {
    format!(
        r#"#!/bin/bash
# Stop {name}.

APP_DIR={dir}
PIDFILE="$APP_DIR/tmp/{name}.pid"

if [ ! -e "$PIDFILE" ]; then
    echo "{name} is not running (no pid file)."
    exit 0
fi

PID=$(cat "$PIDFILE")
if kill -0 "$PID" 2> /dev/null; then
    kill "$PID"
    for _ in 1 2 3 4 5 6 7 8 9 10; do
        kill -0 "$PID" 2> /dev/null || break
        sleep 1
    done
    if kill -0 "$PID" 2> /dev/null; then
        echo "{name} did not exit after SIGTERM, sending SIGKILL."
        kill -9 "$PID"
    fi
fi
rm -f "$PIDFILE"
echo "Stopped {name}."
"#,
        name = p.app_name,
        dir = p.app_dir.display(),
    )
}

pub fn restart_script(p: &ScriptParams<'_>) -> String {
    format!(
        r#"#!/bin/bash
APP_DIR={dir}
"$APP_DIR/stop"
"$APP_DIR/start"
"#,
        dir = p.app_dir.display(),
    )
}

pub fn status_script(p: &ScriptParams<'_>) -> String {
    format!(
        r#"#!/bin/bash
APP_DIR={dir}
PIDFILE="$APP_DIR/tmp/{name}.pid"

if [ -e "$PIDFILE" ] && kill -0 "$(cat "$PIDFILE")" 2> /dev/null; then
    echo "{name} is running (pid $(cat "$PIDFILE"))."
else
    echo "{name} is stopped."
fi
"#,
        name = p.app_name,
        dir = p.app_dir.display(),
    )
}

/// README for the application directory. `notes` carries recipe-specific
/// post-install instructions.
pub fn readme(p: &ScriptParams<'_>, notes: &str) -> String {
    format!(
        r"# {name}

This application was provisioned by opal-install.

- Assigned port: {port}
- Application directory: {dir}
- Lifecycle: ./start, ./stop, ./restart, ./status
- A cron keepalive re-runs ./start every 10 minutes.

{notes}
",
        name = p.app_name,
        dir = p.app_dir.display(),
        port = p.port,
    )
}

/// Emit all four lifecycle scripts (mode 0700) plus the README (mode 0600).
pub fn emit_lifecycle(p: &ScriptParams<'_>, readme_notes: &str) -> Result<()> {
    files::write_file(&p.app_dir.join("start"), &start_script(p), 0o700)?;
    files::write_file(&p.app_dir.join("stop"), &stop_script(p), 0o700)?;
    files::write_file(&p.app_dir.join("restart"), &restart_script(p), 0o700)?;
    files::write_file(&p.app_dir.join("status"), &status_script(p), 0o700)?;
    files::write_file(&p.app_dir.join("README"), &readme(p, readme_notes), 0o600)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::process::Command;

    use super::*;

    fn params(dir: &Path) -> ScriptParams<'_> {
        ScriptParams {
            app_name: "testapp",
            app_dir: dir,
            port: 12345,
            start_command: "./run",
        }
    }

    #[test]
    fn start_contains_port_and_already_running_exit() {
        let dir = PathBuf::from("/home/testuser/apps/testapp");
        let script = start_script(&params(&dir));
        assert!(script.contains("12345"));
        assert!(script.contains("exit 99"));
        assert!(script.contains("tmp/testapp.pid"));
    }

    #[test]
    fn stop_escalates_term_to_kill() {
        let dir = PathBuf::from("/home/testuser/apps/testapp");
        let script = stop_script(&params(&dir));
        assert!(script.contains(r#"kill "$PID""#));
        assert!(script.contains(r#"kill -9 "$PID""#));
        // TERM goes first.
        assert!(script.find(r#"kill "$PID""#).unwrap() < script.find("kill -9").unwrap());
    }

    #[test]
    fn emit_lifecycle_sets_script_modes() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        emit_lifecycle(&params(dir.path()), "no notes").unwrap();
        for script in ["start", "stop", "restart", "status"] {
            let mode = std::fs::metadata(dir.path().join(script))
                .unwrap()
                .permissions()
                .mode()
                & 0o777;
            assert_eq!(mode, 0o700, "{script} should be 0700");
        }
        let readme_mode = std::fs::metadata(dir.path().join("README"))
            .unwrap()
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(readme_mode, 0o600);
    }

    #[test]
    fn start_exits_99_when_pid_file_is_live() {
        let dir = tempfile::tempdir().unwrap();
        emit_lifecycle(&params(dir.path()), "").unwrap();

        // Plant a PID file pointing at a process that is definitely alive:
        // this test process.
        std::fs::create_dir_all(dir.path().join("tmp")).unwrap();
        std::fs::write(
            dir.path().join("tmp/testapp.pid"),
            format!("{}\n", std::process::id()),
        )
        .unwrap();

        let status = Command::new(dir.path().join("start")).status().unwrap();
        assert_eq!(status.code(), Some(99));
    }

    fn pid_alive(pid: u32) -> bool {
        Command::new("/bin/sh")
            .args(["-c", &format!("kill -0 {pid} 2> /dev/null")])
            .status()
            .is_ok_and(|s| s.success())
    }

    fn recorded_pid(dir: &Path) -> u32 {
        std::fs::read_to_string(dir.join("tmp/testapp.pid"))
            .unwrap()
            .trim()
            .parse()
            .unwrap()
    }

    #[test]
    fn stop_then_start_leaves_exactly_one_live_process() {
        let dir = tempfile::tempdir().unwrap();
        let p = ScriptParams {
            start_command: "sleep 30",
            ..params(dir.path())
        };
        emit_lifecycle(&p, "").unwrap();

        let status = Command::new(dir.path().join("start")).status().unwrap();
        assert!(status.success());
        let first = recorded_pid(dir.path());
        assert!(pid_alive(first), "service should be up after start");

        let status = Command::new(dir.path().join("stop")).status().unwrap();
        assert!(status.success());
        assert!(!dir.path().join("tmp/testapp.pid").exists());
        assert!(!pid_alive(first), "old process should be dead after stop");

        let status = Command::new(dir.path().join("start")).status().unwrap();
        assert!(status.success());
        let second = recorded_pid(dir.path());
        assert_ne!(first, second);
        assert!(pid_alive(second), "service should be up again");

        // Exactly one pid on record.
        let pidfile = std::fs::read_to_string(dir.path().join("tmp/testapp.pid")).unwrap();
        assert_eq!(pidfile.trim().lines().count(), 1);

        let _ = Command::new(dir.path().join("stop")).status();
    }

    #[test]
    fn stop_without_pid_file_is_a_noop_success() {
        let dir = tempfile::tempdir().unwrap();
        emit_lifecycle(&params(dir.path()), "").unwrap();

        let status = Command::new(dir.path().join("stop")).status().unwrap();
        assert_eq!(status.code(), Some(0));
    }
}

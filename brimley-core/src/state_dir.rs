//! Persisted `.brimley/` project state directory: `daemon.json` and
//! `repl_client.json`, both plain JSON, used to enforce single-active-client
//! semantics across process restarts. Stale entries are recovered by
//! checking whether the recorded pid is still alive rather than trusting the
//! file unconditionally.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::BrimleyError;

const DAEMON_FILE: &str = "daemon.json";
const REPL_CLIENT_FILE: &str = "repl_client.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonState {
    pub pid: u32,
    pub port: u16,
    pub started_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplClientState {
    pub pid: u32,
    pub attached_at: String,
}

/// Handle to a project's `.brimley/` directory.
pub struct StateDir {
    dir: PathBuf,
}

impl StateDir {
    pub fn new(root_dir: impl AsRef<Path>) -> Self {
        StateDir { dir: root_dir.as_ref().join(".brimley") }
    }

    fn ensure_dir(&self) -> Result<(), BrimleyError> {
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    pub fn write_daemon(&self, pid: u32, port: u16) -> Result<(), BrimleyError> {
        self.ensure_dir()?;
        let state = DaemonState { pid, port, started_at: now_rfc3339() };
        write_json(&self.dir.join(DAEMON_FILE), &state)
    }

    /// Read `daemon.json`, recovering a stale entry (pid no longer alive) as
    /// `None` rather than surfacing it as a live daemon.
    pub fn read_daemon(&self) -> Option<DaemonState> {
        let state: DaemonState = read_json(&self.dir.join(DAEMON_FILE))?;
        if is_pid_alive(state.pid) {
            Some(state)
        } else {
            let _ = fs::remove_file(self.dir.join(DAEMON_FILE));
            None
        }
    }

    pub fn clear_daemon(&self) -> Result<(), BrimleyError> {
        remove_if_exists(&self.dir.join(DAEMON_FILE))
    }

    /// Claim the single REPL client slot. Fails if a `repl_client.json` entry
    /// exists and its pid is still alive; a stale entry (dead pid) is
    /// silently reclaimed.
    pub fn claim_repl_client(&self, pid: u32) -> Result<(), BrimleyError> {
        self.ensure_dir()?;
        let path = self.dir.join(REPL_CLIENT_FILE);
        if let Some(existing) = read_json::<ReplClientState>(&path) {
            if is_pid_alive(existing.pid) {
                return Err(BrimleyError::Config(format!(
                    "another REPL client (pid {}) is already attached to this project",
                    existing.pid
                )));
            }
        }
        let state = ReplClientState { pid, attached_at: now_rfc3339() };
        write_json(&path, &state)
    }

    pub fn release_repl_client(&self) -> Result<(), BrimleyError> {
        remove_if_exists(&self.dir.join(REPL_CLIENT_FILE))
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), BrimleyError> {
    let body = serde_json::to_string_pretty(value).map_err(|e| BrimleyError::Config(e.to_string()))?;
    fs::write(path, body)?;
    Ok(())
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Option<T> {
    let body = fs::read_to_string(path).ok()?;
    serde_json::from_str(&body).ok()
}

fn remove_if_exists(path: &Path) -> Result<(), BrimleyError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(target_os = "linux")]
fn is_pid_alive(pid: u32) -> bool {
    Path::new(&format!("/proc/{pid}")).exists()
}

/// Non-Linux platforms have no cheap stdlib-only liveness check; assume the
/// recorded pid is alive and rely on the file being overwritten on the next
/// successful claim.
#[cfg(not(target_os = "linux"))]
fn is_pid_alive(_pid: u32) -> bool {
    true
}

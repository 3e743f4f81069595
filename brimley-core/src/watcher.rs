//! Polling filesystem watcher: a full directory re-walk per poll
//! rather than an OS file-event API, diffing file mtimes and debouncing
//! bursts of changes behind an explicit state machine.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::error::BrimleyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    Stopped,
    Watching,
    ChangeDetected,
    Debouncing,
    Reloading,
}

#[derive(Debug, Clone, Default)]
pub struct PollOutcome {
    pub should_reload: bool,
    pub changed_paths: Vec<PathBuf>,
}

impl PollOutcome {
    fn none() -> Self {
        PollOutcome::default()
    }
}

pub struct PollingWatcher {
    root: PathBuf,
    include: GlobSet,
    exclude: GlobSet,
    debounce: Duration,
    state: WatcherState,
    snapshot: HashMap<PathBuf, i64>,
    pending: BTreeSet<PathBuf>,
    last_change_at: Option<Instant>,
}

impl PollingWatcher {
    pub fn new(root: impl Into<PathBuf>, include_patterns: &[String], exclude_patterns: &[String], debounce_ms: u64) -> Result<Self, BrimleyError> {
        Ok(PollingWatcher {
            root: root.into(),
            include: build_globset(include_patterns)?,
            exclude: build_globset(exclude_patterns)?,
            debounce: Duration::from_millis(debounce_ms),
            state: WatcherState::Stopped,
            snapshot: HashMap::new(),
            pending: BTreeSet::new(),
            last_change_at: None,
        })
    }

    pub fn state(&self) -> WatcherState {
        self.state
    }

    /// Take the first snapshot and move from `stopped` to `watching`. The
    /// first snapshot never itself produces a reload — only subsequent
    /// divergence from it does.
    pub fn start(&mut self) {
        self.snapshot = self.take_snapshot();
        self.pending.clear();
        self.last_change_at = None;
        self.state = WatcherState::Watching;
    }

    pub fn stop(&mut self) {
        self.state = WatcherState::Stopped;
        self.pending.clear();
        self.last_change_at = None;
    }

    /// Advance the state machine by one poll tick. `now` is supplied by the
    /// caller so debounce timing stays deterministic under test.
    pub fn poll(&mut self, now: Instant) -> PollOutcome {
        if matches!(self.state, WatcherState::Stopped | WatcherState::Reloading) {
            return PollOutcome::none();
        }

        let fresh = self.take_snapshot();
        let changed = diff(&self.snapshot, &fresh);
        self.snapshot = fresh;

        if !changed.is_empty() {
            for path in &changed {
                self.pending.insert(path.clone());
            }
            self.last_change_at = Some(now);
            self.state = WatcherState::ChangeDetected;
            self.state = WatcherState::Debouncing;
            return PollOutcome::none();
        }

        if self.state == WatcherState::Debouncing {
            if let Some(last) = self.last_change_at {
                if now.saturating_duration_since(last) >= self.debounce {
                    self.state = WatcherState::Reloading;
                    let drained: Vec<PathBuf> = self.pending.iter().cloned().collect();
                    self.pending.clear();
                    return PollOutcome { should_reload: true, changed_paths: drained };
                }
            }
        }

        PollOutcome::none()
    }

    /// Leave `reloading` for `watching` once the reload cycle this poll
    /// triggered has run, regardless of whether it succeeded — a blocked
    /// reload still resumes watching for the next fix.
    pub fn complete_reload(&mut self) {
        self.state = WatcherState::Watching;
    }

    fn take_snapshot(&self) -> HashMap<PathBuf, i64> {
        let mut snapshot = HashMap::new();
        for entry in WalkDir::new(&self.root).into_iter().filter_map(Result::ok) {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let relative = path.strip_prefix(&self.root).unwrap_or(path);
            let relative_str = relative.to_string_lossy();
            let basename = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();

            let included = self.include.is_match(relative_str.as_ref()) || self.include.is_match(basename);
            if !included {
                continue;
            }
            let excluded = self.exclude.is_match(relative_str.as_ref()) || self.exclude.is_match(basename);
            if excluded {
                continue;
            }

            if let Ok(metadata) = entry.metadata() {
                if let Ok(modified) = metadata.modified() {
                    if let Ok(duration) = modified.duration_since(SystemTime::UNIX_EPOCH) {
                        snapshot.insert(path.to_path_buf(), duration.as_nanos() as i64);
                    }
                }
            }
        }
        snapshot
    }
}

/// Symmetric difference of two snapshots (added, removed, or mtime-changed
/// paths), returned in deterministic sorted order.
fn diff(old: &HashMap<PathBuf, i64>, new: &HashMap<PathBuf, i64>) -> Vec<PathBuf> {
    let mut changed = BTreeSet::new();
    for (path, mtime) in new {
        match old.get(path) {
            Some(previous) if previous == mtime => {}
            _ => {
                changed.insert(path.clone());
            }
        }
    }
    for path in old.keys() {
        if !new.contains_key(path) {
            changed.insert(path.clone());
        }
    }
    changed.into_iter().collect()
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, BrimleyError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| BrimleyError::Config(format!("invalid watcher glob '{pattern}': {e}")))?;
        builder.add(glob);
    }
    builder.build().map_err(|e| BrimleyError::Config(e.to_string()))
}

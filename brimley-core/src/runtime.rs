//! Runtime controller: owns the watcher/reload-engine lifecycle and
//! drives them from a cancellable background task.
//!
//! Grounded on the scheduler crate's interval-task pattern: a
//! [`tokio_util::sync::CancellationToken`] gates a `tokio::select!` loop
//! between a tick and cancellation, rather than a raw `loop { sleep().await }`
//! with no clean shutdown path.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::AutoReloadSettings;
use crate::context::Context;
use crate::discovery::scan;
use crate::error::BrimleyError;
use crate::native_registry::NativeRegistry;
use crate::reload::{ReloadEngine, ReloadOutcome};
use crate::watcher::PollingWatcher;

/// Called after a reload cycle that swapped in cleanly or touched no domain.
pub type ReloadCallback = Arc<dyn Fn(&ReloadOutcome) + Send + Sync>;

/// Minimum tick interval regardless of configuration, matching the original
/// implementation's floor so a misconfigured `interval_ms: 0` cannot busy-loop.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Owns one project root's watcher + reload engine pairing and, once
/// [`Self::start_auto_reload`] is called, the background task driving them.
pub struct RuntimeController {
    context: Arc<Context>,
    root_dir: PathBuf,
    watcher: Mutex<PollingWatcher>,
    engine: ReloadEngine,
    interval: Duration,
    cancel: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl RuntimeController {
    pub fn new(
        context: Arc<Context>,
        root_dir: impl Into<PathBuf>,
        settings: &AutoReloadSettings,
        native_registry: NativeRegistry,
    ) -> Result<Self, BrimleyError> {
        let root_dir = root_dir.into();
        let watcher = PollingWatcher::new(root_dir.clone(), &settings.include_patterns, &settings.exclude_patterns, settings.debounce_ms)?;
        let interval = Duration::from_millis(settings.interval_ms).max(MIN_POLL_INTERVAL);
        Ok(RuntimeController {
            context,
            root_dir,
            watcher: Mutex::new(watcher),
            engine: ReloadEngine::new(native_registry),
            interval,
            cancel: CancellationToken::new(),
            handle: Mutex::new(None),
        })
    }

    /// Run the first scan-and-reload synchronously and start the watcher's
    /// snapshot baseline. Call this before [`Self::start_auto_reload`] — the
    /// very first scan result is always attempted for a swap, blocked or not.
    pub fn load_initial(&self) -> ReloadOutcome {
        let scan_result = scan(&self.root_dir);
        let outcome = self.engine.apply(&self.context, &self.root_dir, &scan_result);
        self.watcher.lock().expect("watcher lock poisoned").start();
        outcome
    }

    /// The unit primitive: advance the watcher one tick and, if it decided
    /// this tick's accumulated changes should trigger a reload, run one
    /// reload cycle. Returns `None` when nothing reloaded this tick.
    pub fn poll_once(&self, now: Instant) -> Option<ReloadOutcome> {
        let poll_outcome = self.watcher.lock().expect("watcher lock poisoned").poll(now);
        if !poll_outcome.should_reload {
            return None;
        }

        let scan_result = scan(&self.root_dir);
        let outcome = self.engine.apply(&self.context, &self.root_dir, &scan_result);
        self.watcher.lock().expect("watcher lock poisoned").complete_reload();
        Some(outcome)
    }

    /// Spawn the polling loop on a background task. `self` must already be
    /// wrapped in an `Arc` since the spawned task outlives this call.
    /// `on_reload` fires for a cycle that published at least one domain
    /// (even if others were blocked); `on_blocked` fires when every touched
    /// domain was blocked this cycle.
    pub fn start_auto_reload(self: &Arc<Self>, on_reload: Option<ReloadCallback>, on_blocked: Option<ReloadCallback>) {
        let this = Arc::clone(self);
        let cancel = self.cancel.clone();
        let interval = self.interval;

        let task = tokio::spawn(async move {
            tracing::info!(root = %this.root_dir.display(), "auto-reload watcher started");
            let mut tick = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = tick.tick() => {
                        if let Some(outcome) = this.poll_once(Instant::now()) {
                            if outcome.blocked_domains.is_empty() {
                                tracing::info!(entities = outcome.summary.entities, functions = outcome.summary.functions, tools = outcome.summary.tools, "reload cycle applied");
                                if let Some(cb) = &on_reload {
                                    cb(&outcome);
                                }
                            } else {
                                tracing::warn!(blocked = ?outcome.blocked_domains, "reload cycle blocked one or more domains");
                                if let Some(cb) = &on_blocked {
                                    cb(&outcome);
                                }
                            }
                        }
                    }
                    _ = cancel.cancelled() => {
                        break;
                    }
                }
            }
            tracing::info!("auto-reload watcher stopped");
        });

        *self.handle.lock().expect("handle lock poisoned") = Some(task);
    }

    /// Signal the background task to stop, join it, and stop the watcher.
    /// Safe to call even if [`Self::start_auto_reload`] was never called.
    pub async fn stop_auto_reload(&self) {
        self.cancel.cancel();
        let handle = self.handle.lock().expect("handle lock poisoned").take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        self.watcher.lock().expect("watcher lock poisoned").stop();
    }

    pub fn context(&self) -> &Arc<Context> {
        &self.context
    }

    pub fn root_dir(&self) -> &PathBuf {
        &self.root_dir
    }
}

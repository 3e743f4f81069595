//! Call dispatcher: bounds how many calls run or wait at once, honors
//! per-call timeouts, and bypasses the pool entirely for the native/external-
//! host fastpath.
//!
//! The "single thread-pool of size `execution.thread_pool_size`" in the
//! original implementation becomes, in an async runtime, a bounded-concurrency
//! gate rather than literal OS threads: a [`tokio::sync::Semaphore`] of
//! `thread_pool_size` permits caps how many runner futures are polled at once,
//! nested inside a second semaphore of `thread_pool_size + queue.max_size`
//! permits that caps how many calls may be admitted (running *or* queued) at
//! all. A call that cannot get the outer permit is queue-full; a call that
//! holds the outer permit but is still waiting on the inner one is "queued".

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::Semaphore;

use crate::config::{ExecutionSettings, OnFullPolicy};
use crate::context::Context;
use crate::error::BrimleyError;
use crate::model::{FunctionKind, FunctionRecord};
use crate::native_registry::NativeRegistry;
use crate::runners;

type Signature = (usize, usize, OnFullPolicy);

struct PoolState {
    slots: Arc<Semaphore>,
    workers: Arc<Semaphore>,
}

/// Values the caller injects at the call boundary (fastpath selection and
/// external-host downcast target).
#[derive(Clone, Default)]
pub struct RuntimeInjections {
    pub external_host_context: Option<Arc<dyn Any + Send + Sync>>,
}

/// Bounded-concurrency, timeout-enforcing call dispatcher.
pub struct Dispatcher {
    native_registry: NativeRegistry,
    state: Mutex<Option<(Signature, Arc<PoolState>)>>,
}

impl Dispatcher {
    pub fn new(native_registry: NativeRegistry) -> Self {
        Dispatcher { native_registry, state: Mutex::new(None) }
    }

    /// Dispatch one call. Resolved `args` must already have passed the
    /// argument resolver; the raw runner output still passes through
    /// the result mapper inside [`runners::run_call`].
    pub async fn dispatch(
        &self,
        func: &FunctionRecord,
        args: HashMap<String, Value>,
        context: Arc<Context>,
        injections: RuntimeInjections,
    ) -> Result<Value, BrimleyError> {
        let is_native = matches!(func.kind, FunctionKind::Native { .. });

        // Fastpath: a native call arriving with an external-host
        // context runs inline, bypassing the pool entirely.
        if is_native && injections.external_host_context.is_some() {
            return runners::run_call(func, args, context, &self.native_registry, injections.external_host_context).await;
        }

        let exec = context.config.execution.clone();
        let timeout = effective_timeout(func, &exec);
        let pool = self.pool_for(&exec);

        let started = Instant::now();
        let slot_permit = match exec.queue.on_full {
            OnFullPolicy::Block => {
                let slots = pool.slots.clone();
                tokio::time::timeout(timeout, slots.acquire_owned())
                    .await
                    .map_err(|_| timeout_error(func, timeout))?
                    .expect("slot semaphore is never closed")
            }
            OnFullPolicy::Reject => pool
                .slots
                .clone()
                .try_acquire_owned()
                .map_err(|_| BrimleyError::QueueFull { function: func.name().to_string() })?,
        };

        let remaining = timeout.saturating_sub(started.elapsed());
        let native_registry = self.native_registry.clone();
        let func_owned = func.clone();
        let ctx = context.clone();
        let host = injections.external_host_context.clone();
        let workers = pool.workers.clone();

        let join_result = tokio::time::timeout(
            remaining,
            tokio::spawn(async move {
                let _worker_permit = workers.acquire_owned().await.expect("worker semaphore is never closed");
                runners::run_call(&func_owned, args, ctx, &native_registry, host).await
            }),
        )
        .await;

        // The slot is released as soon as we stop waiting on it, before the
        // caller observes any outcome including a timeout.
        drop(slot_permit);

        match join_result {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(BrimleyError::Runner { function: func.name().to_string(), source: Box::new(join_err) }),
            Err(_elapsed) => Err(timeout_error(func, timeout)),
        }
    }

    fn pool_for(&self, exec: &ExecutionSettings) -> Arc<PoolState> {
        let signature: Signature = (exec.thread_pool_size, exec.queue.max_size, exec.queue.on_full);
        let mut guard = self.state.lock().expect("dispatcher state mutex poisoned");
        if let Some((existing_signature, existing_state)) = guard.as_ref() {
            if *existing_signature == signature {
                return existing_state.clone();
            }
        }
        let fresh = Arc::new(PoolState {
            slots: Arc::new(Semaphore::new(exec.thread_pool_size + exec.queue.max_size)),
            workers: Arc::new(Semaphore::new(exec.thread_pool_size.max(1))),
        });
        *guard = Some((signature, fresh.clone()));
        fresh
    }
}

fn effective_timeout(func: &FunctionRecord, exec: &ExecutionSettings) -> Duration {
    Duration::from_secs(func.common.timeout_seconds.unwrap_or(exec.timeout_seconds))
}

fn timeout_error(func: &FunctionRecord, timeout: Duration) -> BrimleyError {
    BrimleyError::Timeout { function: func.name().to_string(), elapsed_ms: timeout.as_millis() as u64 }
}

//! Process-wide render runtime
//!
//! The render pool is shared by every viewer in the process. It is set up
//! once with [`init`] and torn down with [`shutdown`]. Until it is
//! initialized, [`join`] runs on rayon's global pool.

use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::{Arc, Mutex, MutexGuard};

static RUNTIME: Mutex<Option<Arc<ThreadPool>>> = Mutex::new(None);

/// Options for the shared render pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeOptions {
    /// Worker threads dedicated to page rendering
    pub render_threads: usize,
}

impl Default for RuntimeOptions {
    /// Two threads: one per page slot of a spread
    fn default() -> Self {
        Self { render_threads: 2 }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("render_threads must be at least 1")]
    NoThreads,
    #[error("failed to build render pool: {0}")]
    Build(#[from] rayon::ThreadPoolBuildError),
}

fn lock() -> MutexGuard<'static, Option<Arc<ThreadPool>>> {
    RUNTIME.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Initialize the shared render pool
///
/// Returns `Ok(true)` when this call created the pool and `Ok(false)` when
/// it was already running; options of later calls are ignored.
pub fn init(options: RuntimeOptions) -> Result<bool, RuntimeError> {
    if options.render_threads == 0 {
        return Err(RuntimeError::NoThreads);
    }

    let mut runtime = lock();
    if runtime.is_some() {
        return Ok(false);
    }

    let pool = ThreadPoolBuilder::new()
        .num_threads(options.render_threads)
        .thread_name(|index| format!("flipbook-render-{index}"))
        .build()?;

    tracing::debug!(threads = options.render_threads, "render runtime initialized");
    *runtime = Some(Arc::new(pool));
    Ok(true)
}

/// Tear down the shared render pool
///
/// Work already running on the pool finishes; the threads exit once the last
/// in-flight [`join`] releases the pool. Returns `true` if a pool existed.
pub fn shutdown() -> bool {
    let previous = lock().take();
    if previous.is_some() {
        tracing::debug!("render runtime shut down");
    }
    previous.is_some()
}

pub fn is_initialized() -> bool {
    lock().is_some()
}

/// Number of threads in the shared pool, if initialized
pub fn render_threads() -> Option<usize> {
    lock().as_ref().map(|pool| pool.current_num_threads())
}

/// Run two closures concurrently and wait for both
pub fn join<A, B, RA, RB>(a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA + Send,
    B: FnOnce() -> RB + Send,
    RA: Send,
    RB: Send,
{
    let pool = lock().clone();
    match pool {
        Some(pool) => pool.join(a, b),
        None => rayon::join(a, b),
    }
}

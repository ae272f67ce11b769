//! Shared Tokio runtime for blocking callers
//!
//! The drivers are async, while a scheduler invokes the monitor synchronously.
//! This runtime lets a plain thread drive one invocation to completion.

use std::sync::OnceLock;
use tokio::runtime::Runtime;

static TOKIO_RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// Get or create the shared Tokio runtime.
///
/// The runtime is current-thread: an invocation runs on the thread that
/// blocks on it and nowhere else.
///
/// # Panics
///
/// Panics if the runtime cannot be created.
fn get_tokio_runtime() -> &'static Runtime {
    TOKIO_RUNTIME.get_or_init(|| {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .thread_name("sqlmon-runtime")
            .build()
            .expect("Failed to create Tokio runtime for database drivers")
    })
}

/// Run a future to completion on the shared runtime, blocking the caller.
///
/// Must not be called from within an async context.
///
/// # Example
///
/// ```ignore
/// let output = block_on_tokio(monitor.execute(&params, &mut sink));
/// ```
pub fn block_on_tokio<F, T>(future: F) -> T
where
    F: std::future::Future<Output = T>,
{
    get_tokio_runtime().block_on(future)
}

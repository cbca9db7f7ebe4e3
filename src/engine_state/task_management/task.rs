//! # Task System Core Trait
//!
//! This module defines the unit of work executed by the
//! [`TaskManager`](super::TaskManager).
//!
//! ## Task Lifecycle
//! 1. A `Task` is created and scheduled via `TaskManager::publish_task()`
//! 2. The task's `process()` method is called on a worker thread
//! 3. The task returns its `Output`
//! 4. The output is collected on the main thread by `TaskManager::drain_completed()`
//!
//! ## Thread Safety
//! - `Task` must be `Send` to be transferred to a worker
//! - `Output` must be `Send` to be transferred back to the main thread
//! - Tasks own everything they touch; shared state goes through `MtResource`

/// A unit of work that can be executed on a worker thread.
///
/// Tasks should be self-contained and own all the data they need. The
/// `Output` is handed back to the main thread untouched, so anything that
/// must mutate main-thread state belongs in the code that consumes it.
///
/// # Implementation Guidelines
/// - Should be relatively coarse-grained to amortize scheduling overhead
/// - Must not panic across the worker boundary; catch and report instead
pub trait Task: Send + 'static {
    /// The value sent back to the main thread.
    type Output: Send + 'static;

    /// Performs the work. Runs on a worker thread, or inline when the
    /// manager has no workers.
    fn process(self: Box<Self>) -> Self::Output;
}

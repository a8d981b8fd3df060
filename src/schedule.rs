//! Deferred-task scheduling.
//!
//! Settlement never invokes user callbacks on the stack that triggered it;
//! instead each callback is handed to this module as a deferred task and runs
//! on a later turn. Every thread owns its own queue, mirroring the
//! per-thread execution model: tasks deferred on a thread run on that thread,
//! in FIFO order, when that thread pumps the queue.
//!
//! There is no ambient event loop in-process, so the queue is pumped
//! explicitly: [run] drains it to empty, while [tick] releases a bounded
//! batch and reports whether work remains, which lets an embedder with its
//! own loop share turns fairly.
//!
//! # Example
//!
//! ```
//! use settle::schedule;
//!
//! schedule::defer(Box::new(|| println!("later")));
//! println!("now");
//! schedule::run();
//! ```
use std::{cell::RefCell, collections::VecDeque};

/// A zero-argument unit of deferred work.
pub type Task = Box<dyn FnOnce()>;

/// Maximum number of tasks released by a single [tick].
const TICK_BUDGET: usize = 16;

thread_local! {
    static QUEUE: RefCell<VecDeque<Task>> = const { RefCell::new(VecDeque::new()) };
}

/// Enqueue `task` to run on a later turn of this thread's queue.
///
/// Tasks run in the order they were deferred. Calling this from within a
/// running task is fine; the new task lands at the back of the queue.
pub fn defer(task: Task) {
    QUEUE.with(|q| q.borrow_mut().push_back(task));
}

/// Release up to [TICK_BUDGET] tasks from this thread's queue.
///
/// Returns `true` if tasks remain queued afterwards. Each task is removed
/// from the queue before it runs, and runs outside any internal borrow, so
/// tasks may freely [defer] more work.
pub fn tick() -> bool {
    for _ in 0..TICK_BUDGET {
        let Some(task) = QUEUE.with(|q| q.borrow_mut().pop_front()) else {
            return false;
        };

        task();
    }

    QUEUE.with(|q| !q.borrow().is_empty())
}

/// Pump this thread's queue until it is empty.
///
/// Work deferred by running tasks is drained too; the call returns only once
/// no task remains.
pub fn run() {
    while tick() {}
}

/// The number of tasks currently queued on this thread.
pub fn pending() -> usize {
    QUEUE.with(|q| q.borrow().len())
}

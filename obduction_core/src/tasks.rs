// Copyright 2026 the Obduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Exactly-once deferred task tracking.
//!
//! View-tree mutations are never performed synchronously inside a platform
//! callback; they are queued here and executed on the next animation-frame
//! pump. The platform's own frame callback stops firing once a view leaves
//! its window, but queued work may still hold resources that must be
//! released, so the tracker supports a forced synchronous drain on teardown:
//! every scheduled task runs exactly once, on a pump or during the drain,
//! never both and never zero times.
//!
//! [`TaskTracker`] is deliberately generic; the host instantiates it with
//! its own tagged task enum, which keeps the teardown drain a plain loop
//! over data instead of a chain of captured closures.

use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::fmt;

/// Identifies one scheduled task for [`TaskTracker::cancel`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskHandle(u64);

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaskHandle({})", self.0)
    }
}

struct Entry<T> {
    handle: TaskHandle,
    task: T,
}

/// FIFO of one-shot tasks awaiting the next animation frame.
///
/// [`take_due`](Self::take_due) hands back everything scheduled *before* the
/// call, so a task scheduled while a batch is being executed lands in the
/// following batch, the same ordering the platform's post-to-next-frame
/// primitive gives. A teardown drain is a loop calling `take_due` until it
/// returns empty, which also runs tasks scheduled by flushed tasks, in
/// submission order.
pub struct TaskTracker<T> {
    queue: VecDeque<Entry<T>>,
    next_handle: u64,
}

impl<T> TaskTracker<T> {
    /// Creates an empty tracker.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            next_handle: 0,
        }
    }

    /// Queues `task` for the next batch and returns its cancellation handle.
    pub fn schedule(&mut self, task: T) -> TaskHandle {
        let handle = TaskHandle(self.next_handle);
        self.next_handle += 1;
        self.queue.push_back(Entry { handle, task });
        handle
    }

    /// Cancels a scheduled task. Returns `true` if the task was still
    /// queued; canceling a task that already ran (or was already canceled)
    /// is a no-op.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        match self.queue.iter().position(|e| e.handle == handle) {
            Some(idx) => {
                self.queue.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Removes and returns every task scheduled before this call, oldest
    /// first. Tasks scheduled while the returned batch executes go to the
    /// next batch.
    #[must_use]
    pub fn take_due(&mut self) -> Vec<T> {
        self.queue.drain(..).map(|e| e.task).collect()
    }

    /// Number of tasks currently queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether no tasks are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl<T> Default for TaskTracker<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for TaskTracker<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskTracker")
            .field("queued", &self.queue.len())
            .field("next_handle", &self.next_handle)
            .finish()
    }
}

//! Deferred task scheduler
//!
//! The dialogue engine has exactly one suspension point: an end node that
//! closes itself after a delay. The engine owns a `Scheduler` whose clock only
//! moves when the host calls [`Scheduler::advance`].
//!
//! Tasks live in a reversed binary heap keyed by `(due, handle)`, so tasks due
//! at the same instant fire in the order they were scheduled. Cancelling a
//! task removes it from the task table and leaves a stale heap entry behind;
//! stale entries are skipped on pop and purged once they pile up.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::Duration;

use log::{debug, info};

#[cfg(test)]
const STALE_THRESHOLD: usize = 4;
#[cfg(not(test))]
const STALE_THRESHOLD: usize = 64;

/// Identifies a scheduled task so it can be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

/// A task waiting for its due time.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledTask<T> {
    pub due: Duration,
    pub task: T,
    /// Description of the task, for logging.
    pub note: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    now: Duration,
    heap: BinaryHeap<Reverse<(Duration, u64)>>,
    tasks: HashMap<u64, ScheduledTask<T>>,
    next_id: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            heap: BinaryHeap::new(),
            tasks: HashMap::new(),
            next_id: 0,
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of live (uncancelled, unfired) tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Schedule `task` to come due `delay` after the current time.
    pub fn schedule_in(&mut self, delay: Duration, task: T, note: Option<String>) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        let due = self.now.saturating_add(delay);
        info!(
            "scheduling task (now/due = {:?}/{:?}): \"{}\"",
            self.now,
            due,
            note.as_deref().unwrap_or("<no note provided>")
        );
        self.heap.push(Reverse((due, id)));
        self.tasks.insert(id, ScheduledTask { due, task, note });
        TimerHandle(id)
    }

    /// Cancel a pending task. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let Some(task) = self.tasks.remove(&handle.0) else {
            return false;
        };
        debug!(
            "cancelled task \"{}\"",
            task.note.as_deref().unwrap_or("<no note provided>")
        );
        self.purge_if_needed();
        true
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.tasks.contains_key(&handle.0)
    }

    /// Move the clock forward.
    pub fn advance(&mut self, elapsed: Duration) {
        self.now = self.now.saturating_add(elapsed);
    }

    /// Pop the next task whose due time has been reached, if any.
    pub fn pop_due(&mut self) -> Option<(TimerHandle, ScheduledTask<T>)> {
        while let Some(Reverse((due, id))) = self.heap.peek().copied() {
            if !self.tasks.contains_key(&id) {
                // cancelled; drop the stale entry
                self.heap.pop();
                continue;
            }
            if due > self.now {
                return None;
            }
            self.heap.pop();
            return self.tasks.remove(&id).map(|task| (TimerHandle(id), task));
        }
        None
    }

    fn purge_if_needed(&mut self) {
        let stale = self.heap.len().saturating_sub(self.tasks.len());
        if stale > STALE_THRESHOLD {
            let tasks = &self.tasks;
            self.heap.retain(|Reverse((_, id))| tasks.contains_key(id));
        }
    }
}

//! One-shot timer seam.
//!
//! Every delayed action in the crate (glitch cadence, channel label auto-hide,
//! debounced resize, scroll settle) goes through [`Timers`] so that the owner
//! holds an explicit [`TaskHandle`] it can cancel. In the browser the
//! implementation is backed by `setTimeout`; [`ManualTimers`] is a
//! deterministic queue advanced by hand.

use std::cell::RefCell;
use std::rc::Rc;

/// Identifies a scheduled task until it fires or is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(pub(crate) u64);

pub type Task = Box<dyn FnOnce()>;

pub trait Timers {
    /// Runs `task` once after `delay_ms` milliseconds.
    fn schedule(&self, delay_ms: u32, task: Task) -> TaskHandle;

    /// Drops a task that has not fired yet. Cancelling a fired or unknown
    /// handle is a no-op.
    fn cancel(&self, handle: TaskHandle);
}

/// Cancels `slot`'s task (if any) and leaves the slot empty.
pub fn cancel_slot(timers: &dyn Timers, slot: &mut Option<TaskHandle>) {
    if let Some(handle) = slot.take() {
        timers.cancel(handle);
    }
}

struct Entry {
    id: u64,
    due: u64,
    task: Task,
}

#[derive(Default)]
struct Queue {
    now: u64,
    next_id: u64,
    entries: Vec<Entry>,
}

/// Timer queue driven by [`ManualTimers::advance`].
///
/// Tasks fire in due-time order (ties in scheduling order). A task may
/// schedule or cancel other tasks while running; those are honoured within
/// the same `advance` call if they fall inside the window.
#[derive(Clone, Default)]
pub struct ManualTimers {
    queue: Rc<RefCell<Queue>>,
}

impl ManualTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Milliseconds elapsed since construction.
    pub fn now(&self) -> u64 {
        self.queue.borrow().now
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().entries.len()
    }

    /// Due time of the earliest pending task, relative to now.
    pub fn next_due_in(&self) -> Option<u64> {
        let queue = self.queue.borrow();
        queue
            .entries
            .iter()
            .map(|e| e.due - queue.now)
            .min()
    }

    pub fn advance(&self, ms: u64) {
        let target = self.queue.borrow().now + ms;
        loop {
            let next = {
                let mut queue = self.queue.borrow_mut();
                let idx = queue
                    .entries
                    .iter()
                    .enumerate()
                    .filter(|(_, e)| e.due <= target)
                    .min_by_key(|(_, e)| (e.due, e.id))
                    .map(|(i, _)| i);
                idx.map(|i| {
                    let entry = queue.entries.remove(i);
                    queue.now = entry.due;
                    entry.task
                })
            };
            match next {
                Some(task) => task(),
                None => break,
            }
        }
        self.queue.borrow_mut().now = target;
    }
}

impl Timers for ManualTimers {
    fn schedule(&self, delay_ms: u32, task: Task) -> TaskHandle {
        let mut queue = self.queue.borrow_mut();
        let id = queue.next_id;
        queue.next_id += 1;
        let due = queue.now + u64::from(delay_ms);
        queue.entries.push(Entry { id, due, task });
        TaskHandle(id)
    }

    fn cancel(&self, handle: TaskHandle) {
        self.queue.borrow_mut().entries.retain(|e| e.id != handle.0);
    }
}

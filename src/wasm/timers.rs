use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::Window;

use crate::timer::{Task, TaskHandle, Timers};

/// A scheduled timeout. The callback is owned here so cancelling releases it.
struct Pending {
    timeout: i32,
    task: Task,
    _callback: Closure<dyn FnMut()>,
}

/// `setTimeout`-backed [`Timers`].
pub struct WindowTimers {
    window: Window,
    next_id: Cell<u64>,
    tasks: Rc<RefCell<HashMap<u64, Pending>>>,
}

impl WindowTimers {
    pub fn new(window: Window) -> Self {
        Self {
            window,
            next_id: Cell::new(0),
            tasks: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// Timeouts scheduled and neither fired nor cancelled.
    pub fn pending(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Clears every outstanding timeout.
    pub fn cancel_all(&self) {
        let drained: Vec<_> = self.tasks.borrow_mut().drain().collect();
        for (_, pending) in drained {
            self.window.clear_timeout_with_handle(pending.timeout);
        }
    }
}

impl Timers for WindowTimers {
    fn schedule(&self, delay_ms: u32, task: Task) -> TaskHandle {
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let tasks = Rc::downgrade(&self.tasks);
        let callback = Closure::wrap(Box::new(move || {
            let Some(tasks) = tasks.upgrade() else {
                return;
            };
            // Release the map before running: the task may schedule more work.
            let entry = tasks.borrow_mut().remove(&id);
            if let Some(pending) = entry {
                // wasm-bindgen defers freeing a closure dropped mid-call.
                let Pending { task, _callback, .. } = pending;
                task();
            }
        }) as Box<dyn FnMut()>);

        let delay = i32::try_from(delay_ms).unwrap_or(i32::MAX);
        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref(),
                delay,
            ) {
            Ok(timeout) => {
                self.tasks.borrow_mut().insert(
                    id,
                    Pending {
                        timeout,
                        task,
                        _callback: callback,
                    },
                );
            }
            Err(e) => log::error!("setTimeout failed: {e:?}"),
        }
        TaskHandle(id)
    }

    fn cancel(&self, handle: TaskHandle) {
        let entry = self.tasks.borrow_mut().remove(&handle.0);
        if let Some(pending) = entry {
            self.window.clear_timeout_with_handle(pending.timeout);
        }
    }
}

impl Drop for WindowTimers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

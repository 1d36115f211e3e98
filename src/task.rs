//! Completion tasks for asynchronous lifecycle steps.
//!
//! The only asynchronous step in the whole runtime is detach: a component's
//! `detaching` hook may hand back a pending [`LifecycleTask`] (an exit
//! animation the host drives to completion). Whoever initiated the detach
//! chains follow-up work on the task; unbind is ordered strictly after it
//! completes. Tasks are single-threaded: completion runs callbacks on the
//! completer's stack.

use std::cell::RefCell;
use std::rc::Rc;

type Callback = Box<dyn FnOnce(bool)>;

struct TaskState {
    done: bool,
    succeeded: bool,
    callbacks: Vec<Callback>,
}

/// A completion handle for one asynchronous step.
///
/// Cloning shares the same underlying state.
#[derive(Clone)]
pub struct LifecycleTask {
    state: Rc<RefCell<TaskState>>,
}

/// The completer side of a pending task, held by whoever finishes the work.
pub struct TaskController {
    state: Rc<RefCell<TaskState>>,
}

impl LifecycleTask {
    /// An already-completed, successful task.
    pub fn done() -> Self {
        Self {
            state: Rc::new(RefCell::new(TaskState {
                done: true,
                succeeded: true,
                callbacks: Vec::new(),
            })),
        }
    }

    /// A pending task plus the controller that completes it.
    pub fn pending() -> (Self, TaskController) {
        let state = Rc::new(RefCell::new(TaskState {
            done: false,
            succeeded: false,
            callbacks: Vec::new(),
        }));
        (
            Self {
                state: Rc::clone(&state),
            },
            TaskController { state },
        )
    }

    pub fn is_done(&self) -> bool {
        self.state.borrow().done
    }

    /// `false` until the task completes, or when it failed.
    pub fn succeeded(&self) -> bool {
        let state = self.state.borrow();
        state.done && state.succeeded
    }

    /// Chain work onto completion. Runs immediately when the task is
    /// already done; the argument reports success.
    pub fn on_complete(&self, callback: impl FnOnce(bool) + 'static) {
        let mut state = self.state.borrow_mut();
        if state.done {
            let succeeded = state.succeeded;
            drop(state);
            callback(succeeded);
        } else {
            state.callbacks.push(Box::new(callback));
        }
    }

    /// A task that completes when every input has, succeeding only if all
    /// of them did. Already-done inputs are folded in immediately.
    pub fn all(tasks: Vec<LifecycleTask>) -> LifecycleTask {
        let pending: Vec<&LifecycleTask> = tasks.iter().filter(|t| !t.is_done()).collect();
        if pending.is_empty() {
            if tasks.iter().all(|t| t.succeeded()) {
                return LifecycleTask::done();
            }
            let (task, controller) = LifecycleTask::pending();
            controller.fail();
            return task;
        }

        let (task, controller) = LifecycleTask::pending();
        let remaining = Rc::new(RefCell::new((
            pending.len(),
            tasks.iter().all(|t| !t.is_done() || t.succeeded()),
            Some(controller),
        )));
        for input in tasks.iter().filter(|t| !t.is_done()) {
            let remaining = Rc::clone(&remaining);
            input.on_complete(move |succeeded| {
                let mut slot = remaining.borrow_mut();
                slot.0 -= 1;
                slot.1 &= succeeded;
                if slot.0 == 0 {
                    if let Some(controller) = slot.2.take() {
                        let all_succeeded = slot.1;
                        drop(slot);
                        if all_succeeded {
                            controller.complete();
                        } else {
                            controller.fail();
                        }
                    }
                }
            });
        }
        task
    }
}

impl TaskController {
    pub fn complete(self) {
        self.finish(true);
    }

    pub fn fail(self) {
        self.finish(false);
    }

    fn finish(self, succeeded: bool) {
        let callbacks = {
            let mut state = self.state.borrow_mut();
            if state.done {
                return;
            }
            state.done = true;
            state.succeeded = succeeded;
            std::mem::take(&mut state.callbacks)
        };
        for callback in callbacks {
            callback(succeeded);
        }
    }
}

impl Drop for TaskController {
    fn drop(&mut self) {
        // A dropped controller fails its task instead of stalling forever
        let callbacks = {
            let mut state = self.state.borrow_mut();
            if state.done {
                return;
            }
            state.done = true;
            state.succeeded = false;
            std::mem::take(&mut state.callbacks)
        };
        for callback in callbacks {
            callback(false);
        }
    }
}

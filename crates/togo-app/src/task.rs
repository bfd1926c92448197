//! The task manager (spec §5 "Task manager"): an external, thread-safe
//! collaborator out of scope to implement here. `togo-app` only defines the
//! minimal trait the frame loop needs: hand it work, get back an id, wait
//! on the id later.

pub type TaskId = u64;

pub trait TaskManager {
    /// Schedules `work` and returns an id the caller later passes to
    /// `wait`. A concrete implementation may run this on a worker thread;
    /// nothing here assumes when it runs relative to `spawn` returning.
    fn spawn(&mut self, work: Box<dyn FnOnce() + Send + 'static>) -> TaskId;

    /// Blocks until the task identified by `task` has completed.
    fn wait(&mut self, task: TaskId);
}

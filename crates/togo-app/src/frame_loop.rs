//! `FrameLoop`: the four-step sequence of spec §4.9 "Frame loop", driven
//! once per frame by whatever owns the window and task manager.
//!
//! The renderer itself has no suspension points (spec §5): `end_frame`
//! drains every node synchronously. The task id `begin_frame` returns
//! exists to let the caller's threading model treat a frame as a single
//! unit of asynchronous work, matching "the frame loop uses one task to
//! encapsulate the render submission" even though this implementation
//! performs the submission inline.

use togo_render::{RenderBackend, Renderer};

use crate::task::{TaskId, TaskManager};
use crate::window::WindowSink;

pub struct FrameLoop {
    renderer: Renderer,
    active_task: Option<TaskId>,
}

impl FrameLoop {
    #[must_use]
    pub fn new(renderer: Renderer) -> Self {
        Self { renderer, active_task: None }
    }

    #[must_use]
    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderer
    }

    /// Step 1: unbinds GL from the caller, spawns the task the caller will
    /// wait on in step 4, and remembers it for `end_frame`.
    ///
    /// # Panics
    /// Panics if called again before `end_frame` closes the previous frame.
    pub fn begin_frame(&mut self, task_mgr: &mut dyn TaskManager, window: &mut dyn WindowSink) -> TaskId {
        assert!(self.active_task.is_none(), "FrameLoop::begin_frame called before the previous frame ended");
        window.unbind_gl();
        let task = task_mgr.spawn(Box::new(|| {}));
        tracing::debug!(task, "frame submission task spawned");
        self.active_task = Some(task);
        task
    }

    /// Step 2: pushes one viewport's world-render command onto the node
    /// assigned to it.
    pub fn push_work(&mut self, node_index: usize, user_key: u16, world: u64, camera: u64, viewport: u32) {
        self.renderer.push_render_world(node_index, user_key, world, camera, viewport);
    }

    /// Step 3: radix-merges and drains every node through `backend`.
    ///
    /// # Panics
    /// Panics if called without a preceding `begin_frame`.
    pub fn end_frame(&mut self, backend: &mut dyn RenderBackend) {
        assert!(self.active_task.is_some(), "FrameLoop::end_frame called without a matching begin_frame");
        self.renderer.execute_frame(backend);
        self.active_task = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use togo_render::backend::RecordingBackend;

    struct FakeTaskManager {
        next_id: TaskId,
        completed: Vec<TaskId>,
    }

    impl FakeTaskManager {
        fn new() -> Self {
            Self { next_id: 1, completed: Vec::new() }
        }
    }

    impl TaskManager for FakeTaskManager {
        fn spawn(&mut self, work: Box<dyn FnOnce() + Send + 'static>) -> TaskId {
            work();
            let id = self.next_id;
            self.next_id += 1;
            id
        }

        fn wait(&mut self, task: TaskId) {
            self.completed.push(task);
        }
    }

    struct FakeWindow {
        unbound: bool,
    }

    impl WindowSink for FakeWindow {
        fn unbind_gl(&mut self) {
            self.unbound = true;
        }
    }

    #[test]
    fn runs_the_four_step_sequence() {
        let mut loop_ = FrameLoop::new(Renderer::new());
        loop_.renderer_mut().add_node(0);

        let mut task_mgr = FakeTaskManager::new();
        let mut window = FakeWindow { unbound: false };

        let task = loop_.begin_frame(&mut task_mgr, &mut window);
        assert!(window.unbound);

        loop_.push_work(0, 0, 1, 2, 3);

        let mut backend = RecordingBackend::default();
        loop_.end_frame(&mut backend);
        assert_eq!(backend.calls, vec!["render_world(1, 2, 3)".to_string()]);

        task_mgr.wait(task);
        assert_eq!(task_mgr.completed, vec![task]);
    }

    #[test]
    #[should_panic(expected = "without a matching begin_frame")]
    fn end_frame_without_begin_frame_panics() {
        let mut loop_ = FrameLoop::new(Renderer::new());
        let mut backend = RecordingBackend::default();
        loop_.end_frame(&mut backend);
    }
}

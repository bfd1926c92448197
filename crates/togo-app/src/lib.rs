//! The app shell: the frame loop (spec §4.9) and the minimal external
//! collaborator traits it drives (spec §5 "Task manager", windowing).
//! Neither a task manager nor a window is implemented here — those remain
//! out-of-scope collaborators a concrete engine supplies.

pub mod frame_loop;
pub mod task;
pub mod window;

pub use frame_loop::FrameLoop;
pub use task::{TaskId, TaskManager};
pub use window::WindowSink;

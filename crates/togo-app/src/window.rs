//! Windowing/GL context creation is out of scope (Non-goal). `WindowSink`
//! is the one hook the frame loop needs from whatever owns the window: the
//! ability to unbind the GL context from the calling thread before handing
//! rendering off to the task manager.

pub trait WindowSink {
    fn unbind_gl(&mut self);
}

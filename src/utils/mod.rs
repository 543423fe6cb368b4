//! Utility modules shared by the renderer and the runtime.

pub mod html;
pub mod id;

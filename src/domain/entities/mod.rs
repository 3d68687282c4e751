//! Domain entity definitions.

mod resource;
mod task;

pub use resource::{ImageSource, ResourceId, SharedImage, TargetSize};
pub use task::LoadTask;

//! Port definitions (interfaces) for external dependencies.

mod display_target_port;
mod image_source_port;

pub use display_target_port::{DisplayTarget, ResolutionContext, SizeHint, resolve_required_size};
#[cfg(test)]
pub use image_source_port::MockImageSourcePort;
pub use image_source_port::{ByteStream, ImageSourcePort};

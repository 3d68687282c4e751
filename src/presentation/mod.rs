//! Presentation layer with display targets.

/// Recycled grid of image slots.
pub mod gallery;
/// Reusable widgets.
pub mod widgets;

pub use gallery::Gallery;
pub use widgets::ImageSlot;

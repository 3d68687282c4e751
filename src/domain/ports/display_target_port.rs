//! Port definition for on-screen display targets.

use crate::domain::entities::{ResourceId, SharedImage, TargetSize};

/// Optional per-axis size; `None` and `Some(0)` both mean unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeHint {
    /// Width in pixels, if known.
    pub width: Option<u32>,
    /// Height in pixels, if known.
    pub height: Option<u32>,
}

impl SizeHint {
    /// A hint with neither axis set.
    pub const UNSET: Self = Self {
        width: None,
        height: None,
    };

    /// Creates a hint with both axes set.
    #[must_use]
    pub const fn exact(width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
        }
    }
}

/// Display-wide facts a target can report about where it is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionContext {
    /// Full display width in pixels.
    pub screen_width: u32,
    /// Full display height in pixels.
    pub screen_height: u32,
    /// Platform maximum-size hint for the widget, if the adapter exposes one.
    pub max_size_hint: SizeHint,
}

impl ResolutionContext {
    /// Creates a context for a display of the given size with no max-size hint.
    #[must_use]
    pub const fn screen(width: u32, height: u32) -> Self {
        Self {
            screen_width: width,
            screen_height: height,
            max_size_hint: SizeHint::UNSET,
        }
    }
}

/// A renderable surface that can show one image at a time.
///
/// The pipeline tags the target with the identifier it currently expects and only
/// assigns a delivered image while that tag still matches. Implementations use interior
/// mutability; `assign_image` is only called from the thread that drains deliveries.
pub trait DisplayTarget: Send + Sync {
    /// Size the target currently occupies on screen.
    fn measured_size(&self) -> SizeHint {
        SizeHint::UNSET
    }

    /// Size declared by the layout.
    fn layout_size(&self) -> SizeHint {
        SizeHint::UNSET
    }

    /// Display facts used as the last fallbacks for size resolution.
    fn resolution_context(&self) -> ResolutionContext;

    /// Records which resource this target now expects.
    fn set_identity_tag(&self, id: &ResourceId);

    /// Returns the resource this target currently expects.
    fn identity_tag(&self) -> Option<ResourceId>;

    /// Shows the image.
    fn assign_image(&self, image: SharedImage);

    /// Size an image should be decoded to for this target.
    fn required_size(&self) -> TargetSize {
        resolve_required_size(
            self.measured_size(),
            self.layout_size(),
            self.resolution_context(),
        )
    }
}

/// Resolves each axis independently: measured, then layout, then the platform hint,
/// then the full display. The first positive value wins.
#[must_use]
pub fn resolve_required_size(
    measured: SizeHint,
    layout: SizeHint,
    context: ResolutionContext,
) -> TargetSize {
    let width = first_positive(&[
        measured.width,
        layout.width,
        context.max_size_hint.width,
        Some(context.screen_width),
    ]);
    let height = first_positive(&[
        measured.height,
        layout.height,
        context.max_size_hint.height,
        Some(context.screen_height),
    ]);
    TargetSize::new(width, height)
}

fn first_positive(candidates: &[Option<u32>]) -> u32 {
    candidates
        .iter()
        .flatten()
        .copied()
        .find(|value| *value > 0)
        .unwrap_or(1)
}

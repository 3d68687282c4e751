//! Recyclable image cell.

use parking_lot::Mutex;

use crate::domain::entities::{ResourceId, SharedImage};
use crate::domain::ports::{DisplayTarget, ResolutionContext, SizeHint};

#[derive(Debug, Default)]
struct SlotState {
    tag: Option<ResourceId>,
    image: Option<SharedImage>,
    measured: SizeHint,
}

/// A fixed-size cell that shows one image and is reused as the list scrolls.
/// `None` as the image means the placeholder is showing.
#[derive(Debug)]
pub struct ImageSlot {
    state: Mutex<SlotState>,
    layout: SizeHint,
    context: ResolutionContext,
}

impl ImageSlot {
    /// Creates an unmeasured slot with a layout size on a display.
    #[must_use]
    pub fn new(layout: SizeHint, context: ResolutionContext) -> Self {
        Self {
            state: Mutex::new(SlotState::default()),
            layout,
            context,
        }
    }

    /// Records the size the slot occupies once laid out.
    pub fn set_measured(&self, measured: SizeHint) {
        self.state.lock().measured = measured;
    }

    /// Switches back to the placeholder.
    pub fn show_placeholder(&self) {
        self.state.lock().image = None;
    }

    /// Returns the image currently shown, if any.
    #[must_use]
    pub fn image(&self) -> Option<SharedImage> {
        self.state.lock().image.clone()
    }

    /// Returns the resource the slot currently expects.
    #[must_use]
    pub fn tag(&self) -> Option<ResourceId> {
        self.state.lock().tag.clone()
    }
}

impl DisplayTarget for ImageSlot {
    fn measured_size(&self) -> SizeHint {
        self.state.lock().measured
    }

    fn layout_size(&self) -> SizeHint {
        self.layout
    }

    fn resolution_context(&self) -> ResolutionContext {
        self.context
    }

    fn set_identity_tag(&self, id: &ResourceId) {
        self.state.lock().tag = Some(id.clone());
    }

    fn identity_tag(&self) -> Option<ResourceId> {
        self.tag()
    }

    fn assign_image(&self, image: SharedImage) {
        self.state.lock().image = Some(image);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::entities::TargetSize;

    #[test]
    fn test_required_size_prefers_measured() {
        let slot = ImageSlot::new(SizeHint::exact(200, 150), ResolutionContext::screen(1920, 1080));
        assert_eq!(slot.required_size(), TargetSize::new(200, 150));

        slot.set_measured(SizeHint::exact(96, 72));
        assert_eq!(slot.required_size(), TargetSize::new(96, 72));
    }

    #[test]
    fn test_placeholder_clears_image_not_tag() {
        let slot = ImageSlot::new(SizeHint::UNSET, ResolutionContext::screen(640, 480));
        slot.set_identity_tag(&ResourceId::new("a"));
        slot.assign_image(Arc::new(image::DynamicImage::new_rgb8(2, 2)));
        assert!(slot.image().is_some());

        slot.show_placeholder();
        assert!(slot.image().is_none());
        assert_eq!(slot.tag(), Some(ResourceId::new("a")));
    }
}

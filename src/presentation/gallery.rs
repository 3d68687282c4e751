//! Grid of recycled slots bound to a list of images.

use std::sync::Arc;

use tracing::debug;

use crate::domain::entities::ResourceId;
use crate::domain::ports::{DisplayTarget, ResolutionContext, SizeHint};
use crate::infrastructure::image::{ImagePipeline, LoadOutcome};

use super::widgets::ImageSlot;

/// Binds list positions to a fixed pool of slots. Position `p` reuses slot
/// `p % slot_count`, so scrolling past the pool retargets slots that may still
/// have a load in flight.
#[derive(Debug)]
pub struct Gallery {
    urls: Vec<ResourceId>,
    slots: Vec<Arc<ImageSlot>>,
}

impl Gallery {
    /// Creates a gallery with `slot_count` slots (at least one) of the given size.
    #[must_use]
    pub fn new(
        urls: Vec<ResourceId>,
        slot_count: usize,
        cell: SizeHint,
        context: ResolutionContext,
    ) -> Self {
        let slots = (0..slot_count.max(1))
            .map(|_| Arc::new(ImageSlot::new(cell, context)))
            .collect();
        Self { urls, slots }
    }

    /// Number of list entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Returns true if there is nothing to show.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// The slot that displays `position`.
    #[must_use]
    pub fn slot_for(&self, position: usize) -> &Arc<ImageSlot> {
        &self.slots[position % self.slots.len()]
    }

    /// All slots.
    #[must_use]
    pub fn slots(&self) -> &[Arc<ImageSlot>] {
        &self.slots
    }

    /// Resource at `position`.
    #[must_use]
    pub fn url(&self, position: usize) -> Option<&ResourceId> {
        self.urls.get(position)
    }

    /// Shows `position`: resets its slot to the placeholder and requests the image.
    /// Returns `None` past the end of the list.
    pub fn bind(&self, pipeline: &ImagePipeline, position: usize) -> Option<LoadOutcome> {
        let id = self.urls.get(position)?;
        let slot = self.slot_for(position);
        slot.show_placeholder();

        let target: Arc<dyn DisplayTarget> = slot.clone();
        let outcome = pipeline.load(id, &target);
        debug!(position, id = %id, outcome = ?outcome, "Bound slot");
        Some(outcome)
    }

    /// Binds every position in order, as a full scroll from top to bottom would.
    pub fn bind_all(&self, pipeline: &ImagePipeline) -> Vec<LoadOutcome> {
        (0..self.urls.len())
            .filter_map(|position| self.bind(pipeline, position))
            .collect()
    }
}

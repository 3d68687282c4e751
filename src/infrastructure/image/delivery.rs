//! Result hand-off from workers to the thread that owns the display targets.
//!
//! Workers push a [`Delivery`] for every finished task; the owning thread drains the
//! receiver and applies each one. An image is only assigned if the target still expects
//! the same resource, so late results for recycled targets are dropped.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::domain::entities::{ImageSource, ResourceId, SharedImage};
use crate::domain::ports::DisplayTarget;

/// A finished load addressed to a target.
#[derive(Clone)]
pub struct Delivery {
    /// Resource the task loaded.
    pub id: ResourceId,
    /// Target that asked for it.
    pub target: Arc<dyn DisplayTarget>,
    /// Decoded image, `None` if every tier failed.
    pub image: Option<SharedImage>,
    /// Tier the image came from.
    pub source: Option<ImageSource>,
}

/// What applying a delivery did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The image was assigned to the target.
    Applied,
    /// The target has moved on to another resource.
    Stale,
    /// The load failed; the target is unchanged.
    Empty,
}

impl Delivery {
    /// Assigns the image if the target's identity tag still names this resource.
    pub fn apply(self) -> DeliveryOutcome {
        let Some(image) = self.image else {
            trace!(id = %self.id, "Nothing to deliver");
            return DeliveryOutcome::Empty;
        };
        if self.target.identity_tag().as_ref() != Some(&self.id) {
            debug!(id = %self.id, "Target was reused, dropping stale image");
            return DeliveryOutcome::Stale;
        }
        self.target.assign_image(image);
        DeliveryOutcome::Applied
    }
}

impl std::fmt::Debug for Delivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delivery")
            .field("id", &self.id)
            .field("loaded", &self.image.is_some())
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Worker side of the channel.
#[derive(Debug, Clone)]
pub struct DeliverySink {
    tx: mpsc::UnboundedSender<Delivery>,
}

impl DeliverySink {
    /// Posts a delivery. Never blocks.
    pub fn deliver(&self, delivery: Delivery) {
        if let Err(e) = self.tx.send(delivery) {
            debug!(id = %e.0.id, "Delivery receiver gone, discarding result");
        }
    }
}

/// Owning-thread side of the channel.
#[derive(Debug)]
pub struct DeliveryReceiver {
    rx: mpsc::UnboundedReceiver<Delivery>,
}

impl DeliveryReceiver {
    /// Waits for the next delivery. Returns `None` once every sink is gone.
    pub async fn recv(&mut self) -> Option<Delivery> {
        self.rx.recv().await
    }

    /// Takes a delivery if one is ready.
    pub fn try_recv(&mut self) -> Option<Delivery> {
        self.rx.try_recv().ok()
    }

    /// Waits for the next delivery and applies it.
    pub async fn apply_next(&mut self) -> Option<(ResourceId, DeliveryOutcome)> {
        let delivery = self.recv().await?;
        let id = delivery.id.clone();
        Some((id, delivery.apply()))
    }

    /// Applies every delivery that is ready without waiting. Returns how many were
    /// assigned.
    pub fn dispatch_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Some(delivery) = self.try_recv() {
            if delivery.apply() == DeliveryOutcome::Applied {
                applied += 1;
            }
        }
        applied
    }
}

/// Creates a connected sink and receiver.
#[must_use]
pub fn result_channel() -> (DeliverySink, DeliveryReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (DeliverySink { tx }, DeliveryReceiver { rx })
}

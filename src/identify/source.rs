//! Frame handoff between a camera callback and the identifier.

use crate::image::Frame;
use parking_lot::Mutex;
use std::sync::Arc;

/// Supplies the most recent frame, if one has arrived.
pub trait FrameSource {
    fn current_frame(&self) -> Option<Arc<Frame>>;
}

impl<T: FrameSource + ?Sized> FrameSource for &T {
    fn current_frame(&self) -> Option<Arc<Frame>> {
        (**self).current_frame()
    }
}

impl<T: FrameSource + ?Sized> FrameSource for Arc<T> {
    fn current_frame(&self) -> Option<Arc<Frame>> {
        (**self).current_frame()
    }
}

/// Single-slot mailbox holding the latest frame.
///
/// Publishing replaces the shared pointer; readers clone it, so a reader
/// keeps a consistent frame even if a newer one is published meanwhile.
#[derive(Debug, Default)]
pub struct FrameSlot {
    latest: Mutex<Option<Arc<Frame>>>,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `frame` as the latest, returning the one it replaced.
    pub fn publish(&self, frame: Frame) -> Option<Arc<Frame>> {
        self.publish_shared(Arc::new(frame))
    }

    /// Stores an already shared frame.
    pub fn publish_shared(&self, frame: Arc<Frame>) -> Option<Arc<Frame>> {
        self.latest.lock().replace(frame)
    }

    /// Empties the slot.
    pub fn clear(&self) -> Option<Arc<Frame>> {
        self.latest.lock().take()
    }

    pub fn is_empty(&self) -> bool {
        self.latest.lock().is_none()
    }
}

impl FrameSource for FrameSlot {
    fn current_frame(&self) -> Option<Arc<Frame>> {
        self.latest.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_survives_republish() {
        let slot = FrameSlot::new();
        assert!(slot.current_frame().is_none());

        slot.publish(Frame::filled(2, 2, [1, 2, 3]).unwrap());
        let snapshot = slot.current_frame().unwrap();
        let previous = slot.publish(Frame::filled(2, 2, [9, 9, 9]).unwrap());

        assert_eq!(snapshot.pixel(0, 0), Some([1, 2, 3]));
        assert!(Arc::ptr_eq(&snapshot, &previous.unwrap()));
        assert_eq!(slot.current_frame().unwrap().pixel(1, 1), Some([9, 9, 9]));

        slot.clear();
        assert!(slot.is_empty());
    }
}

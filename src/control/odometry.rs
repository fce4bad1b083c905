//! Latest-odometry buffer shared with the transport thread.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::Velocity;

/// Single-writer, single-consumer velocity mailbox.
///
/// The transport thread pushes each odometry sample as it arrives; the
/// control thread copies the most recent one out at the start of a
/// cycle. The lock is held only long enough to copy three scalars and
/// never across a rollout or grid build.
#[derive(Clone, Default)]
pub struct OdometryBuffer {
    inner: Arc<Mutex<Velocity>>,
}

impl OdometryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest base velocity (called from the transport thread).
    pub fn push(&self, vel: Velocity) {
        *self.inner.lock() = vel;
    }

    /// Copy out the most recently pushed velocity.
    pub fn latest(&self) -> Velocity {
        *self.inner.lock()
    }
}

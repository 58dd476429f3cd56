use document::pacing::{Debounce, Throttle};
use document::{Bounds, CameraOptions, Editor};
use std::time::{Duration, Instant};

pub const RESIZE_THROTTLE: Duration = Duration::from_millis(100);
pub const RESIZE_SETTLE: Duration = Duration::from_millis(500);

/// Fits the camera exactly onto `frame` and leaves it locked.
pub fn lock_to_frame(editor: &mut Editor, frame: Bounds) {
    editor.set_camera_options(CameraOptions {
        is_locked: false,
        ..editor.camera_options()
    });
    editor.zoom_to_bounds(frame, 0.0);
    editor.set_camera_options(CameraOptions {
        is_locked: true,
        ..editor.camera_options()
    });
}

/// Resize handling: a throttled fit follows the drag, a debounced fit lands
/// once the size settles. Both run the same idempotent fit.
#[derive(Debug, Clone)]
pub struct ResizeFit {
    throttle: Throttle,
    settle: Debounce,
}

impl Default for ResizeFit {
    fn default() -> Self {
        Self {
            throttle: Throttle::new(RESIZE_THROTTLE),
            settle: Debounce::new(RESIZE_SETTLE),
        }
    }
}

impl ResizeFit {
    /// Returns whether a fit is due right now.
    pub fn on_resize(&mut self, now: Instant) -> bool {
        self.settle.call(now);
        self.throttle.call(now)
    }

    /// Returns whether a deferred fit came due.
    pub fn poll(&mut self, now: Instant) -> bool {
        let trailing = self.throttle.poll(now);
        let settled = self.settle.poll(now);
        trailing || settled
    }

    pub fn is_pending(&self) -> bool {
        self.throttle.is_pending() || self.settle.is_pending()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.throttle.deadline(), self.settle.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn cancel(&mut self) {
        self.throttle.cancel();
        self.settle.cancel();
    }
}

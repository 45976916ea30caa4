use muza_core::clamp_unit;

/// Horizontal extent of the progress track, in pointer coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackBounds {
    pub left: f64,
    pub width: f64,
}

impl TrackBounds {
    pub fn new(left: f64, width: f64) -> Self {
        Self { left, width }
    }

    /// Pointer position as a fraction of the track. Points outside the track
    /// clamp to the nearest end; a collapsed track maps everything to 0.
    pub fn normalize(&self, pointer_x: f64) -> f64 {
        if self.width.is_nan() || self.width <= 0.0 {
            return 0.0;
        }
        clamp_unit((pointer_x - self.left) / self.width)
    }
}

/// Turns pointer down/move/up over the progress track into seek positions.
#[derive(Debug, Default, Clone)]
pub struct SeekGestureTracker {
    dragging: bool,
}

impl SeekGestureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn begin(&mut self, pointer_x: f64, bounds: TrackBounds) -> f64 {
        self.dragging = true;
        bounds.normalize(pointer_x)
    }

    /// `None` unless a drag is in progress.
    pub fn drag_to(&mut self, pointer_x: f64, bounds: TrackBounds) -> Option<f64> {
        self.dragging.then(|| bounds.normalize(pointer_x))
    }

    pub fn end(&mut self) {
        self.dragging = false;
    }
}

#[cfg(test)]
mod tests {
    use super::{SeekGestureTracker, TrackBounds};

    #[test]
    fn move_without_begin_is_ignored() {
        let mut tracker = SeekGestureTracker::new();
        assert_eq!(tracker.drag_to(50.0, TrackBounds::new(0.0, 100.0)), None);
    }

    #[test]
    fn tracks_drag_positions() {
        let bounds = TrackBounds::new(20.0, 200.0);
        let mut tracker = SeekGestureTracker::new();

        assert_eq!(tracker.begin(70.0, bounds), 0.25);
        assert!(tracker.is_dragging());
        assert_eq!(tracker.drag_to(120.0, bounds), Some(0.5));

        tracker.end();
        assert!(!tracker.is_dragging());
        assert_eq!(tracker.drag_to(120.0, bounds), None);
    }

    #[test]
    fn clamps_pointer_outside_track() {
        let bounds = TrackBounds::new(0.0, 100.0);
        let mut tracker = SeekGestureTracker::new();

        assert_eq!(tracker.begin(-30.0, bounds), 0.0);
        assert_eq!(tracker.drag_to(180.0, bounds), Some(1.0));
    }

    #[test]
    fn zero_width_track_maps_to_start() {
        assert_eq!(TrackBounds::new(10.0, 0.0).normalize(40.0), 0.0);
    }
}

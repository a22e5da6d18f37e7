//! Knob angle → normalized effect intensity.

use crate::config::KnobConfig;

/// Angle (degrees) of `point` around `center`, in `(-180, 180]`.
pub fn pointer_angle(center: (f64, f64), point: (f64, f64)) -> f64 {
    let dx = point.0 - center.0;
    let dy = point.1 - center.1;
    dy.atan2(dx).to_degrees()
}

/// Folds a raw angular difference back into `[-180, 180]` so a drag across
/// the ±180° seam reads as the short way round.
pub fn unwrap_delta(delta: f64) -> f64 {
    if delta > 180.0 {
        delta - 360.0
    } else if delta < -180.0 {
        delta + 360.0
    } else {
        delta
    }
}

#[derive(Debug, Clone)]
pub struct IntensitySource {
    angle: f64,
    min_angle: f64,
    max_angle: f64,
    /// Pointer angle at the previous drag sample, while a drag is active.
    drag_anchor: Option<f64>,
}

impl IntensitySource {
    /// Starts at the middle of the range.
    pub fn new(config: &KnobConfig) -> Self {
        Self {
            angle: (config.min_angle + config.max_angle) / 2.0,
            min_angle: config.min_angle,
            max_angle: config.max_angle,
            drag_anchor: None,
        }
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Always in `[0, 1]`; an empty range reads as 0.
    pub fn normalized_intensity(&self) -> f64 {
        let span = self.max_angle - self.min_angle;
        if span.is_nan() || span <= 0.0 {
            return 0.0;
        }
        ((self.angle - self.min_angle) / span).clamp(0.0, 1.0)
    }

    /// Rotates by the pointer's angular change (raw, possibly across the
    /// ±180° seam) and returns the clamped angle.
    pub fn set_angle_from_drag(&mut self, delta: f64) -> f64 {
        let angle = self.angle + unwrap_delta(delta);
        self.angle = angle.min(self.max_angle).max(self.min_angle);
        self.angle
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_anchor.is_some()
    }

    pub fn begin_drag(&mut self, pointer_angle: f64) {
        self.drag_anchor = Some(pointer_angle);
    }

    /// Feeds the next pointer sample of an active drag. Returns the new knob
    /// angle, or `None` when no drag is in progress.
    pub fn drag_to(&mut self, pointer_angle: f64) -> Option<f64> {
        let previous = self.drag_anchor?;
        self.drag_anchor = Some(pointer_angle);
        Some(self.set_angle_from_drag(pointer_angle - previous))
    }

    pub fn end_drag(&mut self) {
        self.drag_anchor = None;
    }
}

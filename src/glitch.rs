//! Intensity-driven glitch cadence.
//!
//! Idle → (delay elapses) → Glitching → (fixed duration) → Idle, where the
//! delay shrinks linearly as intensity grows. Only one idle timer and one
//! glitch exist at any time.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use rand::rngs::SmallRng;
use rand::Rng;

use crate::config::GlitchConfig;
use crate::timer::{cancel_slot, TaskHandle, Timers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlitchVariant {
    One,
    Two,
}

impl GlitchVariant {
    pub const ALL: [GlitchVariant; 2] = [GlitchVariant::One, GlitchVariant::Two];

    /// CSS class applied to the target while this variant plays.
    pub fn class_name(self) -> &'static str {
        match self {
            GlitchVariant::One => "is-glitching-1",
            GlitchVariant::Two => "is-glitching-2",
        }
    }
}

/// Surface that shows the glitch.
pub trait GlitchTarget {
    fn add_marker(&self, variant: GlitchVariant);
    /// Removes every glitch marker.
    fn clear_markers(&self);
}

/// Delay before the next glitch at `intensity`.
pub fn glitch_delay_ms(config: &GlitchConfig, intensity: f64) -> u32 {
    let range = f64::from(config.max_delay_ms.saturating_sub(config.min_delay_ms));
    let delay = f64::from(config.max_delay_ms) - intensity.clamp(0.0, 1.0) * range;
    delay.round() as u32
}

struct Inner {
    config: GlitchConfig,
    timers: Rc<dyn Timers>,
    target: Rc<dyn GlitchTarget>,
    rng: SmallRng,
    intensity: f64,
    active: Option<GlitchVariant>,
    pending: Option<TaskHandle>,
    glitch_end: Option<TaskHandle>,
    this: Weak<RefCell<Inner>>,
}

pub struct GlitchScheduler {
    inner: Rc<RefCell<Inner>>,
}

impl GlitchScheduler {
    pub fn new(
        config: GlitchConfig,
        timers: Rc<dyn Timers>,
        target: Rc<dyn GlitchTarget>,
        rng: SmallRng,
    ) -> Self {
        let inner = Rc::new_cyclic(|this| {
            RefCell::new(Inner {
                config,
                timers,
                target,
                rng,
                intensity: 0.0,
                active: None,
                pending: None,
                glitch_end: None,
                this: this.clone(),
            })
        });
        Self { inner }
    }

    pub fn is_active(&self) -> bool {
        self.inner.borrow().active.is_some()
    }

    pub fn active_variant(&self) -> Option<GlitchVariant> {
        self.inner.borrow().active
    }

    pub fn has_pending_timer(&self) -> bool {
        self.inner.borrow().pending.is_some()
    }

    pub fn reconfigure(&self, intensity: f64) {
        self.inner.borrow_mut().reconfigure(intensity);
    }

    /// Starts a glitch now unless one is already playing.
    pub fn force_trigger(&self) {
        let mut inner = self.inner.borrow_mut();
        let timers = inner.timers.clone();
        cancel_slot(timers.as_ref(), &mut inner.pending);
        inner.trigger();
    }

    /// Cancels every outstanding timer and clears the target.
    pub fn dispose(&self) {
        self.inner.borrow_mut().stop();
    }
}

impl Drop for GlitchScheduler {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl Inner {
    fn reconfigure(&mut self, intensity: f64) {
        self.intensity = intensity;
        let timers = self.timers.clone();
        cancel_slot(timers.as_ref(), &mut self.pending);

        if intensity <= self.config.off_threshold {
            self.stop();
            return;
        }
        if self.active.is_none() {
            self.schedule_next();
        }
    }

    fn schedule_next(&mut self) {
        let delay = glitch_delay_ms(&self.config, self.intensity);
        let this = self.this.clone();
        self.pending = Some(self.timers.schedule(
            delay,
            Box::new(move || {
                if let Some(inner) = this.upgrade() {
                    let mut inner = inner.borrow_mut();
                    inner.pending = None;
                    inner.trigger();
                }
            }),
        ));
    }

    fn trigger(&mut self) {
        if self.active.is_some() {
            return;
        }
        let variant = if self.rng.gen_bool(0.5) {
            GlitchVariant::One
        } else {
            GlitchVariant::Two
        };
        self.active = Some(variant);
        self.target.add_marker(variant);

        let this = self.this.clone();
        self.glitch_end = Some(self.timers.schedule(
            self.config.duration_ms,
            Box::new(move || {
                if let Some(inner) = this.upgrade() {
                    inner.borrow_mut().finish();
                }
            }),
        ));
    }

    fn finish(&mut self) {
        self.glitch_end = None;
        self.active = None;
        self.target.clear_markers();
        let intensity = self.intensity;
        self.reconfigure(intensity);
    }

    fn stop(&mut self) {
        let timers = self.timers.clone();
        cancel_slot(timers.as_ref(), &mut self.pending);
        cancel_slot(timers.as_ref(), &mut self.glitch_end);
        self.active = None;
        self.target.clear_markers();
    }
}

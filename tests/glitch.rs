use std::cell::RefCell;
use std::rc::Rc;

use crt_tv::config::GlitchConfig;
use crt_tv::glitch::{glitch_delay_ms, GlitchScheduler, GlitchTarget, GlitchVariant};
use crt_tv::timer::ManualTimers;
use rand::rngs::SmallRng;
use rand::SeedableRng;

#[derive(Default)]
struct Surface {
    markers: RefCell<Vec<GlitchVariant>>,
}

impl GlitchTarget for Surface {
    fn add_marker(&self, variant: GlitchVariant) {
        self.markers.borrow_mut().push(variant);
    }

    fn clear_markers(&self) {
        self.markers.borrow_mut().clear();
    }
}

fn scheduler() -> (GlitchScheduler, ManualTimers, Rc<Surface>) {
    let timers = ManualTimers::new();
    let surface = Rc::new(Surface::default());
    let glitch = GlitchScheduler::new(
        GlitchConfig::default(),
        Rc::new(timers.clone()),
        surface.clone(),
        SmallRng::seed_from_u64(42),
    );
    (glitch, timers, surface)
}

#[test]
fn delay_shrinks_linearly_with_intensity() {
    let config = GlitchConfig::default();
    assert_eq!(glitch_delay_ms(&config, 0.0), 5000);
    assert_eq!(glitch_delay_ms(&config, 0.5), 2600);
    assert_eq!(glitch_delay_ms(&config, 1.0), 200);
}

#[test]
fn inverted_delay_bounds_pin_to_the_maximum() {
    let config = GlitchConfig {
        min_delay_ms: 6000,
        ..GlitchConfig::default()
    };
    assert_eq!(glitch_delay_ms(&config, 0.0), 5000);
    assert_eq!(glitch_delay_ms(&config, 0.5), 5000);
    assert_eq!(glitch_delay_ms(&config, 1.0), 5000);
}

#[test]
fn full_intensity_glitches_once_for_300ms() {
    let (glitch, timers, surface) = scheduler();
    glitch.reconfigure(1.0);
    assert_eq!(timers.next_due_in(), Some(200));

    timers.advance(199);
    assert!(!glitch.is_active());
    timers.advance(1);
    assert!(glitch.is_active());
    assert_eq!(surface.markers.borrow().len(), 1);
    let variant = surface.markers.borrow()[0];
    assert!(GlitchVariant::ALL.contains(&variant));
    assert_eq!(glitch.active_variant(), Some(variant));

    timers.advance(299);
    assert_eq!(*surface.markers.borrow(), vec![variant]);
    timers.advance(1);
    assert!(surface.markers.borrow().is_empty());
    assert!(!glitch.is_active());

    // Back to idle with the last intensity: the next one is already queued.
    assert!(glitch.has_pending_timer());
    assert_eq!(timers.next_due_in(), Some(200));
}

#[test]
fn both_variants_show_up() {
    let (glitch, timers, surface) = scheduler();
    let mut seen = Vec::new();
    glitch.reconfigure(1.0);
    for _ in 0..40 {
        timers.advance(200);
        if let Some(variant) = surface.markers.borrow().first() {
            if !seen.contains(variant) {
                seen.push(*variant);
            }
        }
        timers.advance(300);
    }
    assert_eq!(seen.len(), 2);
}

#[test]
fn reconfigure_zero_always_goes_idle() {
    // Idle with a pending timer.
    let (glitch, timers, surface) = scheduler();
    glitch.reconfigure(0.7);
    assert!(glitch.has_pending_timer());
    glitch.reconfigure(0.0);
    assert!(!glitch.is_active());
    assert!(!glitch.has_pending_timer());
    assert_eq!(timers.pending(), 0);
    assert!(surface.markers.borrow().is_empty());

    // Mid-glitch.
    let (glitch, timers, surface) = scheduler();
    glitch.reconfigure(1.0);
    timers.advance(250);
    assert!(glitch.is_active());
    glitch.reconfigure(0.0);
    assert!(!glitch.is_active());
    assert!(!glitch.has_pending_timer());
    assert_eq!(timers.pending(), 0);
    assert!(surface.markers.borrow().is_empty());

    // Never configured.
    let (glitch, timers, _) = scheduler();
    glitch.reconfigure(0.0);
    assert!(!glitch.is_active());
    assert_eq!(timers.pending(), 0);
}

#[test]
fn near_zero_counts_as_off() {
    let (glitch, timers, _) = scheduler();
    glitch.reconfigure(0.01);
    assert!(!glitch.has_pending_timer());
    assert_eq!(timers.pending(), 0);
}

#[test]
fn reconfigure_replaces_the_pending_timer() {
    let (glitch, timers, _) = scheduler();
    glitch.reconfigure(0.5);
    glitch.reconfigure(1.0);
    glitch.reconfigure(1.0);
    assert_eq!(timers.pending(), 1);
    assert_eq!(timers.next_due_in(), Some(200));
}

#[test]
fn reconfigure_during_a_glitch_waits_for_it_to_end() {
    let (glitch, timers, surface) = scheduler();
    glitch.reconfigure(1.0);
    timers.advance(200);
    assert!(glitch.is_active());

    glitch.reconfigure(0.5);
    assert!(!glitch.has_pending_timer());
    assert_eq!(surface.markers.borrow().len(), 1);

    timers.advance(300);
    assert!(!glitch.is_active());
    assert_eq!(timers.next_due_in(), Some(2600));
}

#[test]
fn force_trigger_starts_now_but_never_stacks() {
    let (glitch, timers, surface) = scheduler();
    glitch.reconfigure(0.5);
    glitch.force_trigger();
    assert!(glitch.is_active());
    assert!(!glitch.has_pending_timer());

    glitch.force_trigger();
    assert_eq!(surface.markers.borrow().len(), 1);

    timers.advance(300);
    assert!(!glitch.is_active());
    assert!(glitch.has_pending_timer());
}

#[test]
fn dispose_cancels_everything() {
    let (glitch, timers, surface) = scheduler();
    glitch.reconfigure(1.0);
    timers.advance(200);
    glitch.dispose();
    assert_eq!(timers.pending(), 0);
    assert!(surface.markers.borrow().is_empty());

    timers.advance(10_000);
    assert!(!glitch.is_active());
}

#[test]
fn dropping_the_scheduler_cancels_its_timers() {
    let (glitch, timers, _) = scheduler();
    glitch.reconfigure(1.0);
    drop(glitch);
    assert_eq!(timers.pending(), 0);
}

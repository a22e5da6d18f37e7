use crt_tv::overlay::{OverlayAction, OverlayContent, OverlayState};

fn text(s: &str) -> OverlayContent {
    OverlayContent::Text(s.to_string())
}

/// Drives a state machine the way the engine does and counts the work it
/// is asked to do. Regeneration completes synchronously.
#[derive(Default)]
struct Engine {
    regenerations: usize,
    renders: usize,
}

impl Engine {
    fn run(&mut self, state: &mut OverlayState, action: OverlayAction) {
        match action {
            OverlayAction::Nothing => {}
            OverlayAction::Render => {
                assert!(state.can_render());
                self.renders += 1;
            }
            OverlayAction::Regenerate => {
                self.regenerations += 1;
                let ticket = state.begin_regeneration();
                let next = state.texture_uploaded(ticket);
                self.run(state, next);
            }
        }
    }
}

#[test]
fn starts_hidden_and_dirty() {
    let state = OverlayState::new(Some(text("BBC1")));
    assert!(!state.is_visible());
    assert!(state.is_dirty());
    assert!(!state.can_render());
}

#[test]
fn showing_dirty_content_regenerates_once_before_rendering() {
    let mut state = OverlayState::new(Some(text("BBC1")));
    let mut engine = Engine::default();

    let action = state.show();
    assert_eq!(action, OverlayAction::Regenerate);
    engine.run(&mut state, action);
    assert_eq!(engine.regenerations, 1);
    assert_eq!(engine.renders, 1);
    assert!(!state.is_dirty());
}

#[test]
fn showing_clean_content_renders_without_regenerating() {
    let mut state = OverlayState::new(Some(text("BBC1")));
    let ticket = state.begin_regeneration();
    assert_eq!(state.texture_uploaded(ticket), OverlayAction::Nothing);
    assert!(!state.is_dirty());

    let mut engine = Engine::default();
    let action = state.show();
    assert_eq!(action, OverlayAction::Render);
    engine.run(&mut state, action);
    assert_eq!(engine.regenerations, 0);
    assert_eq!(engine.renders, 1);
}

#[test]
fn show_is_idempotent() {
    let mut state = OverlayState::new(Some(text("BBC1")));
    let mut engine = Engine::default();
    let action = state.show();
    engine.run(&mut state, action);
    assert_eq!(state.show(), OverlayAction::Nothing);
}

#[test]
fn hide_always_marks_dirty() {
    let mut state = OverlayState::new(Some(text("BBC1")));
    let mut engine = Engine::default();
    let action = state.show();
    engine.run(&mut state, action);
    assert!(!state.is_dirty());

    assert!(state.hide());
    assert!(state.is_dirty());
    assert!(!state.hide());

    // Next show regenerates again.
    assert_eq!(state.show(), OverlayAction::Regenerate);
}

#[test]
fn content_changes_while_hidden_are_deferred() {
    let mut state = OverlayState::new(None);
    assert_eq!(state.set_content(text("BBC2")), OverlayAction::Nothing);
    assert!(state.is_dirty());
    assert_eq!(state.content(), Some(&text("BBC2")));
}

#[test]
fn content_changes_while_visible_regenerate() {
    let mut state = OverlayState::new(Some(text("BBC1")));
    let mut engine = Engine::default();
    let action = state.show();
    engine.run(&mut state, action);

    let action = state.set_content(text("ITV"));
    assert_eq!(action, OverlayAction::Regenerate);
    engine.run(&mut state, action);
    assert_eq!(engine.regenerations, 2);
    assert_eq!(engine.renders, 2);

    // Same content again is not a change.
    assert_eq!(state.set_content(text("ITV")), OverlayAction::Nothing);
    assert!(!state.is_dirty());
}

#[test]
fn showing_without_content_waits_for_it() {
    let mut state = OverlayState::new(None);
    assert_eq!(state.show(), OverlayAction::Nothing);
    assert!(state.is_visible());
    assert!(!state.can_render());

    let action = state.set_content(OverlayContent::Html("<p>P100</p>".into()));
    assert_eq!(action, OverlayAction::Regenerate);
}

#[test]
fn late_decode_for_old_content_is_discarded() {
    let mut state = OverlayState::new(Some(text("A")));
    assert_eq!(state.show(), OverlayAction::Regenerate);
    let stale = state.begin_regeneration();

    // Content changes while the first decode is still in flight.
    assert_eq!(state.set_content(text("B")), OverlayAction::Regenerate);
    let fresh = state.begin_regeneration();

    assert!(state.is_current(fresh));
    assert!(!state.is_current(stale));
    assert_eq!(state.texture_uploaded(stale), OverlayAction::Nothing);
    assert!(state.is_dirty());

    assert_eq!(state.texture_uploaded(fresh), OverlayAction::Render);
    assert!(!state.is_dirty());
}

#[test]
fn decode_finishing_after_hide_is_stale() {
    let mut state = OverlayState::new(Some(text("A")));
    state.show();
    let ticket = state.begin_regeneration();
    state.hide();
    assert_eq!(state.texture_uploaded(ticket), OverlayAction::Nothing);
    assert!(state.is_dirty());
}

#[test]
fn resize_never_dirties_content() {
    let mut state = OverlayState::new(Some(text("A")));
    assert_eq!(state.resized(), OverlayAction::Nothing);

    let mut engine = Engine::default();
    let action = state.show();
    engine.run(&mut state, action);
    assert_eq!(state.resized(), OverlayAction::Render);
    assert!(!state.is_dirty());
}

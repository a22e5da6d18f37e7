use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crt_tv::channel::{
    ChannelContent, ChannelDefinition, ChannelIndicator, ChannelRecord, ChannelRegistry,
    ChannelSwitcher, OverlayControl, VideoSurface, UNKNOWN_CHANNEL_LABEL,
};
use crt_tv::config::DEFAULT_CHANNELS;
use crt_tv::overlay::{OverlayAction, OverlayContent, OverlayState};
use crt_tv::timer::ManualTimers;
use crt_tv::TvError;

#[derive(Default)]
struct FakeVideo {
    time: Cell<f64>,
    src: RefCell<String>,
    visible: Cell<bool>,
    pauses: Cell<u32>,
}

impl VideoSurface for FakeVideo {
    fn current_time(&self) -> f64 {
        self.time.get()
    }

    fn set_current_time(&self, seconds: f64) {
        self.time.set(seconds);
    }

    fn source(&self) -> String {
        self.src.borrow().clone()
    }

    fn set_source(&self, source: &str) {
        *self.src.borrow_mut() = source.to_string();
        // Loading a new source starts from the top.
        self.time.set(0.0);
    }

    fn set_visible(&self, visible: bool) {
        self.visible.set(visible);
    }

    fn pause(&self) {
        self.pauses.set(self.pauses.get() + 1);
    }
}

/// Overlay backed by the real state machine; regeneration completes at once.
struct FakeOverlay {
    state: RefCell<OverlayState>,
    regenerations: Cell<u32>,
}

impl FakeOverlay {
    fn new() -> Self {
        Self {
            state: RefCell::new(OverlayState::new(None)),
            regenerations: Cell::new(0),
        }
    }

    fn visible(&self) -> bool {
        self.state.borrow().is_visible()
    }

    fn text(&self) -> Option<String> {
        match self.state.borrow().content() {
            Some(OverlayContent::Text(text)) => Some(text.clone()),
            _ => None,
        }
    }

    fn run(&self, action: OverlayAction) {
        if action == OverlayAction::Regenerate {
            self.regenerations.set(self.regenerations.get() + 1);
            let mut state = self.state.borrow_mut();
            let ticket = state.begin_regeneration();
            state.texture_uploaded(ticket);
        }
    }
}

impl OverlayControl for FakeOverlay {
    fn show(&self) {
        let action = self.state.borrow_mut().show();
        self.run(action);
    }

    fn hide(&self) {
        self.state.borrow_mut().hide();
    }

    fn set_content(&self, content: OverlayContent) {
        let action = self.state.borrow_mut().set_content(content);
        self.run(action);
    }
}

#[derive(Default)]
struct FakeButtons {
    highlighted: RefCell<Vec<(Option<String>, u32)>>,
}

impl ChannelIndicator for FakeButtons {
    fn highlight(&self, channel: Option<&ChannelDefinition>, number: u32) {
        self.highlighted
            .borrow_mut()
            .push((channel.map(|c| c.name.clone()), number));
    }
}

struct Rig {
    switcher: ChannelSwitcher,
    video: Rc<FakeVideo>,
    teletext: Rc<FakeOverlay>,
    label: Rc<FakeOverlay>,
    buttons: Rc<FakeButtons>,
    timers: ManualTimers,
}

fn rig() -> Rig {
    let registry = ChannelRegistry::from_json(DEFAULT_CHANNELS).unwrap();
    let video = Rc::new(FakeVideo::default());
    let teletext = Rc::new(FakeOverlay::new());
    let label = Rc::new(FakeOverlay::new());
    let buttons = Rc::new(FakeButtons::default());
    let timers = ManualTimers::new();
    let switcher = ChannelSwitcher::new(
        registry,
        1,
        3000,
        video.clone(),
        teletext.clone(),
        label.clone(),
        buttons.clone(),
        Rc::new(timers.clone()),
    );
    Rig {
        switcher,
        video,
        teletext,
        label,
        buttons,
        timers,
    }
}

fn record(number: u32, name: &str, video: Option<&str>) -> ChannelRecord {
    serde_json::from_value(serde_json::json!({
        "number": number,
        "name": name,
        "type": if video.is_some() { "video" } else { "teletext" },
        "video": video,
    }))
    .unwrap()
}

#[test]
fn shipped_channels_parse() {
    let registry = ChannelRegistry::from_json(DEFAULT_CHANNELS).unwrap();
    assert_eq!(registry.len(), 4);
    let names: Vec<_> = registry.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["BBC1", "BBC2", "ITV", "C4"]);
    assert!(registry.get(1).unwrap().is_video());
    assert_eq!(registry.get(4).unwrap().content, ChannelContent::Teletext);
    assert_eq!(
        registry.get(2).unwrap().link.as_deref(),
        Some("https://wayve.ai")
    );
}

#[test]
fn records_without_a_number_are_skipped() {
    let registry = ChannelRegistry::from_records(vec![
        record(0, "nowhere", Some("a.mp4")),
        record(2, "BBC2", Some("b.mp4")),
    ])
    .unwrap();
    assert_eq!(registry.len(), 1);
    assert!(registry.get(0).is_none());
}

#[test]
fn invalid_channel_lists_are_rejected() {
    let duplicate = ChannelRegistry::from_records(vec![
        record(1, "BBC1", Some("a.mp4")),
        record(1, "BBC1 again", Some("b.mp4")),
    ]);
    assert!(matches!(duplicate, Err(TvError::DuplicateChannel { number: 1 })));

    let sourceless = ChannelRegistry::from_records(vec![ChannelRecord {
        number: 3,
        name: "ITV".into(),
        kind: crt_tv::channel::ChannelKind::Video,
        video: None,
        link: None,
    }]);
    assert!(matches!(sourceless, Err(TvError::MissingVideoSource { number: 3 })));

    assert!(matches!(
        ChannelRegistry::from_records(Vec::new()),
        Err(TvError::NoChannels)
    ));
    assert!(matches!(
        ChannelRegistry::from_json("{ not json"),
        Err(TvError::InvalidConfig(_))
    ));
}

#[test]
fn switching_to_video_loads_and_shows_it() {
    let mut rig = rig();
    rig.switcher.switch_to(2);

    assert_eq!(rig.switcher.current(), 2);
    assert_eq!(rig.video.source(), "videos/wayve.mp4");
    assert!(rig.video.visible.get());
    assert!(!rig.teletext.visible());
    assert_eq!(rig.label.text().as_deref(), Some("BBC2"));
    assert!(rig.label.visible());
    assert_eq!(
        rig.buttons.highlighted.borrow().last(),
        Some(&(Some("BBC2".to_string()), 2))
    );
}

#[test]
fn switching_to_teletext_hides_and_pauses_video() {
    let mut rig = rig();
    rig.switcher.switch_to(4);

    assert!(rig.teletext.visible());
    assert_eq!(rig.teletext.regenerations.get(), 0, "no content loaded yet");
    assert!(!rig.video.visible.get());
    assert_eq!(rig.video.pauses.get(), 1);
    assert_eq!(rig.label.text().as_deref(), Some("C4"));
}

#[test]
fn unknown_channel_falls_back_to_a_blank_screen() {
    let mut rig = rig();
    rig.switcher.switch_to(1);
    rig.switcher.switch_to(4);
    rig.switcher.switch_to(99);

    assert_eq!(rig.video.source(), "");
    assert!(rig.video.visible.get());
    assert!(!rig.teletext.visible());
    assert_eq!(rig.label.text().as_deref(), Some(UNKNOWN_CHANNEL_LABEL));
    assert_eq!(rig.switcher.current(), 99);
    assert_eq!(rig.buttons.highlighted.borrow().last(), Some(&(None, 99)));
}

#[test]
fn playback_position_survives_a_round_trip() {
    let mut rig = rig();
    rig.switcher.switch_to(1);
    rig.video.set_current_time(12.75);

    rig.switcher.switch_to(2);
    assert_eq!(rig.video.current_time(), 0.0);
    rig.video.set_current_time(3.5);

    rig.switcher.switch_to(1);
    assert_eq!(rig.video.current_time(), 12.75);
    rig.switcher.switch_to(2);
    assert_eq!(rig.video.current_time(), 3.5);
}

#[test]
fn teletext_detour_keeps_the_video_position() {
    let mut rig = rig();
    rig.switcher.switch_to(1);
    assert_eq!(rig.video.current_time(), 0.0);

    rig.switcher.switch_to(4);
    rig.switcher.switch_to(1);

    assert_eq!(rig.video.current_time(), 0.0);
    assert!(!rig.teletext.visible());
    assert_eq!(rig.video.source(), "videos/crush.mp4");
}

#[test]
fn nothing_is_recorded_before_a_source_is_loaded() {
    let mut rig = rig();
    // The element reports a time before the first switch ever loads a file.
    rig.video.time.set(5.0);
    rig.switcher.switch_to(2);
    rig.switcher.switch_to(1);
    assert_eq!(rig.video.current_time(), 0.0);
}

#[test]
fn leaving_teletext_does_not_record_a_position() {
    let mut rig = rig();
    rig.switcher.switch_to(1);
    rig.video.set_current_time(8.0);
    rig.switcher.switch_to(4);
    // The paused video still reports a time; teletext must not claim it.
    rig.video.time.set(42.0);
    rig.switcher.switch_to(1);
    assert_eq!(rig.video.current_time(), 8.0);
}

#[test]
fn label_hides_3s_after_the_last_switch() {
    let mut rig = rig();
    rig.switcher.switch_to(1);
    rig.timers.advance(2000);
    assert!(rig.label.visible());

    rig.switcher.switch_to(2);
    assert_eq!(rig.timers.pending(), 1, "earlier auto-hide was cancelled");
    rig.timers.advance(2999);
    assert!(rig.label.visible());
    rig.timers.advance(1);
    assert!(!rig.label.visible());
}

#[test]
fn label_regenerates_only_when_its_text_changes() {
    let mut rig = rig();
    rig.switcher.switch_to(1);
    assert_eq!(rig.label.regenerations.get(), 1);

    // Same name while still visible: nothing to repaint.
    rig.switcher.switch_to(1);
    assert_eq!(rig.label.regenerations.get(), 1);

    rig.timers.advance(3000);
    rig.switcher.switch_to(1);
    assert_eq!(rig.label.regenerations.get(), 2);
}

#[test]
fn dispose_cancels_the_auto_hide() {
    let mut rig = rig();
    rig.switcher.switch_to(3);
    rig.switcher.dispose();
    assert_eq!(rig.timers.pending(), 0);
    rig.timers.advance(5000);
    assert!(rig.label.visible());
}

//! The TV itself: wires the page's elements to channel switching, the knob
//! and the picture effects.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{
    Document, Element, HtmlAnchorElement, HtmlCanvasElement, HtmlElement, HtmlVideoElement,
    MouseEvent, ScrollBehavior, ScrollIntoViewOptions, ScrollLogicalPosition,
};

use super::audio::ClickSound;
use super::crt::{CrtOverlay, SvgPainter, TextPainter};
use super::dom::{self, Listener};
use super::knob::Knob;
use super::noise::NoiseCanvas;
use super::teletext;
use crate::channel::{
    ChannelDefinition, ChannelIndicator, ChannelSwitcher, OverlayControl, VideoSurface,
};
use crate::config::TvConfig;
use crate::error::{Result, TvError};
use crate::glitch::{GlitchScheduler, GlitchTarget, GlitchVariant};
use crate::knob::IntensitySource;
use crate::timer::Timers;

struct Screen(HtmlVideoElement);

impl VideoSurface for Screen {
    fn current_time(&self) -> f64 {
        self.0.current_time()
    }

    fn set_current_time(&self, seconds: f64) {
        self.0.set_current_time(seconds);
    }

    fn source(&self) -> String {
        self.0.src()
    }

    fn set_source(&self, source: &str) {
        self.0.set_src(source);
    }

    fn set_visible(&self, visible: bool) {
        let display = if visible { "" } else { "none" };
        if let Err(e) = self.0.style().set_property("display", display) {
            log::warn!("video display: {e:?}");
        }
    }

    fn pause(&self) {
        if let Err(e) = self.0.pause() {
            log::warn!("video pause: {e:?}");
        }
    }
}

/// Channel buttons on the set, the listings, and the optional link out.
struct Buttons {
    set: Vec<Element>,
    listings: Vec<Element>,
    link: Option<HtmlAnchorElement>,
}

fn mark(buttons: &[Element], class: &str, number: u32) {
    for button in buttons {
        let classes = button.class_list();
        let _ = if dom::channel_of(button) == Some(number) {
            classes.add_1(class)
        } else {
            classes.remove_1(class)
        };
    }
}

impl ChannelIndicator for Buttons {
    fn highlight(&self, channel: Option<&ChannelDefinition>, number: u32) {
        mark(&self.listings, "active", number);
        mark(&self.set, "down", number);

        let Some(link) = &self.link else {
            return;
        };
        match channel.and_then(|c| c.link.as_deref()) {
            Some(href) => {
                link.set_href(href);
                let _ = link.style().remove_property("display");
            }
            None => {
                let _ = link.style().set_property("display", "none");
            }
        }
    }
}

/// Applies the glitch classes to the picture.
struct Picture(Element);

impl GlitchTarget for Picture {
    fn add_marker(&self, variant: GlitchVariant) {
        let _ = self.0.class_list().add_1(variant.class_name());
    }

    fn clear_markers(&self) {
        for variant in GlitchVariant::ALL {
            let _ = self.0.class_list().remove_1(variant.class_name());
        }
    }
}

pub struct Tv {
    switcher: Rc<RefCell<ChannelSwitcher>>,
    glitch: Rc<GlitchScheduler>,
    noise: Rc<NoiseCanvas>,
    click: Rc<ClickSound>,
    knob: Knob,
    // Kept alive for their resize listeners.
    _overlays: [Rc<CrtOverlay>; 2],
    listeners: Vec<Listener>,
}

impl Tv {
    pub fn mount(document: &Document, config: TvConfig, timers: Rc<dyn Timers>) -> Result<Self> {
        config.validate()?;
        let tv: HtmlElement = dom::require(document, ".tv")?;
        let video: HtmlVideoElement = dom::require(document, ".tv video")?;
        let noise_canvas: HtmlCanvasElement = dom::require(document, ".noise-canvas")?;
        let label_canvas: HtmlCanvasElement = dom::require(document, ".channel-display")?;
        let teletext_canvas: HtmlCanvasElement = dom::require(document, ".teletext")?;
        let holder: HtmlElement = dom::require(document, ".teletext-html-content")?;
        let knob_element: HtmlElement = dom::require(document, ".knob")?;
        let picture: Element = dom::optional(document, ".movie")?
            .unwrap_or_else(|| tv.clone().into());

        let set_buttons: Vec<Element> = dom::all(document, ".tv-case button[data-channel]")?;
        if set_buttons.is_empty() {
            return Err(TvError::MissingElement {
                selector: ".tv-case button[data-channel]".into(),
            });
        }
        let listings: Vec<Element> = dom::all(document, ".listings button[data-channel]")?;

        let registry = config.registry()?;

        let label = Rc::new(CrtOverlay::new(
            "channel",
            document,
            label_canvas,
            Box::new(TextPainter::new(&config.overlay)),
            None,
            &config.overlay,
            timers.clone(),
        )?);
        let teletext_overlay = Rc::new(CrtOverlay::new(
            "teletext",
            document,
            teletext_canvas,
            Box::new(SvgPainter),
            None,
            &config.overlay,
            timers.clone(),
        )?);

        let buttons = Buttons {
            set: set_buttons,
            listings: listings.clone(),
            link: dom::optional(document, ".channel-link")?,
        };
        let switcher = Rc::new(RefCell::new(ChannelSwitcher::new(
            registry,
            config.initial_channel,
            config.label_hide_ms,
            Rc::new(Screen(video)),
            teletext_overlay.clone(),
            label.clone(),
            Rc::new(buttons),
            timers.clone(),
        )));
        switcher.borrow_mut().switch_to(config.initial_channel);

        let glitch = Rc::new(GlitchScheduler::new(
            config.glitch.clone(),
            timers,
            Rc::new(Picture(picture)),
            super::rng(),
        ));

        let knob_config = config.knob.clone();
        let start_intensity = IntensitySource::new(&knob_config).normalized_intensity();
        let noise = Rc::new(NoiseCanvas::start(
            noise_canvas,
            config.noise.clone(),
            start_intensity,
            super::rng(),
        )?);
        glitch.reconfigure(start_intensity);

        let (n, g) = (noise.clone(), glitch.clone());
        let knob = Knob::attach(document, knob_element, &knob_config, move |intensity| {
            n.set_intensity(intensity);
            g.reconfigure(intensity);
        })?;

        let click = Rc::new(ClickSound::new(&config.click_sound, config.click_volume)?);
        let mut listeners = Vec::with_capacity(listings.len() + 1);

        let (s, c) = (switcher.clone(), click.clone());
        listeners.push(Listener::new(&tv, "mousedown", move |e: MouseEvent| {
            let Some(button) = e
                .target()
                .and_then(|t| t.dyn_into::<Element>().ok())
                .and_then(|t| t.closest(".tv-case button").ok().flatten())
            else {
                return;
            };
            match dom::channel_of(&button) {
                Some(number) => {
                    c.play();
                    s.borrow_mut().switch_to(number);
                }
                None => log::warn!("channel button without a usable data-channel"),
            }
        })?);

        let projects: Option<Element> = dom::optional(document, ".projects")?;
        for button in &listings {
            let Some(number) = dom::channel_of(button) else {
                log::warn!("listings button without a usable data-channel");
                continue;
            };
            let (s, c, p) = (switcher.clone(), click.clone(), projects.clone());
            listeners.push(Listener::new(button, "click", move |_: MouseEvent| {
                c.play();
                s.borrow_mut().switch_to(number);
                if let Some(projects) = &p {
                    let options = ScrollIntoViewOptions::new();
                    options.set_behavior(ScrollBehavior::Smooth);
                    options.set_block(ScrollLogicalPosition::Start);
                    projects.scroll_into_view_with_scroll_into_view_options(&options);
                }
            })?);
        }

        let weak = Rc::downgrade(&teletext_overlay);
        let page = config.teletext.clone();
        spawn_local(async move {
            let content = teletext::load(&holder, &page).await;
            if let Some(overlay) = weak.upgrade() {
                overlay.set_content(content);
            }
        });

        Ok(Self {
            switcher,
            glitch,
            noise,
            click,
            knob,
            _overlays: [label, teletext_overlay],
            listeners,
        })
    }

    pub fn current_channel(&self) -> u32 {
        self.switcher.borrow().current()
    }

    pub fn intensity(&self) -> f64 {
        self.knob.normalized_intensity()
    }

    pub fn dispose(self) {
        drop(self.listeners);
        drop(self.knob);
        self.glitch.dispose();
        self.noise.dispose();
        self.switcher.borrow_mut().dispose();
        self.click.dispose();
    }
}

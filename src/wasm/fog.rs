use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use web_sys::{
    CustomEvent, HtmlCanvasElement, MediaQueryList, MediaQueryListEvent,
    WebGl2RenderingContext as GL, WebGlBuffer, WebGlProgram, WebGlUniformLocation,
};

use super::dom::Listener;
use super::render::{self, AnimationLoop};
use crate::error::{Result, TvError};
use crate::fog::{palette_for, FogClock, Palette, SCROLL_SETTLE_MS};
use crate::theme::{Theme, THEME_CHANGED_EVENT};
use crate::timer::{cancel_slot, TaskHandle, Timers};

const FOG_FRAGMENT_SHADER: &str = include_str!("../shaders/fog.frag");
const DARK_SCHEME: &str = "(prefers-color-scheme: dark)";

struct Fog {
    canvas: HtmlCanvasElement,
    gl: GL,
    program: WebGlProgram,
    buffer: WebGlBuffer,
    position: u32,
    u_time: Option<WebGlUniformLocation>,
    u_resolution: Option<WebGlUniformLocation>,
    clock: FogClock,
    theme: Theme,
    prefers_dark: bool,
    last_scroll_y: f64,
    settle: Option<TaskHandle>,
    shown: bool,
}

impl Fog {
    fn apply_palette(&self) {
        self.set_palette(palette_for(self.theme, self.prefers_dark));
    }

    fn set_palette(&self, palette: Palette) {
        self.gl.use_program(Some(&self.program));
        for (name, [r, g, b]) in palette.uniforms() {
            let location = self.gl.get_uniform_location(&self.program, name);
            self.gl.uniform3f(location.as_ref(), r, g, b);
        }
        self.match_page_background();
    }

    /// Paints the canvas in the page background colour so there is no flash
    /// before the first frame.
    fn match_page_background(&self) {
        let color = web_sys::window()
            .zip(self.canvas.owner_document())
            .and_then(|(window, document)| {
                let root = document.document_element()?;
                window.get_computed_style(&root).ok().flatten()
            })
            .and_then(|style| style.get_property_value("--background-color").ok())
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        if let Some(color) = color {
            let _ = self.canvas.style().set_property("background-color", &color);
        }
    }

    fn frame(&mut self, timestamp: f64) {
        if render::fit_to_display(&self.canvas) {
            self.gl.viewport(
                0,
                0,
                self.gl.drawing_buffer_width(),
                self.gl.drawing_buffer_height(),
            );
        }
        let time = self.clock.tick(timestamp);

        let gl = &self.gl;
        gl.use_program(Some(&self.program));
        gl.uniform1f(self.u_time.as_ref(), time as f32);
        gl.uniform2f(
            self.u_resolution.as_ref(),
            gl.drawing_buffer_width() as f32,
            gl.drawing_buffer_height() as f32,
        );
        render::draw_quad(gl, &self.buffer, self.position);

        if !self.shown {
            self.shown = true;
            let _ = self.canvas.class_list().add_1("visible");
        }
    }
}

/// Animated fog behind the page, tinted by the active theme and sped up
/// while scrolling.
pub struct FogBackground {
    state: Rc<RefCell<Fog>>,
    timers: Rc<dyn Timers>,
    frames: AnimationLoop,
    _listeners: Vec<Listener>,
}

impl FogBackground {
    pub fn start(canvas: HtmlCanvasElement, theme: Theme, timers: Rc<dyn Timers>) -> Result<Self> {
        let window = web_sys::window().ok_or(TvError::Js("no window".into()))?;
        let document = window.document().ok_or(TvError::Js("no document".into()))?;

        let gl = render::context(&canvas)?;
        let program = render::program(&gl, render::QUAD_VERTEX_SHADER, FOG_FRAGMENT_SHADER)?;
        gl.use_program(Some(&program));
        let (buffer, position) = render::quad(&gl, &program)?;
        let scheme: Option<MediaQueryList> = window.match_media(DARK_SCHEME)?;

        let fog = Fog {
            u_time: gl.get_uniform_location(&program, "u_customTime"),
            u_resolution: gl.get_uniform_location(&program, "u_resolution"),
            canvas,
            gl,
            program,
            buffer,
            position,
            clock: FogClock::default(),
            theme,
            prefers_dark: scheme.as_ref().is_some_and(MediaQueryList::matches),
            last_scroll_y: window.scroll_y().unwrap_or(0.0),
            settle: None,
            shown: false,
        };
        fog.apply_palette();
        let state = Rc::new(RefCell::new(fog));

        let s = state.clone();
        let frames = AnimationLoop::start(move |timestamp| s.borrow_mut().frame(timestamp))?;

        let mut listeners = Vec::with_capacity(3);

        let (s, t) = (state.clone(), timers.clone());
        let scroller = window.clone();
        listeners.push(Listener::new(&window, "scroll", move |_: web_sys::Event| {
            let mut fog = s.borrow_mut();
            let y = scroller.scroll_y().unwrap_or(fog.last_scroll_y);
            let delta = y - fog.last_scroll_y;
            fog.last_scroll_y = y;
            fog.clock.on_scroll(delta);

            cancel_slot(t.as_ref(), &mut fog.settle);
            let weak = Rc::downgrade(&s);
            fog.settle = Some(t.schedule(
                SCROLL_SETTLE_MS,
                Box::new(move || {
                    if let Some(state) = weak.upgrade() {
                        let mut fog = state.borrow_mut();
                        fog.settle = None;
                        fog.clock.settle();
                    }
                }),
            ));
        })?);

        let s = state.clone();
        listeners.push(Listener::new(&document, THEME_CHANGED_EVENT, move |e: CustomEvent| {
            let theme = js_sys::Reflect::get(&e.detail(), &"theme".into())
                .ok()
                .and_then(|value| value.as_string());
            let theme = Theme::from_stored(theme.as_deref());
            let mut fog = s.borrow_mut();
            fog.theme = theme;
            fog.apply_palette();
        })?);

        if let Some(scheme) = scheme {
            let s = state.clone();
            listeners.push(Listener::new(&scheme, "change", move |e: MediaQueryListEvent| {
                let mut fog = s.borrow_mut();
                fog.prefers_dark = e.matches();
                if fog.theme.follows_os() {
                    fog.apply_palette();
                }
            })?);
        }

        Ok(Self {
            state,
            timers,
            frames,
            _listeners: listeners,
        })
    }

    pub fn dispose(self) {
        self.frames.stop();
        let mut fog = self.state.borrow_mut();
        cancel_slot(self.timers.as_ref(), &mut fog.settle);
    }
}

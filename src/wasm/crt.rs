//! CRT overlay engine: paints content into an offscreen raster, uploads it
//! as a texture and draws it through the curved-screen shader.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};

use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{
    CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlImageElement,
    WebGl2RenderingContext as GL, WebGlBuffer, WebGlProgram, WebGlTexture, WebGlUniformLocation,
};

use super::dom::Listener;
use super::render;
use crate::channel::OverlayControl;
use crate::config::OverlayConfig;
use crate::error::{Result, TvError};
use crate::overlay::{OverlayAction, OverlayContent, OverlayState, RegenTicket};
use crate::teletext::{svg_document, TELETEXT_CSS};
use crate::timer::{cancel_slot, TaskHandle, Timers};

const CRT_FRAGMENT_SHADER: &str = include_str!("../shaders/crt.frag");

/// Offscreen 2D surface the content is painted into.
pub struct Raster {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl Raster {
    fn new(document: &Document, width: u32, height: u32) -> Result<Self> {
        let canvas: HtmlCanvasElement = document.create_element("canvas")?.unchecked_into();
        canvas.set_width(width);
        canvas.set_height(height);
        let ctx = canvas
            .get_context("2d")?
            .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
            .ok_or(TvError::ContextUnavailable { kind: "2D" })?;
        Ok(Self { canvas, ctx })
    }

    fn width(&self) -> f64 {
        f64::from(self.canvas.width())
    }

    fn height(&self) -> f64 {
        f64::from(self.canvas.height())
    }

    fn clear(&self) {
        self.ctx.clear_rect(0.0, 0.0, self.width(), self.height());
    }

    fn draw_image(&self, image: &HtmlImageElement) -> Result<()> {
        self.clear();
        self.ctx
            .draw_image_with_html_image_element_and_dw_and_dh(
                image,
                0.0,
                0.0,
                self.width(),
                self.height(),
            )
            .map_err(Into::into)
    }
}

pub type Decoding = Pin<Box<dyn Future<Output = Result<HtmlImageElement>>>>;

pub enum Paint {
    /// The raster already holds the new content.
    Ready,
    /// The content is an image still being decoded; the engine draws it into
    /// the raster once it resolves.
    Decode(Decoding),
}

/// Content-generation strategy for an overlay.
pub trait Painter {
    fn paint(&self, content: &OverlayContent, raster: &Raster) -> Result<Paint>;
}

/// Draws a single line of text at the top-left corner.
pub struct TextPainter {
    font: String,
    color: String,
    padding: f64,
}

impl TextPainter {
    pub fn new(config: &OverlayConfig) -> Self {
        Self {
            font: config.label_font.clone(),
            color: config.label_color.clone(),
            padding: config.label_padding,
        }
    }
}

impl Painter for TextPainter {
    fn paint(&self, content: &OverlayContent, raster: &Raster) -> Result<Paint> {
        let text = match content {
            OverlayContent::Text(text) | OverlayContent::Html(text) => text,
        };
        let ctx = &raster.ctx;
        raster.clear();
        ctx.set_fill_style_str(&self.color);
        ctx.set_font(&self.font);
        ctx.set_text_align("left");
        ctx.set_text_baseline("top");
        ctx.fill_text(text, self.padding, self.padding)?;
        Ok(Paint::Ready)
    }
}

/// Lays out an HTML fragment by wrapping it in an SVG document and letting
/// the browser decode it as an image.
pub struct SvgPainter;

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

impl Painter for SvgPainter {
    fn paint(&self, content: &OverlayContent, raster: &Raster) -> Result<Paint> {
        let html = match content {
            OverlayContent::Html(html) => html.clone(),
            OverlayContent::Text(text) => format!("<p>{}</p>", escape_html(text)),
        };
        let svg = svg_document(
            &html,
            TELETEXT_CSS,
            raster.canvas.width(),
            raster.canvas.height(),
        );
        let url = format!(
            "data:image/svg+xml;charset=utf-8,{}",
            String::from(js_sys::encode_uri_component(&svg))
        );

        let image = HtmlImageElement::new()?;
        image.set_src(&url);
        let decode = JsFuture::from(image.decode());
        Ok(Paint::Decode(Box::pin(async move {
            decode.await.map_err(|e| TvError::Decode {
                reason: format!("{e:?}"),
            })?;
            Ok(image)
        })))
    }
}

struct Engine {
    name: &'static str,
    canvas: HtmlCanvasElement,
    gl: GL,
    program: WebGlProgram,
    texture: WebGlTexture,
    buffer: WebGlBuffer,
    position: u32,
    u_resolution: Option<WebGlUniformLocation>,
    u_texture: Option<WebGlUniformLocation>,
    u_curvature: Option<WebGlUniformLocation>,
    curvature: f32,
    raster: Raster,
    painter: Box<dyn Painter>,
    state: OverlayState,
}

impl Engine {
    fn blank_texture(gl: &GL) -> Result<WebGlTexture> {
        let texture = gl
            .create_texture()
            .ok_or(TvError::GlResource { what: "texture" })?;
        gl.bind_texture(GL::TEXTURE_2D, Some(&texture));
        // One transparent pixel until content is ready.
        gl.tex_image_2d_with_i32_and_i32_and_i32_and_format_and_type_and_opt_u8_array(
            GL::TEXTURE_2D,
            0,
            GL::RGBA as i32,
            1,
            1,
            0,
            GL::RGBA,
            GL::UNSIGNED_BYTE,
            Some(&[0, 0, 0, 0]),
        )?;
        gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_WRAP_S, GL::CLAMP_TO_EDGE as i32);
        gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_WRAP_T, GL::CLAMP_TO_EDGE as i32);
        gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_MIN_FILTER, GL::LINEAR as i32);
        gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_MAG_FILTER, GL::LINEAR as i32);
        Ok(texture)
    }

    fn upload(&self) -> Result<()> {
        let gl = &self.gl;
        gl.bind_texture(GL::TEXTURE_2D, Some(&self.texture));
        gl.pixel_storei(GL::UNPACK_FLIP_Y_WEBGL, 1);
        gl.pixel_storei(GL::UNPACK_PREMULTIPLY_ALPHA_WEBGL, 1);
        let result = gl.tex_image_2d_with_u32_and_u32_and_html_canvas_element(
            GL::TEXTURE_2D,
            0,
            GL::RGBA as i32,
            GL::RGBA,
            GL::UNSIGNED_BYTE,
            &self.raster.canvas,
        );
        gl.pixel_storei(GL::UNPACK_FLIP_Y_WEBGL, 0);
        gl.pixel_storei(GL::UNPACK_PREMULTIPLY_ALPHA_WEBGL, 0);
        result.map_err(Into::into)
    }

    /// Matches the drawing buffer to the element and refreshes
    /// `u_resolution`. Content stays as it is.
    fn fit(&self) {
        if render::fit_to_display(&self.canvas) {
            self.gl.viewport(
                0,
                0,
                self.gl.drawing_buffer_width(),
                self.gl.drawing_buffer_height(),
            );
        }
        self.gl.use_program(Some(&self.program));
        self.gl.uniform2f(
            self.u_resolution.as_ref(),
            self.gl.drawing_buffer_width() as f32,
            self.gl.drawing_buffer_height() as f32,
        );
    }

    fn render(&self) {
        if !self.state.can_render() {
            return;
        }
        let gl = &self.gl;
        gl.clear_color(0.0, 0.0, 0.0, 0.0);
        gl.clear(GL::COLOR_BUFFER_BIT);
        gl.use_program(Some(&self.program));
        gl.active_texture(GL::TEXTURE0);
        gl.bind_texture(GL::TEXTURE_2D, Some(&self.texture));
        gl.uniform1i(self.u_texture.as_ref(), 0);
        gl.uniform1f(self.u_curvature.as_ref(), self.curvature);
        render::draw_quad(gl, &self.buffer, self.position);
    }

    fn set_visible_class(&self, visible: bool) {
        let classes = self.canvas.class_list();
        let result = if visible {
            classes.add_1("visible")
        } else {
            classes.remove_1("visible")
        };
        if let Err(e) = result {
            log::warn!("{} overlay: class toggle failed: {e:?}", self.name);
        }
    }
}

/// A CRT overlay bound to one canvas.
pub struct CrtOverlay {
    inner: Rc<RefCell<Engine>>,
    _resize: Listener,
}

impl CrtOverlay {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: &'static str,
        document: &Document,
        canvas: HtmlCanvasElement,
        painter: Box<dyn Painter>,
        content: Option<OverlayContent>,
        config: &OverlayConfig,
        timers: Rc<dyn Timers>,
    ) -> Result<Self> {
        let gl = render::context(&canvas)?;
        let program = render::program(&gl, render::QUAD_VERTEX_SHADER, CRT_FRAGMENT_SHADER)?;
        gl.use_program(Some(&program));
        let (buffer, position) = render::quad(&gl, &program)?;
        let texture = Engine::blank_texture(&gl)?;
        let u_texture = gl.get_uniform_location(&program, "u_texture");
        gl.uniform1i(u_texture.as_ref(), 0);

        let engine = Engine {
            name,
            u_resolution: gl.get_uniform_location(&program, "u_resolution"),
            u_curvature: gl.get_uniform_location(&program, "u_curvature"),
            u_texture,
            canvas,
            gl,
            program,
            texture,
            buffer,
            position,
            curvature: config.curvature,
            raster: Raster::new(document, config.raster_width, config.raster_height)?,
            painter,
            state: OverlayState::new(content),
        };
        engine.fit();
        let inner = Rc::new(RefCell::new(engine));

        let window = web_sys::window().ok_or(TvError::Js("no window".into()))?;
        let debounce = config.resize_debounce_ms;
        let pending: Rc<Cell<Option<TaskHandle>>> = Rc::new(Cell::new(None));
        let weak = Rc::downgrade(&inner);
        let on_resize = Listener::new(&window, "resize", move |_: web_sys::Event| {
            let mut slot = pending.take();
            cancel_slot(timers.as_ref(), &mut slot);
            let weak = weak.clone();
            pending.set(Some(timers.schedule(
                debounce,
                Box::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        resize(&inner);
                    }
                }),
            )));
        })?;

        Ok(Self {
            inner,
            _resize: on_resize,
        })
    }
}

fn resize(inner: &Rc<RefCell<Engine>>) {
    let action = {
        let engine = inner.borrow();
        engine.fit();
        engine.state.resized()
    };
    apply(inner, action);
}

fn apply(inner: &Rc<RefCell<Engine>>, action: OverlayAction) {
    match action {
        OverlayAction::Nothing => {}
        OverlayAction::Render => inner.borrow().render(),
        OverlayAction::Regenerate => regenerate(inner),
    }
}

fn regenerate(inner: &Rc<RefCell<Engine>>) {
    let (name, ticket, paint) = {
        let engine = inner.borrow();
        let Some(content) = engine.state.content() else {
            return;
        };
        let ticket = engine.state.begin_regeneration();
        (engine.name, ticket, engine.painter.paint(content, &engine.raster))
    };

    match paint {
        Ok(Paint::Ready) => finish(inner, ticket),
        Ok(Paint::Decode(decoding)) => {
            let weak: Weak<RefCell<Engine>> = Rc::downgrade(inner);
            spawn_local(async move {
                let decoded = decoding.await;
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                match decoded {
                    Ok(image) => {
                        if !inner.borrow().state.is_current(ticket) {
                            log::debug!("{name} overlay: dropping superseded content");
                            return;
                        }
                        if let Err(e) = inner.borrow().raster.draw_image(&image) {
                            log::error!("{name} overlay: {e}");
                            return;
                        }
                        finish(&inner, ticket);
                    }
                    // Keep whatever texture is already there; no retry.
                    Err(e) => log::error!("{name} overlay: {e}"),
                }
            });
        }
        Err(e) => log::error!("{name} overlay: paint failed: {e}"),
    }
}

fn finish(inner: &Rc<RefCell<Engine>>, ticket: RegenTicket) {
    let action = {
        let mut engine = inner.borrow_mut();
        if !engine.state.is_current(ticket) {
            return;
        }
        if let Err(e) = engine.upload() {
            log::error!("{} overlay: texture upload failed: {e}", engine.name);
            return;
        }
        engine.state.texture_uploaded(ticket)
    };
    apply(inner, action);
}

impl OverlayControl for CrtOverlay {
    fn show(&self) {
        let action = {
            let mut engine = self.inner.borrow_mut();
            let was_visible = engine.state.is_visible();
            let action = engine.state.show();
            if !was_visible {
                engine.set_visible_class(true);
                engine.fit();
            }
            action
        };
        apply(&self.inner, action);
    }

    fn hide(&self) {
        let mut engine = self.inner.borrow_mut();
        if engine.state.hide() {
            engine.set_visible_class(false);
        }
    }

    fn set_content(&self, content: OverlayContent) {
        let action = self.inner.borrow_mut().state.set_content(content);
        apply(&self.inner, action);
    }
}

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{
    window, HtmlCanvasElement, WebGl2RenderingContext as GL, WebGlBuffer, WebGlProgram,
    WebGlShader,
};

use crate::error::{Result, TvError};

/// Vertex shader shared by every fullscreen quad.
pub const QUAD_VERTEX_SHADER: &str = include_str!("../shaders/quad.vert");

/// Two triangles covering clip space, drawn as a strip.
const QUAD: [f32; 8] = [-1.0, -1.0, 1.0, -1.0, -1.0, 1.0, 1.0, 1.0];

/// WebGL2 context with premultiplied-alpha blending on a transparent canvas.
pub fn context(canvas: &HtmlCanvasElement) -> Result<GL> {
    let options = js_sys::Object::new();
    js_sys::Reflect::set(&options, &"alpha".into(), &JsValue::TRUE)?;
    js_sys::Reflect::set(&options, &"premultipliedAlpha".into(), &JsValue::TRUE)?;
    let gl: GL = canvas
        .get_context_with_context_options("webgl2", &options)?
        .and_then(|ctx| ctx.dyn_into::<GL>().ok())
        .ok_or(TvError::ContextUnavailable { kind: "WebGL2" })?;
    gl.enable(GL::BLEND);
    gl.blend_func(GL::ONE, GL::ONE_MINUS_SRC_ALPHA);
    Ok(gl)
}

fn compile(gl: &GL, kind: u32, source: &str) -> Result<WebGlShader> {
    let shader = gl
        .create_shader(kind)
        .ok_or(TvError::GlResource { what: "shader" })?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);
    if gl
        .get_shader_parameter(&shader, GL::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        Ok(shader)
    } else {
        let log = gl.get_shader_info_log(&shader).unwrap_or_default();
        gl.delete_shader(Some(&shader));
        Err(TvError::ShaderCompile { log })
    }
}

/// Compiles and links a program; the shader objects are released after a
/// successful link.
pub fn program(gl: &GL, vertex: &str, fragment: &str) -> Result<WebGlProgram> {
    let vs = compile(gl, GL::VERTEX_SHADER, vertex)?;
    let fs = compile(gl, GL::FRAGMENT_SHADER, fragment)?;
    let program = gl
        .create_program()
        .ok_or(TvError::GlResource { what: "program" })?;
    gl.attach_shader(&program, &vs);
    gl.attach_shader(&program, &fs);
    gl.link_program(&program);

    let linked = gl
        .get_program_parameter(&program, GL::LINK_STATUS)
        .as_bool()
        .unwrap_or(false);
    gl.detach_shader(&program, &vs);
    gl.detach_shader(&program, &fs);
    gl.delete_shader(Some(&vs));
    gl.delete_shader(Some(&fs));
    if !linked {
        let log = gl.get_program_info_log(&program).unwrap_or_default();
        gl.delete_program(Some(&program));
        return Err(TvError::ProgramLink { log });
    }
    Ok(program)
}

/// Uploads the fullscreen quad and binds it to `a_position`.
pub fn quad(gl: &GL, program: &WebGlProgram) -> Result<(WebGlBuffer, u32)> {
    let buffer = gl
        .create_buffer()
        .ok_or(TvError::GlResource { what: "vertex buffer" })?;
    gl.bind_buffer(GL::ARRAY_BUFFER, Some(&buffer));
    let vertices = js_sys::Float32Array::from(&QUAD[..]);
    gl.buffer_data_with_array_buffer_view(GL::ARRAY_BUFFER, &vertices, GL::STATIC_DRAW);

    let location = u32::try_from(gl.get_attrib_location(program, "a_position"))
        .map_err(|_| TvError::GlResource { what: "a_position attribute" })?;
    Ok((buffer, location))
}

pub fn draw_quad(gl: &GL, buffer: &WebGlBuffer, position: u32) {
    gl.bind_buffer(GL::ARRAY_BUFFER, Some(buffer));
    gl.enable_vertex_attrib_array(position);
    gl.vertex_attrib_pointer_with_i32(position, 2, GL::FLOAT, false, 0, 0);
    gl.draw_arrays(GL::TRIANGLE_STRIP, 0, 4);
}

/// Matches the drawing buffer to the canvas' displayed size. Returns `true`
/// when the size changed.
pub fn fit_to_display(canvas: &HtmlCanvasElement) -> bool {
    let width = canvas.client_width().max(0) as u32;
    let height = canvas.client_height().max(0) as u32;
    if canvas.width() == width && canvas.height() == height {
        return false;
    }
    canvas.set_width(width);
    canvas.set_height(height);
    true
}

/// `requestAnimationFrame` loop that runs until stopped or dropped.
pub struct AnimationLoop {
    running: Rc<Cell<bool>>,
    frame: Rc<Cell<Option<i32>>>,
    // Holds the frame closure so it can re-request itself.
    callback: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>,
}

impl AnimationLoop {
    /// Starts calling `on_frame` with the frame timestamp (ms) on every
    /// animation frame.
    pub fn start(mut on_frame: impl FnMut(f64) + 'static) -> Result<Self> {
        let running = Rc::new(Cell::new(true));
        let frame = Rc::new(Cell::new(None));
        let callback: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));

        let f = callback.clone();
        let r = running.clone();
        let id = frame.clone();
        *callback.borrow_mut() = Some(Closure::wrap(Box::new(move |timestamp: f64| {
            id.set(None);
            if !r.get() {
                return;
            }
            on_frame(timestamp);

            // schedule next
            if let (Some(window), Some(next)) = (window(), f.borrow().as_ref()) {
                match window.request_animation_frame(next.as_ref().unchecked_ref()) {
                    Ok(handle) => id.set(Some(handle)),
                    Err(e) => log::error!("requestAnimationFrame failed: {e:?}"),
                }
            }
        }) as Box<dyn FnMut(f64)>));

        let window = window().ok_or(TvError::Js("no window".into()))?;
        let handle = window.request_animation_frame(
            callback
                .borrow()
                .as_ref()
                .ok_or(TvError::Js("frame callback missing".into()))?
                .as_ref()
                .unchecked_ref(),
        )?;
        frame.set(Some(handle));

        Ok(Self {
            running,
            frame,
            callback,
        })
    }

    pub fn stop(&self) {
        self.running.set(false);
        if let (Some(handle), Some(window)) = (self.frame.take(), window()) {
            let _ = window.cancel_animation_frame(handle);
        }
    }
}

impl Drop for AnimationLoop {
    fn drop(&mut self) {
        self.stop();
        // Break the closure's reference to itself.
        self.callback.borrow_mut().take();
    }
}

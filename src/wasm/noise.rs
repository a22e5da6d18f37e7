use std::cell::Cell;
use std::rc::Rc;

use rand::rngs::SmallRng;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::render::AnimationLoop;
use crate::config::NoiseConfig;
use crate::error::{Result, TvError};
use crate::noise::generate_frame;

/// VCR tracking noise drawn on its own 2D canvas every animation frame.
pub struct NoiseCanvas {
    intensity: Rc<Cell<f64>>,
    frames: AnimationLoop,
}

impl NoiseCanvas {
    pub fn start(
        canvas: HtmlCanvasElement,
        config: NoiseConfig,
        intensity: f64,
        mut rng: SmallRng,
    ) -> Result<Self> {
        let ctx = canvas
            .get_context("2d")?
            .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
            .ok_or(TvError::ContextUnavailable { kind: "2D" })?;

        let intensity = Rc::new(Cell::new(intensity));
        let level = intensity.clone();
        let mut blur: Option<f64> = None;

        let frames = AnimationLoop::start(move |_| {
            let width = f64::from(canvas.width());
            let height = f64::from(canvas.height());
            ctx.clear_rect(0.0, 0.0, width, height);

            let frame = generate_frame(&config, level.get(), width, height, &mut rng);
            if blur != Some(frame.blur_px) {
                let filter = format!("blur({}px)", frame.blur_px);
                if let Err(e) = canvas.style().set_property("filter", &filter) {
                    log::warn!("noise blur: {e:?}");
                }
                blur = Some(frame.blur_px);
            }
            if frame.dots.is_empty() {
                return;
            }

            ctx.set_fill_style_str("#fff");
            for (x, y) in frame.dots {
                ctx.fill_rect(x, y, 1.0, 1.0);
            }
        })?;

        Ok(Self { intensity, frames })
    }

    /// Picked up on the next frame.
    pub fn set_intensity(&self, intensity: f64) {
        self.intensity.set(intensity.clamp(0.0, 1.0));
    }

    pub fn dispose(&self) {
        self.frames.stop();
    }
}

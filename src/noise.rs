//! VCR tracking-noise frame generation.
//!
//! A frame is a list of 1×1 dots: for every particle, one dot in the lower
//! band and one hugging the top edge, each followed by a short horizontal
//! tail. Drawing is left to the caller so the layout can be checked without a
//! canvas.

use rand::Rng;

use crate::config::NoiseConfig;

/// Per-frame parameters derived from intensity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseParams {
    pub band_start: f64,
    pub particle_count: u32,
    pub blur_px: f64,
}

impl NoiseParams {
    /// `None` when intensity is zero (nothing is drawn).
    pub fn for_intensity(config: &NoiseConfig, intensity: f64) -> Option<Self> {
        let intensity = intensity.clamp(0.0, 1.0);
        if intensity <= 0.0 {
            return None;
        }
        Some(Self {
            band_start: config.band_start.sample(intensity),
            particle_count: config.particle_count.sample(intensity).round().max(1.0) as u32,
            blur_px: config.max_blur_px * intensity,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoiseFrame {
    pub dots: Vec<(f64, f64)>,
    pub blur_px: f64,
}

/// Uniform integer in the closed range spanned by `a` and `b`, whichever is
/// larger.
fn int_between<R: Rng>(rng: &mut R, a: f64, b: f64) -> f64 {
    let lo = a.min(b).ceil() as i64;
    let hi = a.max(b).floor() as i64;
    if hi < lo {
        return lo as f64;
    }
    rng.gen_range(lo..=hi) as f64
}

fn push_tail<R: Rng>(rng: &mut R, dots: &mut Vec<(f64, f64)>, mut x: f64, y: f64, max_tail: u32) {
    let len = rng.gen_range(1..=max_tail.max(1));
    let dir = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
    for _ in 0..len {
        x += dir * f64::from(rng.gen_range(1..=4u8));
        dots.push((x, y));
    }
}

pub fn generate_frame<R: Rng>(
    config: &NoiseConfig,
    intensity: f64,
    width: f64,
    height: f64,
    rng: &mut R,
) -> NoiseFrame {
    let Some(params) = NoiseParams::for_intensity(config, intensity) else {
        return NoiseFrame::default();
    };
    if width < 1.0 || height < 1.0 {
        return NoiseFrame {
            dots: Vec::new(),
            blur_px: params.blur_px,
        };
    }

    let mut dots = Vec::new();
    let mut lower = params.band_start;
    let lower_end = height - config.bottom_margin;
    let mut upper = 1.0;

    for _ in 0..params.particle_count {
        let x = rng.gen_range(0.0..width);
        lower += 3.0;
        upper -= 3.0;
        let y1 = int_between(rng, lower, lower_end);
        let y2 = int_between(rng, 0.0, upper);

        dots.push((x, y1));
        dots.push((x, y2));
        push_tail(rng, &mut dots, x, y1, config.max_tail);
        push_tail(rng, &mut dots, x, y2, config.max_tail);
    }

    NoiseFrame {
        dots,
        blur_px: params.blur_px,
    }
}

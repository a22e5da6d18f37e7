//! Tunables for the TV widget and the static channel list.
//!
//! Defaults are compiled in; a page can override any subset by embedding a
//! `<script type="application/json" id="tv-config">` block.

use serde::Deserialize;

use crate::channel::{ChannelRecord, ChannelRegistry};
use crate::error::{Result, TvError};

/// Channel list shipped with the site.
pub const DEFAULT_CHANNELS: &str = include_str!("../static/channels.json");

/// Piecewise-linear curve through three control points at intensity
/// 0, 0.5 and 1.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Curve {
    pub at_zero: f64,
    pub at_half: f64,
    pub at_one: f64,
}

impl Curve {
    pub fn sample(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        if t <= 0.5 {
            lerp(self.at_zero, self.at_half, t / 0.5)
        } else {
            lerp(self.at_half, self.at_one, (t - 0.5) / 0.5)
        }
    }
}

fn out_of_range(field: &'static str, problem: &'static str) -> Result<()> {
    Err(TvError::OutOfRange { field, problem })
}

pub fn lerp(start: f64, end: f64, amt: f64) -> f64 {
    (1.0 - amt) * start + amt * end
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct KnobConfig {
    pub min_angle: f64,
    pub max_angle: f64,
}

impl Default for KnobConfig {
    fn default() -> Self {
        Self {
            min_angle: -90.0,
            max_angle: 90.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GlitchConfig {
    pub min_delay_ms: u32,
    pub max_delay_ms: u32,
    pub duration_ms: u32,
    /// Intensities at or below this switch glitching off entirely.
    pub off_threshold: f64,
}

impl Default for GlitchConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 200,
            max_delay_ms: 5000,
            duration_ms: 300,
            off_threshold: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Y offset (px) where the lower noise band starts.
    pub band_start: Curve,
    pub particle_count: Curve,
    pub max_blur_px: f64,
    /// Distance (px) from the bottom edge where the lower band stops.
    pub bottom_margin: f64,
    pub max_tail: u32,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            band_start: Curve {
                at_zero: 200.0,
                at_half: 100.0,
                at_one: 10.0,
            },
            particle_count: Curve {
                at_zero: 1.0,
                at_half: 4.0,
                at_one: 40.0,
            },
            max_blur_px: 2.0,
            bottom_margin: 10.0,
            max_tail: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub raster_width: u32,
    pub raster_height: u32,
    pub curvature: f32,
    pub resize_debounce_ms: u32,
    pub label_font: String,
    pub label_color: String,
    pub label_padding: f64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            raster_width: 533,
            raster_height: 395,
            curvature: 0.2,
            resize_debounce_ms: 100,
            label_font: "normal 36px \"VCR\", monospace".into(),
            label_color: "lime".into(),
            label_padding: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TeletextConfig {
    pub page_url: String,
    pub weather_url: String,
}

impl Default for TeletextConfig {
    fn default() -> Self {
        let weather_url = if cfg!(debug_assertions) {
            "weather.json"
        } else {
            "https://website-weather-proxy.chrislhow.workers.dev/"
        };
        Self {
            page_url: "/teletext.html".into(),
            weather_url: weather_url.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TvConfig {
    /// Replaces the shipped channel list when present.
    pub channels: Option<Vec<ChannelRecord>>,
    pub initial_channel: u32,
    pub label_hide_ms: u32,
    pub click_sound: String,
    pub click_volume: f64,
    pub knob: KnobConfig,
    pub glitch: GlitchConfig,
    pub noise: NoiseConfig,
    pub overlay: OverlayConfig,
    pub teletext: TeletextConfig,
}

impl Default for TvConfig {
    fn default() -> Self {
        Self {
            channels: None,
            initial_channel: 1,
            label_hide_ms: 3000,
            click_sound: "/click.mp3".into(),
            click_volume: 0.6,
            knob: KnobConfig::default(),
            glitch: GlitchConfig::default(),
            noise: NoiseConfig::default(),
            overlay: OverlayConfig::default(),
            teletext: TeletextConfig::default(),
        }
    }
}

impl TvConfig {
    /// Parses a (possibly partial) JSON override; missing keys keep their
    /// defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).map_err(TvError::InvalidConfig)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the widget cannot work with: empty or inverted knob
    /// range, inverted glitch delays.
    pub fn validate(&self) -> Result<()> {
        let knob = &self.knob;
        if !knob.min_angle.is_finite() || !knob.max_angle.is_finite() {
            return out_of_range("knob", "angles must be finite");
        }
        if knob.min_angle >= knob.max_angle {
            return out_of_range("knob", "min_angle must be below max_angle");
        }
        if self.glitch.min_delay_ms > self.glitch.max_delay_ms {
            return out_of_range("glitch", "min_delay_ms must not exceed max_delay_ms");
        }
        if !(0.0..=1.0).contains(&self.glitch.off_threshold) {
            return out_of_range("glitch", "off_threshold must be within [0, 1]");
        }
        Ok(())
    }

    pub fn registry(&self) -> Result<ChannelRegistry> {
        match &self.channels {
            Some(records) => ChannelRegistry::from_records(records.clone()),
            None => ChannelRegistry::from_json(DEFAULT_CHANNELS),
        }
    }
}

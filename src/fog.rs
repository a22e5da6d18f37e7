//! Fog background palettes and the scroll-reactive shader clock.

use crate::config::lerp;
use crate::theme::Theme;

pub const DEFAULT_SPEED: f64 = 1.0;
const SPEED_LERP: f64 = 0.05;
const FORWARD_SCROLL_FACTOR: f64 = 0.1;
const BACKWARD_SCROLL_FACTOR: f64 = 0.2;
const MAX_SPEED_CHANGE: f64 = 10.0;

/// Quiet time after the last scroll event before the clock eases back.
pub const SCROLL_SETTLE_MS: u32 = 150;

/// `#rrggbb` (leading `#` optional) → normalized RGB. Malformed input yields
/// black.
pub fn hex_to_rgb(hex: &str) -> [f32; 3] {
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    let value = u32::from_str_radix(hex, 16).unwrap_or(0);
    [
        ((value >> 16) & 0xff) as f32 / 255.0,
        ((value >> 8) & 0xff) as f32 / 255.0,
        (value & 0xff) as f32 / 255.0,
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub base: &'static str,
    pub lowlight: &'static str,
    pub midtone: &'static str,
    pub highlight: &'static str,
}

pub const LIGHT_PALETTE: Palette = Palette {
    base: "#6495ED",
    lowlight: "#778899",
    midtone: "#E6E6FA",
    highlight: "#F0F8FF",
};

pub const DARK_PALETTE: Palette = Palette {
    base: "#1c2541",
    lowlight: "#3a506b",
    midtone: "#6c757d",
    highlight: "#8d99ae",
};

impl Palette {
    /// `(uniform name, rgb)` for each colour.
    pub fn uniforms(&self) -> [(&'static str, [f32; 3]); 4] {
        [
            ("u_baseColor", hex_to_rgb(self.base)),
            ("u_lowlightColor", hex_to_rgb(self.lowlight)),
            ("u_midtoneColor", hex_to_rgb(self.midtone)),
            ("u_highlightColor", hex_to_rgb(self.highlight)),
        ]
    }
}

pub fn palette_for(theme: Theme, os_prefers_dark: bool) -> Palette {
    match theme {
        Theme::Light => LIGHT_PALETTE,
        Theme::Dark => DARK_PALETTE,
        Theme::Auto | Theme::Darkest if os_prefers_dark => DARK_PALETTE,
        Theme::Auto | Theme::Darkest => LIGHT_PALETTE,
    }
}

/// Shader time that runs faster while the page scrolls.
#[derive(Debug, Clone)]
pub struct FogClock {
    current_speed: f64,
    target_speed: f64,
    time: f64,
    last_timestamp: Option<f64>,
}

impl Default for FogClock {
    fn default() -> Self {
        Self {
            current_speed: DEFAULT_SPEED,
            target_speed: DEFAULT_SPEED,
            time: 0.0,
            last_timestamp: None,
        }
    }
}

impl FogClock {
    pub fn target_speed(&self) -> f64 {
        self.target_speed
    }

    pub fn current_speed(&self) -> f64 {
        self.current_speed
    }

    /// `delta_y` is the scroll distance since the previous event; scrolling
    /// back up pushes harder than scrolling down.
    pub fn on_scroll(&mut self, delta_y: f64) {
        let factor = if delta_y < 0.0 {
            BACKWARD_SCROLL_FACTOR
        } else {
            FORWARD_SCROLL_FACTOR
        };
        let change = if delta_y == 0.0 {
            0.0
        } else {
            delta_y.signum() * (delta_y.abs() * factor).min(MAX_SPEED_CHANGE)
        };
        self.target_speed = DEFAULT_SPEED + change;
    }

    pub fn settle(&mut self) {
        self.target_speed = DEFAULT_SPEED;
    }

    /// Advances to an animation-frame timestamp (ms) and returns the new
    /// shader time in seconds.
    pub fn tick(&mut self, timestamp_ms: f64) -> f64 {
        let last = self.last_timestamp.replace(timestamp_ms).unwrap_or(timestamp_ms);
        let dt = (timestamp_ms - last) / 1000.0;
        self.current_speed = lerp(self.current_speed, self.target_speed, SPEED_LERP);
        self.time += self.current_speed * dt;
        self.time
    }
}

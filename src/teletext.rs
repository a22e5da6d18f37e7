//! Teletext page content: weather report parsing and the SVG wrapper that
//! lets an HTML fragment be rasterised onto a canvas.

use serde::Deserialize;

use crate::error::{Result, TvError};

/// Shown in place of the page when loading fails.
pub const ERROR_PAGE: &str = r#"<p style="color: red;">Error loading content.</p>"#;

/// Stylesheet inlined into every SVG document.
pub const TELETEXT_CSS: &str = include_str!("../static/teletext.css");

const COMPASS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// 16-point compass direction for a bearing in degrees.
pub fn cardinal_direction(degrees: f64) -> &'static str {
    let sector = (degrees.rem_euclid(360.0) / 22.5).round() as usize;
    COMPASS[sector % COMPASS.len()]
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentConditions {
    #[serde(default)]
    pub conditions: Option<String>,
    #[serde(default)]
    pub temp: Option<f64>,
    #[serde(default)]
    pub precipprob: Option<f64>,
    #[serde(default)]
    pub windspeed: Option<f64>,
    #[serde(default)]
    pub winddir: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub uvindex: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherReport {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(rename = "currentConditions", default)]
    pub current_conditions: Option<CurrentConditions>,
}

impl WeatherReport {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(TvError::Weather)
    }

    /// `(class name, text)` pairs for the page's weather slots. Missing
    /// values are left out so the page keeps its placeholder text.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let Some(now) = &self.current_conditions else {
            return Vec::new();
        };
        let number = |key: &'static str, value: Option<f64>| value.map(|v| (key, v.to_string()));
        [
            now.conditions.clone().map(|c| ("conditions", c)),
            number("temp", now.temp),
            number("precipprob", now.precipprob),
            number("windspeed", now.windspeed),
            now.winddir
                .map(|d| ("winddir", cardinal_direction(d).to_string())),
            number("humidity", now.humidity),
            number("uvindex", now.uvindex),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// Wraps `html` in a standalone SVG document of the given pixel size.
pub fn svg_document(html: &str, css: &str, width: u32, height: u32) -> String {
    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}">"#,
            "<style><![CDATA[\n{css}\n]]></style>",
            r#"<foreignObject width="100%" height="100%">"#,
            r#"<div xmlns="http://www.w3.org/1999/xhtml" style="width: {w}px; height: {h}px;">"#,
            "{html}",
            "</div></foreignObject></svg>"
        ),
        w = width,
        h = height,
        css = css,
        html = html,
    )
}

#![cfg_attr(target_arch = "wasm32", allow(dead_code))]

//! Retro TV widget for the portfolio page: channel switching, VCR noise,
//! glitch cadence, CRT overlays, fog background and theme switching.
//!
//! The state machines are plain Rust and build on any target; the browser
//! glue under `wasm` only compiles for wasm32.

pub mod channel;
pub mod config;
pub mod error;
pub mod fog;
pub mod glitch;
pub mod knob;
pub mod noise;
pub mod overlay;
pub mod scramble;
pub mod teletext;
pub mod theme;
pub mod timer;

pub use error::{Result, TvError};

// Only compile wasm-specific code when targeting wasm32.

#[cfg(target_arch = "wasm32")]
mod wasm {
    use std::cell::RefCell;
    use std::rc::Rc;

    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;

    mod audio;
    mod crt;
    mod dom;
    mod fog;
    mod knob;
    mod noise;
    mod render;
    mod teletext;
    mod text_glitch;
    mod theme;
    mod timers;
    mod tv;

    use crate::config::TvConfig;

    thread_local! {
        static APP: RefCell<Option<App>> = const { RefCell::new(None) };
    }

    /// Everything the page keeps alive.
    struct App {
        timers: Rc<timers::WindowTimers>,
        theme: theme::ThemeSwitcher,
        fog: Option<fog::FogBackground>,
        tv: tv::Tv,
        headlines: text_glitch::TextGlitch,
    }

    impl App {
        fn dispose(self) {
            self.tv.dispose();
            self.headlines.dispose();
            if let Some(fog) = self.fog {
                fog.dispose();
            }
            self.theme.dispose();
            self.timers.cancel_all();
        }
    }

    /// Fresh generator seeded from `Math.random`.
    fn rng() -> SmallRng {
        SmallRng::seed_from_u64((js_sys::Math::random() * u64::MAX as f64) as u64)
    }

    #[wasm_bindgen(start)]
    pub fn main() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).ok();

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        let config = load_config(&document)?;
        let timers = Rc::new(timers::WindowTimers::new(window));

        let theme = theme::ThemeSwitcher::install(&document)?;

        // The background is decoration only; the page works without it.
        let fog = match dom::optional::<web_sys::HtmlCanvasElement>(&document, "#fog-canvas")? {
            Some(canvas) => match fog::FogBackground::start(canvas, theme.current(), timers.clone()) {
                Ok(fog) => Some(fog),
                Err(e) => {
                    log::error!("fog background disabled: {e}");
                    None
                }
            },
            None => None,
        };

        let tv = tv::Tv::mount(&document, config, timers.clone())?;
        let headlines =
            text_glitch::TextGlitch::observe(&document, ".glitch-text", timers.clone(), rng())?;

        APP.with(|app| {
            *app.borrow_mut() = Some(App {
                timers,
                theme,
                fog,
                tv,
                headlines,
            })
        });
        log::info!("tv ready");
        Ok(())
    }

    /// Tears the widget down: cancels timers and animation loops and detaches
    /// every listener.
    #[wasm_bindgen]
    pub fn dispose() {
        if let Some(app) = APP.with(|app| app.borrow_mut().take()) {
            app.dispose();
        }
    }

    #[wasm_bindgen(js_name = currentChannel)]
    pub fn current_channel() -> Option<u32> {
        APP.with(|app| app.borrow().as_ref().map(|app| app.tv.current_channel()))
    }

    /// Effect intensity in `[0, 1]` as set by the knob.
    #[wasm_bindgen]
    pub fn intensity() -> Option<f64> {
        APP.with(|app| app.borrow().as_ref().map(|app| app.tv.intensity()))
    }

    fn load_config(document: &web_sys::Document) -> Result<TvConfig, JsValue> {
        match document.get_element_by_id("tv-config") {
            Some(script) => {
                let text = script.text_content().unwrap_or_default();
                Ok(TvConfig::from_json(&text)?)
            }
            None => Ok(TvConfig::default()),
        }
    }

    impl From<crate::TvError> for JsValue {
        fn from(err: crate::TvError) -> Self {
            js_sys::Error::new(&err.to_string()).into()
        }
    }

    impl From<JsValue> for crate::TvError {
        fn from(value: JsValue) -> Self {
            let message = value
                .dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
                .or_else(|| value.as_string())
                .unwrap_or_else(|| format!("{value:?}"));
            crate::TvError::Js(message)
        }
    }
}

use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::HtmlAudioElement;

use crate::error::Result;

/// Button click, rewound on every press so rapid presses each sound.
pub struct ClickSound {
    audio: HtmlAudioElement,
}

impl ClickSound {
    pub fn new(src: &str, volume: f64) -> Result<Self> {
        let audio = HtmlAudioElement::new_with_src(src)?;
        audio.set_preload("auto");
        audio.set_volume(volume.clamp(0.0, 1.0));
        Ok(Self { audio })
    }

    /// Best effort: autoplay policies may reject the first plays.
    pub fn play(&self) {
        self.audio.set_current_time(0.0);
        match self.audio.play() {
            Ok(promise) => spawn_local(async move {
                if let Err(e) = JsFuture::from(promise).await {
                    log::warn!("click sound: {e:?}");
                }
            }),
            Err(e) => log::warn!("click sound: {e:?}"),
        }
    }

    pub fn dispose(&self) {
        let _ = self.audio.pause();
        self.audio.set_src("");
    }
}

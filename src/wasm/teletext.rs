//! Fills the teletext holder with the remote page and current weather.

use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlElement, Response, XmlSerializer};

use crate::config::TeletextConfig;
use crate::error::{Result, TvError};
use crate::overlay::OverlayContent;
use crate::teletext::{WeatherReport, ERROR_PAGE};

async fn fetch_text(url: &str) -> Result<String> {
    let window = web_sys::window().ok_or(TvError::Js("no window".into()))?;
    let response: Response = JsFuture::from(window.fetch_with_str(url))
        .await?
        .dyn_into()?;
    if !response.ok() {
        return Err(TvError::HttpStatus {
            url: url.to_string(),
            status: response.status(),
        });
    }
    JsFuture::from(response.text()?)
        .await?
        .as_string()
        .ok_or_else(|| TvError::Js(format!("{url}: body is not text")))
}

fn set_text(holder: &HtmlElement, class: &str, text: &str) -> Result<()> {
    if let Some(slot) = holder.query_selector(&format!(".{class}"))? {
        slot.set_text_content(Some(text));
    }
    Ok(())
}

/// e.g. "07 Mar"
fn today() -> Result<String> {
    let options = js_sys::Object::new();
    js_sys::Reflect::set(&options, &"month".into(), &"short".into())?;
    js_sys::Reflect::set(&options, &"day".into(), &"2-digit".into())?;
    Ok(js_sys::Date::new_0()
        .to_locale_date_string("en-GB", &options)
        .into())
}

/// The holder's children as XHTML, which is what a `foreignObject` needs.
fn serialize_children(holder: &HtmlElement) -> Result<String> {
    let serializer = XmlSerializer::new()?;
    let nodes = holder.child_nodes();
    let mut markup = String::new();
    for node in (0..nodes.length()).filter_map(|i| nodes.item(i)) {
        markup.push_str(&serializer.serialize_to_string(&node)?);
    }
    Ok(markup)
}

async fn fill(holder: &HtmlElement, config: &TeletextConfig) -> Result<String> {
    holder.set_inner_html(&fetch_text(&config.page_url).await?);
    set_text(holder, "date", &today()?)?;

    let weather = WeatherReport::from_json(&fetch_text(&config.weather_url).await?)?;
    if let Some(city) = &weather.city {
        set_text(holder, "city", city)?;
    }
    for (class, text) in weather.fields() {
        set_text(holder, class, &text)?;
    }
    serialize_children(holder)
}

/// Loads the page into `holder`. Never fails: any error leaves the error
/// page in both the holder and the returned content.
pub async fn load(holder: &HtmlElement, config: &TeletextConfig) -> OverlayContent {
    match fill(holder, config).await {
        Ok(markup) => OverlayContent::Html(markup),
        Err(e) => {
            log::error!("teletext: {e}");
            holder.set_inner_html(ERROR_PAGE);
            OverlayContent::Html(ERROR_PAGE.to_string())
        }
    }
}

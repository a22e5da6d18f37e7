//! Element lookup and listener lifetimes.

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, EventTarget};

use crate::error::{Result, TvError};

fn cast<T: JsCast>(element: Element, selector: &str) -> Result<T> {
    element
        .dyn_into::<T>()
        .map_err(|_| TvError::WrongElementType {
            selector: selector.to_string(),
            expected: std::any::type_name::<T>().rsplit("::").next().unwrap_or("element"),
        })
}

/// First element matching `selector`; its absence is fatal.
pub fn require<T: JsCast>(document: &Document, selector: &str) -> Result<T> {
    let element = document
        .query_selector(selector)?
        .ok_or_else(|| TvError::MissingElement {
            selector: selector.to_string(),
        })?;
    cast(element, selector)
}

pub fn optional<T: JsCast>(document: &Document, selector: &str) -> Result<Option<T>> {
    document
        .query_selector(selector)?
        .map(|element| cast(element, selector))
        .transpose()
}

/// Every element matching `selector`, possibly none.
pub fn all<T: JsCast>(document: &Document, selector: &str) -> Result<Vec<T>> {
    let nodes = document.query_selector_all(selector)?;
    (0..nodes.length())
        .filter_map(|i| nodes.item(i))
        .map(|node| {
            node.dyn_into::<T>()
                .map_err(|_| TvError::WrongElementType {
                    selector: selector.to_string(),
                    expected: "matching element",
                })
        })
        .collect()
}

/// `data-channel` of `element`, if it parses.
pub fn channel_of(element: &Element) -> Option<u32> {
    element.get_attribute("data-channel")?.trim().parse().ok()
}

fn wrap<E, F>(mut handler: F) -> Closure<dyn FnMut(web_sys::Event)>
where
    E: JsCast + 'static,
    F: FnMut(E) + 'static,
{
    Closure::wrap(Box::new(move |event: web_sys::Event| {
        if let Ok(event) = event.dyn_into::<E>() {
            handler(event);
        }
    }) as Box<dyn FnMut(web_sys::Event)>)
}

/// An event listener that is detached when dropped.
pub struct Listener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(web_sys::Event)>,
}

impl Listener {
    pub fn new<E, F>(target: &EventTarget, event: &'static str, handler: F) -> Result<Self>
    where
        E: JsCast + 'static,
        F: FnMut(E) + 'static,
    {
        let callback = wrap(handler);
        target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())?;
        Ok(Self {
            target: target.clone(),
            event,
            callback,
        })
    }

    /// Like [`Listener::new`] but registered as non-passive so the handler
    /// may call `prevent_default` on touch events.
    pub fn active<E, F>(target: &EventTarget, event: &'static str, handler: F) -> Result<Self>
    where
        E: JsCast + 'static,
        F: FnMut(E) + 'static,
    {
        let callback = wrap(handler);
        let options = web_sys::AddEventListenerOptions::new();
        options.set_passive(false);
        target.add_event_listener_with_callback_and_add_event_listener_options(
            event,
            callback.as_ref().unchecked_ref(),
            &options,
        )?;
        Ok(Self {
            target: target.clone(),
            event,
            callback,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
    }
}

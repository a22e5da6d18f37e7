use std::cell::RefCell;
use std::rc::{Rc, Weak};

use rand::rngs::SmallRng;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit};

use super::dom;
use crate::error::Result;
use crate::scramble::{scramble, SCRAMBLE_DURATION_MS, SCRAMBLE_INTENSITY, SCRAMBLE_STEP_MS};
use crate::timer::{cancel_slot, TaskHandle, Timers};

const DONE_CLASS: &str = "done-glitching";

struct Headline {
    element: Element,
    /// Text to restore while a scramble is running.
    original: Option<String>,
    elapsed_ms: u32,
    step: Option<TaskHandle>,
}

struct Headlines {
    items: Vec<Headline>,
    rng: SmallRng,
    timers: Rc<dyn Timers>,
    this: Weak<RefCell<Headlines>>,
}

impl Headlines {
    fn index_of(&self, element: &Element) -> Option<usize> {
        self.items.iter().position(|h| &h.element == element)
    }

    fn start(&mut self, index: usize) {
        let headline = &mut self.items[index];
        if headline.step.is_some() {
            return;
        }
        headline.original = Some(headline.element.text_content().unwrap_or_default());
        headline.elapsed_ms = 0;
        self.schedule_step(index);
    }

    fn schedule_step(&mut self, index: usize) {
        let this = self.this.clone();
        let handle = self.timers.schedule(
            SCRAMBLE_STEP_MS,
            Box::new(move || {
                if let Some(headlines) = this.upgrade() {
                    headlines.borrow_mut().step(index);
                }
            }),
        );
        self.items[index].step = Some(handle);
    }

    fn step(&mut self, index: usize) {
        let headline = &mut self.items[index];
        headline.step = None;
        headline.elapsed_ms += SCRAMBLE_STEP_MS;
        let Some(original) = headline.original.clone() else {
            return;
        };

        if headline.elapsed_ms >= SCRAMBLE_DURATION_MS {
            headline.element.set_text_content(Some(&original));
            headline.original = None;
            let _ = headline.element.class_list().add_1(DONE_CLASS);
            return;
        }
        let scrambled = scramble(&original, SCRAMBLE_INTENSITY, &mut self.rng);
        self.items[index].element.set_text_content(Some(&scrambled));
        self.schedule_step(index);
    }

    /// Stops any running scramble and restores the text at once.
    fn reset(&mut self, index: usize) {
        let timers = self.timers.clone();
        let headline = &mut self.items[index];
        cancel_slot(timers.as_ref(), &mut headline.step);
        if let Some(original) = headline.original.take() {
            headline.element.set_text_content(Some(&original));
        }
        let _ = headline.element.class_list().remove_1(DONE_CLASS);
    }

    fn on_entry(&mut self, entry: &IntersectionObserverEntry) {
        let Some(index) = self.index_of(&entry.target()) else {
            return;
        };
        if entry.is_intersecting() {
            self.start(index);
        } else {
            self.reset(index);
        }
    }
}

/// Scrambles headline text into digits for a moment whenever it scrolls
/// into view.
pub struct TextGlitch {
    state: Rc<RefCell<Headlines>>,
    observer: IntersectionObserver,
    _callback: Closure<dyn FnMut(js_sys::Array, JsValue)>,
}

impl TextGlitch {
    pub fn observe(
        document: &Document,
        selector: &str,
        timers: Rc<dyn Timers>,
        rng: SmallRng,
    ) -> Result<Self> {
        let elements: Vec<Element> = dom::all(document, selector)?;
        let state = Rc::new_cyclic(|this| {
            RefCell::new(Headlines {
                items: elements
                    .iter()
                    .cloned()
                    .map(|element| Headline {
                        element,
                        original: None,
                        elapsed_ms: 0,
                        step: None,
                    })
                    .collect(),
                rng,
                timers,
                this: this.clone(),
            })
        });

        let s = state.clone();
        let callback = Closure::wrap(Box::new(move |entries: js_sys::Array, _: JsValue| {
            let mut headlines = s.borrow_mut();
            for entry in entries.iter() {
                if let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() {
                    headlines.on_entry(&entry);
                }
            }
        }) as Box<dyn FnMut(js_sys::Array, JsValue)>);

        let options = IntersectionObserverInit::new();
        options.set_root_margin("0px");
        options.set_threshold(&JsValue::from(0.1));
        let observer =
            IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &options)?;
        for element in &elements {
            observer.observe(element);
        }

        Ok(Self {
            state,
            observer,
            _callback: callback,
        })
    }

    pub fn dispose(self) {
        self.observer.disconnect();
        let mut headlines = self.state.borrow_mut();
        for index in 0..headlines.items.len() {
            headlines.reset(index);
        }
    }
}

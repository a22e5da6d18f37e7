use std::cell::RefCell;
use std::rc::Rc;

use web_sys::{Document, HtmlElement, MouseEvent, TouchEvent};

use super::dom::Listener;
use crate::config::KnobConfig;
use crate::error::Result;
use crate::knob::{pointer_angle, IntensitySource};

/// Rotary control bound to the knob element. Drags start on the knob and
/// are tracked on the whole document.
pub struct Knob {
    source: Rc<RefCell<IntensitySource>>,
    _listeners: Vec<Listener>,
}

fn angle_at(element: &HtmlElement, x: i32, y: i32) -> f64 {
    let rect = element.get_bounding_client_rect();
    let center = (
        rect.left() + rect.width() / 2.0,
        rect.top() + rect.height() / 2.0,
    );
    pointer_angle(center, (f64::from(x), f64::from(y)))
}

fn touch_angle(element: &HtmlElement, event: &TouchEvent) -> Option<f64> {
    let touch = event.touches().get(0)?;
    Some(angle_at(element, touch.client_x(), touch.client_y()))
}

fn rotate(element: &HtmlElement, angle: f64) {
    let transform = format!("rotate({angle}deg)");
    if let Err(e) = element.style().set_property("transform", &transform) {
        log::warn!("knob rotate: {e:?}");
    }
}

impl Knob {
    /// `on_change` receives the normalized intensity after every drag step.
    pub fn attach(
        document: &Document,
        element: HtmlElement,
        config: &KnobConfig,
        on_change: impl Fn(f64) + 'static,
    ) -> Result<Self> {
        let source = Rc::new(RefCell::new(IntensitySource::new(config)));
        rotate(&element, source.borrow().angle());

        let on_change: Rc<dyn Fn(f64)> = Rc::new(on_change);
        let drag = {
            let source = source.clone();
            let element = element.clone();
            move |pointer: f64| {
                let step = {
                    let mut source = source.borrow_mut();
                    source
                        .drag_to(pointer)
                        .map(|angle| (angle, source.normalized_intensity()))
                };
                if let Some((angle, intensity)) = step {
                    rotate(&element, angle);
                    on_change(intensity);
                }
            }
        };
        let drag = Rc::new(drag);

        let mut listeners = Vec::with_capacity(6);

        let (s, el) = (source.clone(), element.clone());
        listeners.push(Listener::new(&element, "mousedown", move |e: MouseEvent| {
            e.prevent_default();
            s.borrow_mut().begin_drag(angle_at(&el, e.client_x(), e.client_y()));
        })?);

        let (s, el, d) = (source.clone(), element.clone(), drag.clone());
        listeners.push(Listener::new(document, "mousemove", move |e: MouseEvent| {
            if s.borrow().is_dragging() {
                d(angle_at(&el, e.client_x(), e.client_y()));
            }
        })?);

        let s = source.clone();
        listeners.push(Listener::new(document, "mouseup", move |_: MouseEvent| {
            s.borrow_mut().end_drag();
        })?);

        let (s, el) = (source.clone(), element.clone());
        listeners.push(Listener::active(&element, "touchstart", move |e: TouchEvent| {
            e.prevent_default();
            if let Some(angle) = touch_angle(&el, &e) {
                s.borrow_mut().begin_drag(angle);
            }
        })?);

        let (s, el, d) = (source.clone(), element.clone(), drag);
        listeners.push(Listener::active(document, "touchmove", move |e: TouchEvent| {
            if !s.borrow().is_dragging() {
                return;
            }
            e.prevent_default();
            if let Some(angle) = touch_angle(&el, &e) {
                d(angle);
            }
        })?);

        let s = source.clone();
        listeners.push(Listener::new(document, "touchend", move |_: TouchEvent| {
            s.borrow_mut().end_drag();
        })?);

        Ok(Self {
            source,
            _listeners: listeners,
        })
    }

    pub fn normalized_intensity(&self) -> f64 {
        self.source.borrow().normalized_intensity()
    }
}

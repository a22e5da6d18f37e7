use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{
    CustomEvent, CustomEventInit, Document, Element, HtmlElement, HtmlImageElement, MouseEvent,
    Node, Storage, TouchEvent,
};

use super::dom::Listener;
use crate::error::{Result, TvError};
use crate::theme::{Theme, THEME_CHANGED_EVENT, THEME_KEY};

fn create<T: JsCast>(document: &Document, tag: &str) -> Result<T> {
    Ok(document.create_element(tag)?.unchecked_into())
}

fn icon(document: &Document, theme: Theme) -> Result<HtmlElement> {
    let img: HtmlImageElement = create(document, "img")?;
    img.set_src(&theme.icon());
    img.set_alt(&format!("{} theme", theme.label()));
    img.class_list().add_1(&format!("icon-{}", theme.as_str()))?;
    Ok(img.into())
}

fn set_cursor(root: &HtmlElement, x: i32, y: i32) {
    let style = root.style();
    let result = style
        .set_property("--cursorX", &format!("{x}px"))
        .and_then(|_| style.set_property("--cursorY", &format!("{y}px")));
    if let Err(e) = result {
        log::warn!("cursor position: {e:?}");
    }
}

/// Mirrors the pointer into `--cursorX/--cursorY`, at most once per
/// animation frame.
struct Cursor {
    frame: Rc<Cell<Option<i32>>>,
    _listeners: Vec<Listener>,
}

impl Cursor {
    fn track(document: &Document, root: &HtmlElement) -> Result<Self> {
        let position = Rc::new(Cell::new((0, 0)));
        let frame: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));

        let queue = {
            let (root, position, frame) = (root.clone(), position.clone(), frame.clone());
            Rc::new(move |x: i32, y: i32| {
                position.set((x, y));
                if frame.get().is_some() {
                    return;
                }
                let Some(window) = web_sys::window() else {
                    return;
                };
                let (root, position, pending) = (root.clone(), position.clone(), frame.clone());
                let update = Closure::once_into_js(move || {
                    pending.set(None);
                    let (x, y) = position.get();
                    set_cursor(&root, x, y);
                });
                match window.request_animation_frame(update.unchecked_ref()) {
                    Ok(id) => frame.set(Some(id)),
                    Err(e) => log::warn!("requestAnimationFrame failed: {e:?}"),
                }
            })
        };

        let on_mouse = queue.clone();
        let on_touch = queue;
        let listeners = vec![
            Listener::new(document, "mousemove", move |e: MouseEvent| {
                on_mouse(e.client_x(), e.client_y())
            })?,
            Listener::new(document, "touchmove", move |e: TouchEvent| {
                if let Some(touch) = e.touches().get(0) {
                    on_touch(touch.client_x(), touch.client_y());
                }
            })?,
        ];
        Ok(Self {
            frame,
            _listeners: listeners,
        })
    }
}

impl Drop for Cursor {
    fn drop(&mut self) {
        if let (Some(id), Some(window)) = (self.frame.take(), web_sys::window()) {
            let _ = window.cancel_animation_frame(id);
        }
    }
}

struct Switcher {
    document: Document,
    root: HtmlElement,
    storage: Option<Storage>,
    icons: Vec<(Theme, HtmlElement)>,
    current: Theme,
    cursor: Option<Cursor>,
}

impl Switcher {
    fn persist(&self, theme: Theme) {
        let Some(storage) = &self.storage else {
            return;
        };
        let result = if theme.is_persisted() {
            storage.set_item(THEME_KEY, theme.as_str())
        } else {
            storage.remove_item(THEME_KEY)
        };
        if let Err(e) = result {
            log::warn!("theme preference not saved: {e:?}");
        }
    }

    fn set(&mut self, theme: Theme) -> Result<()> {
        self.current = theme;
        if theme.is_persisted() {
            self.root.set_attribute("data-theme", theme.as_str())?;
        } else {
            self.root.remove_attribute("data-theme")?;
        }
        self.persist(theme);

        for (candidate, icon) in &self.icons {
            let display = if *candidate == theme { "inline-block" } else { "none" };
            icon.style().set_property("display", display)?;
        }

        if theme == Theme::Darkest {
            if self.cursor.is_none() {
                self.cursor = Some(Cursor::track(&self.document, &self.root)?);
            }
        } else {
            self.cursor = None;
        }
        Ok(())
    }
}

fn announce(document: &Document, theme: Theme) -> Result<()> {
    let detail = js_sys::Object::new();
    js_sys::Reflect::set(&detail, &"theme".into(), &theme.as_str().into())?;
    let init = CustomEventInit::new();
    init.set_detail(&detail);
    let event = CustomEvent::new_with_event_init_dict(THEME_CHANGED_EVENT, &init)?;
    document.dispatch_event(&event)?;
    Ok(())
}

fn apply(state: &Rc<RefCell<Switcher>>, theme: Theme) {
    let document = {
        let mut switcher = state.borrow_mut();
        if let Err(e) = switcher.set(theme) {
            log::warn!("theme {theme}: {e}");
        }
        switcher.document.clone()
    };
    // Listeners may look at the switcher, so the borrow is released first.
    if let Err(e) = announce(&document, theme) {
        log::warn!("{THEME_CHANGED_EVENT}: {e}");
    }
}

/// Theme toggle button and menu.
pub struct ThemeSwitcher {
    state: Rc<RefCell<Switcher>>,
    container: Element,
    _listeners: Vec<Listener>,
}

impl ThemeSwitcher {
    /// Builds the switcher, appends it to `<body>` and applies the stored
    /// preference.
    pub fn install(document: &Document) -> Result<Self> {
        let body = document.body().ok_or_else(|| TvError::MissingElement {
            selector: "body".into(),
        })?;
        let root: HtmlElement = document
            .document_element()
            .and_then(|root| root.dyn_into().ok())
            .ok_or_else(|| TvError::MissingElement {
                selector: "html".into(),
            })?;

        let container = document.create_element("div")?;
        container.set_id("theme-switcher");

        let toggle: HtmlElement = create(document, "button")?;
        toggle.set_id("theme-toggle-button");
        toggle.set_attribute("aria-label", "Toggle theme")?;
        toggle.set_title("Change theme");
        let mut icons = Vec::with_capacity(Theme::ALL.len());
        for theme in Theme::ALL {
            let img = icon(document, theme)?;
            toggle.append_child(&img)?;
            icons.push((theme, img));
        }

        let menu: HtmlElement = create(document, "div")?;
        menu.set_id("theme-menu");
        menu.class_list().add_1("hidden")?;
        for theme in Theme::ALL {
            let button = document.create_element("button")?;
            button.set_attribute("data-theme", theme.as_str())?;
            button.append_child(&icon(document, theme)?)?;
            button.append_child(&document.create_text_node(&format!(" {}", theme.label())))?;
            menu.append_child(&button)?;
        }

        container.append_child(&toggle)?;
        container.append_child(&menu)?;
        body.append_child(&container)?;

        let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten());
        let stored = storage
            .as_ref()
            .and_then(|s| s.get_item(THEME_KEY).ok().flatten());

        let state = Rc::new(RefCell::new(Switcher {
            document: document.clone(),
            root,
            storage,
            icons,
            current: Theme::Auto,
            cursor: None,
        }));
        apply(&state, Theme::from_stored(stored.as_deref()));

        let mut listeners = Vec::with_capacity(3);

        let m = menu.clone();
        listeners.push(Listener::new(&toggle, "click", move |_: MouseEvent| {
            let _ = m.class_list().toggle("hidden");
        })?);

        let (m, s) = (menu.clone(), state.clone());
        listeners.push(Listener::new(&menu, "click", move |e: MouseEvent| {
            let Some(button) = e
                .target()
                .and_then(|t| t.dyn_into::<Element>().ok())
                .and_then(|t| t.closest("button[data-theme]").ok().flatten())
            else {
                return;
            };
            let choice = button.get_attribute("data-theme").unwrap_or_default();
            match choice.parse::<Theme>() {
                Ok(theme) => {
                    apply(&s, theme);
                    let _ = m.class_list().add_1("hidden");
                    if theme == Theme::Darkest {
                        set_cursor(&s.borrow().root, e.client_x(), e.client_y());
                    }
                }
                Err(e) => log::warn!("{e}"),
            }
        })?);

        let (t, m) = (toggle.clone(), menu.clone());
        listeners.push(Listener::new(document, "click", move |e: MouseEvent| {
            if m.class_list().contains("hidden") {
                return;
            }
            let target = e.target().and_then(|t| t.dyn_into::<Node>().ok());
            if !t.contains(target.as_ref()) && !m.contains(target.as_ref()) {
                let _ = m.class_list().add_1("hidden");
            }
        })?);

        Ok(Self {
            state,
            container,
            _listeners: listeners,
        })
    }

    pub fn current(&self) -> Theme {
        self.state.borrow().current
    }

    pub fn dispose(self) {
        self.state.borrow_mut().cursor = None;
        self.container.remove();
    }
}

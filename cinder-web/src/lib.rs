//! A client-side web integration for `cinder`: renders components into the DOM with
//! `web-sys` and runs their state updates on the browser's event loop.

use std::collections::VecDeque;
use std::fmt;

use cinder::renderer::{NativeHandle, Renderer, Scheduler};
use cinder::shared::Shared;
use cinder::view::Listener;
use cinder::{Component, Root};
use gloo_events::EventListener;
use log::{debug, error};
use rustc_hash::FxHashMap;
use wasm_bindgen::{JsCast, JsValue};

/// Reasons mounting into the current document can fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountError {
    /// There is no global `window`, e.g. outside of a browser main thread.
    NoWindow,
    /// The window has no `document`.
    NoDocument,
    /// No element with the given id exists in the document.
    MissingElement(String),
}

impl fmt::Display for MountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MountError::NoWindow => write!(f, "no global `window` exists"),
            MountError::NoDocument => write!(f, "the window has no `document`"),
            MountError::MissingElement(id) => write!(f, "no element with id `{}` in the document", id),
        }
    }
}

impl std::error::Error for MountError {}

impl From<MountError> for JsValue {
    fn from(err: MountError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

/// Renders `component` as the only child of `element`, replacing its current children.
/// Dropping the returned root leaves the DOM in place but detaches all state; call
/// [`Root::unmount`] to tear it down.
pub fn mount<C: Component>(element: &web_sys::Element, component: C) -> Result<Root<C>, MountError> {
    let renderer = WebRenderer::new()?;
    let scheduler = WebScheduler::new(renderer.window.clone());
    let handle: NativeHandle = Box::new(WebNativeHandle::new(element.clone().into()));
    Ok(Root::new(handle, component, renderer, scheduler))
}

/// Renders `component` into the element with the given `id` for the rest of the page's lifetime.
pub fn mount_to_element_id<C: Component>(id: &str, component: C) -> Result<(), MountError> {
    let document = web_sys::window()
        .ok_or(MountError::NoWindow)?
        .document()
        .ok_or(MountError::NoDocument)?;
    let element = document
        .get_element_by_id(id)
        .ok_or_else(|| MountError::MissingElement(id.to_owned()))?;
    let root = mount(&element, component)?;
    debug!("cinder-web: mounted into #{}", id);

    // The page owns the root from here on.
    Box::leak(Box::new(root));
    Ok(())
}

struct WebNativeHandle {
    node: web_sys::Node,
    listeners: Shared<FxHashMap<&'static str, EventListener>>,
}

impl WebNativeHandle {
    fn new(node: web_sys::Node) -> Self {
        Self {
            node,
            listeners: Shared::default(),
        }
    }
}

fn web_handle(handle: &NativeHandle) -> &WebNativeHandle {
    handle
        .downcast_ref::<WebNativeHandle>()
        .expect("WebRenderer: handle was not created by a WebRenderer")
}

fn element(handle: &NativeHandle) -> Option<&web_sys::Element> {
    let element = web_handle(handle).node.dyn_ref::<web_sys::Element>();
    if element.is_none() {
        error!("WebRenderer: expected an element node");
    }
    element
}

fn log_failure(op: &str, result: Result<impl Sized, JsValue>) {
    if let Err(err) = result {
        error!("WebRenderer: {} failed: {:?}", op, err);
    }
}

/// A [`Renderer`] manipulating the DOM of the current document.
pub struct WebRenderer {
    window: web_sys::Window,
    document: web_sys::Document,
}

impl WebRenderer {
    pub fn new() -> Result<Self, MountError> {
        let window = web_sys::window().ok_or(MountError::NoWindow)?;
        let document = window.document().ok_or(MountError::NoDocument)?;
        Ok(Self { window, document })
    }
}

impl Renderer for WebRenderer {
    fn create_element(&mut self, tag: &'static str) -> NativeHandle {
        let node: web_sys::Node = match self.document.create_element(wasm_bindgen::intern(tag)) {
            Ok(element) => element.into(),
            Err(err) => {
                // Only invalid tag names fail; fall back to an empty text node so the
                // tree shape stays consistent.
                error!("WebRenderer: creating <{}> failed: {:?}", tag, err);
                self.document.create_text_node("").into()
            }
        };
        Box::new(WebNativeHandle::new(node))
    }

    fn create_text(&mut self, text: &str) -> NativeHandle {
        Box::new(WebNativeHandle::new(self.document.create_text_node(text).into()))
    }

    fn set_text(&mut self, handle: &NativeHandle, text: &str) {
        web_handle(handle).node.set_text_content(Some(text));
    }

    fn set_attribute(&mut self, handle: &NativeHandle, name: &'static str, value: &str) {
        if let Some(element) = element(handle) {
            log_failure("set_attribute", element.set_attribute(wasm_bindgen::intern(name), value));
        }
    }

    fn remove_attribute(&mut self, handle: &NativeHandle, name: &'static str) {
        if let Some(element) = element(handle) {
            log_failure("remove_attribute", element.remove_attribute(name));
        }
    }

    fn set_listener(&mut self, handle: &NativeHandle, event: &'static str, listener: Option<Listener>) {
        let handle = web_handle(handle);
        handle.listeners.exec_mut(|listeners| match listener {
            Some(listener) => {
                let listener = EventListener::new(&handle.node, event, move |_| listener());
                // Replacing the old `EventListener` drops and thereby detaches it.
                listeners.insert(event, listener);
            }
            None => {
                listeners.remove(event);
            }
        });
    }

    fn append_child(&mut self, parent_handle: &NativeHandle, child_handle: &NativeHandle) {
        let parent = &web_handle(parent_handle).node;
        let child = &web_handle(child_handle).node;
        log_failure("append_child", parent.append_child(child));
    }

    fn replace_child(&mut self, parent_handle: &NativeHandle, index: usize, child_handle: &NativeHandle) {
        let parent = &web_handle(parent_handle).node;
        let child = &web_handle(child_handle).node;
        match parent.child_nodes().get(index as u32) {
            Some(old) => log_failure("replace_child", parent.replace_child(child, &old)),
            None => error!("WebRenderer: no child at index {} to replace", index),
        }
    }

    fn truncate_children(&mut self, parent_handle: &NativeHandle, len: usize) {
        let parent = &web_handle(parent_handle).node;
        let children = parent.child_nodes();
        for index in (len as u32..children.length()).rev() {
            if let Some(child) = children.get(index) {
                log_failure("remove_child", parent.remove_child(&child));
            }
        }
    }
}

static TIMEOUT_MSG_NAME: &str = "cinder_web_message_name";

/// Runs scheduled functions on the browser's event loop, in order, with zero delay.
///
/// Uses `postMessage` rather than `setTimeout(f, 0)`, which browsers clamp to several
/// milliseconds; see <https://dbaron.org/log/20100309-faster-timeouts>.
pub struct WebScheduler {
    window: web_sys::Window,
    queued_fns: Shared<VecDeque<Box<dyn FnOnce()>>>,
    _listener: EventListener,
}

impl WebScheduler {
    pub fn new(window: web_sys::Window) -> Self {
        let queued_fns: Shared<VecDeque<Box<dyn FnOnce()>>> = Shared::default();
        let queued_fns_clone = queued_fns.clone();

        let listener = EventListener::new(&window, "message", move |e| {
            let event = match e.dyn_ref::<web_sys::MessageEvent>() {
                Some(event) => event,
                None => return,
            };
            if event.data() != TIMEOUT_MSG_NAME {
                return;
            }
            event.stop_propagation();
            // Pop outside of the borrow, as the function may schedule more work.
            let f = queued_fns_clone.exec_mut(|queue| queue.pop_front());
            if let Some(f) = f {
                f();
            }
        });

        Self {
            window,
            queued_fns,
            _listener: listener,
        }
    }
}

impl Scheduler for WebScheduler {
    fn schedule_on_ui_thread(&mut self, f: Box<dyn FnOnce()>) {
        self.queued_fns.exec_mut(move |queue| queue.push_back(f));
        log_failure(
            "post_message",
            self.window.post_message(&JsValue::from_str(TIMEOUT_MSG_NAME), "*"),
        );
    }
}

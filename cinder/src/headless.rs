use std::collections::VecDeque;
use std::fmt::Write;

use rustc_hash::FxHashMap;

use crate::renderer::{NativeHandle, Renderer, Scheduler};
use crate::shared::Shared;
use crate::view::Listener;

enum NodeKind {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        listeners: FxHashMap<&'static str, Listener>,
    },
    Text(String),
}

struct NodeInner {
    kind: NodeKind,
    children: Vec<Node>,
}

/// A retained in-memory UI node, either an element or a text node.
/// Cloning a `Node` yields another handle to the same node.
#[derive(Clone)]
pub struct Node(Shared<NodeInner>);

impl Node {
    /// Creates a detached element, typically used as the native handle given to
    /// [`Root::new`](crate::Root::new).
    pub fn element(tag: &str) -> Self {
        Self::from_kind(NodeKind::Element {
            tag: tag.to_owned(),
            attrs: Vec::new(),
            listeners: FxHashMap::default(),
        })
    }

    pub fn text(text: &str) -> Self {
        Self::from_kind(NodeKind::Text(text.to_owned()))
    }

    fn from_kind(kind: NodeKind) -> Self {
        Node(Shared::new(NodeInner {
            kind,
            children: Vec::new(),
        }))
    }

    /// Returns the tag name, or `None` for text nodes.
    pub fn tag(&self) -> Option<String> {
        self.0.exec(|node| match &node.kind {
            NodeKind::Element { tag, .. } => Some(tag.clone()),
            NodeKind::Text(_) => None,
        })
    }

    /// Returns the concatenated text of this node and all of its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        self.0.exec(|node| match &node.kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element { .. } => node.children.iter().for_each(|child| child.collect_text(out)),
        })
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.0.exec(|node| match &node.kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone()),
            NodeKind::Text(_) => None,
        })
    }

    pub fn has_listener(&self, event: &str) -> bool {
        self.0.exec(|node| match &node.kind {
            NodeKind::Element { listeners, .. } => listeners.contains_key(event),
            NodeKind::Text(_) => false,
        })
    }

    pub fn children(&self) -> Vec<Node> {
        self.0.exec(|node| node.children.clone())
    }

    pub fn children_len(&self) -> usize {
        self.0.exec(|node| node.children.len())
    }

    /// Returns `true` if both handles refer to the same node.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        self.0.ptr_eq(&other.0)
    }

    /// Returns the first node, in depth-first pre-order starting with `self`, matching `pred`.
    pub fn find(&self, pred: impl Fn(&Node) -> bool) -> Option<Node> {
        self.find_all(pred).into_iter().next()
    }

    /// Returns every node, in depth-first pre-order starting with `self`, matching `pred`.
    pub fn find_all(&self, pred: impl Fn(&Node) -> bool) -> Vec<Node> {
        let mut found = Vec::new();
        self.visit(&pred, &mut found);
        found
    }

    fn visit(&self, pred: &dyn Fn(&Node) -> bool, found: &mut Vec<Node>) {
        if pred(self) {
            found.push(self.clone());
        }
        for child in self.children() {
            child.visit(pred, found);
        }
    }

    /// Returns every element with the given tag name.
    pub fn find_by_tag(&self, tag: &str) -> Vec<Node> {
        self.find_all(|node| node.tag().as_deref() == Some(tag))
    }

    /// Invokes the listener bound to `event`, returning whether one was bound.
    pub fn dispatch(&self, event: &str) -> bool {
        // Clone the listener out of the borrow so that it may freely touch this node.
        let listener = self.0.exec(|node| match &node.kind {
            NodeKind::Element { listeners, .. } => listeners.get(event).cloned(),
            NodeKind::Text(_) => None,
        });
        match listener {
            Some(listener) => {
                listener();
                true
            }
            None => false,
        }
    }

    /// Executes the node's click listener.
    ///
    /// # Panics
    /// Panics if no click listener is bound.
    pub fn click(&self) {
        assert!(self.dispatch("click"), "expected a click listener on the node");
    }

    /// Serializes the node and its descendants as HTML. Listeners are omitted.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        self.0.exec(|node| match &node.kind {
            NodeKind::Text(text) => escape_into(text, out),
            NodeKind::Element { tag, attrs, .. } => {
                let _ = write!(out, "<{}", tag);
                for (name, value) in attrs {
                    let _ = write!(out, " {}=\"", name);
                    escape_into(value, out);
                    out.push('"');
                }
                out.push('>');
                for child in &node.children {
                    child.write_html(out);
                }
                let _ = write!(out, "</{}>", tag);
            }
        })
    }

    fn set_text(&self, new_text: &str) {
        self.0.exec_mut(|node| {
            if let NodeKind::Text(text) = &mut node.kind {
                *text = new_text.to_owned();
            }
        })
    }

    fn with_element(&self, f: impl FnOnce(&mut Vec<(String, String)>, &mut FxHashMap<&'static str, Listener>)) {
        self.0.exec_mut(|node| {
            if let NodeKind::Element { attrs, listeners, .. } = &mut node.kind {
                f(attrs, listeners);
            }
        })
    }
}

fn escape_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}

fn node(handle: &NativeHandle) -> &Node {
    handle
        .downcast_ref::<Node>()
        .expect("HeadlessRenderer: handle was not created by a HeadlessRenderer")
}

/// A [`Renderer`] building a tree of [`Node`]s.
#[derive(Default)]
pub struct HeadlessRenderer {
    created: usize,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns the number of nodes created so far.
    pub fn created(&self) -> usize {
        self.created
    }
}

impl Renderer for HeadlessRenderer {
    fn create_element(&mut self, tag: &'static str) -> NativeHandle {
        self.created += 1;
        Box::new(Node::element(tag))
    }

    fn create_text(&mut self, text: &str) -> NativeHandle {
        self.created += 1;
        Box::new(Node::text(text))
    }

    fn set_text(&mut self, handle: &NativeHandle, text: &str) {
        node(handle).set_text(text);
    }

    fn set_attribute(&mut self, handle: &NativeHandle, name: &'static str, value: &str) {
        node(handle).with_element(|attrs, _| match attrs.iter_mut().find(|(n, _)| n == name) {
            Some((_, old)) => *old = value.to_owned(),
            None => attrs.push((name.to_owned(), value.to_owned())),
        });
    }

    fn remove_attribute(&mut self, handle: &NativeHandle, name: &'static str) {
        node(handle).with_element(|attrs, _| attrs.retain(|(n, _)| n != name));
    }

    fn set_listener(&mut self, handle: &NativeHandle, event: &'static str, listener: Option<Listener>) {
        node(handle).with_element(|_, listeners| match listener {
            Some(listener) => {
                listeners.insert(event, listener);
            }
            None => {
                listeners.remove(event);
            }
        });
    }

    fn append_child(&mut self, parent_handle: &NativeHandle, child_handle: &NativeHandle) {
        let child = node(child_handle).clone();
        node(parent_handle).0.exec_mut(|parent| parent.children.push(child));
    }

    fn replace_child(&mut self, parent_handle: &NativeHandle, index: usize, child_handle: &NativeHandle) {
        let child = node(child_handle).clone();
        node(parent_handle)
            .0
            .exec_mut(|parent| parent.children[index] = child);
    }

    fn truncate_children(&mut self, parent_handle: &NativeHandle, len: usize) {
        node(parent_handle)
            .0
            .exec_mut(|parent| parent.children.truncate(len));
    }
}

/// A [`Scheduler`] that queues tasks until [`run_until_idle`](Self::run_until_idle) is called.
/// Clones share the same queue, so one clone can be handed to a [`Root`](crate::Root) while
/// another drives it.
#[derive(Clone, Default)]
pub struct QueueScheduler {
    tasks: Shared<VecDeque<Box<dyn FnOnce()>>>,
}

impl QueueScheduler {
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns the number of tasks waiting to run.
    pub fn pending(&self) -> usize {
        self.tasks.exec(|tasks| tasks.len())
    }

    /// Runs only the tasks queued when called, in FIFO order. Tasks they schedule stay
    /// queued for a later call. Returns the number of tasks run.
    pub fn run_pending(&self) -> usize {
        let batch = self.tasks.exec_mut(|tasks| std::mem::take(tasks));
        let ran = batch.len();
        for task in batch {
            task();
        }
        ran
    }

    /// Runs tasks in FIFO order, including those scheduled while running,
    /// until the queue is empty. Returns the number of tasks run.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while let Some(task) = self.tasks.exec_mut(|tasks| tasks.pop_front()) {
            task();
            ran += 1;
        }
        ran
    }
}

impl Scheduler for QueueScheduler {
    fn schedule_on_ui_thread(&mut self, f: Box<dyn FnOnce()>) {
        self.tasks.exec_mut(|tasks| tasks.push_back(f));
    }
}

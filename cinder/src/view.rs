use std::fmt;
use std::rc::Rc;

/// A callback bound to a native event.
pub type Listener = Rc<dyn Fn()>;

/// A renderer-agnostic description of what should be displayed.
///
/// Views are cheap to build and are thrown away after every render; the
/// [`Root`](crate::Root) compares consecutive views and only touches the
/// native tree where they differ.
#[derive(Clone, PartialEq, Debug)]
pub enum View {
    Element(Element),
    Text(String),
}

impl View {
    /// Returns the concatenated text of this view and all of its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            View::Text(text) => out.push_str(text),
            View::Element(element) => {
                for child in &element.children {
                    child.collect_text(out);
                }
            }
        }
    }

    /// Returns the element if this view is one.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            View::Element(element) => Some(element),
            View::Text(_) => None,
        }
    }
}

impl From<Element> for View {
    fn from(element: Element) -> Self {
        View::Element(element)
    }
}

impl From<String> for View {
    fn from(text: String) -> Self {
        View::Text(text)
    }
}

impl From<&str> for View {
    fn from(text: &str) -> Self {
        View::Text(text.to_owned())
    }
}

/// A native element with a tag name, attributes, listeners and children.
/// Serves as its own builder.
#[derive(Clone)]
pub struct Element {
    pub(crate) tag: &'static str,
    pub(crate) attrs: Vec<(&'static str, String)>,
    pub(crate) listeners: Vec<(&'static str, Listener)>,
    pub(crate) children: Vec<View>,
}

impl Element {
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            attrs: Vec::new(),
            listeners: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Sets an attribute, overwriting an earlier value with the same name.
    pub fn attr(mut self, name: &'static str, value: impl ToString) -> Self {
        let value = value.to_string();
        match self.attrs.iter_mut().find(|(n, _)| *n == name) {
            Some((_, old)) => *old = value,
            None => self.attrs.push((name, value)),
        }
        self
    }

    /// Binds `f` to the native event `event`, replacing an earlier binding.
    pub fn on(mut self, event: &'static str, f: impl Fn() + 'static) -> Self {
        let listener: Listener = Rc::new(f);
        match self.listeners.iter_mut().find(|(n, _)| *n == event) {
            Some((_, old)) => *old = listener,
            None => self.listeners.push((event, listener)),
        }
        self
    }

    pub fn on_click(self, f: impl Fn() + 'static) -> Self {
        self.on("click", f)
    }

    pub fn child(mut self, child: impl Into<View>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<View>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_listener(&self, event: &str) -> bool {
        self.listeners.iter().any(|(n, _)| *n == event)
    }

    /// Invokes the listener bound to `event`, returning whether one existed.
    pub fn dispatch(&self, event: &str) -> bool {
        match self.listeners.iter().find(|(n, _)| *n == event) {
            Some((_, listener)) => {
                listener();
                true
            }
            None => false,
        }
    }

    pub fn child_views(&self) -> &[View] {
        &self.children
    }
}

// Listeners are closures, so two elements are equal when they bind the same events.
impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag
            && self.attrs == other.attrs
            && self.children == other.children
            && self.listeners.len() == other.listeners.len()
            && self
                .listeners
                .iter()
                .zip(&other.listeners)
                .all(|((a, _), (b, _))| a == b)
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners: Vec<_> = self.listeners.iter().map(|(name, _)| *name).collect();
        f.debug_struct("Element")
            .field("tag", &self.tag)
            .field("attrs", &self.attrs)
            .field("listeners", &listeners)
            .field("children", &self.children)
            .finish()
    }
}

/// Constructors for common HTML elements.
pub mod html {
    use super::{Element, View};

    macro_rules! def_elements {
        ( $( $tag:ident ),* ) => {
            $(
                #[inline]
                pub fn $tag() -> Element {
                    Element::new(stringify!($tag))
                }
            )*
        };
    }

    def_elements!(div, span, p, h1, h2, h3, h4, h5, h6, button, ul, li);

    /// Creates a text node.
    #[inline]
    pub fn text(text: impl Into<String>) -> View {
        View::Text(text.into())
    }
}

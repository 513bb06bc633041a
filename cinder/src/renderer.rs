use std::any::Any;

use downcast_rs::{impl_downcast, Downcast};

use crate::view::Listener;

/// An opaque handle whose underlying type is determined by the current `Renderer`.
pub type NativeHandle = Box<dyn Any>;

/// The interface through which `cinder` updates the native UI as described by changes to views.
/// This allows `cinder` to be platform-agnostic.
///
/// Handles passed to a renderer were always created by that same renderer, except for the
/// root handle given to [`Root::new`](crate::Root::new).
pub trait Renderer: Downcast {
    /// Creates a childless native element with the given tag name.
    fn create_element(&mut self, tag: &'static str) -> NativeHandle;

    /// Creates a native text node.
    fn create_text(&mut self, text: &str) -> NativeHandle;

    /// Replaces the content of a text node created by `create_text`.
    fn set_text(&mut self, handle: &NativeHandle, text: &str);

    fn set_attribute(&mut self, handle: &NativeHandle, name: &'static str, value: &str);

    fn remove_attribute(&mut self, handle: &NativeHandle, name: &'static str);

    /// Binds `listener` to `event` on the element, replacing any previous binding.
    /// Passing `None` removes the binding.
    fn set_listener(&mut self, handle: &NativeHandle, event: &'static str, listener: Option<Listener>);

    /// Appends the node with handle `child_handle` into the node with
    /// handle `parent_handle`'s children.
    fn append_child(&mut self, parent_handle: &NativeHandle, child_handle: &NativeHandle);

    /// Replaces the child at position `index` with the native node
    /// with handle `child_handle`.
    /// # Panics
    /// May panic if `index > len - 1`, where `len` is the number of children the parent has.
    fn replace_child(&mut self, parent_handle: &NativeHandle, index: usize, child_handle: &NativeHandle);

    /// Truncates the number of the children to the length given, removing any children
    /// greater in count than `len`.
    fn truncate_children(&mut self, parent_handle: &NativeHandle, len: usize);
}

impl_downcast!(Renderer);

/// An interface to schedule a function on a platform's ui thread.
pub trait Scheduler {
    /// Schedule the given function to be run on the ui thread in the future.
    /// Implementations must run scheduled functions in the order they were scheduled,
    /// and never from within this call.
    fn schedule_on_ui_thread(&mut self, f: Box<dyn FnOnce()>);
}

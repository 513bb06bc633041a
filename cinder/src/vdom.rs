use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

use crate::renderer::{NativeHandle, Renderer, Scheduler};
use crate::shared::{Shared, WeakShared};
use crate::state::{StateSetter, UpdateQueue};
use crate::view::{Listener, View};
use crate::Component;

/// The lifecycle phase of a mounted component.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    /// The first view has been committed, but the updates issued by
    /// [`Component::mounted`] have not been applied yet.
    Initial,
    /// The mount hook's updates have been applied and rendered.
    Mounted,
    /// The root was torn down by [`Root::unmount`]. Terminal.
    Unmounted,
}

/// Hosts a single component on top of a native handle owned by a [`Renderer`].
/// This struct should only be used by renderer implementation libraries and tests.
///
/// # Usage
///
/// A renderer library accepts a component from the user, creates or looks up the native
/// node it should be displayed in, then uses [`Root::new`] to mount it.
pub struct Root<C: Component> {
    inner: Shared<RootInner<C>>,
}

struct RootInner<C: Component> {
    component: C,
    state: C::State,
    setter: StateSetter<C::State>,
    queue: Shared<UpdateQueue<C::State>>,
    renderer: Box<dyn Renderer>,
    native_handle: NativeHandle,
    tree: Option<MountedNode>,
    phase: Phase,
}

impl<C: Component> Root<C> {
    /// Mounts `component` as the only child of `native_handle`.
    ///
    /// Removes all current children of `native_handle`, initializes the component's state,
    /// renders and commits the first view, then calls [`Component::mounted`] exactly once.
    /// Updates issued by the mount hook are applied on the first flush run by `scheduler`,
    /// after which the root is in [`Phase::Mounted`].
    ///
    /// After calling `new`, only cinder should manipulate the descendants of `native_handle`
    /// until [`unmount`](Self::unmount) is called.
    pub fn new<R: Renderer, S: Scheduler + 'static>(
        native_handle: NativeHandle,
        component: C,
        renderer: R,
        scheduler: S,
    ) -> Self {
        let scheduler: Shared<dyn Scheduler> = Shared::new_dyn(Rc::new(RefCell::new(scheduler)));
        let queue = Shared::new(UpdateQueue::new());
        let inner = Shared::new_cyclic(|weak: WeakShared<RootInner<C>>| {
            let flush_scheduler = scheduler.clone();
            let flush: Rc<dyn Fn()> =
                Rc::new(move || flush_root(weak.clone(), flush_scheduler.clone()));
            let setter = StateSetter::new(queue.downgrade(), scheduler, flush);
            let state = component.init_state();
            RootInner {
                component,
                state,
                setter,
                queue,
                renderer: Box::new(renderer),
                native_handle,
                tree: None,
                phase: Phase::Initial,
            }
        });
        inner.exec_mut(RootInner::mount);
        Root { inner }
    }

    pub fn phase(&self) -> Phase {
        self.inner.exec(|inner| inner.phase)
    }

    /// Executes `f` with a reference to the component's current state.
    ///
    /// # Panics
    /// Panics if called from within a render or state update of the same root.
    pub fn with_state<T>(&self, f: impl FnOnce(&C::State) -> T) -> T {
        self.inner.exec(|inner| f(&inner.state))
    }

    /// Executes `f` with the root's renderer if it is of type `R`.
    pub fn with_renderer<R: Renderer, T>(&self, f: impl FnOnce(&R) -> T) -> Option<T> {
        self.inner
            .exec(|inner| inner.renderer.downcast_ref::<R>().map(f))
    }

    /// Returns a setter for the component's state, equivalent to the one passed to its hooks.
    pub fn setter(&self) -> StateSetter<C::State> {
        self.inner.exec(|inner| inner.setter.clone())
    }

    /// Unmounts the component, removing every native node the root created from its
    /// native handle. Pending updates are discarded, listeners are released and the
    /// component's state is dropped; setters still held elsewhere become no-ops.
    pub fn unmount(self) {
        self.inner.exec_mut(RootInner::unmount);
    }
}

/// Applies pending updates of the root behind `weak`, if it is still alive.
fn flush_root<C: Component>(weak: WeakShared<RootInner<C>>, scheduler: Shared<dyn Scheduler>) {
    let inner = match weak.upgrade() {
        Some(inner) => inner,
        None => return,
    };
    if inner.borrowed() {
        let scheduler_clone = scheduler.clone();
        scheduler.exec_mut(move |scheduler| {
            scheduler.schedule_on_ui_thread(Box::new(move || flush_root(weak, scheduler_clone)))
        });
        return;
    }
    inner.exec_mut(RootInner::flush);
}

impl<C: Component> RootInner<C> {
    fn mount(&mut self) {
        self.renderer.truncate_children(&self.native_handle, 0);

        let view = self.component.render(&self.state, &self.setter);
        let node = MountedNode::create(&mut *self.renderer, view);
        self.renderer.append_child(&self.native_handle, &node.handle);
        self.tree = Some(node);
        debug!("cinder: committed initial view");

        self.component.mounted(&self.setter);
        // The mount cycle completes on the first flush, whether or not the hook issued updates.
        self.setter.request_flush();
    }

    fn flush(&mut self) {
        if self.phase == Phase::Unmounted {
            return;
        }
        let updates = self.queue.exec_mut(UpdateQueue::take);
        let applied = updates.len();
        for update in updates {
            update(&mut self.state);
        }

        let view = self.component.render(&self.state, &self.setter);
        if let Some(tree) = &mut self.tree {
            tree.patch(&mut *self.renderer, &self.native_handle, 0, view);
        }
        if self.phase == Phase::Initial {
            self.phase = Phase::Mounted;
            debug!("cinder: mount cycle complete");
        }
        debug!("cinder: applied {} state update(s)", applied);
    }

    fn unmount(&mut self) {
        if self.phase == Phase::Unmounted {
            return;
        }
        self.renderer.truncate_children(&self.native_handle, 0);
        self.tree = None;
        let discarded = self.queue.exec_mut(UpdateQueue::take).len();
        self.phase = Phase::Unmounted;
        debug!("cinder: unmounted root, discarded {} pending update(s)", discarded);
    }
}

/// The committed counterpart of a [`View`], holding the native handle created for it.
struct MountedNode {
    handle: NativeHandle,
    kind: MountedKind,
}

enum MountedKind {
    Text(String),
    Element {
        tag: &'static str,
        attrs: Vec<(&'static str, String)>,
        listeners: Vec<&'static str>,
        children: Vec<MountedNode>,
    },
}

impl MountedNode {
    fn create(renderer: &mut dyn Renderer, view: View) -> Self {
        match view {
            View::Text(text) => MountedNode {
                handle: renderer.create_text(&text),
                kind: MountedKind::Text(text),
            },
            View::Element(element) => {
                let handle = renderer.create_element(element.tag);
                for (name, value) in &element.attrs {
                    renderer.set_attribute(&handle, *name, value);
                }
                let mut listeners = Vec::with_capacity(element.listeners.len());
                for (event, listener) in element.listeners {
                    renderer.set_listener(&handle, event, Some(listener));
                    listeners.push(event);
                }
                let children = element
                    .children
                    .into_iter()
                    .map(|child| {
                        let node = MountedNode::create(renderer, child);
                        renderer.append_child(&handle, &node.handle);
                        node
                    })
                    .collect();
                MountedNode {
                    handle,
                    kind: MountedKind::Element {
                        tag: element.tag,
                        attrs: element.attrs,
                        listeners,
                        children,
                    },
                }
            }
        }
    }

    /// Brings the native node in line with `view`. `self` is the child at `index` of `parent`.
    fn patch(&mut self, renderer: &mut dyn Renderer, parent: &NativeHandle, index: usize, view: View) {
        let view = match (&mut self.kind, view) {
            (MountedKind::Text(old), View::Text(new)) => {
                if *old != new {
                    renderer.set_text(&self.handle, &new);
                    *old = new;
                }
                return;
            }
            (
                MountedKind::Element {
                    tag,
                    attrs,
                    listeners,
                    children,
                },
                View::Element(element),
            ) if *tag == element.tag => {
                patch_attrs(renderer, &self.handle, attrs, element.attrs);
                patch_listeners(renderer, &self.handle, listeners, element.listeners);
                patch_children(renderer, &self.handle, children, element.children);
                return;
            }
            (_, view) => view,
        };

        let node = MountedNode::create(renderer, view);
        renderer.replace_child(parent, index, &node.handle);
        *self = node;
    }
}

fn patch_attrs(
    renderer: &mut dyn Renderer,
    handle: &NativeHandle,
    old: &mut Vec<(&'static str, String)>,
    new: Vec<(&'static str, String)>,
) {
    for (name, value) in &new {
        let unchanged = old
            .iter()
            .any(|(old_name, old_value)| old_name == name && old_value == value);
        if !unchanged {
            renderer.set_attribute(handle, *name, value);
        }
    }
    for (name, _) in old.iter() {
        if !new.iter().any(|(new_name, _)| new_name == name) {
            renderer.remove_attribute(handle, *name);
        }
    }
    *old = new;
}

/// Listeners close over the state of the render that created them, so every binding is
/// replaced on each patch.
fn patch_listeners(
    renderer: &mut dyn Renderer,
    handle: &NativeHandle,
    old: &mut Vec<&'static str>,
    new: Vec<(&'static str, Listener)>,
) {
    for event in old.iter() {
        if !new.iter().any(|(new_event, _)| new_event == event) {
            renderer.set_listener(handle, *event, None);
        }
    }
    old.clear();
    for (event, listener) in new {
        renderer.set_listener(handle, event, Some(listener));
        old.push(event);
    }
}

fn patch_children(
    renderer: &mut dyn Renderer,
    handle: &NativeHandle,
    old: &mut Vec<MountedNode>,
    new: Vec<View>,
) {
    let new_len = new.len();
    let mut new = new.into_iter();
    for (index, (node, view)) in old.iter_mut().zip(new.by_ref()).enumerate() {
        node.patch(renderer, handle, index, view);
    }
    if old.len() > new_len {
        renderer.truncate_children(handle, new_len);
        old.truncate(new_len);
    }
    for view in new {
        let node = MountedNode::create(renderer, view);
        renderer.append_child(handle, &node.handle);
        old.push(node);
    }
}

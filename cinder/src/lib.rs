#[cfg(test)]
mod tests;

/// A reference-counted interior-mutable type designed to reduce runtime borrow rule violations.
pub mod shared;
/// Traits providing platform-specific rendering and scheduling code.
pub mod renderer;
/// Queued, in-order state updates.
pub mod state;
/// A renderer-agnostic description of a user interface.
pub mod view;
/// An in-memory renderer, for server-side snapshots and tests.
pub mod headless;
mod vdom;

pub use state::StateSetter;
pub use vdom::{Phase, Root};
pub use view::{html, Element, View};

/// The trait representing a component: a piece of state and a pure function rendering it.
///
/// # Example
/// ```rust
/// use cinder::{html::*, Component, StateSetter, View};
///
/// struct Toggle;
///
/// impl Component for Toggle {
///     type State = bool;
///
///     fn init_state(&self) -> bool {
///         false
///     }
///
///     fn render(&self, on: &bool, setter: &StateSetter<bool>) -> View {
///         let setter = setter.clone();
///         button()
///             .on_click(move || setter.update(|on| *on = !*on))
///             .child(text(if *on { "on" } else { "off" }))
///             .into()
///     }
/// }
/// ```
pub trait Component: 'static {
    type State: 'static;

    /// Creates the state the component starts with.
    fn init_state(&self) -> Self::State;

    /// Describes the user interface for `state`. Must not have side effects: it may be called
    /// any number of times, and the same state must produce an equal view.
    fn render(&self, state: &Self::State, setter: &StateSetter<Self::State>) -> View;

    /// Called exactly once, right after the first view is committed to the native tree.
    /// Updates issued here are applied before the next render.
    fn mounted(&self, _setter: &StateSetter<Self::State>) {}
}

use cinder::{html::*, Component, StateSetter, View};
use wasm_bindgen::prelude::*;

/// Id of the element the counter is mounted into.
pub const ROOT_ELEMENT_ID: &str = "root";

/// The value the counter is reset to once it has been displayed.
const MOUNTED_COUNT: u64 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterState {
    pub count: u64,
}

impl CounterState {
    pub fn new() -> Self {
        Self { count: 0 }
    }
}

/// A heading showing a count, and a button incrementing it.
pub struct Counter;

impl Component for Counter {
    type State = CounterState;

    fn init_state(&self) -> CounterState {
        CounterState::new()
    }

    fn render(&self, state: &CounterState, setter: &StateSetter<CounterState>) -> View {
        let setter = setter.clone();
        counter_view(state.count, move || increment(&setter))
    }

    fn mounted(&self, setter: &StateSetter<CounterState>) {
        setter.set(CounterState {
            count: MOUNTED_COUNT,
        });
    }
}

/// Adds one to the count as left by every update issued before this one.
pub fn increment(setter: &StateSetter<CounterState>) {
    setter.update(|state| state.count += 1);
}

pub fn counter_view(count: u64, on_increment: impl Fn() + 'static) -> View {
    div()
        .child(h1().child(text(format!("Count: {}", count))))
        .child(button().on_click(on_increment).child(text("Increment")))
        .into()
}

// This is like the `main` function, except for JavaScript.
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    // This provides better error messages in debug mode.
    // It's disabled in release mode so it doesn't bloat up the file size.
    #[cfg(debug_assertions)]
    console_error_panic_hook::set_once();

    let level = if cfg!(debug_assertions) {
        log::Level::Debug
    } else {
        log::Level::Info
    };
    wasm_logger::init(wasm_logger::Config::new(level));

    cinder_web::mount_to_element_id(ROOT_ELEMENT_ID, Counter).map_err(|err| {
        log::error!("counter: {}", err);
        err.into()
    })
}

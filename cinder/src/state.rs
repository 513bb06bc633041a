use std::collections::VecDeque;
use std::mem;
use std::rc::Rc;

use log::debug;

use crate::renderer::Scheduler;
use crate::shared::{Shared, WeakShared};

/// A pending change to a component's state.
pub(crate) type Update<S> = Box<dyn FnOnce(&mut S)>;

/// Updates issued since the last flush, in submission order.
pub(crate) struct UpdateQueue<S> {
    pending: VecDeque<Update<S>>,
    flush_scheduled: bool,
}

impl<S> UpdateQueue<S> {
    pub(crate) fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            flush_scheduled: false,
        }
    }

    /// Removes every pending update and allows the next `push` to schedule a flush.
    pub(crate) fn take(&mut self) -> VecDeque<Update<S>> {
        self.flush_scheduled = false;
        mem::take(&mut self.pending)
    }

    /// Queues `update`, returning `true` if no flush was scheduled yet.
    fn push(&mut self, update: Update<S>) -> bool {
        self.pending.push_back(update);
        !mem::replace(&mut self.flush_scheduled, true)
    }

    /// Marks a flush as scheduled, returning `true` if one was not already.
    fn claim_flush(&mut self) -> bool {
        !mem::replace(&mut self.flush_scheduled, true)
    }
}

/// Provides a setter for the state of a component mounted in a [`Root`](crate::Root).
///
/// A setter is handed to [`Component::render`](crate::Component::render) and
/// [`Component::mounted`](crate::Component::mounted), and may be freely cloned and moved
/// into event listeners.
///
/// Updates are not performed immediately. They are queued and applied, in the order they
/// were issued, right before the component's next render. Any number of updates issued
/// before that render are applied in a single batch, each one observing the effect of
/// those issued before it.
pub struct StateSetter<S: 'static> {
    queue: WeakShared<UpdateQueue<S>>,
    scheduler: Shared<dyn Scheduler>,
    flush: Rc<dyn Fn()>,
}

impl<S: 'static> Clone for StateSetter<S> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            scheduler: self.scheduler.clone(),
            flush: self.flush.clone(),
        }
    }
}

impl<S: 'static> StateSetter<S> {
    pub(crate) fn new(
        queue: WeakShared<UpdateQueue<S>>,
        scheduler: Shared<dyn Scheduler>,
        flush: Rc<dyn Fn()>,
    ) -> Self {
        Self {
            queue,
            scheduler,
            flush,
        }
    }

    /// Takes a function that modifies the state associated with the setter and
    /// triggers a rerender of its component.
    ///
    /// `f` receives the state as left by every update issued before it, so
    /// read-modify-write updates such as incrementing a counter are never lost,
    /// however many of them are batched together.
    pub fn update<F: FnOnce(&mut S) + 'static>(&self, f: F) {
        let queue = match self.queue.upgrade() {
            Some(queue) => queue,
            None => {
                debug!("cinder: discarding state update issued after its root was unmounted");
                return;
            }
        };
        if queue.exec_mut(move |queue| queue.push(Box::new(f))) {
            self.schedule(self.flush.clone());
        }
    }

    /// Sets the state to the given value, regardless of its current value.
    ///
    /// Like [`update`](Self::update), the change takes effect on the next render.
    pub fn set(&self, val: S) {
        self.update(move |state| *state = val);
    }

    /// Returns `false` once the root owning the state has been unmounted or dropped.
    pub fn is_live(&self) -> bool {
        self.queue.upgrade().is_some()
    }

    /// Schedules a flush even if no update is pending, unless one is already scheduled.
    pub(crate) fn request_flush(&self) {
        let claimed = match self.queue.upgrade() {
            Some(queue) => queue.exec_mut(UpdateQueue::claim_flush),
            None => false,
        };
        if claimed {
            self.schedule(self.flush.clone());
        }
    }

    fn schedule(&self, flush: Rc<dyn Fn()>) {
        self.scheduler
            .exec_mut(move |scheduler| scheduler.schedule_on_ui_thread(Box::new(move || flush())));
    }
}

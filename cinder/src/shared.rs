use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// A reference-counted, interior-mutable value. All access goes through closures
/// so that borrows never outlive a single call.
pub struct Shared<T: ?Sized> {
    rc: Rc<RefCell<T>>,
}

/// A non-owning counterpart of [`Shared`], obtained through [`Shared::downgrade`].
pub struct WeakShared<T: ?Sized> {
    weak: Weak<RefCell<T>>,
}

impl<T> Shared<T> {
    pub fn new(val: T) -> Self {
        Shared {
            rc: Rc::new(RefCell::new(val)),
        }
    }

    /// Constructs a value that holds a weak reference to itself.
    pub(crate) fn new_cyclic<F: FnOnce(WeakShared<T>) -> T>(f: F) -> Self {
        Shared {
            rc: Rc::new_cyclic(|weak| {
                RefCell::new(f(WeakShared {
                    weak: weak.clone(),
                }))
            }),
        }
    }
}

impl<T: ?Sized> Shared<T> {
    /// Allows constructing an instance of Shared with a `?Sized T`.
    // `CoerceUnsized` is unstable, so unsized values are built from an existing `Rc`.
    pub(crate) fn new_dyn(val: Rc<RefCell<T>>) -> Self {
        Shared { rc: val }
    }

    /// Executes the given function with an immutable reference to the wrapped value.
    ///
    /// # Panics
    ///
    /// Panics if the wrapped value is being used by an `exec_mut` call.
    ///
    /// # Example
    ///
    /// ```
    /// # use cinder::shared::Shared;
    /// let count = Shared::new(3u8);
    /// assert_eq!(count.exec(|&n| n + 1), 4);
    /// ```
    pub fn exec<Ret, F: FnOnce(&T) -> Ret>(&self, f: F) -> Ret {
        f(&self.rc.borrow())
    }

    /// Executes the given function with a mutable reference to the wrapped value.
    ///
    /// # Panics
    ///
    /// Panics if the wrapped value is being used by another `exec` or `exec_mut` call.
    ///
    /// # Example
    ///
    /// ```
    /// # use cinder::shared::Shared;
    /// let labels = Shared::new(vec!["a"]);
    /// labels.exec_mut(|labels| labels.push("b"));
    /// labels.exec(|labels| assert_eq!(labels, &["a", "b"]));
    /// ```
    pub fn exec_mut<Ret, F: FnOnce(&mut T) -> Ret>(&self, f: F) -> Ret {
        f(&mut self.rc.borrow_mut())
    }

    /// Returns `true` if the value is currently borrowed by `exec` or `exec_mut`.
    pub fn borrowed(&self) -> bool {
        self.rc.try_borrow_mut().is_err()
    }

    pub fn downgrade(&self) -> WeakShared<T> {
        WeakShared {
            weak: Rc::downgrade(&self.rc),
        }
    }

    /// Returns `true` if both values point to the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.rc, &other.rc)
    }
}

impl<T: ?Sized> WeakShared<T> {
    /// Returns the shared value if it has not been dropped yet.
    pub fn upgrade(&self) -> Option<Shared<T>> {
        self.weak.upgrade().map(Shared::new_dyn)
    }
}

impl<T: ?Sized> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Shared {
            rc: self.rc.clone(),
        }
    }
}

impl<T: ?Sized> Clone for WeakShared<T> {
    fn clone(&self) -> Self {
        WeakShared {
            weak: self.weak.clone(),
        }
    }
}

impl<T: Default> Default for Shared<T> {
    fn default() -> Self {
        Self::new(Default::default())
    }
}

impl<T> From<T> for Shared<T> {
    fn from(val: T) -> Self {
        Self::new(val)
    }
}

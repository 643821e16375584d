//! Single-threaded hand-off cells between the gesture loop and the frame loop.
//!
//! Both loops run on the same thread (the browser's event loop, or winit's),
//! so shared ownership is `Rc<RefCell<..>>` rather than a lock.

use std::cell::RefCell;
use std::rc::Rc;

/// Holds only the most recent value. Writers overwrite, readers either peek
/// or take; nothing is ever queued.
#[derive(Debug)]
pub struct Latest<T> {
    slot: Rc<RefCell<Option<T>>>,
}

impl<T> Clone for Latest<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
        }
    }
}

impl<T> Default for Latest<T> {
    fn default() -> Self {
        Self {
            slot: Rc::new(RefCell::new(None)),
        }
    }
}

impl<T> Latest<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, value: T) {
        *self.slot.borrow_mut() = Some(value);
    }

    /// Replace with `value`, or clear when `None`.
    pub fn replace(&self, value: Option<T>) {
        *self.slot.borrow_mut() = value;
    }

    pub fn clear(&self) {
        self.slot.borrow_mut().take();
    }

    pub fn take(&self) -> Option<T> {
        self.slot.borrow_mut().take()
    }

    pub fn is_set(&self) -> bool {
        self.slot.borrow().is_some()
    }
}

impl<T: Clone> Latest<T> {
    pub fn get(&self) -> Option<T> {
        self.slot.borrow().clone()
    }
}

type Handler<A> = Rc<dyn Fn(A)>;

/// Holds the most recently registered callback. Callers look the handler up
/// at each invocation, so a re-registration takes effect on the next call.
pub struct HandlerCell<A> {
    slot: Rc<RefCell<Option<Handler<A>>>>,
}

impl<A> Clone for HandlerCell<A> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
        }
    }
}

impl<A> Default for HandlerCell<A> {
    fn default() -> Self {
        Self {
            slot: Rc::new(RefCell::new(None)),
        }
    }
}

impl<A> HandlerCell<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, handler: impl Fn(A) + 'static) {
        *self.slot.borrow_mut() = Some(Rc::new(handler));
    }

    pub fn clear(&self) {
        self.slot.borrow_mut().take();
    }

    pub fn is_registered(&self) -> bool {
        self.slot.borrow().is_some()
    }

    /// Calls the current handler, if any. Returns whether one ran.
    pub fn call(&self, arg: A) -> bool {
        // Clone out first so the handler may re-register itself.
        let handler = self.slot.borrow().clone();
        match handler {
            Some(h) => {
                h(arg);
                true
            }
            None => false,
        }
    }
}

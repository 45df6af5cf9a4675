// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reactive value cells: get/set/subscribe with optional equality suppression.
//!
//! ## Overview
//!
//! [`Value`] is a single-threaded shared cell. Setting it notifies every
//! subscriber — unless the cell was built with an equality comparer
//! ([`Value::with_eq`] or [`Value::distinct`]) and the comparer reports the
//! new value equal to the old, in which case subscribers stay quiet. The
//! lifecycle layer uses this so a popup's best position only notifies on
//! semantic change, and its open state does not re-fire on redundant sets.
//!
//! [`Value::subscribe`] returns a [`Subscription`]: a disposable handle that
//! detaches the callback when dropped or explicitly disposed.
//!
//! ## Minimal example
//!
//! ```
//! use canopy_overlay::reactive::Value;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let hits = Rc::new(Cell::new(0));
//! let seen = hits.clone();
//! let value = Value::distinct(1);
//! let sub = value.subscribe(move |_| seen.set(seen.get() + 1));
//! value.set(1); // suppressed: unchanged
//! value.set(2); // notifies
//! assert_eq!(hits.get(), 1);
//! drop(sub);
//! value.set(3); // no subscriber left
//! assert_eq!(hits.get(), 1);
//! ```

use core::fmt;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

type Comparer<T> = Box<dyn Fn(&T, &T) -> bool>;
type Callback<T> = Rc<RefCell<dyn FnMut(&T)>>;

struct Inner<T> {
    value: T,
    /// Returns true when two values are equal (publication suppressed).
    eq: Option<Comparer<T>>,
    subscribers: Vec<(u64, Callback<T>)>,
    next_id: u64,
}

/// A shared, observable value cell.
///
/// Clones share the same cell. Not thread-safe; the whole overlay engine runs
/// on the UI event loop.
pub struct Value<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

impl<T> Clone for Value<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Value<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Value")
            .field("value", &inner.value)
            .field("subscribers", &inner.subscribers.len())
            .finish_non_exhaustive()
    }
}

impl<T: Clone + 'static> Value<T> {
    /// A cell that notifies on every set.
    pub fn new(value: T) -> Self {
        Self::build(value, None)
    }

    /// A cell that notifies only when `eq` reports the new value unequal to
    /// the old.
    pub fn with_eq(value: T, eq: impl Fn(&T, &T) -> bool + 'static) -> Self {
        Self::build(value, Some(Box::new(eq)))
    }

    fn build(value: T, eq: Option<Comparer<T>>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                value,
                eq,
                subscribers: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// The current value.
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Replace the value, notifying subscribers unless suppressed by the
    /// comparer.
    ///
    /// Subscribers run after the cell's own borrow is released, so they may
    /// freely read, set, or subscribe to this cell; a re-entrant set notifies
    /// with its own snapshot in turn.
    pub fn set(&self, value: T) {
        let notify = {
            let mut inner = self.inner.borrow_mut();
            let unchanged = inner
                .eq
                .as_ref()
                .is_some_and(|eq| eq(&inner.value, &value));
            if unchanged {
                false
            } else {
                inner.value = value;
                true
            }
        };
        if notify {
            self.notify();
        }
    }

    /// Attach a subscriber; the returned handle detaches it when disposed or
    /// dropped.
    pub fn subscribe(&self, callback: impl FnMut(&T) + 'static) -> Subscription {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            inner
                .subscribers
                .push((id, Rc::new(RefCell::new(callback))));
            id
        };
        let weak: Weak<RefCell<Inner<T>>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().subscribers.retain(|(sid, _)| *sid != id);
            }
        })
    }

    fn notify(&self) {
        // Snapshot so subscribers can unsubscribe (or subscribe) mid-notify
        // without invalidating the iteration.
        let (value, subscribers) = {
            let inner = self.inner.borrow();
            (inner.value.clone(), inner.subscribers.clone())
        };
        for (_, callback) in subscribers {
            let mut callback = callback.borrow_mut();
            (*callback)(&value);
        }
    }
}

impl<T: Clone + PartialEq + 'static> Value<T> {
    /// A cell with structural equality suppression: redundant sets stay
    /// silent.
    pub fn distinct(value: T) -> Self {
        Self::with_eq(value, |a, b| a == b)
    }
}

impl<T: Clone + Default + 'static> Default for Value<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Disposable handle for a [`Value`] subscription.
///
/// Dropping it detaches the callback; [`Subscription::dispose`] does the same
/// explicitly. Disposal is idempotent.
pub struct Subscription {
    detach: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    fn new(detach: impl FnOnce() + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// Detach the subscriber now.
    pub fn dispose(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("live", &self.detach.is_some())
            .finish()
    }
}

// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Escape dismissal: a process-wide stack of open popups.
//!
//! ## Overview
//!
//! When several popups are open at once, Escape must dismiss only the most
//! recently opened one. Rather than every popup racing on its own key
//! listener, open popups register with one ordered stack; a single shared key
//! listener (armed when the stack becomes non-empty, disarmed when it
//! empties) asks only the top entry to close.
//!
//! ## Lifecycle
//!
//! Entries are pushed on successful open-transition completion and removed at
//! close-transition start, so the stack reflects exactly the set of open
//! popups using escape dismissal. [`EscapeStack::unregister`] is idempotent
//! and safe re-entrantly — closing one popup from within another's dismissal
//! handler must not double-remove or panic.
//!
//! ## Access
//!
//! Production code goes through the thread-local singleton via [`with_stack`];
//! the stack type itself is constructible for tests.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use crate::host::{Event, Host, Key, ListenerId, ListenerKind, ListenerTarget, Outcome};

/// Identifier for a stack entry.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct EntryId(u64);

/// A popup-side endpoint the stack asks to close.
pub trait EscapeSink {
    /// Request dismissal; implementations set their open state to false.
    fn escape_requested(&self);
}

struct Entry {
    id: EntryId,
    sink: Weak<dyn EscapeSink>,
}

struct Armed {
    host: Rc<dyn Host>,
    listeners: Vec<ListenerId>,
}

/// The ordered registry of escape-dismissable open popups.
///
/// Last registered = top of the stack = the one Escape dismisses.
#[derive(Default)]
pub struct EscapeStack {
    entries: Vec<Entry>,
    next_id: u64,
    armed: Option<Armed>,
}

impl core::fmt::Debug for EscapeStack {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EscapeStack")
            .field("entries", &self.entries.len())
            .field("armed", &self.armed.is_some())
            .finish_non_exhaustive()
    }
}

impl EscapeStack {
    /// An empty, disarmed stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the stack is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Push an open popup. The first registrant arms the shared key listener
    /// on the top document and every accessible sub-document of `host`.
    pub fn register(&mut self, host: &Rc<dyn Host>, sink: Weak<dyn EscapeSink>) -> EntryId {
        if self.entries.is_empty() && self.armed.is_none() {
            self.arm(host);
        }
        let id = EntryId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry { id, sink });
        trace!(entries = self.entries.len(), "escape stack push");
        id
    }

    /// Remove an entry. Unknown ids are ignored; the shared listener disarms
    /// when the stack empties.
    pub fn unregister(&mut self, id: EntryId) {
        self.entries.retain(|entry| entry.id != id);
        if self.entries.is_empty() {
            self.disarm();
        }
        trace!(entries = self.entries.len(), "escape stack pop");
    }

    /// The topmost live entry, pruning any whose popup has gone away.
    ///
    /// Returns a strong handle so the caller can invoke it after releasing
    /// its borrow of the stack — dismissal re-enters the stack through
    /// [`EscapeStack::unregister`].
    pub fn top(&mut self) -> Option<Rc<dyn EscapeSink>> {
        self.entries.retain(|entry| entry.sink.strong_count() > 0);
        if self.entries.is_empty() {
            self.disarm();
        }
        self.entries.last().and_then(|entry| entry.sink.upgrade())
    }

    fn arm(&mut self, host: &Rc<dyn Host>) {
        let mut listeners = Vec::new();
        for document in host.documents() {
            let handler = Rc::new(|event: &Event| {
                if matches!(event, Event::Key { key: Key::Escape }) {
                    dispatch_escape();
                }
                Outcome::Continue
            });
            match host.add_listener(
                ListenerTarget::Document(document),
                ListenerKind::KeyUp,
                handler,
            ) {
                Ok(id) => listeners.push(id),
                // Inaccessible frame contents are expected; skip them.
                Err(err) => trace!(?document, %err, "skipping sub-document for escape listener"),
            }
        }
        debug!(listeners = listeners.len(), "escape listener armed");
        self.armed = Some(Armed {
            host: host.clone(),
            listeners,
        });
    }

    fn disarm(&mut self) {
        if let Some(armed) = self.armed.take() {
            for id in armed.listeners {
                armed.host.remove_listener(id);
            }
            debug!("escape listener disarmed");
        }
    }
}

thread_local! {
    static STACK: RefCell<EscapeStack> = RefCell::new(EscapeStack::new());
}

/// Run `f` against the process-wide stack.
///
/// The borrow lasts only for `f`; do not invoke popup code (which re-enters
/// the stack) from inside it.
pub fn with_stack<R>(f: impl FnOnce(&mut EscapeStack) -> R) -> R {
    STACK.with(|stack| f(&mut stack.borrow_mut()))
}

/// Ask the topmost open popup to close.
///
/// The shared key listener calls this on Escape; hosts without key listener
/// plumbing may call it directly. Snapshots the top entry before invoking it,
/// so the dismissal may re-enter the stack freely.
pub fn dispatch_escape() {
    let top = with_stack(EscapeStack::top);
    if let Some(sink) = top {
        debug!("escape dismissal");
        sink.escape_requested();
    }
}

// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=canopy_overlay --heading-base-level=0

//! Canopy Overlay: the lifecycle engine for anchored popups.
//!
//! ## Overview
//!
//! This crate owns everything around the placement math of
//! [`canopy_position`]: the open/close state machine with its ordered
//! lifecycle hooks, rendering strategies (eager-and-hidden versus
//! render-on-open), dismissal (outside presses, Escape, nested-popup
//! precedence, same-origin sub-documents), and clean teardown when the anchor
//! leaves the document.
//!
//! It does not touch a real document tree. The host toolkit implements the
//! [`Host`](crate::host::Host) trait — geometry reads, overlay styling,
//! template mounting, listener plumbing — and the engine stays deterministic
//! behind that seam, which is also how the crate tests drive it end to end
//! against an in-memory host.
//!
//! ## Workflow
//!
//! 1) Bind — [`Popup::bind`](crate::popup::Popup::bind) normalizes a
//!    [`PopupOptions`](crate::config::PopupOptions), wires the reactive
//!    cells, and installs the anchor toggle and detach cleanup.
//! 2) Open/close — write the open-state cell (or let the built-in anchor
//!    toggle and dismissal handlers do it); the state machine serializes
//!    transitions and runs hooks strictly as
//!    `before_open → (render) → after_open` and
//!    `before_close → (hide/remove) → after_close`.
//! 3) Reposition — viewport resize, scrolls from outside the overlay, and
//!    positioning-config changes recompute the best candidate and re-apply
//!    the clamped offset.
//!
//! ## Escape precedence
//!
//! Open popups register with a process-wide stack
//! ([`escape`](crate::escape)); one shared key listener dismisses only the
//! most recently opened one, rather than every popup racing on its own
//! listener.
//!
//! ## Minimal usage
//!
//! ```no_run
//! use canopy_overlay::config::PopupOptions;
//! use canopy_overlay::host::{Host, NodeId};
//! use canopy_overlay::popup::Popup;
//! use std::rc::Rc;
//!
//! fn open_menu(host: Rc<dyn Host>, anchor: NodeId) -> Popup {
//!     let mut options = PopupOptions::new("menu");
//!     options.positioning = "outside-right middle".into();
//!     let popup = Popup::bind(host, anchor, options);
//!     popup.open();
//!     popup
//! }
//! ```

pub mod config;
pub mod escape;
pub mod host;
pub mod popup;
pub mod reactive;

#[cfg(test)]
mod test_host;

pub use config::{
    AxisSpec, DismissEvent, Hooks, PopupFlags, PopupOptions, PositionCell, PositionSpec,
    Positioning, Setting,
};
pub use host::{
    DocumentId, Event, Host, HostError, Key, ListenerFn, ListenerId, ListenerKind, ListenerTarget,
    NodeId, Outcome, PointerButton,
};
pub use popup::{Phase, Popup};
pub use reactive::{Subscription, Value};

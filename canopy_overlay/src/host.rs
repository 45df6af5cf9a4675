// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The host document seam: handles, listener plumbing, and the [`Host`] trait.
//!
//! ## Overview
//!
//! The engine never touches a real document tree. The host toolkit implements
//! [`Host`] and hands out small copyable handles ([`NodeId`], [`DocumentId`],
//! [`ListenerId`]); the engine reads geometry through the trait, mutates
//! overlay style through it, and attaches listeners that the host later feeds
//! with [`Event`]s. This keeps the lifecycle deterministic and testable
//! against an in-memory host.
//!
//! ## Measurement freshness
//!
//! Geometry getters ([`Host::anchor_state`], [`Host::overlay_size`],
//! [`Host::viewport`]) must return current values on every call. The engine
//! never caches them; anchors move, overlay content reflows, windows scroll.
//!
//! ## Sub-documents
//!
//! [`Host::documents`] enumerates the top document first, then embedded
//! sub-documents (iframes). Attaching a listener into a sub-document whose
//! content the host cannot reach fails with [`HostError::CrossOriginFrame`];
//! the engine treats that as expected and skips the frame.

use std::any::Any;
use std::rc::Rc;

use kurbo::{Point, Size};

use canopy_position::{AnchorState, Viewport};

/// Host-assigned handle for an element in the document tree.
///
/// Stays stable for the lifetime of the element; the host decides reuse.
/// Handles held across an element's removal go stale, and geometry getters
/// answer `None` for them.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(
    /// Host-assigned identifier.
    pub u64,
);

/// Host-assigned handle for the top document or an embedded sub-document.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct DocumentId(
    /// Host-assigned identifier; the top document enumerates first.
    pub u32,
);

/// Handle for an attached listener; removal is idempotent.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ListenerId(
    /// Host-assigned identifier.
    pub u64,
);

/// Where a listener attaches.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ListenerTarget {
    /// Document-level, capture phase: sees every event in that document.
    Document(DocumentId),
    /// A single element (and, by propagation, its descendants).
    Node(NodeId),
    /// The window itself: resize and scroll.
    Window,
}

/// The event classes the engine listens for.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ListenerKind {
    /// Pointer pressed.
    PointerDown,
    /// Completed click.
    Click,
    /// Key released.
    KeyUp,
    /// Window resized.
    Resize,
    /// Window or element scrolled.
    Scroll,
}

/// Pointer button of a [`Event::Pointer`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PointerButton {
    /// The primary (usually left) button. Only this one opens or dismisses.
    Primary,
    /// The secondary (usually right) button.
    Secondary,
    /// Any other button.
    Auxiliary,
}

/// Key identity of a [`Event::Key`]. Only Escape matters to the engine.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Key {
    /// The Escape key.
    Escape,
    /// Anything else.
    Other,
}

/// A host event delivered to an engine listener.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Event {
    /// A pointer press or click.
    Pointer {
        /// Which button.
        button: PointerButton,
        /// The event target, when the dispatching document provides one.
        target: Option<NodeId>,
        /// Page coordinates, for synthetic target resolution via
        /// [`Host::node_at`] when `target` is absent (cross-document
        /// dispatch).
        point: Option<Point>,
        /// The document the event was observed in.
        document: DocumentId,
    },
    /// A key release.
    Key {
        /// Which key.
        key: Key,
    },
    /// The window resized.
    Resize,
    /// A scroll happened.
    Scroll {
        /// The element whose scroll position changed, when known. Scrolls
        /// originating inside an overlay must not reposition it.
        origin: Option<NodeId>,
    },
}

/// Propagation outcome returned by an engine listener.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// Keep propagating.
    Continue,
    /// Stop propagation and mark the event consumed.
    Consume,
}

/// An engine listener: shared, re-entrant safe, invoked by the host per event.
pub type ListenerFn = Rc<dyn Fn(&Event) -> Outcome>;

/// Errors surfaced by host calls.
///
/// None of these are fatal; the engine degrades (skips the frame, drops the
/// operation) and the host page keeps running.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// A sub-document's content is inaccessible (foreign origin). Expected in
    /// normal operation; the engine skips such frames.
    #[error("sub-document content is inaccessible (cross-origin)")]
    CrossOriginFrame,
    /// A handle no longer refers to a live element.
    #[error("stale node handle")]
    StaleNode,
}

/// The host toolkit's side of the engine.
///
/// All methods take `&self`; hosts use interior mutability. The engine calls
/// back into the host from within listener dispatch (to resolve targets,
/// detach listeners, restyle overlays), so implementations must tolerate
/// re-entrant calls while a dispatch is in flight.
pub trait Host {
    /// Fresh offset and outer size of an anchor, or `None` once it has been
    /// torn out of the document.
    fn anchor_state(&self, anchor: NodeId) -> Option<AnchorState>;

    /// Fresh viewport geometry.
    fn viewport(&self) -> Viewport;

    /// Fresh measured size of a rendered overlay, or `None` for a stale
    /// handle.
    fn overlay_size(&self, overlay: NodeId) -> Option<Size>;

    /// Create an absolutely positioned overlay container appended to the
    /// document body, carrying the given space-separated class names.
    fn create_overlay(&self, class_names: &str) -> NodeId;

    /// Mount the named template with a data context into `into`, invoking
    /// `done` after the mount completes — possibly asynchronously, possibly
    /// re-entrantly before this call returns. `data` of `None` inherits the
    /// anchor's context; `Some` scopes a child context around the value.
    fn render_template(
        &self,
        template: &str,
        data: Option<Rc<dyn Any>>,
        into: NodeId,
        done: Box<dyn FnOnce()>,
    );

    /// Detach and destroy an overlay container. The default removal path;
    /// bindings with a disposal callback bypass it.
    fn remove_overlay(&self, overlay: NodeId);

    /// Move an overlay to a page offset.
    fn set_overlay_offset(&self, overlay: NodeId, offset: Point);

    /// Show or hide an overlay without detaching it.
    fn set_overlay_visible(&self, overlay: NodeId, visible: bool);

    /// Tag an overlay with the `open` class (and untag `closed`), or the
    /// reverse.
    fn set_open_class(&self, overlay: NodeId, open: bool);

    /// Whether `node` is `ancestor` itself or a descendant of it.
    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool;

    /// Resolve the topmost element at page coordinates within a document.
    /// Supports dismissal checks for events that arrive without a target.
    fn node_at(&self, document: DocumentId, point: Point) -> Option<NodeId>;

    /// The top document followed by every embedded sub-document, accessible
    /// or not. Callers probe accessibility via [`Host::add_listener`].
    fn documents(&self) -> Vec<DocumentId>;

    /// Attach a listener. Fails with [`HostError::CrossOriginFrame`] when the
    /// target document's content cannot be reached.
    fn add_listener(
        &self,
        target: ListenerTarget,
        kind: ListenerKind,
        handler: ListenerFn,
    ) -> Result<ListenerId, HostError>;

    /// Detach a listener. Unknown or already-removed ids are ignored.
    fn remove_listener(&self, listener: ListenerId);

    /// Run `callback` when `node` is torn out of the document. The engine's
    /// cleanup path for anchor detach.
    fn on_node_removed(&self, node: NodeId, callback: Box<dyn FnOnce()>);
}

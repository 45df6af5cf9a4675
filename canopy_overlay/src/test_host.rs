// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory host used by the crate's tests.
//!
//! Models just enough of a document tree to drive the engine end to end:
//! nodes with parents across several documents, attach-ordered listeners with
//! capture-then-target dispatch, synchronous or deferred template rendering,
//! and per-node removal hooks.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use kurbo::{Point, Size};

use canopy_position::{AnchorState, Viewport};

use crate::host::{
    DocumentId, Event, Host, HostError, Key, ListenerFn, ListenerId, ListenerKind, ListenerTarget,
    NodeId, Outcome, PointerButton,
};

const DEFAULT_OVERLAY_SIZE: Size = Size::new(100.0, 30.0);

pub(crate) struct TestHost {
    state: RefCell<State>,
}

#[derive(Default)]
struct State {
    next_node: u64,
    next_listener: u64,
    documents: Vec<Doc>,
    nodes: HashMap<NodeId, NodeData>,
    listeners: Vec<ListenerRec>,
    anchors: HashMap<NodeId, AnchorState>,
    overlays: HashMap<NodeId, OverlayData>,
    viewport: Viewport,
    removal_hooks: HashMap<NodeId, Vec<Box<dyn FnOnce()>>>,
    renders: Vec<(String, NodeId)>,
    pending_renders: Vec<Box<dyn FnOnce()>>,
    async_render: bool,
    removed_overlays: Vec<NodeId>,
    point_targets: HashMap<DocumentId, Vec<(Point, NodeId)>>,
}

struct Doc {
    accessible: bool,
}

struct NodeData {
    parent: Option<NodeId>,
    document: DocumentId,
}

struct ListenerRec {
    id: ListenerId,
    target: ListenerTarget,
    kind: ListenerKind,
    handler: ListenerFn,
}

struct OverlayData {
    class: String,
    visible: bool,
    open: Option<bool>,
    offset: Option<Point>,
}

impl TestHost {
    pub(crate) fn new() -> Rc<Self> {
        let host = Self {
            state: RefCell::new(State {
                viewport: Viewport::window(1024.0, 768.0),
                documents: vec![Doc { accessible: true }],
                ..State::default()
            }),
        };
        Rc::new(host)
    }

    pub(crate) fn set_viewport(&self, viewport: Viewport) {
        self.state.borrow_mut().viewport = viewport;
    }

    pub(crate) fn set_async_render(&self, deferred: bool) {
        self.state.borrow_mut().async_render = deferred;
    }

    /// Fire every deferred render completion, in submission order.
    pub(crate) fn complete_renders(&self) {
        loop {
            let batch = std::mem::take(&mut self.state.borrow_mut().pending_renders);
            if batch.is_empty() {
                break;
            }
            for done in batch {
                done();
            }
        }
    }

    pub(crate) fn add_document(&self, accessible: bool) -> DocumentId {
        let mut state = self.state.borrow_mut();
        state.documents.push(Doc { accessible });
        DocumentId(u32::try_from(state.documents.len() - 1).unwrap())
    }

    pub(crate) fn add_node(&self, document: DocumentId, parent: Option<NodeId>) -> NodeId {
        let mut state = self.state.borrow_mut();
        state.alloc_node(document, parent)
    }

    /// A fresh child of `parent`, in the parent's document.
    pub(crate) fn child_of(&self, parent: NodeId) -> NodeId {
        let mut state = self.state.borrow_mut();
        let document = state
            .nodes
            .get(&parent)
            .map_or(DocumentId(0), |node| node.document);
        state.alloc_node(document, Some(parent))
    }

    pub(crate) fn add_anchor(&self, origin: Point, size: Size) -> NodeId {
        let node = self.add_node(DocumentId(0), None);
        self.set_anchor_state(node, origin, size);
        node
    }

    pub(crate) fn set_anchor_state(&self, node: NodeId, origin: Point, size: Size) {
        self.state
            .borrow_mut()
            .anchors
            .insert(node, AnchorState::new(origin, size));
    }

    pub(crate) fn move_anchor(&self, node: NodeId, origin: Point) {
        let mut state = self.state.borrow_mut();
        if let Some(anchor) = state.anchors.get_mut(&node) {
            anchor.origin = origin;
        }
    }

    /// Register what `node_at` resolves for exact page coordinates.
    pub(crate) fn register_point(&self, document: DocumentId, point: Point, node: NodeId) {
        self.state
            .borrow_mut()
            .point_targets
            .entry(document)
            .or_default()
            .push((point, node));
    }

    /// Tear a node out of the document, running its removal hooks.
    pub(crate) fn remove_node(&self, node: NodeId) {
        let hooks = {
            let mut state = self.state.borrow_mut();
            state.anchors.remove(&node);
            state.nodes.remove(&node);
            state.removal_hooks.remove(&node).unwrap_or_default()
        };
        for hook in hooks {
            hook();
        }
    }

    // Event injection. Document-level (capture) listeners of the event's
    // document run first, then listeners along the target's ancestor chain,
    // innermost first; a consuming node listener stops the chain.

    pub(crate) fn press(&self, target: NodeId) {
        self.pointer_down(target);
        self.click(target);
    }

    pub(crate) fn pointer_down(&self, target: NodeId) {
        self.dispatch_pointer(
            ListenerKind::PointerDown,
            PointerButton::Primary,
            Some(target),
            None,
            None,
        );
    }

    pub(crate) fn pointer_down_with(&self, target: NodeId, button: PointerButton) {
        self.dispatch_pointer(ListenerKind::PointerDown, button, Some(target), None, None);
    }

    pub(crate) fn pointer_down_at(&self, document: DocumentId, point: Point) {
        self.dispatch_pointer(
            ListenerKind::PointerDown,
            PointerButton::Primary,
            None,
            Some(point),
            Some(document),
        );
    }

    pub(crate) fn click(&self, target: NodeId) {
        self.dispatch_pointer(
            ListenerKind::Click,
            PointerButton::Primary,
            Some(target),
            None,
            None,
        );
    }

    pub(crate) fn key_up_escape(&self) {
        let event = Event::Key { key: Key::Escape };
        let listeners = self.snapshot(|rec| {
            rec.kind == ListenerKind::KeyUp
                && matches!(rec.target, ListenerTarget::Document(_))
        });
        for listener in listeners {
            let _ = (*listener)(&event);
        }
    }

    pub(crate) fn resize(&self) {
        let event = Event::Resize;
        let listeners = self.snapshot(|rec| {
            rec.kind == ListenerKind::Resize && rec.target == ListenerTarget::Window
        });
        for listener in listeners {
            let _ = (*listener)(&event);
        }
    }

    pub(crate) fn scroll(&self, origin: Option<NodeId>) {
        let event = Event::Scroll { origin };
        let listeners = self.snapshot(|rec| {
            rec.kind == ListenerKind::Scroll && rec.target == ListenerTarget::Window
        });
        for listener in listeners {
            let _ = (*listener)(&event);
        }
    }

    // Inspection.

    pub(crate) fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    pub(crate) fn overlay_count(&self) -> usize {
        self.state.borrow().overlays.len()
    }

    pub(crate) fn renders(&self) -> Vec<(String, NodeId)> {
        self.state.borrow().renders.clone()
    }

    pub(crate) fn removed_overlays(&self) -> Vec<NodeId> {
        self.state.borrow().removed_overlays.clone()
    }

    pub(crate) fn offset(&self, overlay: NodeId) -> Option<Point> {
        self.state
            .borrow()
            .overlays
            .get(&overlay)
            .and_then(|data| data.offset)
    }

    pub(crate) fn visible(&self, overlay: NodeId) -> bool {
        self.state
            .borrow()
            .overlays
            .get(&overlay)
            .is_some_and(|data| data.visible)
    }

    pub(crate) fn open_class(&self, overlay: NodeId) -> Option<bool> {
        self.state
            .borrow()
            .overlays
            .get(&overlay)
            .and_then(|data| data.open)
    }

    pub(crate) fn class_of(&self, overlay: NodeId) -> String {
        self.state
            .borrow()
            .overlays
            .get(&overlay)
            .map(|data| data.class.clone())
            .unwrap_or_default()
    }

    fn dispatch_pointer(
        &self,
        kind: ListenerKind,
        button: PointerButton,
        target: Option<NodeId>,
        point: Option<Point>,
        document: Option<DocumentId>,
    ) {
        let document = document
            .or_else(|| target.and_then(|t| self.document_of(t)))
            .unwrap_or(DocumentId(0));
        let event = Event::Pointer {
            button,
            target,
            point,
            document,
        };

        let capture = self.snapshot(|rec| {
            rec.kind == kind && rec.target == ListenerTarget::Document(document)
        });
        for listener in capture {
            let _ = (*listener)(&event);
        }

        if let Some(target) = target {
            for node in self.ancestor_chain(target) {
                let listeners =
                    self.snapshot(|rec| rec.kind == kind && rec.target == ListenerTarget::Node(node));
                let mut consumed = false;
                for listener in listeners {
                    if (*listener)(&event) == Outcome::Consume {
                        consumed = true;
                    }
                }
                if consumed {
                    break;
                }
            }
        }
    }

    fn snapshot(&self, keep: impl Fn(&ListenerRec) -> bool) -> Vec<ListenerFn> {
        self.state
            .borrow()
            .listeners
            .iter()
            .filter(|rec| keep(rec))
            .map(|rec| rec.handler.clone())
            .collect()
    }

    fn document_of(&self, node: NodeId) -> Option<DocumentId> {
        self.state.borrow().nodes.get(&node).map(|data| data.document)
    }

    fn ancestor_chain(&self, node: NodeId) -> Vec<NodeId> {
        let state = self.state.borrow();
        let mut chain = vec![node];
        let mut current = node;
        while let Some(parent) = state.nodes.get(&current).and_then(|data| data.parent) {
            chain.push(parent);
            current = parent;
        }
        chain
    }
}

impl State {
    fn alloc_node(&mut self, document: DocumentId, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        self.nodes.insert(id, NodeData { parent, document });
        id
    }
}

impl Host for TestHost {
    fn anchor_state(&self, anchor: NodeId) -> Option<AnchorState> {
        self.state.borrow().anchors.get(&anchor).copied()
    }

    fn viewport(&self) -> Viewport {
        self.state.borrow().viewport
    }

    fn overlay_size(&self, overlay: NodeId) -> Option<Size> {
        self.state
            .borrow()
            .overlays
            .get(&overlay)
            .map(|_| DEFAULT_OVERLAY_SIZE)
    }

    fn create_overlay(&self, class_names: &str) -> NodeId {
        let mut state = self.state.borrow_mut();
        let node = state.alloc_node(DocumentId(0), None);
        state.overlays.insert(
            node,
            OverlayData {
                class: class_names.to_owned(),
                visible: true,
                open: None,
                offset: None,
            },
        );
        node
    }

    fn render_template(
        &self,
        template: &str,
        _data: Option<Rc<dyn Any>>,
        into: NodeId,
        done: Box<dyn FnOnce()>,
    ) {
        let done = {
            let mut state = self.state.borrow_mut();
            state.renders.push((template.to_owned(), into));
            if state.async_render {
                state.pending_renders.push(done);
                None
            } else {
                Some(done)
            }
        };
        // The borrow is released before completion runs; it may re-enter.
        if let Some(done) = done {
            done();
        }
    }

    fn remove_overlay(&self, overlay: NodeId) {
        let mut state = self.state.borrow_mut();
        state.overlays.remove(&overlay);
        state.nodes.remove(&overlay);
        state.removed_overlays.push(overlay);
    }

    fn set_overlay_offset(&self, overlay: NodeId, offset: Point) {
        if let Some(data) = self.state.borrow_mut().overlays.get_mut(&overlay) {
            data.offset = Some(offset);
        }
    }

    fn set_overlay_visible(&self, overlay: NodeId, visible: bool) {
        if let Some(data) = self.state.borrow_mut().overlays.get_mut(&overlay) {
            data.visible = visible;
        }
    }

    fn set_open_class(&self, overlay: NodeId, open: bool) {
        if let Some(data) = self.state.borrow_mut().overlays.get_mut(&overlay) {
            data.open = Some(open);
        }
    }

    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestor_chain(node).contains(&ancestor)
    }

    fn node_at(&self, document: DocumentId, point: Point) -> Option<NodeId> {
        self.state
            .borrow()
            .point_targets
            .get(&document)
            .and_then(|targets| {
                targets
                    .iter()
                    .find(|(at, _)| *at == point)
                    .map(|(_, node)| *node)
            })
    }

    fn documents(&self) -> Vec<DocumentId> {
        let count = self.state.borrow().documents.len();
        (0..count)
            .map(|index| DocumentId(u32::try_from(index).unwrap()))
            .collect()
    }

    fn add_listener(
        &self,
        target: ListenerTarget,
        kind: ListenerKind,
        handler: ListenerFn,
    ) -> Result<ListenerId, HostError> {
        let mut state = self.state.borrow_mut();
        if let ListenerTarget::Document(DocumentId(index)) = target {
            let accessible = state
                .documents
                .get(index as usize)
                .is_some_and(|doc| doc.accessible);
            if !accessible {
                return Err(HostError::CrossOriginFrame);
            }
        }
        let id = ListenerId(state.next_listener);
        state.next_listener += 1;
        state.listeners.push(ListenerRec {
            id,
            target,
            kind,
            handler,
        });
        Ok(id)
    }

    fn remove_listener(&self, listener: ListenerId) {
        self.state
            .borrow_mut()
            .listeners
            .retain(|rec| rec.id != listener);
    }

    fn on_node_removed(&self, node: NodeId, callback: Box<dyn FnOnce()>) {
        self.state
            .borrow_mut()
            .removal_hooks
            .entry(node)
            .or_default()
            .push(callback);
    }
}

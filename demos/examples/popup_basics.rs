// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Popup lifecycle basics.
//!
//! Binds a popup to an anchor through a minimal in-memory host, opens it with
//! an anchor press, watches the chosen position, and dismisses it with a
//! press outside both elements.
//!
//! Run:
//! - `cargo run -p canopy_examples --example popup_basics`

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use canopy_overlay::{
    DocumentId, Event, Host, HostError, ListenerFn, ListenerId, ListenerKind, ListenerTarget,
    NodeId, Outcome, PointerButton, Popup, PopupOptions,
};
use canopy_position::{AnchorState, Viewport};
use kurbo::{Point, Size};

/// One document, synchronous rendering, console output for style changes.
#[derive(Default)]
struct DemoHost {
    state: RefCell<DemoState>,
}

#[derive(Default)]
struct DemoState {
    next_id: u64,
    parents: HashMap<NodeId, Option<NodeId>>,
    anchors: HashMap<NodeId, AnchorState>,
    listeners: Vec<(ListenerId, ListenerTarget, ListenerKind, ListenerFn)>,
    removal: HashMap<NodeId, Vec<Box<dyn FnOnce()>>>,
}

impl DemoHost {
    fn add_node(&self, parent: Option<NodeId>) -> NodeId {
        let mut state = self.state.borrow_mut();
        let id = NodeId(state.next_id);
        state.next_id += 1;
        state.parents.insert(id, parent);
        id
    }

    fn add_anchor(&self, origin: Point, size: Size) -> NodeId {
        let node = self.add_node(None);
        self.state
            .borrow_mut()
            .anchors
            .insert(node, AnchorState::new(origin, size));
        node
    }

    /// Primary-button press: document listeners first, then the target chain.
    fn press(&self, target: NodeId) {
        let event = Event::Pointer {
            button: PointerButton::Primary,
            target: Some(target),
            point: None,
            document: DocumentId(0),
        };
        let capture: Vec<ListenerFn> = self
            .state
            .borrow()
            .listeners
            .iter()
            .filter(|(_, at, kind, _)| {
                *kind == ListenerKind::PointerDown && *at == ListenerTarget::Document(DocumentId(0))
            })
            .map(|(_, _, _, handler)| handler.clone())
            .collect();
        for handler in capture {
            let _ = (*handler)(&event);
        }

        let mut node = Some(target);
        while let Some(current) = node {
            let chain: Vec<ListenerFn> = self
                .state
                .borrow()
                .listeners
                .iter()
                .filter(|(_, at, kind, _)| {
                    *kind == ListenerKind::PointerDown && *at == ListenerTarget::Node(current)
                })
                .map(|(_, _, _, handler)| handler.clone())
                .collect();
            let consumed = chain
                .iter()
                .any(|handler| (**handler)(&event) == Outcome::Consume);
            if consumed {
                break;
            }
            node = self.state.borrow().parents.get(&current).copied().flatten();
        }
    }
}

impl Host for DemoHost {
    fn anchor_state(&self, anchor: NodeId) -> Option<AnchorState> {
        self.state.borrow().anchors.get(&anchor).copied()
    }

    fn viewport(&self) -> Viewport {
        Viewport::window(1024.0, 768.0)
    }

    fn overlay_size(&self, _overlay: NodeId) -> Option<Size> {
        Some(Size::new(160.0, 90.0))
    }

    fn create_overlay(&self, class_names: &str) -> NodeId {
        let node = self.add_node(None);
        println!("host: create overlay {node:?} class=\"{class_names}\"");
        node
    }

    fn render_template(
        &self,
        template: &str,
        _data: Option<Rc<dyn Any>>,
        into: NodeId,
        done: Box<dyn FnOnce()>,
    ) {
        println!("host: render template \"{template}\" into {into:?}");
        done();
    }

    fn remove_overlay(&self, overlay: NodeId) {
        println!("host: remove overlay {overlay:?}");
        self.state.borrow_mut().parents.remove(&overlay);
    }

    fn set_overlay_offset(&self, overlay: NodeId, offset: Point) {
        println!(
            "host: move overlay {overlay:?} to ({:.0}, {:.0})",
            offset.x, offset.y
        );
    }

    fn set_overlay_visible(&self, overlay: NodeId, visible: bool) {
        println!("host: overlay {overlay:?} visible={visible}");
    }

    fn set_open_class(&self, overlay: NodeId, open: bool) {
        let class = if open { "open" } else { "closed" };
        println!("host: overlay {overlay:?} tagged {class}");
    }

    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let state = self.state.borrow();
        let mut current = Some(node);
        while let Some(at) = current {
            if at == ancestor {
                return true;
            }
            current = state.parents.get(&at).copied().flatten();
        }
        false
    }

    fn node_at(&self, _document: DocumentId, _point: Point) -> Option<NodeId> {
        None
    }

    fn documents(&self) -> Vec<DocumentId> {
        vec![DocumentId(0)]
    }

    fn add_listener(
        &self,
        target: ListenerTarget,
        kind: ListenerKind,
        handler: ListenerFn,
    ) -> Result<ListenerId, HostError> {
        let mut state = self.state.borrow_mut();
        let id = ListenerId(state.next_id);
        state.next_id += 1;
        state.listeners.push((id, target, kind, handler));
        Ok(id)
    }

    fn remove_listener(&self, listener: ListenerId) {
        self.state
            .borrow_mut()
            .listeners
            .retain(|(id, ..)| *id != listener);
    }

    fn on_node_removed(&self, node: NodeId, callback: Box<dyn FnOnce()>) {
        self.state
            .borrow_mut()
            .removal
            .entry(node)
            .or_default()
            .push(callback);
    }
}

fn main() {
    let host = Rc::new(DemoHost::default());
    let anchor = host.add_anchor(Point::new(300.0, 120.0), Size::new(200.0, 50.0));
    let outside = host.add_node(None);

    let mut options = PopupOptions::new("menu");
    options.positioning = "outside-right middle".into();
    let popup = Popup::bind(host.clone(), anchor, options);

    let _watch = popup
        .best_position()
        .subscribe(|position| println!("watch: best position is now {position}"));

    println!("== Press the anchor ==");
    host.press(anchor);
    println!("open: {}", popup.is_open());

    println!("== Press outside ==");
    host.press(outside);
    println!("open: {}", popup.is_open());
}

// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The popup lifecycle: binding, open/close state machine, and dismissal.
//!
//! ## Overview
//!
//! [`Popup::bind`] attaches an overlay to an anchor through a [`Host`] and
//! returns a handle. The open/closed desire lives in a reactive boolean cell
//! (supplied or created); the state machine follows it through
//! `Closed → Opening → Open → Closing → Closed`, running the configured hooks
//! strictly in order around rendering and teardown.
//!
//! ## Serialization
//!
//! Rendering may complete asynchronously, so transitions are driven by a
//! settle loop: after each completed transition it re-samples the *current*
//! desired state and continues until phase and desire agree. Rapid toggling
//! coalesces — a close requested while an open's render callback is in
//! flight is honored once that callback fires, never interleaved with it.
//!
//! ## Dismissal
//!
//! While open, the popup listens (through the host) for presses in the top
//! document and every accessible sub-document; a primary-button press that
//! lands outside both the anchor and the overlay closes it. Escape handling
//! goes through the shared [`escape`](crate::escape) stack so only the
//! topmost open popup responds.

use core::fmt;
use std::cell::RefCell;
use std::mem;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use canopy_position::{Placement, Position, anchored_offset, clamp_to_viewport, place};

use crate::config::{DismissEvent, Hooks, PopupFlags, PopupOptions, PositionCell, Setting};
use crate::escape::{self, EntryId, EscapeSink};
use crate::host::{
    Event, Host, ListenerFn, ListenerId, ListenerKind, ListenerTarget, NodeId, Outcome,
    PointerButton,
};
use crate::reactive::{Subscription, Value};

/// Class carried by every overlay container, ahead of any configured extras.
const POPUP_CLASS: &str = "popup";

/// Lifecycle phase of a popup.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Phase {
    /// No overlay showing; the initial state.
    #[default]
    Closed,
    /// Open requested; rendering may still be in flight.
    Opening,
    /// Overlay rendered, positioned, visible, dismissal armed.
    Open,
    /// Close in progress.
    Closing,
}

/// Handle for one anchor-overlay binding.
///
/// Clones share the binding. The binding tears itself down when the anchor is
/// removed from the document, or when the last handle drops — whichever
/// comes first.
#[derive(Clone)]
pub struct Popup {
    core: Rc<RefCell<Core>>,
}

struct Core {
    host: Rc<dyn Host>,
    anchor: NodeId,
    overlay: Option<NodeId>,
    phase: Phase,
    settling: bool,
    disposed: bool,
    /// Bumped whenever an outstanding render callback becomes stale.
    epoch: u64,
    open_state: Value<bool>,
    best_position: Value<Position>,
    template: Value<String>,
    data: Option<Rc<dyn std::any::Any>>,
    positioning: Vec<PositionCell>,
    class_name: String,
    flags: PopupFlags,
    dismiss_on: DismissEvent,
    disable: Setting<bool>,
    disposal: Option<Rc<dyn Fn(NodeId)>>,
    hooks: Hooks,
    /// Listeners attached while open; detached at close-transition start.
    dismiss_listeners: Vec<ListenerId>,
    /// The bind-lifetime anchor toggle listener.
    anchor_listener: Option<ListenerId>,
    escape_entry: Option<EntryId>,
    escape_sink: Option<Rc<dyn EscapeSink>>,
    subscriptions: Vec<Subscription>,
}

impl Popup {
    /// Bind an overlay to `anchor`.
    ///
    /// Normalizes the options, wires the reactive subscriptions (open state,
    /// template, positioning axes), installs the anchor toggle when
    /// configured, registers anchor-detach cleanup with the host, performs
    /// the eager render in persistent mode, and honors an initially-true
    /// open state immediately.
    pub fn bind(host: Rc<dyn Host>, anchor: NodeId, options: PopupOptions) -> Self {
        let PopupOptions {
            template,
            data,
            open_state,
            positioning,
            class_name,
            flags,
            dismiss_on,
            disable,
            disposal,
            hooks,
        } = options;
        let open_state = open_state.unwrap_or_else(|| Value::distinct(false));
        let core = Rc::new(RefCell::new(Core {
            host,
            anchor,
            overlay: None,
            phase: Phase::Closed,
            settling: false,
            disposed: false,
            epoch: 0,
            open_state: open_state.clone(),
            best_position: Value::distinct(Position::default()),
            template: template.into_value(),
            data,
            positioning: positioning.normalize(),
            class_name,
            flags,
            dismiss_on,
            disable,
            disposal,
            hooks,
            dismiss_listeners: Vec::new(),
            anchor_listener: None,
            escape_entry: None,
            escape_sink: None,
            subscriptions: Vec::new(),
        }));

        wire(&core);
        if flags.contains(PopupFlags::RENDER_ON_INIT) {
            initial_render(&core);
        }
        if open_state.get() {
            settle(&core);
        }
        Self { core }
    }

    /// The open-state cell. Writing it requests a transition; dismissal
    /// writes through it, so external subscribers observe closes too.
    pub fn open_state(&self) -> Value<bool> {
        self.core.borrow().open_state.clone()
    }

    /// The currently chosen position. Notifies only on semantic change.
    pub fn best_position(&self) -> Value<Position> {
        self.core.borrow().best_position.clone()
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.core.borrow().phase
    }

    /// Whether the popup is fully open.
    pub fn is_open(&self) -> bool {
        self.phase() == Phase::Open
    }

    /// The overlay container, once one exists.
    pub fn overlay(&self) -> Option<NodeId> {
        self.core.borrow().overlay
    }

    /// Request open.
    pub fn open(&self) {
        self.open_state().set(true);
    }

    /// Request close.
    pub fn close(&self) {
        self.open_state().set(false);
    }

    /// Flip the open state.
    pub fn toggle(&self) {
        let open_state = self.open_state();
        open_state.set(!open_state.get());
    }

    /// Recompute the best position and re-apply the clamped offset. A no-op
    /// while no overlay exists.
    pub fn reposition(&self) {
        reposition(&self.core);
    }

    /// Tear the binding down: detach every listener and subscription and
    /// remove (or hand off) the overlay. Runs automatically on anchor
    /// detach; idempotent.
    pub fn dispose(&self) {
        dispose(&self.core);
    }
}

impl Drop for Popup {
    fn drop(&mut self) {
        if Rc::strong_count(&self.core) == 1 {
            dispose(&self.core);
        }
    }
}

impl fmt::Debug for Popup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.core.borrow();
        f.debug_struct("Popup")
            .field("phase", &core.phase)
            .field("overlay", &core.overlay)
            .finish_non_exhaustive()
    }
}

struct EscapeAdapter {
    core: Weak<RefCell<Core>>,
}

impl EscapeSink for EscapeAdapter {
    fn escape_requested(&self) {
        if let Some(core) = self.core.upgrade() {
            let open_state = core.borrow().open_state.clone();
            open_state.set(false);
        }
    }
}

fn compose_class(extra: &str) -> String {
    if extra.is_empty() {
        POPUP_CLASS.to_owned()
    } else {
        format!("{POPUP_CLASS} {extra}")
    }
}

fn wire(core: &Rc<RefCell<Core>>) {
    let mut subscriptions = Vec::new();

    let open_state = core.borrow().open_state.clone();
    let weak = Rc::downgrade(core);
    subscriptions.push(open_state.subscribe(move |_| {
        if let Some(core) = weak.upgrade() {
            settle(&core);
        }
    }));

    let template = core.borrow().template.clone();
    let weak = Rc::downgrade(core);
    subscriptions.push(template.subscribe(move |_| {
        if let Some(core) = weak.upgrade() {
            rerender(&core);
        }
    }));

    let cells = core.borrow().positioning.clone();
    for cell in cells {
        let weak = Rc::downgrade(core);
        subscriptions.push(cell.horizontal.subscribe(move |_| {
            if let Some(core) = weak.upgrade() {
                reposition(&core);
            }
        }));
        let weak = Rc::downgrade(core);
        subscriptions.push(cell.vertical.subscribe(move |_| {
            if let Some(core) = weak.upgrade() {
                reposition(&core);
            }
        }));
    }
    core.borrow_mut().subscriptions = subscriptions;

    let (host, anchor, wants_toggle) = {
        let c = core.borrow();
        (
            c.host.clone(),
            c.anchor,
            c.flags.contains(PopupFlags::ANCHOR_HANDLER),
        )
    };
    if wants_toggle {
        let weak = Rc::downgrade(core);
        let handler: ListenerFn = Rc::new(move |event| match weak.upgrade() {
            Some(core) => on_anchor_press(&core, event),
            None => Outcome::Continue,
        });
        match host.add_listener(ListenerTarget::Node(anchor), ListenerKind::PointerDown, handler) {
            Ok(id) => core.borrow_mut().anchor_listener = Some(id),
            Err(err) => trace!(%err, "anchor toggle listener not attached"),
        }
    }

    let weak = Rc::downgrade(core);
    host.on_node_removed(
        anchor,
        Box::new(move || {
            if let Some(core) = weak.upgrade() {
                dispose(&core);
            }
        }),
    );
}

/// Persistent-mode eager render: create and fill the overlay, position it,
/// and leave it hidden with the `closed` tag.
fn initial_render(core: &Rc<RefCell<Core>>) {
    let (host, class, template, data, epoch) = {
        let mut c = core.borrow_mut();
        c.epoch += 1;
        (
            c.host.clone(),
            compose_class(&c.class_name),
            c.template.get(),
            c.data.clone(),
            c.epoch,
        )
    };
    let node = host.create_overlay(&class);
    core.borrow_mut().overlay = Some(node);
    let weak = Rc::downgrade(core);
    host.render_template(
        &template,
        data,
        node,
        Box::new(move || {
            let Some(core) = weak.upgrade() else { return };
            let fresh = {
                let c = core.borrow();
                !c.disposed && c.epoch == epoch && c.phase == Phase::Closed
            };
            if fresh {
                reposition(&core);
                let host = core.borrow().host.clone();
                host.set_open_class(node, false);
                host.set_overlay_visible(node, false);
            }
        }),
    );
}

/// Drive transitions until the phase agrees with the desired open state.
///
/// Re-entrant calls (from hooks, subscribers, or dismissal handlers firing
/// mid-transition) return immediately; the running loop re-samples after
/// every completed transition, so their request is picked up in order.
fn settle(core: &Rc<RefCell<Core>>) {
    if !enter_settle(core) {
        return;
    }
    drain(core);
    exit_settle(core);
}

fn enter_settle(core: &Rc<RefCell<Core>>) -> bool {
    let mut c = core.borrow_mut();
    if c.settling || c.disposed {
        return false;
    }
    c.settling = true;
    true
}

fn exit_settle(core: &Rc<RefCell<Core>>) {
    core.borrow_mut().settling = false;
}

enum Step {
    Open,
    Close,
}

fn drain(core: &Rc<RefCell<Core>>) {
    loop {
        let step = {
            let c = core.borrow();
            if c.disposed {
                break;
            }
            let desired = c.open_state.get();
            match (c.phase, desired) {
                (Phase::Closed, true) => {
                    if c.disable.get() {
                        trace!("open request ignored; disabled");
                        None
                    } else {
                        Some(Step::Open)
                    }
                }
                (Phase::Open, false) => Some(Step::Close),
                _ => None,
            }
        };
        match step {
            Some(Step::Open) => {
                if !begin_open(core) {
                    // Suspended on an asynchronous render; the completion
                    // callback re-enters the loop.
                    break;
                }
            }
            Some(Step::Close) => run_close(core),
            None => break,
        }
    }
}

/// Start the open transition. Returns true when it completed synchronously.
fn begin_open(core: &Rc<RefCell<Core>>) -> bool {
    let (host, before_open) = {
        let mut c = core.borrow_mut();
        c.phase = Phase::Opening;
        (c.host.clone(), c.hooks.before_open.clone())
    };
    debug!("opening");
    (*before_open)();
    if core.borrow().disposed {
        return false;
    }

    if core.borrow().overlay.is_some() {
        // Already rendered (persistent mode, or a re-open): show directly.
        finish_open(core);
        return true;
    }

    let (class, template, data, epoch) = {
        let mut c = core.borrow_mut();
        c.epoch += 1;
        (
            compose_class(&c.class_name),
            c.template.get(),
            c.data.clone(),
            c.epoch,
        )
    };
    let node = host.create_overlay(&class);
    core.borrow_mut().overlay = Some(node);
    let weak = Rc::downgrade(core);
    host.render_template(
        &template,
        data,
        node,
        Box::new(move || {
            if let Some(core) = weak.upgrade() {
                open_render_done(&core, epoch);
            }
        }),
    );
    // A synchronous host has already run the completion; otherwise we are
    // suspended in `Opening` until it fires.
    core.borrow().phase == Phase::Open
}

fn open_render_done(core: &Rc<RefCell<Core>>, epoch: u64) {
    {
        let c = core.borrow();
        if c.disposed || c.epoch != epoch || c.phase != Phase::Opening {
            return;
        }
    }
    let nested = !enter_settle(core);
    finish_open(core);
    if !nested {
        // Sample the desired state as of now: a close requested while the
        // render was in flight runs immediately after the open completes.
        drain(core);
        exit_settle(core);
    }
}

fn finish_open(core: &Rc<RefCell<Core>>) {
    let (host, overlay, after_open, wants_escape) = {
        let c = core.borrow();
        (
            c.host.clone(),
            c.overlay,
            c.hooks.after_open.clone(),
            c.flags.contains(PopupFlags::CLOSE_ON_ESC),
        )
    };
    let Some(overlay) = overlay else { return };

    reposition(core);
    host.set_open_class(overlay, true);
    host.set_overlay_visible(overlay, true);
    attach_dismiss_listeners(core);
    if wants_escape {
        register_escape(core);
    }
    core.borrow_mut().phase = Phase::Open;
    debug!("open");
    (*after_open)();
}

fn run_close(core: &Rc<RefCell<Core>>) {
    let before_close = {
        let mut c = core.borrow_mut();
        c.phase = Phase::Closing;
        c.hooks.before_close.clone()
    };
    debug!("closing");
    (*before_close)();
    unregister_escape(core);
    detach_dismiss_listeners(core);

    let (host, overlay, persistent, disposal, after_close) = {
        let mut c = core.borrow_mut();
        let persistent = c.flags.contains(PopupFlags::RENDER_ON_INIT);
        let overlay = c.overlay;
        if !persistent {
            c.overlay = None;
            c.epoch += 1;
        }
        (
            c.host.clone(),
            overlay,
            persistent,
            c.disposal.clone(),
            c.hooks.after_close.clone(),
        )
    };
    if let Some(node) = overlay {
        host.set_open_class(node, false);
        if persistent {
            host.set_overlay_visible(node, false);
        } else {
            match &disposal {
                Some(callback) => (**callback)(node),
                None => host.remove_overlay(node),
            }
        }
    }
    core.borrow_mut().phase = Phase::Closed;
    debug!("closed");
    (*after_close)();
}

/// Recompute placement and apply the clamped offset.
///
/// No-op without an overlay or once the anchor is unmeasurable. While the
/// popup is closed (persistent mode), candidate evaluation is skipped and the
/// first configured candidate is applied as-is.
fn reposition(core: &Rc<RefCell<Core>>) {
    let snapshot = {
        let c = core.borrow();
        c.overlay.map(|overlay| {
            (
                c.host.clone(),
                c.anchor,
                overlay,
                c.phase,
                c.positioning
                    .iter()
                    .map(PositionCell::current)
                    .collect::<Vec<_>>(),
                c.best_position.clone(),
            )
        })
    };
    let Some((host, anchor, overlay, phase, candidates, best_position)) = snapshot else {
        return;
    };
    let Some(anchor_state) = host.anchor_state(anchor) else {
        trace!("anchor unmeasurable; not repositioning");
        return;
    };
    let Some(size) = host.overlay_size(overlay) else {
        return;
    };
    let viewport = host.viewport();

    let placement = if matches!(phase, Phase::Opening | Phase::Open) {
        place(anchor_state, size, &candidates, viewport)
    } else {
        let position = candidates.first().copied().unwrap_or_default();
        let ideal = anchored_offset(anchor_state, size, position);
        Placement {
            position,
            offset: clamp_to_viewport(ideal, size, viewport),
        }
    };
    trace!(position = %placement.position, "repositioned");
    best_position.set(placement.position);
    host.set_overlay_offset(overlay, placement.offset);
}

/// Re-render after a template change, then reposition for the new content.
/// Skipped while a transition's own render is in flight.
fn rerender(core: &Rc<RefCell<Core>>) {
    let snapshot = {
        let mut c = core.borrow_mut();
        if c.disposed || matches!(c.phase, Phase::Opening | Phase::Closing) {
            None
        } else {
            let overlay = c.overlay;
            overlay.map(|overlay| {
                c.epoch += 1;
                (
                    c.host.clone(),
                    c.template.get(),
                    c.data.clone(),
                    overlay,
                    c.epoch,
                )
            })
        }
    };
    let Some((host, template, data, overlay, epoch)) = snapshot else {
        return;
    };
    debug!(template = %template, "template changed; re-rendering");
    let weak = Rc::downgrade(core);
    host.render_template(
        &template,
        data,
        overlay,
        Box::new(move || {
            if let Some(core) = weak.upgrade() {
                let fresh = {
                    let c = core.borrow();
                    !c.disposed && c.epoch == epoch
                };
                if fresh {
                    reposition(&core);
                }
            }
        }),
    );
}

fn attach_dismiss_listeners(core: &Rc<RefCell<Core>>) {
    let (host, flags, dismiss_on) = {
        let c = core.borrow();
        (c.host.clone(), c.flags, c.dismiss_on)
    };
    let mut ids = Vec::new();

    let press_kind = match dismiss_on {
        DismissEvent::PointerDown => ListenerKind::PointerDown,
        DismissEvent::Click => ListenerKind::Click,
    };
    for document in host.documents() {
        if flags.contains(PopupFlags::OUTSIDE_HANDLER) {
            let weak = Rc::downgrade(core);
            let handler: ListenerFn = Rc::new(move |event| match weak.upgrade() {
                Some(core) => on_outside_press(&core, event),
                None => Outcome::Continue,
            });
            match host.add_listener(ListenerTarget::Document(document), press_kind, handler) {
                Ok(id) => ids.push(id),
                // Inaccessible frame contents are expected; skip them.
                Err(err) => trace!(?document, %err, "skipping sub-document for dismissal"),
            }
        }
        if flags.contains(PopupFlags::CLOSE_ON_PRESS_IN_POPUP) {
            let weak = Rc::downgrade(core);
            let handler: ListenerFn = Rc::new(move |event| match weak.upgrade() {
                Some(core) => on_press_in_popup(&core, event),
                None => Outcome::Continue,
            });
            match host.add_listener(ListenerTarget::Document(document), ListenerKind::Click, handler)
            {
                Ok(id) => ids.push(id),
                Err(err) => trace!(?document, %err, "skipping sub-document for in-popup close"),
            }
        }
    }

    let weak = Rc::downgrade(core);
    let handler: ListenerFn = Rc::new(move |event| {
        if matches!(event, Event::Resize)
            && let Some(core) = weak.upgrade()
        {
            reposition(&core);
        }
        Outcome::Continue
    });
    if let Ok(id) = host.add_listener(ListenerTarget::Window, ListenerKind::Resize, handler) {
        ids.push(id);
    }

    let weak = Rc::downgrade(core);
    let handler: ListenerFn = Rc::new(move |event| {
        if let Event::Scroll { origin } = event
            && let Some(core) = weak.upgrade()
        {
            on_scroll(&core, *origin);
        }
        Outcome::Continue
    });
    if let Ok(id) = host.add_listener(ListenerTarget::Window, ListenerKind::Scroll, handler) {
        ids.push(id);
    }

    core.borrow_mut().dismiss_listeners = ids;
}

fn detach_dismiss_listeners(core: &Rc<RefCell<Core>>) {
    let (host, listeners) = {
        let mut c = core.borrow_mut();
        (c.host.clone(), mem::take(&mut c.dismiss_listeners))
    };
    for id in listeners {
        host.remove_listener(id);
    }
}

fn register_escape(core: &Rc<RefCell<Core>>) {
    let host = core.borrow().host.clone();
    let sink: Rc<dyn EscapeSink> = Rc::new(EscapeAdapter {
        core: Rc::downgrade(core),
    });
    let entry = escape::with_stack(|stack| stack.register(&host, Rc::downgrade(&sink)));
    let mut c = core.borrow_mut();
    c.escape_entry = Some(entry);
    c.escape_sink = Some(sink);
}

fn unregister_escape(core: &Rc<RefCell<Core>>) {
    let entry = {
        let mut c = core.borrow_mut();
        c.escape_sink = None;
        c.escape_entry.take()
    };
    if let Some(entry) = entry {
        escape::with_stack(|stack| stack.unregister(entry));
    }
}

fn on_anchor_press(core: &Rc<RefCell<Core>>, event: &Event) -> Outcome {
    let Event::Pointer {
        button: PointerButton::Primary,
        ..
    } = event
    else {
        return Outcome::Continue;
    };
    let open_state = core.borrow().open_state.clone();
    open_state.set(!open_state.get());
    Outcome::Consume
}

fn on_outside_press(core: &Rc<RefCell<Core>>, event: &Event) -> Outcome {
    let &Event::Pointer {
        button,
        target,
        point,
        document,
    } = event
    else {
        return Outcome::Continue;
    };
    if button != PointerButton::Primary {
        return Outcome::Continue;
    }
    let (host, anchor, overlay, open_state) = {
        let c = core.borrow();
        (c.host.clone(), c.anchor, c.overlay, c.open_state.clone())
    };
    if !open_state.get() {
        return Outcome::Continue;
    }
    let Some(overlay) = overlay else {
        return Outcome::Continue;
    };
    // Cross-document dispatch may arrive without a target; resolve one from
    // the press coordinates.
    let Some(target) = target.or_else(|| point.and_then(|p| host.node_at(document, p))) else {
        return Outcome::Continue;
    };
    if !host.is_ancestor(anchor, target) && !host.is_ancestor(overlay, target) {
        debug!("outside press; dismissing");
        open_state.set(false);
    }
    Outcome::Continue
}

fn on_press_in_popup(core: &Rc<RefCell<Core>>, event: &Event) -> Outcome {
    let &Event::Pointer {
        button,
        target,
        point,
        document,
    } = event
    else {
        return Outcome::Continue;
    };
    if button != PointerButton::Primary {
        return Outcome::Continue;
    }
    let (host, overlay, open_state) = {
        let c = core.borrow();
        (c.host.clone(), c.overlay, c.open_state.clone())
    };
    if !open_state.get() {
        return Outcome::Continue;
    }
    let Some(overlay) = overlay else {
        return Outcome::Continue;
    };
    let Some(target) = target.or_else(|| point.and_then(|p| host.node_at(document, p))) else {
        return Outcome::Continue;
    };
    if host.is_ancestor(overlay, target) {
        debug!("press inside popup; dismissing");
        open_state.set(false);
    }
    Outcome::Continue
}

fn on_scroll(core: &Rc<RefCell<Core>>, origin: Option<NodeId>) {
    let (host, overlay) = {
        let c = core.borrow();
        (c.host.clone(), c.overlay)
    };
    if let (Some(overlay), Some(origin)) = (overlay, origin)
        && host.is_ancestor(overlay, origin)
    {
        trace!("scroll originated inside the overlay; not repositioning");
        return;
    }
    reposition(core);
}

fn dispose(core: &Rc<RefCell<Core>>) {
    {
        let mut c = core.borrow_mut();
        if c.disposed {
            return;
        }
        c.disposed = true;
    }
    debug!("disposing");
    unregister_escape(core);
    detach_dismiss_listeners(core);
    let (host, anchor_listener, overlay, disposal, subscriptions) = {
        let mut c = core.borrow_mut();
        c.phase = Phase::Closed;
        c.epoch += 1;
        (
            c.host.clone(),
            c.anchor_listener.take(),
            c.overlay.take(),
            c.disposal.clone(),
            mem::take(&mut c.subscriptions),
        )
    };
    if let Some(id) = anchor_listener {
        host.remove_listener(id);
    }
    drop(subscriptions);
    if let Some(node) = overlay {
        match &disposal {
            Some(callback) => (**callback)(node),
            None => host.remove_overlay(node),
        }
    }
}

// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Binding configuration: options, flags, hooks, and positioning input forms.

use core::fmt;
use std::any::Any;
use std::rc::Rc;

use canopy_position::{Horizontal, Position, Vertical};

use crate::host::NodeId;
use crate::reactive::Value;

bitflags::bitflags! {
    /// Behavior switches fixed at bind time.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct PopupFlags: u8 {
        /// Persistent mode: render eagerly at bind, hide/show on
        /// close/open, destroy only at anchor detach. Off means ephemeral
        /// mode: render at open, destroy at close.
        const RENDER_ON_INIT = 0b0000_0001;
        /// Toggle open state on a primary-button press on the anchor.
        const ANCHOR_HANDLER = 0b0000_0010;
        /// Dismiss on presses landing outside the anchor and overlay.
        const OUTSIDE_HANDLER = 0b0000_0100;
        /// Participate in escape-key dismissal.
        const CLOSE_ON_ESC = 0b0000_1000;
        /// Also dismiss when a click lands inside the overlay.
        const CLOSE_ON_PRESS_IN_POPUP = 0b0001_0000;
    }
}

impl Default for PopupFlags {
    fn default() -> Self {
        Self::ANCHOR_HANDLER | Self::OUTSIDE_HANDLER | Self::CLOSE_ON_ESC
    }
}

/// Which pointer event triggers outside dismissal.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum DismissEvent {
    /// Dismiss on pointer press (the default; dismissal happens before any
    /// click handler in the pressed element fires).
    #[default]
    PointerDown,
    /// Dismiss on completed click.
    Click,
}

/// A configuration setting that is either fixed or an existing reactive cell.
pub enum Setting<T> {
    /// A plain value.
    Fixed(T),
    /// A shared reactive cell, preserved as-is.
    Reactive(Value<T>),
}

impl<T: Clone + 'static> Setting<T> {
    /// The current value.
    pub fn get(&self) -> T {
        match self {
            Self::Fixed(value) => value.clone(),
            Self::Reactive(value) => value.get(),
        }
    }

    /// The setting as a cell: reactive input keeps its identity, fixed input
    /// is wrapped. This is what makes normalization idempotent — a cell that
    /// went in comes back out unchanged.
    pub fn into_value(self) -> Value<T> {
        match self {
            Self::Fixed(value) => Value::new(value),
            Self::Reactive(value) => value,
        }
    }
}

impl<T> From<T> for Setting<T> {
    fn from(value: T) -> Self {
        Self::Fixed(value)
    }
}

impl<T> From<Value<T>> for Setting<T> {
    fn from(value: Value<T>) -> Self {
        Self::Reactive(value)
    }
}

impl From<&str> for Setting<String> {
    fn from(value: &str) -> Self {
        Self::Fixed(value.to_owned())
    }
}

impl<T: fmt::Debug> fmt::Debug for Setting<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(value) => f.debug_tuple("Fixed").field(value).finish(),
            Self::Reactive(value) => f.debug_tuple("Reactive").field(value).finish(),
        }
    }
}

/// One axis of a positioning candidate, in any accepted input form.
pub enum AxisSpec<A: 'static> {
    /// Use the axis default.
    Default,
    /// A fixed token.
    Fixed(A),
    /// A raw token string, validated with silent fallback to the axis
    /// default.
    Named(String),
    /// An existing reactive cell, preserved as-is.
    Reactive(Value<A>),
}

impl<A: fmt::Debug> fmt::Debug for AxisSpec<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("Default"),
            Self::Fixed(token) => f.debug_tuple("Fixed").field(token).finish(),
            Self::Named(raw) => f.debug_tuple("Named").field(raw).finish(),
            Self::Reactive(value) => f.debug_tuple("Reactive").field(value).finish(),
        }
    }
}

impl AxisSpec<Horizontal> {
    fn into_cell(self) -> Value<Horizontal> {
        match self {
            Self::Default => Value::new(Horizontal::default()),
            Self::Fixed(token) => Value::new(token),
            Self::Named(raw) => Value::new(Horizontal::from_token(&raw).unwrap_or_default()),
            Self::Reactive(value) => value,
        }
    }
}

impl AxisSpec<Vertical> {
    fn into_cell(self) -> Value<Vertical> {
        match self {
            Self::Default => Value::new(Vertical::default()),
            Self::Fixed(token) => Value::new(token),
            Self::Named(raw) => Value::new(Vertical::from_token(&raw).unwrap_or_default()),
            Self::Reactive(value) => value,
        }
    }
}

/// One positioning candidate in input form.
#[derive(Debug)]
pub struct PositionSpec {
    /// Horizontal axis input.
    pub horizontal: AxisSpec<Horizontal>,
    /// Vertical axis input.
    pub vertical: AxisSpec<Vertical>,
}

impl Default for PositionSpec {
    fn default() -> Self {
        Self {
            horizontal: AxisSpec::Default,
            vertical: AxisSpec::Default,
        }
    }
}

impl PositionSpec {
    /// Both axes from fixed tokens.
    pub fn tokens(horizontal: Horizontal, vertical: Vertical) -> Self {
        Self {
            horizontal: AxisSpec::Fixed(horizontal),
            vertical: AxisSpec::Fixed(vertical),
        }
    }
}

impl From<Position> for PositionSpec {
    fn from(position: Position) -> Self {
        Self::tokens(position.horizontal, position.vertical)
    }
}

/// One normalized candidate: both axes as reactive cells.
///
/// Downstream consumers always read through [`PositionCell::current`]; whether
/// the configuration supplied plain tokens or live cells is invisible past
/// normalization.
#[derive(Clone, Debug)]
pub struct PositionCell {
    /// Horizontal token cell.
    pub horizontal: Value<Horizontal>,
    /// Vertical token cell.
    pub vertical: Value<Vertical>,
}

impl PositionCell {
    /// The candidate's current token pair.
    pub fn current(&self) -> Position {
        Position::new(self.horizontal.get(), self.vertical.get())
    }
}

/// Positioning configuration input.
///
/// A single candidate is equivalent to a one-element list; the normalized
/// form is always a non-empty ordered list, first = most preferred.
#[derive(Debug)]
pub enum Positioning {
    /// A space-separated token string, e.g. `"outside-right middle"`; the
    /// trailing token may be omitted. Unrecognized tokens fall back.
    Tokens(String),
    /// A single candidate.
    Pair(PositionSpec),
    /// Ordered candidates, most preferred first. An empty list normalizes to
    /// the single default candidate.
    Many(Vec<PositionSpec>),
}

impl Default for Positioning {
    fn default() -> Self {
        Self::Pair(PositionSpec::default())
    }
}

impl Positioning {
    /// Normalize to the uniform reactive candidate list.
    pub(crate) fn normalize(self) -> Vec<PositionCell> {
        let specs = match self {
            Self::Tokens(raw) => vec![Position::from_tokens(&raw).into()],
            Self::Pair(spec) => vec![spec],
            Self::Many(specs) if specs.is_empty() => vec![PositionSpec::default()],
            Self::Many(specs) => specs,
        };
        specs
            .into_iter()
            .map(|spec| PositionCell {
                horizontal: spec.horizontal.into_cell(),
                vertical: spec.vertical.into_cell(),
            })
            .collect()
    }
}

impl From<&str> for Positioning {
    fn from(raw: &str) -> Self {
        Self::Tokens(raw.to_owned())
    }
}

impl From<Position> for Positioning {
    fn from(position: Position) -> Self {
        Self::Pair(position.into())
    }
}

impl From<Vec<PositionSpec>> for Positioning {
    fn from(specs: Vec<PositionSpec>) -> Self {
        Self::Many(specs)
    }
}

/// Lifecycle hooks, each defaulting to a no-op.
///
/// Ordering guarantee: `before_open → (render) → after_open` and
/// `before_close → (hide/remove) → after_close`, strictly; the next
/// transition never starts before the previous terminal hook has returned.
pub struct Hooks {
    /// Runs before the open transition does any work.
    pub before_open: Rc<dyn Fn()>,
    /// Runs once the overlay is rendered, positioned, and visible.
    pub after_open: Rc<dyn Fn()>,
    /// Runs before listeners detach and the overlay hides.
    pub before_close: Rc<dyn Fn()>,
    /// Runs once the overlay is hidden or removed.
    pub after_close: Rc<dyn Fn()>,
}

impl Default for Hooks {
    fn default() -> Self {
        let noop: Rc<dyn Fn()> = Rc::new(|| {});
        Self {
            before_open: noop.clone(),
            after_open: noop.clone(),
            before_close: noop.clone(),
            after_close: noop,
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks").finish_non_exhaustive()
    }
}

/// Everything a popup binding accepts.
///
/// Construct with [`PopupOptions::new`] and adjust fields; the defaults match
/// an ephemeral, anchor-toggled, outside-and-escape-dismissed popup opening
/// below its anchor.
pub struct PopupOptions {
    /// Template to render into the overlay; reactive input re-renders the
    /// open overlay on change.
    pub template: Setting<String>,
    /// Explicit data context; `None` inherits the anchor's context.
    pub data: Option<Rc<dyn Any>>,
    /// Open-state cell; created (initially closed) when absent. Dismissal
    /// writes through this cell, so external subscribers observe it.
    pub open_state: Option<Value<bool>>,
    /// Placement candidates.
    pub positioning: Positioning,
    /// Extra class names for the overlay container.
    pub class_name: String,
    /// Behavior switches.
    pub flags: PopupFlags,
    /// Which pointer event dismisses.
    pub dismiss_on: DismissEvent,
    /// While true, open requests are ignored.
    pub disable: Setting<bool>,
    /// Receives the overlay node instead of the default removal, and then
    /// owns taking it out of the document (e.g. after an animation).
    pub disposal: Option<Rc<dyn Fn(NodeId)>>,
    /// Lifecycle hooks.
    pub hooks: Hooks,
}

impl PopupOptions {
    /// Options for the given template with all defaults.
    pub fn new(template: impl Into<Setting<String>>) -> Self {
        Self {
            template: template.into(),
            data: None,
            open_state: None,
            positioning: Positioning::default(),
            class_name: String::new(),
            flags: PopupFlags::default(),
            dismiss_on: DismissEvent::default(),
            disable: Setting::Fixed(false),
            disposal: None,
            hooks: Hooks::default(),
        }
    }
}

impl fmt::Debug for PopupOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PopupOptions")
            .field("template", &self.template)
            .field("positioning", &self.positioning)
            .field("class_name", &self.class_name)
            .field("flags", &self.flags)
            .field("dismiss_on", &self.dismiss_on)
            .finish_non_exhaustive()
    }
}

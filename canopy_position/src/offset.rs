// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The offset calculator: the per-axis placement rule table.

use kurbo::{Point, Size};

use crate::round;
use crate::tokens::{Horizontal, Position, Vertical};

/// A fresh measurement of an anchor box.
///
/// `origin` is the page offset of the anchor's top-left corner; `size` is its
/// outer size (border and padding included). Anchors move and resize between
/// repositions, so callers measure per call rather than caching.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct AnchorState {
    /// Page offset of the top-left corner.
    pub origin: Point,
    /// Outer size.
    pub size: Size,
}

impl AnchorState {
    /// Bundle an origin and outer size.
    pub const fn new(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }
}

/// Compute the overlay's ideal top-left page offset for one candidate.
///
/// Each axis applies its token's rule to the anchor's origin:
///
/// | horizontal      | effect on `x`                                      |
/// |-----------------|----------------------------------------------------|
/// | `inside-left`   | unchanged                                          |
/// | `outside-left`  | − overlay width                                    |
/// | `middle`        | + round(anchor width / 2) − round(overlay width / 2) |
/// | `inside-right`  | + anchor width − overlay width                     |
/// | `outside-right` | + anchor width                                     |
///
/// and symmetrically for the vertical axis with heights. The two halvings of
/// `middle` round independently, ties away from zero, so odd sizes place
/// deterministically. Pure: inputs are unchanged and no measurement happens
/// here.
pub fn anchored_offset(anchor: AnchorState, overlay: Size, position: Position) -> Point {
    let mut x = anchor.origin.x;
    match position.horizontal {
        Horizontal::InsideLeft => {}
        Horizontal::OutsideLeft => x -= overlay.width,
        Horizontal::Middle => x += round(anchor.size.width / 2.0) - round(overlay.width / 2.0),
        Horizontal::InsideRight => x += anchor.size.width - overlay.width,
        Horizontal::OutsideRight => x += anchor.size.width,
    }

    let mut y = anchor.origin.y;
    match position.vertical {
        Vertical::InsideTop => {}
        Vertical::OutsideTop => y -= overlay.height,
        Vertical::Middle => y += round(anchor.size.height / 2.0) - round(overlay.height / 2.0),
        Vertical::InsideBottom => y += anchor.size.height - overlay.height,
        Vertical::OutsideBottom => y += anchor.size.height,
    }

    Point::new(x, y)
}

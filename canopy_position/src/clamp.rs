// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The viewport clamp: keep a proposed offset inside the visible window.

use kurbo::{Point, Size, Vec2};

/// The scrollable visible window.
///
/// `size` is the inner window size; `scroll` is the page scroll offset, so the
/// visible range on the x axis is `scroll.x ..= scroll.x + size.width`. Read
/// fresh per clamp; the window resizes and scrolls between repositions.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Viewport {
    /// Inner window size.
    pub size: Size,
    /// Page scroll offset.
    pub scroll: Vec2,
}

impl Viewport {
    /// Bundle a window size and scroll offset.
    pub const fn new(size: Size, scroll: Vec2) -> Self {
        Self { size, scroll }
    }

    /// An unscrolled window of the given size.
    pub const fn window(width: f64, height: f64) -> Self {
        Self {
            size: Size::new(width, height),
            scroll: Vec2::ZERO,
        }
    }
}

/// Clamp an offset so the overlay stays within the viewport.
///
/// Far-edge overflow is corrected first, then the near-edge floor, in that
/// order: an overlay larger than the viewport ends up pinned to the top/left
/// (scrolled) edge rather than the bottom/right. Returns a new offset; the
/// input is unchanged.
///
/// Idempotent, and the result never sits left of or above the scrolled near
/// edge.
pub fn clamp_to_viewport(offset: Point, overlay: Size, viewport: Viewport) -> Point {
    let mut x = offset.x;
    let mut y = offset.y;

    let far_x = viewport.size.width + viewport.scroll.x;
    if x + overlay.width > far_x {
        x = (far_x - overlay.width).max(0.0);
    }
    let far_y = viewport.size.height + viewport.scroll.y;
    if y + overlay.height > far_y {
        y = (far_y - overlay.height).max(0.0);
    }

    x = x.max(viewport.scroll.x);
    y = y.max(viewport.scroll.y);

    Point::new(x, y)
}

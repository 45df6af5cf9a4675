// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=canopy_position --heading-base-level=0

//! Canopy Position: anchor-relative placement math for floating overlays.
//!
//! ## Overview
//!
//! This crate computes where a floating overlay (a popup, dropdown, or tooltip)
//! should sit relative to an anchor box, and keeps it inside the visible
//! viewport. It is purely arithmetic: feed it fresh measurements — the anchor's
//! page offset and outer size, the overlay's measured size, and the viewport —
//! and it returns a page offset. It performs no measurement, no rendering, and
//! no event handling; a lifecycle layer (such as `canopy_overlay`) owns those.
//!
//! ## Position vocabulary
//!
//! A [`Position`](crate::tokens::Position) is a pair of tokens, one per axis:
//!
//! - horizontal: `outside-left`, `inside-left`, `middle`, `inside-right`, `outside-right`
//! - vertical: `outside-top`, `inside-top`, `middle`, `inside-bottom`, `outside-bottom`
//!
//! `inside-*` aligns the overlay's edge with the anchor's matching edge;
//! `outside-*` places the overlay beyond that edge; `middle` centers.
//! Unrecognized tokens fall back to the documented defaults (`inside-left`,
//! `outside-bottom`) rather than erroring, so configuration mistakes degrade to
//! a sensible placement instead of failing the host page.
//!
//! ## Workflow
//!
//! 1) Resolve — [`anchored_offset`](crate::offset::anchored_offset) applies the
//!    per-axis rule table to produce the ideal page offset for one candidate.
//! 2) Clamp — [`clamp_to_viewport`](crate::clamp::clamp_to_viewport) pulls the
//!    offset back inside the visible window, correcting far-edge overflow
//!    before the near-edge floor so an oversized overlay pins to the near edge.
//! 3) Select — [`place`](crate::select::place) evaluates an ordered candidate
//!    list through both steps and picks the candidate needing the least
//!    displacement; an exact fit short-circuits, preserving preference order.
//!
//! ## Minimal usage
//!
//! ```
//! use canopy_position::{anchored_offset, AnchorState, Position};
//! use kurbo::{Point, Size};
//!
//! let anchor = AnchorState::new(Point::new(300.0, 0.0), Size::new(200.0, 50.0));
//! let overlay = Size::new(100.0, 30.0);
//!
//! let position = Position::from_tokens("outside-left outside-bottom");
//! assert_eq!(anchored_offset(anchor, overlay, position), Point::new(200.0, 50.0));
//! ```
//!
//! This crate is `no_std`; enable the `std` feature (default) or the `libm`
//! feature for the rounding primitive.

#![no_std]

#[cfg(feature = "std")]
extern crate std;

#[cfg(not(any(feature = "std", feature = "libm")))]
compile_error!("canopy_position requires either the `std` or `libm` feature");

pub mod clamp;
pub mod offset;
pub mod select;
pub mod tokens;

pub use clamp::{Viewport, clamp_to_viewport};
pub use offset::{AnchorState, anchored_offset};
pub use select::{Placement, place, select_best};
pub use tokens::{Horizontal, Position, Vertical};

/// Round to the nearest integer, ties away from zero, in both build modes.
pub(crate) fn round(x: f64) -> f64 {
    #[cfg(feature = "std")]
    {
        x.round()
    }
    #[cfg(not(feature = "std"))]
    {
        libm::round(x)
    }
}

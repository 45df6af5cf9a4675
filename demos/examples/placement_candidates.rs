// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Placement math basics.
//!
//! Evaluates a multi-candidate position list against a cramped viewport and
//! shows why the selector picks the candidate it does: ideal offset, clamped
//! offset, and the displacement between them, per candidate.
//!
//! Run:
//! - `cargo run -p canopy_examples --example placement_candidates`

use canopy_position::{
    AnchorState, Horizontal, Position, Vertical, Viewport, anchored_offset, clamp_to_viewport,
    place,
};
use kurbo::{Point, Size};

fn main() {
    // An anchor near the right edge of a small window.
    let anchor = AnchorState::new(Point::new(300.0, 0.0), Size::new(200.0, 50.0));
    let overlay = Size::new(100.0, 30.0);
    let viewport = Viewport::window(450.0, 600.0);

    // Prefer opening to the right; fall back to the left, then below.
    let candidates = [
        Position::new(Horizontal::OutsideRight, Vertical::InsideTop),
        Position::new(Horizontal::OutsideLeft, Vertical::InsideTop),
        Position::new(Horizontal::InsideLeft, Vertical::OutsideBottom),
    ];

    println!("== Candidates (ideal → clamped, displacement) ==");
    for candidate in candidates {
        let ideal = anchored_offset(anchor, overlay, candidate);
        let clamped = clamp_to_viewport(ideal, overlay, viewport);
        println!(
            "  {candidate}  ({:.0}, {:.0}) → ({:.0}, {:.0})  d²={:.0}",
            ideal.x,
            ideal.y,
            clamped.x,
            clamped.y,
            ideal.distance_squared(clamped),
        );
    }

    let placement = place(anchor, overlay, &candidates, viewport);
    println!("== Chosen ==");
    println!(
        "  {}  at ({:.0}, {:.0})",
        placement.position, placement.offset.x, placement.offset.y
    );
}

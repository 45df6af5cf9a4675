// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The best-position selector: rank candidates by clamping displacement.

use kurbo::{Point, Size};

use crate::clamp::{Viewport, clamp_to_viewport};
use crate::offset::{AnchorState, anchored_offset};
use crate::tokens::Position;

/// A chosen candidate together with its clamped page offset.
///
/// Produced by [`place`]; the offset is the one to apply, already corrected
/// by [`clamp_to_viewport`](crate::clamp::clamp_to_viewport).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Placement {
    /// The winning candidate.
    pub position: Position,
    /// Its clamped page offset.
    pub offset: Point,
}

/// Evaluate candidates in preference order and pick the best fit.
///
/// For each candidate, the displacement is the Euclidean distance between its
/// ideal offset ([`anchored_offset`](crate::offset::anchored_offset)) and its
/// clamped offset. A candidate that needs no clamping wins immediately —
/// first perfect fit in list order, so configuration preference is preserved
/// even when several candidates would fit. Otherwise the first-seen minimum
/// wins.
///
/// Distances are compared squared; no square root is taken. An empty slice
/// degrades to [`Position::default()`] rather than failing — candidate lists
/// are non-empty by construction upstream, and the fallback keeps a
/// misconfigured popup on screen.
pub fn place(
    anchor: AnchorState,
    overlay: Size,
    candidates: &[Position],
    viewport: Viewport,
) -> Placement {
    let mut best: Option<(Placement, f64)> = None;
    for &position in candidates {
        let ideal = anchored_offset(anchor, overlay, position);
        let offset = clamp_to_viewport(ideal, overlay, viewport);
        let displacement = ideal.distance_squared(offset);
        let placement = Placement { position, offset };
        if displacement == 0.0 {
            return placement;
        }
        // Strict less-than keeps the first-seen minimum on ties.
        match best {
            Some((_, d)) if displacement >= d => {}
            _ => best = Some((placement, displacement)),
        }
    }
    best.map(|(placement, _)| placement).unwrap_or_else(|| {
        let position = Position::default();
        let ideal = anchored_offset(anchor, overlay, position);
        Placement {
            position,
            offset: clamp_to_viewport(ideal, overlay, viewport),
        }
    })
}

/// As [`place`], returning only the winning candidate.
pub fn select_best(
    anchor: AnchorState,
    overlay: Size,
    candidates: &[Position],
    viewport: Viewport,
) -> Position {
    place(anchor, overlay, candidates, viewport).position
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::{Horizontal, Vertical};

    extern crate std;
    use std::vec;

    const OVERLAY: Size = Size::new(100.0, 30.0);

    fn anchor() -> AnchorState {
        AnchorState::new(Point::new(300.0, 0.0), Size::new(200.0, 50.0))
    }

    #[test]
    fn first_perfect_fit_wins_over_later_perfect_fits() {
        let vp = Viewport::window(800.0, 600.0);
        let below = Position::new(Horizontal::InsideLeft, Vertical::OutsideBottom);
        let right = Position::new(Horizontal::OutsideRight, Vertical::InsideTop);
        // Both fit without clamping; the first configured one is chosen.
        let got = select_best(anchor(), OVERLAY, &[below, right], vp);
        assert_eq!(got, below);
        let got = select_best(anchor(), OVERLAY, &[right, below], vp);
        assert_eq!(got, right);
    }

    #[test]
    fn clamped_candidate_loses_to_a_fitting_one() {
        // 600 wide window: outside-right (x = 500..600) overflows by 0 — make
        // it 550 so the first candidate needs pulling back.
        let vp = Viewport::window(550.0, 600.0);
        let right = Position::new(Horizontal::OutsideRight, Vertical::InsideTop);
        let left = Position::new(Horizontal::OutsideLeft, Vertical::InsideTop);
        let got = place(anchor(), OVERLAY, &[right, left], vp);
        assert_eq!(got.position, left);
        assert_eq!(got.offset, Point::new(200.0, 0.0));
    }

    #[test]
    fn least_displacement_wins_when_nothing_fits() {
        // 450 wide window: outside-right lands at 500 (displaced by 150),
        // inside-right at 400 (displaced by 50). Neither fits; the closer
        // one is chosen, with its clamped offset.
        let vp = Viewport::window(450.0, 600.0);
        let far = Position::new(Horizontal::OutsideRight, Vertical::InsideTop);
        let near = Position::new(Horizontal::InsideRight, Vertical::InsideTop);
        let got = place(anchor(), OVERLAY, &[far, near], vp);
        assert_eq!(got.position, near);
        assert_eq!(got.offset, Point::new(350.0, 0.0));
    }

    #[test]
    fn equal_displacements_keep_the_first_candidate() {
        // Two candidates displaced by the same amount: list order decides.
        let vp = Viewport::window(450.0, 600.0);
        let a = Position::new(Horizontal::OutsideRight, Vertical::InsideTop);
        let b = Position::new(Horizontal::OutsideRight, Vertical::InsideBottom);
        let got = select_best(anchor(), OVERLAY, &[a, b], vp);
        assert_eq!(got, a);
    }

    #[test]
    fn single_candidate_passes_through() {
        let vp = Viewport::window(800.0, 600.0);
        let p = Position::new(Horizontal::Middle, Vertical::Middle);
        let got = place(anchor(), OVERLAY, &[p], vp);
        assert_eq!(got.position, p);
        assert_eq!(got.offset, Point::new(350.0, 10.0));
    }

    #[test]
    fn empty_list_degrades_to_the_default_pair() {
        let vp = Viewport::window(800.0, 600.0);
        let got = place(anchor(), OVERLAY, &[], vp);
        assert_eq!(got.position, Position::default());
        assert_eq!(got.offset, Point::new(300.0, 50.0));
    }

    #[test]
    fn selection_matches_exhaustive_scan() {
        // Cross-check the single-pass scan against a naive rescan over every
        // vocabulary pair in a cramped viewport.
        let vp = Viewport::window(420.0, 60.0);
        let mut candidates = vec![];
        for h in Horizontal::ALL {
            for v in Vertical::ALL {
                candidates.push(Position::new(h, v));
            }
        }
        let got = place(anchor(), OVERLAY, &candidates, vp);

        let mut best: Option<(Position, f64)> = None;
        for &p in &candidates {
            let ideal = anchored_offset(anchor(), OVERLAY, p);
            let clamped = clamp_to_viewport(ideal, OVERLAY, vp);
            let d = ideal.distance_squared(clamped);
            if best.is_none_or(|(_, bd)| d < bd) {
                best = Some((p, d));
            }
        }
        assert_eq!(got.position, best.unwrap().0);
    }
}

// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The position vocabulary: valid per-axis placement tokens and their defaults.

use core::fmt;

/// Horizontal placement of an overlay relative to its anchor.
///
/// `inside-left` aligns left borders; `inside-right` aligns right borders;
/// the `outside-*` tokens place the overlay entirely beyond that anchor edge;
/// `middle` centers the overlay on the anchor.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum Horizontal {
    /// Overlay sits entirely left of the anchor's left edge.
    OutsideLeft,
    /// Left borders aligned. The fallback for unrecognized input.
    #[default]
    InsideLeft,
    /// Horizontally centered on the anchor.
    Middle,
    /// Right borders aligned.
    InsideRight,
    /// Overlay sits entirely right of the anchor's right edge.
    OutsideRight,
}

/// Vertical placement of an overlay relative to its anchor.
///
/// Mirrors [`Horizontal`] with heights in place of widths. The fallback is
/// `outside-bottom`: a popup opening below its anchor.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum Vertical {
    /// Overlay sits entirely above the anchor's top edge.
    OutsideTop,
    /// Top borders aligned.
    InsideTop,
    /// Vertically centered on the anchor.
    Middle,
    /// Bottom borders aligned.
    InsideBottom,
    /// Overlay sits entirely below the anchor's bottom edge. The fallback.
    #[default]
    OutsideBottom,
}

impl Horizontal {
    /// Every valid horizontal token, in vocabulary order.
    pub const ALL: [Self; 5] = [
        Self::OutsideLeft,
        Self::InsideLeft,
        Self::Middle,
        Self::InsideRight,
        Self::OutsideRight,
    ];

    /// Parse a token, returning `None` for anything outside the vocabulary.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "outside-left" => Some(Self::OutsideLeft),
            "inside-left" => Some(Self::InsideLeft),
            "middle" => Some(Self::Middle),
            "inside-right" => Some(Self::InsideRight),
            "outside-right" => Some(Self::OutsideRight),
            _ => None,
        }
    }

    /// The canonical token string.
    pub const fn token(self) -> &'static str {
        match self {
            Self::OutsideLeft => "outside-left",
            Self::InsideLeft => "inside-left",
            Self::Middle => "middle",
            Self::InsideRight => "inside-right",
            Self::OutsideRight => "outside-right",
        }
    }
}

impl Vertical {
    /// Every valid vertical token, in vocabulary order.
    pub const ALL: [Self; 5] = [
        Self::OutsideTop,
        Self::InsideTop,
        Self::Middle,
        Self::InsideBottom,
        Self::OutsideBottom,
    ];

    /// Parse a token, returning `None` for anything outside the vocabulary.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "outside-top" => Some(Self::OutsideTop),
            "inside-top" => Some(Self::InsideTop),
            "middle" => Some(Self::Middle),
            "inside-bottom" => Some(Self::InsideBottom),
            "outside-bottom" => Some(Self::OutsideBottom),
            _ => None,
        }
    }

    /// The canonical token string.
    pub const fn token(self) -> &'static str {
        match self {
            Self::OutsideTop => "outside-top",
            Self::InsideTop => "inside-top",
            Self::Middle => "middle",
            Self::InsideBottom => "inside-bottom",
            Self::OutsideBottom => "outside-bottom",
        }
    }
}

impl fmt::Display for Horizontal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl fmt::Display for Vertical {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// A placement candidate: one token per axis.
///
/// `Position::default()` is the documented fallback pair
/// (`inside-left outside-bottom`). Both fields always hold valid tokens;
/// normalization happens at construction, so downstream arithmetic never
/// revalidates.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Position {
    /// Horizontal token.
    pub horizontal: Horizontal,
    /// Vertical token.
    pub vertical: Vertical,
}

impl Position {
    /// Pair two tokens.
    pub const fn new(horizontal: Horizontal, vertical: Vertical) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    /// Normalize a space-separated token string.
    ///
    /// The first token names the horizontal axis, the second the vertical; a
    /// trailing token may be omitted. Per axis, anything outside the
    /// vocabulary (including absence) falls back to that axis's default. This
    /// never fails: `from_tokens("")` is `Position::default()`.
    ///
    /// Idempotent through [`Position::tokens`]: re-normalizing a rendered
    /// position yields the same position.
    pub fn from_tokens(raw: &str) -> Self {
        let mut words = raw.split_whitespace();
        let horizontal = words
            .next()
            .and_then(Horizontal::from_token)
            .unwrap_or_default();
        let vertical = words
            .next()
            .and_then(Vertical::from_token)
            .unwrap_or_default();
        Self {
            horizontal,
            vertical,
        }
    }

    /// The canonical token pair.
    pub const fn tokens(self) -> (&'static str, &'static str) {
        (self.horizontal.token(), self.vertical.token())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.horizontal, self.vertical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern crate std;
    use std::string::ToString;

    #[test]
    fn parses_full_pairs() {
        let p = Position::from_tokens("outside-right middle");
        assert_eq!(p.horizontal, Horizontal::OutsideRight);
        assert_eq!(p.vertical, Vertical::Middle);
    }

    #[test]
    fn trailing_token_is_optional() {
        let p = Position::from_tokens("middle");
        assert_eq!(p.horizontal, Horizontal::Middle);
        assert_eq!(p.vertical, Vertical::OutsideBottom);
    }

    #[test]
    fn invalid_tokens_fall_back_per_axis() {
        let p = Position::from_tokens("sideways middle");
        assert_eq!(p.horizontal, Horizontal::InsideLeft);
        assert_eq!(p.vertical, Vertical::Middle);

        let p = Position::from_tokens("inside-right nowhere");
        assert_eq!(p.horizontal, Horizontal::InsideRight);
        assert_eq!(p.vertical, Vertical::OutsideBottom);
    }

    #[test]
    fn empty_input_is_the_default_pair() {
        assert_eq!(Position::from_tokens(""), Position::default());
        assert_eq!(
            Position::default(),
            Position::new(Horizontal::InsideLeft, Vertical::OutsideBottom)
        );
    }

    // Axis tokens do not cross: a vertical token in horizontal position is
    // unrecognized, not reinterpreted.
    #[test]
    fn axes_do_not_accept_each_others_tokens() {
        let p = Position::from_tokens("outside-top outside-left");
        assert_eq!(p.horizontal, Horizontal::InsideLeft);
        assert_eq!(p.vertical, Vertical::OutsideBottom);
    }

    #[test]
    fn normalization_round_trips() {
        for h in Horizontal::ALL {
            for v in Vertical::ALL {
                let p = Position::new(h, v);
                assert_eq!(Position::from_tokens(&p.to_string()), p);
            }
        }
    }

    #[test]
    fn token_parsing_round_trips() {
        for h in Horizontal::ALL {
            assert_eq!(Horizontal::from_token(h.token()), Some(h));
        }
        for v in Vertical::ALL {
            assert_eq!(Vertical::from_token(v.token()), Some(v));
        }
    }
}

//! Deterministic positions for the contact graph.
//!
//! Primaries stack down a single column; each primary's secondaries fan out in
//! a column to its right. Positions are presentation hints only.

use serde::Serialize;

pub const ORIGIN_X: i64 = 100;
pub const ORIGIN_Y: i64 = 100;

/// Horizontal distance from a primary to its secondaries.
pub const SECONDARY_OFFSET_X: i64 = 400;

/// Vertical distance between stacked secondaries.
pub const SECONDARY_STEP_Y: i64 = 200;

/// Smallest vertical advance between consecutive primaries.
pub const MIN_PRIMARY_ADVANCE: i64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

/// Walks primaries in order, handing out slots.
#[derive(Debug, Clone)]
pub struct ColumnLayout {
    next_y: i64,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self { next_y: ORIGIN_Y }
    }
}

impl ColumnLayout {
    /// Reserve the slot for the next primary, which owns `related` secondaries.
    pub fn place_primary(&mut self, related: usize) -> Position {
        let pos = Position {
            x: ORIGIN_X,
            y: self.next_y,
        };
        self.next_y += primary_advance(related);
        pos
    }
}

/// Position of the `index`-th secondary hanging off `primary`.
pub fn secondary_position(primary: Position, index: usize) -> Position {
    Position {
        x: primary.x + SECONDARY_OFFSET_X,
        y: primary.y + index as i64 * SECONDARY_STEP_Y,
    }
}

fn primary_advance(related: usize) -> i64 {
    MIN_PRIMARY_ADVANCE.max(related as i64 * SECONDARY_STEP_Y + 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn advance_grows_with_secondaries() {
        assert_eq!(primary_advance(0), 300);
        assert_eq!(primary_advance(1), 300);
        assert_eq!(primary_advance(2), 500);
        assert_eq!(primary_advance(4), 900);
    }

    #[test]
    fn slots_accumulate() {
        let mut layout = ColumnLayout::default();
        assert_eq!(layout.place_primary(3), Position { x: 100, y: 100 });
        assert_eq!(layout.place_primary(0), Position { x: 100, y: 800 });
        assert_eq!(layout.place_primary(0), Position { x: 100, y: 1100 });
    }

    #[test]
    fn secondaries_stack_to_the_right() {
        let p = Position { x: 100, y: 800 };
        assert_eq!(secondary_position(p, 0), Position { x: 500, y: 800 });
        assert_eq!(secondary_position(p, 2), Position { x: 500, y: 1200 });
    }
}

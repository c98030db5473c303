//! Piece catalog: the four shapes, their colours, and the computed rotation transform.

use crate::playfield::Cell;
use ratatui::style::Color;

/// Side of the square occupancy mask every shape is stored in.
pub const MASK_SIDE: i32 = 4;

/// Shape ids (J, T, O, I). Geometry is static; colours live in [`Catalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeId {
    J,
    T,
    O,
    I,
}

impl ShapeId {
    pub const ALL: [Self; 4] = [Self::J, Self::T, Self::O, Self::I];

    /// Canonical (rotation 0) 4x4 mask, one string per row; 'x' marks an occupied cell.
    fn mask(self) -> &'static [&'static str; 4] {
        match self {
            Self::J => &["..x.", "..x.", ".xx.", "...."],
            Self::T => &["..x.", ".xx.", "..x.", "...."],
            Self::O => &[".xx.", ".xx.", "....", "...."],
            Self::I => &["..x.", "..x.", "..x.", "..x."],
        }
    }

    #[inline]
    fn index(self) -> usize {
        match self {
            Self::J => 0,
            Self::T => 1,
            Self::O => 2,
            Self::I => 3,
        }
    }

    /// True if local cell (i, j) is filled when the shape is turned to `rotation`.
    pub fn occupied(self, i: i32, j: i32, rotation: Rotation) -> bool {
        let k = rotation.source_index(i, j);
        let row = self.mask()[k / 4].as_bytes();
        row[k % 4] == b'x'
    }

    /// Occupied local cells (i, j) under `rotation`, row-major.
    pub fn local_cells(self, rotation: Rotation) -> impl Iterator<Item = (i32, i32)> {
        (0..MASK_SIDE)
            .flat_map(|j| (0..MASK_SIDE).map(move |i| (i, j)))
            .filter(move |&(i, j)| self.occupied(i, j, rotation))
    }

    /// (min, max) local row occupied under `rotation`.
    #[cfg(test)]
    pub fn row_span(self, rotation: Rotation) -> (i32, i32) {
        self.local_cells(rotation)
            .fold((MASK_SIDE, -1), |(lo, hi), (_, j)| (lo.min(j), hi.max(j)))
    }
}

/// One of four 90-degree orientations. Step +1 is a clockwise turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rotation(u8);

impl Rotation {
    pub const ALL: [Self; 4] = [Self(0), Self(1), Self(2), Self(3)];

    /// `None` unless `r` is in 0..=3.
    #[cfg(test)]
    pub fn new(r: u8) -> Option<Self> {
        (r < 4).then_some(Self(r))
    }

    #[inline]
    pub fn value(self) -> u8 {
        self.0
    }

    pub fn cw(self) -> Self {
        Self((self.0 + 1) % 4)
    }

    pub fn ccw(self) -> Self {
        Self((self.0 + 3) % 4)
    }

    /// Index into the canonical mask that local cell (i, j) reads from at this rotation.
    ///
    /// Panics if (i, j) lies outside the mask or the rotation value is out of range;
    /// both are caller bugs, not game conditions.
    pub fn source_index(self, i: i32, j: i32) -> usize {
        assert!(
            (0..MASK_SIDE).contains(&i) && (0..MASK_SIDE).contains(&j),
            "local cell ({i}, {j}) outside the 4x4 mask"
        );
        let k = match self.0 {
            0 => 4 * j + i,
            1 => 12 + j - 4 * i,
            2 => 15 - 4 * j - i,
            3 => 3 - j + 4 * i,
            r => unreachable!("rotation out of range: {r}"),
        };
        k as usize
    }
}

/// Outline and fill colour of a block, copied into the landscape when a piece lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub pen: Color,
    pub fill: Color,
}

/// Immutable shape colours, built once from the theme.
#[derive(Debug, Clone)]
pub struct Catalog {
    blocks: [Block; 4],
}

impl Catalog {
    /// One pen for every shape, fills in [`ShapeId::ALL`] order.
    pub fn new(pen: Color, fills: [Color; 4]) -> Self {
        Self {
            blocks: fills.map(|fill| Block { pen, fill }),
        }
    }

    #[inline]
    pub fn block(&self, shape: ShapeId) -> Block {
        self.blocks[shape.index()]
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(
            Color::Blue,
            [Color::Red, Color::Green, Color::Magenta, Color::Cyan],
        )
    }
}

/// The falling piece: which shape, how it is turned, and where its 4x4 mask sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub shape: ShapeId,
    pub rotation: Rotation,
    pub pos: Cell,
}

impl Piece {
    pub fn new(shape: ShapeId, rotation: Rotation, pos: Cell) -> Self {
        Self {
            shape,
            rotation,
            pos,
        }
    }

    /// World cells covered by the piece.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + use<> {
        let pos = self.pos;
        self.shape
            .local_cells(self.rotation)
            .map(move |(i, j)| pos.offset(i, j))
    }

    pub fn shifted(&self, dx: i32, dy: i32) -> Self {
        Self {
            pos: self.pos.offset(dx, dy),
            ..*self
        }
    }

    pub fn rotated(&self, rotation: Rotation) -> Self {
        Self { rotation, ..*self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pattern(shape: ShapeId, rotation: Rotation) -> Vec<(i32, i32)> {
        shape.local_cells(rotation).collect()
    }

    #[test]
    fn test_every_shape_has_four_cells() {
        for shape in ShapeId::ALL {
            for rotation in Rotation::ALL {
                assert_eq!(pattern(shape, rotation).len(), 4, "{shape:?} {rotation:?}");
            }
        }
    }

    #[test]
    fn test_rotation_new_rejects_out_of_range() {
        assert_eq!(Rotation::new(3).map(Rotation::value), Some(3));
        assert!(Rotation::new(4).is_none());
    }

    #[test]
    fn test_i_piece_turns_horizontal() {
        // Vertical bar in column 2 becomes a horizontal bar in row 2 after one clockwise turn.
        assert_eq!(
            pattern(ShapeId::I, Rotation::new(1).unwrap()),
            vec![(0, 2), (1, 2), (2, 2), (3, 2)]
        );
    }

    #[test]
    fn test_clockwise_turn_maps_cells() {
        // A clockwise turn moves source cell (x, y) to (3 - y, x).
        let r0 = Rotation::default();
        let r1 = r0.cw();
        for shape in ShapeId::ALL {
            let mut expected: Vec<(i32, i32)> =
                pattern(shape, r0).into_iter().map(|(x, y)| (3 - y, x)).collect();
            expected.sort_by_key(|&(i, j)| (j, i));
            assert_eq!(pattern(shape, r1), expected, "{shape:?}");
        }
    }

    #[test]
    fn test_ccw_undoes_cw() {
        for r in Rotation::ALL {
            assert_eq!(r.cw().ccw(), r);
        }
    }

    #[test]
    fn test_row_span() {
        let r0 = Rotation::default();
        assert_eq!(ShapeId::J.row_span(r0), (0, 2));
        assert_eq!(ShapeId::O.row_span(r0), (0, 1));
        assert_eq!(ShapeId::I.row_span(r0), (0, 3));
        assert_eq!(ShapeId::I.row_span(r0.cw()), (2, 2));
    }

    #[test]
    fn test_catalog_colours() {
        let catalog = Catalog::default();
        assert_eq!(
            catalog.block(ShapeId::O),
            Block {
                pen: Color::Blue,
                fill: Color::Magenta
            }
        );
    }

    #[test]
    #[should_panic(expected = "outside the 4x4 mask")]
    fn test_source_index_panics_outside_mask() {
        Rotation::default().source_index(4, 0);
    }

    proptest! {
        #[test]
        fn prop_four_turns_is_identity(shape_ix in 0usize..4, start in 0u8..4) {
            let shape = ShapeId::ALL[shape_ix];
            let r = Rotation::new(start).unwrap();
            let turned = r.cw().cw().cw().cw();
            prop_assert_eq!(turned, r);
            prop_assert_eq!(pattern(shape, turned), pattern(shape, r));
        }

        #[test]
        fn prop_source_index_is_a_permutation(r in 0u8..4) {
            let rotation = Rotation::new(r).unwrap();
            let mut seen = [false; 16];
            for j in 0..MASK_SIDE {
                for i in 0..MASK_SIDE {
                    seen[rotation.source_index(i, j)] = true;
                }
            }
            prop_assert!(seen.iter().all(|&s| s));
        }
    }
}

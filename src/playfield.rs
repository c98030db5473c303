//! Playfield: board bounds, the landscape of settled blocks, fit checks and row clearing.

use crate::piece::{Block, Catalog, Piece};
use std::collections::HashMap;

/// Grid coordinate in cells. y = 0 is the top row. Ordered by x, then y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Board of `width` x `height` cells plus the blocks that have already landed.
#[derive(Debug, Clone)]
pub struct Playfield {
    pub width: i32,
    pub height: i32,
    landscape: HashMap<Cell, Block>,
}

impl Playfield {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width: i32::from(width),
            height: i32::from(height),
            landscape: HashMap::new(),
        }
    }

    #[inline]
    pub fn in_bounds(&self, cell: Cell) -> bool {
        (0..self.width).contains(&cell.x) && (0..self.height).contains(&cell.y)
    }

    #[cfg(test)]
    pub fn get(&self, cell: Cell) -> Option<Block> {
        self.landscape.get(&cell).copied()
    }

    /// Place a settled block. Returns the block previously at `cell`, if any.
    #[cfg(test)]
    pub fn set(&mut self, cell: Cell, block: Block) -> Option<Block> {
        self.landscape.insert(cell, block)
    }

    pub fn len(&self) -> usize {
        self.landscape.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.landscape.is_empty()
    }

    /// Settled blocks in no particular order.
    pub fn landscape(&self) -> impl Iterator<Item = (Cell, Block)> + '_ {
        self.landscape.iter().map(|(&c, &b)| (c, b))
    }

    pub fn clear(&mut self) {
        self.landscape.clear();
    }

    /// True if every cell of `piece` is on the board and not already settled.
    pub fn fits(&self, piece: &Piece) -> bool {
        piece
            .cells()
            .all(|c| self.in_bounds(c) && !self.landscape.contains_key(&c))
    }

    /// Fold a landed piece into the landscape using its catalog colours.
    pub fn merge(&mut self, piece: &Piece, catalog: &Catalog) {
        let block = catalog.block(piece.shape);
        for cell in piece.cells() {
            self.landscape.insert(cell, block);
        }
    }

    pub fn is_row_complete(&self, y: i32) -> bool {
        (0..self.width).all(|x| self.landscape.contains_key(&Cell::new(x, y)))
    }

    /// Remove row `y` and drop every row above it by one. Returns the number of blocks removed.
    pub fn remove_row(&mut self, y: i32) -> usize {
        let before = self.landscape.len();
        self.landscape.retain(|c, _| c.y != y);
        let removed = before - self.landscape.len();
        // Row y is now empty, so shifting the rows above cannot collide.
        self.landscape = std::mem::take(&mut self.landscape)
            .into_iter()
            .map(|(c, b)| if c.y < y { (c.offset(0, 1), b) } else { (c, b) })
            .collect();
        removed
    }

    /// Clear complete rows among `rows` (scanned top to bottom), repeating each row until
    /// it is no longer complete. Returns the cleared row indices in clearing order.
    pub fn clear_rows(&mut self, rows: impl IntoIterator<Item = i32>) -> Vec<i32> {
        let mut cleared = Vec::new();
        for y in rows {
            if !(0..self.height).contains(&y) {
                continue;
            }
            // Cells only ever enter row y from above, so this runs at most y + 1 times.
            while self.is_row_complete(y) {
                self.remove_row(y);
                cleared.push(y);
            }
        }
        cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::{Rotation, ShapeId};
    use proptest::prelude::*;
    use ratatui::style::Color;

    const GREY: Block = Block {
        pen: Color::Blue,
        fill: Color::Gray,
    };

    fn fill_row(pf: &mut Playfield, y: i32, block: Block) {
        for x in 0..pf.width {
            pf.set(Cell::new(x, y), block);
        }
    }

    #[test]
    fn test_cell_ordering_is_x_then_y() {
        let mut cells = vec![Cell::new(1, 0), Cell::new(0, 5), Cell::new(0, 1)];
        cells.sort();
        assert_eq!(cells, vec![Cell::new(0, 1), Cell::new(0, 5), Cell::new(1, 0)]);
    }

    #[test]
    fn test_fits_on_empty_board() {
        let pf = Playfield::new(10, 20);
        let piece = Piece::new(ShapeId::T, Rotation::default(), Cell::new(3, 0));
        assert!(pf.fits(&piece));
    }

    #[test]
    fn test_fits_rejects_landscape_overlap() {
        let mut pf = Playfield::new(10, 20);
        let piece = Piece::new(ShapeId::O, Rotation::default(), Cell::new(3, 5));
        pf.set(Cell::new(4, 6), GREY);
        assert!(!pf.fits(&piece));
        assert!(pf.fits(&piece.shifted(0, -2)));
    }

    #[test]
    fn test_fits_rejects_floor() {
        let pf = Playfield::new(10, 20);
        // O occupies local rows 0..=1, so anchor row 18 is the lowest legal one.
        let piece = Piece::new(ShapeId::O, Rotation::default(), Cell::new(0, 18));
        assert!(pf.fits(&piece));
        assert!(!pf.fits(&piece.shifted(0, 1)));
    }

    #[test]
    fn test_fits_allows_empty_mask_columns_outside_board() {
        let pf = Playfield::new(10, 20);
        // O uses local columns 1..=2, so the anchor may sit one column left of the board.
        let piece = Piece::new(ShapeId::O, Rotation::default(), Cell::new(-1, 0));
        assert!(pf.fits(&piece));
        assert!(!pf.fits(&piece.shifted(-1, 0)));
    }

    #[test]
    fn test_merge_adds_piece_cells() {
        let mut pf = Playfield::new(10, 20);
        pf.set(Cell::new(0, 19), GREY);
        let catalog = Catalog::default();
        let piece = Piece::new(ShapeId::J, Rotation::default(), Cell::new(4, 10));
        pf.merge(&piece, &catalog);
        assert_eq!(pf.len(), 5);
        for cell in piece.cells() {
            assert_eq!(pf.get(cell), Some(catalog.block(ShapeId::J)));
        }
        assert_eq!(pf.get(Cell::new(0, 19)), Some(GREY));
    }

    #[test]
    fn test_remove_row_shifts_rows_above() {
        let mut pf = Playfield::new(4, 6);
        let red = Block {
            pen: Color::Blue,
            fill: Color::Red,
        };
        fill_row(&mut pf, 5, GREY);
        pf.set(Cell::new(1, 3), red);
        pf.set(Cell::new(2, 4), GREY);
        assert!(pf.is_row_complete(5));

        let removed = pf.remove_row(5);
        assert_eq!(removed, 4);
        assert_eq!(pf.len(), 2);
        assert_eq!(pf.get(Cell::new(1, 4)), Some(red));
        assert_eq!(pf.get(Cell::new(2, 5)), Some(GREY));
        assert_eq!(pf.get(Cell::new(1, 3)), None);
    }

    #[test]
    fn test_remove_row_leaves_rows_below() {
        let mut pf = Playfield::new(4, 6);
        fill_row(&mut pf, 2, GREY);
        pf.set(Cell::new(0, 5), GREY);
        pf.remove_row(2);
        assert_eq!(pf.get(Cell::new(0, 5)), Some(GREY));
        assert_eq!(pf.len(), 1);
    }

    #[test]
    fn test_clear_rows_chained() {
        let mut pf = Playfield::new(4, 6);
        fill_row(&mut pf, 4, GREY);
        fill_row(&mut pf, 5, GREY);
        pf.set(Cell::new(3, 3), GREY);
        let cleared = pf.clear_rows(2..6);
        assert_eq!(cleared, vec![4, 5]);
        assert_eq!(pf.len(), 1);
        assert_eq!(pf.get(Cell::new(3, 5)), Some(GREY));
    }

    #[test]
    fn test_clear_rows_skips_incomplete_and_offboard() {
        let mut pf = Playfield::new(4, 6);
        fill_row(&mut pf, 5, GREY);
        pf.landscape.remove(&Cell::new(2, 5));
        assert!(pf.clear_rows(3..9).is_empty());
        assert_eq!(pf.len(), 3);
    }

    proptest! {
        #[test]
        fn prop_fits_false_outside_board(
            shape_ix in 0usize..4,
            r in 0u8..4,
            x in -6i32..16,
            y in -6i32..26,
        ) {
            let pf = Playfield::new(10, 20);
            let piece = Piece::new(ShapeId::ALL[shape_ix], Rotation::new(r).unwrap(), Cell::new(x, y));
            let outside = piece.cells().any(|c| c.x < 0 || c.x >= 10 || c.y < 0 || c.y >= 20);
            prop_assert_eq!(pf.fits(&piece), !outside);
        }

        #[test]
        fn prop_clearing_full_row_removes_width_entries(width in 4u16..12, row in 1i32..8) {
            let mut pf = Playfield::new(width, 8);
            fill_row(&mut pf, row, GREY);
            let above = Cell::new(0, row - 1);
            let red = Block { pen: Color::Blue, fill: Color::Red };
            pf.set(above, red);
            let cleared = pf.clear_rows([row]);
            prop_assert_eq!(cleared, vec![row]);
            prop_assert_eq!(pf.len(), 1);
            prop_assert_eq!(pf.get(above.offset(0, 1)), Some(red));
        }
    }
}

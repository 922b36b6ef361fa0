use crate::catalog::{Photo, PhotoImage};
use crate::error::GameError;

/// Piece identity. Equal to the slot the piece belongs in.
pub type PieceId = usize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridSize {
    pub cols: u32,
    pub rows: u32,
}

impl GridSize {
    pub fn piece_count(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    pub fn label(&self) -> String {
        format!("{} pieces ({}x{})", self.piece_count(), self.cols, self.rows)
    }
}

/// Pixel rectangle of the source image shown by a piece, bottom-left origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PieceRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Piece {
    id: PieceId,
    current: usize,
    region: PieceRegion,
}

impl Piece {
    pub fn id(&self) -> PieceId {
        self.id
    }

    pub fn correct_index(&self) -> usize {
        self.id
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn region(&self) -> PieceRegion {
        self.region
    }

    pub fn is_in_correct_position(&self) -> bool {
        self.current == self.id
    }
}

/// The pieces of one play session, stored by current slot.
///
/// `pieces[slot].current_index() == slot` holds after every operation, so the
/// current indices always form a permutation of `0..len`.
#[derive(Clone, Debug)]
pub struct PieceGrid {
    size: GridSize,
    pieces: Vec<Piece>,
}

impl PieceGrid {
    /// Slices the photo's image into `cols` x `rows` regions, one solved piece per cell.
    pub fn build(cols: u32, rows: u32, photo: &Photo) -> Result<Self, GameError> {
        if cols == 0 || rows == 0 {
            return Err(GameError::InvalidDimensions { cols, rows });
        }
        let image: &PhotoImage = photo
            .image
            .as_ref()
            .ok_or(GameError::MissingImage(photo.id))?;
        let piece_width = image.width / cols;
        let piece_height = image.height / rows;
        if piece_width == 0 || piece_height == 0 {
            return Err(GameError::ImageTooSmall {
                width: image.width,
                height: image.height,
                cols,
                rows,
            });
        }

        let size = GridSize { cols, rows };
        let mut pieces = Vec::with_capacity(size.piece_count());
        for y in 0..rows {
            for x in 0..cols {
                let index = (y * cols + x) as usize;
                pieces.push(Piece {
                    id: index,
                    current: index,
                    region: PieceRegion {
                        x: x * piece_width,
                        y: (rows - 1 - y) * piece_height,
                        width: piece_width,
                        height: piece_height,
                    },
                });
            }
        }
        log::debug!("built grid {}x{} = {} pieces", cols, rows, pieces.len());
        Ok(Self { size, pieces })
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Pieces in slot order.
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn piece_at(&self, slot: usize) -> Option<&Piece> {
        self.pieces.get(slot)
    }

    pub fn slot_of(&self, piece: PieceId) -> Option<usize> {
        self.pieces.iter().position(|entry| entry.id == piece)
    }

    /// Exchanges the pieces in two slots. Out-of-range slots are ignored.
    pub fn swap_slots(&mut self, a: usize, b: usize) -> bool {
        if a >= self.pieces.len() || b >= self.pieces.len() {
            return false;
        }
        if a == b {
            return true;
        }
        self.pieces.swap(a, b);
        self.pieces[a].current = a;
        self.pieces[b].current = b;
        true
    }

    /// Exchanges two pieces by id.
    pub fn swap_pieces(&mut self, a: PieceId, b: PieceId) -> bool {
        match (self.slot_of(a), self.slot_of(b)) {
            (Some(slot_a), Some(slot_b)) => self.swap_slots(slot_a, slot_b),
            _ => false,
        }
    }

    /// The win condition: every piece sits in its own slot.
    pub fn is_solved(&self) -> bool {
        self.pieces.iter().all(Piece::is_in_correct_position)
    }

    pub fn misplaced_count(&self) -> usize {
        self.pieces
            .iter()
            .filter(|piece| !piece.is_in_correct_position())
            .count()
    }
}

use bytemuck::{Pod, Zeroable};
use rookery_bitboards::Square;

use super::Position;
use crate::types::Piece;

/// Piece placement at four bits per square (see `Piece::code`), two squares
/// per byte with the lower-indexed square in the low nibble.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Pod, Zeroable)]
pub struct PackedBoard([u8; 32]);

impl PackedBoard {
    pub fn from_position(position: &Position) -> Self {
        let mut bytes = [0u8; 32];
        for square in position.occupied() {
            let code = position.piece_on(square).code();
            bytes[square.index() / 2] |= code << (4 * (square.index() % 2));
        }
        Self(bytes)
    }

    pub fn piece_on(&self, square: Square) -> Piece {
        let nibble = (self.0[square.index() / 2] >> (4 * (square.index() % 2))) & 0x0F;
        Piece::from_code(nibble).unwrap_or_default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    /// The board as four native-endian words, usable as a transposition key.
    pub fn as_words(&self) -> [u64; 4] {
        bytemuck::cast(self.0)
    }
}

impl From<&Position> for PackedBoard {
    fn from(position: &Position) -> Self {
        Self::from_position(position)
    }
}

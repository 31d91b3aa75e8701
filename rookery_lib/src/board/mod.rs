pub mod attacks;
pub mod make_move;
pub mod movegen;
pub mod packed;

use std::fmt::Display;

use rookery_bitboards::*;

use crate::{
    error::{ChessResult, InternalError},
    types::*,
};

/// Mutable piece placement. The piece array, the twelve piece bitboards,
/// the two side bitboards and the empty-square bitboard are kept in
/// lockstep by `set_piece`.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Position {
    squares: [Piece; 64],
    piece_masks: [[BitBoard; 6]; 2],
    color_masks: [BitBoard; 2],
    empty: BitBoard,
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl Position {
    /// An empty board.
    pub fn new() -> Self {
        Self {
            squares: [Piece::Empty; 64],
            piece_masks: [[BitBoard::empty(); 6]; 2],
            color_masks: [BitBoard::empty(); 2],
            empty: FULL_BOARD,
        }
    }

    pub fn starting() -> Self {
        use PieceKind::*;
        const BACK_RANK: [PieceKind; 8] = [Rook, Knight, Bishop, Queen, King, Bishop, Knight, Rook];

        let mut position = Self::new();
        for (file, &kind) in BACK_RANK.iter().enumerate() {
            position.set_piece(
                Square::from_file_rank(file, 0),
                Piece::new(Color::White, kind),
            );
            position.set_piece(
                Square::from_file_rank(file, 1),
                Piece::new(Color::White, Pawn),
            );
            position.set_piece(
                Square::from_file_rank(file, 6),
                Piece::new(Color::Black, Pawn),
            );
            position.set_piece(
                Square::from_file_rank(file, 7),
                Piece::new(Color::Black, kind),
            );
        }
        position
    }

    #[inline(always)]
    pub fn piece_on(&self, square: Square) -> Piece {
        self.squares[square]
    }

    /// Places `piece` on `square`, replacing whatever was there, and returns
    /// the previous contents.
    #[inline]
    pub fn set_piece(&mut self, square: Square, piece: Piece) -> Piece {
        let previous = self.squares[square];
        let mask = square.bitboard();

        if let Piece::Occupied(color, kind) = previous {
            self.piece_masks[color][kind] ^= mask;
            self.color_masks[color] ^= mask;
            self.empty |= mask;
        }
        if let Piece::Occupied(color, kind) = piece {
            self.piece_masks[color][kind] |= mask;
            self.color_masks[color] |= mask;
            self.empty ^= mask;
        }
        self.squares[square] = piece;
        previous
    }

    #[inline]
    pub fn clear_square(&mut self, square: Square) -> Piece {
        self.set_piece(square, Piece::Empty)
    }

    #[inline(always)]
    pub fn pieces(&self, color: Color, kind: PieceKind) -> BitBoard {
        self.piece_masks[color][kind]
    }

    /// Pieces of either color of the given kind.
    #[inline(always)]
    pub fn pieces_of_kind(&self, kind: PieceKind) -> BitBoard {
        self.piece_masks[Color::White][kind] | self.piece_masks[Color::Black][kind]
    }

    #[inline(always)]
    pub fn color(&self, color: Color) -> BitBoard {
        self.color_masks[color]
    }

    #[inline(always)]
    pub fn occupied(&self) -> BitBoard {
        self.empty.inverse()
    }

    #[inline(always)]
    pub fn empty_squares(&self) -> BitBoard {
        self.empty
    }

    /// Rooks and queens of `color`.
    #[inline(always)]
    pub fn straight_sliders(&self, color: Color) -> BitBoard {
        self.piece_masks[color][PieceKind::Rook] | self.piece_masks[color][PieceKind::Queen]
    }

    /// Bishops and queens of `color`.
    #[inline(always)]
    pub fn diagonal_sliders(&self, color: Color) -> BitBoard {
        self.piece_masks[color][PieceKind::Bishop] | self.piece_masks[color][PieceKind::Queen]
    }

    #[inline]
    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.piece_masks[color][PieceKind::King].first_square()
    }

    /// Like `king_square`, but a missing king is an engine defect.
    #[inline]
    pub fn expect_king(&self, color: Color) -> ChessResult<Square> {
        self.king_square(color)
            .ok_or_else(|| InternalError::MissingKing(color).into())
    }

    /// Verifies that every redundant view of the board agrees.
    pub fn check_consistency(&self) -> Result<(), InternalError> {
        for square in Square::ALL {
            let mut owners = 0;
            for color in Color::ALL {
                for kind in PieceKind::ALL {
                    if self.piece_masks[color][kind].contains(square) {
                        owners += 1;
                        if self.squares[square] != Piece::new(color, kind) {
                            return Err(InternalError::PieceArrayMismatch(square));
                        }
                    }
                }
            }
            match owners {
                0 if !self.squares[square].is_empty() => {
                    return Err(InternalError::PieceArrayMismatch(square))
                }
                0 | 1 => {}
                _ => return Err(InternalError::DoubleOccupied(square)),
            }
        }

        for color in Color::ALL {
            let union = self.piece_masks[color]
                .iter()
                .fold(BitBoard::empty(), |union, &mask| union | mask);
            if union != self.color_masks[color] {
                return Err(InternalError::SideUnionMismatch(color));
            }
        }
        if (self.color_masks[Color::White] & self.color_masks[Color::Black]).is_not_empty() {
            return Err(InternalError::SideUnionMismatch(Color::Black));
        }
        if self.empty != (self.color_masks[Color::White] | self.color_masks[Color::Black]).inverse()
        {
            return Err(InternalError::EmptySquaresMismatch);
        }
        Ok(())
    }

    /// Consistency plus exactly one king per side, required of any position a
    /// game is played from.
    pub fn check_game_ready(&self) -> Result<(), InternalError> {
        self.check_consistency()?;
        for color in Color::ALL {
            match self.piece_masks[color][PieceKind::King].count_ones() {
                0 => return Err(InternalError::MissingKing(color)),
                1 => {}
                _ => return Err(InternalError::DuplicateKing(color)),
            }
        }
        Ok(())
    }

    /// Runs the full consistency check in debug builds only.
    #[inline]
    pub(crate) fn debug_check(&self) -> ChessResult<()> {
        #[cfg(debug_assertions)]
        if let Err(e) = self.check_consistency() {
            tracing::error!("position consistency check failed: {e}");
            return Err(e.into());
        }
        Ok(())
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for rank in (0..8).rev() {
            write!(f, "{}  ", rank + 1)?;
            for file in 0..8 {
                let symbol = self
                    .piece_on(Square::from_file_rank(file, rank))
                    .fen_char()
                    .unwrap_or('.');
                write!(f, "{symbol} ")?;
            }
            writeln!(f)?;
        }
        write!(f, "\n   a b c d e f g h")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rookery_bitboards::Square::*;

    #[test]
    fn starting_position_is_consistent() {
        let position = Position::starting();
        assert!(position.check_game_ready().is_ok());
        assert_eq!(position.occupied().count_ones(), 32);
        assert_eq!(position.king_square(Color::Black), Some(E8));
        assert_eq!(
            position.piece_on(D1),
            Piece::new(Color::White, PieceKind::Queen)
        );
        assert_eq!(position.pieces(Color::Black, PieceKind::Pawn), SEVENTH_RANK);
    }

    #[test]
    fn set_piece_replaces_and_returns_previous() {
        let mut position = Position::starting();
        let previous = position.set_piece(E2, Piece::new(Color::Black, PieceKind::Queen));
        assert_eq!(previous, Piece::new(Color::White, PieceKind::Pawn));
        assert!(position.check_consistency().is_ok());
        assert!(position.color(Color::Black).contains(E2));
        assert!(!position.color(Color::White).contains(E2));

        position.clear_square(E2);
        assert!(position.empty_squares().contains(E2));
        assert!(position.check_consistency().is_ok());
    }

    #[test]
    fn consistency_check_detects_corruption() {
        let mut position = Position::starting();
        position.squares[A3] = Piece::new(Color::White, PieceKind::Knight);
        assert_eq!(
            position.check_consistency(),
            Err(InternalError::PieceArrayMismatch(A3))
        );

        let mut position = Position::starting();
        position.piece_masks[Color::White][PieceKind::Knight] |= A1.bitboard();
        assert!(position.check_consistency().is_err());
    }

    #[test]
    fn game_ready_requires_one_king_each() {
        let mut position = Position::new();
        position.set_piece(E1, Piece::new(Color::White, PieceKind::King));
        assert_eq!(
            position.check_game_ready(),
            Err(InternalError::MissingKing(Color::Black))
        );
        position.set_piece(E8, Piece::new(Color::Black, PieceKind::King));
        position.set_piece(D8, Piece::new(Color::Black, PieceKind::King));
        assert_eq!(
            position.check_game_ready(),
            Err(InternalError::DuplicateKing(Color::Black))
        );
    }
}

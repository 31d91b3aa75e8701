use rookery_bitboards::*;

use super::Position;
use crate::{
    error::{ChessResult, InputError, InternalError},
    moves::{Move, MoveFlags},
    types::*,
};

/// Everything needed to reverse one `make_move`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UndoRecord {
    pub mv: Move,
    /// The piece as it stood on the source square, a pawn for promotions.
    pub moved: Piece,
    pub captured: Piece,
    /// Differs from `mv.to` only for en passant.
    pub captured_square: Square,
    pub rook_move: Option<(Square, Square)>,
    pub flags: MoveFlags,
    pub castling_before: CastlingRights,
    pub castling_after: CastlingRights,
    pub en_passant_before: Option<EnPassantTarget>,
    pub en_passant_after: Option<EnPassantTarget>,
}

impl UndoRecord {
    /// Pawn moves and captures reset the half-move clock.
    pub fn resets_half_move_clock(&self) -> bool {
        self.moved.kind() == Some(PieceKind::Pawn) || !self.captured.is_empty()
    }
}

/// Classifies `mv` against the board before anything is mutated.
fn classify(
    position: &Position,
    mv: Move,
    side: Color,
    en_passant: Option<EnPassantTarget>,
) -> ChessResult<(PieceKind, MoveFlags)> {
    let kind = match position.piece_on(mv.from) {
        Piece::Empty => return Err(InternalError::EmptySource(mv.from).into()),
        Piece::Occupied(color, _) if color != side => {
            return Err(InternalError::WrongSideToMove(mv.from).into())
        }
        Piece::Occupied(_, kind) => kind,
    };

    let target = position.piece_on(mv.to);
    if target.color() == Some(side) {
        return Err(InternalError::SameSideCapture(mv.to).into());
    }

    let mut flags = MoveFlags::QUIET;
    if !target.is_empty() {
        flags = flags.with(MoveFlags::CAPTURE);
    }

    match kind {
        PieceKind::Pawn => {
            if mv.to.rank() == side.promotion_rank() {
                match mv.promotion {
                    None => return Err(InputError::MissingPromotion(mv).into()),
                    Some(choice) if !choice.is_promotion_choice() => {
                        return Err(InputError::UnexpectedPromotion(mv).into())
                    }
                    Some(_) => flags = flags.with(MoveFlags::PROMOTION),
                }
            } else if mv.promotion.is_some() {
                return Err(InputError::UnexpectedPromotion(mv).into());
            }

            if let Some(target) = en_passant {
                if mv.to == target.capture_square
                    && mv.from.file() != mv.to.file()
                    && position.piece_on(mv.to).is_empty()
                {
                    flags = flags.with(MoveFlags::CAPTURE | MoveFlags::EN_PASSANT);
                }
            }
        }
        PieceKind::King => {
            if mv.promotion.is_some() {
                return Err(InputError::UnexpectedPromotion(mv).into());
            }
            if mv.from.file().abs_diff(mv.to.file()) == 2 {
                flags = flags.with(MoveFlags::CASTLING);
            }
        }
        _ => {
            if mv.promotion.is_some() {
                return Err(InputError::UnexpectedPromotion(mv).into());
            }
        }
    }

    Ok((kind, flags))
}

fn castling_side_of(mv: Move, side: Color) -> Option<CastlingSide> {
    CastlingSide::ALL.into_iter().find(|&castling_side| {
        let path = castling_path(side, castling_side);
        path.king_from == mv.from && path.king_to == mv.to
    })
}

/// Applies `mv` for `side`, returning the record that reverses it.
///
/// The move is assumed to be pseudo-legal; structural violations (empty
/// source, wrong side, own-piece capture, bad promotion) are rejected before
/// the board is touched.
pub fn make_move(
    position: &mut Position,
    mv: Move,
    side: Color,
    en_passant: Option<EnPassantTarget>,
    castling: CastlingRights,
) -> ChessResult<UndoRecord> {
    let (kind, flags) = classify(position, mv, side, en_passant)?;
    let moved = Piece::new(side, kind);

    let mut rook_move = None;
    if flags.is_castling() {
        let castling_side =
            castling_side_of(mv, side).ok_or(InternalError::EmptySource(mv.from))?;
        let path = castling_path(side, castling_side);
        if !position.piece_on(path.rook_from).is(side, PieceKind::Rook) {
            return Err(InternalError::EmptySource(path.rook_from).into());
        }
        rook_move = Some((path.rook_from, path.rook_to));
    }

    let captured_square = match en_passant {
        Some(target) if flags.is_en_passant() => target.captured_pawn_square,
        _ => mv.to,
    };

    let captured = if flags.is_en_passant() {
        position.clear_square(captured_square)
    } else {
        Piece::Empty
    };
    position.clear_square(mv.from);
    let arriving = match mv.promotion {
        Some(choice) => Piece::new(side, choice),
        None => moved,
    };
    let captured = match position.set_piece(mv.to, arriving) {
        Piece::Empty => captured,
        replaced => replaced,
    };

    if let Some((rook_from, rook_to)) = rook_move {
        position.clear_square(rook_from);
        position.set_piece(rook_to, Piece::new(side, PieceKind::Rook));
    }

    let mut castling_after = castling;
    castling_after.invalidate(mv.from);
    castling_after.invalidate(mv.to);

    let en_passant_after = if kind == PieceKind::Pawn && mv.from.rank().abs_diff(mv.to.rank()) == 2
    {
        Some(EnPassantTarget {
            capture_square: Square::from_file_rank(mv.from.file(), (mv.from.rank() + mv.to.rank()) / 2),
            captured_pawn_square: mv.to,
        })
    } else {
        None
    };

    position.debug_check()?;

    Ok(UndoRecord {
        mv,
        moved,
        captured,
        captured_square,
        rook_move,
        flags,
        castling_before: castling,
        castling_after,
        en_passant_before: en_passant,
        en_passant_after,
    })
}

/// Reverses a `make_move`. The position must be exactly as `make_move` left
/// it.
pub fn undo_move(position: &mut Position, record: &UndoRecord) -> ChessResult<()> {
    let mv = record.mv;
    if position.piece_on(mv.to).is_empty() {
        return Err(InternalError::EmptySource(mv.to).into());
    }

    position.clear_square(mv.to);
    position.set_piece(mv.from, record.moved);
    if !record.captured.is_empty() {
        position.set_piece(record.captured_square, record.captured);
    }

    if let Some((rook_from, rook_to)) = record.rook_move {
        let rook = position.clear_square(rook_to);
        position.set_piece(rook_from, rook);
    }

    position.debug_check()
}

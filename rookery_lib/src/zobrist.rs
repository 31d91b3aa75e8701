use once_cell::sync::Lazy;
use rand::prelude::*;
use rookery_bitboards::Square;

use crate::{
    board::Position,
    types::{CastlingRights, Color, Piece, CASTLING_RIGHT_ORDER},
};

const PIECE_NUMBERS: usize = 64 * 6 * 2;
const CASTLING_NUMBERS: usize = 4;
const EN_PASSANT_NUMBERS: usize = 8;
const ZOBRIST_NUMBER_COUNT: usize = PIECE_NUMBERS + CASTLING_NUMBERS + EN_PASSANT_NUMBERS + 1;

static ZOBRIST_NUMBERS: Lazy<[u64; ZOBRIST_NUMBER_COUNT]> = Lazy::new(|| {
    let mut rng = StdRng::seed_from_u64(0x11A5117AB1E0);
    let mut numbers = [0; ZOBRIST_NUMBER_COUNT];
    rng.fill(&mut numbers[..]);
    numbers
});

#[inline]
pub fn zobrist_piece(piece: Piece, square: Square) -> u64 {
    match piece {
        Piece::Empty => 0,
        Piece::Occupied(color, kind) => {
            ZOBRIST_NUMBERS[64 * 2 * kind.index() + 64 * color.index() + square.index()]
        }
    }
}

/// XOR of one number per set castling right.
#[inline]
pub fn zobrist_castling(rights: CastlingRights) -> u64 {
    CASTLING_RIGHT_ORDER
        .iter()
        .enumerate()
        .filter(|(_, &(color, side))| rights.has(color, side))
        .fold(0, |hash, (i, _)| hash ^ ZOBRIST_NUMBERS[PIECE_NUMBERS + i])
}

#[inline]
pub fn zobrist_en_passant(file: usize) -> u64 {
    ZOBRIST_NUMBERS[PIECE_NUMBERS + CASTLING_NUMBERS + (file & 7)]
}

#[inline]
pub fn zobrist_player() -> u64 {
    ZOBRIST_NUMBERS[ZOBRIST_NUMBER_COUNT - 1]
}

/// Full key of a position. `en_passant_file` must only be given when an
/// en passant capture is actually available to the side to move.
pub fn zobrist_key(
    position: &Position,
    castling_rights: CastlingRights,
    en_passant_file: Option<usize>,
    side_to_move: Color,
) -> u64 {
    let mut hash = position
        .occupied()
        .fold(0, |hash, square| hash ^ zobrist_piece(position.piece_on(square), square));

    hash ^= zobrist_castling(castling_rights);
    if let Some(file) = en_passant_file {
        hash ^= zobrist_en_passant(file);
    }
    if side_to_move == Color::Black {
        hash ^= zobrist_player();
    }
    hash
}

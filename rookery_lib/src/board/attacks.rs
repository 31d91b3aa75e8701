//! Attack detection and pin resolution.
//!
//! Sliding attacks are resolved against the connection table: a rook, bishop
//! or queen on a ray through the target attacks it exactly when every square
//! strictly between the two is empty.

use std::ops::Index;

use rookery_bitboards::*;

use super::Position;
use crate::{lookup_tables::*, types::*};

/// Squares a pawn of `color` on `square` attacks.
#[inline(always)]
pub fn pawn_attacks(square: Square, color: Color) -> BitBoard {
    let board = square.bitboard();
    match color {
        Color::White => board.shift(Direction::NorthWest) | board.shift(Direction::NorthEast),
        Color::Black => board.shift(Direction::SouthWest) | board.shift(Direction::SouthEast),
    }
}

/// Pawns of `attacker` that attack `target`.
#[inline(always)]
fn pawn_attackers(position: &Position, target: Square, attacker: Color) -> BitBoard {
    // a pawn attacks the target iff a pawn of the other color on the target
    // would attack the pawn's square
    pawn_attacks(target, !attacker) & position.pieces(attacker, PieceKind::Pawn)
}

#[inline(always)]
fn sliding_attackers(
    candidates: BitBoard,
    target: Square,
    empty: BitBoard,
    first_only: bool,
) -> BitBoard {
    let mut attackers = BitBoard::empty();
    for slider in candidates {
        if (lookup_connection(slider, target) & empty.inverse()).is_empty() {
            attackers |= slider.bitboard();
            if first_only {
                break;
            }
        }
    }
    attackers
}

fn collect_attackers(
    position: &Position,
    target: Square,
    attacker: Color,
    empty: BitBoard,
    first_only: bool,
) -> BitBoard {
    let mut attackers = pawn_attackers(position, target, attacker);
    if first_only && attackers.is_not_empty() {
        return attackers;
    }

    attackers |= lookup_knight(target) & position.pieces(attacker, PieceKind::Knight);
    attackers |= lookup_king(target) & position.pieces(attacker, PieceKind::King);
    if first_only && attackers.is_not_empty() {
        return attackers;
    }

    attackers |= sliding_attackers(
        lookup_straight_rays(target) & position.straight_sliders(attacker),
        target,
        empty,
        first_only,
    );
    if first_only && attackers.is_not_empty() {
        return attackers;
    }

    attackers
        | sliding_attackers(
            lookup_diagonal_rays(target) & position.diagonal_sliders(attacker),
            target,
            empty,
            first_only,
        )
}

/// Every piece of `attacker` that attacks `target`.
pub fn attackers_of(position: &Position, target: Square, attacker: Color) -> BitBoard {
    collect_attackers(position, target, attacker, position.empty_squares(), false)
}

/// Whether any piece of `attacker` attacks `target`.
pub fn is_under_attack(position: &Position, target: Square, attacker: Color) -> bool {
    collect_attackers(position, target, attacker, position.empty_squares(), true).is_not_empty()
}

/// As `is_under_attack`, but treating `empty` as the empty squares. Used to
/// look through the king when testing its own destination squares.
pub fn is_under_attack_with_empty(
    position: &Position,
    target: Square,
    attacker: Color,
    empty: BitBoard,
) -> bool {
    collect_attackers(position, target, attacker, empty, true).is_not_empty()
}

/// Allowed destinations per square for the defending side. Unpinned
/// squares allow everything; a pinned piece may only stay on the pin line
/// or capture the pinner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PinLimitations([BitBoard; 64]);

impl PinLimitations {
    pub fn unrestricted() -> Self {
        Self([FULL_BOARD; 64])
    }

    #[inline(always)]
    pub fn allowed(&self, square: Square) -> BitBoard {
        self.0[square]
    }

    #[inline(always)]
    pub fn is_pinned(&self, square: Square) -> bool {
        self.0[square] != FULL_BOARD
    }
}

impl Index<Square> for PinLimitations {
    type Output = BitBoard;

    fn index(&self, index: Square) -> &Self::Output {
        &self.0[index]
    }
}

/// Computes the pin limitations of the side owning the king on
/// `king_square` against sliders of `attacker`.
pub fn pin_limitations(position: &Position, king_square: Square, attacker: Color) -> PinLimitations {
    let mut limits = PinLimitations::unrestricted();
    let defender = !attacker;

    let pinners = (lookup_straight_rays(king_square) & position.straight_sliders(attacker))
        | (lookup_diagonal_rays(king_square) & position.diagonal_sliders(attacker));

    for pinner in pinners {
        let line = lookup_connection(king_square, pinner);
        let own = line & position.color(defender);
        if own.is_singleton() && (line & position.color(attacker)).is_empty() {
            if let Some(pinned) = own.first_square() {
                limits.0[pinned] = line | pinner.bitboard();
            }
        }
    }
    limits
}

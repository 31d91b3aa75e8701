use std::fmt::Display;

use rookery_bitboards::*;

use crate::{board::Position, types::*};

/// Half-moves without a pawn move or capture after which the game is drawn.
pub const FIFTY_MOVE_HALF_MOVES: u32 = 100;

/// Occurrences of one position that draw the game.
pub const REPETITION_LIMIT: u32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DrawType {
    ThreefoldRepetition,
    FiftyMoveRule,
    InsufficientMaterial,
}

impl Display for DrawType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DrawType::ThreefoldRepetition => "threefold repetition",
            DrawType::FiftyMoveRule => "the fifty-move rule",
            DrawType::InsufficientMaterial => "insufficient material",
        };
        write!(f, "{name}")
    }
}

/// Material configurations that can never deliver checkmate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsufficientMaterial {
    BareKings,
    /// One side has a single knight or bishop against a bare king.
    LoneMinor,
    /// One bishop each, both on the same square colour.
    SameColouredBishops,
}

pub fn insufficient_material(position: &Position) -> Option<InsufficientMaterial> {
    let heavy = position.pieces_of_kind(PieceKind::Pawn)
        | position.pieces_of_kind(PieceKind::Rook)
        | position.pieces_of_kind(PieceKind::Queen);
    if heavy.is_not_empty() {
        return None;
    }

    let knights = position.pieces_of_kind(PieceKind::Knight);
    let bishops = position.pieces_of_kind(PieceKind::Bishop);
    match (knights.count_ones(), bishops.count_ones()) {
        (0, 0) => Some(InsufficientMaterial::BareKings),
        (1, 0) | (0, 1) => Some(InsufficientMaterial::LoneMinor),
        (0, 2) => {
            let white = position.pieces(Color::White, PieceKind::Bishop);
            let black = position.pieces(Color::Black, PieceKind::Bishop);
            let one_each = white.is_singleton() && black.is_singleton();
            let same_colour = bishops & LIGHT_SQUARES == bishops || bishops & DARK_SQUARES == bishops;
            (one_each && same_colour).then_some(InsufficientMaterial::SameColouredBishops)
        }
        _ => None,
    }
}

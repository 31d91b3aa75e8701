use std::{fmt::Display, str::FromStr};

use rookery_bitboards::*;

use crate::{
    error::{ChessError, InputError},
    types::PieceKind,
};

/// A move as source, destination and optional promotion piece. Castling is
/// the king's two-square move; en passant is the pawn's diagonal step onto
/// the target square.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
}

impl Move {
    pub const fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    pub const fn promoting(from: Square, to: Square, kind: PieceKind) -> Self {
        Self {
            from,
            to,
            promotion: Some(kind),
        }
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.letter())?;
        }
        Ok(())
    }
}

impl FromStr for Move {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ChessError::from(InputError::InvalidMoveText(s.to_string()));

        if !s.is_ascii() || !(4..=5).contains(&s.len()) {
            return Err(invalid());
        }
        let from: Square = s[0..2].parse()?;
        let to: Square = s[2..4].parse()?;
        let promotion = match s.chars().nth(4) {
            None => None,
            Some(letter) => match PieceKind::from_letter(letter) {
                Some(kind) if kind.is_promotion_choice() && letter.is_ascii_lowercase() => {
                    Some(kind)
                }
                _ => return Err(invalid()),
            },
        };
        Ok(Self {
            from,
            to,
            promotion,
        })
    }
}

/// Classification of a legal move, computed once per generation pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct MoveFlags(u8);

impl MoveFlags {
    pub const CAPTURE: u8 = 0b00001;
    pub const EN_PASSANT: u8 = 0b00010;
    pub const PROMOTION: u8 = 0b00100;
    pub const CASTLING: u8 = 0b01000;
    pub const GIVES_CHECK: u8 = 0b10000;

    pub const QUIET: MoveFlags = MoveFlags(0);

    #[inline]
    pub fn with(self, flag: u8) -> Self {
        Self(self.0 | flag)
    }

    #[inline]
    pub fn contains(self, flag: u8) -> bool {
        self.0 & flag == flag
    }

    /// True for en passant as well as ordinary captures.
    pub fn is_capture(self) -> bool {
        self.contains(Self::CAPTURE)
    }

    pub fn is_en_passant(self) -> bool {
        self.contains(Self::EN_PASSANT)
    }

    pub fn is_promotion(self) -> bool {
        self.contains(Self::PROMOTION)
    }

    pub fn is_castling(self) -> bool {
        self.contains(Self::CASTLING)
    }

    pub fn gives_check(self) -> bool {
        self.contains(Self::GIVES_CHECK)
    }
}

/// A legal move together with its classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ClassifiedMove {
    pub mv: Move,
    pub flags: MoveFlags,
}

/// All destinations of one piece. Iterating expands pawn moves onto the
/// last rank into one move per promotion choice.
#[derive(Clone, Copy, Debug)]
pub struct MoveMask {
    pub kind: PieceKind,
    pub start: Square,
    pub moves: BitBoard,
}

impl MoveMask {
    pub fn len(&self) -> usize {
        let len = if self.kind == PieceKind::Pawn {
            self.moves.count_ones() + (self.moves & (EIGHTH_RANK | FIRST_RANK)).count_ones() * 3
        } else {
            self.moves.count_ones()
        };
        len as usize
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

impl IntoIterator for MoveMask {
    type Item = Move;

    type IntoIter = MoveMaskIter;

    fn into_iter(self) -> Self::IntoIter {
        MoveMaskIter {
            mask: self,
            promotion_counter: 0,
        }
    }
}

pub struct MoveMaskIter {
    mask: MoveMask,
    promotion_counter: usize,
}

impl Iterator for MoveMaskIter {
    type Item = Move;

    fn next(&mut self) -> Option<Self::Item> {
        let target = self.mask.moves.first_square()?;
        if self.mask.kind == PieceKind::Pawn && matches!(target.rank(), 0 | 7) {
            let kind = PieceKind::PROMOTIONS[self.promotion_counter];
            if self.promotion_counter < PieceKind::PROMOTIONS.len() - 1 {
                self.promotion_counter += 1;
            } else {
                self.promotion_counter = 0;
                self.mask.moves ^= target.bitboard();
            }
            Some(Move::promoting(self.mask.start, target, kind))
        } else {
            self.mask.moves ^= target.bitboard();
            Some(Move::new(self.mask.start, target))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rookery_bitboards::Square::*;

    #[test]
    fn coordinate_text() {
        let mv: Move = "e7e8q".parse().unwrap();
        assert_eq!(mv, Move::promoting(E7, E8, PieceKind::Queen));
        assert_eq!(mv.to_string(), "e7e8q");
        assert_eq!("e1g1".parse::<Move>().unwrap(), Move::new(E1, G1));
    }

    #[test]
    fn malformed_text_is_an_input_error() {
        for text in ["", "e2", "e2e9", "e7e8k", "e7e8Q", "e2e4e5", "i2e4", "é2e4"] {
            let err = text.parse::<Move>().unwrap_err();
            assert!(err.is_input(), "{text}");
        }
    }

    #[test]
    fn bad_squares_name_the_square() {
        assert_eq!(
            "e2e9".parse::<Move>().unwrap_err(),
            ChessError::Input(InputError::InvalidSquare("e9".to_string()))
        );
        assert_eq!(
            "z1a1".parse::<Move>().unwrap_err(),
            ChessError::Input(InputError::InvalidSquare("z1".to_string()))
        );
        assert_eq!(
            "e7e8k".parse::<Move>().unwrap_err(),
            ChessError::Input(InputError::InvalidMoveText("e7e8k".to_string()))
        );
    }

    #[test]
    fn promotion_masks_expand_in_order() {
        let mask = MoveMask {
            kind: PieceKind::Pawn,
            start: B7,
            moves: BitBoard::from_iter([A8, B8]),
        };
        assert_eq!(mask.len(), 8);
        let moves: Vec<Move> = mask.into_iter().collect();
        assert_eq!(moves.len(), 8);
        assert_eq!(moves[0], Move::promoting(B7, A8, PieceKind::Queen));
        assert_eq!(moves[3], Move::promoting(B7, A8, PieceKind::Knight));
        assert_eq!(moves[4], Move::promoting(B7, B8, PieceKind::Queen));
    }

    #[test]
    fn flags_accumulate() {
        let flags = MoveFlags::QUIET
            .with(MoveFlags::CAPTURE)
            .with(MoveFlags::EN_PASSANT);
        assert!(flags.is_capture());
        assert!(flags.is_en_passant());
        assert!(!flags.is_promotion());
        assert!(!flags.gives_check());
    }
}

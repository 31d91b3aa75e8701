use std::{
    fmt::Display,
    ops::{Index, IndexMut, Not},
};

use rookery_bitboards::Square;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum Color {
    White = 0,
    Black = 1,
}

impl Color {
    pub const ALL: [Color; 2] = [Color::White, Color::Black];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Rank index (0-based) pawns of this color start on.
    #[inline]
    pub const fn pawn_rank(self) -> usize {
        match self {
            Color::White => 1,
            Color::Black => 6,
        }
    }

    /// Rank index (0-based) pawns of this color promote on.
    #[inline]
    pub const fn promotion_rank(self) -> usize {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }
}

impl Not for Color {
    type Output = Self;

    fn not(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

impl<T, const N: usize> Index<Color> for [T; N] {
    type Output = T;

    fn index(&self, index: Color) -> &Self::Output {
        &self[index as usize]
    }
}

impl<T, const N: usize> IndexMut<Color> for [T; N] {
    fn index_mut(&mut self, index: Color) -> &mut Self::Output {
        &mut self[index as usize]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PieceKind {
    Pawn = 0,
    Knight = 1,
    Bishop = 2,
    Rook = 3,
    Queen = 4,
    King = 5,
}

use PieceKind::*;

impl PieceKind {
    pub const ALL: [PieceKind; 6] = [Pawn, Knight, Bishop, Rook, Queen, King];
    /// Promotion choices in the order moves are generated.
    pub const PROMOTIONS: [PieceKind; 4] = [Queen, Rook, Bishop, Knight];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn is_slider(self) -> bool {
        matches!(self, Bishop | Rook | Queen)
    }

    pub fn is_promotion_choice(self) -> bool {
        matches!(self, Knight | Bishop | Rook | Queen)
    }

    /// Lowercase FEN / coordinate-notation letter.
    pub fn letter(self) -> char {
        match self {
            Pawn => 'p',
            Knight => 'n',
            Bishop => 'b',
            Rook => 'r',
            Queen => 'q',
            King => 'k',
        }
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_lowercase() {
            'p' => Some(Pawn),
            'n' => Some(Knight),
            'b' => Some(Bishop),
            'r' => Some(Rook),
            'q' => Some(Queen),
            'k' => Some(King),
            _ => None,
        }
    }
}

impl<T, const N: usize> Index<PieceKind> for [T; N] {
    type Output = T;

    fn index(&self, index: PieceKind) -> &Self::Output {
        &self[index as usize]
    }
}

impl<T, const N: usize> IndexMut<PieceKind> for [T; N] {
    fn index_mut(&mut self, index: PieceKind) -> &mut Self::Output {
        &mut self[index as usize]
    }
}

/// Contents of a single square. `Empty` carries no color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Piece {
    #[default]
    Empty,
    Occupied(Color, PieceKind),
}

impl Piece {
    #[inline]
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        Piece::Occupied(color, kind)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self == Piece::Empty
    }

    #[inline]
    pub fn kind(self) -> Option<PieceKind> {
        match self {
            Piece::Empty => None,
            Piece::Occupied(_, kind) => Some(kind),
        }
    }

    #[inline]
    pub fn color(self) -> Option<Color> {
        match self {
            Piece::Empty => None,
            Piece::Occupied(color, _) => Some(color),
        }
    }

    #[inline]
    pub fn is(self, color: Color, kind: PieceKind) -> bool {
        self == Piece::Occupied(color, kind)
    }

    /// Fixed 4-bit code: 0 for empty, 1..=6 for white pawn..king,
    /// 9..=14 for black pawn..king.
    pub fn code(self) -> u8 {
        match self {
            Piece::Empty => 0,
            Piece::Occupied(color, kind) => ((color as u8) << 3) | (kind as u8 + 1),
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        if code == 0 {
            return Some(Piece::Empty);
        }
        let color = if code & 0b1000 == 0 {
            Color::White
        } else {
            Color::Black
        };
        let kind = match code & 0b111 {
            1 => Pawn,
            2 => Knight,
            3 => Bishop,
            4 => Rook,
            5 => Queen,
            6 => King,
            _ => return None,
        };
        Some(Piece::Occupied(color, kind))
    }

    pub fn fen_char(self) -> Option<char> {
        match self {
            Piece::Empty => None,
            Piece::Occupied(Color::White, kind) => Some(kind.letter().to_ascii_uppercase()),
            Piece::Occupied(Color::Black, kind) => Some(kind.letter()),
        }
    }

    pub fn from_fen_char(chr: char) -> Option<Self> {
        let kind = PieceKind::from_letter(chr)?;
        let color = if chr.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some(Piece::Occupied(color, kind))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CastlingSide {
    Kingside = 0,
    Queenside = 1,
}

impl CastlingSide {
    pub const ALL: [CastlingSide; 2] = [CastlingSide::Kingside, CastlingSide::Queenside];
}

/// Castling rights as a 4-bit set. Bits are only ever cleared during a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const WHITE_KINGSIDE: u8 = 0b0001;
    pub const WHITE_QUEENSIDE: u8 = 0b0010;
    pub const BLACK_KINGSIDE: u8 = 0b0100;
    pub const BLACK_QUEENSIDE: u8 = 0b1000;

    pub const NONE: CastlingRights = CastlingRights(0);
    pub const ALL: CastlingRights = CastlingRights(0b1111);

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn flag(color: Color, side: CastlingSide) -> u8 {
        1 << (2 * color as u8 + side as u8)
    }

    #[inline]
    pub fn has(self, color: Color, side: CastlingSide) -> bool {
        self.0 & Self::flag(color, side) != 0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn insert(&mut self, color: Color, side: CastlingSide) {
        self.0 |= Self::flag(color, side);
    }

    #[inline]
    pub fn remove(&mut self, color: Color, side: CastlingSide) {
        self.0 &= !Self::flag(color, side);
    }

    /// Clears every right that depends on a piece standing on `square`.
    #[inline]
    pub fn invalidate(&mut self, square: Square) {
        for (color, side) in CASTLING_RIGHT_ORDER {
            let path = castling_path(color, side);
            if square == path.king_from || square == path.rook_from {
                self.remove(color, side);
            }
        }
    }

    /// Set rights in FEN order (`K`, `Q`, `k`, `q`).
    pub fn iter(self) -> impl Iterator<Item = (Color, CastlingSide)> {
        CASTLING_RIGHT_ORDER
            .into_iter()
            .filter(move |&(color, side)| self.has(color, side))
    }
}

pub const CASTLING_RIGHT_ORDER: [(Color, CastlingSide); 4] = [
    (Color::White, CastlingSide::Kingside),
    (Color::White, CastlingSide::Queenside),
    (Color::Black, CastlingSide::Kingside),
    (Color::Black, CastlingSide::Queenside),
];

/// Fixed squares involved in one castling move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CastlingPath {
    pub king_from: Square,
    pub king_to: Square,
    pub rook_from: Square,
    pub rook_to: Square,
    /// Square the king crosses on its way to `king_to`.
    pub passed: Square,
}

const CASTLING_PATHS: [[CastlingPath; 2]; 2] = [
    [
        CastlingPath {
            king_from: Square::E1,
            king_to: Square::G1,
            rook_from: Square::H1,
            rook_to: Square::F1,
            passed: Square::F1,
        },
        CastlingPath {
            king_from: Square::E1,
            king_to: Square::C1,
            rook_from: Square::A1,
            rook_to: Square::D1,
            passed: Square::D1,
        },
    ],
    [
        CastlingPath {
            king_from: Square::E8,
            king_to: Square::G8,
            rook_from: Square::H8,
            rook_to: Square::F8,
            passed: Square::F8,
        },
        CastlingPath {
            king_from: Square::E8,
            king_to: Square::C8,
            rook_from: Square::A8,
            rook_to: Square::D8,
            passed: Square::D8,
        },
    ],
];

#[inline]
pub fn castling_path(color: Color, side: CastlingSide) -> &'static CastlingPath {
    &CASTLING_PATHS[color as usize][side as usize]
}

/// Set only for the move immediately after a two-square pawn push.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EnPassantTarget {
    /// Square the capturing pawn lands on.
    pub capture_square: Square,
    /// Square of the pawn that just double-pushed.
    pub captured_pawn_square: Square,
}

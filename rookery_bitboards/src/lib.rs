use std::{
    fmt::{Debug, Display},
    ops::{self, Index, IndexMut},
    str::FromStr,
};

use overload::overload;

/// A set of squares, one bit per square with A1 as the least significant bit.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug)]
pub struct BitBoard(pub u64);

pub const EMPTY: BitBoard = BitBoard(0);
pub const FULL_BOARD: BitBoard = BitBoard(!0);

pub const A_FILE: BitBoard = BitBoard(0x0101010101010101);
pub const B_FILE: BitBoard = BitBoard(0x0202020202020202);
pub const G_FILE: BitBoard = BitBoard(0x4040404040404040);
pub const H_FILE: BitBoard = BitBoard(0x8080808080808080);

pub const FIRST_RANK: BitBoard = BitBoard(0x00000000000000FF);
pub const SECOND_RANK: BitBoard = BitBoard(0x000000000000FF00);
pub const THIRD_RANK: BitBoard = BitBoard(0x0000000000FF0000);
pub const SIXTH_RANK: BitBoard = BitBoard(0x0000FF0000000000);
pub const SEVENTH_RANK: BitBoard = BitBoard(0x00FF000000000000);
pub const EIGHTH_RANK: BitBoard = BitBoard(0xFF00000000000000);

pub const LIGHT_SQUARES: BitBoard = BitBoard(0x55AA55AA55AA55AA);
pub const DARK_SQUARES: BitBoard = BitBoard(0xAA55AA55AA55AA55);

impl BitBoard {
    #[inline]
    pub const fn empty() -> Self {
        EMPTY
    }
    #[inline]
    pub const fn full() -> Self {
        FULL_BOARD
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
    #[inline]
    pub fn is_not_empty(&self) -> bool {
        self.0 != 0
    }
    /// True when exactly one square is set.
    #[inline]
    pub fn is_singleton(&self) -> bool {
        self.0 != 0 && self.0 & (self.0 - 1) == 0
    }
    #[inline]
    pub fn inverse(&self) -> Self {
        Self(!self.0)
    }
    #[inline]
    pub fn count_ones(&self) -> u32 {
        self.0.count_ones()
    }
    #[inline]
    pub fn contains(&self, square: Square) -> bool {
        self.0 & square.bitboard().0 != 0
    }
    #[inline]
    pub fn with(&self, square: Square) -> Self {
        Self(self.0 | square.bitboard().0)
    }
    #[inline]
    pub fn without(&self, square: Square) -> Self {
        Self(self.0 & !square.bitboard().0)
    }

    /// Lowest-indexed square in the set, if any.
    #[inline]
    pub fn first_square(&self) -> Option<Square> {
        if self.0 == 0 {
            None
        } else {
            Some(Square::ALL[self.0.trailing_zeros() as usize])
        }
    }

    /// Highest-indexed square in the set, if any.
    #[inline]
    pub fn last_square(&self) -> Option<Square> {
        if self.0 == 0 {
            None
        } else {
            Some(Square::ALL[63 - self.0.leading_zeros() as usize])
        }
    }

    /// Removes and returns the lowest-indexed square.
    #[inline]
    pub fn pop_first_square(&mut self) -> Option<Square> {
        let square = self.first_square()?;
        self.0 &= self.0 - 1;
        Some(square)
    }

    /// Moves every square one step towards `direction`. Squares that would
    /// wrap around the board edge are masked off before the shift.
    #[inline]
    pub fn shift(&self, direction: Direction) -> Self {
        let b = self.0;
        Self(match direction {
            Direction::North => b << 8,
            Direction::South => b >> 8,
            Direction::East => (b & !H_FILE.0) << 1,
            Direction::West => (b & !A_FILE.0) >> 1,
            Direction::NorthEast => (b & !H_FILE.0) << 9,
            Direction::NorthWest => (b & !A_FILE.0) << 7,
            Direction::SouthEast => (b & !H_FILE.0) >> 7,
            Direction::SouthWest => (b & !A_FILE.0) >> 9,
        })
    }
}

impl Iterator for BitBoard {
    type Item = Square;

    fn next(&mut self) -> Option<Self::Item> {
        self.pop_first_square()
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.count_ones() as usize, Some(self.count_ones() as usize))
    }
}
impl ExactSizeIterator for BitBoard {}

impl FromIterator<Square> for BitBoard {
    fn from_iter<I: IntoIterator<Item = Square>>(iter: I) -> Self {
        iter.into_iter()
            .fold(BitBoard::empty(), |board, square| board.with(square))
    }
}

impl Display for BitBoard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;
        for rank in (0..8).rev() {
            write!(f, "{}  ", rank + 1)?;
            for file in 0..8 {
                let square = Square::from_file_rank(file, rank);
                let symbol = if self.contains(square) { '1' } else { '.' };
                if file == 7 {
                    writeln!(f, "{symbol}")?;
                } else {
                    write!(f, "{symbol} ")?;
                }
            }
        }
        writeln!(f, "\n   a b c d e f g h")
    }
}

overload!((a: ?BitBoard) & (b: ?BitBoard) -> BitBoard {BitBoard(a.0 & b.0)});
overload!((a: &mut BitBoard) &= (b: ?BitBoard) {a.0 &= b.0});

overload!((a: ?BitBoard) | (b: ?BitBoard) -> BitBoard {BitBoard(a.0 | b.0)});
overload!((a: &mut BitBoard) |= (b: ?BitBoard) {a.0 |= b.0});

overload!((a: ?BitBoard) ^ (b: ?BitBoard) -> BitBoard {BitBoard(a.0 ^ b.0)});
overload!((a: &mut BitBoard) ^= (b: ?BitBoard) {a.0 ^= b.0});

overload!(!(a: ?BitBoard) -> BitBoard {BitBoard(!a.0)});

/// The eight compass directions a bitboard can be shifted in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];
    pub const STRAIGHT: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];
    pub const DIAGONAL: [Direction; 4] = [
        Direction::NorthEast,
        Direction::SouthEast,
        Direction::SouthWest,
        Direction::NorthWest,
    ];

    /// Whether stepping towards this direction increases the square index.
    #[inline]
    pub fn is_ascending(self) -> bool {
        matches!(
            self,
            Direction::North | Direction::NorthEast | Direction::East | Direction::NorthWest
        )
    }
}

#[repr(u8)]
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Debug)]
#[rustfmt::skip]
pub enum Square {
    A1, B1, C1, D1, E1, F1, G1, H1,
    A2, B2, C2, D2, E2, F2, G2, H2,
    A3, B3, C3, D3, E3, F3, G3, H3,
    A4, B4, C4, D4, E4, F4, G4, H4,
    A5, B5, C5, D5, E5, F5, G5, H5,
    A6, B6, C6, D6, E6, F6, G6, H6,
    A7, B7, C7, D7, E7, F7, G7, H7,
    A8, B8, C8, D8, E8, F8, G8, H8,
}

use Square::*;
impl Square {
    #[rustfmt::skip]
    pub const ALL: [Square; 64] = [
        A1, B1, C1, D1, E1, F1, G1, H1,
        A2, B2, C2, D2, E2, F2, G2, H2,
        A3, B3, C3, D3, E3, F3, G3, H3,
        A4, B4, C4, D4, E4, F4, G4, H4,
        A5, B5, C5, D5, E5, F5, G5, H5,
        A6, B6, C6, D6, E6, F6, G6, H6,
        A7, B7, C7, D7, E7, F7, G7, H7,
        A8, B8, C8, D8, E8, F8, G8, H8,
    ];

    #[inline]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// `file` and `rank` are taken modulo 8.
    #[inline]
    pub fn from_file_rank(file: usize, rank: usize) -> Self {
        Self::ALL[(rank & 7) * 8 + (file & 7)]
    }

    #[inline]
    pub fn index(&self) -> usize {
        *self as usize
    }

    #[inline]
    pub fn bitboard(&self) -> BitBoard {
        BitBoard(1u64 << (*self as u32))
    }

    #[inline]
    pub fn rank(&self) -> usize {
        (*self as usize) >> 3
    }

    #[inline]
    pub fn file(&self) -> usize {
        (*self as usize) & 7
    }

    pub fn coord(&self) -> String {
        let file = (b'a' + self.file() as u8) as char;
        let rank = (b'1' + self.rank() as u8) as char;
        format!("{file}{rank}")
    }

    pub fn from_coord(text: &str) -> Option<Self> {
        match text.as_bytes() {
            [file @ b'a'..=b'h', rank @ b'1'..=b'8'] => Some(Self::from_file_rank(
                (file - b'a') as usize,
                (rank - b'1') as usize,
            )),
            _ => None,
        }
    }
}

impl Display for Square {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.coord())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseSquareError(pub String);

impl Display for ParseSquareError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid square '{}'", self.0)
    }
}

impl std::error::Error for ParseSquareError {}

impl FromStr for Square {
    type Err = ParseSquareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_coord(s).ok_or_else(|| ParseSquareError(s.to_string()))
    }
}

impl<T, const N: usize> Index<Square> for [T; N] {
    type Output = T;

    fn index(&self, index: Square) -> &Self::Output {
        &self[index as usize]
    }
}

impl<T, const N: usize> IndexMut<Square> for [T; N] {
    fn index_mut(&mut self, index: Square) -> &mut Self::Output {
        &mut self[index as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shifts_do_not_wrap() {
        assert_eq!(H4.bitboard().shift(Direction::East), EMPTY);
        assert_eq!(A4.bitboard().shift(Direction::West), EMPTY);
        assert_eq!(H1.bitboard().shift(Direction::NorthEast), EMPTY);
        assert_eq!(A8.bitboard().shift(Direction::North), EMPTY);
        assert_eq!(A1.bitboard().shift(Direction::South), EMPTY);
        assert_eq!(D4.bitboard().shift(Direction::NorthWest), C5.bitboard());
        assert_eq!(D4.bitboard().shift(Direction::SouthEast), E3.bitboard());
    }

    #[test]
    fn pop_first_square_walks_in_order() {
        let mut board = BitBoard::from_iter([H8, C3, A1]);
        assert_eq!(board.pop_first_square(), Some(A1));
        assert_eq!(board.pop_first_square(), Some(C3));
        assert!(board.is_singleton());
        assert_eq!(board.pop_first_square(), Some(H8));
        assert_eq!(board.pop_first_square(), None);
    }

    #[test]
    fn last_square_is_the_highest() {
        assert_eq!(BitBoard::from_iter([B2, G7, C5]).last_square(), Some(G7));
        assert_eq!(H8.bitboard().last_square(), Some(H8));
        assert_eq!(EMPTY.last_square(), None);
        for direction in Direction::ALL {
            let step = D4.bitboard().shift(direction).first_square().unwrap();
            assert_eq!(step > D4, direction.is_ascending());
        }
    }

    #[test]
    fn square_geometry() {
        assert_eq!(E4.file(), 4);
        assert_eq!(E4.rank(), 3);
        assert_eq!(Square::from_file_rank(4, 3), E4);
        assert_eq!("g7".parse::<Square>(), Ok(G7));
        assert!("i1".parse::<Square>().is_err());
        assert_eq!(B6.to_string(), "b6");
    }

    #[test]
    fn square_colours_partition_the_board() {
        assert_eq!(LIGHT_SQUARES | DARK_SQUARES, FULL_BOARD);
        assert!(DARK_SQUARES.contains(A1));
        assert!(LIGHT_SQUARES.contains(H1));
    }
}

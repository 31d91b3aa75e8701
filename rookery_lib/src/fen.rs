use std::fmt::Display;

use rookery_bitboards::*;

use crate::{
    board::{attacks::is_under_attack, Position},
    error::{ChessError, ChessResult},
    types::*,
};

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// The six fields of a FEN string, validated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FenRecord {
    pub position: Position,
    pub side_to_move: Color,
    pub castling: CastlingRights,
    pub en_passant: Option<EnPassantTarget>,
    pub half_move_clock: u32,
    pub full_move_number: u32,
}

impl FenRecord {
    pub fn starting() -> Self {
        Self {
            position: Position::starting(),
            side_to_move: Color::White,
            castling: CastlingRights::ALL,
            en_passant: None,
            half_move_clock: 0,
            full_move_number: 1,
        }
    }
}

impl Display for FenRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", to_fen(self))
    }
}

fn parse_placement(placement: &str) -> ChessResult<Position> {
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(ChessError::invalid_fen(format!(
            "expected 8 ranks, found {}",
            ranks.len()
        )));
    }

    let mut position = Position::new();
    for (i, rank_text) in ranks.iter().enumerate() {
        let rank = 7 - i;
        let mut file = 0;
        for chr in rank_text.chars() {
            if let Some(skip) = chr.to_digit(10) {
                if !(1..=8).contains(&skip) {
                    return Err(ChessError::invalid_fen(format!("bad empty count '{chr}'")));
                }
                file += skip as usize;
            } else {
                let piece = Piece::from_fen_char(chr)
                    .ok_or_else(|| ChessError::invalid_fen(format!("unknown piece '{chr}'")))?;
                if file >= 8 {
                    return Err(ChessError::invalid_fen(format!(
                        "rank {} has more than 8 files",
                        rank + 1
                    )));
                }
                if piece.kind() == Some(PieceKind::Pawn) && matches!(rank, 0 | 7) {
                    return Err(ChessError::invalid_fen("pawn on the first or last rank"));
                }
                position.set_piece(Square::from_file_rank(file, rank), piece);
                file += 1;
            }
            if file > 8 {
                return Err(ChessError::invalid_fen(format!(
                    "rank {} has more than 8 files",
                    rank + 1
                )));
            }
        }
        if file != 8 {
            return Err(ChessError::invalid_fen(format!(
                "rank {} does not describe 8 files",
                rank + 1
            )));
        }
    }
    Ok(position)
}

fn parse_side(side: &str) -> ChessResult<Color> {
    match side {
        "w" => Ok(Color::White),
        "b" => Ok(Color::Black),
        _ => Err(ChessError::invalid_fen(format!("bad side to move '{side}'"))),
    }
}

fn parse_castling(castling: &str, position: &Position) -> ChessResult<CastlingRights> {
    let mut rights = CastlingRights::NONE;
    if castling == "-" {
        return Ok(rights);
    }
    if castling.is_empty() {
        return Err(ChessError::invalid_fen("empty castling field"));
    }

    for chr in castling.chars() {
        let (color, side) = match chr {
            'K' => (Color::White, CastlingSide::Kingside),
            'Q' => (Color::White, CastlingSide::Queenside),
            'k' => (Color::Black, CastlingSide::Kingside),
            'q' => (Color::Black, CastlingSide::Queenside),
            _ => return Err(ChessError::invalid_fen(format!("bad castling flag '{chr}'"))),
        };
        if rights.has(color, side) {
            return Err(ChessError::invalid_fen(format!("repeated castling flag '{chr}'")));
        }
        let path = castling_path(color, side);
        if !position.piece_on(path.king_from).is(color, PieceKind::King)
            || !position.piece_on(path.rook_from).is(color, PieceKind::Rook)
        {
            return Err(ChessError::invalid_fen(format!(
                "castling flag '{chr}' without king and rook on their home squares"
            )));
        }
        rights.insert(color, side);
    }
    Ok(rights)
}

fn parse_en_passant(
    text: &str,
    position: &Position,
    side_to_move: Color,
) -> ChessResult<Option<EnPassantTarget>> {
    if text == "-" {
        return Ok(None);
    }
    let capture_square = Square::from_coord(text)
        .ok_or_else(|| ChessError::invalid_fen(format!("bad en passant square '{text}'")))?;

    // (target rank, pushed pawn rank, origin rank) for the side that pushed
    let (target_rank, pawn_rank, origin_rank) = match side_to_move {
        Color::White => (5, 4, 6),
        Color::Black => (2, 3, 1),
    };
    if capture_square.rank() != target_rank {
        return Err(ChessError::invalid_fen(format!(
            "en passant square {text} is on the wrong rank"
        )));
    }

    let file = capture_square.file();
    let captured_pawn_square = Square::from_file_rank(file, pawn_rank);
    if !position
        .piece_on(captured_pawn_square)
        .is(!side_to_move, PieceKind::Pawn)
        || !position.piece_on(capture_square).is_empty()
        || !position
            .piece_on(Square::from_file_rank(file, origin_rank))
            .is_empty()
    {
        return Err(ChessError::invalid_fen(format!(
            "en passant square {text} does not follow a double pawn push"
        )));
    }

    Ok(Some(EnPassantTarget {
        capture_square,
        captured_pawn_square,
    }))
}

fn parse_number(text: &str, field: &str) -> ChessResult<u32> {
    text.parse::<u32>()
        .map_err(|_| ChessError::invalid_fen(format!("bad {field} '{text}'")))
}

/// Parses and validates a six-field FEN string.
pub fn parse_fen(fen: &str) -> ChessResult<FenRecord> {
    let fields: Vec<&str> = fen.split_whitespace().collect();
    if fields.len() != 6 {
        return Err(ChessError::invalid_fen(format!(
            "expected 6 fields, found {}",
            fields.len()
        )));
    }

    let position = parse_placement(fields[0])?;
    position
        .check_game_ready()
        .map_err(|e| ChessError::invalid_fen(e.to_string()))?;

    let side_to_move = parse_side(fields[1])?;
    let castling = parse_castling(fields[2], &position)?;
    let en_passant = parse_en_passant(fields[3], &position, side_to_move)?;
    let half_move_clock = parse_number(fields[4], "half-move clock")?;
    let full_move_number = parse_number(fields[5], "full-move number")?;
    if full_move_number == 0 {
        return Err(ChessError::invalid_fen("full-move number must be at least 1"));
    }

    let waiting = !side_to_move;
    if let Some(king) = position.king_square(waiting) {
        if is_under_attack(&position, king, side_to_move) {
            return Err(ChessError::invalid_fen(format!(
                "{waiting} is in check but it is {side_to_move}'s move"
            )));
        }
    }

    Ok(FenRecord {
        position,
        side_to_move,
        castling,
        en_passant,
        half_move_clock,
        full_move_number,
    })
}

pub fn placement_fen(position: &Position) -> String {
    let mut placement = String::with_capacity(72);
    for rank in (0..8).rev() {
        let mut empty = 0;
        for file in 0..8 {
            match position.piece_on(Square::from_file_rank(file, rank)).fen_char() {
                None => empty += 1,
                Some(chr) => {
                    if empty > 0 {
                        placement.push_str(&empty.to_string());
                        empty = 0;
                    }
                    placement.push(chr);
                }
            }
        }
        if empty > 0 {
            placement.push_str(&empty.to_string());
        }
        if rank > 0 {
            placement.push('/');
        }
    }
    placement
}

pub fn to_fen(record: &FenRecord) -> String {
    let side = match record.side_to_move {
        Color::White => "w",
        Color::Black => "b",
    };

    let castling: String = record
        .castling
        .iter()
        .map(|(color, side)| {
            let chr = match side {
                CastlingSide::Kingside => 'k',
                CastlingSide::Queenside => 'q',
            };
            match color {
                Color::White => chr.to_ascii_uppercase(),
                Color::Black => chr,
            }
        })
        .collect();
    let castling = if castling.is_empty() {
        String::from("-")
    } else {
        castling
    };

    let en_passant = record
        .en_passant
        .map_or_else(|| String::from("-"), |target| target.capture_square.coord());

    format!(
        "{} {side} {castling} {en_passant} {} {}",
        placement_fen(&record.position),
        record.half_move_clock,
        record.full_move_number
    )
}

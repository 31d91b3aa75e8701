//! Legal move generation.
//!
//! King moves are generated first and tested square by square with the king
//! lifted off the board. In double check nothing else can be legal. Otherwise
//! every other piece is restricted by its pin limitation and, in single
//! check, by the capture-or-block mask of the checker.

use std::fmt::Display;

use rookery_bitboards::*;

use super::{
    attacks::*,
    make_move::{make_move, undo_move},
    Position,
};
use crate::{
    error::ChessResult,
    lookup_tables::*,
    moves::{ClassifiedMove, Move, MoveFlags, MoveMask},
    types::*,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum GameState {
    #[default]
    Default,
    Check,
    DoubleCheck,
    Checkmate,
    Stalemate,
}

impl GameState {
    pub fn is_terminal(self) -> bool {
        matches!(self, GameState::Checkmate | GameState::Stalemate)
    }

    pub fn is_check(self) -> bool {
        matches!(
            self,
            GameState::Check | GameState::DoubleCheck | GameState::Checkmate
        )
    }
}

impl Display for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GameState::Default => "in play",
            GameState::Check => "check",
            GameState::DoubleCheck => "double check",
            GameState::Checkmate => "checkmate",
            GameState::Stalemate => "stalemate",
        };
        write!(f, "{name}")
    }
}

/// Result of one legality pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegalMoveSet {
    pub state: GameState,
    pub moves: Vec<ClassifiedMove>,
    /// Pieces giving check to the side to move.
    pub checkers: BitBoard,
}

impl LegalMoveSet {
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn contains(&self, mv: Move) -> bool {
        self.moves.iter().any(|classified| classified.mv == mv)
    }

    /// Whether any legal move captures en passant.
    pub fn has_en_passant(&self) -> bool {
        self.moves.iter().any(|classified| classified.flags.is_en_passant())
    }
}

pub fn is_in_check(position: &Position, side: Color) -> ChessResult<bool> {
    Ok(is_under_attack(position, position.expect_king(side)?, !side))
}

/// All legal moves for `side`, classified by capture, en passant,
/// promotion and castling.
pub fn legal_moves(
    position: &mut Position,
    side: Color,
    castling: CastlingRights,
    en_passant: Option<EnPassantTarget>,
) -> ChessResult<LegalMoveSet> {
    generate(position, side, castling, en_passant, false)
}

/// As `legal_moves`, additionally flagging every move that gives check.
pub fn classified_legal_moves(
    position: &mut Position,
    side: Color,
    castling: CastlingRights,
    en_passant: Option<EnPassantTarget>,
) -> ChessResult<LegalMoveSet> {
    generate(position, side, castling, en_passant, true)
}

fn generate(
    position: &mut Position,
    side: Color,
    castling: CastlingRights,
    en_passant: Option<EnPassantTarget>,
    flag_checks: bool,
) -> ChessResult<LegalMoveSet> {
    let king = position.expect_king(side)?;
    let opponent = !side;
    let checkers = attackers_of(position, king, opponent);
    let check_count = checkers.count_ones();

    let mut moves = Vec::with_capacity(48);
    push_king_moves(position, king, side, &mut moves);
    if check_count == 0 {
        push_castling_moves(position, side, castling, &mut moves);
    }

    if check_count < 2 {
        let target_mask = match checkers.first_square() {
            None => FULL_BOARD,
            Some(checker) => {
                let is_slider = position
                    .piece_on(checker)
                    .kind()
                    .map_or(false, PieceKind::is_slider);
                if is_slider {
                    checker.bitboard() | lookup_connection(king, checker)
                } else {
                    checker.bitboard()
                }
            }
        };
        let pins = pin_limitations(position, king, opponent);
        push_piece_moves(position, side, target_mask, &pins, &mut moves);
        if let Some(target) = en_passant {
            push_en_passant_moves(position, side, king, target, castling, &mut moves)?;
        }
    }

    if flag_checks {
        flag_checking_moves(position, side, castling, en_passant, &mut moves)?;
    }

    let state = match (moves.is_empty(), check_count) {
        (true, 0) => GameState::Stalemate,
        (true, _) => GameState::Checkmate,
        (false, 0) => GameState::Default,
        (false, 1) => GameState::Check,
        (false, _) => GameState::DoubleCheck,
    };

    Ok(LegalMoveSet {
        state,
        moves,
        checkers,
    })
}

fn push_mask(position: &Position, side: Color, mask: MoveMask, moves: &mut Vec<ClassifiedMove>) {
    let opponent = position.color(!side);
    for mv in mask {
        let mut flags = MoveFlags::QUIET;
        if opponent.contains(mv.to) {
            flags = flags.with(MoveFlags::CAPTURE);
        }
        if mv.promotion.is_some() {
            flags = flags.with(MoveFlags::PROMOTION);
        }
        moves.push(ClassifiedMove { mv, flags });
    }
}

fn push_king_moves(position: &Position, king: Square, side: Color, moves: &mut Vec<ClassifiedMove>) {
    // lifting the king stops it hiding behind itself on a checker's ray
    let empty = position.empty_squares() | king.bitboard();
    let mut targets = BitBoard::empty();
    for to in lookup_king(king) & position.color(side).inverse() {
        if !is_under_attack_with_empty(position, to, !side, empty) {
            targets |= to.bitboard();
        }
    }
    push_mask(
        position,
        side,
        MoveMask {
            kind: PieceKind::King,
            start: king,
            moves: targets,
        },
        moves,
    );
}

fn push_castling_moves(
    position: &Position,
    side: Color,
    castling: CastlingRights,
    moves: &mut Vec<ClassifiedMove>,
) {
    for castling_side in CastlingSide::ALL {
        if !castling.has(side, castling_side) {
            continue;
        }
        let path = castling_path(side, castling_side);
        if !position.piece_on(path.king_from).is(side, PieceKind::King)
            || !position.piece_on(path.rook_from).is(side, PieceKind::Rook)
        {
            continue;
        }
        let between = lookup_connection(path.king_from, path.rook_from);
        if (between & position.empty_squares()) != between {
            continue;
        }
        if is_under_attack(position, path.passed, !side)
            || is_under_attack(position, path.king_to, !side)
        {
            continue;
        }
        moves.push(ClassifiedMove {
            mv: Move::new(path.king_from, path.king_to),
            flags: MoveFlags::QUIET.with(MoveFlags::CASTLING),
        });
    }
}

fn pawn_pushes(position: &Position, square: Square, side: Color) -> BitBoard {
    let forward = match side {
        Color::White => Direction::North,
        Color::Black => Direction::South,
    };
    let empty = position.empty_squares();
    let single = square.bitboard().shift(forward) & empty;
    if single.is_not_empty() && square.rank() == side.pawn_rank() {
        single | (single.shift(forward) & empty)
    } else {
        single
    }
}

fn push_piece_moves(
    position: &Position,
    side: Color,
    target_mask: BitBoard,
    pins: &PinLimitations,
    moves: &mut Vec<ClassifiedMove>,
) {
    let own = position.color(side);
    let opponent = position.color(!side);
    let occupied = position.occupied();

    for kind in [
        PieceKind::Pawn,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
    ] {
        for square in position.pieces(side, kind) {
            let targets = match kind {
                PieceKind::Pawn => {
                    pawn_pushes(position, square, side) | (pawn_attacks(square, side) & opponent)
                }
                PieceKind::Knight => lookup_knight(square),
                PieceKind::Bishop => lookup_bishop(square, occupied),
                PieceKind::Rook => lookup_rook(square, occupied),
                PieceKind::Queen => lookup_queen(square, occupied),
                PieceKind::King => BitBoard::empty(),
            };
            let targets = targets & own.inverse() & target_mask & pins.allowed(square);
            if targets.is_not_empty() {
                push_mask(
                    position,
                    side,
                    MoveMask {
                        kind,
                        start: square,
                        moves: targets,
                    },
                    moves,
                );
            }
        }
    }
}

/// En passant can expose the king along the rank both pawns leave, so each
/// candidate is tried on the board and kept only if the king is safe.
fn push_en_passant_moves(
    position: &mut Position,
    side: Color,
    king: Square,
    target: EnPassantTarget,
    castling: CastlingRights,
    moves: &mut Vec<ClassifiedMove>,
) -> ChessResult<()> {
    if !position.piece_on(target.capture_square).is_empty()
        || !position
            .piece_on(target.captured_pawn_square)
            .is(!side, PieceKind::Pawn)
    {
        return Ok(());
    }

    let capturers = pawn_attacks(target.capture_square, !side) & position.pieces(side, PieceKind::Pawn);
    for from in capturers {
        let mv = Move::new(from, target.capture_square);
        let record = make_move(position, mv, side, Some(target), castling)?;
        let exposed = is_under_attack(position, king, !side);
        undo_move(position, &record)?;
        if !exposed {
            moves.push(ClassifiedMove {
                mv,
                flags: MoveFlags::QUIET.with(MoveFlags::CAPTURE | MoveFlags::EN_PASSANT),
            });
        }
    }
    Ok(())
}

fn flag_checking_moves(
    position: &mut Position,
    side: Color,
    castling: CastlingRights,
    en_passant: Option<EnPassantTarget>,
    moves: &mut [ClassifiedMove],
) -> ChessResult<()> {
    let Some(enemy_king) = position.king_square(!side) else {
        return Ok(());
    };
    for classified in moves.iter_mut() {
        let record = make_move(position, classified.mv, side, en_passant, castling)?;
        let gives_check = is_under_attack(position, enemy_king, side);
        undo_move(position, &record)?;
        if gives_check {
            classified.flags = classified.flags.with(MoveFlags::GIVES_CHECK);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::parse_fen;
    use rookery_bitboards::Square::*;

    fn generate_from(fen: &str) -> LegalMoveSet {
        let record = parse_fen(fen).unwrap();
        let mut position = record.position;
        classified_legal_moves(
            &mut position,
            record.side_to_move,
            record.castling,
            record.en_passant,
        )
        .unwrap()
    }

    #[test]
    fn twenty_moves_from_the_start() {
        let set = generate_from("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        assert_eq!(set.len(), 20);
        assert_eq!(set.state, GameState::Default);
        assert!(set.contains(Move::new(G1, F3)));
        assert!(set.contains(Move::new(E2, E4)));
    }

    #[test]
    fn double_check_allows_only_king_moves() {
        // knight on f3 and rook on e8 both check the king on e1; the rook on
        // a8 could otherwise capture the checker on e8
        let set = generate_from("R3r2k/8/8/8/8/5n2/8/4K3 w - - 0 1");
        assert_eq!(set.state, GameState::DoubleCheck);
        assert_eq!(set.checkers.count_ones(), 2);
        assert!(set.moves.iter().all(|m| m.mv.from == E1));
        assert!(!set.is_empty());
    }

    #[test]
    fn single_check_requires_capture_or_block() {
        let set = generate_from("4r2k/8/8/8/8/8/3B4/R3K3 w Q - 0 1");
        assert_eq!(set.state, GameState::Check);
        let non_king: Vec<Move> = set
            .moves
            .iter()
            .map(|m| m.mv)
            .filter(|mv| mv.from != E1)
            .collect();
        // only the bishop can interpose on e3; the rook cannot reach the file
        assert_eq!(non_king, vec![Move::new(D2, E3)]);
        // no castling out of check
        assert!(!set.contains(Move::new(E1, C1)));
    }

    #[test]
    fn king_cannot_retreat_along_the_checking_ray() {
        let set = generate_from("4r2k/8/8/8/8/8/8/4K3 w - - 0 1");
        assert!(!set.contains(Move::new(E1, E2)));
        assert!(set.contains(Move::new(E1, D1)));
    }

    #[test]
    fn pinned_pieces_stay_on_the_line() {
        let set = generate_from("4r2k/8/8/8/8/8/4R3/4K3 w - - 0 1");
        let rook_moves: Vec<Move> = set
            .moves
            .iter()
            .map(|m| m.mv)
            .filter(|mv| mv.from == E2)
            .collect();
        assert_eq!(rook_moves.len(), 6);
        assert!(rook_moves.iter().all(|mv| mv.to.file() == 4));
        assert!(rook_moves.contains(&Move::new(E2, E8)));
    }

    #[test]
    fn castling_through_attack_is_illegal() {
        let set = generate_from("5rk1/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        assert!(!set.contains(Move::new(E1, G1)));
        assert!(set.contains(Move::new(E1, C1)));
        let castle = set.moves.iter().find(|m| m.mv == Move::new(E1, C1)).unwrap();
        assert!(castle.flags.is_castling());
    }

    #[test]
    fn castling_needs_empty_path_including_b_file() {
        let set = generate_from("4k3/8/8/8/8/8/8/RN2K2R w KQ - 0 1");
        assert!(!set.contains(Move::new(E1, C1)));
        assert!(set.contains(Move::new(E1, G1)));
    }

    #[test]
    fn en_passant_exposing_the_king_is_dropped() {
        let set = generate_from("8/8/8/KPp4r/8/8/8/4k3 w - c6 0 2");
        assert!(!set.contains(Move::new(B5, C6)));
        assert!(!set.has_en_passant());

        let set = generate_from("8/8/8/1Pp4r/8/K7/8/4k3 w - c6 0 2");
        let ep = set.moves.iter().find(|m| m.mv == Move::new(B5, C6)).unwrap();
        assert!(ep.flags.is_en_passant() && ep.flags.is_capture());
    }

    #[test]
    fn en_passant_can_capture_a_checking_pawn() {
        let set = generate_from("8/8/8/2k5/3Pp3/8/8/4K3 b - d3 0 1");
        assert_eq!(set.state, GameState::Check);
        assert!(set.contains(Move::new(E4, D3)));
    }

    #[test]
    fn promotions_expand_and_flag() {
        let set = generate_from("1n2k3/P7/8/8/8/8/8/4K3 w - - 0 1");
        let promotions: Vec<&ClassifiedMove> =
            set.moves.iter().filter(|m| m.flags.is_promotion()).collect();
        assert_eq!(promotions.len(), 8);
        assert!(promotions
            .iter()
            .filter(|m| m.mv.to == B8)
            .all(|m| m.flags.is_capture()));
    }

    #[test]
    fn checkmate_and_stalemate() {
        let mate = generate_from("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1");
        assert_eq!(mate.state, GameState::Checkmate);
        assert!(mate.is_empty());

        let stalemate = generate_from("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");
        assert_eq!(stalemate.state, GameState::Stalemate);
    }

    #[test]
    fn checking_moves_are_flagged() {
        let set = generate_from("4k3/8/8/8/8/8/8/R3K3 w - - 0 1");
        let check = set.moves.iter().find(|m| m.mv == Move::new(A1, A8)).unwrap();
        assert!(check.flags.gives_check());
        let quiet = set.moves.iter().find(|m| m.mv == Move::new(A1, A2)).unwrap();
        assert!(!quiet.flags.gives_check());
    }
}

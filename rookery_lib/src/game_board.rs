//! The immutable game history.
//!
//! Every `GameBoard` is a snapshot produced by applying one move (or a null
//! move) to its predecessor. Boards are reference counted and share their
//! ancestry, so cloning is cheap and boards can be read from any thread.

use std::{
    collections::{BTreeMap, HashMap},
    fmt::Display,
    sync::Arc,
};

use rookery_bitboards::*;

use crate::{
    board::{
        make_move::make_move,
        movegen::{classified_legal_moves, GameState},
        packed::PackedBoard,
        Position,
    },
    draw::{insufficient_material, DrawType, FIFTY_MOVE_HALF_MOVES, REPETITION_LIMIT},
    error::{ChessResult, InputError, TerminalError},
    fen::{parse_fen, to_fen, FenRecord},
    moves::{Move, MoveFlags},
    scratch::ScratchBoard,
    types::*,
    zobrist::zobrist_key,
};

struct BoardNode {
    position: Position,
    packed: PackedBoard,
    side_to_move: Color,
    castling: CastlingRights,
    en_passant: Option<EnPassantTarget>,
    // `en_passant` if some legal move actually captures there
    usable_en_passant: Option<EnPassantTarget>,
    half_move_clock: u32,
    full_move_number: u32,
    legal_moves: BTreeMap<Move, MoveFlags>,
    state: GameState,
    checkers: BitBoard,
    key: u64,
    repetitions: HashMap<u64, u32>,
    draw: Option<DrawType>,
    last_move: Option<Move>,
    null_move: bool,
    previous: Option<GameBoard>,
}

impl Drop for BoardNode {
    // unlink iteratively so long histories don't recurse on drop
    fn drop(&mut self) {
        let mut previous = self.previous.take();
        while let Some(board) = previous {
            match Arc::try_unwrap(board.0) {
                Ok(mut node) => previous = node.previous.take(),
                Err(_) => break,
            }
        }
    }
}

/// One immutable position in a game, linked to the board it came from.
#[derive(Clone)]
pub struct GameBoard(Arc<BoardNode>);

struct Snapshot {
    position: Position,
    side_to_move: Color,
    castling: CastlingRights,
    en_passant: Option<EnPassantTarget>,
    half_move_clock: u32,
    full_move_number: u32,
}

impl GameBoard {
    pub fn starting() -> ChessResult<Self> {
        Self::from_record(FenRecord::starting())
    }

    pub fn from_fen(fen: &str) -> ChessResult<Self> {
        let board = Self::from_record(parse_fen(fen)?)?;
        tracing::debug!(fen, state = ?board.state(), "board created from FEN");
        Ok(board)
    }

    pub fn from_record(record: FenRecord) -> ChessResult<Self> {
        Self::build(
            Snapshot {
                position: record.position,
                side_to_move: record.side_to_move,
                castling: record.castling,
                en_passant: record.en_passant,
                half_move_clock: record.half_move_clock,
                full_move_number: record.full_move_number,
            },
            None,
            None,
            false,
        )
    }

    fn build(
        snapshot: Snapshot,
        previous: Option<GameBoard>,
        last_move: Option<Move>,
        null_move: bool,
    ) -> ChessResult<Self> {
        let Snapshot {
            position,
            side_to_move,
            castling,
            en_passant,
            half_move_clock,
            full_move_number,
        } = snapshot;
        position.check_game_ready()?;

        let mut scratch = position.clone();
        let set = classified_legal_moves(&mut scratch, side_to_move, castling, en_passant)?;
        let usable_en_passant = en_passant.filter(|_| set.has_en_passant());
        let key = zobrist_key(
            &position,
            castling,
            usable_en_passant.map(|target| target.capture_square.file()),
            side_to_move,
        );

        // nothing before an irreversible move can repeat
        let mut repetitions = match &previous {
            Some(board) if half_move_clock > 0 => board.0.repetitions.clone(),
            _ => HashMap::new(),
        };
        let count = repetitions.entry(key).or_insert(0);
        *count += 1;
        let count = *count;

        let legal_moves = set
            .moves
            .iter()
            .map(|classified| (classified.mv, classified.flags))
            .collect();

        let mut board = GameBoard(Arc::new(BoardNode {
            packed: PackedBoard::from_position(&position),
            position,
            side_to_move,
            castling,
            en_passant,
            usable_en_passant,
            half_move_clock,
            full_move_number,
            legal_moves,
            state: set.state,
            checkers: set.checkers,
            key,
            repetitions,
            draw: None,
            last_move,
            null_move,
            previous,
        }));

        if !set.state.is_terminal() {
            let draw = board.classify_draw(count);
            if let Some(node) = Arc::get_mut(&mut board.0) {
                node.draw = draw;
            }
        }
        Ok(board)
    }

    fn classify_draw(&self, count: u32) -> Option<DrawType> {
        if count >= REPETITION_LIMIT && self.confirmed_repetitions() >= REPETITION_LIMIT {
            return Some(DrawType::ThreefoldRepetition);
        }
        if self.0.half_move_clock >= FIFTY_MOVE_HALF_MOVES {
            return Some(DrawType::FiftyMoveRule);
        }
        insufficient_material(&self.0.position).map(|_| DrawType::InsufficientMaterial)
    }

    /// Boards in the reversible part of the history that are exactly this
    /// position, this board included. Guards the hash count against
    /// collisions.
    fn confirmed_repetitions(&self) -> u32 {
        let mut count = 0;
        for board in self.history() {
            if board.is_same_position(self) {
                count += 1;
            }
            if board.0.half_move_clock == 0 {
                break;
            }
        }
        count
    }

    /// Applies a move from `legal_moves`, returning the resulting board.
    pub fn apply_move(&self, mv: Move) -> ChessResult<GameBoard> {
        self.ensure_playable()?;

        if !self.0.legal_moves.contains_key(&mv) {
            let promotes = mv.promotion.is_none()
                && self
                    .0
                    .legal_moves
                    .contains_key(&Move::promoting(mv.from, mv.to, PieceKind::Queen));
            return Err(if promotes {
                InputError::MissingPromotion(mv).into()
            } else {
                InputError::IllegalMove(mv).into()
            });
        }

        let mut position = self.0.position.clone();
        let record = make_move(
            &mut position,
            mv,
            self.0.side_to_move,
            self.0.en_passant,
            self.0.castling,
        )?;

        let half_move_clock = if record.resets_half_move_clock() {
            0
        } else {
            self.0.half_move_clock + 1
        };
        let board = Self::build(
            Snapshot {
                position,
                side_to_move: !self.0.side_to_move,
                castling: record.castling_after,
                en_passant: record.en_passant_after,
                half_move_clock,
                full_move_number: self.next_full_move_number(),
            },
            Some(self.clone()),
            Some(mv),
            false,
        )?;

        tracing::trace!(%mv, state = ?board.state(), draw = ?board.auto_draw_type(), "move applied");
        Ok(board)
    }

    /// Passes the turn. Not allowed while in check.
    pub fn apply_null_move(&self) -> ChessResult<GameBoard> {
        self.ensure_playable()?;
        if self.0.state.is_check() {
            return Err(InputError::NullMoveInCheck.into());
        }

        let board = Self::build(
            Snapshot {
                position: self.0.position.clone(),
                side_to_move: !self.0.side_to_move,
                castling: self.0.castling,
                en_passant: None,
                half_move_clock: self.0.half_move_clock + 1,
                full_move_number: self.next_full_move_number(),
            },
            Some(self.clone()),
            None,
            true,
        )?;
        tracing::trace!(state = ?board.state(), "null move applied");
        Ok(board)
    }

    fn next_full_move_number(&self) -> u32 {
        match self.0.side_to_move {
            Color::White => self.0.full_move_number,
            Color::Black => self.0.full_move_number + 1,
        }
    }

    fn ensure_playable(&self) -> ChessResult<()> {
        if self.0.state.is_terminal() {
            return Err(TerminalError::GameOver(self.0.state).into());
        }
        if let Some(draw) = self.0.draw {
            return Err(TerminalError::DrawDeclared(draw).into());
        }
        Ok(())
    }

    /// Same pieces, side to move, castling rights and usable en passant
    /// target. History is ignored.
    pub fn is_same_position(&self, other: &GameBoard) -> bool {
        self.0.key == other.0.key
            && self.0.castling == other.0.castling
            && self.0.side_to_move == other.0.side_to_move
            && self.0.usable_en_passant == other.0.usable_en_passant
            && self.0.packed == other.0.packed
    }

    pub fn position(&self) -> &Position {
        &self.0.position
    }

    pub fn piece_on(&self, square: Square) -> Piece {
        self.0.position.piece_on(square)
    }

    pub fn side_to_move(&self) -> Color {
        self.0.side_to_move
    }

    pub fn castling(&self) -> CastlingRights {
        self.0.castling
    }

    pub fn en_passant(&self) -> Option<EnPassantTarget> {
        self.0.en_passant
    }

    pub fn half_move_clock(&self) -> u32 {
        self.0.half_move_clock
    }

    pub fn full_move_number(&self) -> u32 {
        self.0.full_move_number
    }

    pub fn legal_moves(&self) -> &BTreeMap<Move, MoveFlags> {
        &self.0.legal_moves
    }

    pub fn state(&self) -> GameState {
        self.0.state
    }

    pub fn checkers(&self) -> BitBoard {
        self.0.checkers
    }

    pub fn zobrist_key(&self) -> u64 {
        self.0.key
    }

    pub fn packed(&self) -> PackedBoard {
        self.0.packed
    }

    /// Occurrences of this position's key since the last irreversible move.
    pub fn repetition_count(&self) -> u32 {
        self.0.repetitions.get(&self.0.key).copied().unwrap_or(0)
    }

    pub fn auto_draw_type(&self) -> Option<DrawType> {
        self.0.draw
    }

    /// Checkmate, stalemate or an automatic draw.
    pub fn is_finished(&self) -> bool {
        self.0.state.is_terminal() || self.0.draw.is_some()
    }

    pub fn previous(&self) -> Option<&GameBoard> {
        self.0.previous.as_ref()
    }

    /// The move that produced this board; `None` at the root and after a
    /// null move.
    pub fn last_move(&self) -> Option<Move> {
        self.0.last_move
    }

    pub fn is_null_move(&self) -> bool {
        self.0.null_move
    }

    /// This board followed by each ancestor back to the root.
    pub fn history(&self) -> impl Iterator<Item = &GameBoard> {
        std::iter::successors(Some(self), |board| board.previous())
    }

    pub fn ply_count(&self) -> usize {
        self.history().count() - 1
    }

    pub fn fen_record(&self) -> FenRecord {
        FenRecord {
            position: self.0.position.clone(),
            side_to_move: self.0.side_to_move,
            castling: self.0.castling,
            en_passant: self.0.en_passant,
            half_move_clock: self.0.half_move_clock,
            full_move_number: self.0.full_move_number,
        }
    }

    pub fn fen(&self) -> String {
        to_fen(&self.fen_record())
    }

    /// A fresh mutable copy of this position with an empty undo stack.
    pub fn scratch(&self) -> ScratchBoard {
        ScratchBoard::from_validated(
            self.0.position.clone(),
            self.0.side_to_move,
            self.0.castling,
            self.0.en_passant,
            self.0.half_move_clock,
        )
    }
}

impl std::fmt::Debug for GameBoard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameBoard")
            .field("fen", &self.fen())
            .field("state", &self.0.state)
            .field("draw", &self.0.draw)
            .field("last_move", &self.0.last_move)
            .finish()
    }
}

impl Display for GameBoard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.0.position)?;
        write!(f, "{}", self.fen())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rookery_bitboards::Square::*;

    fn play(board: &GameBoard, moves: &[&str]) -> GameBoard {
        moves.iter().fold(board.clone(), |board, text| {
            board.apply_move(text.parse().unwrap()).unwrap()
        })
    }

    #[test]
    fn starting_board() {
        let board = GameBoard::starting().unwrap();
        assert_eq!(board.legal_moves().len(), 20);
        assert_eq!(board.state(), GameState::Default);
        assert!(board.previous().is_none());
        assert_eq!(board.fen(), crate::fen::STARTING_FEN);
        assert_eq!(board.repetition_count(), 1);

        let parsed = GameBoard::from_fen(crate::fen::STARTING_FEN).unwrap();
        assert!(board.is_same_position(&parsed));
    }

    #[test]
    fn history_links_back_to_the_root() {
        let root = GameBoard::starting().unwrap();
        let board = play(&root, &["e2e4", "e7e5", "g1f3"]);
        assert_eq!(board.ply_count(), 3);
        assert_eq!(board.last_move(), Some(Move::new(G1, F3)));
        assert_eq!(board.full_move_number(), 2);
        assert_eq!(board.half_move_clock(), 1);
        let moves: Vec<Option<Move>> = board.history().map(GameBoard::last_move).collect();
        assert_eq!(
            moves,
            vec![
                Some(Move::new(G1, F3)),
                Some(Move::new(E7, E5)),
                Some(Move::new(E2, E4)),
                None
            ]
        );
        // the root is untouched
        assert_eq!(root.fen(), crate::fen::STARTING_FEN);
    }

    #[test]
    fn illegal_and_unpromoted_moves_are_input_errors() {
        let board = GameBoard::starting().unwrap();
        let err = board.apply_move(Move::new(E2, E5)).unwrap_err();
        assert_eq!(err, InputError::IllegalMove(Move::new(E2, E5)).into());

        let board = GameBoard::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let err = board.apply_move(Move::new(A7, A8)).unwrap_err();
        assert_eq!(err, InputError::MissingPromotion(Move::new(A7, A8)).into());
        assert!(board
            .apply_move(Move::promoting(A7, A8, PieceKind::Rook))
            .is_ok());
    }

    #[test]
    fn en_passant_is_only_available_for_one_ply() {
        let board = GameBoard::from_fen("4k3/3p4/8/4P3/8/8/8/4K3 b - - 0 1").unwrap();
        let board = play(&board, &["d7d5"]);
        let ep = Move::new(E5, D6);
        assert!(board.legal_moves()[&ep].is_en_passant());

        let later = play(&board, &["e1d1", "e8d8"]);
        assert!(!later.legal_moves().contains_key(&ep));
        assert!(later.en_passant().is_none());
    }

    #[test]
    fn threefold_repetition_via_two_move_orders() {
        let start = GameBoard::starting().unwrap();
        // knights out and back twice; the second cycle shuffles the order
        let once = play(&start, &["g1f3", "g8f6", "f3g1", "f6g8"]);
        assert_eq!(once.auto_draw_type(), None);
        assert_eq!(once.repetition_count(), 2);

        let almost = play(&once, &["b1c3", "b8c6", "c3b1"]);
        assert_eq!(almost.auto_draw_type(), None);
        let thrice = play(&almost, &["c6b8"]);
        assert_eq!(thrice.repetition_count(), 3);
        assert_eq!(thrice.auto_draw_type(), Some(DrawType::ThreefoldRepetition));
        assert!(thrice.is_same_position(&start));

        let err = thrice.apply_move(Move::new(E2, E4)).unwrap_err();
        assert!(err.is_terminal());
    }

    #[test]
    fn fifty_move_rule() {
        let board = GameBoard::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 99 80").unwrap();
        assert_eq!(board.auto_draw_type(), None);
        let board = play(&board, &["a1a2"]);
        assert_eq!(board.auto_draw_type(), Some(DrawType::FiftyMoveRule));
    }

    #[test]
    fn checkmate_beats_the_fifty_move_rule() {
        let board = GameBoard::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 99 80").unwrap();
        let board = play(&board, &["a1a8"]);
        assert_eq!(board.state(), GameState::Checkmate);
        assert_eq!(board.auto_draw_type(), None);
        let err = board.apply_move(Move::new(G8, H8)).unwrap_err();
        assert_eq!(err, TerminalError::GameOver(GameState::Checkmate).into());
    }

    #[test]
    fn insufficient_material_after_capture() {
        let board = GameBoard::from_fen("4k3/8/8/8/8/8/3r4/3BK3 w - - 0 1").unwrap();
        assert_eq!(board.auto_draw_type(), None);
        let board = play(&board, &["e1d2"]);
        assert_eq!(board.auto_draw_type(), Some(DrawType::InsufficientMaterial));

        let board = GameBoard::from_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();
        assert_eq!(board.auto_draw_type(), None);
    }

    #[test]
    fn null_moves() {
        let board = GameBoard::starting().unwrap().apply_null_move().unwrap();
        assert!(board.is_null_move());
        assert_eq!(board.side_to_move(), Color::Black);
        assert_eq!(board.last_move(), None);

        let check = GameBoard::from_fen("4k3/8/8/8/8/8/8/4K2r w - - 0 1").unwrap();
        let err = check.apply_null_move().unwrap_err();
        assert_eq!(err, InputError::NullMoveInCheck.into());
    }

    #[test]
    fn fen_round_trip_preserves_the_position() {
        for fen in [
            crate::fen::STARTING_FEN,
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        ] {
            let board = GameBoard::from_fen(fen).unwrap();
            let reparsed = GameBoard::from_fen(&board.fen()).unwrap();
            assert!(board.is_same_position(&reparsed), "{fen}");
            assert_eq!(board.fen(), fen);
        }
    }
}

use rookery_bitboards::Square;

use crate::{
    board::{
        make_move::{make_move, undo_move, UndoRecord},
        movegen::{classified_legal_moves, legal_moves, LegalMoveSet},
        Position,
    },
    error::{ChessResult, InternalError},
    fen::FenRecord,
    moves::Move,
    types::*,
    zobrist::zobrist_key,
};

#[derive(Clone, Copy, Debug)]
struct Frame {
    // None for a null move
    record: Option<UndoRecord>,
    castling: CastlingRights,
    en_passant: Option<EnPassantTarget>,
    half_move_clock: u32,
}

/// A private, mutable board for walking move trees with make/undo.
///
/// Moves given to `make_move` are trusted to come from `legal_moves`; only
/// structural violations are detected. Clone it to give an independent
/// branch its own copy.
#[derive(Clone, Debug)]
pub struct ScratchBoard {
    position: Position,
    side_to_move: Color,
    castling: CastlingRights,
    en_passant: Option<EnPassantTarget>,
    half_move_clock: u32,
    undo_stack: Vec<Frame>,
}

impl ScratchBoard {
    pub fn new(
        position: Position,
        side_to_move: Color,
        castling: CastlingRights,
        en_passant: Option<EnPassantTarget>,
        half_move_clock: u32,
    ) -> ChessResult<Self> {
        position.check_game_ready()?;
        Ok(Self::from_validated(
            position,
            side_to_move,
            castling,
            en_passant,
            half_move_clock,
        ))
    }

    pub fn starting() -> Self {
        Self::from_validated(
            Position::starting(),
            Color::White,
            CastlingRights::ALL,
            None,
            0,
        )
    }

    /// For positions that already passed `check_game_ready`.
    pub(crate) fn from_validated(
        position: Position,
        side_to_move: Color,
        castling: CastlingRights,
        en_passant: Option<EnPassantTarget>,
        half_move_clock: u32,
    ) -> Self {
        Self {
            position,
            side_to_move,
            castling,
            en_passant,
            half_move_clock,
            undo_stack: Vec::with_capacity(32),
        }
    }

    pub fn from_fen_record(record: &FenRecord) -> ChessResult<Self> {
        Self::new(
            record.position.clone(),
            record.side_to_move,
            record.castling,
            record.en_passant,
            record.half_move_clock,
        )
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn castling(&self) -> CastlingRights {
        self.castling
    }

    pub fn en_passant(&self) -> Option<EnPassantTarget> {
        self.en_passant
    }

    pub fn half_move_clock(&self) -> u32 {
        self.half_move_clock
    }

    /// Number of moves that can currently be undone.
    pub fn depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn legal_moves(&mut self) -> ChessResult<LegalMoveSet> {
        legal_moves(
            &mut self.position,
            self.side_to_move,
            self.castling,
            self.en_passant,
        )
    }

    pub fn classified_legal_moves(&mut self) -> ChessResult<LegalMoveSet> {
        classified_legal_moves(
            &mut self.position,
            self.side_to_move,
            self.castling,
            self.en_passant,
        )
    }

    pub fn make_move(&mut self, mv: Move) -> ChessResult<UndoRecord> {
        let record = make_move(
            &mut self.position,
            mv,
            self.side_to_move,
            self.en_passant,
            self.castling,
        )?;
        self.undo_stack.push(Frame {
            record: Some(record),
            castling: self.castling,
            en_passant: self.en_passant,
            half_move_clock: self.half_move_clock,
        });

        self.castling = record.castling_after;
        self.en_passant = record.en_passant_after;
        self.half_move_clock = if record.resets_half_move_clock() {
            0
        } else {
            self.half_move_clock + 1
        };
        self.side_to_move = !self.side_to_move;
        Ok(record)
    }

    /// Passes the turn. Legality (not in check) is the caller's concern.
    pub fn make_null_move(&mut self) {
        self.undo_stack.push(Frame {
            record: None,
            castling: self.castling,
            en_passant: self.en_passant,
            half_move_clock: self.half_move_clock,
        });
        self.en_passant = None;
        self.half_move_clock += 1;
        self.side_to_move = !self.side_to_move;
    }

    pub fn undo_move(&mut self) -> ChessResult<()> {
        let frame = self.undo_stack.pop().ok_or(InternalError::EmptyUndoStack)?;
        if let Some(record) = frame.record {
            undo_move(&mut self.position, &record)?;
        }
        self.castling = frame.castling;
        self.en_passant = frame.en_passant;
        self.half_move_clock = frame.half_move_clock;
        self.side_to_move = !self.side_to_move;
        Ok(())
    }

    /// Zobrist key, counting the en passant file only when a legal move
    /// can use it.
    pub fn zobrist_key(&mut self) -> ChessResult<u64> {
        let usable = match self.en_passant {
            Some(_) => self.legal_moves()?.has_en_passant(),
            None => false,
        };
        let file = self
            .en_passant
            .filter(|_| usable)
            .map(|target| target.capture_square.file());
        Ok(zobrist_key(
            &self.position,
            self.castling,
            file,
            self.side_to_move,
        ))
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.position.king_square(color)
    }
}

//! Error types for the rules core.
//!
//! Every failure is one of three classes: bad caller input, a broken
//! internal invariant (an engine defect), or a request that the game's
//! terminal state forbids.

use rookery_bitboards::{ParseSquareError, Square};
use thiserror::Error;

use crate::{board::movegen::GameState, draw::DrawType, moves::Move, types::Color};

/// Rejected caller input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("invalid FEN: {reason}")]
    InvalidFen { reason: String },

    #[error("invalid square '{0}'")]
    InvalidSquare(String),

    #[error("invalid move text '{0}'")]
    InvalidMoveText(String),

    #[error("move {0} is not legal in this position")]
    IllegalMove(Move),

    #[error("move {0} reaches the last rank but names no promotion piece")]
    MissingPromotion(Move),

    #[error("move {0} names a promotion piece but is not a promotion")]
    UnexpectedPromotion(Move),

    #[error("a null move cannot be played while in check")]
    NullMoveInCheck,
}

/// A defect in the engine itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InternalError {
    #[error("piece array and bitboards disagree on {0}")]
    PieceArrayMismatch(Square),

    #[error("square {0} is set in more than one piece bitboard")]
    DoubleOccupied(Square),

    #[error("{0} side bitboard is not the union of its piece bitboards")]
    SideUnionMismatch(Color),

    #[error("empty-square bitboard does not complement the occupied squares")]
    EmptySquaresMismatch,

    #[error("{0} has no king")]
    MissingKing(Color),

    #[error("{0} has more than one king")]
    DuplicateKing(Color),

    #[error("no piece on source square {0}")]
    EmptySource(Square),

    #[error("piece on {0} does not belong to the side to move")]
    WrongSideToMove(Square),

    #[error("move to {0} would capture a piece of the mover's own side")]
    SameSideCapture(Square),

    #[error("undo requested with an empty undo stack")]
    EmptyUndoStack,
}

/// The game has already finished.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TerminalError {
    #[error("game is over ({0:?})")]
    GameOver(GameState),

    #[error("game was drawn by {0}")]
    DrawDeclared(DrawType),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChessError {
    #[error("invalid input: {0}")]
    Input(#[from] InputError),

    #[error("internal consistency failure: {0}")]
    Internal(#[from] InternalError),

    #[error("terminal state: {0}")]
    Terminal(#[from] TerminalError),
}

impl From<ParseSquareError> for ChessError {
    fn from(err: ParseSquareError) -> Self {
        ChessError::Input(InputError::InvalidSquare(err.0))
    }
}

impl ChessError {
    pub fn is_input(&self) -> bool {
        matches!(self, ChessError::Input(_))
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, ChessError::Internal(_))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ChessError::Terminal(_))
    }

    pub(crate) fn invalid_fen(reason: impl Into<String>) -> Self {
        ChessError::Input(InputError::InvalidFen {
            reason: reason.into(),
        })
    }
}

pub type ChessResult<T> = Result<T, ChessError>;

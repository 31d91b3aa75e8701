//! Chess rules core: bitboard position, legal move generation, make/undo,
//! Zobrist identity, draw detection, an immutable game history and perft.

pub mod agent;
pub mod board;
pub mod draw;
pub mod error;
pub mod fen;
pub mod game_board;
pub mod lookup_tables;
pub mod moves;
pub mod options;
pub mod perft;
pub mod scratch;
pub mod types;
pub mod zobrist;

pub use board::{movegen::GameState, Position};
pub use error::{ChessError, ChessResult};
pub use game_board::GameBoard;
pub use moves::{Move, MoveFlags};
pub use rookery_bitboards::{BitBoard, Square};

use rand::prelude::*;

use crate::{
    error::{ChessResult, InputError},
    game_board::GameBoard,
    moves::Move,
    types::Color,
};

/// What an agent wants to do on its turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgentChoice {
    Move(Move),
    NullMove,
}

/// Anything that picks moves: a search, a UI, a script.
pub trait Agent {
    /// Picks a key of `board.legal_moves()`, or a null move when not in
    /// check. Only called on boards that are not finished.
    fn choose(&mut self, board: &GameBoard) -> ChessResult<AgentChoice>;

    fn name(&self) -> &str {
        "agent"
    }
}

/// Plays uniformly random legal moves.
pub struct RandomAgent {
    rng: StdRng,
}

impl RandomAgent {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Agent for RandomAgent {
    fn choose(&mut self, board: &GameBoard) -> ChessResult<AgentChoice> {
        let moves: Vec<Move> = board.legal_moves().keys().copied().collect();
        match moves.choose(&mut self.rng) {
            Some(&mv) => Ok(AgentChoice::Move(mv)),
            // only reachable on a terminal board
            None => Ok(AgentChoice::NullMove),
        }
    }

    fn name(&self) -> &str {
        "random"
    }
}

/// Alternates `white` and `black` from `board` until the game is finished or
/// `max_plies` moves have been played, returning the last board.
pub fn play_game(
    board: GameBoard,
    white: &mut dyn Agent,
    black: &mut dyn Agent,
    max_plies: usize,
) -> ChessResult<GameBoard> {
    let mut board = board;
    for _ in 0..max_plies {
        if board.is_finished() {
            break;
        }
        let agent: &mut dyn Agent = match board.side_to_move() {
            Color::White => &mut *white,
            Color::Black => &mut *black,
        };

        board = match agent.choose(&board)? {
            AgentChoice::Move(mv) => {
                if !board.legal_moves().contains_key(&mv) {
                    tracing::warn!(agent = agent.name(), %mv, fen = %board.fen(), "agent chose an illegal move");
                    return Err(InputError::IllegalMove(mv).into());
                }
                board.apply_move(mv)?
            }
            AgentChoice::NullMove => board.apply_null_move()?,
        };
    }

    tracing::debug!(
        plies = board.ply_count(),
        state = %board.state(),
        draw = ?board.auto_draw_type(),
        "game stopped"
    );
    Ok(board)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{board::movegen::GameState, error::ChessError};
    use rookery_bitboards::Square::*;

    struct Scripted(Vec<AgentChoice>);

    impl Agent for Scripted {
        fn choose(&mut self, _board: &GameBoard) -> ChessResult<AgentChoice> {
            Ok(self.0.remove(0))
        }
    }

    #[test]
    fn random_games_are_reproducible_and_stay_legal() {
        let play = |seed| {
            play_game(
                GameBoard::starting().unwrap(),
                &mut RandomAgent::new(seed),
                &mut RandomAgent::new(seed + 1),
                120,
            )
            .unwrap()
        };
        let first = play(7);
        let second = play(7);
        assert_eq!(first.fen(), second.fen());
        assert!(first.ply_count() <= 120);
        assert!(first.ply_count() == 120 || first.is_finished());
    }

    #[test]
    fn scripted_fools_mate() {
        let mut white = Scripted(vec![
            AgentChoice::Move(Move::new(F2, F3)),
            AgentChoice::Move(Move::new(G2, G4)),
        ]);
        let mut black = Scripted(vec![
            AgentChoice::Move(Move::new(E7, E5)),
            AgentChoice::Move(Move::new(D8, H4)),
        ]);
        let board = play_game(GameBoard::starting().unwrap(), &mut white, &mut black, 10).unwrap();
        assert_eq!(board.state(), GameState::Checkmate);
        assert_eq!(board.side_to_move(), Color::White);
    }

    #[test]
    fn illegal_choices_are_rejected() {
        let mut white = Scripted(vec![AgentChoice::Move(Move::new(E2, E5))]);
        let mut black = Scripted(vec![]);
        let err = play_game(GameBoard::starting().unwrap(), &mut white, &mut black, 10).unwrap_err();
        assert!(matches!(err, ChessError::Input(InputError::IllegalMove(_))));
    }
}

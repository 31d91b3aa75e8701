use std::{collections::BTreeMap, time::Instant};

use rayon::prelude::*;

use crate::{
    board::movegen::{GameState, LegalMoveSet},
    error::ChessResult,
    game_board::GameBoard,
    moves::{ClassifiedMove, Move, MoveFlags},
    options::PerftOptions,
    scratch::ScratchBoard,
};

/// Leaf statistics of a perft walk. `checks`, `checkmates` and `divide` are
/// only present when requested.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PerftResult {
    pub nodes: u64,
    pub captures: u64,
    pub en_passant: u64,
    pub castles: u64,
    pub promotions: u64,
    pub checks: Option<u64>,
    pub checkmates: Option<u64>,
    pub divide: Option<BTreeMap<Move, u64>>,
}

impl PerftResult {
    fn empty(options: &PerftOptions) -> Self {
        Self {
            checks: options.count_checks.then_some(0),
            checkmates: options.count_checkmates.then_some(0),
            ..Default::default()
        }
    }

    #[inline]
    fn count_leaf(&mut self, flags: MoveFlags) {
        self.nodes += 1;
        self.captures += flags.is_capture() as u64;
        self.en_passant += flags.is_en_passant() as u64;
        self.castles += flags.is_castling() as u64;
        self.promotions += flags.is_promotion() as u64;
    }

    fn merge(&mut self, other: &PerftResult) {
        self.nodes += other.nodes;
        self.captures += other.captures;
        self.en_passant += other.en_passant;
        self.castles += other.castles;
        self.promotions += other.promotions;
        if let (Some(checks), Some(other)) = (self.checks.as_mut(), other.checks) {
            *checks += other;
        }
        if let (Some(mates), Some(other)) = (self.checkmates.as_mut(), other.checkmates) {
            *mates += other;
        }
    }
}

/// Moves at `depth`, with check flags when the leaves below need them.
fn moves_at(
    scratch: &mut ScratchBoard,
    depth: usize,
    options: &PerftOptions,
) -> ChessResult<LegalMoveSet> {
    if depth == 1 && options.inspects_leaves() {
        scratch.classified_legal_moves()
    } else {
        scratch.legal_moves()
    }
}

fn walk(scratch: &mut ScratchBoard, depth: usize, options: &PerftOptions) -> ChessResult<PerftResult> {
    let mut result = PerftResult::empty(options);
    if depth == 0 {
        result.nodes = 1;
        return Ok(result);
    }

    let set = moves_at(scratch, depth, options)?;
    for classified in &set.moves {
        let child = subtree(scratch, classified, depth, options)?;
        result.merge(&child);
    }
    Ok(result)
}

/// Counts the tree below `classified`, which is played at `depth`.
fn subtree(
    scratch: &mut ScratchBoard,
    classified: &ClassifiedMove,
    depth: usize,
    options: &PerftOptions,
) -> ChessResult<PerftResult> {
    if depth == 1 {
        return leaf(scratch, classified, options);
    }
    scratch.make_move(classified.mv)?;
    let result = walk(scratch, depth - 1, options)?;
    scratch.undo_move()?;
    Ok(result)
}

/// A leaf is counted from its flags; only a checking move is played out, and
/// only when checkmates are wanted.
fn leaf(
    scratch: &mut ScratchBoard,
    classified: &ClassifiedMove,
    options: &PerftOptions,
) -> ChessResult<PerftResult> {
    let mut result = PerftResult::empty(options);
    result.count_leaf(classified.flags);
    if let Some(checks) = result.checks.as_mut() {
        *checks += classified.flags.gives_check() as u64;
    }
    if options.count_checkmates && classified.flags.gives_check() {
        scratch.make_move(classified.mv)?;
        let state = scratch.legal_moves()?.state;
        scratch.undo_move()?;
        if let Some(mates) = result.checkmates.as_mut() {
            *mates += (state == GameState::Checkmate) as u64;
        }
    }
    Ok(result)
}

/// Walks every legal line from `board` to `options.depth` plies.
///
/// With `options.parallel` the root moves are spread over the rayon pool,
/// each on its own clone of the scratch board; everything below the root is
/// sequential.
pub fn perft(board: &GameBoard, options: &PerftOptions) -> ChessResult<PerftResult> {
    let start = Instant::now();
    let mut scratch = board.scratch();

    let result = if options.depth == 0 {
        walk(&mut scratch, 0, options)?
    } else {
        let set = moves_at(&mut scratch, options.depth, options)?;
        let per_move: Vec<(Move, PerftResult)> = if options.parallel {
            set.moves
                .par_iter()
                .map(|classified| {
                    let mut scratch = scratch.clone();
                    let result = subtree(&mut scratch, classified, options.depth, options)?;
                    Ok((classified.mv, result))
                })
                .collect::<ChessResult<_>>()?
        } else {
            set.moves
                .iter()
                .map(|classified| {
                    let result = subtree(&mut scratch, classified, options.depth, options)?;
                    Ok((classified.mv, result))
                })
                .collect::<ChessResult<_>>()?
        };

        let mut result = PerftResult::empty(options);
        let mut divide = BTreeMap::new();
        for (mv, child) in &per_move {
            tracing::debug!(%mv, nodes = child.nodes, "divide");
            result.merge(child);
            divide.insert(*mv, child.nodes);
        }
        if options.divide {
            result.divide = Some(divide);
        }
        result
    };

    let elapsed = start.elapsed();
    tracing::info!(
        depth = options.depth,
        nodes = result.nodes,
        elapsed_ms = elapsed.as_millis() as u64,
        nps = (result.nodes as f64 / elapsed.as_secs_f64().max(1e-9)) as u64,
        "perft complete"
    );
    Ok(result)
}

/// Node count only, sequential.
pub fn perft_nodes(board: &GameBoard, depth: usize) -> ChessResult<u64> {
    Ok(perft(board, &PerftOptions::new(depth))?.nodes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shallow_start_position_counts() {
        let board = GameBoard::starting().unwrap();
        assert_eq!(perft_nodes(&board, 0).unwrap(), 1);
        assert_eq!(perft_nodes(&board, 1).unwrap(), 20);
        assert_eq!(perft_nodes(&board, 2).unwrap(), 400);
        assert_eq!(perft_nodes(&board, 3).unwrap(), 8902);
    }

    #[test]
    fn parallel_matches_sequential() {
        let board = GameBoard::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .unwrap();
        let options = PerftOptions::new(3).count_checks(true).count_checkmates(true);
        let sequential = perft(&board, &options).unwrap();
        let parallel = perft(&board, &options.parallel(true)).unwrap();
        assert_eq!(sequential, parallel);
        assert_eq!(sequential.nodes, 97862);
        assert_eq!(sequential.captures, 17102);
        assert_eq!(sequential.en_passant, 45);
        assert_eq!(sequential.castles, 3162);
        assert_eq!(sequential.promotions, 0);
        assert_eq!(sequential.checks, Some(993));
        assert_eq!(sequential.checkmates, Some(1));
    }

    #[test]
    fn leaf_checks_come_from_move_flags() {
        let board = GameBoard::from_fen(
            "rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq g3 0 2",
        )
        .unwrap();
        let plain = perft(&board, &PerftOptions::new(1)).unwrap();
        let options = PerftOptions::new(1).count_checks(true).count_checkmates(true);
        for options in [options, options.parallel(true)] {
            let result = perft(&board, &options).unwrap();
            assert_eq!(result.nodes, plain.nodes);
            assert_eq!(result.checks, Some(1));
            assert_eq!(result.checkmates, Some(1));
        }

        let kiwipete = GameBoard::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .unwrap();
        let result = perft(&kiwipete, &PerftOptions::new(1).count_checks(true)).unwrap();
        assert_eq!(result.nodes, 48);
        assert_eq!(result.captures, 8);
        assert_eq!(result.castles, 2);
        assert_eq!(result.checks, Some(0));
        assert_eq!(result.checkmates, None);
    }

    #[test]
    fn divide_sums_to_the_total() {
        let board = GameBoard::starting().unwrap();
        let result = perft(&board, &PerftOptions::new(2).divide(true)).unwrap();
        let divide = result.divide.unwrap();
        assert_eq!(divide.len(), 20);
        assert!(divide.values().all(|&nodes| nodes == 20));
        assert_eq!(divide.values().sum::<u64>(), result.nodes);
    }

    #[test]
    fn checks_and_mates_at_depth_four() {
        let board = GameBoard::starting().unwrap();
        let options = PerftOptions::new(4).count_checks(true).count_checkmates(true);
        let result = perft(&board, &options).unwrap();
        assert_eq!(result.nodes, 197281);
        assert_eq!(result.captures, 1576);
        assert_eq!(result.checks, Some(469));
        assert_eq!(result.checkmates, Some(8));
    }
}

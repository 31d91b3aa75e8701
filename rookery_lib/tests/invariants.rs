//! Properties that must hold for every legal move of every node of a
//! shallow tree: make/undo restores the board exactly, no legal move leaves
//! the mover in check, and in double check only the king moves.

use rookery_lib::{
    board::{
        attacks::attackers_of,
        make_move::{make_move, undo_move},
        movegen::legal_moves,
    },
    fen::{parse_fen, STARTING_FEN},
    scratch::ScratchBoard,
    GameBoard, Move, Square,
};

const POSITIONS: [&str; 6] = [
    STARTING_FEN,
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
    // double check from knight and bishop
    "4k3/8/8/8/1b6/5n2/8/R3K2R w KQ - 0 1",
];

/// Visits every node to `depth`, checking each legal move in isolation on
/// the raw position before descending through the scratch board.
fn check_tree(scratch: &mut ScratchBoard, depth: usize, visited: &mut u64) {
    let side = scratch.side_to_move();
    let castling = scratch.castling();
    let en_passant = scratch.en_passant();
    let mut position = scratch.position().clone();
    let set = legal_moves(&mut position, side, castling, en_passant).unwrap();
    let king = position.king_square(side).unwrap();

    if set.checkers.count_ones() > 1 {
        assert!(
            set.moves.iter().all(|classified| classified.mv.from == king),
            "non-king move in double check"
        );
    }

    for classified in &set.moves {
        *visited += 1;
        let before = position.clone();
        let record = make_move(&mut position, classified.mv, side, en_passant, castling).unwrap();

        let own_king = position.king_square(side).unwrap();
        assert!(
            attackers_of(&position, own_king, !side).is_empty(),
            "{} leaves the king attacked",
            classified.mv
        );

        undo_move(&mut position, &record).unwrap();
        assert_eq!(position, before, "undo of {} is not exact", classified.mv);
        assert!(position.check_consistency().is_ok());

        if depth > 1 {
            scratch.make_move(classified.mv).unwrap();
            check_tree(scratch, depth - 1, visited);
            scratch.undo_move().unwrap();
        }
    }
}

#[test]
fn make_undo_round_trip_and_king_safety() {
    for fen in POSITIONS {
        let record = parse_fen(fen).unwrap();
        let mut scratch = ScratchBoard::from_fen_record(&record).unwrap();
        let mut visited = 0;
        check_tree(&mut scratch, 3, &mut visited);
        assert!(visited > 0, "{fen}");
        assert_eq!(scratch.position(), &record.position);
        assert_eq!(scratch.depth(), 0);
    }
}

#[test]
fn double_check_position_really_is_double_check() {
    let board = GameBoard::from_fen(POSITIONS[5]).unwrap();
    assert_eq!(board.checkers().count_ones(), 2);
    assert!(board.legal_moves().keys().all(|mv| mv.from == Square::E1));
    assert!(!board.legal_moves().is_empty());
}

#[test]
fn en_passant_target_lasts_one_ply() {
    let board = GameBoard::from_fen("4k3/8/8/8/3p4/8/4P3/4K3 w - - 0 1").unwrap();
    let pushed = board.apply_move("e2e4".parse().unwrap()).unwrap();
    assert!(pushed.legal_moves().contains_key(&"d4e3".parse::<Move>().unwrap()));

    let waited = pushed
        .apply_move("e8d8".parse().unwrap())
        .unwrap()
        .apply_move("e1d1".parse().unwrap())
        .unwrap();
    assert!(!waited.legal_moves().contains_key(&"d4e3".parse::<Move>().unwrap()));
}

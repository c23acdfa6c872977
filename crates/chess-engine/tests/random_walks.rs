//! Properties checked along random legal move sequences.

use chess_engine::{MoveClasses, Position};
use proptest::prelude::*;

const STARTS: [&str; 4] = [
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
];

/// Plays one legal move per choice, stopping early when the game ends.
/// Returns the snapshots taken before each move.
fn walk(position: &mut Position, choices: &[usize]) -> Vec<(String, u64, u32)> {
    let mut snapshots = Vec::new();
    for &choice in choices {
        let moves = position.legal_moves();
        if moves.is_empty() {
            break;
        }
        let hash = position.zobrist_hash();
        snapshots.push((position.to_fen(), hash, position.transposition_count(hash)));
        position.push(moves[choice % moves.len()]);
    }
    snapshots
}

fn start_and_choices() -> impl Strategy<Value = (usize, Vec<usize>)> {
    (0..STARTS.len(), prop::collection::vec(any::<usize>(), 0..40))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn pop_undoes_push((start, choices) in start_and_choices()) {
        let mut position = Position::from_fen(STARTS[start]).unwrap();
        let original = position.clone();
        let snapshots = walk(&mut position, &choices);
        prop_assert_eq!(position.ply(), snapshots.len());

        for (fen, hash, count) in snapshots.into_iter().rev() {
            prop_assert!(position.pop().is_some());
            prop_assert_eq!(position.to_fen(), fen);
            prop_assert_eq!(position.zobrist_hash(), hash);
            prop_assert_eq!(position.transposition_count(hash), count);
        }
        prop_assert_eq!(position.pop(), None);
        prop_assert_eq!(position, original);
    }

    #[test]
    fn incremental_state_matches_fresh_load((start, choices) in start_and_choices()) {
        let mut position = Position::from_fen(STARTS[start]).unwrap();
        walk(&mut position, &choices);

        let fen = position.to_fen();
        let reloaded = Position::from_fen(&fen).unwrap();
        prop_assert_eq!(reloaded.to_fen(), fen);
        prop_assert_eq!(reloaded.board_hash(), position.board_hash());
        prop_assert_eq!(reloaded.zobrist_hash(), position.zobrist_hash());
        prop_assert_eq!(reloaded.occupancy(), position.occupancy());
        prop_assert!(position.status().is_valid());
    }

    #[test]
    fn count_matches_generation((start, choices) in start_and_choices()) {
        let mut position = Position::from_fen(STARTS[start]).unwrap();
        walk(&mut position, &choices);

        let classes = [
            MoveClasses::ALL,
            MoveClasses::PAWNS,
            MoveClasses::CASTLING | MoveClasses::KING,
            MoveClasses::KNIGHTS | MoveClasses::BISHOPS,
        ];
        for classes in classes {
            let moves = position.pseudo_legal_moves(classes);
            prop_assert_eq!(position.pseudo_legal_move_count(classes), moves.len());
            for &m in moves.as_slice() {
                prop_assert!(position.is_pseudo_legal(m), "{} should be pseudo-legal", m);
            }
        }

        let legal = position.legal_moves();
        for &m in legal.as_slice() {
            prop_assert!(position.is_legal(m));
        }
        prop_assert_eq!(position.has_legal_moves(), !legal.is_empty());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn san_round_trips((start, choices) in start_and_choices()) {
        let mut position = Position::from_fen(STARTS[start]).unwrap();
        walk(&mut position, &choices);

        let fen = position.to_fen();
        let legal = position.legal_moves();
        for &m in legal.as_slice() {
            let san = position.san(m);
            prop_assert_eq!(position.parse_san(&san), Ok(m), "{} in {}", san, fen);
        }
        prop_assert_eq!(position.to_fen(), fen);
    }
}

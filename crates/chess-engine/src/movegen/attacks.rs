//! Attack and pawn push tables for the non-sliding pieces.
//!
//! Every table is built at compile time from a list of (file, rank) steps;
//! a step that would leave the board is dropped.

use crate::Bitboard;
use chess_core::{Color, Square};

pub use super::rotated::{bishop_attacks, queen_attacks, rook_attacks};

const KNIGHT_STEPS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

const KING_STEPS: [(i8, i8); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

const KNIGHT_ATTACKS: [Bitboard; 64] = step_table(&KNIGHT_STEPS);
const KING_ATTACKS: [Bitboard; 64] = step_table(&KING_STEPS);

/// Indexed `[color][square]`.
const PAWN_ATTACKS: [[Bitboard; 64]; 2] = [
    step_table(&[(-1, 1), (1, 1)]),
    step_table(&[(-1, -1), (1, -1)]),
];

const PAWN_PUSHES: [[Bitboard; 64]; 2] = [step_table(&[(0, 1)]), step_table(&[(0, -1)])];

/// Double pushes exist only from the second rank on the mover's side.
const PAWN_DOUBLE_PUSHES: [[Bitboard; 64]; 2] = [
    only_rank(step_table(&[(0, 2)]), 1),
    only_rank(step_table(&[(0, -2)]), 6),
];

/// Returns knight attacks from the given square.
#[inline]
pub fn knight_attacks(sq: Square) -> Bitboard {
    KNIGHT_ATTACKS[sq.index() as usize]
}

/// Returns king attacks from the given square.
#[inline]
pub fn king_attacks(sq: Square) -> Bitboard {
    KING_ATTACKS[sq.index() as usize]
}

/// Returns pawn attacks from the given square for the given color.
#[inline]
pub fn pawn_attacks(sq: Square, color: Color) -> Bitboard {
    PAWN_ATTACKS[color.index()][sq.index() as usize]
}

/// Returns the single push target of a pawn on the given square.
#[inline]
pub fn pawn_pushes(sq: Square, color: Color) -> Bitboard {
    PAWN_PUSHES[color.index()][sq.index() as usize]
}

/// Returns the double push target of a pawn on the given square.
#[inline]
pub fn pawn_double_pushes(sq: Square, color: Color) -> Bitboard {
    PAWN_DOUBLE_PUSHES[color.index()][sq.index() as usize]
}

/// Builds, for every square, the set of squares one step away.
const fn step_table(steps: &[(i8, i8)]) -> [Bitboard; 64] {
    let mut table = [Bitboard::EMPTY; 64];
    let mut sq = 0;
    while sq < 64 {
        let file = (sq % 8) as i8;
        let rank = (sq / 8) as i8;
        let mut bits = 0u64;
        let mut i = 0;
        while i < steps.len() {
            let (df, dr) = steps[i];
            let (f, r) = (file + df, rank + dr);
            if f >= 0 && f < 8 && r >= 0 && r < 8 {
                bits |= 1u64 << (r * 8 + f);
            }
            i += 1;
        }
        table[sq] = Bitboard(bits);
        sq += 1;
    }
    table
}

/// Clears every entry whose origin square is not on `rank`.
const fn only_rank(mut table: [Bitboard; 64], rank: usize) -> [Bitboard; 64] {
    let mut sq = 0;
    while sq < 64 {
        if sq / 8 != rank {
            table[sq] = Bitboard::EMPTY;
        }
        sq += 1;
    }
    table
}

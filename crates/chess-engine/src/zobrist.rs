//! Zobrist hashing keys.
//!
//! The 781 keys are laid out the way Polyglot opening books expect:
//! - `64 * (2 * kind + is_white) + square` for pieces (768 values)
//! - 768..772 for castling rights K, Q, k, q
//! - 772..780 for the en passant file
//! - 780 for White to move
//!
//! The values themselves come from a fixed xorshift sequence, so swapping in
//! the published Polyglot table only means replacing [`ZobristKeys::new`].

use chess_core::{Color, Piece, Square};

const CASTLING_OFFSET: usize = 768;
const EN_PASSANT_OFFSET: usize = 772;
const TURN_OFFSET: usize = 780;

/// Number of keys in the table.
pub const KEY_COUNT: usize = 781;

/// Zobrist hash keys.
pub struct ZobristKeys {
    keys: [u64; KEY_COUNT],
}

impl ZobristKeys {
    /// Fills the table from a xorshift64 generator with a fixed seed.
    pub const fn new() -> Self {
        const fn next_random(state: u64) -> u64 {
            let mut x = state;
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            x
        }

        let mut state = 0x9E37_79B9_7F4A_7C15u64;
        let mut keys = [0u64; KEY_COUNT];
        let mut i = 0;
        while i < KEY_COUNT {
            state = next_random(state);
            keys[i] = state;
            i += 1;
        }

        ZobristKeys { keys }
    }

    /// Returns the key for a piece on a square.
    #[inline]
    pub const fn piece_key(&self, piece: Piece, color: Color, square: Square) -> u64 {
        let is_white = match color {
            Color::White => 1,
            Color::Black => 0,
        };
        self.keys[64 * (2 * piece.index() + is_white) + square.index() as usize]
    }

    /// Returns the key for a castling right (0-3 for K, Q, k, q).
    #[inline]
    pub const fn castling_key(&self, right: usize) -> u64 {
        self.keys[CASTLING_OFFSET + right]
    }

    /// Returns the key for an en passant file (0-7).
    #[inline]
    pub const fn en_passant_key(&self, file: usize) -> u64 {
        self.keys[EN_PASSANT_OFFSET + file]
    }

    /// Returns the key mixed in when White is to move.
    #[inline]
    pub const fn white_to_move(&self) -> u64 {
        self.keys[TURN_OFFSET]
    }
}

impl Default for ZobristKeys {
    fn default() -> Self {
        Self::new()
    }
}

/// Global Zobrist keys (initialized at compile time).
pub static ZOBRIST: ZobristKeys = ZobristKeys::new();

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn zobrist_keys_are_nonzero_and_distinct() {
        let unique: HashSet<u64> = ZOBRIST.keys.iter().copied().collect();
        assert_eq!(unique.len(), KEY_COUNT);
        assert!(!unique.contains(&0));
    }

    #[test]
    fn polyglot_layout() {
        // Black pawn on a1 is the first key, white king on h8 the last piece key.
        assert_eq!(ZOBRIST.piece_key(Piece::Pawn, Color::Black, Square::A1), ZOBRIST.keys[0]);
        assert_eq!(ZOBRIST.piece_key(Piece::Pawn, Color::White, Square::A1), ZOBRIST.keys[64]);
        assert_eq!(
            ZOBRIST.piece_key(Piece::King, Color::White, Square::H8),
            ZOBRIST.keys[767]
        );
        assert_eq!(ZOBRIST.castling_key(3), ZOBRIST.keys[771]);
        assert_eq!(ZOBRIST.en_passant_key(7), ZOBRIST.keys[779]);
        assert_eq!(ZOBRIST.white_to_move(), ZOBRIST.keys[780]);
    }
}

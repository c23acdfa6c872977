//! Chess position engine with bitboard representation.
//!
//! This crate provides:
//! - [`Bitboard`] - 64-bit board representation with efficient operations
//! - [`Occupancy`] - the occupied set under four rotations, for sliding attacks
//! - [`Position`] - Full game state with its move stack and repetition counts
//! - Move generation, legality tests and perft
//! - Draw and game-end detection
//! - FEN, EPD, SAN and UCI notation
//!
//! # Architecture
//!
//! The engine uses bitboards for piece representation - each piece type and
//! each color has a 64-bit integer where each bit represents a square.
//! Sliding attacks are table lookups indexed by one line of a rotated
//! occupancy view. Moves are played with [`Position::push`] and taken back
//! with [`Position::pop`]; legality is decided by playing a candidate and
//! testing whether the mover's king is left attacked.
//!
//! # Example
//!
//! ```
//! use chess_engine::Position;
//!
//! let mut position = Position::new();
//! println!("Legal moves from starting position: {}", position.legal_moves().len());
//!
//! position.push_san("e4").unwrap();
//! position.push_san("e5").unwrap();
//! println!("Position after 1.e4 e5: {}", position.to_fen());
//!
//! assert_eq!(position.pop().map(|m| m.to_uci()), Some("e7e5".to_string()));
//! assert!(!position.is_game_over());
//! ```

mod bitboard;
mod epd;
mod make;
pub mod movegen;
mod occupancy;
mod position;
pub mod rules;
mod san;
mod status;
mod zobrist;

pub use bitboard::Bitboard;
pub use epd::{EpdError, EpdOperand, EpdOperation};
pub use make::MoveError;
pub use movegen::perft::{perft, perft_divide};
pub use movegen::{
    bishop_attacks, king_attacks, knight_attacks, pawn_attacks, queen_attacks, rook_attacks,
    MoveClasses, MoveList, MoveSink,
};
pub use occupancy::{Line, Occupancy};
pub use position::{CastlingRights, Position};
pub use rules::{DrawReason, GameResult};
pub use san::SanError;
pub use status::Status;
pub use zobrist::{ZobristKeys, ZOBRIST};

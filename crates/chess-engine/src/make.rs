//! Making and unmaking moves.
//!
//! Every [`Position::push`] records one [`Undo`] frame holding the state a
//! move cannot be reversed from: the previous halfmove clock, castling
//! rights, en passant target and the captured piece. [`Position::pop`]
//! consumes the frame and restores the position exactly.

use chess_core::{Color, Move, Piece, Square};
use thiserror::Error;
use tracing::debug;

use crate::position::CastlingRights;
use crate::Position;

/// Errors from applying a move given as text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoveError {
    #[error("invalid UCI move: {0}")]
    InvalidUci(String),

    #[error("illegal move in this position: {0}")]
    IllegalMove(String),
}

/// State saved by `push` for the matching `pop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Undo {
    pub mv: Move,
    pub captured: Option<Piece>,
    pub castling: CastlingRights,
    pub en_passant: Option<Square>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
}

/// Castling rights lost when a move starts or ends on each square.
const CASTLING_REVOKED: [u8; 64] = {
    let mut table = [0u8; 64];
    table[Square::A1.index() as usize] = CastlingRights::WHITE_QUEENSIDE;
    table[Square::E1.index() as usize] =
        CastlingRights::WHITE_KINGSIDE | CastlingRights::WHITE_QUEENSIDE;
    table[Square::H1.index() as usize] = CastlingRights::WHITE_KINGSIDE;
    table[Square::A8.index() as usize] = CastlingRights::BLACK_QUEENSIDE;
    table[Square::E8.index() as usize] =
        CastlingRights::BLACK_KINGSIDE | CastlingRights::BLACK_QUEENSIDE;
    table[Square::H8.index() as usize] = CastlingRights::BLACK_KINGSIDE;
    table
};

/// Returns the rook's from and to squares if `from`-`to` is a castling
/// king move.
pub(crate) fn castling_rook(piece: Piece, from: Square, to: Square) -> Option<(Square, Square)> {
    if piece != Piece::King {
        return None;
    }
    match (from, to) {
        (Square::E1, Square::G1) => Some((Square::H1, Square::F1)),
        (Square::E1, Square::C1) => Some((Square::A1, Square::D1)),
        (Square::E8, Square::G8) => Some((Square::H8, Square::F8)),
        (Square::E8, Square::C8) => Some((Square::A8, Square::D8)),
        _ => None,
    }
}

/// Returns the square one rank behind `sq` from `color`'s point of view.
#[inline]
fn behind(sq: Square, color: Color) -> Option<Square> {
    sq.offset(-8 * color.pawn_direction())
}

impl Position {
    /// Plays a move and records it.
    ///
    /// The move must be at least pseudo-legal; this is not checked. The
    /// null move passes the turn.
    pub fn push(&mut self, m: Move) {
        let from = m.from();
        let to = m.to();
        let us = self.side_to_move;

        let captured = if m.is_null() {
            None
        } else {
            self.piece_kind_at(to)
        };
        self.stack.push(Undo {
            mv: m,
            captured,
            castling: self.castling,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
        });

        // Both clocks saturate; a FEN may load them at `u32::MAX`.
        if us == Color::Black {
            self.fullmove_number = self.fullmove_number.saturating_add(1);
        }
        self.en_passant = None;

        if m.is_null() {
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
            self.side_to_move = us.opposite();
            self.count_transposition();
            return;
        }

        let Some((piece, color)) = self.remove_piece_at(from) else {
            // Nothing to move: record a null move so the next pop stays balanced.
            if let Some(frame) = self.stack.last_mut() {
                frame.mv = Move::NULL;
            }
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
            self.side_to_move = us.opposite();
            self.count_transposition();
            return;
        };

        if piece == Piece::Pawn || captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }

        if piece == Piece::Pawn {
            let diff = (to.index() as i8 - from.index() as i8).abs();
            if (diff == 7 || diff == 9) && captured.is_none() {
                if let Some(passed) = behind(to, color) {
                    self.remove_piece_at(passed);
                }
            } else if diff == 16 {
                self.en_passant = behind(to, color);
            }
        }

        self.castling.remove(
            CASTLING_REVOKED[from.index() as usize] | CASTLING_REVOKED[to.index() as usize],
        );

        if let Some((rook_from, rook_to)) = castling_rook(piece, from, to) {
            if let Some((rook, rook_color)) = self.remove_piece_at(rook_from) {
                self.set_piece_at(rook_to, rook, rook_color);
            }
        }

        let placed = m.promotion().unwrap_or(piece);
        self.set_piece_at(to, placed, color);

        self.side_to_move = us.opposite();
        self.count_transposition();
    }

    /// Takes back the last recorded move and returns it.
    ///
    /// Returns `None` when no move is recorded.
    pub fn pop(&mut self) -> Option<Move> {
        if self.stack.is_empty() {
            return None;
        }
        self.uncount_transposition();
        let undo = self.stack.pop()?;

        self.fullmove_number = undo.fullmove_number;
        self.halfmove_clock = undo.halfmove_clock;
        self.castling = undo.castling;
        self.en_passant = undo.en_passant;
        self.side_to_move = self.side_to_move.opposite();

        let m = undo.mv;
        if m.is_null() {
            return Some(m);
        }

        let from = m.from();
        let to = m.to();
        let Some((piece, color)) = self.remove_piece_at(to) else {
            return Some(m);
        };

        let original = if m.promotion().is_some() {
            Piece::Pawn
        } else {
            piece
        };
        self.set_piece_at(from, original, color);

        match undo.captured {
            Some(captured) => self.set_piece_at(to, captured, color.opposite()),
            None => {
                if original == Piece::Pawn && from.file() != to.file() {
                    if let Some(passed) = behind(to, color) {
                        self.set_piece_at(passed, Piece::Pawn, color.opposite());
                    }
                }
            }
        }

        if let Some((rook_from, rook_to)) = castling_rook(original, from, to) {
            if let Some((rook, rook_color)) = self.remove_piece_at(rook_to) {
                self.set_piece_at(rook_from, rook, rook_color);
            }
        }

        Some(m)
    }

    /// Returns the last recorded move without taking it back.
    #[inline]
    pub fn peek(&self) -> Option<Move> {
        self.stack.last().map(|undo| undo.mv)
    }

    /// Returns the number of recorded moves.
    #[inline]
    pub fn ply(&self) -> usize {
        self.stack.len()
    }

    /// Returns the recorded moves, oldest first.
    pub fn move_stack(&self) -> Vec<Move> {
        self.stack.iter().map(|undo| undo.mv).collect()
    }

    /// Parses a UCI move and checks that it is legal here.
    ///
    /// `0000` parses to the null move, which is accepted without a legality
    /// check.
    pub fn parse_uci(&mut self, uci: &str) -> Result<Move, MoveError> {
        let m = Move::from_uci(uci).ok_or_else(|| {
            debug!(uci, "rejected UCI move text");
            MoveError::InvalidUci(uci.to_string())
        })?;
        if m.is_null() || self.is_legal(m) {
            Ok(m)
        } else {
            debug!(uci, fen = %self.to_fen(), "rejected illegal UCI move");
            Err(MoveError::IllegalMove(uci.to_string()))
        }
    }

    /// Parses, validates and plays a UCI move.
    pub fn push_uci(&mut self, uci: &str) -> Result<Move, MoveError> {
        let m = self.parse_uci(uci)?;
        self.push(m);
        Ok(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::FenParser;

    fn play(pos: &mut Position, moves: &[&str]) {
        for uci in moves {
            pos.push_uci(uci).unwrap();
        }
    }

    #[test]
    fn push_pop_restores_start() {
        let mut pos = Position::new();
        let hash = pos.zobrist_hash();
        play(&mut pos, &["e2e4", "e7e5", "g1f3"]);
        assert_eq!(pos.ply(), 3);
        assert_eq!(pos.fullmove_number(), 2);
        assert_eq!(pos.halfmove_clock(), 1);

        while pos.pop().is_some() {}
        assert_eq!(pos.to_fen(), FenParser::STARTPOS);
        assert_eq!(pos.zobrist_hash(), hash);
        assert_eq!(pos.transposition_count(hash), 1);
        assert_eq!(pos.pop(), None);
    }

    #[test]
    fn clocks_saturate_at_the_limit() {
        let mut pos = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 4294967295 1").unwrap();
        pos.push(Move::NULL);
        assert_eq!(pos.halfmove_clock(), u32::MAX);
        play(&mut pos, &["e8d8"]);
        assert_eq!(pos.halfmove_clock(), u32::MAX);
        assert_eq!(pos.fullmove_number(), 2);
        pos.pop();
        pos.pop();
        assert_eq!(pos.to_fen(), "4k3/8/8/8/8/8/8/4K3 w - - 4294967295 1");

        let mut pos = Position::from_fen("4k3/8/8/8/8/8/8/4K3 b - - 0 4294967295").unwrap();
        play(&mut pos, &["e8d8"]);
        assert_eq!(pos.fullmove_number(), u32::MAX);
        assert_eq!(pos.halfmove_clock(), 1);
        pos.pop();
        assert_eq!(pos.to_fen(), "4k3/8/8/8/8/8/8/4K3 b - - 0 4294967295");
    }

    #[test]
    fn double_push_sets_en_passant() {
        let mut pos = Position::new();
        play(&mut pos, &["e2e4"]);
        assert_eq!(pos.en_passant(), Square::from_algebraic("e3"));
        play(&mut pos, &["g8f6"]);
        assert_eq!(pos.en_passant(), None);
    }

    #[test]
    fn en_passant_capture_and_undo() {
        let fen = "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2";
        let mut pos = Position::from_fen(fen).unwrap();
        play(&mut pos, &["e5d6"]);
        assert_eq!(pos.to_fen(), "4k3/8/3P4/8/8/8/8/4K3 b - - 0 2");

        assert_eq!(pos.pop().map(|m| m.to_uci()), Some("e5d6".to_string()));
        assert_eq!(pos.to_fen(), fen);
    }

    #[test]
    fn castling_moves_the_rook() {
        let fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 3 10";
        let mut pos = Position::from_fen(fen).unwrap();
        play(&mut pos, &["e1g1"]);
        assert_eq!(pos.to_fen(), "r3k2r/8/8/8/8/8/8/R4RK1 b kq - 4 10");
        play(&mut pos, &["e8c8"]);
        assert_eq!(pos.to_fen(), "2kr3r/8/8/8/8/8/8/R4RK1 w - - 5 11");

        pos.pop();
        pos.pop();
        assert_eq!(pos.to_fen(), fen);
    }

    #[test]
    fn rook_capture_revokes_both_sides() {
        // Rxa8 takes Black's queenside right and White's own.
        let fen = "r3k3/8/8/8/8/8/8/R3K3 w Qq - 0 1";
        let mut pos = Position::from_fen(fen).unwrap();
        play(&mut pos, &["a1a8"]);
        assert_eq!(pos.castling_rights(), CastlingRights::NONE);
        pos.pop();
        assert_eq!(pos.to_fen(), fen);
    }

    #[test]
    fn promotion_and_undo() {
        let fen = "1n2k3/P7/8/8/8/8/8/4K3 w - - 5 30";
        let mut pos = Position::from_fen(fen).unwrap();
        play(&mut pos, &["a7b8n"]);
        assert_eq!(pos.to_fen(), "1N2k3/8/8/8/8/8/8/4K3 b - - 0 30");
        pos.pop();
        assert_eq!(pos.to_fen(), fen);

        play(&mut pos, &["a7a8q"]);
        assert_eq!(pos.piece_at(Square::A8), Some((Piece::Queen, Color::White)));
        pos.pop();
        assert_eq!(pos.to_fen(), fen);
    }

    #[test]
    fn null_move() {
        let mut pos = Position::new();
        play(&mut pos, &["e2e4"]);
        let before = pos.to_fen();
        pos.push(Move::NULL);
        assert_eq!(pos.side_to_move(), Color::White);
        assert_eq!(pos.en_passant(), None);
        assert_eq!(pos.halfmove_clock(), 1);
        assert_eq!(pos.peek(), Some(Move::NULL));
        assert_eq!(pos.transposition_count(pos.zobrist_hash()), 1);

        assert_eq!(pos.pop(), Some(Move::NULL));
        assert_eq!(pos.to_fen(), before);
    }

    #[test]
    fn move_stack_and_peek() {
        let mut pos = Position::new();
        assert_eq!(pos.peek(), None);
        play(&mut pos, &["d2d4", "d7d5"]);
        let stack: Vec<String> = pos.move_stack().iter().map(|m| m.to_uci()).collect();
        assert_eq!(stack, ["d2d4", "d7d5"]);
        assert_eq!(pos.peek().map(|m| m.to_uci()), Some("d7d5".to_string()));
    }

    #[test]
    fn uci_errors() {
        let mut pos = Position::new();
        assert_eq!(
            pos.push_uci("e2e9"),
            Err(MoveError::InvalidUci("e2e9".to_string()))
        );
        assert_eq!(
            pos.push_uci("e2e5"),
            Err(MoveError::IllegalMove("e2e5".to_string()))
        );
        assert_eq!(pos.ply(), 0);
    }

    #[test]
    fn board_hash_matches_fresh_load() {
        let mut pos = Position::new();
        play(&mut pos, &["e2e4", "d7d5", "e4d5", "g8f6", "f1b5", "c7c6", "d5c6"]);
        let fresh = Position::from_fen(&pos.to_fen()).unwrap();
        assert_eq!(pos.board_hash(), fresh.board_hash());
        assert_eq!(pos.zobrist_hash(), fresh.zobrist_hash());
    }
}

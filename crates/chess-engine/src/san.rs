//! Standard Algebraic Notation (SAN) parsing and generation.
//!
//! SAN is the standard way to record chess moves in human-readable form.
//! Examples: "e4", "Nf3", "Bxc6", "O-O", "e8=Q", "Nbd2", "R1e1"

use chess_core::{Color, Move, Piece, Square};
use thiserror::Error;
use tracing::debug;

use crate::make::castling_rook;
use crate::movegen::MoveClasses;
use crate::{Bitboard, Position};

/// Error type for SAN parsing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SanError {
    /// The text does not follow the SAN grammar.
    #[error("invalid SAN format: {0}")]
    InvalidFormat(String),

    /// No legal move matches the SAN.
    #[error("no legal move matches: {0}")]
    IllegalMove(String),

    /// Multiple legal moves match the SAN.
    #[error("ambiguous move: {0}")]
    AmbiguousMove(String),
}

/// A syntactically valid non-castling SAN token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SanToken {
    piece: Piece,
    from_file: Option<u8>,
    from_rank: Option<u8>,
    to: Square,
    promotion: Option<Piece>,
}

/// Parses `[NBRQK]?[a-h]?[1-8]?x?[a-h][1-8](=?[NBRQnbrq])?`.
///
/// Check and mate markers must already be stripped.
fn parse_token(san: &str) -> Option<SanToken> {
    let bytes = san.as_bytes();
    let mut start = 0;
    let mut end = bytes.len();

    let piece = match bytes.first().copied().and_then(|b| Piece::from_san_char(b as char)) {
        Some(Piece::Pawn) => return None,
        Some(piece) => {
            start = 1;
            piece
        }
        None => Piece::Pawn,
    };

    let mut promotion = None;
    if end > start && bytes[end - 1].is_ascii_alphabetic() {
        let kind = Piece::from_symbol(bytes[end - 1].to_ascii_lowercase() as char)
            .filter(|kind| kind.is_promotion_target())?;
        promotion = Some(kind);
        end -= 1;
        if end > start && bytes[end - 1] == b'=' {
            end -= 1;
        }
    }
    if promotion.is_some() && piece != Piece::Pawn {
        return None;
    }

    if end < start + 2 {
        return None;
    }
    let to = square_from_bytes(bytes[end - 2], bytes[end - 1])?;
    end -= 2;

    let mut rest = &bytes[start..end];
    let mut from_file = None;
    let mut from_rank = None;
    if let Some((&b, tail)) = rest.split_first() {
        if (b'a'..=b'h').contains(&b) {
            from_file = Some(b - b'a');
            rest = tail;
        }
    }
    if let Some((&b, tail)) = rest.split_first() {
        if (b'1'..=b'8').contains(&b) {
            from_rank = Some(b - b'1');
            rest = tail;
        }
    }
    if let Some((&b'x', tail)) = rest.split_first() {
        rest = tail;
    }
    if !rest.is_empty() {
        return None;
    }

    Some(SanToken {
        piece,
        from_file,
        from_rank,
        to,
        promotion,
    })
}

fn square_from_bytes(file: u8, rank: u8) -> Option<Square> {
    if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
        return None;
    }
    Square::from_coords(file - b'a', rank - b'1')
}

/// Returns the king move that castles `color` to the given wing.
fn castling_move(color: Color, kingside: bool) -> Option<Move> {
    let rank = color.back_rank();
    let king_to = if kingside { 6 } else { 2 };
    Some(Move::normal(
        Square::from_coords(4, rank)?,
        Square::from_coords(king_to, rank)?,
    ))
}

impl Position {
    /// Renders a move in SAN.
    ///
    /// The move must be legal in the current position. The position is
    /// left unchanged; the check marker comes from a trial push and pop.
    pub fn san(&mut self, m: Move) -> String {
        if m.is_null() {
            return "--".to_string();
        }

        let from = m.from();
        let to = m.to();
        let Some((piece, us)) = self.piece_at(from) else {
            return m.to_uci();
        };

        let mut san = String::with_capacity(8);
        if let Some((rook_from, _)) = castling_rook(piece, from, to) {
            san.push_str(if rook_from.file_index() == 7 { "O-O" } else { "O-O-O" });
            self.push_check_marker(m, &mut san);
            return san;
        }

        let is_capture = self.piece_at(to).is_some()
            || (piece == Piece::Pawn && from.file_index() != to.file_index());

        if piece == Piece::Pawn {
            if is_capture {
                san.push(from.file().to_char());
            }
        } else {
            san.push(piece.to_san_char());
            self.push_disambiguation(piece, us, m, &mut san);
        }

        if is_capture {
            san.push('x');
        }
        san.push_str(to.name());

        if let Some(promotion) = m.promotion() {
            san.push('=');
            san.push(promotion.to_san_char());
        }

        self.push_check_marker(m, &mut san);
        san
    }

    /// Appends source file and/or rank when other legal pieces of the same
    /// kind could also reach the destination.
    fn push_disambiguation(&mut self, piece: Piece, us: Color, m: Move, san: &mut String) {
        let from = m.from();
        let to = m.to();
        let others = self.attackers(us, to) & self.pieces_of(piece, us) & !Bitboard::from_square(from);

        let mut same_rank = false;
        let mut same_file = false;
        let mut ambiguous = false;
        for other in others {
            if self.is_into_check(Move::normal(other, to)) {
                continue;
            }
            ambiguous = true;
            same_rank |= other.rank_index() == from.rank_index();
            same_file |= other.file_index() == from.file_index();
        }

        if !ambiguous {
            return;
        }
        if same_rank || !same_file {
            san.push(from.file().to_char());
        }
        if same_file {
            san.push(from.rank().to_char());
        }
    }

    fn push_check_marker(&mut self, m: Move, san: &mut String) {
        self.push(m);
        if self.is_check() {
            san.push(if self.has_legal_moves() { '+' } else { '#' });
        }
        self.pop();
    }

    /// Parses a SAN token into a legal move in the current position.
    ///
    /// Trailing `+` and `#` are ignored. `--` is the null move.
    pub fn parse_san(&mut self, san: &str) -> Result<Move, SanError> {
        self.resolve_san(san).map_err(|err| {
            debug!(san, %err, "rejected SAN");
            err
        })
    }

    fn resolve_san(&mut self, san: &str) -> Result<Move, SanError> {
        let token = san.trim().trim_end_matches(['+', '#']);

        if token == "--" {
            return Ok(Move::NULL);
        }

        let kingside = match token {
            "O-O" | "0-0" => Some(true),
            "O-O-O" | "0-0-0" => Some(false),
            _ => None,
        };
        if let Some(kingside) = kingside {
            let us = self.side_to_move;
            if let Some(m) = castling_move(us, kingside) {
                if self.king(us) == Some(m.from()) && self.is_legal(m) {
                    return Ok(m);
                }
            }
            return Err(SanError::IllegalMove(san.to_string()));
        }

        let parsed = parse_token(token).ok_or_else(|| SanError::InvalidFormat(san.to_string()))?;

        let candidates = self.legal_moves_of(MoveClasses::for_piece(parsed.piece));
        let mut matching = candidates.as_slice().iter().filter(|m| {
            m.to() == parsed.to
                && m.promotion() == parsed.promotion
                && parsed.from_file.map_or(true, |f| m.from().file_index() == f)
                && parsed.from_rank.map_or(true, |r| m.from().rank_index() == r)
        });

        match (matching.next(), matching.next()) {
            (Some(&m), None) => Ok(m),
            (Some(_), Some(_)) => Err(SanError::AmbiguousMove(san.to_string())),
            (None, _) => Err(SanError::IllegalMove(san.to_string())),
        }
    }

    /// Parses a SAN token and plays it.
    pub fn push_san(&mut self, san: &str) -> Result<Move, SanError> {
        let m = self.parse_san(san)?;
        self.push(m);
        Ok(m)
    }
}

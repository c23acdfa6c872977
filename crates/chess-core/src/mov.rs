//! Move representation.

use crate::{Piece, Square};
use std::fmt;

/// A chess move: source square, destination square and optional promotion.
///
/// Encoded compactly: 6 bits from, 6 bits to, 3 bits promotion = 15 bits.
/// Castling is expressed as the king's two-square move and en passant as
/// the capturing pawn's diagonal step; the position decides which is which.
///
/// [`Move::NULL`] passes the turn without touching the board.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Move(u16);

impl Move {
    /// The null move (`0000` in UCI, `--` in SAN).
    pub const NULL: Move = Move(0);

    /// Creates a new move.
    #[inline]
    pub const fn new(from: Square, to: Square, promotion: Option<Piece>) -> Self {
        let promo = match promotion {
            Some(Piece::Knight) => 1,
            Some(Piece::Bishop) => 2,
            Some(Piece::Rook) => 3,
            Some(Piece::Queen) => 4,
            _ => 0,
        };
        let encoded = (from.index() as u16) | ((to.index() as u16) << 6) | (promo << 12);
        Move(encoded)
    }

    /// Creates a move without promotion.
    #[inline]
    pub const fn normal(from: Square, to: Square) -> Self {
        Self::new(from, to, None)
    }

    /// Returns the source square.
    #[inline]
    pub const fn from(self) -> Square {
        // SAFETY: masked to 6 bits, always valid square index
        unsafe { Square::from_index_unchecked((self.0 & 0x3F) as u8) }
    }

    /// Returns the destination square.
    #[inline]
    pub const fn to(self) -> Square {
        // SAFETY: masked to 6 bits, always valid square index
        unsafe { Square::from_index_unchecked(((self.0 >> 6) & 0x3F) as u8) }
    }

    /// Returns the promotion piece, if any.
    #[inline]
    pub const fn promotion(self) -> Option<Piece> {
        match self.0 >> 12 {
            1 => Some(Piece::Knight),
            2 => Some(Piece::Bishop),
            3 => Some(Piece::Rook),
            4 => Some(Piece::Queen),
            _ => None,
        }
    }

    /// Returns true if this is the null move.
    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == Self::NULL.0
    }

    /// Returns the UCI notation for this move (e.g., "e2e4", "e7e8q", "0000").
    pub fn to_uci(self) -> String {
        if self.is_null() {
            return "0000".to_string();
        }
        let mut uci = String::with_capacity(5);
        uci.push_str(self.from().name());
        uci.push_str(self.to().name());
        if let Some(piece) = self.promotion() {
            uci.push(piece.symbol());
        }
        uci
    }

    /// Parses a move from UCI notation.
    ///
    /// Only the text is checked here; whether the move can be played is
    /// decided against a position.
    pub fn from_uci(s: &str) -> Option<Self> {
        if s == "0000" {
            return Some(Move::NULL);
        }
        if !s.is_ascii() || s.len() < 4 || s.len() > 5 {
            return None;
        }
        let from = Square::from_algebraic(&s[0..2])?;
        let to = Square::from_algebraic(&s[2..4])?;
        let promotion = match s[4..].chars().next() {
            None => None,
            Some(c) => {
                let piece = Piece::from_symbol(c.to_ascii_lowercase())?;
                if !piece.is_promotion_target() {
                    return None;
                }
                Some(piece)
            }
        };
        let m = Move::new(from, to, promotion);
        // a1a1 collides with the null encoding and is never a real move.
        if m.is_null() {
            return None;
        }
        Some(m)
    }
}

impl Default for Move {
    fn default() -> Self {
        Move::NULL
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Move({})", self.to_uci())
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}

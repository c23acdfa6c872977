//! Structural validity checks for a position.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use chess_core::{Color, Piece, Square};

use crate::position::CastlingRights;
use crate::{Bitboard, Position};

/// Bitmask of problems found in a position.
///
/// Move generation and make/unmake only behave sensibly on a position
/// whose status is [`Status::VALID`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Status(u16);

impl Status {
    pub const VALID: Status = Status(0);
    pub const NO_WHITE_KING: Status = Status(1 << 0);
    pub const NO_BLACK_KING: Status = Status(1 << 1);
    pub const TOO_MANY_KINGS: Status = Status(1 << 2);
    pub const TOO_MANY_WHITE_PAWNS: Status = Status(1 << 3);
    pub const TOO_MANY_BLACK_PAWNS: Status = Status(1 << 4);
    pub const PAWNS_ON_BACKRANK: Status = Status(1 << 5);
    pub const TOO_MANY_WHITE_PIECES: Status = Status(1 << 6);
    pub const TOO_MANY_BLACK_PIECES: Status = Status(1 << 7);
    pub const BAD_CASTLING_RIGHTS: Status = Status(1 << 8);
    pub const INVALID_EP_SQUARE: Status = Status(1 << 9);
    pub const OPPOSITE_CHECK: Status = Status(1 << 10);

    const NAMES: [(Status, &'static str); 11] = [
        (Self::NO_WHITE_KING, "NO_WHITE_KING"),
        (Self::NO_BLACK_KING, "NO_BLACK_KING"),
        (Self::TOO_MANY_KINGS, "TOO_MANY_KINGS"),
        (Self::TOO_MANY_WHITE_PAWNS, "TOO_MANY_WHITE_PAWNS"),
        (Self::TOO_MANY_BLACK_PAWNS, "TOO_MANY_BLACK_PAWNS"),
        (Self::PAWNS_ON_BACKRANK, "PAWNS_ON_BACKRANK"),
        (Self::TOO_MANY_WHITE_PIECES, "TOO_MANY_WHITE_PIECES"),
        (Self::TOO_MANY_BLACK_PIECES, "TOO_MANY_BLACK_PIECES"),
        (Self::BAD_CASTLING_RIGHTS, "BAD_CASTLING_RIGHTS"),
        (Self::INVALID_EP_SQUARE, "INVALID_EP_SQUARE"),
        (Self::OPPOSITE_CHECK, "OPPOSITE_CHECK"),
    ];

    /// Returns true if all flags of `other` are set.
    #[inline]
    pub const fn contains(self, other: Status) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns true if at least one flag of `other` is set.
    #[inline]
    pub const fn intersects(self, other: Status) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns true if no problem was found.
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 == 0
    }

    /// Returns the raw flags.
    #[inline]
    pub const fn bits(self) -> u16 {
        self.0
    }
}

impl BitOr for Status {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Status(self.0 | rhs.0)
    }
}

impl BitOrAssign for Status {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            return write!(f, "Status(VALID)");
        }
        let names: Vec<&str> = Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "Status({})", names.join(" | "))
    }
}

impl Position {
    /// Checks the position for structural problems.
    pub fn status(&self) -> Status {
        let mut status = Status::VALID;
        let kings = self.pieces(Piece::King);
        let pawns = self.pieces(Piece::Pawn);

        if (kings & self.colored(Color::White)).is_empty() {
            status |= Status::NO_WHITE_KING;
        }
        if (kings & self.colored(Color::Black)).is_empty() {
            status |= Status::NO_BLACK_KING;
        }
        if kings.count() > 2 {
            status |= Status::TOO_MANY_KINGS;
        }

        if self.pieces_of(Piece::Pawn, Color::White).count() > 8 {
            status |= Status::TOO_MANY_WHITE_PAWNS;
        }
        if self.pieces_of(Piece::Pawn, Color::Black).count() > 8 {
            status |= Status::TOO_MANY_BLACK_PAWNS;
        }
        if (pawns & Bitboard::BACKRANKS).is_not_empty() {
            status |= Status::PAWNS_ON_BACKRANK;
        }

        if self.colored(Color::White).count() > 16 {
            status |= Status::TOO_MANY_WHITE_PIECES;
        }
        if self.colored(Color::Black).count() > 16 {
            status |= Status::TOO_MANY_BLACK_PIECES;
        }

        if !self.castling_rights_consistent() {
            status |= Status::BAD_CASTLING_RIGHTS;
        }
        if !self.en_passant_consistent() {
            status |= Status::INVALID_EP_SQUARE;
        }

        let king_problems = Status::NO_WHITE_KING | Status::NO_BLACK_KING | Status::TOO_MANY_KINGS;
        if !status.intersects(king_problems) && self.was_into_check() {
            status |= Status::OPPOSITE_CHECK;
        }

        status
    }

    /// Every castling right needs its king and rook on their home squares.
    fn castling_rights_consistent(&self) -> bool {
        let rights = self.castling;
        Color::ALL.into_iter().all(|color| {
            let rank = color.back_rank();
            [(true, 7u8), (false, 0u8)].into_iter().all(|(kingside, rook_file)| {
                if !rights.has(CastlingRights::flag(color, kingside)) {
                    return true;
                }
                let home = |file| Square::from_coords(file, rank).and_then(|sq| self.piece_at(sq));
                home(4) == Some((Piece::King, color)) && home(rook_file) == Some((Piece::Rook, color))
            })
        })
    }

    /// The en passant target must lie behind an enemy pawn that just
    /// double-pushed from an empty square.
    fn en_passant_consistent(&self) -> bool {
        let Some(ep) = self.en_passant else {
            return true;
        };
        let them = self.side_to_move.opposite();
        let expected_rank = match self.side_to_move {
            Color::White => 5,
            Color::Black => 2,
        };
        if ep.rank_index() != expected_rank {
            return false;
        }
        let step = them.pawn_direction() * 8;
        let pawn = ep.offset(step);
        let origin = ep.offset(-step);
        self.piece_at(ep).is_none()
            && origin.is_some_and(|sq| self.piece_at(sq).is_none())
            && pawn.is_some_and(|sq| self.piece_at(sq) == Some((Piece::Pawn, them)))
    }
}

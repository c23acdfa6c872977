//! Chess position representation.

use std::collections::HashMap;
use std::fmt;

use chess_core::{Color, FenError, FenParser, Piece, Square};
use tracing::{debug, trace};

use crate::make::Undo;
use crate::movegen::pawn_attacks;
use crate::zobrist::ZOBRIST;
use crate::{Bitboard, Occupancy};

/// Castling rights flags.
///
/// Bit `i` corresponds to the `i`-th castling hash key (K, Q, k, q).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights(0);
    pub const WHITE_KINGSIDE: u8 = 0b0001;
    pub const WHITE_QUEENSIDE: u8 = 0b0010;
    pub const BLACK_KINGSIDE: u8 = 0b0100;
    pub const BLACK_QUEENSIDE: u8 = 0b1000;
    pub const ALL: CastlingRights = CastlingRights(0b1111);

    /// Creates new castling rights from flags.
    #[inline]
    pub const fn new(flags: u8) -> Self {
        CastlingRights(flags & 0b1111)
    }

    /// Returns the flag for one side and wing.
    #[inline]
    pub const fn flag(color: Color, kingside: bool) -> u8 {
        match (color, kingside) {
            (Color::White, true) => Self::WHITE_KINGSIDE,
            (Color::White, false) => Self::WHITE_QUEENSIDE,
            (Color::Black, true) => Self::BLACK_KINGSIDE,
            (Color::Black, false) => Self::BLACK_QUEENSIDE,
        }
    }

    /// Returns true if every bit of `flags` is set.
    #[inline]
    pub const fn has(self, flags: u8) -> bool {
        flags != 0 && self.0 & flags == flags
    }

    /// Returns true if the given side can castle kingside.
    #[inline]
    pub const fn can_castle_kingside(self, color: Color) -> bool {
        self.has(Self::flag(color, true))
    }

    /// Returns true if the given side can castle queenside.
    #[inline]
    pub const fn can_castle_queenside(self, color: Color) -> bool {
        self.has(Self::flag(color, false))
    }

    /// Clears the given flags.
    #[inline]
    pub fn remove(&mut self, flags: u8) {
        self.0 &= !flags;
    }

    /// Returns the raw flags.
    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Parses an already validated FEN castling field.
    pub fn from_fen(field: &str) -> Self {
        let mut flags = 0u8;
        for c in field.chars() {
            flags |= match c {
                'K' => Self::WHITE_KINGSIDE,
                'Q' => Self::WHITE_QUEENSIDE,
                'k' => Self::BLACK_KINGSIDE,
                'q' => Self::BLACK_QUEENSIDE,
                _ => 0,
            };
        }
        CastlingRights(flags)
    }

    /// Renders the FEN castling field.
    pub fn to_fen(self) -> String {
        if self.0 == 0 {
            return "-".to_string();
        }
        "KQkq"
            .chars()
            .enumerate()
            .filter(|(i, _)| self.0 & (1 << i) != 0)
            .map(|(_, c)| c)
            .collect()
    }
}

/// Complete chess position state with its move history.
///
/// The piece bitboards, color bitboards, rotated occupancy views, the
/// per-square cache, the king squares and the board hash are always updated
/// together through [`Position::set_piece_at`] and
/// [`Position::remove_piece_at`].
#[derive(Clone, PartialEq, Eq)]
pub struct Position {
    /// Bitboards for each piece type, indexed by Piece enum.
    pub(crate) pieces: [Bitboard; 6],

    /// Bitboards for each color's pieces.
    pub(crate) colors: [Bitboard; 2],

    /// Occupied squares under all four rotations.
    pub(crate) occupancy: Occupancy,

    /// Occupant of each square.
    pub(crate) board: [Option<(Piece, Color)>; 64],

    /// King square per color, while that color has a king.
    pub(crate) kings: [Option<Square>; 2],

    /// The side to move.
    pub(crate) side_to_move: Color,

    /// Castling rights.
    pub(crate) castling: CastlingRights,

    /// En passant target square (if any).
    pub(crate) en_passant: Option<Square>,

    /// Halfmove clock for 50-move rule.
    pub(crate) halfmove_clock: u32,

    /// Fullmove number (starts at 1, increments after Black's move).
    pub(crate) fullmove_number: u32,

    /// Zobrist hash of the pieces alone, kept incrementally.
    pub(crate) board_hash: u64,

    /// One frame per recorded move.
    pub(crate) stack: Vec<Undo>,

    /// Occurrences of each full hash along the recorded line.
    pub(crate) transpositions: HashMap<u64, u32>,
}

impl Position {
    /// Creates the standard starting position.
    pub fn new() -> Self {
        let mut position = Self::empty();
        position.reset();
        position
    }

    /// Creates an empty board: White to move, no castling rights, clocks 0 and 1.
    pub fn empty() -> Self {
        let mut position = Position {
            pieces: [Bitboard::EMPTY; 6],
            colors: [Bitboard::EMPTY; 2],
            occupancy: Occupancy::EMPTY,
            board: [None; 64],
            kings: [None; 2],
            side_to_move: Color::White,
            castling: CastlingRights::NONE,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            board_hash: 0,
            stack: Vec::new(),
            transpositions: HashMap::new(),
        };
        position.restart_history();
        position
    }

    /// Creates a position from a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let mut position = Self::empty();
        position.set_fen(fen)?;
        Ok(position)
    }

    /// Restores the standard starting position and forgets all history.
    pub fn reset(&mut self) {
        trace!("resetting to the starting position");
        // The start position always parses.
        if let Ok(parsed) = FenParser::parse(FenParser::STARTPOS) {
            self.load(&parsed);
        }
    }

    /// Empties the board and forgets all history.
    pub fn clear(&mut self) {
        trace!("clearing the board");
        self.clear_board();
        self.side_to_move = Color::White;
        self.castling = CastlingRights::NONE;
        self.en_passant = None;
        self.halfmove_clock = 0;
        self.fullmove_number = 1;
        self.restart_history();
    }

    /// Replaces the position with the one described by `fen`.
    ///
    /// The whole string is validated first; on error the position is left
    /// untouched.
    pub fn set_fen(&mut self, fen: &str) -> Result<(), FenError> {
        let parsed = FenParser::parse(fen).map_err(|err| {
            debug!(fen, %err, "rejected FEN");
            err
        })?;
        trace!(fen, "loading FEN");
        self.load(&parsed);
        Ok(())
    }

    /// Loads a validated FEN record.
    pub(crate) fn load(&mut self, parsed: &FenParser) {
        self.clear_board();
        for sq in Square::all() {
            if let Some((piece, color)) = parsed.board[sq.index() as usize] {
                self.set_piece_at(sq, piece, color);
            }
        }
        self.side_to_move = parsed.side_to_move;
        self.castling = CastlingRights::from_fen(&parsed.castling);
        self.en_passant = parsed.en_passant;
        self.halfmove_clock = parsed.halfmove_clock;
        self.fullmove_number = parsed.fullmove_number;
        self.restart_history();
    }

    fn clear_board(&mut self) {
        self.pieces = [Bitboard::EMPTY; 6];
        self.colors = [Bitboard::EMPTY; 2];
        self.occupancy = Occupancy::EMPTY;
        self.board = [None; 64];
        self.kings = [None; 2];
        self.board_hash = 0;
    }

    /// Drops the move stack and counts the current position once.
    fn restart_history(&mut self) {
        self.stack.clear();
        self.transpositions.clear();
        self.transpositions.insert(self.zobrist_hash(), 1);
    }

    /// Returns the piece placement field of the FEN.
    pub fn board_fen(&self) -> String {
        let mut fen = String::with_capacity(72);
        for rank in (0..8u8).rev() {
            let mut empty_count = 0u8;
            for file in 0..8u8 {
                let sq = rank * 8 + file;
                match self.board[sq as usize] {
                    Some((piece, color)) => {
                        if empty_count > 0 {
                            fen.push(char::from(b'0' + empty_count));
                            empty_count = 0;
                        }
                        fen.push(piece.to_fen_char(color));
                    }
                    None => empty_count += 1,
                }
            }
            if empty_count > 0 {
                fen.push(char::from(b'0' + empty_count));
            }
            if rank > 0 {
                fen.push('/');
            }
        }
        fen
    }

    /// Returns the first four FEN fields: placement, turn, castling, en passant.
    pub fn epd_fields(&self) -> String {
        format!(
            "{} {} {} {}",
            self.board_fen(),
            self.side_to_move.to_fen_char(),
            self.castling.to_fen(),
            self.en_passant.map_or("-", Square::name)
        )
    }

    /// Converts the position to a FEN string.
    pub fn to_fen(&self) -> String {
        format!(
            "{} {} {}",
            self.epd_fields(),
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    /// Returns the piece and color at the given square, if any.
    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<(Piece, Color)> {
        self.board[sq.index() as usize]
    }

    /// Returns the piece kind at the given square, if any.
    #[inline]
    pub fn piece_kind_at(&self, sq: Square) -> Option<Piece> {
        self.board[sq.index() as usize].map(|(piece, _)| piece)
    }

    /// Puts a piece on a square, replacing any previous occupant.
    pub fn set_piece_at(&mut self, sq: Square, piece: Piece, color: Color) {
        self.remove_piece_at(sq);

        self.pieces[piece.index()].set(sq);
        self.colors[color.index()].set(sq);
        self.occupancy.set(sq);
        self.board[sq.index() as usize] = Some((piece, color));
        if piece == Piece::King {
            self.kings[color.index()] = Some(sq);
        }
        self.board_hash ^= ZOBRIST.piece_key(piece, color, sq);
    }

    /// Removes and returns the piece on a square. Does nothing on an empty square.
    pub fn remove_piece_at(&mut self, sq: Square) -> Option<(Piece, Color)> {
        let (piece, color) = self.board[sq.index() as usize]?;

        self.pieces[piece.index()].clear(sq);
        self.colors[color.index()].clear(sq);
        self.occupancy.clear(sq);
        self.board[sq.index() as usize] = None;
        if piece == Piece::King && self.kings[color.index()] == Some(sq) {
            self.kings[color.index()] = self.pieces_of(Piece::King, color).lsb();
        }
        self.board_hash ^= ZOBRIST.piece_key(piece, color, sq);

        Some((piece, color))
    }

    /// Returns a bitboard of all occupied squares.
    #[inline]
    pub fn occupied(&self) -> Bitboard {
        self.occupancy.bitboard()
    }

    /// Returns the rotated occupancy views.
    #[inline]
    pub fn occupancy(&self) -> &Occupancy {
        &self.occupancy
    }

    /// Returns a bitboard of all pieces of one kind, both colors.
    #[inline]
    pub fn pieces(&self, piece: Piece) -> Bitboard {
        self.pieces[piece.index()]
    }

    /// Returns a bitboard of all pieces of one color.
    #[inline]
    pub fn colored(&self, color: Color) -> Bitboard {
        self.colors[color.index()]
    }

    /// Returns a bitboard of pieces of the given type and color.
    #[inline]
    pub fn pieces_of(&self, piece: Piece, color: Color) -> Bitboard {
        self.pieces[piece.index()] & self.colors[color.index()]
    }

    /// Returns the square of the given side's king.
    #[inline]
    pub fn king(&self, color: Color) -> Option<Square> {
        self.kings[color.index()]
    }

    /// Returns the side to move.
    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    /// Returns the castling rights.
    #[inline]
    pub fn castling_rights(&self) -> CastlingRights {
        self.castling
    }

    /// Returns the en passant target square.
    #[inline]
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    /// Returns the halfmove clock.
    #[inline]
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    /// Returns the fullmove number.
    #[inline]
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// Returns the incrementally maintained hash of the pieces alone.
    #[inline]
    pub fn board_hash(&self) -> u64 {
        self.board_hash
    }

    /// Returns the full Zobrist hash.
    ///
    /// The en passant file only counts when a pawn of the side to move
    /// stands ready to capture on it.
    pub fn zobrist_hash(&self) -> u64 {
        let mut hash = self.board_hash;

        for right in 0..4 {
            if self.castling.raw() & (1 << right) != 0 {
                hash ^= ZOBRIST.castling_key(right);
            }
        }

        if let Some(ep) = self.en_passant {
            let us = self.side_to_move;
            let capturers = pawn_attacks(ep, us.opposite()) & self.pieces_of(Piece::Pawn, us);
            if capturers.is_not_empty() {
                hash ^= ZOBRIST.en_passant_key(ep.file_index() as usize);
            }
        }

        if self.side_to_move == Color::White {
            hash ^= ZOBRIST.white_to_move();
        }

        hash
    }

    /// Returns how often a full hash has occurred along the recorded line.
    pub fn transposition_count(&self, hash: u64) -> u32 {
        self.transpositions.get(&hash).copied().unwrap_or(0)
    }

    pub(crate) fn count_transposition(&mut self) {
        *self.transpositions.entry(self.zobrist_hash()).or_insert(0) += 1;
    }

    pub(crate) fn uncount_transposition(&mut self) {
        let hash = self.zobrist_hash();
        if let Some(count) = self.transpositions.get_mut(&hash) {
            *count -= 1;
            if *count == 0 {
                self.transpositions.remove(&hash);
            }
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8usize).rev() {
            for file in 0..8usize {
                if file > 0 {
                    write!(f, " ")?;
                }
                match self.board[rank * 8 + file] {
                    Some((piece, color)) => write!(f, "{}", piece.to_fen_char(color))?,
                    None => write!(f, ".")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Position")
            .field("fen", &self.to_fen())
            .field("ply", &self.stack.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::{File, Rank};

    #[test]
    fn startpos_fen_roundtrip() {
        let pos = Position::new();
        assert_eq!(pos.to_fen(), FenParser::STARTPOS);
    }

    #[test]
    fn custom_fen_roundtrip() {
        let fen = "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3";
        let pos = Position::from_fen(fen).unwrap();
        assert_eq!(pos.to_fen(), fen);
    }

    #[test]
    fn rejected_fen_leaves_position_unchanged() {
        let mut pos = Position::new();
        assert!(pos.set_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq e3 0 1").is_err());
        assert!(pos.set_fen("8/8/8/8/8/8/8/8 w").is_err());
        assert_eq!(pos.to_fen(), FenParser::STARTPOS);
    }

    #[test]
    fn piece_at() {
        let pos = Position::new();
        assert_eq!(pos.piece_at(Square::E1), Some((Piece::King, Color::White)));
        assert_eq!(pos.piece_at(Square::E8), Some((Piece::King, Color::Black)));
        assert_eq!(pos.piece_at(Square::new(File::E, Rank::R4)), None);
        assert_eq!(pos.piece_kind_at(Square::D8), Some(Piece::Queen));
    }

    #[test]
    fn set_and_remove_keep_caches_consistent() {
        let mut pos = Position::empty();
        let e4 = Square::new(File::E, Rank::R4);

        pos.set_piece_at(e4, Piece::Knight, Color::White);
        assert!(pos.pieces_of(Piece::Knight, Color::White).contains(e4));
        assert!(pos.occupied().contains(e4));

        // Replacing the occupant clears the old piece everywhere.
        pos.set_piece_at(e4, Piece::Queen, Color::Black);
        assert!(pos.pieces(Piece::Knight).is_empty());
        assert!(pos.colored(Color::White).is_empty());
        assert_eq!(pos.piece_at(e4), Some((Piece::Queen, Color::Black)));
        assert_eq!(
            pos.board_hash(),
            ZOBRIST.piece_key(Piece::Queen, Color::Black, e4)
        );

        assert_eq!(pos.remove_piece_at(e4), Some((Piece::Queen, Color::Black)));
        assert_eq!(pos.remove_piece_at(e4), None);
        assert_eq!(pos.occupancy(), &Occupancy::EMPTY);
        assert_eq!(pos.board_hash(), 0);
    }

    #[test]
    fn king_cache_follows_the_king() {
        let mut pos = Position::empty();
        pos.set_piece_at(Square::E1, Piece::King, Color::White);
        assert_eq!(pos.king(Color::White), Some(Square::E1));
        pos.set_piece_at(Square::G1, Piece::King, Color::White);
        pos.remove_piece_at(Square::G1);
        assert_eq!(pos.king(Color::White), Some(Square::E1));
        pos.remove_piece_at(Square::E1);
        assert_eq!(pos.king(Color::White), None);
        assert_eq!(pos.king(Color::Black), None);
    }

    #[test]
    fn castling_rights() {
        let mut rights = CastlingRights::ALL;
        assert!(rights.can_castle_kingside(Color::White));
        assert!(rights.can_castle_queenside(Color::Black));

        rights.remove(CastlingRights::WHITE_KINGSIDE);
        assert!(!rights.can_castle_kingside(Color::White));
        assert!(rights.can_castle_queenside(Color::White));
        assert_eq!(rights.to_fen(), "Qkq");
        assert_eq!(CastlingRights::from_fen("Qkq"), rights);
        assert_eq!(CastlingRights::NONE.to_fen(), "-");
        assert_eq!(CastlingRights::from_fen("-"), CastlingRights::NONE);
    }

    #[test]
    fn position_empty() {
        let pos = Position::empty();
        assert_eq!(pos.side_to_move(), Color::White);
        assert_eq!(pos.castling_rights().raw(), 0);
        assert_eq!(pos.en_passant(), None);
        assert_eq!(pos.halfmove_clock(), 0);
        assert_eq!(pos.fullmove_number(), 1);
        assert!(pos.occupied().is_empty());
        assert_eq!(pos.to_fen(), "8/8/8/8/8/8/8/8 w - - 0 1");
    }

    #[test]
    fn clear_and_reset() {
        let mut pos = Position::from_fen("8/8/8/4k3/8/4B3/4K3/8 b - - 7 40").unwrap();
        pos.clear();
        assert_eq!(pos.to_fen(), "8/8/8/8/8/8/8/8 w - - 0 1");
        assert_eq!(pos.transposition_count(pos.zobrist_hash()), 1);
        pos.reset();
        assert_eq!(pos, Position::new());
    }

    #[test]
    fn position_occupied() {
        let pos = Position::new();
        assert_eq!(pos.occupied().count(), 32);
        assert_eq!(pos.pieces_of(Piece::Pawn, Color::White).count(), 8);
        assert_eq!(pos.pieces_of(Piece::Pawn, Color::Black).count(), 8);
        assert_eq!(pos.pieces_of(Piece::King, Color::White).count(), 1);
    }

    #[test]
    fn hash_depends_on_turn_and_rights() {
        let white = Position::from_fen("4k3/8/8/8/8/8/8/4K2R w K - 0 1").unwrap();
        let black = Position::from_fen("4k3/8/8/8/8/8/8/4K2R b K - 0 1").unwrap();
        let no_rights = Position::from_fen("4k3/8/8/8/8/8/8/4K2R w - - 0 1").unwrap();
        assert_eq!(white.board_hash(), black.board_hash());
        assert_ne!(white.zobrist_hash(), black.zobrist_hash());
        assert_ne!(white.zobrist_hash(), no_rights.zobrist_hash());
    }

    #[test]
    fn en_passant_hashed_only_when_capturable() {
        // No black pawn next to e4: the target does not change the hash.
        let plain = Position::from_fen("4k3/8/8/8/4P3/8/8/4K3 b - - 0 1").unwrap();
        let target = Position::from_fen("4k3/8/8/8/4P3/8/8/4K3 b - e3 0 1").unwrap();
        assert_eq!(plain.zobrist_hash(), target.zobrist_hash());

        let plain = Position::from_fen("4k3/8/8/8/3pP3/8/8/4K3 b - - 0 1").unwrap();
        let target = Position::from_fen("4k3/8/8/8/3pP3/8/8/4K3 b - e3 0 1").unwrap();
        assert_ne!(plain.zobrist_hash(), target.zobrist_hash());
    }

    #[test]
    fn display_board() {
        let pos = Position::new();
        let text = pos.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 8);
        assert_eq!(lines[0], "r n b q k b n r");
        assert_eq!(lines[4], ". . . . . . . .");
        assert_eq!(lines[7], "R N B Q K B N R");
    }
}

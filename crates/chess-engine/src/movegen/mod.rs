//! Move generation.
//!
//! Pseudo-legal moves are enumerated once, by a single routine that feeds
//! a [`MoveSink`]. Collecting into a [`MoveList`] and counting go through
//! the same enumeration, so the count always equals the list length.
//! Legal moves are the pseudo-legal ones that survive a push / check test /
//! pop round trip.

mod attacks;
pub mod perft;
mod rotated;

use std::ops::{BitOr, BitOrAssign};

use crate::make::castling_rook;
use crate::position::CastlingRights;
use crate::{Bitboard, Position};
use chess_core::{Color, Move, Piece, Square};

pub use attacks::{
    bishop_attacks, king_attacks, knight_attacks, pawn_attacks, pawn_double_pushes, pawn_pushes,
    queen_attacks, rook_attacks,
};

/// A list of generated moves.
///
/// Room for the largest legal move count is reserved up front. Positions
/// with extra pieces can exceed it, in which case the list grows.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct MoveList {
    moves: Vec<Move>,
}

impl MoveList {
    /// Number of moves reserved by [`MoveList::new`].
    pub const RESERVED: usize = 218;

    /// Creates an empty move list.
    #[inline]
    pub fn new() -> Self {
        MoveList {
            moves: Vec::with_capacity(Self::RESERVED),
        }
    }

    /// Adds a move to the list.
    #[inline]
    pub fn push(&mut self, m: Move) {
        self.moves.push(m);
    }

    /// Returns the number of moves.
    #[inline]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// Returns true if the list is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Returns a slice of the moves.
    #[inline]
    pub fn as_slice(&self) -> &[Move] {
        &self.moves
    }

    /// Returns true if the list holds the move.
    #[inline]
    pub fn contains(&self, m: Move) -> bool {
        self.moves.contains(&m)
    }

    /// Retains only moves for which the predicate returns true.
    pub fn retain<F>(&mut self, f: F)
    where
        F: FnMut(&Move) -> bool,
    {
        self.moves.retain(f);
    }
}

impl std::ops::Index<usize> for MoveList {
    type Output = Move;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.as_slice()[index]
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl std::fmt::Debug for MoveList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

/// Receiver of enumerated moves.
pub trait MoveSink {
    /// Accepts one move.
    fn push_move(&mut self, m: Move);

    /// Accepts a plain move from `from` to every square of `targets`.
    fn push_targets(&mut self, from: Square, targets: Bitboard) {
        for to in targets {
            self.push_move(Move::normal(from, to));
        }
    }

    /// Accepts the four promotions from `from` to every square of `targets`.
    fn push_promotions(&mut self, from: Square, targets: Bitboard) {
        for to in targets {
            for piece in Piece::PROMOTIONS {
                self.push_move(Move::new(from, to, Some(piece)));
            }
        }
    }
}

impl MoveSink for MoveList {
    #[inline]
    fn push_move(&mut self, m: Move) {
        self.push(m);
    }
}

/// Counts moves without materializing them.
#[derive(Debug, Default)]
struct MoveCounter(usize);

impl MoveSink for MoveCounter {
    #[inline]
    fn push_move(&mut self, _m: Move) {
        self.0 += 1;
    }

    #[inline]
    fn push_targets(&mut self, _from: Square, targets: Bitboard) {
        self.0 += targets.count() as usize;
    }

    #[inline]
    fn push_promotions(&mut self, _from: Square, targets: Bitboard) {
        self.0 += targets.count() as usize * Piece::PROMOTIONS.len();
    }
}

/// Which kinds of moves to enumerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MoveClasses(u8);

impl MoveClasses {
    pub const CASTLING: MoveClasses = MoveClasses(1 << 0);
    pub const PAWNS: MoveClasses = MoveClasses(1 << 1);
    pub const KNIGHTS: MoveClasses = MoveClasses(1 << 2);
    pub const BISHOPS: MoveClasses = MoveClasses(1 << 3);
    pub const ROOKS: MoveClasses = MoveClasses(1 << 4);
    pub const QUEENS: MoveClasses = MoveClasses(1 << 5);
    pub const KING: MoveClasses = MoveClasses(1 << 6);
    pub const ALL: MoveClasses = MoveClasses(0b0111_1111);

    /// Returns the class that moves the given piece kind (castling excluded).
    pub const fn for_piece(piece: Piece) -> Self {
        match piece {
            Piece::Pawn => Self::PAWNS,
            Piece::Knight => Self::KNIGHTS,
            Piece::Bishop => Self::BISHOPS,
            Piece::Rook => Self::ROOKS,
            Piece::Queen => Self::QUEENS,
            Piece::King => Self::KING,
        }
    }

    /// Returns true if all classes in `other` are selected.
    #[inline]
    pub const fn contains(self, other: MoveClasses) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for MoveClasses {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        MoveClasses(self.0 | rhs.0)
    }
}

impl BitOrAssign for MoveClasses {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Castling geometry for one side and wing.
struct CastlingPath {
    king_from: Square,
    king_to: Square,
    rook_from: Square,
    /// Squares strictly between king and rook.
    between: Bitboard,
    /// Squares the king stands on, crosses or lands on.
    king_walk: [Square; 3],
}

fn castling_path(color: Color, kingside: bool) -> CastlingPath {
    use Square as S;
    let (king_from, king_to, rook_from, between, walk) = match (color, kingside) {
        (Color::White, true) => (S::E1, S::G1, S::H1, [S::F1, S::G1, S::G1], [S::E1, S::F1, S::G1]),
        (Color::White, false) => (S::E1, S::C1, S::A1, [S::B1, S::C1, S::D1], [S::E1, S::D1, S::C1]),
        (Color::Black, true) => (S::E8, S::G8, S::H8, [S::F8, S::G8, S::G8], [S::E8, S::F8, S::G8]),
        (Color::Black, false) => (S::E8, S::C8, S::A8, [S::B8, S::C8, S::D8], [S::E8, S::D8, S::C8]),
    };
    CastlingPath {
        king_from,
        king_to,
        rook_from,
        between: between.into_iter().collect(),
        king_walk: walk,
    }
}

impl Position {
    /// Returns the pieces of `color` that attack `sq`.
    ///
    /// Pinned pieces count; this is an attack map, not a legality test.
    pub fn attackers(&self, color: Color, sq: Square) -> Bitboard {
        let occupancy = &self.occupancy;
        let rooks_queens = self.pieces(Piece::Rook) | self.pieces(Piece::Queen);
        let bishops_queens = self.pieces(Piece::Bishop) | self.pieces(Piece::Queen);

        let attackers = (pawn_attacks(sq, color.opposite()) & self.pieces(Piece::Pawn))
            | (knight_attacks(sq) & self.pieces(Piece::Knight))
            | (king_attacks(sq) & self.pieces(Piece::King))
            | (rook_attacks(sq, occupancy) & rooks_queens)
            | (bishop_attacks(sq, occupancy) & bishops_queens);

        attackers & self.colored(color)
    }

    /// Returns true if any piece of `color` attacks `sq`.
    #[inline]
    pub fn is_attacked_by(&self, color: Color, sq: Square) -> bool {
        self.attackers(color, sq).is_not_empty()
    }

    /// Returns true if the side to move is in check.
    pub fn is_check(&self) -> bool {
        let us = self.side_to_move;
        self.king(us)
            .is_some_and(|king| self.is_attacked_by(us.opposite(), king))
    }

    /// Returns true if the side that just moved left its own king attacked.
    pub fn was_into_check(&self) -> bool {
        let them = self.side_to_move.opposite();
        self.king(them)
            .is_some_and(|king| self.is_attacked_by(self.side_to_move, king))
    }

    /// Returns true if playing `m` would leave the mover's king attacked.
    pub fn is_into_check(&mut self, m: Move) -> bool {
        self.push(m);
        let into_check = self.was_into_check();
        self.pop();
        into_check
    }

    /// Returns the attack set of a piece standing on `from`.
    fn piece_attacks(&self, piece: Piece, color: Color, from: Square) -> Bitboard {
        let occupancy = &self.occupancy;
        match piece {
            Piece::Pawn => pawn_attacks(from, color),
            Piece::Knight => knight_attacks(from),
            Piece::Bishop => bishop_attacks(from, occupancy),
            Piece::Rook => rook_attacks(from, occupancy),
            Piece::Queen => queen_attacks(from, occupancy),
            Piece::King => king_attacks(from),
        }
    }

    /// Returns the squares a pawn on `sq` may move to, ignoring checks.
    ///
    /// Empty if there is no pawn on `sq`.
    pub fn pawn_moves_from(&self, sq: Square) -> Bitboard {
        let Some((Piece::Pawn, color)) = self.piece_at(sq) else {
            return Bitboard::EMPTY;
        };
        let empty = !self.occupied();

        let mut targets = pawn_pushes(sq, color) & empty;
        if targets.is_not_empty() {
            targets |= pawn_double_pushes(sq, color) & empty;
        }

        let mut capturable = self.colored(color.opposite());
        if let Some(ep) = self.en_passant {
            if color == self.side_to_move {
                capturable.set(ep);
            }
        }
        targets | (pawn_attacks(sq, color) & capturable)
    }

    /// Returns true if the side to move may castle on the given wing right now.
    fn can_castle(&self, kingside: bool) -> bool {
        let us = self.side_to_move;
        if !self.castling.has(CastlingRights::flag(us, kingside)) {
            return false;
        }
        let path = castling_path(us, kingside);
        if self.piece_at(path.king_from) != Some((Piece::King, us))
            || self.piece_at(path.rook_from) != Some((Piece::Rook, us))
            || (self.occupied() & path.between).is_not_empty()
        {
            return false;
        }
        let them = us.opposite();
        path.king_walk
            .iter()
            .all(|&sq| !self.is_attacked_by(them, sq))
    }

    /// Feeds every pseudo-legal move of the selected classes to `sink`.
    fn enumerate<S: MoveSink>(&self, classes: MoveClasses, sink: &mut S) {
        let us = self.side_to_move;
        let ours = self.colored(us);

        if classes.contains(MoveClasses::CASTLING) {
            for kingside in [true, false] {
                if self.can_castle(kingside) {
                    let path = castling_path(us, kingside);
                    sink.push_move(Move::normal(path.king_from, path.king_to));
                }
            }
        }

        if classes.contains(MoveClasses::PAWNS) {
            self.enumerate_pawns(sink);
        }

        for piece in [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen, Piece::King] {
            if !classes.contains(MoveClasses::for_piece(piece)) {
                continue;
            }
            for from in self.pieces_of(piece, us) {
                sink.push_targets(from, self.piece_attacks(piece, us, from) & !ours);
            }
        }
    }

    fn enumerate_pawns<S: MoveSink>(&self, sink: &mut S) {
        let us = self.side_to_move;
        let pawns = self.pieces_of(Piece::Pawn, us);
        let theirs = self.colored(us.opposite());
        let empty = !self.occupied();
        let promotion_rank = match us {
            Color::White => Bitboard::RANK_8,
            Color::Black => Bitboard::RANK_1,
        };

        let emit = |sink: &mut S, from: Square, targets: Bitboard| {
            sink.push_targets(from, targets & !promotion_rank);
            sink.push_promotions(from, targets & promotion_rank);
        };

        if let Some(ep) = self.en_passant {
            for from in pawn_attacks(ep, us.opposite()) & pawns {
                sink.push_move(Move::normal(from, ep));
            }
        }

        for from in pawns {
            emit(sink, from, pawn_attacks(from, us) & theirs);
        }

        for from in pawns {
            emit(sink, from, pawn_pushes(from, us) & empty);
        }

        for from in pawns {
            if (pawn_pushes(from, us) & empty).is_not_empty() {
                sink.push_targets(from, pawn_double_pushes(from, us) & empty);
            }
        }
    }

    /// Generates pseudo-legal moves of the selected classes.
    pub fn pseudo_legal_moves(&self, classes: MoveClasses) -> MoveList {
        let mut moves = MoveList::new();
        self.enumerate(classes, &mut moves);
        moves
    }

    /// Counts pseudo-legal moves of the selected classes.
    pub fn pseudo_legal_move_count(&self, classes: MoveClasses) -> usize {
        let mut counter = MoveCounter::default();
        self.enumerate(classes, &mut counter);
        counter.0
    }

    /// Generates all legal moves.
    pub fn legal_moves(&mut self) -> MoveList {
        self.legal_moves_of(MoveClasses::ALL)
    }

    /// Generates legal moves of the selected classes.
    pub fn legal_moves_of(&mut self, classes: MoveClasses) -> MoveList {
        let mut moves = self.pseudo_legal_moves(classes);
        moves.retain(|m| !self.is_into_check(*m));
        moves
    }

    /// Returns true if the side to move has at least one legal move.
    pub fn has_legal_moves(&mut self) -> bool {
        let moves = self.pseudo_legal_moves(MoveClasses::ALL);
        moves.as_slice().iter().any(|m| !self.is_into_check(*m))
    }

    /// Checks whether a move obeys the movement rules here, ignoring checks.
    ///
    /// Never fails: anything that does not fit the position is simply
    /// not pseudo-legal. The null move never is.
    pub fn is_pseudo_legal(&self, m: Move) -> bool {
        if m.is_null() {
            return false;
        }
        let us = self.side_to_move;
        let from = m.from();
        let to = m.to();

        let Some((piece, color)) = self.piece_at(from) else {
            return false;
        };
        if color != us || self.colored(us).contains(to) {
            return false;
        }

        if piece == Piece::Pawn {
            let promoting = to.rank_index() == us.promotion_rank();
            if promoting != m.promotion().is_some() {
                return false;
            }
            return self.pawn_moves_from(from).contains(to);
        }
        if m.promotion().is_some() {
            return false;
        }

        if castling_rook(piece, from, to).is_some() {
            let kingside = to.file_index() > from.file_index();
            return self.can_castle(kingside);
        }

        self.piece_attacks(piece, us, from).contains(to)
    }

    /// Returns true if `m` is pseudo-legal and does not leave the king attacked.
    pub fn is_legal(&mut self, m: Move) -> bool {
        self.is_pseudo_legal(m) && !self.is_into_check(m)
    }
}

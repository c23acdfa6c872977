//! Sliding piece attacks from rotated occupancy slices.
//!
//! For every line, square and 6-bit inner occupancy of that line the full
//! set of attacked squares is precomputed once, so a rook or bishop lookup
//! is two table reads and a union.

use crate::occupancy::{line_slot, square_on_line, Line};
use crate::{Bitboard, Occupancy};
use chess_core::Square;
use std::sync::OnceLock;

/// Precomputed line attacks, indexed by `(line * 64 + square) * 64 + slice`.
pub struct SlidingTables {
    attacks: Vec<Bitboard>,
}

static SLIDING_TABLES: OnceLock<SlidingTables> = OnceLock::new();

/// Gets the global sliding attack tables, initializing if necessary.
pub fn get_sliding_tables() -> &'static SlidingTables {
    SLIDING_TABLES.get_or_init(SlidingTables::new)
}

impl SlidingTables {
    /// Creates and fills the tables for all lines, squares and slices.
    pub fn new() -> Self {
        let mut attacks = vec![Bitboard::EMPTY; 4 * 64 * 64];

        for line in Line::ALL {
            for sq in 0..64u8 {
                let base = (line.index() * 64 + sq as usize) * 64;
                for slice in 0..64u8 {
                    attacks[base + slice as usize] = line_attacks_slow(line, sq, slice);
                }
            }
        }

        SlidingTables { attacks }
    }

    /// Returns the attacks along one line through `sq`.
    #[inline]
    pub fn line_attacks(&self, line: Line, sq: Square, occupancy: &Occupancy) -> Bitboard {
        let index = (line.index() * 64 + sq.index() as usize) * 64 + occupancy.slice(line, sq);
        self.attacks[index]
    }
}

impl Default for SlidingTables {
    fn default() -> Self {
        Self::new()
    }
}

/// Walks the line through `sq` in both directions, stopping on blockers.
///
/// Bit `i` of `slice` is the occupancy of the line's square at offset
/// `i + 1`. Bits past the line's last inner square belong to a neighbouring
/// line and are ignored.
fn line_attacks_slow(line: Line, sq: u8, slice: u8) -> Bitboard {
    let slot = line_slot(line, sq);
    let inner = slot.len.saturating_sub(2);
    let blocked = |pos: u8| pos >= 1 && pos - 1 < inner && (slice >> (pos - 1)) & 1 == 1;

    let mut attacks = 0u64;

    let mut pos = slot.pos;
    while pos + 1 < slot.len {
        pos += 1;
        attacks |= 1u64 << square_on_line(line, sq, pos);
        if blocked(pos) {
            break;
        }
    }

    let mut pos = slot.pos;
    while pos > 0 {
        pos -= 1;
        attacks |= 1u64 << square_on_line(line, sq, pos);
        if blocked(pos) {
            break;
        }
    }

    Bitboard(attacks)
}

/// Returns rook attacks for a square given the occupancy views.
#[inline]
pub fn rook_attacks(sq: Square, occupancy: &Occupancy) -> Bitboard {
    let tables = get_sliding_tables();
    tables.line_attacks(Line::Rank, sq, occupancy) | tables.line_attacks(Line::File, sq, occupancy)
}

/// Returns bishop attacks for a square given the occupancy views.
#[inline]
pub fn bishop_attacks(sq: Square, occupancy: &Occupancy) -> Bitboard {
    let tables = get_sliding_tables();
    tables.line_attacks(Line::Diagonal, sq, occupancy)
        | tables.line_attacks(Line::AntiDiagonal, sq, occupancy)
}

/// Returns queen attacks (bishop + rook).
#[inline]
pub fn queen_attacks(sq: Square, occupancy: &Occupancy) -> Bitboard {
    bishop_attacks(sq, occupancy) | rook_attacks(sq, occupancy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::{File, Rank};
    use proptest::prelude::*;

    /// Ray walk over a plain bitboard.
    fn ray_attacks(sq: Square, occupied: Bitboard, directions: &[(i8, i8)]) -> Bitboard {
        let mut attacks = Bitboard::EMPTY;
        for &(df, dr) in directions {
            let mut f = sq.file_index() as i8 + df;
            let mut r = sq.rank_index() as i8 + dr;
            while (0..8).contains(&f) && (0..8).contains(&r) {
                let target = Square::from_coords(f as u8, r as u8).unwrap();
                attacks.set(target);
                if occupied.contains(target) {
                    break;
                }
                f += df;
                r += dr;
            }
        }
        attacks
    }

    const ROOK_DIRS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
    const BISHOP_DIRS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

    #[test]
    fn rook_attacks_empty_board() {
        let sq = Square::new(File::D, Rank::R4);
        let attacks = rook_attacks(sq, &Occupancy::EMPTY);
        assert_eq!(attacks.count(), 14);
    }

    #[test]
    fn bishop_attacks_empty_board() {
        let sq = Square::new(File::D, Rank::R4);
        assert_eq!(bishop_attacks(sq, &Occupancy::EMPTY).count(), 13);
        assert_eq!(bishop_attacks(Square::A1, &Occupancy::EMPTY).count(), 7);
        assert_eq!(bishop_attacks(Square::H8, &Occupancy::EMPTY).count(), 7);
    }

    #[test]
    fn rook_attacks_with_blockers() {
        let sq = Square::new(File::D, Rank::R4);
        let mut blockers = Bitboard::EMPTY;
        blockers.set(Square::new(File::D, Rank::R6));
        blockers.set(Square::new(File::F, Rank::R4));
        let attacks = rook_attacks(sq, &Occupancy::from_bitboard(blockers));

        assert!(attacks.contains(Square::new(File::D, Rank::R5)));
        assert!(attacks.contains(Square::new(File::D, Rank::R6)));
        assert!(!attacks.contains(Square::new(File::D, Rank::R7)));
        assert!(attacks.contains(Square::new(File::E, Rank::R4)));
        assert!(attacks.contains(Square::new(File::F, Rank::R4)));
        assert!(!attacks.contains(Square::new(File::G, Rank::R4)));
    }

    #[test]
    fn queen_is_union() {
        let sq = Square::new(File::E, Rank::R5);
        let occ = Occupancy::from_bitboard(Bitboard(0x00FF_0000_0000_FF00));
        assert_eq!(
            queen_attacks(sq, &occ),
            rook_attacks(sq, &occ) | bishop_attacks(sq, &occ)
        );
    }

    proptest! {
        #[test]
        fn lookups_match_ray_walk(bits in any::<u64>(), index in 0u8..64) {
            let sq = Square::from_index(index).unwrap();
            let occupied = Bitboard(bits);
            let occ = Occupancy::from_bitboard(occupied);
            prop_assert_eq!(rook_attacks(sq, &occ), ray_attacks(sq, occupied, &ROOK_DIRS));
            prop_assert_eq!(bishop_attacks(sq, &occ), ray_attacks(sq, occupied, &BISHOP_DIRS));
        }
    }
}

//! Rotated occupancy views.
//!
//! Sliding attacks are looked up by the occupancy of one line through the
//! slider's square. Keeping the occupied set under four fixed square
//! permutations makes every rank, file, diagonal and anti-diagonal a
//! contiguous run of bits, so the relevant slice can be cut out with one
//! shift and mask.

use crate::Bitboard;
use chess_core::Square;

/// A line through a square along which a slider moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Line {
    /// Horizontal. The view is the plain occupied set.
    Rank = 0,
    /// Vertical. The view is the occupied set rotated by 90 degrees.
    File = 1,
    /// a1-h8 direction. The view is rotated by 45 degrees.
    Diagonal = 2,
    /// h1-a8 direction. The view is rotated by -45 degrees.
    AntiDiagonal = 3,
}

impl Line {
    /// All four lines in view order.
    pub const ALL: [Line; 4] = [Line::Rank, Line::File, Line::Diagonal, Line::AntiDiagonal];

    /// Returns the view index.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Placement of one square on one line: where the line starts in the
/// rotated view, how many squares it has, and the square's offset on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LineSlot {
    pub start: u8,
    pub len: u8,
    pub pos: u8,
}

/// Number of squares on the diagonal (or anti-diagonal) numbered `n` (0-14).
const fn diagonal_len(n: u8) -> u8 {
    if n < 7 {
        n + 1
    } else {
        15 - n
    }
}

/// First rotated bit of diagonal `n`.
const fn diagonal_start(n: u8) -> u8 {
    let mut start = 0;
    let mut k = 0;
    while k < n {
        start += diagonal_len(k);
        k += 1;
    }
    start
}

/// Computes the slot of `sq` on `line`.
pub(crate) const fn line_slot(line: Line, sq: u8) -> LineSlot {
    let file = sq % 8;
    let rank = sq / 8;
    match line {
        Line::Rank => LineSlot {
            start: rank * 8,
            len: 8,
            pos: file,
        },
        Line::File => LineSlot {
            start: file * 8,
            len: 8,
            pos: rank,
        },
        Line::Diagonal => {
            let n = file + 7 - rank;
            LineSlot {
                start: diagonal_start(n),
                len: diagonal_len(n),
                pos: if file < rank { file } else { rank },
            }
        }
        Line::AntiDiagonal => {
            let n = file + rank;
            let first_file = if n > 7 { n - 7 } else { 0 };
            LineSlot {
                start: diagonal_start(n),
                len: diagonal_len(n),
                pos: file - first_file,
            }
        }
    }
}

/// Returns the square at offset `pos` on the line through `sq`.
pub(crate) const fn square_on_line(line: Line, sq: u8, pos: u8) -> u8 {
    let file = sq % 8;
    let rank = sq / 8;
    match line {
        Line::Rank => rank * 8 + pos,
        Line::File => pos * 8 + file,
        Line::Diagonal => {
            let (f0, r0) = if file < rank {
                (0, rank - file)
            } else {
                (file - rank, 0)
            };
            (r0 + pos) * 8 + f0 + pos
        }
        Line::AntiDiagonal => {
            let n = file + rank;
            let f0 = if n > 7 { n - 7 } else { 0 };
            let r0 = n - f0;
            (r0 - pos) * 8 + f0 + pos
        }
    }
}

const fn compute_rotated_index() -> [[u8; 64]; 4] {
    let mut table = [[0u8; 64]; 4];
    let mut l = 0;
    while l < 4 {
        let mut sq = 0u8;
        while sq < 64 {
            let slot = line_slot(Line::ALL[l], sq);
            table[l][sq as usize] = slot.start + slot.pos;
            sq += 1;
        }
        l += 1;
    }
    table
}

const fn compute_shifts() -> [[u8; 64]; 4] {
    let mut table = [[0u8; 64]; 4];
    let mut l = 0;
    while l < 4 {
        let mut sq = 0u8;
        while sq < 64 {
            let start = line_slot(Line::ALL[l], sq).start;
            // Skip the line's first square: an edge square never blocks.
            table[l][sq as usize] = if start < 63 { start + 1 } else { 63 };
            sq += 1;
        }
        l += 1;
    }
    table
}

/// Bit position of each square in each rotated view, `[line][square]`.
pub(crate) const ROTATED_INDEX: [[u8; 64]; 4] = compute_rotated_index();

/// Right shift that brings a square's line to the low bits, `[line][square]`.
pub(crate) const SHIFT: [[u8; 64]; 4] = compute_shifts();

/// The occupied set kept under all four square permutations.
///
/// All four views are updated together on every set or clear, so they are
/// always images of the same occupied set.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Occupancy {
    views: [u64; 4],
}

impl Occupancy {
    /// No occupied squares.
    pub const EMPTY: Occupancy = Occupancy { views: [0; 4] };

    /// Builds the views for an occupied set.
    pub fn from_bitboard(occupied: Bitboard) -> Self {
        let mut occupancy = Occupancy::EMPTY;
        for sq in occupied {
            occupancy.set(sq);
        }
        occupancy
    }

    /// Marks a square as occupied in every view.
    #[inline]
    pub fn set(&mut self, sq: Square) {
        let i = sq.index() as usize;
        for (view, index) in self.views.iter_mut().zip(ROTATED_INDEX.iter()) {
            *view |= 1u64 << index[i];
        }
    }

    /// Marks a square as empty in every view.
    #[inline]
    pub fn clear(&mut self, sq: Square) {
        let i = sq.index() as usize;
        for (view, index) in self.views.iter_mut().zip(ROTATED_INDEX.iter()) {
            *view &= !(1u64 << index[i]);
        }
    }

    /// Returns the occupied set in board order.
    #[inline]
    pub const fn bitboard(&self) -> Bitboard {
        Bitboard(self.views[Line::Rank as usize])
    }

    /// Returns the raw rotated view for a line.
    #[inline]
    pub const fn view(&self, line: Line) -> u64 {
        self.views[line as usize]
    }

    /// Returns the 6-bit inner occupancy of the line through `sq`.
    #[inline]
    pub const fn slice(&self, line: Line, sq: Square) -> usize {
        let l = line as usize;
        ((self.views[l] >> SHIFT[l][sq.index() as usize]) & 63) as usize
    }
}

impl std::fmt::Debug for Occupancy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Occupancy")
            .field("rank", &format_args!("{:#018x}", self.views[0]))
            .field("file", &format_args!("{:#018x}", self.views[1]))
            .field("diagonal", &format_args!("{:#018x}", self.views[2]))
            .field("anti_diagonal", &format_args!("{:#018x}", self.views[3]))
            .finish()
    }
}

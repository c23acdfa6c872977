//! Game end and draw detection.
//!
//! Automatic endings (checkmate, stalemate, insufficient material, the
//! 75-move rule and fivefold repetition) end the game on their own.
//! Claimable draws (the 50-move rule and threefold repetition) only
//! report whether the side to move may claim.

use chess_core::{Color, Move, Piece};
use tracing::warn;

use crate::{Bitboard, Position};

/// Plies without a capture or pawn move after which a draw may be claimed.
const FIFTY_MOVE_PLIES: u32 = 100;

/// Plies without a capture or pawn move after which the game is drawn.
const SEVENTY_FIVE_MOVE_PLIES: u32 = 150;

/// Replay steps used to confirm a fivefold repetition.
const FIVEFOLD_STEPS: usize = 4;

/// Plies per replay step: one full move by each side, twice.
const FIVEFOLD_STEP_PLIES: usize = 4;

/// Result of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GameResult {
    /// White wins by checkmate.
    WhiteWins,
    /// Black wins by checkmate.
    BlackWins,
    /// Draw with a specific reason.
    Draw(DrawReason),
}

/// Reason for a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DrawReason {
    /// Stalemate - no legal moves but not in check.
    Stalemate,
    /// Insufficient material to checkmate.
    InsufficientMaterial,
    /// 50-move rule (100 half-moves without pawn move or capture) - claimable.
    FiftyMoveRule,
    /// 75-move rule (150 half-moves) - automatic draw.
    SeventyFiveMoveRule,
    /// Threefold repetition - claimable.
    ThreefoldRepetition,
    /// Fivefold repetition - automatic draw.
    FivefoldRepetition,
}

impl Position {
    /// Returns true if the side to move is checkmated.
    pub fn is_checkmate(&mut self) -> bool {
        self.is_check() && !self.has_legal_moves()
    }

    /// Returns true if the side to move is stalemated.
    pub fn is_stalemate(&mut self) -> bool {
        !self.is_check() && !self.has_legal_moves()
    }

    /// Returns true if neither side can possibly checkmate.
    ///
    /// Any pawn, rook or queen is enough material. Otherwise three or fewer
    /// pieces cannot mate, and neither can bishops all on one square color.
    pub fn is_insufficient_material(&self) -> bool {
        let heavy = self.pieces(Piece::Pawn) | self.pieces(Piece::Rook) | self.pieces(Piece::Queen);
        if heavy.is_not_empty() {
            return false;
        }
        if self.occupied().count() <= 3 {
            return true;
        }
        if self.pieces(Piece::Knight).is_not_empty() {
            return false;
        }
        let bishops = self.pieces(Piece::Bishop);
        (bishops & Bitboard::DARK_SQUARES).is_empty() || (bishops & Bitboard::LIGHT_SQUARES).is_empty()
    }

    /// Returns true under the 75-move rule, unless the game already ended
    /// on the board.
    pub fn is_seventyfive_moves(&mut self) -> bool {
        self.halfmove_clock >= SEVENTY_FIVE_MOVE_PLIES && self.has_legal_moves()
    }

    /// Returns true if the side to move may claim a draw under the 50-move rule.
    pub fn can_claim_fifty_moves(&mut self) -> bool {
        self.halfmove_clock >= FIFTY_MOVE_PLIES && self.has_legal_moves()
    }

    /// Returns true if the current position has occurred at least three times.
    pub fn can_claim_threefold_repetition(&self) -> bool {
        self.transposition_count(self.zobrist_hash()) >= 3
    }

    /// Returns true if either draw claim is available.
    pub fn can_claim_draw(&mut self) -> bool {
        self.can_claim_fifty_moves() || self.can_claim_threefold_repetition()
    }

    /// Returns true if the position has been reached five times by
    /// consecutive alternating moves.
    ///
    /// The occurrence count is confirmed by stepping back through the move
    /// stack and comparing hashes, so a hash collision cannot end the game.
    /// The position is restored before returning.
    pub fn is_fivefold_repetition(&mut self) -> bool {
        if self.ply() < FIVEFOLD_STEPS * FIVEFOLD_STEP_PLIES {
            return false;
        }
        let hash = self.zobrist_hash();
        if self.transposition_count(hash) < 5 {
            return false;
        }

        let mut undone: Vec<Move> = Vec::with_capacity(FIVEFOLD_STEPS * FIVEFOLD_STEP_PLIES);
        let mut repeated = true;
        'replay: for _ in 0..FIVEFOLD_STEPS {
            for _ in 0..FIVEFOLD_STEP_PLIES {
                match self.pop() {
                    Some(m) => undone.push(m),
                    None => {
                        repeated = false;
                        break 'replay;
                    }
                }
            }
            if self.zobrist_hash() != hash {
                repeated = false;
                break;
            }
        }

        while let Some(m) = undone.pop() {
            self.push(m);
        }

        if !repeated {
            warn!(
                hash = format_args!("{:#018x}", hash),
                "fivefold repetition count not confirmed by move replay"
            );
        }
        repeated
    }

    /// Returns true if the game has ended without a claim.
    pub fn is_game_over(&mut self) -> bool {
        self.is_seventyfive_moves()
            || self.is_insufficient_material()
            || !self.has_legal_moves()
            || self.is_fivefold_repetition()
    }

    /// Returns the result if the game has ended without a claim.
    ///
    /// Checked in order: checkmate, stalemate, insufficient material, the
    /// 75-move rule, fivefold repetition.
    pub fn game_result(&mut self) -> Option<GameResult> {
        if !self.has_legal_moves() {
            if self.is_check() {
                return Some(match self.side_to_move {
                    Color::White => GameResult::BlackWins,
                    Color::Black => GameResult::WhiteWins,
                });
            }
            return Some(GameResult::Draw(DrawReason::Stalemate));
        }
        if self.is_insufficient_material() {
            return Some(GameResult::Draw(DrawReason::InsufficientMaterial));
        }
        if self.halfmove_clock >= SEVENTY_FIVE_MOVE_PLIES {
            return Some(GameResult::Draw(DrawReason::SeventyFiveMoveRule));
        }
        if self.is_fivefold_repetition() {
            return Some(GameResult::Draw(DrawReason::FivefoldRepetition));
        }
        None
    }

    /// Returns the claimable draw available to the side to move, if any.
    pub fn claimable_draw(&mut self) -> Option<DrawReason> {
        if self.can_claim_fifty_moves() {
            Some(DrawReason::FiftyMoveRule)
        } else if self.can_claim_threefold_repetition() {
            Some(DrawReason::ThreefoldRepetition)
        } else {
            None
        }
    }
}

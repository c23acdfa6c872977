//! FEN (Forsyth-Edwards Notation) parsing and serialization.

use crate::{Color, Piece, Square};
use thiserror::Error;

/// Errors that can occur when parsing FEN strings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FenError {
    #[error("invalid FEN: expected 6 parts, got {0}")]
    InvalidPartCount(usize),

    #[error("invalid piece placement: {0}")]
    InvalidPiecePlacement(String),

    #[error("invalid active color: expected 'w' or 'b', got '{0}'")]
    InvalidActiveColor(String),

    #[error("invalid castling rights: {0}")]
    InvalidCastlingRights(String),

    #[error("invalid en passant square: {0}")]
    InvalidEnPassantSquare(String),

    #[error("invalid halfmove clock: {0}")]
    InvalidHalfmoveClock(String),

    #[error("invalid fullmove number: {0}")]
    InvalidFullmoveNumber(String),
}

/// A fully validated FEN record.
///
/// Parsing checks every field before anything is built from it, so a
/// caller can load the record into a position without any further
/// failure path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenParser {
    /// Occupant of each square, indexed a1 = 0 .. h8 = 63.
    pub board: [Option<(Piece, Color)>; 64],
    /// Side to move.
    pub side_to_move: Color,
    /// Castling availability as given (`-` or an ordered subset of `KQkq`).
    pub castling: String,
    /// En passant target square.
    pub en_passant: Option<Square>,
    /// Halfmove clock (for the 50-move rule).
    pub halfmove_clock: u32,
    /// Fullmove number, never zero.
    pub fullmove_number: u32,
}

impl FenParser {
    /// The standard starting position FEN.
    pub const STARTPOS: &'static str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    /// Parses a FEN string.
    pub fn parse(fen: &str) -> Result<Self, FenError> {
        let parts: Vec<&str> = fen.split_whitespace().collect();

        if parts.len() != 6 {
            return Err(FenError::InvalidPartCount(parts.len()));
        }

        let board = Self::parse_piece_placement(parts[0])?;

        let side_to_move = match parts[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::InvalidActiveColor(other.to_string())),
        };

        Self::validate_castling(parts[2])?;
        let en_passant = Self::parse_en_passant(parts[3], side_to_move)?;

        let halfmove_clock = parts[4]
            .parse::<u32>()
            .map_err(|_| FenError::InvalidHalfmoveClock(parts[4].to_string()))?;

        // A fullmove number of 0 shows up in the wild; treat it as 1.
        let fullmove_number = parts[5]
            .parse::<u32>()
            .map_err(|_| FenError::InvalidFullmoveNumber(parts[5].to_string()))?
            .max(1);

        Ok(FenParser {
            board,
            side_to_move,
            castling: parts[2].to_string(),
            en_passant,
            halfmove_clock,
            fullmove_number,
        })
    }

    fn parse_piece_placement(placement: &str) -> Result<[Option<(Piece, Color)>; 64], FenError> {
        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::InvalidPiecePlacement(format!(
                "expected 8 ranks, got {}",
                ranks.len()
            )));
        }

        let mut board = [None; 64];
        for (i, rank) in ranks.iter().enumerate() {
            let rank_index = 7 - i;
            let mut file = 0usize;
            let mut previous_was_digit = false;
            for c in rank.chars() {
                if let Some(run) = c.to_digit(10) {
                    if previous_was_digit {
                        return Err(FenError::InvalidPiecePlacement(format!(
                            "consecutive digits in rank {}",
                            rank_index + 1
                        )));
                    }
                    if run == 0 || run > 8 {
                        return Err(FenError::InvalidPiecePlacement(format!(
                            "invalid run length '{}' in rank {}",
                            c,
                            rank_index + 1
                        )));
                    }
                    file += run as usize;
                    previous_was_digit = true;
                } else if let Some(piece) = Piece::from_fen_char(c) {
                    if file < 8 {
                        board[rank_index * 8 + file] = Some(piece);
                    }
                    file += 1;
                    previous_was_digit = false;
                } else {
                    return Err(FenError::InvalidPiecePlacement(format!(
                        "invalid character '{}' in rank {}",
                        c,
                        rank_index + 1
                    )));
                }
                if file > 8 {
                    break;
                }
            }
            if file != 8 {
                return Err(FenError::InvalidPiecePlacement(format!(
                    "rank {} has {} squares, expected 8",
                    rank_index + 1,
                    file
                )));
            }
        }

        Ok(board)
    }

    fn validate_castling(castling: &str) -> Result<(), FenError> {
        if castling == "-" {
            return Ok(());
        }

        // Each of K, Q, k, q at most once and in that order.
        let mut expected = "KQkq".chars();
        for c in castling.chars() {
            if !expected.by_ref().any(|e| e == c) {
                return Err(FenError::InvalidCastlingRights(castling.to_string()));
            }
        }
        if castling.is_empty() {
            return Err(FenError::InvalidCastlingRights(castling.to_string()));
        }

        Ok(())
    }

    fn parse_en_passant(ep: &str, side_to_move: Color) -> Result<Option<Square>, FenError> {
        if ep == "-" {
            return Ok(None);
        }

        let square =
            Square::from_algebraic(ep).ok_or_else(|| FenError::InvalidEnPassantSquare(ep.to_string()))?;

        // The target sits behind the pawn that just made a double push.
        let expected_rank = match side_to_move {
            Color::White => 5,
            Color::Black => 2,
        };
        if square.rank_index() != expected_rank {
            return Err(FenError::InvalidEnPassantSquare(ep.to_string()));
        }

        Ok(Some(square))
    }

    /// Returns the piece placement field.
    pub fn placement(&self) -> String {
        let mut out = String::with_capacity(72);
        for rank in (0..8).rev() {
            let mut empty = 0;
            for file in 0..8 {
                match self.board[rank * 8 + file] {
                    Some((piece, color)) => {
                        if empty > 0 {
                            out.push(char::from(b'0' + empty));
                            empty = 0;
                        }
                        out.push(piece.to_fen_char(color));
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                out.push(char::from(b'0' + empty));
            }
            if rank > 0 {
                out.push('/');
            }
        }
        out
    }

    /// Converts the parsed FEN back to a FEN string.
    pub fn to_fen(&self) -> String {
        format!(
            "{} {} {} {} {} {}",
            self.placement(),
            self.side_to_move.to_fen_char(),
            self.castling,
            self.en_passant.map_or("-", Square::name),
            self.halfmove_clock,
            self.fullmove_number
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_startpos() {
        let fen = FenParser::parse(FenParser::STARTPOS).unwrap();
        assert_eq!(fen.side_to_move, Color::White);
        assert_eq!(fen.castling, "KQkq");
        assert_eq!(fen.en_passant, None);
        assert_eq!(fen.halfmove_clock, 0);
        assert_eq!(fen.fullmove_number, 1);
        assert_eq!(fen.board[Square::E1.index() as usize], Some((Piece::King, Color::White)));
        assert_eq!(fen.board[Square::D8.index() as usize], Some((Piece::Queen, Color::Black)));
        assert_eq!(fen.board[28], None);
    }

    #[test]
    fn parse_custom_position() {
        let fen =
            FenParser::parse("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3")
                .unwrap();
        assert_eq!(fen.side_to_move, Color::White);
        assert_eq!(fen.halfmove_clock, 2);
        assert_eq!(fen.fullmove_number, 3);
    }

    #[test]
    fn roundtrip() {
        let original = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
        let parsed = FenParser::parse(original).unwrap();
        assert_eq!(parsed.to_fen(), original);
    }

    #[test]
    fn invalid_fen() {
        assert!(matches!(
            FenParser::parse("invalid"),
            Err(FenError::InvalidPartCount(_))
        ));

        assert!(matches!(
            FenParser::parse("8/8/8/8/8/8/8/8 x KQkq - 0 1"),
            Err(FenError::InvalidActiveColor(_))
        ));
    }

    #[test]
    fn invalid_piece_placement() {
        // Too few ranks
        assert!(matches!(
            FenParser::parse("8/8/8/8/8/8/8 w KQkq - 0 1"),
            Err(FenError::InvalidPiecePlacement(_))
        ));
        // Invalid character
        assert!(matches!(
            FenParser::parse("rnbqkbnr/pppppppp/8/8/8/8/PPPPXPPP/RNBQKBNR w KQkq - 0 1"),
            Err(FenError::InvalidPiecePlacement(_))
        ));
        // Nine squares
        assert!(matches!(
            FenParser::parse("rnbqkbnrr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
            Err(FenError::InvalidPiecePlacement(_))
        ));
        // Seven squares
        assert!(matches!(
            FenParser::parse("rnbqkbn/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
            Err(FenError::InvalidPiecePlacement(_))
        ));
    }

    #[test]
    fn consecutive_digits_rejected() {
        assert!(matches!(
            FenParser::parse("8/8/8/8/44/8/8/8 w - - 0 1"),
            Err(FenError::InvalidPiecePlacement(_))
        ));
        assert!(matches!(
            FenParser::parse("8/8/8/8/8/8/8/08 w - - 0 1"),
            Err(FenError::InvalidPiecePlacement(_))
        ));
    }

    #[test]
    fn castling_syntax() {
        for ok in ["-", "K", "Kq", "KQkq", "Qk", "kq"] {
            let fen = format!("8/8/8/8/8/8/8/8 w {} - 0 1", ok);
            assert!(FenParser::parse(&fen).is_ok(), "{}", ok);
        }
        for bad in ["XYZ", "qk", "KK", "QK", "KQkq-", "--"] {
            let fen = format!("8/8/8/8/8/8/8/8 w {} - 0 1", bad);
            assert!(
                matches!(FenParser::parse(&fen), Err(FenError::InvalidCastlingRights(_))),
                "{}",
                bad
            );
        }
    }

    #[test]
    fn en_passant_rank_depends_on_turn() {
        assert!(FenParser::parse("8/8/8/8/8/8/8/8 w - d6 0 1").is_ok());
        assert!(FenParser::parse("8/8/8/8/8/8/8/8 b - e3 0 1").is_ok());
        assert!(matches!(
            FenParser::parse("8/8/8/8/8/8/8/8 w - e3 0 1"),
            Err(FenError::InvalidEnPassantSquare(_))
        ));
        assert!(matches!(
            FenParser::parse("8/8/8/8/8/8/8/8 b - d6 0 1"),
            Err(FenError::InvalidEnPassantSquare(_))
        ));
        assert!(matches!(
            FenParser::parse("8/8/8/8/8/8/8/8 w - e4 0 1"),
            Err(FenError::InvalidEnPassantSquare(_))
        ));
        assert!(matches!(
            FenParser::parse("8/8/8/8/8/8/8/8 w - abc 0 1"),
            Err(FenError::InvalidEnPassantSquare(_))
        ));
    }

    #[test]
    fn invalid_clocks() {
        assert!(matches!(
            FenParser::parse("8/8/8/8/8/8/8/8 w - - abc 1"),
            Err(FenError::InvalidHalfmoveClock(_))
        ));
        assert!(matches!(
            FenParser::parse("8/8/8/8/8/8/8/8 w - - -1 1"),
            Err(FenError::InvalidHalfmoveClock(_))
        ));
        assert!(matches!(
            FenParser::parse("8/8/8/8/8/8/8/8 w - - 0 xyz"),
            Err(FenError::InvalidFullmoveNumber(_))
        ));
    }

    #[test]
    fn fullmove_zero_becomes_one() {
        let fen = FenParser::parse("8/8/8/8/8/8/8/8 w - - 0 0").unwrap();
        assert_eq!(fen.fullmove_number, 1);
    }

    #[test]
    fn fen_error_display() {
        let err = FenError::InvalidPartCount(3);
        assert!(format!("{}", err).contains("3"));

        let err = FenError::InvalidCastlingRights("XYZ".to_string());
        assert!(format!("{}", err).contains("XYZ"));

        let err = FenError::InvalidEnPassantSquare("z9".to_string());
        assert!(format!("{}", err).contains("z9"));
    }

    fn arb_board() -> impl Strategy<Value = [Option<(Piece, Color)>; 64]> {
        let occupant = prop::option::of((0usize..6, any::<bool>()).prop_map(|(kind, white)| {
            let color = if white { Color::White } else { Color::Black };
            (Piece::ALL[kind], color)
        }));
        prop::collection::vec(occupant, 64).prop_map(|squares| {
            let mut board = [None; 64];
            board.copy_from_slice(&squares);
            board
        })
    }

    proptest! {
        #[test]
        fn rendered_records_parse_back(board in arb_board(), white in any::<bool>(), halfmove in 0u32..200) {
            let record = FenParser {
                board,
                side_to_move: if white { Color::White } else { Color::Black },
                castling: "-".to_string(),
                en_passant: None,
                halfmove_clock: halfmove,
                fullmove_number: 1 + halfmove / 2,
            };
            prop_assert_eq!(FenParser::parse(&record.to_fen()), Ok(record));
        }

        #[test]
        fn parse_never_panics(fen in "\\PC*") {
            let _ = FenParser::parse(&fen);
        }
    }
}

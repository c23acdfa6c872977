//! EPD (Extended Position Description) parsing and rendering.
//!
//! An EPD record is the first four FEN fields followed by operations of
//! the form `opcode [operand];`. Operands are quoted strings, integers,
//! floats or a single move in SAN. The `hmvc` and `fmvn` operations set
//! the halfmove clock and fullmove number.

use chess_core::{FenError, FenParser, Move};
use thiserror::Error;
use tracing::{debug, trace};

use crate::san::SanError;
use crate::Position;

/// Errors that can occur when parsing EPD strings.
#[derive(Debug, Error, PartialEq)]
pub enum EpdError {
    #[error("EPD needs at least 4 fields: {0}")]
    TooFewFields(String),

    #[error("malformed EPD operation: {0}")]
    MalformedOperation(String),

    #[error("unterminated string operand for opcode {0}")]
    UnterminatedString(String),

    #[error(transparent)]
    Fen(#[from] FenError),

    #[error("invalid move operand for opcode {opcode}: {source}")]
    InvalidMove {
        opcode: String,
        #[source]
        source: SanError,
    },
}

/// Operand of an EPD operation.
#[derive(Debug, Clone, PartialEq)]
pub enum EpdOperand {
    Empty,
    String(String),
    Integer(i64),
    Float(f64),
    Move(Move),
}

/// One `opcode operand;` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct EpdOperation {
    pub opcode: String,
    pub operand: EpdOperand,
}

impl EpdOperation {
    pub fn new(opcode: impl Into<String>, operand: EpdOperand) -> Self {
        EpdOperation {
            opcode: opcode.into(),
            operand,
        }
    }
}

/// An operand as written, before numbers and moves are told apart.
enum RawOperand<'a> {
    Empty,
    Quoted(String),
    Bare(&'a str),
}

/// Splits off the next whitespace-delimited field.
fn next_field(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    let end = s.find(char::is_whitespace).unwrap_or(s.len());
    Some((&s[..end], &s[end..]))
}

/// Splits the operation list into opcodes and raw operands.
fn split_operations(mut rest: &str) -> Result<Vec<(&str, RawOperand<'_>)>, EpdError> {
    let mut operations = Vec::new();

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            return Ok(operations);
        }

        let opcode_end = rest
            .find(|c: char| c.is_whitespace() || c == ';')
            .unwrap_or(rest.len());
        let opcode = &rest[..opcode_end];
        if opcode.is_empty() || opcode.starts_with('"') {
            return Err(EpdError::MalformedOperation(rest.to_string()));
        }
        rest = rest[opcode_end..].trim_start();

        let operand = if rest.is_empty() || rest.starts_with(';') {
            RawOperand::Empty
        } else if let Some(quoted) = rest.strip_prefix('"') {
            let (text, consumed) = unescape(quoted)
                .ok_or_else(|| EpdError::UnterminatedString(opcode.to_string()))?;
            rest = &quoted[consumed..];
            RawOperand::Quoted(text)
        } else {
            let end = rest
                .find(|c: char| c.is_whitespace() || c == ';')
                .unwrap_or(rest.len());
            let bare = &rest[..end];
            rest = &rest[end..];
            RawOperand::Bare(bare)
        };

        rest = rest.trim_start();
        if let Some(tail) = rest.strip_prefix(';') {
            rest = tail;
        } else if !rest.is_empty() {
            return Err(EpdError::MalformedOperation(format!(
                "{opcode} takes a single operand"
            )));
        }

        operations.push((opcode, operand));
    }
}

/// Parses a numeric float operand.
///
/// Spelled-out values such as `inf` or `NaN` are not numbers here.
fn parse_float(text: &str) -> Option<f64> {
    let numeric = text
        .starts_with(|c: char| c.is_ascii_digit() || matches!(c, '+' | '-' | '.'));
    if !numeric {
        return None;
    }
    text.parse::<f64>().ok().filter(|x| x.is_finite())
}

/// Reads a quoted string body up to the closing quote.
///
/// Returns the text and the number of bytes consumed, closing quote
/// included, or `None` if the quote is never closed.
fn unescape(s: &str) -> Option<(String, usize)> {
    let mut text = String::new();
    let mut chars = s.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Some((text, i + 1)),
            '\\' => match chars.next()?.1 {
                's' => text.push(';'),
                other => text.push(other),
            },
            _ => text.push(c),
        }
    }
    None
}

fn escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            ';' => escaped.push_str("\\s"),
            '\n' => escaped.push(' '),
            '\r' => {}
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Returns the clock text for an `hmvc` or `fmvn` operation.
fn clock_text(operations: &[EpdOperation], opcode: &str, default: &str) -> Result<String, EpdError> {
    match operations.iter().rev().find(|op| op.opcode == opcode) {
        None => Ok(default.to_string()),
        Some(EpdOperation {
            operand: EpdOperand::Integer(n),
            ..
        }) => Ok(n.to_string()),
        Some(_) => Err(EpdError::MalformedOperation(format!(
            "{opcode} needs an integer operand"
        ))),
    }
}

impl Position {
    /// Creates a position from an EPD string, returning its operations.
    pub fn from_epd(epd: &str) -> Result<(Self, Vec<EpdOperation>), EpdError> {
        let mut position = Self::empty();
        let operations = position.set_epd(epd)?;
        Ok((position, operations))
    }

    /// Replaces the position with the one described by `epd` and returns
    /// the parsed operations in order.
    ///
    /// The whole record is validated first; on error the position is left
    /// untouched.
    pub fn set_epd(&mut self, epd: &str) -> Result<Vec<EpdOperation>, EpdError> {
        Self::parse_epd(epd)
            .map(|(parsed, operations)| {
                trace!(epd, "loading EPD");
                self.load(&parsed);
                operations
            })
            .map_err(|err| {
                debug!(epd, %err, "rejected EPD");
                err
            })
    }

    fn parse_epd(epd: &str) -> Result<(FenParser, Vec<EpdOperation>), EpdError> {
        let mut fields = Vec::with_capacity(4);
        let mut rest = epd.trim();
        while fields.len() < 4 {
            let (field, tail) =
                next_field(rest).ok_or_else(|| EpdError::TooFewFields(epd.to_string()))?;
            fields.push(field);
            rest = tail;
        }
        let board = fields.join(" ");

        // Move operands are read against the bare board with default clocks.
        let bare = FenParser::parse(&format!("{board} 0 1"))?;
        let mut scratch: Option<Position> = None;

        let mut operations = Vec::new();
        for (opcode, raw) in split_operations(rest)? {
            let operand = match raw {
                RawOperand::Empty => EpdOperand::Empty,
                RawOperand::Quoted(text) => EpdOperand::String(text),
                RawOperand::Bare(text) => {
                    if let Ok(n) = text.parse::<i64>() {
                        EpdOperand::Integer(n)
                    } else if let Some(x) = parse_float(text) {
                        EpdOperand::Float(x)
                    } else {
                        let position = scratch.get_or_insert_with(|| {
                            let mut position = Position::empty();
                            position.load(&bare);
                            position
                        });
                        let m = position.parse_san(text).map_err(|source| EpdError::InvalidMove {
                            opcode: opcode.to_string(),
                            source,
                        })?;
                        EpdOperand::Move(m)
                    }
                }
            };
            operations.push(EpdOperation::new(opcode, operand));
        }

        let halfmove = clock_text(&operations, "hmvc", "0")?;
        let fullmove = clock_text(&operations, "fmvn", "1")?;
        let parsed = FenParser::parse(&format!("{board} {halfmove} {fullmove}"))?;
        Ok((parsed, operations))
    }

    /// Renders the position as EPD with the given operations appended.
    ///
    /// Clocks are only included when passed as `hmvc`/`fmvn` operations.
    /// Move operands are rendered in SAN against this position.
    pub fn epd(&mut self, operations: &[EpdOperation]) -> String {
        let mut epd = self.epd_fields();
        for op in operations {
            epd.push(' ');
            epd.push_str(&op.opcode);
            match &op.operand {
                EpdOperand::Empty => {}
                EpdOperand::String(text) => {
                    epd.push_str(" \"");
                    epd.push_str(&escape(text));
                    epd.push('"');
                }
                EpdOperand::Integer(n) => epd.push_str(&format!(" {n}")),
                EpdOperand::Float(x) => epd.push_str(&format!(" {x:?}")),
                EpdOperand::Move(m) => {
                    let san = self.san(*m);
                    epd.push(' ');
                    epd.push_str(&san);
                }
            }
            epd.push(';');
        }
        epd
    }
}

//! Error types for binary (sfnt) and text (AFM) font parsing.

use std::{error, fmt, ops};

use crate::font::TableTag;

/// Kind of a font [`ParseError`].
#[derive(Debug)]
#[non_exhaustive]
pub enum ParseErrorKind {
    /// Unexpected end of the font data.
    UnexpectedEof,
    /// Unexpected font version.
    UnexpectedFontVersion,
    /// Missing required font table (e.g., `head`).
    MissingTable,
    /// Offset inferred from the table data is out of bounds.
    OffsetOutOfBounds(usize),
    /// Range inferred from the table data is out of bounds.
    RangeOutOfBounds {
        /// Inferred range.
        range: ops::Range<usize>,
        /// Length of the indexed data.
        len: usize,
    },
    /// Unexpected table version.
    UnexpectedTableVersion(u32),
    /// Unexpected table length.
    UnexpectedTableLen {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },
    /// Unexpected table format (e.g., for a `cmap` subtable).
    UnexpectedTableFormat(u16),
    /// The operation requires a glyph-based (sfnt) font program.
    UnsupportedFontProgram,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof => formatter.write_str("unexpected end of the font data"),
            Self::UnexpectedFontVersion => formatter.write_str("unexpected font version"),
            Self::MissingTable => formatter.write_str("missing required font table"),
            Self::OffsetOutOfBounds(val) => {
                write!(
                    formatter,
                    "offset ({val}) inferred from the table data is out of bounds"
                )
            }
            Self::RangeOutOfBounds { range, len } => {
                write!(
                    formatter,
                    "range ({range:?}) inferred from the table data is out of bounds (..{len})"
                )
            }
            Self::UnexpectedTableVersion(val) => {
                write!(formatter, "unexpected table version ({val})")
            }
            Self::UnexpectedTableLen { expected, actual } => {
                write!(
                    formatter,
                    "unexpected table length: expected {expected}, got {actual}"
                )
            }
            Self::UnexpectedTableFormat(val) => {
                write!(formatter, "unexpected table format ({val})")
            }
            Self::UnsupportedFontProgram => {
                formatter.write_str("operation requires a glyph-based font program")
            }
        }
    }
}

impl error::Error for ParseErrorKind {}

/// Errors that can occur when parsing an sfnt font or rebuilding its tables.
#[derive(Debug)]
pub struct ParseError {
    pub(crate) kind: ParseErrorKind,
    pub(crate) offset: usize,
    pub(crate) table: Option<TableTag>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(table) = self.table {
            write!(formatter, "[{table}] ")?;
        }
        if self.offset > 0 {
            write!(formatter, "{}: ", self.offset)?;
        }
        fmt::Display::fmt(&self.kind, formatter)
    }
}

impl error::Error for ParseError {}

impl ParseError {
    pub(crate) fn missing_table(tag: TableTag) -> Self {
        Self {
            kind: ParseErrorKind::MissingTable,
            offset: 0,
            table: Some(tag),
        }
    }

    /// Gets the error kind.
    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }

    /// Gets the table this error relates to.
    pub fn table(&self) -> Option<TableTag> {
        self.table
    }

    /// Gets the offset in the font data.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// Kind of an [`AfmError`].
#[derive(Debug)]
#[non_exhaustive]
pub enum AfmErrorKind {
    /// The metrics do not start with a `StartFontMetrics` marker.
    MissingStartMarker,
    /// The metrics end without an `EndFontMetrics` marker.
    MissingEndMarker,
    /// A keyword requires a value that is absent.
    MissingValue(&'static str),
    /// A numeric value could not be parsed.
    InvalidNumber(String),
}

impl fmt::Display for AfmErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingStartMarker => formatter.write_str("missing `StartFontMetrics` marker"),
            Self::MissingEndMarker => formatter.write_str("missing `EndFontMetrics` marker"),
            Self::MissingValue(keyword) => {
                write!(formatter, "missing value for `{keyword}`")
            }
            Self::InvalidNumber(token) => write!(formatter, "invalid numeric value `{token}`"),
        }
    }
}

impl error::Error for AfmErrorKind {}

/// Errors that can occur when parsing Adobe Font Metrics.
#[derive(Debug)]
pub struct AfmError {
    pub(crate) kind: AfmErrorKind,
    pub(crate) line: usize,
}

impl fmt::Display for AfmError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "line {}: {}", self.line, self.kind)
    }
}

impl error::Error for AfmError {}

impl AfmError {
    /// Gets the error kind.
    pub fn kind(&self) -> &AfmErrorKind {
        &self.kind
    }

    /// Gets the 1-based line number the error relates to.
    pub fn line(&self) -> usize {
        self.line
    }
}

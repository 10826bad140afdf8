//! Positioned big-endian reads over a bounded byte range.

use crate::{
    errors::{ParseError, ParseErrorKind},
    font::TableTag,
};

/// Bounded cursor over table bytes. All multi-byte reads are big-endian, and any
/// read past the end of the range fails with [`ParseErrorKind::UnexpectedEof`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct TableReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    table: Option<TableTag>,
}

impl<'a> TableReader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            table: None,
        }
    }

    pub(crate) fn for_table(bytes: &'a [u8], table: TableTag) -> Self {
        Self {
            bytes,
            pos: 0,
            table: Some(table),
        }
    }

    pub(crate) fn err(&self, kind: ParseErrorKind) -> ParseError {
        ParseError {
            kind,
            offset: self.pos,
            table: self.table,
        }
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Repositions the cursor. Seeking past the end is allowed; the next read fails.
    pub(crate) fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub(crate) fn skip(&mut self, count: usize) -> Result<(), ParseError> {
        if self.bytes.len() - self.pos.min(self.bytes.len()) < count {
            return Err(self.err(ParseErrorKind::UnexpectedEof));
        }
        self.pos += count;
        Ok(())
    }

    pub(crate) fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], ParseError> {
        let end = self
            .pos
            .checked_add(count)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| self.err(ParseErrorKind::UnexpectedEof))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub(crate) fn read_byte_array<const N: usize>(&mut self) -> Result<[u8; N], ParseError> {
        let bytes = self.read_bytes(N)?;
        Ok(bytes.try_into().unwrap())
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, ParseError> {
        Ok(self.read_byte_array::<1>()?[0])
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16, ParseError> {
        Ok(u16::from_be_bytes(self.read_byte_array()?))
    }

    pub(crate) fn read_i16(&mut self) -> Result<i16, ParseError> {
        Ok(i16::from_be_bytes(self.read_byte_array()?))
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32, ParseError> {
        Ok(u32::from_be_bytes(self.read_byte_array()?))
    }

    /// Reads a 16.16 fixed-point value the way the original metrics code did:
    /// the signed high word is the integer part, and the low word is divided
    /// by 10 until it drops below 1 (rather than by 65536).
    pub(crate) fn read_fixed(&mut self) -> Result<f32, ParseError> {
        let integer = self.read_i16()?;
        let mut fraction = f64::from(self.read_u16()?);
        while fraction >= 1.0 {
            fraction /= 10.0;
        }
        let value = if integer < 0 {
            f64::from(integer) - fraction
        } else {
            f64::from(integer) + fraction
        };
        #[allow(clippy::cast_possible_truncation)] // the value fits into f32 by construction
        Ok(value as f32)
    }
}

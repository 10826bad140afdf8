//! sfnt container structures: table tags, the table directory and its entries.

use std::{cell::Cell, fmt, ops::Range};

pub use self::{
    cmap::{CmapSubtable, CmapTable, GlyphMapping},
    tables::{
        FontHeader, GlyphMetricsTable, HorizontalHeader, LocaFormat, LocationTable, MetricsTable,
        NameRecord, NameTable, PostScriptInfo,
    },
};
pub(crate) use self::glyph::component_indices;
use crate::{
    errors::{ParseError, ParseErrorKind},
    reader::TableReader,
};

mod cmap;
mod glyph;
mod tables;

/// 4-byte tag identifying an sfnt table.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableTag(pub [u8; 4]);

impl TableTag {
    /// Character-to-glyph mapping table.
    pub const CMAP: Self = Self(*b"cmap");
    /// Control value table (hinting).
    pub const CVT: Self = Self(*b"cvt ");
    /// Font program (hinting).
    pub const FPGM: Self = Self(*b"fpgm");
    /// Glyph outline data.
    pub const GLYF: Self = Self(*b"glyf");
    /// Font header.
    pub const HEAD: Self = Self(*b"head");
    /// Horizontal header.
    pub const HHEA: Self = Self(*b"hhea");
    /// Horizontal glyph metrics.
    pub const HMTX: Self = Self(*b"hmtx");
    /// Glyph location offsets.
    pub const LOCA: Self = Self(*b"loca");
    /// Maximum profile.
    pub const MAXP: Self = Self(*b"maxp");
    /// Naming table.
    pub const NAME: Self = Self(*b"name");
    /// OS/2 and Windows metrics.
    pub const OS2: Self = Self(*b"OS/2");
    /// PostScript information.
    pub const POST: Self = Self(*b"post");
    /// Control value program (hinting).
    pub const PREP: Self = Self(*b"prep");
}

impl fmt::Display for TableTag {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &byte in &self.0 {
            let ch = if byte.is_ascii_graphic() || byte == b' ' {
                char::from(byte)
            } else {
                char::REPLACEMENT_CHARACTER
            };
            write!(formatter, "{ch}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for TableTag {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "TableTag({self})")
    }
}

/// Computes an sfnt table checksum: the sum of big-endian u32 words, with the
/// trailing partial word zero-padded.
pub(crate) fn table_checksum(bytes: &[u8]) -> u32 {
    let mut sum = 0_u32;
    let mut chunks = bytes.chunks_exact(4);
    for chunk in chunks.by_ref() {
        sum = sum.wrapping_add(u32::from_be_bytes(chunk.try_into().unwrap()));
    }
    let remainder = chunks.remainder();
    if !remainder.is_empty() {
        let mut last = [0_u8; 4];
        last[..remainder.len()].copy_from_slice(remainder);
        sum = sum.wrapping_add(u32::from_be_bytes(last));
    }
    sum
}

/// Backing bytes of a table: either a range view into the font source, or an
/// in-memory override produced by table rebuilding.
#[derive(Debug, Clone)]
enum TableData {
    View(Range<usize>),
    Owned(Vec<u8>),
}

/// Entry of a [`TableDirectory`].
#[derive(Debug, Clone)]
pub struct TableEntry {
    tag: TableTag,
    stored_checksum: u32,
    checksum: Cell<Option<u32>>,
    data: TableData,
}

impl TableEntry {
    pub(crate) fn owned(tag: TableTag, bytes: Vec<u8>) -> Self {
        Self {
            tag,
            stored_checksum: 0,
            checksum: Cell::new(None),
            data: TableData::Owned(bytes),
        }
    }

    /// Gets the table tag.
    pub fn tag(&self) -> TableTag {
        self.tag
    }

    /// Gets the checksum recorded in the table directory of the source font.
    pub fn stored_checksum(&self) -> u32 {
        self.stored_checksum
    }

    /// Gets the byte length of the table.
    pub fn len(&self) -> usize {
        match &self.data {
            TableData::View(range) => range.len(),
            TableData::Owned(bytes) => bytes.len(),
        }
    }

    /// Checks whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn bytes<'a>(&'a self, source: &'a [u8]) -> &'a [u8] {
        match &self.data {
            TableData::View(range) => &source[range.clone()],
            TableData::Owned(bytes) => bytes,
        }
    }

    /// Computes the table checksum, caching the result. The cache is invalidated
    /// when the table bytes are overridden.
    pub(crate) fn checksum(&self, source: &[u8]) -> u32 {
        if let Some(checksum) = self.checksum.get() {
            return checksum;
        }
        let checksum = table_checksum(self.bytes(source));
        self.checksum.set(Some(checksum));
        checksum
    }

    pub(crate) fn override_bytes(&mut self, bytes: Vec<u8>) {
        self.data = TableData::Owned(bytes);
        self.checksum.set(None);
    }
}

/// Parsed sfnt table directory: the font header plus one [`TableEntry`] per table.
#[derive(Debug, Clone, Default)]
pub struct TableDirectory {
    entries: Vec<TableEntry>,
}

impl TableDirectory {
    pub(crate) const SFNT_VERSION: u32 = 0x_0001_0000;
    pub(crate) const SFNT_CHECKSUM: u32 = 0x_b1b0_afba;
    pub(crate) const HEAD_CHECKSUM_OFFSET: usize = 8;

    /// Parses the directory from complete font bytes.
    pub fn parse(source: &[u8]) -> Result<Self, ParseError> {
        let mut reader = TableReader::new(source);
        let version = reader.read_u32()?;
        if version != Self::SFNT_VERSION {
            return Err(reader.err(ParseErrorKind::UnexpectedFontVersion));
        }
        let table_count = reader.read_u16()?;
        reader.skip(6)?; // searchRange, entrySelector, rangeShift

        let mut entries = Vec::with_capacity(usize::from(table_count));
        for _ in 0..table_count {
            let tag = TableTag(reader.read_byte_array()?);
            let stored_checksum = reader.read_u32()?;
            let offset = reader.read_u32()? as usize;
            let len = reader.read_u32()? as usize;
            let end = offset.checked_add(len).filter(|&end| end <= source.len());
            let Some(end) = end else {
                return Err(ParseError {
                    kind: ParseErrorKind::RangeOutOfBounds {
                        range: offset..offset.saturating_add(len),
                        len: source.len(),
                    },
                    offset: reader.pos(),
                    table: Some(tag),
                });
            };
            entries.push(TableEntry {
                tag,
                stored_checksum,
                checksum: Cell::new(None),
                data: TableData::View(offset..end),
            });
        }
        Ok(Self { entries })
    }

    pub(crate) fn empty() -> Self {
        Self { entries: vec![] }
    }

    pub(crate) fn push(&mut self, entry: TableEntry) {
        self.entries.push(entry);
    }

    /// Resolves a table entry by tag.
    pub fn get(&self, tag: TableTag) -> Option<&TableEntry> {
        self.entries.iter().find(|entry| entry.tag == tag)
    }

    pub(crate) fn get_mut(&mut self, tag: TableTag) -> Option<&mut TableEntry> {
        self.entries.iter_mut().find(|entry| entry.tag == tag)
    }

    /// Iterates over the directory entries in their original order.
    pub fn entries(&self) -> impl Iterator<Item = &TableEntry> + '_ {
        self.entries.iter()
    }

    /// Gets the number of tables.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks whether the directory contains no tables.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! Decoders for the fixed-layout sfnt tables: `head`, `hhea`, `hmtx`, `loca`,
//! `name`, `OS/2` and `post`.

use super::TableTag;
use crate::{
    errors::{ParseError, ParseErrorKind},
    reader::TableReader,
};

/// Decoded `head` table.
#[derive(Debug, Clone, Copy)]
pub struct FontHeader {
    /// Header flags.
    pub flags: u16,
    /// Em square size in font units.
    pub units_per_em: u16,
    /// Bounding box: `xMin`.
    pub x_min: i16,
    /// Bounding box: `yMin`.
    pub y_min: i16,
    /// Bounding box: `xMax`.
    pub x_max: i16,
    /// Bounding box: `yMax`.
    pub y_max: i16,
    /// Macintosh style bits.
    pub mac_style: u16,
    /// Raw `indexToLocFormat` value.
    pub index_to_loc_format: i16,
}

impl FontHeader {
    pub(crate) const EXPECTED_LEN: usize = 54;

    pub(crate) fn parse(bytes: &[u8]) -> Result<Self, ParseError> {
        let mut reader = TableReader::for_table(bytes, TableTag::HEAD);
        if bytes.len() < Self::EXPECTED_LEN {
            return Err(reader.err(ParseErrorKind::UnexpectedTableLen {
                expected: Self::EXPECTED_LEN,
                actual: bytes.len(),
            }));
        }
        let version = reader.read_u32()?;
        if version != 0x_0001_0000 {
            return Err(reader.err(ParseErrorKind::UnexpectedTableVersion(version)));
        }
        reader.skip(12)?; // fontRevision, checkSumAdjustment, magicNumber
        let flags = reader.read_u16()?;
        let units_per_em = reader.read_u16()?;
        reader.skip(16)?; // created, modified
        let x_min = reader.read_i16()?;
        let y_min = reader.read_i16()?;
        let x_max = reader.read_i16()?;
        let y_max = reader.read_i16()?;
        let mac_style = reader.read_u16()?;
        reader.skip(4)?; // lowestRecPPEM, fontDirectionHint
        let index_to_loc_format = reader.read_i16()?;

        Ok(Self {
            flags,
            units_per_em,
            x_min,
            y_min,
            x_max,
            y_max,
            mac_style,
            index_to_loc_format,
        })
    }

    /// Gets the offset format of the `loca` table.
    pub fn loca_format(&self) -> LocaFormat {
        if self.index_to_loc_format == 0 {
            LocaFormat::Short
        } else {
            LocaFormat::Long
        }
    }
}

/// Decoded `hhea` table.
#[derive(Debug, Clone, Copy)]
pub struct HorizontalHeader {
    /// Typographic ascender.
    pub ascender: i16,
    /// Typographic descender.
    pub descender: i16,
    /// Typographic line gap.
    pub line_gap: i16,
    /// Maximum advance width among all glyphs.
    pub advance_width_max: u16,
    /// Minimum left side bearing.
    pub min_left_side_bearing: i16,
    /// Minimum right side bearing.
    pub min_right_side_bearing: i16,
    /// Maximum glyph extent.
    pub x_max_extent: i16,
    /// Number of entries in the `hmtx` metrics array.
    pub number_of_h_metrics: u16,
}

impl HorizontalHeader {
    pub(crate) const EXPECTED_LEN: usize = 36;

    pub(crate) fn parse(bytes: &[u8]) -> Result<Self, ParseError> {
        let mut reader = TableReader::for_table(bytes, TableTag::HHEA);
        if bytes.len() < Self::EXPECTED_LEN {
            return Err(reader.err(ParseErrorKind::UnexpectedTableLen {
                expected: Self::EXPECTED_LEN,
                actual: bytes.len(),
            }));
        }
        reader.skip(4)?; // version
        let ascender = reader.read_i16()?;
        let descender = reader.read_i16()?;
        let line_gap = reader.read_i16()?;
        let advance_width_max = reader.read_u16()?;
        let min_left_side_bearing = reader.read_i16()?;
        let min_right_side_bearing = reader.read_i16()?;
        let x_max_extent = reader.read_i16()?;
        reader.skip(4)?; // caretSlopeRise, caretSlopeRun
        reader.skip(10)?; // caretOffset + 4 reserved shorts
        reader.skip(2)?; // metricDataFormat
        let number_of_h_metrics = reader.read_u16()?;

        Ok(Self {
            ascender,
            descender,
            line_gap,
            advance_width_max,
            min_left_side_bearing,
            min_right_side_bearing,
            x_max_extent,
            number_of_h_metrics,
        })
    }
}

/// Decoded `hmtx` table: per-glyph (advance width, left side bearing) pairs.
#[derive(Debug, Clone)]
pub struct GlyphMetricsTable {
    metrics: Vec<(u16, i16)>,
}

impl GlyphMetricsTable {
    pub(crate) fn parse(bytes: &[u8], number_of_h_metrics: u16) -> Result<Self, ParseError> {
        let mut reader = TableReader::for_table(bytes, TableTag::HMTX);
        let metrics = (0..number_of_h_metrics)
            .map(|_| Ok((reader.read_u16()?, reader.read_i16()?)))
            .collect::<Result<_, ParseError>>()?;
        Ok(Self { metrics })
    }

    /// Gets the advance width of a glyph. Indices past the metrics array reuse
    /// the last recorded advance (the monospace tail rule).
    pub fn advance_width(&self, glyph_idx: u16) -> u16 {
        let idx = usize::from(glyph_idx).min(self.metrics.len().saturating_sub(1));
        self.metrics.get(idx).map_or(0, |&(advance, _)| advance)
    }

    /// Gets the left side bearing of a glyph, if it is covered by the metrics array.
    pub fn left_side_bearing(&self, glyph_idx: u16) -> Option<i16> {
        self.metrics
            .get(usize::from(glyph_idx))
            .map(|&(_, lsb)| lsb)
    }

    /// Gets the number of recorded metrics pairs.
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// Checks whether the table records no metrics.
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

/// Offset format of the `loca` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocaFormat {
    /// Offsets are stored as `u16` halves of the real value.
    Short,
    /// Offsets are stored as raw `u32` values.
    Long,
}

/// Decoded `loca` table: one byte offset into `glyf` per glyph, plus a sentinel.
#[derive(Debug, Clone)]
pub struct LocationTable {
    format: LocaFormat,
    offsets: Vec<u32>,
}

impl LocationTable {
    /// The entry count is determined by the table length alone.
    pub(crate) fn parse(bytes: &[u8], format: LocaFormat) -> Result<Self, ParseError> {
        let mut reader = TableReader::for_table(bytes, TableTag::LOCA);
        let offsets = match format {
            LocaFormat::Short => (0..bytes.len() / 2)
                .map(|_| Ok(u32::from(reader.read_u16()?) << 1))
                .collect::<Result<_, ParseError>>()?,
            LocaFormat::Long => (0..bytes.len() / 4)
                .map(|_| reader.read_u32())
                .collect::<Result<_, ParseError>>()?,
        };
        Ok(Self { format, offsets })
    }

    pub(crate) fn from_offsets(format: LocaFormat, offsets: Vec<u32>) -> Self {
        Self { format, offsets }
    }

    /// Gets the offset format.
    pub fn format(&self) -> LocaFormat {
        self.format
    }

    /// Gets all decoded offsets, including the final sentinel.
    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    /// Gets the number of glyphs covered by the table.
    pub fn glyph_count(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Gets the byte range of a glyph within the `glyf` table.
    pub fn glyph_range(&self, glyph_idx: u16) -> Option<std::ops::Range<usize>> {
        let idx = usize::from(glyph_idx);
        let start = *self.offsets.get(idx)? as usize;
        let end = *self.offsets.get(idx + 1)? as usize;
        Some(start..end)
    }

    /// Encodes the offsets back into table bytes, mirroring the short / long split
    /// (short offsets are written as `offset >> 1`).
    pub fn encode(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(self.offsets.len() * 4);
        match self.format {
            LocaFormat::Short => {
                for &offset in &self.offsets {
                    #[allow(clippy::cast_possible_truncation)] // halved short offsets fit u16
                    buffer.extend_from_slice(&((offset >> 1) as u16).to_be_bytes());
                }
            }
            LocaFormat::Long => {
                for &offset in &self.offsets {
                    buffer.extend_from_slice(&offset.to_be_bytes());
                }
            }
        }
        buffer
    }
}

/// Single record of the `name` table retained after platform filtering.
#[derive(Debug, Clone)]
pub struct NameRecord {
    /// Platform ID.
    pub platform_id: u16,
    /// Platform-specific encoding ID.
    pub encoding_id: u16,
    /// Language ID.
    pub language_id: u16,
    /// Name ID (e.g., 1 = font family).
    pub name_id: u16,
    /// Decoded string value.
    pub value: String,
}

/// Decoded `name` table, filtered to Microsoft-platform / US-English records.
#[derive(Debug, Clone)]
pub struct NameTable {
    records: Vec<NameRecord>,
}

impl NameTable {
    /// Name ID of the font family name.
    pub const FAMILY: u16 = 1;
    /// Name ID of the font subfamily (style) name.
    pub const SUBFAMILY: u16 = 2;
    /// Name ID of the full font name.
    pub const FULL_NAME: u16 = 4;
    /// Name ID of the PostScript name.
    pub const POSTSCRIPT: u16 = 6;

    pub(crate) const MICROSOFT_PLATFORM: u16 = 3;
    pub(crate) const US_ENGLISH: u16 = 0x0409;

    pub(crate) fn parse(bytes: &[u8]) -> Result<Self, ParseError> {
        let mut reader = TableReader::for_table(bytes, TableTag::NAME);
        reader.skip(2)?; // format
        let count = reader.read_u16()?;
        let string_storage = usize::from(reader.read_u16()?);

        let mut records = vec![];
        for _ in 0..count {
            let platform_id = reader.read_u16()?;
            let encoding_id = reader.read_u16()?;
            let language_id = reader.read_u16()?;
            let name_id = reader.read_u16()?;
            let len = usize::from(reader.read_u16()?);
            let offset = usize::from(reader.read_u16()?);
            if platform_id != Self::MICROSOFT_PLATFORM || language_id != Self::US_ENGLISH {
                continue;
            }

            // String bytes live in the storage region addressed from the table start.
            let mut string_reader = reader;
            string_reader.seek(string_storage + offset);
            let string_bytes = string_reader.read_bytes(len)?;
            records.push(NameRecord {
                platform_id,
                encoding_id,
                language_id,
                name_id,
                value: decode_utf16_be(string_bytes),
            });
        }
        Ok(Self { records })
    }

    /// Gets the first retained record with the given name ID.
    pub fn name(&self, name_id: u16) -> Option<&str> {
        self.records
            .iter()
            .find(|record| record.name_id == name_id)
            .map(|record| record.value.as_str())
    }

    /// Gets all retained records.
    pub fn records(&self) -> &[NameRecord] {
        &self.records
    }
}

fn decode_utf16_be(bytes: &[u8]) -> String {
    let units = bytes
        .chunks_exact(2)
        .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]));
    char::decode_utf16(units)
        .map(|result| result.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Decoded `OS/2` table.
#[derive(Debug, Clone, Copy)]
pub struct MetricsTable {
    /// Table version.
    pub version: u16,
    /// Weight class (e.g., 400 = normal, 700 = bold).
    pub weight_class: u16,
    /// Width class.
    pub width_class: u16,
    /// Font selection flags.
    pub fs_selection: u16,
    /// PANOSE classification bytes.
    pub panose: [u8; 10],
    /// Typographic ascender.
    pub typo_ascender: i16,
    /// Typographic descender.
    pub typo_descender: i16,
    /// Typographic line gap.
    pub typo_line_gap: i16,
    /// Windows ascent.
    pub win_ascent: u16,
    /// Windows descent.
    pub win_descent: u16,
    /// x-height (version 2+; zero otherwise).
    pub x_height: i16,
    /// Cap height (version 2+; zero otherwise).
    pub cap_height: i16,
    /// Maximum contextual lookup length (version 2+; zero otherwise).
    pub max_context: u16,
}

impl MetricsTable {
    pub(crate) fn parse(bytes: &[u8]) -> Result<Self, ParseError> {
        let mut reader = TableReader::for_table(bytes, TableTag::OS2);
        let version = reader.read_u16()?;
        reader.skip(2)?; // xAvgCharWidth
        let weight_class = reader.read_u16()?;
        let width_class = reader.read_u16()?;

        reader.seek(32);
        let panose = reader.read_byte_array()?;
        reader.seek(62);
        let fs_selection = reader.read_u16()?;
        reader.seek(68);
        let typo_ascender = reader.read_i16()?;
        let typo_descender = reader.read_i16()?;
        let typo_line_gap = reader.read_i16()?;
        let win_ascent = reader.read_u16()?;
        let win_descent = reader.read_u16()?;

        // Version 2 extended the table through usMaxContext; older fonts stop short.
        let (mut x_height, mut cap_height, mut max_context) = (0, 0, 0);
        if version >= 2 && bytes.len() >= 96 {
            reader.seek(86);
            x_height = reader.read_i16()?;
            cap_height = reader.read_i16()?;
            reader.skip(4)?; // usDefaultChar, usBreakChar
            max_context = reader.read_u16()?;
        }

        Ok(Self {
            version,
            weight_class,
            width_class,
            fs_selection,
            panose,
            typo_ascender,
            typo_descender,
            typo_line_gap,
            win_ascent,
            win_descent,
            x_height,
            cap_height,
            max_context,
        })
    }
}

/// Decoded `post` table header.
#[derive(Debug, Clone, Copy)]
pub struct PostScriptInfo {
    /// Table version.
    pub version: f32,
    /// Italic angle in degrees.
    pub italic_angle: f32,
    /// Underline position.
    pub underline_position: i16,
    /// Underline thickness.
    pub underline_thickness: i16,
}

impl PostScriptInfo {
    pub(crate) fn parse(bytes: &[u8]) -> Result<Self, ParseError> {
        let mut reader = TableReader::for_table(bytes, TableTag::POST);
        let version = reader.read_fixed()?;
        let italic_angle = reader.read_fixed()?;
        let underline_position = reader.read_i16()?;
        let underline_thickness = reader.read_i16()?;
        Ok(Self {
            version,
            italic_angle,
            underline_position,
            underline_thickness,
        })
    }
}

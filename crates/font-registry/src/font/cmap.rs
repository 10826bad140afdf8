//! `cmap` table processing: subtable directory plus format 0 / 4 / 6 decoders.

use std::{cell::OnceCell, collections::HashMap};

use super::TableTag;
use crate::{
    errors::{ParseError, ParseErrorKind},
    reader::TableReader,
};

/// Decoded character-code-to-glyph-index mapping of a single `cmap` subtable.
#[derive(Debug, Clone, Default)]
pub struct GlyphMapping {
    map: HashMap<u32, u16>,
}

impl GlyphMapping {
    /// Gets the glyph index for a character code; 0 (the missing glyph) if unmapped.
    pub fn glyph_id(&self, code: u32) -> u16 {
        self.map.get(&code).copied().unwrap_or(0)
    }

    /// Gets the number of mapped codes.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Checks whether no codes are mapped.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterates over (code, glyph index) pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u16)> + '_ {
        self.map.iter().map(|(&code, &glyph)| (code, glyph))
    }
}

/// Single subtable reference within the `cmap` table. The mapping itself is
/// decoded on first access and cached.
#[derive(Debug, Clone)]
pub struct CmapSubtable {
    platform_id: u16,
    encoding_id: u16,
    offset: u32,
    mapping: OnceCell<GlyphMapping>,
}

impl CmapSubtable {
    /// Gets the platform ID.
    pub fn platform_id(&self) -> u16 {
        self.platform_id
    }

    /// Gets the encoding ID.
    pub fn encoding_id(&self) -> u16 {
        self.encoding_id
    }

    /// Gets the `platform:encoding` key of this subtable.
    pub fn key(&self) -> String {
        format!("{}:{}", self.platform_id, self.encoding_id)
    }

    /// Decodes the code-to-glyph mapping, caching the result. `table_bytes` must
    /// be the complete `cmap` table.
    pub fn mapping(&self, table_bytes: &[u8]) -> Result<&GlyphMapping, ParseError> {
        if let Some(mapping) = self.mapping.get() {
            return Ok(mapping);
        }
        let mapping = Self::decode(table_bytes, self.offset)?;
        Ok(self.mapping.get_or_init(|| mapping))
    }

    fn decode(table_bytes: &[u8], offset: u32) -> Result<GlyphMapping, ParseError> {
        let mut reader = TableReader::for_table(table_bytes, TableTag::CMAP);
        reader.seek(offset as usize);
        let format = reader.read_u16()?;
        let mut map = HashMap::new();
        match format {
            0 => Self::decode_byte_encoding(&mut reader, &mut map)?,
            4 => Self::decode_segment_deltas(&mut reader, &mut map)?,
            6 => Self::decode_trimmed_mapping(&mut reader, &mut map)?,
            _ => return Err(reader.err(ParseErrorKind::UnexpectedTableFormat(format))),
        }
        Ok(GlyphMapping { map })
    }

    /// Format 0: 256 sequential byte codes.
    fn decode_byte_encoding(
        reader: &mut TableReader<'_>,
        map: &mut HashMap<u32, u16>,
    ) -> Result<(), ParseError> {
        reader.skip(4)?; // length, language
        for code in 0..256_u32 {
            let glyph = u16::from(reader.read_u8()?);
            if glyph != 0 {
                map.insert(code, glyph);
            }
        }
        Ok(())
    }

    /// Format 4: segmented delta / range-offset arrays.
    fn decode_segment_deltas(
        reader: &mut TableReader<'_>,
        map: &mut HashMap<u32, u16>,
    ) -> Result<(), ParseError> {
        let subtable_start = reader.pos() - 2;
        let length = usize::from(reader.read_u16()?);
        reader.skip(2)?; // language
        let segment_count = usize::from(reader.read_u16()? / 2);
        reader.skip(6)?; // searchRange, entrySelector, rangeShift

        let read_array = |reader: &mut TableReader<'_>| -> Result<Vec<u16>, ParseError> {
            (0..segment_count).map(|_| reader.read_u16()).collect()
        };
        let end_codes = read_array(reader)?;
        reader.skip(2)?; // reserved padding
        let start_codes = read_array(reader)?;
        let id_deltas = read_array(reader)?;
        let id_range_offsets = read_array(reader)?;

        // The glyph-index array fills the rest of the subtable.
        let subtable_end = subtable_start
            .checked_add(length)
            .filter(|&end| end <= reader.len())
            .ok_or_else(|| reader.err(ParseErrorKind::OffsetOutOfBounds(subtable_start + length)))?;
        let glyph_id_count = subtable_end.saturating_sub(reader.pos()) / 2;
        let glyph_ids = (0..glyph_id_count)
            .map(|_| reader.read_u16())
            .collect::<Result<Vec<_>, _>>()?;

        for segment_idx in 0..segment_count {
            let start = start_codes[segment_idx];
            let end = end_codes[segment_idx];
            let id_delta = id_deltas[segment_idx];
            let id_range_offset = id_range_offsets[segment_idx];
            for code in start..=end {
                if code == 0xffff {
                    continue;
                }
                let glyph = if id_range_offset == 0 {
                    id_delta.wrapping_add(code)
                } else {
                    let idx = i64::from(code - start) + i64::from(id_range_offset / 2)
                        - i64::try_from(segment_count).unwrap_or(i64::MAX)
                        + i64::try_from(segment_idx).unwrap_or(0);
                    let glyph = usize::try_from(idx)
                        .ok()
                        .and_then(|idx| glyph_ids.get(idx).copied())
                        .ok_or_else(|| {
                            let idx = usize::try_from(idx).unwrap_or(usize::MAX);
                            reader.err(ParseErrorKind::OffsetOutOfBounds(idx))
                        })?;
                    if glyph == 0 {
                        continue;
                    }
                    id_delta.wrapping_add(glyph)
                };
                if glyph != 0 {
                    map.insert(u32::from(code), glyph);
                }
            }
        }
        Ok(())
    }

    /// Format 6: dense first-code / entry-count block.
    fn decode_trimmed_mapping(
        reader: &mut TableReader<'_>,
        map: &mut HashMap<u32, u16>,
    ) -> Result<(), ParseError> {
        reader.skip(4)?; // length, language
        let first_code = u32::from(reader.read_u16()?);
        let entry_count = reader.read_u16()?;
        for i in 0..u32::from(entry_count) {
            let glyph = reader.read_u16()?;
            if glyph != 0 {
                map.insert(first_code + i, glyph);
            }
        }
        Ok(())
    }
}

/// Decoded `cmap` table: the list of subtable references in directory order.
#[derive(Debug, Clone)]
pub struct CmapTable {
    subtables: Vec<CmapSubtable>,
}

impl CmapTable {
    /// Microsoft platform ID.
    pub const MICROSOFT_PLATFORM: u16 = 3;
    /// Unicode BMP encoding ID on the Microsoft platform.
    pub const UNICODE_BMP_ENCODING: u16 = 1;

    pub(crate) fn parse(bytes: &[u8]) -> Result<Self, ParseError> {
        let mut reader = TableReader::for_table(bytes, TableTag::CMAP);
        reader.skip(2)?; // version
        let num_tables = reader.read_u16()?;
        let subtables = (0..num_tables)
            .map(|_| {
                Ok(CmapSubtable {
                    platform_id: reader.read_u16()?,
                    encoding_id: reader.read_u16()?,
                    offset: reader.read_u32()?,
                    mapping: OnceCell::new(),
                })
            })
            .collect::<Result<_, ParseError>>()?;
        Ok(Self { subtables })
    }

    /// Gets the first subtable with the given platform and encoding IDs.
    pub fn subtable(&self, platform_id: u16, encoding_id: u16) -> Option<&CmapSubtable> {
        self.subtables
            .iter()
            .find(|sub| sub.platform_id == platform_id && sub.encoding_id == encoding_id)
    }

    /// Gets all subtable references.
    pub fn subtables(&self) -> &[CmapSubtable] {
        &self.subtables
    }
}

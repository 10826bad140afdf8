//! Serialization of table directories back into the sfnt container format.

use std::iter;

use crate::font::{table_checksum, TableDirectory, TableTag};

pub(crate) fn write_u16(writer: &mut Vec<u8>, value: u16) {
    writer.extend_from_slice(&value.to_be_bytes());
}

pub(crate) fn write_u32(writer: &mut Vec<u8>, value: u32) {
    writer.extend_from_slice(&value.to_be_bytes());
}

/// Serializes the directory into a standalone font file. Tables are emitted in
/// tag order with 4-byte alignment, and the `head` checksum adjustment is
/// patched so that the whole-file checksum equals the sfnt magic value.
pub(crate) fn serialize(directory: &TableDirectory, source: &[u8]) -> Vec<u8> {
    let mut writer = FontWriter::default();
    for entry in directory.entries() {
        if entry.tag() == TableTag::HEAD {
            let head = entry.bytes(source);
            writer.write_table(entry.tag(), |buffer| {
                // Zero the checksum adjustment; it is recomputed below.
                buffer.extend_from_slice(&head[..TableDirectory::HEAD_CHECKSUM_OFFSET]);
                write_u32(buffer, 0);
                buffer.extend_from_slice(&head[TableDirectory::HEAD_CHECKSUM_OFFSET + 4..]);
            });
        } else {
            writer.write_raw_table(entry.tag(), entry.bytes(source));
        }
    }
    writer.into_opentype()
}

#[derive(Debug, Clone, Copy)]
struct TableRecord {
    tag: TableTag,
    checksum: u32,
    /// Offset is initially recorded relative to the table data start. It's always 4-byte aligned.
    offset: u32,
    length: u32,
}

impl TableRecord {
    const BYTE_LEN: usize = 16;

    fn write(&self, writer: &mut Vec<u8>) {
        writer.extend_from_slice(&self.tag.0);
        write_u32(writer, self.checksum);
        write_u32(writer, self.offset);
        write_u32(writer, self.length);
    }

    fn self_checksum(&self) -> u32 {
        u32::from_be_bytes(self.tag.0)
            .wrapping_add(self.checksum)
            .wrapping_add(self.offset)
            .wrapping_add(self.length)
    }
}

#[derive(Debug, Clone, Default)]
struct FontWriter {
    tables: Vec<TableRecord>,
    /// Contains *aligned* table data
    table_data: Vec<u8>,
}

impl FontWriter {
    const SFNT_HEADER_LEN: usize = 12;

    fn write_table<T>(&mut self, tag: TableTag, with: impl FnOnce(&mut Vec<u8>) -> T) -> T {
        let offset = self.table_data.len();
        debug_assert_eq!(offset % 4, 0, "unaligned offset: {offset}");

        let output = with(&mut self.table_data);
        let length = self.table_data.len() - offset;
        // Pad the table heap to a 4-byte boundary.
        if length % 4 > 0 {
            let zero_padding = 4 - length % 4;
            self.table_data.extend(iter::repeat_n(0_u8, zero_padding));
        }

        let checksum = table_checksum(&self.table_data[offset..]);
        self.tables.push(TableRecord {
            tag,
            checksum,
            offset: u32::try_from(offset).expect("table offset overflow"),
            length: u32::try_from(length).expect("table length overflow"),
        });
        output
    }

    fn write_raw_table(&mut self, tag: TableTag, content: &[u8]) {
        self.write_table(tag, |buffer| buffer.extend_from_slice(content));
    }

    fn write_sfnt_header(&self) -> Vec<u8> {
        let mut buffer = vec![];
        write_u32(&mut buffer, TableDirectory::SFNT_VERSION);

        // `unwrap()`s are safe: we don't have many tables written.
        let table_count = u16::try_from(self.tables.len()).unwrap();
        write_u16(&mut buffer, table_count);
        let entry_selector = u16::try_from(table_count.max(1).ilog2()).unwrap();
        let search_range = 1 << (4 + entry_selector);
        write_u16(&mut buffer, search_range);
        write_u16(&mut buffer, entry_selector);
        let range_shift = 16 * table_count - search_range;
        write_u16(&mut buffer, range_shift);

        debug_assert_eq!(buffer.len(), Self::SFNT_HEADER_LEN);
        buffer
    }

    /// Returns the starting offset of table data.
    fn data_offset(&self) -> usize {
        Self::SFNT_HEADER_LEN + self.tables.len() * TableRecord::BYTE_LEN
    }

    fn into_opentype(mut self) -> Vec<u8> {
        self.tables.sort_unstable_by_key(|record| record.tag.0);
        let mut buffer = self.write_sfnt_header();
        self.adjust_data(table_checksum(&buffer));

        for record in &self.tables {
            record.write(&mut buffer);
        }
        buffer.extend(self.table_data);
        buffer
    }

    fn adjust_data(&mut self, sfnt_header_checksum: u32) {
        let data_offset = self.data_offset();
        let data_offset_u32 = u32::try_from(data_offset).expect("data_offset overflow");

        let mut file_checksum = sfnt_header_checksum;
        for record in &mut self.tables {
            record.offset += data_offset_u32;
            file_checksum = file_checksum
                .wrapping_add(record.self_checksum())
                .wrapping_add(record.checksum);
        }
        self.patch_head_table(file_checksum, data_offset);
    }

    fn patch_head_table(&mut self, file_checksum: u32, data_offset: usize) {
        let Some(head_table) = self
            .tables
            .iter()
            .find(|record| record.tag == TableTag::HEAD)
        else {
            return;
        };
        let checksum_adjustment = TableDirectory::SFNT_CHECKSUM.wrapping_sub(file_checksum);

        // At this point, the table offset already includes the heap offset, so we need to subtract it.
        let offset =
            head_table.offset as usize + TableDirectory::HEAD_CHECKSUM_OFFSET - data_offset;
        self.table_data[offset..offset + 4].copy_from_slice(&checksum_adjustment.to_be_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::TableEntry;

    #[test]
    fn tables_are_aligned_and_sorted() {
        let mut directory = TableDirectory::empty();
        directory.push(TableEntry::owned(TableTag::PREP, vec![1, 2, 3]));
        directory.push(TableEntry::owned(TableTag::CVT, vec![4, 5, 6, 7, 8]));

        let bytes = serialize(&directory, &[]);
        let reparsed = TableDirectory::parse(&bytes).unwrap();
        let tags: Vec<_> = reparsed.entries().map(TableEntry::tag).collect();
        assert_eq!(tags, [TableTag::CVT, TableTag::PREP]);

        let cvt = reparsed.get(TableTag::CVT).unwrap();
        assert_eq!(cvt.bytes(&bytes), [4, 5, 6, 7, 8]);
        let prep = reparsed.get(TableTag::PREP).unwrap();
        assert_eq!(prep.bytes(&bytes), [1, 2, 3]);
        // Directory offsets are 4-byte aligned.
        assert_eq!(bytes.len() % 4, 0);
    }

    #[test]
    fn whole_file_checksum_matches_magic_with_head_table() {
        let mut head = vec![0_u8; 54];
        head[12..16].copy_from_slice(&0x5f0f_3cf5_u32.to_be_bytes());
        let mut directory = TableDirectory::empty();
        directory.push(TableEntry::owned(TableTag::HEAD, head));
        directory.push(TableEntry::owned(TableTag::MAXP, vec![0; 6]));

        let bytes = serialize(&directory, &[]);
        assert_eq!(table_checksum(&bytes), TableDirectory::SFNT_CHECKSUM);
    }
}

//! Shared test helpers: a synthetic sfnt font builder, plus end-to-end tests
//! covering parsing, subsetting, serialization and registry lookups.

use std::collections::BTreeSet;

use test_casing::test_casing;

use crate::{
    descriptor::{FontDescriptor, FontStyle, FontType},
    font::{table_checksum, TableDirectory, TableEntry, TableTag},
    registry::{FontQuery, FontRegistry},
    subset::FontSubsetBuilder,
    write,
};

const MORE_COMPONENTS: u16 = 0x0020;

/// Glyph of a synthetic test font.
#[derive(Debug, Clone)]
pub(crate) enum TestGlyph {
    /// Simple glyph padded to the given even byte length (at least 10).
    Simple(usize),
    /// Composite glyph referencing the listed glyph indices.
    Composite(Vec<u16>),
}

impl TestGlyph {
    pub(crate) fn simple(len: usize) -> Self {
        assert!(len >= 10 && len % 2 == 0, "invalid simple glyph length");
        Self::Simple(len)
    }

    pub(crate) fn composite(components: &[u16]) -> Self {
        Self::Composite(components.to_vec())
    }

    fn encode(&self) -> Vec<u8> {
        match self {
            Self::Simple(len) => {
                let mut data = 1_i16.to_be_bytes().to_vec();
                data.extend_from_slice(&[0; 8]); // bounding box
                data.resize(*len, 0);
                data
            }
            Self::Composite(components) => {
                let mut data = (-1_i16).to_be_bytes().to_vec();
                data.extend_from_slice(&[0; 8]); // bounding box
                for (idx, &component) in components.iter().enumerate() {
                    let mut flags = 0;
                    if idx + 1 < components.len() {
                        flags |= MORE_COMPONENTS;
                    }
                    push_u16(&mut data, flags);
                    push_u16(&mut data, component);
                    push_u16(&mut data, 0); // packed byte args
                }
                data
            }
        }
    }
}

fn push_u16(buffer: &mut Vec<u8>, value: u16) {
    buffer.extend_from_slice(&value.to_be_bytes());
}

fn push_i16(buffer: &mut Vec<u8>, value: i16) {
    buffer.extend_from_slice(&value.to_be_bytes());
}

fn push_u32(buffer: &mut Vec<u8>, value: u32) {
    buffer.extend_from_slice(&value.to_be_bytes());
}

fn head_table() -> Vec<u8> {
    let mut head = vec![];
    push_u32(&mut head, 0x_0001_0000); // version
    push_u32(&mut head, 0); // fontRevision
    push_u32(&mut head, 0); // checkSumAdjustment
    push_u32(&mut head, 0x_5f0f_3cf5); // magicNumber
    push_u16(&mut head, 0); // flags
    push_u16(&mut head, 1000); // unitsPerEm
    head.extend_from_slice(&[0; 16]); // created, modified
    push_i16(&mut head, -50); // xMin
    push_i16(&mut head, -200); // yMin
    push_i16(&mut head, 1000); // xMax
    push_i16(&mut head, 800); // yMax
    push_u16(&mut head, 0); // macStyle
    push_u16(&mut head, 8); // lowestRecPPEM
    push_i16(&mut head, 2); // fontDirectionHint
    push_i16(&mut head, 0); // indexToLocFormat: short
    push_i16(&mut head, 0); // glyphDataFormat
    assert_eq!(head.len(), 54);
    head
}

fn hhea_table(glyph_count: u16) -> Vec<u8> {
    let mut hhea = vec![];
    push_u32(&mut hhea, 0x_0001_0000); // version
    push_i16(&mut hhea, 800); // ascender
    push_i16(&mut hhea, -200); // descender
    push_i16(&mut hhea, 90); // lineGap
    push_u16(&mut hhea, 600); // advanceWidthMax
    push_i16(&mut hhea, 0); // minLeftSideBearing
    push_i16(&mut hhea, 0); // minRightSideBearing
    push_i16(&mut hhea, 600); // xMaxExtent
    push_i16(&mut hhea, 1); // caretSlopeRise
    push_i16(&mut hhea, 0); // caretSlopeRun
    hhea.extend_from_slice(&[0; 10]); // caretOffset + reserved
    push_i16(&mut hhea, 0); // metricDataFormat
    push_u16(&mut hhea, glyph_count); // numberOfHMetrics
    assert_eq!(hhea.len(), 36);
    hhea
}

fn name_table(family: &str, subfamily: &str) -> Vec<u8> {
    let postscript = format!("{}-{subfamily}", family.replace(' ', ""));
    let full_name = format!("{family} {subfamily}");
    let records = [
        (1_u16, family),
        (2, subfamily),
        (4, &full_name),
        (6, &postscript),
    ];

    let mut strings = vec![];
    let mut table = vec![];
    push_u16(&mut table, 0); // format
    push_u16(&mut table, records.len() as u16);
    push_u16(&mut table, 6 + records.len() as u16 * 12); // string storage offset
    for (name_id, value) in records {
        let encoded: Vec<u8> = value.encode_utf16().flat_map(u16::to_be_bytes).collect();
        push_u16(&mut table, 3); // platform: Microsoft
        push_u16(&mut table, 1); // encoding: Unicode BMP
        push_u16(&mut table, 0x0409); // language: US English
        push_u16(&mut table, name_id);
        push_u16(&mut table, encoded.len() as u16);
        push_u16(&mut table, strings.len() as u16);
        strings.extend_from_slice(&encoded);
    }
    table.extend_from_slice(&strings);
    table
}

fn os2_table() -> Vec<u8> {
    let mut os2 = vec![0_u8; 96];
    os2[..2].copy_from_slice(&2_u16.to_be_bytes()); // version
    os2[4..6].copy_from_slice(&400_u16.to_be_bytes()); // usWeightClass
    os2[6..8].copy_from_slice(&5_u16.to_be_bytes()); // usWidthClass
    os2[32] = 2; // PANOSE family kind: text
    os2[62..64].copy_from_slice(&0x40_u16.to_be_bytes()); // fsSelection: REGULAR
    os2[68..70].copy_from_slice(&800_i16.to_be_bytes()); // sTypoAscender
    os2[70..72].copy_from_slice(&(-200_i16).to_be_bytes()); // sTypoDescender
    os2[72..74].copy_from_slice(&90_i16.to_be_bytes()); // sTypoLineGap
    os2[74..76].copy_from_slice(&800_u16.to_be_bytes()); // usWinAscent
    os2[76..78].copy_from_slice(&200_u16.to_be_bytes()); // usWinDescent
    os2[86..88].copy_from_slice(&500_i16.to_be_bytes()); // sxHeight
    os2[88..90].copy_from_slice(&700_i16.to_be_bytes()); // sCapHeight
    os2[94..96].copy_from_slice(&3_u16.to_be_bytes()); // usMaxContext
    os2
}

fn post_table() -> Vec<u8> {
    let mut post = vec![];
    push_u32(&mut post, 0x_0003_0000); // version
    push_u32(&mut post, 0); // italicAngle
    push_i16(&mut post, -100); // underlinePosition
    push_i16(&mut post, 50); // underlineThickness
    push_u32(&mut post, 0); // isFixedPitch
    post.extend_from_slice(&[0; 16]); // memory usage fields
    assert_eq!(post.len(), 32);
    post
}

/// Builds a format 4 `cmap` mapping `'A' + k` to glyph `k + 1`.
fn cmap_table(glyph_count: u16) -> Vec<u8> {
    let mut segments = vec![];
    if glyph_count >= 2 {
        // (start, end, delta): map codes onto glyphs 1..glyph_count.
        segments.push((65_u16, 65 + glyph_count - 2, 1_u16.wrapping_sub(65)));
    }
    segments.push((0xffff, 0xffff, 1));

    let segment_count = segments.len() as u16;
    let length = 16 + 8 * segment_count;
    let mut subtable = vec![];
    push_u16(&mut subtable, 4); // format
    push_u16(&mut subtable, length);
    push_u16(&mut subtable, 0); // language
    push_u16(&mut subtable, segment_count * 2);
    push_u16(&mut subtable, 2); // searchRange
    push_u16(&mut subtable, 0); // entrySelector
    push_u16(&mut subtable, 0); // rangeShift
    for &(_, end, _) in &segments {
        push_u16(&mut subtable, end);
    }
    push_u16(&mut subtable, 0); // reserved padding
    for &(start, _, _) in &segments {
        push_u16(&mut subtable, start);
    }
    for &(_, _, delta) in &segments {
        push_u16(&mut subtable, delta);
    }
    for _ in &segments {
        push_u16(&mut subtable, 0); // idRangeOffset
    }

    let mut cmap = vec![];
    push_u16(&mut cmap, 0); // version
    push_u16(&mut cmap, 1); // numTables
    push_u16(&mut cmap, 3); // platform: Microsoft
    push_u16(&mut cmap, 1); // encoding: Unicode BMP
    push_u32(&mut cmap, 12); // subtable offset
    cmap.extend_from_slice(&subtable);
    cmap
}

/// Builds a complete font with the given glyphs and naming identity.
pub(crate) fn test_font_with_names(
    glyphs: &[TestGlyph],
    family: &str,
    subfamily: &str,
) -> Vec<u8> {
    let glyph_count = u16::try_from(glyphs.len()).unwrap();

    let mut glyf = vec![];
    let mut loca = vec![];
    for glyph in glyphs {
        push_u16(&mut loca, (glyf.len() / 2) as u16);
        glyf.extend_from_slice(&glyph.encode());
    }
    push_u16(&mut loca, (glyf.len() / 2) as u16);

    let mut hmtx = vec![];
    for _ in glyphs {
        push_u16(&mut hmtx, 600); // advanceWidth
        push_i16(&mut hmtx, 0); // leftSideBearing
    }

    let mut maxp = vec![];
    push_u32(&mut maxp, 0x_0000_5000); // version 0.5
    push_u16(&mut maxp, glyph_count);

    let mut directory = TableDirectory::empty();
    directory.push(TableEntry::owned(TableTag::HEAD, head_table()));
    directory.push(TableEntry::owned(TableTag::HHEA, hhea_table(glyph_count)));
    directory.push(TableEntry::owned(TableTag::HMTX, hmtx));
    directory.push(TableEntry::owned(TableTag::MAXP, maxp));
    directory.push(TableEntry::owned(TableTag::LOCA, loca));
    directory.push(TableEntry::owned(TableTag::GLYF, glyf));
    directory.push(TableEntry::owned(
        TableTag::NAME,
        name_table(family, subfamily),
    ));
    directory.push(TableEntry::owned(TableTag::OS2, os2_table()));
    directory.push(TableEntry::owned(TableTag::POST, post_table()));
    directory.push(TableEntry::owned(TableTag::CMAP, cmap_table(glyph_count)));
    write::serialize(&directory, &[])
}

/// Builds a complete font with default naming.
pub(crate) fn test_font_bytes(glyphs: &[TestGlyph]) -> Vec<u8> {
    test_font_with_names(glyphs, "Test Family", "Regular")
}

#[test]
fn parsing_synthetic_font() {
    let bytes = test_font_bytes(&[
        TestGlyph::simple(12),
        TestGlyph::simple(16),
        TestGlyph::simple(20),
    ]);
    let descriptor = FontDescriptor::from_sfnt_bytes(bytes).unwrap();
    assert_eq!(descriptor.family_name(), Some("Test Family"));
    assert_eq!(descriptor.font_name(), Some("Test Family Regular"));
    assert_eq!(descriptor.postscript_name(), Some("TestFamily-Regular"));
    assert_eq!(descriptor.style(), FontStyle::Regular);
    assert_eq!(descriptor.font_type(), FontType::TrueType);

    let sfnt = descriptor.sfnt().unwrap();
    assert_eq!(sfnt.header().unwrap().units_per_em, 1000);
    assert_eq!(sfnt.horizontal_header().unwrap().ascender, 800);
    assert_eq!(sfnt.glyph_metrics().unwrap().advance_width(2), 600);
    assert_eq!(sfnt.glyph_locations().unwrap().glyph_count(), 3);
    assert_eq!(sfnt.os2_metrics().unwrap().x_height, 500);
    assert_eq!(sfnt.postscript_info().unwrap().underline_position, -100);

    let mapping = sfnt.glyph_mapping().unwrap();
    assert_eq!(mapping.glyph_id(u32::from(b'A')), 1);
    assert_eq!(mapping.glyph_id(u32::from(b'B')), 2);
    assert_eq!(mapping.glyph_id(u32::from(b'Z')), 0);
}

#[test]
fn serialized_font_has_magic_checksum() {
    let bytes = test_font_bytes(&[TestGlyph::simple(12), TestGlyph::simple(14)]);
    assert_eq!(table_checksum(&bytes), TableDirectory::SFNT_CHECKSUM);

    // Re-serializing a parsed font preserves the invariant.
    let descriptor = FontDescriptor::from_sfnt_bytes(bytes).unwrap();
    let reserialized = descriptor.sfnt().unwrap().to_bytes();
    assert_eq!(table_checksum(&reserialized), TableDirectory::SFNT_CHECKSUM);
}

#[test]
fn subset_roundtrips_through_serialization() {
    let bytes = test_font_bytes(&[
        TestGlyph::simple(12),
        TestGlyph::simple(16),
        TestGlyph::simple(20),
        TestGlyph::composite(&[2]),
    ]);
    let descriptor = FontDescriptor::from_sfnt_bytes(bytes).unwrap();
    let subset = FontSubsetBuilder::new(&descriptor)
        .unwrap()
        .build(&BTreeSet::from([3]))
        .unwrap();
    let subset_bytes = subset.sfnt().unwrap().to_bytes();
    assert_eq!(table_checksum(&subset_bytes), TableDirectory::SFNT_CHECKSUM);

    let reparsed = FontDescriptor::from_sfnt_bytes(subset_bytes).unwrap();
    let sfnt = reparsed.sfnt().unwrap();
    assert_eq!(sfnt.glyph_locations().unwrap().glyph_count(), 4);
    // The composite and its component survive; glyph 1 is dropped.
    assert!(sfnt.glyph_data(1).unwrap().is_empty());
    assert_eq!(sfnt.glyph_data(2).unwrap().len(), 20);
    assert!(!sfnt.glyph_data(3).unwrap().is_empty());
    // Character mapping is carried over unchanged.
    assert_eq!(sfnt.glyph_mapping().unwrap().glyph_id(u32::from(b'B')), 2);
}

#[test_casing(3, [1, 2, 4])]
#[test]
fn fonts_with_varying_glyph_counts(count: usize) {
    let glyphs: Vec<_> = (0..count).map(|_| TestGlyph::simple(12)).collect();
    let bytes = test_font_bytes(&glyphs);
    let descriptor = FontDescriptor::from_sfnt_bytes(bytes).unwrap();
    let sfnt = descriptor.sfnt().unwrap();
    assert_eq!(sfnt.glyph_locations().unwrap().glyph_count(), count);

    let subset = FontSubsetBuilder::new(&descriptor)
        .unwrap()
        .build(&BTreeSet::new())
        .unwrap();
    let locations = subset.sfnt().unwrap().glyph_locations().unwrap();
    assert_eq!(locations.glyph_count(), count);
    // Only glyph 0 retains its outline.
    assert!(!subset.sfnt().unwrap().glyph_data(0).unwrap().is_empty());
    for idx in 1..count {
        let data = subset.sfnt().unwrap().glyph_data(idx as u16).unwrap();
        assert!(data.is_empty(), "glyph {idx} should be dropped");
    }
}

#[test]
fn registering_font_family_end_to_end() {
    let regular = test_font_with_names(&[TestGlyph::simple(12)], "Test Family", "Regular");
    let bold = test_font_with_names(&[TestGlyph::simple(12)], "Test Family", "Bold");

    let mut registry = FontRegistry::new();
    registry.register(FontDescriptor::from_sfnt_bytes(regular).unwrap());
    registry.register(FontDescriptor::from_sfnt_bytes(bold).unwrap());

    let family = registry.family(None, "Test Family").unwrap();
    assert_eq!(family.font_type(), FontType::TrueType);
    assert_eq!(family.fonts().count(), 2);
    let bold = family.font(FontStyle::Bold).unwrap();
    assert_eq!(bold.postscript_name(), Some("TestFamily-Bold"));

    let found = registry.lookup(&FontQuery {
        name: Some("Test Family Bold"),
        font_type: Some(FontType::TrueType),
        ..FontQuery::default()
    });
    assert_eq!(found.unwrap().style(), FontStyle::Bold);

    let by_canonical = registry.lookup(&FontQuery {
        family: Some("Test Family"),
        style: FontStyle::Bold,
        ..FontQuery::default()
    });
    assert!(by_canonical.is_some());
}

//! Glyph-level font subsetting.
//!
//! Subsetting keeps the original glyph indices: non-retained glyphs become
//! zero-length runs in the rebuilt `glyf` table, so existing text content
//! referring to glyphs by index stays valid.

use std::collections::BTreeSet;

use crate::{
    descriptor::{FontDescriptor, FontProgram, SfntFont},
    errors::{ParseError, ParseErrorKind},
    font::{component_indices, LocationTable, TableDirectory, TableEntry, TableTag},
};

/// Tables copied into a subset font. Everything else (notably `post` glyph
/// names) is dropped.
const RETAINED_TABLES: &[TableTag] = &[
    TableTag::CMAP,
    TableTag::CVT,
    TableTag::FPGM,
    TableTag::GLYF,
    TableTag::HEAD,
    TableTag::HHEA,
    TableTag::HMTX,
    TableTag::LOCA,
    TableTag::MAXP,
    TableTag::NAME,
    TableTag::OS2,
    TableTag::PREP,
];

/// Builder producing subset fonts from a glyph-based [`FontDescriptor`].
#[derive(Debug)]
pub struct FontSubsetBuilder<'a> {
    descriptor: &'a FontDescriptor,
    sfnt: &'a SfntFont,
}

impl<'a> FontSubsetBuilder<'a> {
    /// Creates a builder for the provided font.
    ///
    /// # Errors
    ///
    /// Fails if the font is not glyph-based (e.g., a Type 1 font).
    pub fn new(descriptor: &'a FontDescriptor) -> Result<Self, ParseError> {
        let Some(sfnt) = descriptor.sfnt() else {
            return Err(ParseError {
                kind: ParseErrorKind::UnsupportedFontProgram,
                offset: 0,
                table: None,
            });
        };
        Ok(Self { descriptor, sfnt })
    }

    /// Builds a subset retaining the requested glyphs, the glyphs directly
    /// referenced by their composites, and the missing glyph (index 0).
    pub fn build(&self, glyphs: &BTreeSet<u16>) -> Result<FontDescriptor, ParseError> {
        let retained = self.retained_glyphs(glyphs)?;
        let locations = self.sfnt.glyph_locations()?;
        let glyph_count = locations.glyph_count();
        log::debug!(
            "retaining {} of {glyph_count} glyphs in {:?}",
            retained.len(),
            self.descriptor.font_name()
        );

        let (glyf, offsets) = self.rebuild_glyf(&retained, glyph_count)?;
        let loca = LocationTable::from_offsets(locations.format(), offsets).encode();

        let mut directory = TableDirectory::empty();
        for entry in self.sfnt.directory().entries() {
            if !RETAINED_TABLES.contains(&entry.tag()) {
                continue;
            }
            let entry = match entry.tag() {
                TableTag::GLYF => TableEntry::owned(TableTag::GLYF, glyf.clone()),
                TableTag::LOCA => TableEntry::owned(TableTag::LOCA, loca.clone()),
                _ => entry.clone(),
            };
            directory.push(entry);
        }

        let subset = SfntFont::from_parts(self.sfnt.source().clone(), directory);
        Ok(self.descriptor.with_program(FontProgram::TrueType(subset)))
    }

    /// Computes the retained set: the requested glyphs, their direct composite
    /// components, and glyph 0. Components of components are not chased.
    fn retained_glyphs(&self, glyphs: &BTreeSet<u16>) -> Result<BTreeSet<u16>, ParseError> {
        let mut retained = BTreeSet::from([0]);
        for &glyph_idx in glyphs {
            retained.insert(glyph_idx);
            let data = self.sfnt.glyph_data(glyph_idx)?;
            retained.extend(component_indices(data)?);
        }
        Ok(retained)
    }

    fn rebuild_glyf(
        &self,
        retained: &BTreeSet<u16>,
        glyph_count: usize,
    ) -> Result<(Vec<u8>, Vec<u32>), ParseError> {
        let mut glyf = vec![];
        let mut offsets = Vec::with_capacity(glyph_count + 1);
        for glyph_idx in 0..glyph_count {
            offsets.push(u32::try_from(glyf.len()).expect("glyf table overflow"));
            let glyph_idx = u16::try_from(glyph_idx).expect("glyph index overflow");
            if retained.contains(&glyph_idx) {
                glyf.extend_from_slice(self.sfnt.glyph_data(glyph_idx)?);
            }
        }
        offsets.push(u32::try_from(glyf.len()).expect("glyf table overflow"));
        // Pad the rebuilt table to a 4-byte boundary; the sentinel keeps the unpadded length.
        while glyf.len() % 4 != 0 {
            glyf.push(0);
        }
        Ok((glyf, offsets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{test_font_bytes, TestGlyph};

    #[test]
    fn type1_fonts_cannot_be_subset() {
        let afm = "StartFontMetrics 4.1\nFontName Test\nEndFontMetrics\n";
        let descriptor = FontDescriptor::from_afm(afm).unwrap();
        let err = FontSubsetBuilder::new(&descriptor).unwrap_err();
        assert!(
            matches!(err.kind(), ParseErrorKind::UnsupportedFontProgram),
            "{err}"
        );
    }

    #[test]
    fn subsetting_preserves_glyph_indices() {
        let bytes = test_font_bytes(&[
            TestGlyph::simple(12),
            TestGlyph::simple(16),
            TestGlyph::simple(20),
            TestGlyph::simple(24),
        ]);
        let descriptor = FontDescriptor::from_sfnt_bytes(bytes).unwrap();
        let subset = FontSubsetBuilder::new(&descriptor)
            .unwrap()
            .build(&BTreeSet::from([2]))
            .unwrap();

        let sfnt = subset.sfnt().unwrap();
        let locations = sfnt.glyph_locations().unwrap();
        assert_eq!(locations.glyph_count(), 4);
        // Glyphs 1 and 3 collapse to zero-length runs; 0 and 2 survive.
        assert!(!sfnt.glyph_data(0).unwrap().is_empty());
        assert!(sfnt.glyph_data(1).unwrap().is_empty());
        assert_eq!(sfnt.glyph_data(2).unwrap().len(), 20);
        assert!(sfnt.glyph_data(3).unwrap().is_empty());
    }

    #[test]
    fn composite_components_are_retained() {
        let bytes = test_font_bytes(&[
            TestGlyph::simple(12),
            TestGlyph::simple(16),
            TestGlyph::simple(20),
            TestGlyph::composite(&[1, 2]),
        ]);
        let descriptor = FontDescriptor::from_sfnt_bytes(bytes).unwrap();
        let subset = FontSubsetBuilder::new(&descriptor)
            .unwrap()
            .build(&BTreeSet::from([3]))
            .unwrap();

        let sfnt = subset.sfnt().unwrap();
        assert!(!sfnt.glyph_data(1).unwrap().is_empty());
        assert!(!sfnt.glyph_data(2).unwrap().is_empty());
        assert!(!sfnt.glyph_data(3).unwrap().is_empty());
    }

    #[test]
    fn post_table_is_dropped() {
        let bytes = test_font_bytes(&[TestGlyph::simple(12)]);
        let descriptor = FontDescriptor::from_sfnt_bytes(bytes).unwrap();
        assert!(descriptor
            .sfnt()
            .unwrap()
            .directory()
            .get(TableTag::POST)
            .is_some());

        let subset = FontSubsetBuilder::new(&descriptor)
            .unwrap()
            .build(&BTreeSet::new())
            .unwrap();
        let directory = subset.sfnt().unwrap().directory();
        assert!(directory.get(TableTag::POST).is_none());
        assert!(directory.get(TableTag::HEAD).is_some());
        assert!(directory.get(TableTag::GLYF).is_some());
    }
}

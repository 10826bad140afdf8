//! Font descriptors: the parsed font program plus its naming identity.

use std::{cell::OnceCell, fmt, sync::Arc};

use crate::{
    afm::AfmModel,
    errors::{AfmError, ParseError, ParseErrorKind},
    font::{
        CmapTable, FontHeader, GlyphMapping, GlyphMetricsTable, HorizontalHeader, LocationTable,
        MetricsTable, NameTable, PostScriptInfo, TableDirectory, TableTag,
    },
    write,
};

/// Kind of the underlying font program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontType {
    /// Glyph-based sfnt font (TrueType outlines).
    TrueType,
    /// Metrics-only PostScript Type 1 font.
    Type1,
    /// Unspecified type; compatible with any font in lookups.
    Unknown,
}

impl FontType {
    /// Gets a stable string form used in registry keys.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TrueType => "TrueType",
            Self::Type1 => "Type1",
            Self::Unknown => "Any",
        }
    }
}

impl fmt::Display for FontType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Style of a font within its family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FontStyle {
    /// Regular (roman) style.
    #[default]
    Regular,
    /// Italic or oblique style.
    Italic,
    /// Bold weight.
    Bold,
    /// Bold weight combined with italics.
    BoldItalic,
}

impl FontStyle {
    /// Derives the style from a subfamily or full font name by case-insensitive
    /// substring matching. `None` maps to [`Self::Regular`].
    pub fn from_name(name: Option<&str>) -> Self {
        let Some(name) = name else {
            return Self::Regular;
        };
        let name = name.to_ascii_lowercase();
        let bold = name.contains("bold");
        let italic = name.contains("italic") || name.contains("oblique");
        Self::from_flags(bold, italic)
    }

    /// Combines bold / italic flags into a style.
    pub fn from_flags(bold: bool, italic: bool) -> Self {
        match (bold, italic) {
            (false, false) => Self::Regular,
            (false, true) => Self::Italic,
            (true, false) => Self::Bold,
            (true, true) => Self::BoldItalic,
        }
    }

    /// Gets the display form of the style, as used in canonical font names.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Regular => "Regular",
            Self::Italic => "Italic",
            Self::Bold => "Bold",
            Self::BoldItalic => "BoldItalic",
        }
    }

    /// Gets the style slot index within a font family.
    pub fn index(self) -> usize {
        match self {
            Self::Regular => 0,
            Self::Italic => 1,
            Self::Bold => 2,
            Self::BoldItalic => 3,
        }
    }
}

impl fmt::Display for FontStyle {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Parsed sfnt font. The table directory is decoded eagerly; individual tables
/// are decoded on first access and cached.
#[derive(Debug, Clone, Default)]
pub struct SfntFont {
    source: Arc<[u8]>,
    directory: TableDirectory,
    header: OnceCell<FontHeader>,
    horizontal: OnceCell<HorizontalHeader>,
    metrics: OnceCell<GlyphMetricsTable>,
    locations: OnceCell<LocationTable>,
    names: OnceCell<NameTable>,
    os2: OnceCell<MetricsTable>,
    post: OnceCell<PostScriptInfo>,
    cmap: OnceCell<CmapTable>,
}

impl SfntFont {
    /// Parses the table directory of the provided font.
    pub fn new(source: impl Into<Arc<[u8]>>) -> Result<Self, ParseError> {
        let source = source.into();
        let directory = TableDirectory::parse(&source)?;
        Ok(Self {
            source,
            directory,
            ..Self::default()
        })
    }

    pub(crate) fn from_parts(source: Arc<[u8]>, directory: TableDirectory) -> Self {
        Self {
            source,
            directory,
            ..Self::default()
        }
    }

    /// Gets the table directory.
    pub fn directory(&self) -> &TableDirectory {
        &self.directory
    }

    pub(crate) fn source(&self) -> &Arc<[u8]> {
        &self.source
    }

    /// Gets the raw bytes of a table.
    pub fn table_bytes(&self, tag: TableTag) -> Result<&[u8], ParseError> {
        let entry = self
            .directory
            .get(tag)
            .ok_or_else(|| ParseError::missing_table(tag))?;
        Ok(entry.bytes(&self.source))
    }

    /// Gets the decoded `head` table.
    pub fn header(&self) -> Result<&FontHeader, ParseError> {
        if let Some(header) = self.header.get() {
            return Ok(header);
        }
        let header = FontHeader::parse(self.table_bytes(TableTag::HEAD)?)?;
        Ok(self.header.get_or_init(|| header))
    }

    /// Gets the decoded `hhea` table.
    pub fn horizontal_header(&self) -> Result<&HorizontalHeader, ParseError> {
        if let Some(horizontal) = self.horizontal.get() {
            return Ok(horizontal);
        }
        let horizontal = HorizontalHeader::parse(self.table_bytes(TableTag::HHEA)?)?;
        Ok(self.horizontal.get_or_init(|| horizontal))
    }

    /// Gets the decoded `hmtx` table.
    pub fn glyph_metrics(&self) -> Result<&GlyphMetricsTable, ParseError> {
        if let Some(metrics) = self.metrics.get() {
            return Ok(metrics);
        }
        let count = self.horizontal_header()?.number_of_h_metrics;
        let metrics = GlyphMetricsTable::parse(self.table_bytes(TableTag::HMTX)?, count)?;
        Ok(self.metrics.get_or_init(|| metrics))
    }

    /// Gets the decoded `loca` table. The offset format is taken from `head`.
    pub fn glyph_locations(&self) -> Result<&LocationTable, ParseError> {
        if let Some(locations) = self.locations.get() {
            return Ok(locations);
        }
        let format = self.header()?.loca_format();
        let locations = LocationTable::parse(self.table_bytes(TableTag::LOCA)?, format)?;
        Ok(self.locations.get_or_init(|| locations))
    }

    /// Gets the decoded `name` table.
    pub fn names(&self) -> Result<&NameTable, ParseError> {
        if let Some(names) = self.names.get() {
            return Ok(names);
        }
        let names = NameTable::parse(self.table_bytes(TableTag::NAME)?)?;
        Ok(self.names.get_or_init(|| names))
    }

    /// Gets the decoded `OS/2` table.
    pub fn os2_metrics(&self) -> Result<&MetricsTable, ParseError> {
        if let Some(os2) = self.os2.get() {
            return Ok(os2);
        }
        let os2 = MetricsTable::parse(self.table_bytes(TableTag::OS2)?)?;
        Ok(self.os2.get_or_init(|| os2))
    }

    /// Gets the decoded `post` table header.
    pub fn postscript_info(&self) -> Result<&PostScriptInfo, ParseError> {
        if let Some(post) = self.post.get() {
            return Ok(post);
        }
        let post = PostScriptInfo::parse(self.table_bytes(TableTag::POST)?)?;
        Ok(self.post.get_or_init(|| post))
    }

    /// Gets the decoded `cmap` subtable directory.
    pub fn char_map(&self) -> Result<&CmapTable, ParseError> {
        if let Some(cmap) = self.cmap.get() {
            return Ok(cmap);
        }
        let cmap = CmapTable::parse(self.table_bytes(TableTag::CMAP)?)?;
        Ok(self.cmap.get_or_init(|| cmap))
    }

    /// Gets the preferred code-to-glyph mapping: the Windows Unicode BMP subtable
    /// if present, then the Windows symbol subtable, then the first subtable.
    pub fn glyph_mapping(&self) -> Result<&GlyphMapping, ParseError> {
        let cmap = self.char_map()?;
        let subtable = cmap
            .subtable(CmapTable::MICROSOFT_PLATFORM, CmapTable::UNICODE_BMP_ENCODING)
            .or_else(|| cmap.subtable(CmapTable::MICROSOFT_PLATFORM, 0))
            .or_else(|| cmap.subtables().first())
            .ok_or_else(|| ParseError::missing_table(TableTag::CMAP))?;
        subtable.mapping(self.table_bytes(TableTag::CMAP)?)
    }

    /// Gets the raw outline data of a glyph. Empty glyphs produce an empty slice.
    pub fn glyph_data(&self, glyph_idx: u16) -> Result<&[u8], ParseError> {
        let range = self
            .glyph_locations()?
            .glyph_range(glyph_idx)
            .unwrap_or(0..0);
        let glyf = self.table_bytes(TableTag::GLYF)?;
        let len = glyf.len();
        glyf.get(range.clone()).ok_or(ParseError {
            kind: ParseErrorKind::RangeOutOfBounds { range, len },
            offset: 0,
            table: Some(TableTag::GLYF),
        })
    }

    /// Serializes the font, recomputing the directory layout and the `head`
    /// checksum adjustment.
    pub fn to_bytes(&self) -> Vec<u8> {
        write::serialize(&self.directory, &self.source)
    }
}

/// Underlying font program of a [`FontDescriptor`].
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum FontProgram {
    /// Glyph-based sfnt font.
    TrueType(SfntFont),
    /// Metrics-only Type 1 font described by its AFM data.
    Type1(AfmModel),
}

/// Font program together with its resolved naming identity.
#[derive(Debug, Clone)]
pub struct FontDescriptor {
    program: FontProgram,
    family_name: Option<String>,
    font_name: Option<String>,
    postscript_name: Option<String>,
    style: FontStyle,
    font_type: FontType,
}

impl FontDescriptor {
    /// Parses an sfnt font and derives its identity from the `name` table
    /// (falling back to `OS/2` selection flags for the style).
    pub fn from_sfnt_bytes(bytes: impl Into<Arc<[u8]>>) -> Result<Self, ParseError> {
        let sfnt = SfntFont::new(bytes)?;
        let (family_name, font_name, postscript_name, style);
        {
            let names = sfnt.names()?;
            family_name = names.name(NameTable::FAMILY).map(str::to_owned);
            font_name = names.name(NameTable::FULL_NAME).map(str::to_owned);
            postscript_name = names.name(NameTable::POSTSCRIPT).map(str::to_owned);
            style = match names.name(NameTable::SUBFAMILY) {
                Some(subfamily) => FontStyle::from_name(Some(subfamily)),
                None => {
                    if let Ok(os2) = sfnt.os2_metrics() {
                        FontStyle::from_flags(
                            os2.fs_selection & 0x20 != 0,
                            os2.fs_selection & 0x01 != 0,
                        )
                    } else {
                        FontStyle::from_name(font_name.as_deref())
                    }
                }
            };
        }
        Ok(Self {
            program: FontProgram::TrueType(sfnt),
            family_name,
            font_name,
            postscript_name,
            style,
            font_type: FontType::TrueType,
        })
    }

    /// Parses Adobe Font Metrics and derives the identity from its attributes.
    pub fn from_afm(text: &str) -> Result<Self, AfmError> {
        let afm = AfmModel::parse(text)?;
        let family_name = afm.attribute("FamilyName").map(str::to_owned);
        let font_name = afm.attribute("FullName").map(str::to_owned);
        let postscript_name = afm.attribute("FontName").map(str::to_owned);
        let bold = afm
            .attribute("Weight")
            .is_some_and(|weight| weight.to_ascii_lowercase().contains("bold"));
        let italic = afm
            .attribute("ItalicAngle")
            .and_then(|angle| angle.trim().parse::<f64>().ok())
            .is_some_and(|angle| angle != 0.0)
            || matches!(
                FontStyle::from_name(font_name.as_deref()),
                FontStyle::Italic | FontStyle::BoldItalic
            );
        Ok(Self {
            program: FontProgram::Type1(afm),
            family_name,
            font_name,
            postscript_name,
            style: FontStyle::from_flags(bold, italic),
            font_type: FontType::Type1,
        })
    }

    pub(crate) fn with_program(&self, program: FontProgram) -> Self {
        Self {
            program,
            family_name: self.family_name.clone(),
            font_name: self.font_name.clone(),
            postscript_name: self.postscript_name.clone(),
            style: self.style,
            font_type: self.font_type,
        }
    }

    /// Gets the underlying font program.
    pub fn program(&self) -> &FontProgram {
        &self.program
    }

    /// Gets the font family name, if known.
    pub fn family_name(&self) -> Option<&str> {
        self.family_name.as_deref()
    }

    /// Gets the full font name, if known.
    pub fn font_name(&self) -> Option<&str> {
        self.font_name.as_deref()
    }

    /// Gets the PostScript name, if known.
    pub fn postscript_name(&self) -> Option<&str> {
        self.postscript_name.as_deref()
    }

    /// Gets the font style.
    pub fn style(&self) -> FontStyle {
        self.style
    }

    /// Gets the font type.
    pub fn font_type(&self) -> FontType {
        self.font_type
    }

    /// Gets the canonical name of the font: the family name for regular fonts,
    /// and `Family,Style` otherwise.
    pub fn canonical_name(&self) -> Option<String> {
        let family = self.family_name.as_deref()?;
        Some(canonical_name(family, self.style))
    }

    /// Gets the sfnt program, if this is a glyph-based font.
    pub fn sfnt(&self) -> Option<&SfntFont> {
        match &self.program {
            FontProgram::TrueType(sfnt) => Some(sfnt),
            FontProgram::Type1(_) => None,
        }
    }

    /// Gets the font metrics, if this is a Type 1 font.
    pub fn afm(&self) -> Option<&AfmModel> {
        match &self.program {
            FontProgram::Type1(afm) => Some(afm),
            FontProgram::TrueType(_) => None,
        }
    }
}

/// Builds the canonical name for a family / style pair.
pub(crate) fn canonical_name(family: &str, style: FontStyle) -> String {
    match style {
        FontStyle::Regular => family.to_owned(),
        _ => format!("{family},{style}"),
    }
}

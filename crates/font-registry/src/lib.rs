//! Font metadata engine: sfnt / AFM parsing, glyph-level subsetting and a
//! multi-key font registry.
//!
//! # Overview
//!
//! - [`FontDescriptor`] parses a font program (TrueType sfnt or Adobe Font
//!   Metrics) and resolves its naming identity. sfnt tables are decoded lazily
//!   and cached.
//! - [`FontSubsetBuilder`] rebuilds `glyf` / `loca` so that only requested
//!   glyphs (plus their composite components and the missing glyph) retain
//!   outlines, keeping the original glyph indices.
//! - [`FontRegistry`] registers fonts under their full, PostScript and
//!   canonical names and resolves [`FontQuery`]s with collision handling;
//!   [`FontContext`] adds aliases and pluggable font sources on top.
//!
//! # Examples
//!
//! ```
//! use font_registry::{FontDescriptor, FontQuery, FontRegistry, FontStyle};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = "StartFontMetrics 4.1\n\
//!     FontName Courier-Bold\n\
//!     FullName Courier Bold\n\
//!     FamilyName Courier\n\
//!     Weight Bold\n\
//!     EndFontMetrics\n";
//! let mut registry = FontRegistry::new();
//! registry.register(FontDescriptor::from_afm(metrics)?);
//!
//! let font = registry.lookup(&FontQuery {
//!     family: Some("Courier"),
//!     style: FontStyle::Bold,
//!     ..FontQuery::default()
//! });
//! assert_eq!(font.unwrap().postscript_name(), Some("Courier-Bold"));
//! # Ok(())
//! # }
//! ```

mod afm;
mod context;
mod descriptor;
mod errors;
mod font;
mod reader;
mod registry;
mod render;
mod subset;
#[cfg(test)]
mod tests;
mod write;

pub use crate::{
    afm::{AfmChar, AfmModel},
    context::{FontContext, FontResource, FontSource},
    descriptor::{FontDescriptor, FontProgram, FontStyle, FontType, SfntFont},
    errors::{AfmError, AfmErrorKind, ParseError, ParseErrorKind},
    font::{
        CmapSubtable, CmapTable, FontHeader, GlyphMapping, GlyphMetricsTable, HorizontalHeader,
        LocaFormat, LocationTable, MetricsTable, NameRecord, NameTable, PostScriptInfo,
        TableDirectory, TableEntry, TableTag,
    },
    registry::{FontFamily, FontQuery, FontRegistry, NameResolver},
    render::{FaceInfo, GlyphBitmap, GlyphRenderer},
    subset::FontSubsetBuilder,
};

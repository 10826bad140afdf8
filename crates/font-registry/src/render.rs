//! Glyph rendering boundary. Rasterization itself is left to the embedding
//! application; this module only defines the data exchanged across it.

use std::error;

use crate::descriptor::FontDescriptor;

/// Face-level metadata reported by a renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceInfo {
    /// Family name as reported by the face.
    pub family_name: Option<String>,
    /// Style (subfamily) name as reported by the face.
    pub style_name: Option<String>,
    /// Em square size in font units.
    pub units_per_em: u16,
    /// Ascent in font units.
    pub ascent: f32,
    /// Descent in font units (typically negative).
    pub descent: f32,
    /// Recommended additional line spacing in font units.
    pub line_gap: f32,
    /// Number of glyphs in the face.
    pub glyph_count: u16,
}

/// Alpha bitmap of a rasterized glyph.
#[derive(Debug, Clone, Default)]
pub struct GlyphBitmap {
    /// Bitmap width in pixels.
    pub width: u32,
    /// Bitmap height in pixels.
    pub height: u32,
    /// Horizontal offset of the bitmap from the glyph origin.
    pub left: i32,
    /// Vertical offset of the bitmap top from the baseline.
    pub top: i32,
    /// Row-major 8-bit coverage values, `width * height` bytes.
    pub data: Vec<u8>,
}

/// Renderer turning font glyphs into bitmaps.
pub trait GlyphRenderer {
    /// Rendering error.
    type Error: error::Error;

    /// Reports face-level metrics of the font.
    ///
    /// # Errors
    ///
    /// Fails if the renderer cannot process the font program.
    fn face_info(&self, font: &FontDescriptor) -> Result<FaceInfo, Self::Error>;

    /// Rasterizes a glyph at the given pixel size.
    ///
    /// # Errors
    ///
    /// Fails if the glyph cannot be rasterized.
    fn rasterize(
        &self,
        font: &FontDescriptor,
        glyph_idx: u16,
        pixel_size: f32,
    ) -> Result<GlyphBitmap, Self::Error>;
}

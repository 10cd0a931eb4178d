//! Font instance over sfnt data at a pixel size

use rustybuzz::ttf_parser::{Face, GlyphId, Tag};

use super::{FontInstance, GlyfTable, Point};
use crate::{LayoutError, Result};

/// Parsed font face sized to a pixels-per-em, usable as a [`FontInstance`]
pub struct FaceInstance<'a> {
    /// The underlying ttf-parser face
    face: Face<'a>,
    /// Contour points, TrueType outlines only
    glyf: Option<GlyfTable<'a>>,
    pixels_per_em: (f32, f32),
    scale_factor: (f32, f32),
}

impl<'a> FaceInstance<'a> {
    /// Parse face `index` of `data`, sized to `pixels_per_em` on both axes
    pub fn parse(data: &'a [u8], index: u32, pixels_per_em: f32) -> Result<Self> {
        let face = Face::parse(data, index).map_err(|e| LayoutError::FontParsing(e.to_string()))?;

        let raw = face.raw_face();
        let glyf = match (
            raw.table(Tag::from_bytes(b"head")),
            raw.table(Tag::from_bytes(b"loca")),
            raw.table(Tag::from_bytes(b"glyf")),
        ) {
            (Some(head), Some(loca), Some(glyf)) => GlyfTable::new(head, loca, glyf),
            _ => None,
        };

        Ok(Self {
            face,
            glyf,
            pixels_per_em: (pixels_per_em, pixels_per_em),
            scale_factor: (1.0, 1.0),
        })
    }

    /// Use distinct horizontal and vertical pixels per em
    pub fn with_pixels_per_em(mut self, x: f32, y: f32) -> Self {
        self.pixels_per_em = (x, y);
        self
    }

    /// Apply an extra device scale on top of the pixels per em
    pub fn with_scale_factor(mut self, x: f32, y: f32) -> Self {
        self.scale_factor = (x, y);
        self
    }

    /// Units per em
    pub fn units_per_em(&self) -> u16 {
        self.face.units_per_em()
    }

    /// Get underlying ttf-parser face
    pub fn ttf_face(&self) -> &Face<'a> {
        &self.face
    }

    /// Font units to device pixels, scale factor included
    fn x_units_to_pixels(&self, value: f32) -> f32 {
        value * self.pixels_per_em.0 * self.scale_factor.0 / self.units_per_em() as f32
    }

    fn y_units_to_pixels(&self, value: f32) -> f32 {
        value * self.pixels_per_em.1 * self.scale_factor.1 / self.units_per_em() as f32
    }
}

impl FontInstance for FaceInstance<'_> {
    fn font_table(&self, tag: Tag) -> Option<&[u8]> {
        self.face.raw_face().table(tag)
    }

    fn map_char_to_glyph(&self, ch: char) -> u32 {
        self.face.glyph_index(ch).map_or(0, |id| id.0 as u32)
    }

    fn glyph_advance(&self, glyph: u32) -> Point {
        let advance = u16::try_from(glyph)
            .ok()
            .and_then(|id| self.face.glyph_hor_advance(GlyphId(id)))
            .unwrap_or(0);
        Point::new(self.x_units_to_pixels(advance as f32), 0.0)
    }

    fn glyph_point(&self, glyph: u32, point_index: u32) -> Option<Point> {
        let glyph = u16::try_from(glyph).ok()?;
        let (x, y) = self.glyf.as_ref()?.point(glyph, point_index)?;
        // Font units are +y up
        Some(Point::new(
            self.x_units_to_pixels(x as f32),
            -self.y_units_to_pixels(y as f32),
        ))
    }

    fn pixels_per_em(&self) -> (f32, f32) {
        self.pixels_per_em
    }

    fn scale_factor(&self) -> (f32, f32) {
        self.scale_factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_garbage() {
        let result = FaceInstance::parse(&[0u8; 16], 0, 16.0);
        assert!(matches!(result, Err(LayoutError::FontParsing(_))));
    }
}

//! Pen-position accumulation over shaped glyphs

use super::buffer::GlyphRecord;
use crate::fixed::to_device_units;
use crate::font::Point;

/// A glyph with its device-pixel pen position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionedGlyph {
    /// Glyph ID in the font
    pub glyph_id: u32,
    /// Cluster index (original character position)
    pub cluster: u32,
    /// X position in pixels, glyph offset included
    pub x: f32,
    /// Y position in pixels, glyph offset included
    pub y: f32,
}

/// Iterator placing glyphs along a pen that starts at an origin
#[derive(Debug, Clone)]
pub struct PositionedGlyphs<'a> {
    records: std::slice::Iter<'a, GlyphRecord>,
    pen: Point,
}

impl<'a> PositionedGlyphs<'a> {
    pub(crate) fn new(records: &'a [GlyphRecord], origin: Point) -> Self {
        Self { records: records.iter(), pen: origin }
    }

    /// Pen position after the glyphs yielded so far
    pub fn pen(&self) -> Point {
        self.pen
    }
}

impl Iterator for PositionedGlyphs<'_> {
    type Item = PositionedGlyph;

    fn next(&mut self) -> Option<PositionedGlyph> {
        let record = self.records.next()?;
        let glyph = PositionedGlyph {
            glyph_id: record.glyph_id,
            cluster: record.cluster,
            x: self.pen.x + to_device_units(record.x_offset),
            y: self.pen.y + to_device_units(record.y_offset),
        };
        self.pen.x += to_device_units(record.x_advance);
        self.pen.y += to_device_units(record.y_advance);
        Some(glyph)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.records.size_hint()
    }
}

impl ExactSizeIterator for PositionedGlyphs<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::Fixed;

    fn record(x_advance: f32, x_offset: f32, y_offset: f32) -> GlyphRecord {
        GlyphRecord {
            x_advance: Fixed::from_f32(x_advance),
            x_offset: Fixed::from_f32(x_offset),
            y_offset: Fixed::from_f32(y_offset),
            ..GlyphRecord::default()
        }
    }

    #[test]
    fn test_offsets_do_not_move_pen() {
        let records = [record(10.0, 0.0, 0.0), record(0.0, -4.0, -2.5), record(6.0, 0.0, 0.0)];
        let mut glyphs = PositionedGlyphs::new(&records, Point::new(100.0, 50.0));

        assert_eq!(glyphs.len(), 3);
        let first = glyphs.next().unwrap();
        assert_eq!((first.x, first.y), (100.0, 50.0));
        let mark = glyphs.next().unwrap();
        assert_eq!((mark.x, mark.y), (106.0, 47.5));
        let last = glyphs.next().unwrap();
        assert_eq!((last.x, last.y), (110.0, 50.0));
        assert_eq!(glyphs.pen(), Point::new(116.0, 50.0));
        assert!(glyphs.next().is_none());
    }
}

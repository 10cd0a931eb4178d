//! Shaping session
//!
//! A [`LayoutEngine`] binds one font, script and set of typographic flags,
//! owns the glyph buffer, and keeps the result of the last [`shape`] call
//! available for extraction until the next call or [`reset`].
//!
//! [`shape`]: LayoutEngine::shape
//! [`reset`]: LayoutEngine::reset

use std::str::FromStr;

use rustybuzz::ttf_parser::Tag;
use rustybuzz::{BufferFlags, Direction, Feature, Language, Script};

use super::buffer::{GlyphBuffer, GlyphRecord};
use super::engine::EngineFont;
use super::flags::TypoFlags;
use super::run::PositionedGlyphs;
use crate::font::{FontInstance, Point};
use crate::{LayoutError, Result};

/// Shaping session configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Script of the text (guessed from the text if None)
    pub script: Option<Script>,
    /// Language tag, recorded but not used for shaping
    pub language: Option<Language>,
    /// Optional shaping behaviors
    pub typo_flags: TypoFlags,
    /// Characters the glyph buffer has room for up front
    pub initial_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            script: None,
            language: None,
            typo_flags: TypoFlags::default(),
            initial_capacity: 64,
        }
    }
}

impl EngineConfig {
    /// Set script
    pub fn script(mut self, script: Script) -> Self {
        self.script = Some(script);
        self
    }

    /// Set language from a BCP 47 tag
    pub fn language(mut self, language: &str) -> Self {
        self.language = Language::from_str(language).ok();
        self
    }

    /// Set typographic flags
    pub fn typo_flags(mut self, flags: TypoFlags) -> Self {
        self.typo_flags = flags;
        self
    }

    /// Set initial glyph buffer capacity
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }
}

/// Script for a four-letter ISO 15924 code such as `"Latn"` or `"Arab"`
pub fn script_from_iso15924(code: &str) -> Option<Script> {
    let bytes: [u8; 4] = code.as_bytes().try_into().ok()?;
    Script::from_iso15924_tag(Tag::from_bytes(&bytes))
}

/// Shaping session bound to one font
pub struct LayoutEngine<'a> {
    // Field order is release order: font handle, then buffer
    font: EngineFont<'a>,
    buffer: GlyphBuffer,
    typo_flags: TypoFlags,
    features: Vec<Feature>,
    language: Option<Language>,
    /// Pen origin of the last shaping call
    origin: Point,
}

impl<'a> LayoutEngine<'a> {
    /// Create a session from a configuration
    pub fn new(font: &'a dyn FontInstance, config: EngineConfig) -> Result<Self> {
        let mut buffer = GlyphBuffer::with_capacity(config.initial_capacity)?;
        buffer.set_script(config.script);

        Ok(Self {
            font: EngineFont::new(font),
            buffer,
            typo_flags: config.typo_flags,
            features: config.typo_flags.features(),
            language: config.language,
            origin: Point::ZERO,
        })
    }

    /// Create a session with kerning and ligatures enabled
    pub fn create(
        font: &'a dyn FontInstance,
        script: Option<Script>,
        language: Option<Language>,
    ) -> Result<Self> {
        Self::create_with_flags(font, script, language, TypoFlags::default())
    }

    /// Create a session with explicit typographic flags
    pub fn create_with_flags(
        font: &'a dyn FontInstance,
        script: Option<Script>,
        language: Option<Language>,
        typo_flags: TypoFlags,
    ) -> Result<Self> {
        Self::new(
            font,
            EngineConfig { script, language, typo_flags, ..EngineConfig::default() },
        )
    }

    /// Shape `context[offset..offset + count]`, using the rest of
    /// `context[..context_len]` as surrounding context.
    ///
    /// Indices are UTF-16 code units. Clusters in the result index into
    /// `context`. On error the previous result is kept.
    #[allow(clippy::too_many_arguments)]
    pub fn shape(
        &mut self,
        context: &[u16],
        offset: usize,
        count: usize,
        context_len: usize,
        right_to_left: bool,
        x: f32,
        y: f32,
    ) -> Result<usize> {
        if context_len > context.len() {
            return Err(LayoutError::IllegalArgument("context length exceeds context"));
        }
        if offset >= context_len {
            return Err(LayoutError::IllegalArgument("offset outside context"));
        }
        let end = offset
            .checked_add(count)
            .filter(|&end| end <= context_len)
            .ok_or(LayoutError::IllegalArgument("range exceeds context"))?;

        self.buffer.reserve(count)?;

        self.origin = Point::new(x, y);
        self.buffer.set_direction(if right_to_left {
            Direction::RightToLeft
        } else {
            Direction::LeftToRight
        });
        self.buffer.clear();

        let mut flags = BufferFlags::empty();
        if offset == 0 {
            flags |= BufferFlags::BEGINNING_OF_TEXT;
        }
        if end == context_len {
            flags |= BufferFlags::END_OF_TEXT;
        }
        self.buffer.set_flags(flags);

        let text = &context[..context_len];
        self.buffer.add_utf16(text, offset, 0);
        self.buffer.add_utf16(text, offset, count);

        self.font.shape(&mut self.buffer, &self.features);

        tracing::trace!(
            offset,
            count,
            context_len,
            right_to_left,
            flags = ?flags,
            glyphs = self.buffer.len(),
            "Shaped text run"
        );

        Ok(self.buffer.len())
    }

    /// Discard the glyph result and move the pen origin back to (0, 0)
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.origin = Point::ZERO;
    }

    /// Number of glyphs from the last shaping call
    pub fn glyph_count(&self) -> usize {
        self.buffer.len()
    }

    /// Glyph records from the last shaping call, in engine units
    pub fn glyph_records(&self) -> &[GlyphRecord] {
        self.buffer.records()
    }

    /// Copy each glyph's cluster into `out`
    pub fn char_indices(&self, out: &mut [usize]) -> Result<()> {
        self.char_indices_with_base(out, 0)
    }

    /// Copy each glyph's cluster plus `base` into `out`
    pub fn char_indices_with_base(&self, out: &mut [usize], base: usize) -> Result<()> {
        let records = self.output_records(out.len(), 0)?;
        for (slot, record) in out.iter_mut().zip(records) {
            *slot = record.cluster as usize + base;
        }
        Ok(())
    }

    /// Copy glyph ids into `out`, OR-ing in `extra_bits`
    pub fn glyph_ids(&self, out: &mut [u32], extra_bits: u32) -> Result<()> {
        let records = self.output_records(out.len(), 0)?;
        for (slot, record) in out.iter_mut().zip(records) {
            *slot = record.glyph_id | extra_bits;
        }
        Ok(())
    }

    /// Copy glyph ids into `out`, truncated to 16 bits
    pub fn glyph_ids16(&self, out: &mut [u16]) -> Result<()> {
        let records = self.output_records(out.len(), 0)?;
        for (slot, record) in out.iter_mut().zip(records) {
            *slot = record.glyph_id as u16;
        }
        Ok(())
    }

    /// Write `2 * glyph_count + 2` floats into `out`: the (x, y) of every
    /// glyph, then the pen position after the last glyph.
    pub fn positions(&self, out: &mut [f32]) -> Result<()> {
        self.output_records(out.len(), 2 * self.glyph_count() + 2)?;
        self.write_positions(out);
        Ok(())
    }

    /// Fill `out`, which holds at least `2 * glyph_count + 2` floats
    fn write_positions(&self, out: &mut [f32]) {
        let mut glyphs = self.positioned_glyphs();
        let mut i = 0;
        for glyph in glyphs.by_ref() {
            out[2 * i] = glyph.x;
            out[2 * i + 1] = glyph.y;
            i += 1;
        }
        let pen = glyphs.pen();
        out[2 * i] = pen.x;
        out[2 * i + 1] = pen.y;
    }

    /// Position of one glyph.
    ///
    /// Walks every preceding glyph, so each call is linear in `index`.
    pub fn position(&self, index: usize) -> Result<Point> {
        let record = self
            .buffer
            .records()
            .get(index)
            .ok_or(LayoutError::IllegalArgument("glyph index out of range"))?;

        let pen = self.buffer.records()[..index].iter().fold(self.origin, |pen, r| {
            Point::new(
                pen.x + r.x_advance.to_f32(),
                pen.y + r.y_advance.to_f32(),
            )
        });
        Ok(Point::new(pen.x + record.x_offset.to_f32(), pen.y + record.y_offset.to_f32()))
    }

    /// Glyphs of the last shaping call with their pen positions
    pub fn positioned_glyphs(&self) -> PositionedGlyphs<'_> {
        PositionedGlyphs::new(self.buffer.records(), self.origin)
    }

    /// Clusters plus `base` as a new vector
    pub fn char_indices_vec(&self, base: usize) -> Vec<usize> {
        self.buffer.records().iter().map(|r| r.cluster as usize + base).collect()
    }

    /// Glyph ids OR-ed with `extra_bits` as a new vector
    pub fn glyph_ids_vec(&self, extra_bits: u32) -> Vec<u32> {
        self.buffer.records().iter().map(|r| r.glyph_id | extra_bits).collect()
    }

    /// [`positions`](Self::positions) as a new vector
    pub fn positions_vec(&self) -> Vec<f32> {
        let mut out = vec![0.0; 2 * self.glyph_count() + 2];
        self.write_positions(&mut out);
        out
    }

    /// Pen origin of the last shaping call
    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn typo_flags(&self) -> TypoFlags {
        self.typo_flags
    }

    pub fn script(&self) -> Option<Script> {
        self.buffer.script()
    }

    pub fn language(&self) -> Option<&Language> {
        self.language.as_ref()
    }

    /// Whether the bound font is shaped through its OpenType tables
    pub fn uses_opentype(&self) -> bool {
        self.font.uses_opentype()
    }

    /// The session's glyph buffer
    pub fn buffer(&self) -> &GlyphBuffer {
        &self.buffer
    }

    /// Records to copy into an output of `out_len`, which needs at least
    /// `required` slots (or one per glyph when `required` is 0).
    fn output_records(&self, out_len: usize, required: usize) -> Result<&[GlyphRecord]> {
        let required = required.max(self.glyph_count());
        if out_len < required {
            return Err(LayoutError::IllegalArgument("output buffer too small"));
        }
        Ok(self.buffer.records())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One glyph per letter, 10px advances, no tables
    struct MonoFont;

    impl FontInstance for MonoFont {
        fn font_table(&self, _tag: Tag) -> Option<&[u8]> {
            None
        }

        fn map_char_to_glyph(&self, ch: char) -> u32 {
            ch as u32
        }

        fn glyph_advance(&self, _glyph: u32) -> Point {
            Point::new(10.0, 0.0)
        }

        fn glyph_point(&self, _glyph: u32, _point_index: u32) -> Option<Point> {
            None
        }

        fn pixels_per_em(&self) -> (f32, f32) {
            (12.0, 12.0)
        }
    }

    fn utf16(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    #[test]
    fn test_factory_defaults() {
        let engine = LayoutEngine::create(&MonoFont, None, None).unwrap();
        assert_eq!(engine.typo_flags(), TypoFlags::default());
        assert_eq!(engine.glyph_count(), 0);
        assert_eq!(engine.origin(), Point::ZERO);
        assert!(!engine.uses_opentype());
    }

    #[test]
    fn test_config_builder() {
        let config = EngineConfig::default()
            .script(rustybuzz::script::ARABIC)
            .language("ar")
            .typo_flags(TypoFlags::KERNING)
            .initial_capacity(8);
        let engine = LayoutEngine::new(&MonoFont, config).unwrap();

        assert_eq!(engine.script(), Some(rustybuzz::script::ARABIC));
        assert_eq!(engine.language().map(|l| l.as_str()), Some("ar"));
        assert_eq!(engine.typo_flags(), TypoFlags::KERNING);
        assert_eq!(engine.features.len(), 2);
    }

    #[test]
    fn test_script_codes() {
        assert_eq!(script_from_iso15924("Latn"), Some(rustybuzz::script::LATIN));
        assert_eq!(script_from_iso15924("Arab"), Some(rustybuzz::script::ARABIC));
        assert_eq!(script_from_iso15924("Latin"), None);
    }

    #[test]
    fn test_shape_sets_origin() {
        let text = utf16("abc");
        let mut engine = LayoutEngine::create(&MonoFont, None, None).unwrap();
        engine.shape(&text, 0, 3, 3, false, 5.0, 7.0).unwrap();

        assert_eq!(engine.origin(), Point::new(5.0, 7.0));
        assert_eq!(engine.position(0).unwrap(), Point::new(5.0, 7.0));
        assert_eq!(engine.position(2).unwrap(), Point::new(25.0, 7.0));
    }

    #[test]
    fn test_rejected_range_keeps_result() {
        let text = utf16("abc");
        let mut engine = LayoutEngine::create(&MonoFont, None, None).unwrap();
        engine.shape(&text, 0, 3, 3, false, 1.0, 1.0).unwrap();

        for (offset, count, len) in [(1, 3, 3), (3, 0, 3), (0, 1, 4), (0, usize::MAX, 3)] {
            let result = engine.shape(&text, offset, count, len, false, 9.0, 9.0);
            assert!(matches!(result, Err(LayoutError::IllegalArgument(_))));
        }

        assert_eq!(engine.glyph_count(), 3);
        assert_eq!(engine.origin(), Point::new(1.0, 1.0));
    }

    #[test]
    fn test_reset() {
        let text = utf16("abc");
        let mut engine = LayoutEngine::create(&MonoFont, None, None).unwrap();
        engine.shape(&text, 0, 3, 3, false, 4.0, 4.0).unwrap();

        engine.reset();
        assert_eq!(engine.glyph_count(), 0);
        assert_eq!(engine.origin(), Point::ZERO);
        assert_eq!(engine.positions_vec(), vec![0.0, 0.0]);
        assert!(engine.position(0).is_err());
    }

    #[test]
    fn test_positions_vec_matches_positions() {
        let text = utf16("abcd");
        let mut engine = LayoutEngine::create(&MonoFont, None, None).unwrap();
        engine.shape(&text, 1, 2, 4, false, 2.0, 3.0).unwrap();

        let mut positions = [0.0f32; 6];
        engine.positions(&mut positions).unwrap();
        assert_eq!(engine.positions_vec(), positions.to_vec());
        assert_eq!(positions, [2.0, 3.0, 12.0, 3.0, 22.0, 3.0]);
    }

    #[test]
    fn test_output_too_small() {
        let text = utf16("abc");
        let mut engine = LayoutEngine::create(&MonoFont, None, None).unwrap();
        engine.shape(&text, 0, 3, 3, false, 0.0, 0.0).unwrap();

        let mut ids = [7u32; 2];
        assert!(engine.glyph_ids(&mut ids, 0).is_err());
        assert_eq!(ids, [7, 7]);

        let mut positions = [0.0f32; 7];
        assert!(engine.positions(&mut positions).is_err());
    }

    #[test]
    fn test_glyph_id_forms() {
        let text = utf16("a\u{10400}");
        let mut engine = LayoutEngine::create(&MonoFont, None, None).unwrap();
        engine.shape(&text, 0, text.len(), text.len(), false, 0.0, 0.0).unwrap();

        let mut wide = [0u32; 2];
        engine.glyph_ids(&mut wide, 0x8000_0000).unwrap();
        assert_eq!(wide, [0x8000_0061, 0x8001_0400]);

        let mut narrow = [0u16; 2];
        engine.glyph_ids16(&mut narrow).unwrap();
        assert_eq!(narrow, [0x61, 0x0400]);

        assert_eq!(engine.char_indices_vec(0), vec![0, 1]);
    }
}

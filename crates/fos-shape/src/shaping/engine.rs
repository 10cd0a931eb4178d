//! Engine font handle
//!
//! Binds a font provider to the shaping engine. When the provider exposes
//! the core sfnt tables the text goes through rustybuzz, with horizontal
//! advances taken from the provider and adjusted by positioning; otherwise
//! glyphs are mapped one per character through the bridge callbacks.

use std::fmt;

use rustybuzz::ttf_parser::{self, GlyphId, RawFaceTables, Tag};
use rustybuzz::{Direction, Feature};

use super::buffer::{GlyphBuffer, GlyphRecord};
use crate::fixed::Fixed;
use crate::font::{FontBridge, FontInstance};

/// Font handle bound to one provider for the lifetime of a session
pub struct EngineFont<'a> {
    bridge: FontBridge<'a>,
    /// OpenType face assembled from the provider's tables
    face: Option<rustybuzz::Face<'a>>,
}

impl<'a> EngineFont<'a> {
    /// Bind a provider
    pub fn new(font: &'a dyn FontInstance) -> Self {
        let bridge = FontBridge::new(font);
        let face = load_face(&bridge);

        tracing::debug!(
            opentype = face.is_some(),
            scale = ?bridge.scale(),
            ppem = ?bridge.ppem(),
            "Bound shaping font"
        );

        Self { bridge, face }
    }

    pub fn bridge(&self) -> &FontBridge<'a> {
        &self.bridge
    }

    /// Whether text is shaped through the OpenType tables
    pub fn uses_opentype(&self) -> bool {
        self.face.is_some()
    }

    /// Shape the queued text of `buffer`, replacing its glyph records
    pub fn shape(&self, buffer: &mut GlyphBuffer, features: &[Feature]) {
        match &self.face {
            Some(face) => self.shape_opentype(face, buffer, features),
            None => self.shape_nominal(buffer),
        }
    }

    fn shape_opentype(&self, face: &rustybuzz::Face<'a>, buffer: &mut GlyphBuffer, features: &[Feature]) {
        let mut unicode = buffer.take_unicode_buffer();
        unicode.set_direction(buffer.direction());
        if let Some(script) = buffer.script() {
            unicode.set_script(script);
        }
        unicode.set_flags(buffer.flags());
        unicode.set_pre_context(&buffer.pre_context().iter().collect::<String>());
        unicode.set_post_context(&buffer.post_context().iter().collect::<String>());
        for &(ch, cluster) in buffer.input() {
            unicode.add(ch, cluster);
        }

        let output = rustybuzz::shape(face, features, unicode);

        let upem = face.units_per_em() as i64;
        let (x_scale, y_scale) = self.bridge.scale();
        let x = |v: i32| em_scale(v, x_scale, upem);
        let y = |v: i32| em_scale(v, y_scale, upem);

        for (info, pos) in output.glyph_infos().iter().zip(output.glyph_positions()) {
            // Provider advance plus whatever GPOS changed relative to hmtx
            let nominal = u16::try_from(info.glyph_id)
                .ok()
                .and_then(|id| face.glyph_hor_advance(GlyphId(id)))
                .unwrap_or(0) as i32;
            let x_advance = self.bridge.glyph_h_advance(info.glyph_id) + x(pos.x_advance - nominal);

            buffer.push_record(GlyphRecord {
                glyph_id: info.glyph_id,
                cluster: info.cluster,
                x_advance,
                y_advance: y(pos.y_advance),
                x_offset: x(pos.x_offset),
                y_offset: y(pos.y_offset),
            });
        }

        buffer.recycle_unicode_buffer(output.clear());
    }

    fn shape_nominal(&self, buffer: &mut GlyphBuffer) {
        for index in 0..buffer.input().len() {
            let (ch, cluster) = buffer.input()[index];
            let glyph_id = self.bridge.glyph(ch, None);
            buffer.push_record(GlyphRecord {
                glyph_id,
                cluster,
                x_advance: self.bridge.glyph_h_advance(glyph_id),
                ..GlyphRecord::default()
            });
        }

        if buffer.direction() == Direction::RightToLeft {
            buffer.reverse_records();
        }
    }
}

impl fmt::Debug for EngineFont<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineFont")
            .field("bridge", &self.bridge)
            .field("opentype", &self.face.is_some())
            .finish()
    }
}

/// Font units to engine units at `scale` per em
fn em_scale(value: i32, scale: Fixed, upem: i64) -> Fixed {
    if upem == 0 {
        return Fixed::ZERO;
    }
    let scaled = value as f64 * scale.to_bits() as f64 / upem as f64;
    Fixed::from_bits(scaled.round() as i32)
}

/// Assemble an OpenType face from the provider's tables.
///
/// `None` when `head`, `hhea` or `maxp` is absent, or the tables don't parse.
fn load_face<'a>(bridge: &FontBridge<'a>) -> Option<rustybuzz::Face<'a>> {
    let table = |tag: &[u8; 4]| Some(bridge.reference_table(Tag::from_bytes(tag))).filter(|data| !data.is_empty());

    let tables = RawFaceTables {
        head: table(b"head")?,
        hhea: table(b"hhea")?,
        maxp: table(b"maxp")?,
        cff: table(b"CFF "),
        cmap: table(b"cmap"),
        glyf: table(b"glyf"),
        hmtx: table(b"hmtx"),
        kern: table(b"kern"),
        loca: table(b"loca"),
        os2: table(b"OS/2"),
        post: table(b"post"),
        vhea: table(b"vhea"),
        vmtx: table(b"vmtx"),
        gdef: table(b"GDEF"),
        gpos: table(b"GPOS"),
        gsub: table(b"GSUB"),
        ..RawFaceTables::default()
    };

    match ttf_parser::Face::from_raw_tables(tables) {
        Ok(face) => {
            let mut face = rustybuzz::Face::from_face(face);
            let (x_ppem, y_ppem) = bridge.ppem();
            face.set_pixels_per_em(Some((x_ppem, y_ppem)));
            Some(face)
        }
        Err(err) => {
            tracing::warn!("Font tables unusable, shaping nominally: {}", err);
            None
        }
    }
}

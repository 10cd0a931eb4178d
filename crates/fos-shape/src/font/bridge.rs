//! Font capability bridge
//!
//! Adapts a [`FontInstance`] to the queries issued by the shaping engine:
//! table lookup, nominal glyph mapping, horizontal advance and contour
//! point, all answered in engine fixed-point units.

use std::fmt;
use std::sync::OnceLock;

use rustybuzz::ttf_parser::Tag;

use super::FontInstance;
use crate::fixed::{Fixed, to_fixed_units};

/// Engine-facing callback table shared by every session.
///
/// Built once per process by [`font_funcs`].
#[derive(Clone, Copy)]
pub struct FontFuncs {
    /// Character (plus optional variation selector) to glyph id, `0` for none
    pub glyph: fn(&dyn FontInstance, char, Option<char>) -> u32,
    /// Horizontal advance of a glyph
    pub glyph_h_advance: fn(&dyn FontInstance, u32) -> Fixed,
    /// Contour point of a glyph by index
    pub glyph_contour_point: fn(&dyn FontInstance, u32, u32) -> Option<(Fixed, Fixed)>,
}

impl fmt::Debug for FontFuncs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontFuncs").finish_non_exhaustive()
    }
}

impl FontFuncs {
    fn new() -> Self {
        tracing::debug!("Binding font callback table");
        Self {
            glyph: get_glyph,
            glyph_h_advance: get_glyph_h_advance,
            glyph_contour_point: get_glyph_contour_point,
        }
    }
}

fn get_glyph(font: &dyn FontInstance, unicode: char, _variation_selector: Option<char>) -> u32 {
    font.map_char_to_glyph(unicode)
}

fn get_glyph_h_advance(font: &dyn FontInstance, glyph: u32) -> Fixed {
    to_fixed_units(font.glyph_advance(glyph).x)
}

fn get_glyph_contour_point(
    font: &dyn FontInstance,
    glyph: u32,
    point_index: u32,
) -> Option<(Fixed, Fixed)> {
    let point = font.glyph_point(glyph, point_index)?;
    Some((to_fixed_units(point.x), to_fixed_units(point.y)))
}

/// Global callback table
static FONT_FUNCS: OnceLock<FontFuncs> = OnceLock::new();

/// Get the process-wide callback table, building it on first use.
///
/// Racing initializers may each build a table; only the first one is
/// published and the rest are dropped.
pub fn font_funcs() -> &'static FontFuncs {
    FONT_FUNCS.get_or_init(FontFuncs::new)
}

/// A font provider bound to the engine callback table, with its scale.
#[derive(Clone, Copy)]
pub struct FontBridge<'a> {
    font: &'a dyn FontInstance,
    funcs: &'static FontFuncs,
    x_scale: Fixed,
    y_scale: Fixed,
    ppem: (u16, u16),
}

impl<'a> FontBridge<'a> {
    /// Bind a provider and capture its scale and ppem
    pub fn new(font: &'a dyn FontInstance) -> Self {
        let (x_ppem, y_ppem) = font.pixels_per_em();
        let (x_factor, y_factor) = font.scale_factor();

        Self {
            font,
            funcs: font_funcs(),
            x_scale: to_fixed_units(x_ppem * x_factor),
            // Engine +y is up, device +y is down
            y_scale: -to_fixed_units(y_ppem * y_factor),
            ppem: (x_ppem as u16, y_ppem as u16),
        }
    }

    /// The bound provider
    pub fn font(&self) -> &'a dyn FontInstance {
        self.font
    }

    /// Table bytes for `tag`; empty when the provider has no such table
    pub fn reference_table(&self, tag: Tag) -> &'a [u8] {
        self.font.font_table(tag).unwrap_or(&[])
    }

    /// Nominal glyph for a character, `0` for `.notdef`
    pub fn glyph(&self, unicode: char, variation_selector: Option<char>) -> u32 {
        (self.funcs.glyph)(self.font, unicode, variation_selector)
    }

    /// Horizontal advance in engine units
    pub fn glyph_h_advance(&self, glyph: u32) -> Fixed {
        (self.funcs.glyph_h_advance)(self.font, glyph)
    }

    /// Contour point in engine units
    pub fn glyph_contour_point(&self, glyph: u32, point_index: u32) -> Option<(Fixed, Fixed)> {
        (self.funcs.glyph_contour_point)(self.font, glyph, point_index)
    }

    /// Font scale as (x, y); y is negative
    pub fn scale(&self) -> (Fixed, Fixed) {
        (self.x_scale, self.y_scale)
    }

    /// Raw pixels per em, unscaled
    pub fn ppem(&self) -> (u16, u16) {
        self.ppem
    }
}

impl fmt::Debug for FontBridge<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontBridge")
            .field("x_scale", &self.x_scale)
            .field("y_scale", &self.y_scale)
            .field("ppem", &self.ppem)
            .finish_non_exhaustive()
    }
}

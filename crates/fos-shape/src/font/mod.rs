//! Font capability module
//!
//! A [`FontInstance`] is the font-metrics provider a shaping session talks
//! to. The [`FontBridge`] adapts it to the queries the shaping engine
//! issues, in engine fixed-point units.

mod bridge;
mod face;
mod points;

pub use bridge::{FontBridge, FontFuncs, font_funcs};
pub use face::FaceInstance;
pub use points::GlyfTable;

use rustybuzz::ttf_parser::Tag;

/// A point or vector in device pixels (+y down)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Font-metrics provider consumed by the shaping engine.
///
/// All metrics are in device pixels. A provider must not change its answers
/// while a session is bound to it.
pub trait FontInstance {
    /// Raw bytes of the table with `tag`, or `None` if the font has no such table.
    fn font_table(&self, tag: Tag) -> Option<&[u8]>;

    /// Glyph id for a character. `0` means no glyph (`.notdef`).
    fn map_char_to_glyph(&self, ch: char) -> u32;

    /// Advance of a glyph.
    fn glyph_advance(&self, glyph: u32) -> Point;

    /// Outline point `point_index` of a glyph, or `None` if the glyph has
    /// no such point.
    fn glyph_point(&self, glyph: u32, point_index: u32) -> Option<Point>;

    /// Pixels per em as (x, y).
    fn pixels_per_em(&self) -> (f32, f32);

    /// Extra scale applied on top of the pixels per em, as (x, y).
    fn scale_factor(&self) -> (f32, f32) {
        (1.0, 1.0)
    }
}

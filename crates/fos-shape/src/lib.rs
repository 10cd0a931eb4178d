//! fOS Shape - Glyph Run Shaping
//!
//! This crate turns a run of UTF-16 text into positioned glyphs for the
//! fOS text stack:
//! - Fixed-point conversion between engine units and device pixels
//! - Font capability bridge over any [`FontInstance`] provider
//! - Shaping sessions backed by rustybuzz (HarfBuzz port)
//! - Glyph id, cluster and pen-position extraction
//!
//! # Example
//! ```rust,ignore
//! use fos_shape::{FaceInstance, LayoutEngine, script};
//!
//! let font = FaceInstance::parse(&data, 0, 16.0)?;
//! let mut engine = LayoutEngine::create(&font, Some(script::LATIN), None)?;
//! let text: Vec<u16> = "Hello".encode_utf16().collect();
//! let count = engine.shape(&text, 0, text.len(), text.len(), false, 0.0, 0.0)?;
//! let positions = engine.positions_vec();
//! ```

pub mod fixed;
pub mod font;
pub mod shaping;

pub use fixed::{Fixed, to_device_units, to_fixed_units};
pub use font::{FaceInstance, FontBridge, FontFuncs, FontInstance, GlyfTable, Point, font_funcs};
pub use shaping::{
    CONTEXT_LENGTH, EngineConfig, EngineFont, GlyphBuffer, GlyphRecord, LayoutEngine,
    PositionedGlyph, PositionedGlyphs, TypoFlags, script_from_iso15924,
};

pub use rustybuzz::ttf_parser::Tag;
pub use rustybuzz::{BufferFlags, Direction, Language, Script, script};

/// Shaping error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("Memory allocation failed")]
    AllocationError,

    #[error("Illegal argument: {0}")]
    IllegalArgument(&'static str),

    #[error("Failed to parse font: {0}")]
    FontParsing(String),
}

pub type Result<T> = std::result::Result<T, LayoutError>;

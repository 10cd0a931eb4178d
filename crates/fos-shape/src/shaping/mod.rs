//! Text shaping module

mod buffer;
mod engine;
mod flags;
mod run;
mod session;

pub use buffer::{CONTEXT_LENGTH, GlyphBuffer, GlyphRecord};
pub use engine::EngineFont;
pub use flags::TypoFlags;
pub use run::{PositionedGlyph, PositionedGlyphs};
pub use session::{EngineConfig, LayoutEngine, script_from_iso15924};

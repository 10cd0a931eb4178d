//! Reusable glyph buffer
//!
//! Holds the characters queued for shaping (with their surrounding
//! context), the segment properties, and after shaping the glyph records.

use rustybuzz::{BufferFlags, Direction, Script, UnicodeBuffer};

use crate::fixed::Fixed;
use crate::{LayoutError, Result};

/// Characters of context kept on each side of the shaped text
pub const CONTEXT_LENGTH: usize = 5;

/// A shaped glyph in engine units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GlyphRecord {
    /// Glyph ID in the font
    pub glyph_id: u32,
    /// Index of the originating UTF-16 code unit in the caller's context
    pub cluster: u32,
    /// Horizontal advance
    pub x_advance: Fixed,
    /// Vertical advance
    pub y_advance: Fixed,
    /// X offset from the pen
    pub x_offset: Fixed,
    /// Y offset from the pen
    pub y_offset: Fixed,
}

/// Glyph buffer owned by a shaping session
pub struct GlyphBuffer {
    direction: Direction,
    script: Option<Script>,
    flags: BufferFlags,
    pre_context: Vec<char>,
    post_context: Vec<char>,
    /// Queued characters with their clusters
    input: Vec<(char, u32)>,
    /// Shaping result
    records: Vec<GlyphRecord>,
    /// Engine buffer kept between calls
    unicode: Option<UnicodeBuffer>,
}

impl GlyphBuffer {
    /// Create an empty buffer with room for `capacity` characters
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let mut input = Vec::new();
        let mut records = Vec::new();
        input.try_reserve(capacity).map_err(|_| LayoutError::AllocationError)?;
        records.try_reserve(capacity).map_err(|_| LayoutError::AllocationError)?;

        Ok(Self {
            direction: Direction::LeftToRight,
            script: None,
            flags: BufferFlags::empty(),
            pre_context: Vec::with_capacity(CONTEXT_LENGTH),
            post_context: Vec::with_capacity(CONTEXT_LENGTH),
            input,
            records,
            unicode: None,
        })
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    pub fn script(&self) -> Option<Script> {
        self.script
    }

    pub fn set_script(&mut self, script: Option<Script>) {
        self.script = script;
    }

    pub fn flags(&self) -> BufferFlags {
        self.flags
    }

    pub fn set_flags(&mut self, flags: BufferFlags) {
        self.flags = flags;
    }

    /// Context before the shaped text, in text order
    pub fn pre_context(&self) -> &[char] {
        &self.pre_context
    }

    /// Context after the shaped text, in text order
    pub fn post_context(&self) -> &[char] {
        &self.post_context
    }

    /// Characters queued for shaping with their clusters
    pub fn input(&self) -> &[(char, u32)] {
        &self.input
    }

    /// Glyph records of the last shaping pass
    pub fn records(&self) -> &[GlyphRecord] {
        &self.records
    }

    /// Number of glyphs
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop queued text, context and glyphs. Segment properties are kept.
    pub fn clear(&mut self) {
        self.pre_context.clear();
        self.post_context.clear();
        self.input.clear();
        self.records.clear();
    }

    /// Make room for `additional` more queued characters
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        self.input.try_reserve(additional).map_err(|_| LayoutError::AllocationError)?;
        self.records.try_reserve(additional).map_err(|_| LayoutError::AllocationError)
    }

    /// Queue `text[item_offset..item_offset + item_length]` for shaping.
    ///
    /// Clusters are absolute indices into `text`. Pre-context is captured
    /// only while nothing is queued yet; post-context is replaced by every
    /// call. Unpaired surrogates decode to U+FFFD.
    pub fn add_utf16(&mut self, text: &[u16], item_offset: usize, item_length: usize) {
        let item_end = (item_offset + item_length).min(text.len());
        let item_offset = item_offset.min(item_end);

        if self.input.is_empty() && item_offset > 0 {
            self.pre_context.clear();
            let mut end = item_offset;
            while self.pre_context.len() < CONTEXT_LENGTH && end > 0 {
                let (ch, start) = decode_before(text, end);
                self.pre_context.push(ch);
                end = start;
            }
            self.pre_context.reverse();
        }

        let mut cluster = item_offset;
        for decoded in char::decode_utf16(text[item_offset..item_end].iter().copied()) {
            let (ch, len) = match decoded {
                Ok(ch) => (ch, ch.len_utf16()),
                Err(_) => (char::REPLACEMENT_CHARACTER, 1),
            };
            self.input.push((ch, cluster as u32));
            cluster += len;
        }

        self.post_context.clear();
        self.post_context.extend(
            char::decode_utf16(text[item_end..].iter().copied())
                .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
                .take(CONTEXT_LENGTH),
        );
    }

    pub(crate) fn push_record(&mut self, record: GlyphRecord) {
        self.records.push(record);
    }

    pub(crate) fn reverse_records(&mut self) {
        self.records.reverse();
    }

    pub(crate) fn take_unicode_buffer(&mut self) -> UnicodeBuffer {
        self.unicode.take().unwrap_or_else(UnicodeBuffer::new)
    }

    pub(crate) fn recycle_unicode_buffer(&mut self, buffer: UnicodeBuffer) {
        self.unicode = Some(buffer);
    }
}

/// Decode the character ending at `end`, returning it and its start index
fn decode_before(text: &[u16], end: usize) -> (char, usize) {
    let last = text[end - 1];
    if (0xDC00..0xE000).contains(&last) && end >= 2 {
        let high = text[end - 2];
        if (0xD800..0xDC00).contains(&high) {
            let code = 0x10000 + (((high as u32) - 0xD800) << 10) + ((last as u32) - 0xDC00);
            if let Some(ch) = char::from_u32(code) {
                return (ch, end - 2);
            }
        }
    }
    (char::from_u32(last as u32).unwrap_or(char::REPLACEMENT_CHARACTER), end - 1)
}

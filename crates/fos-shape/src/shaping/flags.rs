//! Typographic flags

use std::ops::{BitOr, BitOrAssign};

use rustybuzz::Feature;
use rustybuzz::ttf_parser::Tag;

/// Optional shaping behaviors, as a bitset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypoFlags(u32);

impl TypoFlags {
    pub const NONE: TypoFlags = TypoFlags(0);
    pub const KERNING: TypoFlags = TypoFlags(0x1);
    pub const LIGATURES: TypoFlags = TypoFlags(0x2);

    /// Create from raw bits; unknown bits are kept and ignored
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Get raw bits
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Check whether every bit of `other` is set
    pub const fn contains(self, other: TypoFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Feature overrides for the engine.
    ///
    /// Enabled behaviors are left to the engine defaults, so the default
    /// flags produce an empty list.
    pub fn features(self) -> Vec<Feature> {
        let mut features = Vec::new();
        if !self.contains(Self::KERNING) {
            features.push(Feature::new(Tag::from_bytes(b"kern"), 0, ..));
        }
        if !self.contains(Self::LIGATURES) {
            features.push(Feature::new(Tag::from_bytes(b"liga"), 0, ..));
            features.push(Feature::new(Tag::from_bytes(b"clig"), 0, ..));
        }
        features
    }
}

impl Default for TypoFlags {
    /// Kerning and ligatures
    fn default() -> Self {
        Self::KERNING | Self::LIGATURES
    }
}

impl BitOr for TypoFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for TypoFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(flags: TypoFlags) -> Vec<Tag> {
        flags.features().iter().map(|f| f.tag).collect()
    }

    #[test]
    fn test_default_flags() {
        let flags = TypoFlags::default();
        assert_eq!(flags.bits(), 3);
        assert!(flags.contains(TypoFlags::KERNING));
        assert!(flags.contains(TypoFlags::LIGATURES));
        assert!(flags.features().is_empty());
    }

    #[test]
    fn test_disabled_features() {
        assert_eq!(tags(TypoFlags::LIGATURES), vec![Tag::from_bytes(b"kern")]);
        assert_eq!(
            tags(TypoFlags::KERNING),
            vec![Tag::from_bytes(b"liga"), Tag::from_bytes(b"clig")]
        );
        assert_eq!(TypoFlags::NONE.features().len(), 3);
        assert!(TypoFlags::NONE.features().iter().all(|f| f.value == 0));
    }

    #[test]
    fn test_unknown_bits_ignored() {
        let mut flags = TypoFlags::from_bits(0x80);
        flags |= TypoFlags::KERNING;
        assert_eq!(flags.bits(), 0x81);
        assert!(!flags.contains(TypoFlags::LIGATURES));
    }
}

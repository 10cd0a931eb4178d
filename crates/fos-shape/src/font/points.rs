//! TrueType contour points (glyf/loca tables)
//!
//! Decodes the point list of a glyph in font units, indexed the way
//! anchor-point positioning addresses them: simple glyphs in storage
//! order, composite glyphs as the concatenation of their components.

/// Composite nesting limit
const MAX_COMPONENT_DEPTH: u8 = 8;

const X_SHORT: u8 = 0x02;
const Y_SHORT: u8 = 0x04;
const REPEAT: u8 = 0x08;
const X_SAME_OR_POSITIVE: u8 = 0x10;
const Y_SAME_OR_POSITIVE: u8 = 0x20;

const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
const ARGS_ARE_XY_VALUES: u16 = 0x0002;
const WE_HAVE_A_SCALE: u16 = 0x0008;
const MORE_COMPONENTS: u16 = 0x0020;
const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 0x0040;
const WE_HAVE_A_TWO_BY_TWO: u16 = 0x0080;

/// Big-endian reader with bounds checking
struct TableReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> TableReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn skip(&mut self, n: usize) -> Option<()> {
        if self.pos + n > self.data.len() {
            return None;
        }
        self.pos += n;
        Some(())
    }

    fn read_u8(&mut self) -> Option<u8> {
        let v = *self.data.get(self.pos)?;
        self.pos += 1;
        Some(v)
    }

    fn read_u16(&mut self) -> Option<u16> {
        let bytes = self.data.get(self.pos..self.pos + 2)?;
        self.pos += 2;
        Some(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn read_i16(&mut self) -> Option<i16> {
        Some(self.read_u16()? as i16)
    }

    fn read_u32(&mut self) -> Option<u32> {
        let bytes = self.data.get(self.pos..self.pos + 4)?;
        self.pos += 4;
        Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

/// Point access over a font's `glyf` and `loca` tables
///
/// Backs [`FaceInstance`](super::FaceInstance)'s contour-point lookup for
/// callers of [`FontBridge::glyph_contour_point`](super::FontBridge::glyph_contour_point).
/// Shaping itself never reads it: rustybuzz resolves GPOS anchor points
/// from the tables directly.
#[derive(Debug, Clone, Copy)]
pub struct GlyfTable<'a> {
    glyf: &'a [u8],
    loca: &'a [u8],
    long_offsets: bool,
}

impl<'a> GlyfTable<'a> {
    /// Build from raw `head`, `loca` and `glyf` tables
    pub fn new(head: &[u8], loca: &'a [u8], glyf: &'a [u8]) -> Option<Self> {
        // indexToLocFormat
        let mut reader = TableReader::new(head);
        reader.skip(50)?;
        let long_offsets = reader.read_i16()? != 0;
        Some(Self { glyf, loca, long_offsets })
    }

    /// Point `index` of `glyph` in font units (+y up)
    pub fn point(&self, glyph: u16, index: u32) -> Option<(i32, i32)> {
        let points = self.points(glyph)?;
        points.get(index as usize).copied()
    }

    /// All points of `glyph` in font units
    pub fn points(&self, glyph: u16) -> Option<Vec<(i32, i32)>> {
        let mut points = Vec::new();
        self.collect_points(glyph, 0, &mut points)?;
        Some(points)
    }

    fn glyph_data(&self, glyph: u16) -> Option<&'a [u8]> {
        let mut reader = TableReader::new(self.loca);
        let (start, end) = if self.long_offsets {
            reader.skip(glyph as usize * 4)?;
            (reader.read_u32()?, reader.read_u32()?)
        } else {
            reader.skip(glyph as usize * 2)?;
            (reader.read_u16()? as u32 * 2, reader.read_u16()? as u32 * 2)
        };

        if start > end {
            return None;
        }
        self.glyf.get(start as usize..end as usize)
    }

    fn collect_points(&self, glyph: u16, depth: u8, points: &mut Vec<(i32, i32)>) -> Option<()> {
        if depth > MAX_COMPONENT_DEPTH {
            return None;
        }

        let data = self.glyph_data(glyph)?;
        if data.is_empty() {
            return Some(()); // Empty glyph
        }

        let num_contours = TableReader::new(data).read_i16()?;
        if num_contours >= 0 {
            simple_points(data, num_contours as u16, points)
        } else {
            self.composite_points(data, depth, points)
        }
    }

    fn composite_points(&self, data: &[u8], depth: u8, points: &mut Vec<(i32, i32)>) -> Option<()> {
        let mut reader = TableReader::new(data);
        reader.skip(10)?; // Skip header

        loop {
            let flags = reader.read_u16()?;
            let component = reader.read_u16()?;

            let (arg1, arg2) = if flags & ARG_1_AND_2_ARE_WORDS != 0 {
                (reader.read_i16()? as i32, reader.read_i16()? as i32)
            } else {
                (reader.read_u8()? as i8 as i32, reader.read_u8()? as i8 as i32)
            };
            // Point-matched components are placed without offset
            let (dx, dy) = if flags & ARGS_ARE_XY_VALUES != 0 { (arg1, arg2) } else { (0, 0) };

            if flags & WE_HAVE_A_SCALE != 0 {
                reader.skip(2)?;
            } else if flags & WE_HAVE_AN_X_AND_Y_SCALE != 0 {
                reader.skip(4)?;
            } else if flags & WE_HAVE_A_TWO_BY_TWO != 0 {
                reader.skip(8)?;
            }

            let start = points.len();
            self.collect_points(component, depth + 1, points)?;
            for point in &mut points[start..] {
                point.0 += dx;
                point.1 += dy;
            }

            if flags & MORE_COMPONENTS == 0 {
                return Some(());
            }
        }
    }
}

fn simple_points(data: &[u8], num_contours: u16, points: &mut Vec<(i32, i32)>) -> Option<()> {
    if num_contours == 0 {
        return Some(());
    }

    let mut reader = TableReader::new(data);
    reader.skip(10)?; // Skip header

    let mut last_end = 0u16;
    for _ in 0..num_contours {
        last_end = reader.read_u16()?;
    }
    let num_points = last_end as usize + 1;

    // Skip instructions
    let instruction_length = reader.read_u16()? as usize;
    reader.skip(instruction_length)?;

    let mut flags = Vec::with_capacity(num_points);
    while flags.len() < num_points {
        let flag = reader.read_u8()?;
        flags.push(flag);

        if flag & REPEAT != 0 {
            let repeat_count = reader.read_u8()? as usize;
            for _ in 0..repeat_count {
                flags.push(flag);
            }
        }
    }
    flags.truncate(num_points);

    let xs = read_coordinates(&mut reader, &flags, X_SHORT, X_SAME_OR_POSITIVE)?;
    let ys = read_coordinates(&mut reader, &flags, Y_SHORT, Y_SAME_OR_POSITIVE)?;

    points.extend(xs.into_iter().zip(ys));
    Some(())
}

fn read_coordinates(
    reader: &mut TableReader<'_>,
    flags: &[u8],
    short_bit: u8,
    same_or_positive_bit: u8,
) -> Option<Vec<i32>> {
    let mut coords = Vec::with_capacity(flags.len());
    let mut value = 0i32;

    for &flag in flags {
        let same_or_positive = flag & same_or_positive_bit != 0;

        if flag & short_bit != 0 {
            let delta = reader.read_u8()? as i32;
            value += if same_or_positive { delta } else { -delta };
        } else if !same_or_positive {
            value += reader.read_i16()? as i32;
        }
        // else: same as previous

        coords.push(value);
    }

    Some(coords)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ON_CURVE: u8 = 0x01;

    /// `head` with short loca offsets
    fn head_table() -> Vec<u8> {
        vec![0; 54]
    }

    /// glyph 0: empty, glyph 1: triangle, glyph 2: composite of glyph 1 shifted by (10, -5)
    fn glyf_and_loca() -> (Vec<u8>, Vec<u8>) {
        let mut triangle = Vec::new();
        triangle.extend_from_slice(&1i16.to_be_bytes()); // numberOfContours
        triangle.extend_from_slice(&[0; 8]); // bbox
        triangle.extend_from_slice(&2u16.to_be_bytes()); // endPtsOfContours
        triangle.extend_from_slice(&0u16.to_be_bytes()); // instructionLength
        // (0,0) long coords, (100,0) short x, (50,200) long x and long y
        triangle.extend_from_slice(&[
            ON_CURVE | X_SAME_OR_POSITIVE | Y_SAME_OR_POSITIVE,
            ON_CURVE | X_SHORT | X_SAME_OR_POSITIVE | Y_SAME_OR_POSITIVE,
            ON_CURVE,
        ]);
        triangle.push(100); // x1 delta
        triangle.extend_from_slice(&(-50i16).to_be_bytes()); // x2 delta
        triangle.extend_from_slice(&200i16.to_be_bytes()); // y2 delta
        if triangle.len() % 2 != 0 {
            triangle.push(0);
        }

        let mut composite = Vec::new();
        composite.extend_from_slice(&(-1i16).to_be_bytes());
        composite.extend_from_slice(&[0; 8]);
        composite.extend_from_slice(&(ARG_1_AND_2_ARE_WORDS | ARGS_ARE_XY_VALUES).to_be_bytes());
        composite.extend_from_slice(&1u16.to_be_bytes());
        composite.extend_from_slice(&10i16.to_be_bytes());
        composite.extend_from_slice(&(-5i16).to_be_bytes());

        let mut glyf = Vec::new();
        let mut loca = Vec::new();
        loca.extend_from_slice(&0u16.to_be_bytes());
        loca.extend_from_slice(&0u16.to_be_bytes());
        glyf.extend_from_slice(&triangle);
        loca.extend_from_slice(&((glyf.len() / 2) as u16).to_be_bytes());
        glyf.extend_from_slice(&composite);
        loca.extend_from_slice(&((glyf.len() / 2) as u16).to_be_bytes());
        (glyf, loca)
    }

    #[test]
    fn test_simple_glyph_points() {
        let head = head_table();
        let (glyf, loca) = glyf_and_loca();
        let table = GlyfTable::new(&head, &loca, &glyf).unwrap();

        assert_eq!(table.points(1).unwrap(), vec![(0, 0), (100, 0), (50, 200)]);
        assert_eq!(table.point(1, 2), Some((50, 200)));
        assert_eq!(table.point(1, 3), None);
    }

    #[test]
    fn test_composite_glyph_points() {
        let head = head_table();
        let (glyf, loca) = glyf_and_loca();
        let table = GlyfTable::new(&head, &loca, &glyf).unwrap();

        assert_eq!(table.points(2).unwrap(), vec![(10, -5), (110, -5), (60, 195)]);
    }

    #[test]
    fn test_empty_and_missing_glyphs() {
        let head = head_table();
        let (glyf, loca) = glyf_and_loca();
        let table = GlyfTable::new(&head, &loca, &glyf).unwrap();

        assert_eq!(table.points(0).unwrap(), vec![]);
        assert_eq!(table.point(0, 0), None);
        assert!(table.points(9).is_none());
    }

    #[test]
    fn test_truncated_head() {
        let (glyf, loca) = glyf_and_loca();
        assert!(GlyfTable::new(&[0; 20], &loca, &glyf).is_none());
    }
}

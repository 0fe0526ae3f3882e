//! Data types exchanged between the host and a filter backend.

/// One source frame extracted from the host.
#[derive(Clone, Debug, Default)]
pub struct ExtractedFrame {
    /// Host-defined frame counter.
    pub frame_id: u64,
    pub width: u32,
    pub height: u32,
    /// RGBA8, row-major, tightly packed. Length = width * height * 4.
    pub pixels: Vec<u8>,
}

impl ExtractedFrame {
    pub fn new(frame_id: u64, width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self { frame_id, width, height, pixels }
    }

    /// Non-empty and pixel length agrees with the extent.
    pub fn is_well_formed(&self) -> bool {
        self.width > 0 && self.height > 0 && self.pixels.len() == self.width as usize * self.height as usize * 4
    }
}

/// CPU copy of a distance field: `[to_inside, to_outside, signed, inside_mask]` per texel.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldImage {
    pub frame_id: u64,
    pub width: u32,
    pub height: u32,
    pub texels: Vec<[f32; 4]>,
}

impl FieldImage {
    pub fn texel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.texels.get(y as usize * self.width as usize + x as usize).copied()
    }

    /// Signed distance (channel B) at `x`, `y`.
    pub fn signed_distance(&self, x: u32, y: u32) -> Option<f32> {
        self.texel(x, y).map(|t| t[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_shape_checks() {
        assert!(ExtractedFrame::new(1, 2, 2, vec![0; 16]).is_well_formed());
        assert!(!ExtractedFrame::new(1, 2, 2, vec![0; 15]).is_well_formed());
        assert!(!ExtractedFrame::new(1, 0, 2, Vec::new()).is_well_formed());
    }

    #[test]
    fn texel_lookup_is_row_major() {
        let image = FieldImage {
            frame_id: 0,
            width: 2,
            height: 2,
            texels: vec![[0.0; 4], [1.0; 4], [2.0, 0.0, -3.0, 0.0], [3.0; 4]],
        };
        assert_eq!(image.texel(1, 0), Some([1.0; 4]));
        assert_eq!(image.signed_distance(0, 1), Some(-3.0));
        assert_eq!(image.texel(2, 0), None);
    }
}

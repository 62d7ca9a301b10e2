/// A detected person in frame pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub confidence: f64,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32, confidence: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            confidence,
        }
    }

    /// Builds a box from corner coordinates, clamped to a `frame_w` × `frame_h` frame.
    ///
    /// Returns `None` when nothing of the box remains inside the frame.
    pub fn from_corners(
        (x1, y1, x2, y2): (f64, f64, f64, f64),
        frame_w: u32,
        frame_h: u32,
        confidence: f64,
    ) -> Option<Self> {
        let left = x1.max(0.0).round() as i32;
        let top = y1.max(0.0).round() as i32;
        let right = x2.min(frame_w as f64).round() as i32;
        let bottom = y2.min(frame_h as f64).round() as i32;
        if right <= left || bottom <= top {
            return None;
        }
        Some(Self::new(left, top, right - left, bottom - top, confidence))
    }

    pub fn area(&self) -> i64 {
        self.width.max(0) as i64 * self.height.max(0) as i64
    }

    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let ix1 = self.x.max(other.x);
        let iy1 = self.y.max(other.y);
        let ix2 = (self.x + self.width).min(other.x + other.width);
        let iy2 = (self.y + self.height).min(other.y + other.height);

        let inter = (ix2 - ix1).max(0) as f64 * (iy2 - iy1).max(0) as f64;
        if inter == 0.0 {
            return 0.0;
        }

        let union = self.area() as f64 + other.area() as f64 - inter;
        inter / union
    }
}

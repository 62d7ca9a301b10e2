use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Draws rectangle outlines onto an RGB frame in place.
///
/// Box edges outside the frame are clipped; the stroke grows inward from
/// the box border.
pub fn draw_boxes(frame: &mut Frame, boxes: &[BoundingBox], color: [u8; 3], thickness: u32) {
    if frame.channels() < 3 {
        return;
    }
    let fw = frame.width() as i32;
    let fh = frame.height() as i32;
    let t = thickness.max(1) as i32;
    let mut pixels = frame.as_ndarray_mut();

    for b in boxes {
        let x1 = b.x.max(0);
        let y1 = b.y.max(0);
        let x2 = (b.x + b.width).min(fw);
        let y2 = (b.y + b.height).min(fh);
        if x2 <= x1 || y2 <= y1 {
            continue;
        }

        for y in y1..y2 {
            for x in x1..x2 {
                let on_edge = x < b.x + t
                    || x >= b.x + b.width - t
                    || y < b.y + t
                    || y >= b.y + b.height - t;
                if on_edge {
                    for (c, value) in color.iter().enumerate() {
                        pixels[[y as usize, x as usize, c]] = *value;
                    }
                }
            }
        }
    }
}

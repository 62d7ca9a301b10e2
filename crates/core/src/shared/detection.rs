use crate::shared::bounding_box::BoundingBox;

/// Persons found in one frame. Empty when nobody was detected.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Detection {
    boxes: Vec<BoundingBox>,
}

impl Detection {
    pub fn new(boxes: Vec<BoundingBox>) -> Self {
        Self { boxes }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn boxes(&self) -> &[BoundingBox] {
        &self.boxes
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }
}

impl From<Vec<BoundingBox>> for Detection {
    fn from(boxes: Vec<BoundingBox>) -> Self {
        Self::new(boxes)
    }
}

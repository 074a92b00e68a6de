use std::time::Instant;

use crate::{
    gesture::GestureLabel,
    landmarks::{HandLandmarks, LandmarkPoint},
};

/// Pixel offset from the wrist to where a hand's label is drawn.
pub const LABEL_ANCHOR_OFFSET: (i32, i32) = (-50, -50);

#[derive(Clone, Debug)]
pub struct Frame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub timestamp: Instant,
}

impl Frame {
    pub fn new(rgba: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            rgba,
            width,
            height,
            timestamp: Instant::now(),
        }
    }

    /// Horizontally flipped copy, i.e. the selfie view of a front camera.
    pub fn mirrored(&self) -> Frame {
        let row_len = self.width as usize * 4;
        let mut rgba = Vec::with_capacity(self.rgba.len());
        for row in self.rgba.chunks_exact(row_len.max(4)) {
            for px in row.chunks_exact(4).rev() {
                rgba.extend_from_slice(px);
            }
        }

        Frame {
            rgba,
            width: self.width,
            height: self.height,
            timestamp: self.timestamp,
        }
    }
}

/// One detected hand and the gesture it was classified as, if any.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandGesture {
    pub landmarks: HandLandmarks,
    pub label: Option<GestureLabel>,
}

impl HandGesture {
    /// Where the label text goes: the wrist shifted up and to the left.
    pub fn anchor(&self) -> Option<LandmarkPoint> {
        self.label?;
        Some(
            self.landmarks
                .wrist()
                .offset(LABEL_ANCHOR_OFFSET.0, LABEL_ANCHOR_OFFSET.1),
        )
    }

    pub fn display_text(&self) -> Option<String> {
        self.label
            .map(|label| format!("{}{}", label.emoji(), label.as_str()))
    }
}

#[derive(Clone, Debug)]
pub struct RecognizedFrame {
    pub frame: Frame,
    pub hands: Vec<HandGesture>,
}

impl RecognizedFrame {
    pub fn labels(&self) -> Vec<GestureLabel> {
        self.hands.iter().filter_map(|hand| hand.label).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::NUM_LANDMARKS;

    fn hand_at(x: i32, y: i32, label: Option<GestureLabel>) -> HandGesture {
        HandGesture {
            landmarks: HandLandmarks::new([LandmarkPoint::new(x, y); NUM_LANDMARKS]),
            label,
        }
    }

    #[test]
    fn anchor_is_offset_from_wrist() {
        let hand = hand_at(200, 300, Some(GestureLabel::Peace));
        assert_eq!(hand.anchor(), Some(LandmarkPoint::new(150, 250)));
    }

    #[test]
    fn unlabelled_hand_has_no_anchor() {
        let hand = hand_at(200, 300, None);
        assert_eq!(hand.anchor(), None);
        assert_eq!(hand.display_text(), None);
    }

    #[test]
    fn mirrored_reverses_each_row() {
        let rgba = vec![
            1, 1, 1, 255, 2, 2, 2, 255, //
            3, 3, 3, 255, 4, 4, 4, 255,
        ];
        let frame = Frame::new(rgba, 2, 2);
        let mirrored = frame.mirrored();
        assert_eq!(
            mirrored.rgba,
            vec![2, 2, 2, 255, 1, 1, 1, 255, 4, 4, 4, 255, 3, 3, 3, 255]
        );
        assert_eq!(mirrored.width, 2);
    }
}

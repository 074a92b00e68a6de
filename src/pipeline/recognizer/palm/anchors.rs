//! SSD anchor centers for the MediaPipe palm detector.
//!
//! The model has four output layers with strides 8, 16, 16 and 16. Layers that share a stride
//! share a feature map, so they are folded together here: 24x24 cells with 2 anchors each,
//! then 12x12 cells with 6 anchors each. Anchor sizes are fixed at 1.0, so only the centers
//! matter.

use super::super::common::PALM_INPUT_SIZE;

pub const NUM_ANCHORS: usize = 2016;

struct AnchorLayer {
    stride: u32,
    boxes_per_cell: u32,
}

const LAYERS: [AnchorLayer; 2] = [
    AnchorLayer {
        stride: 8,
        boxes_per_cell: 2,
    },
    AnchorLayer {
        stride: 16,
        boxes_per_cell: 6,
    },
];

/// Normalized `[x_center, y_center]` for every anchor, in model output order.
pub fn palm_anchors() -> Vec<[f32; 2]> {
    let mut anchors = Vec::with_capacity(NUM_ANCHORS);
    for layer in &LAYERS {
        let cells = PALM_INPUT_SIZE.div_ceil(layer.stride);
        for y in 0..cells {
            for x in 0..cells {
                let center = [
                    (x as f32 + 0.5) / cells as f32,
                    (y as f32 + 0.5) / cells as f32,
                ];
                for _ in 0..layer.boxes_per_cell {
                    anchors.push(center);
                }
            }
        }
    }
    anchors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_count_matches_model_output() {
        assert_eq!(palm_anchors().len(), NUM_ANCHORS);
    }

    #[test]
    fn first_and_last_anchor_centers() {
        let anchors = palm_anchors();
        assert_eq!(anchors[0], [0.5 / 24.0, 0.5 / 24.0]);
        assert_eq!(anchors[1], anchors[0]);
        assert_eq!(anchors[NUM_ANCHORS - 1], [11.5 / 12.0, 11.5 / 12.0]);
    }
}

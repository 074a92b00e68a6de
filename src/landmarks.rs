//! Hand landmark geometry in frame-pixel space.

use std::ops::Index;

use thiserror::Error;

pub const NUM_LANDMARKS: usize = 21;

/// Image coordinates: y grows toward the bottom of the frame, so a point that is visually
/// "above" another has the smaller y.
pub const Y_AXIS_POINTS_DOWN: bool = true;

pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const LITTLE_MCP: usize = 17;
pub const LITTLE_PIP: usize = 18;
pub const LITTLE_DIP: usize = 19;
pub const LITTLE_TIP: usize = 20;

/// Skeleton edges used when drawing a hand.
pub const CONNECTIONS: &[(usize, usize)] = &[
    (WRIST, THUMB_CMC),
    (THUMB_CMC, THUMB_MCP),
    (THUMB_MCP, THUMB_IP),
    (THUMB_IP, THUMB_TIP),
    (WRIST, INDEX_MCP),
    (INDEX_MCP, INDEX_PIP),
    (INDEX_PIP, INDEX_DIP),
    (INDEX_DIP, INDEX_TIP),
    (WRIST, MIDDLE_MCP),
    (MIDDLE_MCP, MIDDLE_PIP),
    (MIDDLE_PIP, MIDDLE_DIP),
    (MIDDLE_DIP, MIDDLE_TIP),
    (WRIST, RING_MCP),
    (RING_MCP, RING_PIP),
    (RING_PIP, RING_DIP),
    (RING_DIP, RING_TIP),
    (WRIST, LITTLE_MCP),
    (LITTLE_MCP, LITTLE_PIP),
    (LITTLE_PIP, LITTLE_DIP),
    (LITTLE_DIP, LITTLE_TIP),
    (INDEX_MCP, MIDDLE_MCP),
    (MIDDLE_MCP, RING_MCP),
    (RING_MCP, LITTLE_MCP),
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LandmarkError {
    #[error("hand must have exactly {expected} landmarks, got {got}")]
    WrongCount { expected: usize, got: usize },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LandmarkPoint {
    pub x: i32,
    pub y: i32,
}

impl LandmarkPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Truncates an already projected pixel coordinate.
    pub fn from_pixel(x: f32, y: f32) -> Self {
        Self {
            x: x as i32,
            y: y as i32,
        }
    }

    /// True when `self` sits visually higher in the frame than `other`.
    pub fn is_above(&self, other: &LandmarkPoint) -> bool {
        if Y_AXIS_POINTS_DOWN {
            self.y < other.y
        } else {
            self.y > other.y
        }
    }

    /// True when `self` sits visually lower in the frame than `other`.
    pub fn is_below(&self, other: &LandmarkPoint) -> bool {
        other.is_above(self)
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

impl From<(i32, i32)> for LandmarkPoint {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// The 21 landmarks of one detected hand, in the MediaPipe hand schema order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandLandmarks {
    points: [LandmarkPoint; NUM_LANDMARKS],
}

impl HandLandmarks {
    pub fn new(points: [LandmarkPoint; NUM_LANDMARKS]) -> Self {
        Self { points }
    }

    pub fn from_points(points: &[LandmarkPoint]) -> Result<Self, LandmarkError> {
        let points: [LandmarkPoint; NUM_LANDMARKS] =
            points.try_into().map_err(|_| LandmarkError::WrongCount {
                expected: NUM_LANDMARKS,
                got: points.len(),
            })?;
        Ok(Self { points })
    }

    /// Builds a hand from projected floating point pixel coordinates.
    pub fn from_projected(points: &[(f32, f32)]) -> Result<Self, LandmarkError> {
        let converted: Vec<LandmarkPoint> = points
            .iter()
            .map(|&(x, y)| LandmarkPoint::from_pixel(x, y))
            .collect();
        Self::from_points(&converted)
    }

    pub fn points(&self) -> &[LandmarkPoint; NUM_LANDMARKS] {
        &self.points
    }

    pub fn wrist(&self) -> LandmarkPoint {
        self.points[WRIST]
    }
}

impl Index<usize> for HandLandmarks {
    type Output = LandmarkPoint;

    fn index(&self, index: usize) -> &LandmarkPoint {
        &self.points[index]
    }
}

impl TryFrom<Vec<LandmarkPoint>> for HandLandmarks {
    type Error = LandmarkError;

    fn try_from(points: Vec<LandmarkPoint>) -> Result<Self, Self::Error> {
        Self::from_points(&points)
    }
}

/// Every hand the detector found in one frame, in detector order.
pub type DetectionResult = Vec<HandLandmarks>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_landmark_lists() {
        let points = vec![LandmarkPoint::default(); 20];
        assert_eq!(
            HandLandmarks::try_from(points),
            Err(LandmarkError::WrongCount {
                expected: 21,
                got: 20
            })
        );
    }

    #[test]
    fn rejects_long_landmark_lists() {
        let points = vec![LandmarkPoint::default(); 22];
        assert!(HandLandmarks::from_points(&points).is_err());
    }

    #[test]
    fn smaller_y_is_above() {
        let tip = LandmarkPoint::new(0, 90);
        let joint = LandmarkPoint::new(0, 100);
        assert!(tip.is_above(&joint));
        assert!(joint.is_below(&tip));
        assert!(!tip.is_above(&tip));
        assert!(!tip.is_below(&tip));
    }

    #[test]
    fn projected_points_keep_order() {
        let projected: Vec<(f32, f32)> = (0..21).map(|i| (i as f32 + 0.7, 2.0 * i as f32)).collect();
        let hand = HandLandmarks::from_projected(&projected).unwrap();
        assert_eq!(hand[LITTLE_TIP], LandmarkPoint::new(20, 40));
        assert_eq!(hand.wrist(), LandmarkPoint::new(0, 0));
    }

    #[test]
    fn projected_points_truncate_toward_zero() {
        let mut projected = vec![(10.0, 10.0); NUM_LANDMARKS];
        projected[INDEX_TIP] = (-3.9, -0.5);
        let hand = HandLandmarks::from_projected(&projected).unwrap();
        assert_eq!(hand[INDEX_TIP], LandmarkPoint::new(-3, 0));
    }
}

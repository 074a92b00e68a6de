//! Draws recognized hands back onto the frame they came from.

use crate::{
    landmarks::{CONNECTIONS, LandmarkPoint},
    types::{Frame, HandGesture},
};

pub const SKELETON_LINE_THICKNESS: i32 = 5;
const LANDMARK_RADIUS: i32 = 4;
const BADGE_HEIGHT: i32 = 28;
const BADGE_CHAR_WIDTH: i32 = 14;

const LINE_COLOR: [u8; 4] = [56, 189, 248, 255];
const POINT_COLOR: [u8; 4] = [248, 113, 113, 255];
const BADGE_COLOR: [u8; 4] = [0, 255, 0, 255];

/// Consumes per-hand classification results for one frame.
pub trait FrameAnnotator {
    fn annotate(&mut self, frame: &mut Frame, hands: &[HandGesture]);
}

/// Logs each hand's label without touching pixels.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogAnnotator;

impl FrameAnnotator for LogAnnotator {
    fn annotate(&mut self, _frame: &mut Frame, hands: &[HandGesture]) {
        log_hands(hands);
    }
}

/// Draws the hand skeleton and a label badge at each hand's anchor.
#[derive(Clone, Copy, Debug)]
pub struct OverlayAnnotator {
    pub draw_skeleton: bool,
}

impl Default for OverlayAnnotator {
    fn default() -> Self {
        Self {
            draw_skeleton: true,
        }
    }
}

impl FrameAnnotator for OverlayAnnotator {
    fn annotate(&mut self, frame: &mut Frame, hands: &[HandGesture]) {
        let (width, height) = (frame.width, frame.height);
        for hand in hands {
            if self.draw_skeleton {
                draw_skeleton(&mut frame.rgba, width, height, hand.landmarks.points());
            }
            if let (Some(anchor), Some(label)) = (hand.anchor(), hand.label) {
                let badge_width = BADGE_CHAR_WIDTH * label.as_str().chars().count() as i32;
                draw_badge(&mut frame.rgba, width, height, anchor, badge_width);
            }
        }
        log_hands(hands);
    }
}

fn log_hands(hands: &[HandGesture]) {
    for (idx, hand) in hands.iter().enumerate() {
        match (hand.display_text(), hand.anchor()) {
            (Some(text), Some(anchor)) => {
                log::info!("hand {idx}: {text} at ({}, {})", anchor.x, anchor.y)
            }
            _ => log::info!("hand {idx}: no gesture detected"),
        }
    }
}

pub fn draw_skeleton(buffer: &mut [u8], width: u32, height: u32, points: &[LandmarkPoint]) {
    if points.len() < 2 {
        return;
    }

    for &(a, b) in CONNECTIONS {
        if let (Some(pa), Some(pb)) = (points.get(a), points.get(b)) {
            draw_line(buffer, width, height, *pa, *pb, LINE_COLOR, SKELETON_LINE_THICKNESS);
        }
    }

    for &point in points {
        draw_circle(buffer, width, height, point, LANDMARK_RADIUS, POINT_COLOR);
    }
}

/// Filled rectangle whose top-left corner is the label anchor.
fn draw_badge(buffer: &mut [u8], width: u32, height: u32, anchor: LandmarkPoint, badge_width: i32) {
    for y in anchor.y..anchor.y.saturating_add(BADGE_HEIGHT) {
        for x in anchor.x..anchor.x.saturating_add(badge_width) {
            put_pixel_safe(buffer, width, height, x, y, BADGE_COLOR);
        }
    }
}

fn draw_line(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    p0: LandmarkPoint,
    p1: LandmarkPoint,
    color: [u8; 4],
    thickness: i32,
) {
    let (mut x0, mut y0) = (p0.x, p0.y);
    let (x1, y1) = (p1.x, p1.y);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let radius = (thickness.max(1) - 1) / 2;

    loop {
        for ox in -radius..=radius {
            for oy in -radius..=radius {
                if ox.abs() + oy.abs() <= radius {
                    put_pixel_safe(buffer, width, height, x0 + ox, y0 + oy, color);
                }
            }
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

fn draw_circle(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    center: LandmarkPoint,
    radius: i32,
    color: [u8; 4],
) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                put_pixel_safe(buffer, width, height, center.x + dx, center.y + dy, color);
            }
        }
    }
}

fn put_pixel_safe(buffer: &mut [u8], width: u32, height: u32, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 {
        return;
    }
    let (ux, uy) = (x as u32, y as u32);
    if ux >= width || uy >= height {
        return;
    }
    let idx = ((uy * width + ux) as usize) * 4;
    if idx + 3 < buffer.len() {
        buffer[idx..idx + 4].copy_from_slice(&color);
    }
}

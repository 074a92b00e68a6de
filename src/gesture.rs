use std::fmt;

use crate::landmarks::{
    HandLandmarks, INDEX_DIP, INDEX_PIP, INDEX_TIP, LITTLE_DIP, LITTLE_PIP, LITTLE_TIP,
    LandmarkError, LandmarkPoint, MIDDLE_DIP, MIDDLE_MCP, MIDDLE_PIP, MIDDLE_TIP, RING_DIP,
    RING_PIP, RING_TIP, THUMB_IP, THUMB_TIP, WRIST,
};

/// Fingertip/joint pairs compared by the extension checks, thumb first.
const FINGER_JOINTS: [(usize, usize); 5] = [
    (THUMB_TIP, THUMB_IP),
    (INDEX_TIP, INDEX_PIP),
    (MIDDLE_TIP, MIDDLE_PIP),
    (RING_TIP, RING_PIP),
    (LITTLE_TIP, LITTLE_PIP),
];

/// Fingertip/next joint pairs used by the flat-hand checks.
const TIP_NEIGHBOURS: [(usize, usize); 5] = [
    (THUMB_TIP, THUMB_IP),
    (INDEX_TIP, INDEX_DIP),
    (MIDDLE_TIP, MIDDLE_DIP),
    (RING_TIP, RING_DIP),
    (LITTLE_TIP, LITTLE_DIP),
];

const STOP_MAX_TIP_GAP: i32 = 20;
const WAVE_MIN_VERTICAL_GAP: i32 = 50;
const WAVE_MAX_HORIZONTAL_GAP: i32 = 30;
const CROSS_MAX_GAP: i32 = 20;
const FACEPALM_MAX_GAP: i32 = 50;
const SNAP_MAX_GAP: i32 = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GestureLabel {
    Hi,
    ThumbsUp,
    ThumbsDown,
    Ok,
    Peace,
    Fist,
    Pointing,
    RockOn,
    Stop,
    Clap,
    Wave,
    Gun,
    Shaka,
    Cross,
    Facepalm,
    ThumbsSide,
    DoublePeace,
    FingerGuns,
    Spider,
    Snap,
}

impl GestureLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            GestureLabel::Hi => "Hi",
            GestureLabel::ThumbsUp => "Thumbs Up",
            GestureLabel::ThumbsDown => "Thumbs Down",
            GestureLabel::Ok => "OK",
            GestureLabel::Peace => "Peace",
            GestureLabel::Fist => "Fist",
            GestureLabel::Pointing => "Pointing",
            GestureLabel::RockOn => "Rock On",
            GestureLabel::Stop => "Stop",
            GestureLabel::Clap => "Clap",
            GestureLabel::Wave => "Wave",
            GestureLabel::Gun => "Gun",
            GestureLabel::Shaka => "Shaka",
            GestureLabel::Cross => "Cross",
            GestureLabel::Facepalm => "Facepalm",
            GestureLabel::ThumbsSide => "Thumbs Side",
            GestureLabel::DoublePeace => "Double Peace",
            GestureLabel::FingerGuns => "Finger Guns",
            GestureLabel::Spider => "Spider",
            GestureLabel::Snap => "Snap",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            GestureLabel::Hi => "👋 ",
            GestureLabel::ThumbsUp => "👍 ",
            GestureLabel::ThumbsDown => "👎 ",
            GestureLabel::Ok => "👌 ",
            GestureLabel::Peace => "✌️ ",
            GestureLabel::Fist => "✊ ",
            GestureLabel::Pointing => "☝️ ",
            GestureLabel::RockOn => "🤘 ",
            GestureLabel::Stop => "✋ ",
            GestureLabel::Clap => "👏 ",
            GestureLabel::Wave => "👋 ",
            GestureLabel::Gun => "👉 ",
            GestureLabel::Shaka => "🤙 ",
            GestureLabel::Cross => "🤞 ",
            GestureLabel::Facepalm => "🤦 ",
            GestureLabel::ThumbsSide => "👈 ",
            GestureLabel::DoublePeace => "✌️ ",
            GestureLabel::FingerGuns => "🔫 ",
            GestureLabel::Spider => "🕷️ ",
            GestureLabel::Snap => "🫰 ",
        }
    }
}

impl fmt::Display for GestureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the priority chain.
#[derive(Clone, Copy)]
pub struct GestureRule {
    pub label: GestureLabel,
    pub matches: fn(&HandLandmarks, usize) -> bool,
}

impl fmt::Debug for GestureRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GestureRule")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Rules in priority order; the first match wins. Several conditions repeat an earlier rule
/// (Fist and Thumbs Side shadow Thumbs Down, Double Peace is shadowed by Hi) and those later
/// entries can never fire. The order is part of the classification contract.
pub static RULES: [GestureRule; 20] = [
    GestureRule {
        label: GestureLabel::Hi,
        matches: |hand, _| all_fingers_extended(hand),
    },
    GestureRule {
        label: GestureLabel::ThumbsUp,
        matches: |hand, _| {
            extended(hand, THUMB_TIP, THUMB_IP)
                && folded(hand, INDEX_TIP, INDEX_PIP)
                && folded(hand, MIDDLE_TIP, MIDDLE_PIP)
                && folded(hand, RING_TIP, RING_PIP)
                && folded(hand, LITTLE_TIP, LITTLE_PIP)
        },
    },
    GestureRule {
        label: GestureLabel::ThumbsDown,
        matches: |hand, _| all_fingers_folded(hand),
    },
    GestureRule {
        label: GestureLabel::Ok,
        matches: |hand, _| {
            hand[THUMB_TIP].x < hand[THUMB_IP].x
                && folded(hand, INDEX_TIP, INDEX_PIP)
                && folded(hand, MIDDLE_TIP, MIDDLE_PIP)
                && folded(hand, RING_TIP, RING_PIP)
                && folded(hand, LITTLE_TIP, LITTLE_PIP)
        },
    },
    GestureRule {
        label: GestureLabel::Peace,
        matches: |hand, _| index_and_middle_only(hand),
    },
    GestureRule {
        label: GestureLabel::Fist,
        matches: |hand, _| all_fingers_folded(hand),
    },
    GestureRule {
        label: GestureLabel::Pointing,
        matches: |hand, _| index_only(hand),
    },
    GestureRule {
        label: GestureLabel::RockOn,
        matches: |hand, _| {
            extended(hand, INDEX_TIP, INDEX_PIP)
                && extended(hand, LITTLE_TIP, LITTLE_PIP)
                && folded(hand, THUMB_TIP, THUMB_IP)
                && folded(hand, MIDDLE_TIP, MIDDLE_PIP)
                && folded(hand, RING_TIP, RING_PIP)
        },
    },
    GestureRule {
        label: GestureLabel::Stop,
        matches: |hand, _| {
            TIP_NEIGHBOURS.iter().all(|&(tip, joint)| {
                extended(hand, tip, joint) && y_gap(hand, tip, joint) < STOP_MAX_TIP_GAP
            })
        },
    },
    GestureRule {
        label: GestureLabel::Clap,
        matches: |hand, _| {
            TIP_NEIGHBOURS
                .iter()
                .all(|&(tip, joint)| extended(hand, tip, joint))
        },
    },
    GestureRule {
        label: GestureLabel::Wave,
        matches: |hand, _| {
            y_gap(hand, INDEX_TIP, THUMB_TIP) > WAVE_MIN_VERTICAL_GAP
                && x_gap(hand, INDEX_TIP, THUMB_TIP) < WAVE_MAX_HORIZONTAL_GAP
        },
    },
    GestureRule {
        label: GestureLabel::Gun,
        matches: |hand, _| index_only(hand),
    },
    GestureRule {
        label: GestureLabel::Shaka,
        matches: |hand, _| {
            extended(hand, THUMB_TIP, THUMB_IP)
                && extended(hand, LITTLE_TIP, LITTLE_DIP)
                && folded(hand, INDEX_TIP, INDEX_PIP)
                && folded(hand, MIDDLE_TIP, MIDDLE_PIP)
                && folded(hand, RING_TIP, RING_PIP)
        },
    },
    GestureRule {
        label: GestureLabel::Cross,
        matches: |hand, _| {
            x_gap(hand, INDEX_TIP, MIDDLE_TIP) < CROSS_MAX_GAP
                && y_gap(hand, INDEX_TIP, MIDDLE_TIP) < CROSS_MAX_GAP
        },
    },
    GestureRule {
        label: GestureLabel::Facepalm,
        matches: |hand, _| y_gap(hand, WRIST, MIDDLE_MCP) < FACEPALM_MAX_GAP,
    },
    GestureRule {
        label: GestureLabel::ThumbsSide,
        matches: |hand, _| all_fingers_folded(hand),
    },
    GestureRule {
        label: GestureLabel::DoublePeace,
        matches: |hand, total_hands| all_fingers_extended(hand) && total_hands > 1,
    },
    GestureRule {
        label: GestureLabel::FingerGuns,
        matches: |hand, _| index_and_middle_only(hand),
    },
    GestureRule {
        label: GestureLabel::Spider,
        matches: |hand, _| all_fingers_extended(hand),
    },
    GestureRule {
        label: GestureLabel::Snap,
        matches: |hand, _| {
            y_gap(hand, THUMB_TIP, INDEX_TIP) < SNAP_MAX_GAP
                && x_gap(hand, THUMB_TIP, INDEX_TIP) < SNAP_MAX_GAP
        },
    },
];

/// Stateless rule-based classifier over one hand's pixel landmarks.
#[derive(Clone, Copy, Debug, Default)]
pub struct GestureClassifier;

impl GestureClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Returns the label of the first rule that holds, or `None` when no rule matches.
    /// `total_hands` is the number of hands detected in the same frame.
    pub fn classify(&self, hand: &HandLandmarks, total_hands: usize) -> Option<GestureLabel> {
        RULES
            .iter()
            .find(|rule| (rule.matches)(hand, total_hands))
            .map(|rule| rule.label)
    }

    /// Like [`classify`](Self::classify), for landmark lists whose length is not yet checked.
    pub fn classify_points(
        &self,
        points: &[LandmarkPoint],
        total_hands: usize,
    ) -> Result<Option<GestureLabel>, LandmarkError> {
        let hand = HandLandmarks::from_points(points)?;
        Ok(self.classify(&hand, total_hands))
    }
}

pub fn extended(hand: &HandLandmarks, tip: usize, joint: usize) -> bool {
    hand[tip].is_above(&hand[joint])
}

/// Strictly below; a tip level with its joint is neither extended nor folded.
pub fn folded(hand: &HandLandmarks, tip: usize, joint: usize) -> bool {
    hand[tip].is_below(&hand[joint])
}

pub fn all_fingers_extended(hand: &HandLandmarks) -> bool {
    FINGER_JOINTS
        .iter()
        .all(|&(tip, joint)| extended(hand, tip, joint))
}

fn all_fingers_folded(hand: &HandLandmarks) -> bool {
    FINGER_JOINTS
        .iter()
        .all(|&(tip, joint)| folded(hand, tip, joint))
}

fn index_only(hand: &HandLandmarks) -> bool {
    extended(hand, INDEX_TIP, INDEX_PIP)
        && folded(hand, THUMB_TIP, THUMB_IP)
        && folded(hand, MIDDLE_TIP, MIDDLE_PIP)
        && folded(hand, RING_TIP, RING_PIP)
        && folded(hand, LITTLE_TIP, LITTLE_PIP)
}

fn index_and_middle_only(hand: &HandLandmarks) -> bool {
    extended(hand, INDEX_TIP, INDEX_PIP)
        && extended(hand, MIDDLE_TIP, MIDDLE_PIP)
        && folded(hand, THUMB_TIP, THUMB_IP)
        && folded(hand, RING_TIP, RING_PIP)
        && folded(hand, LITTLE_TIP, LITTLE_PIP)
}

fn x_gap(hand: &HandLandmarks, a: usize, b: usize) -> i32 {
    (hand[a].x - hand[b].x).abs()
}

fn y_gap(hand: &HandLandmarks, a: usize, b: usize) -> i32 {
    (hand[a].y - hand[b].y).abs()
}

use hand_gesture_rules::{
    Frame, FrameAnnotator, GestureClassifier, GestureLabel, HandLandmarks, LandmarkError,
    LandmarkPoint, OverlayAnnotator, RULES,
    landmarks::{
        INDEX_PIP, INDEX_TIP, LITTLE_PIP, LITTLE_TIP, MIDDLE_PIP, MIDDLE_TIP, NUM_LANDMARKS,
        RING_PIP, RING_TIP, THUMB_IP, THUMB_TIP,
    },
    pipeline::{HandLandmarkDetector, recognize_frame},
};

const FINGERS: [(usize, usize); 5] = [
    (THUMB_TIP, THUMB_IP),
    (INDEX_TIP, INDEX_PIP),
    (MIDDLE_TIP, MIDDLE_PIP),
    (RING_TIP, RING_PIP),
    (LITTLE_TIP, LITTLE_PIP),
];

/// Every point spread far apart; tips sit below their joints.
fn spread_points() -> [LandmarkPoint; NUM_LANDMARKS] {
    let mut points = [LandmarkPoint::default(); NUM_LANDMARKS];
    for (i, p) in points.iter_mut().enumerate() {
        *p = LandmarkPoint::new(i as i32 * 100, i as i32 * 100);
    }
    points
}

/// Joints at y=100 and tips at y=90 (raised) or y=110 (lowered), one finger per column.
fn hand_with_fingers(raised: [bool; 5]) -> HandLandmarks {
    let mut points = spread_points();
    for (finger, &(tip, joint)) in FINGERS.iter().enumerate() {
        let x = finger as i32 * 300;
        points[joint] = LandmarkPoint::new(x, 100);
        points[tip] = LandmarkPoint::new(x, if raised[finger] { 90 } else { 110 });
    }
    HandLandmarks::new(points)
}

fn classify(hand: &HandLandmarks) -> Option<GestureLabel> {
    GestureClassifier::new().classify(hand, 1)
}

#[test]
fn all_tips_above_joints_is_hi() {
    let hand = hand_with_fingers([true; 5]);
    assert_eq!(classify(&hand), Some(GestureLabel::Hi));
}

#[test]
fn only_thumb_raised_is_thumbs_up() {
    let hand = hand_with_fingers([true, false, false, false, false]);
    assert_eq!(classify(&hand), Some(GestureLabel::ThumbsUp));
}

#[test]
fn all_tips_below_joints_stops_at_the_first_folded_rule() {
    let hand = hand_with_fingers([false; 5]);
    assert_eq!(classify(&hand), Some(GestureLabel::ThumbsDown));
    // Fist holds as well and still wins over Thumbs Side, but both sit behind Thumbs Down.
    let fist = RULES
        .iter()
        .position(|r| r.label == GestureLabel::Fist)
        .unwrap();
    let side = RULES
        .iter()
        .position(|r| r.label == GestureLabel::ThumbsSide)
        .unwrap();
    assert!((RULES[fist].matches)(&hand, 1));
    assert!(fist < side);
}

#[test]
fn index_and_middle_raised_is_peace() {
    let hand = hand_with_fingers([false, true, true, false, false]);
    assert_eq!(classify(&hand), Some(GestureLabel::Peace));
}

#[test]
fn thumb_and_index_tips_together_is_snap() {
    let mut points = spread_points();
    // Thumb tip level with its IP keeps every folded/extended rule from firing.
    points[THUMB_TIP] = LandmarkPoint::new(400, points[THUMB_IP].y);
    points[INDEX_TIP] = LandmarkPoint::new(405, points[THUMB_IP].y + 10);
    let hand = HandLandmarks::new(points);
    assert_eq!(classify(&hand), Some(GestureLabel::Snap));
}

#[test]
fn twenty_landmarks_are_rejected() {
    let points = vec![LandmarkPoint::new(0, 0); 20];
    let err = GestureClassifier::new()
        .classify_points(&points, 1)
        .unwrap_err();
    assert_eq!(
        err,
        LandmarkError::WrongCount {
            expected: NUM_LANDMARKS,
            got: 20
        }
    );
}

#[test]
fn unmatched_hand_has_no_label() {
    let mut points = spread_points();
    points[THUMB_TIP].y = points[THUMB_IP].y;
    assert_eq!(classify(&HandLandmarks::new(points)), None);
}

/// Small LCG so the generated hands are the same on every run.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: i32) -> i32 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.0 >> 33) % bound as u64) as i32
    }
}

fn generated_hands(count: usize) -> Vec<HandLandmarks> {
    let mut rng = Lcg(0x5eed);
    (0..count)
        .map(|_| {
            let mut points = [LandmarkPoint::default(); NUM_LANDMARKS];
            for p in points.iter_mut() {
                // A narrow range makes ties and the small distance thresholds common.
                *p = LandmarkPoint::new(rng.next(80), rng.next(80));
            }
            HandLandmarks::new(points)
        })
        .collect()
}

#[test]
fn first_matching_rule_decides_the_label() {
    let classifier = GestureClassifier::new();
    for total_hands in [1, 2] {
        for hand in generated_hands(500) {
            let expected = RULES
                .iter()
                .find(|rule| (rule.matches)(&hand, total_hands))
                .map(|rule| rule.label);
            let got = classifier.classify(&hand, total_hands);
            assert_eq!(got, expected);
            assert_eq!(classifier.classify(&hand, total_hands), got);

            if let Some(label) = got {
                let pos = RULES.iter().position(|r| r.label == label).unwrap();
                assert!(RULES[..pos].iter().all(|r| !(r.matches)(&hand, total_hands)));
            } else {
                assert!(RULES.iter().all(|r| !(r.matches)(&hand, total_hands)));
            }
        }
    }
}

#[test]
fn shadowed_labels_are_never_returned() {
    let shadowed = [
        GestureLabel::Fist,
        GestureLabel::Gun,
        GestureLabel::ThumbsSide,
        GestureLabel::DoublePeace,
        GestureLabel::FingerGuns,
        GestureLabel::Spider,
    ];
    let classifier = GestureClassifier::new();
    let mut hands = generated_hands(500);
    hands.push(hand_with_fingers([true; 5]));
    hands.push(hand_with_fingers([false; 5]));
    hands.push(hand_with_fingers([false, true, true, false, false]));
    hands.push(hand_with_fingers([false, true, false, false, false]));

    for hand in &hands {
        for total_hands in 0..4 {
            if let Some(label) = classifier.classify(hand, total_hands) {
                assert!(!shadowed.contains(&label), "{label} returned");
            }
        }
    }
}

struct TwoHands;

impl HandLandmarkDetector for TwoHands {
    fn detect(&mut self, _frame: &Frame) -> anyhow::Result<Vec<HandLandmarks>> {
        // Higher indices sit higher in the frame, so every tip clears its joint.
        let mut open = [LandmarkPoint::default(); NUM_LANDMARKS];
        for (i, p) in open.iter_mut().enumerate() {
            *p = LandmarkPoint::new(10 + 2 * i as i32, 60 - 2 * i as i32);
        }
        let mut unmatched = spread_points();
        unmatched[THUMB_TIP].y = unmatched[THUMB_IP].y;
        Ok(vec![HandLandmarks::new(open), HandLandmarks::new(unmatched)])
    }
}

#[test]
fn detected_hands_are_labelled_and_drawn() {
    let mut detector = TwoHands;
    let frame = Frame::new(vec![0; 64 * 64 * 4], 64, 64);
    let mut recognized =
        recognize_frame(&mut detector, &GestureClassifier::new(), frame).unwrap();

    assert_eq!(recognized.hands.len(), 2);
    assert_eq!(recognized.hands[0].label, Some(GestureLabel::Hi));
    assert_eq!(recognized.hands[1].label, None);
    assert_eq!(recognized.labels(), vec![GestureLabel::Hi]);
    assert_eq!(
        recognized.hands[0].display_text().as_deref(),
        Some("👋 Hi")
    );

    OverlayAnnotator::default().annotate(&mut recognized.frame, &recognized.hands);
    assert!(recognized.frame.rgba.iter().any(|&b| b != 0));
}

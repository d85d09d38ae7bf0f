use photo_carousel::scroll::{IDLE_DRIFT, SMOOTHING, ScrollState};

#[test]
fn update_scroll_is_additive_and_direction_last_wins() {
    let mut s = ScrollState::new(0.0, SMOOTHING);
    s.update_scroll(3.0, 1.0);
    s.update_scroll(2.0, -1.0);
    assert!((s.target - 5.0).abs() < 1e-6);
    assert!((s.speed_target - 5.0).abs() < 1e-6);
    assert_eq!(s.direction, -1.0);
}

#[test]
fn idle_drift_keeps_the_gallery_moving() {
    let mut s = ScrollState::default();
    s.advance();
    assert!((s.target - IDLE_DRIFT).abs() < 1e-6);
    assert!((s.speed_target - IDLE_DRIFT).abs() < 1e-6);

    // zero-delta input keeps the previous direction; an opposite input
    // flips the drift
    s.update_scroll(0.0, -1.0);
    s.advance();
    assert!(s.target < IDLE_DRIFT);
}

#[test]
fn smoothing_converges_monotonically_without_overshoot() {
    // drift disabled so the target stays put
    let mut s = ScrollState::new(0.0, SMOOTHING);
    s.update_scroll(10.0, 1.0);

    let mut gap = (s.target - s.current).abs();
    let sign = (s.target - s.current).signum();
    for _ in 0..1000 {
        if gap < 1e-4 {
            break;
        }
        s.advance();
        let next = (s.target - s.current).abs();
        assert!(next < gap, "distance to target must strictly shrink");
        assert_eq!(
            (s.target - s.current).signum(),
            sign,
            "smoothing must never overshoot"
        );
        gap = next;
    }
    assert!(gap < 1e-4, "did not converge");
}

#[test]
fn center_index_matches_truncating_modulo_convention() {
    let mut s = ScrollState::new(0.0, SMOOTHING);

    s.speed_target = 7.6; // 7.6 % 4 = 3.6
    assert_eq!(s.center_index(5), 3);

    s.speed_target = -1.2; // -1.2 % 4 = -1.2, floor -2, abs 2
    assert_eq!(s.center_index(5), 2);

    s.speed_target = 4.0; // on the modulus wraps back to the first image
    assert_eq!(s.center_index(5), 0);

    // the last image is only reachable through negative wraparound
    s.speed_target = -3.5; // floor(-3.5) = -4
    assert_eq!(s.center_index(5), 4);
}

#[test]
fn center_index_degenerate_image_counts() {
    let mut s = ScrollState::new(0.0, SMOOTHING);
    s.speed_target = 7.6;
    assert_eq!(s.center_index(1), 0);
    assert_eq!(s.center_index(0), 0);
}

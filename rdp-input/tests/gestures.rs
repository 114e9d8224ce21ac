use proptest::prelude::*;
use rdp_input::gestures::{
    DualTouchEvent, DualTouchGestureRecognizer, GestureMode, SingleTouchEvent,
    SingleTouchGestureRecognizer,
};
use rdp_input::{PointerEvent, PointerPhase};

fn ev(id: u32, x: f32, y: f32, t: u64, phase: PointerPhase) -> PointerEvent {
    PointerEvent::new(id, x, y, t, phase)
}

/// Put two fingers down at (100, 300) and (300, 300), the second after `delay` ms.
fn two_fingers(dual: &mut DualTouchGestureRecognizer, delay: u64) -> Vec<DualTouchEvent> {
    let mut out = dual.handle_event(&ev(0, 100.0, 300.0, 0, PointerPhase::Down));
    out.extend(dual.handle_event(&ev(1, 300.0, 300.0, delay, PointerPhase::Down)));
    out
}

fn is_scroll_or_scale(e: &DualTouchEvent) -> bool {
    matches!(
        e,
        DualTouchEvent::Scroll { .. }
            | DualTouchEvent::ScaleBegin { .. }
            | DualTouchEvent::Scale { .. }
            | DualTouchEvent::ScaleEnd
    )
}

proptest! {
    /// A large first change of the finger distance resolves to pinch, and it sticks.
    #[test]
    fn prop_pinch_resolves_and_sticks(
        spread in 50.0f32..250.0,
        wobble in proptest::collection::vec(-30.0f32..30.0, 1..40),
    ) {
        let mut dual = DualTouchGestureRecognizer::default();
        two_fingers(&mut dual, 20);

        let out = dual.handle_event(&ev(1, 300.0 + spread, 300.0, 40, PointerPhase::Move));
        prop_assert!(matches!(out.as_slice(), [DualTouchEvent::ScaleBegin { .. }]), "assertion failed: matches!(out.as_slice(), [DualTouchEvent::ScaleBegin {{ .. }}])");
        prop_assert_eq!(dual.mode(), Some(GestureMode::PinchZoom));

        for (i, dy) in wobble.iter().enumerate() {
            let t = 50 + i as u64;
            let out = dual.handle_event(&ev(0, 100.0, 300.0 + dy, t, PointerPhase::Move));
            prop_assert!(out.iter().all(|e| !matches!(e, DualTouchEvent::Scroll { .. })), "assertion failed: out.iter().all(|e| !matches!(e, DualTouchEvent::Scroll {{ .. }}))");
            prop_assert_eq!(dual.mode(), Some(GestureMode::PinchZoom));
        }

        dual.handle_event(&ev(0, 100.0, 300.0, 200, PointerPhase::Up));
        let out = dual.handle_event(&ev(1, 300.0, 300.0, 210, PointerPhase::Up));
        prop_assert_eq!(out, vec![DualTouchEvent::ScaleEnd, DualTouchEvent::End]);
    }

    /// Enough small moves resolve to scroll.
    #[test]
    fn prop_scroll_after_evidence(jitter in proptest::collection::vec(0.0f32..3.0, 20..60)) {
        let mut dual = DualTouchGestureRecognizer::default();
        two_fingers(&mut dual, 10);

        for (i, dy) in jitter.iter().enumerate() {
            let id = (i % 2) as u32;
            let x = if id == 0 { 100.0 } else { 300.0 };
            let out = dual.handle_event(&ev(id, x, 300.0 + dy, 20 + i as u64, PointerPhase::Move));
            prop_assert!(out.iter().all(|e| !matches!(e, DualTouchEvent::ScaleBegin { .. })), "assertion failed: out.iter().all(|e| !matches!(e, DualTouchEvent::ScaleBegin {{ .. }}))");
            if i + 1 < 20 {
                prop_assert_eq!(dual.mode(), Some(GestureMode::Unknown));
            }
        }
        prop_assert_eq!(dual.mode(), Some(GestureMode::Scroll));
    }

    /// A quick two-finger touch is a tap: one tap event, no scroll or zoom.
    #[test]
    fn prop_two_finger_tap(
        second_delay in 0u64..=100,
        moves in 0usize..10,
        hold in 0u64..800,
        lift_gap in 0u64..=100,
    ) {
        let mut dual = DualTouchGestureRecognizer::default();
        let mut out = two_fingers(&mut dual, second_delay);
        for i in 0..moves {
            let t = second_delay + 1 + i as u64;
            out.extend(dual.handle_event(&ev(0, 100.0, 301.0, t, PointerPhase::Move)));
        }
        let first_up = second_delay + 20 + hold;
        out.extend(dual.handle_event(&ev(0, 100.0, 301.0, first_up, PointerPhase::Up)));
        out.extend(dual.handle_event(&ev(1, 300.0, 300.0, first_up + lift_gap, PointerPhase::Up)));

        let taps = out
            .iter()
            .filter(|e| matches!(e, DualTouchEvent::SingleTap { .. }))
            .count();
        prop_assert_eq!(taps, 1);
        prop_assert!(!out.iter().any(is_scroll_or_scale));
        let begin = DualTouchEvent::Begin { position: rdp_common::PointF::new(100.0, 300.0) };
        prop_assert_eq!(out.first(), Some(&begin));
        prop_assert_eq!(out.last(), Some(&DualTouchEvent::End));
    }

    /// Fling velocity never exceeds the cap.
    #[test]
    fn prop_fling_capped(dx in -3_000.0f32..3_000.0, dy in -3_000.0f32..3_000.0, dt in 1u64..50) {
        let mut single = SingleTouchGestureRecognizer::default();
        single.handle_event(&ev(0, 1_000.0, 1_000.0, 0, PointerPhase::Down));
        single.handle_event(&ev(0, 1_000.0 + dx, 1_000.0 + dy, dt, PointerPhase::Move));
        let out = single.handle_event(&ev(0, 1_000.0 + dx, 1_000.0 + dy, dt, PointerPhase::Up));
        for e in out {
            if let SingleTouchEvent::Fling { velocity_x, velocity_y } = e {
                prop_assert!(velocity_x.abs() <= 8_000.0);
                prop_assert!(velocity_y.abs() <= 8_000.0);
            }
        }
    }

    /// After a lost pointer-up, the next finger that lands late enough starts a
    /// fresh sequence and can tap again.
    #[test]
    fn prop_lost_up_does_not_wedge(gap in 1_001u64..60_000, moves in 0usize..5) {
        let mut single = SingleTouchGestureRecognizer::default();
        single.handle_event(&ev(0, 10.0, 10.0, 0, PointerPhase::Down));
        for i in 0..moves {
            single.handle_event(&ev(0, 10.0, 40.0, 1 + i as u64, PointerPhase::Move));
        }
        let last = moves as u64;
        let t = last + gap;
        single.handle_event(&ev(7, 300.0, 300.0, t, PointerPhase::Down));
        let out = single.handle_event(&ev(7, 300.0, 300.0, t + 30, PointerPhase::Up));
        let tapped = out.iter().any(|e| matches!(e, SingleTouchEvent::SingleTapUp { .. }));
        prop_assert!(tapped);
        prop_assert!(!single.is_tracking());
    }

    /// A cancelled sequence produces nothing after the cancel, timers included.
    #[test]
    fn prop_cancel_is_silent(at in 1u64..499, later in 0u64..5_000) {
        let mut single = SingleTouchGestureRecognizer::default();
        single.handle_event(&ev(0, 10.0, 10.0, 0, PointerPhase::Down));
        prop_assert!(single.handle_event(&ev(0, 10.0, 10.0, at, PointerPhase::Cancel)).is_empty());
        prop_assert!(single.tick(at + later).is_empty());
        prop_assert!(!single.is_tracking());
    }
}

#[test]
fn test_single_finger_is_not_dual() {
    let mut dual = DualTouchGestureRecognizer::default();
    assert!(dual
        .handle_event(&ev(0, 10.0, 10.0, 0, PointerPhase::Down))
        .is_empty());
    assert!(dual
        .handle_event(&ev(0, 60.0, 10.0, 30, PointerPhase::Move))
        .is_empty());
    assert!(dual
        .handle_event(&ev(0, 60.0, 10.0, 60, PointerPhase::Up))
        .is_empty());
    assert_eq!(dual.mode(), None);
}

#[test]
fn test_long_press_then_drag_then_release() {
    let mut single = SingleTouchGestureRecognizer::default();
    single.handle_event(&ev(0, 50.0, 50.0, 0, PointerPhase::Down));
    let out = single.tick(600);
    assert!(matches!(out.as_slice(), [SingleTouchEvent::LongPress { .. }]));
    let out = single.handle_event(&ev(0, 52.0, 50.0, 610, PointerPhase::Move));
    // Inside the touch slop, but a long press reports every move
    assert!(matches!(out.as_slice(), [SingleTouchEvent::Scroll { .. }]));
    let out = single.handle_event(&ev(0, 52.0, 50.0, 620, PointerPhase::Up));
    assert!(matches!(
        out.as_slice(),
        [SingleTouchEvent::LongPressUp { .. }, SingleTouchEvent::Up { .. }]
    ));
}

#[test]
fn test_quick_second_finger_is_not_stale() {
    let mut single = SingleTouchGestureRecognizer::default();
    single.handle_event(&ev(0, 10.0, 10.0, 0, PointerPhase::Down));
    single.handle_event(&ev(0, 10.0, 10.0, 900, PointerPhase::Move));
    // Still within the stale timeout of the last event: a real second finger
    assert!(single
        .handle_event(&ev(1, 90.0, 10.0, 1_500, PointerPhase::Down))
        .is_empty());
    assert!(single.is_tracking());
}

#[test]
fn test_dual_touch_recovers_from_lost_up() {
    let mut dual = DualTouchGestureRecognizer::default();
    dual.handle_event(&ev(0, 100.0, 300.0, 0, PointerPhase::Down));
    let out = two_fingers_at(&mut dual, 4_000);
    assert!(matches!(out.as_slice(), [DualTouchEvent::Begin { .. }]));
    assert_eq!(dual.mode(), Some(GestureMode::Unknown));
}

fn two_fingers_at(dual: &mut DualTouchGestureRecognizer, t: u64) -> Vec<DualTouchEvent> {
    let mut out = dual.handle_event(&ev(5, 100.0, 300.0, t, PointerPhase::Down));
    out.extend(dual.handle_event(&ev(6, 300.0, 300.0, t + 20, PointerPhase::Down)));
    out
}

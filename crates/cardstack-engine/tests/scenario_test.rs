//! End-to-end interaction scenarios against a `Vec`-backed adapter.

use std::time::Duration;

use cardstack_core::geometry::{Displacement, Point, Velocity};
use cardstack_engine::{
    AdapterError, CaptureRejection, CardAdapter, CardEvent, DragController, DragEffect, DragPhase,
    EventSink, ExitDirection, ItemKey, PointerEvent, RecordingSink, ReleaseOutcome, SlotId,
    StackConfig, VecAdapter,
};

const FRAME: Duration = Duration::from_millis(16);

type Stack = DragController<VecAdapter<String>, RecordingSink>;

fn stack(items: usize) -> Stack {
    let adapter = VecAdapter::new((0..items).map(|i| format!("card-{i}")).collect());
    DragController::new(StackConfig::default(), adapter, RecordingSink::new()).expect("controller")
}

fn grab_point() -> Point {
    Point::new(360.0, 400.0)
}

fn run_until_idle<A: CardAdapter, S: EventSink>(stack: &mut DragController<A, S>) -> usize {
    let mut frames = 0;
    while stack.phase() != DragPhase::Idle {
        stack.tick(FRAME);
        frames += 1;
        assert!(frames < 2000, "settle never finished");
    }
    frames
}

fn swipe(stack: &mut Stack, by: Displacement, velocity: Velocity) -> ReleaseOutcome {
    stack.handle_pointer(PointerEvent::Down {
        position: grab_point(),
    });
    stack.handle_pointer(PointerEvent::Move {
        position: grab_point() + by,
    });
    let transition = stack.handle_pointer(PointerEvent::Up {
        position: grab_point() + by,
        velocity,
    });
    match transition.effect {
        DragEffect::Released { outcome } => outcome,
        other => panic!("expected a release, got {other:?}"),
    }
}

#[test]
fn distance_swipe_exits_right_and_shows_next() {
    let mut stack = stack(10);
    let outcome = swipe(&mut stack, Displacement::new(350.0, 20.0), Velocity::ZERO);
    assert!(matches!(outcome, ReleaseOutcome::ExitRight { .. }));
    assert_eq!(stack.sink().vanished(), vec![(0, ExitDirection::Right)]);
    assert!(stack.sink().shown().is_empty(), "on_show waits for the settle");

    run_until_idle(&mut stack);
    assert_eq!(stack.sink().shown(), vec![1]);
    assert_eq!(stack.cursor(), 1);
    assert_eq!(
        stack.adapter().bound_item(stack.window().top_slot().expect("top").id()),
        Some(&"card-1".to_string())
    );
}

#[test]
fn short_swipe_recoils_to_rest() {
    let mut stack = stack(10);
    let outcome = swipe(
        &mut stack,
        Displacement::new(50.0, 10.0),
        Velocity::new(50.0, 10.0),
    );
    assert_eq!(outcome, ReleaseOutcome::Recoil);
    run_until_idle(&mut stack);
    assert_eq!(stack.cursor(), 0);
    let top = stack.window().top_slot().expect("top");
    assert_eq!(top.transform(), stack.window().layout_default(0));
    assert!(stack.sink().events().is_empty());
}

#[test]
fn empty_dataset_rejects_capture() {
    let mut stack = stack(0);
    let transition = stack.handle_pointer(PointerEvent::Down {
        position: grab_point(),
    });
    assert_eq!(
        transition.effect,
        DragEffect::CaptureRejected {
            reason: CaptureRejection::EmptyDataset
        }
    );
    assert_eq!(stack.window().slots().count(), 4);
    assert!(stack.window().slots().all(|slot| !slot.is_visible()));
    assert!(stack.sink().events().is_empty());
}

#[test]
fn swiping_through_everything_exhausts_then_refills() {
    let mut stack = stack(5);
    for i in 0..5 {
        let direction = if i % 2 == 0 {
            Displacement::new(400.0, 0.0)
        } else {
            Displacement::new(-400.0, 0.0)
        };
        swipe(&mut stack, direction, Velocity::ZERO);
        run_until_idle(&mut stack);
    }
    assert_eq!(stack.cursor(), 4);
    assert_eq!(stack.sink().shown(), vec![1, 2, 3, 4]);
    assert_eq!(
        stack.sink().vanished(),
        vec![
            (0, ExitDirection::Right),
            (1, ExitDirection::Left),
            (2, ExitDirection::Right),
            (3, ExitDirection::Left),
            (4, ExitDirection::Right),
        ]
    );
    assert!(stack.window().is_exhausted());
    let transition = stack.handle_pointer(PointerEvent::Down {
        position: grab_point(),
    });
    assert_eq!(
        transition.effect,
        DragEffect::CaptureRejected {
            reason: CaptureRejection::TopSlotHidden
        }
    );

    stack
        .adapter_mut()
        .extend(["card-5".to_string(), "card-6".to_string()]);
    stack.append_data(2);
    assert_eq!(stack.cursor(), 5);
    assert_eq!(stack.sink().shown(), vec![1, 2, 3, 4, 5]);
}

#[test]
fn rapid_regrab_during_exit_flushes_recycle() {
    let mut stack = stack(10);
    let outcome = swipe(
        &mut stack,
        Displacement::new(40.0, 0.0),
        Velocity::new(2400.0, 0.0),
    );
    assert!(outcome.is_exit());
    stack.tick(FRAME);
    assert_eq!(stack.phase(), DragPhase::Settling);

    let transition = stack.handle_pointer(PointerEvent::Down {
        position: grab_point(),
    });
    assert!(transition.flushed_settle);
    assert_eq!(transition.to, DragPhase::Captured);
    assert_eq!(stack.sink().shown(), vec![1]);
    assert_eq!(stack.session().map(|session| session.index), Some(1));
}

#[test]
fn regrab_during_recoil_captures_at_rest() {
    let mut stack = stack(10);
    swipe(&mut stack, Displacement::new(120.0, 0.0), Velocity::ZERO);
    stack.tick(FRAME);
    let transition = stack.handle_pointer(PointerEvent::Down {
        position: grab_point(),
    });
    assert!(transition.flushed_settle);
    let session = stack.session().expect("captured");
    assert_eq!(session.index, 0);
    assert_eq!(session.origin_offset, Displacement::ZERO);
}

#[test]
fn tap_reports_top_index() {
    let mut stack = stack(3);
    stack.dismiss(ExitDirection::Right).expect("dismiss");
    run_until_idle(&mut stack);
    stack.handle_pointer(PointerEvent::Down {
        position: grab_point(),
    });
    let transition = stack.handle_pointer(PointerEvent::Up {
        position: grab_point() + Displacement::new(1.0, -1.0),
        velocity: Velocity::ZERO,
    });
    assert_eq!(transition.effect, DragEffect::Tapped { index: 1 });
    assert_eq!(
        stack.sink().events().last(),
        Some(&CardEvent::Tap { index: 1 })
    );
}

#[test]
fn programmatic_dismiss_clears_viewport_further() {
    let mut stack = stack(10);
    let transition = stack.dismiss(ExitDirection::Right).expect("dismiss");
    let DragEffect::Dismissed { endpoint, .. } = transition.effect else {
        panic!("expected dismissal, got {:?}", transition.effect);
    };
    let config = stack.config().clone();
    assert!(endpoint.x > config.panel.panel_width);
    assert_eq!(endpoint.x, config.panel.panel_width + config.dismiss_padding);
}

/// Adapter whose third item fails to bind.
struct FlakyAdapter {
    inner: VecAdapter<u32>,
}

impl CardAdapter for FlakyAdapter {
    type ItemId = ItemKey;

    fn count(&self) -> usize {
        self.inner.count()
    }

    fn item_at(&self, index: usize) -> Option<ItemKey> {
        self.inner.item_at(index)
    }

    fn bind_view(&mut self, slot: SlotId, index: usize) -> Result<(), AdapterError> {
        if index == 2 {
            return Err(AdapterError::new("decode failed"));
        }
        self.inner.bind_view(slot, index)
    }
}

#[test]
fn bad_item_is_hidden_and_reported_without_stalling() {
    let adapter = FlakyAdapter {
        inner: VecAdapter::new((0..8).collect()),
    };
    let mut stack =
        DragController::new(StackConfig::default(), adapter, RecordingSink::new()).expect("stack");
    assert!(matches!(
        stack.sink().events(),
        [CardEvent::AdapterInconsistency { .. }]
    ));
    assert!(!stack.window().slot_at_depth(2).expect("d2").is_visible());

    // Swiping still works; the stack moves past the bad item.
    for _ in 0..7 {
        stack.handle_pointer(PointerEvent::Down {
            position: grab_point(),
        });
        let transition = stack.handle_pointer(PointerEvent::Up {
            position: grab_point() + Displacement::new(400.0, 0.0),
            velocity: Velocity::ZERO,
        });
        assert!(
            matches!(transition.effect, DragEffect::Released { .. }),
            "cursor {} stalled: {:?}",
            stack.cursor(),
            transition.effect
        );
        run_until_idle(&mut stack);
    }
    assert_eq!(stack.cursor(), 7);
    assert!(stack.window().is_exhausted());
    assert_eq!(stack.sink().shown(), vec![1, 3, 4, 5, 6, 7]);
    let vanished: Vec<_> = stack.sink().vanished().into_iter().map(|(i, _)| i).collect();
    assert_eq!(vanished, vec![0, 1, 3, 4, 5, 6, 7]);
    assert!(
        stack
            .sink()
            .events()
            .iter()
            .any(|event| matches!(event, CardEvent::AdapterInconsistency { message } if message.contains("item 2")))
    );
}

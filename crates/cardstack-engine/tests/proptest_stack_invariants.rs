//! Property-based invariants of the stack engine.
//!
//! 1. **Recoil band**: releases inside both thresholds never exit.
//! 2. **Fling right**: a fast, mostly horizontal fling exits right and ends
//!    at the panel's right edge.
//! 3. **Linkage envelope**: lower layers stay between their own rest
//!    transform and the one above, for any displacement.
//! 4. **Window shape**: arbitrary dismiss/append sequences keep exactly W
//!    slots, each visible slot bound to `cursor + depth`, and a cursor that
//!    never moves backwards.
//! 5. **Recycle count**: N dismissals from M items leave the cursor at
//!    `min(N, M - 1)` with strictly increasing `on_show` indices.
//! 6. **Bad items**: items whose view cannot be bound are passed over;
//!    dismissing until nothing is left vanishes every good item once, in
//!    order, and never shows a bad one.

use std::collections::BTreeSet;
use std::time::Duration;

use cardstack_core::animation::Easing;
use cardstack_core::geometry::{Displacement, Velocity};
use cardstack_engine::{
    AdapterError, CardAdapter, DragController, DragEffect, DragPhase, ExitDirection, ItemKey,
    LinkageInterpolator, RecordingSink, RefillMode, ReleaseClassifier, ReleaseOutcome, SettleStrategy,
    SlotId, StackConfig, StackLayout, StackWindow, VecAdapter,
};
use proptest::prelude::*;

fn within(value: f32, a: f32, b: f32) -> bool {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    value >= lo - 1e-4 && value <= hi + 1e-4
}

fn fast_config() -> StackConfig {
    StackConfig {
        settle: SettleStrategy::Tween {
            duration_ms: 48,
            easing: Easing::Linear,
        },
        ..StackConfig::default()
    }
}

/// Fails to bind every index in `bad`.
struct PartlyBrokenAdapter {
    inner: VecAdapter<usize>,
    bad: BTreeSet<usize>,
}

impl CardAdapter for PartlyBrokenAdapter {
    type ItemId = ItemKey;

    fn count(&self) -> usize {
        self.inner.count()
    }

    fn item_at(&self, index: usize) -> Option<ItemKey> {
        self.inner.item_at(index)
    }

    fn bind_view(&mut self, slot: SlotId, index: usize) -> Result<(), AdapterError> {
        if self.bad.contains(&index) {
            return Err(AdapterError::new(format!("item {index} unreadable")));
        }
        self.inner.bind_view(slot, index)
    }
}

#[derive(Debug, Clone)]
enum Op {
    Dismiss,
    Append(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Dismiss),
        1 => (1usize..6).prop_map(Op::Append),
    ]
}

proptest! {
    #[test]
    fn releases_inside_thresholds_recoil(
        vx in -800.0f32..=800.0,
        vy in -5000.0f32..5000.0,
        dx in -300.0f32..=300.0,
        dy in -2000.0f32..2000.0,
    ) {
        let classifier = ReleaseClassifier::from_config(&StackConfig::default());
        let outcome = classifier.classify(Velocity::new(vx, vy), Displacement::new(dx, dy));
        prop_assert_eq!(outcome, ReleaseOutcome::Recoil);
    }

    #[test]
    fn horizontal_fling_exits_right_at_panel_edge(
        vx in 800.5f32..6000.0,
        vy_ratio in -0.99f32..0.99,
        dx in -1000.0f32..1000.0,
        dy in -1000.0f32..1000.0,
    ) {
        let config = StackConfig::default();
        let classifier = ReleaseClassifier::from_config(&config);
        let vy = vy_ratio * vx * config.xy_ratio;
        let outcome = classifier.classify(Velocity::new(vx, vy), Displacement::new(dx, dy));
        let ReleaseOutcome::ExitRight { endpoint } = outcome else {
            return Err(TestCaseError::fail(format!("expected exit right, got {outcome:?}")));
        };
        prop_assert_eq!(endpoint.x, config.panel.panel_width);
        prop_assert!(endpoint.y >= -config.panel.panel_height / 2.0);
        prop_assert!(endpoint.y <= config.panel.panel_height);
    }

    #[test]
    fn linkage_stays_inside_envelope(
        dx in -5000.0f32..5000.0,
        dy in -5000.0f32..5000.0,
        skew in 0.0f32..0.3,
    ) {
        let config = StackConfig {
            linkage_skew: skew,
            ..StackConfig::default()
        };
        let layout = StackLayout::from_config(&config);
        let linkage = LinkageInterpolator::from_config(&config);
        let [r1, r2] = linkage.adjust(Displacement::new(dx, dy));
        prop_assert!((0.0..=1.0).contains(&r1));
        prop_assert!((0.0..=1.0).contains(&r2));
        prop_assert!(r2 <= r1);

        for (depth, rate) in [(1usize, r1), (2, r2)] {
            let t = LinkageInterpolator::interpolate(&layout, depth, rate);
            let own = layout.layout_default(depth);
            let above = layout.layout_default(depth - 1);
            prop_assert!(within(t.offset_y, own.offset_y, above.offset_y), "{t:?}");
            prop_assert!(within(t.scale_x, own.scale_x, above.scale_x), "{t:?}");
            prop_assert!(within(t.scale_y, own.scale_y, above.scale_y), "{t:?}");
        }
    }

    #[test]
    fn window_keeps_shape_under_any_sequence(
        window_size in 1usize..7,
        initial in 0usize..12,
        ops in prop::collection::vec(op(), 0..40),
    ) {
        let config = StackConfig::default();
        let mut adapter = VecAdapter::new((0..initial).collect::<Vec<_>>());
        let mut window = StackWindow::new(window_size, StackLayout::from_config(&config))
            .expect("window");
        prop_assert!(window.populate(&mut adapter).is_empty());

        let mut last_cursor = window.cursor();
        for op in ops {
            match op {
                Op::Dismiss => {
                    let top = window.top_slot().expect("top");
                    if top.is_visible() {
                        let id = top.id();
                        window.begin_exit(id).expect("mark");
                        let recycled = window.recycle(id, true, &mut adapter).expect("recycle");
                        prop_assert!(recycled.is_some());
                        // A second recycle of the same slot does nothing.
                        prop_assert!(window.recycle(id, true, &mut adapter).expect("again").is_none());
                    }
                }
                Op::Append(n) => {
                    let len = adapter.len();
                    adapter.extend(len..len + n);
                    window.append_data(n);
                    let refill = window.refill(RefillMode::Fill, &mut adapter);
                    prop_assert!(refill.failures.is_empty());
                }
            }

            prop_assert_eq!(window.slots().count(), window_size);
            prop_assert!(window.cursor() >= last_cursor);
            last_cursor = window.cursor();
            for (depth, slot) in window.slots().enumerate() {
                if slot.is_visible() {
                    prop_assert_eq!(slot.bound_index(), Some(window.cursor() + depth));
                    prop_assert!(window.cursor() + depth < window.dataset_size());
                } else {
                    prop_assert_eq!(slot.bound_index(), None);
                }
            }
        }
    }

    #[test]
    fn dismissals_advance_cursor_until_exhausted(
        items in 4usize..16,
        dismissals in 0usize..24,
        left in any::<bool>(),
    ) {
        let adapter = VecAdapter::new((0..items).collect::<Vec<_>>());
        let mut stack = DragController::new(fast_config(), adapter, RecordingSink::new())
            .expect("controller");
        let direction = if left { ExitDirection::Left } else { ExitDirection::Right };
        for _ in 0..dismissals {
            stack.dismiss(direction).expect("idle between dismissals");
            let mut frames = 0;
            while stack.phase() != DragPhase::Idle {
                stack.tick(Duration::from_millis(16));
                frames += 1;
                prop_assert!(frames < 100, "settle stuck");
            }
        }

        prop_assert_eq!(stack.cursor(), dismissals.min(items - 1));
        let shown = stack.sink().shown();
        prop_assert_eq!(shown.len(), dismissals.min(items - 1));
        prop_assert!(shown.windows(2).all(|pair| pair[0] < pair[1]));
        prop_assert_eq!(stack.sink().vanished().len(), dismissals.min(items));
    }

    #[test]
    fn bad_items_never_stall_the_stack(
        window_size in 1usize..6,
        items in 0usize..14,
        bad in prop::collection::btree_set(0usize..14, 0..6),
    ) {
        let adapter = PartlyBrokenAdapter {
            inner: VecAdapter::new((0..items).collect()),
            bad: bad.clone(),
        };
        let config = StackConfig { window_size, ..fast_config() };
        let mut stack = DragController::new(config, adapter, RecordingSink::new())
            .expect("controller");

        let mut rounds = 0;
        loop {
            let transition = stack.dismiss(ExitDirection::Right).expect("idle");
            if matches!(transition.effect, DragEffect::Noop { .. }) {
                break;
            }
            let mut frames = 0;
            while stack.phase() != DragPhase::Idle {
                stack.tick(Duration::from_millis(16));
                frames += 1;
                prop_assert!(frames < 100, "settle stuck");
            }
            rounds += 1;
            prop_assert!(rounds <= items, "more dismissals than items");
        }

        let good: Vec<_> = (0..items).filter(|index| !bad.contains(index)).collect();
        let vanished: Vec<_> = stack.sink().vanished().into_iter().map(|(index, _)| index).collect();
        prop_assert_eq!(vanished, good);
        prop_assert!(stack.sink().shown().iter().all(|index| !bad.contains(index)));
        prop_assert!(stack.window().slots().all(|slot| !slot.is_visible()));
    }
}

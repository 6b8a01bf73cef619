#![forbid(unsafe_code)]

//! Linkage: lower cards catch up as the top card moves away.
//!
//! The top card's manhattan displacement from rest is turned into two rates.
//! Depth 1 moves toward the depth-0 rest transform at `rate1`; depth 2 moves
//! toward the depth-1 rest transform at `rate2`, which lags `rate1` by a
//! fixed skew so the layers cascade. The spare at depth 3 fades in with
//! `rate2`.
//!
//! Both rates are clamped to `[0, 1]`, so no transform ever leaves the
//! segment between its own rest transform and the one above it.

use cardstack_core::geometry::{CardTransform, Displacement};

use crate::config::StackConfig;
use crate::window::{STACK_VISIBLE_DEPTH, StackLayout, StackWindow};

/// Maps the top card's displacement to transforms of the cards below it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkageInterpolator {
    max_distance: f32,
    skew: f32,
}

impl LinkageInterpolator {
    #[must_use]
    pub fn new(max_distance: f32, skew: f32) -> Self {
        Self {
            max_distance: max_distance.max(f32::EPSILON),
            skew: skew.max(0.0),
        }
    }

    #[must_use]
    pub fn from_config(config: &StackConfig) -> Self {
        Self::new(config.max_linkage_distance, config.linkage_skew)
    }

    /// `[rate1, rate2]` for a top-card displacement.
    #[must_use]
    pub fn adjust(&self, displacement: Displacement) -> [f32; 2] {
        let rate = displacement.manhattan() / self.max_distance;
        if !rate.is_finite() {
            // Infinite drags saturate; NaN input leaves the stack at rest.
            return if rate.is_nan() { [0.0, 0.0] } else { [1.0, 1.0] };
        }
        let rate1 = rate.min(1.0);
        let rate2 = (rate - self.skew).clamp(0.0, 1.0);
        [rate1, rate2]
    }

    /// Transform of depth `depth` (1 or 2) at `rate` toward `depth - 1`.
    #[must_use]
    pub fn interpolate(layout: &StackLayout, depth: usize, rate: f32) -> CardTransform {
        let from = layout.layout_default(depth);
        let to = layout.layout_default(depth.saturating_sub(1));
        from.lerp(&to, rate.clamp(0.0, 1.0))
    }

    /// Update the slots under the top card for `top_offset`.
    ///
    /// Offset and scale are written for depths 1 and 2; their opacity is left
    /// alone so a running fade is not disturbed. The spare at depth 3 only
    /// has its opacity driven.
    pub fn apply(&self, window: &mut StackWindow, top_offset: Displacement) {
        let rates = self.adjust(top_offset);
        let layout = *window.layout();
        let depths = window.window_size().min(STACK_VISIBLE_DEPTH);
        for depth in 1..depths {
            let Ok(slot) = window.slot_at_depth(depth) else {
                continue;
            };
            let (id, current) = (slot.id(), slot.transform());
            let target = Self::interpolate(&layout, depth, rates[depth - 1]);
            let next = current
                .with_offset(target.offset())
                .with_uniform_scale(target.scale_x);
            window.set_transform(id, next);
        }
        if let Ok(spare) = window.slot_at_depth(STACK_VISIBLE_DEPTH) {
            let id = spare.id();
            window.set_opacity(id, rates[1]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::VecAdapter;

    fn linkage() -> LinkageInterpolator {
        LinkageInterpolator::from_config(&StackConfig::default())
    }

    fn layout() -> StackLayout {
        StackLayout::from_config(&StackConfig::default())
    }

    #[test]
    fn rates_scale_with_manhattan_distance() {
        let [r1, r2] = linkage().adjust(Displacement::new(150.0, -100.0));
        assert!((r1 - 0.5).abs() < 1e-6);
        assert!((r2 - 0.4).abs() < 1e-6);
    }

    #[test]
    fn second_rate_lags_and_floors_at_zero() {
        let [r1, r2] = linkage().adjust(Displacement::new(25.0, 0.0));
        assert!((r1 - 0.05).abs() < 1e-6);
        assert_eq!(r2, 0.0);
    }

    #[test]
    fn rates_clamp_past_max_distance() {
        assert_eq!(linkage().adjust(Displacement::new(-4000.0, 900.0)), [1.0, 1.0]);
        assert_eq!(
            linkage().adjust(Displacement::new(f32::INFINITY, 0.0)),
            [1.0, 1.0]
        );
        assert_eq!(linkage().adjust(Displacement::new(f32::NAN, 0.0)), [0.0, 0.0]);
    }

    #[test]
    fn interpolate_hits_both_ends() {
        let layout = layout();
        assert_eq!(
            LinkageInterpolator::interpolate(&layout, 1, 0.0),
            layout.layout_default(1)
        );
        let full = LinkageInterpolator::interpolate(&layout, 2, 1.0);
        let above = layout.layout_default(1);
        assert!((full.offset_y - above.offset_y).abs() < 1e-4);
        assert!((full.scale_x - above.scale_x).abs() < 1e-6);
        // Over-range rates clamp instead of extrapolating.
        assert_eq!(
            LinkageInterpolator::interpolate(&layout, 1, 3.0),
            LinkageInterpolator::interpolate(&layout, 1, 1.0)
        );
    }

    #[test]
    fn apply_moves_lower_layers_and_fades_spare() {
        let mut adapter = VecAdapter::new((0..10).collect::<Vec<u32>>());
        let mut window = StackWindow::new(4, layout()).expect("window");
        window.populate(&mut adapter);

        linkage().apply(&mut window, Displacement::new(300.0, 0.0));

        let d1 = window.slot_at_depth(1).expect("d1").transform();
        let d2 = window.slot_at_depth(2).expect("d2").transform();
        let d3 = window.slot_at_depth(3).expect("d3").transform();
        assert!((d1.offset_y - 16.0).abs() < 1e-4, "{d1:?}");
        assert!((d1.scale_x - 0.968).abs() < 1e-5, "{d1:?}");
        assert_eq!(d1.opacity, 1.0);
        assert!((d2.offset_y - 60.0).abs() < 1e-4, "{d2:?}");
        assert!((d3.opacity - 0.5).abs() < 1e-6);
        // The top card is the caller's business.
        assert_eq!(
            window.slot_at_depth(0).expect("d0").transform(),
            CardTransform::IDENTITY
        );

        linkage().apply(&mut window, Displacement::ZERO);
        assert_eq!(
            window.slot_at_depth(1).expect("d1").transform(),
            layout().layout_default(1)
        );
        assert_eq!(window.slot_at_depth(3).expect("d3").transform().opacity, 0.0);
    }

    #[test]
    fn apply_on_small_window_skips_missing_depths() {
        let mut adapter = VecAdapter::new(vec![1, 2]);
        let mut window = StackWindow::new(2, layout()).expect("window");
        window.populate(&mut adapter);
        linkage().apply(&mut window, Displacement::new(500.0, 0.0));
        let d1 = window.slot_at_depth(1).expect("d1").transform();
        assert!((d1.scale_x - 1.0).abs() < 1e-6);
        assert!(d1.offset_y.abs() < 1e-4);
    }
}

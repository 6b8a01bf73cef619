#![forbid(unsafe_code)]

//! Stack configuration as data.
//!
//! Every tunable of the engine lives in one [`StackConfig`] that can be
//! loaded from TOML or JSON. Missing fields take the defaults below, so an
//! empty file is a valid configuration.
//!
//! ```toml
//! window_size = 4
//! velocity_threshold = 800.0
//! distance_threshold = 300.0
//!
//! [panel]
//! panel_width = 720.0
//! card_width = 600.0
//!
//! [settle]
//! kind = "tween"
//! duration_ms = 220
//! easing = "ease_out_cubic"
//! ```

use std::path::Path;
use std::time::Duration;

use cardstack_core::animation::Easing;
use cardstack_core::animation::spring::SpringParams;
use cardstack_core::geometry::{Point, Rect};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default number of slots in the window.
pub const DEFAULT_WINDOW_SIZE: usize = 4;
/// Default vertical step between stacked cards.
pub const DEFAULT_Y_OFFSET_STEP: f32 = 40.0;
/// Default scale decrement per depth.
pub const DEFAULT_SCALE_STEP: f32 = 0.08;
/// Default manhattan distance at which depth 1 fully replaces depth 0.
pub const DEFAULT_MAX_LINKAGE_DISTANCE: f32 = 500.0;
/// Default lag of depth 2 behind depth 1, in linkage rate units.
pub const DEFAULT_LINKAGE_SKEW: f32 = 0.1;
/// Default release speed (units/s) that flings a card away.
pub const DEFAULT_VELOCITY_THRESHOLD: f32 = 800.0;
/// Default horizontal travel that dismisses a card on release.
pub const DEFAULT_DISTANCE_THRESHOLD: f32 = 300.0;
/// Default verticality guard for exits.
pub const DEFAULT_XY_RATIO: f32 = 3.0;
/// Default drag slop.
pub const DEFAULT_TOUCH_SLOP: f32 = 5.0;
/// Default extra travel for programmatic dismissals.
pub const DEFAULT_DISMISS_PADDING: f32 = 100.0;

/// Host layout geometry, in panel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelGeometry {
    pub panel_width: f32,
    pub panel_height: f32,
    pub card_width: f32,
    pub card_height: f32,
    /// Gap between the panel top and the top card.
    pub item_margin_top: f32,
}

impl Default for PanelGeometry {
    fn default() -> Self {
        Self {
            panel_width: 720.0,
            panel_height: 1100.0,
            card_width: 600.0,
            card_height: 800.0,
            item_margin_top: 10.0,
        }
    }
}

impl PanelGeometry {
    /// Top-left corner of the resting top card: horizontally centered,
    /// `item_margin_top` below the panel edge.
    #[must_use]
    pub fn rest_origin(&self) -> Point {
        Point::new(
            (self.panel_width - self.card_width) / 2.0,
            self.item_margin_top,
        )
    }

    /// Unscaled card bounds with the top-left corner at `origin`.
    #[must_use]
    pub fn card_bounds_at(&self, origin: Point) -> Rect {
        Rect::from_origin(origin, self.card_width, self.card_height)
    }
}

/// How a released card travels to its endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SettleStrategy {
    /// Damped spring seeded with the release velocity.
    Spring { stiffness: f32, damping: f32 },
    /// Fixed-duration eased tween; ignores release velocity.
    Tween { duration_ms: u64, easing: Easing },
}

impl Default for SettleStrategy {
    fn default() -> Self {
        let params = SpringParams::default();
        Self::Spring {
            stiffness: params.stiffness,
            damping: params.damping,
        }
    }
}

/// Fade applied to slots revealed by a data change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FadeInConfig {
    pub duration_ms: u64,
    /// Delay added per revealed slot, top first.
    pub stagger_ms: u64,
}

impl Default for FadeInConfig {
    fn default() -> Self {
        Self {
            duration_ms: 300,
            stagger_ms: 80,
        }
    }
}

impl FadeInConfig {
    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    #[must_use]
    pub fn stagger(&self) -> Duration {
        Duration::from_millis(self.stagger_ms)
    }
}

/// What a data-change notification does when item 0 is a different item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetPolicy {
    /// Item 0 changed identity: treat the dataset as replaced and restart at 0.
    #[default]
    FirstItemIdentity,
    /// Keep the cursor; only fill newly available slots.
    Never,
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackConfig {
    pub window_size: usize,
    pub y_offset_step: f32,
    pub scale_step: f32,
    pub max_linkage_distance: f32,
    pub linkage_skew: f32,
    pub velocity_threshold: f32,
    pub distance_threshold: f32,
    pub xy_ratio: f32,
    pub touch_slop: f32,
    pub dismiss_padding: f32,
    /// `|vx|` below which the release velocity is too weak to give a slope.
    pub slope_velocity_floor: f32,
    pub reset_policy: ResetPolicy,
    pub panel: PanelGeometry,
    pub settle: SettleStrategy,
    pub fade_in: FadeInConfig,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            y_offset_step: DEFAULT_Y_OFFSET_STEP,
            scale_step: DEFAULT_SCALE_STEP,
            max_linkage_distance: DEFAULT_MAX_LINKAGE_DISTANCE,
            linkage_skew: DEFAULT_LINKAGE_SKEW,
            velocity_threshold: DEFAULT_VELOCITY_THRESHOLD,
            distance_threshold: DEFAULT_DISTANCE_THRESHOLD,
            xy_ratio: DEFAULT_XY_RATIO,
            touch_slop: DEFAULT_TOUCH_SLOP,
            dismiss_padding: DEFAULT_DISMISS_PADDING,
            slope_velocity_floor: 1.0,
            reset_policy: ResetPolicy::default(),
            panel: PanelGeometry::default(),
            settle: SettleStrategy::default(),
            fade_in: FadeInConfig::default(),
        }
    }
}

impl StackConfig {
    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_str(&read(path.as_ref())?)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json_str(&read(path.as_ref())?)
    }

    /// Check every parameter. The first violation wins.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size == 0 {
            return Err(ConfigError::EmptyWindow);
        }
        for (field, value) in [
            ("y_offset_step", self.y_offset_step),
            ("scale_step", self.scale_step),
            ("max_linkage_distance", self.max_linkage_distance),
            ("velocity_threshold", self.velocity_threshold),
            ("distance_threshold", self.distance_threshold),
            ("xy_ratio", self.xy_ratio),
            ("touch_slop", self.touch_slop),
            ("panel.panel_width", self.panel.panel_width),
            ("panel.panel_height", self.panel.panel_height),
            ("panel.card_width", self.panel.card_width),
            ("panel.card_height", self.panel.card_height),
        ] {
            // `!(value > 0.0)` also rejects NaN.
            if !(value > 0.0) {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        for (field, value) in [
            ("linkage_skew", self.linkage_skew),
            ("dismiss_padding", self.dismiss_padding),
            ("slope_velocity_floor", self.slope_velocity_floor),
            ("panel.item_margin_top", self.panel.item_margin_top),
        ] {
            if !(value >= 0.0) {
                return Err(ConfigError::Negative { field, value });
            }
        }
        if self.scale_step * 2.0 >= 1.0 {
            return Err(ConfigError::ScaleCollapse {
                scale_step: self.scale_step,
            });
        }
        if self.panel.card_width > self.panel.panel_width
            || self.panel.card_height > self.panel.panel_height
        {
            return Err(ConfigError::CardExceedsPanel {
                card_width: self.panel.card_width,
                card_height: self.panel.card_height,
                panel_width: self.panel.panel_width,
                panel_height: self.panel.panel_height,
            });
        }
        if let SettleStrategy::Spring { stiffness, .. } = self.settle
            && !(stiffness > 0.0)
        {
            return Err(ConfigError::NonPositive {
                field: "settle.stiffness",
                value: stiffness,
            });
        }
        Ok(())
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

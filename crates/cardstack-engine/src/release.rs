#![forbid(unsafe_code)]

//! Release classification: recoil to rest, or fly off one side.
//!
//! Rules are checked in order and the first match wins:
//!
//! | # | condition | outcome |
//! |---|-----------|---------|
//! | 1 | `vx >  V` and `|vy| <  vx * R` | exit right |
//! | 2 | `vx < -V` and `|vy| < -vx * R` | exit left |
//! | 3 | `dx >  D` and `|dy| <  dx * R` | exit right |
//! | 4 | `dx < -D` and `|dy| < -dx * R` | exit left |
//! | 5 | otherwise | recoil |
//!
//! `V` is the velocity threshold, `D` the distance threshold and `R` the
//! xy ratio that rejects mostly-vertical flings.

use cardstack_core::geometry::{Displacement, Point, Velocity};
use serde::{Deserialize, Serialize};

use crate::config::{PanelGeometry, StackConfig};
use crate::events::ExitDirection;

/// Where a released card goes. Endpoints are the card's top-left corner in
/// panel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReleaseOutcome {
    Recoil,
    ExitLeft { endpoint: Point },
    ExitRight { endpoint: Point },
}

impl ReleaseOutcome {
    /// Exit side, or `None` for a recoil.
    #[must_use]
    pub fn direction(&self) -> Option<ExitDirection> {
        match self {
            Self::Recoil => None,
            Self::ExitLeft { .. } => Some(ExitDirection::Left),
            Self::ExitRight { .. } => Some(ExitDirection::Right),
        }
    }

    /// Exit endpoint, or `None` for a recoil.
    #[must_use]
    pub fn endpoint(&self) -> Option<Point> {
        match self {
            Self::Recoil => None,
            Self::ExitLeft { endpoint } | Self::ExitRight { endpoint } => Some(*endpoint),
        }
    }

    #[must_use]
    pub fn is_exit(&self) -> bool {
        !matches!(self, Self::Recoil)
    }
}

/// Pure release decision procedure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReleaseClassifier {
    velocity_threshold: f32,
    distance_threshold: f32,
    xy_ratio: f32,
    slope_velocity_floor: f32,
    dismiss_padding: f32,
    panel: PanelGeometry,
}

impl ReleaseClassifier {
    #[must_use]
    pub fn from_config(config: &StackConfig) -> Self {
        Self {
            velocity_threshold: config.velocity_threshold,
            distance_threshold: config.distance_threshold,
            xy_ratio: config.xy_ratio,
            slope_velocity_floor: config.slope_velocity_floor,
            dismiss_padding: config.dismiss_padding,
            panel: config.panel,
        }
    }

    /// Rest position of the top card.
    #[must_use]
    pub fn rest_origin(&self) -> Point {
        self.panel.rest_origin()
    }

    /// Classify a release with `velocity` after moving `displacement` from
    /// rest.
    #[must_use]
    pub fn classify(&self, velocity: Velocity, displacement: Displacement) -> ReleaseOutcome {
        let Velocity { vx, vy } = velocity;
        let Displacement { dx, dy } = displacement;
        let (v, d, r) = (self.velocity_threshold, self.distance_threshold, self.xy_ratio);

        let direction = if vx > v && vy.abs() < vx * r {
            Some(ExitDirection::Right)
        } else if vx < -v && vy.abs() < -vx * r {
            Some(ExitDirection::Left)
        } else if dx > d && dy.abs() < dx * r {
            Some(ExitDirection::Right)
        } else if dx < -d && dy.abs() < -dx * r {
            Some(ExitDirection::Left)
        } else {
            None
        };

        match direction {
            None => ReleaseOutcome::Recoil,
            Some(direction) => {
                let endpoint = self.exit_endpoint(direction, velocity, displacement);
                match direction {
                    ExitDirection::Left => ReleaseOutcome::ExitLeft { endpoint },
                    ExitDirection::Right => ReleaseOutcome::ExitRight { endpoint },
                }
            }
        }
    }

    /// Endpoint of a card leaving through `direction`, following the line the
    /// release suggests.
    #[must_use]
    pub fn exit_endpoint(
        &self,
        direction: ExitDirection,
        velocity: Velocity,
        displacement: Displacement,
    ) -> Point {
        let current = self.rest_origin() + displacement;
        let x = match direction {
            ExitDirection::Right => self.panel.panel_width,
            ExitDirection::Left => -self.panel.card_width,
        };
        let slope = self.slope(direction, velocity, displacement);
        let y = current.y + slope * (x - current.x);
        let y = if y.is_finite() { y } else { current.y };
        Point::new(
            x,
            y.clamp(-self.panel.panel_height / 2.0, self.panel.panel_height),
        )
    }

    /// Endpoint of a programmatic dismissal: past the panel edge by the
    /// dismiss padding, dropping half a panel height.
    #[must_use]
    pub fn dismiss_endpoint(&self, direction: ExitDirection) -> Point {
        let x = match direction {
            ExitDirection::Right => self.panel.panel_width + self.dismiss_padding,
            ExitDirection::Left => -self.panel.card_width - self.dismiss_padding,
        };
        Point::new(
            x,
            self.rest_origin().y + self.panel.panel_height / 2.0,
        )
    }

    /// Velocity slope when the fling is strong enough and heads the exit way,
    /// otherwise the displacement slope. A zero denominator yields 0.
    fn slope(&self, direction: ExitDirection, velocity: Velocity, displacement: Displacement) -> f32 {
        let heading_out = match direction {
            ExitDirection::Right => velocity.vx > 0.0,
            ExitDirection::Left => velocity.vx < 0.0,
        };
        if heading_out && velocity.vx.abs() >= self.slope_velocity_floor {
            velocity.vy / velocity.vx
        } else if displacement.dx == 0.0 {
            0.0
        } else {
            displacement.dy / displacement.dx
        }
    }
}

//! Observation feature vocabulary and action bounds.

use crate::error::ObsError;

/// One per-vehicle observation feature.
///
/// All features are normalized by static network constants so that the
/// space bounds below hold for every scenario of a class. Absent
/// neighbours use the conventional optimistic fallbacks: a missing
/// leader reads as a free road (full gap, traffic at max speed), a
/// missing follower as open space behind (full gap, stationary).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Feature {
    /// Ego speed over network max speed. Range `[0, 1]`.
    EgoSpeed,
    /// `(leader speed − ego speed) / max speed`. Range `[-1, 1]`.
    LeaderSpeedDelta,
    /// Bumper gap to the leader over network total length. Range `[0, 1]`.
    LeaderGap,
    /// `(ego speed − follower speed) / max speed`. Range `[-1, 1]`.
    FollowerSpeedDelta,
    /// Bumper gap to the follower over network total length. Range `[0, 1]`.
    FollowerGap,
    /// Absolute network position over total length. Range `[0, 1]`.
    RoutePosition,
    /// Lane index over the widest edge's lane count. Range `[0, 1]`.
    LaneIndex,
}

impl Feature {
    /// Normalized bounds of this feature.
    pub fn bounds(self) -> (f32, f32) {
        match self {
            Feature::EgoSpeed
            | Feature::LeaderGap
            | Feature::FollowerGap
            | Feature::RoutePosition
            | Feature::LaneIndex => (0.0, 1.0),
            Feature::LeaderSpeedDelta | Feature::FollowerSpeedDelta => (-1.0, 1.0),
        }
    }
}

/// Ordered feature list, one copy per controlled slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObsSpec {
    /// Features in output order.
    pub features: Vec<Feature>,
}

impl ObsSpec {
    /// The partially-observable highway view: ego speed, leader
    /// delta/gap, follower delta/gap.
    ///
    /// This is the five-feature observation the multi-agent highway
    /// environments train on.
    pub fn highway_pov() -> Self {
        Self {
            features: vec![
                Feature::EgoSpeed,
                Feature::LeaderSpeedDelta,
                Feature::LeaderGap,
                Feature::FollowerSpeedDelta,
                Feature::FollowerGap,
            ],
        }
    }

    /// `highway_pov` plus route position, for open networks where
    /// distance to the exit matters.
    pub fn highway_pov_with_position() -> Self {
        let mut spec = Self::highway_pov();
        spec.features.push(Feature::RoutePosition);
        spec
    }

    /// Number of features per controlled slot.
    pub fn width(&self) -> usize {
        self.features.len()
    }

    /// Reject empty specs.
    pub fn validate(&self) -> Result<(), ObsError> {
        if self.features.is_empty() {
            return Err(ObsError::EmptySpec);
        }
        Ok(())
    }
}

/// Bounds and shape of the per-agent action.
///
/// The first channel is a longitudinal acceleration clamped to
/// `[-max_decel, max_accel]`. With `lane_change` enabled, three more
/// channels carry lane preference scores decoded by argmax
/// (left, stay, right).
#[derive(Clone, Debug, PartialEq)]
pub struct ActionBounds {
    /// Maximum acceleration, m/s². Positive.
    pub max_accel: f64,
    /// Maximum deceleration magnitude, m/s². Positive.
    pub max_decel: f64,
    /// Whether the action carries lane-change channels.
    pub lane_change: bool,
}

impl ActionBounds {
    /// Acceleration-only actions with symmetric bounds.
    pub fn symmetric(limit: f64) -> Self {
        Self {
            max_accel: limit,
            max_decel: limit,
            lane_change: false,
        }
    }

    /// Channels per controlled slot.
    pub fn width(&self) -> usize {
        if self.lane_change {
            4
        } else {
            1
        }
    }

    /// Clamp a raw acceleration into bounds.
    pub fn clamp_accel(&self, raw: f64) -> f64 {
        raw.clamp(-self.max_decel, self.max_accel)
    }

    /// Reject non-positive or non-finite bounds.
    pub fn validate(&self) -> Result<(), ObsError> {
        if !(self.max_accel > 0.0) || !self.max_accel.is_finite() {
            return Err(ObsError::InvalidActionBounds {
                reason: format!("max_accel must be positive, got {}", self.max_accel),
            });
        }
        if !(self.max_decel > 0.0) || !self.max_decel.is_finite() {
            return Err(ObsError::InvalidActionBounds {
                reason: format!("max_decel must be positive, got {}", self.max_decel),
            });
        }
        Ok(())
    }
}

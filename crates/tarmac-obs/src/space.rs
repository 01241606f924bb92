//! Flat bounded spaces and the per-scenario space pair.

use tarmac_net::Network;

use crate::error::ObsError;
use crate::spec::{ActionBounds, ObsSpec};

/// A flat, bounded box of `f32` values.
///
/// Shape is one-dimensional (`len`); multi-agent partitioning is a
/// view over equal-width slices, not a nested structure.
#[derive(Clone, Debug, PartialEq)]
pub struct BoxSpace {
    low: Vec<f32>,
    high: Vec<f32>,
}

impl BoxSpace {
    /// Build from explicit per-dimension bounds.
    ///
    /// # Errors
    ///
    /// [`ObsError::BoundShapeMismatch`] if the vectors differ in
    /// length, [`ObsError::InvertedBounds`] if any low exceeds its
    /// high.
    pub fn new(low: Vec<f32>, high: Vec<f32>) -> Result<Self, ObsError> {
        if low.len() != high.len() {
            return Err(ObsError::BoundShapeMismatch {
                low_len: low.len(),
                high_len: high.len(),
            });
        }
        if let Some(index) = low.iter().zip(&high).position(|(l, h)| l > h) {
            return Err(ObsError::InvertedBounds { index });
        }
        Ok(Self { low, high })
    }

    /// A box with the same bounds in every dimension.
    pub fn uniform(len: usize, low: f32, high: f32) -> Result<Self, ObsError> {
        Self::new(vec![low; len], vec![high; len])
    }

    /// Number of dimensions.
    pub fn shape(&self) -> usize {
        self.low.len()
    }

    /// Per-dimension lower bounds.
    pub fn low(&self) -> &[f32] {
        &self.low
    }

    /// Per-dimension upper bounds.
    pub fn high(&self) -> &[f32] {
        &self.high
    }

    /// Whether `point` has the right shape and sits within bounds.
    pub fn contains(&self, point: &[f32]) -> bool {
        point.len() == self.low.len()
            && point
                .iter()
                .zip(self.low.iter().zip(&self.high))
                .all(|(v, (l, h))| v >= l && v <= h)
    }
}

/// The derived observation/action spaces for one scenario class.
#[derive(Clone, Debug, PartialEq)]
pub struct SpacePair {
    /// Flat observation space: `max_agents × obs_width`.
    pub observation: BoxSpace,
    /// Flat action space: `max_agents × action_width`.
    pub action: BoxSpace,
    /// Features per agent slot.
    pub obs_width: usize,
    /// Action channels per agent slot.
    pub action_width: usize,
    /// Number of agent slots (the controlled-vehicle cap).
    pub max_agents: usize,
}

impl SpacePair {
    /// Observation bounds for a single agent slot.
    pub fn agent_observation(&self) -> Result<BoxSpace, ObsError> {
        BoxSpace::new(
            self.observation.low()[..self.obs_width].to_vec(),
            self.observation.high()[..self.obs_width].to_vec(),
        )
    }

    /// Action bounds for a single agent slot.
    pub fn agent_action(&self) -> Result<BoxSpace, ObsError> {
        BoxSpace::new(
            self.action.low()[..self.action_width].to_vec(),
            self.action.high()[..self.action_width].to_vec(),
        )
    }
}

/// Derive the space pair for a scenario class.
///
/// Inputs are all static: the network (for nothing but validation of
/// the normalizing constants' existence — bounds are already
/// normalized), the feature list, the action bounds, and the
/// controlled-vehicle cap. Live vehicle counts never enter, which is
/// what pins the shape across resets; churn is handled by
/// padding/masking at encode time.
///
/// # Errors
///
/// Propagates spec/bounds validation failures and rejects a zero
/// agent cap.
pub fn build_spaces(
    _network: &Network,
    spec: &ObsSpec,
    bounds: &ActionBounds,
    max_controlled: usize,
) -> Result<SpacePair, ObsError> {
    spec.validate()?;
    bounds.validate()?;
    if max_controlled == 0 {
        return Err(ObsError::ZeroAgentCap);
    }

    let obs_width = spec.width();
    let mut obs_low = Vec::with_capacity(max_controlled * obs_width);
    let mut obs_high = Vec::with_capacity(max_controlled * obs_width);
    for _ in 0..max_controlled {
        for feature in &spec.features {
            let (l, h) = feature.bounds();
            obs_low.push(l);
            obs_high.push(h);
        }
    }

    let action_width = bounds.width();
    let mut act_low = Vec::with_capacity(max_controlled * action_width);
    let mut act_high = Vec::with_capacity(max_controlled * action_width);
    for _ in 0..max_controlled {
        act_low.push(-bounds.max_decel as f32);
        act_high.push(bounds.max_accel as f32);
        if bounds.lane_change {
            // Lane preference scores; decoded by argmax, so the bounds
            // are advisory.
            act_low.extend_from_slice(&[-1.0; 3]);
            act_high.extend_from_slice(&[1.0; 3]);
        }
    }

    Ok(SpacePair {
        observation: BoxSpace::new(obs_low, obs_high)?,
        action: BoxSpace::new(act_low, act_high)?,
        obs_width,
        action_width,
        max_agents: max_controlled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tarmac_net::ring_network;

    #[test]
    fn box_space_rejects_mismatched_bounds() {
        assert!(matches!(
            BoxSpace::new(vec![0.0], vec![1.0, 2.0]).unwrap_err(),
            ObsError::BoundShapeMismatch { .. }
        ));
    }

    #[test]
    fn box_space_rejects_inverted_bounds() {
        assert_eq!(
            BoxSpace::new(vec![0.0, 2.0], vec![1.0, 1.0]).unwrap_err(),
            ObsError::InvertedBounds { index: 1 }
        );
    }

    #[test]
    fn contains_checks_shape_and_bounds() {
        let space = BoxSpace::uniform(2, 0.0, 1.0).unwrap();
        assert!(space.contains(&[0.5, 1.0]));
        assert!(!space.contains(&[0.5]));
        assert!(!space.contains(&[0.5, 1.5]));
    }

    #[test]
    fn spaces_scale_with_agent_cap_not_population() {
        let net = ring_network(200.0, 1, 10.0);
        let pair = build_spaces(
            &net,
            &ObsSpec::highway_pov(),
            &ActionBounds::symmetric(1.0),
            4,
        )
        .unwrap();
        assert_eq!(pair.observation.shape(), 20);
        assert_eq!(pair.action.shape(), 4);
        assert_eq!(pair.obs_width, 5);
        assert_eq!(pair.max_agents, 4);
    }

    #[test]
    fn lane_change_widens_action_space() {
        let net = ring_network(200.0, 2, 10.0);
        let bounds = ActionBounds {
            max_accel: 1.0,
            max_decel: 2.0,
            lane_change: true,
        };
        let pair = build_spaces(&net, &ObsSpec::highway_pov(), &bounds, 3).unwrap();
        assert_eq!(pair.action.shape(), 12);
        assert_eq!(pair.action.low()[0], -2.0);
        assert_eq!(pair.action.high()[0], 1.0);
    }

    #[test]
    fn agent_views_have_slot_width() {
        let net = ring_network(200.0, 1, 10.0);
        let pair = build_spaces(
            &net,
            &ObsSpec::highway_pov(),
            &ActionBounds::symmetric(1.0),
            4,
        )
        .unwrap();
        assert_eq!(pair.agent_observation().unwrap().shape(), 5);
        assert_eq!(pair.agent_action().unwrap().shape(), 1);
    }

    #[test]
    fn zero_agent_cap_rejected() {
        let net = ring_network(200.0, 1, 10.0);
        let err = build_spaces(
            &net,
            &ObsSpec::highway_pov(),
            &ActionBounds::symmetric(1.0),
            0,
        )
        .unwrap_err();
        assert_eq!(err, ObsError::ZeroAgentCap);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn clamping_into_bounds_always_contained(
                raw in prop::collection::vec(-100.0f32..100.0, 20)
            ) {
                let net = ring_network(200.0, 1, 10.0);
                let pair = build_spaces(
                    &net,
                    &ObsSpec::highway_pov(),
                    &ActionBounds::symmetric(1.0),
                    4,
                )
                .unwrap();
                let space = &pair.observation;
                let clamped: Vec<f32> = raw
                    .iter()
                    .zip(space.low().iter().zip(space.high()))
                    .map(|(v, (l, h))| v.clamp(*l, *h))
                    .collect();
                prop_assert!(space.contains(&clamped));
            }
        }
    }
}

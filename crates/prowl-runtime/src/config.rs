//! Simulation parameters.
//!
//! [`SimConfig`] describes the world to generate: grid shape, wall density,
//! population, and the per-kind agent profile.  Every field has a default,
//! so a partial TOML or JSON table deserialises cleanly.

use prowl_types::{EntityKind, ProwlError};
use serde::{Deserialize, Serialize};

/// Starting values for one agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentProfile {
    pub energy: u32,
    pub vision_range: f64,
    /// Energy granted to whoever captures this agent.
    pub capture_reward: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub width: usize,
    pub height: usize,
    /// Percentage of tiles that become walls, `0..=100`.
    pub wall_density: u8,
    pub cats: usize,
    pub mice: usize,
    pub pickups: usize,
    pub cat_vision: f64,
    pub mouse_vision: f64,
    pub cat_energy: u32,
    pub mouse_energy: u32,
    /// Energy a mouse gains from a pickup.
    pub pickup_reward: u32,
    /// Energy a cat gains from catching a mouse.
    pub capture_reward: u32,
    /// Agents start out knowing every wall instead of exploring under fog.
    pub instant_learn: bool,
    /// Fixed RNG seed; `None` draws one from the operating system.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: 20,
            height: 20,
            wall_density: 10,
            cats: 1,
            mice: 3,
            pickups: 3,
            cat_vision: 7.5,
            mouse_vision: 7.5,
            cat_energy: 200,
            mouse_energy: 100,
            pickup_reward: 20,
            capture_reward: 50,
            instant_learn: false,
            seed: None,
        }
    }
}

impl SimConfig {
    /// Reject configurations that cannot produce a valid world.
    ///
    /// Walls are random, so a config that passes here can still fail at
    /// placement time with [`ProwlError::NoFreeTile`].
    pub fn validate(&self) -> Result<(), ProwlError> {
        if self.width == 0 || self.height == 0 {
            return Err(ProwlError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.wall_density > 100 {
            return Err(ProwlError::InvalidConfig(format!(
                "wall_density must be within 0..=100, got {}",
                self.wall_density
            )));
        }
        for (name, range) in [("cat_vision", self.cat_vision), ("mouse_vision", self.mouse_vision)] {
            if !(range >= 0.0) || !range.is_finite() {
                return Err(ProwlError::InvalidConfig(format!(
                    "{name} must be a finite, non-negative number, got {range}"
                )));
            }
        }
        let population = self.cats + self.mice + self.pickups;
        let tiles = self.width.saturating_mul(self.height);
        if population > tiles {
            return Err(ProwlError::InvalidConfig(format!(
                "{population} entities do not fit on {tiles} tiles"
            )));
        }
        Ok(())
    }

    /// Starting profile for an agent of `kind`.  Pickups have no profile.
    pub fn profile(&self, kind: EntityKind) -> Option<AgentProfile> {
        match kind {
            EntityKind::Cat => Some(AgentProfile {
                energy: self.cat_energy,
                vision_range: self.cat_vision,
                capture_reward: 0,
            }),
            EntityKind::Mouse => Some(AgentProfile {
                energy: self.mouse_energy,
                vision_range: self.mouse_vision,
                capture_reward: self.capture_reward,
            }),
            EntityKind::Pickup => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = SimConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!((cfg.width, cfg.height), (20, 20));
        assert_eq!(cfg.seed, None);
    }

    #[test]
    fn partial_table_fills_in_defaults() {
        let cfg: SimConfig = serde_json::from_str(r#"{"mice": 5, "seed": 42}"#).unwrap();
        assert_eq!(cfg.mice, 5);
        assert_eq!(cfg.seed, Some(42));
        assert_eq!(cfg.cat_energy, 200);
        assert_eq!(cfg.pickup_reward, 20);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let zero = SimConfig { width: 0, ..SimConfig::default() };
        assert!(matches!(zero.validate(), Err(ProwlError::InvalidDimensions { .. })));

        let dense = SimConfig { wall_density: 150, ..SimConfig::default() };
        assert!(matches!(dense.validate(), Err(ProwlError::InvalidConfig(_))));

        let blind = SimConfig { cat_vision: f64::NAN, ..SimConfig::default() };
        assert!(blind.validate().is_err());

        let crowded = SimConfig {
            width: 2,
            height: 2,
            mice: 4,
            ..SimConfig::default()
        };
        assert!(crowded.validate().is_err());
    }

    #[test]
    fn profiles_follow_kind() {
        let cfg = SimConfig::default();
        let mouse = cfg.profile(EntityKind::Mouse).unwrap();
        assert_eq!(mouse.energy, 100);
        assert_eq!(mouse.capture_reward, 50);
        assert_eq!(cfg.profile(EntityKind::Cat).unwrap().capture_reward, 0);
        assert!(cfg.profile(EntityKind::Pickup).is_none());
    }
}

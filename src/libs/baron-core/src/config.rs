//! Simulation configuration
//!
//! Configuration is read from YAML with every field optional:
//!
//! ```yaml
//! secured: true
//! attacker_present: true
//! rounds: 1001
//! seed: 10
//! area: { width: 2200, height: 1300 }
//! amfs:
//!   - { x: 0, y: 0 }
//!   - { x: 2200, y: 1100 }
//! keys:
//!   core: "abcdefghilmnopqr"
//!   access: "djv0ncjodnon0nnn"
//! ```

use std::path::Path;

use baron_crypt::Key128;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::types::{Coverage, NodeId};

/// Default key shared by the AMFs and the terminal
pub const DEFAULT_CORE_KEY: Key128 = *b"abcdefghilmnopqr";

/// Default key shared by the legitimate access nodes and the terminal
pub const DEFAULT_ACCESS_KEY: Key128 = *b"djv0ncjodnon0nnn";

/// The two long-term symmetric keys of a session
///
/// Handed to every actor at construction. The rogue node never receives them.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SecurityKeys {
    /// AMF <-> terminal
    pub core: Key128,
    /// Access node <-> terminal
    pub access: Key128,
}

impl SecurityKeys {
    pub fn new(core: Key128, access: Key128) -> Self {
        Self { core, access }
    }

    /// Build from two 16-byte strings
    pub fn from_strs(core: &str, access: &str) -> ConfigResult<Self> {
        Ok(Self {
            core: key_from_str("core", core)?,
            access: key_from_str("access", access)?,
        })
    }
}

impl Default for SecurityKeys {
    fn default() -> Self {
        Self {
            core: DEFAULT_CORE_KEY,
            access: DEFAULT_ACCESS_KEY,
        }
    }
}

impl std::fmt::Debug for SecurityKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityKeys").finish_non_exhaustive()
    }
}

fn key_from_str(name: &str, value: &str) -> ConfigResult<Key128> {
    let bytes = value.as_bytes();
    Key128::try_from(bytes).map_err(|_| {
        ConfigError::Validation(format!(
            "{} key must be exactly 16 bytes, got {}",
            name,
            bytes.len()
        ))
    })
}

/// Planar position of a site, in meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub x: f64,
    pub y: f64,
}

impl Site {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Rectangle the terminal is placed in
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub width: f64,
    pub height: f64,
}

impl Default for Area {
    fn default() -> Self {
        Self { width: 2200.0, height: 1300.0 }
    }
}

/// Textual key material as it appears in the YAML file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    pub core: String,
    pub access: String,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            core: String::from_utf8_lossy(&DEFAULT_CORE_KEY).into_owned(),
            access: String::from_utf8_lossy(&DEFAULT_ACCESS_KEY).into_owned(),
        }
    }
}

/// Full simulator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Token generation and verification (patched handover)
    pub secured: bool,
    /// Spawn the rogue node
    pub attacker_present: bool,
    /// Samples wanted per scenario bucket
    pub rounds: usize,
    /// Hard cap on simulated sessions
    pub max_sessions: usize,
    /// Hard cap on handling steps within one session
    pub max_steps: usize,
    /// RNG seed for placement and token minting
    pub seed: u64,
    pub ue_id: u32,
    pub area: Area,
    /// Transmit power of every node
    pub tx_power: f64,
    /// Maximum offset of the rogue node from the terminal, per axis
    pub rogue_radius: f64,
    /// AMF 1 and AMF 2
    pub amfs: Vec<Site>,
    /// Legitimate nodes; node `i` (1-based) is `nodes[i - 1]`
    pub nodes: Vec<Site>,
    pub keys: KeyConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            secured: true,
            attacker_present: true,
            rounds: 1001,
            max_sessions: 100_000,
            max_steps: 64,
            seed: 10,
            ue_id: 12,
            area: Area::default(),
            tx_power: 100.0,
            rogue_radius: 150.0,
            amfs: vec![Site::new(0.0, 0.0), Site::new(2200.0, 1100.0)],
            nodes: default_nodes(),
            keys: KeyConfig::default(),
        }
    }
}

fn default_nodes() -> Vec<Site> {
    vec![
        Site::new(200.0, 1000.0),
        Site::new(450.0, 800.0),
        Site::new(800.0, 400.0),
        Site::new(1000.0, 50.0),
        Site::new(100.0, 650.0),
        Site::new(300.0, 200.0),
        Site::new(950.0, 900.0),
        Site::new(1250.0, 500.0),
        Site::new(1400.0, 250.0),
        Site::new(1200.0, 1100.0),
        Site::new(1850.0, 1000.0),
        Site::new(2000.0, 750.0),
    ]
}

impl SimConfig {
    /// Load and validate a YAML configuration file
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loaded configuration from {}", path.display());
        Self::from_yaml_str(&text)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(text: &str) -> ConfigResult<Self> {
        let config: SimConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn security_keys(&self) -> ConfigResult<SecurityKeys> {
        SecurityKeys::from_strs(&self.keys.core, &self.keys.access)
    }

    /// Number of node mailbox slots, the rogue included
    pub fn node_slots(&self) -> u32 {
        self.nodes.len() as u32 + u32::from(self.attacker_present)
    }

    pub fn coverage(&self) -> Coverage {
        Coverage::new(self.node_slots())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let invalid = |msg: String| Err(ConfigError::Validation(msg));

        if self.amfs.len() != 2 {
            return invalid(format!("exactly 2 AMFs required, got {}", self.amfs.len()));
        }
        if self.nodes.len() < 3 {
            return invalid(format!(
                "at least 3 access nodes required, got {}",
                self.nodes.len()
            ));
        }
        if self.rounds == 0 {
            return invalid("rounds must be non-zero".to_string());
        }
        if self.max_steps == 0 {
            return invalid("max_steps must be non-zero".to_string());
        }
        if self.max_sessions < self.rounds {
            return invalid(format!(
                "max_sessions ({}) must be at least rounds ({})",
                self.max_sessions, self.rounds
            ));
        }
        if !(self.area.width > 0.0 && self.area.height > 0.0) {
            return invalid("area must have positive width and height".to_string());
        }
        if !(self.tx_power > 0.0) {
            return invalid("tx_power must be positive".to_string());
        }
        if !(self.rogue_radius >= 0.0) {
            return invalid("rogue_radius must not be negative".to_string());
        }
        self.security_keys()?;

        let coverage = self.coverage();
        for id in 1..=self.nodes.len() as u32 {
            if coverage.controller(NodeId(id)).is_none() {
                return invalid(format!(
                    "node {} is outside the AMF coverage partition ({} nodes per AMF)",
                    id,
                    coverage.per_amf()
                ));
            }
        }
        Ok(())
    }
}

//! Engine settings.
//!
//! Every field is optional so a partially filled config file works; the
//! accessors supply the defaults.

use serde::{Deserialize, Serialize};

use crate::modes::ModeKind;
use crate::spectrum::AnalyserSettings;

/// Mode built when nothing else is configured, and the fallback on a failed
/// initial load
pub const FALLBACK_MODE: ModeKind = ModeKind::Mosaic;

/// Upper bound on the objects a configured layout may ask for
pub const MAX_SCENE_OBJECTS: usize = 100_000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    pub default_mode: Option<ModeKind>,
    /// Seed for scene construction; random per build when unset
    pub seed: Option<u64>,
    pub mosaic_grid: Option<[u32; 2]>,
    pub sphere_detail: Option<u32>,
    pub tunnel_rings: Option<usize>,
    pub tunnel_particles: Option<usize>,
    /// Analyser smoothing time constant (0-1)
    pub smoothing: Option<f32>,
}

impl EngineSettings {
    pub fn default_mode(&self) -> ModeKind {
        self.default_mode.unwrap_or(FALLBACK_MODE)
    }

    pub fn mosaic_grid(&self) -> [u32; 2] {
        self.mosaic_grid.unwrap_or([30, 30])
    }

    pub fn sphere_detail(&self) -> u32 {
        self.sphere_detail.unwrap_or(3)
    }

    pub fn tunnel_rings(&self) -> usize {
        self.tunnel_rings.unwrap_or(15)
    }

    pub fn tunnel_particles(&self) -> usize {
        self.tunnel_particles.unwrap_or(500)
    }

    pub fn analyser(&self) -> AnalyserSettings {
        let defaults = AnalyserSettings::default();
        AnalyserSettings {
            smoothing: self.smoothing.unwrap_or(defaults.smoothing),
            ..defaults
        }
    }
}

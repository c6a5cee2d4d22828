pub mod mosaic;
pub mod shader;
pub mod sphere;
pub mod tunnel;

use glam::Vec3;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModeError;
use crate::scene::{Camera, SceneObjectSet};
use crate::settings::EngineSettings;
use crate::spectrum::SpectrumFrame;

pub use mosaic::Mosaic;
pub use shader::Shader;
pub use sphere::Sphere;
pub use tunnel::Tunnel;

const CAMERA_FOV: f32 = 75.0;
const CAMERA_NEAR: f32 = 0.1;
const CAMERA_FAR: f32 = 1000.0;

/// The fixed set of visualization modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeKind {
    Mosaic,
    Sphere,
    Shader,
    Tunnel,
}

impl ModeKind {
    pub const ALL: [ModeKind; 4] = [
        ModeKind::Mosaic,
        ModeKind::Sphere,
        ModeKind::Shader,
        ModeKind::Tunnel,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ModeKind::Mosaic => "mosaic",
            ModeKind::Sphere => "sphere",
            ModeKind::Shader => "shader",
            ModeKind::Tunnel => "tunnel",
        }
    }

    pub fn index(self) -> usize {
        ModeKind::ALL
            .iter()
            .position(|&m| m == self)
            .unwrap_or(0)
    }

    /// The mode after this one, wrapping around
    pub fn next(self) -> ModeKind {
        ModeKind::ALL[(self.index() + 1) % ModeKind::ALL.len()]
    }

    /// Distance of the camera from the origin
    fn camera_distance(self) -> f32 {
        match self {
            ModeKind::Mosaic => 300.0,
            _ => 100.0,
        }
    }

    /// Build this mode's routine and scene
    pub fn build(
        self,
        ctx: &mut BuildContext<'_>,
    ) -> Result<(Box<dyn Visualization>, SceneObjectSet), ModeError> {
        Ok(match self {
            ModeKind::Mosaic => {
                let (mode, scene) = Mosaic::build(ctx)?;
                (Box::new(mode), scene)
            }
            ModeKind::Sphere => {
                let (mode, scene) = Sphere::build(ctx)?;
                (Box::new(mode), scene)
            }
            ModeKind::Shader => {
                let (mode, scene) = Shader::build(ctx)?;
                (Box::new(mode), scene)
            }
            ModeKind::Tunnel => {
                let (mode, scene) = Tunnel::build(ctx)?;
                (Box::new(mode), scene)
            }
        })
    }
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModeKind::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown mode '{}' (expected one of: mosaic, sphere, shader, tunnel)",
                    s
                )
            })
    }
}

/// Viewport size in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

/// What a mode gets when it builds its scene
pub struct BuildContext<'a> {
    /// Fresh per build; seeded when the settings carry a seed
    pub rng: &'a mut StdRng,
    pub viewport: Viewport,
    pub settings: &'a EngineSettings,
}

impl BuildContext<'_> {
    /// The standard camera for `kind`, matched to the viewport
    pub fn camera(&self, kind: ModeKind) -> Camera {
        Camera::perspective(
            CAMERA_FOV,
            self.viewport.aspect(),
            CAMERA_NEAR,
            CAMERA_FAR,
            Vec3::new(0.0, 0.0, kind.camera_distance()),
        )
    }
}

/// Per-frame behavior of a live mode
pub trait Visualization {
    fn kind(&self) -> ModeKind;

    /// Mutate the mode's scene for one tick
    fn update(
        &mut self,
        scene: &mut SceneObjectSet,
        frame: &SpectrumFrame,
        elapsed: f32,
    ) -> Result<(), ModeError>;
}

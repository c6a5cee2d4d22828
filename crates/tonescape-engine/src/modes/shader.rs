//! Full-screen procedural pattern.
//!
//! The mode itself only drives two uniforms. While the spectrum carries
//! energy, `audio_data` tracks the mean level and `time` advances; during
//! silence time freezes and `audio_data` decays geometrically, which fades
//! the picture out through [`shade`].

use glam::Vec2;

use super::{BuildContext, ModeKind, Visualization};
use crate::color::Rgb;
use crate::error::{ModeError, SignalError};
use crate::scene::{ObjectId, SceneObjectSet, ShaderQuad};
use crate::signal::avg;
use crate::spectrum::SpectrumFrame;

/// Mean level (0-1) above which the pattern is considered live
pub const ACTIVITY_THRESHOLD: f32 = 0.01;
/// Time added per live tick
pub const TIME_STEP: f32 = 0.016;
/// Per-tick decay of `audio_data` during silence
pub const DECAY: f32 = 0.9;

pub struct Shader {
    quad: ObjectId,
}

impl Shader {
    pub fn build(ctx: &mut BuildContext<'_>) -> Result<(Self, SceneObjectSet), ModeError> {
        let mut scene = SceneObjectSet::new(ModeKind::Shader, ctx.camera(ModeKind::Shader));
        let quad = scene.add(ShaderQuad::default());
        Ok((Self { quad }, scene))
    }
}

impl Visualization for Shader {
    fn kind(&self) -> ModeKind {
        ModeKind::Shader
    }

    fn update(
        &mut self,
        scene: &mut SceneObjectSet,
        frame: &SpectrumFrame,
        _elapsed: f32,
    ) -> Result<(), ModeError> {
        let bins = frame.band(0..frame.len())?;
        let level = avg(bins).ok_or(SignalError::EmptyBand {
            start: 0,
            end: 0,
            len: 0,
        })? / 255.0;

        let uniforms = &mut scene.get_mut::<ShaderQuad>(self.quad)?.uniforms;
        if level > ACTIVITY_THRESHOLD {
            uniforms.audio_data = level;
            uniforms.time += TIME_STEP;
        } else {
            uniforms.audio_data *= DECAY;
        }
        Ok(())
    }
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Cosine palette, every channel in 0-1
fn palette(t: f32) -> Rgb {
    const PHASE: [f32; 3] = [0.263, 0.416, 0.557];
    let channel = |d: f32| 0.5 + 0.5 * (std::f32::consts::TAU * (t + d)).cos();
    Rgb::new(channel(PHASE[0]), channel(PHASE[1]), channel(PHASE[2]))
}

/// Color of the pattern at `uv` (0-1 on both axes, origin bottom-left).
///
/// Layers a travelling wave, a ripple ring set pushed by the audio level and
/// a thin grid, colors them through the palette, then cuts them with a disc
/// whose radius grows with `audio_data`. The whole thing fades to black as
/// `audio_data` approaches zero.
pub fn shade(uv: Vec2, time: f32, audio_data: f32) -> Rgb {
    let p = (uv - Vec2::splat(0.5)) * 2.0;
    let r = p.length();
    let angle = p.y.atan2(p.x);

    let wave = (p.x * 10.0 + time * 2.0).sin() * (p.y * 10.0 - time * 1.5).cos();
    let ripple = (r * 20.0 - time * 4.0 + audio_data * 10.0).sin();
    let swirl = (angle * 6.0 + time).sin();
    let lines = (p.x * std::f32::consts::PI * 8.0)
        .sin()
        .abs()
        .max((p.y * std::f32::consts::PI * 8.0).sin().abs());
    let grid = smoothstep(0.9, 1.0, lines);

    let pattern = wave * 0.35 + ripple * 0.35 + swirl * 0.1 + grid * 0.2;
    let color = palette(pattern + time * 0.1 + audio_data);

    let radius = 0.4 + audio_data * 0.8;
    let mask = 1.0 - smoothstep(radius - 0.2, radius, r);
    let glow = 0.6 + 0.4 * grid;
    let fade = smoothstep(0.0, 0.05, audio_data);

    color.scale(mask * glow * fade).clamped()
}

//! Per-vertex Lambert lighting for lit meshes.

use glam::Vec3;
use tonescape_engine::scene::{Light, LightKind};
use tonescape_engine::Rgb;

/// Spotlights aim at the scene origin
const SPOT_TARGET: Vec3 = Vec3::ZERO;

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge0 == edge1 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Range falloff: 1 at the light, 0 at `distance` and beyond.
/// A zero distance means unlimited range.
fn range_falloff(d: f32, distance: f32) -> f32 {
    if distance <= 0.0 {
        return 1.0;
    }
    let ratio = d / distance;
    let window = (1.0 - ratio.powi(4)).clamp(0.0, 1.0);
    window * window
}

/// Light arriving at `point` with surface `normal` from one light, before
/// multiplying by the surface color
pub fn irradiance(light: &Light, point: Vec3, normal: Vec3) -> Rgb {
    let incoming = light.color.scale(light.intensity);
    let to_light = light.position - point;
    let d = to_light.length();
    let lambert = if d > f32::EPSILON {
        normal.dot(to_light / d).max(0.0)
    } else {
        1.0
    };

    match light.kind {
        LightKind::Ambient => incoming,
        LightKind::Point { distance } => incoming.scale(lambert * range_falloff(d, distance)),
        LightKind::Spot {
            distance,
            angle,
            penumbra,
            decay,
        } => {
            let axis = (SPOT_TARGET - light.position).normalize_or_zero();
            let cos_theta = if d > f32::EPSILON {
                axis.dot(-to_light / d)
            } else {
                1.0
            };
            let outer = angle.cos();
            let inner = (angle * (1.0 - penumbra)).cos();
            let cone = smoothstep(outer, inner, cos_theta);
            let falloff = range_falloff(d, distance).powf(decay.max(0.0));
            incoming.scale(lambert * cone * falloff)
        }
    }
}

/// Surface color under every light in the scene
pub fn illuminate<'a>(
    base: Rgb,
    point: Vec3,
    normal: Vec3,
    lights: impl IntoIterator<Item = &'a Light>,
) -> Rgb {
    lights
        .into_iter()
        .fold(Rgb::BLACK, |acc, light| acc.add(irradiance(light, point, normal)))
        .mul(base)
        .clamped()
}

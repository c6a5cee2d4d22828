//! Noise-warped icosahedron with orbiting lights.
//!
//! The lower half of the spectrum drives a uniform "bass" swell through its
//! peak, the upper half drives the noise amplitude through its mean. Both are
//! divided by the band length first, giving a per-bin contribution.

use glam::Vec3;
use rand::Rng;

use super::{BuildContext, ModeKind, Visualization};
use crate::color::{Hsl, Rgb};
use crate::deformer::{SphereWarp, WarpParams};
use crate::error::{ModeError, SignalError};
use crate::geometry::Geometry;
use crate::scene::{Light, LightKind, Mesh, ObjectId, SceneObjectSet, Transform};
use crate::signal::{avg, max, modulate};
use crate::spectrum::SpectrumFrame;

const RADIUS: f32 = 20.0;
const MAX_DETAIL: u32 = 6;
const SPHERE_COLOR: u32 = 0xADD8E6;
const POINT_LIGHTS: usize = 6;
const SPOT_LIGHTS: usize = 2;
const LIGHT_SPREAD: f32 = 100.0;
const ORBIT_RADIUS: f32 = 50.0;
const SPOT_ORBIT_RADIUS: f32 = 100.0;
/// Spotlights circle ten times faster than the point lights
const SPOT_ORBIT_SPEED: f32 = 10.0;
const SPIN: Vec3 = Vec3::new(0.001, 0.003, 0.005);

/// Lower and upper band levels of one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandLevels {
    /// Peak of the lower half divided by its length
    pub lower_max: f32,
    /// Mean of the upper half divided by its length
    pub upper_avg: f32,
}

impl BandLevels {
    /// Split at `N/2 - 1`; the last bin is left out of both halves
    pub fn measure(frame: &SpectrumFrame) -> Result<Self, SignalError> {
        let n = frame.len();
        let split = (n / 2).saturating_sub(1);
        let lower = frame.band(0..split)?;
        let upper = frame.band(split..n.saturating_sub(1))?;

        let empty = |start: usize, end: usize| SignalError::EmptyBand { start, end, len: n };
        let lower_max = max(lower).ok_or_else(|| empty(0, split))?;
        let upper_avg = avg(upper).ok_or_else(|| empty(split, n - 1))?;

        Ok(Self {
            lower_max: lower_max / lower.len() as f32,
            upper_avg: upper_avg / upper.len() as f32,
        })
    }

    pub fn bass_amplitude(&self) -> f32 {
        modulate(self.lower_max.powf(0.8), 0.0, 1.0, 0.0, 8.0)
    }

    pub fn treble_amplitude(&self) -> f32 {
        modulate(self.upper_avg, 0.0, 1.0, 0.0, 4.0)
    }
}

pub struct Sphere {
    mesh: ObjectId,
    point_lights: Vec<ObjectId>,
    spot_lights: Vec<ObjectId>,
    warp: SphereWarp,
}

impl Sphere {
    pub fn build(ctx: &mut BuildContext<'_>) -> Result<(Self, SceneObjectSet), ModeError> {
        let detail = ctx.settings.sphere_detail();
        if detail > MAX_DETAIL {
            return Err(ModeError::InvalidLayout(format!(
                "sphere detail {} exceeds {}",
                detail, MAX_DETAIL
            )));
        }

        let mut scene = SceneObjectSet::new(ModeKind::Sphere, ctx.camera(ModeKind::Sphere));
        let mesh = scene.add(Mesh {
            transform: Transform::default(),
            geometry: Geometry::icosahedron(RADIUS, detail),
            color: Rgb::from_hex(SPHERE_COLOR),
            wireframe: true,
        });

        scene.add(Light {
            kind: LightKind::Ambient,
            position: Vec3::ZERO,
            color: Rgb::from_hex(0x404040),
            intensity: 0.5,
        });

        let mut point_lights = Vec::with_capacity(POINT_LIGHTS);
        for _ in 0..POINT_LIGHTS {
            let color = Rgb::from_hex(ctx.rng.random_range(0..0x1000000));
            let position = random_position(ctx);
            point_lights.push(scene.add(Light {
                kind: LightKind::Point { distance: 100.0 },
                position,
                color,
                intensity: 1.0,
            }));
        }

        let mut spot_lights = Vec::with_capacity(SPOT_LIGHTS);
        for _ in 0..SPOT_LIGHTS {
            let position = random_position(ctx);
            spot_lights.push(scene.add(Light {
                kind: LightKind::Spot {
                    distance: 200.0,
                    angle: std::f32::consts::FRAC_PI_4,
                    penumbra: 0.5,
                    decay: 1.0,
                },
                position,
                color: Rgb::from_hex(0xff0000),
                intensity: 2.0,
            }));
        }

        let warp = SphereWarp::new(ctx.rng.random());

        Ok((
            Self {
                mesh,
                point_lights,
                spot_lights,
                warp,
            },
            scene,
        ))
    }
}

fn random_position(ctx: &mut BuildContext<'_>) -> Vec3 {
    Vec3::new(
        ctx.rng.random_range(-LIGHT_SPREAD..LIGHT_SPREAD),
        ctx.rng.random_range(-LIGHT_SPREAD..LIGHT_SPREAD),
        ctx.rng.random_range(-LIGHT_SPREAD..LIGHT_SPREAD),
    )
}

impl Visualization for Sphere {
    fn kind(&self) -> ModeKind {
        ModeKind::Sphere
    }

    fn update(
        &mut self,
        scene: &mut SceneObjectSet,
        frame: &SpectrumFrame,
        elapsed: f32,
    ) -> Result<(), ModeError> {
        let levels = BandLevels::measure(frame)?;

        let mesh = scene.get_mut::<Mesh>(self.mesh)?;
        mesh.transform.rotation += SPIN;
        self.warp.apply(
            &mut mesh.geometry,
            WarpParams {
                bass: levels.bass_amplitude(),
                treble: levels.treble_amplitude(),
                elapsed,
            },
        );

        let intensity = modulate(levels.lower_max, 0.0, 1.0, 0.5, 2.0);
        let hue = modulate(levels.upper_avg, 0.0, 1.0, 0.0, 1.0);
        for (index, &id) in self.point_lights.iter().enumerate() {
            let light = scene.get_mut::<Light>(id)?;
            let phase = elapsed + index as f32;
            light.position.x = phase.sin() * ORBIT_RADIUS;
            light.position.y = phase.cos() * ORBIT_RADIUS;
            light.intensity = intensity;
            light.color = Hsl::new(hue, 1.0, 0.5).to_rgb();
        }

        let spot_intensity = modulate(levels.upper_avg, 0.0, 1.0, 0.1, 5.0);
        let spot_phase = elapsed * SPOT_ORBIT_SPEED;
        for &id in &self.spot_lights {
            let light = scene.get_mut::<Light>(id)?;
            light.intensity = spot_intensity;
            light.position.x = spot_phase.sin() * SPOT_ORBIT_RADIUS;
            light.position.y = spot_phase.cos() * SPOT_ORBIT_RADIUS;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::Viewport;
    use crate::settings::EngineSettings;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn build(seed: u64) -> (Sphere, SceneObjectSet) {
        let settings = EngineSettings::default();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut ctx = BuildContext {
            rng: &mut rng,
            viewport: Viewport::default(),
            settings: &settings,
        };
        Sphere::build(&mut ctx).unwrap()
    }

    #[test]
    fn test_scene_contents() {
        let (sphere, scene) = build(5);
        let lights: Vec<&Light> = scene.lights().collect();
        assert_eq!(lights.len(), 1 + POINT_LIGHTS + SPOT_LIGHTS);
        assert_eq!(
            lights
                .iter()
                .filter(|l| matches!(l.kind, LightKind::Spot { .. }))
                .count(),
            2
        );
        assert_eq!(
            scene.get::<Mesh>(sphere.mesh).unwrap().geometry.faces.len(),
            320
        );
    }

    #[test]
    fn test_seeded_builds_match() {
        let (_, a) = build(9);
        let (_, b) = build(9);
        let pa: Vec<Vec3> = a.lights().map(|l| l.position).collect();
        let pb: Vec<Vec3> = b.lights().map(|l| l.position).collect();
        assert_eq!(pa, pb);
    }

    #[test]
    fn test_band_levels() {
        // 8 bins: lower = [0, 3), upper = [3, 7)
        let frame = SpectrumFrame::from_bins(vec![30, 60, 15, 8, 8, 8, 8, 255]);
        let levels = BandLevels::measure(&frame).unwrap();
        assert!((levels.lower_max - 20.0).abs() < 1e-5);
        assert!((levels.upper_avg - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_short_frame_is_degenerate() {
        let frame = SpectrumFrame::from_bins(vec![1, 2]);
        assert!(BandLevels::measure(&frame).is_err());
    }

    #[test]
    fn test_silence_keeps_radius_and_spins() {
        let (mut sphere, mut scene) = build(1);
        sphere
            .update(&mut scene, &SpectrumFrame::silent(256), 2.0)
            .unwrap();
        let mesh = scene.get::<Mesh>(sphere.mesh).unwrap();
        assert_eq!(mesh.transform.rotation, SPIN);
        for p in &mesh.geometry.positions {
            assert!((p.length() - RADIUS).abs() < 1e-4);
        }
    }

    #[test]
    fn test_lights_follow_levels() {
        let (mut sphere, mut scene) = build(2);
        sphere
            .update(&mut scene, &SpectrumFrame::silent(256), 0.0)
            .unwrap();

        let light = scene.get::<Light>(sphere.point_lights[0]).unwrap();
        assert!((light.position.y - ORBIT_RADIUS).abs() < 1e-4);
        assert!((light.intensity - 0.5).abs() < 1e-6);

        let spot = scene.get::<Light>(sphere.spot_lights[0]).unwrap();
        assert!((spot.intensity - 0.1).abs() < 1e-6);
        assert!((spot.position.y - SPOT_ORBIT_RADIUS).abs() < 1e-4);
    }
}

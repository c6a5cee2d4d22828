//! Receding ring and particle tunnel.
//!
//! Rings and particles drift toward the camera at a rate boosted by the bass
//! level. Anything crossing [`NEAR_Z`] is sent back to [`FAR_Z`] with a fresh
//! hue (and, for particles, a fresh lateral position).

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{BuildContext, ModeKind, Visualization};
use crate::color::{Hsl, Rgb};
use crate::error::{ModeError, SignalError};
use crate::scene::{
    Backdrop, Light, LightKind, ObjectId, Particle, Ring, SceneObjectSet, Transform,
};
use crate::settings::MAX_SCENE_OBJECTS;
use crate::signal::avg;
use crate::spectrum::SpectrumFrame;

/// Depth past which objects are recycled
pub const NEAR_Z: f32 = 50.0;
/// Depth recycled objects restart from
pub const FAR_Z: f32 = -300.0;
pub const PARTICLE_INNER_RADIUS: f32 = 5.0;
pub const PARTICLE_OUTER_RADIUS: f32 = 30.0;

const BACKDROP_Z: f32 = -400.0;
const BACKDROP_SIZE: f32 = 2000.0;
const RING_SPACING: f32 = 20.0;
const RING_INNER_RADIUS: f32 = 18.0;
const RING_OUTER_RADIUS: f32 = 20.0;
const RING_SPEED: f32 = 1.0;
const PARTICLE_SPEED_MIN: f32 = 0.5;
const PARTICLE_SPEED_MAX: f32 = 2.0;
const PARTICLE_SIZE: f32 = 0.5;
/// How much the bass level multiplies the advance rate
const BASS_BOOST: f32 = 4.0;
const BASS_BINS: std::ops::Range<usize> = 0..5;
const MID_BINS: std::ops::Range<usize> = 5..20;

/// Band intensities the tunnel reacts to, both 0-1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TunnelLevels {
    pub bass: f32,
    pub mid: f32,
}

impl TunnelLevels {
    pub fn measure(frame: &SpectrumFrame) -> Result<Self, SignalError> {
        let band_avg = |range: std::ops::Range<usize>| -> Result<f32, SignalError> {
            let bins = frame.band(range.clone())?;
            avg(bins).ok_or(SignalError::EmptyBand {
                start: range.start,
                end: range.end,
                len: frame.len(),
            })
        };
        Ok(Self {
            bass: band_avg(BASS_BINS)? / 255.0,
            mid: band_avg(MID_BINS)? / 255.0,
        })
    }
}

pub struct Tunnel {
    backdrop: ObjectId,
    light: ObjectId,
    rings: Vec<ObjectId>,
    particles: Vec<ObjectId>,
    /// Randomness for recycling, seeded from the build
    rng: StdRng,
}

impl Tunnel {
    pub fn build(ctx: &mut BuildContext<'_>) -> Result<(Self, SceneObjectSet), ModeError> {
        let ring_count = ctx.settings.tunnel_rings();
        let particle_count = ctx.settings.tunnel_particles();
        if ring_count == 0 {
            return Err(ModeError::InvalidLayout("tunnel needs at least one ring".into()));
        }
        if ring_count.saturating_add(particle_count) > MAX_SCENE_OBJECTS {
            return Err(ModeError::InvalidLayout(format!(
                "tunnel with {} rings and {} particles exceeds {} objects",
                ring_count, particle_count, MAX_SCENE_OBJECTS
            )));
        }

        let mut scene = SceneObjectSet::new(ModeKind::Tunnel, ctx.camera(ModeKind::Tunnel));

        let backdrop = scene.add(Backdrop {
            transform: Transform::at(Vec3::new(0.0, 0.0, BACKDROP_Z)),
            size: BACKDROP_SIZE,
            color: Hsl::new(0.7, 0.5, 0.05),
        });

        let light = scene.add(Light {
            kind: LightKind::Point { distance: 500.0 },
            position: Vec3::new(0.0, 0.0, NEAR_Z),
            color: Rgb::WHITE,
            intensity: 1.0,
        });

        let rings = (0..ring_count)
            .map(|i| {
                scene.add(Ring {
                    transform: Transform::at(Vec3::new(0.0, 0.0, -(i as f32) * RING_SPACING)),
                    inner_radius: RING_INNER_RADIUS,
                    outer_radius: RING_OUTER_RADIUS,
                    color: Hsl::new(i as f32 / ring_count as f32, 0.8, 0.5),
                })
            })
            .collect();

        let mut rng = StdRng::seed_from_u64(ctx.rng.random());
        let mut particles = Vec::with_capacity(particle_count);
        for _ in 0..particle_count {
            let mut position = lateral_position(&mut rng);
            position.z = rng.random_range(FAR_Z..NEAR_Z);
            particles.push(scene.add(Particle {
                position,
                speed: rng.random_range(PARTICLE_SPEED_MIN..PARTICLE_SPEED_MAX),
                size: PARTICLE_SIZE,
                color: Hsl::new(rng.random::<f32>(), 0.8, 0.6),
            }));
        }

        log::debug!("tunnel: {} rings, {} particles", ring_count, particle_count);
        Ok((
            Self {
                backdrop,
                light,
                rings,
                particles,
                rng,
            },
            scene,
        ))
    }
}

/// Uniform point in the particle annulus, z = 0
fn lateral_position(rng: &mut StdRng) -> Vec3 {
    let angle = rng.random_range(0.0..std::f32::consts::TAU);
    // sqrt keeps the density uniform over the annulus area
    let inner_sq = PARTICLE_INNER_RADIUS * PARTICLE_INNER_RADIUS;
    let outer_sq = PARTICLE_OUTER_RADIUS * PARTICLE_OUTER_RADIUS;
    let radius = rng.random_range(inner_sq..outer_sq).sqrt();
    Vec3::new(radius * angle.cos(), radius * angle.sin(), 0.0)
}

impl Visualization for Tunnel {
    fn kind(&self) -> ModeKind {
        ModeKind::Tunnel
    }

    fn update(
        &mut self,
        scene: &mut SceneObjectSet,
        frame: &SpectrumFrame,
        elapsed: f32,
    ) -> Result<(), ModeError> {
        let levels = TunnelLevels::measure(frame)?;
        let rate = 1.0 + levels.bass * BASS_BOOST;
        let ring_count = self.rings.len() as f32;

        for (index, &id) in self.rings.iter().enumerate() {
            let ring = scene.get_mut::<Ring>(id)?;
            ring.transform.position.z += RING_SPEED * rate;
            ring.transform.rotation.z += 0.01 + levels.mid * 0.05;
            let swell = 1.0 + levels.mid * 0.3;
            ring.transform.scale = Vec3::new(swell, swell, 1.0);

            if ring.transform.position.z > NEAR_Z {
                ring.transform.position.z = FAR_Z;
                let hue = (index as f32 / ring_count + elapsed * 0.1).rem_euclid(1.0);
                ring.color = Hsl::new(hue, 0.8, 0.5);
            }
        }

        for &id in &self.particles {
            let particle = scene.get_mut::<Particle>(id)?;
            particle.position.z += particle.speed * rate;
            particle.size = PARTICLE_SIZE * (1.0 + levels.mid);

            if particle.position.z > NEAR_Z {
                let mut position = lateral_position(&mut self.rng);
                position.z = FAR_Z;
                particle.position = position;
                particle.color = Hsl::new((elapsed * 0.1).rem_euclid(1.0), 0.8, 0.6);
            }
        }

        let backdrop = scene.get_mut::<Backdrop>(self.backdrop)?;
        backdrop.color = Hsl::new(
            (elapsed * 0.02).rem_euclid(1.0),
            0.5,
            0.05 + levels.bass * 0.15,
        );

        let light = scene.get_mut::<Light>(self.light)?;
        light.color = Hsl::new((elapsed * 0.05).rem_euclid(1.0), 1.0, 0.5).to_rgb();
        light.intensity = 1.0 + levels.bass * 2.0;

        Ok(())
    }
}

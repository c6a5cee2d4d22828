//! Noise-driven sphere warp.
//!
//! Every vertex is pushed along its original unit direction by
//! `radius + bass + noise * 5 * treble * 2`, with the noise sampled at the
//! direction offset by a slow drift with per-axis rates 4, 6 and 7.
//! Positions are always rebuilt from the original directions,
//! so nothing accumulates between frames.

use noise::{NoiseFn, OpenSimplex};

use crate::geometry::Geometry;

/// Noise amplitude before the treble factor
const NOISE_AMP: f32 = 5.0;
/// Drift of the noise lookup per second of elapsed time
const DRIFT_RATE: f64 = 0.01;
const AXIS_RATES: [f64; 3] = [4.0, 6.0, 7.0];

/// Per-frame warp inputs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarpParams {
    pub bass: f32,
    pub treble: f32,
    /// Seconds since the mode started
    pub elapsed: f32,
}

pub struct SphereWarp<N = OpenSimplex> {
    noise: N,
}

impl SphereWarp<OpenSimplex> {
    pub fn new(seed: u32) -> Self {
        Self {
            noise: OpenSimplex::new(seed),
        }
    }
}

impl<N: NoiseFn<f64, 3>> SphereWarp<N> {
    /// Warp with a custom noise source
    pub fn with_noise(noise: N) -> Self {
        Self { noise }
    }

    /// Noise value for a unit direction at `elapsed` seconds
    pub fn sample(&self, dir: [f32; 3], elapsed: f32) -> f32 {
        let t = elapsed as f64 * DRIFT_RATE;
        self.noise.get([
            dir[0] as f64 + t * AXIS_RATES[0],
            dir[1] as f64 + t * AXIS_RATES[1],
            dir[2] as f64 + t * AXIS_RATES[2],
        ]) as f32
    }

    /// Rewrite every position of `geometry` and recompute its normals
    pub fn apply(&self, geometry: &mut Geometry, params: WarpParams) {
        let radius = geometry.radius;
        for (pos, dir) in geometry.positions.iter_mut().zip(&geometry.base) {
            let n = self.sample(dir.to_array(), params.elapsed);
            let distance = radius + params.bass + n * NOISE_AMP * params.treble * 2.0;
            *pos = *dir * distance;
        }
        geometry.compute_vertex_normals();
        geometry.compute_face_normals();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noise::Constant;

    #[test]
    fn test_silence_leaves_base_radius() {
        let warp = SphereWarp::new(7);
        let mut geometry = Geometry::icosahedron(20.0, 3);
        warp.apply(
            &mut geometry,
            WarpParams {
                bass: 0.0,
                treble: 0.0,
                elapsed: 12.5,
            },
        );
        for p in &geometry.positions {
            assert!((p.length() - 20.0).abs() < 1e-4, "distance {}", p.length());
        }
    }

    #[test]
    fn test_constant_noise_distance() {
        let warp = SphereWarp::with_noise(Constant::new(0.5));
        let mut geometry = Geometry::icosahedron(10.0, 1);
        warp.apply(
            &mut geometry,
            WarpParams {
                bass: 2.0,
                treble: 1.5,
                elapsed: 0.0,
            },
        );
        // 10 + 2 + 0.5 * 5 * 1.5 * 2
        for p in &geometry.positions {
            assert!((p.length() - 19.5).abs() < 1e-3);
        }
    }

    #[test]
    fn test_warp_does_not_accumulate() {
        let warp = SphereWarp::new(3);
        let params = WarpParams {
            bass: 4.0,
            treble: 2.0,
            elapsed: 3.0,
        };
        let mut geometry = Geometry::icosahedron(20.0, 2);
        warp.apply(&mut geometry, params);
        let first = geometry.positions.clone();
        for _ in 0..10 {
            warp.apply(&mut geometry, params);
        }
        assert_eq!(first, geometry.positions);
    }

    #[test]
    fn test_normals_follow_positions() {
        let warp = SphereWarp::with_noise(Constant::new(0.0));
        let mut geometry = Geometry::icosahedron(20.0, 1);
        let before = geometry.face_normals.clone();
        warp.apply(
            &mut geometry,
            WarpParams {
                bass: 5.0,
                treble: 0.0,
                elapsed: 1.0,
            },
        );
        // A uniform push keeps the directions of the normals
        for (a, b) in before.iter().zip(&geometry.face_normals) {
            assert!(a.dot(*b) > 0.999);
        }
    }

    #[test]
    fn test_noise_drifts_over_time() {
        let warp = SphereWarp::new(11);
        let dir = [0.3, 0.5, 0.81];
        let early = warp.sample(dir, 0.0);
        let late = warp.sample(dir, 60.0);
        assert_ne!(early, late);
    }
}

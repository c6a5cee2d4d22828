//! Grid of reactive tiles.
//!
//! Tile `i` follows bin `i mod N`: it grows to `1 + f` times its size and
//! takes hue `f`. Tiles never move.

use glam::Vec3;
use rand::Rng;

use super::{BuildContext, ModeKind, Visualization};
use crate::color::Hsl;
use crate::error::{ModeError, SignalError};
use crate::scene::{ObjectId, SceneObjectSet, Tile, Transform};
use crate::settings::MAX_SCENE_OBJECTS;
use crate::spectrum::SpectrumFrame;

const TILE_SIZE: f32 = 5.0;
const TILE_SPACING: f32 = 15.0;

pub struct Mosaic {
    tiles: Vec<ObjectId>,
}

impl Mosaic {
    pub fn build(ctx: &mut BuildContext<'_>) -> Result<(Self, SceneObjectSet), ModeError> {
        let [width, height] = ctx.settings.mosaic_grid();
        if width == 0 || height == 0 {
            return Err(ModeError::InvalidLayout(format!(
                "mosaic grid {}x{} has no tiles",
                width, height
            )));
        }
        let count = (width as usize)
            .checked_mul(height as usize)
            .filter(|&n| n <= MAX_SCENE_OBJECTS)
            .ok_or_else(|| {
                ModeError::InvalidLayout(format!(
                    "mosaic grid {}x{} exceeds {} tiles",
                    width, height, MAX_SCENE_OBJECTS
                ))
            })?;

        let mut scene = SceneObjectSet::new(ModeKind::Mosaic, ctx.camera(ModeKind::Mosaic));
        let half_w = width as f32 * TILE_SPACING / 2.0;
        let half_h = height as f32 * TILE_SPACING / 2.0;

        let mut tiles = Vec::with_capacity(count);
        for i in 0..width {
            for j in 0..height {
                let position = Vec3::new(
                    i as f32 * TILE_SPACING - half_w,
                    j as f32 * TILE_SPACING - half_h,
                    0.0,
                );
                tiles.push(scene.add(Tile {
                    transform: Transform::at(position),
                    size: TILE_SIZE,
                    color: Hsl::new(ctx.rng.random::<f32>(), 0.5, 0.5),
                }));
            }
        }

        log::debug!("mosaic: {} tiles", tiles.len());
        Ok((Self { tiles }, scene))
    }
}

impl Visualization for Mosaic {
    fn kind(&self) -> ModeKind {
        ModeKind::Mosaic
    }

    fn update(
        &mut self,
        scene: &mut SceneObjectSet,
        frame: &SpectrumFrame,
        _elapsed: f32,
    ) -> Result<(), ModeError> {
        if frame.is_empty() {
            return Err(SignalError::EmptyBand {
                start: 0,
                end: 0,
                len: 0,
            }
            .into());
        }

        for (index, &id) in self.tiles.iter().enumerate() {
            let freq = frame.wrapped(index).unwrap_or(0.0);
            let tile = scene.get_mut::<Tile>(id)?;
            tile.transform.scale = Vec3::new(1.0 + freq, 1.0 + freq, 1.0);
            tile.color = Hsl::new(freq, 0.8, 0.5);
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

    fn build(settings: &EngineSettings) -> Result<(Mosaic, SceneObjectSet), ModeError> {
        let mut rng = StdRng::seed_from_u64(1);
        let mut ctx = BuildContext {
            rng: &mut rng,
            viewport: Viewport::default(),
            settings,
        };
        Mosaic::build(&mut ctx)
    }

    #[test]
    fn test_grid_layout() {
        let (mosaic, scene) = build(&EngineSettings::default()).unwrap();
        assert_eq!(mosaic.tiles.len(), 900);
        assert_eq!(scene.camera.position.z, 300.0);

        let first = scene.get::<Tile>(mosaic.tiles[0]).unwrap();
        assert_eq!(first.transform.position, Vec3::new(-225.0, -225.0, 0.0));
        // j varies fastest
        let second = scene.get::<Tile>(mosaic.tiles[1]).unwrap();
        assert_eq!(second.transform.position, Vec3::new(-225.0, -210.0, 0.0));
    }

    #[test]
    fn test_scale_and_hue_follow_bins() {
        let (mut mosaic, mut scene) = build(&EngineSettings::default()).unwrap();
        let mut bins = vec![0u8; 256];
        bins[1] = 51; // 0.2
        let frame = SpectrumFrame::from_bins(bins);
        mosaic.update(&mut scene, &frame, 0.0).unwrap();

        // tile 257 wraps onto bin 1
        for idx in [1, 257] {
            let tile = scene.get::<Tile>(mosaic.tiles[idx]).unwrap();
            assert!((tile.transform.scale.x - 1.2).abs() < 1e-6);
            assert_eq!(tile.transform.scale.z, 1.0);
            assert!((tile.color.h - 0.2).abs() < 1e-6);
            assert_eq!(tile.color.s, 0.8);
        }
    }

    #[test]
    fn test_positions_never_change() {
        let (mut mosaic, mut scene) = build(&EngineSettings::default()).unwrap();
        let before: Vec<Vec3> = scene
            .iter_of::<Tile>()
            .map(|t| t.transform.position)
            .collect();
        mosaic
            .update(&mut scene, &SpectrumFrame::from_bins(vec![255; 256]), 1.0)
            .unwrap();
        let after: Vec<Vec3> = scene
            .iter_of::<Tile>()
            .map(|t| t.transform.position)
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_empty_grid_is_rejected() {
        let settings = EngineSettings {
            mosaic_grid: Some([0, 30]),
            ..EngineSettings::default()
        };
        assert!(matches!(build(&settings), Err(ModeError::InvalidLayout(_))));
    }

    #[test]
    fn test_huge_grid_is_rejected() {
        for grid in [[70_000, 70_000], [u32::MAX, u32::MAX], [1_000, 1_000]] {
            let settings = EngineSettings {
                mosaic_grid: Some(grid),
                ..EngineSettings::default()
            };
            assert!(matches!(build(&settings), Err(ModeError::InvalidLayout(_))));
        }
    }

    #[test]
    fn test_empty_frame_fails_the_tick() {
        let (mut mosaic, mut scene) = build(&EngineSettings::default()).unwrap();
        assert!(mosaic
            .update(&mut scene, &SpectrumFrame::default(), 0.0)
            .is_err());
    }
}

//! Scene arena owned by the active mode.
//!
//! A [`SceneObjectSet`] is a flat list of tagged [`SceneObject`]s. Modes keep
//! [`ObjectId`]s into it and go through the typed getters, so tearing a mode
//! down is just dropping its set.

use glam::{Quat, Vec2, Vec3};

use crate::color::{Hsl, Rgb};
use crate::error::ModeError;
use crate::geometry::Geometry;
use crate::modes::ModeKind;

/// Index of an object inside its [`SceneObjectSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(usize);

impl ObjectId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Position, Euler rotation (radians, XYZ order) and scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn rotation_quat(&self) -> Quat {
        Quat::from_rotation_x(self.rotation.x)
            * Quat::from_rotation_y(self.rotation.y)
            * Quat::from_rotation_z(self.rotation.z)
    }

    /// Local point to world space
    pub fn apply(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation_quat() * (local * self.scale)
    }

    /// Local direction to world space (ignores translation and scale)
    pub fn rotate(&self, dir: Vec3) -> Vec3 {
        self.rotation_quat() * dir
    }
}

/// Square tile facing the camera
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub transform: Transform,
    pub size: f32,
    pub color: Hsl,
}

/// Lit mesh (the warped sphere)
#[derive(Debug, Clone)]
pub struct Mesh {
    pub transform: Transform,
    pub geometry: Geometry,
    pub color: Rgb,
    pub wireframe: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    Ambient,
    /// `distance` is the range beyond which the light contributes nothing
    Point { distance: f32 },
    Spot {
        distance: f32,
        angle: f32,
        penumbra: f32,
        decay: f32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub position: Vec3,
    pub color: Rgb,
    pub intensity: f32,
}

/// Values fed to the full-screen shading function
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShaderUniforms {
    pub time: f32,
    pub audio_data: f32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShaderQuad {
    pub uniforms: ShaderUniforms,
}

/// Flat annulus in the XY plane
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    pub transform: Transform,
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub color: Hsl,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    pub speed: f32,
    pub size: f32,
    pub color: Hsl,
}

/// Large plane behind everything else
#[derive(Debug, Clone, PartialEq)]
pub struct Backdrop {
    pub transform: Transform,
    pub size: f32,
    pub color: Hsl,
}

/// Everything a mode can put in its scene
#[derive(Debug, Clone)]
pub enum SceneObject {
    Tile(Tile),
    Mesh(Mesh),
    Light(Light),
    ShaderQuad(ShaderQuad),
    Ring(Ring),
    Particle(Particle),
    Backdrop(Backdrop),
}

/// Typed access to one [`SceneObject`] variant
pub trait SceneMember: Sized {
    const KIND: &'static str;

    fn from_object(object: &SceneObject) -> Option<&Self>;
    fn from_object_mut(object: &mut SceneObject) -> Option<&mut Self>;
}

macro_rules! scene_member {
    ($ty:ident, $kind:literal) => {
        impl SceneMember for $ty {
            const KIND: &'static str = $kind;

            fn from_object(object: &SceneObject) -> Option<&Self> {
                match object {
                    SceneObject::$ty(inner) => Some(inner),
                    _ => None,
                }
            }

            fn from_object_mut(object: &mut SceneObject) -> Option<&mut Self> {
                match object {
                    SceneObject::$ty(inner) => Some(inner),
                    _ => None,
                }
            }
        }

        impl From<$ty> for SceneObject {
            fn from(inner: $ty) -> Self {
                SceneObject::$ty(inner)
            }
        }
    };
}

scene_member!(Tile, "tile");
scene_member!(Mesh, "mesh");
scene_member!(Light, "light");
scene_member!(ShaderQuad, "shader quad");
scene_member!(Ring, "ring");
scene_member!(Particle, "particle");
scene_member!(Backdrop, "backdrop");

/// Perspective camera looking down -Z
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Vertical field of view in degrees
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
}

/// A world point mapped onto the viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    /// Screen coordinates, origin at the viewport centre, +Y up
    pub screen: Vec2,
    /// Distance in front of the camera
    pub depth: f32,
    /// Pixels per world unit at that depth
    pub scale: f32,
}

impl Camera {
    pub fn perspective(fov: f32, aspect: f32, near: f32, far: f32, position: Vec3) -> Self {
        Self {
            fov,
            aspect,
            near,
            far,
            position,
        }
    }

    /// Projection update for a resized viewport
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.aspect = width / height;
        }
    }

    /// Project a world point, `None` when outside the near/far range
    pub fn project(&self, world: Vec3, viewport: Vec2) -> Option<Projected> {
        let rel = world - self.position;
        let depth = -rel.z;
        if depth < self.near || depth > self.far {
            return None;
        }
        let focal = 1.0 / (self.fov.to_radians() / 2.0).tan();
        let ndc = Vec2::new(focal / self.aspect * rel.x / depth, focal * rel.y / depth);
        Some(Projected {
            screen: ndc * viewport / 2.0,
            depth,
            scale: focal * viewport.y / 2.0 / depth,
        })
    }
}

/// All renderable entities of one mode instance
#[derive(Debug, Clone)]
pub struct SceneObjectSet {
    owner: ModeKind,
    objects: Vec<SceneObject>,
    pub camera: Camera,
    pub clear_color: Rgb,
}

impl SceneObjectSet {
    pub fn new(owner: ModeKind, camera: Camera) -> Self {
        Self {
            owner,
            objects: Vec::new(),
            camera,
            clear_color: Rgb::BLACK,
        }
    }

    pub fn owner(&self) -> ModeKind {
        self.owner
    }

    pub fn add(&mut self, object: impl Into<SceneObject>) -> ObjectId {
        self.objects.push(object.into());
        ObjectId(self.objects.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn get<T: SceneMember>(&self, id: ObjectId) -> Result<&T, ModeError> {
        self.objects
            .get(id.0)
            .and_then(T::from_object)
            .ok_or(ModeError::MissingObject {
                id: id.0,
                expected: T::KIND,
            })
    }

    pub fn get_mut<T: SceneMember>(&mut self, id: ObjectId) -> Result<&mut T, ModeError> {
        self.objects
            .get_mut(id.0)
            .and_then(T::from_object_mut)
            .ok_or(ModeError::MissingObject {
                id: id.0,
                expected: T::KIND,
            })
    }

    /// Every object of one variant, in insertion order
    pub fn iter_of<'a, T: SceneMember + 'a>(&'a self) -> impl Iterator<Item = &'a T> {
        self.objects.iter().filter_map(T::from_object)
    }

    pub fn lights(&self) -> impl Iterator<Item = &Light> {
        self.iter_of::<Light>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera::perspective(75.0, 1.0, 0.1, 1000.0, Vec3::new(0.0, 0.0, 100.0))
    }

    #[test]
    fn test_typed_access() {
        let mut set = SceneObjectSet::new(ModeKind::Mosaic, camera());
        let tile = set.add(Tile {
            transform: Transform::default(),
            size: 5.0,
            color: Hsl::new(0.0, 0.5, 0.5),
        });
        assert_eq!(set.get::<Tile>(tile).map(|t| t.size), Ok(5.0));
        assert_eq!(
            set.get::<Ring>(tile).err(),
            Some(ModeError::MissingObject {
                id: 0,
                expected: "ring"
            })
        );
        assert!(set.get::<Tile>(ObjectId(4)).is_err());
    }

    #[test]
    fn test_projection_centre_and_scale() {
        let cam = camera();
        let viewport = Vec2::new(800.0, 800.0);
        let centre = cam.project(Vec3::ZERO, viewport).unwrap();
        assert_eq!(centre.screen, Vec2::ZERO);
        assert!((centre.depth - 100.0).abs() < 1e-4);

        let right = cam.project(Vec3::new(10.0, 0.0, 0.0), viewport).unwrap();
        assert!((right.screen.x - 10.0 * centre.scale).abs() < 1e-3);
        assert!(cam.project(Vec3::new(0.0, 0.0, 150.0), viewport).is_none());
    }

    #[test]
    fn test_set_viewport_updates_aspect() {
        let mut cam = camera();
        cam.set_viewport(1600.0, 900.0);
        assert!((cam.aspect - 16.0 / 9.0).abs() < 1e-6);
        cam.set_viewport(0.0, 900.0);
        assert!((cam.aspect - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_transform_rotation() {
        let t = Transform {
            rotation: Vec3::new(0.0, 0.0, std::f32::consts::FRAC_PI_2),
            ..Transform::default()
        };
        let p = t.apply(Vec3::X);
        assert!((p - Vec3::Y).length() < 1e-5);
    }
}

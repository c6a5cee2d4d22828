//! Draws the engine's scene arena with nannou.
//!
//! Every object is projected through the scene camera into a flat list of
//! [`DrawItem`]s, sorted far to near and painted in that order.

pub mod lighting;
pub mod shader_quad;

use glam::{Vec2 as GVec2, Vec3};
use nannou::prelude::*;
use tonescape_engine::scene::{Light, Mesh, SceneObject, ShaderQuad};
use tonescape_engine::{Rgb, SceneObjectSet};

const NOTIFICATION_FRAMES: u32 = 180; // ~3 seconds at 60fps

/// Resolution settings for the window
pub struct Resolution {
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
}

impl Resolution {
    pub fn release() -> Self {
        Self {
            width: 1280,
            height: 720,
            fullscreen: true,
        }
    }

    /// Debug builds always run windowed
    pub fn current(windowed: bool) -> Self {
        if cfg!(debug_assertions) || windowed {
            Self {
                fullscreen: false,
                ..Self::release()
            }
        } else {
            Self::release()
        }
    }
}

/// One projected primitive, in screen space
#[derive(Debug, Clone, PartialEq)]
pub enum DrawItem {
    Rect {
        center: GVec2,
        size: f32,
        color: Rgb,
    },
    Line {
        start: GVec2,
        end: GVec2,
        color: Rgb,
    },
    Ring {
        center: GVec2,
        radius: f32,
        thickness: f32,
        color: Rgb,
    },
    Dot {
        center: GVec2,
        radius: f32,
        color: Rgb,
    },
}

/// Project every drawable object, far to near. The shader quad is not part
/// of this list; it covers the whole viewport and is drawn first.
pub fn project_scene(scene: &SceneObjectSet, viewport: GVec2) -> Vec<DrawItem> {
    let camera = &scene.camera;
    let lights: Vec<&Light> = scene.lights().collect();
    let mut items: Vec<(f32, DrawItem)> = Vec::new();

    for object in scene.objects() {
        match object {
            SceneObject::Tile(tile) => {
                if let Some(p) = camera.project(tile.transform.position, viewport) {
                    let size = tile.size * tile.transform.scale.x * p.scale;
                    items.push((
                        p.depth,
                        DrawItem::Rect {
                            center: p.screen,
                            size,
                            color: tile.color.to_rgb(),
                        },
                    ));
                }
            }
            SceneObject::Backdrop(backdrop) => {
                if let Some(p) = camera.project(backdrop.transform.position, viewport) {
                    items.push((
                        p.depth,
                        DrawItem::Rect {
                            center: p.screen,
                            size: backdrop.size * p.scale,
                            color: backdrop.color.to_rgb(),
                        },
                    ));
                }
            }
            SceneObject::Mesh(mesh) => {
                let geometry = &mesh.geometry;
                for &[a, b] in &geometry.edges {
                    let (a, b) = (a as usize, b as usize);
                    let (Some(&pa), Some(&pb)) = (geometry.positions.get(a), geometry.positions.get(b))
                    else {
                        continue;
                    };
                    let wa = mesh.transform.apply(pa);
                    let wb = mesh.transform.apply(pb);
                    let (Some(sa), Some(sb)) =
                        (camera.project(wa, viewport), camera.project(wb, viewport))
                    else {
                        continue;
                    };
                    let normal = edge_normal(mesh, a, b);
                    let color = lighting::illuminate(
                        mesh.color,
                        (wa + wb) / 2.0,
                        normal,
                        lights.iter().copied(),
                    );
                    items.push((
                        (sa.depth + sb.depth) / 2.0,
                        DrawItem::Line {
                            start: sa.screen,
                            end: sb.screen,
                            color,
                        },
                    ));
                }
            }
            SceneObject::Ring(ring) => {
                if let Some(p) = camera.project(ring.transform.position, viewport) {
                    let scale = ring.transform.scale.x * p.scale;
                    items.push((
                        p.depth,
                        DrawItem::Ring {
                            center: p.screen,
                            radius: (ring.inner_radius + ring.outer_radius) / 2.0 * scale,
                            thickness: ((ring.outer_radius - ring.inner_radius) * scale).max(1.0),
                            color: ring.color.to_rgb(),
                        },
                    ));
                }
            }
            SceneObject::Particle(particle) => {
                if let Some(p) = camera.project(particle.position, viewport) {
                    items.push((
                        p.depth,
                        DrawItem::Dot {
                            center: p.screen,
                            radius: (particle.size * p.scale).max(0.5),
                            color: particle.color.to_rgb(),
                        },
                    ));
                }
            }
            SceneObject::Light(_) | SceneObject::ShaderQuad(_) => {}
        }
    }

    items.sort_by(|a, b| b.0.total_cmp(&a.0));
    items.into_iter().map(|(_, item)| item).collect()
}

fn edge_normal(mesh: &Mesh, a: usize, b: usize) -> Vec3 {
    let normals = &mesh.geometry.normals;
    let n = match (normals.get(a), normals.get(b)) {
        (Some(&na), Some(&nb)) => na + nb,
        _ => Vec3::Z,
    };
    mesh.transform.rotate(n).normalize_or_zero()
}

fn to_point(v: GVec2) -> Point2 {
    pt2(v.x, v.y)
}

/// Draws the live scene plus notifications
pub struct SceneRenderer {
    notification_text: Option<String>,
    notification_frames: u32,
}

impl SceneRenderer {
    pub fn new() -> Self {
        Self {
            notification_text: None,
            notification_frames: 0,
        }
    }

    /// Shows a notification message for 3 seconds
    pub fn show_notification(&mut self, text: String) {
        log::info!("{}", text);
        self.notification_text = Some(text);
        self.notification_frames = NOTIFICATION_FRAMES;
    }

    pub fn update(&mut self) {
        if self.notification_frames > 0 {
            self.notification_frames -= 1;
            if self.notification_frames == 0 {
                self.notification_text = None;
            }
        }
    }

    pub fn draw_scene(&self, draw: &Draw, bounds: Rect, scene: Option<&SceneObjectSet>) {
        let Some(scene) = scene else {
            draw.background().color(BLACK);
            return;
        };
        draw.background().color(rgb(scene.clear_color.r, scene.clear_color.g, scene.clear_color.b));

        for quad in scene.iter_of::<ShaderQuad>() {
            shader_quad::draw_shader_quad(draw, bounds, quad.uniforms);
        }

        let viewport = GVec2::new(bounds.w(), bounds.h());
        for item in project_scene(scene, viewport) {
            match item {
                DrawItem::Rect { center, size, color } => {
                    draw.rect()
                        .xy(to_point(center))
                        .w_h(size, size)
                        .color(rgb(color.r, color.g, color.b));
                }
                DrawItem::Line { start, end, color } => {
                    draw.line()
                        .start(to_point(start))
                        .end(to_point(end))
                        .weight(1.0)
                        .color(rgb(color.r, color.g, color.b));
                }
                DrawItem::Ring {
                    center,
                    radius,
                    thickness,
                    color,
                } => {
                    draw.ellipse()
                        .xy(to_point(center))
                        .radius(radius)
                        .no_fill()
                        .stroke(rgb(color.r, color.g, color.b))
                        .stroke_weight(thickness);
                }
                DrawItem::Dot {
                    center,
                    radius,
                    color,
                } => {
                    draw.ellipse()
                        .xy(to_point(center))
                        .radius(radius)
                        .color(rgb(color.r, color.g, color.b));
                }
            }
        }
    }

    pub fn draw_notification(&self, draw: &Draw, bounds: Rect) {
        if let Some(ref text) = self.notification_text {
            let alpha = (self.notification_frames as f32 / 60.0).min(1.0);
            draw.text(text)
                .x_y(0.0, bounds.top() - 30.0)
                .w_h(bounds.w() - 40.0, 40.0)
                .color(rgba(1.0, 1.0, 1.0, alpha))
                .font_size(24);
        }
    }

    /// Track status line at the bottom of the window
    pub fn draw_prompt(&self, draw: &Draw, bounds: Rect, prompt: &str) {
        draw.text(prompt)
            .x_y(0.0, bounds.bottom() + 40.0)
            .w_h(bounds.w() - 40.0, 40.0)
            .color(rgba(1.0, 1.0, 1.0, 0.6))
            .font_size(20);
    }
}

/// Status line for the loaded track, if any
pub fn track_status(track: Option<&str>, paused: bool) -> String {
    match track {
        None => "Drop an MP3 file on the window".to_string(),
        Some(name) if paused => format!("Now Playing: {} (click to play)", name),
        Some(name) => format!("Now Playing: {}", name),
    }
}

impl Default for SceneRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonescape_engine::scene::{Camera, Particle, Tile, Transform};
    use tonescape_engine::{Hsl, ModeKind};

    fn tunnel_scene() -> SceneObjectSet {
        SceneObjectSet::new(
            ModeKind::Tunnel,
            Camera::perspective(75.0, 1.0, 0.1, 1000.0, Vec3::new(0.0, 0.0, 100.0)),
        )
    }

    fn dot(z: f32) -> Particle {
        Particle {
            position: Vec3::new(0.0, 0.0, z),
            speed: 1.0,
            size: 1.0,
            color: Hsl::new(z / 100.0, 0.5, 0.5),
        }
    }

    #[test]
    fn test_track_status_names_the_track() {
        assert_eq!(track_status(None, true), "Drop an MP3 file on the window");
        assert_eq!(
            track_status(Some("intro.mp3"), true),
            "Now Playing: intro.mp3 (click to play)"
        );
        assert_eq!(track_status(Some("intro.mp3"), false), "Now Playing: intro.mp3");
    }

    #[test]
    fn test_far_objects_paint_first() {
        let mut scene = tunnel_scene();
        scene.add(dot(50.0));
        scene.add(dot(-200.0));
        scene.add(dot(0.0));

        let items = project_scene(&scene, GVec2::new(800.0, 800.0));
        let radii: Vec<f32> = items
            .iter()
            .map(|item| match item {
                DrawItem::Dot { radius, .. } => *radius,
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(radii.len(), 3);
        assert!(radii[0] < radii[1] && radii[1] < radii[2]);
    }

    #[test]
    fn test_objects_behind_camera_are_skipped() {
        let mut scene = tunnel_scene();
        scene.add(dot(150.0));
        assert!(project_scene(&scene, GVec2::new(800.0, 800.0)).is_empty());
    }

    #[test]
    fn test_tile_size_follows_scale() {
        let mut scene = tunnel_scene();
        let mut transform = Transform::default();
        transform.scale = Vec3::new(2.0, 2.0, 1.0);
        scene.add(Tile {
            transform,
            size: 5.0,
            color: Hsl::new(0.0, 0.5, 0.5),
        });
        let plain = {
            let mut s = tunnel_scene();
            s.add(Tile {
                transform: Transform::default(),
                size: 5.0,
                color: Hsl::new(0.0, 0.5, 0.5),
            });
            project_scene(&s, GVec2::new(800.0, 800.0))
        };
        let scaled = project_scene(&scene, GVec2::new(800.0, 800.0));
        match (&plain[0], &scaled[0]) {
            (DrawItem::Rect { size: a, .. }, DrawItem::Rect { size: b, .. }) => {
                assert!((b - 2.0 * a).abs() < 1e-4)
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}

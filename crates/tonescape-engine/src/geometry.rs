//! Sphere mesh geometry.
//!
//! Builds a subdivided icosahedron with shared vertices and keeps the
//! original unit directions next to the live positions so that a deformer can
//! rewrite positions from scratch every frame.

use glam::Vec3;
use std::collections::HashMap;

const ICOSAHEDRON_FACES: [[usize; 3]; 20] = [
    [0, 11, 5],
    [0, 5, 1],
    [0, 1, 7],
    [0, 7, 10],
    [0, 10, 11],
    [1, 5, 9],
    [5, 11, 4],
    [11, 10, 2],
    [10, 7, 6],
    [7, 1, 8],
    [3, 9, 4],
    [3, 4, 2],
    [3, 2, 6],
    [3, 6, 8],
    [3, 8, 9],
    [4, 9, 5],
    [2, 4, 11],
    [6, 2, 10],
    [8, 6, 7],
    [9, 8, 1],
];

/// Indexed triangle mesh on a sphere
#[derive(Debug, Clone)]
pub struct Geometry {
    /// Undeformed unit directions, one per vertex
    pub base: Vec<Vec3>,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub faces: Vec<[u32; 3]>,
    pub face_normals: Vec<Vec3>,
    /// Unique undirected edges, for wireframe drawing
    pub edges: Vec<[u32; 2]>,
    pub radius: f32,
}

impl Geometry {
    /// Icosahedron of `radius` with each face split into `(detail + 1)^2`
    /// triangles, vertices projected onto the sphere
    pub fn icosahedron(radius: f32, detail: u32) -> Self {
        let t = (1.0 + 5f32.sqrt()) / 2.0;
        let corners = [
            Vec3::new(-1.0, t, 0.0),
            Vec3::new(1.0, t, 0.0),
            Vec3::new(-1.0, -t, 0.0),
            Vec3::new(1.0, -t, 0.0),
            Vec3::new(0.0, -1.0, t),
            Vec3::new(0.0, 1.0, t),
            Vec3::new(0.0, -1.0, -t),
            Vec3::new(0.0, 1.0, -t),
            Vec3::new(t, 0.0, -1.0),
            Vec3::new(t, 0.0, 1.0),
            Vec3::new(-t, 0.0, -1.0),
            Vec3::new(-t, 0.0, 1.0),
        ];

        let mut builder = SphereBuilder::default();
        let cols = detail as usize + 1;

        for face in ICOSAHEDRON_FACES {
            let (a, b, c) = (corners[face[0]], corners[face[1]], corners[face[2]]);

            // Grid of points across the face, row i has cols - i + 1 points
            let mut grid: Vec<Vec<u32>> = Vec::with_capacity(cols + 1);
            for i in 0..=cols {
                let ai = a.lerp(c, i as f32 / cols as f32);
                let bi = b.lerp(c, i as f32 / cols as f32);
                let rows = cols - i;
                let row = (0..=rows)
                    .map(|j| {
                        let p = if rows == 0 {
                            ai
                        } else {
                            ai.lerp(bi, j as f32 / rows as f32)
                        };
                        builder.vertex(p)
                    })
                    .collect();
                grid.push(row);
            }

            for i in 0..cols {
                for j in 0..(2 * (cols - i) - 1) {
                    let k = j / 2;
                    if j % 2 == 0 {
                        builder.faces.push([grid[i][k + 1], grid[i + 1][k], grid[i][k]]);
                    } else {
                        builder
                            .faces
                            .push([grid[i][k + 1], grid[i + 1][k + 1], grid[i + 1][k]]);
                    }
                }
            }
        }

        let base = builder.directions;
        let positions = base.iter().map(|d| *d * radius).collect();
        let edges = collect_edges(&builder.faces);

        let mut geometry = Self {
            normals: vec![Vec3::ZERO; base.len()],
            face_normals: vec![Vec3::ZERO; builder.faces.len()],
            base,
            positions,
            faces: builder.faces,
            edges,
            radius,
        };
        geometry.compute_face_normals();
        geometry.compute_vertex_normals();
        geometry
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn compute_face_normals(&mut self) {
        for (normal, face) in self.face_normals.iter_mut().zip(&self.faces) {
            let [a, b, c] = face.map(|i| self.positions[i as usize]);
            *normal = (b - a).cross(c - a).normalize_or_zero();
        }
    }

    /// Area-weighted average of the incident face normals
    pub fn compute_vertex_normals(&mut self) {
        self.normals.iter_mut().for_each(|n| *n = Vec3::ZERO);
        for face in &self.faces {
            let [a, b, c] = face.map(|i| self.positions[i as usize]);
            let weighted = (b - a).cross(c - a);
            for &i in face {
                self.normals[i as usize] += weighted;
            }
        }
        self.normals
            .iter_mut()
            .for_each(|n| *n = n.normalize_or_zero());
    }
}

#[derive(Default)]
struct SphereBuilder {
    directions: Vec<Vec3>,
    faces: Vec<[u32; 3]>,
    lookup: HashMap<[i32; 3], u32>,
}

impl SphereBuilder {
    /// Index of the projected point, sharing vertices along face seams
    fn vertex(&mut self, p: Vec3) -> u32 {
        let dir = p.normalize();
        let key = [
            (dir.x * 1e4).round() as i32,
            (dir.y * 1e4).round() as i32,
            (dir.z * 1e4).round() as i32,
        ];
        if let Some(&idx) = self.lookup.get(&key) {
            return idx;
        }
        let idx = self.directions.len() as u32;
        self.directions.push(dir);
        self.lookup.insert(key, idx);
        idx
    }
}

fn collect_edges(faces: &[[u32; 3]]) -> Vec<[u32; 2]> {
    let mut seen = HashMap::new();
    let mut edges = Vec::new();
    for face in faces {
        for (a, b) in [(face[0], face[1]), (face[1], face[2]), (face[2], face[0])] {
            let key = (a.min(b), a.max(b));
            if seen.insert(key, ()).is_none() {
                edges.push([key.0, key.1]);
            }
        }
    }
    edges
}

//! Mesh generators for the plane, cube, sphere and pyramid used by the captures.

use std::f32::consts::PI;

use anyhow::{anyhow, ensure, Result};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Precision used by the captures when none is given.
pub const DEFAULT_SPHERE_PRECISION: u32 = 25;

/// Largest sphere precision whose vertex count still fits a `u16` index.
pub const MAX_SPHERE_PRECISION: u32 = 255;

/// Triangle mesh with separate position and normal streams.
///
/// Both streams hold three floats per vertex; `indices` lists triangles.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Mesh {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub indices: Vec<u16>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Checks the stream lengths and that every index addresses a vertex.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.positions.len() % 3 == 0,
            "position stream length {} is not a multiple of 3",
            self.positions.len()
        );
        ensure!(
            self.normals.len() == self.positions.len(),
            "normal stream has {} floats, positions have {}",
            self.normals.len(),
            self.positions.len()
        );
        ensure!(
            self.indices.len() % 3 == 0,
            "index count {} does not describe whole triangles",
            self.indices.len()
        );
        let vertex_count = self.vertex_count();
        if let Some(index) = self.indices.iter().find(|&&i| usize::from(i) >= vertex_count) {
            return Err(anyhow!(
                "index {index} out of range for {vertex_count} vertices"
            ));
        }
        Ok(())
    }

    /// Per-vertex colour stream painting every vertex with `color`.
    pub fn solid_colors(&self, color: Vec3) -> Vec<f32> {
        color.to_array().repeat(self.vertex_count())
    }
}

//  v1------v0
//  |       |
//  |   x   |
//  |       |
//  v2------v3

/// 2x2 quad in the z = 0 plane facing +Z.
pub fn plane() -> Mesh {
    #[rustfmt::skip]
    let positions = vec![
         1.0,  1.0, 0.0,
        -1.0,  1.0, 0.0,
        -1.0, -1.0, 0.0,
         1.0, -1.0, 0.0,
    ];
    Mesh {
        normals: [0.0, 0.0, 1.0].repeat(4),
        positions,
        indices: vec![0, 1, 2, 0, 2, 3],
    }
}

//    v6----- v5
//   /|      /|
//  v1------v0|
//  | |   x | |
//  | |v7---|-|v4
//  |/      |/
//  v2------v3

/// 2x2x2 cube centred on the origin. Each face owns four vertices so it can
/// carry a flat normal.
pub fn cube() -> Mesh {
    #[rustfmt::skip]
    let positions = vec![
         1.0, 1.0, 1.0,  -1.0, 1.0, 1.0,  -1.0,-1.0, 1.0,   1.0,-1.0, 1.0, // front
         1.0, 1.0, 1.0,   1.0,-1.0, 1.0,   1.0,-1.0,-1.0,   1.0, 1.0,-1.0, // right
         1.0, 1.0, 1.0,   1.0, 1.0,-1.0,  -1.0, 1.0,-1.0,  -1.0, 1.0, 1.0, // up
        -1.0, 1.0, 1.0,  -1.0, 1.0,-1.0,  -1.0,-1.0,-1.0,  -1.0,-1.0, 1.0, // left
        -1.0,-1.0,-1.0,   1.0,-1.0,-1.0,   1.0,-1.0, 1.0,  -1.0,-1.0, 1.0, // down
         1.0,-1.0,-1.0,  -1.0,-1.0,-1.0,  -1.0, 1.0,-1.0,   1.0, 1.0,-1.0, // back
    ];
    let face_normals = [Vec3::Z, Vec3::X, Vec3::Y, Vec3::NEG_X, Vec3::NEG_Y, Vec3::NEG_Z];
    let normals = face_normals
        .iter()
        .flat_map(|normal| normal.to_array().repeat(4))
        .collect();
    let indices = (0..6u16)
        .flat_map(|face| [0, 1, 2, 0, 2, 3].map(|corner| face * 4 + corner))
        .collect();
    Mesh {
        positions,
        normals,
        indices,
    }
}

/// Unit sphere built from `precision` parallels and meridians.
///
/// Produces `(precision + 1)^2` vertices; the poles and the seam are
/// duplicated so every grid cell has its own four corners.
pub fn sphere(precision: u32) -> Result<Mesh> {
    ensure!(
        (1..=MAX_SPHERE_PRECISION).contains(&precision),
        "sphere precision must be between 1 and {MAX_SPHERE_PRECISION}, got {precision}"
    );
    let p = precision;
    let row = p + 1;
    let vertex_count = (row * row) as usize;

    let mut positions = Vec::with_capacity(vertex_count * 3);
    for par in 0..=p {
        let lat = PI * (par as f32 / p as f32);
        let (lat_sin, lat_cos) = lat.sin_cos();
        for mer in 0..=p {
            let lon = 2.0 * PI * (mer as f32 / p as f32);
            let (lon_sin, lon_cos) = lon.sin_cos();
            positions.extend_from_slice(&[lon_cos * lat_sin, lat_cos, lon_sin * lat_sin]);
        }
    }

    let mut indices = Vec::with_capacity((6 * p * p) as usize);
    for par in 0..p {
        for mer in 0..p {
            let p1 = (par * row + mer) as u16;
            let p2 = p1 + row as u16;
            indices.extend_from_slice(&[p1, p2, p1 + 1, p1 + 1, p2, p2 + 1]);
        }
    }

    Ok(Mesh {
        normals: positions.clone(),
        positions,
        indices,
    })
}

/// Pyramid with a 1x1 base and equilateral sides, apex at y = 0.866.
pub fn pyramid() -> Mesh {
    #[rustfmt::skip]
    let positions = vec![
        -0.5, 0.0,  0.5,   0.5, 0.0,  0.5,   0.0, 0.866, 0.0, // front
         0.5, 0.0,  0.5,   0.5, 0.0, -0.5,   0.0, 0.866, 0.0, // right
         0.5, 0.0, -0.5,  -0.5, 0.0, -0.5,   0.0, 0.866, 0.0, // back
        -0.5, 0.0, -0.5,  -0.5, 0.0,  0.5,   0.0, 0.866, 0.0, // left
        -0.5, 0.0,  0.5,  -0.5, 0.0, -0.5,   0.5, 0.0,   0.5, // base
        -0.5, 0.0, -0.5,   0.5, 0.0, -0.5,   0.5, 0.0,   0.5,
    ];
    #[rustfmt::skip]
    let normals = vec![
         0.0,   -0.5,  0.866,   0.0,   -0.5,  0.866,   0.0,   -0.5,  0.866,
         0.866, -0.5,  0.0,     0.866, -0.5,  0.0,     0.866, -0.5,  0.0,
         0.0,   -0.5, -0.866,   0.0,   -0.5, -0.866,   0.0,   -0.5, -0.866,
        -0.866, -0.5,  0.0,    -0.866, -0.5,  0.0,    -0.866, -0.5,  0.0,
         0.0,    1.0,  0.0,     0.0,    1.0,  0.0,     0.0,    1.0,  0.0,
         0.0,    1.0,  0.0,     0.0,    1.0,  0.0,     0.0,    1.0,  0.0,
    ];
    Mesh {
        positions,
        normals,
        indices: (0..18).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_is_a_single_quad() {
        let mesh = plane();
        mesh.validate().unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        for normal in mesh.normals.chunks_exact(3) {
            assert_eq!(normal, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn cube_has_flat_faces() {
        let mesh = cube();
        mesh.validate().unwrap();
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.indices.len(), 36);
        for face in mesh.normals.chunks_exact(12) {
            let first = &face[0..3];
            assert!(face.chunks_exact(3).all(|normal| normal == first));
        }
        assert_eq!(&mesh.indices[30..], &[20, 21, 22, 20, 22, 23]);
    }

    #[test]
    fn cube_normals_point_away_from_face_vertices() {
        let mesh = cube();
        for (position, normal) in mesh
            .positions
            .chunks_exact(3)
            .zip(mesh.normals.chunks_exact(3))
        {
            let position = Vec3::from_slice(position);
            let normal = Vec3::from_slice(normal);
            assert_eq!(position.dot(normal), 1.0);
        }
    }

    #[test]
    fn sphere_counts_follow_precision() {
        for precision in [1, 2, 25, 50] {
            let mesh = sphere(precision).unwrap();
            mesh.validate().unwrap();
            let p = precision as usize;
            assert_eq!(mesh.vertex_count(), (p + 1) * (p + 1));
            assert_eq!(mesh.indices.len(), 6 * p * p);
        }
    }

    #[test]
    fn sphere_vertices_lie_on_unit_sphere() {
        let mesh = sphere(DEFAULT_SPHERE_PRECISION).unwrap();
        assert_eq!(mesh.positions, mesh.normals);
        for position in mesh.positions.chunks_exact(3) {
            let length = Vec3::from_slice(position).length();
            assert!((length - 1.0).abs() < 1e-5, "length {length}");
        }
    }

    #[test]
    fn sphere_duplicates_poles() {
        let mesh = sphere(4).unwrap();
        for vertex in mesh.positions.chunks_exact(3).take(5) {
            assert!(Vec3::from_slice(vertex).abs_diff_eq(Vec3::Y, 1e-6));
        }
    }

    #[test]
    fn sphere_rejects_out_of_range_precision() {
        assert!(sphere(0).is_err());
        assert!(sphere(256).is_err());
        let largest = sphere(MAX_SPHERE_PRECISION).unwrap();
        assert_eq!(largest.indices.iter().copied().max(), Some(u16::MAX));
    }

    #[test]
    fn pyramid_has_six_triangles() {
        let mesh = pyramid();
        mesh.validate().unwrap();
        assert_eq!(mesh.vertex_count(), 18);
        assert_eq!(mesh.triangle_count(), 6);
    }

    #[test]
    fn validate_reports_out_of_range_index() {
        let mut mesh = plane();
        mesh.indices[4] = 9;
        let err = mesh.validate().unwrap_err();
        assert!(err.to_string().contains("index 9 out of range"));
    }

    #[test]
    fn solid_colors_cover_every_vertex() {
        let mesh = cube();
        let colors = mesh.solid_colors(Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(colors.len(), mesh.positions.len());
        assert_eq!(&colors[69..72], &[1.0, 0.0, 0.0]);
    }
}

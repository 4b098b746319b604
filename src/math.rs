//! Matrix and vector helpers shared by the captures.
//!
//! Every matrix is a column-major `glam::Mat4`, so the raw array produced by
//! [`Mat4::to_cols_array`] can be pushed to a uniform without transposing.
//! Composition follows the usual convention: `a * b` applies `b` first.

use glam::{Mat4, Vec3, Vec4};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures of the point transform.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum MathError {
    #[error("point maps to infinity (homogeneous w = {w})")]
    PointAtInfinity { w: f32 },
}

/// Symmetric perspective projection.
///
/// `fov` is measured in degrees and is used as the half-angle of the vertical
/// field of view (`f = 1 / tan(fov)`). `near == far` or `near <= 0` produce a
/// degenerate matrix; callers are expected to pass `0 < near < far`.
pub fn perspective(fov: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    let f = 1.0 / fov.to_radians().tan();
    let nf = 1.0 / (near - far);
    Mat4::from_cols_array(&[
        f / aspect,
        0.0,
        0.0,
        0.0,
        0.0,
        f,
        0.0,
        0.0,
        0.0,
        0.0,
        (far + near) * nf,
        -1.0,
        0.0,
        0.0,
        2.0 * near * far * nf,
        0.0,
    ])
}

/// Perspective settings with the defaults every capture starts from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Perspective {
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Perspective {
    fn default() -> Self {
        Self {
            fov: 85.0,
            aspect: 1.0,
            near: 0.01,
            far: 100.0,
        }
    }
}

impl Perspective {
    pub fn matrix(&self) -> Mat4 {
        perspective(self.fov, self.aspect, self.near, self.far)
    }
}

/// Orthographic box projection mapping the given extents onto clip space.
pub fn orthogonal(top: f32, bottom: f32, left: f32, right: f32, near: f32, far: f32) -> Mat4 {
    let rw = 1.0 / (right - left);
    let rh = 1.0 / (top - bottom);
    let rd = 1.0 / (far - near);
    Mat4::from_cols_array(&[
        2.0 * rw,
        0.0,
        0.0,
        0.0,
        0.0,
        2.0 * rh,
        0.0,
        0.0,
        0.0,
        0.0,
        -2.0 * rd,
        0.0,
        -(right + left) * rw,
        -(top + bottom) * rh,
        -(far + near) * rd,
        1.0,
    ])
}

/// View matrix looking from `eye` towards `target`.
///
/// The result contains NaN when `eye == target` or when `up` is parallel to
/// the viewing direction.
pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
    let f = (target - eye).normalize();
    let s = f.cross(up).normalize();
    let u = s.cross(f);
    let basis = Mat4::from_cols(
        Vec4::new(s.x, u.x, -f.x, 0.0),
        Vec4::new(s.y, u.y, -f.y, 0.0),
        Vec4::new(s.z, u.z, -f.z, 0.0),
        Vec4::W,
    );
    basis * Mat4::from_translation(-eye)
}

pub fn transpose(matrix: Mat4) -> Mat4 {
    matrix.transpose()
}

/// Rotation of `angle` radians around `axis` (normalized internally).
/// Returns `None` for a zero-length axis.
pub fn axis_angle_rotation(axis: Vec3, angle: f32) -> Option<Mat4> {
    let len = axis.length();
    if len == 0.0 || !len.is_finite() {
        return None;
    }
    let Vec3 { x, y, z } = axis / len;
    let (s, c) = angle.sin_cos();
    let t = 1.0 - c;
    Some(Mat4::from_cols_array(&[
        x * x * t + c,
        y * x * t + z * s,
        z * x * t - y * s,
        0.0,
        x * y * t - z * s,
        y * y * t + c,
        z * y * t + x * s,
        0.0,
        x * z * t + y * s,
        y * z * t - x * s,
        z * z * t + c,
        0.0,
        0.0,
        0.0,
        0.0,
        1.0,
    ]))
}

/// Applies `matrix` to `point` (w = 1) and performs the perspective divide.
pub fn transform_point(point: Vec3, matrix: &Mat4) -> Result<Vec3, MathError> {
    let v = *matrix * point.extend(1.0);
    if v.w == 0.0 || v.w.is_nan() {
        return Err(MathError::PointAtInfinity { w: v.w });
    }
    Ok(v.truncate() / v.w)
}

/// Inverse transpose of a model matrix, used to carry normals into world space.
pub fn normal_matrix(model: &Mat4) -> Mat4 {
    model.inverse().transpose()
}

/// Rotation by Euler angles in degrees, applied X first, then Y, then Z.
pub fn rotation_degrees(x: f32, y: f32, z: f32) -> Mat4 {
    Mat4::from_rotation_z(z.to_radians())
        * Mat4::from_rotation_y(y.to_radians())
        * Mat4::from_rotation_x(x.to_radians())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    #[test]
    fn perspective_maps_near_and_far_planes_to_clip_bounds() {
        let projection = perspective(30.0, 1.5, 1.0, 100.0);
        let near = transform_point(Vec3::new(0.0, 0.0, -1.0), &projection).unwrap();
        let far = transform_point(Vec3::new(0.0, 0.0, -100.0), &projection).unwrap();
        assert!((near.z + 1.0).abs() < EPS, "near z = {}", near.z);
        assert!((far.z - 1.0).abs() < EPS, "far z = {}", far.z);
    }

    #[test]
    fn perspective_defaults_match_manual_call() {
        let defaults = Perspective::default();
        assert_eq!(defaults.matrix(), perspective(85.0, 1.0, 0.01, 100.0));
    }

    #[test]
    fn perspective_uses_fov_as_half_angle() {
        let projection = perspective(45.0, 2.0, 1.0, 10.0);
        assert!((projection.y_axis.y - 1.0).abs() < EPS);
        assert!((projection.x_axis.x - 0.5).abs() < EPS);
    }

    #[test]
    fn orthogonal_maps_box_corners_to_unit_cube() {
        let projection = orthogonal(2.0, -2.0, -4.0, 4.0, 0.0, 100.0);
        let corner = transform_point(Vec3::new(4.0, 2.0, 0.0), &projection).unwrap();
        assert!(corner.abs_diff_eq(Vec3::new(1.0, 1.0, -1.0), EPS));
        let opposite = transform_point(Vec3::new(-4.0, -2.0, 100.0), &projection).unwrap();
        assert!(opposite.abs_diff_eq(Vec3::new(-1.0, -1.0, -3.0), EPS));
    }

    #[test]
    fn look_at_moves_target_onto_negative_z() {
        let view = look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        let target = transform_point(Vec3::ZERO, &view).unwrap();
        assert!(target.abs_diff_eq(Vec3::new(0.0, 0.0, -5.0), EPS));
    }

    #[test]
    fn look_at_matches_glam_right_handed_view() {
        let eye = Vec3::new(3.0, 2.0, 4.0);
        let target = Vec3::new(-1.0, 0.5, 0.0);
        let view = look_at(eye, target, Vec3::Y);
        assert!(view.abs_diff_eq(Mat4::look_at_rh(eye, target, Vec3::Y), EPS));
    }

    #[test]
    fn look_at_with_coincident_points_is_nan() {
        let view = look_at(Vec3::ONE, Vec3::ONE, Vec3::Y);
        assert!(view.is_nan());
    }

    #[test]
    fn transpose_twice_is_identity() {
        let matrix = Mat4::from_cols_array(&[
            1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0,
        ]);
        assert_eq!(transpose(transpose(matrix)), matrix);
        assert_eq!(transpose(matrix).x_axis, Vec4::new(1.0, 5.0, 9.0, 13.0));
    }

    #[test]
    fn axis_angle_rotation_matches_axis_rotations() {
        let rotation = axis_angle_rotation(Vec3::new(0.0, 2.0, 0.0), 0.7).unwrap();
        assert!(rotation.abs_diff_eq(Mat4::from_rotation_y(0.7), EPS));
        let rotation = axis_angle_rotation(Vec3::X, -1.2).unwrap();
        assert!(rotation.abs_diff_eq(Mat4::from_rotation_x(-1.2), EPS));
    }

    #[test]
    fn axis_angle_rotation_rejects_zero_axis() {
        assert!(axis_angle_rotation(Vec3::ZERO, 1.0).is_none());
    }

    #[test]
    fn transform_point_divides_by_w() {
        let matrix = Mat4::from_cols(Vec4::X, Vec4::Y, Vec4::Z, Vec4::new(0.0, 0.0, 0.0, 2.0));
        let point = transform_point(Vec3::new(2.0, 4.0, 6.0), &matrix).unwrap();
        assert_eq!(point, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn transform_point_reports_point_at_infinity() {
        let projection = perspective(30.0, 1.0, 1.0, 100.0);
        let err = transform_point(Vec3::ZERO, &projection).unwrap_err();
        assert_eq!(err, MathError::PointAtInfinity { w: 0.0 });
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let model = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let normals = normal_matrix(&model);
        assert!(normals.abs_diff_eq(Mat4::from_scale(Vec3::new(0.5, 1.0, 1.0)), EPS));
    }

    #[test]
    fn rotation_degrees_applies_x_before_z() {
        let rotation = rotation_degrees(90.0, 0.0, 90.0);
        let rotated = rotation.transform_vector3(Vec3::Y);
        assert!(rotated.abs_diff_eq(Vec3::Z, EPS));
    }
}

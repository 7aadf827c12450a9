//! Conversions between the external compositor's coordinate conventions
//! and engine space.
//!
//! The compositor supplies poses in a left-handed, Y-up, meter-scaled
//! space. Engine space is X-forward, Z-up and measured in centimeters.
//! Mapping between the two is a fixed axis permutation plus a scale on
//! translation:
//!
//! | Engine | Compositor |
//! |--------|------------|
//! | X      | Z * 100    |
//! | Y      | X * 100    |
//! | Z      | Y * 100    |
//!
//! All functions here are total over finite floats; non-finite inputs
//! pass through unchanged.

use glam::{Mat4, Quat, Vec3};

/// Scale factor from compositor meters to engine units (centimeters).
pub const METERS_TO_UNITS: f32 = 100.0;

/// Axis permutation applied to the 3x3 block of pose matrices.
const AXIS_PERM: [usize; 3] = [2, 0, 1];

/// Convert a compositor-space position to an engine-space position.
#[inline]
pub fn position_from_external(v: Vec3) -> Vec3 {
    Vec3::new(v.z, v.x, v.y) * METERS_TO_UNITS
}

/// Convert an engine-space position back to compositor space.
///
/// Algebraic inverse of [`position_from_external`].
#[inline]
pub fn position_to_external(v: Vec3) -> Vec3 {
    Vec3::new(v.y, v.z, v.x) / METERS_TO_UNITS
}

/// Convert a compositor-space quaternion to an engine-space quaternion.
///
/// The component swizzle matches the position permutation so the
/// combined pose stays a right-handed rotation in engine space.
#[inline]
pub fn rotation_from_external(q: Quat) -> Quat {
    Quat::from_xyzw(q.z, q.x, q.y, q.w)
}

/// Convert an engine-space quaternion back to compositor space.
#[inline]
pub fn rotation_to_external(q: Quat) -> Quat {
    Quat::from_xyzw(q.y, q.z, q.x, q.w)
}

/// Convert a compositor-space 4x4 transform to engine space.
///
/// The 3x3 block is remapped by the axis permutation on both rows and
/// columns; only the translation column is scaled to engine units. The
/// projective row passes through with permuted columns.
pub fn matrix_from_external(m: Mat4) -> Mat4 {
    let s = m.to_cols_array_2d();
    let mut t = [[0.0f32; 4]; 4];

    // cols_array indexing is [col][row]
    for row in 0..3 {
        for col in 0..3 {
            t[col][row] = s[AXIS_PERM[col]][AXIS_PERM[row]];
        }
        t[3][row] = s[3][AXIS_PERM[row]] * METERS_TO_UNITS;
        t[row][3] = s[AXIS_PERM[row]][3];
    }
    t[3][3] = s[3][3];

    Mat4::from_cols_array_2d(&t)
}

/// Aspect ratio from pixel dimensions.
#[inline]
pub fn aspect_ratio(width: f32, height: f32) -> f32 {
    width / height
}

/// Convert a vertical field of view to a horizontal one for the given
/// aspect ratio. Both angles are in degrees.
#[inline]
pub fn horizontal_fov_from_vertical(vertical_fov: f32, aspect_ratio: f32) -> f32 {
    2.0 * (aspect_ratio * (vertical_fov * 0.5).to_radians().tan())
        .atan()
        .to_degrees()
}

/// Convert a vertical field of view to a horizontal one for the given
/// pixel dimensions.
#[inline]
pub fn horizontal_fov_from_vertical_dims(vertical_fov: f32, width: f32, height: f32) -> f32 {
    horizontal_fov_from_vertical(vertical_fov, width / height)
}

/// Convert a horizontal field of view to a vertical one for the given
/// aspect ratio. Both angles are in degrees.
#[inline]
pub fn vertical_fov_from_horizontal(horizontal_fov: f32, aspect_ratio: f32) -> f32 {
    2.0 * ((1.0 / aspect_ratio) * (horizontal_fov * 0.5).to_radians().tan())
        .atan()
        .to_degrees()
}

/// Convert a horizontal field of view to a vertical one for the given
/// pixel dimensions.
#[inline]
pub fn vertical_fov_from_horizontal_dims(horizontal_fov: f32, width: f32, height: f32) -> f32 {
    vertical_fov_from_horizontal(horizontal_fov, width / height)
}

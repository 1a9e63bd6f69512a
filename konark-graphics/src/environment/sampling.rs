use std::f32::consts::PI;

use glam::{Vec2, Vec3};

/// Cube faces in layer order: +X, -X, +Y, -Y, +Z, -Z.
pub const CUBE_FACE_COUNT: usize = 6;

/// World direction through texel center (`x`, `y`) of a cube face.
pub fn face_direction(face: usize, x: u32, y: u32, size: u32) -> Vec3 {
    let s = 2.0 * (x as f32 + 0.5) / size as f32 - 1.0;
    let t = 2.0 * (y as f32 + 0.5) / size as f32 - 1.0;
    let direction = match face {
        0 => Vec3::new(1.0, -t, -s),
        1 => Vec3::new(-1.0, -t, s),
        2 => Vec3::new(s, 1.0, t),
        3 => Vec3::new(s, -1.0, -t),
        4 => Vec3::new(s, -t, 1.0),
        _ => Vec3::new(-s, -t, -1.0),
    };
    direction.normalize()
}

/// Inverse of [`face_direction`]: face index and texture coordinates in [0, 1].
pub fn direction_to_face_uv(direction: Vec3) -> (usize, Vec2) {
    let abs = direction.abs();
    let (face, s, t, major) = if abs.x >= abs.y && abs.x >= abs.z {
        if direction.x > 0.0 {
            (0, -direction.z, -direction.y, abs.x)
        } else {
            (1, direction.z, -direction.y, abs.x)
        }
    } else if abs.y >= abs.z {
        if direction.y > 0.0 {
            (2, direction.x, direction.z, abs.y)
        } else {
            (3, direction.x, -direction.z, abs.y)
        }
    } else if direction.z > 0.0 {
        (4, direction.x, -direction.y, abs.z)
    } else {
        (5, -direction.x, -direction.y, abs.z)
    };

    (face, Vec2::new(s / major, t / major) * 0.5 + 0.5)
}

/// Equirectangular texture coordinates. Row 0 of the image is straight up.
pub fn equirect_uv(direction: Vec3) -> Vec2 {
    let u = direction.z.atan2(direction.x) / (2.0 * PI) + 0.5;
    let v = 0.5 - direction.y.clamp(-1.0, 1.0).asin() / PI;
    Vec2::new(u, v)
}

/// Bilinear lookup over a `width` x `height` grid; `u` wraps, `v` clamps.
pub fn sample_bilinear_wrapped<F>(width: u32, height: u32, texel: F, u: f32, v: f32) -> Vec3
where
    F: Fn(u32, u32) -> Vec3,
{
    if width == 0 || height == 0 {
        return Vec3::ZERO;
    }

    let x = u.rem_euclid(1.0) * width as f32 - 0.5;
    let y = (v.clamp(0.0, 1.0) * height as f32 - 0.5).clamp(0.0, (height - 1) as f32);
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;

    let wrap_x = |x: f32| (x as i64).rem_euclid(width as i64) as u32;
    let (xa, xb) = (wrap_x(x0), wrap_x(x0 + 1.0));
    let ya = y0 as u32;
    let yb = (ya + 1).min(height - 1);

    let top = texel(xa, ya).lerp(texel(xb, ya), fx);
    let bottom = texel(xa, yb).lerp(texel(xb, yb), fx);
    top.lerp(bottom, fy)
}

pub fn hammersley(i: u32, count: u32) -> Vec2 {
    Vec2::new(i as f32 / count as f32, i.reverse_bits() as f32 * 2.328_306_4e-10)
}

/// GGX half vector around +Z for `roughness` (perceptual, squared to alpha).
pub fn importance_sample_ggx(xi: Vec2, roughness: f32) -> Vec3 {
    let alpha = roughness * roughness;
    let phi = 2.0 * PI * xi.x;
    let cos_theta = ((1.0 - xi.y) / (1.0 + (alpha * alpha - 1.0) * xi.y)).sqrt();
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();

    Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
}

/// Orthonormal tangent and bitangent around `normal`.
pub fn tangent_frame(normal: Vec3) -> (Vec3, Vec3) {
    let up = if normal.z.abs() < 0.999 { Vec3::Z } else { Vec3::X };
    let tangent = up.cross(normal).normalize();
    let bitangent = normal.cross(tangent);
    (tangent, bitangent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_directions_round_trip_through_lookup() {
        let size = 4;
        for face in 0..CUBE_FACE_COUNT {
            for y in 0..size {
                for x in 0..size {
                    let (found, uv) = direction_to_face_uv(face_direction(face, x, y, size));
                    assert_eq!(found, face);
                    let texel = (uv * size as f32).floor();
                    assert_eq!((texel.x as u32, texel.y as u32), (x, y));
                }
            }
        }
    }

    #[test]
    fn face_centers_point_along_axes() {
        let expected = [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z];
        for (face, axis) in expected.iter().enumerate() {
            // Even size: average the four center texels
            let sum: Vec3 = [(1, 1), (1, 2), (2, 1), (2, 2)]
                .iter()
                .map(|(x, y)| face_direction(face, *x, *y, 4))
                .sum();
            assert!(sum.normalize().abs_diff_eq(*axis, 1e-6));
        }
    }

    #[test]
    fn equirect_poles_map_to_edges() {
        assert!((equirect_uv(Vec3::Y).y - 0.0).abs() < 1e-6);
        assert!((equirect_uv(Vec3::NEG_Y).y - 1.0).abs() < 1e-6);
        assert!((equirect_uv(Vec3::X).x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn ggx_half_vector_is_normalized_and_smooth_at_zero_roughness() {
        let h = importance_sample_ggx(hammersley(3, 16), 0.0);
        assert!(h.abs_diff_eq(Vec3::Z, 1e-6));

        for i in 0..16 {
            let h = importance_sample_ggx(hammersley(i, 16), 0.7);
            assert!((h.length() - 1.0).abs() < 1e-5);
            assert!(h.z >= 0.0);
        }
    }
}

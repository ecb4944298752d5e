//! 3-vector primitives: arithmetic, products, norms, axis-angle rotation.

use crate::error::{FoldcodeError, Result};

/// Norms below this are treated as degenerate (coincident atoms).
const DEGENERATE_NORM: f64 = 1e-9;

/// A point or direction in 3D Cartesian space (Angstrom units).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    /// Create a new vector.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The origin.
    pub fn zero() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    /// Vector addition.
    pub fn add(&self, other: &Vec3) -> Vec3 {
        Vec3 {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }

    /// Vector subtraction.
    pub fn sub(&self, other: &Vec3) -> Vec3 {
        Vec3 {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }

    /// Scalar multiplication.
    pub fn scale(&self, s: f64) -> Vec3 {
        Vec3 {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
        }
    }

    /// Dot product.
    pub fn dot(&self, other: &Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product.
    pub fn cross(&self, other: &Vec3) -> Vec3 {
        Vec3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Vector magnitude.
    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Vec3) -> f64 {
        self.sub(other).norm()
    }

    /// Unit vector in the same direction.
    ///
    /// # Errors
    ///
    /// Fails with [`FoldcodeError::DegenerateGeometry`] on a (near-)zero
    /// vector, which arises only from coincident input atoms.
    pub fn unit(&self) -> Result<Vec3> {
        let n = self.norm();
        if n < DEGENERATE_NORM {
            return Err(FoldcodeError::DegenerateGeometry(
                "cannot normalize a zero-length vector".into(),
            ));
        }
        Ok(self.scale(1.0 / n))
    }

    /// Whether all three components are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Rotate this vector by `angle` radians about `axis` (Rodrigues'
    /// formula). `axis` must be unit-length.
    pub fn rotate_about(&self, axis: &Vec3, angle: f64) -> Vec3 {
        let (sin_a, cos_a) = angle.sin_cos();
        self.scale(cos_a)
            .add(&axis.cross(self).scale(sin_a))
            .add(&axis.scale(axis.dot(self) * (1.0 - cos_a)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);
        assert_eq!(a.add(&b), Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(a.sub(&b), Vec3::new(-3.0, -3.0, -3.0));
        assert!((a.dot(&b) - 32.0).abs() < 1e-10);
        assert!((a.scale(2.0).x - 2.0).abs() < 1e-10);
        assert!((a.distance_to(&b) - 27.0_f64.sqrt()).abs() < 1e-10);
    }

    #[test]
    fn cross_product_right_handed() {
        let x = Vec3::new(1.0, 0.0, 0.0);
        let y = Vec3::new(0.0, 1.0, 0.0);
        let z = x.cross(&y);
        assert!(z.x.abs() < 1e-10);
        assert!(z.y.abs() < 1e-10);
        assert!((z.z - 1.0).abs() < 1e-10);
    }

    #[test]
    fn unit_rejects_zero_vector() {
        assert!(Vec3::zero().unit().is_err());
        let u = Vec3::new(3.0, 4.0, 0.0).unit().unwrap();
        assert!((u.norm() - 1.0).abs() < 1e-12);
        assert!((u.x - 0.6).abs() < 1e-12);
    }

    #[test]
    fn is_finite_flags_nan_and_inf() {
        assert!(Vec3::new(1.0, 2.0, 3.0).is_finite());
        assert!(!Vec3::new(f64::NAN, 0.0, 0.0).is_finite());
        assert!(!Vec3::new(0.0, f64::INFINITY, 0.0).is_finite());
    }

    #[test]
    fn rotate_quarter_turn_about_z() {
        let v = Vec3::new(1.0, 0.0, 0.0);
        let z = Vec3::new(0.0, 0.0, 1.0);
        let r = v.rotate_about(&z, std::f64::consts::FRAC_PI_2);
        assert!(r.x.abs() < 1e-12);
        assert!((r.y - 1.0).abs() < 1e-12);
        assert!(r.z.abs() < 1e-12);
    }

    #[test]
    fn rotate_preserves_norm_and_axis_component() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        let axis = Vec3::new(1.0, 1.0, 0.0).unit().unwrap();
        let r = v.rotate_about(&axis, 1.234);
        assert!((r.norm() - v.norm()).abs() < 1e-12);
        assert!((axis.dot(&r) - axis.dot(&v)).abs() < 1e-12);
    }

    #[test]
    fn rotate_full_turn_is_identity() {
        let v = Vec3::new(0.3, -0.7, 1.9);
        let axis = Vec3::new(0.0, 1.0, 0.0);
        let r = v.rotate_about(&axis, std::f64::consts::TAU);
        assert!(r.distance_to(&v) < 1e-12);
    }
}

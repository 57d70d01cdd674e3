//! 3D vectors and local face frames.

use nalgebra::Vector3;

use crate::error::{MfError, MfResult};

/// Cartesian vector (x, y, z).
pub type Vec3 = Vector3<f64>;

/// Orthonormal frame attached to a face: `normal` points from the left
/// cell towards the right cell (or out of the domain on a boundary).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Frame {
    pub normal: Vec3,
    pub tangent: Vec3,
    pub binormal: Vec3,
}

impl Frame {
    /// Complete an orthonormal frame from a (not necessarily unit) normal.
    pub fn from_normal(normal: Vec3) -> MfResult<Self> {
        let length = normal.norm();
        if !length.is_finite() || length <= f64::EPSILON {
            return Err(MfError::DegenerateNormal { length });
        }
        let n = normal / length;
        // Pick the axis least aligned with n to seed the tangent.
        let seed = if n.x.abs() <= n.y.abs() && n.x.abs() <= n.z.abs() {
            Vec3::x()
        } else if n.y.abs() <= n.z.abs() {
            Vec3::y()
        } else {
            Vec3::z()
        };
        let tangent = (seed - n * n.dot(&seed)).normalize();
        let binormal = n.cross(&tangent);
        Ok(Self {
            normal: n,
            tangent,
            binormal,
        })
    }

    /// Axis-aligned frame along +x.
    pub fn x_axis() -> Self {
        Self {
            normal: Vec3::x(),
            tangent: Vec3::y(),
            binormal: Vec3::z(),
        }
    }

    /// Components of `v` in (normal, tangent, binormal).
    #[inline]
    pub fn to_local(&self, v: &Vec3) -> Vec3 {
        Vec3::new(
            v.dot(&self.normal),
            v.dot(&self.tangent),
            v.dot(&self.binormal),
        )
    }

    /// Inverse of [`Frame::to_local`].
    #[inline]
    pub fn to_global(&self, local: &Vec3) -> Vec3 {
        self.normal * local.x + self.tangent * local.y + self.binormal * local.z
    }

    /// Same face seen from the other side.
    pub fn reversed(&self) -> Self {
        Self {
            normal: -self.normal,
            tangent: -self.tangent,
            binormal: self.binormal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_is_orthonormal() {
        let f = Frame::from_normal(Vec3::new(1.0, 2.0, -0.5)).unwrap();
        assert!((f.normal.norm() - 1.0).abs() < 1e-12);
        assert!((f.tangent.norm() - 1.0).abs() < 1e-12);
        assert!((f.binormal.norm() - 1.0).abs() < 1e-12);
        assert!(f.normal.dot(&f.tangent).abs() < 1e-12);
        assert!(f.normal.dot(&f.binormal).abs() < 1e-12);
        assert!(f.tangent.dot(&f.binormal).abs() < 1e-12);
    }

    #[test]
    fn local_global_round_trip() {
        let f = Frame::from_normal(Vec3::new(0.3, -0.2, 0.9)).unwrap();
        let v = Vec3::new(4.0, -1.0, 2.5);
        let back = f.to_global(&f.to_local(&v));
        assert!((back - v).norm() < 1e-12);
    }

    #[test]
    fn degenerate_normals_are_rejected() {
        assert!(matches!(
            Frame::from_normal(Vec3::zeros()),
            Err(MfError::DegenerateNormal { .. })
        ));
        assert!(Frame::from_normal(Vec3::new(f64::NAN, 1.0, 0.0)).is_err());
    }
}

//! Weighted least-squares gradient operator.

use mf_core::Vec3;
use nalgebra::Matrix3;

use crate::error::{ModelError, ModelResult};

/// Least-squares gradient of a cell from its neighbours, weights 1/|d|².
///
/// The normal matrix is pseudo-inverted, so stencils spanning fewer than
/// three directions (1D and 2D meshes) give the minimum-norm gradient and
/// stay exact for fields linear along the directions they do span.
#[derive(Clone, Debug)]
pub struct LeastSquares {
    inverse: Matrix3<f64>,
    weighted: Vec<Vec3>,
}

impl LeastSquares {
    pub fn new(center: Vec3, neighbours: impl IntoIterator<Item = Vec3>) -> ModelResult<Self> {
        let mut normal = Matrix3::zeros();
        let mut weighted = Vec::new();
        for position in neighbours {
            let d = position - center;
            let d2 = d.norm_squared();
            if !(d2.is_finite() && d2 > 0.0) {
                return Err(ModelError::configuration("coincident cell centers in gradient stencil"));
            }
            let w = 1.0 / d2;
            normal += w * d * d.transpose();
            weighted.push(w * d);
        }
        let eps = 1e-12 * normal.norm();
        let inverse = normal
            .pseudo_inverse(eps)
            .map_err(|e| ModelError::numerical(format!("least-squares inversion failed: {e}")))?;
        Ok(Self { inverse, weighted })
    }

    pub fn len(&self) -> usize {
        self.weighted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weighted.is_empty()
    }

    /// Gradient of a field given its center value and neighbour values in
    /// stencil order.
    pub fn gradient(&self, center: f64, values: impl IntoIterator<Item = f64>) -> Vec3 {
        let rhs: Vec3 = self
            .weighted
            .iter()
            .zip(values)
            .map(|(wd, v)| wd * (v - center))
            .sum();
        self.inverse * rhs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_for_linear_field_in_3d() {
        let center = Vec3::new(0.1, 0.2, 0.3);
        let stencil = [
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(-1.0, 0.5, 0.0),
            Vec3::new(0.0, 1.0, 0.2),
            Vec3::new(0.3, -1.0, 1.0),
            Vec3::new(0.0, 0.0, -1.0),
        ];
        let g = Vec3::new(2.0, -3.0, 0.5);
        let f = |x: &Vec3| 7.0 + g.dot(x);
        let ls = LeastSquares::new(center, stencil).unwrap();
        let grad = ls.gradient(f(&center), stencil.iter().map(f));
        assert!((grad - g).norm() < 1e-10);
    }

    #[test]
    fn one_dimensional_stencil() {
        let ls = LeastSquares::new(Vec3::new(1.0, 0.0, 0.0), [Vec3::zeros(), Vec3::new(2.0, 0.0, 0.0)]).unwrap();
        let grad = ls.gradient(3.0, [1.0, 5.0]);
        assert!((grad - Vec3::new(2.0, 0.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn empty_stencil_gives_zero() {
        let ls = LeastSquares::new(Vec3::zeros(), []).unwrap();
        assert!(ls.is_empty());
        assert_eq!(ls.gradient(1.0, []), Vec3::zeros());
    }
}

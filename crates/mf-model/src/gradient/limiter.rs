//! Slope limiters for reconstructed gradients.

const EPS: f64 = 1e-12;

/// How reconstructed gradients are limited.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LimiterKind {
    /// Drop gradients: first-order scheme.
    FirstOrder,
    /// Keep gradients as computed.
    Unlimited,
    /// Face-wise minmod between the extrapolated jump and the jump to the
    /// neighbour across that face, scaled to the face distance.
    #[default]
    Minmod,
    /// Keep face values within the neighbourhood extrema.
    BarthJespersen,
}

#[inline]
pub(crate) fn minmod(a: f64, b: f64) -> f64 {
    if a * b <= 0.0 {
        0.0
    } else if a > 0.0 {
        a.min(b)
    } else {
        a.max(b)
    }
}

/// One face as seen by the limiter.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FaceJump {
    /// gradient · (x_face - x_cell)
    pub extrapolated: f64,
    /// Neighbour jump scaled to the face distance.
    pub neighbour: f64,
}

impl LimiterKind {
    /// Coefficient in [0, 1] for one scalar of one cell.
    ///
    /// `delta_max` and `delta_min` are the neighbourhood extrema minus the
    /// cell value (so `delta_max >= 0 >= delta_min`).
    pub(crate) fn coefficient(self, scale: f64, delta_max: f64, delta_min: f64, faces: &[FaceJump]) -> f64 {
        let tol = EPS * scale.abs().max(EPS);
        match self {
            LimiterKind::FirstOrder => 0.0,
            LimiterKind::Unlimited => 1.0,
            LimiterKind::Minmod => faces
                .iter()
                .filter(|f| f.extrapolated.abs() > tol)
                .map(|f| minmod(1.0, f.neighbour / f.extrapolated))
                .fold(1.0, f64::min),
            LimiterKind::BarthJespersen => faces
                .iter()
                .filter(|f| f.extrapolated.abs() > tol)
                .map(|f| {
                    let bound = if f.extrapolated > 0.0 { delta_max } else { delta_min };
                    (bound / f.extrapolated).clamp(0.0, 1.0)
                })
                .fold(1.0, f64::min),
        }
    }
}

use glam::{DAffine2, DMat2};
pub use glam::DVec2;

/// Local transform of a scene node.
///
/// Composed as `translate(position) · rotate(rotation) · skew(skew) ·
/// scale(scale) · translate(-offset)`, so `position` is where the node's
/// `offset` point lands in the parent's space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform2D {
    pub position: DVec2,
    pub scale: DVec2,
    /// Degrees, clockwise on screen (y axis points down)
    pub rotation: f64,
    /// Shear factors: `x' = x + skew.x * y`, `y' = skew.y * x + y`
    pub skew: DVec2,
    /// Transform origin in local coordinates
    pub offset: DVec2,
}

impl Transform2D {
    pub fn identity() -> Self {
        Self {
            position: DVec2::ZERO,
            scale: DVec2::ONE,
            rotation: 0.0,
            skew: DVec2::ZERO,
            offset: DVec2::ZERO,
        }
    }

    pub fn from_position(position: DVec2) -> Self {
        Self {
            position,
            ..Self::identity()
        }
    }

    pub fn with_position(mut self, position: DVec2) -> Self {
        self.position = position;
        self
    }

    pub fn with_scale(mut self, scale: DVec2) -> Self {
        self.scale = scale;
        self
    }

    /// Builder method to set rotation (in degrees)
    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_skew(mut self, skew: DVec2) -> Self {
        self.skew = skew;
        self
    }

    pub fn with_offset(mut self, offset: DVec2) -> Self {
        self.offset = offset;
        self
    }

    /// The full affine matrix for this transform
    pub fn to_affine(&self) -> DAffine2 {
        let skew = DMat2::from_cols(DVec2::new(1.0, self.skew.y), DVec2::new(self.skew.x, 1.0));
        DAffine2::from_translation(self.position)
            * DAffine2::from_angle(self.rotation.to_radians())
            * DAffine2::from_mat2(skew)
            * DAffine2::from_scale(self.scale)
            * DAffine2::from_translation(-self.offset)
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: DVec2) -> DVec2 {
        self.to_affine().transform_point2(point)
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::identity()
    }
}

/// Components recovered from an affine matrix.
///
/// Any field may come out non-finite for degenerate input; callers check
/// each one before writing it to a node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Decomposed {
    pub position: DVec2,
    pub rotation: f64,
    pub scale: DVec2,
    pub skew: DVec2,
}

impl Decomposed {
    /// Split `matrix` into position, rotation (degrees), scale and skew.
    ///
    /// `offset` is the node's transform origin; it is folded back in before
    /// decomposing so that the returned position pairs with that offset.
    pub fn from_affine(matrix: DAffine2, offset: DVec2) -> Self {
        let m = matrix * DAffine2::from_translation(offset);
        let a = m.matrix2.x_axis.x;
        let b = m.matrix2.x_axis.y;
        let c = m.matrix2.y_axis.x;
        let d = m.matrix2.y_axis.y;
        let delta = a * d - b * c;

        let mut out = Self {
            position: m.translation,
            rotation: 0.0,
            scale: DVec2::ZERO,
            skew: DVec2::ZERO,
        };

        if a != 0.0 || b != 0.0 {
            let r = (a * a + b * b).sqrt();
            let angle = (a / r).clamp(-1.0, 1.0).acos();
            out.rotation = if b > 0.0 { angle } else { -angle };
            out.scale = DVec2::new(r, delta / r);
            out.skew = DVec2::new((a * c + b * d) / delta, 0.0);
        } else if c != 0.0 || d != 0.0 {
            let s = (c * c + d * d).sqrt();
            let angle = if d > 0.0 {
                (-c / s).clamp(-1.0, 1.0).acos()
            } else {
                -(c / s).clamp(-1.0, 1.0).acos()
            };
            out.rotation = std::f64::consts::FRAC_PI_2 - angle;
            out.scale = DVec2::new(delta / s, s);
            out.skew = DVec2::new(0.0, (a * b + c * d) / delta);
        }

        out.rotation = out.rotation.to_degrees();
        out
    }

    /// Write every finite component onto `transform`, leaving the rest untouched.
    /// Returns the number of components dropped.
    pub fn assign_finite(&self, transform: &mut Transform2D) -> usize {
        let mut dropped = 0;
        if self.position.is_finite() {
            transform.position = self.position;
        } else {
            dropped += 1;
        }
        if self.rotation.is_finite() {
            transform.rotation = self.rotation;
        } else {
            dropped += 1;
        }
        if self.scale.is_finite() {
            transform.scale = self.scale;
        } else {
            dropped += 1;
        }
        if self.skew.is_finite() {
            transform.skew = self.skew;
        } else {
            dropped += 1;
        }
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{approx_eq, approx_eq_vec};

    fn assert_affine_eq(a: DAffine2, b: DAffine2) {
        assert!(a.abs_diff_eq(b, 1e-9), "{a:?} != {b:?}");
    }

    #[test]
    fn test_transform_identity() {
        let t = Transform2D::identity();
        let point = DVec2::new(10.0, 20.0);
        assert_eq!(t.transform_point(point), point);
    }

    #[test]
    fn test_transform_translation() {
        let t = Transform2D::from_position(DVec2::new(5.0, 10.0));
        assert_eq!(t.transform_point(DVec2::new(10.0, 20.0)), DVec2::new(15.0, 30.0));
    }

    #[test]
    fn test_offset_is_pivot() {
        let t = Transform2D::from_position(DVec2::new(50.0, 50.0))
            .with_offset(DVec2::new(50.0, 50.0))
            .with_rotation(90.0);
        // the pivot stays put
        assert!(approx_eq_vec(t.transform_point(DVec2::new(50.0, 50.0)), DVec2::new(50.0, 50.0)));
        // top-left corner swings to top-right
        assert!(approx_eq_vec(t.transform_point(DVec2::ZERO), DVec2::new(100.0, 0.0)));
    }

    #[test]
    fn test_decompose_recovers_components() {
        let t = Transform2D::identity()
            .with_position(DVec2::new(12.0, -4.0))
            .with_rotation(30.0)
            .with_scale(DVec2::new(2.0, 0.5))
            .with_skew(DVec2::new(0.25, 0.0));
        let d = Decomposed::from_affine(t.to_affine(), DVec2::ZERO);
        assert!(approx_eq_vec(d.position, t.position));
        assert!(approx_eq(d.rotation, 30.0));
        assert!(approx_eq_vec(d.scale, t.scale));
        assert!(approx_eq_vec(d.skew, t.skew));
    }

    #[test]
    fn test_decompose_roundtrip_with_offset() {
        let t = Transform2D::identity()
            .with_position(DVec2::new(3.0, 8.0))
            .with_rotation(-135.0)
            .with_scale(DVec2::new(1.5, 3.0))
            .with_offset(DVec2::new(10.0, 20.0));
        let d = Decomposed::from_affine(t.to_affine(), t.offset);
        let mut rebuilt = Transform2D::identity().with_offset(t.offset);
        assert_eq!(d.assign_finite(&mut rebuilt), 0);
        assert_affine_eq(rebuilt.to_affine(), t.to_affine());
    }

    #[test]
    fn test_decompose_with_y_skew_rebuilds_same_matrix() {
        let t = Transform2D::identity()
            .with_rotation(10.0)
            .with_skew(DVec2::new(0.0, 0.4))
            .with_scale(DVec2::new(2.0, 1.0));
        let d = Decomposed::from_affine(t.to_affine(), DVec2::ZERO);
        let mut rebuilt = Transform2D::identity();
        d.assign_finite(&mut rebuilt);
        assert_affine_eq(rebuilt.to_affine(), t.to_affine());
    }

    #[test]
    fn test_assign_finite_drops_nan() {
        let d = Decomposed {
            position: DVec2::new(1.0, 2.0),
            rotation: f64::NAN,
            scale: DVec2::new(f64::INFINITY, 1.0),
            skew: DVec2::ZERO,
        };
        let mut t = Transform2D::identity().with_rotation(15.0);
        assert_eq!(d.assign_finite(&mut t), 2);
        assert_eq!(t.position, DVec2::new(1.0, 2.0));
        assert_eq!(t.rotation, 15.0);
        assert_eq!(t.scale, DVec2::ONE);
    }

    #[test]
    fn test_degenerate_matrix_yields_non_finite_or_zero() {
        let d = Decomposed::from_affine(DAffine2::from_scale(DVec2::ZERO), DVec2::ZERO);
        assert_eq!(d.scale, DVec2::ZERO);
        assert_eq!(d.position, DVec2::ZERO);
    }
}

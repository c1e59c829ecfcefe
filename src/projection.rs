// Geographic projection for the map chart

use crate::config::MapConfig;
use crate::viewport::Viewport;
use std::f64::consts::FRAC_PI_4;

/// Spherical Mercator, scaled from the viewport width and centred from its size.
///
/// Rebuilt from scratch whenever the viewport changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MercatorProjection {
    pub scale: f64,
    pub translate: (f64, f64),
}

impl MercatorProjection {
    pub fn new(scale: f64, translate: (f64, f64)) -> Self {
        MercatorProjection { scale, translate }
    }

    pub fn for_viewport(viewport: &Viewport, config: &MapConfig) -> Self {
        MercatorProjection::new(
            viewport.width / config.scale_divisor,
            (viewport.width / 2.0, viewport.height / config.translate_y_divisor),
        )
    }

    /// Project a lon/lat pair in degrees; `None` when the point has no image.
    pub fn project(&self, longitude: f64, latitude: f64) -> Option<(f64, f64)> {
        if !longitude.is_finite() || !latitude.is_finite() {
            return None;
        }
        if longitude.abs() > 180.0 || latitude.abs() >= 90.0 {
            return None;
        }
        let lambda = longitude.to_radians();
        let phi = latitude.to_radians();
        let x = self.translate.0 + self.scale * lambda;
        let y = self.translate.1 - self.scale * (FRAC_PI_4 + phi / 2.0).tan().ln();
        (x.is_finite() && y.is_finite()).then_some((x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_maps_to_translate() {
        let projection = MercatorProjection::new(100.0, (480.0, 333.0));
        let (x, y) = projection.project(0.0, 0.0).unwrap();
        assert!((x - 480.0).abs() < 1e-9);
        assert!((y - 333.0).abs() < 1e-9);
    }

    #[test]
    fn test_north_is_up_and_east_is_right() {
        let projection = MercatorProjection::new(100.0, (0.0, 0.0));
        let (x, y) = projection.project(90.0, 45.0).unwrap();
        assert!(x > 0.0);
        assert!(y < 0.0);
        assert!((x - 100.0 * std::f64::consts::FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_points_fail() {
        let projection = MercatorProjection::new(100.0, (0.0, 0.0));
        assert!(projection.project(f64::NAN, 0.0).is_none());
        assert!(projection.project(0.0, 90.0).is_none());
        assert!(projection.project(181.0, 0.0).is_none());
    }

    #[test]
    fn test_viewport_parameters() {
        let viewport = Viewport::new(960.0, 600.0, Default::default());
        let projection = MercatorProjection::for_viewport(&viewport, &MapConfig::default());
        assert!((projection.scale - 960.0 / 6.5).abs() < 1e-9);
        assert_eq!(projection.translate, (480.0, 400.0));
    }
}

use serde::Deserialize;

/// Axis-aligned region in the coordinates of the output CRS.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Bbox {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl Bbox {
    pub fn new(xmin: f64, xmax: f64, ymin: f64, ymax: f64) -> Result<Self, String> {
        if ![xmin, xmax, ymin, ymax].iter().all(|v| v.is_finite()) {
            return Err("Coordinates must be finite".to_string());
        }

        if xmin > xmax || ymin > ymax {
            return Err("Min values must be <= max values".to_string());
        }

        Ok(Bbox {
            xmin,
            xmax,
            ymin,
            ymax,
        })
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// True when the two boxes share some area (touching edges do not count).
    pub fn intersects(&self, other: &Bbox) -> bool {
        self.xmin < other.xmax
            && other.xmin < self.xmax
            && self.ymin < other.ymax
            && other.ymin < self.ymax
    }
}

#[cfg(test)]
mod test {
    use crate::bbox::Bbox;

    #[test]
    fn test_bbox_validation() {
        let valid_bbox = Bbox::new(399_000.0, 420_000.0, 4_500_000.0, 4_530_000.0);
        assert!(valid_bbox.is_ok());

        let not_finite = Bbox::new(f64::NAN, 0.0, 0.0, 10.0);
        assert!(not_finite.is_err());

        let infinite = Bbox::new(0.0, f64::INFINITY, 0.0, 10.0);
        assert!(infinite.is_err());

        // Test min > max
        let invalid_order_x = Bbox::new(10.0, 0.0, 0.0, 10.0);
        assert!(invalid_order_x.is_err());

        let invalid_order_y = Bbox::new(0.0, 10.0, 10.0, 0.0);
        assert!(invalid_order_y.is_err());
    }

    #[test]
    fn test_intersects() {
        let a = Bbox::new(0.0, 10.0, 0.0, 10.0).unwrap();
        let b = Bbox::new(5.0, 15.0, 5.0, 15.0).unwrap();
        let c = Bbox::new(10.0, 20.0, 0.0, 10.0).unwrap();
        let d = Bbox::new(30.0, 40.0, 30.0, 40.0).unwrap();

        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
        assert!(!a.intersects(&d));
    }
}

use crate::bbox::Bbox;

/// GDAL-style affine transform:
/// `[top_left_x, pixel_width, 0, top_left_y, 0, -pixel_height]`
pub type GeoTransform = [f64; 6];

/// North-up pixel grid. Pixel data tied to a grid is stored row-major.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    width: usize,
    height: usize,
    geo_transform: GeoTransform,
}

/// Pixel-space sub-rectangle of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    pub x_off: usize,
    pub y_off: usize,
    pub width: usize,
    pub height: usize,
}

impl Grid {
    pub fn new(width: usize, height: usize, geo_transform: GeoTransform) -> Result<Self, String> {
        if !geo_transform.iter().all(|v| v.is_finite()) {
            return Err("Geotransform values must be finite".to_string());
        }

        if geo_transform[2] != 0.0 || geo_transform[4] != 0.0 {
            return Err("Rotated geotransforms are not supported".to_string());
        }

        if geo_transform[1] <= 0.0 || geo_transform[5] >= 0.0 {
            return Err("Grid must be north-up with positive pixel width".to_string());
        }

        Ok(Self {
            width,
            height,
            geo_transform,
        })
    }

    /// Grid whose pixels of size `scale` tile `region` from its top-left corner.
    /// Dimensions saturate at `usize::MAX` rather than wrap.
    pub fn covering(region: &Bbox, scale: f64) -> Self {
        let width = ((region.width() / scale).ceil() as usize).max(1);
        let height = ((region.height() / scale).ceil() as usize).max(1);

        Self {
            width,
            height,
            geo_transform: [region.xmin, scale, 0.0, region.ymax, 0.0, -scale],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn geo_transform(&self) -> &GeoTransform {
        &self.geo_transform
    }

    /// Pixel count, saturating at `usize::MAX`. Check [`Grid::pixel_count`]
    /// against a ceiling before allocating `len` values.
    pub fn len(&self) -> usize {
        self.width.saturating_mul(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pixel_count(&self) -> u64 {
        (self.width as u64).saturating_mul(self.height as u64)
    }

    pub fn footprint(&self) -> Bbox {
        let gt = &self.geo_transform;
        Bbox {
            xmin: gt[0],
            xmax: gt[0] + self.width as f64 * gt[1],
            ymin: gt[3] + self.height as f64 * gt[5],
            ymax: gt[3],
        }
    }

    pub fn pixel_center(&self, col: usize, row: usize) -> (f64, f64) {
        let gt = &self.geo_transform;
        (
            gt[0] + (col as f64 + 0.5) * gt[1],
            gt[3] + (row as f64 + 0.5) * gt[5],
        )
    }

    /// Row-major index of the pixel containing `(x, y)`.
    pub fn pixel_at(&self, x: f64, y: f64) -> Option<usize> {
        let gt = &self.geo_transform;
        let col = ((x - gt[0]) / gt[1]).floor();
        let row = ((y - gt[3]) / gt[5]).floor();

        if col < 0.0 || row < 0.0 || col >= self.width as f64 || row >= self.height as f64 {
            return None;
        }

        Some(row as usize * self.width + col as usize)
    }

    /// Pixel window covering `bbox`, clamped to the grid. `None` when they do not overlap.
    pub fn window(&self, bbox: &Bbox) -> Option<PixelWindow> {
        let gt = &self.geo_transform;

        let pixel_min_x = ((bbox.xmin - gt[0]) / gt[1]).floor() as i64;
        let pixel_max_x = ((bbox.xmax - gt[0]) / gt[1]).ceil() as i64;
        let pixel_min_y = ((bbox.ymax - gt[3]) / gt[5]).floor() as i64;
        let pixel_max_y = ((bbox.ymin - gt[3]) / gt[5]).ceil() as i64;

        let start_x = pixel_min_x.max(0) as usize;
        let end_x = pixel_max_x.max(0).min(self.width as i64) as usize;
        let start_y = pixel_min_y.max(0) as usize;
        let end_y = pixel_max_y.max(0).min(self.height as i64) as usize;

        if end_x <= start_x || end_y <= start_y {
            return None;
        }

        Some(PixelWindow {
            x_off: start_x,
            y_off: start_y,
            width: end_x - start_x,
            height: end_y - start_y,
        })
    }

    pub fn subgrid(&self, window: &PixelWindow) -> Grid {
        let gt = &self.geo_transform;
        Grid {
            width: window.width,
            height: window.height,
            geo_transform: [
                gt[0] + window.x_off as f64 * gt[1],
                gt[1],
                0.0,
                gt[3] + window.y_off as f64 * gt[5],
                0.0,
                gt[5],
            ],
        }
    }

    /// Rows of `window` copied out of a row-major buffer laid out on this grid.
    pub fn crop_values(&self, window: &PixelWindow, values: &[f64]) -> Vec<f64> {
        let mut cropped = Vec::with_capacity(window.width * window.height);
        for row in window.y_off..window.y_off + window.height {
            let start = row * self.width + window.x_off;
            cropped.extend_from_slice(&values[start..start + window.width]);
        }
        cropped
    }
}

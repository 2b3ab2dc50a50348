use crate::geo::{LngLat, LngLatBounds};
use crate::printable::MapSurface;
use std::f64::consts::PI;

const MIN_ZOOM: f64 = 0.5;
/// Deep enough for street-level point sets
const MAX_ZOOM: f64 = 4_194_304.0;
const MAX_LAT: f64 = 85.0511;
/// Share of the pane a fitted box may occupy
const FIT_PADDING: f64 = 0.9;

/// Viewport representing the visible map area and zoom level
#[derive(Clone, Debug)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude (-85 to 85)
    pub center_lat: f64,
    /// Zoom level; 1.0 fits the whole world's width into the canvas
    pub zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon,
            center_lat,
            zoom,
            width,
            height,
        }
    }

    /// Create a world view (shows entire world)
    pub fn world(width: usize, height: usize) -> Self {
        Self::new(0.0, 20.0, 1.0, width, height)
    }

    pub fn set_size(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let (x, y) = self.unproject_f(
            self.width as f64 / 2.0 + dx as f64,
            self.height as f64 / 2.0 + dy as f64,
        );
        self.center_lon = x;
        self.center_lat = y.clamp(-MAX_LAT, MAX_LAT);

        // Wrap longitude
        if self.center_lon > 180.0 {
            self.center_lon -= 360.0;
        } else if self.center_lon < -180.0 {
            self.center_lon += 360.0;
        }
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * 1.5).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / 1.5).max(MIN_ZOOM);
    }

    /// Zoom in towards a specific pixel location
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.5);
    }

    /// Zoom out from a specific pixel location
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / 1.5);
    }

    /// Zoom by factor keeping the geographic point under (px, py) in place
    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        let (lon, lat) = self.unproject(px, py);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);

        let (new_px, new_py) = self.project(lon, lat);
        self.pan(new_px - px, new_py - py);
    }

    fn scale(&self) -> f64 {
        self.zoom * self.width as f64
    }

    fn unproject_f(&self, px: f64, py: f64) -> (f64, f64) {
        let scale = self.scale();
        let x = (px - self.width as f64 / 2.0) / scale + mercator_x(self.center_lon);
        let y = (py - self.height as f64 / 2.0) / scale + mercator_y(self.center_lat);
        (x * 360.0 - 180.0, inverse_mercator_y(y))
    }

    /// Unproject pixel coordinates back to geographic coordinates (lon, lat)
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        self.unproject_f(px as f64, py as f64)
    }

    /// Project a geographic coordinate (lon, lat) to pixel coordinates
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let scale = self.scale();
        let px = (mercator_x(lon) - mercator_x(self.center_lon)) * scale + self.width as f64 / 2.0;
        let py = (mercator_y(lat) - mercator_y(self.center_lat)) * scale + self.height as f64 / 2.0;
        (px.floor() as i32, py.floor() as i32)
    }

    /// Check if a projected point is on the canvas
    pub fn is_visible(&self, px: i32, py: i32) -> bool {
        px >= 0 && px < self.width as i32 && py >= 0 && py < self.height as i32
    }

    /// Check if a line segment might be visible (rough bounding box check)
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
    }
}

impl MapSurface for Viewport {
    fn bounds(&self) -> LngLatBounds {
        let (west, north) = self.unproject_f(0.0, 0.0);
        let (east, south) = self.unproject_f(self.width as f64, self.height as f64);
        LngLatBounds::from_corners(LngLat::new(west, north), LngLat::new(east, south))
    }

    fn fit_bounds(&mut self, bounds: &LngLatBounds) {
        let left = mercator_x(bounds.sw.lng);
        let right = mercator_x(bounds.ne.lng);
        let top = mercator_y(bounds.ne.lat);
        let bottom = mercator_y(bounds.sw.lat);

        self.center_lon = (bounds.sw.lng + bounds.ne.lng) * 0.5;
        self.center_lat = inverse_mercator_y((top + bottom) * 0.5);

        if self.width == 0 || self.height == 0 {
            return;
        }
        let span_x = (right - left).max(f64::EPSILON);
        let span_y = (bottom - top).max(f64::EPSILON);
        let zoom_x = 1.0 / span_x;
        let zoom_y = self.height as f64 / (self.width as f64 * span_y);
        self.zoom = (zoom_x.min(zoom_y) * FIT_PADDING).clamp(MIN_ZOOM, MAX_ZOOM);
    }
}

/// Web Mercator x in [0, 1]
fn mercator_x(lon: f64) -> f64 {
    (lon + 180.0) / 360.0
}

/// Web Mercator y in [0, 1], north at 0
fn mercator_y(lat: f64) -> f64 {
    let lat_rad = lat.clamp(-MAX_LAT, MAX_LAT).to_radians();
    (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0
}

fn inverse_mercator_y(y: f64) -> f64 {
    (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees()
}

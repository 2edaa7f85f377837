use std::f64::consts::PI;

use janconnect_shared::LatLng;

pub const TILE_SIZE: f64 = 256.0;
pub const MIN_ZOOM: f64 = 5.0;
pub const MAX_ZOOM: f64 = 15.0;
const MAX_MERCATOR_LAT: f64 = 85.051_128_78;
const EARTH_CIRCUMFERENCE_M: f64 = 40_075_016.686;

/// Web-Mercator camera: a geographic center plus a fractional zoom level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapViewport {
    pub center: LatLng,
    pub zoom: f64,
}

impl Default for MapViewport {
    fn default() -> Self {
        Self {
            center: LatLng::new(23.5, 85.0),
            zoom: 7.0,
        }
    }
}

/// World pixel coordinates of `(lat, lng)` at `zoom`.
fn project(lat: f64, lng: f64, zoom: f64) -> (f64, f64) {
    let scale = TILE_SIZE * 2f64.powf(zoom);
    let lat = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    let x = (lng + 180.0) / 360.0 * scale;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * scale;
    (x, y)
}

fn unproject(x: f64, y: f64, zoom: f64) -> LatLng {
    let scale = TILE_SIZE * 2f64.powf(zoom);
    let lng = x / scale * 360.0 - 180.0;
    let n = PI - 2.0 * PI * y / scale;
    let lat = n.sinh().atan().to_degrees();
    LatLng::new(lat, lng)
}

pub fn clamp_zoom(zoom: f64) -> f64 {
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

impl MapViewport {
    pub fn new(center: LatLng, zoom: f64) -> Self {
        Self {
            center,
            zoom: clamp_zoom(zoom),
        }
    }

    /// Screen position of `(lat, lng)` on a `width` x `height` canvas.
    pub fn to_screen(&self, lat: f64, lng: f64, width: f64, height: f64) -> (f64, f64) {
        let (cx, cy) = project(self.center.lat, self.center.lng, self.zoom);
        let (px, py) = project(lat, lng, self.zoom);
        (px - cx + width / 2.0, py - cy + height / 2.0)
    }

    /// Geographic position under a screen point.
    pub fn to_lat_lng(&self, sx: f64, sy: f64, width: f64, height: f64) -> LatLng {
        let (cx, cy) = project(self.center.lat, self.center.lng, self.zoom);
        unproject(cx + sx - width / 2.0, cy + sy - height / 2.0, self.zoom)
    }

    /// `(south_west, north_east)` visible on the canvas.
    pub fn visible_bounds(&self, width: f64, height: f64) -> (LatLng, LatLng) {
        let north_west = self.to_lat_lng(0.0, 0.0, width, height);
        let south_east = self.to_lat_lng(width, height, width, height);
        (
            LatLng::new(south_east.lat, north_west.lng),
            LatLng::new(north_west.lat, south_east.lng),
        )
    }
}

impl MapViewport {
    /// Ground distance covered by one CSS pixel at the camera center.
    pub fn meters_per_pixel(&self) -> f64 {
        EARTH_CIRCUMFERENCE_M * self.center.lat.to_radians().cos()
            / (TILE_SIZE * 2f64.powf(self.zoom))
    }

    /// Largest round distance (1, 2 or 5 times a power of ten, in meters) that
    /// fits in `max_px`, with its length in pixels.
    pub fn scale_bar(&self, max_px: f64) -> (f64, f64) {
        let mpp = self.meters_per_pixel();
        let max_m = mpp * max_px;
        if !max_m.is_finite() || max_m <= 0.0 {
            return (0.0, 0.0);
        }
        let pow = 10f64.powf(max_m.log10().floor());
        let meters = [5.0, 2.0, 1.0]
            .into_iter()
            .map(|m| m * pow)
            .find(|m| *m <= max_m)
            .unwrap_or(pow);
        (meters, meters / mpp)
    }
}

pub fn format_distance(meters: f64) -> String {
    if meters >= 1000.0 {
        format!("{} km", (meters / 1000.0).round())
    } else {
        format!("{} m", meters.round())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn center_maps_to_canvas_middle() {
        let vp = MapViewport::default();
        let (x, y) = vp.to_screen(23.5, 85.0, 800.0, 600.0);
        assert_close(x, 400.0, 1e-9);
        assert_close(y, 300.0, 1e-9);
    }

    #[test]
    fn north_is_up_and_east_is_right() {
        let vp = MapViewport::default();
        let (_, y_north) = vp.to_screen(24.5, 85.0, 800.0, 600.0);
        let (x_east, _) = vp.to_screen(23.5, 86.0, 800.0, 600.0);
        assert!(y_north < 300.0);
        assert!(x_east > 400.0);
    }

    #[test]
    fn one_zoom_level_doubles_screen_distance() {
        let near = MapViewport::new(LatLng::new(23.5, 85.0), 7.0);
        let far = MapViewport::new(LatLng::new(23.5, 85.0), 8.0);
        let (x7, _) = near.to_screen(23.5, 86.0, 800.0, 600.0);
        let (x8, _) = far.to_screen(23.5, 86.0, 800.0, 600.0);
        assert_close((x8 - 400.0) / (x7 - 400.0), 2.0, 1e-9);
    }

    #[test]
    fn screen_round_trip() {
        let vp = MapViewport::new(LatLng::new(23.795, 86.43), 11.0);
        let (x, y) = vp.to_screen(23.9, 86.5, 1024.0, 768.0);
        let back = vp.to_lat_lng(x, y, 1024.0, 768.0);
        assert_close(back.lat, 23.9, 1e-9);
        assert_close(back.lng, 86.5, 1e-9);
    }

    #[test]
    fn zoom_is_clamped() {
        assert_eq!(MapViewport::new(LatLng::new(0.0, 0.0), 2.0).zoom, MIN_ZOOM);
        assert_eq!(MapViewport::new(LatLng::new(0.0, 0.0), 19.0).zoom, MAX_ZOOM);
    }

    #[test]
    fn visible_bounds_contain_center() {
        let vp = MapViewport::default();
        let (sw, ne) = vp.visible_bounds(800.0, 600.0);
        assert!(sw.lat < 23.5 && ne.lat > 23.5);
        assert!(sw.lng < 85.0 && ne.lng > 85.0);
    }

    #[test]
    fn scale_bar_picks_round_distance() {
        let vp = MapViewport::default();
        // ~1.12 km per pixel at zoom 7 over Jharkhand.
        let (meters, px) = vp.scale_bar(100.0);
        assert_close(meters, 100_000.0, 1e-6);
        assert!(px > 85.0 && px < 95.0, "px = {px}");
        assert_eq!(format_distance(50_000.0), "50 km");
        assert_eq!(format_distance(200.0), "200 m");
    }
}

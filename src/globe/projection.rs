use glam::DVec3;

use crate::geo::{latlng_to_vec3, vec3_to_latlng};

/// Zoom limits, expressed against the world view (zoom 1).
pub const MIN_ZOOM: f64 = 0.4;
pub const MAX_ZOOM: f64 = 10.0;

/// Globe units per globe radius (scene coordinates for stars and arcs).
pub const GLOBE_UNITS: f64 = 100.0;

/// Orthographic view of a rotating sphere, in braille pixels.
/// Orientation is kept as an orthonormal frame so drags compose without
/// gimbal problems.
#[derive(Clone, Debug)]
pub struct GlobeViewport {
    /// Points from the globe centre toward the camera
    forward: DVec3,
    /// Screen-right direction
    right: DVec3,
    /// Screen-up direction
    up: DVec3,
    pub zoom: f64,
    pub width: usize,
    pub height: usize,
}

impl GlobeViewport {
    /// Viewport looking straight down at (lat, lng).
    pub fn new(lat: f64, lng: f64, zoom: f64, width: usize, height: usize) -> Self {
        let mut vp = Self {
            forward: DVec3::X,
            right: DVec3::Y,
            up: DVec3::Z,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            width,
            height,
        };
        vp.look_at(lat, lng);
        vp
    }

    /// Re-orient the frame so (lat, lng) sits at screen centre, north up.
    pub fn look_at(&mut self, lat: f64, lng: f64) {
        let lat = lat.clamp(-89.999, 89.999);
        let lat_rad = lat.to_radians();
        let lng_rad = lng.to_radians();

        let forward = latlng_to_vec3(lat, lng);
        // Derivative of forward w.r.t. latitude points north
        let north = DVec3::new(
            -lat_rad.sin() * lng_rad.cos(),
            -lat_rad.sin() * lng_rad.sin(),
            lat_rad.cos(),
        );
        let right = north.cross(forward).normalize();
        let up = forward.cross(right).normalize();

        self.forward = forward;
        self.right = right;
        self.up = up;
    }

    /// Globe radius in pixels at the current zoom.
    pub fn radius(&self) -> f64 {
        self.width.min(self.height) as f64 * 0.45 * self.zoom
    }

    /// The (lat, lng) at screen centre.
    pub fn center(&self) -> (f64, f64) {
        vec3_to_latlng(self.forward)
    }

    /// Project a surface point; `None` when it is on the far hemisphere.
    pub fn project(&self, lat: f64, lng: f64) -> Option<(i32, i32)> {
        let p = latlng_to_vec3(lat, lng);
        if p.dot(self.forward) < 0.0 {
            return None;
        }
        Some(self.to_screen(p))
    }

    /// Project a point lifted `altitude` globe radii above the surface.
    /// Lifted points stay visible past the limb until the globe hides them.
    pub fn project_lifted(&self, lat: f64, lng: f64, altitude: f64) -> Option<(i32, i32)> {
        self.project_scene(latlng_to_vec3(lat, lng) * (1.0 + altitude) * GLOBE_UNITS)
    }

    /// Project a scene-space point (globe radius = `GLOBE_UNITS`).
    /// Returns `None` when the globe occludes it.
    pub fn project_scene(&self, p: DVec3) -> Option<(i32, i32)> {
        let p = p / GLOBE_UNITS;
        let sx = p.dot(self.right);
        let sy = p.dot(self.up);
        if p.dot(self.forward) < 0.0 && sx * sx + sy * sy < 1.0 {
            return None;
        }
        Some(self.scale(sx, sy))
    }

    fn to_screen(&self, p: DVec3) -> (i32, i32) {
        self.scale(p.dot(self.right), p.dot(self.up))
    }

    fn scale(&self, sx: f64, sy: f64) -> (i32, i32) {
        let r = self.radius();
        let px = (self.width as f64 / 2.0 + sx * r).round() as i32;
        let py = (self.height as f64 / 2.0 - sy * r).round() as i32;
        (px, py)
    }

    /// Screen pixel back to (lat, lng); `None` outside the globe disk.
    pub fn unproject(&self, px: i32, py: i32) -> Option<(f64, f64)> {
        let r = self.radius();
        let sx = (px as f64 - self.width as f64 / 2.0) / r;
        let sy = -(py as f64 - self.height as f64 / 2.0) / r;

        let r2 = sx * sx + sy * sy;
        if r2 > 1.0 {
            return None;
        }

        let sz = (1.0 - r2).sqrt();
        Some(vec3_to_latlng(self.right * sx + self.up * sy + self.forward * sz))
    }

    /// Rotate by a pixel drag so the surface follows the pointer.
    pub fn rotate_drag(&mut self, dx: i32, dy: i32) {
        let r = self.radius().max(1.0);
        self.turn_horizontal(dx as f64 / r);
        self.turn_vertical(-(dy as f64) / r);
    }

    /// Spin about the polar axis (eastward for positive radians).
    pub fn spin(&mut self, radians: f64) {
        if radians.abs() < 1e-12 {
            return;
        }
        let (lat, lng) = self.center();
        self.look_at(lat, lng - radians.to_degrees());
    }

    fn turn_horizontal(&mut self, angle: f64) {
        if angle.abs() < 1e-10 {
            return;
        }
        let (sin_a, cos_a) = angle.sin_cos();
        let forward = self.forward * cos_a + self.right * sin_a;
        let right = self.right * cos_a - self.forward * sin_a;
        self.forward = forward.normalize();
        self.right = right.normalize();
    }

    fn turn_vertical(&mut self, angle: f64) {
        if angle.abs() < 1e-10 {
            return;
        }
        let (sin_a, cos_a) = angle.sin_cos();
        let forward = self.forward * cos_a + self.up * sin_a;
        let up = self.up * cos_a - self.forward * sin_a;
        self.forward = forward.normalize();
        self.up = up.normalize();
    }

    /// Multiply zoom by `factor`, clamped.
    pub fn zoom_by(&mut self, factor: f64) {
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn set_size(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
    }

    /// Rough check that a segment touches the canvas.
    pub fn segment_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        p1.0.max(p2.0) >= 0
            && p1.0.min(p2.0) < self.width as i32
            && p1.1.max(p2.1) >= 0
            && p1.1.min(p2.1) < self.height as i32
    }
}

/// Camera altitude (globe radii above the surface) to viewport zoom.
pub fn altitude_to_zoom(altitude: f64) -> f64 {
    (DEFAULT_ALTITUDE / altitude.max(0.05)).clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Altitude of the world view (zoom 1).
pub const DEFAULT_ALTITUDE: f64 = 2.5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_projects_to_middle() {
        let vp = GlobeViewport::new(35.0, 139.0, 1.0, 200, 100);
        assert_eq!(vp.project(35.0, 139.0), Some((100, 50)));
    }

    #[test]
    fn test_far_side_hidden() {
        let vp = GlobeViewport::new(0.0, 0.0, 1.0, 200, 100);
        assert!(vp.project(0.0, 180.0).is_none());
        assert!(vp.project(0.0, 90.0 - 1.0).is_some());
    }

    #[test]
    fn test_unproject_roundtrip() {
        let vp = GlobeViewport::new(20.0, 10.0, 1.5, 300, 200);
        let (px, py) = vp.project(30.0, 25.0).expect("visible");
        let (lat, lng) = vp.unproject(px, py).expect("on disk");
        assert!((lat - 30.0).abs() < 1.5, "lat {lat}");
        assert!((lng - 25.0).abs() < 1.5, "lng {lng}");
    }

    #[test]
    fn test_north_is_up_east_is_right() {
        let vp = GlobeViewport::new(0.0, 0.0, 1.0, 200, 200);
        let (cx, cy) = vp.project(0.0, 0.0).expect("centre");
        let (_, ny) = vp.project(10.0, 0.0).expect("north");
        let (ex, _) = vp.project(0.0, 10.0).expect("east");
        assert!(ny < cy);
        assert!(ex > cx);
    }

    #[test]
    fn test_spin_moves_center_west() {
        let mut vp = GlobeViewport::new(0.0, 0.0, 1.0, 200, 200);
        vp.spin(10f64.to_radians());
        let (_, lng) = vp.center();
        assert!((lng + 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_zoom_clamped() {
        let mut vp = GlobeViewport::new(0.0, 0.0, 1.0, 200, 200);
        vp.zoom_by(1000.0);
        assert_eq!(vp.zoom, MAX_ZOOM);
        vp.zoom_by(0.0001);
        assert_eq!(vp.zoom, MIN_ZOOM);
    }

    #[test]
    fn test_altitude_mapping() {
        assert!((altitude_to_zoom(DEFAULT_ALTITUDE) - 1.0).abs() < 1e-12);
        assert!(altitude_to_zoom(1.2) > altitude_to_zoom(2.0));
    }

    #[test]
    fn test_star_behind_globe_occluded() {
        let vp = GlobeViewport::new(0.0, 0.0, 1.0, 200, 200);
        assert!(vp.project_scene(DVec3::new(-200.0, 0.0, 0.0)).is_none());
        assert!(vp.project_scene(DVec3::new(-200.0, 0.0, 150.0)).is_some());
    }
}

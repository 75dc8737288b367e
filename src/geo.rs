use glam::DVec3;

/// Wrap a longitude into [-180, 180).
#[inline(always)]
pub fn wrap_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Convert lat/lng (degrees) to a unit sphere vector.
/// Axes: x toward (0°, 0°), y toward (0°, 90°E), z toward the north pole.
#[inline(always)]
pub fn latlng_to_vec3(lat: f64, lng: f64) -> DVec3 {
    let lat_rad = lat.to_radians();
    let lng_rad = lng.to_radians();
    DVec3::new(
        lat_rad.cos() * lng_rad.cos(),
        lat_rad.cos() * lng_rad.sin(),
        lat_rad.sin(),
    )
}

/// Inverse of [`latlng_to_vec3`]; the vector need not be normalized.
#[inline(always)]
pub fn vec3_to_latlng(p: DVec3) -> (f64, f64) {
    let p = p.normalize_or_zero();
    let lat = p.z.clamp(-1.0, 1.0).asin().to_degrees();
    let lng = p.y.atan2(p.x).to_degrees();
    (lat, lng)
}

/// Shortest signed longitude delta from `from` to `to`, in (-180, 180].
pub fn lon_delta(from: f64, to: f64) -> f64 {
    let d = wrap_lon(to - from);
    if d == -180.0 {
        180.0
    } else {
        d
    }
}

/// Great-circle walk from `a` to `b` (lat/lng degrees), calling `visitor`
/// with `(t, lat, lng)` at ~2° steps including both endpoints.
pub fn walk_great_circle(a: (f64, f64), b: (f64, f64), mut visitor: impl FnMut(f64, f64, f64)) {
    let va = latlng_to_vec3(a.0, a.1);
    let vb = latlng_to_vec3(b.0, b.1);

    let angle = va.dot(vb).clamp(-1.0, 1.0).acos();
    let steps = ((angle.to_degrees() / 2.0).ceil() as usize).max(1);
    let sin_angle = angle.sin();

    visitor(0.0, a.0, a.1);
    if sin_angle.abs() < 1e-10 {
        // Identical or antipodal: no unique great circle
        visitor(1.0, b.0, b.1);
        return;
    }

    for i in 1..=steps {
        let t = i as f64 / steps as f64;
        let sa = ((1.0 - t) * angle).sin() / sin_angle;
        let sb = (t * angle).sin() / sin_angle;
        let (lat, lng) = vec3_to_latlng(va * sa + vb * sb);
        visitor(t, lat, lng);
    }
}

/// Point reached by travelling `distance_deg` of arc from (lat, lng) along
/// the initial `bearing` (radians clockwise from north).
pub fn destination(lat: f64, lng: f64, bearing: f64, distance_deg: f64) -> (f64, f64) {
    let lat1 = lat.to_radians();
    let lng1 = lng.to_radians();
    let d = distance_deg.to_radians();

    let lat2 = (lat1.sin() * d.cos() + lat1.cos() * d.sin() * bearing.cos()).asin();
    let lng2 = lng1
        + (bearing.sin() * d.sin() * lat1.cos()).atan2(d.cos() - lat1.sin() * lat2.sin());
    (lat2.to_degrees(), wrap_lon(lng2.to_degrees()))
}

/// Points of a small circle of angular `radius_deg` around a centre.
pub fn small_circle(lat: f64, lng: f64, radius_deg: f64, segments: usize) -> Vec<(f64, f64)> {
    let center = latlng_to_vec3(lat, lng);
    // Any vector not parallel to the centre gives a tangent basis
    let helper = if center.z.abs() < 0.9 { DVec3::Z } else { DVec3::X };
    let east = helper.cross(center).normalize();
    let north = center.cross(east).normalize();
    let (sin_r, cos_r) = radius_deg.to_radians().sin_cos();

    (0..=segments)
        .map(|i| {
            let theta = i as f64 / segments as f64 * std::f64::consts::TAU;
            let dir = east * theta.cos() + north * theta.sin();
            vec3_to_latlng(center * cos_r + dir * sin_r)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_tokyo() {
        let (lat, lng) = vec3_to_latlng(latlng_to_vec3(35.6762, 139.6503));
        assert!((lat - 35.6762).abs() < 1e-9);
        assert!((lng - 139.6503).abs() < 1e-9);
    }

    #[test]
    fn test_lon_delta_takes_short_way() {
        assert!((lon_delta(170.0, -170.0) - 20.0).abs() < 1e-9);
        assert!((lon_delta(-170.0, 170.0) + 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_great_circle_endpoints() {
        let mut pts = Vec::new();
        walk_great_circle((0.0, 0.0), (0.0, 90.0), |t, lat, lng| pts.push((t, lat, lng)));
        assert_eq!(pts.first().map(|p| p.0), Some(0.0));
        let last = pts.last().copied().unwrap_or_default();
        assert_eq!(last.0, 1.0);
        assert!((last.2 - 90.0).abs() < 1e-6);
        assert!(pts.len() > 40);
    }

    #[test]
    fn test_destination_due_north() {
        let (lat, lng) = destination(10.0, 20.0, 0.0, 5.0);
        assert!((lat - 15.0).abs() < 1e-9);
        assert!((lng - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_small_circle_radius() {
        let ring = small_circle(51.5, -0.12, 5.0, 16);
        let c = latlng_to_vec3(51.5, -0.12);
        for (lat, lng) in ring {
            let ang = c.dot(latlng_to_vec3(lat, lng)).clamp(-1.0, 1.0).acos().to_degrees();
            assert!((ang - 5.0).abs() < 1e-6);
        }
    }
}

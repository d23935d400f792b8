use super::GeoPoint;
use cgmath::prelude::*;

/// Segments whose directions differ by less than this sine are treated as parallel.
const PARALLEL_EPSILON: f64 = 1e-9;

/// Slack on the segment parameters so that crossings exactly at an endpoint are kept.
const ENDPOINT_EPSILON: f64 = 1e-9;

/// Finds the point at which two line segments cross.
///
/// Returns the crossing point when the segments properly cross or when one
/// touches the other at an endpoint. Parallel segments never intersect, which
/// includes collinear segments that overlap or share an endpoint; such overlaps
/// come from duplicated path geometry rather than real junctions.
///
/// # Parameters
/// * `a1`, `a2` - The ends of the first segment
/// * `b1`, `b2` - The ends of the second segment
pub fn segments_intersect(
    a1: GeoPoint,
    a2: GeoPoint,
    b1: GeoPoint,
    b2: GeoPoint,
) -> Option<GeoPoint> {
    let (p, q) = (a1.planar(), b1.planar());
    let r = a2.planar() - p;
    let s = b2.planar() - q;

    let (r_len, s_len) = (r.magnitude(), s.magnitude());
    if r_len == 0.0 || s_len == 0.0 {
        return None;
    }

    let denom = r.perp_dot(s);
    if denom.abs() <= PARALLEL_EPSILON * r_len * s_len {
        return None;
    }

    let qp = q - p;
    let t = qp.perp_dot(s) / denom;
    let u = qp.perp_dot(r) / denom;

    let range = -ENDPOINT_EPSILON..=1.0 + ENDPOINT_EPSILON;
    if range.contains(&t) && range.contains(&u) {
        let t = t.clamp(0.0, 1.0);
        Some(GeoPoint::from_planar(p + r * t))
    } else {
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn pt(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon)
    }

    /// Crosses the segments `a` and `b`, given as `(lat, lon)` pairs.
    fn cross(a: [(f64, f64); 2], b: [(f64, f64); 2]) -> Option<GeoPoint> {
        segments_intersect(a[0].into(), a[1].into(), b[0].into(), b[1].into())
    }

    #[test]
    fn proper_crossing() {
        let x = cross([(0.0, 0.0), (0.0, 1.0)], [(-0.5, 0.5), (0.5, 0.5)]).unwrap();
        assert_approx_eq!(x.lat, 0.0, 1e-12);
        assert_approx_eq!(x.lon, 0.5, 1e-12);
    }

    #[test]
    fn crossing_is_symmetric() {
        let (a1, a2) = (pt(0.1, 0.2), pt(0.9, 1.3));
        let (b1, b2) = (pt(1.0, 0.0), pt(0.0, 1.0));
        let x = segments_intersect(a1, a2, b1, b2).unwrap();
        let y = segments_intersect(b1, b2, a1, a2).unwrap();
        assert_approx_eq!(x.lat, y.lat, 1e-12);
        assert_approx_eq!(x.lon, y.lon, 1e-12);
    }

    #[test]
    fn touching_at_endpoint() {
        let x = cross([(0.0, 0.0), (0.0, 1.0)], [(0.0, 1.0), (1.0, 1.0)]).unwrap();
        assert_approx_eq!(x.lat, 0.0, 1e-12);
        assert_approx_eq!(x.lon, 1.0, 1e-12);

        // T junction
        let x = cross([(0.0, 0.0), (0.0, 1.0)], [(0.0, 0.5), (1.0, 0.5)]).unwrap();
        assert_approx_eq!(x.lon, 0.5, 1e-12);
    }

    #[test]
    fn disjoint_segments() {
        assert!(cross([(0.0, 0.0), (0.0, 1.0)], [(0.5, 0.5), (1.0, 0.5)]).is_none());
        assert!(cross([(0.0, 0.0), (1.0, 1.0)], [(2.0, 0.0), (1.6, 0.4)]).is_none());
    }

    #[test]
    fn parallel_segments() {
        assert!(cross([(0.0, 0.0), (0.0, 1.0)], [(0.1, 0.0), (0.1, 1.0)]).is_none());
    }

    #[test]
    fn collinear_overlap_is_not_a_crossing() {
        assert!(cross([(0.0, 0.0), (0.0, 1.0)], [(0.0, 0.5), (0.0, 1.5)]).is_none());
        assert!(cross([(0.0, 0.0), (0.0, 1.0)], [(0.0, 1.0), (0.0, 2.0)]).is_none());
        // Almost, but not exactly, collinear
        assert!(cross([(0.0, 0.0), (0.0, 1.0)], [(1e-13, 0.2), (-1e-13, 0.8)]).is_none());
    }

    #[test]
    fn degenerate_segment() {
        assert!(cross([(0.0, 0.5), (0.0, 0.5)], [(-1.0, 0.5), (1.0, 0.5)]).is_none());
    }
}

use super::Point2d;
use geo::{Centroid, Coord, Distance, Haversine, Length, LineString, MultiPoint, Point};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Kilometres per degree of latitude.
const KM_PER_DEGREE: f64 = 111.32;

/// A geographic coordinate in decimal degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Creates a new point from a latitude and longitude.
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Returns true if both coordinates are finite and within the valid
    /// latitude and longitude ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Projects the point into planar `(lon, lat)` space.
    pub fn planar(&self) -> Point2d {
        Point2d::new(self.lon, self.lat)
    }

    /// The inverse of [GeoPoint::planar].
    pub fn from_planar(point: Point2d) -> Self {
        Self::new(point.y, point.x)
    }

    /// Gets the point as a `geo` coordinate, with `x` as longitude.
    pub fn coord(&self) -> Coord {
        Coord {
            x: self.lon,
            y: self.lat,
        }
    }
}

impl From<(f64, f64)> for GeoPoint {
    fn from((lat, lon): (f64, f64)) -> Self {
        Self::new(lat, lon)
    }
}

impl From<Point> for GeoPoint {
    fn from(point: Point) -> Self {
        Self::new(point.y(), point.x())
    }
}

/// Computes the great-circle distance between two points in km
/// using the haversine formula.
pub fn distance_km(p1: GeoPoint, p2: GeoPoint) -> f64 {
    0.001 * distance_m(p1, p2)
}

/// Computes the great-circle distance between two points in m.
pub fn distance_m(p1: GeoPoint, p2: GeoPoint) -> f64 {
    Haversine.distance(Point(p1.coord()), Point(p2.coord()))
}

/// Sums the haversine distances between consecutive points of a polyline, in km.
pub fn polyline_length_km(points: &[GeoPoint]) -> f64 {
    let line = points.iter().map(GeoPoint::coord).collect::<LineString>();
    0.001 * Haversine.length(&line)
}

/// Computes the planar centroid of a set of points.
/// Returns `None` if the set is empty.
pub fn centroid(points: &[GeoPoint]) -> Option<GeoPoint> {
    let points = points.iter().map(|p| Point(p.coord())).collect::<MultiPoint>();
    points.centroid().map(GeoPoint::from)
}

/// Creates a short two-point segment of roughly `length_km` centred on `centre`,
/// running mostly east-west with a slight north-south tilt.
///
/// Used to turn a single geocoded location into drawable street geometry.
pub fn segment_around(centre: GeoPoint, length_km: f64) -> [GeoPoint; 2] {
    let lat_shift = length_km / KM_PER_DEGREE * 0.3;
    let lon_shift = length_km / (KM_PER_DEGREE * centre.lat.to_radians().cos().abs()) * 0.7;
    [
        GeoPoint::new(centre.lat - 0.5 * lat_shift, centre.lon - 0.5 * lon_shift),
        GeoPoint::new(centre.lat + 0.5 * lat_shift, centre.lon + 0.5 * lon_shift),
    ]
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn one_degree_of_latitude() {
        let d = distance_km(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 0.0));
        assert_approx_eq!(d, 111.195, 1e-3);
        let m = distance_m(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 0.0));
        assert_approx_eq!(m, 1000.0 * d, 1e-6);
    }

    #[test]
    fn sao_paulo_blocks() {
        // Praça da Sé to MASP on Avenida Paulista, about 2.5 km apart
        let se = GeoPoint::new(-23.5503, -46.6342);
        let masp = GeoPoint::new(-23.5614, -46.6559);
        let d = distance_km(se, masp);
        assert!(d > 2.4 && d < 2.6, "distance was {}", d);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = GeoPoint::new(-23.55, -46.63);
        let b = GeoPoint::new(-23.56, -46.65);
        assert_approx_eq!(distance_km(a, b), distance_km(b, a), 1e-12);
        assert_eq!(distance_km(a, a), 0.0);
    }

    #[test]
    fn polyline_length() {
        let points = [
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 0.5),
            GeoPoint::new(0.5, 0.5),
        ];
        let expected = distance_km(points[0], points[1]) + distance_km(points[1], points[2]);
        assert_approx_eq!(polyline_length_km(&points), expected, 1e-12);
        assert_eq!(polyline_length_km(&points[..1]), 0.0);
    }

    #[test]
    fn centroid_of_square() {
        let points = [
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 2.0),
            GeoPoint::new(2.0, 2.0),
            GeoPoint::new(2.0, 0.0),
        ];
        let c = centroid(&points).unwrap();
        assert_approx_eq!(c.lat, 1.0, 1e-12);
        assert_approx_eq!(c.lon, 1.0, 1e-12);
        assert!(centroid(&[]).is_none());
    }

    #[test]
    fn segment_around_is_centred() {
        let centre = GeoPoint::new(-23.55, -46.63);
        let [a, b] = segment_around(centre, 0.3);
        assert_approx_eq!(0.5 * (a.lat + b.lat), centre.lat, 1e-12);
        assert_approx_eq!(0.5 * (a.lon + b.lon), centre.lon, 1e-12);
        let length = distance_km(a, b);
        assert!(length > 0.1 && length < 0.3, "length was {}", length);
    }

    #[test]
    fn validity() {
        assert!(GeoPoint::new(45.0, 90.0).is_valid());
        assert!(!GeoPoint::new(91.0, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, f64::NAN).is_valid());
    }
}

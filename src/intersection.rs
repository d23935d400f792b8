//! Detection of intersections between street polylines.

use crate::math::{centroid, distance_m, segments_intersect, GeoPoint};
use crate::{Street, StreetId};
use itertools::{iproduct, Itertools};
use pathfinding::undirected::connected_components::components;
use slotmap::Key;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Grid spacing used to locate repeated meetings of the same streets, in degrees (about 11 m).
const SITE_DEGREES: f64 = 1e-4;

/// The canonical identity of an intersection.
///
/// Built from the sorted, deduplicated IDs of the streets that meet there, so it
/// does not depend on the order in which streets were added or scanned. When the
/// same streets meet more than once, each meeting point also carries the [Site]
/// it lies in. Whether a site is needed, and which one, depends only on the
/// geometry of those streets, so adding or removing other streets never moves
/// an ID to a different crossing.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IntersectionId {
    streets: SmallVec<[StreetId; 4]>,
    site: Option<Site>,
}

/// A cell of a fixed latitude/longitude grid that tells apart several
/// meeting points of the same streets.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Site {
    lat: i32,
    lon: i32,
    /// Orders meeting points that fall in the same cell.
    rank: u32,
}

/// A point where two or more streets cross.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Intersection {
    /// The intersection ID.
    id: IntersectionId,
    /// The centroid of the merged crossing points.
    point: GeoPoint,
    /// The number of raw segment crossings merged into this intersection.
    crossings: usize,
}

/// A crossing between one segment of each of two streets.
#[derive(Clone, Copy, Debug)]
struct RawCrossing {
    streets: [StreetId; 2],
    point: GeoPoint,
}

impl IntersectionId {
    /// Creates the ID of the only meeting point of the given streets.
    pub fn new(streets: impl IntoIterator<Item = StreetId>) -> Self {
        let mut streets = streets.into_iter().collect::<SmallVec<[_; 4]>>();
        streets.sort_unstable();
        streets.dedup();
        Self {
            streets,
            site: None,
        }
    }

    /// Creates the ID of the meeting point of the given streets located at `point`,
    /// for streets that meet more than once.
    pub fn at(streets: impl IntoIterator<Item = StreetId>, point: GeoPoint) -> Self {
        Self {
            site: Some(Site::containing(point)),
            ..Self::new(streets)
        }
    }

    /// Gets the sorted IDs of the streets that meet here.
    pub fn streets(&self) -> &[StreetId] {
        &self.streets
    }

    /// Gets the site of this meeting point, if the streets meet more than once.
    pub fn site(&self) -> Option<Site> {
        self.site
    }

    /// Returns true if the given street meets at this intersection.
    pub fn contains(&self, street: StreetId) -> bool {
        self.streets.binary_search(&street).is_ok()
    }
}

impl fmt::Display for IntersectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let streets = self.streets.iter().map(|id| format!("{:?}", id.data())).join("+");
        match self.site {
            None => write!(f, "{}", streets),
            Some(site) => write!(f, "{}@{}", streets, site),
        }
    }
}

impl Site {
    /// Gets the cell containing the given point.
    fn containing(point: GeoPoint) -> Self {
        Self {
            lat: (point.lat / SITE_DEGREES).round() as i32,
            lon: (point.lon / SITE_DEGREES).round() as i32,
            rank: 0,
        }
    }

    /// Gets the centre of the cell.
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat as f64 * SITE_DEGREES, self.lon as f64 * SITE_DEGREES)
    }

    /// Gets the rank among meeting points of the same streets in this cell.
    pub fn rank(&self) -> u32 {
        self.rank
    }

    fn same_cell(&self, other: &Site) -> bool {
        (self.lat, self.lon) == (other.lat, other.lon)
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let point = self.point();
        write!(f, "{:.4},{:.4}", point.lat, point.lon)?;
        if self.rank > 0 {
            write!(f, "#{}", self.rank)?;
        }
        Ok(())
    }
}

impl Intersection {
    /// Gets the intersection ID.
    pub fn id(&self) -> &IntersectionId {
        &self.id
    }

    /// Gets the representative location of the intersection.
    pub fn point(&self) -> GeoPoint {
        self.point
    }

    /// Gets the sorted IDs of the streets that meet here.
    pub fn streets(&self) -> &[StreetId] {
        self.id.streets()
    }

    /// Gets the number of raw segment crossings that were merged into this intersection.
    pub fn crossings(&self) -> usize {
        self.crossings
    }
}

/// Finds every intersection between the given streets.
///
/// Every segment of every pair of distinct streets is tested for a crossing, and
/// crossings within `merge_tolerance_m` of each other (transitively) are merged
/// into a single intersection located at their centroid. A street crossing
/// itself does not form an intersection. The result is sorted by ID and does not
/// depend on the order of `streets`.
pub fn find_intersections<'a>(
    streets: impl IntoIterator<Item = &'a Street>,
    merge_tolerance_m: f64,
) -> Vec<Intersection> {
    let mut streets = streets.into_iter().collect::<Vec<_>>();
    streets.sort_by_key(|street| street.id());

    let crossings = raw_crossings(&streets);
    let points = crossings.iter().map(|c| c.point).collect::<Vec<_>>();
    let clusters = cluster_points(&points, merge_tolerance_m);

    let mut located = HashMap::new();
    let mut intersections = clusters
        .into_iter()
        .filter_map(|members| {
            let point = centroid(&members.iter().map(|&i| points[i]).collect::<Vec<_>>())?;
            let mut id = IntersectionId::new(members.iter().flat_map(|&i| crossings[i].streets));
            let sites = located
                .entry(id.streets.clone())
                .or_insert_with(|| locate(&id.streets, &crossings, merge_tolerance_m));
            if sites.len() > 1 {
                id.site = sites
                    .iter()
                    .find(|(cluster, _)| *cluster == members)
                    .map(|&(_, site)| site);
            }
            Some(Intersection {
                id,
                point,
                crossings: members.len(),
            })
        })
        .collect::<Vec<_>>();

    intersections.sort_by(|a, b| {
        a.id.cmp(&b.id)
            .then(a.point.lat.total_cmp(&b.point.lat))
            .then(a.point.lon.total_cmp(&b.point.lon))
    });

    log::debug!(
        "{} streets, {} raw crossings, {} intersections",
        streets.len(),
        crossings.len(),
        intersections.len()
    );

    intersections
}

/// Tests every segment pair of every pair of streets.
/// The streets must be sorted by ID.
fn raw_crossings(streets: &[&Street]) -> Vec<RawCrossing> {
    streets
        .iter()
        .copied()
        .tuple_combinations()
        .flat_map(|(a, b)| {
            iproduct!(a.segments(), b.segments())
                .filter_map(|((a1, a2), (b1, b2))| segments_intersect(a1, a2, b1, b2))
                .map(move |point| RawCrossing {
                    streets: [a.id(), b.id()],
                    point,
                })
        })
        .collect()
}

/// Finds every point where exactly the given streets meet, by clustering only
/// the crossings between those streets.
///
/// Returns the members of each cluster (as indices into `crossings`) with the
/// site of its centroid. A single cluster means the streets meet only once.
fn locate(
    streets: &[StreetId],
    crossings: &[RawCrossing],
    tolerance_m: f64,
) -> Vec<(Vec<usize>, Site)> {
    let subset = (0..crossings.len())
        .filter(|&i| crossings[i].streets.iter().all(|s| streets.binary_search(s).is_ok()))
        .collect::<Vec<_>>();
    let points = subset.iter().map(|&i| crossings[i].point).collect::<Vec<_>>();

    let mut clusters = cluster_points(&points, tolerance_m)
        .into_iter()
        .filter_map(|members| {
            let found = members.iter().flat_map(|&i| crossings[subset[i]].streets);
            if IntersectionId::new(found).streets() != streets {
                return None;
            }
            let point = centroid(&members.iter().map(|&i| points[i]).collect::<Vec<_>>())?;
            Some((members.into_iter().map(|i| subset[i]).collect::<Vec<_>>(), point))
        })
        .collect::<Vec<_>>();
    clusters.sort_by(|(_, a), (_, b)| a.lat.total_cmp(&b.lat).then(a.lon.total_cmp(&b.lon)));

    let mut sites: Vec<(Vec<usize>, Site)> = Vec::with_capacity(clusters.len());
    for (members, point) in clusters {
        let mut site = Site::containing(point);
        site.rank = sites.iter().filter(|(_, other)| other.same_cell(&site)).count() as u32;
        sites.push((members, site));
    }
    sites
}

/// Groups points into clusters, where points closer than `tolerance_m` belong to
/// the same cluster and membership is transitive.
///
/// Returns the indices of each cluster's points in ascending order, with the
/// clusters ordered by their first index.
fn cluster_points(points: &[GeoPoint], tolerance_m: f64) -> Vec<Vec<usize>> {
    let groups = (0..points.len())
        .map(|i| {
            let near = (i + 1..points.len())
                .filter(|&j| distance_m(points[i], points[j]) < tolerance_m);
            std::iter::once(i).chain(near).collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    let mut clusters = components(&groups)
        .into_iter()
        .map(|cluster| cluster.into_iter().sorted().collect::<Vec<_>>())
        .collect::<Vec<_>>();
    clusters.sort_by_key(|cluster| cluster[0]);
    clusters
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::street::StreetAttributes;
    use crate::StreetSet;
    use assert_approx_eq::assert_approx_eq;

    /// About 10 m of latitude, in degrees.
    const TEN_METRES: f64 = 0.00009;

    fn add(streets: &mut StreetSet, points: &[(f64, f64)]) -> StreetId {
        let points = points.iter().map(|&p| GeoPoint::from(p)).collect::<Vec<_>>();
        let attributes = StreetAttributes {
            name: "",
            points: &points,
            vehicles_per_hour: 500.0,
            average_speed_kmh: 50.0,
            lanes: 2,
        };
        streets.insert_with_key(|id| Street::new(id, &attributes))
    }

    #[test]
    fn id_is_canonical() {
        let mut streets = StreetSet::default();
        let a = add(&mut streets, &[(0.0, 0.0), (0.0, 1.0)]);
        let b = add(&mut streets, &[(0.0, 0.0), (1.0, 0.0)]);
        let c = add(&mut streets, &[(0.0, 0.0), (1.0, 1.0)]);
        assert_eq!(IntersectionId::new([c, a, b, a]), IntersectionId::new([a, b, c]));
        assert_eq!(IntersectionId::new([c, a]).streets(), &[a, c]);
        assert!(IntersectionId::new([a, c]).contains(c));
        assert!(!IntersectionId::new([a, c]).contains(b));
        let here = GeoPoint::new(0.0, 0.2);
        assert_ne!(IntersectionId::new([a, b]), IntersectionId::at([a, b], here));
        assert_eq!(IntersectionId::at([b, a], here), IntersectionId::at([a, b], here));
        assert_eq!(IntersectionId::at([a, b], here).site().map(|s| s.rank()), Some(0));
    }

    #[test]
    fn id_display() {
        let mut streets = StreetSet::default();
        let a = add(&mut streets, &[(0.0, 0.0), (0.0, 1.0)]);
        let b = add(&mut streets, &[(0.0, 0.0), (1.0, 0.0)]);
        assert_eq!(IntersectionId::new([b, a]).to_string(), "1v1+2v1");
        let masp = GeoPoint::new(-23.5614, -46.6559);
        assert_eq!(IntersectionId::at([a, b], masp).to_string(), "1v1+2v1@-23.5614,-46.6559");
    }

    #[test]
    fn chained_points_merge() {
        let points = [
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(2.0 * TEN_METRES, 0.0),
            GeoPoint::new(TEN_METRES, 0.0),
            GeoPoint::new(1.0, 1.0),
        ];
        assert_eq!(cluster_points(&points, 15.0), vec![vec![0, 1, 2], vec![3]]);
        assert_eq!(
            cluster_points(&points, 5.0),
            vec![vec![0], vec![1], vec![2], vec![3]]
        );
        assert!(cluster_points(&[], 15.0).is_empty());
    }

    #[test]
    fn self_crossing_is_ignored() {
        let mut streets = StreetSet::default();
        add(
            &mut streets,
            &[(0.0, 0.0), (1.0, 1.0), (1.0, 0.0), (0.0, 1.0)],
        );
        assert!(find_intersections(streets.values(), 15.0).is_empty());
    }

    #[test]
    fn crossing_at_a_vertex_counts_once() {
        let mut streets = StreetSet::default();
        let a = add(&mut streets, &[(0.0, 0.0), (0.0, 1.0)]);
        let b = add(&mut streets, &[(-1.0, 0.5), (0.0, 0.5), (1.0, 0.5)]);
        let found = find_intersections(streets.values(), 15.0);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), &IntersectionId::new([a, b]));
        assert_eq!(found[0].crossings(), 2);
        assert_approx_eq!(found[0].point().lon, 0.5, 1e-12);
    }

    #[test]
    fn repeated_meetings_get_distinct_ids() {
        let mut streets = StreetSet::default();
        let a = add(&mut streets, &[(0.0, 0.0), (0.0, 1.0)]);
        let b = add(
            &mut streets,
            &[(-0.1, 0.2), (0.1, 0.2), (0.1, 0.8), (-0.1, 0.8)],
        );
        let found = find_intersections(streets.values(), 15.0);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id(), &IntersectionId::at([a, b], GeoPoint::new(0.0, 0.2)));
        assert_eq!(found[1].id(), &IntersectionId::at([a, b], GeoPoint::new(0.0, 0.8)));
        assert_approx_eq!(found[0].point().lon, 0.2, 1e-12);
        assert_approx_eq!(found[1].point().lon, 0.8, 1e-12);
    }

    #[test]
    fn three_streets_through_one_point() {
        let mut streets = StreetSet::default();
        let a = add(&mut streets, &[(0.0, -1.0), (0.0, 1.0)]);
        let b = add(&mut streets, &[(-1.0, 0.0), (1.0, 0.0)]);
        let c = add(&mut streets, &[(-1.0, -1.0), (1.0, 1.0)]);
        let found = find_intersections(streets.values(), 15.0);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].streets(), &[a, b, c]);
        assert_eq!(found[0].crossings(), 3);
    }

    #[test]
    fn repeated_meeting_ids_ignore_other_streets() {
        let mut streets = StreetSet::default();
        let a = add(&mut streets, &[(0.0, 0.0), (0.0, 1.0)]);
        let b = add(
            &mut streets,
            &[(-0.1, 0.2), (0.1, 0.2), (0.1, 0.8), (-0.1, 0.8)],
        );
        let before = find_intersections(streets.values(), 15.0);

        // Joins the first meeting point only
        let c = add(&mut streets, &[(-0.05, 0.15), (0.05, 0.25)]);
        let after = find_intersections(streets.values(), 15.0);
        assert_eq!(after.len(), 2);
        assert_eq!(after[0].id(), before[1].id());
        assert_approx_eq!(after[0].point().lon, 0.8, 1e-12);
        assert_eq!(after[1].streets(), &[a, b, c]);
        assert!(after[1].id().site().is_none());

        streets.remove(c);
        assert_eq!(find_intersections(streets.values(), 15.0), before);
    }

    #[test]
    fn meeting_points_in_one_cell_are_ranked() {
        let mut streets = StreetSet::default();
        let a = add(&mut streets, &[(0.0, 0.0), (0.0, 1.0)]);
        let b = add(&mut streets, &[(0.0, 0.0), (1.0, 0.0)]);

        // A lone crossing at the origin, ringed by crossings 25 m away
        let ring = (0..12).map(|i| {
            let angle = i as f64 * std::f64::consts::PI / 6.0;
            GeoPoint::new(0.000225 * angle.sin(), 0.000225 * angle.cos())
        });
        let crossings = std::iter::once(GeoPoint::new(0.0, 0.0))
            .chain(ring)
            .map(|point| RawCrossing {
                streets: [a, b],
                point,
            })
            .collect::<Vec<_>>();

        let sites = locate(&[a, b], &crossings, 15.0);
        assert_eq!(sites.len(), 2);
        assert!(sites[0].1.same_cell(&sites[1].1));
        assert_eq!(sites[0].1.point(), GeoPoint::new(0.0, 0.0));
        let mut ranks = sites.iter().map(|(_, site)| site.rank()).collect::<Vec<_>>();
        ranks.sort_unstable();
        assert_eq!(ranks, vec![0, 1]);
        assert_ne!(sites[0].1, sites[1].1);
    }

    #[test]
    fn nearby_crossings_of_different_pairs_merge() {
        let mut streets = StreetSet::default();
        let a = add(&mut streets, &[(0.0, -1.0), (0.0, 1.0)]);
        let b = add(&mut streets, &[(-1.0, 0.0), (1.0, 0.0)]);
        let c = add(&mut streets, &[(-1.0, TEN_METRES), (1.0, TEN_METRES)]);
        let found = find_intersections(streets.values(), 15.0);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), &IntersectionId::new([a, b, c]));
        assert_eq!(found[0].crossings(), 2);
        assert_approx_eq!(found[0].point().lat, 0.0, 1e-12);
        assert_approx_eq!(found[0].point().lon, 0.5 * TEN_METRES, 1e-12);
    }
}

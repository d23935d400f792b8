use crate::error::{Error, Result};
use crate::flow::{self, FlowReport};
use crate::impact::{self, CandidateSignal, ImpactAnalysis};
use crate::intersection::{find_intersections, Intersection, IntersectionId};
use crate::light::{SignalRegistry, SignalTiming, TrafficLight};
use crate::params::Params;
use crate::street::{ImportedStreet, Street, StreetAttributes};
use crate::{StreetId, StreetSet};

/// A road network: streets, the traffic lights placed on them, and the
/// parameters used to analyse them.
///
/// Intersections are not stored. They are derived from the street geometry
/// each time they are needed, so they can never be stale.
#[derive(Clone, Debug, Default)]
pub struct Network {
    /// The streets in the network.
    streets: StreetSet,
    /// The traffic lights.
    signals: SignalRegistry,
    /// Tolerances, limits and model constants.
    params: Params,
}

impl Network {
    /// Creates an empty network with the default parameters.
    pub fn new() -> Self {
        Default::default()
    }

    /// Creates an empty network with the given parameters.
    pub fn with_params(params: Params) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    /// Gets the network's parameters.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Adds a street to the network.
    ///
    /// Nothing is stored if the street is invalid.
    pub fn add_street(&mut self, attributes: &StreetAttributes) -> Result<StreetId> {
        attributes.validate(&self.params.network)?;
        let limit = self.params.network.max_streets;
        if self.streets.len() >= limit {
            log::warn!(
                "Rejected street {:?}: network already holds {} streets",
                attributes.name,
                limit
            );
            return Err(Error::LimitExceeded {
                what: "streets",
                limit,
            });
        }
        let id = self.streets.insert_with_key(|id| Street::new(id, attributes));
        log::debug!(
            "Added street {:?} ({:?}), {:.3} km",
            attributes.name,
            id,
            self.streets[id].length_km()
        );
        Ok(id)
    }

    /// Adds a street supplied by a geocoding collaborator.
    pub fn import_street(&mut self, street: &ImportedStreet) -> Result<StreetId> {
        self.add_street(&street.attributes())
    }

    /// Removes a street from the network, along with every traffic light on
    /// the street or at an intersection it forms part of.
    pub fn remove_street(&mut self, id: StreetId) -> Result<Street> {
        let street = self.streets.remove(id).ok_or(Error::StreetNotFound(id))?;
        let lights = self
            .signals
            .remove_where(|intersection, approach| approach == id || intersection.contains(id));
        log::debug!("Removed street {:?} ({:?}) and {} traffic lights", street.name(), id, lights);
        Ok(street)
    }

    /// Gets a reference to the street with the given ID.
    pub fn get_street(&self, id: StreetId) -> Result<&Street> {
        self.streets.get(id).ok_or(Error::StreetNotFound(id))
    }

    /// Returns an iterator over all the streets in the network.
    pub fn iter_streets(&self) -> impl Iterator<Item = &Street> {
        self.streets.values()
    }

    /// Gets the number of streets in the network.
    pub fn street_count(&self) -> usize {
        self.streets.len()
    }

    /// Finds all intersections between the streets of the network.
    pub fn find_intersections(&self) -> Vec<Intersection> {
        find_intersections(self.streets.values(), self.params.network.merge_tolerance_m)
    }

    /// Finds the intersection with the given ID.
    pub fn intersection(&self, id: &IntersectionId) -> Result<Intersection> {
        if !id.streets().iter().all(|street| self.streets.contains_key(*street)) {
            return Err(Error::UnknownIntersection(id.clone()));
        }
        self.find_intersections()
            .into_iter()
            .find(|intersection| intersection.id() == id)
            .ok_or_else(|| Error::UnknownIntersection(id.clone()))
    }

    /// Finds the intersections that the given street forms part of.
    pub fn intersections_for(&self, street: StreetId) -> Result<Vec<Intersection>> {
        self.get_street(street)?;
        Ok(self
            .find_intersections()
            .into_iter()
            .filter(|intersection| intersection.id().contains(street))
            .collect())
    }

    /// Places a traffic light on one street's approach to an intersection.
    pub fn add_light(
        &mut self,
        intersection: IntersectionId,
        street: StreetId,
        cycle_time_s: f64,
        green_time_s: f64,
    ) -> Result<()> {
        let timing = SignalTiming::new(cycle_time_s, green_time_s, &self.params.network)?;
        self.intersection(&intersection)?;
        if !intersection.contains(street) {
            return Err(Error::StreetNotAtIntersection {
                intersection,
                street,
            });
        }
        log::debug!(
            "Adding traffic light for {:?} at {}: cycle {} s, green {} s",
            street,
            intersection,
            cycle_time_s,
            green_time_s
        );
        self.signals.insert(intersection, street, timing)
    }

    /// Removes the traffic light from one street's approach to an intersection.
    pub fn remove_light(
        &mut self,
        intersection: &IntersectionId,
        street: StreetId,
    ) -> Result<SignalTiming> {
        let timing = self.signals.remove(intersection, street)?;
        log::debug!("Removed traffic light for {:?} at {}", street, intersection);
        Ok(timing)
    }

    /// Lists the traffic lights, optionally only those at one intersection.
    pub fn list_lights(&self, intersection: Option<&IntersectionId>) -> Vec<TrafficLight> {
        self.signals.list(intersection)
    }

    /// Returns true if any traffic light controls the given street.
    pub fn has_light(&self, street: StreetId) -> bool {
        self.signals.controls_street(street)
    }

    /// Gets the traffic lights of the network.
    pub fn signals(&self) -> &SignalRegistry {
        &self.signals
    }

    pub(crate) fn streets(&self) -> &StreetSet {
        &self.streets
    }

    /// Computes traffic flow at every intersection of the network.
    pub fn simulate_flow(&self) -> FlowReport {
        flow::simulate(&self.find_intersections(), &self.streets, &self.signals, &self.params.flow)
    }

    /// Compares flow at an intersection with and without a candidate traffic light.
    ///
    /// If no candidate is given, one with the default timing is placed on the
    /// busiest street that has no light yet.
    pub fn analyze_intersection(
        &self,
        intersection: &IntersectionId,
        candidate: Option<CandidateSignal>,
    ) -> Result<ImpactAnalysis> {
        impact::analyze(self, intersection, candidate)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::GeoPoint;
    use crate::params::NetworkParams;

    fn attributes(points: &[GeoPoint]) -> StreetAttributes<'_> {
        StreetAttributes {
            name: "Rua da Consolação",
            points,
            vehicles_per_hour: 500.0,
            average_speed_kmh: 50.0,
            lanes: 2,
        }
    }

    fn crossing_pair(network: &mut Network) -> (StreetId, StreetId, IntersectionId) {
        let a = network
            .add_street(&attributes(&[GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0)]))
            .unwrap();
        let b = network
            .add_street(&attributes(&[GeoPoint::new(-0.5, 0.5), GeoPoint::new(0.5, 0.5)]))
            .unwrap();
        (a, b, IntersectionId::new([a, b]))
    }

    #[test]
    fn invalid_street_stores_nothing() {
        let mut network = Network::new();
        let points = [GeoPoint::new(0.0, 0.0)];
        assert!(network.add_street(&attributes(&points)).is_err());
        assert_eq!(network.street_count(), 0);
    }

    #[test]
    fn street_limit() {
        let mut network = Network::with_params(Params {
            network: NetworkParams {
                max_streets: 1,
                ..Default::default()
            },
            ..Default::default()
        });
        let points = [GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0)];
        network.add_street(&attributes(&points)).unwrap();
        assert_eq!(
            network.add_street(&attributes(&points)),
            Err(Error::LimitExceeded {
                what: "streets",
                limit: 1
            })
        );
    }

    #[test]
    fn remove_unknown_street() {
        let mut network = Network::new();
        let (a, _, _) = crossing_pair(&mut network);
        network.remove_street(a).unwrap();
        assert_eq!(network.remove_street(a), Err(Error::StreetNotFound(a)));
        assert!(network.get_street(a).is_err());
    }

    #[test]
    fn light_errors() {
        let mut network = Network::new();
        let (a, b, id) = crossing_pair(&mut network);
        let c = network
            .add_street(&attributes(&[GeoPoint::new(5.0, 5.0), GeoPoint::new(6.0, 6.0)]))
            .unwrap();

        assert!(matches!(
            network.add_light(id.clone(), a, 60.0, 60.0),
            Err(Error::InvalidTiming { .. })
        ));
        assert_eq!(
            network.add_light(IntersectionId::new([a, c]), a, 90.0, 45.0),
            Err(Error::UnknownIntersection(IntersectionId::new([a, c])))
        );
        assert_eq!(
            network.add_light(id.clone(), c, 90.0, 45.0),
            Err(Error::StreetNotAtIntersection {
                intersection: id.clone(),
                street: c
            })
        );
        network.add_light(id.clone(), b, 90.0, 45.0).unwrap();
        assert!(matches!(
            network.add_light(id.clone(), b, 60.0, 30.0),
            Err(Error::DuplicateLight { .. })
        ));
        assert!(network.has_light(b));
        assert!(!network.has_light(a));
        assert!(network.remove_light(&id, a).unwrap_err().is_not_found());
    }

    #[test]
    fn removing_a_street_removes_its_lights() {
        let mut network = Network::new();
        let (a, b, id) = crossing_pair(&mut network);
        network.add_light(id.clone(), a, 90.0, 45.0).unwrap();
        network.add_light(id.clone(), b, 90.0, 45.0).unwrap();

        network.remove_street(a).unwrap();
        assert!(network.list_lights(None).is_empty());
        assert!(network.find_intersections().is_empty());
        assert!(network.intersection(&id).is_err());
    }

    #[test]
    fn intersections_for_street() {
        let mut network = Network::new();
        let (a, _, id) = crossing_pair(&mut network);
        let c = network
            .add_street(&attributes(&[GeoPoint::new(5.0, 5.0), GeoPoint::new(6.0, 6.0)]))
            .unwrap();
        let found = network.intersections_for(a).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), &id);
        assert!(network.intersections_for(c).unwrap().is_empty());
    }
}

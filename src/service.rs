//! The operations offered to a request layer, over a shared network.
//!
//! Mutations take the network's write lock. Queries take the read lock, so
//! they run concurrently with each other and each sees a consistent snapshot
//! for its whole duration.

use crate::error::Result;
use crate::flow::FlowReport;
use crate::impact::{CandidateSignal, ImpactAnalysis};
use crate::intersection::{Intersection, IntersectionId};
use crate::light::TrafficLight;
use crate::math::GeoPoint;
use crate::params::Params;
use crate::street::{ImportedStreet, Street, StreetAttributes};
use crate::{Network, StreetId};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A street as listed to clients.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StreetListing {
    pub street: Street,
    pub has_traffic_light: bool,
}

/// The outcome of importing a street.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ImportOutcome {
    pub street_id: StreetId,
    /// The intersections the imported street forms with existing streets.
    pub intersections: Vec<Intersection>,
}

/// A thread-safe handle to a [Network].
#[derive(Debug, Default)]
pub struct TrafficService {
    network: RwLock<Network>,
}

impl TrafficService {
    /// Creates a service over an empty network with the default parameters.
    pub fn new() -> Self {
        Default::default()
    }

    /// Creates a service over an empty network with the given parameters.
    pub fn with_params(params: Params) -> Self {
        Self::from_network(Network::with_params(params))
    }

    /// Creates a service over an existing network.
    pub fn from_network(network: Network) -> Self {
        Self {
            network: RwLock::new(network),
        }
    }

    /// Consumes the service, returning the network.
    pub fn into_network(self) -> Network {
        self.network.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every operation leaves the network valid even if it panics part way,
    /// so a poisoned lock is still usable.
    fn read(&self) -> RwLockReadGuard<'_, Network> {
        self.network.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Network> {
        self.network.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn create_street(
        &self,
        name: &str,
        points: &[GeoPoint],
        vehicles_per_hour: f64,
        average_speed_kmh: f64,
        lanes: u32,
    ) -> Result<StreetId> {
        self.write().add_street(&StreetAttributes {
            name,
            points,
            vehicles_per_hour,
            average_speed_kmh,
            lanes,
        })
    }

    /// Stores an imported street and reports the intersections it forms.
    pub fn import_street(&self, street: &ImportedStreet) -> Result<ImportOutcome> {
        let mut network = self.write();
        let street_id = network.import_street(street)?;
        let intersections = network.intersections_for(street_id)?;
        Ok(ImportOutcome {
            street_id,
            intersections,
        })
    }

    pub fn list_streets(&self) -> Vec<StreetListing> {
        let network = self.read();
        let mut streets = network
            .iter_streets()
            .map(|street| StreetListing {
                street: street.clone(),
                has_traffic_light: network.has_light(street.id()),
            })
            .collect::<Vec<_>>();
        streets.sort_by_key(|listing| listing.street.id());
        streets
    }

    pub fn get_street(&self, id: StreetId) -> Result<Street> {
        self.read().get_street(id).cloned()
    }

    pub fn delete_street(&self, id: StreetId) -> Result<()> {
        self.write().remove_street(id).map(|_| ())
    }

    pub fn find_intersections(&self) -> Vec<Intersection> {
        self.read().find_intersections()
    }

    pub fn add_signal(
        &self,
        intersection: IntersectionId,
        street: StreetId,
        cycle_time_s: f64,
        green_time_s: f64,
    ) -> Result<()> {
        self.write().add_light(intersection, street, cycle_time_s, green_time_s)
    }

    pub fn remove_signal(&self, intersection: &IntersectionId, street: StreetId) -> Result<()> {
        self.write().remove_light(intersection, street).map(|_| ())
    }

    pub fn list_signals(&self, intersection: Option<&IntersectionId>) -> Vec<TrafficLight> {
        self.read().list_lights(intersection)
    }

    pub fn simulate_flow(&self) -> FlowReport {
        self.read().simulate_flow()
    }

    pub fn analyze_intersection(
        &self,
        intersection: &IntersectionId,
        candidate: Option<CandidateSignal>,
    ) -> Result<ImpactAnalysis> {
        self.read().analyze_intersection(intersection, candidate)
    }
}

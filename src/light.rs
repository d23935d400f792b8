use crate::error::{Error, Result};
use crate::params::NetworkParams;
use crate::{IntersectionId, StreetId};
use std::collections::BTreeMap;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The fixed timing of a traffic light on one approach.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SignalTiming {
    /// The total signal period in s.
    cycle_time_s: f64,
    /// The portion of the cycle during which the approach has right of way, in s.
    green_time_s: f64,
}

/// A traffic light controlling one street's approach to an intersection.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrafficLight {
    pub intersection_id: IntersectionId,
    pub street_id: StreetId,
    pub timing: SignalTiming,
}

/// Looks up the signal timing of an approach, if it is signalized.
pub trait SignalLookup {
    fn timing(&self, intersection: &IntersectionId, street: StreetId) -> Option<SignalTiming>;
}

/// The traffic lights of a network, at most one per intersection and street.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SignalRegistry {
    lights: BTreeMap<IntersectionId, BTreeMap<StreetId, SignalTiming>>,
}

impl SignalTiming {
    /// Creates a signal timing, which must satisfy `0 < green < cycle`
    /// with both times inside the configured bounds.
    pub fn new(cycle_time_s: f64, green_time_s: f64, params: &NetworkParams) -> Result<Self> {
        let valid = green_time_s > 0.0
            && green_time_s < cycle_time_s
            && params.cycle_bounds.contains(cycle_time_s)
            && params.green_bounds.contains(green_time_s);
        if valid {
            Ok(Self {
                cycle_time_s,
                green_time_s,
            })
        } else {
            Err(Error::InvalidTiming {
                cycle_time_s,
                green_time_s,
            })
        }
    }

    /// Gets the cycle time in s.
    pub fn cycle_time_s(&self) -> f64 {
        self.cycle_time_s
    }

    /// Gets the green time in s.
    pub fn green_time_s(&self) -> f64 {
        self.green_time_s
    }

    /// Gets the red time in s.
    pub fn red_time_s(&self) -> f64 {
        self.cycle_time_s - self.green_time_s
    }

    /// The effective green ratio, g/c.
    pub fn green_ratio(&self) -> f64 {
        self.green_time_s / self.cycle_time_s
    }
}

impl SignalRegistry {
    /// Adds a light; fails if the approach already has one.
    pub(crate) fn insert(
        &mut self,
        intersection: IntersectionId,
        street: StreetId,
        timing: SignalTiming,
    ) -> Result<()> {
        let approaches = self.lights.entry(intersection.clone()).or_default();
        if approaches.contains_key(&street) {
            return Err(Error::DuplicateLight {
                intersection,
                street,
            });
        }
        approaches.insert(street, timing);
        Ok(())
    }

    /// Removes a light and returns its timing.
    pub(crate) fn remove(
        &mut self,
        intersection: &IntersectionId,
        street: StreetId,
    ) -> Result<SignalTiming> {
        let approaches = self.lights.get_mut(intersection);
        let timing = approaches.and_then(|approaches| approaches.remove(&street));
        let timing = timing.ok_or_else(|| Error::LightNotFound {
            intersection: intersection.clone(),
            street,
        })?;
        if self.lights.get(intersection).map_or(false, BTreeMap::is_empty) {
            self.lights.remove(intersection);
        }
        Ok(timing)
    }

    /// Removes every light for which `remove` returns true.
    /// Returns the number of lights removed.
    pub(crate) fn remove_where(
        &mut self,
        mut remove: impl FnMut(&IntersectionId, StreetId) -> bool,
    ) -> usize {
        let mut count = 0;
        for (intersection, approaches) in &mut self.lights {
            approaches.retain(|street, _| {
                let removed = remove(intersection, *street);
                count += removed as usize;
                !removed
            });
        }
        self.lights.retain(|_, approaches| !approaches.is_empty());
        count
    }

    /// Returns the lights, optionally only those at one intersection,
    /// ordered by intersection and then street.
    pub fn list(&self, intersection: Option<&IntersectionId>) -> Vec<TrafficLight> {
        self.lights
            .iter()
            .filter(|(id, _)| intersection.map_or(true, |wanted| wanted == *id))
            .flat_map(|(id, approaches)| {
                approaches.iter().map(move |(street, timing)| TrafficLight {
                    intersection_id: id.clone(),
                    street_id: *street,
                    timing: *timing,
                })
            })
            .collect()
    }

    /// Returns true if any light controls the given street.
    pub fn controls_street(&self, street: StreetId) -> bool {
        self.lights
            .values()
            .any(|approaches| approaches.contains_key(&street))
    }

    /// Gets the number of lights.
    pub fn len(&self) -> usize {
        self.lights.values().map(BTreeMap::len).sum()
    }

    /// Returns true if there are no lights.
    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }
}

impl SignalLookup for SignalRegistry {
    fn timing(&self, intersection: &IntersectionId, street: StreetId) -> Option<SignalTiming> {
        self.lights.get(intersection)?.get(&street).copied()
    }
}

use crate::error::{Error, Result};
use crate::math::{polyline_length_km, segment_around, GeoPoint};
use crate::params::NetworkParams;
use crate::StreetId;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Suggested volume for an imported street, in veh/h.
const IMPORT_VEHICLES_PER_HOUR: f64 = 800.0;

/// Suggested average speed for an imported street, in km/h.
const IMPORT_AVERAGE_SPEED_KMH: f64 = 50.0;

/// Suggested lane count for an imported street.
const IMPORT_LANES: u32 = 2;

/// A street drawn as a polyline, together with its traffic attributes.
///
/// Streets are immutable once added to a [Network](crate::Network).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Street {
    /// The street ID.
    id: StreetId,
    /// The display name.
    name: String,
    /// The centre line, as an ordered sequence of at least two points.
    points: Vec<GeoPoint>,
    /// The demand in veh/h.
    vehicles_per_hour: f64,
    /// The average travel speed in km/h.
    average_speed_kmh: f64,
    /// The number of lanes.
    lanes: u32,
    /// The haversine length of the centre line in km.
    length_km: f64,
}

/// The attributes of a street.
///
/// Request layers conventionally default to 500 veh/h, 50 km/h and two lanes
/// when a drawn street omits them.
#[derive(Clone, Copy, Debug)]
pub struct StreetAttributes<'a> {
    /// The display name.
    pub name: &'a str,
    /// The centre line of the street.
    pub points: &'a [GeoPoint],
    /// The demand in veh/h; must be positive.
    pub vehicles_per_hour: f64,
    /// The average travel speed in km/h; must be positive.
    pub average_speed_kmh: f64,
    /// The number of lanes; must be at least one.
    pub lanes: u32,
}

/// A street supplied by a geocoding collaborator, with suggested traffic attributes.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ImportedStreet {
    pub name: String,
    pub points: Vec<GeoPoint>,
    pub vehicles_per_hour: f64,
    pub average_speed_kmh: f64,
    pub lanes: u32,
}

impl Street {
    /// Creates a street from attributes that have already been validated.
    pub(crate) fn new(id: StreetId, attributes: &StreetAttributes) -> Self {
        Self {
            id,
            name: attributes.name.to_owned(),
            points: attributes.points.to_vec(),
            vehicles_per_hour: attributes.vehicles_per_hour,
            average_speed_kmh: attributes.average_speed_kmh,
            lanes: attributes.lanes,
            length_km: polyline_length_km(attributes.points),
        }
    }

    /// Gets the street ID.
    pub fn id(&self) -> StreetId {
        self.id
    }

    /// Gets the display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the points of the centre line.
    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    /// Iterates over the segments of the centre line.
    pub fn segments(&self) -> impl Iterator<Item = (GeoPoint, GeoPoint)> + Clone + '_ {
        self.points.windows(2).map(|pair| (pair[0], pair[1]))
    }

    /// Gets the demand in veh/h.
    pub fn vehicles_per_hour(&self) -> f64 {
        self.vehicles_per_hour
    }

    /// Gets the average speed in km/h.
    pub fn average_speed_kmh(&self) -> f64 {
        self.average_speed_kmh
    }

    /// Gets the number of lanes.
    pub fn lanes(&self) -> u32 {
        self.lanes
    }

    /// Gets the length of the street in km.
    pub fn length_km(&self) -> f64 {
        self.length_km
    }

    /// The time taken to traverse the street at its average speed, in s.
    pub fn free_flow_travel_time_s(&self) -> f64 {
        3600.0 * self.length_km / self.average_speed_kmh
    }
}

impl<'a> StreetAttributes<'a> {
    /// Checks the geometry and the traffic attributes against the network's rules.
    pub fn validate(&self, params: &NetworkParams) -> Result<()> {
        if self.points.len() < 2 {
            return Err(Error::InvalidGeometry("a street needs at least two points"));
        }
        if self.points.len() > params.max_points_per_street {
            return Err(Error::LimitExceeded {
                what: "points in a street",
                limit: params.max_points_per_street,
            });
        }
        if !self.points.iter().all(GeoPoint::is_valid) {
            return Err(Error::InvalidGeometry("coordinates out of range"));
        }
        if self.points.iter().all(|p| *p == self.points[0]) {
            return Err(Error::InvalidGeometry("all points are identical"));
        }
        check_positive("vehicles_per_hour", self.vehicles_per_hour)?;
        check_positive("average_speed_kmh", self.average_speed_kmh)?;
        if self.lanes < 1 {
            return Err(Error::InvalidAttribute {
                name: "lanes",
                value: self.lanes as f64,
            });
        }
        Ok(())
    }
}

impl ImportedStreet {
    /// Creates an import with the suggested traffic attributes.
    pub fn new(name: impl Into<String>, points: Vec<GeoPoint>) -> Self {
        Self {
            name: name.into(),
            points,
            vehicles_per_hour: IMPORT_VEHICLES_PER_HOUR,
            average_speed_kmh: IMPORT_AVERAGE_SPEED_KMH,
            lanes: IMPORT_LANES,
        }
    }

    /// Creates an import from a single geocoded location, as a short segment around it.
    pub fn around(name: impl Into<String>, centre: GeoPoint, length_km: f64) -> Self {
        Self::new(name, segment_around(centre, length_km).to_vec())
    }

    /// Borrows the import as ordinary street attributes.
    pub fn attributes(&self) -> StreetAttributes<'_> {
        StreetAttributes {
            name: &self.name,
            points: &self.points,
            vehicles_per_hour: self.vehicles_per_hour,
            average_speed_kmh: self.average_speed_kmh,
            lanes: self.lanes,
        }
    }
}

fn check_positive(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidAttribute { name, value })
    }
}

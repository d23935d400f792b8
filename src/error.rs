use crate::{IntersectionId, StreetId};
use thiserror::Error;

/// Errors returned by operations on a [Network](crate::Network).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid street geometry: {0}")]
    InvalidGeometry(&'static str),
    #[error("Invalid street attribute `{name}`: {value}")]
    InvalidAttribute { name: &'static str, value: f64 },
    #[error("Invalid signal timing: cycle {cycle_time_s} s, green {green_time_s} s")]
    InvalidTiming { cycle_time_s: f64, green_time_s: f64 },
    #[error("A traffic light already controls street {street:?} at intersection {intersection}")]
    DuplicateLight {
        intersection: IntersectionId,
        street: StreetId,
    },
    #[error("Unknown intersection {0}")]
    UnknownIntersection(IntersectionId),
    #[error("Street {0:?} not found")]
    StreetNotFound(StreetId),
    #[error("No traffic light controls street {street:?} at intersection {intersection}")]
    LightNotFound {
        intersection: IntersectionId,
        street: StreetId,
    },
    #[error("Street {street:?} does not meet intersection {intersection}")]
    StreetNotAtIntersection {
        intersection: IntersectionId,
        street: StreetId,
    },
    #[error("Too many {what}: the limit is {limit}")]
    LimitExceeded { what: &'static str, limit: usize },
}

impl Error {
    /// Returns true for the errors caused by referring to something that does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::UnknownIntersection(_)
                | Error::StreetNotFound(_)
                | Error::LightNotFound { .. }
                | Error::StreetNotAtIntersection { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

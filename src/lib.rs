//! Street network modelling and traffic flow analysis.
//!
//! A [Network] holds streets drawn as polylines and the traffic lights placed
//! on them. Intersections are derived from the street geometry, and the flow
//! through each one is estimated from demand, capacity and signal timing.
//! [Network::analyze_intersection] predicts the effect of adding a light.

pub use cgmath;
pub use error::{Error, Result};
pub use flow::{
    Control, FlowEfficiency, FlowReport, FlowResult, FlowStatus, IntersectionFlowResult,
    LevelOfService, OverallFlow,
};
pub use impact::{CandidateSignal, ImpactAnalysis, Recommendation};
pub use intersection::{find_intersections, Intersection, IntersectionId, Site};
pub use light::{SignalLookup, SignalRegistry, SignalTiming, TrafficLight};
pub use math::GeoPoint;
pub use network::Network;
pub use params::Params;
pub use service::{ImportOutcome, StreetListing, TrafficService};
use slotmap::{new_key_type, SlotMap};
pub use slotmap::{Key, KeyData};
pub use street::{ImportedStreet, Street, StreetAttributes};
pub use util::Interval;

mod error;
pub mod flow;
mod impact;
mod intersection;
mod light;
pub mod math;
mod network;
pub mod params;
mod service;
mod street;
mod util;

new_key_type! {
    /// Unique ID of a [Street].
    pub struct StreetId;
}

type StreetSet = SlotMap<StreetId, Street>;

//! Macroscopic traffic flow at intersections.
//!
//! Each street approaching an intersection is modelled independently from its
//! demand, its capacity and, if present, the timing of the traffic light on
//! that approach. Approach results are then aggregated per intersection.

use crate::intersection::{Intersection, IntersectionId};
use crate::light::{SignalLookup, SignalTiming};
use crate::math::GeoPoint;
use crate::params::{EfficiencyThresholds, FlowParams, LosBands, StatusThresholds};
use crate::util::Interval;
use crate::{Street, StreetId, StreetSet};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Congestion classification of an average wait time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum FlowStatus {
    Free,
    Moderate,
    Congested,
    Stopped,
}

/// How much of the demand at an intersection is actually served.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum FlowEfficiency {
    High,
    Medium,
    Low,
}

/// Level of service, from A (best) to F (worst).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LevelOfService {
    A,
    B,
    C,
    D,
    E,
    F,
}

/// How an approach is controlled.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Control {
    Unsignalized,
    Signalized(SignalTiming),
}

/// The flow on one street's approach to an intersection.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FlowResult {
    pub street_id: StreetId,
    pub control: Control,
    /// Vehicles per hour the approach can serve.
    pub capacity_per_hour: f64,
    /// Demand divided by capacity.
    pub degree_of_saturation: f64,
    /// Vehicles per hour actually served.
    pub cars_passing: f64,
    /// Mean number of vehicles queued on the approach.
    pub cars_waiting: f64,
    /// Mean delay per vehicle in s.
    pub average_wait_time_s: f64,
    /// Delay summed over the vehicles served in an hour, in s.
    pub total_waiting_time_s: f64,
    /// Plausible range of the mean delay in s.
    pub wait_time_range: Interval<f64>,
    pub flow_status: FlowStatus,
    /// Demand exceeds capacity; excess vehicles are not served.
    pub oversaturated: bool,
    /// Time to drive the street at its average speed, in s.
    pub free_flow_travel_time_s: f64,
}

/// The aggregate flow through one intersection.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IntersectionFlowResult {
    pub intersection_id: IntersectionId,
    pub point: GeoPoint,
    /// Vehicles per hour served over all approaches.
    pub cars_per_hour: f64,
    /// Vehicles per hour demanded over all approaches.
    pub demand_per_hour: f64,
    /// Demand-weighted mean delay in s.
    pub average_waiting_time_s: f64,
    pub total_waiting_time_s: f64,
    pub traffic_condition: FlowStatus,
    pub flow_efficiency: FlowEfficiency,
    pub street_flows: Vec<FlowResult>,
}

/// Totals over every intersection in a network.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OverallFlow {
    pub total_cars_passing: f64,
    pub total_waiting_time_s: f64,
    pub average_wait_per_car_s: f64,
}

/// The result of simulating a whole network.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FlowReport {
    pub intersections: Vec<IntersectionFlowResult>,
    pub overall: OverallFlow,
}

impl FlowStatus {
    /// Classifies an average wait time in s.
    pub fn classify(wait_s: f64, thresholds: &StatusThresholds) -> Self {
        if wait_s < thresholds.free {
            FlowStatus::Free
        } else if wait_s < thresholds.moderate {
            FlowStatus::Moderate
        } else if wait_s < thresholds.congested {
            FlowStatus::Congested
        } else {
            FlowStatus::Stopped
        }
    }
}

impl FlowEfficiency {
    /// Classifies the ratio of served to demanded volume.
    pub fn classify(served: f64, demand: f64, thresholds: &EfficiencyThresholds) -> Self {
        let pct = if demand > 0.0 { 100.0 * served / demand } else { 0.0 };
        if pct >= thresholds.high_pct {
            FlowEfficiency::High
        } else if pct >= thresholds.medium_pct {
            FlowEfficiency::Medium
        } else {
            FlowEfficiency::Low
        }
    }
}

impl LevelOfService {
    /// Classifies an average delay in s.
    pub fn classify(delay_s: f64, bands: &LosBands) -> Self {
        use LevelOfService::*;
        match delay_s {
            d if d <= bands.a => A,
            d if d <= bands.b => B,
            d if d <= bands.c => C,
            d if d <= bands.d => D,
            d if d <= bands.e => E,
            _ => F,
        }
    }
}

impl FlowResult {
    /// Returns true if a traffic light controls the approach.
    pub fn has_traffic_light(&self) -> bool {
        matches!(self.control, Control::Signalized(_))
    }
}

impl OverallFlow {
    fn from_intersections(intersections: &[IntersectionFlowResult]) -> Self {
        let total_cars_passing = intersections.iter().map(|i| i.cars_per_hour).sum::<f64>();
        let total_waiting_time_s = intersections
            .iter()
            .map(|i| i.total_waiting_time_s)
            .sum::<f64>();
        let average_wait_per_car_s = if total_cars_passing > 0.0 {
            total_waiting_time_s / total_cars_passing
        } else {
            0.0
        };
        Self {
            total_cars_passing,
            total_waiting_time_s,
            average_wait_per_car_s,
        }
    }
}

/// Computes the flow on a street's approach, signalized if `timing` is given.
pub fn street_flow(
    street: &Street,
    timing: Option<SignalTiming>,
    params: &FlowParams,
) -> FlowResult {
    let demand = street.vehicles_per_hour();
    let lanes = street.lanes() as f64;

    let capacity_per_hour = match timing {
        Some(timing) => lanes * params.saturation_flow_per_lane * timing.green_ratio(),
        None => lanes * params.base_capacity_per_lane,
    };
    let x = demand / capacity_per_hour;

    let (control, delay, spread) = match timing {
        Some(timing) => (
            Control::Signalized(timing),
            signalized_delay(x, &timing) + overflow_delay(x, params),
            params.signalized_wait_spread,
        ),
        None => (
            Control::Unsignalized,
            unsignalized_delay(x, params) + overflow_delay(x, params),
            params.unsignalized_wait_spread,
        ),
    };

    let cars_passing = f64::min(demand, capacity_per_hour);

    log::trace!(
        "{:?}: {:.0} veh/h, capacity {:.0} veh/h, x = {:.3}, delay {:.1} s",
        street.id(),
        demand,
        capacity_per_hour,
        x,
        delay
    );

    FlowResult {
        street_id: street.id(),
        control,
        capacity_per_hour,
        degree_of_saturation: x,
        cars_passing,
        cars_waiting: cars_passing / 3600.0 * delay,
        average_wait_time_s: delay,
        total_waiting_time_s: cars_passing * delay,
        wait_time_range: Interval::disc_non_negative(delay, spread * delay),
        flow_status: FlowStatus::classify(delay, &params.status_thresholds),
        oversaturated: x > 1.0,
        free_flow_travel_time_s: street.free_flow_travel_time_s(),
    }
}

/// Uniform delay of a fixed-time signal, in s.
fn signalized_delay(x: f64, timing: &SignalTiming) -> f64 {
    let g_c = timing.green_ratio();
    0.5 * timing.cycle_time_s() * (1.0 - g_c).powi(2) / (1.0 - f64::min(x, 1.0) * g_c)
}

/// Delay of an uncontrolled approach, in s. Rises steeply as demand nears capacity.
fn unsignalized_delay(x: f64, params: &FlowParams) -> f64 {
    params.unsignalized_delay_s / (1.0 - f64::min(x, params.unsignalized_saturation_cap))
}

/// Extra delay from queues that build while demand exceeds capacity, in s.
fn overflow_delay(x: f64, params: &FlowParams) -> f64 {
    if x > 1.0 {
        900.0 * params.analysis_period_h * (x - 1.0)
    } else {
        0.0
    }
}

/// Computes the flow through an intersection.
///
/// Each approach is signalized if `signals` has a timing for it at this intersection.
pub fn simulate_intersection(
    intersection: &Intersection,
    streets: &StreetSet,
    signals: &impl SignalLookup,
    params: &FlowParams,
) -> IntersectionFlowResult {
    let approaches = intersection
        .streets()
        .iter()
        .filter_map(|id| streets.get(*id))
        .collect::<Vec<_>>();
    let street_flows = approaches
        .iter()
        .map(|street| street_flow(street, signals.timing(intersection.id(), street.id()), params))
        .collect::<Vec<_>>();

    let cars_per_hour = street_flows.iter().map(|f| f.cars_passing).sum::<f64>();
    let demand_per_hour = approaches.iter().map(|s| s.vehicles_per_hour()).sum::<f64>();
    let weighted_wait = approaches
        .iter()
        .zip(&street_flows)
        .map(|(street, flow)| street.vehicles_per_hour() * flow.average_wait_time_s)
        .sum::<f64>();
    let average_waiting_time_s = if demand_per_hour > 0.0 {
        weighted_wait / demand_per_hour
    } else {
        0.0
    };

    IntersectionFlowResult {
        intersection_id: intersection.id().clone(),
        point: intersection.point(),
        cars_per_hour,
        demand_per_hour,
        average_waiting_time_s,
        total_waiting_time_s: average_waiting_time_s * cars_per_hour,
        traffic_condition: FlowStatus::classify(average_waiting_time_s, &params.status_thresholds),
        flow_efficiency: FlowEfficiency::classify(
            cars_per_hour,
            demand_per_hour,
            &params.efficiency,
        ),
        street_flows,
    }
}

/// Computes the flow through each of the given intersections, and the totals.
pub(crate) fn simulate(
    intersections: &[Intersection],
    streets: &StreetSet,
    signals: &impl SignalLookup,
    params: &FlowParams,
) -> FlowReport {
    let intersections = intersections
        .iter()
        .map(|intersection| simulate_intersection(intersection, streets, signals, params))
        .collect::<Vec<_>>();
    let overall = OverallFlow::from_intersections(&intersections);
    FlowReport {
        intersections,
        overall,
    }
}

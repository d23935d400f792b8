//! Tunable policy constants for the network model and the flow simulator.
//!
//! The defaults follow common traffic-engineering practice; none of them is
//! authoritative, so every value can be overridden through [Params].

use crate::util::Interval;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Raw crossings closer than this are merged into one intersection, in m.
const MERGE_TOLERANCE_M: f64 = 15.0;

/// The maximum number of streets a network will hold.
const MAX_STREETS: usize = 500;

/// The maximum number of points in a single street polyline.
const MAX_POINTS_PER_STREET: usize = 2000;

/// Permitted signal cycle times, in s.
const CYCLE_BOUNDS: Interval<f64> = Interval::new(30.0, 180.0);

/// Permitted signal green times, in s.
const GREEN_BOUNDS: Interval<f64> = Interval::new(10.0, 120.0);

/// Saturation flow under continuous green, in veh/h/lane.
const SATURATION_FLOW_PER_LANE: f64 = 1800.0;

/// Capacity of an uncontrolled or priority-controlled approach, in veh/h/lane.
const BASE_CAPACITY_PER_LANE: f64 = 1000.0;

/// Delay of an unsignalized approach with no conflicting volume, in s.
const UNSIGNALIZED_DELAY_S: f64 = 5.0;

/// The degree of saturation at which the unsignalized delay curve stops rising steeply.
const UNSIGNALIZED_SATURATION_CAP: f64 = 0.98;

/// The analysis period used for the oversaturation delay term, in h.
const ANALYSIS_PERIOD_H: f64 = 0.25;

/// Relative half-width of the reported wait time range.
const SIGNALIZED_WAIT_SPREAD: f64 = 0.2;
const UNSIGNALIZED_WAIT_SPREAD: f64 = 0.4;

/// Timing used when an impact analysis has no candidate signal, in s.
const DEFAULT_CYCLE_TIME_S: f64 = 90.0;
const DEFAULT_GREEN_TIME_S: f64 = 45.0;

/// All configuration for a [Network](crate::Network).
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct Params {
    pub network: NetworkParams,
    pub flow: FlowParams,
}

/// Limits and tolerances applied when the network is edited or scanned.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct NetworkParams {
    /// Raw crossing points closer than this are merged, in m.
    pub merge_tolerance_m: f64,
    /// Caps the cost of intersection detection.
    pub max_streets: usize,
    /// Caps the cost of intersection detection.
    pub max_points_per_street: usize,
    /// Permitted cycle times in s, inclusive.
    pub cycle_bounds: Interval<f64>,
    /// Permitted green times in s, inclusive.
    pub green_bounds: Interval<f64>,
}

/// Constants of the delay and capacity models, and the bands used to classify their output.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct FlowParams {
    /// Saturation flow rate in veh/h/lane.
    pub saturation_flow_per_lane: f64,
    /// Unsignalized capacity in veh/h/lane.
    pub base_capacity_per_lane: f64,
    /// The `k` in `k / (1 - min(x, cap))`, in s.
    pub unsignalized_delay_s: f64,
    /// The `cap` in `k / (1 - min(x, cap))`; must be below 1.
    pub unsignalized_saturation_cap: f64,
    /// Period over which oversaturated queues build, in h.
    pub analysis_period_h: f64,
    /// Relative half-width of the wait time range on signalized approaches.
    pub signalized_wait_spread: f64,
    /// Relative half-width of the wait time range on unsignalized approaches.
    pub unsignalized_wait_spread: f64,
    /// Timing of the candidate signal when an analysis is not given one.
    pub default_cycle_time_s: f64,
    pub default_green_time_s: f64,
    pub status_thresholds: StatusThresholds,
    pub los_bands: LosBands,
    pub recommendation: RecommendationThresholds,
    pub efficiency: EfficiencyThresholds,
}

/// Upper bounds (exclusive) of average wait, in s, for each flow status.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StatusThresholds {
    pub free: f64,
    pub moderate: f64,
    pub congested: f64,
}

/// Upper bounds (inclusive) of average delay, in s, for level of service A to E.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LosBands {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
}

/// Minimum delay improvements, in percent.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RecommendationThresholds {
    pub highly_recommended_pct: f64,
    pub recommended_pct: f64,
}

/// Minimum served/demand ratios, in percent.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EfficiencyThresholds {
    pub high_pct: f64,
    pub medium_pct: f64,
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self {
            merge_tolerance_m: MERGE_TOLERANCE_M,
            max_streets: MAX_STREETS,
            max_points_per_street: MAX_POINTS_PER_STREET,
            cycle_bounds: CYCLE_BOUNDS,
            green_bounds: GREEN_BOUNDS,
        }
    }
}

impl Default for FlowParams {
    fn default() -> Self {
        Self {
            saturation_flow_per_lane: SATURATION_FLOW_PER_LANE,
            base_capacity_per_lane: BASE_CAPACITY_PER_LANE,
            unsignalized_delay_s: UNSIGNALIZED_DELAY_S,
            unsignalized_saturation_cap: UNSIGNALIZED_SATURATION_CAP,
            analysis_period_h: ANALYSIS_PERIOD_H,
            signalized_wait_spread: SIGNALIZED_WAIT_SPREAD,
            unsignalized_wait_spread: UNSIGNALIZED_WAIT_SPREAD,
            default_cycle_time_s: DEFAULT_CYCLE_TIME_S,
            default_green_time_s: DEFAULT_GREEN_TIME_S,
            status_thresholds: StatusThresholds::default(),
            los_bands: LosBands::default(),
            recommendation: RecommendationThresholds::default(),
            efficiency: EfficiencyThresholds::default(),
        }
    }
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self {
            free: 10.0,
            moderate: 30.0,
            congested: 60.0,
        }
    }
}

impl Default for LosBands {
    fn default() -> Self {
        Self {
            a: 10.0,
            b: 20.0,
            c: 35.0,
            d: 55.0,
            e: 80.0,
        }
    }
}

impl Default for RecommendationThresholds {
    fn default() -> Self {
        Self {
            highly_recommended_pct: 30.0,
            recommended_pct: 10.0,
        }
    }
}

impl Default for EfficiencyThresholds {
    fn default() -> Self {
        Self {
            high_pct: 80.0,
            medium_pct: 60.0,
        }
    }
}

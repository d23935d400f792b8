//! Before/after comparison of adding a traffic light to an intersection.

use crate::error::{Error, Result};
use crate::flow::{simulate_intersection, IntersectionFlowResult, LevelOfService};
use crate::intersection::{Intersection, IntersectionId};
use crate::light::{SignalLookup, SignalTiming, TrafficLight};
use crate::params::RecommendationThresholds;
use crate::{Network, StreetId};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A traffic light proposed for one street's approach to an intersection.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CandidateSignal {
    pub street_id: StreetId,
    pub cycle_time_s: f64,
    pub green_time_s: f64,
}

/// Verdict on a candidate traffic light.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum Recommendation {
    HighlyRecommended,
    Recommended,
    Marginal,
    NotRecommended,
}

/// The predicted effect of a candidate traffic light on one intersection.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ImpactAnalysis {
    pub intersection_id: IntersectionId,
    /// The light that was evaluated.
    pub candidate: TrafficLight,
    /// Mean delay per vehicle in s.
    pub delay_before_s: f64,
    pub delay_after_s: f64,
    /// Vehicles served per hour.
    pub throughput_before: f64,
    pub throughput_after: f64,
    /// Reduction in delay as a percentage of the delay before.
    pub delay_improvement_pct: f64,
    /// Increase in throughput as a percentage of the throughput before.
    pub throughput_improvement_pct: f64,
    pub level_of_service_before: LevelOfService,
    pub level_of_service_after: LevelOfService,
    pub recommendation: Recommendation,
    pub before: IntersectionFlowResult,
    pub after: IntersectionFlowResult,
}

/// A signal registry with one light added or replaced, without modifying the registry.
struct WithCandidate<'a, S> {
    signals: &'a S,
    candidate: &'a TrafficLight,
}

impl<S: SignalLookup> SignalLookup for WithCandidate<'_, S> {
    fn timing(&self, intersection: &IntersectionId, street: StreetId) -> Option<SignalTiming> {
        if *intersection == self.candidate.intersection_id && street == self.candidate.street_id {
            Some(self.candidate.timing)
        } else {
            self.signals.timing(intersection, street)
        }
    }
}

impl Recommendation {
    /// Chooses a verdict from the delay and throughput improvements, in percent.
    pub fn from_improvements(
        delay_pct: f64,
        throughput_pct: f64,
        thresholds: &RecommendationThresholds,
    ) -> Self {
        if delay_pct >= thresholds.highly_recommended_pct && throughput_pct >= 0.0 {
            Recommendation::HighlyRecommended
        } else if delay_pct >= thresholds.recommended_pct {
            Recommendation::Recommended
        } else if delay_pct > 0.0 {
            Recommendation::Marginal
        } else {
            Recommendation::NotRecommended
        }
    }
}

/// Simulates an intersection with the current lights and again with the
/// candidate light in place, and compares the two.
pub(crate) fn analyze(
    network: &Network,
    intersection_id: &IntersectionId,
    candidate: Option<CandidateSignal>,
) -> Result<ImpactAnalysis> {
    let intersection = network.intersection(intersection_id)?;
    let candidate = match candidate {
        Some(candidate) => candidate_light(network, &intersection, candidate)?,
        None => default_light(network, &intersection)?,
    };

    let params = &network.params().flow;
    let signals = network.signals();
    let before = simulate_intersection(&intersection, network.streets(), signals, params);
    let overlay = WithCandidate {
        signals,
        candidate: &candidate,
    };
    let after = simulate_intersection(&intersection, network.streets(), &overlay, params);

    let delay_improvement_pct =
        percent_change(before.average_waiting_time_s, after.average_waiting_time_s, -1.0);
    let throughput_improvement_pct = percent_change(before.cars_per_hour, after.cars_per_hour, 1.0);
    let recommendation = Recommendation::from_improvements(
        delay_improvement_pct,
        throughput_improvement_pct,
        &params.recommendation,
    );

    log::info!(
        "Light on {:?} at {}: delay {:.1} s -> {:.1} s ({:+.1}%), {:?}",
        candidate.street_id,
        intersection_id,
        before.average_waiting_time_s,
        after.average_waiting_time_s,
        delay_improvement_pct,
        recommendation
    );

    Ok(ImpactAnalysis {
        intersection_id: intersection_id.clone(),
        candidate,
        delay_before_s: before.average_waiting_time_s,
        delay_after_s: after.average_waiting_time_s,
        throughput_before: before.cars_per_hour,
        throughput_after: after.cars_per_hour,
        delay_improvement_pct,
        throughput_improvement_pct,
        level_of_service_before: LevelOfService::classify(
            before.average_waiting_time_s,
            &params.los_bands,
        ),
        level_of_service_after: LevelOfService::classify(
            after.average_waiting_time_s,
            &params.los_bands,
        ),
        recommendation,
        before,
        after,
    })
}

/// Validates a caller-supplied candidate.
fn candidate_light(
    network: &Network,
    intersection: &Intersection,
    candidate: CandidateSignal,
) -> Result<TrafficLight> {
    if !intersection.id().contains(candidate.street_id) {
        return Err(Error::StreetNotAtIntersection {
            intersection: intersection.id().clone(),
            street: candidate.street_id,
        });
    }
    let timing = SignalTiming::new(
        candidate.cycle_time_s,
        candidate.green_time_s,
        &network.params().network,
    )?;
    Ok(TrafficLight {
        intersection_id: intersection.id().clone(),
        street_id: candidate.street_id,
        timing,
    })
}

/// Places the default timing on the busiest street without a light, or on
/// the busiest street if every approach already has one.
fn default_light(network: &Network, intersection: &Intersection) -> Result<TrafficLight> {
    let signals = network.signals();
    let street = intersection
        .streets()
        .iter()
        .filter_map(|id| network.streets().get(*id))
        .max_by(|a, b| {
            let a_free = signals.timing(intersection.id(), a.id()).is_none();
            let b_free = signals.timing(intersection.id(), b.id()).is_none();
            a_free
                .cmp(&b_free)
                .then(a.vehicles_per_hour().total_cmp(&b.vehicles_per_hour()))
                .then(b.id().cmp(&a.id()))
        })
        .ok_or_else(|| Error::UnknownIntersection(intersection.id().clone()))?;

    let flow = &network.params().flow;
    candidate_light(
        network,
        intersection,
        CandidateSignal {
            street_id: street.id(),
            cycle_time_s: flow.default_cycle_time_s,
            green_time_s: flow.default_green_time_s,
        },
    )
}

/// The change from `before` to `after` as a percentage of `before`, with
/// `sign` choosing whether a decrease (-1) or an increase (+1) is positive.
fn percent_change(before: f64, after: f64, sign: f64) -> f64 {
    if before > 0.0 {
        sign * (after - before) / before * 100.0
    } else {
        0.0
    }
}

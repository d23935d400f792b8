use std::time::Instant;

use traffic_flow::{CandidateSignal, GeoPoint, Network, StreetAttributes};

/// Streets in each direction of the demo grid.
const GRID_SIZE: usize = 40;

/// Spacing between parallel streets, in degrees.
const SPACING: f64 = 0.002;

fn main() -> Result<(), traffic_flow::Error> {
    env_logger::init();

    let origin = GeoPoint::new(-23.57, -46.66);
    let extent = SPACING * GRID_SIZE as f64;
    let mut network = Network::new();
    let mut avenues = vec![];

    for i in 0..GRID_SIZE {
        let offset = SPACING * (i as f64 + 0.5);
        let east_west = [
            GeoPoint::new(origin.lat + offset, origin.lon),
            GeoPoint::new(origin.lat + offset, origin.lon + extent),
        ];
        let north_south = [
            GeoPoint::new(origin.lat, origin.lon + offset),
            GeoPoint::new(origin.lat + extent, origin.lon + offset),
        ];
        avenues.push(network.add_street(&StreetAttributes {
            name: &format!("Avenida {}", i),
            points: &east_west,
            vehicles_per_hour: 900.0 + 20.0 * i as f64,
            average_speed_kmh: 50.0,
            lanes: 2,
        })?);
        network.add_street(&StreetAttributes {
            name: &format!("Rua {}", i),
            points: &north_south,
            vehicles_per_hour: 300.0 + 10.0 * i as f64,
            average_speed_kmh: 30.0,
            lanes: 1,
        })?;
    }

    println!("Finding intersections...");
    let start = Instant::now();
    let intersections = network.find_intersections();
    println!(
        "{} streets --> {} intersections in {:?}",
        network.street_count(),
        intersections.len(),
        start.elapsed()
    );

    let start = Instant::now();
    let report = network.simulate_flow();
    println!(
        "Simulated flow in {:?}: {:.0} veh/h, {:.1} s average wait",
        start.elapsed(),
        report.overall.total_cars_passing,
        report.overall.average_wait_per_car_s
    );

    let busiest = report
        .intersections
        .iter()
        .max_by(|a, b| a.average_waiting_time_s.total_cmp(&b.average_waiting_time_s));
    if let Some(busiest) = busiest {
        let street_id = busiest
            .intersection_id
            .streets()
            .iter()
            .copied()
            .find(|id| avenues.contains(id))
            .unwrap_or(busiest.intersection_id.streets()[0]);
        let analysis = network.analyze_intersection(
            &busiest.intersection_id,
            Some(CandidateSignal {
                street_id,
                cycle_time_s: 90.0,
                green_time_s: 60.0,
            }),
        )?;
        println!(
            "Busiest intersection {}: {:.1} s ({:?}) --> {:.1} s ({:?}) with a light: {:?}",
            busiest.intersection_id,
            analysis.delay_before_s,
            analysis.level_of_service_before,
            analysis.delay_after_s,
            analysis.level_of_service_after,
            analysis.recommendation
        );
    }

    Ok(())
}

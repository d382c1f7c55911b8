//! Integration coverage for the concrete scenarios in spec section 8 that
//! exercise more than one module together (clustering + routing +
//! assembly), as opposed to the single-module unit tests living alongside
//! each source file.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::SeedableRng;

use tripweave::config::PlannerConfig;
use tripweave::geo::TransportMode;
use tripweave::place::{Geometry, LatLng, Place};
use tripweave::schedule;

fn hotel() -> Place {
    Place {
        place_id: Some("hotel".to_string()),
        name: Some("Riverside Inn".to_string()),
        types: vec!["lodging".to_string(), "hotel".to_string()],
        rating: Some(4.2),
        user_ratings_total: Some(800),
        price_level: Some(2),
        geometry: Some(Geometry {
            location: LatLng { lat: 51.5074, lng: -0.1278 },
        }),
        location: None,
    }
}

fn restaurant(id: &str, lat: f64, lng: f64) -> Place {
    Place {
        place_id: Some(id.to_string()),
        name: Some(id.to_string()),
        types: vec!["restaurant".to_string(), "food".to_string()],
        rating: Some(4.1),
        user_ratings_total: Some(300),
        price_level: Some(2),
        geometry: Some(Geometry { location: LatLng { lat, lng } }),
        location: None,
    }
}

fn attraction(id: &str, lat: f64, lng: f64) -> Place {
    Place {
        place_id: Some(id.to_string()),
        name: Some(id.to_string()),
        types: vec!["tourist_attraction".to_string(), "point_of_interest".to_string()],
        rating: Some(4.4),
        user_ratings_total: Some(1500),
        price_level: None,
        geometry: Some(Geometry { location: LatLng { lat, lng } }),
        location: None,
    }
}

/// Scenario 3: two restaurants, D=2, no attractions -> each day receives
/// exactly one real restaurant plus one virtual meal.
#[test]
fn two_restaurants_two_days_no_attractions() {
    let config = PlannerConfig::default();
    let mut rng = StdRng::seed_from_u64(77);
    let places = vec![
        hotel(),
        restaurant("river_cafe", 51.51, -0.13),
        restaurant("borough_market_kitchen", 51.505, -0.09),
    ];
    let result = tripweave::plan_schedule(&places, 2, TransportMode::Walking, &config, &mut rng).unwrap();

    for day in 0..2u32 {
        let day_places: Vec<_> = result
            .schedule
            .events
            .iter()
            .filter(|e| e.day() == day)
            .filter_map(|e| e.place())
            .collect();
        let real_count = day_places
            .iter()
            .filter(|p| p.restaurant_kind == Some(tripweave::place::RestaurantKind::Real))
            .count();
        let virtual_count = day_places.iter().filter(|p| p.is_virtual()).count();
        assert_eq!(real_count, 1, "day {day} should have exactly one real restaurant");
        assert_eq!(virtual_count, 1, "day {day} should have exactly one virtual meal");
    }
}

/// Scenario 4: 10 attractions, D=3, driving -> capacity auto-extension
/// kicks in only if needed, and every resulting bucket respects the
/// capacity bound.
#[test]
fn ten_attractions_three_days_driving_respects_capacity() {
    let config = PlannerConfig::default();
    let mut rng = StdRng::seed_from_u64(13);
    let mut places = vec![hotel()];
    for i in 0..10 {
        places.push(attraction(&format!("attraction_{i}"), 51.50 + i as f64 * 0.01, -0.12 + i as f64 * 0.01));
    }
    places.push(restaurant("pub_lunch", 51.51, -0.11));

    let result = tripweave::plan_schedule(&places, 3, TransportMode::Driving, &config, &mut rng).unwrap();
    assert!(result.day_plans.len() >= 3);

    let per_day_attraction_counts: Vec<usize> = result
        .day_plans
        .iter()
        .map(|plan| {
            plan.entries
                .iter()
                .filter(|e| !e.place.is_lodging && !e.place.is_restaurant())
                .count()
        })
        .collect();
    let max = *per_day_attraction_counts.iter().max().unwrap();
    let min = *per_day_attraction_counts.iter().min().unwrap();
    assert!(max - min <= 1, "attraction counts should be balanced within 1: {per_day_attraction_counts:?}");

    assert!(schedule::validate(&result.schedule, &config));
}

/// Every real restaurant across the whole schedule is used at most once
/// (invariant P5), even across multiple days sharing the same candidate
/// pool.
#[test]
fn every_real_restaurant_used_at_most_once_across_days() {
    let config = PlannerConfig::default();
    let mut rng = StdRng::seed_from_u64(21);
    let places = vec![
        hotel(),
        restaurant("r1", 51.50, -0.10),
        restaurant("r2", 51.51, -0.11),
        restaurant("r3", 51.52, -0.12),
        attraction("a1", 51.505, -0.105),
        attraction("a2", 51.515, -0.115),
    ];
    let result = tripweave::plan_schedule(&places, 3, TransportMode::Transit, &config, &mut rng).unwrap();

    let mut seen = HashSet::new();
    for event in &result.schedule.events {
        if let Some(place) = event.place() {
            if place.restaurant_kind == Some(tripweave::place::RestaurantKind::Real) {
                assert!(seen.insert(place.id.clone()), "restaurant {} used more than once", place.id);
            }
        }
    }
}

//! Per-day greedy, time-advancing router/scheduler.
//!
//! Grounded on `original_source/travelplan_back/travelplan/services/routing.py`
//! (`calculate_place_score`, `optimize_day_route`, `generate_day_schedule`)
//! for exact semantics; the time-advancing loop style follows
//! `ACTOTA-actota-api/src/services/route_optimization_service.rs::schedule_optimized_activities`.

use std::collections::HashSet;

use chrono::{Duration, NaiveTime};

use crate::cluster::DayBucket;
use crate::config::PlannerConfig;
use crate::geo::{self, Coordinates, TransportMode};
use crate::place::{NormalizedPlace, RestaurantKind};

#[derive(Debug, Clone)]
pub struct DayPlanEntry {
    pub place: NormalizedPlace,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

#[derive(Debug, Clone)]
pub struct DayPlan {
    pub day_index: u32,
    pub entries: Vec<DayPlanEntry>,
    pub score: f64,
}

fn entry(place: NormalizedPlace, start: NaiveTime, end: NaiveTime) -> DayPlanEntry {
    DayPlanEntry { place, start, end }
}

/// Quality + proximity + meal-window scoring, per spec section 4.R.
fn score_candidate(
    place: &NormalizedPlace,
    current_time: NaiveTime,
    prev: Coordinates,
    in_lunch: bool,
    in_dinner: bool,
    lunch_done: bool,
    dinner_done: bool,
    config: &PlannerConfig,
) -> f64 {
    let rating = place.rating.unwrap_or(0.0).min(5.0);
    let quality = (rating * 5.0).clamp(0.0, 25.0);

    let dist_m = geo::haversine_distance_m(prev, place.coordinates);
    let proximity = (100.0 - 0.002 * dist_m).clamp(0.0, 100.0);

    let meal_bonus = if place.is_restaurant() {
        if in_lunch && !lunch_done {
            50.0 * config.lunch_window.time_fit(current_time)
        } else if in_dinner && !dinner_done {
            50.0 * config.dinner_window.time_fit(current_time)
        } else {
            -200.0
        }
    } else {
        0.0
    };

    (quality + proximity + meal_bonus).max(0.0)
}

fn next_unmet_meal_start(
    current_time: NaiveTime,
    lunch_done: bool,
    dinner_done: bool,
    config: &PlannerConfig,
) -> Option<NaiveTime> {
    let mut candidates = Vec::new();
    if !lunch_done && config.lunch_window.start > current_time {
        candidates.push(config.lunch_window.start);
    }
    if !dinner_done && config.dinner_window.start > current_time {
        candidates.push(config.dinner_window.start);
    }
    candidates.into_iter().min()
}

/// Routes one day's bucket into a chronologically consistent [`DayPlan`].
/// `consumed` tracks real-restaurant ids already used on earlier days and
/// is updated in place, per the cross-day consumption design note.
pub fn route(
    day_index: u32,
    bucket: &DayBucket,
    lodging: &NormalizedPlace,
    mode: TransportMode,
    config: &PlannerConfig,
    consumed: &mut HashSet<String>,
) -> DayPlan {
    let mut attractions: Vec<NormalizedPlace> = bucket
        .iter()
        .filter(|p| !p.is_restaurant() && !p.is_lodging)
        .cloned()
        .collect();
    let mut real_restaurants: Vec<NormalizedPlace> = bucket
        .iter()
        .filter(|p| p.restaurant_kind == Some(RestaurantKind::Real) && !consumed.contains(&p.id))
        .cloned()
        .collect();
    let bucket_has_real = bucket
        .iter()
        .any(|p| p.restaurant_kind == Some(RestaurantKind::Real));
    let virtual_lunch = bucket
        .iter()
        .find(|p| p.restaurant_kind == Some(RestaurantKind::VirtualLunch))
        .cloned();
    let virtual_dinner = bucket
        .iter()
        .find(|p| p.restaurant_kind == Some(RestaurantKind::VirtualDinner))
        .cloned();

    // Pure-virtual short-circuit: no attractions, no real restaurants.
    if attractions.is_empty() && !bucket_has_real {
        let mut entries = vec![entry(lodging.clone(), config.day_start, config.day_start)];
        if let Some(lunch) = &virtual_lunch {
            let end = config.lunch_window.optimal + Duration::minutes(lunch.visit_duration_minutes);
            entries.push(entry(lunch.clone(), config.lunch_window.optimal, end));
        }
        if let Some(dinner) = &virtual_dinner {
            let end = config.dinner_window.optimal + Duration::minutes(dinner.visit_duration_minutes);
            entries.push(entry(dinner.clone(), config.dinner_window.optimal, end));
        }
        entries.push(entry(lodging.clone(), config.day_end, config.day_end));
        return DayPlan {
            day_index,
            entries,
            score: 0.0,
        };
    }

    let mut current_time = config.day_start;
    let mut prev = lodging.coordinates;
    let mut lunch_done = false;
    let mut dinner_done = false;
    let mut total_score = 0.0;
    let mut entries = vec![entry(lodging.clone(), current_time, current_time)];

    while current_time < config.day_end {
        let in_lunch = config.lunch_window.contains(current_time);
        let in_dinner = config.dinner_window.contains(current_time);

        enum Source {
            Real(usize),
            VirtualLunch,
            VirtualDinner,
            Attraction(usize),
        }

        let mut candidates: Vec<Source> = Vec::new();
        if (in_lunch && !lunch_done) || (in_dinner && !dinner_done) {
            if !real_restaurants.is_empty() {
                for i in 0..real_restaurants.len() {
                    candidates.push(Source::Real(i));
                }
            } else {
                if in_lunch && !lunch_done && virtual_lunch.is_some() {
                    candidates.push(Source::VirtualLunch);
                }
                if in_dinner && !dinner_done && virtual_dinner.is_some() {
                    candidates.push(Source::VirtualDinner);
                }
            }
        } else {
            let boundary = next_unmet_meal_start(current_time, lunch_done, dinner_done, config);
            for (i, attraction) in attractions.iter().enumerate() {
                let projected_end = current_time + Duration::minutes(attraction.visit_duration_minutes);
                let fits = match boundary {
                    Some(start) => projected_end <= start,
                    None => true,
                };
                if fits {
                    candidates.push(Source::Attraction(i));
                }
            }
        }

        if candidates.is_empty() {
            current_time += Duration::minutes(15);
            continue;
        }

        let mut best_idx = 0usize;
        let mut best_score = f64::NEG_INFINITY;
        for (idx, source) in candidates.iter().enumerate() {
            let place = match source {
                Source::Real(i) => &real_restaurants[*i],
                Source::VirtualLunch => virtual_lunch.as_ref().unwrap(),
                Source::VirtualDinner => virtual_dinner.as_ref().unwrap(),
                Source::Attraction(i) => &attractions[*i],
            };
            let s = score_candidate(place, current_time, prev, in_lunch, in_dinner, lunch_done, dinner_done, config);
            if s > best_score {
                best_score = s;
                best_idx = idx;
            }
        }

        let chosen_source = &candidates[best_idx];
        let chosen = match chosen_source {
            Source::Real(i) => real_restaurants[*i].clone(),
            Source::VirtualLunch => virtual_lunch.clone().unwrap(),
            Source::VirtualDinner => virtual_dinner.clone().unwrap(),
            Source::Attraction(i) => attractions[*i].clone(),
        };

        let start = current_time;
        let end = start + Duration::minutes(chosen.visit_duration_minutes);
        let travel = geo::travel_time_minutes(geo::haversine_distance_m(prev, chosen.coordinates), mode, config);

        total_score += best_score;
        prev = chosen.coordinates;

        if chosen.is_restaurant() {
            if in_lunch && !lunch_done {
                lunch_done = true;
            } else if in_dinner && !dinner_done {
                dinner_done = true;
            }
        }

        match chosen_source {
            Source::Real(i) => {
                consumed.insert(chosen.id.clone());
                real_restaurants.remove(*i);
            }
            Source::Attraction(i) => {
                attractions.remove(*i);
            }
            Source::VirtualLunch | Source::VirtualDinner => {}
        }

        entries.push(entry(chosen, start, end));
        current_time = end + Duration::minutes(travel.round() as i64);
    }

    // Force-insert any meal window that was never scheduled.
    if !lunch_done {
        if let Some(pos) = real_restaurants.iter().position(|_| true) {
            let place = real_restaurants.remove(pos);
            consumed.insert(place.id.clone());
            let end = config.lunch_window.optimal + Duration::minutes(place.visit_duration_minutes);
            entries.push(entry(place, config.lunch_window.optimal, end));
        } else if let Some(lunch) = virtual_lunch.clone() {
            let end = config.lunch_window.optimal + Duration::minutes(lunch.visit_duration_minutes);
            entries.push(entry(lunch, config.lunch_window.optimal, end));
        }
    }
    if !dinner_done {
        if let Some(pos) = real_restaurants.iter().position(|_| true) {
            let place = real_restaurants.remove(pos);
            consumed.insert(place.id.clone());
            let end = config.dinner_window.optimal + Duration::minutes(place.visit_duration_minutes);
            entries.push(entry(place, config.dinner_window.optimal, end));
        } else if let Some(dinner) = virtual_dinner.clone() {
            let end = config.dinner_window.optimal + Duration::minutes(dinner.visit_duration_minutes);
            entries.push(entry(dinner, config.dinner_window.optimal, end));
        }
    }

    entries.push(entry(lodging.clone(), current_time, current_time));
    entries.sort_by_key(|e| e.start);

    log::info!("day {day_index} route optimized with score {total_score:.1}");

    DayPlan {
        day_index,
        entries,
        score: total_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::place::Category;

    fn lodging() -> NormalizedPlace {
        NormalizedPlace {
            id: "hotel".to_string(),
            name: "Hotel".to_string(),
            coordinates: Coordinates::new(48.85, 2.35),
            category: Category::Lodging,
            visit_duration_minutes: 0,
            is_lodging: true,
            restaurant_kind: None,
            rating: None,
            original: None,
        }
    }

    fn restaurant(id: &str, lat: f64, lng: f64) -> NormalizedPlace {
        NormalizedPlace {
            id: id.to_string(),
            name: id.to_string(),
            coordinates: Coordinates::new(lat, lng),
            category: Category::Restaurant,
            visit_duration_minutes: 75,
            is_lodging: false,
            restaurant_kind: Some(RestaurantKind::Real),
            rating: Some(4.2),
            original: None,
        }
    }

    fn attraction(id: &str, lat: f64, lng: f64, duration: i64) -> NormalizedPlace {
        NormalizedPlace {
            id: id.to_string(),
            name: id.to_string(),
            coordinates: Coordinates::new(lat, lng),
            category: Category::TouristAttraction,
            visit_duration_minutes: duration,
            is_lodging: false,
            restaurant_kind: None,
            rating: Some(4.5),
            original: None,
        }
    }

    #[test]
    fn day_plan_begins_and_ends_with_lodging() {
        let config = PlannerConfig::default();
        let lodging = lodging();
        let bucket = vec![
            attraction("a1", 48.86, 2.34, 90),
            NormalizedPlace::virtual_lunch(Coordinates::new(48.85, 2.34), 75),
            NormalizedPlace::virtual_dinner(Coordinates::new(48.85, 2.34), 75),
        ];
        let mut consumed = HashSet::new();
        let plan = route(0, &bucket, &lodging, TransportMode::Walking, &config, &mut consumed);
        assert_eq!(plan.entries.first().unwrap().place.id, "hotel");
        assert_eq!(plan.entries.last().unwrap().place.id, "hotel");
    }

    #[test]
    fn entries_are_chronologically_non_decreasing() {
        let config = PlannerConfig::default();
        let lodging = lodging();
        let bucket = vec![
            attraction("a1", 48.86, 2.34, 90),
            attraction("a2", 48.87, 2.32, 60),
            restaurant("r1", 48.85, 2.34),
            NormalizedPlace::virtual_dinner(Coordinates::new(48.85, 2.34), 75),
        ];
        let mut consumed = HashSet::new();
        let plan = route(0, &bucket, &lodging, TransportMode::Walking, &config, &mut consumed);
        for pair in plan.entries.windows(2) {
            assert!(pair[0].start <= pair[1].start);
        }
    }

    #[test]
    fn real_restaurant_is_marked_consumed() {
        let config = PlannerConfig::default();
        let lodging = lodging();
        let bucket = vec![restaurant("r1", 48.85, 2.34), NormalizedPlace::virtual_dinner(Coordinates::new(48.85, 2.34), 75)];
        let mut consumed = HashSet::new();
        let _plan = route(0, &bucket, &lodging, TransportMode::Walking, &config, &mut consumed);
        assert!(consumed.contains("r1"));
    }

    #[test]
    fn pure_virtual_bucket_short_circuits_with_lodging_brackets() {
        let config = PlannerConfig::default();
        let lodging = lodging();
        let bucket = vec![
            NormalizedPlace::virtual_lunch(Coordinates::new(48.85, 2.34), 75),
            NormalizedPlace::virtual_dinner(Coordinates::new(48.85, 2.34), 75),
        ];
        let mut consumed = HashSet::new();
        let plan = route(0, &bucket, &lodging, TransportMode::Walking, &config, &mut consumed);
        assert_eq!(plan.entries.len(), 4);
        assert_eq!(plan.entries[0].place.id, "hotel");
        assert_eq!(plan.entries[3].place.id, "hotel");
    }

    #[test]
    fn missed_lunch_window_is_force_inserted() {
        let config = PlannerConfig::default();
        let lodging = lodging();
        // A single long attraction that spans past the lunch window entirely.
        let bucket = vec![
            attraction("long", 48.86, 2.34, 600),
            restaurant("r1", 48.85, 2.34),
            NormalizedPlace::virtual_dinner(Coordinates::new(48.85, 2.34), 75),
        ];
        let mut consumed = HashSet::new();
        let plan = route(0, &bucket, &lodging, TransportMode::Walking, &config, &mut consumed);
        let has_restaurant = plan.entries.iter().any(|e| e.place.id == "r1");
        assert!(has_restaurant);
    }
}

//! Random-schedule baseline used to benchmark the planner in the
//! evaluation harness.
//!
//! Grounded on `original_source/evaluation/random_generator.py::RandomScheduleGenerator`,
//! with one deliberate correction: the source's morning/afternoon/evening
//! classification loop never advances its simulated clock before
//! classifying, so every attraction is labeled "morning" regardless of
//! intent. This crate advances the clock as each attraction is
//! provisionally placed, producing the evidently-intended behavior (see
//! DESIGN.md Open Question 4).

use chrono::Duration;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::PlannerConfig;
use crate::geo::{self, Coordinates, TransportMode};
use crate::place::NormalizedPlace;
use crate::route::{DayPlan, DayPlanEntry};
use crate::schedule::{format_time, summarize, Event, Schedule};

/// Generates a legal but unoptimized schedule: attractions land on a
/// uniformly random day, restaurants are consumed two-per-day from a
/// shuffled global pool (padded with virtuals), and transit between any
/// two consecutive places is a flat 30 minutes regardless of distance or
/// transport mode.
pub fn generate(
    normalized: &[NormalizedPlace],
    lodging: &NormalizedPlace,
    days: u32,
    mode: TransportMode,
    config: &PlannerConfig,
    rng: &mut impl Rng,
) -> Schedule {
    let attractions: Vec<NormalizedPlace> = normalized
        .iter()
        .filter(|p| !p.is_restaurant() && !p.is_lodging)
        .cloned()
        .collect();
    let mut restaurant_pool: Vec<NormalizedPlace> = normalized
        .iter()
        .filter(|p| p.restaurant_kind == Some(crate::place::RestaurantKind::Real))
        .cloned()
        .collect();
    restaurant_pool.shuffle(rng);

    let mut day_attractions: Vec<Vec<NormalizedPlace>> = vec![Vec::new(); days as usize];
    for attraction in attractions {
        let day = rng.gen_range(0..days) as usize;
        day_attractions[day].push(attraction);
    }

    let mut day_plans = Vec::with_capacity(days as usize);

    for day in 0..days {
        let mut atts = std::mem::take(&mut day_attractions[day as usize]);
        atts.shuffle(rng);

        let (morning, afternoon, evening) = classify_by_simulated_clock(&atts, config);

        let day_centroid = if atts.is_empty() {
            Coordinates::new(0.0, 0.0)
        } else {
            geo::centroid(&atts.iter().map(|p| p.coordinates).collect::<Vec<_>>())
        };

        let mut day_restaurants = Vec::new();
        for _ in 0..2 {
            if let Some(r) = restaurant_pool.pop() {
                day_restaurants.push(r);
            }
        }

        let (lunch_place, dinner_place) = match day_restaurants.len() {
            0 => (
                NormalizedPlace::virtual_lunch(day_centroid, config.virtual_meal_duration_minutes),
                NormalizedPlace::virtual_dinner(day_centroid, config.virtual_meal_duration_minutes),
            ),
            1 => {
                let real = day_restaurants.pop().unwrap();
                (real, NormalizedPlace::virtual_dinner(day_centroid, config.virtual_meal_duration_minutes))
            }
            _ => {
                let dinner = day_restaurants.pop().unwrap();
                let lunch = day_restaurants.pop().unwrap();
                (lunch, dinner)
            }
        };

        let mut ordered = Vec::new();
        ordered.extend(morning);
        ordered.push(lunch_place);
        ordered.extend(afternoon);
        ordered.push(dinner_place);
        ordered.extend(evening);

        let mut entries = vec![DayPlanEntry {
            place: lodging.clone(),
            start: config.day_start,
            end: config.day_start,
        }];
        let mut current = config.day_start;
        for place in ordered {
            let start = current;
            let end = start + Duration::minutes(place.visit_duration_minutes);
            entries.push(DayPlanEntry { place, start, end });
            current = end + Duration::minutes(30);
        }
        entries.push(DayPlanEntry {
            place: lodging.clone(),
            start: current,
            end: current,
        });

        day_plans.push(DayPlan {
            day_index: day,
            entries,
            score: 0.0,
        });
    }

    assemble_fixed_transit(&day_plans, mode)
}

/// Classifies attractions into morning/afternoon/evening buckets by
/// advancing a simulated clock as each is provisionally placed, in
/// shuffled order.
fn classify_by_simulated_clock(
    attractions: &[NormalizedPlace],
    config: &PlannerConfig,
) -> (Vec<NormalizedPlace>, Vec<NormalizedPlace>, Vec<NormalizedPlace>) {
    let mut morning = Vec::new();
    let mut afternoon = Vec::new();
    let mut evening = Vec::new();
    let mut sim_time = config.day_start;

    for attraction in attractions {
        if sim_time < config.lunch_window.optimal {
            morning.push(attraction.clone());
        } else if sim_time < config.dinner_window.optimal {
            afternoon.push(attraction.clone());
        } else {
            evening.push(attraction.clone());
        }
        sim_time += Duration::minutes(attraction.visit_duration_minutes + 30);
    }

    (morning, afternoon, evening)
}

/// Same event shape as [`crate::schedule::assemble`] but with a flat
/// 30-minute transit leg regardless of distance or mode, per the baseline
/// algorithm in spec section 4.B.
fn assemble_fixed_transit(day_plans: &[DayPlan], mode: TransportMode) -> Schedule {
    let mut events = Vec::new();

    for plan in day_plans {
        for (i, e) in plan.entries.iter().enumerate() {
            events.push(Event::Place {
                id: uuid::Uuid::new_v4().to_string(),
                title: e.place.name.clone(),
                day: plan.day_index,
                start_time: format_time(e.start),
                end_time: format_time(e.end),
                place: e.place.clone(),
            });

            if let Some(next) = plan.entries.get(i + 1) {
                events.push(Event::Transit {
                    id: uuid::Uuid::new_v4().to_string(),
                    day: plan.day_index,
                    start_time: format_time(e.end),
                    end_time: format_time(next.start),
                    duration: 30,
                    mode,
                });
            }
        }
    }

    let summary = summarize(&events);
    Schedule { events, summary }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::place::Category;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

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

    fn attraction(id: &str) -> NormalizedPlace {
        NormalizedPlace {
            id: id.to_string(),
            name: id.to_string(),
            coordinates: Coordinates::new(48.86, 2.34),
            category: Category::TouristAttraction,
            visit_duration_minutes: 90,
            is_lodging: false,
            restaurant_kind: None,
            rating: Some(4.0),
            original: None,
        }
    }

    fn restaurant(id: &str) -> NormalizedPlace {
        NormalizedPlace {
            id: id.to_string(),
            name: id.to_string(),
            coordinates: Coordinates::new(48.85, 2.36),
            category: Category::Restaurant,
            visit_duration_minutes: 75,
            is_lodging: false,
            restaurant_kind: Some(crate::place::RestaurantKind::Real),
            rating: Some(4.0),
            original: None,
        }
    }

    #[test]
    fn generate_brackets_every_day_with_lodging() {
        let config = PlannerConfig::default();
        let lodging = lodging();
        let places = vec![attraction("a1"), attraction("a2"), restaurant("r1")];
        let mut rng = StdRng::seed_from_u64(7);
        let schedule = generate(&places, &lodging, 2, TransportMode::Walking, &config, &mut rng);
        for day in 0..2 {
            let day_places: Vec<&Event> = schedule.events.iter().filter(|e| e.day() == day && e.is_place()).collect();
            assert_eq!(day_places.first().unwrap().place().unwrap().id, "hotel");
            assert_eq!(day_places.last().unwrap().place().unwrap().id, "hotel");
        }
    }

    #[test]
    fn every_day_gets_a_lunch_and_dinner_capable_entry() {
        let config = PlannerConfig::default();
        let lodging = lodging();
        let places = vec![attraction("a1")];
        let mut rng = StdRng::seed_from_u64(3);
        let schedule = generate(&places, &lodging, 1, TransportMode::Driving, &config, &mut rng);
        let restaurant_like = schedule
            .events
            .iter()
            .filter_map(|e| e.place())
            .filter(|p| p.is_restaurant())
            .count();
        assert!(restaurant_like >= 2);
    }

    #[test]
    fn transit_duration_is_always_flat_thirty_minutes() {
        let config = PlannerConfig::default();
        let lodging = lodging();
        let places = vec![attraction("a1"), attraction("a2"), restaurant("r1")];
        let mut rng = StdRng::seed_from_u64(11);
        let schedule = generate(&places, &lodging, 1, TransportMode::Walking, &config, &mut rng);
        for event in &schedule.events {
            if let Event::Transit { duration, .. } = event {
                assert_eq!(*duration, 30);
            }
        }
    }
}

//! Four-dimension metric suite scoring any candidate [`Schedule`] in
//! `[0, 100]`, plus the weighted total used throughout the evaluation
//! harness.
//!
//! Grounded on `original_source/evaluation/metrics.py::ScheduleMetrics`;
//! the weighted-sum-of-sub-scores idiom follows
//! `ACTOTA-actota-api/src/services/search_scoring.rs`.

use std::collections::BTreeMap;

use crate::config::PlannerConfig;
use crate::geo::{self, Coordinates};
use crate::schedule::{Event, Schedule};

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Scores {
    pub distance: f64,
    pub time_window: f64,
    pub distribution: f64,
    pub clustering: f64,
    pub total: f64,
}

/// Resolves the metric-time location of a place event. Virtual meals use
/// the mean location of every non-virtual place event across the *entire*
/// schedule (not just their own day) — distinct from the per-day/global
/// centroid used during clustering-time virtual-meal synthesis.
fn location_of(schedule: &Schedule, event_place: &crate::place::NormalizedPlace) -> Coordinates {
    if !event_place.is_virtual() {
        return event_place.coordinates;
    }
    let mut sum = (0.0, 0.0);
    let mut count = 0usize;
    for event in &schedule.events {
        if let Event::Place { place, .. } = event {
            if !place.is_virtual() {
                sum.0 += place.coordinates.lat;
                sum.1 += place.coordinates.lng;
                count += 1;
            }
        }
    }
    if count == 0 {
        Coordinates::new(0.0, 0.0)
    } else {
        Coordinates::new(sum.0 / count as f64, sum.1 / count as f64)
    }
}

fn place_events_by_day(schedule: &Schedule) -> BTreeMap<u32, Vec<&Event>> {
    let mut by_day: BTreeMap<u32, Vec<&Event>> = BTreeMap::new();
    for event in &schedule.events {
        if event.is_place() {
            by_day.entry(event.day()).or_default().push(event);
        }
    }
    by_day
}

fn max_possible_distance(locations: &[Coordinates]) -> f64 {
    if locations.len() < 2 {
        return 0.0;
    }
    let mut max_distance = 0.0f64;
    for i in 0..locations.len() {
        for j in (i + 1)..locations.len() {
            let d = geo::haversine_distance_m(locations[i], locations[j]);
            if d > max_distance {
                max_distance = d;
            }
        }
    }
    max_distance * (locations.len() - 1) as f64
}

pub fn distance_score(schedule: &Schedule) -> f64 {
    let by_day = place_events_by_day(schedule);
    let mut total_distance = 0.0;
    let mut total_max_possible = 0.0;

    for events in by_day.values() {
        let locations: Vec<Coordinates> = events
            .iter()
            .filter_map(|e| e.place())
            .map(|p| location_of(schedule, p))
            .collect();

        for pair in locations.windows(2) {
            total_distance += geo::haversine_distance_m(pair[0], pair[1]);
        }
        total_max_possible += max_possible_distance(&locations);
    }

    if total_max_possible == 0.0 {
        100.0
    } else {
        100.0 * (1.0 - total_distance / total_max_possible)
    }
}

pub fn time_window_score(schedule: &Schedule, config: &PlannerConfig) -> f64 {
    let mut total = 0usize;
    let mut satisfied = 0usize;

    for event in &schedule.events {
        let Event::Place {
            start_time,
            end_time,
            place,
            ..
        } = event
        else {
            continue;
        };
        total += 1;
        let (Some(start), Some(end)) = (
            crate::schedule::parse_time(start_time),
            crate::schedule::parse_time(end_time),
        ) else {
            continue;
        };

        let ok = if place.is_restaurant() {
            in_window(start, end, config.lunch_window.start, config.lunch_window.end)
                || in_window(start, end, config.dinner_window.start, config.dinner_window.end)
        } else {
            config.day_start <= start && end <= config.day_end
        };
        if ok {
            satisfied += 1;
        }
    }

    if total == 0 {
        100.0
    } else {
        100.0 * (satisfied as f64 / total as f64)
    }
}

fn in_window(start: chrono::NaiveTime, end: chrono::NaiveTime, window_start: chrono::NaiveTime, window_end: chrono::NaiveTime) -> bool {
    window_start <= start && start <= window_end && window_start <= end && end <= window_end
}

pub fn distribution_score(schedule: &Schedule) -> f64 {
    let by_day = place_events_by_day(schedule);
    if by_day.is_empty() {
        return 100.0;
    }
    let counts: Vec<f64> = by_day.values().map(|v| v.len() as f64).collect();
    let mean = counts.iter().sum::<f64>() / counts.len() as f64;
    if mean == 0.0 {
        return 100.0;
    }
    let variance = counts.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / counts.len() as f64;
    let std_dev = variance.sqrt();
    let cv = std_dev / mean;
    100.0 * (1.0 - cv.min(1.0))
}

pub fn clustering_score(schedule: &Schedule, config: &PlannerConfig) -> f64 {
    let by_day = place_events_by_day(schedule);
    if by_day.is_empty() {
        return 100.0;
    }

    let mut daily_scores = Vec::new();
    for events in by_day.values() {
        let locations: Vec<Coordinates> = events
            .iter()
            .filter_map(|e| e.place())
            .map(|p| location_of(schedule, p))
            .collect();
        if locations.len() < 2 {
            continue;
        }
        let distances: Vec<f64> = locations.windows(2).map(|pair| geo::haversine_distance_m(pair[0], pair[1])).collect();
        let avg_distance = distances.iter().sum::<f64>() / distances.len() as f64;
        let day_score = 100.0 * (1.0 - (avg_distance / config.max_reasonable_cluster_distance_m).min(1.0));
        daily_scores.push(day_score);
    }

    if daily_scores.is_empty() {
        100.0
    } else {
        daily_scores.iter().sum::<f64>() / daily_scores.len() as f64
    }
}

/// All four scores plus the `0.3/0.3/0.2/0.2` weighted total.
pub fn score_schedule(schedule: &Schedule, config: &PlannerConfig) -> Scores {
    let distance = distance_score(schedule);
    let time_window = time_window_score(schedule, config);
    let distribution = distribution_score(schedule);
    let clustering = clustering_score(schedule, config);
    let total = 0.3 * distance + 0.3 * time_window + 0.2 * distribution + 0.2 * clustering;
    Scores {
        distance,
        time_window,
        distribution,
        clustering,
        total,
    }
}

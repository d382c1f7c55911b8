//! Combines per-day [`DayPlan`]s into a final [`Schedule`]: stamps day
//! indices, inserts transit legs, renders 12-hour clock times, and
//! computes summary counts.
//!
//! Grounded on `original_source/travelplan_back/travelplan/services/utils.py`
//! (`combine_schedules`, `format_schedule_times`, `validate_schedule`,
//! `calculate_schedule_metrics`).

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::config::PlannerConfig;
use crate::geo::{self, TransportMode};
use crate::place::NormalizedPlace;
use crate::route::DayPlan;

const TIME_FORMAT: &str = "%I:%M %p";

pub fn format_time(t: NaiveTime) -> String {
    t.format(TIME_FORMAT).to_string()
}

pub fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, TIME_FORMAT).ok()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Event {
    Place {
        id: String,
        title: String,
        day: u32,
        #[serde(rename = "startTime")]
        start_time: String,
        #[serde(rename = "endTime")]
        end_time: String,
        place: NormalizedPlace,
    },
    Transit {
        id: String,
        day: u32,
        #[serde(rename = "startTime")]
        start_time: String,
        #[serde(rename = "endTime")]
        end_time: String,
        duration: i64,
        mode: TransportMode,
    },
}

impl Event {
    pub fn day(&self) -> u32 {
        match self {
            Event::Place { day, .. } => *day,
            Event::Transit { day, .. } => *day,
        }
    }

    pub fn start(&self) -> Option<NaiveTime> {
        match self {
            Event::Place { start_time, .. } | Event::Transit { start_time, .. } => parse_time(start_time),
        }
    }

    pub fn end(&self) -> Option<NaiveTime> {
        match self {
            Event::Place { end_time, .. } | Event::Transit { end_time, .. } => parse_time(end_time),
        }
    }

    pub fn is_place(&self) -> bool {
        matches!(self, Event::Place { .. })
    }

    pub fn place(&self) -> Option<&NormalizedPlace> {
        match self {
            Event::Place { place, .. } => Some(place),
            Event::Transit { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub total_places: usize,
    pub total_transit_minutes: i64,
    pub restaurant_count: usize,
    pub attraction_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub events: Vec<Event>,
    pub summary: ScheduleSummary,
}

/// Concatenates day plans in order, inserting a transit event between each
/// consecutive pair of place events within a day.
pub fn assemble(day_plans: &[DayPlan], mode: TransportMode, config: &PlannerConfig) -> Schedule {
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
                let distance = geo::haversine_distance_m(e.place.coordinates, next.place.coordinates);
                let minutes = geo::travel_time_minutes(distance, mode, config).round() as i64;
                events.push(Event::Transit {
                    id: uuid::Uuid::new_v4().to_string(),
                    day: plan.day_index,
                    start_time: format_time(e.end),
                    end_time: format_time(e.end + chrono::Duration::minutes(minutes)),
                    duration: minutes,
                    mode,
                });
            }
        }
    }

    let summary = summarize(&events);
    log::info!("combined schedule has {} total events", events.len());

    Schedule { events, summary }
}

pub(crate) fn summarize(events: &[Event]) -> ScheduleSummary {
    let mut total_transit_minutes = 0;
    let mut restaurant_count = 0;
    let mut attraction_count = 0;
    let mut total_places = 0;

    for event in events {
        match event {
            Event::Transit { duration, .. } => total_transit_minutes += duration,
            Event::Place { place, .. } => {
                total_places += 1;
                if place.is_lodging {
                    continue;
                }
                if place.is_restaurant() {
                    restaurant_count += 1;
                } else {
                    attraction_count += 1;
                }
            }
        }
    }

    ScheduleSummary {
        total_places,
        total_transit_minutes,
        restaurant_count,
        attraction_count,
    }
}

/// Per-day: entries sorted by start time must be non-overlapping, and the
/// first start / last end must lie within the day window.
pub fn validate(schedule: &Schedule, config: &PlannerConfig) -> bool {
    use std::collections::BTreeMap;

    let mut by_day: BTreeMap<u32, Vec<&Event>> = BTreeMap::new();
    for event in &schedule.events {
        by_day.entry(event.day()).or_default().push(event);
    }

    for events in by_day.values() {
        let mut sorted: Vec<&&Event> = events.iter().collect();
        sorted.sort_by_key(|e| e.start());

        for pair in sorted.windows(2) {
            let (Some(end), Some(next_start)) = (pair[0].end(), pair[1].start()) else {
                return false;
            };
            if end > next_start {
                return false;
            }
        }

        if let (Some(first), Some(last)) = (sorted.first(), sorted.last()) {
            let (Some(start), Some(end)) = (first.start(), last.end()) else {
                return false;
            };
            if start < config.day_start || end > config.day_end {
                return false;
            }
        }
    }

    true
}

//! Crate root: wires the geodesy, normalization, clustering, routing,
//! assembly, metrics, baseline, and evaluation modules into the top-level
//! `plan()` entry point described in spec section 6, plus the
//! `plan_schedule()` building block the evaluation harness drives directly.
//!
//! Grounded on `ACTOTA-actota-api/src/services/itinerary_generation_service.rs`'s
//! `generate_itinerary` for the overall orchestration shape (fetch/validate
//! -> transform -> assemble -> return a rich result type) and on
//! `original_source/travelplan_back/travelplan/services/schedule_service.py`'s
//! `generate_schedule` / `check_schedule_reasonability` for the exact
//! validation and reasonability contract.

pub mod baseline;
pub mod cluster;
pub mod config;
pub mod errors;
pub mod eval;
pub mod geo;
pub mod metrics;
pub mod place;
pub mod route;
pub mod schedule;

use std::collections::HashSet;

use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};

use config::PlannerConfig;
use errors::PlannerError;
use geo::TransportMode;
use place::Place;
use route::DayPlan;
use schedule::{Event, Schedule};

/// The result of running the planner core (P -> C -> R -> S) once, without
/// the reasonability/severity wrapping the public [`plan`] entry point adds.
pub struct PlanResult {
    pub schedule: Schedule,
    pub day_plans: Vec<DayPlan>,
}

/// Runs the planner core once: normalize, partition into day buckets,
/// route each day, and assemble the final schedule. This is the building
/// block both [`plan`] and the evaluation harness ([`eval::evaluate_scenario`])
/// drive; it returns a `Result` rather than the softened [`PlannerOutput`]
/// because the evaluation harness needs to distinguish hard failures from
/// scoreable output.
pub fn plan_schedule(
    places: &[Place],
    days: u32,
    mode: TransportMode,
    config: &PlannerConfig,
    rng: &mut impl Rng,
) -> Result<PlanResult, PlannerError> {
    let (normalized, lodging) = place::normalize(places, rng)?;

    let attraction_count = normalized
        .iter()
        .filter(|p| !p.is_restaurant() && !p.is_lodging)
        .count();
    if attraction_count > config.hard_places_per_day_limit * days as usize {
        return Err(PlannerError::CapacityViolation {
            attractions: attraction_count,
            days,
        });
    }

    let buckets = cluster::cluster(&normalized, days, config)?;

    let mut consumed: HashSet<String> = HashSet::new();
    let mut day_plans = Vec::with_capacity(buckets.len());
    for (i, bucket) in buckets.iter().enumerate() {
        let plan = route::route(i as u32, bucket, &lodging, mode, config, &mut consumed);
        day_plans.push(plan);
    }

    let schedule = schedule::assemble(&day_plans, mode, config);
    Ok(PlanResult { schedule, day_plans })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Normal,
    Warning,
    Severe,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasonabilityWarning {
    #[serde(rename = "type")]
    pub warning_type: String,
    pub message: String,
    pub suggestion: String,
}

impl ReasonabilityWarning {
    fn new(warning_type: &str, message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        ReasonabilityWarning {
            warning_type: warning_type.to_string(),
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleStatus {
    pub is_reasonable: bool,
    pub warnings: Vec<ReasonabilityWarning>,
    pub severity: Severity,
}

impl ScheduleStatus {
    fn ok() -> Self {
        ScheduleStatus {
            is_reasonable: true,
            warnings: Vec::new(),
            severity: Severity::Normal,
        }
    }

    fn severe(warning: ReasonabilityWarning) -> Self {
        ScheduleStatus {
            is_reasonable: false,
            warnings: vec![warning],
            severity: Severity::Severe,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerOutput {
    pub success: bool,
    pub events: Vec<Event>,
    pub metrics: metrics::Scores,
    #[serde(rename = "scheduleStatus")]
    pub schedule_status: ScheduleStatus,
}

impl PlannerOutput {
    fn failure(warning_type: &str, message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        PlannerOutput {
            success: false,
            events: Vec::new(),
            metrics: metrics::Scores {
                distance: 0.0,
                time_window: 0.0,
                distribution: 0.0,
                clustering: 0.0,
                total: 0.0,
            },
            schedule_status: ScheduleStatus::severe(ReasonabilityWarning::new(warning_type, message, suggestion)),
        }
    }
}

/// Top-level planner entry point, per spec section 6.
///
/// `start_date`/`end_date` are `YYYY-MM-DD` strings; the day count is
/// `(end - start).num_days() + 1`, inclusive of both endpoints. Validation
/// failures (missing/unparseable dates, empty place list, unknown transport
/// mode) are reported in-band as a `severity: severe` [`ScheduleStatus`]
/// rather than propagated as a `Result::Err`, per spec section 7's policy
/// that `InputInvalid`/`NoLodging` are "always surfaced" to the caller
/// through the structured payload, not exceptions.
pub fn plan(
    places: &[Place],
    start_date: &str,
    end_date: &str,
    transport_mode: &str,
    config: &PlannerConfig,
    rng: &mut impl Rng,
) -> PlannerOutput {
    if places.is_empty() {
        return PlannerOutput::failure(
            "empty_places",
            "no places were supplied",
            "include at least one lodging place and one attraction or restaurant",
        );
    }

    let start = match NaiveDate::parse_from_str(start_date, "%Y-%m-%d") {
        Ok(d) => d,
        Err(_) => {
            return PlannerOutput::failure(
                "invalid_date",
                format!("could not parse start date {start_date:?}"),
                "supply dates in YYYY-MM-DD format",
            )
        }
    };
    let end = match NaiveDate::parse_from_str(end_date, "%Y-%m-%d") {
        Ok(d) => d,
        Err(_) => {
            return PlannerOutput::failure(
                "invalid_date",
                format!("could not parse end date {end_date:?}"),
                "supply dates in YYYY-MM-DD format",
            )
        }
    };
    if end < start {
        return PlannerOutput::failure(
            "invalid_date_range",
            "end date is before start date",
            "swap the start and end dates",
        );
    }
    let days = (end - start).num_days() as u32 + 1;

    let mode = match TransportMode::parse(transport_mode) {
        Some(m) => m,
        None => {
            return PlannerOutput::failure(
                "invalid_transport_mode",
                format!("unknown transport mode {transport_mode:?}"),
                "use one of: walking, transit, driving",
            )
        }
    };

    match plan_schedule(places, days, mode, config, rng) {
        Ok(PlanResult { schedule, day_plans }) => {
            let metrics = metrics::score_schedule(&schedule, config);
            let schedule_status = check_reasonability(places, &day_plans, &schedule, config);
            PlannerOutput {
                success: true,
                events: schedule.events,
                metrics,
                schedule_status,
            }
        }
        Err(PlannerError::InputInvalid(msg)) => PlannerOutput::failure(
            "input_invalid",
            msg,
            "check that every place has a name, category tags, and a location",
        ),
        Err(PlannerError::NoLodging) => PlannerOutput::failure(
            "no_lodging",
            "no place carries a lodging/hotel category tag",
            "tag exactly one input place as lodging or hotel",
        ),
        Err(PlannerError::CapacityViolation { attractions, days }) => PlannerOutput::failure(
            "too_many_places",
            format!("{attractions} attractions cannot fit in {days} day(s)"),
            "add more days or remove some attractions",
        ),
        Err(PlannerError::InternalFailure(err)) => {
            log::error!("planner internal failure: {err}");
            PlannerOutput::failure(
                "internal_failure",
                err.to_string(),
                "retry the request; if this persists, report the input that triggered it",
            )
        }
    }
}

/// Builds the section 6 reasonability payload. Severity escalates
/// monotonically as checks run in a fixed order and is never downgraded
/// once raised: `empty_days` sets `warning` (unless already `severe`);
/// `unscheduled_places` and `overtime_days` each set `severe`.
/// `too_many_places` is handled earlier as a hard failure and never appears
/// here.
fn check_reasonability(
    original_places: &[Place],
    day_plans: &[DayPlan],
    schedule: &Schedule,
    config: &PlannerConfig,
) -> ScheduleStatus {
    let mut warnings = Vec::new();
    let mut severity = Severity::Normal;

    let empty_day_count = day_plans
        .iter()
        .filter(|plan| {
            plan.entries
                .iter()
                .all(|e| e.place.is_lodging || e.place.is_virtual())
        })
        .count();
    if empty_day_count > 0 {
        warnings.push(ReasonabilityWarning::new(
            "empty_days",
            format!("{empty_day_count} day(s) contain only the lodging anchor and virtual meals"),
            "add more attractions or restaurants near those days' locations",
        ));
        severity = Severity::Warning;
    }

    let scheduled_ids: HashSet<&str> = schedule
        .events
        .iter()
        .filter_map(|e| e.place())
        .filter_map(|p| p.original.as_ref())
        .filter_map(|p| p.place_id.as_deref())
        .collect();
    let unscheduled: Vec<&str> = original_places
        .iter()
        .filter(|p| !p.is_lodging())
        .filter_map(|p| p.place_id.as_deref())
        .filter(|id| !scheduled_ids.contains(id))
        .collect();
    if !unscheduled.is_empty() {
        warnings.push(ReasonabilityWarning::new(
            "unscheduled_places",
            format!("{} input place(s) were not scheduled", unscheduled.len()),
            "increase the trip length or reduce the number of candidate places",
        ));
        severity = Severity::Severe;
    }

    let overtime_days: usize = day_plans
        .iter()
        .filter(|plan| plan.entries.iter().any(|e| e.end > config.day_end))
        .count();
    if overtime_days > 0 {
        warnings.push(ReasonabilityWarning::new(
            "overtime_days",
            format!("{overtime_days} day(s) end after the {} day window", schedule::format_time(config.day_end)),
            "reduce the number of places scheduled on the affected day(s)",
        ));
        severity = Severity::Severe;
    }

    if warnings.is_empty() {
        ScheduleStatus::ok()
    } else {
        ScheduleStatus {
            is_reasonable: true,
            severity,
            warnings,
        }
    }
}
